// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

mod flush;
mod log;
mod retry;

pub use flush::{FlushConfigLayer, FlushPolicyConfig, FlushPolicyKind};
pub use log::{
	LogBackend, SessionLogConfig, SessionLogConfigLayer, TableScope, DEFAULT_EVENT_TABLE,
	DEFAULT_MESSAGE_TABLE,
};
pub use retry::{RetryConfig, RetryConfigLayer};
