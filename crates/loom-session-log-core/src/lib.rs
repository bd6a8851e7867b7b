// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for Loom session logs.
//!
//! This crate provides:
//! - [`SessionId`] - The identity fields of a messaging session
//! - [`SessionKey`] - A stable namespace string derived from a [`SessionId`]
//! - [`LogEntry`] - A timestamped, opaque log line
//! - [`LogChannel`] - The two independent streams kept per session

pub mod entry;
pub mod error;
pub mod session;

pub use entry::{LogChannel, LogEntry};
pub use error::CoreError;
pub use session::{SessionId, SessionKey};
