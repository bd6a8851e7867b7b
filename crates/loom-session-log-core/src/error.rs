// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for session log core types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
	/// A required session identity field was empty.
	#[error("session identity field '{0}' must not be empty")]
	EmptyField(&'static str),
}
