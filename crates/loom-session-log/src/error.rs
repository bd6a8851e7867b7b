// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use loom_session_log_config::ConfigError;
use loom_session_log_core::{CoreError, LogChannel};
use thiserror::Error;

pub type LogResult<T> = Result<T, LogError>;

#[derive(Error, Debug)]
pub enum LogError {
	#[error("configuration error: {0}")]
	Config(#[from] ConfigError),

	#[error("invalid session identity: {0}")]
	Session(#[from] CoreError),

	/// A flush failed. The entries are still buffered and will be resent by
	/// the next flush of the same channel.
	#[error("sink '{sink}' failed to persist {entries} {channel} entries to '{destination}': {source}")]
	Persistence {
		sink: String,
		channel: LogChannel,
		destination: String,
		entries: usize,
		#[source]
		source: SinkError,
	},

	#[error("sink '{sink}' failed to release its handles: {source}")]
	Dispose {
		sink: String,
		#[source]
		source: SinkError,
	},
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
	#[error("transient error: {0}")]
	Transient(String),

	#[error("permanent error: {0}")]
	Permanent(String),
}

impl SinkError {
	pub fn is_retryable(&self) -> bool {
		matches!(self, SinkError::Transient(_))
	}
}
