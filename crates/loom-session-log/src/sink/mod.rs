// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Persistence backends for session logs.

use async_trait::async_trait;
use loom_session_log_core::{LogChannel, LogEntry};

pub use crate::error::SinkError;

#[cfg(feature = "sink-file")]
pub mod file;

#[cfg(feature = "sink-sqlite")]
pub mod sqlite;

/// A persistence target that stores batches of entries under a named destination.
///
/// Implementations may be invoked concurrently from the message and event
/// channels of the same log, each with its own destination.
#[async_trait]
pub trait LogSink: Send + Sync {
	fn name(&self) -> &str;

	/// Durably store `entries`, in order, under `destination`.
	///
	/// An `Err` means the batch may not have been stored; the caller keeps it
	/// buffered and resends it later.
	async fn bulk_write(&self, entries: &[LogEntry], destination: &str) -> Result<(), SinkError>;

	/// Release any open handles. Persisted data is never touched. Must be
	/// idempotent; a later `bulk_write` may reopen handles.
	async fn dispose(&self) -> Result<(), SinkError> {
		Ok(())
	}

	async fn health_check(&self) -> Result<(), SinkError> {
		Ok(())
	}
}

/// The destination name used for each channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destinations {
	pub messages: String,
	pub events: String,
}

impl Destinations {
	pub fn new(messages: impl Into<String>, events: impl Into<String>) -> Self {
		Self {
			messages: messages.into(),
			events: events.into(),
		}
	}

	pub fn for_channel(&self, channel: LogChannel) -> &str {
		match channel {
			LogChannel::Message => &self.messages,
			LogChannel::Event => &self.events,
		}
	}
}
