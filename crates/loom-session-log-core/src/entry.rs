// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Log entries and channels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the two independent log streams kept for every session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogChannel {
	/// Inbound and outbound protocol messages.
	Message,
	/// Session lifecycle events.
	Event,
}

impl LogChannel {
	pub const ALL: [LogChannel; 2] = [LogChannel::Message, LogChannel::Event];

	pub fn as_str(&self) -> &'static str {
		match self {
			LogChannel::Message => "messages",
			LogChannel::Event => "event",
		}
	}
}

impl std::fmt::Display for LogChannel {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A timestamped, opaque log line. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
	timestamp: DateTime<Utc>,
	message: String,
}

impl LogEntry {
	/// Create an entry stamped with the current time.
	pub fn new(message: impl Into<String>) -> Self {
		Self::at(Utc::now(), message)
	}

	pub fn at(timestamp: DateTime<Utc>, message: impl Into<String>) -> Self {
		Self {
			timestamp,
			message: message.into(),
		}
	}

	pub fn timestamp(&self) -> DateTime<Utc> {
		self.timestamp
	}

	pub fn message(&self) -> &str {
		&self.message
	}
}
