// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Per-channel buffers of entries awaiting persistence.

use chrono::{DateTime, Utc};
use loom_session_log_core::{LogChannel, LogEntry};
use tokio::sync::{Mutex, MutexGuard};

use crate::policy::FlushPolicy;

/// The entries of one channel that have not been persisted yet, in append order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingBatch {
	entries: Vec<LogEntry>,
}

impl PendingBatch {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn entries(&self) -> &[LogEntry] {
		&self.entries
	}

	/// Timestamp of the oldest pending entry.
	pub fn oldest(&self) -> Option<DateTime<Utc>> {
		self.entries.first().map(LogEntry::timestamp)
	}

	pub fn push(&mut self, entry: LogEntry) {
		self.entries.push(entry);
	}

	/// Remove and return every pending entry.
	pub fn take(&mut self) -> Vec<LogEntry> {
		std::mem::take(&mut self.entries)
	}

	pub fn clear(&mut self) {
		self.entries.clear();
	}
}

/// An ordered, lock-protected buffer for one [`LogChannel`].
///
/// Each buffer owns its own mutex, so activity on one channel never waits on
/// the other.
#[derive(Debug)]
pub struct LogBuffer {
	channel: LogChannel,
	pending: Mutex<PendingBatch>,
}

impl LogBuffer {
	pub fn new(channel: LogChannel) -> Self {
		Self {
			channel,
			pending: Mutex::new(PendingBatch::new()),
		}
	}

	pub fn channel(&self) -> LogChannel {
		self.channel
	}

	/// Add an entry at the tail. Never applies backpressure.
	pub async fn append(&self, entry: LogEntry) {
		self.pending.lock().await.push(entry);
	}

	pub async fn clear(&self) {
		self.pending.lock().await.clear();
	}

	pub async fn len(&self) -> usize {
		self.pending.lock().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.pending.lock().await.is_empty()
	}

	/// Copy of the pending entries, leaving the buffer unchanged.
	pub async fn snapshot(&self) -> Vec<LogEntry> {
		self.pending.lock().await.entries().to_vec()
	}

	/// Atomically return the pending entries and reset the buffer to empty.
	pub async fn snapshot_and_clear(&self) -> Vec<LogEntry> {
		self.pending.lock().await.take()
	}

	pub async fn is_ready_for(&self, policy: &dyn FlushPolicy) -> bool {
		policy.should_flush(&*self.pending.lock().await)
	}

	/// Hold the buffer lock across an append and the flush it may trigger.
	pub(crate) async fn lock(&self) -> MutexGuard<'_, PendingBatch> {
		self.pending.lock().await
	}
}
