// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Flush policies decide when a channel's pending entries are persisted.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use loom_session_log_config::FlushPolicyConfig;

use crate::buffer::PendingBatch;

/// Decides whether a pending batch should be written to the sink now.
///
/// Policies are consulted after every append while the channel lock is held.
/// There is no background timer, so time-based policies only fire on the
/// next append.
pub trait FlushPolicy: Send + Sync + std::fmt::Debug {
	fn should_flush(&self, batch: &PendingBatch) -> bool;
}

/// Flush after every append.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysFlush;

impl FlushPolicy for AlwaysFlush {
	fn should_flush(&self, _batch: &PendingBatch) -> bool {
		true
	}
}

/// Flush once at least `max_entries` entries are pending.
#[derive(Debug, Clone, Copy)]
pub struct MaxEntries {
	max_entries: usize,
}

impl MaxEntries {
	pub fn new(max_entries: usize) -> Self {
		Self {
			max_entries: max_entries.max(1),
		}
	}
}

impl FlushPolicy for MaxEntries {
	fn should_flush(&self, batch: &PendingBatch) -> bool {
		batch.len() >= self.max_entries
	}
}

/// Flush once the oldest pending entry has waited at least `max_age`.
#[derive(Debug, Clone, Copy)]
pub struct MaxAge {
	max_age: Duration,
}

impl MaxAge {
	pub fn new(max_age: Duration) -> Self {
		Self { max_age }
	}
}

impl FlushPolicy for MaxAge {
	fn should_flush(&self, batch: &PendingBatch) -> bool {
		let Some(oldest) = batch.oldest() else {
			return false;
		};
		// A clock step backwards yields a negative age, which never flushes.
		(Utc::now() - oldest)
			.to_std()
			.map(|age| age >= self.max_age)
			.unwrap_or(false)
	}
}

pub fn flush_policy_from_config(config: &FlushPolicyConfig) -> Arc<dyn FlushPolicy> {
	match *config {
		FlushPolicyConfig::Always => Arc::new(AlwaysFlush),
		FlushPolicyConfig::MaxEntries(n) => Arc::new(MaxEntries::new(n)),
		FlushPolicyConfig::MaxAge(age) => Arc::new(MaxAge::new(age)),
	}
}
