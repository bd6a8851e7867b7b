// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use loom_session_log::{LogSink, SinkError};
use loom_session_log_core::LogEntry;
use tokio::sync::Mutex;

/// A sink that keeps every batch in memory.
#[derive(Default)]
pub struct RecordingSink {
	batches: Mutex<Vec<(String, Vec<String>)>>,
	failing: AtomicBool,
}

impl RecordingSink {
	pub fn set_failing(&self, failing: bool) {
		self.failing.store(failing, Ordering::SeqCst);
	}

	pub async fn batches(&self) -> Vec<(String, Vec<String>)> {
		self.batches.lock().await.clone()
	}

	/// Every message stored under `destination`, in write order.
	pub async fn messages(&self, destination: &str) -> Vec<String> {
		self.batches
			.lock()
			.await
			.iter()
			.filter(|(dest, _)| dest == destination)
			.flat_map(|(_, messages)| messages.clone())
			.collect()
	}
}

#[async_trait]
impl LogSink for RecordingSink {
	fn name(&self) -> &str {
		"recording"
	}

	async fn bulk_write(&self, entries: &[LogEntry], destination: &str) -> Result<(), SinkError> {
		if self.failing.load(Ordering::SeqCst) {
			return Err(SinkError::Transient("connection refused".to_string()));
		}
		let messages = entries.iter().map(|e| e.message().to_string()).collect();
		self.batches
			.lock()
			.await
			.push((destination.to_string(), messages));
		Ok(())
	}
}
