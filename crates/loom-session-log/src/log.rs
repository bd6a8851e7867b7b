// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! The producer-facing session log.

use std::sync::Arc;

use async_trait::async_trait;
use loom_session_log_config::RetryConfig;
use loom_session_log_core::{LogChannel, LogEntry, SessionKey};
use tracing::{debug, instrument, warn};

use crate::buffer::{LogBuffer, PendingBatch};
use crate::error::{LogError, LogResult};
use crate::policy::{AlwaysFlush, FlushPolicy};
use crate::retry::write_with_retry;
use crate::sink::{Destinations, LogSink};

/// Message and event log for one session.
///
/// Every method runs inline in the caller's task. A flush triggered by an
/// append happens before the append returns, so a slow sink slows down the
/// producers of that channel.
#[async_trait]
pub trait SessionLog: Send + Sync {
	async fn on_incoming(&self, message: &str) -> LogResult<()>;

	async fn on_outgoing(&self, message: &str) -> LogResult<()>;

	async fn on_event(&self, message: &str) -> LogResult<()>;

	async fn clear_message_log(&self);

	async fn clear_event_log(&self);

	async fn clear(&self);

	/// Persist everything pending on both channels, regardless of flush policy.
	async fn flush(&self) -> LogResult<()>;

	/// Release backend handles. Idempotent; never removes persisted data.
	///
	/// The log stays usable afterwards. A later append reopens the backend and
	/// a later `dispose` releases it again.
	async fn dispose(&self) -> LogResult<()>;
}

pub struct BufferedLog {
	session_key: SessionKey,
	messages: LogBuffer,
	events: LogBuffer,
	sink: Arc<dyn LogSink>,
	destinations: Destinations,
	policy: Arc<dyn FlushPolicy>,
	retry: RetryConfig,
}

impl BufferedLog {
	pub fn new(session_key: SessionKey, sink: Arc<dyn LogSink>, destinations: Destinations) -> Self {
		Self {
			session_key,
			messages: LogBuffer::new(LogChannel::Message),
			events: LogBuffer::new(LogChannel::Event),
			sink,
			destinations,
			policy: Arc::new(AlwaysFlush),
			retry: RetryConfig::escalate(),
		}
	}

	pub fn with_flush_policy(mut self, policy: Arc<dyn FlushPolicy>) -> Self {
		self.policy = policy;
		self
	}

	pub fn with_retry(mut self, retry: RetryConfig) -> Self {
		self.retry = retry;
		self
	}

	pub fn session_key(&self) -> &SessionKey {
		&self.session_key
	}

	pub fn destinations(&self) -> &Destinations {
		&self.destinations
	}

	pub fn buffer(&self, channel: LogChannel) -> &LogBuffer {
		match channel {
			LogChannel::Message => &self.messages,
			LogChannel::Event => &self.events,
		}
	}

	/// Number of entries waiting to be persisted on `channel`.
	pub async fn pending(&self, channel: LogChannel) -> usize {
		self.buffer(channel).len().await
	}

	async fn record(&self, channel: LogChannel, message: &str) -> LogResult<()> {
		let mut pending = self.buffer(channel).lock().await;
		// Stamped under the lock so timestamps follow insertion order.
		pending.push(LogEntry::new(message));

		if !self.policy.should_flush(&pending) {
			return Ok(());
		}
		self.flush_locked(channel, &mut pending).await
	}

	async fn flush_channel(&self, channel: LogChannel) -> LogResult<()> {
		let mut pending = self.buffer(channel).lock().await;
		self.flush_locked(channel, &mut pending).await
	}

	#[instrument(
		skip(self, pending),
		fields(session_key = %self.session_key, channel = %channel, entries = pending.len())
	)]
	async fn flush_locked(&self, channel: LogChannel, pending: &mut PendingBatch) -> LogResult<()> {
		if pending.is_empty() {
			return Ok(());
		}

		let destination = self.destinations.for_channel(channel);
		// Entries leave the buffer only once the sink has accepted them, so a
		// flush cancelled mid-write keeps them pending.
		let batch = pending.entries();
		let result = write_with_retry(&self.retry, || self.sink.bulk_write(batch, destination)).await;

		match result {
			Ok(()) => {
				pending.clear();
				debug!(destination, sink = self.sink.name(), "flushed log batch");
				Ok(())
			}
			Err(source) => {
				warn!(
					destination,
					sink = self.sink.name(),
					error = %source,
					"log flush failed, entries kept for the next flush"
				);
				Err(LogError::Persistence {
					sink: self.sink.name().to_string(),
					channel,
					destination: destination.to_string(),
					entries: pending.len(),
					source,
				})
			}
		}
	}
}

#[async_trait]
impl SessionLog for BufferedLog {
	async fn on_incoming(&self, message: &str) -> LogResult<()> {
		self.record(LogChannel::Message, message).await
	}

	async fn on_outgoing(&self, message: &str) -> LogResult<()> {
		self.record(LogChannel::Message, message).await
	}

	async fn on_event(&self, message: &str) -> LogResult<()> {
		self.record(LogChannel::Event, message).await
	}

	async fn clear_message_log(&self) {
		self.messages.clear().await;
	}

	async fn clear_event_log(&self) {
		self.events.clear().await;
	}

	async fn clear(&self) {
		self.clear_event_log().await;
		self.clear_message_log().await;
	}

	async fn flush(&self) -> LogResult<()> {
		let messages = self.flush_channel(LogChannel::Message).await;
		let events = self.flush_channel(LogChannel::Event).await;
		messages.and(events)
	}

	async fn dispose(&self) -> LogResult<()> {
		debug!(session_key = %self.session_key, sink = self.sink.name(), "disposing session log");
		self.sink.dispose().await.map_err(|source| LogError::Dispose {
			sink: self.sink.name().to_string(),
			source,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::SinkError;
	use crate::policy::MaxEntries;
	use loom_session_log_core::SessionId;
	use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
	use std::time::Duration;
	use tokio::sync::Mutex;

	#[derive(Default)]
	struct RecordingSink {
		writes: Mutex<Vec<(String, Vec<String>)>>,
		fail: AtomicBool,
		disposals: AtomicUsize,
	}

	impl RecordingSink {
		async fn writes(&self) -> Vec<(String, Vec<String>)> {
			self.writes.lock().await.clone()
		}

		fn set_failing(&self, fail: bool) {
			self.fail.store(fail, Ordering::SeqCst);
		}
	}

	#[async_trait]
	impl LogSink for RecordingSink {
		fn name(&self) -> &str {
			"recording"
		}

		async fn bulk_write(&self, entries: &[LogEntry], destination: &str) -> Result<(), SinkError> {
			if self.fail.load(Ordering::SeqCst) {
				return Err(SinkError::Transient("backend unavailable".to_string()));
			}
			let messages = entries.iter().map(|e| e.message().to_string()).collect();
			self.writes
				.lock()
				.await
				.push((destination.to_string(), messages));
			Ok(())
		}

		async fn dispose(&self) -> Result<(), SinkError> {
			self.disposals.fetch_add(1, Ordering::SeqCst);
			Ok(())
		}
	}

	fn new_log(sink: Arc<RecordingSink>) -> BufferedLog {
		let key = SessionId::new("FIX.4.2", "AAA", "BBB").key();
		BufferedLog::new(key, sink, Destinations::new("messageslog", "eventslog"))
	}

	fn strings(values: &[&str]) -> Vec<String> {
		values.iter().map(|s| s.to_string()).collect()
	}

	#[tokio::test]
	async fn test_always_flush_writes_each_append() {
		let sink = Arc::new(RecordingSink::default());
		let log = new_log(Arc::clone(&sink));

		log.on_incoming("A").await.unwrap();
		log.on_outgoing("B").await.unwrap();
		log.on_event("E1").await.unwrap();

		assert_eq!(
			sink.writes().await,
			vec![
				("messageslog".to_string(), strings(&["A"])),
				("messageslog".to_string(), strings(&["B"])),
				("eventslog".to_string(), strings(&["E1"])),
			]
		);
		assert_eq!(log.pending(LogChannel::Message).await, 0);
		assert_eq!(log.pending(LogChannel::Event).await, 0);
	}

	#[tokio::test]
	async fn test_batched_messages_arrive_in_one_write() {
		let sink = Arc::new(RecordingSink::default());
		let log = new_log(Arc::clone(&sink)).with_flush_policy(Arc::new(MaxEntries::new(2)));

		log.on_incoming("A").await.unwrap();
		assert!(sink.writes().await.is_empty());
		log.on_outgoing("B").await.unwrap();
		log.on_event("E1").await.unwrap();

		assert_eq!(
			sink.writes().await,
			vec![("messageslog".to_string(), strings(&["A", "B"]))]
		);
		assert_eq!(log.pending(LogChannel::Event).await, 1);

		log.flush().await.unwrap();
		assert_eq!(
			sink.writes().await.last(),
			Some(&("eventslog".to_string(), strings(&["E1"])))
		);
		assert_eq!(log.pending(LogChannel::Event).await, 0);
	}

	#[tokio::test]
	async fn test_failed_flush_keeps_entries_and_resends() {
		let sink = Arc::new(RecordingSink::default());
		let log = new_log(Arc::clone(&sink));

		sink.set_failing(true);
		let err = log.on_incoming("A").await.unwrap_err();
		match err {
			LogError::Persistence {
				channel,
				destination,
				entries,
				..
			} => {
				assert_eq!(channel, LogChannel::Message);
				assert_eq!(destination, "messageslog");
				assert_eq!(entries, 1);
			}
			other => panic!("unexpected error: {other}"),
		}
		assert!(log.on_incoming("B").await.is_err());
		assert_eq!(log.pending(LogChannel::Message).await, 2);

		sink.set_failing(false);
		log.on_incoming("C").await.unwrap();

		assert_eq!(
			sink.writes().await,
			vec![("messageslog".to_string(), strings(&["A", "B", "C"]))]
		);
		assert_eq!(log.pending(LogChannel::Message).await, 0);
	}

	#[tokio::test]
	async fn test_retry_recovers_from_transient_failure() {
		struct FlakySink {
			failures_left: AtomicUsize,
			inner: RecordingSink,
		}

		#[async_trait]
		impl LogSink for FlakySink {
			fn name(&self) -> &str {
				"flaky"
			}

			async fn bulk_write(
				&self,
				entries: &[LogEntry],
				destination: &str,
			) -> Result<(), SinkError> {
				let left = self.failures_left.load(Ordering::SeqCst);
				if left > 0 {
					self.failures_left.store(left - 1, Ordering::SeqCst);
					return Err(SinkError::Transient("busy".to_string()));
				}
				self.inner.bulk_write(entries, destination).await
			}
		}

		let sink = Arc::new(FlakySink {
			failures_left: AtomicUsize::new(2),
			inner: RecordingSink::default(),
		});
		let log = BufferedLog::new(
			SessionId::new("FIX.4.4", "AAA", "BBB").key(),
			Arc::clone(&sink) as Arc<dyn LogSink>,
			Destinations::new("m", "e"),
		)
		.with_retry(RetryConfig {
			max_attempts: 3,
			base_delay: Duration::from_millis(1),
			max_delay: Duration::from_millis(1),
			backoff_factor: 1.0,
			jitter: false,
		});

		log.on_event("logon").await.unwrap();
		assert_eq!(
			sink.inner.writes().await,
			vec![("e".to_string(), strings(&["logon"]))]
		);
	}

	#[tokio::test]
	async fn test_clear_is_channel_isolated() {
		let sink = Arc::new(RecordingSink::default());
		let log = new_log(sink).with_flush_policy(Arc::new(MaxEntries::new(100)));

		log.on_incoming("A").await.unwrap();
		log.on_incoming("B").await.unwrap();
		log.on_event("E1").await.unwrap();

		log.clear_message_log().await;
		assert_eq!(log.pending(LogChannel::Message).await, 0);
		assert_eq!(log.pending(LogChannel::Event).await, 1);

		log.on_incoming("C").await.unwrap();
		log.clear_event_log().await;
		assert_eq!(log.pending(LogChannel::Message).await, 1);
		assert_eq!(log.pending(LogChannel::Event).await, 0);

		log.on_event("E2").await.unwrap();
		log.clear().await;
		assert_eq!(log.pending(LogChannel::Message).await, 0);
		assert_eq!(log.pending(LogChannel::Event).await, 0);
	}

	#[tokio::test]
	async fn test_dispose_always_reaches_the_sink() {
		let sink = Arc::new(RecordingSink::default());
		let log = new_log(Arc::clone(&sink));

		log.on_incoming("A").await.unwrap();
		log.dispose().await.unwrap();
		log.dispose().await.unwrap();
		log.on_incoming("B").await.unwrap();
		log.dispose().await.unwrap();

		assert_eq!(sink.disposals.load(Ordering::SeqCst), 3);
		assert_eq!(sink.writes().await.len(), 2);
	}

	#[cfg(feature = "sink-file")]
	#[tokio::test]
	async fn test_dispose_releases_handles_reopened_after_dispose() {
		use crate::sink::file::FileLogSink;

		let dir = tempfile::tempdir().unwrap();
		let path = |name: &str| dir.path().join(name).to_string_lossy().into_owned();
		let sink = Arc::new(FileLogSink::new());
		let log = BufferedLog::new(
			SessionId::new("FIX.4.2", "AAA", "BBB").key(),
			Arc::clone(&sink) as Arc<dyn LogSink>,
			Destinations::new(path("messages.log"), path("event.log")),
		);

		log.on_incoming("A").await.unwrap();
		log.dispose().await.unwrap();
		assert_eq!(sink.open_handles().await, 0);

		log.on_incoming("B").await.unwrap();
		assert_eq!(sink.open_handles().await, 1);
		log.dispose().await.unwrap();
		assert_eq!(sink.open_handles().await, 0);
	}

	#[tokio::test]
	async fn test_cancelled_flush_keeps_entries_pending() {
		#[derive(Default)]
		struct StallingSink {
			stall: AtomicBool,
			inner: RecordingSink,
		}

		#[async_trait]
		impl LogSink for StallingSink {
			fn name(&self) -> &str {
				"stalling"
			}

			async fn bulk_write(
				&self,
				entries: &[LogEntry],
				destination: &str,
			) -> Result<(), SinkError> {
				if self.stall.load(Ordering::SeqCst) {
					tokio::time::sleep(Duration::from_secs(10)).await;
				}
				self.inner.bulk_write(entries, destination).await
			}
		}

		let sink = Arc::new(StallingSink::default());
		sink.stall.store(true, Ordering::SeqCst);
		let log = BufferedLog::new(
			SessionId::new("FIX.4.2", "AAA", "BBB").key(),
			Arc::clone(&sink) as Arc<dyn LogSink>,
			Destinations::new("messageslog", "eventslog"),
		);

		let timed_out = tokio::time::timeout(Duration::from_millis(50), log.on_incoming("A")).await;
		assert!(timed_out.is_err());
		assert_eq!(log.pending(LogChannel::Message).await, 1);
		assert!(sink.inner.writes().await.is_empty());

		sink.stall.store(false, Ordering::SeqCst);
		log.flush().await.unwrap();
		assert_eq!(
			sink.inner.writes().await,
			vec![("messageslog".to_string(), strings(&["A"]))]
		);
		assert_eq!(log.pending(LogChannel::Message).await, 0);
	}

	#[tokio::test]
	async fn test_session_key_and_destinations() {
		let log = new_log(Arc::new(RecordingSink::default()));
		assert_eq!(log.session_key().as_str(), "FIX.4.2-AAA-BBB");
		assert_eq!(log.destinations().messages, "messageslog");
	}
}
