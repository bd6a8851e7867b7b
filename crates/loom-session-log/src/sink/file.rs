// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{Datelike, Timelike, Utc};
use loom_session_log_core::LogEntry;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::SinkError;
use crate::sink::LogSink;

const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H:%M:%S%.3f";

struct FileHandle {
	path: String,
	file: File,
}

/// Appends entries to plain-text files, one file per destination path.
///
/// Destinations may contain `%Y %m %d %H %M %S` patterns; they are expanded
/// on each write and the file is reopened when the expansion changes.
#[derive(Default)]
pub struct FileLogSink {
	handles: Mutex<HashMap<String, FileHandle>>,
}

impl FileLogSink {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn open_handles(&self) -> usize {
		self.handles.lock().await.len()
	}
}

async fn open_append(path: &str) -> Result<File, SinkError> {
	if let Some(parent) = Path::new(path).parent() {
		if !parent.as_os_str().is_empty() {
			tokio::fs::create_dir_all(parent).await.map_err(|e| {
				SinkError::Transient(format!("failed to create {}: {e}", parent.display()))
			})?;
		}
	}

	OpenOptions::new()
		.create(true)
		.append(true)
		.open(path)
		.await
		.map_err(|e| SinkError::Transient(format!("failed to open file: {e}")))
}

#[async_trait]
impl LogSink for FileLogSink {
	fn name(&self) -> &str {
		"file"
	}

	async fn bulk_write(&self, entries: &[LogEntry], destination: &str) -> Result<(), SinkError> {
		if entries.is_empty() {
			return Ok(());
		}

		let expanded_path = expand_path(destination);
		let mut guard = self.handles.lock().await;

		let needs_reopen = match guard.get(destination) {
			Some(handle) => handle.path != expanded_path,
			None => true,
		};

		if needs_reopen {
			let file = open_append(&expanded_path).await?;
			debug!(path = %expanded_path, "opened log file");
			guard.insert(
				destination.to_string(),
				FileHandle {
					path: expanded_path,
					file,
				},
			);
		}

		let handle = guard
			.get_mut(destination)
			.ok_or_else(|| SinkError::Permanent("file handle not initialized".to_string()))?;

		let mut buf = String::new();
		for entry in entries {
			buf.push_str(&format_line(entry));
		}

		let written = async {
			handle.file.write_all(buf.as_bytes()).await?;
			handle.file.flush().await
		}
		.await;

		if let Err(e) = written {
			// The handle may be in an unknown state; reopen on the next attempt.
			guard.remove(destination);
			return Err(SinkError::Transient(format!(
				"failed to write to file: {e}"
			)));
		}

		Ok(())
	}

	async fn dispose(&self) -> Result<(), SinkError> {
		let mut guard = self.handles.lock().await;
		for (_, mut handle) in guard.drain() {
			handle
				.file
				.flush()
				.await
				.map_err(|e| SinkError::Transient(format!("failed to flush file: {e}")))?;
		}
		Ok(())
	}
}

pub fn format_line(entry: &LogEntry) -> String {
	format!(
		"{} : {}\n",
		entry.timestamp().format(TIMESTAMP_FORMAT),
		entry.message()
	)
}

pub fn expand_path(path: &str) -> String {
	let now = Utc::now();

	path
		.replace("%Y", &format!("{:04}", now.year()))
		.replace("%m", &format!("{:02}", now.month()))
		.replace("%d", &format!("{:02}", now.day()))
		.replace("%H", &format!("{:02}", now.hour()))
		.replace("%M", &format!("{:02}", now.minute()))
		.replace("%S", &format!("{:02}", now.second()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;

	#[test]
	fn test_format_line() {
		let ts = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap()
			+ chrono::Duration::milliseconds(678);
		let line = format_line(&LogEntry::at(ts, "8=FIX.4.2\x019=12"));
		assert_eq!(line, "20250102-03:04:05.678 : 8=FIX.4.2\x019=12\n");
	}

	#[test]
	fn test_expand_path_with_date_patterns() {
		let expanded = expand_path("/var/log/loom/%Y-%m-%d/session.log");

		assert!(!expanded.contains("%Y"));
		assert!(!expanded.contains("%m"));
		assert!(!expanded.contains("%d"));
		assert!(expanded.starts_with("/var/log/loom/"));
		assert!(expanded.ends_with("/session.log"));
	}

	#[test]
	fn test_expand_path_without_patterns() {
		let path = "/var/log/loom/FIX.4.2-AAA-BBB.messages.current.log";
		assert_eq!(expand_path(path), path);
	}

	#[tokio::test]
	async fn test_bulk_write_appends_lines() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("nested/out.log");
		let path = path.to_str().unwrap();
		let sink = FileLogSink::new();

		sink.bulk_write(&[LogEntry::new("A"), LogEntry::new("B")], path)
			.await
			.unwrap();
		sink.bulk_write(&[LogEntry::new("C")], path).await.unwrap();

		let content = tokio::fs::read_to_string(path).await.unwrap();
		let messages: Vec<_> = content
			.lines()
			.map(|l| l.split_once(" : ").unwrap().1)
			.collect();
		assert_eq!(messages, vec!["A", "B", "C"]);
	}

	#[tokio::test]
	async fn test_dispose_releases_handles_and_keeps_data() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("events.log");
		let path = path.to_str().unwrap();
		let sink = FileLogSink::new();

		sink.bulk_write(&[LogEntry::new("logon")], path).await.unwrap();
		assert_eq!(sink.open_handles().await, 1);

		sink.dispose().await.unwrap();
		sink.dispose().await.unwrap();
		assert_eq!(sink.open_handles().await, 0);

		sink.bulk_write(&[LogEntry::new("logout")], path).await.unwrap();
		let content = tokio::fs::read_to_string(path).await.unwrap();
		assert_eq!(content.lines().count(), 2);
	}
}
