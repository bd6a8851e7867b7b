// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#![cfg(feature = "sink-file")]

use std::path::Path;
use std::sync::Arc;

use loom_session_log::{ConfiguredLogFactory, FileLogFactory, LogFactory, SessionSettings};
use loom_session_log_core::SessionId;
use tempfile::TempDir;

fn settings_for(dir: &Path, extra: &str) -> Arc<SessionSettings> {
	let toml = format!(
		"[default]\nfile_log_path = \"{}\"\n{extra}",
		dir.display()
	);
	Arc::new(SessionSettings::from_toml_str(&toml).unwrap())
}

async fn logged_messages(path: &Path) -> Vec<String> {
	tokio::fs::read_to_string(path)
		.await
		.unwrap()
		.lines()
		.map(|line| line.split_once(" : ").unwrap().1.to_string())
		.collect()
}

#[tokio::test]
async fn file_log_writes_both_channels() {
	let dir = TempDir::new().unwrap();
	let factory = FileLogFactory::new(settings_for(dir.path(), ""));

	let log = factory
		.create(&SessionId::new("FIX.4.2", "AAA", "BBB"))
		.unwrap();
	log.on_incoming("A").await.unwrap();
	log.on_outgoing("B").await.unwrap();
	log.on_event("E1").await.unwrap();
	log.dispose().await.unwrap();

	let messages = dir.path().join("FIX.4.2-AAA-BBB.messages.current.log");
	let events = dir.path().join("FIX.4.2-AAA-BBB.event.current.log");
	assert_eq!(logged_messages(&messages).await, vec!["A", "B"]);
	assert_eq!(logged_messages(&events).await, vec!["E1"]);
}

#[tokio::test]
async fn file_log_survives_dispose_and_recreate() {
	let dir = TempDir::new().unwrap();
	let factory = FileLogFactory::new(settings_for(dir.path(), ""));
	let session = SessionId::new("FIX.4.4", "AAA", "BBB").with_sender_sub_id("S1");

	let first = factory.create(&session).unwrap();
	first.on_event("logon").await.unwrap();
	first.dispose().await.unwrap();

	let second = factory.create(&session).unwrap();
	second.on_event("logout").await.unwrap();
	second.dispose().await.unwrap();

	let events = dir.path().join("FIX.4.4-AAA_S1-BBB.event.current.log");
	assert_eq!(logged_messages(&events).await, vec!["logon", "logout"]);
}

#[tokio::test]
async fn batched_file_log_persists_on_flush() {
	let dir = TempDir::new().unwrap();
	let settings = settings_for(
		dir.path(),
		"[default.flush]\npolicy = \"max_entries\"\nmax_entries = 10\n",
	);
	let factory = ConfiguredLogFactory::new(settings);

	let log = factory
		.create(&SessionId::new("FIX.4.2", "AAA", "BBB"))
		.unwrap();
	for i in 0..3 {
		log.on_incoming(&format!("msg-{i}")).await.unwrap();
	}

	let messages = dir.path().join("FIX.4.2-AAA-BBB.messages.current.log");
	assert!(!messages.exists());

	log.flush().await.unwrap();
	assert_eq!(
		logged_messages(&messages).await,
		vec!["msg-0", "msg-1", "msg-2"]
	);
}
