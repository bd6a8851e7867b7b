// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-session log backend configuration.

use serde::{Deserialize, Serialize};

use super::flush::{FlushConfigLayer, FlushPolicyConfig};
use super::retry::{RetryConfig, RetryConfigLayer};
use crate::error::ConfigError;

pub const DEFAULT_MESSAGE_TABLE: &str = "messageslog";
pub const DEFAULT_EVENT_TABLE: &str = "eventslog";

/// Which persistence backend a session's log is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogBackend {
	#[default]
	File,
	Sql,
}

impl std::str::FromStr for LogBackend {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"file" => Ok(Self::File),
			"sql" | "sqlite" => Ok(Self::Sql),
			other => Err(format!("unknown log backend '{other}' (expected file or sql)")),
		}
	}
}

/// Whether relational destinations are shared across sessions or namespaced
/// by the session key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TableScope {
	#[default]
	PerSession,
	Shared,
}

impl std::str::FromStr for TableScope {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"per_session" => Ok(Self::PerSession),
			"shared" => Ok(Self::Shared),
			other => Err(format!(
				"unknown table scope '{other}' (expected per_session or shared)"
			)),
		}
	}
}

/// Session log configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionLogConfigLayer {
	pub backend: Option<LogBackend>,
	pub file_log_path: Option<String>,
	pub sql_log_connection_string: Option<String>,
	pub sql_log_message_table: Option<String>,
	pub sql_log_event_table: Option<String>,
	pub sql_log_table_scope: Option<TableScope>,
	pub flush: Option<FlushConfigLayer>,
	pub retry: Option<RetryConfigLayer>,
}

impl SessionLogConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.backend.is_some() {
			self.backend = other.backend;
		}
		if other.file_log_path.is_some() {
			self.file_log_path = other.file_log_path;
		}
		if other.sql_log_connection_string.is_some() {
			self.sql_log_connection_string = other.sql_log_connection_string;
		}
		if other.sql_log_message_table.is_some() {
			self.sql_log_message_table = other.sql_log_message_table;
		}
		if other.sql_log_event_table.is_some() {
			self.sql_log_event_table = other.sql_log_event_table;
		}
		if other.sql_log_table_scope.is_some() {
			self.sql_log_table_scope = other.sql_log_table_scope;
		}
		if let Some(flush) = other.flush {
			self.flush.get_or_insert_with(Default::default).merge(flush);
		}
		if let Some(retry) = other.retry {
			self.retry.get_or_insert_with(Default::default).merge(retry);
		}
	}

	pub fn finalize(self) -> Result<SessionLogConfig, ConfigError> {
		let message_table = non_empty(self.sql_log_message_table, "sql_log_message_table")?
			.unwrap_or_else(|| DEFAULT_MESSAGE_TABLE.to_string());
		let event_table = non_empty(self.sql_log_event_table, "sql_log_event_table")?
			.unwrap_or_else(|| DEFAULT_EVENT_TABLE.to_string());

		Ok(SessionLogConfig {
			backend: self.backend.unwrap_or_default(),
			file_log_path: self.file_log_path.filter(|p| !p.is_empty()),
			sql_log_connection_string: self.sql_log_connection_string.filter(|s| !s.is_empty()),
			sql_log_message_table: message_table,
			sql_log_event_table: event_table,
			sql_log_table_scope: self.sql_log_table_scope.unwrap_or_default(),
			flush: self.flush.unwrap_or_default().finalize()?,
			retry: self.retry.unwrap_or_default().finalize()?,
		})
	}
}

fn non_empty(value: Option<String>, key: &str) -> Result<Option<String>, ConfigError> {
	match value {
		Some(v) if v.trim().is_empty() => Err(ConfigError::InvalidValue {
			key: key.to_string(),
			message: "must not be empty".to_string(),
		}),
		other => Ok(other),
	}
}

/// Session log configuration (runtime, fully resolved).
///
/// The backend locations stay optional here; factories decide which of them
/// are required.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionLogConfig {
	pub backend: LogBackend,
	pub file_log_path: Option<String>,
	pub sql_log_connection_string: Option<String>,
	pub sql_log_message_table: String,
	pub sql_log_event_table: String,
	pub sql_log_table_scope: TableScope,
	pub flush: FlushPolicyConfig,
	pub retry: RetryConfig,
}

impl Default for SessionLogConfig {
	fn default() -> Self {
		Self {
			backend: LogBackend::default(),
			file_log_path: None,
			sql_log_connection_string: None,
			sql_log_message_table: DEFAULT_MESSAGE_TABLE.to_string(),
			sql_log_event_table: DEFAULT_EVENT_TABLE.to_string(),
			sql_log_table_scope: TableScope::default(),
			flush: FlushPolicyConfig::default(),
			retry: RetryConfig::default(),
		}
	}
}
