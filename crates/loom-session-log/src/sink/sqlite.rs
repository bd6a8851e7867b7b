// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::HashSet;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use loom_session_log_core::LogEntry;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqliteSynchronous};
use sqlx::{QueryBuilder, Sqlite};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::SinkError;
use crate::sink::LogSink;

/// Rows per INSERT statement, keeping well under SQLite's bind parameter limit.
const INSERT_CHUNK_ROWS: usize = 400;

/// Bulk-inserts entries into SQLite tables, one table per destination.
///
/// Every table has exactly two columns, `timestamp` (RFC 3339, microsecond
/// precision) and `message`. A batch is written in a single transaction, so it
/// is either stored completely or not at all.
pub struct SqliteLogSink {
	options: Option<SqliteConnectOptions>,
	pool: Mutex<Option<SqlitePool>>,
	ensured_tables: Mutex<HashSet<String>>,
}

impl SqliteLogSink {
	/// Parse `connection_string` now, connect on the first write.
	pub fn connect_lazy(connection_string: &str) -> Result<Self, SinkError> {
		let options = SqliteConnectOptions::from_str(connection_string)
			.map_err(|e| SinkError::Permanent(format!("invalid connection string: {e}")))?
			.journal_mode(SqliteJournalMode::Wal)
			.synchronous(SqliteSynchronous::Normal)
			.create_if_missing(true);

		Ok(Self {
			options: Some(options),
			pool: Mutex::new(None),
			ensured_tables: Mutex::new(HashSet::new()),
		})
	}

	/// Use an existing pool. Once disposed, the sink cannot reconnect.
	pub fn from_pool(pool: SqlitePool) -> Self {
		Self {
			options: None,
			pool: Mutex::new(Some(pool)),
			ensured_tables: Mutex::new(HashSet::new()),
		}
	}

	/// Whether a pool is currently open.
	pub async fn is_connected(&self) -> bool {
		self.pool.lock().await.is_some()
	}

	async fn pool(&self) -> Result<SqlitePool, SinkError> {
		let mut guard = self.pool.lock().await;
		if let Some(pool) = guard.as_ref() {
			return Ok(pool.clone());
		}

		let options = self
			.options
			.clone()
			.ok_or_else(|| SinkError::Permanent("sink has been disposed".to_string()))?;

		let pool = SqlitePool::connect_with(options)
			.await
			.map_err(classify_error)?;
		debug!("session log database pool created");

		*guard = Some(pool.clone());
		Ok(pool)
	}
}

#[async_trait]
impl LogSink for SqliteLogSink {
	fn name(&self) -> &str {
		"sqlite"
	}

	async fn bulk_write(&self, entries: &[LogEntry], destination: &str) -> Result<(), SinkError> {
		if entries.is_empty() {
			return Ok(());
		}

		let pool = self.pool().await?;
		let table = quote_identifier(destination);
		let needs_table = !self.ensured_tables.lock().await.contains(destination);

		let mut tx = pool.begin().await.map_err(classify_error)?;

		if needs_table {
			let ddl = format!(
				"CREATE TABLE IF NOT EXISTS {table} (timestamp TEXT NOT NULL, message TEXT NOT NULL)"
			);
			sqlx::query(&ddl)
				.execute(&mut *tx)
				.await
				.map_err(classify_error)?;
		}

		for chunk in entries.chunks(INSERT_CHUNK_ROWS) {
			let mut builder: QueryBuilder<Sqlite> =
				QueryBuilder::new(format!("INSERT INTO {table} (timestamp, message) "));
			builder.push_values(chunk, |mut row, entry| {
				row.push_bind(format_timestamp(entry.timestamp()))
					.push_bind(entry.message().to_string());
			});
			builder
				.build()
				.execute(&mut *tx)
				.await
				.map_err(classify_error)?;
		}

		tx.commit().await.map_err(classify_error)?;

		if needs_table {
			self.ensured_tables
				.lock()
				.await
				.insert(destination.to_string());
		}

		Ok(())
	}

	async fn dispose(&self) -> Result<(), SinkError> {
		let pool = self.pool.lock().await.take();
		if let Some(pool) = pool {
			pool.close().await;
			debug!("session log database pool closed");
		}
		self.ensured_tables.lock().await.clear();
		Ok(())
	}

	async fn health_check(&self) -> Result<(), SinkError> {
		let pool = self.pool().await?;
		sqlx::query("SELECT 1")
			.execute(&pool)
			.await
			.map_err(|e| SinkError::Transient(format!("health check failed: {e}")))?;
		Ok(())
	}
}

pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
	timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Quote a table name as an SQL identifier.
pub fn quote_identifier(name: &str) -> String {
	format!("\"{}\"", name.replace('"', "\"\""))
}

fn classify_error(e: sqlx::Error) -> SinkError {
	if is_transient_error(&e) {
		SinkError::Transient(format!("database error: {e}"))
	} else {
		SinkError::Permanent(format!("database error: {e}"))
	}
}

fn is_transient_error(e: &sqlx::Error) -> bool {
	match e {
		sqlx::Error::Io(_) => true,
		sqlx::Error::PoolTimedOut => true,
		sqlx::Error::PoolClosed => true,
		sqlx::Error::Database(db_err) => {
			let msg = db_err.message().to_lowercase();
			msg.contains("busy") || msg.contains("locked") || msg.contains("timeout")
		}
		_ => false,
	}
}
