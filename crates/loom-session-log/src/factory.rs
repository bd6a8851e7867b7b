// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Construction of per-session logs from settings.

use std::path::Path;
use std::sync::Arc;

use loom_session_log_config::{LogBackend, SessionLogSettings, SessionSettings, TableScope};
#[cfg(feature = "sink-sqlite")]
use loom_session_log_config::{ConfigError, SQL_LOG_CONNECTION_STRING};
use loom_session_log_core::{LogChannel, SessionId, SessionKey};
use tracing::{info, instrument};

use crate::error::{LogError, LogResult};
use crate::log::{BufferedLog, SessionLog};
use crate::policy::flush_policy_from_config;
use crate::sink::{Destinations, LogSink};

/// Creates the log for a session.
///
/// A failure only concerns the session being created; the factory stays
/// usable for every other session.
pub trait LogFactory: Send + Sync {
	fn create(&self, session: &SessionId) -> LogResult<Arc<dyn SessionLog>>;
}

/// File paths `<dir>/<key>.messages.current.log` and `<dir>/<key>.event.current.log`.
pub fn file_destinations(dir: &str, key: &SessionKey) -> Destinations {
	let path_for = |channel: LogChannel| {
		Path::new(dir)
			.join(format!("{key}.{}.current.log", channel.as_str()))
			.to_string_lossy()
			.into_owned()
	};
	Destinations::new(path_for(LogChannel::Message), path_for(LogChannel::Event))
}

/// Table names for a session, prefixed with its key under per-session scope.
pub fn sql_destinations(settings: &SessionLogSettings, key: &SessionKey) -> Destinations {
	let config = &settings.config;
	match config.sql_log_table_scope {
		TableScope::PerSession => Destinations::new(
			format!("{key}_{}", config.sql_log_message_table),
			format!("{key}_{}", config.sql_log_event_table),
		),
		TableScope::Shared => Destinations::new(
			config.sql_log_message_table.clone(),
			config.sql_log_event_table.clone(),
		),
	}
}

fn build_log(
	settings: &SessionLogSettings,
	key: SessionKey,
	sink: Arc<dyn LogSink>,
	destinations: Destinations,
) -> Arc<dyn SessionLog> {
	let log = BufferedLog::new(key, sink, destinations)
		.with_flush_policy(flush_policy_from_config(&settings.config.flush))
		.with_retry(settings.config.retry.clone());
	Arc::new(log)
}

#[cfg(feature = "sink-file")]
fn file_log(session: &SessionId, settings: &SessionLogSettings) -> LogResult<Arc<dyn SessionLog>> {
	let dir = settings.require_file_log_path()?;

	let key = session.key();
	let destinations = file_destinations(dir, &key);
	info!(session_key = %key, messages = %destinations.messages, "creating file session log");

	let sink = Arc::new(crate::sink::file::FileLogSink::new());
	Ok(build_log(settings, key, sink, destinations))
}

#[cfg(feature = "sink-sqlite")]
fn sql_log(session: &SessionId, settings: &SessionLogSettings) -> LogResult<Arc<dyn SessionLog>> {
	let connection_string = settings.require_sql_connection_string()?;

	let sink = crate::sink::sqlite::SqliteLogSink::connect_lazy(connection_string).map_err(|e| {
		ConfigError::InvalidValue {
			key: SQL_LOG_CONNECTION_STRING.to_string(),
			message: e.to_string(),
		}
	})?;

	let key = session.key();
	let destinations = sql_destinations(settings, &key);
	info!(session_key = %key, messages = %destinations.messages, "creating sql session log");

	Ok(build_log(settings, key, Arc::new(sink), destinations))
}

fn backend_unavailable(backend: LogBackend) -> LogError {
	loom_session_log_config::ConfigError::InvalidValue {
		key: "backend".to_string(),
		message: format!("{backend:?} backend is not compiled in"),
	}
	.into()
}

#[cfg(feature = "sink-file")]
pub struct FileLogFactory {
	settings: Arc<SessionSettings>,
}

#[cfg(feature = "sink-file")]
impl FileLogFactory {
	pub fn new(settings: Arc<SessionSettings>) -> Self {
		Self { settings }
	}
}

#[cfg(feature = "sink-file")]
impl LogFactory for FileLogFactory {
	#[instrument(skip(self, session), fields(session = %session))]
	fn create(&self, session: &SessionId) -> LogResult<Arc<dyn SessionLog>> {
		session.validate()?;
		file_log(session, &self.settings.get(session)?)
	}
}

#[cfg(feature = "sink-sqlite")]
pub struct SqlLogFactory {
	settings: Arc<SessionSettings>,
}

#[cfg(feature = "sink-sqlite")]
impl SqlLogFactory {
	pub fn new(settings: Arc<SessionSettings>) -> Self {
		Self { settings }
	}
}

#[cfg(feature = "sink-sqlite")]
impl LogFactory for SqlLogFactory {
	#[instrument(skip(self, session), fields(session = %session))]
	fn create(&self, session: &SessionId) -> LogResult<Arc<dyn SessionLog>> {
		session.validate()?;
		sql_log(session, &self.settings.get(session)?)
	}
}

/// Picks the file or SQL backend per session from its resolved `backend`.
pub struct ConfiguredLogFactory {
	settings: Arc<SessionSettings>,
}

impl ConfiguredLogFactory {
	pub fn new(settings: Arc<SessionSettings>) -> Self {
		Self { settings }
	}
}

impl LogFactory for ConfiguredLogFactory {
	#[instrument(skip(self, session), fields(session = %session))]
	fn create(&self, session: &SessionId) -> LogResult<Arc<dyn SessionLog>> {
		session.validate()?;
		let settings = self.settings.get(session)?;
		match settings.config.backend {
			#[cfg(feature = "sink-file")]
			LogBackend::File => file_log(session, &settings),
			#[cfg(feature = "sink-sqlite")]
			LogBackend::Sql => sql_log(session, &settings),
			#[allow(unreachable_patterns)]
			other => Err(backend_unavailable(other)),
		}
	}
}

pub fn factory_for_backend(backend: LogBackend, settings: Arc<SessionSettings>) -> Arc<dyn LogFactory> {
	match backend {
		#[cfg(feature = "sink-file")]
		LogBackend::File => Arc::new(FileLogFactory::new(settings)),
		#[cfg(feature = "sink-sqlite")]
		LogBackend::Sql => Arc::new(SqlLogFactory::new(settings)),
		#[allow(unreachable_patterns)]
		other => Arc::new(UnavailableBackend(other)),
	}
}

struct UnavailableBackend(LogBackend);

impl LogFactory for UnavailableBackend {
	fn create(&self, _session: &SessionId) -> LogResult<Arc<dyn SessionLog>> {
		Err(backend_unavailable(self.0))
	}
}
