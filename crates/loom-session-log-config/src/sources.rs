// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults, TOML files and environment variables.

use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::SettingsLayer;
use crate::sections::{
	FlushConfigLayer, FlushPolicyKind, LogBackend, RetryConfigLayer, SessionLogConfigLayer,
	TableScope,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<SettingsLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<SettingsLayer, ConfigError> {
		debug!("loading defaults");
		Ok(SettingsLayer::default())
	}
}

/// TOML settings file source. A missing file contributes nothing.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/loom/session-log.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<SettingsLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(SettingsLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: SettingsLayer = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
			path: self.path.clone(),
			source: e,
		})?;

		trace!(sessions = layer.sessions.len(), "parsed settings layer from TOML");
		Ok(layer)
	}
}

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Environment variable source.
///
/// Convention: `LOOM_SESSION_LOG_<FIELD>`. Values apply to the `[default]`
/// layer, so they reach every session that does not override them.
pub struct EnvSource {
	lookup: EnvLookup,
}

impl EnvSource {
	pub fn new() -> Self {
		Self::with_lookup(|name| std::env::var(name).ok())
	}

	pub fn with_lookup(lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
		Self {
			lookup: Box::new(lookup),
		}
	}

	fn var(&self, name: &str) -> Option<String> {
		(self.lookup)(name).filter(|s| !s.is_empty())
	}

	fn parsed<T>(&self, name: &str) -> Result<Option<T>, ConfigError>
	where
		T: FromStr,
		T::Err: std::fmt::Display,
	{
		self.var(name)
			.map(|raw| {
				raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
					key: name.to_string(),
					message: e.to_string(),
				})
			})
			.transpose()
	}

	fn load_flush(&self) -> Result<Option<FlushConfigLayer>, ConfigError> {
		let layer = FlushConfigLayer {
			policy: self.parsed::<FlushPolicyKind>("LOOM_SESSION_LOG_FLUSH_POLICY")?,
			max_entries: self.parsed("LOOM_SESSION_LOG_FLUSH_MAX_ENTRIES")?,
			max_age_ms: self.parsed("LOOM_SESSION_LOG_FLUSH_MAX_AGE_MS")?,
		};
		Ok((layer != FlushConfigLayer::default()).then_some(layer))
	}

	fn load_retry(&self) -> Result<Option<RetryConfigLayer>, ConfigError> {
		let layer = RetryConfigLayer {
			max_attempts: self.parsed("LOOM_SESSION_LOG_RETRY_MAX_ATTEMPTS")?,
			base_delay_ms: self.parsed("LOOM_SESSION_LOG_RETRY_BASE_DELAY_MS")?,
			max_delay_ms: self.parsed("LOOM_SESSION_LOG_RETRY_MAX_DELAY_MS")?,
			backoff_factor: self.parsed("LOOM_SESSION_LOG_RETRY_BACKOFF_FACTOR")?,
			jitter: self.parsed("LOOM_SESSION_LOG_RETRY_JITTER")?,
		};
		Ok((layer != RetryConfigLayer::default()).then_some(layer))
	}
}

impl Default for EnvSource {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<SettingsLayer, ConfigError> {
		debug!("loading environment variables");
		let default = SessionLogConfigLayer {
			backend: self.parsed::<LogBackend>("LOOM_SESSION_LOG_BACKEND")?,
			file_log_path: self.var("LOOM_SESSION_LOG_FILE_PATH"),
			sql_log_connection_string: self.var("LOOM_SESSION_LOG_SQL_CONNECTION_STRING"),
			sql_log_message_table: self.var("LOOM_SESSION_LOG_SQL_MESSAGE_TABLE"),
			sql_log_event_table: self.var("LOOM_SESSION_LOG_SQL_EVENT_TABLE"),
			sql_log_table_scope: self.parsed::<TableScope>("LOOM_SESSION_LOG_SQL_TABLE_SCOPE")?,
			flush: self.load_flush()?,
			retry: self.load_retry()?,
		};

		Ok(SettingsLayer {
			default: Some(default),
			sessions: Vec::new(),
		})
	}
}
