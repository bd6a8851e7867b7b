// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-session settings lookup.

use std::collections::HashMap;
use std::path::Path;

use loom_session_log_core::SessionId;
use tracing::debug;

use crate::error::ConfigError;
use crate::layer::SettingsLayer;
use crate::sections::{SessionLogConfig, SessionLogConfigLayer};
use crate::sources::{ConfigSource, DefaultsSource, EnvSource, TomlSource};

pub const FILE_LOG_PATH: &str = "file_log_path";
pub const SQL_LOG_CONNECTION_STRING: &str = "sql_log_connection_string";

/// Settings for every configured session, resolved on lookup.
///
/// A session that has no `[[session]]` entry resolves to the `[default]`
/// values alone.
#[derive(Debug, Clone, Default)]
pub struct SessionSettings {
	defaults: SessionLogConfigLayer,
	sessions: HashMap<SessionId, SessionLogConfigLayer>,
}

impl SessionSettings {
	pub fn new(defaults: SessionLogConfigLayer) -> Self {
		Self {
			defaults,
			sessions: HashMap::new(),
		}
	}

	/// Add or merge overrides for one session.
	pub fn with_session(mut self, session: SessionId, layer: SessionLogConfigLayer) -> Self {
		self.set_session(session, layer);
		self
	}

	pub fn set_session(&mut self, session: SessionId, layer: SessionLogConfigLayer) {
		self.sessions.entry(session).or_default().merge(layer);
	}

	/// Load from defaults, the given TOML file and `LOOM_SESSION_LOG_*` variables.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		Self::from_sources(vec![
			Box::new(DefaultsSource),
			Box::new(TomlSource::new(path.as_ref())),
			Box::new(EnvSource::new()),
		])
	}

	/// Load from `/etc/loom/session-log.toml` and the environment.
	pub fn load_system() -> Result<Self, ConfigError> {
		Self::from_sources(vec![
			Box::new(DefaultsSource),
			Box::new(TomlSource::system()),
			Box::new(EnvSource::new()),
		])
	}

	pub fn from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<Self, ConfigError> {
		sources.sort_by_key(|s| s.precedence());

		let mut merged = SettingsLayer::default();
		for source in sources {
			debug!(source = source.name(), "loading configuration source");
			merged.merge(source.load()?);
		}

		Ok(Self::from_layer(merged))
	}

	/// Parse a settings document without consulting any other source.
	pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
		let layer: SettingsLayer = toml::from_str(content).map_err(|e| ConfigError::TomlParse {
			path: "<inline>".into(),
			source: e,
		})?;
		Ok(Self::from_layer(layer))
	}

	fn from_layer(layer: SettingsLayer) -> Self {
		let mut settings = Self::new(layer.default.unwrap_or_default());
		for section in layer.sessions {
			settings.set_session(section.id, section.config);
		}
		settings
	}

	pub fn has_session(&self, session: &SessionId) -> bool {
		self.sessions.contains_key(session)
	}

	pub fn sessions(&self) -> impl Iterator<Item = &SessionId> {
		self.sessions.keys()
	}

	/// Resolve the effective settings for `session`.
	pub fn get(&self, session: &SessionId) -> Result<SessionLogSettings, ConfigError> {
		let mut layer = self.defaults.clone();
		if let Some(overrides) = self.sessions.get(session) {
			layer.merge(overrides.clone());
		}

		Ok(SessionLogSettings {
			session: session.clone(),
			config: layer.finalize()?,
		})
	}
}

/// Effective settings for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionLogSettings {
	pub session: SessionId,
	pub config: SessionLogConfig,
}

impl SessionLogSettings {
	pub fn require_file_log_path(&self) -> Result<&str, ConfigError> {
		self.config
			.file_log_path
			.as_deref()
			.ok_or_else(|| self.missing(FILE_LOG_PATH))
	}

	pub fn require_sql_connection_string(&self) -> Result<&str, ConfigError> {
		self.config
			.sql_log_connection_string
			.as_deref()
			.ok_or_else(|| self.missing(SQL_LOG_CONNECTION_STRING))
	}

	fn missing(&self, key: &'static str) -> ConfigError {
		ConfigError::MissingSetting {
			session: self.session.to_string(),
			key,
		}
	}
}
