// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-session settings for Loom session logs.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - A `[default]` table plus `[[session]]` overrides keyed by session identity
//! - Consistent environment variable naming (`LOOM_SESSION_LOG_*`)
//!
//! # Usage
//!
//! ```ignore
//! use loom_session_log_config::SessionSettings;
//! use loom_session_log_core::SessionId;
//!
//! let settings = SessionSettings::load("/etc/loom/session-log.toml")?;
//! let resolved = settings.get(&SessionId::new("FIX.4.2", "AAA", "BBB"))?;
//! println!("logging to {}", resolved.require_file_log_path()?);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod settings;
pub mod sources;

pub use error::ConfigError;
pub use layer::{SessionSection, SettingsLayer};
pub use sections::*;
pub use settings::{SessionLogSettings, SessionSettings, FILE_LOG_PATH, SQL_LOG_CONNECTION_STRING};
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};
