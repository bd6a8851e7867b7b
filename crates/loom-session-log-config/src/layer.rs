// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial settings document, merged across sources.

use loom_session_log_core::SessionId;
use serde::{Deserialize, Serialize};

use crate::sections::SessionLogConfigLayer;

/// One `[[session]]` table: the identity fields plus any overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSection {
	#[serde(flatten)]
	pub id: SessionId,
	#[serde(flatten)]
	pub config: SessionLogConfigLayer,
}

/// A whole settings document as produced by one source.
///
/// ```toml
/// [default]
/// backend = "file"
/// file_log_path = "/var/log/loom/sessions"
///
/// [[session]]
/// begin_string = "FIX.4.2"
/// sender_comp_id = "AAA"
/// target_comp_id = "BBB"
/// backend = "sql"
/// sql_log_connection_string = "sqlite:/var/lib/loom/session-log.db"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SettingsLayer {
	#[serde(default)]
	pub default: Option<SessionLogConfigLayer>,
	#[serde(default, rename = "session")]
	pub sessions: Vec<SessionSection>,
}

impl SettingsLayer {
	pub fn merge(&mut self, other: SettingsLayer) {
		if let Some(default) = other.default {
			self.default
				.get_or_insert_with(Default::default)
				.merge(default);
		}

		for section in other.sessions {
			match self.sessions.iter_mut().find(|s| s.id == section.id) {
				Some(existing) => existing.config.merge(section.config),
				None => self.sessions.push(section),
			}
		}
	}
}
