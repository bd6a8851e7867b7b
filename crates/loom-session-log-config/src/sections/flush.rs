// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Flush policy configuration section.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DEFAULT_MAX_ENTRIES: usize = 100;
const DEFAULT_MAX_AGE_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FlushPolicyKind {
	#[default]
	Always,
	MaxEntries,
	MaxAge,
}

impl std::str::FromStr for FlushPolicyKind {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"always" => Ok(Self::Always),
			"max_entries" => Ok(Self::MaxEntries),
			"max_age" => Ok(Self::MaxAge),
			other => Err(format!(
				"unknown flush policy '{other}' (expected always, max_entries or max_age)"
			)),
		}
	}
}

/// Resolved flush policy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushPolicyConfig {
	/// Persist after every append.
	#[default]
	Always,
	/// Persist once this many entries are pending.
	MaxEntries(usize),
	/// Persist once the oldest pending entry is older than this.
	MaxAge(Duration),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FlushConfigLayer {
	pub policy: Option<FlushPolicyKind>,
	pub max_entries: Option<usize>,
	pub max_age_ms: Option<u64>,
}

impl FlushConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.policy.is_some() {
			self.policy = other.policy;
		}
		if other.max_entries.is_some() {
			self.max_entries = other.max_entries;
		}
		if other.max_age_ms.is_some() {
			self.max_age_ms = other.max_age_ms;
		}
	}

	pub fn finalize(self) -> Result<FlushPolicyConfig, ConfigError> {
		match self.policy.unwrap_or_default() {
			FlushPolicyKind::Always => Ok(FlushPolicyConfig::Always),
			FlushPolicyKind::MaxEntries => {
				let max_entries = self.max_entries.unwrap_or(DEFAULT_MAX_ENTRIES);
				if max_entries == 0 {
					return Err(ConfigError::InvalidValue {
						key: "flush.max_entries".to_string(),
						message: "must be at least 1".to_string(),
					});
				}
				Ok(FlushPolicyConfig::MaxEntries(max_entries))
			}
			FlushPolicyKind::MaxAge => Ok(FlushPolicyConfig::MaxAge(Duration::from_millis(
				self.max_age_ms.unwrap_or(DEFAULT_MAX_AGE_MS),
			))),
		}
	}
}
