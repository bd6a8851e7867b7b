// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Retry configuration for failed sink writes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DEFAULT_MAX_ATTEMPTS: u32 = 1;
const DEFAULT_BASE_DELAY_MS: u64 = 100;
const DEFAULT_MAX_DELAY_MS: u64 = 5_000;
const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

/// How a failed bulk write is retried before the error reaches the caller.
///
/// `max_attempts` counts the first attempt, so the default of 1 escalates
/// immediately.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
	pub max_attempts: u32,
	pub base_delay: Duration,
	pub max_delay: Duration,
	pub backoff_factor: f64,
	pub jitter: bool,
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			max_attempts: DEFAULT_MAX_ATTEMPTS,
			base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
			max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
			backoff_factor: DEFAULT_BACKOFF_FACTOR,
			jitter: true,
		}
	}
}

impl RetryConfig {
	/// Never retry; surface the first failure.
	pub fn escalate() -> Self {
		Self::default()
	}

	/// Delay before retry number `retry` (1-based), before jitter.
	pub fn delay_for(&self, retry: u32) -> Duration {
		let exponent = retry.saturating_sub(1).min(30) as i32;
		let scaled_ms = self.base_delay.as_millis() as f64 * self.backoff_factor.powi(exponent);
		let capped_ms = scaled_ms.min(self.max_delay.as_millis() as f64);
		Duration::from_millis(capped_ms.max(0.0).round() as u64)
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RetryConfigLayer {
	pub max_attempts: Option<u32>,
	pub base_delay_ms: Option<u64>,
	pub max_delay_ms: Option<u64>,
	pub backoff_factor: Option<f64>,
	pub jitter: Option<bool>,
}

impl RetryConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.max_attempts.is_some() {
			self.max_attempts = other.max_attempts;
		}
		if other.base_delay_ms.is_some() {
			self.base_delay_ms = other.base_delay_ms;
		}
		if other.max_delay_ms.is_some() {
			self.max_delay_ms = other.max_delay_ms;
		}
		if other.backoff_factor.is_some() {
			self.backoff_factor = other.backoff_factor;
		}
		if other.jitter.is_some() {
			self.jitter = other.jitter;
		}
	}

	pub fn finalize(self) -> Result<RetryConfig, ConfigError> {
		let max_attempts = self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS);
		if max_attempts == 0 {
			return Err(ConfigError::InvalidValue {
				key: "retry.max_attempts".to_string(),
				message: "must be at least 1".to_string(),
			});
		}

		let backoff_factor = self.backoff_factor.unwrap_or(DEFAULT_BACKOFF_FACTOR);
		if !backoff_factor.is_finite() || backoff_factor < 1.0 {
			return Err(ConfigError::InvalidValue {
				key: "retry.backoff_factor".to_string(),
				message: format!("must be a finite number >= 1.0, got {backoff_factor}"),
			});
		}

		Ok(RetryConfig {
			max_attempts,
			base_delay: Duration::from_millis(self.base_delay_ms.unwrap_or(DEFAULT_BASE_DELAY_MS)),
			max_delay: Duration::from_millis(self.max_delay_ms.unwrap_or(DEFAULT_MAX_DELAY_MS)),
			backoff_factor,
			jitter: self.jitter.unwrap_or(true),
		})
	}
}
