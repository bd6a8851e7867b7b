// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Retry with exponential backoff for transient sink failures.

use std::future::Future;
use std::time::Duration;

use loom_session_log_config::RetryConfig;
use tracing::warn;

use crate::error::SinkError;

/// Run `op` until it succeeds, fails permanently, or `max_attempts` is used up.
///
/// Runs inline in the caller's task; the delay between attempts holds up the
/// caller like the write itself does.
pub async fn write_with_retry<F, Fut>(config: &RetryConfig, mut op: F) -> Result<(), SinkError>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<(), SinkError>>,
{
	let max_attempts = config.max_attempts.max(1);
	let mut attempt = 1;

	loop {
		match op().await {
			Ok(()) => return Ok(()),
			Err(e) if e.is_retryable() && attempt < max_attempts => {
				let delay = backoff_delay(config, attempt);
				warn!(
					attempt,
					max_attempts,
					delay_ms = delay.as_millis() as u64,
					error = %e,
					"sink write failed, retrying"
				);
				tokio::time::sleep(delay).await;
				attempt += 1;
			}
			Err(e) => return Err(e),
		}
	}
}

fn backoff_delay(config: &RetryConfig, attempt: u32) -> Duration {
	let delay = config.delay_for(attempt);
	if config.jitter {
		let max_ms = delay.as_millis() as u64;
		Duration::from_millis(fastrand::u64(0..=max_ms))
	} else {
		delay
	}
}
