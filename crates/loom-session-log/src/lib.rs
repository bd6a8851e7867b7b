// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Durable message and event logs for Loom messaging sessions.
//!
//! This crate provides:
//! - [`BufferedLog`] - Per-session log with separate message and event buffers
//! - [`FlushPolicy`] - When buffered entries are handed to the sink
//! - [`LogSink`] - Persistence backends (plain files, SQLite)
//! - [`LogFactory`] - Builds each session's log from [`SessionSettings`]
//!
//! Appends and flushes run in the caller's task. A failed flush keeps its
//! entries buffered, so they are resent by the next flush of that channel.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use loom_session_log::{ConfiguredLogFactory, LogFactory, SessionSettings};
//! use loom_session_log_core::SessionId;
//!
//! let settings = Arc::new(SessionSettings::load("/etc/loom/session-log.toml")?);
//! let factory = ConfiguredLogFactory::new(settings);
//!
//! let log = factory.create(&SessionId::new("FIX.4.2", "AAA", "BBB"))?;
//! log.on_event("logon").await?;
//! log.on_incoming("8=FIX.4.2\x019=65\x0135=A").await?;
//! log.flush().await?;
//! log.dispose().await?;
//! ```

pub mod buffer;
pub mod error;
pub mod factory;
pub mod log;
pub mod policy;
pub mod retry;
pub mod sink;

pub use buffer::{LogBuffer, PendingBatch};
pub use error::{LogError, LogResult, SinkError};
#[cfg(feature = "sink-file")]
pub use factory::FileLogFactory;
#[cfg(feature = "sink-sqlite")]
pub use factory::SqlLogFactory;
pub use factory::{factory_for_backend, ConfiguredLogFactory, LogFactory};
pub use log::{BufferedLog, SessionLog};
pub use loom_session_log_config::SessionSettings;
pub use policy::{flush_policy_from_config, AlwaysFlush, FlushPolicy, MaxAge, MaxEntries};
pub use retry::write_with_retry;
pub use sink::{Destinations, LogSink};
