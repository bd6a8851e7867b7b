// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session identity and the namespace key derived from it.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Identity fields of a messaging session.
///
/// Optional fields use the empty string for "not set", so two identities with
/// the same field values always compare (and hash) equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId {
	pub begin_string: String,
	pub sender_comp_id: String,
	#[serde(default)]
	pub sender_sub_id: String,
	#[serde(default)]
	pub sender_location_id: String,
	pub target_comp_id: String,
	#[serde(default)]
	pub target_sub_id: String,
	#[serde(default)]
	pub target_location_id: String,
	#[serde(default)]
	pub session_qualifier: String,
}

impl SessionId {
	#[must_use]
	pub fn new(
		begin_string: impl Into<String>,
		sender_comp_id: impl Into<String>,
		target_comp_id: impl Into<String>,
	) -> Self {
		Self {
			begin_string: begin_string.into(),
			sender_comp_id: sender_comp_id.into(),
			target_comp_id: target_comp_id.into(),
			..Default::default()
		}
	}

	#[must_use]
	pub fn with_sender_sub_id(mut self, value: impl Into<String>) -> Self {
		self.sender_sub_id = value.into();
		self
	}

	#[must_use]
	pub fn with_sender_location_id(mut self, value: impl Into<String>) -> Self {
		self.sender_location_id = value.into();
		self
	}

	#[must_use]
	pub fn with_target_sub_id(mut self, value: impl Into<String>) -> Self {
		self.target_sub_id = value.into();
		self
	}

	#[must_use]
	pub fn with_target_location_id(mut self, value: impl Into<String>) -> Self {
		self.target_location_id = value.into();
		self
	}

	#[must_use]
	pub fn with_session_qualifier(mut self, value: impl Into<String>) -> Self {
		self.session_qualifier = value.into();
		self
	}

	/// Check that the mandatory identity fields are present.
	pub fn validate(&self) -> Result<(), CoreError> {
		if self.begin_string.is_empty() {
			return Err(CoreError::EmptyField("begin_string"));
		}
		if self.sender_comp_id.is_empty() {
			return Err(CoreError::EmptyField("sender_comp_id"));
		}
		if self.target_comp_id.is_empty() {
			return Err(CoreError::EmptyField("target_comp_id"));
		}
		Ok(())
	}

	/// Namespace key for this session's logs.
	#[must_use]
	pub fn key(&self) -> SessionKey {
		SessionKey::build(self)
	}
}

impl std::fmt::Display for SessionId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}:{}", self.begin_string, self.sender_comp_id)?;
		for part in [&self.sender_sub_id, &self.sender_location_id] {
			if !part.is_empty() {
				write!(f, "/{part}")?;
			}
		}
		write!(f, "->{}", self.target_comp_id)?;
		for part in [&self.target_sub_id, &self.target_location_id] {
			if !part.is_empty() {
				write!(f, "/{part}")?;
			}
		}
		if !self.session_qualifier.is_empty() {
			write!(f, ":{}", self.session_qualifier)?;
		}
		Ok(())
	}
}

/// Deterministic namespace string for one session's logs.
///
/// Layout: `BEGIN-SENDER[_SUB][_LOC]-TARGET[_SUB][_LOC][-QUALIFIER]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey(String);

impl SessionKey {
	#[must_use]
	pub fn build(session: &SessionId) -> Self {
		let mut key = String::with_capacity(64);

		key.push_str(&session.begin_string);
		key.push('-');
		key.push_str(&session.sender_comp_id);
		push_optional(&mut key, &session.sender_sub_id);
		push_optional(&mut key, &session.sender_location_id);

		key.push('-');
		key.push_str(&session.target_comp_id);
		push_optional(&mut key, &session.target_sub_id);
		push_optional(&mut key, &session.target_location_id);

		if !session.session_qualifier.is_empty() {
			key.push('-');
			key.push_str(&session.session_qualifier);
		}

		Self(key)
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn into_inner(self) -> String {
		self.0
	}
}

fn push_optional(key: &mut String, part: &str) {
	if !part.is_empty() {
		key.push('_');
		key.push_str(part);
	}
}

impl From<&SessionId> for SessionKey {
	fn from(session: &SessionId) -> Self {
		Self::build(session)
	}
}

impl AsRef<str> for SessionKey {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

impl std::fmt::Display for SessionKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}
