// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resource-type permissions.

use crate::error::ParsePermissionError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Free-form attributes attached to a permission check.
pub type PermissionContext = BTreeMap<String, serde_json::Value>;

/// "May perform `action` on resources of type `resource`".
///
/// Equality, hashing and the string form only consider `resource` and
/// `action`; the context is informational.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
	pub resource: String,
	pub action: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub context: Option<PermissionContext>,
}

impl Permission {
	pub fn new(resource: impl Into<String>, action: impl Into<String>) -> Self {
		Self {
			resource: resource.into(),
			action: action.into(),
			context: None,
		}
	}

	/// Builder: attach a context entry.
	pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
		self
			.context
			.get_or_insert_with(BTreeMap::new)
			.insert(key.into(), value);
		self
	}
}

impl PartialEq for Permission {
	fn eq(&self, other: &Self) -> bool {
		self.resource == other.resource && self.action == other.action
	}
}

impl Eq for Permission {}

impl Hash for Permission {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.resource.hash(state);
		self.action.hash(state);
	}
}

impl fmt::Display for Permission {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.resource, self.action)
	}
}

impl FromStr for Permission {
	type Err = ParsePermissionError;

	/// Parses `resource:action`. The action is everything after the last `:`,
	/// so resources may themselves be namespaced (`billing:invoice:read`).
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let (resource, action) = s
			.rsplit_once(':')
			.ok_or_else(|| ParsePermissionError(s.to_string()))?;

		if resource.is_empty() || action.is_empty() {
			return Err(ParsePermissionError(s.to_string()));
		}

		Ok(Self::new(resource, action))
	}
}
