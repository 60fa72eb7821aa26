// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization engine configuration section.

use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_CACHE_MAX_ENTRIES: usize = 10_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuthzConfigLayer {
	pub roles: Option<Vec<String>>,
	pub superadmin_role: Option<String>,
	pub cache_ttl_secs: Option<u64>,
	pub cache_max_entries: Option<usize>,
	pub default_allow_ownership: Option<bool>,
}

impl AuthzConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.roles.is_some() {
			self.roles = other.roles;
		}
		if other.superadmin_role.is_some() {
			self.superadmin_role = other.superadmin_role;
		}
		if other.cache_ttl_secs.is_some() {
			self.cache_ttl_secs = other.cache_ttl_secs;
		}
		if other.cache_max_entries.is_some() {
			self.cache_max_entries = other.cache_max_entries;
		}
		if other.default_allow_ownership.is_some() {
			self.default_allow_ownership = other.default_allow_ownership;
		}
	}

	pub fn finalize(self) -> AuthzConfig {
		AuthzConfig {
			roles: self.roles.unwrap_or_default(),
			superadmin_role: self.superadmin_role,
			cache_ttl_secs: self.cache_ttl_secs.unwrap_or(DEFAULT_CACHE_TTL_SECS),
			cache_max_entries: self.cache_max_entries.unwrap_or(DEFAULT_CACHE_MAX_ENTRIES),
			default_allow_ownership: self.default_allow_ownership.unwrap_or(false),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthzConfig {
	/// Closed role set. Empty means roles are not validated against a set.
	pub roles: Vec<String>,
	pub superadmin_role: Option<String>,
	/// Permission cache TTL; `0` disables expiry.
	pub cache_ttl_secs: u64,
	pub cache_max_entries: usize,
	/// Answer for ownership checks with no type-specific provider.
	pub default_allow_ownership: bool,
}

impl AuthzConfig {
	/// The permission cache TTL, or `None` when entries never expire.
	pub fn cache_ttl(&self) -> Option<Duration> {
		(self.cache_ttl_secs > 0).then(|| Duration::from_secs(self.cache_ttl_secs))
	}
}

impl Default for AuthzConfig {
	fn default() -> Self {
		Self {
			roles: Vec::new(),
			superadmin_role: None,
			cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
			cache_max_entries: DEFAULT_CACHE_MAX_ENTRIES,
			default_allow_ownership: false,
		}
	}
}
