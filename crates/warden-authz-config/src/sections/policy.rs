// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy evaluator source configuration section.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Which policy evaluator backs permission checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyBackend {
	/// In-process rule table, populated through the policy CRUD calls.
	#[default]
	Memory,
	/// Casbin enforcer loaded from a model file and a policy file.
	Casbin,
}

impl fmt::Display for PolicyBackend {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PolicyBackend::Memory => write!(f, "memory"),
			PolicyBackend::Casbin => write!(f, "casbin"),
		}
	}
}

impl FromStr for PolicyBackend {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"memory" => Ok(PolicyBackend::Memory),
			"casbin" => Ok(PolicyBackend::Casbin),
			other => Err(format!("unknown policy backend '{other}'")),
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PolicyConfigLayer {
	pub backend: Option<PolicyBackend>,
	pub model_path: Option<PathBuf>,
	pub policy_path: Option<PathBuf>,
}

impl PolicyConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.backend.is_some() {
			self.backend = other.backend;
		}
		if other.model_path.is_some() {
			self.model_path = other.model_path;
		}
		if other.policy_path.is_some() {
			self.policy_path = other.policy_path;
		}
	}

	pub fn finalize(self) -> PolicyConfig {
		PolicyConfig {
			backend: self.backend.unwrap_or_default(),
			model_path: self.model_path,
			policy_path: self.policy_path,
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PolicyConfig {
	pub backend: PolicyBackend,
	pub model_path: Option<PathBuf>,
	pub policy_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn backend_parses_case_insensitively() {
		assert_eq!("Casbin".parse::<PolicyBackend>(), Ok(PolicyBackend::Casbin));
		assert_eq!("memory".parse::<PolicyBackend>(), Ok(PolicyBackend::Memory));
		assert!("ldap".parse::<PolicyBackend>().is_err());
	}

	#[test]
	fn layer_finalize_defaults_to_memory() {
		let config = PolicyConfigLayer::default().finalize();
		assert_eq!(config.backend, PolicyBackend::Memory);
		assert!(config.model_path.is_none());
	}

	#[test]
	fn deserializes_backend_lowercase() {
		let layer: PolicyConfigLayer = toml::from_str("backend = \"casbin\"").unwrap();
		assert_eq!(layer.backend, Some(PolicyBackend::Casbin));
		assert!(toml::from_str::<PolicyConfigLayer>("backend = \"ldap\"").is_err());
	}
}
