// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-process policy table.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use warden_authz_core::ProviderError;

use super::PolicyEvaluator;

/// Matches any object or action.
const ANY: &str = "*";

/// One `(subject, object, action)` allow rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyRule {
	pub subject: String,
	pub object: String,
	pub action: String,
}

impl PolicyRule {
	pub fn new(subject: impl Into<String>, object: impl Into<String>, action: impl Into<String>) -> Self {
		Self {
			subject: subject.into(),
			object: object.into(),
			action: action.into(),
		}
	}

	fn matches(&self, object: &str, action: &str) -> bool {
		(self.object == object || self.object == ANY) && (self.action == action || self.action == ANY)
	}
}

/// Allow-list evaluator with transitive subject → role grouping.
///
/// Rules may use `*` as object or action. Anything not explicitly allowed is
/// denied.
#[derive(Debug, Default)]
pub struct MemoryPolicyEvaluator {
	rules: RwLock<HashSet<PolicyRule>>,
	groupings: RwLock<HashMap<String, HashSet<String>>>,
}

impl MemoryPolicyEvaluator {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds an evaluator pre-loaded with rules.
	pub fn with_rules(rules: impl IntoIterator<Item = PolicyRule>) -> Self {
		Self {
			rules: RwLock::new(rules.into_iter().collect()),
			groupings: RwLock::new(HashMap::new()),
		}
	}

	pub fn rules(&self) -> Vec<PolicyRule> {
		self.rules.read().iter().cloned().collect()
	}

	/// `subject` plus every role reachable through groupings.
	fn identities(&self, subject: &str) -> HashSet<String> {
		let groupings = self.groupings.read();
		let mut seen = HashSet::from([subject.to_string()]);
		let mut queue = VecDeque::from([subject.to_string()]);

		while let Some(current) = queue.pop_front() {
			if let Some(roles) = groupings.get(&current) {
				for role in roles {
					if seen.insert(role.clone()) {
						queue.push_back(role.clone());
					}
				}
			}
		}

		seen
	}
}

#[async_trait]
impl PolicyEvaluator for MemoryPolicyEvaluator {
	async fn enforce(&self, subject: &str, object: &str, action: &str) -> Result<bool, ProviderError> {
		let identities = self.identities(subject);
		let rules = self.rules.read();
		Ok(rules
			.iter()
			.any(|rule| identities.contains(&rule.subject) && rule.matches(object, action)))
	}

	async fn add_policy(&self, subject: &str, object: &str, action: &str) -> Result<bool, ProviderError> {
		Ok(self.rules.write().insert(PolicyRule::new(subject, object, action)))
	}

	async fn remove_policy(
		&self,
		subject: &str,
		object: &str,
		action: &str,
	) -> Result<bool, ProviderError> {
		Ok(self.rules.write().remove(&PolicyRule::new(subject, object, action)))
	}

	async fn add_role_for_subject(&self, subject: &str, role: &str) -> Result<bool, ProviderError> {
		if subject == role {
			return Err(ProviderError::Policy(format!(
				"'{subject}' cannot be granted itself as a role"
			)));
		}
		Ok(self
			.groupings
			.write()
			.entry(subject.to_string())
			.or_default()
			.insert(role.to_string()))
	}

	async fn remove_role_for_subject(
		&self,
		subject: &str,
		role: &str,
	) -> Result<bool, ProviderError> {
		let mut groupings = self.groupings.write();
		let removed = groupings
			.get_mut(subject)
			.is_some_and(|roles| roles.remove(role));
		if groupings.get(subject).is_some_and(HashSet::is_empty) {
			groupings.remove(subject);
		}
		Ok(removed)
	}
}
