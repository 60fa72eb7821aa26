// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The policy evaluator seam.
//!
//! The engine never interprets policy rules itself; it asks a
//! [`PolicyEvaluator`] whether `(subject, object, action)` is allowed. Two
//! implementations ship with the crate:
//!
//! - [`MemoryPolicyEvaluator`]: an in-process rule table with subject → role
//!   grouping, populated through the CRUD calls
//! - [`CasbinPolicyEvaluator`]: a `casbin` enforcer loaded from a model and a
//!   policy source

mod casbin;
mod memory;

pub use self::casbin::{CasbinPolicyEvaluator, DEFAULT_RBAC_MODEL};
pub use self::memory::{MemoryPolicyEvaluator, PolicyRule};

use async_trait::async_trait;
use std::sync::Arc;
use warden_authz_config::{PolicyBackend, PolicyConfig};
use warden_authz_core::ProviderError;

use crate::error::ConfigurationError;

/// Rule engine answering "may `subject` do `action` on `object`".
#[async_trait]
pub trait PolicyEvaluator: Send + Sync {
	async fn enforce(&self, subject: &str, object: &str, action: &str) -> Result<bool, ProviderError>;

	/// Returns `Ok(false)` if the rule already existed.
	async fn add_policy(&self, subject: &str, object: &str, action: &str) -> Result<bool, ProviderError>;

	/// Returns `Ok(false)` if the rule did not exist.
	async fn remove_policy(
		&self,
		subject: &str,
		object: &str,
		action: &str,
	) -> Result<bool, ProviderError>;

	/// Makes `subject` inherit the rules of `role`.
	async fn add_role_for_subject(&self, subject: &str, role: &str) -> Result<bool, ProviderError>;

	async fn remove_role_for_subject(&self, subject: &str, role: &str)
		-> Result<bool, ProviderError>;
}

/// Builds the evaluator selected by configuration.
pub async fn evaluator_from_config(
	config: &PolicyConfig,
) -> Result<Arc<dyn PolicyEvaluator>, ConfigurationError> {
	match config.backend {
		PolicyBackend::Memory => Ok(Arc::new(MemoryPolicyEvaluator::new())),
		PolicyBackend::Casbin => {
			let (Some(model_path), Some(policy_path)) = (&config.model_path, &config.policy_path)
			else {
				return Err(ConfigurationError::MissingPolicySource(
					"casbin backend requires model_path and policy_path".to_string(),
				));
			};
			let evaluator = CasbinPolicyEvaluator::from_files(model_path, policy_path).await?;
			Ok(Arc::new(evaluator))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn memory_backend_is_default() {
		let evaluator = evaluator_from_config(&PolicyConfig::default()).await.unwrap();
		assert!(!evaluator.enforce("alice", "doc", "read").await.unwrap());
	}

	#[tokio::test]
	async fn casbin_without_paths_is_missing_source() {
		let config = PolicyConfig {
			backend: PolicyBackend::Casbin,
			model_path: None,
			policy_path: None,
		};
		let result = evaluator_from_config(&config).await;
		assert!(matches!(
			result,
			Err(ConfigurationError::MissingPolicySource(_))
		));
	}
}
