// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `casbin`-backed policy evaluator.

use async_trait::async_trait;
use casbin::prelude::{CoreApi, DefaultModel, Enforcer, FileAdapter, MemoryAdapter, MgmtApi};
use std::path::Path;
use tokio::sync::RwLock;
use tracing::{info, instrument};
use warden_authz_core::ProviderError;

use super::PolicyEvaluator;
use crate::error::ConfigurationError;

/// RBAC model with subject → role grouping and `*` object/action wildcards.
pub const DEFAULT_RBAC_MODEL: &str = r#"
[request_definition]
r = sub, obj, act

[policy_definition]
p = sub, obj, act

[role_definition]
g = _, _

[policy_effect]
e = some(where (p.eft == allow))

[matchers]
m = g(r.sub, p.sub) && (r.obj == p.obj || p.obj == "*") && (r.act == p.act || p.act == "*")
"#;

fn policy_error(err: casbin::Error) -> ProviderError {
	ProviderError::Policy(err.to_string())
}

/// Wraps a `casbin` enforcer behind the [`PolicyEvaluator`] seam.
///
/// Enforcement takes a read lock; policy mutations take the write lock.
pub struct CasbinPolicyEvaluator {
	enforcer: RwLock<Enforcer>,
}

impl CasbinPolicyEvaluator {
	pub fn new(enforcer: Enforcer) -> Self {
		Self {
			enforcer: RwLock::new(enforcer),
		}
	}

	/// In-memory policy over the given model text. Rules are added at runtime.
	pub async fn from_model_str(model: &str) -> Result<Self, ConfigurationError> {
		let model = DefaultModel::from_str(model)
			.await
			.map_err(|e| ConfigurationError::PolicyLoad(format!("invalid casbin model: {e}")))?;
		let enforcer = Enforcer::new(model, MemoryAdapter::default())
			.await
			.map_err(|e| ConfigurationError::PolicyLoad(e.to_string()))?;
		Ok(Self::new(enforcer))
	}

	/// In-memory policy over [`DEFAULT_RBAC_MODEL`].
	pub async fn with_default_model() -> Result<Self, ConfigurationError> {
		Self::from_model_str(DEFAULT_RBAC_MODEL).await
	}

	/// Loads the model and a CSV policy file from disk.
	#[instrument(level = "debug", skip_all, fields(model = %model_path.display(), policy = %policy_path.display()))]
	pub async fn from_files(model_path: &Path, policy_path: &Path) -> Result<Self, ConfigurationError> {
		let model = DefaultModel::from_file(model_path).await.map_err(|e| {
			ConfigurationError::PolicyLoad(format!(
				"failed to load casbin model {}: {e}",
				model_path.display()
			))
		})?;
		let adapter = FileAdapter::new(policy_path.to_string_lossy().into_owned());
		let enforcer = Enforcer::new(model, adapter).await.map_err(|e| {
			ConfigurationError::PolicyLoad(format!(
				"failed to load casbin policy {}: {e}",
				policy_path.display()
			))
		})?;

		info!("casbin policy loaded");
		Ok(Self::new(enforcer))
	}
}

impl std::fmt::Debug for CasbinPolicyEvaluator {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CasbinPolicyEvaluator").finish_non_exhaustive()
	}
}

#[async_trait]
impl PolicyEvaluator for CasbinPolicyEvaluator {
	async fn enforce(&self, subject: &str, object: &str, action: &str) -> Result<bool, ProviderError> {
		self.enforcer
			.read()
			.await
			.enforce((subject, object, action))
			.map_err(policy_error)
	}

	async fn add_policy(&self, subject: &str, object: &str, action: &str) -> Result<bool, ProviderError> {
		self.enforcer
			.write()
			.await
			.add_policy(vec![subject.to_string(), object.to_string(), action.to_string()])
			.await
			.map_err(policy_error)
	}

	async fn remove_policy(
		&self,
		subject: &str,
		object: &str,
		action: &str,
	) -> Result<bool, ProviderError> {
		self.enforcer
			.write()
			.await
			.remove_policy(vec![subject.to_string(), object.to_string(), action.to_string()])
			.await
			.map_err(policy_error)
	}

	async fn add_role_for_subject(&self, subject: &str, role: &str) -> Result<bool, ProviderError> {
		self.enforcer
			.write()
			.await
			.add_grouping_policy(vec![subject.to_string(), role.to_string()])
			.await
			.map_err(policy_error)
	}

	async fn remove_role_for_subject(
		&self,
		subject: &str,
		role: &str,
	) -> Result<bool, ProviderError> {
		self.enforcer
			.write()
			.await
			.remove_grouping_policy(vec![subject.to_string(), role.to_string()])
			.await
			.map_err(policy_error)
	}
}
