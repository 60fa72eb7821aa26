// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Default provider implementations installed when the host supplies none.

use async_trait::async_trait;
use tracing::debug;
use warden_authz_core::{ProviderError, Subject};

use super::{OwnershipProvider, RoleProvider, SubjectProvider};

/// Uses the subject's email-like field as the policy subject.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailSubjectProvider;

#[async_trait]
impl SubjectProvider for EmailSubjectProvider {
	async fn get_subject(&self, user: &dyn Subject) -> Result<String, ProviderError> {
		let email = user.email();
		if email.is_empty() {
			return Err(ProviderError::failed(
				"email_subject",
				format!("subject {} has no email", user.id()),
			));
		}
		Ok(email.to_string())
	}
}

/// Compares against the subject's primary role, with superadmin bypass.
#[derive(Debug, Clone, Default)]
pub struct DefaultRoleProvider {
	superadmin: Option<String>,
}

impl DefaultRoleProvider {
	pub fn new(superadmin: Option<String>) -> Self {
		Self { superadmin }
	}

	fn is_superadmin(&self, user: &dyn Subject) -> bool {
		self.superadmin.as_deref() == Some(user.role())
	}
}

#[async_trait]
impl RoleProvider for DefaultRoleProvider {
	async fn get_roles(&self, user: &dyn Subject) -> Result<Vec<String>, ProviderError> {
		Ok(vec![user.role().to_string()])
	}

	async fn has_role(&self, user: &dyn Subject, role: &str) -> Result<bool, ProviderError> {
		if self.is_superadmin(user) {
			return Ok(true);
		}
		if let Some(answer) = user.has_role(role) {
			return Ok(answer);
		}
		Ok(user.role() == role)
	}
}

/// Wildcard ownership provider: superadmin owns everything, everyone else
/// gets `default_allow` (deny unless configured otherwise).
#[derive(Debug, Clone, Default)]
pub struct DefaultOwnershipProvider {
	superadmin: Option<String>,
	default_allow: bool,
}

impl DefaultOwnershipProvider {
	pub fn new(superadmin: Option<String>, default_allow: bool) -> Self {
		Self {
			superadmin,
			default_allow,
		}
	}

	pub fn default_allow(&self) -> bool {
		self.default_allow
	}
}

#[async_trait]
impl OwnershipProvider for DefaultOwnershipProvider {
	async fn check_ownership(
		&self,
		user: &dyn Subject,
		resource_type: &str,
		resource_id: &str,
	) -> Result<bool, ProviderError> {
		if self.superadmin.as_deref() == Some(user.role()) {
			return Ok(true);
		}
		debug!(
			resource_type,
			resource_id,
			default_allow = self.default_allow,
			"no ownership provider for resource type, using default"
		);
		Ok(self.default_allow)
	}
}

/// Adapts a synchronous closure into an [`OwnershipProvider`].
///
/// ```ignore
/// service.register_ownership_provider(
/// 	"invoice",
/// 	Arc::new(OwnershipFn::new(|user, id| owners.get(id) == Some(&user.id()))),
/// )?;
/// ```
pub struct OwnershipFn<F> {
	check: F,
}

impl<F> OwnershipFn<F>
where
	F: Fn(&dyn Subject, &str) -> bool + Send + Sync,
{
	pub fn new(check: F) -> Self {
		Self { check }
	}
}

#[async_trait]
impl<F> OwnershipProvider for OwnershipFn<F>
where
	F: Fn(&dyn Subject, &str) -> bool + Send + Sync,
{
	async fn check_ownership(
		&self,
		user: &dyn Subject,
		_resource_type: &str,
		resource_id: &str,
	) -> Result<bool, ProviderError> {
		Ok((self.check)(user, resource_id))
	}
}
