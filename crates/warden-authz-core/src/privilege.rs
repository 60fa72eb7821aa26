// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Ownership declarations and privilege bundles.

use crate::permission::Permission;
use crate::role::{Role, RoleComposition};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declares that the call parameter named `id_param` must identify an instance
/// of `resource_type` owned by the acting subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceOwnership {
	pub resource_type: String,
	pub id_param: String,
}

impl ResourceOwnership {
	pub fn new(resource_type: impl Into<String>, id_param: impl Into<String>) -> Self {
		Self {
			resource_type: resource_type.into(),
			id_param: id_param.into(),
		}
	}
}

impl fmt::Display for ResourceOwnership {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}({})", self.resource_type, self.id_param)
	}
}

/// A reusable bundle: any of `roles` (or no role constraint when empty), AND
/// `permission`, AND ownership of `resource` when set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Privilege {
	pub roles: Vec<Role>,
	pub permission: Permission,
	pub resource: Option<ResourceOwnership>,
}

impl Privilege {
	/// Creates a privilege that only requires `permission`.
	pub fn new(permission: Permission) -> Self {
		Self {
			roles: Vec::new(),
			permission,
			resource: None,
		}
	}

	/// Builder: accept any of the given roles.
	pub fn with_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
		self.roles = roles.into_iter().collect::<RoleComposition>().into_iter().collect();
		self
	}

	/// Builder: additionally require ownership of a resource instance.
	pub fn owning(mut self, resource: ResourceOwnership) -> Self {
		self.resource = Some(resource);
		self
	}

	/// Returns true if the privilege places no constraint on roles.
	pub fn allows_any_role(&self) -> bool {
		self.roles.is_empty()
	}
}

impl fmt::Display for Privilege {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.roles.is_empty() {
			write!(f, "{}", self.permission)?;
		} else {
			let roles: Vec<&str> = self.roles.iter().map(Role::as_str).collect();
			write!(f, "[{}] {}", roles.join("|"), self.permission)?;
		}
		if let Some(resource) = &self.resource {
			write!(f, " owning {resource}")?;
		}
		Ok(())
	}
}
