// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Requirements and conjunctive requirement groups.

use crate::error::DenialKind;
use crate::permission::Permission;
use crate::privilege::{Privilege, ResourceOwnership};
use crate::role::{Role, RoleComposition};
use std::fmt;

/// One condition a guard evaluates.
#[derive(Debug, Clone, PartialEq)]
pub enum Requirement {
	/// The subject must hold at least one of these roles.
	Role(RoleComposition),
	Permission(Permission),
	Privilege(Privilege),
	Ownership(ResourceOwnership),
}

impl Requirement {
	/// The denial category reported when this requirement is unmet.
	pub fn kind(&self) -> DenialKind {
		match self {
			Requirement::Role(_) => DenialKind::Role,
			Requirement::Permission(_) => DenialKind::Permission,
			Requirement::Privilege(_) => DenialKind::Privilege,
			Requirement::Ownership(_) => DenialKind::Ownership,
		}
	}
}

impl fmt::Display for Requirement {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Requirement::Role(roles) => write!(f, "role {roles}"),
			Requirement::Permission(permission) => write!(f, "permission {permission}"),
			Requirement::Privilege(privilege) => write!(f, "privilege {privilege}"),
			Requirement::Ownership(ownership) => write!(f, "ownership of {ownership}"),
		}
	}
}

impl From<Role> for Requirement {
	fn from(role: Role) -> Self {
		Requirement::Role(RoleComposition::from(role))
	}
}

impl From<RoleComposition> for Requirement {
	fn from(roles: RoleComposition) -> Self {
		Requirement::Role(roles)
	}
}

impl From<Permission> for Requirement {
	fn from(permission: Permission) -> Self {
		Requirement::Permission(permission)
	}
}

impl From<Privilege> for Requirement {
	fn from(privilege: Privilege) -> Self {
		Requirement::Privilege(privilege)
	}
}

impl From<ResourceOwnership> for Requirement {
	fn from(ownership: ResourceOwnership) -> Self {
		Requirement::Ownership(ownership)
	}
}

/// Requirements that must all hold (AND). An empty group only requires that a
/// subject is present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequirementGroup {
	requirements: Vec<Requirement>,
}

impl RequirementGroup {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder: add another requirement to the conjunction.
	pub fn and(mut self, requirement: impl Into<Requirement>) -> Self {
		self.requirements.push(requirement.into());
		self
	}

	pub fn iter(&self) -> impl Iterator<Item = &Requirement> {
		self.requirements.iter()
	}

	pub fn len(&self) -> usize {
		self.requirements.len()
	}

	pub fn is_empty(&self) -> bool {
		self.requirements.is_empty()
	}
}

impl From<Vec<Requirement>> for RequirementGroup {
	fn from(requirements: Vec<Requirement>) -> Self {
		Self { requirements }
	}
}

impl FromIterator<Requirement> for RequirementGroup {
	fn from_iter<I: IntoIterator<Item = Requirement>>(iter: I) -> Self {
		Self {
			requirements: iter.into_iter().collect(),
		}
	}
}

impl fmt::Display for RequirementGroup {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let parts: Vec<String> = self.requirements.iter().map(ToString::to_string).collect();
		f.write_str(&parts.join(" AND "))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::role::create_roles;

	#[test]
	fn group_builder_keeps_order() {
		let set = create_roles(["admin", "user"], Some("admin")).unwrap();
		let group = RequirementGroup::new()
			.and(set.get("user").unwrap())
			.and(Permission::new("invoice", "read"))
			.and(ResourceOwnership::new("invoice", "invoice_id"));

		let kinds: Vec<DenialKind> = group.iter().map(Requirement::kind).collect();
		assert_eq!(
			kinds,
			vec![DenialKind::Role, DenialKind::Permission, DenialKind::Ownership]
		);
		assert_eq!(
			group.to_string(),
			"role user AND permission invoice:read AND ownership of invoice(invoice_id)"
		);
	}

	#[test]
	fn composition_becomes_single_role_requirement() {
		let set = create_roles(["admin", "user"], None).unwrap();
		let requirement =
			Requirement::from(set.get("admin").unwrap() | set.get("user").unwrap());
		assert_eq!(requirement.to_string(), "role admin|user");
	}
}
