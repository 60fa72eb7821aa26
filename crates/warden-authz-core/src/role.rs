// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Dynamically defined roles.
//!
//! Roles are not a compile-time enum: the host application lists its role names
//! in configuration and builds a [`RoleSet`] once at startup with
//! [`create_roles`]. The set is closed and immutable afterwards. Individual
//! [`Role`] values are cheap to clone and compare by their string value, and
//! combine with `|` into a [`RoleComposition`] meaning "any of these roles".

use crate::error::RoleDefinitionError;
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;

/// A single role value from a [`RoleSet`].
///
/// Roles can only be obtained from a set, so an arbitrary string never
/// masquerades as a configured role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Role(Arc<str>);

impl Role {
	fn new(name: &str) -> Self {
		Self(Arc::from(name))
	}

	/// The string value of this role.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl AsRef<str> for Role {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

impl PartialEq<str> for Role {
	fn eq(&self, other: &str) -> bool {
		&*self.0 == other
	}
}

impl PartialEq<&str> for Role {
	fn eq(&self, other: &&str) -> bool {
		&*self.0 == *other
	}
}

impl Serialize for Role {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&self.0)
	}
}

/// An ordered set of roles produced by `role_a | role_b`.
///
/// Insertion order is kept for display; duplicates are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RoleComposition {
	roles: Vec<Role>,
}

impl RoleComposition {
	/// Creates an empty composition.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns true if `role` is value-equal to one of the composed roles.
	pub fn contains(&self, role: &Role) -> bool {
		self.roles.iter().any(|r| r == role)
	}

	/// Returns true if a composed role has the given string value.
	pub fn contains_name(&self, name: &str) -> bool {
		self.roles.iter().any(|r| r == name)
	}

	pub fn len(&self) -> usize {
		self.roles.len()
	}

	pub fn is_empty(&self) -> bool {
		self.roles.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Role> {
		self.roles.iter()
	}

	/// String values of the composed roles, in insertion order.
	pub fn names(&self) -> Vec<&str> {
		self.roles.iter().map(Role::as_str).collect()
	}

	fn push(&mut self, role: Role) {
		if !self.contains(&role) {
			self.roles.push(role);
		}
	}
}

impl fmt::Display for RoleComposition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.names().join("|"))
	}
}

impl From<Role> for RoleComposition {
	fn from(role: Role) -> Self {
		Self { roles: vec![role] }
	}
}

impl FromIterator<Role> for RoleComposition {
	fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
		let mut composition = Self::new();
		for role in iter {
			composition.push(role);
		}
		composition
	}
}

impl IntoIterator for RoleComposition {
	type Item = Role;
	type IntoIter = std::vec::IntoIter<Role>;

	fn into_iter(self) -> Self::IntoIter {
		self.roles.into_iter()
	}
}

impl<'a> IntoIterator for &'a RoleComposition {
	type Item = &'a Role;
	type IntoIter = std::slice::Iter<'a, Role>;

	fn into_iter(self) -> Self::IntoIter {
		self.roles.iter()
	}
}

impl BitOr for Role {
	type Output = RoleComposition;

	fn bitor(self, rhs: Role) -> RoleComposition {
		let mut composition = RoleComposition::from(self);
		composition.push(rhs);
		composition
	}
}

impl BitOr<Role> for RoleComposition {
	type Output = RoleComposition;

	fn bitor(mut self, rhs: Role) -> RoleComposition {
		self.push(rhs);
		self
	}
}

impl BitOr<RoleComposition> for Role {
	type Output = RoleComposition;

	fn bitor(self, rhs: RoleComposition) -> RoleComposition {
		let mut composition = RoleComposition::from(self);
		for role in rhs {
			composition.push(role);
		}
		composition
	}
}

impl BitOr for RoleComposition {
	type Output = RoleComposition;

	fn bitor(mut self, rhs: RoleComposition) -> RoleComposition {
		for role in rhs {
			self.push(role);
		}
		self
	}
}

/// A closed set of roles, optionally with a designated superadmin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSet {
	roles: Vec<Role>,
	superadmin: Option<Role>,
}

impl RoleSet {
	/// Builds a role set from `names`, validating the constraints documented on
	/// [`create_roles`].
	pub fn new<I, S>(names: I, superadmin: Option<&str>) -> Result<Self, RoleDefinitionError>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut seen = HashSet::new();
		let mut roles = Vec::new();

		for name in names {
			let name = name.as_ref();
			if name.is_empty() {
				return Err(RoleDefinitionError::EmptyName);
			}
			if !seen.insert(name.to_string()) {
				return Err(RoleDefinitionError::Duplicate(name.to_string()));
			}
			roles.push(Role::new(name));
		}

		if roles.is_empty() {
			return Err(RoleDefinitionError::Empty);
		}

		let superadmin = match superadmin {
			Some(name) => Some(
				roles
					.iter()
					.find(|r| *r == name)
					.cloned()
					.ok_or_else(|| RoleDefinitionError::SuperadminNotInSet(name.to_string()))?,
			),
			None => None,
		};

		Ok(Self { roles, superadmin })
	}

	/// Looks up a role by its string value.
	pub fn get(&self, name: &str) -> Option<Role> {
		self.roles.iter().find(|r| *r == name).cloned()
	}

	/// Returns true if `name` is a member of this set.
	pub fn contains(&self, name: &str) -> bool {
		self.roles.iter().any(|r| r == name)
	}

	/// The designated superadmin role, if any.
	pub fn superadmin(&self) -> Option<&Role> {
		self.superadmin.as_ref()
	}

	/// Returns true if `name` is the designated superadmin role.
	pub fn is_superadmin(&self, name: &str) -> bool {
		self.superadmin.as_ref().is_some_and(|r| r == name)
	}

	pub fn iter(&self) -> impl Iterator<Item = &Role> {
		self.roles.iter()
	}

	/// String values of every role, in definition order.
	pub fn names(&self) -> Vec<&str> {
		self.roles.iter().map(Role::as_str).collect()
	}

	pub fn len(&self) -> usize {
		self.roles.len()
	}

	pub fn is_empty(&self) -> bool {
		self.roles.is_empty()
	}
}

/// Creates a closed role set from a list of names.
///
/// `names` must be non-empty, contain no empty strings and no duplicates
/// (compared case-sensitively). If `superadmin` is given it must be one of
/// `names`. Each call returns a fresh, independent set.
pub fn create_roles<I, S>(names: I, superadmin: Option<&str>) -> Result<RoleSet, RoleDefinitionError>
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	RoleSet::new(names, superadmin)
}
