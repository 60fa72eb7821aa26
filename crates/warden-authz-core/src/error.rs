// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types shared by the authorization model and engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A role set could not be created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoleDefinitionError {
	#[error("role list must not be empty")]
	Empty,

	#[error("role names must not be empty strings")]
	EmptyName,

	#[error("duplicate role name '{0}'")]
	Duplicate(String),

	#[error("superadmin role '{0}' is not one of the defined roles")]
	SuperadminNotInSet(String),
}

/// A string was not of the form `resource:action`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid permission '{0}', expected 'resource:action'")]
pub struct ParsePermissionError(pub String);

/// Category of an unmet requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
	Role,
	Permission,
	Ownership,
	Privilege,
}

impl fmt::Display for DenialKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			DenialKind::Role => "role",
			DenialKind::Permission => "permission",
			DenialKind::Ownership => "ownership",
			DenialKind::Privilege => "privilege",
		};
		write!(f, "{s}")
	}
}

/// A requirement that did not hold, with enough context for a user-facing
/// message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmetRequirement {
	/// For a privilege, the part that failed: role, permission or ownership.
	pub kind: DenialKind,
	/// Human-readable form of the requirement, e.g. `permission invoice:read`.
	pub requirement: String,
	pub resource_type: Option<String>,
	pub resource_id: Option<String>,
}

impl UnmetRequirement {
	pub fn new(kind: DenialKind, requirement: impl Into<String>) -> Self {
		Self {
			kind,
			requirement: requirement.into(),
			resource_type: None,
			resource_id: None,
		}
	}

	/// Builder: attach the resource instance the requirement was checked against.
	pub fn with_resource(
		mut self,
		resource_type: impl Into<String>,
		resource_id: Option<String>,
	) -> Self {
		self.resource_type = Some(resource_type.into());
		self.resource_id = resource_id;
		self
	}
}

impl fmt::Display for UnmetRequirement {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.requirement)?;
		match (&self.resource_type, &self.resource_id) {
			(Some(t), Some(id)) => write!(f, " [{t}:{id}]"),
			(Some(t), None) => write!(f, " [{t}:<missing id>]"),
			_ => Ok(()),
		}
	}
}

/// The normal outcome of a failed guard: every requirement group had an unmet
/// requirement.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error(
	"access to '{operation}' denied for role '{subject_role}': {}",
	describe_unmet(.unmet)
)]
pub struct AuthorizationDenied {
	pub operation: String,
	pub subject_role: String,
	/// First unmet requirement of each evaluated group, in group order.
	pub unmet: Vec<UnmetRequirement>,
}

impl AuthorizationDenied {
	/// The denial subtype, taken from the first unmet requirement.
	pub fn kind(&self) -> Option<DenialKind> {
		self.unmet.first().map(|u| u.kind)
	}

	pub fn is_role_denied(&self) -> bool {
		self.kind() == Some(DenialKind::Role)
	}

	pub fn is_permission_denied(&self) -> bool {
		self.kind() == Some(DenialKind::Permission)
	}

	pub fn is_ownership_denied(&self) -> bool {
		self.kind() == Some(DenialKind::Ownership)
	}
}

fn describe_unmet(unmet: &[UnmetRequirement]) -> String {
	if unmet.is_empty() {
		return "no requirement satisfied".to_string();
	}
	unmet
		.iter()
		.map(ToString::to_string)
		.collect::<Vec<_>>()
		.join("; or ")
}

/// A provider implementation failed.
///
/// Boolean checks convert this to `false`; administrative calls return it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
	#[error("provider '{provider}' failed: {message}")]
	Failed { provider: String, message: String },

	#[error("invalid provider registration: {0}")]
	InvalidRegistration(String),

	#[error("policy evaluator error: {0}")]
	Policy(String),
}

impl ProviderError {
	pub fn failed(provider: impl Into<String>, message: impl Into<String>) -> Self {
		ProviderError::Failed {
			provider: provider.into(),
			message: message.into(),
		}
	}
}
