// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Engine error types.
//!
//! Boolean checks never fail; they return `false` on any fault. Errors only
//! surface from construction, administrative calls and guards.

use thiserror::Error;
use warden_authz_config::ConfigError;
use warden_authz_core::{AuthorizationDenied, ProviderError, RoleDefinitionError};

/// Programmer or deployment error. Distinct from a denial.
#[derive(Debug, Error)]
pub enum ConfigurationError {
	#[error(transparent)]
	RoleDefinition(#[from] RoleDefinitionError),

	#[error("no subject available for guarded operation '{operation}'")]
	SubjectNotFound { operation: String },

	#[error("guarded operation '{operation}' declares no requirements")]
	NoRequirements { operation: String },

	#[error("policy source missing: {0}")]
	MissingPolicySource(String),

	#[error("failed to load policy: {0}")]
	PolicyLoad(String),

	#[error("malformed provider: {0}")]
	InvalidProvider(#[from] ProviderError),

	#[error(transparent)]
	Config(#[from] ConfigError),
}

/// Outcome of a guarded call that did not reach the operation.
#[derive(Debug, Error)]
pub enum GuardError {
	#[error(transparent)]
	Denied(#[from] AuthorizationDenied),

	#[error(transparent)]
	Configuration(#[from] ConfigurationError),
}

impl GuardError {
	pub fn is_denied(&self) -> bool {
		matches!(self, GuardError::Denied(_))
	}

	pub fn as_denied(&self) -> Option<&AuthorizationDenied> {
		match self {
			GuardError::Denied(denied) => Some(denied),
			GuardError::Configuration(_) => None,
		}
	}
}
