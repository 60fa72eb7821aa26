// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Value model for Warden authorization decisions.
//!
//! This crate defines the pure, I/O-free building blocks used by the decision
//! engine in `warden-authz`:
//!
//! - [`RoleSet`] / [`Role`] / [`RoleComposition`]: a closed set of roles created
//!   once at startup, composable with `|`
//! - [`Permission`]: a `resource:action` pair, independent of instance identity
//! - [`ResourceOwnership`]: a declaration that a named call parameter must
//!   identify a resource the subject owns
//! - [`Privilege`]: a reusable bundle of roles, a permission and an optional
//!   ownership declaration
//! - [`Requirement`] / [`RequirementGroup`]: the conjunctive groups a guard evaluates
//! - [`Subject`]: the contract host user types implement
//!
//! Nothing here performs a check; see `warden_authz::AuthorizationService`.

pub mod error;
pub mod permission;
pub mod privilege;
pub mod requirement;
pub mod role;
pub mod subject;

pub use error::{
	AuthorizationDenied, DenialKind, ParsePermissionError, ProviderError, RoleDefinitionError,
	UnmetRequirement,
};
pub use permission::{Permission, PermissionContext};
pub use privilege::{Privilege, ResourceOwnership};
pub use requirement::{Requirement, RequirementGroup};
pub use role::{create_roles, Role, RoleComposition, RoleSet};
pub use subject::{Subject, SubjectRecord};
