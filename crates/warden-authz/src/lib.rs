// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Warden authorization decision engine.
//!
//! This crate decides allow/deny for guarded operations by combining:
//!
//! - **Policy checks**: `(subject, resource, action)` triples answered by a
//!   pluggable [`PolicyEvaluator`] and cached with a TTL
//! - **Role checks**: through a [`RoleProvider`], with superadmin bypass
//! - **Ownership checks**: per-resource-type [`OwnershipProvider`]s with a
//!   `"*"` fallback, failing closed when nothing matches
//!
//! # Architecture
//!
//! [`AuthorizationService`] owns the providers, the ownership registry and the
//! permission cache. A [`Guard`] evaluates requirement groups against it: AND
//! within a group, OR across groups.
//!
//! ```ignore
//! use std::sync::Arc;
//! use warden_authz::{AuthorizationService, CallArgs, Guard, MemoryPolicyEvaluator};
//! use warden_authz_core::{create_roles, Permission, RequirementGroup, ResourceOwnership};
//!
//! let roles = create_roles(["admin", "user"], Some("admin"))?;
//! let service = AuthorizationService::builder(Arc::new(MemoryPolicyEvaluator::new()))
//! 	.with_role_set(roles.clone())
//! 	.build()?;
//!
//! let guard = Guard::new("delete_invoice")
//! 	.require_one(roles.get("admin").unwrap())
//! 	.require(
//! 		RequirementGroup::new()
//! 			.and(Permission::new("invoice", "delete"))
//! 			.and(ResourceOwnership::new("invoice", "invoice_id")),
//! 	);
//! guard.authorize(&service, &CallArgs::new().with_subject(user).with_param("invoice_id", 42)).await?;
//! ```

pub mod audit;
pub mod cache;
pub mod error;
pub mod guard;
pub mod policy;
pub mod providers;
pub mod registry;
pub mod service;
pub mod telemetry;

pub use audit::{
	AuditEventType, AuditLogBuilder, AuditLogEntry, AuditSink, MemoryAuditSink, TracingAuditSink,
};
pub use cache::{escape_glob, glob_match, CacheStats, MemoryCache};
pub use error::{ConfigurationError, GuardError};
pub use guard::{evaluate, CallArgs, Guard, SubjectAccessor};
pub use policy::{
	evaluator_from_config, CasbinPolicyEvaluator, MemoryPolicyEvaluator, PolicyEvaluator,
	PolicyRule, DEFAULT_RBAC_MODEL,
};
pub use providers::{
	CacheProvider, DefaultOwnershipProvider, DefaultRoleProvider, EmailSubjectProvider,
	OwnershipFn, OwnershipProvider, RoleProvider, SubjectProvider,
};
pub use registry::{OwnershipRegistry, WILDCARD};
pub use service::{
	permission_cache_key, AuthorizationService, AuthorizationServiceBuilder, DEFAULT_CACHE_TTL,
};
pub use telemetry::{init_tracing, TelemetryError};

pub use warden_authz_core as core;
