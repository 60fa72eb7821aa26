// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pluggable provider contracts.
//!
//! All business-specific behaviour reaches the engine through these traits.
//! Every method may suspend (a provider is free to hit a database or a remote
//! cache) and every fallible method reports failures as [`ProviderError`]; the
//! [`AuthorizationService`](crate::AuthorizationService) converts those to a
//! denial.

mod defaults;

pub use defaults::{
	DefaultOwnershipProvider, DefaultRoleProvider, EmailSubjectProvider, OwnershipFn,
};

use async_trait::async_trait;
use std::time::Duration;
use warden_authz_core::{ProviderError, Subject};

use crate::cache::CacheStats;

/// Maps a subject to the string the policy evaluator knows it by.
#[async_trait]
pub trait SubjectProvider: Send + Sync {
	async fn get_subject(&self, user: &dyn Subject) -> Result<String, ProviderError>;
}

/// Resolves the roles a subject holds.
#[async_trait]
pub trait RoleProvider: Send + Sync {
	async fn get_roles(&self, user: &dyn Subject) -> Result<Vec<String>, ProviderError>;

	async fn has_role(&self, user: &dyn Subject, role: &str) -> Result<bool, ProviderError>;
}

/// Decides whether a subject owns one resource instance.
#[async_trait]
pub trait OwnershipProvider: Send + Sync {
	async fn check_ownership(
		&self,
		user: &dyn Subject,
		resource_type: &str,
		resource_id: &str,
	) -> Result<bool, ProviderError>;
}

/// Key-value store for permission decisions.
#[async_trait]
pub trait CacheProvider: Send + Sync {
	/// `Ok(None)` is a miss, including an expired entry.
	async fn get(&self, key: &str) -> Result<Option<bool>, ProviderError>;

	async fn set(&self, key: &str, value: bool, ttl: Option<Duration>) -> Result<(), ProviderError>;

	/// Clears everything, or only keys matching a `*` glob. Returns the number
	/// of entries removed.
	async fn clear(&self, pattern: Option<&str>) -> Result<usize, ProviderError>;

	async fn stats(&self) -> Result<CacheStats, ProviderError>;
}
