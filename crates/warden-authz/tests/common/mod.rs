// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared fixtures: counting evaluators and providers.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use warden_authz::{MemoryPolicyEvaluator, OwnershipProvider, PolicyEvaluator};
use warden_authz_core::{ProviderError, Subject, SubjectRecord};

/// Memory evaluator that counts `enforce` calls.
#[derive(Default)]
pub struct CountingPolicy {
	inner: MemoryPolicyEvaluator,
	enforce_calls: AtomicUsize,
}

impl CountingPolicy {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn enforce_calls(&self) -> usize {
		self.enforce_calls.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl PolicyEvaluator for CountingPolicy {
	async fn enforce(&self, subject: &str, object: &str, action: &str) -> Result<bool, ProviderError> {
		self.enforce_calls.fetch_add(1, Ordering::SeqCst);
		self.inner.enforce(subject, object, action).await
	}

	async fn add_policy(&self, subject: &str, object: &str, action: &str) -> Result<bool, ProviderError> {
		self.inner.add_policy(subject, object, action).await
	}

	async fn remove_policy(
		&self,
		subject: &str,
		object: &str,
		action: &str,
	) -> Result<bool, ProviderError> {
		self.inner.remove_policy(subject, object, action).await
	}

	async fn add_role_for_subject(&self, subject: &str, role: &str) -> Result<bool, ProviderError> {
		self.inner.add_role_for_subject(subject, role).await
	}

	async fn remove_role_for_subject(
		&self,
		subject: &str,
		role: &str,
	) -> Result<bool, ProviderError> {
		self.inner.remove_role_for_subject(subject, role).await
	}
}

/// Ownership provider with a fixed answer that counts its calls.
pub struct CountingOwnership {
	answer: bool,
	calls: AtomicUsize,
}

impl CountingOwnership {
	pub fn new(answer: bool) -> Arc<Self> {
		Arc::new(Self {
			answer,
			calls: AtomicUsize::new(0),
		})
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl OwnershipProvider for CountingOwnership {
	async fn check_ownership(
		&self,
		_user: &dyn Subject,
		_resource_type: &str,
		_resource_id: &str,
	) -> Result<bool, ProviderError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		Ok(self.answer)
	}
}

pub fn subject(role: &str) -> SubjectRecord {
	SubjectRecord::new("u-1", "alice@example.com", role)
}

pub fn shared_subject(role: &str) -> Arc<dyn Subject> {
	Arc::new(subject(role))
}
