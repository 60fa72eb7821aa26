// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Ownership provider registry keyed by resource type.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use warden_authz_core::ProviderError;

use crate::providers::OwnershipProvider;

/// Registry key for the fallback provider.
pub const WILDCARD: &str = "*";

/// Resource type → ownership provider, with a `"*"` fallback.
///
/// Lookups take a read lock and clone the `Arc` out, so no lock is held while
/// a provider runs.
#[derive(Default)]
pub struct OwnershipRegistry {
	providers: RwLock<HashMap<String, Arc<dyn OwnershipProvider>>>,
}

impl OwnershipRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts or replaces the provider for `resource_type`. Registering
	/// [`WILDCARD`] sets the fallback.
	pub fn register(
		&self,
		resource_type: impl Into<String>,
		provider: Arc<dyn OwnershipProvider>,
	) -> Result<(), ProviderError> {
		let resource_type = resource_type.into();
		if resource_type.trim().is_empty() {
			return Err(ProviderError::InvalidRegistration(
				"resource type must not be empty".to_string(),
			));
		}

		tracing::debug!(resource_type = %resource_type, "registering ownership provider");
		self.providers.write().insert(resource_type, provider);
		Ok(())
	}

	/// Removes the provider for `resource_type`, returning whether one existed.
	pub fn unregister(&self, resource_type: &str) -> bool {
		self.providers.write().remove(resource_type).is_some()
	}

	/// Exact match first, then the wildcard, else `None`.
	pub fn resolve(&self, resource_type: &str) -> Option<Arc<dyn OwnershipProvider>> {
		let providers = self.providers.read();
		providers
			.get(resource_type)
			.or_else(|| providers.get(WILDCARD))
			.cloned()
	}

	pub fn contains(&self, resource_type: &str) -> bool {
		self.providers.read().contains_key(resource_type)
	}

	/// Registered resource types, sorted.
	pub fn resource_types(&self) -> Vec<String> {
		let mut types: Vec<String> = self.providers.read().keys().cloned().collect();
		types.sort();
		types
	}

	pub fn len(&self) -> usize {
		self.providers.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.providers.read().is_empty()
	}

	/// Removes every provider, including the wildcard. Returns how many were
	/// removed.
	pub fn clear(&self) -> usize {
		let mut providers = self.providers.write();
		let removed = providers.len();
		providers.clear();
		removed
	}
}

impl std::fmt::Debug for OwnershipRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("OwnershipRegistry")
			.field("resource_types", &self.resource_types())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::providers::OwnershipFn;
	use proptest::prelude::*;
	use warden_authz_core::{Subject, SubjectRecord};

	fn always(answer: bool) -> Arc<dyn OwnershipProvider> {
		Arc::new(OwnershipFn::new(move |_: &dyn Subject, _: &str| answer))
	}

	async fn ask(registry: &OwnershipRegistry, resource_type: &str) -> Option<bool> {
		let subject = SubjectRecord::new("1", "a@example.com", "user");
		match registry.resolve(resource_type) {
			Some(provider) => Some(
				provider
					.check_ownership(&subject, resource_type, "1")
					.await
					.unwrap(),
			),
			None => None,
		}
	}

	#[tokio::test]
	async fn exact_match_wins_over_wildcard() {
		let registry = OwnershipRegistry::new();
		registry.register(WILDCARD, always(false)).unwrap();
		registry.register("invoice", always(true)).unwrap();

		assert_eq!(ask(&registry, "invoice").await, Some(true));
		assert_eq!(ask(&registry, "document").await, Some(false));
	}

	#[tokio::test]
	async fn no_match_and_no_wildcard_resolves_nothing() {
		let registry = OwnershipRegistry::new();
		registry.register("invoice", always(true)).unwrap();
		assert_eq!(ask(&registry, "document").await, None);
	}

	#[tokio::test]
	async fn register_replaces_existing() {
		let registry = OwnershipRegistry::new();
		registry.register("invoice", always(false)).unwrap();
		registry.register("invoice", always(true)).unwrap();

		assert_eq!(registry.len(), 1);
		assert_eq!(ask(&registry, "invoice").await, Some(true));
	}

	#[test]
	fn rejects_blank_resource_type() {
		let registry = OwnershipRegistry::new();
		let err = registry.register("  ", always(true)).unwrap_err();
		assert!(matches!(err, ProviderError::InvalidRegistration(_)));
		assert!(registry.is_empty());
	}

	#[test]
	fn unregister_and_clear() {
		let registry = OwnershipRegistry::new();
		registry.register(WILDCARD, always(false)).unwrap();
		registry.register("invoice", always(true)).unwrap();

		assert!(registry.unregister("invoice"));
		assert!(!registry.unregister("invoice"));
		assert_eq!(registry.resource_types(), vec![WILDCARD.to_string()]);

		assert_eq!(registry.clear(), 1);
		assert!(registry.resolve("invoice").is_none());
	}

	proptest! {
		/// Registering any non-blank type makes it resolvable and listed.
		#[test]
		fn registered_types_are_resolvable(
			types in prop::collection::hash_set("[a-z_]{1,16}", 0..10)
		) {
			let registry = OwnershipRegistry::new();
			for t in &types {
				registry.register(t.clone(), always(true)).unwrap();
			}

			prop_assert_eq!(registry.len(), types.len());
			for t in &types {
				prop_assert!(registry.resolve(t).is_some());
			}
		}
	}
}
