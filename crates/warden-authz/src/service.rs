// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The authorization service.
//!
//! [`AuthorizationService`] owns every piece of mutable decision state (the
//! provider set, the ownership registry and the permission cache), so several
//! independently configured instances can coexist in one process.
//!
//! Every check returns a plain `bool`. A missing provider, a cache miss and a
//! provider fault all resolve to `false`; faults are logged at error level and
//! audited as [`AuditEventType::ProviderFault`].

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, trace, warn};
use warden_authz_config::WardenConfig;
use warden_authz_core::{
	DenialKind, Permission, PermissionContext, Privilege, ProviderError, RoleComposition, RoleDefinitionError,
	RoleSet, Subject,
};

use crate::audit::{AuditEventType, AuditLogBuilder, AuditLogEntry, AuditSink, TracingAuditSink};
use crate::cache::{escape_glob, CacheStats, MemoryCache, DEFAULT_MAX_ENTRIES};
use crate::error::ConfigurationError;
use crate::policy::{evaluator_from_config, PolicyEvaluator};
use crate::providers::{
	CacheProvider, DefaultOwnershipProvider, DefaultRoleProvider, EmailSubjectProvider,
	OwnershipProvider, RoleProvider, SubjectProvider,
};
use crate::registry::{OwnershipRegistry, WILDCARD};

/// Permission cache TTL used when none is configured.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Cache key for one permission decision: `perm:{subject}:{resource}:{action}`
/// with `\\` and `:` escaped in each part, so distinct triples never share a
/// key.
pub fn permission_cache_key(subject: &str, resource: &str, action: &str) -> String {
	format!(
		"perm:{}:{}:{}",
		escape_key_part(subject),
		escape_key_part(resource),
		escape_key_part(action)
	)
}

/// Pattern matching every cached decision for `subject`.
fn subject_cache_pattern(subject: &str) -> String {
	format!("perm:{}:*", escape_glob(&escape_key_part(subject)))
}

fn escape_key_part(part: &str) -> String {
	let mut escaped = String::with_capacity(part.len());
	for c in part.chars() {
		if matches!(c, ':' | '\\') {
			escaped.push('\\');
		}
		escaped.push(c);
	}
	escaped
}

/// Orchestrates subject extraction, cached policy checks, role checks and
/// ownership dispatch.
pub struct AuthorizationService {
	policy: Arc<dyn PolicyEvaluator>,
	subject_provider: Arc<dyn SubjectProvider>,
	role_provider: Arc<dyn RoleProvider>,
	cache: Arc<dyn CacheProvider>,
	ownership: OwnershipRegistry,
	wildcard_ownership: Arc<dyn OwnershipProvider>,
	role_set: Option<RoleSet>,
	superadmin: Option<String>,
	cache_ttl: Option<Duration>,
	audit: Arc<dyn AuditSink>,
}

impl AuthorizationService {
	pub fn builder(policy: Arc<dyn PolicyEvaluator>) -> AuthorizationServiceBuilder {
		AuthorizationServiceBuilder::new(policy)
	}

	/// Builds a service from resolved configuration, loading the configured
	/// policy evaluator.
	pub async fn from_config(config: &WardenConfig) -> Result<Self, ConfigurationError> {
		let policy = evaluator_from_config(&config.policy).await?;
		Self::from_config_with_policy(config, policy)
	}

	/// Like [`from_config`](Self::from_config) with a caller-supplied evaluator.
	pub fn from_config_with_policy(
		config: &WardenConfig,
		policy: Arc<dyn PolicyEvaluator>,
	) -> Result<Self, ConfigurationError> {
		let authz = &config.authz;
		let mut builder = Self::builder(policy)
			.with_cache_ttl(authz.cache_ttl())
			.with_cache_max_entries(authz.cache_max_entries)
			.default_allow_ownership(authz.default_allow_ownership);

		if authz.roles.is_empty() {
			if let Some(superadmin) = &authz.superadmin_role {
				builder = builder.with_superadmin_role(superadmin.clone());
			}
		} else {
			let roles = RoleSet::new(&authz.roles, authz.superadmin_role.as_deref())?;
			builder = builder.with_role_set(roles);
		}

		builder.build()
	}

	pub fn role_set(&self) -> Option<&RoleSet> {
		self.role_set.as_ref()
	}

	pub fn superadmin_role(&self) -> Option<&str> {
		self.superadmin.as_deref()
	}

	pub fn cache_ttl(&self) -> Option<Duration> {
		self.cache_ttl
	}

	pub fn is_superadmin(&self, subject: &dyn Subject) -> bool {
		self.superadmin.as_deref() == Some(subject.role())
	}

	/// Resolves the policy subject string, or `None` on a provider fault.
	pub async fn subject_of(&self, subject: &dyn Subject) -> Option<String> {
		match self.subject_provider.get_subject(subject).await {
			Ok(id) => Some(id),
			Err(e) => {
				self.provider_fault("subject", Some(subject), None, &e);
				None
			}
		}
	}

	/// Checks `resource:action` for the subject through the cache and the
	/// policy evaluator.
	///
	/// The context is carried for logging only; the evaluator contract takes
	/// `(subject, object, action)`.
	#[instrument(
		level = "debug",
		skip_all,
		fields(
			subject_id = %subject.id(),
			resource = %resource,
			action = %action,
			has_context = context.is_some()
		)
	)]
	pub async fn check_permission(
		&self,
		subject: &dyn Subject,
		resource: &str,
		action: &str,
		context: Option<&PermissionContext>,
	) -> bool {
		let Some(policy_subject) = self.subject_of(subject).await else {
			return false;
		};
		let key = permission_cache_key(&policy_subject, resource, action);

		let cache_usable = match self.cache.get(&key).await {
			Ok(Some(allowed)) => {
				trace!(%key, allowed, "permission cache hit");
				return allowed;
			}
			Ok(None) => {
				debug!(%key, "permission cache miss");
				true
			}
			Err(e) => {
				self.provider_fault("cache", Some(subject), None, &e);
				false
			}
		};

		let allowed = match self.policy.enforce(&policy_subject, resource, action).await {
			Ok(allowed) => allowed,
			Err(e) => {
				self.provider_fault("policy", Some(subject), Some(resource), &e);
				return false;
			}
		};

		if cache_usable {
			if let Err(e) = self.cache.set(&key, allowed, self.cache_ttl).await {
				warn!(%key, error = %e, "failed to cache permission decision");
			}
		}

		debug!(allowed, "permission evaluated");
		allowed
	}

	pub async fn check_permission_for(&self, subject: &dyn Subject, permission: &Permission) -> bool {
		self
			.check_permission(
				subject,
				&permission.resource,
				&permission.action,
				permission.context.as_ref(),
			)
			.await
	}

	/// Role check with superadmin bypass.
	///
	/// With a closed role set, a name outside the set is never held.
	#[instrument(level = "debug", skip_all, fields(subject_role = %subject.role(), role = %role))]
	pub async fn has_role(&self, subject: &dyn Subject, role: &str) -> bool {
		if let Some(roles) = &self.role_set {
			if !roles.contains(role) && !self.is_superadmin(subject) {
				warn!(role, "role is not part of the configured role set");
				return false;
			}
		}

		match self.role_provider.has_role(subject, role).await {
			Ok(held) => held,
			Err(e) => {
				self.provider_fault("role", Some(subject), None, &e);
				false
			}
		}
	}

	/// True if the subject holds at least one of the composed roles.
	pub async fn has_any_role(&self, subject: &dyn Subject, roles: &RoleComposition) -> bool {
		for role in roles {
			if self.has_role(subject, role.as_str()).await {
				return true;
			}
		}
		false
	}

	/// Roles reported by the role provider, empty on a fault.
	pub async fn get_roles(&self, subject: &dyn Subject) -> Vec<String> {
		match self.role_provider.get_roles(subject).await {
			Ok(roles) => roles,
			Err(e) => {
				self.provider_fault("role", Some(subject), None, &e);
				Vec::new()
			}
		}
	}

	/// Superadmins own everything. Otherwise dispatches to the provider
	/// registered for `resource_type`, else the wildcard, else denies. Never
	/// cached.
	#[instrument(
		level = "debug",
		skip_all,
		fields(subject_id = %subject.id(), resource_type = %resource_type, resource_id = %resource_id)
	)]
	pub async fn check_resource_ownership(
		&self,
		subject: &dyn Subject,
		resource_type: &str,
		resource_id: &str,
	) -> bool {
		if self.is_superadmin(subject) {
			trace!("superadmin bypass");
			return true;
		}

		let Some(provider) = self.ownership.resolve(resource_type) else {
			debug!("no ownership provider registered, denying");
			return false;
		};

		match provider
			.check_ownership(subject, resource_type, resource_id)
			.await
		{
			Ok(owned) => owned,
			Err(e) => {
				self.provider_fault("ownership", Some(subject), Some(resource_type), &e);
				false
			}
		}
	}

	/// Any of the privilege's roles (or none required), AND its permission,
	/// AND ownership of `resource_id` when the privilege declares a resource.
	///
	/// A privilege that declares a resource is unmet without an id.
	pub async fn check_privilege(
		&self,
		subject: &dyn Subject,
		privilege: &Privilege,
		resource_id: Option<&str>,
	) -> bool {
		self
			.privilege_failure(subject, privilege, resource_id)
			.await
			.is_none()
	}

	/// The part of the privilege that does not hold, checked in role,
	/// permission, ownership order. `None` when the privilege is satisfied.
	#[instrument(level = "debug", skip_all, fields(privilege = %privilege))]
	pub(crate) async fn privilege_failure(
		&self,
		subject: &dyn Subject,
		privilege: &Privilege,
		resource_id: Option<&str>,
	) -> Option<DenialKind> {
		if !privilege.allows_any_role() {
			let roles: RoleComposition = privilege.roles.iter().cloned().collect();
			if !self.has_any_role(subject, &roles).await {
				return Some(DenialKind::Role);
			}
		}

		if !self.check_permission_for(subject, &privilege.permission).await {
			return Some(DenialKind::Permission);
		}

		let owned = match (&privilege.resource, resource_id) {
			(None, _) => true,
			(Some(ownership), Some(id)) => {
				self
					.check_resource_ownership(subject, &ownership.resource_type, id)
					.await
			}
			(Some(ownership), None) => {
				warn!(resource = %ownership, "privilege requires a resource id but none was given");
				false
			}
		};
		(!owned).then_some(DenialKind::Ownership)
	}

	/// The subset of `ids` the subject owns, in input order.
	pub async fn filter_owned<I, S>(
		&self,
		subject: &dyn Subject,
		resource_type: &str,
		ids: I,
	) -> Vec<String>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
		let checks = ids
			.iter()
			.map(|id| self.check_resource_ownership(subject, resource_type, id));
		let owned = join_all(checks).await;

		ids
			.into_iter()
			.zip(owned)
			.filter_map(|(id, owned)| owned.then_some(id))
			.collect()
	}

	/// Empties the permission cache. Returns the number of entries removed.
	///
	/// Call after any role or policy change made outside this service.
	pub async fn clear_cache(&self) -> usize {
		self.clear_cache_matching(None).await
	}

	/// Drops every cached decision for one subject.
	pub async fn invalidate_subject(&self, subject: &dyn Subject) -> usize {
		let Some(policy_subject) = self.subject_of(subject).await else {
			return 0;
		};
		let pattern = subject_cache_pattern(&policy_subject);
		self.clear_cache_matching(Some(&pattern)).await
	}

	async fn clear_cache_matching(&self, pattern: Option<&str>) -> usize {
		match self.cache.clear(pattern).await {
			Ok(removed) => {
				info!(pattern = pattern.unwrap_or("*"), removed, "permission cache cleared");
				self.audit.record(
					AuditLogBuilder::new(AuditEventType::CacheCleared)
						.details(serde_json::json!({ "pattern": pattern, "removed": removed }))
						.build(),
				);
				removed
			}
			Err(e) => {
				self.provider_fault("cache", None, None, &e);
				0
			}
		}
	}

	pub async fn get_cache_stats(&self) -> CacheStats {
		match self.cache.stats().await {
			Ok(stats) => stats,
			Err(e) => {
				self.provider_fault("cache", None, None, &e);
				CacheStats::default()
			}
		}
	}

	/// Inserts or replaces the ownership provider for `resource_type`;
	/// `"*"` replaces the fallback.
	pub fn register_ownership_provider(
		&self,
		resource_type: impl Into<String>,
		provider: Arc<dyn OwnershipProvider>,
	) -> Result<(), ProviderError> {
		let resource_type = resource_type.into();
		self.ownership.register(resource_type.clone(), provider)?;
		self.audit.record(
			AuditLogBuilder::new(AuditEventType::ProviderRegistered)
				.resource(resource_type, None)
				.build(),
		);
		Ok(())
	}

	/// Removes a provider. Unregistering `"*"` leaves unmatched types
	/// fail-closed.
	pub fn unregister_ownership_provider(&self, resource_type: &str) -> bool {
		let removed = self.ownership.unregister(resource_type);
		if removed {
			self.audit.record(
				AuditLogBuilder::new(AuditEventType::ProviderUnregistered)
					.resource(resource_type, None)
					.build(),
			);
		}
		removed
	}

	/// Removes every ownership provider, then reinstalls the wildcard the
	/// service was built with. Returns the number of providers removed.
	pub fn clear_ownership_providers(&self) -> Result<usize, ProviderError> {
		let removed = self.ownership.clear();
		self.ownership.register(WILDCARD, self.wildcard_ownership.clone())?;

		info!(removed, "ownership providers cleared");
		self.audit.record(
			AuditLogBuilder::new(AuditEventType::ProviderUnregistered)
				.resource(WILDCARD, None)
				.details(serde_json::json!({ "cleared": removed }))
				.build(),
		);
		Ok(removed)
	}

	pub fn registered_resource_types(&self) -> Vec<String> {
		self.ownership.resource_types()
	}

	/// Adds a policy rule; clears the permission cache if the rule was new.
	pub async fn add_policy(
		&self,
		subject: &str,
		object: &str,
		action: &str,
	) -> Result<bool, ProviderError> {
		let added = self.policy.add_policy(subject, object, action).await?;
		if added {
			self.policy_changed(
				AuditEventType::PolicyAdded,
				serde_json::json!({ "subject": subject, "object": object, "action": action }),
			)
			.await;
		}
		Ok(added)
	}

	/// Removes a policy rule; clears the permission cache if it existed.
	pub async fn remove_policy(
		&self,
		subject: &str,
		object: &str,
		action: &str,
	) -> Result<bool, ProviderError> {
		let removed = self.policy.remove_policy(subject, object, action).await?;
		if removed {
			self.policy_changed(
				AuditEventType::PolicyRemoved,
				serde_json::json!({ "subject": subject, "object": object, "action": action }),
			)
			.await;
		}
		Ok(removed)
	}

	pub async fn add_role_for_subject(&self, subject: &str, role: &str) -> Result<bool, ProviderError> {
		let added = self.policy.add_role_for_subject(subject, role).await?;
		if added {
			self.policy_changed(
				AuditEventType::PolicyAdded,
				serde_json::json!({ "subject": subject, "role": role }),
			)
			.await;
		}
		Ok(added)
	}

	pub async fn remove_role_for_subject(
		&self,
		subject: &str,
		role: &str,
	) -> Result<bool, ProviderError> {
		let removed = self.policy.remove_role_for_subject(subject, role).await?;
		if removed {
			self.policy_changed(
				AuditEventType::PolicyRemoved,
				serde_json::json!({ "subject": subject, "role": role }),
			)
			.await;
		}
		Ok(removed)
	}

	async fn policy_changed(&self, event_type: AuditEventType, details: serde_json::Value) {
		self
			.audit
			.record(AuditLogBuilder::new(event_type).details(details).build());
		self.clear_cache().await;
	}

	pub(crate) fn record_audit(&self, entry: AuditLogEntry) {
		self.audit.record(entry);
	}

	fn provider_fault(
		&self,
		provider: &str,
		subject: Option<&dyn Subject>,
		resource_type: Option<&str>,
		err: &ProviderError,
	) {
		error!(provider, error = %err, "provider failed, denying");

		let mut entry = AuditLogBuilder::new(AuditEventType::ProviderFault)
			.action(format!("{provider} provider failed"))
			.details(serde_json::json!({ "error": err.to_string() }));
		if let Some(subject) = subject {
			entry = entry.subject(subject.id(), subject.role());
		}
		if let Some(resource_type) = resource_type {
			entry = entry.resource(resource_type, None);
		}
		self.audit.record(entry.build());
	}
}

impl std::fmt::Debug for AuthorizationService {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AuthorizationService")
			.field("superadmin", &self.superadmin)
			.field("role_set", &self.role_set)
			.field("cache_ttl", &self.cache_ttl)
			.field("ownership", &self.ownership)
			.finish_non_exhaustive()
	}
}

/// Builder for [`AuthorizationService`]. Providers left unset get the
/// defaults.
pub struct AuthorizationServiceBuilder {
	policy: Arc<dyn PolicyEvaluator>,
	role_set: Option<RoleSet>,
	superadmin: Option<String>,
	cache_ttl: Option<Duration>,
	cache_max_entries: usize,
	subject_provider: Option<Arc<dyn SubjectProvider>>,
	role_provider: Option<Arc<dyn RoleProvider>>,
	cache_provider: Option<Arc<dyn CacheProvider>>,
	wildcard_ownership: Option<Arc<dyn OwnershipProvider>>,
	default_allow_ownership: bool,
	audit: Option<Arc<dyn AuditSink>>,
}

impl AuthorizationServiceBuilder {
	pub fn new(policy: Arc<dyn PolicyEvaluator>) -> Self {
		Self {
			policy,
			role_set: None,
			superadmin: None,
			cache_ttl: Some(DEFAULT_CACHE_TTL),
			cache_max_entries: DEFAULT_MAX_ENTRIES,
			subject_provider: None,
			role_provider: None,
			cache_provider: None,
			wildcard_ownership: None,
			default_allow_ownership: false,
			audit: None,
		}
	}

	/// Closed role set. Its superadmin is used unless one is set explicitly.
	pub fn with_role_set(mut self, roles: RoleSet) -> Self {
		self.role_set = Some(roles);
		self
	}

	pub fn with_superadmin_role(mut self, role: impl Into<String>) -> Self {
		self.superadmin = Some(role.into());
		self
	}

	/// `None` keeps entries until cleared or evicted.
	pub fn with_cache_ttl(mut self, ttl: Option<Duration>) -> Self {
		self.cache_ttl = ttl;
		self
	}

	/// Capacity of the default in-memory cache. Ignored with a custom cache
	/// provider.
	pub fn with_cache_max_entries(mut self, max_entries: usize) -> Self {
		self.cache_max_entries = max_entries;
		self
	}

	pub fn with_subject_provider(mut self, provider: Arc<dyn SubjectProvider>) -> Self {
		self.subject_provider = Some(provider);
		self
	}

	pub fn with_role_provider(mut self, provider: Arc<dyn RoleProvider>) -> Self {
		self.role_provider = Some(provider);
		self
	}

	pub fn with_cache_provider(mut self, provider: Arc<dyn CacheProvider>) -> Self {
		self.cache_provider = Some(provider);
		self
	}

	/// Replaces the default wildcard ownership provider.
	pub fn with_wildcard_ownership_provider(mut self, provider: Arc<dyn OwnershipProvider>) -> Self {
		self.wildcard_ownership = Some(provider);
		self
	}

	/// Answer of the default wildcard provider for non-superadmin subjects.
	pub fn default_allow_ownership(mut self, allow: bool) -> Self {
		self.default_allow_ownership = allow;
		self
	}

	pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
		self.audit = Some(sink);
		self
	}

	pub fn build(self) -> Result<AuthorizationService, ConfigurationError> {
		let superadmin = match (&self.superadmin, &self.role_set) {
			(Some(name), Some(roles)) if !roles.contains(name) => {
				return Err(RoleDefinitionError::SuperadminNotInSet(name.clone()).into());
			}
			(Some(name), _) if name.trim().is_empty() => {
				return Err(RoleDefinitionError::EmptyName.into());
			}
			(Some(name), _) => Some(name.clone()),
			(None, Some(roles)) => roles.superadmin().map(|r| r.as_str().to_string()),
			(None, None) => None,
		};

		let ownership = OwnershipRegistry::new();
		let wildcard = self.wildcard_ownership.unwrap_or_else(|| {
			Arc::new(DefaultOwnershipProvider::new(
				superadmin.clone(),
				self.default_allow_ownership,
			))
		});
		ownership.register(WILDCARD, wildcard.clone())?;

		let service = AuthorizationService {
			policy: self.policy,
			subject_provider: self
				.subject_provider
				.unwrap_or_else(|| Arc::new(EmailSubjectProvider)),
			role_provider: self
				.role_provider
				.unwrap_or_else(|| Arc::new(DefaultRoleProvider::new(superadmin.clone()))),
			cache: self
				.cache_provider
				.unwrap_or_else(|| Arc::new(MemoryCache::with_max_entries(self.cache_max_entries))),
			ownership,
			wildcard_ownership: wildcard,
			role_set: self.role_set,
			superadmin,
			cache_ttl: self.cache_ttl,
			audit: self.audit.unwrap_or_else(|| Arc::new(TracingAuditSink)),
		};

		info!(
			superadmin = service.superadmin.as_deref().unwrap_or("-"),
			cache_ttl_secs = service.cache_ttl.map(|t| t.as_secs()),
			"authorization service initialised"
		);
		Ok(service)
	}
}
