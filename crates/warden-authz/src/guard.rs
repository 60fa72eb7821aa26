// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Requirement evaluation for guarded operations.
//!
//! A [`Guard`] holds a list of [`RequirementGroup`]s. Requirements inside a
//! group are ANDed and short-circuit on the first failure; groups are ORed and
//! the first group that passes authorizes the call. The acting subject comes
//! from the [`CallArgs`] or from an accessor supplied when the guard is built.
//!
//! ```ignore
//! let guard = Guard::new("delete_invoice")
//! 	.require(RequirementGroup::new().and(roles.get("admin").unwrap()))
//! 	.require(
//! 		RequirementGroup::new()
//! 			.and(Permission::new("invoice", "delete"))
//! 			.and(ResourceOwnership::new("invoice", "invoice_id")),
//! 	);
//!
//! let args = CallArgs::new().with_subject(user).with_param("invoice_id", 42);
//! guard.call(&service, args, |args| async move { delete(args).await }).await?;
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use warden_authz_core::{
	AuthorizationDenied, DenialKind, Requirement, RequirementGroup, Subject, UnmetRequirement,
};

use crate::audit::{AuditEventType, AuditLogBuilder};
use crate::error::{ConfigurationError, GuardError};
use crate::service::AuthorizationService;

/// Extracts the acting subject from a call's arguments.
pub type SubjectAccessor = Arc<dyn Fn(&CallArgs) -> Option<Arc<dyn Subject>> + Send + Sync>;

/// Arguments of one guarded call: the subject plus named parameters that
/// ownership requirements read resource ids from.
#[derive(Clone, Default)]
pub struct CallArgs {
	subject: Option<Arc<dyn Subject>>,
	params: HashMap<String, String>,
}

impl CallArgs {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_subject(mut self, subject: Arc<dyn Subject>) -> Self {
		self.subject = Some(subject);
		self
	}

	pub fn with_param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
		self.params.insert(name.into(), value.to_string());
		self
	}

	pub fn subject(&self) -> Option<&Arc<dyn Subject>> {
		self.subject.as_ref()
	}

	pub fn param(&self, name: &str) -> Option<&str> {
		self.params.get(name).map(String::as_str)
	}
}

impl std::fmt::Debug for CallArgs {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CallArgs")
			.field("subject_id", &self.subject.as_ref().map(|s| s.id()))
			.field("params", &self.params)
			.finish()
	}
}

/// Requirement groups guarding one named operation.
#[derive(Clone)]
pub struct Guard {
	operation: String,
	groups: Vec<RequirementGroup>,
	subject_accessor: Option<SubjectAccessor>,
}

impl Guard {
	pub fn new(operation: impl Into<String>) -> Self {
		Self {
			operation: operation.into(),
			groups: Vec::new(),
			subject_accessor: None,
		}
	}

	/// Adds an alternative group. Any passing group authorizes the call.
	pub fn require(mut self, group: RequirementGroup) -> Self {
		self.groups.push(group);
		self
	}

	/// Adds an alternative group holding a single requirement.
	pub fn require_one(self, requirement: impl Into<Requirement>) -> Self {
		self.require(RequirementGroup::new().and(requirement))
	}

	/// Takes the subject from `accessor` instead of [`CallArgs::subject`].
	pub fn with_subject_accessor<F>(mut self, accessor: F) -> Self
	where
		F: Fn(&CallArgs) -> Option<Arc<dyn Subject>> + Send + Sync + 'static,
	{
		self.subject_accessor = Some(Arc::new(accessor));
		self
	}

	pub fn operation(&self) -> &str {
		&self.operation
	}

	pub fn groups(&self) -> &[RequirementGroup] {
		&self.groups
	}

	fn subject(&self, args: &CallArgs) -> Option<Arc<dyn Subject>> {
		match &self.subject_accessor {
			Some(accessor) => accessor(args),
			None => args.subject.clone(),
		}
	}

	/// Evaluates the guard without running anything.
	pub async fn authorize(
		&self,
		service: &AuthorizationService,
		args: &CallArgs,
	) -> Result<(), GuardError> {
		if self.groups.is_empty() {
			return Err(ConfigurationError::NoRequirements {
				operation: self.operation.clone(),
			}
			.into());
		}

		let Some(subject) = self.subject(args) else {
			return Err(ConfigurationError::SubjectNotFound {
				operation: self.operation.clone(),
			}
			.into());
		};

		evaluate(service, &self.operation, subject.as_ref(), &self.groups, args).await?;
		Ok(())
	}

	/// Runs `op` only if the guard authorizes the call.
	pub async fn call<T, F, Fut>(
		&self,
		service: &AuthorizationService,
		args: CallArgs,
		op: F,
	) -> Result<T, GuardError>
	where
		F: FnOnce(CallArgs) -> Fut,
		Fut: Future<Output = T>,
	{
		self.authorize(service, &args).await?;
		Ok(op(args).await)
	}
}

impl std::fmt::Debug for Guard {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Guard")
			.field("operation", &self.operation)
			.field("groups", &self.groups)
			.field("subject_accessor", &self.subject_accessor.is_some())
			.finish()
	}
}

enum GroupOutcome {
	Passed,
	Failed(UnmetRequirement),
}

/// Evaluates `groups` for `subject`: first passing group wins, otherwise the
/// denial lists the first unmet requirement of every group.
#[instrument(level = "debug", skip_all, fields(operation = %operation, groups = groups.len()))]
pub async fn evaluate(
	service: &AuthorizationService,
	operation: &str,
	subject: &dyn Subject,
	groups: &[RequirementGroup],
	args: &CallArgs,
) -> Result<(), AuthorizationDenied> {
	let mut unmet = Vec::with_capacity(groups.len());

	for (index, group) in groups.iter().enumerate() {
		match evaluate_group(service, subject, group, args).await {
			GroupOutcome::Passed => {
				debug!(group = index, "requirement group satisfied");
				service.record_audit(
					AuditLogBuilder::new(AuditEventType::AccessGranted)
						.subject(subject.id(), subject.role())
						.action(operation)
						.details(serde_json::json!({ "group": index }))
						.build(),
				);
				return Ok(());
			}
			GroupOutcome::Failed(requirement) => unmet.push(requirement),
		}
	}

	let denied = AuthorizationDenied {
		operation: operation.to_string(),
		subject_role: subject.role().to_string(),
		unmet,
	};

	warn!(subject_id = %subject.id(), reason = %denied, "authorization denied");
	let (resource_type, resource_id) = denied
		.unmet
		.iter()
		.find_map(|u| {
			u.resource_type
				.as_ref()
				.map(|t| (t.clone(), u.resource_id.clone()))
		})
		.unzip();
	let mut entry = AuditLogBuilder::new(AuditEventType::AccessDenied)
		.subject(subject.id(), subject.role())
		.action(operation)
		.details(serde_json::json!({ "unmet": denied.unmet }));
	if let Some(resource_type) = resource_type {
		entry = entry.resource(resource_type, resource_id.flatten());
	}
	service.record_audit(entry.build());

	Err(denied)
}

async fn evaluate_group(
	service: &AuthorizationService,
	subject: &dyn Subject,
	group: &RequirementGroup,
	args: &CallArgs,
) -> GroupOutcome {
	for requirement in group.iter() {
		if let Some(unmet) = check_requirement(service, subject, requirement, args).await {
			return GroupOutcome::Failed(unmet);
		}
	}
	GroupOutcome::Passed
}

/// `None` when the requirement holds.
async fn check_requirement(
	service: &AuthorizationService,
	subject: &dyn Subject,
	requirement: &Requirement,
	args: &CallArgs,
) -> Option<UnmetRequirement> {
	let unmet = || UnmetRequirement::new(requirement.kind(), requirement.to_string());

	match requirement {
		Requirement::Role(roles) => {
			if roles.is_empty() || !service.has_any_role(subject, roles).await {
				return Some(unmet());
			}
		}
		Requirement::Permission(permission) => {
			if !service.check_permission_for(subject, permission).await {
				return Some(unmet());
			}
		}
		Requirement::Privilege(privilege) => {
			let resource_id = privilege
				.resource
				.as_ref()
				.and_then(|ownership| args.param(&ownership.id_param));
			let failed = service
				.privilege_failure(subject, privilege, resource_id)
				.await?;
			let denial = UnmetRequirement::new(failed, requirement.to_string());
			return Some(match (&privilege.resource, failed) {
				(Some(ownership), DenialKind::Ownership) => denial.with_resource(
					ownership.resource_type.clone(),
					resource_id.map(str::to_string),
				),
				_ => denial,
			});
		}
		Requirement::Ownership(ownership) => {
			let Some(resource_id) = args.param(&ownership.id_param) else {
				warn!(
					resource_type = %ownership.resource_type,
					param = %ownership.id_param,
					"ownership parameter missing from call"
				);
				return Some(unmet().with_resource(ownership.resource_type.clone(), None));
			};
			if !service
				.check_resource_ownership(subject, &ownership.resource_type, resource_id)
				.await
			{
				return Some(
					unmet().with_resource(ownership.resource_type.clone(), Some(resource_id.to_string())),
				);
			}
		}
	}

	None
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::audit::MemoryAuditSink;
	use crate::policy::{MemoryPolicyEvaluator, PolicyEvaluator};
	use crate::providers::OwnershipFn;
	use warden_authz_core::{
		create_roles, DenialKind, Permission, Privilege, ResourceOwnership, RoleSet, SubjectRecord,
	};

	struct Fixture {
		service: AuthorizationService,
		roles: RoleSet,
		audit: Arc<MemoryAuditSink>,
	}

	async fn fixture() -> Fixture {
		let roles = create_roles(["admin", "user"], Some("admin")).unwrap();
		let policy = Arc::new(MemoryPolicyEvaluator::new());
		policy
			.add_policy("user@example.com", "invoice", "read")
			.await
			.unwrap();
		let audit = Arc::new(MemoryAuditSink::new());
		let service = AuthorizationService::builder(policy)
			.with_role_set(roles.clone())
			.with_audit_sink(audit.clone())
			.build()
			.unwrap();
		service
			.register_ownership_provider(
				"invoice",
				Arc::new(OwnershipFn::new(|_: &dyn Subject, id: &str| id == "42")),
			)
			.unwrap();
		Fixture {
			service,
			roles,
			audit,
		}
	}

	fn args(role: &str) -> CallArgs {
		CallArgs::new().with_subject(Arc::new(SubjectRecord::new("1", "user@example.com", role)))
	}

	mod configuration {
		use super::*;

		#[tokio::test]
		async fn no_groups_is_a_configuration_error() {
			let f = fixture().await;
			let err = Guard::new("noop")
				.authorize(&f.service, &args("user"))
				.await
				.unwrap_err();
			assert!(matches!(
				err,
				GuardError::Configuration(ConfigurationError::NoRequirements { .. })
			));
		}

		#[tokio::test]
		async fn missing_subject_is_a_configuration_error() {
			let f = fixture().await;
			let guard = Guard::new("read_invoice").require_one(Permission::new("invoice", "read"));
			let err = guard
				.authorize(&f.service, &CallArgs::new())
				.await
				.unwrap_err();
			assert!(matches!(
				err,
				GuardError::Configuration(ConfigurationError::SubjectNotFound { .. })
			));
		}

		#[tokio::test]
		async fn subject_accessor_overrides_args() {
			let f = fixture().await;
			let guard = Guard::new("admin_only")
				.require_one(f.roles.get("admin").unwrap())
				.with_subject_accessor(|_| {
					Some(Arc::new(SubjectRecord::new("0", "root@example.com", "admin")) as Arc<dyn Subject>)
				});
			assert!(guard.authorize(&f.service, &args("user")).await.is_ok());
		}

		#[tokio::test]
		async fn empty_group_only_needs_a_subject() {
			let f = fixture().await;
			let guard = Guard::new("authenticated").require(RequirementGroup::new());
			assert!(guard.authorize(&f.service, &args("user")).await.is_ok());
		}
	}

	mod semantics {
		use super::*;

		#[tokio::test]
		async fn role_denial_reports_role_kind() {
			let f = fixture().await;
			let guard = Guard::new("admin_panel").require_one(f.roles.get("admin").unwrap());
			let err = guard.authorize(&f.service, &args("user")).await.unwrap_err();

			let denied = err.as_denied().unwrap();
			assert!(denied.is_role_denied());
			assert_eq!(denied.subject_role, "user");
			assert_eq!(denied.operation, "admin_panel");
			assert_eq!(f.audit.of_type(AuditEventType::AccessDenied).len(), 1);
		}

		#[tokio::test]
		async fn empty_role_composition_never_passes() {
			let f = fixture().await;
			let guard = Guard::new("nobody")
				.require_one(warden_authz_core::RoleComposition::new());
			assert!(guard.authorize(&f.service, &args("admin")).await.is_err());
		}

		#[tokio::test]
		async fn and_within_group() {
			let f = fixture().await;
			let guard = Guard::new("read_own_invoice").require(
				RequirementGroup::new()
					.and(Permission::new("invoice", "read"))
					.and(ResourceOwnership::new("invoice", "invoice_id")),
			);

			assert!(guard
				.authorize(&f.service, &args("user").with_param("invoice_id", 42))
				.await
				.is_ok());

			let err = guard
				.authorize(&f.service, &args("user").with_param("invoice_id", 7))
				.await
				.unwrap_err();
			let denied = err.as_denied().unwrap();
			assert!(denied.is_ownership_denied());
			assert_eq!(denied.unmet[0].resource_id.as_deref(), Some("7"));
		}

		#[tokio::test]
		async fn missing_id_param_is_unmet() {
			let f = fixture().await;
			let guard =
				Guard::new("read_invoice").require_one(ResourceOwnership::new("invoice", "invoice_id"));
			let err = guard.authorize(&f.service, &args("user")).await.unwrap_err();
			let denied = err.as_denied().unwrap();
			assert_eq!(denied.kind(), Some(DenialKind::Ownership));
			assert_eq!(denied.unmet[0].resource_id, None);
		}

		#[tokio::test]
		async fn or_across_groups() {
			let f = fixture().await;
			let guard = Guard::new("delete_invoice")
				.require_one(f.roles.get("admin").unwrap())
				.require_one(ResourceOwnership::new("invoice", "invoice_id"));

			assert!(guard
				.authorize(&f.service, &args("user").with_param("invoice_id", 42))
				.await
				.is_ok());

			let err = guard
				.authorize(&f.service, &args("user").with_param("invoice_id", 1))
				.await
				.unwrap_err();
			assert_eq!(err.as_denied().unwrap().unmet.len(), 2);
		}

		#[tokio::test]
		async fn privilege_reads_id_from_args() {
			let f = fixture().await;
			let privilege = Privilege::new(Permission::new("invoice", "read"))
				.with_roles([f.roles.get("user").unwrap()])
				.owning(ResourceOwnership::new("invoice", "invoice_id"));
			let guard = Guard::new("view_invoice").require_one(privilege);

			assert!(guard
				.authorize(&f.service, &args("user").with_param("invoice_id", "42"))
				.await
				.is_ok());
			let err = guard
				.authorize(&f.service, &args("user").with_param("invoice_id", "9"))
				.await
				.unwrap_err();
			let denied = err.as_denied().unwrap();
			assert!(denied.is_ownership_denied());
			assert_eq!(denied.unmet[0].resource_type.as_deref(), Some("invoice"));
			assert_eq!(denied.unmet[0].resource_id.as_deref(), Some("9"));
		}

		#[tokio::test]
		async fn privilege_denial_names_the_failing_part() {
			let f = fixture().await;
			let by_role = Guard::new("approve_invoice").require_one(
				Privilege::new(Permission::new("invoice", "read"))
					.with_roles([f.roles.get("admin").unwrap()]),
			);
			let err = by_role.authorize(&f.service, &args("user")).await.unwrap_err();
			let denied = err.as_denied().unwrap();
			assert!(denied.is_role_denied());
			assert_eq!(denied.unmet[0].resource_type, None);

			let by_permission = Guard::new("delete_invoice")
				.require_one(Privilege::new(Permission::new("invoice", "delete")));
			let err = by_permission
				.authorize(&f.service, &args("user"))
				.await
				.unwrap_err();
			assert!(err.as_denied().unwrap().is_permission_denied());
			assert!(err.to_string().contains("privilege"));
		}
	}

	mod call {
		use super::*;

		#[tokio::test]
		async fn runs_operation_when_authorized() {
			let f = fixture().await;
			let guard = Guard::new("read_invoice").require_one(Permission::new("invoice", "read"));

			let result = guard
				.call(&f.service, args("user").with_param("invoice_id", 42), |args| async move {
					args.param("invoice_id").map(str::to_string)
				})
				.await
				.unwrap();
			assert_eq!(result.as_deref(), Some("42"));
			assert_eq!(f.audit.of_type(AuditEventType::AccessGranted).len(), 1);
		}

		#[tokio::test]
		async fn skips_operation_when_denied() {
			let f = fixture().await;
			let guard = Guard::new("write_invoice").require_one(Permission::new("invoice", "write"));
			let mut ran = false;

			let result = guard
				.call(&f.service, args("user"), |_| {
					ran = true;
					async {}
				})
				.await;

			assert!(result.unwrap_err().is_denied());
			assert!(!ran);
		}
	}
}
