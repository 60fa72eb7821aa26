// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit entries for authorization decisions and administrative changes.
//!
//! The engine builds an [`AuditLogEntry`] for guard outcomes, policy and
//! registry mutations, cache clears and provider faults, and hands it to an
//! [`AuditSink`]. Persisting entries is the host's business; the default
//! [`TracingAuditSink`] only emits them as log lines.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Types of events that can be recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
	// Decisions
	/// A guarded operation was allowed.
	AccessGranted,
	/// A guarded operation was denied.
	AccessDenied,

	// Policy administration
	PolicyAdded,
	PolicyRemoved,
	/// The permission cache was cleared, fully or by pattern.
	CacheCleared,

	// Ownership registry
	ProviderRegistered,
	ProviderUnregistered,

	/// A provider or evaluator failed and the check failed closed.
	ProviderFault,
}

impl std::fmt::Display for AuditEventType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let s = match self {
			AuditEventType::AccessGranted => "access_granted",
			AuditEventType::AccessDenied => "access_denied",
			AuditEventType::PolicyAdded => "policy_added",
			AuditEventType::PolicyRemoved => "policy_removed",
			AuditEventType::CacheCleared => "cache_cleared",
			AuditEventType::ProviderRegistered => "provider_registered",
			AuditEventType::ProviderUnregistered => "provider_unregistered",
			AuditEventType::ProviderFault => "provider_fault",
		};
		write!(f, "{s}")
	}
}

/// A recorded authorization event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
	pub id: Uuid,
	pub timestamp: DateTime<Utc>,
	pub event_type: AuditEventType,
	/// Subject identifier, when the event concerns one.
	pub subject_id: Option<String>,
	pub subject_role: Option<String>,
	pub resource_type: Option<String>,
	pub resource_id: Option<String>,
	/// Human-readable description; defaults to the event type.
	pub action: String,
	pub details: serde_json::Value,
}

impl AuditLogEntry {
	pub fn builder(event_type: AuditEventType) -> AuditLogBuilder {
		AuditLogBuilder::new(event_type)
	}
}

/// Fluent builder for [`AuditLogEntry`].
#[derive(Debug, Clone)]
pub struct AuditLogBuilder {
	event_type: AuditEventType,
	subject_id: Option<String>,
	subject_role: Option<String>,
	resource_type: Option<String>,
	resource_id: Option<String>,
	action: Option<String>,
	details: serde_json::Value,
}

impl AuditLogBuilder {
	pub fn new(event_type: AuditEventType) -> Self {
		Self {
			event_type,
			subject_id: None,
			subject_role: None,
			resource_type: None,
			resource_id: None,
			action: None,
			details: serde_json::Value::Null,
		}
	}

	pub fn subject(mut self, id: impl Into<String>, role: impl Into<String>) -> Self {
		self.subject_id = Some(id.into());
		self.subject_role = Some(role.into());
		self
	}

	pub fn resource(mut self, resource_type: impl Into<String>, resource_id: Option<String>) -> Self {
		self.resource_type = Some(resource_type.into());
		self.resource_id = resource_id;
		self
	}

	pub fn action(mut self, action: impl Into<String>) -> Self {
		self.action = Some(action.into());
		self
	}

	pub fn details(mut self, details: serde_json::Value) -> Self {
		self.details = details;
		self
	}

	pub fn build(self) -> AuditLogEntry {
		AuditLogEntry {
			id: Uuid::new_v4(),
			timestamp: Utc::now(),
			event_type: self.event_type,
			subject_id: self.subject_id,
			subject_role: self.subject_role,
			resource_type: self.resource_type,
			resource_id: self.resource_id,
			action: self.action.unwrap_or_else(|| self.event_type.to_string()),
			details: self.details,
		}
	}
}

/// Receives audit entries. Must not block; called inline on check paths.
pub trait AuditSink: Send + Sync {
	fn record(&self, entry: AuditLogEntry);
}

/// Emits entries as `tracing` events under the `warden_authz::audit` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
	fn record(&self, entry: AuditLogEntry) {
		let subject = entry.subject_id.as_deref().unwrap_or("-");
		let resource_type = entry.resource_type.as_deref().unwrap_or("-");
		let resource_id = entry.resource_id.as_deref().unwrap_or("-");
		match entry.event_type {
			AuditEventType::AccessDenied => tracing::warn!(
				target: "warden_authz::audit",
				audit_id = %entry.id,
				event = %entry.event_type,
				subject,
				resource_type,
				resource_id,
				details = %entry.details,
				"{}",
				entry.action
			),
			AuditEventType::ProviderFault => tracing::error!(
				target: "warden_authz::audit",
				audit_id = %entry.id,
				event = %entry.event_type,
				subject,
				resource_type,
				resource_id,
				details = %entry.details,
				"{}",
				entry.action
			),
			_ => tracing::info!(
				target: "warden_authz::audit",
				audit_id = %entry.id,
				event = %entry.event_type,
				subject,
				resource_type,
				resource_id,
				details = %entry.details,
				"{}",
				entry.action
			),
		}
	}
}

/// Keeps entries in memory. Useful in tests and for hosts that drain entries
/// into their own store.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
	entries: Mutex<Vec<AuditLogEntry>>,
}

impl MemoryAuditSink {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn entries(&self) -> Vec<AuditLogEntry> {
		self.entries.lock().clone()
	}

	pub fn of_type(&self, event_type: AuditEventType) -> Vec<AuditLogEntry> {
		self.entries
			.lock()
			.iter()
			.filter(|e| e.event_type == event_type)
			.cloned()
			.collect()
	}

	/// Removes and returns everything recorded so far.
	pub fn drain(&self) -> Vec<AuditLogEntry> {
		std::mem::take(&mut *self.entries.lock())
	}

	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.lock().is_empty()
	}
}

impl AuditSink for MemoryAuditSink {
	fn record(&self, entry: AuditLogEntry) {
		self.entries.lock().push(entry);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	mod audit_event_type {
		use super::*;

		#[test]
		fn display_returns_snake_case() {
			assert_eq!(AuditEventType::AccessDenied.to_string(), "access_denied");
			assert_eq!(AuditEventType::CacheCleared.to_string(), "cache_cleared");
			assert_eq!(
				AuditEventType::ProviderUnregistered.to_string(),
				"provider_unregistered"
			);
		}

		#[test]
		fn serde_matches_display() {
			let events = [
				AuditEventType::AccessGranted,
				AuditEventType::AccessDenied,
				AuditEventType::PolicyAdded,
				AuditEventType::PolicyRemoved,
				AuditEventType::CacheCleared,
				AuditEventType::ProviderRegistered,
				AuditEventType::ProviderUnregistered,
				AuditEventType::ProviderFault,
			];

			for event in events {
				let json = serde_json::to_string(&event).unwrap();
				assert_eq!(json, format!("\"{event}\""));
			}
		}
	}

	mod audit_log_builder {
		use super::*;

		#[test]
		fn builds_minimal_entry() {
			let entry = AuditLogBuilder::new(AuditEventType::CacheCleared).build();

			assert_eq!(entry.event_type, AuditEventType::CacheCleared);
			assert!(entry.subject_id.is_none());
			assert!(entry.resource_type.is_none());
			assert_eq!(entry.action, "cache_cleared");
			assert_eq!(entry.details, serde_json::Value::Null);
		}

		#[test]
		fn builds_full_entry() {
			let entry = AuditLogEntry::builder(AuditEventType::AccessDenied)
				.subject("42", "user")
				.resource("invoice", Some("7".to_string()))
				.action("delete_invoice")
				.details(json!({"unmet": ["role admin"]}))
				.build();

			assert_eq!(entry.subject_id.as_deref(), Some("42"));
			assert_eq!(entry.subject_role.as_deref(), Some("user"));
			assert_eq!(entry.resource_type.as_deref(), Some("invoice"));
			assert_eq!(entry.resource_id.as_deref(), Some("7"));
			assert_eq!(entry.action, "delete_invoice");
			assert_eq!(entry.details["unmet"][0], "role admin");
		}

		#[test]
		fn generates_unique_ids() {
			let a = AuditLogBuilder::new(AuditEventType::AccessGranted).build();
			let b = AuditLogBuilder::new(AuditEventType::AccessGranted).build();
			assert_ne!(a.id, b.id);
		}

		#[test]
		fn serializes_to_json() {
			let entry = AuditLogBuilder::new(AuditEventType::ProviderFault)
				.action("ownership provider failed")
				.build();
			let json = serde_json::to_string(&entry).unwrap();
			assert!(json.contains("\"event_type\":\"provider_fault\""));
		}
	}

	mod sinks {
		use super::*;

		#[test]
		fn memory_sink_records_and_drains() {
			let sink = MemoryAuditSink::new();
			sink.record(AuditLogBuilder::new(AuditEventType::PolicyAdded).build());
			sink.record(AuditLogBuilder::new(AuditEventType::AccessDenied).build());

			assert_eq!(sink.len(), 2);
			assert_eq!(sink.of_type(AuditEventType::AccessDenied).len(), 1);
			assert_eq!(sink.drain().len(), 2);
			assert!(sink.is_empty());
		}

		#[test]
		fn tracing_sink_does_not_panic_without_subscriber() {
			TracingAuditSink.record(
				AuditLogBuilder::new(AuditEventType::ProviderFault)
					.subject("1", "user")
					.build(),
			);
		}
	}
}
