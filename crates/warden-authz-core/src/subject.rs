// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The subject contract host user types implement.

use serde::{Deserialize, Serialize};

/// An already-authenticated acting identity.
///
/// Authentication is out of scope; implementors only expose what the decision
/// engine needs.
pub trait Subject: Send + Sync {
	/// Stable identifier of the subject.
	fn id(&self) -> String;

	/// Email-like unique string. Used as the policy subject by default.
	fn email(&self) -> &str;

	/// Primary role string.
	fn role(&self) -> &str;

	/// Optional role override. `Some(answer)` replaces the role provider's own
	/// comparison for non-superadmin subjects; `None` defers to it.
	fn has_role(&self, _role: &str) -> Option<bool> {
		None
	}
}

/// Plain subject record for hosts without a user type of their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectRecord {
	pub id: String,
	pub email: String,
	pub role: String,
}

impl SubjectRecord {
	pub fn new(id: impl Into<String>, email: impl Into<String>, role: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			email: email.into(),
			role: role.into(),
		}
	}
}

impl Subject for SubjectRecord {
	fn id(&self) -> String {
		self.id.clone()
	}

	fn email(&self) -> &str {
		&self.email
	}

	fn role(&self) -> &str {
		&self.role
	}
}
