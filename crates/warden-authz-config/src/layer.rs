// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Top-level partial configuration produced by each source.

use serde::{Deserialize, Serialize};

use crate::sections::{AuthzConfigLayer, LoggingConfigLayer, PolicyConfigLayer};

/// One source's view of the configuration. Every field is optional so layers
/// can be merged in precedence order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuthzConfigFileLayer {
	pub authz: Option<AuthzConfigLayer>,
	pub policy: Option<PolicyConfigLayer>,
	pub logging: Option<LoggingConfigLayer>,
}

impl AuthzConfigFileLayer {
	/// Overlay `other` onto `self`; values present in `other` win.
	pub fn merge(&mut self, other: Self) {
		merge_section(&mut self.authz, other.authz, AuthzConfigLayer::merge);
		merge_section(&mut self.policy, other.policy, PolicyConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: fn(&mut T, T)) {
	match (base.as_mut(), other) {
		(Some(base), Some(other)) => merge(base, other),
		(None, Some(other)) => *base = Some(other),
		(_, None) => {}
	}
}
