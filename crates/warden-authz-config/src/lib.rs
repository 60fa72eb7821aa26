// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the Warden authorization engine.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe sections with validation
//! - Consistent environment variable naming (`WARDEN_AUTHZ_*`)
//!
//! # Usage
//!
//! ```ignore
//! use warden_authz_config::load_config;
//!
//! let config = load_config()?;
//! println!("cache ttl: {:?}", config.authz.cache_ttl());
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::AuthzConfigFileLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/warden/authz.toml";

/// Fully resolved configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WardenConfig {
	pub authz: AuthzConfig,
	pub policy: PolicyConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`WARDEN_AUTHZ_*`)
/// 2. Config file (`/etc/warden/authz.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<WardenConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	];
	load_from_sources(sources)
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<WardenConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	];
	load_from_sources(sources)
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<WardenConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![Box::new(EnvSource)];
	load_from_sources(sources)
}

/// Merge the given sources in precedence order and finalize.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<WardenConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = AuthzConfigFileLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: AuthzConfigFileLayer) -> Result<WardenConfig, ConfigError> {
	let authz = layer.authz.unwrap_or_default().finalize();
	let policy = layer.policy.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	validate_config(&authz, &policy)?;

	info!(
		roles = authz.roles.len(),
		superadmin = authz.superadmin_role.as_deref().unwrap_or("<none>"),
		cache_ttl_secs = authz.cache_ttl_secs,
		default_allow_ownership = authz.default_allow_ownership,
		policy_backend = %policy.backend,
		"Authorization configuration loaded"
	);

	Ok(WardenConfig {
		authz,
		policy,
		logging,
	})
}

/// Validate cross-field configuration rules.
fn validate_config(authz: &AuthzConfig, policy: &PolicyConfig) -> Result<(), ConfigError> {
	if let Some(superadmin) = &authz.superadmin_role {
		if superadmin.is_empty() {
			return Err(ConfigError::Validation(
				"superadmin_role must not be empty".to_string(),
			));
		}
		if !authz.roles.is_empty() && !authz.roles.iter().any(|r| r == superadmin) {
			return Err(ConfigError::Validation(format!(
				"superadmin_role '{superadmin}' is not listed in roles"
			)));
		}
	}

	if policy.backend == PolicyBackend::Casbin
		&& (policy.model_path.is_none() || policy.policy_path.is_none())
	{
		return Err(ConfigError::Validation(
			"casbin policy backend requires both model_path and policy_path".to_string(),
		));
	}

	Ok(())
}
