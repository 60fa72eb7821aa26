// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::AuthzConfigFileLayer;
use crate::sections::{AuthzConfigLayer, LoggingConfigLayer, PolicyConfigLayer};
use crate::DEFAULT_CONFIG_PATH;

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<AuthzConfigFileLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<AuthzConfigFileLayer, ConfigError> {
		debug!("loading defaults");
		Ok(AuthzConfigFileLayer::default())
	}
}

/// TOML file configuration source. A missing file contributes nothing.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(DEFAULT_CONFIG_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<AuthzConfigFileLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(AuthzConfigFileLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: AuthzConfigFileLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: WARDEN_AUTHZ_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<AuthzConfigFileLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(AuthzConfigFileLayer {
			authz: Some(load_authz_from_env()?),
			policy: Some(load_policy_from_env()?),
			logging: Some(load_logging_from_env()?),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Result<Option<bool>, ConfigError> {
	let Some(v) = env_var(name) else {
		return Ok(None);
	};
	match v.to_ascii_lowercase().as_str() {
		"true" | "1" | "yes" | "on" => Ok(Some(true)),
		"false" | "0" | "no" | "off" => Ok(Some(false)),
		_ => Err(ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid boolean '{v}'"),
		}),
	}
}

fn env_list(name: &str) -> Option<Vec<String>> {
	env_var(name).map(|s| {
		s.split(',')
			.map(|s| s.trim().to_string())
			.filter(|s| !s.is_empty())
			.collect()
	})
}

fn env_parse<T>(name: &str) -> Result<Option<T>, ConfigError>
where
	T: FromStr,
	T::Err: std::fmt::Display,
{
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|e: T::Err| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid value '{v}': {e}"),
		}),
		None => Ok(None),
	}
}

fn load_authz_from_env() -> Result<AuthzConfigLayer, ConfigError> {
	Ok(AuthzConfigLayer {
		roles: env_list("WARDEN_AUTHZ_ROLES"),
		superadmin_role: env_var("WARDEN_AUTHZ_SUPERADMIN_ROLE"),
		cache_ttl_secs: env_parse("WARDEN_AUTHZ_CACHE_TTL_SECS")?,
		cache_max_entries: env_parse("WARDEN_AUTHZ_CACHE_MAX_ENTRIES")?,
		default_allow_ownership: env_bool("WARDEN_AUTHZ_DEFAULT_ALLOW_OWNERSHIP")?,
	})
}

fn load_policy_from_env() -> Result<PolicyConfigLayer, ConfigError> {
	Ok(PolicyConfigLayer {
		backend: env_parse("WARDEN_AUTHZ_POLICY_BACKEND")?,
		model_path: env_var("WARDEN_AUTHZ_POLICY_MODEL_PATH").map(PathBuf::from),
		policy_path: env_var("WARDEN_AUTHZ_POLICY_PATH").map(PathBuf::from),
	})
}

fn load_logging_from_env() -> Result<LoggingConfigLayer, ConfigError> {
	Ok(LoggingConfigLayer {
		level: env_var("WARDEN_AUTHZ_LOG_LEVEL"),
		format: env_parse("WARDEN_AUTHZ_LOG_FORMAT")?,
	})
}
