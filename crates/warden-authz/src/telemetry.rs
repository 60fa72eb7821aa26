// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tracing subscriber setup for hosts that do not install their own.

use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;
use warden_authz_config::{LogFormat, LoggingConfig};

#[derive(Debug, Error)]
pub enum TelemetryError {
	#[error("invalid log filter: {0}")]
	Filter(#[from] ParseError),

	#[error("failed to install tracing subscriber: {0}")]
	Init(#[from] TryInitError),
}

/// Builds the filter: `RUST_LOG` wins, otherwise the configured level.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, TelemetryError> {
	match EnvFilter::try_from_default_env() {
		Ok(filter) => Ok(filter),
		Err(_) => Ok(EnvFilter::try_new(&config.level)?),
	}
}

/// Installs the global subscriber. Fails instead of panicking when one is
/// already set.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), TelemetryError> {
	let filter = env_filter(config)?;

	let (pretty, json) = match config.format {
		LogFormat::Pretty => (Some(tracing_subscriber::fmt::layer()), None),
		LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
	};

	tracing_subscriber::registry()
		.with(filter)
		.with(pretty)
		.with(json)
		.try_init()?;

	tracing::debug!(level = %config.level, format = ?config.format, "tracing initialised");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_malformed_level() {
		let config = LoggingConfig {
			level: "warden_authz=notalevel".to_string(),
			format: LogFormat::Pretty,
		};
		if std::env::var("RUST_LOG").is_err() {
			assert!(matches!(env_filter(&config), Err(TelemetryError::Filter(_))));
		}
	}

	#[test]
	fn second_init_is_an_error() {
		let config = LoggingConfig::default();
		let _ = init_tracing(&config);
		assert!(matches!(init_tracing(&config), Err(TelemetryError::Init(_))));
	}
}
