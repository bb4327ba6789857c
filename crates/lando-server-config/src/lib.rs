// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Delivery configuration for the Lando notification worker.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`LANDO_*`)
//!
//! Configuration is read once at worker startup and handed to jobs as plain
//! values; nothing here is global.
//!
//! # Usage
//!
//! ```ignore
//! use lando_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("relaying through {}:{}", config.mail.server, config.mail.port);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::LandoConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved worker configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LandoConfig {
	pub mail: MailConfig,
	pub ui: UiConfig,
	pub jobs: JobsConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`LANDO_*`)
/// 2. Config file (`/etc/lando/worker.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<LandoConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<LandoConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<LandoConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = LandoConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: LandoConfigLayer) -> Result<LandoConfig, ConfigError> {
	let mail = layer.mail.unwrap_or_default().finalize()?;
	let ui = layer.ui.unwrap_or_default().finalize()?;
	let jobs = layer.jobs.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	info!(
		mail_server = %mail.server,
		mail_port = mail.port,
		suppress_send = mail.suppress_send,
		whitelist_size = mail.recipient_whitelist.len(),
		lando_ui_url = %ui.url,
		retry_delay_secs = jobs.retry_delay_secs,
		max_attempts = jobs.max_attempts,
		"Worker configuration loaded"
	);

	Ok(LandoConfig {
		mail,
		ui,
		jobs,
		logging,
	})
}
