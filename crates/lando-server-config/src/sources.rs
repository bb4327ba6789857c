// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::LandoConfigLayer;
use crate::sections::{
	JobsConfigLayer, LogFormat, LoggingConfigLayer, MailConfigLayer, TlsMode, UiConfigLayer,
};

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
	fn load(&self) -> Result<LandoConfigLayer, ConfigError>;
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

	fn load(&self) -> Result<LandoConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(LandoConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/lando/worker.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<LandoConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(LandoConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: LandoConfigLayer =
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
/// Convention: LANDO_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<LandoConfigLayer, ConfigError> {
		debug!("loading environment variables");
		load_from_lookup(&|name| std::env::var(name).ok())
	}
}

type Lookup<'a> = dyn Fn(&str) -> Option<String> + 'a;

/// Builds a layer from an arbitrary variable lookup, so the env mapping can be
/// exercised without touching the process environment.
pub(crate) fn load_from_lookup(lookup: &Lookup<'_>) -> Result<LandoConfigLayer, ConfigError> {
	let env = EnvReader { lookup };
	Ok(LandoConfigLayer {
		mail: Some(load_mail_from_env(&env)?),
		ui: Some(load_ui_from_env(&env)),
		jobs: Some(load_jobs_from_env(&env)?),
		logging: Some(load_logging_from_env(&env)?),
	})
}

struct EnvReader<'a, 'b> {
	lookup: &'a Lookup<'b>,
}

impl EnvReader<'_, '_> {
	fn var(&self, name: &str) -> Option<String> {
		(self.lookup)(name).filter(|s| !s.is_empty())
	}

	fn bool(&self, name: &str) -> Option<bool> {
		self
			.var(name)
			.map(|v| v.eq_ignore_ascii_case("true") || v == "1")
	}

	fn parse<T: std::str::FromStr>(&self, name: &str, kind: &str) -> Result<Option<T>, ConfigError> {
		match self.var(name) {
			Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("invalid {kind} value '{v}'"),
			}),
			None => Ok(None),
		}
	}

	fn list(&self, name: &str) -> Option<Vec<String>> {
		self.var(name).map(|s| {
			s.split(',')
				.map(|s| s.trim().to_string())
				.filter(|s| !s.is_empty())
				.collect()
		})
	}
}

fn load_mail_from_env(env: &EnvReader<'_, '_>) -> Result<MailConfigLayer, ConfigError> {
	let tls_mode = env
		.var("LANDO_MAIL_TLS")
		.map(|v| TlsMode::from_str_value(&v))
		.transpose()?;

	Ok(MailConfigLayer {
		suppress_send: env.bool("LANDO_MAIL_SUPPRESS_SEND"),
		recipient_whitelist: env.list("LANDO_MAIL_RECIPIENT_WHITELIST"),
		server: env.var("LANDO_MAIL_SERVER"),
		port: env.parse("LANDO_MAIL_PORT", "u16")?,
		tls_mode,
		timeout_secs: env.parse("LANDO_MAIL_TIMEOUT_SECS", "u64")?,
	})
}

fn load_ui_from_env(env: &EnvReader<'_, '_>) -> UiConfigLayer {
	UiConfigLayer {
		url: env.var("LANDO_UI_URL"),
	}
}

fn load_jobs_from_env(env: &EnvReader<'_, '_>) -> Result<JobsConfigLayer, ConfigError> {
	Ok(JobsConfigLayer {
		retry_delay_secs: env.parse("LANDO_JOBS_RETRY_DELAY_SECS", "u64")?,
		max_attempts: env.parse("LANDO_JOBS_MAX_ATTEMPTS", "u32")?,
	})
}

fn load_logging_from_env(env: &EnvReader<'_, '_>) -> Result<LoggingConfigLayer, ConfigError> {
	let format = match env.var("LANDO_LOG_FORMAT") {
		Some(v) => Some(
			LogFormat::from_str_value(&v).ok_or_else(|| ConfigError::InvalidValue {
				key: "LANDO_LOG_FORMAT".to_string(),
				message: format!("expected text or json, got '{v}'"),
			})?,
		),
		None => None,
	};

	Ok(LoggingConfigLayer {
		level: env.var("LANDO_LOG_LEVEL"),
		format,
	})
}
