// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Mail delivery configuration section.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAIL_SERVER: &str = "localhost";
pub const DEFAULT_MAIL_PORT: u16 = 25;
pub const DEFAULT_MAIL_TIMEOUT_SECS: u64 = 60;

/// TLS mode for the relay connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
	/// Plain SMTP, as an internal relay normally speaks.
	#[default]
	None,
	/// STARTTLS upgrade after connecting.
	StartTls,
	/// Direct TLS connection.
	Tls,
}

impl TlsMode {
	/// Parse TLS mode from string value.
	pub fn from_str_value(value: &str) -> Result<Self, ConfigError> {
		match value.to_lowercase().as_str() {
			"true" | "tls" => Ok(TlsMode::Tls),
			"starttls" => Ok(TlsMode::StartTls),
			"false" | "none" => Ok(TlsMode::None),
			_ => Err(ConfigError::InvalidValue {
				key: "tls_mode".to_string(),
				message: format!("Invalid value: '{value}'. Expected: tls, starttls, none"),
			}),
		}
	}
}

/// Configuration layer for mail settings (all fields optional for layering).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MailConfigLayer {
	/// Drop every notification instead of sending it.
	pub suppress_send: Option<bool>,
	/// Only these exact addresses may receive mail. Empty means everyone.
	pub recipient_whitelist: Option<Vec<String>>,
	/// Relay hostname.
	pub server: Option<String>,
	/// Relay port.
	pub port: Option<u16>,
	pub tls_mode: Option<TlsMode>,
	/// Connect and command timeout.
	pub timeout_secs: Option<u64>,
}

impl MailConfigLayer {
	/// Merge with another layer, preferring values from `other`.
	pub fn merge(&mut self, other: Self) {
		if other.suppress_send.is_some() {
			self.suppress_send = other.suppress_send;
		}
		if other.recipient_whitelist.is_some() {
			self.recipient_whitelist = other.recipient_whitelist;
		}
		if other.server.is_some() {
			self.server = other.server;
		}
		if other.port.is_some() {
			self.port = other.port;
		}
		if other.tls_mode.is_some() {
			self.tls_mode = other.tls_mode;
		}
		if other.timeout_secs.is_some() {
			self.timeout_secs = other.timeout_secs;
		}
	}

	/// Finalize the layer into a runtime configuration.
	pub fn finalize(self) -> Result<MailConfig, ConfigError> {
		let server = self
			.server
			.unwrap_or_else(|| DEFAULT_MAIL_SERVER.to_string());
		if server.trim().is_empty() {
			return Err(ConfigError::Validation(
				"mail server cannot be empty".to_string(),
			));
		}

		let port = self.port.unwrap_or(DEFAULT_MAIL_PORT);
		if port == 0 {
			return Err(ConfigError::InvalidValue {
				key: "mail.port".to_string(),
				message: "port must be non-zero".to_string(),
			});
		}

		let timeout_secs = self.timeout_secs.unwrap_or(DEFAULT_MAIL_TIMEOUT_SECS);
		if timeout_secs == 0 {
			return Err(ConfigError::InvalidValue {
				key: "mail.timeout_secs".to_string(),
				message: "timeout must be at least one second".to_string(),
			});
		}

		let recipient_whitelist = self
			.recipient_whitelist
			.unwrap_or_default()
			.into_iter()
			.map(|s| s.trim().to_string())
			.filter(|s| !s.is_empty())
			.collect();

		Ok(MailConfig {
			suppress_send: self.suppress_send.unwrap_or(false),
			recipient_whitelist,
			server,
			port,
			tls_mode: self.tls_mode.unwrap_or_default(),
			timeout_secs,
		})
	}
}

/// Resolved mail configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MailConfig {
	pub suppress_send: bool,
	pub recipient_whitelist: Vec<String>,
	pub server: String,
	pub port: u16,
	pub tls_mode: TlsMode,
	pub timeout_secs: u64,
}

impl Default for MailConfig {
	fn default() -> Self {
		Self {
			suppress_send: false,
			recipient_whitelist: Vec::new(),
			server: DEFAULT_MAIL_SERVER.to_string(),
			port: DEFAULT_MAIL_PORT,
			tls_mode: TlsMode::None,
			timeout_secs: DEFAULT_MAIL_TIMEOUT_SECS,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_values() {
		let config = MailConfig::default();
		assert!(!config.suppress_send);
		assert!(config.recipient_whitelist.is_empty());
		assert_eq!(config.server, "localhost");
		assert_eq!(config.port, 25);
		assert_eq!(config.tls_mode, TlsMode::None);
	}

	#[test]
	fn test_layer_finalize_defaults() {
		let config = MailConfigLayer::default().finalize().unwrap();
		assert_eq!(config, MailConfig::default());
	}

	#[test]
	fn test_finalize_trims_and_drops_blank_whitelist_entries() {
		let layer = MailConfigLayer {
			recipient_whitelist: Some(vec![
				" dev@example.com ".to_string(),
				"".to_string(),
				"   ".to_string(),
			]),
			..Default::default()
		};
		let config = layer.finalize().unwrap();
		assert_eq!(config.recipient_whitelist, vec!["dev@example.com".to_string()]);
	}

	#[test]
	fn test_finalize_rejects_empty_server() {
		let layer = MailConfigLayer {
			server: Some("  ".to_string()),
			..Default::default()
		};
		assert!(matches!(layer.finalize(), Err(ConfigError::Validation(_))));
	}

	#[test]
	fn test_finalize_rejects_port_zero() {
		let layer = MailConfigLayer {
			port: Some(0),
			..Default::default()
		};
		assert!(matches!(
			layer.finalize(),
			Err(ConfigError::InvalidValue { .. })
		));
	}

	#[test]
	fn test_finalize_rejects_zero_timeout() {
		let layer = MailConfigLayer {
			timeout_secs: Some(0),
			..Default::default()
		};
		match layer.finalize() {
			Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, "mail.timeout_secs"),
			other => panic!("Expected InvalidValue, got: {other:?}"),
		}
	}

	#[test]
	fn test_merge_overwrites() {
		let mut base = MailConfigLayer {
			suppress_send: Some(true),
			server: Some("relay.internal".to_string()),
			port: Some(2525),
			..Default::default()
		};
		let overlay = MailConfigLayer {
			suppress_send: Some(false),
			port: Some(25),
			..Default::default()
		};
		base.merge(overlay);
		assert_eq!(base.suppress_send, Some(false));
		assert_eq!(base.server.as_deref(), Some("relay.internal"));
		assert_eq!(base.port, Some(25));
	}

	#[test]
	fn test_tls_mode_from_str_value() {
		assert_eq!(TlsMode::from_str_value("TLS").unwrap(), TlsMode::Tls);
		assert_eq!(TlsMode::from_str_value("starttls").unwrap(), TlsMode::StartTls);
		assert_eq!(TlsMode::from_str_value("none").unwrap(), TlsMode::None);
		assert_eq!(TlsMode::from_str_value("false").unwrap(), TlsMode::None);
		assert!(TlsMode::from_str_value("ssl3").is_err());
	}

	#[test]
	fn test_deserialize_layer_partial() {
		let toml_str = r#"
suppress_send = true
recipient_whitelist = ["a@example.com", "b@example.com"]
tls_mode = "starttls"
"#;
		let layer: MailConfigLayer = toml::from_str(toml_str).unwrap();
		assert_eq!(layer.suppress_send, Some(true));
		assert_eq!(layer.recipient_whitelist.as_ref().map(Vec::len), Some(2));
		assert_eq!(layer.tls_mode, Some(TlsMode::StartTls));
		assert!(layer.server.is_none());
	}
}
