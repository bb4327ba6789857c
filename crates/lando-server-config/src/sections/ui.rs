// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Lando UI section: where revision links in notifications point.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UiConfigLayer {
	pub url: Option<String>,
}

impl UiConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.url.is_some() {
			self.url = other.url;
		}
	}

	/// The UI URL has no sensible default; a worker without it would mail
	/// dead links.
	pub fn finalize(self) -> Result<UiConfig, ConfigError> {
		let url = self
			.url
			.map(|u| u.trim().trim_end_matches('/').to_string())
			.filter(|u| !u.is_empty())
			.ok_or_else(|| ConfigError::Missing("LANDO_UI_URL".to_string()))?;

		if !(url.starts_with("http://") || url.starts_with("https://")) {
			return Err(ConfigError::InvalidValue {
				key: "ui.url".to_string(),
				message: format!("'{url}' is not an http(s) URL"),
			});
		}

		Ok(UiConfig { url })
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UiConfig {
	/// Base URL without a trailing slash, e.g. `https://lando.test`.
	pub url: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_missing_url_is_error() {
		let err = UiConfigLayer::default().finalize().unwrap_err();
		assert!(matches!(err, ConfigError::Missing(_)));
		assert!(err.to_string().contains("LANDO_UI_URL"));
	}

	#[test]
	fn test_trailing_slash_is_trimmed() {
		let layer = UiConfigLayer {
			url: Some("https://lando.test/".to_string()),
		};
		assert_eq!(layer.finalize().unwrap().url, "https://lando.test");
	}

	#[test]
	fn test_non_http_url_rejected() {
		let layer = UiConfigLayer {
			url: Some("lando.test".to_string()),
		};
		assert!(matches!(
			layer.finalize(),
			Err(ConfigError::InvalidValue { .. })
		));
	}

	#[test]
	fn test_merge_keeps_base_when_other_empty() {
		let mut base = UiConfigLayer {
			url: Some("https://lando.test".to_string()),
		};
		base.merge(UiConfigLayer::default());
		assert_eq!(base.url.as_deref(), Some("https://lando.test"));
	}
}
