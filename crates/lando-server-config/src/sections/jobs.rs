// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Jobs configuration section.

use serde::{Deserialize, Serialize};

/// One retry a minute.
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 60;
/// Three days of one-minute attempts, the effort an MTA spends on its outbound queue.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60 * 24 * 3;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct JobsConfigLayer {
	pub retry_delay_secs: Option<u64>,
	pub max_attempts: Option<u32>,
}

impl JobsConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.retry_delay_secs.is_some() {
			self.retry_delay_secs = other.retry_delay_secs;
		}
		if other.max_attempts.is_some() {
			self.max_attempts = other.max_attempts;
		}
	}

	pub fn finalize(self) -> JobsConfig {
		JobsConfig {
			retry_delay_secs: self.retry_delay_secs.unwrap_or(DEFAULT_RETRY_DELAY_SECS),
			max_attempts: self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobsConfig {
	pub retry_delay_secs: u64,
	pub max_attempts: u32,
}

impl Default for JobsConfig {
	fn default() -> Self {
		Self {
			retry_delay_secs: DEFAULT_RETRY_DELAY_SECS,
			max_attempts: DEFAULT_MAX_ATTEMPTS,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_values() {
		let config = JobsConfig::default();
		assert_eq!(config.retry_delay_secs, 60);
		assert_eq!(config.max_attempts, 4320);
	}

	#[test]
	fn test_layer_finalize_with_values() {
		let layer = JobsConfigLayer {
			retry_delay_secs: Some(5),
			max_attempts: Some(3),
		};
		let config = layer.finalize();
		assert_eq!(config.retry_delay_secs, 5);
		assert_eq!(config.max_attempts, 3);
	}

	#[test]
	fn test_merge_overwrites() {
		let mut base = JobsConfigLayer {
			retry_delay_secs: Some(60),
			max_attempts: Some(10),
		};
		base.merge(JobsConfigLayer {
			retry_delay_secs: None,
			max_attempts: Some(1),
		});
		assert_eq!(base.retry_delay_secs, Some(60));
		assert_eq!(base.max_attempts, Some(1));
	}

	#[test]
	fn test_serde_roundtrip() {
		let config = JobsConfig {
			retry_delay_secs: 30,
			max_attempts: 100,
		};
		let toml_str = toml::to_string(&config).unwrap();
		let parsed: JobsConfig = toml::from_str(&toml_str).unwrap();
		assert_eq!(config, parsed);
	}
}
