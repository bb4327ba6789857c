// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Build information for lando-worker.

pub fn format_version_info() -> String {
	format!(
		"lando-worker version: {}\n\
		 Platform:             {}-{}",
		env!("CARGO_PKG_VERSION"),
		std::env::consts::ARCH,
		std::env::consts::OS,
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_version_info_names_binary_and_version() {
		let info = format_version_info();
		assert!(info.starts_with("lando-worker version: "));
		assert!(info.contains(env!("CARGO_PKG_VERSION")));
	}
}
