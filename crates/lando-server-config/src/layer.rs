// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use serde::Deserialize;

use crate::sections::{JobsConfigLayer, LoggingConfigLayer, MailConfigLayer, UiConfigLayer};

/// Worker configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LandoConfigLayer {
	#[serde(default)]
	pub mail: Option<MailConfigLayer>,
	#[serde(default)]
	pub ui: Option<UiConfigLayer>,
	#[serde(default)]
	pub jobs: Option<JobsConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl LandoConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: LandoConfigLayer) {
		merge_option(&mut self.mail, other.mail, MailConfigLayer::merge);
		merge_option(&mut self.ui, other.ui, UiConfigLayer::merge);
		merge_option(&mut self.jobs, other.jobs, JobsConfigLayer::merge);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}
