// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::HashSet;
use std::fmt;

/// Delivery gate evaluated before any relay connection is opened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryPolicy {
	pub suppress_send: bool,
	/// Exact, case-sensitive addresses. Empty allows everyone.
	pub recipient_whitelist: HashSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
	Allowed,
	Suppressed(SuppressionReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressionReason {
	AllMailDisabled,
	NotWhitelisted,
}

impl SuppressionReason {
	pub fn as_str(self) -> &'static str {
		match self {
			SuppressionReason::AllMailDisabled => "all_mail_disabled",
			SuppressionReason::NotWhitelisted => "not_whitelisted",
		}
	}
}

impl fmt::Display for SuppressionReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl DeliveryPolicy {
	pub fn new(suppress_send: bool, recipient_whitelist: impl IntoIterator<Item = String>) -> Self {
		Self {
			suppress_send,
			recipient_whitelist: recipient_whitelist.into_iter().collect(),
		}
	}

	/// Global suppression wins over the whitelist.
	pub fn evaluate(&self, recipient_email: &str) -> Delivery {
		if self.suppress_send {
			return Delivery::Suppressed(SuppressionReason::AllMailDisabled);
		}

		if !self.recipient_whitelist.is_empty() && !self.recipient_whitelist.contains(recipient_email)
		{
			return Delivery::Suppressed(SuppressionReason::NotWhitelisted);
		}

		Delivery::Allowed
	}
}
