// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

/// Queue payload: who to tell, about which revision, and why it failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandingFailureNotification {
	/// The email of the user receiving the failure notification.
	pub recipient_email: String,
	/// The revision that failed to land, e.g. `D12345`.
	pub revision_id: String,
	/// The error reported by the landing service, passed through verbatim.
	pub error_msg: String,
}

impl LandingFailureNotification {
	pub fn new(
		recipient_email: impl Into<String>,
		revision_id: impl Into<String>,
		error_msg: impl Into<String>,
	) -> Self {
		Self {
			recipient_email: recipient_email.into(),
			revision_id: revision_id.into(),
			error_msg: error_msg.into(),
		}
	}
}
