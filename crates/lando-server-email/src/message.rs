// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Failure email rendering. Subject and body wording are parsed by other
//! tooling; keep them stable.

use lando_server_smtp::EmailMessage;

pub const FAILURE_EMAIL_SENDER: &str = "mozphab-prod@mozilla.com";

/// Build the notification for a failed landing.
///
/// `lando_ui_url` is the site root without a trailing slash, e.g.
/// `https://lando.test`. All inputs are inserted literally.
pub fn make_failure_email(
	recipient_email: &str,
	revision_id: &str,
	error_msg: &str,
	lando_ui_url: &str,
) -> EmailMessage {
	let lando_revision_url = revision_url(lando_ui_url, revision_id);

	EmailMessage {
		from: FAILURE_EMAIL_SENDER.to_string(),
		to: recipient_email.to_string(),
		subject: format!("Lando: Landing of {revision_id} failed!"),
		body: format!(
			"Your request to land {revision_id} failed.\n\n\
			 See {lando_revision_url} for details.\n\n\
			 Reason:\n\
			 {error_msg}"
		),
	}
}

pub fn revision_url(lando_ui_url: &str, revision_id: &str) -> String {
	format!("{lando_ui_url}/{revision_id}/")
}
