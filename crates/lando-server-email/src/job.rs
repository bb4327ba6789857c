// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use lando_server_config::{MailConfig, UiConfig};
use lando_server_jobs::{Job, JobContext, JobError, JobOutput, JobRunner};
use lando_server_smtp::{is_valid_email, MailRelay, SmtpError};
use tracing::instrument;

use crate::message::make_failure_email;
use crate::policy::{Delivery, DeliveryPolicy, SuppressionReason};
use crate::request::LandingFailureNotification;

pub const JOB_ID: &str = "send-landing-failure-email";

/// Everything a notification needs from configuration, resolved once at
/// worker startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationSettings {
	pub policy: DeliveryPolicy,
	/// Site root without a trailing slash.
	pub lando_ui_url: String,
}

impl NotificationSettings {
	pub fn from_config(mail: &MailConfig, ui: &UiConfig) -> Self {
		for address in &mail.recipient_whitelist {
			if !is_valid_email(address) {
				tracing::warn!(
					address = %address,
					"Whitelist entry is not a valid email address and will never match"
				);
			}
		}

		Self {
			policy: DeliveryPolicy::new(mail.suppress_send, mail.recipient_whitelist.clone()),
			lando_ui_url: ui.url.clone(),
		}
	}
}

/// Tells a user that their landing request failed.
pub struct LandingFailureEmailJob {
	request: LandingFailureNotification,
	settings: Arc<NotificationSettings>,
	relay: Arc<dyn MailRelay>,
}

impl LandingFailureEmailJob {
	pub fn new(
		request: LandingFailureNotification,
		settings: Arc<NotificationSettings>,
		relay: Arc<dyn MailRelay>,
	) -> Self {
		Self {
			request,
			settings,
			relay,
		}
	}

	fn suppressed(&self, reason: SuppressionReason) -> JobOutput {
		let recipient = &self.request.recipient_email;
		match reason {
			SuppressionReason::AllMailDisabled => tracing::warn!(
				recipient = %recipient,
				"Email sending suppressed: configuration has disabled all mail sending"
			),
			SuppressionReason::NotWhitelisted => tracing::info!(
				recipient = %recipient,
				"Email sending suppressed: recipient not found in recipient whitelist"
			),
		}

		JobOutput::suppressed(reason.to_string()).with_metadata(serde_json::json!({
			"recipient": recipient,
			"revision_id": self.request.revision_id,
			"reason": reason.as_str(),
		}))
	}
}

#[async_trait]
impl Job for LandingFailureEmailJob {
	fn id(&self) -> &str {
		JOB_ID
	}

	fn name(&self) -> &str {
		"Landing Failure Email"
	}

	fn description(&self) -> &str {
		"Email a user that their landing request failed"
	}

	#[instrument(
		skip(self, ctx),
		fields(
			job_id = JOB_ID,
			run_id = %ctx.run_id,
			attempt = ctx.attempt,
			revision_id = %self.request.revision_id
		)
	)]
	async fn run(&self, ctx: &JobContext) -> Result<JobOutput, JobError> {
		if ctx.cancellation_token.is_cancelled() {
			return Err(JobError::Cancelled);
		}

		let recipient = &self.request.recipient_email;

		if let Delivery::Suppressed(reason) = self.settings.policy.evaluate(recipient) {
			return Ok(self.suppressed(reason));
		}

		let message = make_failure_email(
			recipient,
			&self.request.revision_id,
			&self.request.error_msg,
			&self.settings.lando_ui_url,
		);

		self.relay.send(&message).await.map_err(to_job_error)?;

		tracing::info!(recipient = %recipient, "Notification email sent");

		Ok(
			JobOutput::completed(format!("Notification email sent to {recipient}")).with_metadata(
				serde_json::json!({
					"recipient": recipient,
					"revision_id": self.request.revision_id,
				}),
			),
		)
	}
}

/// Transient relay trouble becomes a retryable failure; anything else ends the run.
pub fn to_job_error(err: SmtpError) -> JobError {
	JobError::Failed {
		retryable: err.is_transient(),
		message: err.to_string(),
	}
}

/// Queue a landing failure notification and return the run id.
#[instrument(
	skip(runner, relay, settings, request),
	fields(revision_id = %request.revision_id)
)]
pub async fn send_landing_failure_email(
	runner: &JobRunner,
	relay: Arc<dyn MailRelay>,
	settings: Arc<NotificationSettings>,
	request: LandingFailureNotification,
) -> String {
	let job = LandingFailureEmailJob::new(request, settings, relay);
	runner.enqueue(Arc::new(job)).await
}
