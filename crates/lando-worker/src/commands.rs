// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;
use std::time::Duration;

use lando_server_config::{JobsConfig, MailConfig, TlsMode};
use lando_server_email::{
	send_landing_failure_email, LandingFailureEmailJob, LandingFailureNotification,
	NotificationSettings,
};
use lando_server_jobs::{JobRun, JobRunner, JobStatus, RetryPolicy, TriggerSource};
use lando_server_smtp::{MailRelay, SmtpConfig, SmtpTls};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

pub fn smtp_config(mail: &MailConfig) -> SmtpConfig {
	SmtpConfig {
		host: mail.server.clone(),
		port: mail.port,
		tls: match mail.tls_mode {
			TlsMode::None => SmtpTls::None,
			TlsMode::StartTls => SmtpTls::StartTls,
			TlsMode::Tls => SmtpTls::Tls,
		},
		timeout: Some(Duration::from_secs(mail.timeout_secs)),
	}
}

pub fn retry_policy(jobs: &JobsConfig) -> RetryPolicy {
	RetryPolicy::fixed(Duration::from_secs(jobs.retry_delay_secs), jobs.max_attempts)
}

/// Deliver one notification on the current task, retries included.
#[tracing::instrument(skip_all, fields(revision_id = %request.revision_id))]
pub async fn notify(
	runner: &JobRunner,
	relay: Arc<dyn MailRelay>,
	settings: Arc<NotificationSettings>,
	request: LandingFailureNotification,
) -> JobRun {
	let job = LandingFailureEmailJob::new(request, settings, relay);
	runner.run(Arc::new(job), TriggerSource::Manual).await
}

/// Outcome counts for a drained queue.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConsumeSummary {
	pub enqueued: usize,
	pub skipped: usize,
	pub succeeded: usize,
	pub suppressed: usize,
	pub failed: usize,
	pub cancelled: usize,
}

impl ConsumeSummary {
	fn record(&mut self, run: &JobRun) {
		match run.status {
			JobStatus::Succeeded => self.succeeded += 1,
			JobStatus::Suppressed => self.suppressed += 1,
			JobStatus::Cancelled => self.cancelled += 1,
			_ => self.failed += 1,
		}
	}
}

/// Enqueue one notification per JSON line until EOF, then drain the runner.
///
/// Lines that do not decode are logged and skipped; they would never succeed.
#[tracing::instrument(skip_all)]
pub async fn consume<R>(
	reader: R,
	runner: &JobRunner,
	relay: Arc<dyn MailRelay>,
	settings: Arc<NotificationSettings>,
) -> std::io::Result<ConsumeSummary>
where
	R: AsyncBufRead + Unpin,
{
	let mut summary = ConsumeSummary::default();
	let mut lines = reader.lines();
	let mut line_no = 0usize;

	while let Some(line) = lines.next_line().await? {
		line_no += 1;
		let line = line.trim();
		if line.is_empty() {
			continue;
		}

		match serde_json::from_str::<LandingFailureNotification>(line) {
			Ok(request) => {
				send_landing_failure_email(runner, relay.clone(), settings.clone(), request).await;
				summary.enqueued += 1;
				for run in runner.take_finished().await {
					summary.record(&run);
				}
			}
			Err(e) => {
				tracing::warn!(line = line_no, error = %e, "Skipping undecodable notification request");
				summary.skipped += 1;
			}
		}
	}

	tracing::info!(enqueued = summary.enqueued, "Input exhausted, draining in-flight runs");
	for run in runner.shutdown().await {
		summary.record(&run);
	}

	Ok(summary)
}

/// Revoke pending retries and collect every run still held by the runner.
///
/// Attempts already talking to the relay finish first; runs waiting to retry
/// end `Cancelled` and are left to the queue to deliver again.
#[tracing::instrument(skip_all)]
pub async fn interrupt(runner: &JobRunner) -> ConsumeSummary {
	runner.revoke_all().await;

	let mut summary = ConsumeSummary::default();
	for run in runner.shutdown().await {
		summary.record(&run);
	}
	summary
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use lando_server_email::DeliveryPolicy;
	use lando_server_smtp::{EmailMessage, SmtpError};
	use std::sync::Mutex;

	#[derive(Default)]
	struct RecordingRelay {
		sent: Mutex<Vec<EmailMessage>>,
	}

	#[async_trait]
	impl MailRelay for RecordingRelay {
		async fn send(&self, message: &EmailMessage) -> Result<(), SmtpError> {
			self.sent.lock().unwrap().push(message.clone());
			if message.to.ends_with("@bounce.test") {
				return Err(SmtpError::Rejected("550 no such user".into()));
			}
			if message.to.ends_with("@down.test") {
				return Err(SmtpError::Connection("Connection refused".into()));
			}
			Ok(())
		}
	}

	fn settings(whitelist: &[&str]) -> Arc<NotificationSettings> {
		Arc::new(NotificationSettings {
			policy: DeliveryPolicy::new(false, whitelist.iter().map(|s| s.to_string())),
			lando_ui_url: "https://lando.test".to_string(),
		})
	}

	#[test]
	fn test_smtp_config_from_mail_config() {
		let mail = MailConfig {
			server: "relay.internal".to_string(),
			port: 587,
			tls_mode: TlsMode::StartTls,
			timeout_secs: 30,
			..Default::default()
		};

		let smtp = smtp_config(&mail);
		assert_eq!(smtp.host, "relay.internal");
		assert_eq!(smtp.port, 587);
		assert_eq!(smtp.tls, SmtpTls::StartTls);
		assert_eq!(smtp.timeout, Some(Duration::from_secs(30)));
	}

	#[test]
	fn test_retry_policy_from_jobs_config() {
		let policy = retry_policy(&JobsConfig::default());
		assert_eq!(policy, RetryPolicy::default());
		assert_eq!(policy.delay, Duration::from_secs(60));
		assert_eq!(policy.max_attempts, 4320);
	}

	#[tokio::test]
	async fn test_notify_reports_terminal_run() {
		let relay = Arc::new(RecordingRelay::default());
		let runner = JobRunner::new(RetryPolicy::default());

		let run = notify(
			&runner,
			relay.clone(),
			settings(&[]),
			LandingFailureNotification::new("dev@example.com", "D7", "tree closed"),
		)
		.await;

		assert_eq!(run.status, JobStatus::Succeeded);
		assert_eq!(run.triggered_by, TriggerSource::Manual);
		assert!(run.error_message.is_none());
		assert_eq!(relay.sent.lock().unwrap().len(), 1);

		let printed: serde_json::Value = serde_json::to_value(&run).unwrap();
		assert_eq!(printed["status"], "succeeded");
		assert_eq!(printed["output"]["metadata"]["revision_id"], "D7");
	}

	#[tokio::test(start_paused = true)]
	async fn test_interrupt_cancels_runs_waiting_to_retry() {
		let relay = Arc::new(RecordingRelay::default());
		let runner = JobRunner::new(RetryPolicy::default());
		let settings = settings(&[]);

		for revision in ["D1", "D2"] {
			send_landing_failure_email(
				&runner,
				relay.clone(),
				settings.clone(),
				LandingFailureNotification::new("dev@down.test", revision, "boom"),
			)
			.await;
		}
		while relay.sent.lock().unwrap().len() < 2 {
			tokio::task::yield_now().await;
		}

		let summary = interrupt(&runner).await;

		assert_eq!(summary.cancelled, 2);
		assert_eq!(summary.failed, 0);
		assert_eq!(relay.sent.lock().unwrap().len(), 2);
		assert_eq!(runner.in_flight().await, 0);
	}

	#[tokio::test(start_paused = true)]
	async fn test_consume_drains_every_line() {
		let input = concat!(
			r#"{"recipient_email":"dev@example.com","revision_id":"D1","error_msg":"a"}"#,
			"\n",
			"not json\n",
			"\n",
			r#"{"recipient_email":"qa@bounce.test","revision_id":"D2","error_msg":"b"}"#,
			"\n",
			r#"{"recipient_email":"other@example.com","revision_id":"D3","error_msg":"c"}"#,
			"\n",
		);
		let relay = Arc::new(RecordingRelay::default());
		let runner = JobRunner::new(RetryPolicy::default());

		let summary = consume(
			input.as_bytes(),
			&runner,
			relay.clone(),
			settings(&["dev@example.com", "qa@bounce.test"]),
		)
		.await
		.unwrap();

		assert_eq!(
			summary,
			ConsumeSummary {
				enqueued: 3,
				skipped: 1,
				succeeded: 1,
				suppressed: 1,
				failed: 1,
				cancelled: 0,
			}
		);
		assert_eq!(relay.sent.lock().unwrap().len(), 2);
		assert_eq!(runner.in_flight().await, 0);
	}
}
