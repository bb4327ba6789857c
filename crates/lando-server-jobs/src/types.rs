// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
	/// Handed over by a producer through the queue.
	Queue,
	/// Run directly by an operator.
	Manual,
	/// Re-dispatched after a retryable failure.
	Retry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
	Pending,
	Running,
	RetryScheduled,
	Succeeded,
	Suppressed,
	Failed,
	Cancelled,
}

impl JobStatus {
	pub fn is_terminal(self) -> bool {
		matches!(
			self,
			JobStatus::Succeeded | JobStatus::Suppressed | JobStatus::Failed | JobStatus::Cancelled
		)
	}

	/// What the queue is told: anything that did not fail or get revoked.
	pub fn is_success(self) -> bool {
		matches!(self, JobStatus::Succeeded | JobStatus::Suppressed)
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOutput {
	pub message: String,
	/// The job chose not to act (policy), which is still a success.
	#[serde(default)]
	pub suppressed: bool,
	pub metadata: Option<serde_json::Value>,
}

impl JobOutput {
	pub fn completed(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			suppressed: false,
			metadata: None,
		}
	}

	pub fn suppressed(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			suppressed: true,
			metadata: None,
		}
	}

	pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
		self.metadata = Some(metadata);
		self
	}
}

/// Record of one run, kept in memory only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRun {
	pub id: String,
	pub job_id: String,
	pub status: JobStatus,
	pub started_at: DateTime<Utc>,
	pub completed_at: Option<DateTime<Utc>>,
	pub duration_ms: Option<i64>,
	/// Last failure. Cleared when a later attempt succeeds.
	pub error_message: Option<String>,
	/// What the job reported on success or suppression.
	pub output: Option<JobOutput>,
	/// Attempts made so far, including the first.
	pub attempts: u32,
	pub triggered_by: TriggerSource,
}

impl JobRun {
	pub(crate) fn start(id: String, job_id: &str, triggered_by: TriggerSource) -> Self {
		Self {
			id,
			job_id: job_id.to_string(),
			status: JobStatus::Pending,
			started_at: Utc::now(),
			completed_at: None,
			duration_ms: None,
			error_message: None,
			output: None,
			attempts: 0,
			triggered_by,
		}
	}

	pub(crate) fn finish(mut self, status: JobStatus, error_message: Option<String>) -> Self {
		let now = Utc::now();
		self.status = status;
		self.completed_at = Some(now);
		self.duration_ms = Some((now - self.started_at).num_milliseconds());
		if status.is_success() {
			self.error_message = None;
		} else if error_message.is_some() {
			self.error_message = error_message;
		}
		self
	}

	pub(crate) fn complete(mut self, output: JobOutput) -> Self {
		let status = if output.suppressed {
			JobStatus::Suppressed
		} else {
			JobStatus::Succeeded
		};
		self.output = Some(output);
		self.finish(status, None)
	}
}
