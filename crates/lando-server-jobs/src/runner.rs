// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::context::{CancellationToken, JobContext};
use crate::error::{JobError, Result};
use crate::job::Job;
use crate::retry::{RetryDecision, RetryPolicy};
use crate::types::{JobRun, JobStatus, TriggerSource};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

struct RunSlot {
	token: CancellationToken,
	handle: JoinHandle<JobRun>,
}

/// Dispatches jobs and re-dispatches them per the [`RetryPolicy`].
///
/// A run counts as acknowledged only once it reaches a terminal status, so a
/// worker that dies mid-run leaves the notification to be delivered again.
pub struct JobRunner {
	policy: RetryPolicy,
	runs: Mutex<HashMap<String, RunSlot>>,
}

impl JobRunner {
	pub fn new(policy: RetryPolicy) -> Self {
		Self {
			policy,
			runs: Mutex::new(HashMap::new()),
		}
	}

	/// Drive `job` to a terminal status on the current task.
	#[instrument(skip(self, job), fields(job_id = %job.id(), job_name = job.name()))]
	pub async fn run(&self, job: Arc<dyn Job>, triggered_by: TriggerSource) -> JobRun {
		let run_id = uuid::Uuid::new_v4().to_string();
		run_job_with_retry(
			&job,
			self.policy,
			run_id,
			triggered_by,
			&CancellationToken::new(),
		)
		.await
	}

	/// Start `job` in the background and return its run id right away.
	#[instrument(skip(self, job), fields(job_id = %job.id(), job_name = job.name()))]
	pub async fn enqueue(&self, job: Arc<dyn Job>) -> String {
		let run_id = uuid::Uuid::new_v4().to_string();
		let token = CancellationToken::new();
		let policy = self.policy;

		let handle = {
			let run_id = run_id.clone();
			let token = token.clone();
			tokio::spawn(async move {
				run_job_with_retry(&job, policy, run_id, TriggerSource::Queue, &token).await
			})
		};

		let mut runs = self.runs.lock().await;
		runs.insert(run_id.clone(), RunSlot { token, handle });

		info!(run_id = %run_id, in_flight = runs.len(), "Job enqueued");
		run_id
	}

	/// Wait for an enqueued run and take its record.
	#[instrument(skip(self))]
	pub async fn wait(&self, run_id: &str) -> Result<JobRun> {
		let slot = self
			.runs
			.lock()
			.await
			.remove(run_id)
			.ok_or_else(|| JobError::NotFound(run_id.to_string()))?;

		join_run(run_id, slot.handle).await
	}

	/// Revoke a run. A pending retry is abandoned; an attempt already talking
	/// to the relay finishes first.
	#[instrument(skip(self))]
	pub async fn revoke(&self, run_id: &str) -> Result<()> {
		let runs = self.runs.lock().await;
		let slot = runs
			.get(run_id)
			.ok_or_else(|| JobError::NotFound(run_id.to_string()))?;

		slot.token.cancel();
		info!(run_id = %run_id, "Job revoked");
		Ok(())
	}

	/// Revoke every run still in flight.
	#[instrument(skip(self))]
	pub async fn revoke_all(&self) {
		let runs = self.runs.lock().await;
		for slot in runs.values() {
			slot.token.cancel();
		}
		info!(count = runs.len(), "Revoked all in-flight jobs");
	}

	/// Wait for every in-flight run and return their records.
	#[instrument(skip(self))]
	pub async fn shutdown(&self) -> Vec<JobRun> {
		let slots: Vec<(String, RunSlot)> = self.runs.lock().await.drain().collect();

		let mut finished = Vec::with_capacity(slots.len());
		for (run_id, slot) in slots {
			if let Ok(run) = join_run(&run_id, slot.handle).await {
				finished.push(run);
			}
		}

		info!(runs = finished.len(), "Job runner shut down");
		finished
	}

	/// Take the records of runs that already reached a terminal status.
	///
	/// Long-lived producers call this periodically; enqueued runs are held
	/// until taken, waited on, or drained by [`JobRunner::shutdown`].
	pub async fn take_finished(&self) -> Vec<JobRun> {
		let mut runs = self.runs.lock().await;
		let done: Vec<String> = runs
			.iter()
			.filter(|(_, slot)| slot.handle.is_finished())
			.map(|(id, _)| id.clone())
			.collect();

		let mut finished = Vec::with_capacity(done.len());
		for run_id in done {
			if let Some(slot) = runs.remove(&run_id) {
				if let Ok(run) = join_run(&run_id, slot.handle).await {
					finished.push(run);
				}
			}
		}
		finished
	}

	pub async fn in_flight(&self) -> usize {
		self.runs.lock().await.len()
	}
}

async fn join_run(run_id: &str, handle: JoinHandle<JobRun>) -> Result<JobRun> {
	handle.await.map_err(|e| {
		error!(run_id = %run_id, error = %e, "Job task aborted");
		JobError::permanent(format!("job task aborted: {e}"))
	})
}

async fn run_job_with_retry(
	job: &Arc<dyn Job>,
	policy: RetryPolicy,
	run_id: String,
	triggered_by: TriggerSource,
	cancellation_token: &CancellationToken,
) -> JobRun {
	let mut run = JobRun::start(run_id, job.id(), triggered_by);
	debug!(
		job_id = %job.id(),
		job_name = job.name(),
		run_id = %run.id,
		description = job.description(),
		"Job run started"
	);
	let mut attempt = 1u32;

	loop {
		if cancellation_token.is_cancelled() {
			info!(job_id = %job.id(), run_id = %run.id, "Job cancelled before attempt");
			return run.finish(JobStatus::Cancelled, None);
		}

		let ctx = JobContext {
			run_id: run.id.clone(),
			triggered_by: if attempt > 1 {
				TriggerSource::Retry
			} else {
				triggered_by
			},
			attempt,
			cancellation_token: cancellation_token.clone(),
		};

		run.status = JobStatus::Running;
		run.attempts = ctx.attempt;

		let error = match job.run(&ctx).await {
			Ok(output) => {
				if output.suppressed {
					info!(job_id = %job.id(), run_id = %run.id, reason = %output.message, "Job suppressed");
				} else {
					info!(job_id = %job.id(), run_id = %run.id, attempts = run.attempts, message = %output.message, "Job completed successfully");
				}
				return run.complete(output);
			}
			Err(JobError::Cancelled) => {
				info!(job_id = %job.id(), run_id = %run.id, "Job cancelled");
				return run.finish(JobStatus::Cancelled, None);
			}
			Err(e) => e,
		};

		match policy.next(attempt, &error) {
			RetryDecision::Retry {
				attempt: next,
				delay,
			} => {
				warn!(
					job_id = %job.id(),
					run_id = %run.id,
					next_attempt = next,
					delay_secs = delay.as_secs(),
					error = %error,
					"Job failed, retrying"
				);
				run.status = JobStatus::RetryScheduled;
				run.error_message = Some(error.to_string());

				tokio::select! {
					_ = tokio::time::sleep(delay) => {}
					_ = cancellation_token.cancelled() => {
						info!(job_id = %job.id(), run_id = %run.id, "Job revoked while waiting to retry");
						return run.finish(JobStatus::Cancelled, None);
					}
				}

				attempt = next;
			}
			RetryDecision::GiveUp => {
				if error.is_retryable() {
					error!(
						job_id = %job.id(),
						run_id = %run.id,
						attempts = run.attempts,
						error = %error,
						"Job failed, retries exhausted"
					);
				} else {
					error!(
						job_id = %job.id(),
						run_id = %run.id,
						attempts = run.attempts,
						error = ?error,
						"Job failed with permanent error"
					);
				}
				return run.finish(JobStatus::Failed, Some(error.to_string()));
			}
		}
	}
}
