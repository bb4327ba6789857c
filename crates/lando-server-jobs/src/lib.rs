// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Background job runner for the Lando notification worker.
//!
//! Jobs implement [`Job`] and report failures as [`JobError::Failed`] with a
//! `retryable` tag. The [`JobRunner`] re-dispatches retryable failures after a
//! fixed delay until the [`RetryPolicy`] budget is spent. Run records live in
//! memory only; nothing is persisted.

pub mod context;
pub mod error;
pub mod job;
pub mod retry;
pub mod runner;
pub mod types;

pub use context::{CancellationToken, JobContext};
pub use error::{JobError, Result};
pub use job::Job;
pub use retry::{RetryDecision, RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY};
pub use runner::JobRunner;
pub use types::{JobOutput, JobRun, JobStatus, TriggerSource};
