// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#[derive(Debug, Clone, thiserror::Error)]
pub enum JobError {
	#[error("Job failed: {message}")]
	Failed { message: String, retryable: bool },

	#[error("Job cancelled")]
	Cancelled,

	#[error("Job run not found: {0}")]
	NotFound(String),
}

impl JobError {
	pub fn retryable(message: impl Into<String>) -> Self {
		JobError::Failed {
			message: message.into(),
			retryable: true,
		}
	}

	pub fn permanent(message: impl Into<String>) -> Self {
		JobError::Failed {
			message: message.into(),
			retryable: false,
		}
	}

	pub fn is_retryable(&self) -> bool {
		matches!(self, JobError::Failed { retryable: true, .. })
	}
}

pub type Result<T> = std::result::Result<T, JobError>;
