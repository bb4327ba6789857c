// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Fixed-delay retry policy.

use crate::error::JobError;
use std::time::Duration;

pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(60);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60 * 24 * 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Wait between a failed attempt and the next one. Does not grow.
	pub delay: Duration,
	/// Attempts allowed per run, the first included. The first attempt is
	/// always made, even when this is 0.
	pub max_attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
	/// Run attempt number `attempt` after `delay`.
	Retry { attempt: u32, delay: Duration },
	GiveUp,
}

impl RetryPolicy {
	pub fn fixed(delay: Duration, max_attempts: u32) -> Self {
		Self { delay, max_attempts }
	}

	/// Decide what follows failed attempt number `attempt` (1-based).
	pub fn next(&self, attempt: u32, error: &JobError) -> RetryDecision {
		if error.is_retryable() && attempt < self.max_attempts {
			RetryDecision::Retry {
				attempt: attempt + 1,
				delay: self.delay,
			}
		} else {
			RetryDecision::GiveUp
		}
	}
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self::fixed(DEFAULT_RETRY_DELAY, DEFAULT_MAX_ATTEMPTS)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_is_three_days_of_minutes() {
		let policy = RetryPolicy::default();
		assert_eq!(policy.delay, Duration::from_secs(60));
		assert_eq!(policy.max_attempts, 4320);
	}

	#[test]
	fn test_retryable_error_is_retried_with_fixed_delay() {
		let policy = RetryPolicy::default();
		let error = JobError::retryable("connection refused");
		for attempt in [1, 2, 100, 4319] {
			assert_eq!(
				policy.next(attempt, &error),
				RetryDecision::Retry {
					attempt: attempt + 1,
					delay: Duration::from_secs(60),
				}
			);
		}
	}

	#[test]
	fn test_final_attempt_gives_up() {
		let policy = RetryPolicy::default();
		let error = JobError::retryable("connection refused");
		assert_eq!(policy.next(4320, &error), RetryDecision::GiveUp);
	}

	#[test]
	fn test_permanent_error_never_retried() {
		let policy = RetryPolicy::default();
		let error = JobError::permanent("550 mailbox unavailable");
		assert_eq!(policy.next(1, &error), RetryDecision::GiveUp);
	}

	#[test]
	fn test_cancelled_never_retried() {
		let policy = RetryPolicy::default();
		assert_eq!(policy.next(1, &JobError::Cancelled), RetryDecision::GiveUp);
	}

	#[test]
	fn test_single_attempt_budget() {
		for max_attempts in [0, 1] {
			let policy = RetryPolicy::fixed(Duration::from_secs(1), max_attempts);
			assert_eq!(
				policy.next(1, &JobError::retryable("timeout")),
				RetryDecision::GiveUp
			);
		}
	}
}
