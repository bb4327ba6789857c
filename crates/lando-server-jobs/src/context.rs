// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::types::TriggerSource;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

pub struct JobContext {
	pub run_id: String,
	pub triggered_by: TriggerSource,
	/// 1-based attempt number within this run.
	pub attempt: u32,
	pub cancellation_token: CancellationToken,
}

#[derive(Clone)]
pub struct CancellationToken {
	inner: Arc<TokenInner>,
}

struct TokenInner {
	cancelled: AtomicBool,
	notify: Notify,
}

impl CancellationToken {
	pub fn new() -> Self {
		Self {
			inner: Arc::new(TokenInner {
				cancelled: AtomicBool::new(false),
				notify: Notify::new(),
			}),
		}
	}

	pub fn cancel(&self) {
		self.inner.cancelled.store(true, Ordering::SeqCst);
		self.inner.notify.notify_waiters();
	}

	pub fn is_cancelled(&self) -> bool {
		self.inner.cancelled.load(Ordering::SeqCst)
	}

	/// Resolves once [`cancel`](Self::cancel) has been called.
	pub async fn cancelled(&self) {
		loop {
			let notified = self.inner.notify.notified();
			if self.is_cancelled() {
				return;
			}
			notified.await;
		}
	}
}

impl Default for CancellationToken {
	fn default() -> Self {
		Self::new()
	}
}
