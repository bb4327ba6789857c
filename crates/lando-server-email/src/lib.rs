// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Landing failure notifications for Lando.
//!
//! A [`LandingFailureNotification`] is checked against the [`DeliveryPolicy`]
//! (global suppression, then the recipient whitelist), rendered with
//! [`make_failure_email`] and handed to a [`MailRelay`]. Delivery runs as a
//! [`LandingFailureEmailJob`] so transient relay failures are retried by the
//! [`JobRunner`](lando_server_jobs::JobRunner).
//!
//! [`MailRelay`]: lando_server_smtp::MailRelay

pub mod job;
pub mod message;
pub mod policy;
pub mod request;

pub use job::{
	send_landing_failure_email, to_job_error, LandingFailureEmailJob, NotificationSettings, JOB_ID,
};
pub use message::{make_failure_email, revision_url, FAILURE_EMAIL_SENDER};
pub use policy::{Delivery, DeliveryPolicy, SuppressionReason};
pub use request::LandingFailureNotification;
