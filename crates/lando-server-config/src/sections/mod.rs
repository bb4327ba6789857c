// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for the notification worker.

pub mod jobs;
pub mod logging;
pub mod mail;
pub mod ui;

pub use jobs::{JobsConfig, JobsConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use mail::{MailConfig, MailConfigLayer, TlsMode};
pub use ui::{UiConfig, UiConfigLayer};
