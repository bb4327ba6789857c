// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Lando notification worker binary.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use lando_server_config::{LandoConfig, LogFormat};
use lando_server_email::{LandingFailureNotification, NotificationSettings};
use lando_server_jobs::JobRunner;
use lando_server_smtp::{MailRelay, SmtpClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod version;

/// Lando worker - delivers landing failure notifications.
#[derive(Parser, Debug)]
#[command(
	name = "lando-worker",
	about = "Delivers Lando landing failure notifications",
	version
)]
struct Args {
	/// Config file to read instead of /etc/lando/worker.toml
	#[arg(long, global = true, env = "LANDO_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Send one landing failure notification and wait for the outcome
	Notify {
		/// Address of the user whose landing failed
		#[arg(long)]
		recipient: String,

		/// Revision that failed to land, e.g. D12345
		#[arg(long)]
		revision: String,

		/// Failure reason from the landing service
		#[arg(long)]
		error_msg: String,
	},
	/// Read JSON notification requests from stdin, one per line
	Consume,
	/// Check that the configured mail relay answers
	CheckRelay,
	/// Show version and build information
	Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	if let Command::Version = args.command {
		println!("{}", version::format_version_info());
		return Ok(());
	}

	// Load .env file if present
	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => lando_server_config::load_config_with_file(path)?,
		None => lando_server_config::load_config()?,
	};

	init_tracing(&config);

	tracing::info!(
		relay = %format!("{}:{}", config.mail.server, config.mail.port),
		suppress_send = config.mail.suppress_send,
		"starting lando-worker"
	);

	let client = Arc::new(SmtpClient::new(commands::smtp_config(&config.mail))?);

	if let Command::CheckRelay = args.command {
		client.check_health().await?;
		println!(
			"relay {}:{} is reachable",
			config.mail.server, config.mail.port
		);
		return Ok(());
	}

	let relay: Arc<dyn MailRelay> = client;
	let settings = Arc::new(NotificationSettings::from_config(
		&config.mail,
		&config.ui,
	));
	let runner = JobRunner::new(commands::retry_policy(&config.jobs));

	match args.command {
		Command::Notify {
			recipient,
			revision,
			error_msg,
		} => {
			let request = LandingFailureNotification::new(recipient, revision, error_msg);
			let run = commands::notify(&runner, relay, settings, request).await;
			if !run.status.is_success() {
				return Err(format!(
					"notification {} ended {:?} after {} attempt(s): {}",
					run.id,
					run.status,
					run.attempts,
					run.error_message.as_deref().unwrap_or("no error recorded")
				)
				.into());
			}
			println!("{}", serde_json::to_string(&run)?);
		}
		Command::Consume => {
			let stdin = tokio::io::BufReader::new(tokio::io::stdin());
			tokio::select! {
				summary = commands::consume(stdin, &runner, relay, settings) => {
					let summary = summary?;
					tracing::info!(
						enqueued = summary.enqueued,
						skipped = summary.skipped,
						succeeded = summary.succeeded,
						suppressed = summary.suppressed,
						failed = summary.failed,
						cancelled = summary.cancelled,
						"Queue drained"
					);
				}
				_ = tokio::signal::ctrl_c() => {
					tracing::warn!("Interrupted, revoking pending retries");
					let summary = commands::interrupt(&runner).await;
					tracing::warn!(
						succeeded = summary.succeeded,
						suppressed = summary.suppressed,
						failed = summary.failed,
						cancelled = summary.cancelled,
						"Worker stopped before queue drained"
					);
				}
			}
		}
		Command::CheckRelay | Command::Version => {}
	}

	Ok(())
}

fn init_tracing(config: &LandoConfig) {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| config.logging.level.clone().into());

	let (text, json) = match config.logging.format {
		LogFormat::Text => (Some(tracing_subscriber::fmt::layer()), None),
		LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
	};

	tracing_subscriber::registry()
		.with(filter)
		.with(text)
		.with(json)
		.init();
}
