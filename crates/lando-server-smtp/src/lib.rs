// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Mail relay transport for Lando notifications.
//!
//! This crate hands plain-text messages to an outbound SMTP relay and sorts
//! every failure into transient (worth retrying later) or permanent.
//!
//! # Features
//!
//! - Async sending using [`lettre`]
//! - Plain, STARTTLS or implicit TLS relay connections
//! - One relay connection per send: opened, used, QUIT and closed within the
//!   call, and closed on drop if the send future is cancelled
//! - [`MailRelay`] trait so callers can be exercised without a relay
//!
//! # Example
//!
//! ```no_run
//! use lando_server_smtp::{EmailMessage, MailRelay, SmtpClient, SmtpConfig, SmtpTls};
//!
//! # async fn example() -> Result<(), lando_server_smtp::SmtpError> {
//! let client = SmtpClient::new(SmtpConfig {
//!     host: "localhost".to_string(),
//!     port: 25,
//!     tls: SmtpTls::None,
//!     timeout: None,
//! })?;
//!
//! client
//!     .send(&EmailMessage {
//!         from: "mozphab-prod@mozilla.com".to_string(),
//!         to: "dev@example.com".to_string(),
//!         subject: "Hello".to_string(),
//!         body: "Hello World".to_string(),
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use lettre::{
	message::{header::ContentType, Mailbox},
	AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Errors that can occur during SMTP operations.
///
/// [`SmtpError::is_transient`] separates failures worth retrying from the rest.
#[derive(Debug, thiserror::Error)]
pub enum SmtpError {
	/// The relay could not be reached or the connection broke mid-session.
	#[error("connection failed: {0}")]
	Connection(String),

	/// The relay answered with a 4xx reply.
	#[error("relay deferred message: {0}")]
	Deferred(String),

	/// The relay answered with a 5xx reply.
	#[error("relay rejected message: {0}")]
	Rejected(String),

	/// Failed to build or hand over the message.
	#[error("send failed: {0}")]
	Send(String),

	/// Invalid configuration (bad host, TLS parameters).
	#[error("invalid configuration: {0}")]
	Config(String),

	/// Invalid email address format.
	#[error("invalid email address: {0}")]
	Address(String),
}

impl SmtpError {
	/// Whether the same message could go through on a later attempt.
	pub fn is_transient(&self) -> bool {
		matches!(self, SmtpError::Connection(_) | SmtpError::Deferred(_))
	}
}

/// How to secure the relay connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpTls {
	#[default]
	None,
	StartTls,
	Tls,
}

/// Configuration for the SMTP client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
	/// Relay hostname (e.g., "localhost").
	pub host: String,

	/// Relay port. Common values: 25 (plain), 465 (TLS), 587 (STARTTLS).
	pub port: u16,

	#[serde(default)]
	pub tls: SmtpTls,

	/// Connect and command timeout. `None` keeps lettre's default.
	#[serde(default)]
	pub timeout: Option<Duration>,
}

/// A plain-text message ready for the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
	pub from: String,
	pub to: String,
	pub subject: String,
	pub body: String,
}

impl EmailMessage {
	/// Convert into a [`lettre`] message.
	///
	/// # Errors
	///
	/// Returns [`SmtpError::Address`] if either address does not parse.
	/// Returns [`SmtpError::Send`] if the message cannot be assembled.
	pub fn to_message(&self) -> Result<Message, SmtpError> {
		let from: Mailbox = self
			.from
			.parse()
			.map_err(|e| SmtpError::Address(format!("{}: {e}", self.from)))?;
		let to: Mailbox = self
			.to
			.parse()
			.map_err(|e| SmtpError::Address(format!("{}: {e}", self.to)))?;

		Message::builder()
			.from(from)
			.to(to)
			.subject(self.subject.clone())
			.header(ContentType::TEXT_PLAIN)
			.body(self.body.clone())
			.map_err(|e| SmtpError::Send(format!("failed to build message: {e}")))
	}
}

/// Something that can deliver an [`EmailMessage`].
#[async_trait]
pub trait MailRelay: Send + Sync {
	async fn send(&self, message: &EmailMessage) -> Result<(), SmtpError>;
}

/// Async SMTP client for a single relay.
///
/// The transport is built without connection pooling, so each call to
/// [`MailRelay::send`] owns exactly one relay connection for its duration.
pub struct SmtpClient {
	transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpClient {
	/// Create a new SMTP client from the given configuration.
	///
	/// The actual connection is made lazily when sending.
	///
	/// # Errors
	///
	/// Returns [`SmtpError::Config`] if the TLS parameters cannot be built for the host.
	#[tracing::instrument(
		name = "smtp_client_new",
		skip(config),
		fields(host = %config.host, port = %config.port, tls = ?config.tls)
	)]
	pub fn new(config: SmtpConfig) -> Result<Self, SmtpError> {
		let builder = match config.tls {
			SmtpTls::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
			SmtpTls::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
				.map_err(|e| SmtpError::Config(format!("{e}")))?,
			SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
				.map_err(|e| SmtpError::Config(format!("{e}")))?,
		};

		let transport = builder.port(config.port).timeout(config.timeout).build();

		tracing::debug!("SMTP client initialized");

		Ok(Self { transport })
	}

	/// Check if the relay is reachable and responding.
	///
	/// # Errors
	///
	/// Returns a transient error if the relay is unreachable.
	#[tracing::instrument(name = "smtp_check_health", skip(self))]
	pub async fn check_health(&self) -> Result<(), SmtpError> {
		tracing::debug!("checking SMTP relay health");
		let ok = self
			.transport
			.test_connection()
			.await
			.map_err(classify_send_error)?;
		if !ok {
			return Err(SmtpError::Connection(
				"relay did not answer NOOP".to_string(),
			));
		}
		tracing::debug!("SMTP relay is healthy");
		Ok(())
	}

	/// Send one message over a fresh relay connection.
	#[tracing::instrument(
		name = "smtp_send_message",
		skip(self, message),
		fields(to = %message.to, subject = %message.subject)
	)]
	pub async fn send_message(&self, message: &EmailMessage) -> Result<(), SmtpError> {
		tracing::debug!("building email message");
		let message = message.to_message()?;

		tracing::debug!("sending email");
		self
			.transport
			.send(message)
			.await
			.map_err(classify_send_error)?;

		tracing::debug!("email accepted by relay");
		Ok(())
	}
}

#[async_trait]
impl MailRelay for SmtpClient {
	async fn send(&self, message: &EmailMessage) -> Result<(), SmtpError> {
		self.send_message(message).await
	}
}

/// Sort a transport error into the crate taxonomy.
///
/// Only replies the relay marked permanent (5xx) and client-side misuse are
/// final. Everything else (refused or dropped connections, timeouts, TLS
/// handshake trouble, 4xx replies, garbled responses) may clear up on its own.
fn classify_send_error(err: lettre::transport::smtp::Error) -> SmtpError {
	if err.is_permanent() {
		SmtpError::Rejected(err.to_string())
	} else if err.is_client() {
		SmtpError::Send(err.to_string())
	} else if err.is_transient() {
		SmtpError::Deferred(err.to_string())
	} else {
		SmtpError::Connection(err.to_string())
	}
}

/// Validate an email address format.
///
/// Uses [`lettre`]'s [`Mailbox`] parser. This validates the format, not
/// whether the address actually exists.
///
/// # Example
///
/// ```
/// use lando_server_smtp::is_valid_email;
///
/// assert!(is_valid_email("user@example.com"));
/// assert!(!is_valid_email("not-an-email"));
/// ```
pub fn is_valid_email(email: &str) -> bool {
	email.parse::<Mailbox>().is_ok()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample_message() -> EmailMessage {
		EmailMessage {
			from: "mozphab-prod@mozilla.com".to_string(),
			to: "dev@example.com".to_string(),
			subject: "Lando: Landing of D12345 failed!".to_string(),
			body: "Reason:\nmerge conflict".to_string(),
		}
	}

	/// A port on localhost that nothing listens on.
	fn closed_port() -> u16 {
		let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
		let port = listener.local_addr().unwrap().port();
		drop(listener);
		port
	}

	fn client_for_port(port: u16) -> SmtpClient {
		SmtpClient::new(SmtpConfig {
			host: "127.0.0.1".to_string(),
			port,
			tls: SmtpTls::None,
			timeout: Some(Duration::from_secs(5)),
		})
		.unwrap()
	}

	mod errors {
		use super::*;

		#[test]
		fn connection_and_deferred_are_transient() {
			assert!(SmtpError::Connection("refused".into()).is_transient());
			assert!(SmtpError::Deferred("421 try later".into()).is_transient());
		}

		#[test]
		fn everything_else_is_permanent() {
			assert!(!SmtpError::Rejected("550 no such user".into()).is_transient());
			assert!(!SmtpError::Send("bad".into()).is_transient());
			assert!(!SmtpError::Config("bad tls".into()).is_transient());
			assert!(!SmtpError::Address("nope".into()).is_transient());
		}
	}

	mod message {
		use super::*;

		#[test]
		fn builds_plain_text_message() {
			let message = sample_message().to_message().unwrap();
			let raw = String::from_utf8(message.formatted()).unwrap();
			assert!(raw.contains("Subject: Lando: Landing of D12345 failed!"));
			assert!(raw.contains("From: mozphab-prod@mozilla.com"));
			assert!(raw.contains("To: dev@example.com"));
			assert!(raw.contains("Content-Type: text/plain; charset=utf-8"));
			assert!(raw.contains("merge conflict"));
		}

		#[test]
		fn invalid_recipient_is_address_error() {
			let mut message = sample_message();
			message.to = "not-an-email".to_string();
			let err = message.to_message().unwrap_err();
			assert!(matches!(err, SmtpError::Address(_)));
			assert!(!err.is_transient());
		}

		#[test]
		fn invalid_sender_is_address_error() {
			let mut message = sample_message();
			message.from = "@".to_string();
			assert!(matches!(
				message.to_message(),
				Err(SmtpError::Address(_))
			));
		}
	}

	mod transport {
		use super::*;

		#[tokio::test]
		async fn refused_connection_is_transient() {
			let client = client_for_port(closed_port());
			let err = client.send(&sample_message()).await.unwrap_err();
			assert!(matches!(err, SmtpError::Connection(_)), "got {err:?}");
			assert!(err.is_transient());
		}

		#[tokio::test]
		async fn invalid_address_fails_before_connecting() {
			let client = client_for_port(closed_port());
			let mut message = sample_message();
			message.to = "nobody".to_string();
			let err = client.send(&message).await.unwrap_err();
			assert!(matches!(err, SmtpError::Address(_)));
		}

		#[tokio::test]
		async fn health_check_fails_for_closed_port() {
			let client = client_for_port(closed_port());
			tokio_test::assert_err!(client.check_health().await);
		}
	}

	mod email_validation {
		use super::*;

		#[test]
		fn valid_simple_email() {
			assert!(is_valid_email("user@example.com"));
		}

		#[test]
		fn valid_email_with_plus() {
			assert!(is_valid_email("user+tag@example.com"));
		}

		#[test]
		fn invalid_empty_string() {
			assert!(!is_valid_email(""));
		}

		#[test]
		fn invalid_no_domain() {
			assert!(!is_valid_email("user@"));
		}

		#[test]
		fn invalid_multiple_at_symbols() {
			assert!(!is_valid_email("user@@example.com"));
		}
	}

	mod property_tests {
		use super::*;
		use proptest::prelude::*;

		proptest! {
			#[test]
			fn valid_emails_are_accepted(
				local in "[a-zA-Z][a-zA-Z0-9]{0,30}",
				domain in "[a-zA-Z][a-zA-Z0-9]{0,20}",
				tld in "(com|org|net|io|dev)"
			) {
				let email = format!("{local}@{domain}.{tld}");
				prop_assert!(is_valid_email(&email), "Expected valid: {}", email);
			}

			#[test]
			fn no_at_symbol_is_invalid(s in "[a-zA-Z0-9._%+-]{1,50}") {
				prop_assume!(!s.contains('@'));
				prop_assert!(!is_valid_email(&s));
			}

			#[test]
			fn body_survives_message_build(reason in "[a-zA-Z0-9 {}<>&%$#]{1,80}") {
				let mut message = sample_message();
				message.body = reason;
				prop_assert!(message.to_message().is_ok());
			}
		}
	}
}
