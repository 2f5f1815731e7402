//! Outgoing mail: registration confirmations and password-reset links.
//!
//! Delivery is behind the [`Mailer`] trait. [`LogMailer`] is the default
//! implementation and only records that a message was dispatched.

use thiserror::Error;
use tracing::info;

/// Errors produced by a mail transport.
#[derive(Debug, Error)]
pub enum MailError {
    /// The transport refused or failed to deliver the message.
    #[error("mail delivery failed: {0}")]
    Delivery(String),
}

/// One outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub from: String,
    pub to: String,
    pub subject: String,
    /// HTML body. May contain secrets such as reset tokens; never log it.
    pub html: String,
}

/// A mail transport.
#[cfg_attr(test, mockall::automock)]
pub trait Mailer: Send + Sync {
    /// Dispatch `mail`.
    ///
    /// # Errors
    ///
    /// Returns [`MailError::Delivery`] if the transport rejects the message.
    fn send(&self, mail: &Mail) -> Result<(), MailError>;
}

/// Mailer that records recipient and subject through `tracing` and succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, mail: &Mail) -> Result<(), MailError> {
        info!(to = %mail.to, subject = %mail.subject, "mail dispatched");
        Ok(())
    }
}

/// Confirmation sent after a successful registration.
pub fn registration_mail(from: &str, to: &str, username: &str) -> Mail {
    Mail {
        from: from.to_owned(),
        to: to.to_owned(),
        subject: "Registration successful message".into(),
        html: format!(
            "<h3>Congratulations, your registration is successful. Your userId is {username}</h3>"
        ),
    }
}

/// Password-reset link pointing at `PATCH /api/users/resetPassword`.
pub fn reset_password_mail(from: &str, to: &str, base_url: &str, token: &str, user_id: &str) -> Mail {
    let base = base_url.trim_end_matches('/');
    Mail {
        from: from.to_owned(),
        to: to.to_owned(),
        subject: "Reset your password".into(),
        html: format!("{base}/api/users/resetPassword?token={token}&id={user_id}"),
    }
}
