//! # pdfshare Notify
//!
//! The share-invite email boundary.
//!
//! Callers hand a [`ShareInvite`] (`{email, pdfName, shareLink}`) to a
//! [`NotificationDispatcher`] and get a [`DispatchOutcome`] (`{success}` or
//! `{success: false, error}`) back. Delivery failures are reported in the outcome rather than
//! as errors, so a failed email never aborts the caller's session.

mod mailer;

pub use mailer::{render_invite_html, SmtpConfig, SmtpDispatcher, INVITE_SUBJECT};

use serde::{Deserialize, Serialize};

/// Errors raised while configuring or talking to the mail transport.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("invalid mailbox: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("smtp transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
    #[error("invalid smtp configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to render message body: {0}")]
    Template(#[from] handlebars::RenderError),
}

pub type NotifyResult<T> = std::result::Result<T, NotifyError>;

/// Input to the share-invite callable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareInvite {
    /// Recipient address
    pub email: String,
    /// Name of the shared PDF, shown in the message body
    pub pdf_name: String,
    /// Link the recipient follows to view the PDF
    pub share_link: String,
}

/// Result of the share-invite callable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DispatchOutcome {
    pub fn sent() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Sends share invitations.
///
/// Implementations must not panic or return early on delivery failure; every failure is
/// folded into a `DispatchOutcome` with `success == false`.
pub trait NotificationDispatcher: Send + Sync {
    fn send_share_invite(&self, invite: &ShareInvite) -> DispatchOutcome;
}

/// Dispatcher used when no mail transport is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredDispatcher;

impl NotificationDispatcher for UnconfiguredDispatcher {
    fn send_share_invite(&self, invite: &ShareInvite) -> DispatchOutcome {
        tracing::warn!(pdf = %invite.pdf_name, "share invite requested but email delivery is not configured");
        DispatchOutcome::failed("email delivery is not configured")
    }
}
