//! Identity headers.
//!
//! The identity provider's gateway authenticates the caller and forwards the result as
//! trusted headers. A request without `x-owner-id` is anonymous.

use pdfshare_core::{AuthState, Identity};
use pdfshare_types::{EmailAddress, OwnerId, TextError};

pub const OWNER_ID_HEADER: &str = "x-owner-id";
pub const OWNER_EMAIL_HEADER: &str = "x-owner-email";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthHeaderError {
    #[error("invalid x-owner-id header: {0}")]
    InvalidOwnerId(TextError),
    #[error("invalid x-owner-email header: {0}")]
    InvalidEmail(TextError),
}

/// Derives the caller's [`AuthState`] from identity headers read through `header`.
///
/// Returns `AuthState::Anonymous` when the owner id header is absent or blank, and
/// `AuthState::Authenticated` otherwise. A blank email header is treated as absent.
///
/// # Errors
///
/// Returns [`AuthHeaderError`] if a present header does not validate.
pub fn auth_state_from_headers<'a>(
    header: impl Fn(&str) -> Option<&'a str>,
) -> Result<AuthState, AuthHeaderError> {
    let Some(raw_owner) = header(OWNER_ID_HEADER).filter(|v| !v.trim().is_empty()) else {
        return Ok(AuthState::Anonymous);
    };

    let owner_id = OwnerId::parse(raw_owner).map_err(AuthHeaderError::InvalidOwnerId)?;
    let email = header(OWNER_EMAIL_HEADER)
        .filter(|v| !v.trim().is_empty())
        .map(EmailAddress::parse)
        .transpose()
        .map_err(AuthHeaderError::InvalidEmail)?;

    Ok(AuthState::Authenticated(Identity::new(owner_id, email)))
}
