//! Input validation utilities.
//!
//! Functions here turn raw caller input into values the stores can rely on, failing with
//! `ShareError::InvalidInput` before anything is written.

use crate::constants::{FALLBACK_STORED_NAME, MAX_STORED_BASE_LEN, PDF_EXTENSION};
use crate::{ShareError, ShareResult};
use pdfshare_types::{EmailAddress, NonEmptyText, OwnerId, TextError};

/// Derives the blob name for an upload.
///
/// A trailing `.pdf` (any case) is stripped from `file_name`, every character outside
/// `[A-Za-z0-9._-]` becomes `_`, the base is bounded in length, and `_<suffix>` is appended.
///
/// ```
/// use pdfshare_core::validation::stored_name;
/// assert_eq!(stored_name("report.pdf", 1700000000000), "report_1700000000000");
/// assert_eq!(stored_name("Q3 Report.PDF", 7), "Q3_Report_7");
/// ```
pub fn stored_name(file_name: &str, suffix: i64) -> String {
    let base = strip_pdf_extension(file_name.trim());

    let mut sanitised: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    sanitised.truncate(MAX_STORED_BASE_LEN);

    if sanitised.is_empty() || sanitised.bytes().all(|b| b == b'.') {
        sanitised = FALLBACK_STORED_NAME.to_owned();
    }

    format!("{}_{}", sanitised, suffix)
}

fn strip_pdf_extension(file_name: &str) -> &str {
    let split = file_name.len().saturating_sub(PDF_EXTENSION.len());
    match (file_name.get(..split), file_name.get(split..)) {
        (Some(base), Some(ext)) if ext.eq_ignore_ascii_case(PDF_EXTENSION) => base,
        _ => file_name,
    }
}

/// Validates an invitation recipient, producing the message shown to the user on failure.
pub fn recipient_email(input: &str) -> ShareResult<EmailAddress> {
    EmailAddress::parse(input).map_err(|e| match e {
        TextError::Empty => ShareError::InvalidInput("Please enter an email address.".into()),
        _ => ShareError::InvalidInput("Please enter a valid email address.".into()),
    })
}

/// Validates the uploader identity. A missing identity is `Unauthorized`.
pub fn owner_id(input: &str) -> ShareResult<OwnerId> {
    OwnerId::parse(input).map_err(|e| match e {
        TextError::Empty => ShareError::Unauthorized("sign in to upload documents".into()),
        other => ShareError::InvalidInput(other.to_string()),
    })
}

pub fn comment_text(input: &str) -> ShareResult<NonEmptyText> {
    NonEmptyText::new(input)
        .map_err(|_| ShareError::InvalidInput("Comment cannot be empty.".into()))
}
