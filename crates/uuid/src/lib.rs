//! Identifier utilities.
//!
//! pdfshare stores document records under sharded directories derived from a UUID, hands out
//! opaque share tokens, and orders comments and stored names by monotonic time.
//!
//! This crate provides:
//! - [`ShardableUuid`]: the canonical document identifier (**32 lowercase hexadecimal
//!   characters**, no hyphens) and the sharded directory it maps to.
//! - [`ShareId`]: the random token that grants unauthenticated read access to one document.
//! - [`TimestampId`] / [`TimestampIdGenerator`]: time-prefixed identifiers that sort in
//!   creation order.
//! - [`MonotonicMillis`]: a strictly increasing millisecond clock used for upload name
//!   suffixes.
//!
//! ## Sharded directory layout
//! For a canonical UUID `u`, records live under:
//! `parent_dir/<u[0..2]>/<u[2..4]>/<u>/`
//!
//! Example:
//! `pdfshare_data/documents/55/0e/550e8400e29b41d4a716446655440000/`

mod service;

pub use service::{MonotonicMillis, ShardableUuid, ShareId, TimestampId, TimestampIdGenerator};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
