//! pdfshare Blob Store
//!
//! This crate stores the binary content of uploaded documents and reads it back for
//! serving through a share link.
//!
//! ## Design Principles
//!
//! - Document metadata and binary bytes are stored separately; the registry only keeps the
//!   owner and stored name needed to find the bytes again
//! - Blobs are immutable once written (an existing path is never overwritten)
//! - Paths are namespaced by owner
//! - Every path segment is validated before it touches the filesystem
//!
//! ## Storage Layout
//!
//! ```text
//! <root>/
//! └── <owner_id>/
//!     └── <stored_name>
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use pdfshare_files::{BlobPath, BlobStore, FilesService};
//! use pdfshare_types::OwnerId;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let service = FilesService::new(Path::new("pdfshare_data/blobs"))?;
//! let path = BlobPath::new(OwnerId::parse("uid-123")?, "report_1700000000000")?;
//! let metadata = service.put(&path, b"%PDF-1.7")?;
//! println!("{} ({} bytes)", path.relative_path(), metadata.size_bytes);
//! assert_eq!(service.read(&path)?, b"%PDF-1.7");
//! # Ok(())
//! # }
//! ```

mod constants;
mod files;

pub use constants::MAX_BLOB_NAME_LEN;
pub use files::{BlobMetadata, BlobPath, BlobStore, FilesService, Sha256Hash};

/// Errors that can occur during blob operations
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Root directory does not exist or is not a directory
    #[error("Invalid root directory: {0}")]
    InvalidRootDirectory(String),

    /// Path validation failed (potential directory traversal or unsafe segment)
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// A blob already exists at this path (immutability violation)
    #[error("Blob already exists at {0}")]
    BlobAlreadyExists(String),

    /// No blob exists at this path
    #[error("Blob not found: {0}")]
    BlobNotFound(String),

    /// Hash text was not 64 hex characters
    #[error("Invalid hash: {0}")]
    InvalidHash(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type FilesResult<T> = Result<T, FilesError>;
