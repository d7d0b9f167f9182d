//! Owner-scoped blob storage implementation
//!
//! [`FilesService`] is the filesystem-backed [`BlobStore`]. Each write computes a SHA-256
//! digest of the content and a best-effort media type so callers can record integrity data
//! alongside the document metadata.
//!
//! # Security Model
//!
//! - The root directory is canonicalised at construction
//! - Owner ids and stored names are restricted to path-safe characters
//! - Writes use `create_new`, so a concurrent or repeated write to the same path fails
//!   instead of overwriting

use crate::{FilesError, FilesResult, MAX_BLOB_NAME_LEN};
use pdfshare_types::{NonEmptyText, OwnerId};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Hex-encoded SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sha256Hash(String);

impl Sha256Hash {
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self(hex::encode(bytes))
    }

    pub fn digest(content: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content);
        let hash_array: [u8; 32] = hasher.finalize().into();
        Self::from_bytes(&hash_array)
    }

    pub fn parse(input: &str) -> FilesResult<Self> {
        let valid = input.len() == 64
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if !valid {
            return Err(FilesError::InvalidHash(input.to_owned()));
        }
        Ok(Self(input.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Sha256Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl serde::Serialize for Sha256Hash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Sha256Hash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Sha256Hash::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Location of one blob: an owner namespace plus a stored name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobPath {
    owner: OwnerId,
    name: String,
}

impl BlobPath {
    /// Creates a blob path after validating the stored name.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::InvalidPath`] if `name` is empty, too long, consists only of dots,
    /// or contains anything other than ASCII alphanumerics, `-`, `_` and `.`.
    pub fn new(owner: OwnerId, name: impl Into<String>) -> FilesResult<Self> {
        let name = name.into();
        let safe = !name.is_empty()
            && name.len() <= MAX_BLOB_NAME_LEN
            && name
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
            && !name.bytes().all(|b| b == b'.');

        if !safe {
            return Err(FilesError::InvalidPath(format!(
                "unsupported blob name: '{}'",
                name
            )));
        }

        Ok(Self { owner, name })
    }

    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path relative to the store root: `<owner_id>/<stored_name>`.
    pub fn relative_path(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Metadata describing a stored blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobMetadata {
    /// Hexadecimal SHA-256 digest of the content
    pub hash: Sha256Hash,

    pub size_bytes: u64,

    /// Media type sniffed from the content, if recognisable.
    ///
    /// Informational only; the caller's declared MIME type is what gates uploads.
    pub media_type: Option<NonEmptyText>,
}

/// Binary storage addressed by [`BlobPath`].
pub trait BlobStore: Send + Sync {
    /// Writes `content` at `path`. Fails if a blob already exists there.
    fn put(&self, path: &BlobPath, content: &[u8]) -> FilesResult<BlobMetadata>;

    /// Reads the full content at `path`.
    fn read(&self, path: &BlobPath) -> FilesResult<Vec<u8>>;

    /// Removes the blob at `path`.
    fn delete(&self, path: &BlobPath) -> FilesResult<()>;
}

/// Filesystem-backed [`BlobStore`].
#[derive(Debug, Clone)]
pub struct FilesService {
    /// Canonicalised root directory containing one folder per owner
    root_directory: PathBuf,
}

impl FilesService {
    /// Creates a new `FilesService`.
    ///
    /// # Arguments
    ///
    /// * `root_directory` - Directory holding the per-owner blob folders; must exist
    ///
    /// # Errors
    ///
    /// Returns `FilesError::InvalidRootDirectory` if the root does not exist, is not a
    /// directory, or cannot be canonicalised.
    pub fn new(root_directory: &Path) -> FilesResult<Self> {
        if !root_directory.exists() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Directory does not exist: {}",
                root_directory.display()
            )));
        }

        if !root_directory.is_dir() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Path is not a directory: {}",
                root_directory.display()
            )));
        }

        let root_directory = root_directory.canonicalize().map_err(|e| {
            FilesError::InvalidRootDirectory(format!(
                "Cannot canonicalize path {}: {}",
                root_directory.display(),
                e
            ))
        })?;

        Ok(Self { root_directory })
    }

    fn storage_path(&self, path: &BlobPath) -> PathBuf {
        self.root_directory.join(path.owner().as_str()).join(path.name())
    }
}

impl BlobStore for FilesService {
    fn put(&self, path: &BlobPath, content: &[u8]) -> FilesResult<BlobMetadata> {
        let storage_path = self.storage_path(path);

        if let Some(parent) = storage_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                FilesError::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create storage directory {}: {}",
                        parent.display(),
                        e
                    ),
                ))
            })?;
        }

        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&storage_path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(FilesError::BlobAlreadyExists(path.relative_path()));
            }
            Err(e) => return Err(FilesError::Io(e)),
        };

        file.write_all(content)
            .and_then(|()| file.sync_all())
            .map_err(|e| {
                FilesError::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to write blob to {}: {}", storage_path.display(), e),
                ))
            })?;

        let media_type = infer::get(content).and_then(|kind| NonEmptyText::new(kind.mime_type()).ok());

        tracing::debug!(path = %path.relative_path(), size = content.len(), "stored blob");

        Ok(BlobMetadata {
            hash: Sha256Hash::digest(content),
            size_bytes: content.len() as u64,
            media_type,
        })
    }

    fn read(&self, path: &BlobPath) -> FilesResult<Vec<u8>> {
        let storage_path = self.storage_path(path);

        match fs::read(&storage_path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(FilesError::BlobNotFound(path.relative_path()))
            }
            Err(e) => Err(FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read blob from {}: {}", storage_path.display(), e),
            ))),
        }
    }

    fn delete(&self, path: &BlobPath) -> FilesResult<()> {
        match fs::remove_file(self.storage_path(path)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(FilesError::BlobNotFound(path.relative_path()))
            }
            Err(e) => Err(FilesError::Io(e)),
        }
    }
}
