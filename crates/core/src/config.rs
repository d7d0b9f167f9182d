//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into the core services, so
//! nothing reads process-wide environment variables during request handling.

use crate::constants::{BLOBS_DIR_NAME, DOCUMENTS_DIR_NAME, SHARE_INDEX_DIR_NAME};
use crate::{ShareError, ShareResult};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

/// What to do with a stored blob when the metadata write that should follow it fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrphanPolicy {
    /// Leave the blob in place. The orphan is logged and tolerated.
    #[default]
    Keep,
    /// Delete the blob on a best-effort basis before returning the original error.
    Compensate,
}

impl FromStr for OrphanPolicy {
    type Err = ShareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep" => Ok(Self::Keep),
            "compensate" => Ok(Self::Compensate),
            other => Err(ShareError::InvalidInput(format!(
                "orphan policy must be 'keep' or 'compensate', got '{}'",
                other
            ))),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    public_origin: String,
    max_upload_bytes: usize,
    orphan_policy: OrphanPolicy,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `ShareError::InvalidInput` if `data_dir` is not an existing directory,
    /// `public_origin` is not an `http://` or `https://` origin, or `max_upload_bytes` is zero.
    pub fn new(
        data_dir: PathBuf,
        public_origin: &str,
        max_upload_bytes: usize,
        orphan_policy: OrphanPolicy,
    ) -> ShareResult<Self> {
        if !data_dir.is_dir() {
            return Err(ShareError::InvalidInput(format!(
                "data directory does not exist: {}",
                data_dir.display()
            )));
        }

        if max_upload_bytes == 0 {
            return Err(ShareError::InvalidInput(
                "max_upload_bytes must be greater than zero".into(),
            ));
        }

        Ok(Self {
            data_dir,
            public_origin: validate_public_origin(public_origin)?,
            max_upload_bytes,
            orphan_policy,
        })
    }

    pub fn documents_dir(&self) -> PathBuf {
        self.data_dir.join(DOCUMENTS_DIR_NAME)
    }

    pub fn share_index_dir(&self) -> PathBuf {
        self.data_dir.join(SHARE_INDEX_DIR_NAME)
    }

    pub fn blobs_dir(&self) -> PathBuf {
        self.data_dir.join(BLOBS_DIR_NAME)
    }

    /// Origin without a trailing slash, e.g. `https://share.example.com`.
    pub fn public_origin(&self) -> &str {
        &self.public_origin
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    pub fn orphan_policy(&self) -> OrphanPolicy {
        self.orphan_policy
    }

    /// Creates the documents, share index and blobs directories if they are missing.
    pub fn ensure_layout(&self) -> ShareResult<()> {
        for dir in [self.documents_dir(), self.share_index_dir(), self.blobs_dir()] {
            fs::create_dir_all(&dir).map_err(ShareError::StorageDirCreation)?;
        }
        Ok(())
    }
}

/// Validates a public origin and strips trailing slashes.
pub fn validate_public_origin(origin: &str) -> ShareResult<String> {
    let trimmed = origin.trim().trim_end_matches('/');

    let rest = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .ok_or_else(|| {
            ShareError::InvalidInput(format!(
                "public origin must start with http:// or https://, got '{}'",
                origin
            ))
        })?;

    if rest.is_empty() || rest.contains(char::is_whitespace) {
        return Err(ShareError::InvalidInput(format!(
            "public origin has no host: '{}'",
            origin
        )));
    }

    Ok(trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_MAX_UPLOAD_BYTES;
    use tempfile::TempDir;

    #[test]
    fn test_orphan_policy_parse() {
        assert_eq!("keep".parse::<OrphanPolicy>().unwrap(), OrphanPolicy::Keep);
        assert_eq!(
            " Compensate ".parse::<OrphanPolicy>().unwrap(),
            OrphanPolicy::Compensate
        );
        assert!("rollback".parse::<OrphanPolicy>().is_err());
        assert_eq!(OrphanPolicy::default(), OrphanPolicy::Keep);
    }

    #[test]
    fn test_public_origin_validation() {
        assert_eq!(
            validate_public_origin("https://share.example.com/").unwrap(),
            "https://share.example.com"
        );
        assert_eq!(
            validate_public_origin("http://localhost:3000").unwrap(),
            "http://localhost:3000"
        );
        assert!(validate_public_origin("ftp://example.com").is_err());
        assert!(validate_public_origin("https://").is_err());
        assert!(validate_public_origin("example.com").is_err());
    }

    #[test]
    fn test_config_requires_existing_data_dir() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing");
        let err = CoreConfig::new(
            missing,
            "http://localhost:3000",
            DEFAULT_MAX_UPLOAD_BYTES,
            OrphanPolicy::Keep,
        )
        .unwrap_err();
        assert!(matches!(err, ShareError::InvalidInput(_)));
    }

    #[test]
    fn test_ensure_layout_creates_directories() {
        let temp = TempDir::new().unwrap();
        let cfg = CoreConfig::new(
            temp.path().to_path_buf(),
            "http://localhost:3000/",
            DEFAULT_MAX_UPLOAD_BYTES,
            OrphanPolicy::Keep,
        )
        .unwrap();

        cfg.ensure_layout().unwrap();

        assert!(cfg.documents_dir().is_dir());
        assert!(cfg.share_index_dir().is_dir());
        assert!(cfg.blobs_dir().is_dir());
        assert_eq!(cfg.public_origin(), "http://localhost:3000");
    }
}
