//! Document Registry.
//!
//! One YAML record per uploaded PDF, stored under a sharded directory derived from the
//! document id:
//!
//! ```text
//! <documents_dir>/<s1>/<s2>/<document_id>/document.yaml
//! <share_index_dir>/<share_id>        (contains <document_id>)
//! ```
//!
//! The share index gives `find_by_share_id` a direct lookup instead of a scan. Records are
//! created once and never updated or deleted.
//!
//! A record's `content_url` is `<origin>/shared/<share_id>/content`, so the PDF bytes are
//! only reachable through the share id.

use crate::constants::{CONTENT_PATH_SUFFIX, DOCUMENT_FILE_NAME, SHARED_PATH_PREFIX};
use crate::{CoreConfig, ShareError, ShareResult};
use chrono::{DateTime, Utc};
use pdfshare_files::Sha256Hash;
use pdfshare_types::{EmailAddress, NonEmptyText, OwnerId};
use pdfshare_uuid::{ShardableUuid, ShareId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Metadata for one uploaded PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: ShardableUuid,
    pub owner_id: OwnerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<EmailAddress>,
    /// Blob path segment: sanitised base name plus uniqueness suffix
    pub stored_name: String,
    /// Original file name, shown in listings
    pub display_name: NonEmptyText,
    pub content_url: String,
    pub share_id: ShareId,
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
    pub sha256: Sha256Hash,
    /// Media type sniffed from the stored bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

/// Fields supplied by the caller of [`DocumentRegistry::create`].
///
/// `id`, `share_id`, `content_url` and `created_at` are assigned by the registry.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub owner_id: OwnerId,
    pub owner_email: Option<EmailAddress>,
    pub stored_name: String,
    pub display_name: NonEmptyText,
    pub size_bytes: u64,
    pub sha256: Sha256Hash,
    pub media_type: Option<String>,
}

/// Queryable collection of document records.
pub trait DocumentRegistry: Send + Sync {
    /// Generates a share id, stamps `created_at`, persists and returns the full record.
    fn create(&self, new: NewDocument) -> ShareResult<Document>;

    /// All documents owned by `owner`, in no particular order.
    fn list_by_owner(&self, owner: &OwnerId) -> ShareResult<Vec<Document>>;

    /// Exact, case-sensitive lookup. Any token that was never issued is `NotFound`.
    fn find_by_share_id(&self, share_id: &str) -> ShareResult<Document>;

    fn find_by_id(&self, id: &ShardableUuid) -> ShareResult<Document>;
}

/// Filesystem-backed [`DocumentRegistry`].
#[derive(Debug, Clone)]
pub struct FsDocumentRegistry {
    documents_dir: PathBuf,
    share_index_dir: PathBuf,
    public_origin: String,
}

impl FsDocumentRegistry {
    pub fn new(cfg: &CoreConfig) -> Self {
        Self {
            documents_dir: cfg.documents_dir(),
            share_index_dir: cfg.share_index_dir(),
            public_origin: cfg.public_origin().to_owned(),
        }
    }

    pub fn documents_dir(&self) -> &Path {
        &self.documents_dir
    }

    fn content_url(&self, share_id: &ShareId) -> String {
        format!(
            "{}{}{}{}",
            self.public_origin, SHARED_PATH_PREFIX, share_id, CONTENT_PATH_SUFFIX
        )
    }

    fn write_record(dir: &Path, document: &Document) -> ShareResult<()> {
        let yaml = serde_yaml::to_string(document).map_err(ShareError::YamlSerialization)?;
        fs::write(dir.join(DOCUMENT_FILE_NAME), yaml).map_err(ShareError::FileWrite)
    }

    /// Claims `index_path` for the share id. Fails if another record already holds it.
    fn create_index_entry(&self, index_path: &Path) -> ShareResult<fs::File> {
        fs::create_dir_all(&self.share_index_dir).map_err(ShareError::StorageDirCreation)?;
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(index_path)
            .map_err(ShareError::FileWrite)
    }

    /// Removes a record directory and, when this create claimed it, the share index entry.
    fn remove_partial_record(dir: &Path, index_path: Option<&Path>) -> std::io::Result<()> {
        fs::remove_dir_all(dir)?;
        if let Some(index_path) = index_path {
            match fs::remove_file(index_path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn read_record(path: &Path) -> ShareResult<Document> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(ShareError::NotFound),
            Err(e) => return Err(ShareError::FileRead(e)),
        };
        serde_yaml::from_str(&contents).map_err(ShareError::YamlDeserialization)
    }

    /// Every `document.yaml` path under the sharded layout.
    fn record_paths(&self) -> ShareResult<Vec<PathBuf>> {
        let mut paths = Vec::new();

        let s1_iter = match fs::read_dir(&self.documents_dir) {
            Ok(it) => it,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(paths),
            Err(e) => return Err(ShareError::FileRead(e)),
        };

        for s1 in s1_iter.flatten() {
            let s1_path = s1.path();
            if !s1_path.is_dir() {
                continue;
            }

            let s2_iter = match fs::read_dir(&s1_path) {
                Ok(it) => it,
                Err(_) => continue,
            };

            for s2 in s2_iter.flatten() {
                let s2_path = s2.path();
                if !s2_path.is_dir() {
                    continue;
                }

                let id_iter = match fs::read_dir(&s2_path) {
                    Ok(it) => it,
                    Err(_) => continue,
                };

                for id_ent in id_iter.flatten() {
                    let record = id_ent.path().join(DOCUMENT_FILE_NAME);
                    if record.is_file() {
                        paths.push(record);
                    }
                }
            }
        }

        Ok(paths)
    }
}

impl DocumentRegistry for FsDocumentRegistry {
    /// # Errors
    ///
    /// Returns a `WriteFailure`-kind error if the record directory, the record file or the
    /// share index entry cannot be written. A partially written record directory is removed
    /// together with any index entry this call created; if that removal also fails,
    /// [`ShareError::CleanupAfterCreateFailed`] is returned.
    fn create(&self, new: NewDocument) -> ShareResult<Document> {
        let share_id = ShareId::new();
        let document = Document {
            id: ShardableUuid::new(),
            owner_id: new.owner_id,
            owner_email: new.owner_email,
            stored_name: new.stored_name,
            display_name: new.display_name,
            content_url: self.content_url(&share_id),
            share_id,
            created_at: Utc::now(),
            size_bytes: new.size_bytes,
            sha256: new.sha256,
            media_type: new.media_type,
        };

        let dir = document.id.sharded_dir(&self.documents_dir);
        fs::create_dir_all(&dir).map_err(ShareError::StorageDirCreation)?;

        let index_path = self.share_index_dir.join(document.share_id.as_str());
        let failure = match Self::write_record(&dir, &document) {
            Err(e) => Some((e, None)),
            Ok(()) => match self.create_index_entry(&index_path) {
                Err(e) => Some((e, None)),
                Ok(mut index) => index
                    .write_all(document.id.to_string().as_bytes())
                    .err()
                    .map(|e| (ShareError::FileWrite(e), Some(index_path.as_path()))),
            },
        };

        if let Some((create_error, claimed_index)) = failure {
            if let Err(cleanup_error) = Self::remove_partial_record(&dir, claimed_index) {
                return Err(ShareError::CleanupAfterCreateFailed {
                    path: dir,
                    create_error: Box::new(create_error),
                    cleanup_error,
                });
            }
            return Err(create_error);
        }

        tracing::debug!(document_id = %document.id, "document record created");
        Ok(document)
    }

    fn list_by_owner(&self, owner: &OwnerId) -> ShareResult<Vec<Document>> {
        let mut documents = Vec::new();

        for path in self.record_paths()? {
            match Self::read_record(&path) {
                Ok(document) if &document.owner_id == owner => documents.push(document),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("failed to parse document record {}: {}", path.display(), e);
                }
            }
        }

        Ok(documents)
    }

    fn find_by_share_id(&self, share_id: &str) -> ShareResult<Document> {
        if !ShareId::is_lookup_safe(share_id) {
            return Err(ShareError::NotFound);
        }

        let indexed = match fs::read_to_string(self.share_index_dir.join(share_id)) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(ShareError::NotFound),
            Err(e) => return Err(ShareError::FileRead(e)),
        };

        let Ok(id) = ShardableUuid::parse(indexed.trim()) else {
            tracing::warn!("share index entry is not a document id");
            return Err(ShareError::NotFound);
        };

        let document = self.find_by_id(&id)?;

        // The index lookup goes through the filesystem, which may fold case.
        if document.share_id.as_str() != share_id {
            return Err(ShareError::NotFound);
        }

        Ok(document)
    }

    fn find_by_id(&self, id: &ShardableUuid) -> ShareResult<Document> {
        Self::read_record(&id.sharded_dir(&self.documents_dir).join(DOCUMENT_FILE_NAME))
    }
}
