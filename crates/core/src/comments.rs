//! Comment Log.
//!
//! Each document has an append-only thread stored next to its record, one YAML file per
//! comment:
//!
//! ```text
//! <documents_dir>/<s1>/<s2>/<document_id>/comments/<timestamp_id>.yaml
//! ```
//!
//! Comment ids are [`TimestampId`]s generated while holding the log's lock, so timestamps
//! are strictly increasing per document within a process. The last id per document is
//! cached up to a fixed number of documents; a miss rescans the thread on disk.

use crate::constants::{
    ANONYMOUS_LABEL, COMMENTS_DIR_NAME, COMMENT_FILE_EXTENSION, DEFAULT_COMMENT_ID_CACHE_LIMIT,
    DOCUMENT_FILE_NAME,
};
use crate::validation::comment_text;
use crate::{CoreConfig, ShareError, ShareResult};
use chrono::{DateTime, Utc};
use pdfshare_types::NonEmptyText;
use pdfshare_uuid::{ShardableUuid, TimestampId, TimestampIdGenerator};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One message in a document's thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: TimestampId,
    pub document_id: ShardableUuid,
    /// Commenter email, or `"Anonymous"`
    pub author_label: String,
    pub text: NonEmptyText,
    pub created_at: DateTime<Utc>,
}

/// Append-only, timestamp-ordered comment threads.
pub trait CommentLog: Send + Sync {
    /// Appends a comment. `author_label` of `None` (or blank) records the anonymous label.
    ///
    /// Fails with `InvalidInput` if `text` is blank and `NotFound` if the document does not
    /// exist.
    fn append(
        &self,
        document_id: &ShardableUuid,
        author_label: Option<&str>,
        text: &str,
    ) -> ShareResult<Comment>;

    /// The thread in ascending `created_at` order, ties broken by id.
    fn list_ordered(&self, document_id: &ShardableUuid) -> ShareResult<Vec<Comment>>;
}

/// Filesystem-backed [`CommentLog`].
#[derive(Debug)]
pub struct FsCommentLog {
    documents_dir: PathBuf,
    /// Last id issued per document
    last_ids: Mutex<HashMap<ShardableUuid, TimestampId>>,
    cache_limit: usize,
}

impl FsCommentLog {
    pub fn new(cfg: &CoreConfig) -> Self {
        Self::with_cache_limit(cfg, DEFAULT_COMMENT_ID_CACHE_LIMIT)
    }

    /// Caches the last comment id for at most `cache_limit` documents (minimum one).
    pub fn with_cache_limit(cfg: &CoreConfig, cache_limit: usize) -> Self {
        Self {
            documents_dir: cfg.documents_dir(),
            last_ids: Mutex::new(HashMap::new()),
            cache_limit: cache_limit.max(1),
        }
    }

    fn document_dir(&self, document_id: &ShardableUuid) -> ShareResult<PathBuf> {
        let dir = document_id.sharded_dir(&self.documents_dir);
        if !dir.join(DOCUMENT_FILE_NAME).is_file() {
            return Err(ShareError::NotFound);
        }
        Ok(dir)
    }

    fn read_thread(comments_dir: &Path) -> ShareResult<Vec<Comment>> {
        let entries = match fs::read_dir(comments_dir) {
            Ok(it) => it,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ShareError::FileRead(e)),
        };

        let mut comments = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(COMMENT_FILE_EXTENSION) {
                continue;
            }

            let parsed = fs::read_to_string(&path)
                .map_err(ShareError::FileRead)
                .and_then(|s| {
                    serde_yaml::from_str::<Comment>(&s).map_err(ShareError::YamlDeserialization)
                });

            match parsed {
                Ok(comment) => comments.push(comment),
                Err(e) => tracing::warn!("failed to parse comment {}: {}", path.display(), e),
            }
        }

        comments.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(comments)
    }
}

impl CommentLog for FsCommentLog {
    fn append(
        &self,
        document_id: &ShardableUuid,
        author_label: Option<&str>,
        text: &str,
    ) -> ShareResult<Comment> {
        let text = comment_text(text)?;
        let comments_dir = self.document_dir(document_id)?.join(COMMENTS_DIR_NAME);

        let author_label = author_label
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .unwrap_or(ANONYMOUS_LABEL)
            .to_owned();

        let mut last_ids = self
            .last_ids
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let last = match last_ids.get(document_id) {
            Some(id) => Some(id.clone()),
            None => Self::read_thread(&comments_dir)?
                .into_iter()
                .map(|c| c.id)
                .max(),
        };

        let id = TimestampIdGenerator::generate(last.as_ref());
        let comment = Comment {
            created_at: id.timestamp(),
            id,
            document_id: document_id.clone(),
            author_label,
            text,
        };

        fs::create_dir_all(&comments_dir).map_err(ShareError::StorageDirCreation)?;
        let yaml = serde_yaml::to_string(&comment).map_err(ShareError::YamlSerialization)?;
        let path = comments_dir.join(format!("{}.{}", comment.id, COMMENT_FILE_EXTENSION));
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(ShareError::FileWrite)?;
        file.write_all(yaml.as_bytes())
            .map_err(ShareError::FileWrite)?;

        if !last_ids.contains_key(document_id) && last_ids.len() >= self.cache_limit {
            last_ids.clear();
        }
        last_ids.insert(document_id.clone(), comment.id.clone());

        tracing::info!(document_id = %document_id, comment_id = %comment.id, "comment appended");
        Ok(comment)
    }

    fn list_ordered(&self, document_id: &ShardableUuid) -> ShareResult<Vec<Comment>> {
        let dir = self.document_dir(document_id)?;
        Self::read_thread(&dir.join(COMMENTS_DIR_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::{config, new_document};
    use crate::registry::{DocumentRegistry, FsDocumentRegistry};
    use crate::FailureKind;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn setup(temp: &TempDir) -> (FsDocumentRegistry, FsCommentLog) {
        let cfg = config(temp);
        (FsDocumentRegistry::new(&cfg), FsCommentLog::new(&cfg))
    }

    #[test]
    fn test_append_then_list() {
        let temp = TempDir::new().unwrap();
        let (registry, log) = setup(&temp);
        let doc = registry.create(new_document("uid-a", "report.pdf")).unwrap();

        let comment = log
            .append(&doc.id, Some("reader@example.com"), "  nice work ")
            .unwrap();
        assert_eq!(comment.text.as_str(), "nice work");
        assert_eq!(comment.author_label, "reader@example.com");

        let thread = log.list_ordered(&doc.id).unwrap();
        assert_eq!(thread, vec![comment]);
    }

    #[test]
    fn test_missing_author_is_anonymous() {
        let temp = TempDir::new().unwrap();
        let (registry, log) = setup(&temp);
        let doc = registry.create(new_document("uid-a", "report.pdf")).unwrap();

        assert_eq!(
            log.append(&doc.id, None, "hi").unwrap().author_label,
            ANONYMOUS_LABEL
        );
        assert_eq!(
            log.append(&doc.id, Some("  "), "hi").unwrap().author_label,
            ANONYMOUS_LABEL
        );
    }

    #[test]
    fn test_blank_text_is_invalid_and_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let (registry, log) = setup(&temp);
        let doc = registry.create(new_document("uid-a", "report.pdf")).unwrap();

        let err = log.append(&doc.id, None, "   ").unwrap_err();
        assert_eq!(err.kind(), FailureKind::InvalidInput);
        assert!(log.list_ordered(&doc.id).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_document_is_not_found() {
        let temp = TempDir::new().unwrap();
        let (_, log) = setup(&temp);
        let id = ShardableUuid::new();

        assert_eq!(
            log.append(&id, None, "hi").unwrap_err().kind(),
            FailureKind::NotFound
        );
        assert_eq!(
            log.list_ordered(&id).unwrap_err().kind(),
            FailureKind::NotFound
        );
    }

    #[test]
    fn test_thread_is_ordered_by_created_at() {
        let temp = TempDir::new().unwrap();
        let (registry, log) = setup(&temp);
        let doc = registry.create(new_document("uid-a", "report.pdf")).unwrap();

        for i in 0..20 {
            log.append(&doc.id, None, &format!("comment {i}")).unwrap();
        }

        let thread = log.list_ordered(&doc.id).unwrap();
        assert_eq!(thread.len(), 20);
        for pair in thread.windows(2) {
            assert!(pair[0].created_at < pair[1].created_at);
        }
        assert_eq!(thread[0].text.as_str(), "comment 0");
        assert_eq!(thread[19].text.as_str(), "comment 19");
    }

    #[test]
    fn test_new_log_continues_after_existing_thread() {
        let temp = TempDir::new().unwrap();
        let cfg = config(&temp);
        let registry = FsDocumentRegistry::new(&cfg);
        let doc = registry.create(new_document("uid-a", "report.pdf")).unwrap();

        let first = FsCommentLog::new(&cfg).append(&doc.id, None, "one").unwrap();
        let second = FsCommentLog::new(&cfg).append(&doc.id, None, "two").unwrap();

        assert!(second.id > first.id);
    }

    #[test]
    fn test_id_cache_stays_bounded_and_ids_keep_increasing() {
        let temp = TempDir::new().unwrap();
        let cfg = config(&temp);
        let registry = FsDocumentRegistry::new(&cfg);
        let log = FsCommentLog::with_cache_limit(&cfg, 1);
        let a = registry.create(new_document("uid-a", "a.pdf")).unwrap();
        let b = registry.create(new_document("uid-a", "b.pdf")).unwrap();

        for i in 0..5 {
            log.append(&a.id, None, &format!("a{i}")).unwrap();
            log.append(&b.id, None, &format!("b{i}")).unwrap();
            assert_eq!(log.last_ids.lock().unwrap().len(), 1);
        }

        for doc in [&a, &b] {
            let thread = log.list_ordered(&doc.id).unwrap();
            assert_eq!(thread.len(), 5);
            for pair in thread.windows(2) {
                assert!(pair[0].id < pair[1].id);
                assert!(pair[0].created_at < pair[1].created_at);
            }
        }
    }

    #[test]
    fn test_concurrent_appends_are_totally_ordered() {
        let temp = TempDir::new().unwrap();
        let (registry, log) = setup(&temp);
        let doc = registry.create(new_document("uid-a", "report.pdf")).unwrap();
        let log = Arc::new(log);

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let log = Arc::clone(&log);
                let id = doc.id.clone();
                std::thread::spawn(move || {
                    for i in 0..5 {
                        log.append(&id, None, &format!("t{t}-{i}")).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let thread = log.list_ordered(&doc.id).unwrap();
        assert_eq!(thread.len(), 20);
        for pair in thread.windows(2) {
            assert!(pair[0].created_at < pair[1].created_at);
        }
    }
}
