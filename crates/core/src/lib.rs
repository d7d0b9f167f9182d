//! # pdfshare Core
//!
//! Core business logic for sharing uploaded PDFs.
//!
//! This crate binds an uploaded blob, its owner, its share id and its comment thread
//! together:
//! - [`DocumentRegistry`]: document records, queryable by owner or by share id
//! - [`CommentLog`]: append-only, timestamp-ordered threads
//! - [`SharingService`]: share id resolution, content reads, share links, comments and
//!   invites
//! - [`UploadService`]: blob write followed by metadata write
//!
//! **No API concerns**: HTTP servers, identity headers and request parsing belong in
//! `api-rest` or `api-shared`.

pub mod comments;
pub mod config;
pub mod constants;
pub mod error;
pub mod listing;
pub mod registry;
pub mod search;
pub mod session;
pub mod sharing;
pub mod upload;
pub mod validation;

pub use comments::{Comment, CommentLog, FsCommentLog};
pub use config::{CoreConfig, OrphanPolicy};
pub use constants::ANONYMOUS_LABEL;
pub use error::{FailureKind, ShareError, ShareResult};
pub use listing::{ListingStatus, OwnerListing};
pub use registry::{Document, DocumentRegistry, FsDocumentRegistry, NewDocument};
pub use session::{AuthEvent, AuthState, AuthStateHub, AuthSubscription, Identity};
pub use sharing::{ShareRoute, SharedView, SharingService};
pub use upload::{Empty, Selected, SelectedFile, UploadForm, UploadService};

use pdfshare_files::{BlobStore, FilesService};
use pdfshare_notify::NotificationDispatcher;
use std::sync::Arc;

/// The core services wired to the filesystem stores under one data directory.
#[derive(Clone)]
pub struct ShareServices {
    pub registry: Arc<dyn DocumentRegistry>,
    pub uploads: UploadService,
    pub sharing: SharingService,
}

impl ShareServices {
    /// Creates the data layout if needed and builds every service from `cfg`.
    pub fn from_config(
        cfg: &CoreConfig,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> ShareResult<Self> {
        cfg.ensure_layout()?;

        let registry: Arc<dyn DocumentRegistry> = Arc::new(FsDocumentRegistry::new(cfg));
        let comments: Arc<dyn CommentLog> = Arc::new(FsCommentLog::new(cfg));
        let blobs: Arc<dyn BlobStore> = Arc::new(FilesService::new(&cfg.blobs_dir())?);

        let uploads = UploadService::new(
            registry.clone(),
            blobs.clone(),
            cfg.max_upload_bytes(),
            cfg.orphan_policy(),
        );
        let sharing = SharingService::new(
            registry.clone(),
            comments,
            blobs,
            dispatcher,
            cfg.public_origin(),
        );

        Ok(Self {
            registry,
            uploads,
            sharing,
        })
    }
}
