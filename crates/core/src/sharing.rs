//! Sharing Resolver.
//!
//! Turns an opaque share id from a URL path into a document and its comment thread, with no
//! authentication required. Unknown and malformed ids are both plain `NotFound`.
//!
//! Holding the share id is the only access control: there is no rate limiting on
//! resolution, so the id must stay unguessable. PDF bytes are read through the share id as
//! well; blob paths are never exposed to callers.

use crate::constants::{PDF_PATH_PREFIX, SHARED_PATH_PREFIX};
use crate::validation::recipient_email;
use crate::{Comment, CommentLog, Document, DocumentRegistry, ShareError, ShareResult};
use pdfshare_files::{BlobPath, BlobStore, FilesError};
use pdfshare_notify::{DispatchOutcome, NotificationDispatcher, ShareInvite};
use pdfshare_types::OwnerId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// Which front-end route a share link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareRoute {
    /// Viewer with comment thread; used for copied and emailed links
    #[default]
    Shared,
    /// Plain PDF view; used for the owner's own "view" link
    Pdf,
}

impl ShareRoute {
    pub fn path_prefix(self) -> &'static str {
        match self {
            ShareRoute::Shared => SHARED_PATH_PREFIX,
            ShareRoute::Pdf => PDF_PATH_PREFIX,
        }
    }
}

impl FromStr for ShareRoute {
    type Err = ShareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shared" => Ok(ShareRoute::Shared),
            "pdf" => Ok(ShareRoute::Pdf),
            other => Err(ShareError::InvalidInput(format!(
                "route must be 'shared' or 'pdf', got '{}'",
                other
            ))),
        }
    }
}

/// A resolved document together with its thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedView {
    pub document: Document,
    pub comments: Vec<Comment>,
}

#[derive(Clone)]
pub struct SharingService {
    registry: Arc<dyn DocumentRegistry>,
    comments: Arc<dyn CommentLog>,
    blobs: Arc<dyn BlobStore>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    public_origin: String,
}

impl SharingService {
    pub fn new(
        registry: Arc<dyn DocumentRegistry>,
        comments: Arc<dyn CommentLog>,
        blobs: Arc<dyn BlobStore>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        public_origin: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            comments,
            blobs,
            dispatcher,
            public_origin: public_origin.into().trim_end_matches('/').to_owned(),
        }
    }

    /// Resolves a share id. Any id that was never issued is `NotFound`.
    pub fn resolve(&self, share_id: &str) -> ShareResult<Document> {
        self.registry.find_by_share_id(share_id)
    }

    pub fn open_thread(&self, share_id: &str) -> ShareResult<SharedView> {
        let document = self.resolve(share_id)?;
        let comments = self.comments.list_ordered(&document.id)?;
        Ok(SharedView { document, comments })
    }

    /// PDF bytes of the shared document.
    ///
    /// A resolved document whose blob is missing is `NotFound`, the same as an unknown id.
    pub fn read_content(&self, share_id: &str) -> ShareResult<Vec<u8>> {
        let document = self.resolve(share_id)?;
        let path = BlobPath::new(document.owner_id.clone(), &document.stored_name)?;
        match self.blobs.read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(FilesError::BlobNotFound(_)) => {
                tracing::warn!(document_id = %document.id, "shared document has no stored blob");
                Err(ShareError::NotFound)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn comments(&self, share_id: &str) -> ShareResult<Vec<Comment>> {
        let document = self.resolve(share_id)?;
        self.comments.list_ordered(&document.id)
    }

    /// Appends a comment to the shared document and returns the re-queried thread.
    ///
    /// `author_label` of `None` posts anonymously.
    pub fn comment(
        &self,
        share_id: &str,
        author_label: Option<&str>,
        text: &str,
    ) -> ShareResult<Vec<Comment>> {
        let document = self.resolve(share_id)?;
        self.comments.append(&document.id, author_label, text)?;
        self.comments.list_ordered(&document.id)
    }

    /// `<origin><prefix><share_id>` for `document`.
    pub fn share_link(&self, document: &Document, route: ShareRoute) -> String {
        format!(
            "{}{}{}",
            self.public_origin,
            route.path_prefix(),
            document.share_id
        )
    }

    /// Resolves `share_id` and builds its link, so only issued ids produce links.
    pub fn link_for(&self, share_id: &str, route: ShareRoute) -> ShareResult<String> {
        let document = self.resolve(share_id)?;
        Ok(self.share_link(&document, route))
    }

    /// Emails a `/shared/` link for the document to `recipient`.
    ///
    /// The recipient is validated before anything else. Only the document's owner may
    /// invite. A dispatcher failure comes back as `Ok` with `success == false`.
    pub fn invite(
        &self,
        owner: &OwnerId,
        share_id: &str,
        recipient: &str,
    ) -> ShareResult<DispatchOutcome> {
        let recipient = recipient_email(recipient)?;
        let document = self.resolve(share_id)?;

        if &document.owner_id != owner {
            return Err(ShareError::Unauthorized(
                "only the owner can share this document".into(),
            ));
        }

        let invite = ShareInvite {
            email: recipient.as_str().to_owned(),
            pdf_name: document.display_name.as_str().to_owned(),
            share_link: self.share_link(&document, ShareRoute::Shared),
        };

        let outcome = self.dispatcher.send_share_invite(&invite);
        if outcome.success {
            tracing::info!(document_id = %document.id, "share invite dispatched");
        } else {
            tracing::warn!(
                document_id = %document.id,
                error = outcome.error.as_deref().unwrap_or(""),
                "share invite not delivered"
            );
        }
        Ok(outcome)
    }
}
