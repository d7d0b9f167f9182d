//! Upload Orchestrator.
//!
//! An upload is two writes in sequence: the PDF bytes go to the [`BlobStore`], then the
//! metadata record goes to the [`DocumentRegistry`]. The pair is not transactional. If the
//! metadata write fails the blob is left without a record (an orphan); [`OrphanPolicy`]
//! decides whether it is kept or deleted on a best-effort basis.
//!
//! [`UploadForm`] wraps the orchestrator for interactive callers: a successful submit hands
//! back a fresh empty form for the next upload.

use crate::constants::PDF_MIME_TYPE;
use crate::validation::{self, stored_name};
use crate::{
    AuthState, Document, DocumentRegistry, NewDocument, OrphanPolicy, ShareError, ShareResult,
};
use pdfshare_files::{BlobPath, BlobStore};
use pdfshare_types::{EmailAddress, NonEmptyText};
use pdfshare_uuid::MonotonicMillis;
use std::sync::Arc;

#[derive(Clone)]
pub struct UploadService {
    registry: Arc<dyn DocumentRegistry>,
    blobs: Arc<dyn BlobStore>,
    clock: Arc<MonotonicMillis>,
    max_upload_bytes: usize,
    orphan_policy: OrphanPolicy,
}

impl UploadService {
    pub fn new(
        registry: Arc<dyn DocumentRegistry>,
        blobs: Arc<dyn BlobStore>,
        max_upload_bytes: usize,
        orphan_policy: OrphanPolicy,
    ) -> Self {
        Self {
            registry,
            blobs,
            clock: Arc::new(MonotonicMillis::new()),
            max_upload_bytes,
            orphan_policy,
        }
    }

    /// Stores `bytes` and records a new [`Document`] owned by `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns, without touching any store:
    /// - `InvalidInput` if `mime_type` is not exactly `application/pdf`, the file name is
    ///   blank, or the content exceeds the upload limit
    /// - `Unauthorized` if `owner_id` is empty
    ///
    /// Returns a `WriteFailure`-kind error if either write fails. A failure of the metadata
    /// write leaves the blob in place unless the orphan policy is `Compensate`.
    pub fn upload(
        &self,
        owner_id: &str,
        owner_email: Option<&EmailAddress>,
        bytes: &[u8],
        file_name: &str,
        mime_type: &str,
    ) -> ShareResult<Document> {
        if mime_type != PDF_MIME_TYPE {
            return Err(ShareError::InvalidInput("Please select a PDF file.".into()));
        }

        let owner = validation::owner_id(owner_id)?;

        let display_name = NonEmptyText::new(file_name)
            .map_err(|_| ShareError::InvalidInput("file name is required".into()))?;

        if bytes.len() > self.max_upload_bytes {
            return Err(ShareError::InvalidInput(format!(
                "file exceeds the {} byte upload limit",
                self.max_upload_bytes
            )));
        }

        let path = BlobPath::new(owner.clone(), stored_name(file_name, self.clock.next()))?;
        let metadata = self.blobs.put(&path, bytes)?;

        let new = NewDocument {
            owner_id: owner,
            owner_email: owner_email.cloned(),
            stored_name: path.name().to_owned(),
            display_name,
            size_bytes: metadata.size_bytes,
            sha256: metadata.hash,
            media_type: metadata.media_type.map(NonEmptyText::into_string),
        };

        match self.registry.create(new) {
            Ok(document) => {
                tracing::info!(
                    document_id = %document.id,
                    owner = %document.owner_id,
                    stored_name = %document.stored_name,
                    "document uploaded"
                );
                Ok(document)
            }
            Err(create_error) => {
                self.handle_orphan(&path, &create_error);
                Err(create_error)
            }
        }
    }

    fn handle_orphan(&self, path: &BlobPath, create_error: &ShareError) {
        match self.orphan_policy {
            OrphanPolicy::Keep => {
                tracing::warn!(
                    blob = %path.relative_path(),
                    "metadata write failed, blob left without a record: {}",
                    create_error
                );
            }
            OrphanPolicy::Compensate => match self.blobs.delete(path) {
                Ok(()) => {
                    tracing::warn!(
                        blob = %path.relative_path(),
                        "metadata write failed, blob removed: {}",
                        create_error
                    );
                }
                Err(delete_error) => {
                    tracing::warn!(
                        blob = %path.relative_path(),
                        "metadata write failed and blob removal failed: {}; {}",
                        create_error,
                        delete_error
                    );
                }
            },
        }
    }
}

/// A file chosen for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Type-state marker: no file selected.
#[derive(Debug)]
pub struct Empty;

/// Type-state marker: a file is selected and can be submitted.
#[derive(Debug)]
pub struct Selected(SelectedFile);

/// Upload form whose state is tracked in the type.
///
/// - `UploadForm<Empty>` can only `select` a file
/// - `UploadForm<Selected>` can `submit` or `clear`
///
/// A successful submit consumes the form and returns a new `UploadForm<Empty>`; a failed one
/// returns the form with the file still selected so the caller can retry or clear it.
#[derive(Debug)]
pub struct UploadForm<S> {
    state: S,
}

impl Default for UploadForm<Empty> {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadForm<Empty> {
    pub fn new() -> Self {
        Self { state: Empty }
    }

    pub fn select(self, file: SelectedFile) -> UploadForm<Selected> {
        UploadForm {
            state: Selected(file),
        }
    }
}

impl UploadForm<Selected> {
    pub fn file(&self) -> &SelectedFile {
        &self.state.0
    }

    pub fn clear(self) -> UploadForm<Empty> {
        UploadForm::new()
    }

    /// Uploads the selected file as the signed-in user in `auth`.
    ///
    /// Anything other than `AuthState::Authenticated` fails with `Unauthorized`.
    #[allow(clippy::result_large_err)]
    pub fn submit(
        self,
        service: &UploadService,
        auth: &AuthState,
    ) -> Result<(Document, UploadForm<Empty>), (ShareError, UploadForm<Selected>)> {
        let (owner, email) = match auth.identity() {
            Some(identity) => (identity.owner_id.as_str(), identity.email.as_ref()),
            None => ("", None),
        };

        let file = self.file();
        match service.upload(owner, email, &file.bytes, &file.file_name, &file.mime_type) {
            Ok(document) => Ok((document, UploadForm::new())),
            Err(e) => Err((e, self)),
        }
    }
}
