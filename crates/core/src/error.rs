use pdfshare_files::FilesError;
use pdfshare_uuid::UuidError;

/// How a failure is reported to the caller that initiated it.
///
/// Every [`ShareError`] maps to exactly one kind. None of them is fatal to the running process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Rejected before any write; the caller is shown a specific message.
    InvalidInput,
    /// An owner identity was required and missing; the caller is sent to sign in.
    Unauthorized,
    /// A store or blob call failed; the caller is shown a generic failure.
    WriteFailure,
    /// No document (or thread) for the given identifier.
    NotFound,
}

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("not found")]
    NotFound,

    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to write record file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read record file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to serialize YAML: {0}")]
    YamlSerialization(serde_yaml::Error),
    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(serde_yaml::Error),
    #[error(
        "create failed and cleanup also failed (path: {path}): create={create_error}; cleanup={cleanup_error}",
        path = path.display()
    )]
    CleanupAfterCreateFailed {
        path: std::path::PathBuf,
        #[source]
        create_error: Box<ShareError>,
        cleanup_error: std::io::Error,
    },

    #[error("blob store error: {0}")]
    Blob(#[from] FilesError),
    #[error("identifier error: {0}")]
    Identifier(#[from] UuidError),
}

impl ShareError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ShareError::InvalidInput(_) => FailureKind::InvalidInput,
            ShareError::Unauthorized(_) => FailureKind::Unauthorized,
            ShareError::NotFound => FailureKind::NotFound,
            ShareError::Blob(FilesError::BlobNotFound(_)) => FailureKind::NotFound,
            ShareError::Blob(FilesError::InvalidPath(_)) => FailureKind::InvalidInput,
            ShareError::Identifier(_) => FailureKind::InvalidInput,
            ShareError::StorageDirCreation(_)
            | ShareError::FileWrite(_)
            | ShareError::FileRead(_)
            | ShareError::YamlSerialization(_)
            | ShareError::YamlDeserialization(_)
            | ShareError::CleanupAfterCreateFailed { .. }
            | ShareError::Blob(_) => FailureKind::WriteFailure,
        }
    }
}

pub type ShareResult<T> = std::result::Result<T, ShareError>;
