//! Constants used throughout the pdfshare core.

/// Directory under the data root holding document records.
pub const DOCUMENTS_DIR_NAME: &str = "documents";

/// Directory under the data root mapping share ids to document ids.
pub const SHARE_INDEX_DIR_NAME: &str = "share_index";

/// Directory under the data root holding PDF bytes.
pub const BLOBS_DIR_NAME: &str = "blobs";

pub const DOCUMENT_FILE_NAME: &str = "document.yaml";

pub const COMMENTS_DIR_NAME: &str = "comments";

pub const COMMENT_FILE_EXTENSION: &str = "yaml";

/// Documents whose last comment id is cached before the cache is reset.
pub const DEFAULT_COMMENT_ID_CACHE_LIMIT: usize = 1024;

/// Author label recorded for comments posted without a signed-in identity.
pub const ANONYMOUS_LABEL: &str = "Anonymous";

/// The only media type accepted for uploads.
pub const PDF_MIME_TYPE: &str = "application/pdf";

pub const PDF_EXTENSION: &str = ".pdf";

/// Base name used when a file name sanitises to nothing.
pub const FALLBACK_STORED_NAME: &str = "document";

/// Longest sanitised base name kept before the uniqueness suffix is appended.
pub const MAX_STORED_BASE_LEN: usize = 200;

pub const SHARED_PATH_PREFIX: &str = "/shared/";

pub const PDF_PATH_PREFIX: &str = "/pdf/";

/// Appended to a `/shared/<share_id>` path to address the PDF bytes.
pub const CONTENT_PATH_SUFFIX: &str = "/content";

/// Authentication entry point callers are redirected to on `Unauthorized`.
pub const LOGIN_PATH: &str = "/login";

pub const DEFAULT_PUBLIC_ORIGIN: &str = "http://localhost:3000";

pub const DEFAULT_DATA_DIR: &str = "pdfshare_data";

/// 25 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;
