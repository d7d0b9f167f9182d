/// Longest stored-name segment accepted by [`crate::BlobPath`].
pub const MAX_BLOB_NAME_LEN: usize = 255;
