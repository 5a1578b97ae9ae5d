/// Errors raised while constructing or decoding an [`crate::Item`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Decoded bytes had zero variant fields set, or were not a well-formed
    /// wire record at all.
    #[error("bad item")]
    BadItem,

    /// A `File` body's `body_bytes` exceeded [`crate::MAX_FILE_BYTES`].
    #[error("file body of {0} bytes exceeds the {} byte limit", crate::MAX_FILE_BYTES)]
    LargeFile(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
