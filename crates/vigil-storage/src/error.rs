use std::path::PathBuf;

/// Errors that can occur in the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading the backing file failed.
    #[error("read failed for {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the backing file failed.
    #[error("write failed for {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store contents could not be serialized.
    #[cfg(feature = "file")]
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// The store is unavailable (e.g. the backend was shut down).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
