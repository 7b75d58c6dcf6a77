#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
    #[error("could not determine a data directory for this platform")]
    NoDataDir,
    #[error("path is not valid UTF-8: {0}")]
    NonUtf8Path(String),
    #[error("storage lock poisoned")]
    Poisoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorKind {
    Io,
    Codec,
    InvalidKey,
    Unavailable,
}

impl StorageError {
    pub fn kind(&self) -> StorageErrorKind {
        match self {
            StorageError::Io(_) => StorageErrorKind::Io,
            StorageError::Serde(_) => StorageErrorKind::Codec,
            StorageError::InvalidKey(_) => StorageErrorKind::InvalidKey,
            StorageError::NoDataDir | StorageError::NonUtf8Path(_) | StorageError::Poisoned => {
                StorageErrorKind::Unavailable
            }
        }
    }
}
