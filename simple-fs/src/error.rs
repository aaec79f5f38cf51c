pub type FsResult<T> = Result<T, FsError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, onlyerror::Error)]
pub enum FsError {
    #[error("no free inode or data block")]
    AllocationExhausted,
    #[error("file not found")]
    NotFound,
    #[error("bad file path")]
    InvalidPath,
    #[error("not a directory")]
    NotDirectory,
    #[error("is a directory")]
    IsDirectory,
    #[error("directory full")]
    DirectoryFull,
    #[error("directory not empty")]
    DirectoryNotEmpty,
    #[error("file exists")]
    AlreadyExists,
    #[error("data too large")]
    OversizedTransfer,
    #[error("invalid file system")]
    Corrupted,
}
