use simplefs::FsError;

pub type KernelResult<T> = Result<T, KernelError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, onlyerror::Error)]
pub enum KernelError {
    #[error("fs: {0}")]
    Fs(#[from] FsError),
    #[error("unsupported syscall")]
    InvalidSyscall,
    #[error("bad file descriptor")]
    InvalidDescriptor,
    #[error("access denied")]
    AccessDenied,
    #[error("bad user address")]
    BadAddress,
    #[error("no such process")]
    NoSuchProcess,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("too many open files")]
    TooManyOpenFiles,
    #[error("process limit reached")]
    ProcessLimit,
    #[error("too many semaphores")]
    TooManySemaphores,
    #[error("semaphore has waiters")]
    SemaphoreBusy,
}

impl KernelError {
    // value handed back to user space in r0
    pub fn code(&self) -> isize {
        match self {
            KernelError::InvalidSyscall => -1,
            KernelError::InvalidDescriptor => -2,
            KernelError::AccessDenied => -3,
            KernelError::BadAddress => -4,
            KernelError::NoSuchProcess => -5,
            KernelError::InvalidArgument => -6,
            KernelError::TooManyOpenFiles => -7,
            KernelError::ProcessLimit => -8,
            KernelError::TooManySemaphores => -9,
            KernelError::SemaphoreBusy => -10,
            KernelError::Fs(e) => match e {
                FsError::AllocationExhausted => -20,
                FsError::NotFound => -21,
                FsError::InvalidPath => -22,
                FsError::NotDirectory => -23,
                FsError::IsDirectory => -24,
                FsError::DirectoryFull => -25,
                FsError::DirectoryNotEmpty => -26,
                FsError::AlreadyExists => -27,
                FsError::OversizedTransfer => -28,
                FsError::Corrupted => -29,
            },
        }
    }

    // the r0 bit pattern of `code`
    pub fn as_reg(&self) -> u32 {
        self.code() as i32 as u32
    }
}
