#![cfg_attr(not(test), no_std)]
extern crate alloc;

pub mod bitmap;
pub mod block_device;
pub mod error;
pub mod inode;
pub mod layout;
pub mod path;
pub mod simple_fs;
pub mod vfs;

pub use block_device::{BlockDevice, MemBlockDevice};
pub use error::{FsError, FsResult};
pub use inode::{DirEntry, DiskInode, InodeType};
pub use simple_fs::SimpleFileSystem;
