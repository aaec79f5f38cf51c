use crate::error::{KernelError, KernelResult};
use crate::mem::{read_bytes, UserMemory};
use alloc::vec;
use simplefs::layout::MAX_FILE_SIZE;
use simplefs::{FsError, SimpleFileSystem};

// Whole-file transfers between a user buffer and an inode. Oversized
// requests are refused before user memory or the disk is touched.

pub fn write_from_user(
    fs: &SimpleFileSystem,
    mem: &dyn UserMemory,
    inode: u32,
    addr: u32,
    len: usize,
) -> KernelResult<usize> {
    if len > MAX_FILE_SIZE {
        return Err(KernelError::Fs(FsError::OversizedTransfer));
    }
    let data = read_bytes(mem, addr, len)?;
    Ok(fs.write_file(inode, &data)?)
}

pub fn read_into_user(
    fs: &SimpleFileSystem,
    mem: &dyn UserMemory,
    inode: u32,
    addr: u32,
    len: usize,
) -> KernelResult<usize> {
    if len > MAX_FILE_SIZE {
        return Err(KernelError::Fs(FsError::OversizedTransfer));
    }
    let mut buf = vec![0u8; len];
    let copied = fs.read_file(inode, &mut buf)?;
    mem.write(addr, &buf[..copied])?;
    return Ok(copied);
}
