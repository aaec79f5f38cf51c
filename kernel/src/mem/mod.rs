use crate::error::{KernelError, KernelResult};
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

#[cfg(target_os = "none")]
pub mod heap;

// Flat physical memory shared with user programs. There is no address
// translation, an address outside the backing memory is BadAddress.
pub trait UserMemory: Send + Sync {
    fn read(&self, addr: u32, buf: &mut [u8]) -> KernelResult<()>;
    fn write(&self, addr: u32, data: &[u8]) -> KernelResult<()>;
}

// `[addr, addr + len)` must lie in user memory, checked at both ends
pub fn check_range(mem: &dyn UserMemory, addr: u32, len: usize) -> KernelResult<()> {
    if len == 0 {
        return Ok(());
    }
    let last = u32::try_from(len - 1)
        .ok()
        .and_then(|off| addr.checked_add(off))
        .ok_or(KernelError::BadAddress)?;
    let mut byte = [0u8; 1];
    mem.read(addr, &mut byte)?;
    mem.read(last, &mut byte)
}

// read `len` bytes starting at `addr`
pub fn read_bytes(mem: &dyn UserMemory, addr: u32, len: usize) -> KernelResult<Vec<u8>> {
    check_range(mem, addr, len)?;
    let mut buf = vec![0u8; len];
    mem.read(addr, &mut buf)?;
    return Ok(buf);
}

// read a NUL-terminated string of at most `limit` bytes
pub fn read_cstr(mem: &dyn UserMemory, addr: u32, limit: usize) -> KernelResult<String> {
    let mut bytes = Vec::new();
    let mut ch = [0u8; 1];
    loop {
        let at = addr
            .checked_add(bytes.len() as u32)
            .ok_or(KernelError::BadAddress)?;
        mem.read(at, &mut ch)?;
        if ch[0] == 0 {
            break;
        }
        if bytes.len() == limit {
            return Err(KernelError::InvalidArgument);
        }
        bytes.push(ch[0]);
    }
    String::from_utf8(bytes).map_err(|_| KernelError::InvalidArgument)
}

pub fn write_u32(mem: &dyn UserMemory, addr: u32, value: u32) -> KernelResult<()> {
    mem.write(addr, &value.to_le_bytes())
}

pub fn read_u32(mem: &dyn UserMemory, addr: u32) -> KernelResult<u32> {
    let mut bytes = [0u8; 4];
    mem.read(addr, &mut bytes)?;
    Ok(u32::from_le_bytes(bytes))
}

// copy `len` bytes inside user memory
pub fn copy_within(mem: &dyn UserMemory, from: u32, to: u32, len: usize) -> KernelResult<()> {
    check_range(mem, to, len)?;
    let bytes = read_bytes(mem, from, len)?;
    mem.write(to, &bytes)
}
