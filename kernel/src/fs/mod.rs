pub mod inode;
pub mod stdio;

use crate::config::{MAX_FILES, STD_FILES};
use crate::error::{KernelError, KernelResult};
use alloc::vec::Vec;
use bitflags::bitflags;
use stdio::Device;

bitflags! {
    pub struct AccessMode: u32 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backing {
    Device(Device),
    Inode(u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileRow {
    pub backing: Backing,
    pub access: AccessMode,
    // local descriptors mapped to this row
    pub refs: usize,
}

// Open files shared by every process. Rows 0..STD_FILES are the
// standard devices and live forever, inode rows go away with their
// last reference.
pub struct FileTable {
    rows: [Option<FileRow>; MAX_FILES],
}

impl FileTable {
    pub fn new() -> Self {
        let mut rows = [None; MAX_FILES];
        for (fd, dev) in [Device::Stdin, Device::Stdout, Device::Stderr, Device::Console]
            .into_iter()
            .enumerate()
        {
            rows[fd] = Some(FileRow {
                backing: Backing::Device(dev),
                access: dev.access(),
                refs: 0,
            });
        }
        return Self { rows };
    }

    pub fn get(&self, fd: usize) -> KernelResult<&FileRow> {
        self.rows
            .get(fd)
            .and_then(|r| r.as_ref())
            .ok_or(KernelError::InvalidDescriptor)
    }

    // new row for `inode` with a single reference
    pub fn open_inode(&mut self, inode: u32) -> KernelResult<usize> {
        let fd = (STD_FILES..MAX_FILES)
            .find(|fd| self.rows[*fd].is_none())
            .ok_or(KernelError::TooManyOpenFiles)?;
        self.rows[fd] = Some(FileRow {
            backing: Backing::Inode(inode),
            access: AccessMode::READ | AccessMode::WRITE,
            refs: 1,
        });
        return Ok(fd);
    }

    pub fn has_free_row(&self) -> bool {
        self.rows[STD_FILES..].iter().any(|r| r.is_none())
    }

    pub fn find_inode(&self, inode: u32) -> Option<usize> {
        self.rows
            .iter()
            .position(|r| matches!(r, Some(row) if row.backing == Backing::Inode(inode)))
    }

    pub fn retain(&mut self, fd: usize) -> KernelResult<()> {
        if fd < STD_FILES {
            self.get(fd)?;
            return Ok(());
        }
        let row = self
            .rows
            .get_mut(fd)
            .and_then(|r| r.as_mut())
            .ok_or(KernelError::InvalidDescriptor)?;
        row.refs += 1;
        Ok(())
    }

    // drop one reference, the row is freed with the last one
    pub fn release(&mut self, fd: usize) -> KernelResult<()> {
        if fd < STD_FILES {
            self.get(fd)?;
            return Ok(());
        }
        let slot = self.rows.get_mut(fd).ok_or(KernelError::InvalidDescriptor)?;
        let row = slot.as_mut().ok_or(KernelError::InvalidDescriptor)?;
        row.refs = row.refs.saturating_sub(1);
        if row.refs == 0 {
            *slot = None;
        }
        Ok(())
    }

    // drop every row backed by a removed inode
    pub fn invalidate_inode(&mut self, inode: u32) -> Vec<usize> {
        let mut dropped = Vec::new();
        for (fd, slot) in self.rows.iter_mut().enumerate() {
            if matches!(slot, Some(row) if row.backing == Backing::Inode(inode)) {
                *slot = None;
                dropped.push(fd);
            }
        }
        dropped
    }

    pub fn open_rows(&self) -> usize {
        self.rows.iter().filter(|r| r.is_some()).count()
    }
}

impl Default for FileTable {
    fn default() -> Self {
        Self::new()
    }
}
