use crate::error::{FsError, FsResult};
use crate::inode::{check_name, DirEntry, DiskInode, InodeType, FIRST_CHILD_SLOT};
use crate::layout::{BLOCK_SIZE, DIRECT_POINTERS, MAX_FILE_SIZE, ROOT_INODE};
use crate::simple_fs::SimpleFileSystem;
use alloc::vec::Vec;
use log::{debug, info};

// Directory and whole-file operations. A directory is handed in as the
// (id, inode) pair the path resolver produced.
impl SimpleFileSystem {
    // (slot, entry block, entry) of a child named `name`
    pub fn find_entry(
        &self,
        dir: &DiskInode,
        name: &str,
    ) -> FsResult<Option<(usize, u32, DirEntry)>> {
        for slot in FIRST_CHILD_SLOT..DIRECT_POINTERS {
            if let Some(block) = dir.direct[slot] {
                let entry = self.read_dir_entry(block)?;
                if entry.name == name {
                    return Ok(Some((slot, block, entry)));
                }
            }
        }
        return Ok(None);
    }

    pub fn list(&self, dir: &DiskInode) -> FsResult<Vec<DirEntry>> {
        if !dir.is_dir() {
            return Err(FsError::NotDirectory);
        }
        dir.direct[FIRST_CHILD_SLOT..]
            .iter()
            .flatten()
            .map(|block| self.read_dir_entry(*block))
            .collect()
    }

    // find a data file in `dir` or create an empty one
    pub fn open(&self, dir_id: u32, dir: &DiskInode, name: &str) -> FsResult<u32> {
        check_name(name)?;
        if let Some((_, _, entry)) = self.find_entry(dir, name)? {
            if entry.is_dir() {
                return Err(FsError::IsDirectory);
            }
            return Ok(entry.inode_id);
        }
        let (inode_id, entry_block, slot) = self.claim_child(dir)?;
        self.write_dir_entry(entry_block, &DirEntry::new(name, inode_id, InodeType::Data)?);
        self.write_inode(inode_id, &DiskInode::new(InodeType::Data));
        let mut dir = *dir;
        dir.direct[slot] = Some(entry_block);
        self.write_inode(dir_id, &dir);
        info!("simplefs: created {} as inode {}", name, inode_id);
        return Ok(inode_id);
    }

    pub fn mkdir(&self, parent_id: u32, parent: &DiskInode, name: &str) -> FsResult<u32> {
        check_name(name)?;
        if self.find_entry(parent, name)?.is_some() {
            return Err(FsError::AlreadyExists);
        }
        let parent_entry = self.self_entry_block(parent)?;
        let (inode_id, entry_block, slot) = self.claim_child(parent)?;
        self.write_dir_entry(
            entry_block,
            &DirEntry::new(name, inode_id, InodeType::Directory)?,
        );
        self.write_inode(inode_id, &DiskInode::new_dir(entry_block, parent_entry));
        let mut parent = *parent;
        parent.direct[slot] = Some(entry_block);
        self.write_inode(parent_id, &parent);
        info!("simplefs: mkdir {} as inode {}", name, inode_id);
        return Ok(inode_id);
    }

    // remove an empty directory
    pub fn rmdir(&self, dir_id: u32, dir: &DiskInode) -> FsResult<()> {
        if dir_id == ROOT_INODE {
            return Err(FsError::InvalidPath);
        }
        if !dir.is_dir() {
            return Err(FsError::NotDirectory);
        }
        if dir.has_children() {
            return Err(FsError::DirectoryNotEmpty);
        }
        let own_entry = self.self_entry_block(dir)?;
        let parent_entry = self.read_dir_entry(self.parent_entry_block(dir)?)?;
        let parent_id = parent_entry.inode_id;
        let mut parent = self.read_inode(parent_id)?;
        let slot = (FIRST_CHILD_SLOT..DIRECT_POINTERS)
            .find(|slot| parent.direct[*slot] == Some(own_entry))
            .ok_or(FsError::Corrupted)?;
        parent.direct[slot] = None;
        self.write_inode(parent_id, &parent);
        self.bitmap.free_data(own_entry);
        self.bitmap.free_inode(dir_id);
        debug!("simplefs: rmdir inode {} from inode {}", dir_id, parent_id);
        return Ok(());
    }

    // delete a data file, returns the freed inode id
    pub fn remove(&self, dir_id: u32, dir: &DiskInode, name: &str) -> FsResult<u32> {
        let (slot, entry_block, entry) = self.find_entry(dir, name)?.ok_or(FsError::NotFound)?;
        if entry.is_dir() {
            return Err(FsError::IsDirectory);
        }
        let inode = self.read_inode(entry.inode_id)?;
        for block in inode.direct.iter().flatten() {
            self.bitmap.free_data(*block);
        }
        self.bitmap.free_data(entry_block);
        self.bitmap.free_inode(entry.inode_id);
        let mut dir = *dir;
        dir.direct[slot] = None;
        self.write_inode(dir_id, &dir);
        info!("simplefs: removed {} (inode {})", name, entry.inode_id);
        return Ok(entry.inode_id);
    }

    // replace the whole content of a data file
    pub fn write_file(&self, inode_id: u32, data: &[u8]) -> FsResult<usize> {
        if data.len() > MAX_FILE_SIZE {
            return Err(FsError::OversizedTransfer);
        }
        let mut inode = self.read_inode(inode_id)?;
        if inode.is_dir() {
            return Err(FsError::IsDirectory);
        }
        let mut chunks = 0;
        for (index, chunk) in data.chunks(BLOCK_SIZE).enumerate() {
            // partial tail is zero padded
            let mut payload = [0u8; BLOCK_SIZE];
            payload[..chunk.len()].copy_from_slice(chunk);
            self.replace_pointer(inode_id, &mut inode, index, &payload)?;
            chunks = index + 1;
        }
        self.truncate_from(inode_id, &mut inode, chunks);
        return Ok(data.len());
    }

    pub fn read_file(&self, inode_id: u32, buf: &mut [u8]) -> FsResult<usize> {
        if buf.len() > MAX_FILE_SIZE {
            return Err(FsError::OversizedTransfer);
        }
        let inode = self.read_inode(inode_id)?;
        if inode.is_dir() {
            return Err(FsError::IsDirectory);
        }
        let mut copied = 0;
        for (index, chunk) in buf.chunks_mut(BLOCK_SIZE).enumerate() {
            let block = match inode.direct[index] {
                Some(block) => block,
                None => break,
            };
            let data = self.read_data(block);
            chunk.copy_from_slice(&data[..chunk.len()]);
            copied += chunk.len();
        }
        return Ok(copied);
    }

    // inode, entry block and free slot for a new child, nothing stays
    // claimed on failure
    fn claim_child(&self, dir: &DiskInode) -> FsResult<(u32, u32, usize)> {
        if !dir.is_dir() {
            return Err(FsError::NotDirectory);
        }
        let slot = dir.free_child_slot().ok_or(FsError::DirectoryFull)?;
        let inode_id = self
            .bitmap
            .claim_inode()
            .ok_or(FsError::AllocationExhausted)?;
        let entry_block = match self.bitmap.claim_data() {
            Some(block) => block,
            None => {
                self.bitmap.free_inode(inode_id);
                return Err(FsError::AllocationExhausted);
            }
        };
        return Ok((inode_id, entry_block, slot));
    }

    // the `.` entry of a directory
    pub fn dir_entry_of(&self, dir: &DiskInode) -> FsResult<DirEntry> {
        self.read_dir_entry(self.self_entry_block(dir)?)
    }
}
