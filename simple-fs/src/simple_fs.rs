use crate::bitmap::Bitmap;
use crate::block_device::BlockDevice;
use crate::error::{FsError, FsResult};
use crate::inode::{DirEntry, DiskInode, PARENT_SLOT, SELF_SLOT};
use crate::layout::{
    data_device_block, inode_device_block, Block, BLOCK_SIZE, DIRECT_POINTERS, INODES,
    ROOT_ENTRY_BLOCK, ROOT_INODE,
};
use alloc::sync::Arc;
use log::{debug, info};

// Inode and directory entry store on top of a block device. Every access
// is one block read or write, so the device always holds the truth.
pub struct SimpleFileSystem {
    pub block_dev: Arc<dyn BlockDevice>,
    pub bitmap: Bitmap,
}

impl SimpleFileSystem {
    // lay out an empty file system holding only the root directory
    pub fn format(block_dev: Arc<dyn BlockDevice>) -> Self {
        let fs = Self {
            bitmap: Bitmap::new(Arc::clone(&block_dev)),
            block_dev,
        };
        fs.bitmap.clear();
        for inode_id in 0..INODES {
            fs.block_dev
                .write(inode_device_block(inode_id), &[0u8; BLOCK_SIZE]);
        }
        fs.bitmap.try_claim(ROOT_INODE);
        fs.bitmap.try_claim(INODES + ROOT_ENTRY_BLOCK);
        let root = DiskInode::new_dir(ROOT_ENTRY_BLOCK, ROOT_ENTRY_BLOCK);
        fs.write_inode(ROOT_INODE, &root);
        fs.write_dir_entry(ROOT_ENTRY_BLOCK, &DirEntry::root());
        info!("simplefs: formatted, root at inode {}", ROOT_INODE);
        return fs;
    }

    // mount an existing file system
    pub fn mount(block_dev: Arc<dyn BlockDevice>) -> FsResult<Self> {
        let fs = Self {
            bitmap: Bitmap::new(Arc::clone(&block_dev)),
            block_dev,
        };
        let root = fs.read_inode(ROOT_INODE)?;
        if !root.is_dir()
            || !fs.bitmap.is_inode_claimed(ROOT_INODE)
            || !fs.bitmap.is_data_claimed(ROOT_ENTRY_BLOCK)
        {
            return Err(FsError::Corrupted);
        }
        info!("simplefs: mounted");
        return Ok(fs);
    }

    pub fn read_inode(&self, inode_id: u32) -> FsResult<DiskInode> {
        let mut block = [0u8; BLOCK_SIZE];
        self.block_dev.read(inode_device_block(inode_id), &mut block);
        DiskInode::from_block(&block)
    }

    pub fn write_inode(&self, inode_id: u32, inode: &DiskInode) {
        self.block_dev
            .write(inode_device_block(inode_id), &inode.to_block());
    }

    pub fn read_dir_entry(&self, data_block: u32) -> FsResult<DirEntry> {
        DirEntry::from_block(&self.read_data(data_block))
    }

    pub fn write_dir_entry(&self, data_block: u32, entry: &DirEntry) {
        self.write_data(data_block, &entry.to_block());
    }

    pub fn read_data(&self, data_block: u32) -> Block {
        let mut block = [0u8; BLOCK_SIZE];
        self.block_dev.read(data_device_block(data_block), &mut block);
        return block;
    }

    pub fn write_data(&self, data_block: u32, payload: &Block) {
        self.block_dev.write(data_device_block(data_block), payload);
    }

    // Swap the block behind pointer `index` for a freshly claimed one
    // holding `payload`. The inode is persisted in every outcome.
    pub fn replace_pointer(
        &self,
        inode_id: u32,
        inode: &mut DiskInode,
        index: usize,
        payload: &Block,
    ) -> FsResult<u32> {
        if let Some(old) = inode.direct[index].take() {
            self.bitmap.free_data(old);
        }
        let block = match self.bitmap.claim_data() {
            Some(block) => block,
            None => {
                self.write_inode(inode_id, inode);
                return Err(FsError::AllocationExhausted);
            }
        };
        self.write_data(block, payload);
        inode.direct[index] = Some(block);
        self.write_inode(inode_id, inode);
        debug!(
            "simplefs: inode {} pointer {} -> data block {}",
            inode_id, index, block
        );
        return Ok(block);
    }

    // free every pointer from `index` on
    pub fn truncate_from(&self, inode_id: u32, inode: &mut DiskInode, index: usize) {
        let mut changed = false;
        for slot in index..DIRECT_POINTERS {
            if let Some(block) = inode.direct[slot].take() {
                self.bitmap.free_data(block);
                changed = true;
            }
        }
        if changed {
            self.write_inode(inode_id, inode);
        }
    }

    // entry block of a directory's parent, i.e. its `..`
    pub fn parent_entry_block(&self, dir: &DiskInode) -> FsResult<u32> {
        dir.direct[PARENT_SLOT].ok_or(FsError::Corrupted)
    }

    pub fn self_entry_block(&self, dir: &DiskInode) -> FsResult<u32> {
        dir.direct[SELF_SLOT].ok_or(FsError::Corrupted)
    }
}
