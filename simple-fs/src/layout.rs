// Fixed partition of the block device:
// [0, BITMAP_BLOCKS) bitmap | [BITMAP_BLOCKS, +INODES) inodes | [.., +DATA_BLOCKS) data

// one disk block: 64B
pub const BLOCK_SIZE: usize = 64;
pub const BITMAP_BLOCKS: u32 = 32;
pub const INODES: u32 = 128;
pub const DATA_BLOCKS: u32 = 16224;
pub const TOTAL_BLOCKS: u32 = BITMAP_BLOCKS + INODES + DATA_BLOCKS;

// bits managed by one bitmap block
pub const BITS_PER_BMAP_BLOCK: u32 = (BLOCK_SIZE * 8) as u32;

pub const DIRECT_POINTERS: usize = 12;
pub const MAX_FILE_SIZE: usize = DIRECT_POINTERS * BLOCK_SIZE;

// the root directory always owns inode 0 and data block 0
pub const ROOT_INODE: u32 = 0;
pub const ROOT_ENTRY_BLOCK: u32 = 0;

// on-disk sentinel for an unassigned pointer
pub const UNUSED_POINTER: u32 = u32::MAX;

pub type Block = [u8; BLOCK_SIZE];

// which part of the allocation bitmap a claim scans
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocRange {
    Inode,
    Data,
}

impl AllocRange {
    // [first bit, last bit) of the range inside the bitmap
    pub fn bits(&self) -> (u32, u32) {
        match self {
            AllocRange::Inode => (0, INODES),
            AllocRange::Data => (INODES, INODES + DATA_BLOCKS),
        }
    }
}

#[inline]
pub fn inode_device_block(inode_id: u32) -> u32 {
    BITMAP_BLOCKS + inode_id
}

#[inline]
pub fn data_device_block(data_block: u32) -> u32 {
    BITMAP_BLOCKS + INODES + data_block
}
