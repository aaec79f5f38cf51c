use crate::layout::{Block, BLOCK_SIZE, TOTAL_BLOCKS};
use alloc::vec;
use alloc::vec::Vec;
use spin::Mutex;

// block device interface, reads and writes one whole block at a time
pub trait BlockDevice: Send + Sync {
    fn read(&self, block_id: u32, data: &mut Block);
    fn write(&self, block_id: u32, data: &Block);
}

// memory backed block device, the whole disk lives in one heap buffer
pub struct MemBlockDevice {
    blocks: Mutex<Vec<u8>>,
    total_blocks: u32,
}

impl MemBlockDevice {
    pub fn new() -> Self {
        Self::with_blocks(TOTAL_BLOCKS)
    }

    pub fn with_blocks(total_blocks: u32) -> Self {
        Self {
            blocks: Mutex::new(vec![0u8; total_blocks as usize * BLOCK_SIZE]),
            total_blocks,
        }
    }

    // load an existing disk image
    pub fn from_image(image: &[u8]) -> Self {
        let total_blocks = (image.len() / BLOCK_SIZE) as u32;
        let mut blocks = vec![0u8; total_blocks as usize * BLOCK_SIZE];
        let len = blocks.len();
        blocks.copy_from_slice(&image[..len]);
        Self {
            blocks: Mutex::new(blocks),
            total_blocks,
        }
    }

    pub fn image(&self) -> Vec<u8> {
        self.blocks.lock().clone()
    }

    fn range(&self, block_id: u32) -> core::ops::Range<usize> {
        assert!(
            block_id < self.total_blocks,
            "mem blk out of range, blk: {}, total: {}",
            block_id,
            self.total_blocks
        );
        let start = block_id as usize * BLOCK_SIZE;
        start..start + BLOCK_SIZE
    }
}

impl Default for MemBlockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockDevice for MemBlockDevice {
    fn read(&self, block_id: u32, data: &mut Block) {
        let range = self.range(block_id);
        data.copy_from_slice(&self.blocks.lock()[range]);
    }

    fn write(&self, block_id: u32, data: &Block) {
        let range = self.range(block_id);
        self.blocks.lock()[range].copy_from_slice(data);
    }
}
