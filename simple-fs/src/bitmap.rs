use super::block_device::BlockDevice;
use super::layout::{AllocRange, Block, BITMAP_BLOCKS, BITS_PER_BMAP_BLOCK, BLOCK_SIZE, INODES};
use alloc::sync::Arc;
use log::debug;

const WORDS_PER_BMAP_BLOCK: usize = BLOCK_SIZE / 8;

// One bit per allocatable block. Bit k covers inode k when k < INODES and
// data block k - INODES otherwise. Bitmap blocks are read and written back
// on every call, nothing is cached.
pub struct Bitmap {
    block_dev: Arc<dyn BlockDevice>,
}

impl Bitmap {
    pub fn new(block_dev: Arc<dyn BlockDevice>) -> Self {
        return Self { block_dev };
    }

    // test-and-set; false if the bit was already set
    pub fn try_claim(&self, bit: u32) -> bool {
        let (bmap_block, byte, offset) = decompose(bit);
        let mut block = self.read_bmap(bmap_block);
        if block[byte] & (1 << offset) != 0 {
            return false;
        }
        block[byte] |= 1 << offset;
        self.block_dev.write(bmap_block, &block);
        return true;
    }

    // clears the bit, freeing a free block is a no-op
    pub fn free(&self, bit: u32) {
        let (bmap_block, byte, offset) = decompose(bit);
        let mut block = self.read_bmap(bmap_block);
        if block[byte] & (1 << offset) == 0 {
            return;
        }
        block[byte] &= !(1 << offset);
        self.block_dev.write(bmap_block, &block);
    }

    pub fn is_claimed(&self, bit: u32) -> bool {
        let (bmap_block, byte, offset) = decompose(bit);
        return self.read_bmap(bmap_block)[byte] & (1 << offset) != 0;
    }

    // first-fit scan over one range, returns the id relative to the range
    pub fn claim_first_free(&self, range: AllocRange) -> Option<u32> {
        let (start, end) = range.bits();
        let first_bmap = start / BITS_PER_BMAP_BLOCK;
        let last_bmap = (end - 1) / BITS_PER_BMAP_BLOCK;
        for bmap_block in first_bmap..=last_bmap {
            let mut block = self.read_bmap(bmap_block);
            let base = bmap_block * BITS_PER_BMAP_BLOCK;
            let found = (0..WORDS_PER_BMAP_BLOCK).find_map(|idx| {
                let word_base = base + idx as u32 * 64;
                // bits outside the range count as taken
                let word = read_word(&block, idx) | outside_mask(word_base, start, end);
                if word == u64::MAX {
                    return None;
                }
                let offset = word.trailing_ones();
                return Some((idx, offset));
            });
            if let Some((idx, offset)) = found {
                let mut word = read_word(&block, idx);
                word |= 1u64 << offset;
                write_word(&mut block, idx, word);
                self.block_dev.write(bmap_block, &block);
                let bit = base + idx as u32 * 64 + offset;
                debug!("bitmap: claimed bit {} in {:?} range", bit, range);
                return Some(bit - start);
            }
        }
        None
    }

    pub fn claim_inode(&self) -> Option<u32> {
        self.claim_first_free(AllocRange::Inode)
    }

    pub fn claim_data(&self) -> Option<u32> {
        self.claim_first_free(AllocRange::Data)
    }

    pub fn free_inode(&self, inode_id: u32) {
        self.free(inode_id);
    }

    pub fn free_data(&self, data_block: u32) {
        self.free(INODES + data_block);
    }

    pub fn is_data_claimed(&self, data_block: u32) -> bool {
        self.is_claimed(INODES + data_block)
    }

    pub fn is_inode_claimed(&self, inode_id: u32) -> bool {
        self.is_claimed(inode_id)
    }

    // number of set bits in a range
    pub fn count_claimed(&self, range: AllocRange) -> u32 {
        let (start, end) = range.bits();
        (start..end).filter(|bit| self.is_claimed(*bit)).count() as u32
    }

    // zero every bitmap block
    pub fn clear(&self) {
        for bmap_block in 0..BITMAP_BLOCKS {
            self.block_dev.write(bmap_block, &[0u8; BLOCK_SIZE]);
        }
    }

    fn read_bmap(&self, bmap_block: u32) -> Block {
        assert!(bmap_block < BITMAP_BLOCKS, "bitmap bit out of range");
        let mut block = [0u8; BLOCK_SIZE];
        self.block_dev.read(bmap_block, &mut block);
        return block;
    }
}

// bit -> (bitmap block, byte in block, bit in byte)
fn decompose(bit: u32) -> (u32, usize, u32) {
    let bmap_block = bit / BITS_PER_BMAP_BLOCK;
    let byte = ((bit % BITS_PER_BMAP_BLOCK) / 8) as usize;
    return (bmap_block, byte, bit % 8);
}

// little-endian words keep the byte/bit addressing of decompose
fn read_word(block: &Block, idx: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&block[idx * 8..idx * 8 + 8]);
    u64::from_le_bytes(bytes)
}

fn write_word(block: &mut Block, idx: usize, word: u64) {
    block[idx * 8..idx * 8 + 8].copy_from_slice(&word.to_le_bytes());
}

fn outside_mask(word_base: u32, start: u32, end: u32) -> u64 {
    let lo = start.saturating_sub(word_base);
    let hi = end.saturating_sub(word_base);
    let inside = ones_below(hi) & !ones_below(lo);
    !inside
}

fn ones_below(n: u32) -> u64 {
    if n >= 64 {
        return u64::MAX;
    }
    (1u64 << n) - 1
}
