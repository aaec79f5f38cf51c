use super::error::{FsError, FsResult};
use super::layout::{Block, BLOCK_SIZE, DIRECT_POINTERS, UNUSED_POINTER};
use alloc::string::String;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InodeType {
    Directory,
    Data,
}

impl InodeType {
    pub fn tag(&self) -> u32 {
        match self {
            InodeType::Directory => 0,
            InodeType::Data => 1,
        }
    }

    pub fn from_tag(tag: u32) -> FsResult<Self> {
        match tag {
            0 => Ok(InodeType::Directory),
            1 => Ok(InodeType::Data),
            _ => Err(FsError::Corrupted),
        }
    }
}

// directory slots: own entry, parent entry, then children
pub const SELF_SLOT: usize = 0;
pub const PARENT_SLOT: usize = 1;
pub const FIRST_CHILD_SLOT: usize = 2;

// one inode per block: u32 type tag followed by 12 u32 pointers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiskInode {
    pub inode_type: InodeType,
    pub direct: [Option<u32>; DIRECT_POINTERS],
}

impl DiskInode {
    pub fn new(inode_type: InodeType) -> Self {
        return Self {
            inode_type,
            direct: [None; DIRECT_POINTERS],
        };
    }

    // a directory whose `.` is `self_entry` and `..` is `parent_entry`
    pub fn new_dir(self_entry: u32, parent_entry: u32) -> Self {
        let mut inode = Self::new(InodeType::Directory);
        inode.direct[SELF_SLOT] = Some(self_entry);
        inode.direct[PARENT_SLOT] = Some(parent_entry);
        return inode;
    }

    pub fn is_dir(&self) -> bool {
        return self.inode_type == InodeType::Directory;
    }

    // first free child slot of a directory
    pub fn free_child_slot(&self) -> Option<usize> {
        (FIRST_CHILD_SLOT..DIRECT_POINTERS).find(|slot| self.direct[*slot].is_none())
    }

    pub fn has_children(&self) -> bool {
        self.direct[FIRST_CHILD_SLOT..].iter().any(|p| p.is_some())
    }

    // assigned pointers of a data inode, in file order
    pub fn data_blocks(&self) -> impl Iterator<Item = u32> + '_ {
        self.direct.iter().map_while(|p| *p)
    }

    pub fn to_block(&self) -> Block {
        let mut block = [0u8; BLOCK_SIZE];
        block[0..4].copy_from_slice(&self.inode_type.tag().to_le_bytes());
        for (i, ptr) in self.direct.iter().enumerate() {
            let raw = ptr.unwrap_or(UNUSED_POINTER);
            block[4 + 4 * i..8 + 4 * i].copy_from_slice(&raw.to_le_bytes());
        }
        return block;
    }

    pub fn from_block(block: &Block) -> FsResult<Self> {
        let inode_type = InodeType::from_tag(read_u32(block, 0))?;
        let mut direct = [None; DIRECT_POINTERS];
        for (i, ptr) in direct.iter_mut().enumerate() {
            let raw = read_u32(block, 4 + 4 * i);
            if raw != UNUSED_POINTER {
                *ptr = Some(raw);
            }
        }
        return Ok(Self { inode_type, direct });
    }
}

// name bytes available in one entry block, one byte kept for the terminator
pub const NAME_LIMIT: usize = BLOCK_SIZE - 5 - 1;
const NAME_OFFSET: usize = 5;

// u32 inode id, u8 type tag, NUL padded name
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    pub inode_id: u32,
    pub entry_type: InodeType,
    pub name: String,
}

impl DirEntry {
    pub fn new(name: &str, inode_id: u32, entry_type: InodeType) -> FsResult<Self> {
        check_name(name)?;
        return Ok(Self {
            inode_id,
            entry_type,
            name: String::from(name),
        });
    }

    // the root entry is the only one named "/"
    pub fn root() -> Self {
        Self {
            inode_id: 0,
            entry_type: InodeType::Directory,
            name: String::from("/"),
        }
    }

    pub fn is_dir(&self) -> bool {
        return self.entry_type == InodeType::Directory;
    }

    pub fn to_block(&self) -> Block {
        let mut block = [0u8; BLOCK_SIZE];
        block[0..4].copy_from_slice(&self.inode_id.to_le_bytes());
        block[4] = self.entry_type.tag() as u8;
        let name = self.name.as_bytes();
        block[NAME_OFFSET..NAME_OFFSET + name.len()].copy_from_slice(name);
        return block;
    }

    pub fn from_block(block: &Block) -> FsResult<Self> {
        let inode_id = read_u32(block, 0);
        let entry_type = InodeType::from_tag(block[4] as u32)?;
        let raw = &block[NAME_OFFSET..];
        let len = raw.iter().position(|b| *b == 0).unwrap_or(raw.len());
        let name = core::str::from_utf8(&raw[..len]).map_err(|_| FsError::Corrupted)?;
        return Ok(Self {
            inode_id,
            entry_type,
            name: String::from(name),
        });
    }
}

// a valid path component
pub fn check_name(name: &str) -> FsResult<()> {
    if name.is_empty() || name.len() > NAME_LIMIT {
        return Err(FsError::InvalidPath);
    }
    if name == "." || name == ".." || name.contains('/') || name.contains('\0') {
        return Err(FsError::InvalidPath);
    }
    return Ok(());
}

fn read_u32(block: &Block, offset: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&block[offset..offset + 4]);
    u32::from_le_bytes(bytes)
}
