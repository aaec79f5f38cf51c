use crate::error::{FsError, FsResult};
use crate::inode::{DiskInode, NAME_LIMIT};
use crate::layout::ROOT_INODE;
use crate::simple_fs::SimpleFileSystem;
use alloc::string::String;
use log::debug;

pub const MAX_PATH: usize = 512;

// Where a path lands. An empty `leaf` means the path names the directory
// itself, otherwise `leaf` is a file inside `dir`, existing or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub dir: DiskInode,
    pub dir_id: u32,
    pub leaf: String,
}

impl Resolved {
    pub fn is_dir(&self) -> bool {
        self.leaf.is_empty()
    }
}

// join `path` onto `cwd`, result is absolute and normalised
pub fn join(cwd: &str, path: &str) -> FsResult<String> {
    let mut result = String::from("/");
    let base = if path.starts_with('/') { "" } else { cwd };
    for token in base.split('/').chain(path.split('/')) {
        match token {
            "" | "." => continue,
            ".." => pop_segment(&mut result),
            name => {
                if result.len() > 1 {
                    result.push('/');
                }
                result.push_str(name);
            }
        }
        if result.len() > MAX_PATH {
            return Err(FsError::InvalidPath);
        }
    }
    return Ok(result);
}

// drop the last segment, the root stays
fn pop_segment(path: &mut String) {
    match path.rfind('/') {
        Some(0) | None => path.truncate(1),
        Some(idx) => path.truncate(idx),
    }
}

// walk `path` from the root directory
pub fn resolve(fs: &SimpleFileSystem, cwd: &str, path: &str) -> FsResult<Resolved> {
    let joined = join(cwd, path)?;
    let mut dir_id = ROOT_INODE;
    let mut dir = fs.read_inode(ROOT_INODE)?;
    let mut tokens = joined.split('/').filter(|t| !t.is_empty()).peekable();
    while let Some(token) = tokens.next() {
        if token.len() > NAME_LIMIT {
            return Err(FsError::InvalidPath);
        }
        let last = tokens.peek().is_none();
        match fs.find_entry(&dir, token)? {
            Some((_, _, entry)) if entry.is_dir() => {
                dir_id = entry.inode_id;
                dir = fs.read_inode(dir_id)?;
            }
            Some(_) | None if last => {
                return Ok(Resolved {
                    dir,
                    dir_id,
                    leaf: String::from(token),
                });
            }
            Some(_) => return Err(FsError::NotDirectory),
            None => {
                debug!("path: {} not found in {}", token, joined);
                return Err(FsError::NotFound);
            }
        }
    }
    return Ok(Resolved {
        dir,
        dir_id,
        leaf: String::new(),
    });
}
