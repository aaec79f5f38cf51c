use super::Flow;
use crate::config::MAX_PATH;
use crate::error::{KernelError, KernelResult};
use crate::fs::inode::{read_into_user, write_from_user};
use crate::fs::{AccessMode, Backing};
use crate::kernel::Kernel;
use crate::mem::read_cstr;
use alloc::string::String;
use log::{debug, warn};
use simplefs::path::{self, Resolved};
use simplefs::FsError;

impl Kernel {
    pub fn sys_write(&mut self, fd: u32, buf: u32, len: u32) -> KernelResult<Flow> {
        let row = *self.files.get(self.scheduler.current()?.row_of(fd as usize)?)?;
        if !row.access.contains(AccessMode::WRITE) {
            return Err(KernelError::AccessDenied);
        }
        let written = match row.backing {
            Backing::Device(dev) => dev.write_from_user(&self.devices, buf, len as usize)?,
            Backing::Inode(inode) => write_from_user(
                &self.fs,
                self.devices.memory.as_ref(),
                inode,
                buf,
                len as usize,
            )?,
        };
        return Ok(Flow::Resume(written as u32));
    }

    pub fn sys_read(&mut self, fd: u32, buf: u32, len: u32) -> KernelResult<Flow> {
        let row = *self.files.get(self.scheduler.current()?.row_of(fd as usize)?)?;
        if !row.access.contains(AccessMode::READ) {
            return Err(KernelError::AccessDenied);
        }
        let read = match row.backing {
            Backing::Device(dev) => dev.read_into_user(&self.devices, buf, len as usize)?,
            Backing::Inode(inode) => read_into_user(
                &self.fs,
                self.devices.memory.as_ref(),
                inode,
                buf,
                len as usize,
            )?,
        };
        return Ok(Flow::Resume(read as u32));
    }

    pub fn sys_open(&mut self, path_ptr: u32) -> KernelResult<Flow> {
        let target = self.resolve_user_path(path_ptr)?;
        if target.is_dir() {
            return Err(FsError::IsDirectory.into());
        }
        let existing = match self.fs.find_entry(&target.dir, &target.leaf)? {
            Some((_, _, entry)) if entry.is_dir() => return Err(FsError::IsDirectory.into()),
            Some((_, _, entry)) => Some(entry.inode_id),
            None => None,
        };
        let shared = existing.and_then(|inode| self.files.find_inode(inode));
        let pcb = self.scheduler.current_mut()?;
        // an existing descriptor of the caller wins, then a shared row
        if let Some(row) = shared {
            if let Some(fd) = pcb.local_fd_for(row) {
                return Ok(Flow::Resume(fd as u32));
            }
        }
        // both tables must have room before the file is created on disk
        if pcb.next_fd.is_none() || (shared.is_none() && !self.files.has_free_row()) {
            return Err(KernelError::TooManyOpenFiles);
        }
        let inode = match existing {
            Some(inode) => inode,
            None => self.fs.open(target.dir_id, &target.dir, &target.leaf)?,
        };
        let row = match shared {
            Some(row) => {
                self.files.retain(row)?;
                row
            }
            None => self.files.open_inode(inode)?,
        };
        let fd = pcb.install_fd(row)?;
        debug!("fs: {} opened inode {} as {} (row {})", pcb.pid, inode, fd, row);
        return Ok(Flow::Resume(fd as u32));
    }

    pub fn sys_close(&mut self, fd: u32) -> KernelResult<Flow> {
        let row = self.scheduler.current_mut()?.clear_fd(fd as usize)?;
        self.files.release(row)?;
        return Ok(Flow::Resume(0));
    }

    pub fn sys_remove(&mut self, path_ptr: u32) -> KernelResult<Flow> {
        let target = self.resolve_user_path(path_ptr)?;
        if target.is_dir() {
            return Err(FsError::IsDirectory.into());
        }
        let inode = self.fs.remove(target.dir_id, &target.dir, &target.leaf)?;
        let rows = self.files.invalidate_inode(inode);
        if !rows.is_empty() {
            for pcb in self.scheduler.procs.iter_mut() {
                pcb.drop_rows(&rows);
            }
        }
        return Ok(Flow::Resume(0));
    }

    pub fn sys_mkdir(&mut self, path_ptr: u32) -> KernelResult<Flow> {
        let target = self.resolve_user_path(path_ptr)?;
        if target.is_dir() {
            return Err(FsError::AlreadyExists.into());
        }
        self.fs.mkdir(target.dir_id, &target.dir, &target.leaf)?;
        return Ok(Flow::Resume(0));
    }

    pub fn sys_rmdir(&mut self, path_ptr: u32) -> KernelResult<Flow> {
        let target = self.resolve_user_dir(path_ptr)?;
        self.fs.rmdir(target.dir_id, &target.dir)?;
        return Ok(Flow::Resume(0));
    }

    pub fn sys_chdir(&mut self, path_ptr: u32) -> KernelResult<Flow> {
        self.resolve_user_dir(path_ptr)?;
        let rel = read_cstr(self.devices.memory.as_ref(), path_ptr, MAX_PATH)?;
        let pcb = self.scheduler.current_mut()?;
        pcb.cwd = path::join(&pcb.cwd, &rel)?;
        return Ok(Flow::Resume(0));
    }

    // cwd goes to the caller's scratch area, r0 points at it
    pub fn sys_getcwd(&mut self) -> KernelResult<Flow> {
        let pcb = self.scheduler.current()?;
        if pcb.cwd.len() + 1 > self.config.scratch_size as usize {
            return Err(KernelError::InvalidArgument);
        }
        let mem = self.devices.memory.as_ref();
        mem.write(pcb.scratch, pcb.cwd.as_bytes())?;
        mem.write(pcb.scratch + pcb.cwd.len() as u32, &[0])?;
        return Ok(Flow::Resume(pcb.scratch));
    }

    // one name per line on the console, `.` and `..` first
    pub fn sys_listdir(&mut self, path_ptr: u32) -> KernelResult<Flow> {
        let target = self.resolve_user_dir(path_ptr)?;
        let entries = self.fs.list(&target.dir)?;
        let console = self.devices.console.as_ref();
        console.puts(b".\n..\n");
        for entry in entries.iter() {
            console.puts(entry.name.as_bytes());
            console.putc(b'\n');
        }
        return Ok(Flow::Resume(0));
    }

    fn resolve_user_path(&self, path_ptr: u32) -> KernelResult<Resolved> {
        let path = read_cstr(self.devices.memory.as_ref(), path_ptr, MAX_PATH)?;
        let cwd: &String = &self.scheduler.current()?.cwd;
        match path::resolve(&self.fs, cwd, &path) {
            Ok(target) => Ok(target),
            Err(e) => {
                warn!("fs: bad path {}: {}", path, e);
                Err(e.into())
            }
        }
    }

    // the path must name a directory
    fn resolve_user_dir(&self, path_ptr: u32) -> KernelResult<Resolved> {
        let target = self.resolve_user_path(path_ptr)?;
        if target.is_dir() {
            return Ok(target);
        }
        match self.fs.find_entry(&target.dir, &target.leaf)? {
            Some(_) => Err(FsError::NotDirectory.into()),
            None => Err(FsError::NotFound.into()),
        }
    }
}

#[cfg(test)]
mod fs_syscall_tests {
    use super::*;
    use crate::config::{MAX_FILES, STD_FILES};
    use crate::proc::pid::Pid;
    use crate::test_util::*;
    use simplefs::layout::MAX_FILE_SIZE;

    #[test]
    fn test_write_read_file() {
        let mut rig = TestRig::boot();
        let fd = rig.open("/notes");
        rig.mem_bytes(BUF_ADDR, b"hello kernel");
        assert_eq!(rig.svc(SYS_WRITE, &[fd, BUF_ADDR, 12]), 12);
        assert_eq!(rig.svc(SYS_READ, &[fd, BUF_ADDR + 0x400, 12]), 12);
        assert_eq!(rig.read_bytes(BUF_ADDR + 0x400, 12), b"hello kernel");
    }

    #[test]
    fn test_max_file_size() {
        let mut rig = TestRig::boot();
        let fd = rig.open("big");
        let data: alloc::vec::Vec<u8> = (0..MAX_FILE_SIZE).map(|i| (i % 251) as u8).collect();
        rig.mem_bytes(BUF_ADDR, &data);
        let len = MAX_FILE_SIZE as u32;
        assert_eq!(rig.svc(SYS_WRITE, &[fd, BUF_ADDR, len]), len);
        assert_eq!(rig.svc(SYS_READ, &[fd, BUF_ADDR + 0x1000, len]), len);
        assert_eq!(rig.read_bytes(BUF_ADDR + 0x1000, MAX_FILE_SIZE), data);
        assert_eq!(
            rig.svc_err(SYS_WRITE, &[fd, BUF_ADDR, len + 1]),
            KernelError::Fs(FsError::OversizedTransfer)
        );
        assert_eq!(
            rig.svc_err(SYS_READ, &[fd, BUF_ADDR, len + 1]),
            KernelError::Fs(FsError::OversizedTransfer)
        );
        // the failed write left the content alone
        assert_eq!(rig.svc(SYS_READ, &[fd, BUF_ADDR + 0x1000, len]), len);
        assert_eq!(rig.read_bytes(BUF_ADDR + 0x1000, MAX_FILE_SIZE), data);
    }

    #[test]
    fn test_device_rows() {
        let mut rig = TestRig::boot();
        rig.mem_bytes(BUF_ADDR, b"prompt$ ");
        // the console's fd 1 is console-out
        assert_eq!(rig.svc(SYS_WRITE, &[1, BUF_ADDR, 8]), 8);
        assert_eq!(rig.console.output(), "prompt$ ");
        assert_eq!(rig.svc(SYS_WRITE, &[2, BUF_ADDR, 6]), 6);
        assert_eq!(rig.stdio.output(), "prompt");
        rig.console.feed(b"ps");
        assert_eq!(rig.svc(SYS_READ, &[0, BUF_ADDR, 2]), 2);
        assert_eq!(rig.read_bytes(BUF_ADDR, 2), b"ps");
        assert_eq!(rig.svc_err(SYS_WRITE, &[0, BUF_ADDR, 1]), KernelError::AccessDenied);
        assert_eq!(rig.svc_err(SYS_READ, &[1, BUF_ADDR, 1]), KernelError::AccessDenied);
    }

    #[test]
    fn test_device_rows_reject_huge_lengths() {
        let mut rig = TestRig::boot();
        rig.mem_bytes(BUF_ADDR, b"never printed");
        assert_eq!(rig.svc_err(SYS_WRITE, &[1, BUF_ADDR, u32::MAX]), KernelError::BadAddress);
        assert_eq!(rig.console.output(), "");
        rig.console.feed(b"q");
        assert_eq!(rig.svc_err(SYS_READ, &[0, BUF_ADDR, u32::MAX]), KernelError::BadAddress);
        // the pending input is still there
        assert_eq!(rig.svc(SYS_READ, &[0, BUF_ADDR, 1]), 1);
        assert_eq!(rig.read_bytes(BUF_ADDR, 1), b"q");

        let long = [b'x'; 150];
        rig.mem_bytes(BUF_ADDR, &long);
        assert_eq!(rig.svc(SYS_WRITE, &[1, BUF_ADDR, 150]), 150);
        assert_eq!(rig.console.output().as_bytes(), &long[..]);
    }

    #[test]
    fn test_invalid_descriptors() {
        let mut rig = TestRig::boot();
        for fd in [5, MAX_FILES as u32, 99] {
            assert_eq!(
                rig.svc_err(SYS_WRITE, &[fd, BUF_ADDR, 1]),
                KernelError::InvalidDescriptor
            );
        }
        let fd = rig.open("f");
        assert_eq!(rig.svc(SYS_CLOSE, &[fd]), 0);
        assert_eq!(rig.svc_err(SYS_CLOSE, &[fd]), KernelError::InvalidDescriptor);
        assert_eq!(rig.svc_err(SYS_READ, &[fd, BUF_ADDR, 1]), KernelError::InvalidDescriptor);
    }

    #[test]
    fn test_open_reuses_descriptor() {
        let mut rig = TestRig::boot();
        let a = rig.open("f");
        assert_eq!(rig.open("/f"), a);
        assert_eq!(rig.kernel.files.get(STD_FILES).unwrap().refs, 1);
        assert_eq!(
            rig.svc_err_path(SYS_OPEN, "/"),
            KernelError::Fs(FsError::IsDirectory)
        );
    }

    #[test]
    fn test_fork_shares_descriptors() {
        let mut rig = TestRig::boot();
        let parent = rig.running();
        let fd = rig.open("shared");
        let row = rig.kernel.scheduler.current().unwrap().row_of(fd as usize).unwrap();
        let child = Pid(rig.svc(SYS_FORK, &[]) as usize);
        assert_eq!(rig.kernel.files.get(row).unwrap().refs, 2);
        let child_pcb = rig.kernel.scheduler.procs.find(child).unwrap();
        assert_eq!(child_pcb.row_of(fd as usize), Ok(row));

        // parent writes, child reads through the shared row
        rig.mem_bytes(BUF_ADDR, b"from parent");
        rig.svc(SYS_WRITE, &[fd, BUF_ADDR, 11]);
        rig.svc(SYS_YIELD, &[]);
        assert_eq!(rig.running(), child);
        assert_eq!(rig.svc(SYS_READ, &[fd, BUF_ADDR + 0x100, 11]), 11);
        assert_eq!(rig.read_bytes(BUF_ADDR + 0x100, 11), b"from parent");

        // the row outlives the child's close
        rig.svc(SYS_CLOSE, &[fd]);
        assert_eq!(rig.kernel.files.get(row).unwrap().refs, 1);
        rig.svc(SYS_EXIT, &[0]);
        assert_eq!(rig.running(), parent);
        rig.svc(SYS_CLOSE, &[fd]);
        assert!(rig.kernel.files.get(row).is_err());
    }

    #[test]
    fn test_shared_row_for_second_process() {
        let mut rig = TestRig::boot();
        let child = Pid(rig.svc(SYS_FORK, &[]) as usize);
        let fd = rig.open("log");
        rig.svc(SYS_YIELD, &[]);
        assert_eq!(rig.running(), child);
        // the child never inherited it, yet shares the global row
        let child_fd = rig.open("log");
        assert_eq!(child_fd, fd);
        assert_eq!(rig.kernel.files.get(STD_FILES).unwrap().refs, 2);
        assert_eq!(rig.kernel.files.open_rows(), STD_FILES + 1);
    }

    #[test]
    fn test_too_many_open_files() {
        let mut rig = TestRig::boot();
        // every inode row of the global table taken
        for i in 0..(MAX_FILES - STD_FILES) {
            rig.open(&alloc::format!("f{}", i));
        }
        let image = rig.disk.image();
        assert_eq!(
            rig.svc_err_path(SYS_OPEN, "extra"),
            KernelError::TooManyOpenFiles
        );
        // nothing was created for the refused open
        assert_eq!(rig.disk.image(), image);
        let root = rig.kernel.fs.read_inode(simplefs::layout::ROOT_INODE).unwrap();
        assert!(rig.kernel.fs.find_entry(&root, "extra").unwrap().is_none());
        // an already open file is still reachable
        assert_eq!(rig.open("f0"), 3);
    }

    #[test]
    fn test_full_local_table_creates_nothing() {
        let mut rig = TestRig::boot();
        let pcb = rig.kernel.scheduler.current_mut().unwrap();
        // every local descriptor taken by the console-out row
        for fd in 3..MAX_FILES {
            pcb.set_fd(fd, 3);
        }
        let image = rig.disk.image();
        assert_eq!(
            rig.svc_err_path(SYS_OPEN, "new"),
            KernelError::TooManyOpenFiles
        );
        assert_eq!(rig.disk.image(), image);
    }

    #[test]
    fn test_remove_invalidates_descriptors() {
        let mut rig = TestRig::boot();
        let child = Pid(rig.svc(SYS_FORK, &[]) as usize);
        let fd = rig.open("tmp");
        rig.svc(SYS_YIELD, &[]);
        rig.open("tmp");
        assert_eq!(rig.svc_path(SYS_REMOVE, "/tmp"), 0);
        assert_eq!(rig.svc_err(SYS_READ, &[fd, BUF_ADDR, 1]), KernelError::InvalidDescriptor);
        let child_pcb = rig.kernel.scheduler.procs.find(child).unwrap();
        assert!(child_pcb.row_of(fd as usize).is_err());
        assert_eq!(rig.kernel.files.open_rows(), STD_FILES);
        assert_eq!(
            rig.svc_err_path(SYS_REMOVE, "/tmp"),
            KernelError::Fs(FsError::NotFound)
        );
    }

    #[test]
    fn test_directory_scenario() {
        let mut rig = TestRig::boot();
        assert_eq!(rig.svc_path(SYS_MKDIR, "/a"), 0);
        assert_eq!(rig.svc_path(SYS_MKDIR, "/a/b"), 0);
        assert_eq!(rig.svc_path(SYS_CHDIR, "/a/b"), 0);
        let cwd = rig.svc(SYS_GETCWD, &[]);
        assert_eq!(rig.read_str(cwd), "/a/b");
        assert_eq!(rig.svc_path(SYS_CHDIR, ".."), 0);
        let cwd = rig.svc(SYS_GETCWD, &[]);
        assert_eq!(rig.read_str(cwd), "/a");
        assert_eq!(rig.svc_path(SYS_CHDIR, "../../.."), 0);
        let cwd = rig.svc(SYS_GETCWD, &[]);
        assert_eq!(rig.read_str(cwd), "/");
    }

    #[test]
    fn test_directory_errors_leave_tree_alone() {
        let mut rig = TestRig::boot();
        rig.svc_path(SYS_MKDIR, "/d");
        rig.open("/d/f");
        let image = rig.disk.image();
        assert_eq!(
            rig.svc_err_path(SYS_RMDIR, "/d"),
            KernelError::Fs(FsError::DirectoryNotEmpty)
        );
        assert_eq!(
            rig.svc_err_path(SYS_REMOVE, "/d"),
            KernelError::Fs(FsError::IsDirectory)
        );
        assert_eq!(
            rig.svc_err_path(SYS_MKDIR, "/d"),
            KernelError::Fs(FsError::AlreadyExists)
        );
        assert_eq!(rig.disk.image(), image);
        assert_eq!(
            rig.svc_err_path(SYS_CHDIR, "/d/f"),
            KernelError::Fs(FsError::NotDirectory)
        );
        assert_eq!(
            rig.svc_err_path(SYS_CHDIR, "/nowhere"),
            KernelError::Fs(FsError::NotFound)
        );
        assert_eq!(
            rig.svc_err_path(SYS_OPEN, "/nowhere/f"),
            KernelError::Fs(FsError::NotFound)
        );
        assert_eq!(rig.svc_path(SYS_REMOVE, "/d/f"), 0);
        assert_eq!(rig.svc_path(SYS_RMDIR, "/d"), 0);
    }

    #[test]
    fn test_listdir() {
        let mut rig = TestRig::boot();
        rig.svc_path(SYS_MKDIR, "/bin");
        rig.open("/readme");
        assert_eq!(rig.svc_path(SYS_LISTDIR, "/"), 0);
        assert_eq!(rig.console.output(), ".\n..\nbin\nreadme\n");
    }
}
