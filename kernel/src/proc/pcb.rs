use super::pid::Pid;
use super::stack::StackSlot;
use crate::config::{MAX_FILES, MAX_PRIORITY};
use crate::error::{KernelError, KernelResult};
use crate::trap::context::TrapContext;
use alloc::string::String;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessState {
    Created,
    Ready,
    Running,
    Waiting,
    Terminated,
}

pub struct ProcessControlBlock {
    pub pid: Pid,
    pub name: String,
    pub state: ProcessState,
    pub priority: usize,
    // ticks left before forced preemption
    pub timeslice: u32,
    pub context: TrapContext,
    pub entry_point: u32,
    pub stack: StackSlot,
    pub stack_top: u32,
    pub scratch: u32,
    pub parent: Option<Pid>,
    // local descriptor -> global file table row
    pub fd_table: [Option<usize>; MAX_FILES],
    // lowest unmapped local descriptor
    pub next_fd: Option<usize>,
    pub cwd: String,
}

impl ProcessControlBlock {
    pub fn new(
        pid: Pid,
        name: &str,
        entry_point: u32,
        stack: StackSlot,
        stack_top: u32,
        scratch: u32,
        parent: Option<Pid>,
    ) -> Self {
        let mut fd_table = [None; MAX_FILES];
        // stdin, stdout, stderr
        for fd in 0..3 {
            fd_table[fd] = Some(fd);
        }
        return Self {
            pid,
            name: String::from(name),
            state: ProcessState::Created,
            priority: MAX_PRIORITY,
            timeslice: 1,
            context: TrapContext::user_context(entry_point, stack_top),
            entry_point,
            stack,
            stack_top,
            scratch,
            parent,
            fd_table,
            next_fd: Some(3),
            cwd: String::from("/"),
        };
    }

    // global row behind local descriptor `fd`
    pub fn row_of(&self, fd: usize) -> KernelResult<usize> {
        self.fd_table
            .get(fd)
            .copied()
            .flatten()
            .ok_or(KernelError::InvalidDescriptor)
    }

    // map the next free local descriptor to `row`
    pub fn install_fd(&mut self, row: usize) -> KernelResult<usize> {
        let fd = self.next_fd.ok_or(KernelError::TooManyOpenFiles)?;
        self.fd_table[fd] = Some(row);
        self.refresh_next_fd();
        return Ok(fd);
    }

    pub fn set_fd(&mut self, fd: usize, row: usize) {
        self.fd_table[fd] = Some(row);
        self.refresh_next_fd();
    }

    // unmap `fd`, returns the row it pointed at
    pub fn clear_fd(&mut self, fd: usize) -> KernelResult<usize> {
        let row = self.row_of(fd)?;
        self.fd_table[fd] = None;
        self.refresh_next_fd();
        return Ok(row);
    }

    // local descriptor already mapped to `row`
    pub fn local_fd_for(&self, row: usize) -> Option<usize> {
        self.fd_table.iter().position(|r| *r == Some(row))
    }

    // unmap every descriptor pointing at one of `rows`
    pub fn drop_rows(&mut self, rows: &[usize]) {
        for slot in self.fd_table.iter_mut() {
            if matches!(slot, Some(row) if rows.contains(row)) {
                *slot = None;
            }
        }
        self.refresh_next_fd();
    }

    fn refresh_next_fd(&mut self) {
        self.next_fd = self.fd_table.iter().position(|r| r.is_none());
    }
}
