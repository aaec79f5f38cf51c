pub mod fs;
pub mod proc;
pub mod sync;

use crate::error::{KernelError, KernelResult};
use crate::kernel::Kernel;
use crate::trap::context::TrapContext;
use core::convert::TryFrom;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Syscall {
    Yield,
    Write,
    Read,
    Fork,
    Exit,
    Exec,
    Kill,
    Nice,
    SemInit,
    SemClose,
    SemWait,
    SemPost,
    ListProcs,
    Open,
    Close,
    Remove,
    Mkdir,
    Rmdir,
    Chdir,
    Getcwd,
    Listdir,
}

const SYSCALL_YIELD: u32 = 0x00;
const SYSCALL_WRITE: u32 = 0x01;
const SYSCALL_READ: u32 = 0x02;
const SYSCALL_FORK: u32 = 0x03;
const SYSCALL_EXIT: u32 = 0x04;
const SYSCALL_EXEC: u32 = 0x05;
const SYSCALL_KILL: u32 = 0x06;
const SYSCALL_NICE: u32 = 0x07;
const SYSCALL_SEM_INIT: u32 = 0x08;
const SYSCALL_SEM_CLOSE: u32 = 0x09;
const SYSCALL_SEM_WAIT: u32 = 0x0A;
const SYSCALL_SEM_POST: u32 = 0x0B;
const SYSCALL_LIST_PROCS: u32 = 0x10;
const SYSCALL_OPEN: u32 = 0x11;
const SYSCALL_CLOSE: u32 = 0x12;
const SYSCALL_REMOVE: u32 = 0x13;
const SYSCALL_MKDIR: u32 = 0x14;
const SYSCALL_RMDIR: u32 = 0x15;
const SYSCALL_CHDIR: u32 = 0x16;
const SYSCALL_GETCWD: u32 = 0x17;
const SYSCALL_LISTDIR: u32 = 0x18;

impl TryFrom<u32> for Syscall {
    type Error = KernelError;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        let call = match id {
            SYSCALL_YIELD => Syscall::Yield,
            SYSCALL_WRITE => Syscall::Write,
            SYSCALL_READ => Syscall::Read,
            SYSCALL_FORK => Syscall::Fork,
            SYSCALL_EXIT => Syscall::Exit,
            SYSCALL_EXEC => Syscall::Exec,
            SYSCALL_KILL => Syscall::Kill,
            SYSCALL_NICE => Syscall::Nice,
            SYSCALL_SEM_INIT => Syscall::SemInit,
            SYSCALL_SEM_CLOSE => Syscall::SemClose,
            SYSCALL_SEM_WAIT => Syscall::SemWait,
            SYSCALL_SEM_POST => Syscall::SemPost,
            SYSCALL_LIST_PROCS => Syscall::ListProcs,
            SYSCALL_OPEN => Syscall::Open,
            SYSCALL_CLOSE => Syscall::Close,
            SYSCALL_REMOVE => Syscall::Remove,
            SYSCALL_MKDIR => Syscall::Mkdir,
            SYSCALL_RMDIR => Syscall::Rmdir,
            SYSCALL_CHDIR => Syscall::Chdir,
            SYSCALL_GETCWD => Syscall::Getcwd,
            SYSCALL_LISTDIR => Syscall::Listdir,
            _ => return Err(KernelError::InvalidSyscall),
        };
        return Ok(call);
    }
}

// What the router does with the trapped registers once a handler returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    // r0 = value, back to the caller
    Resume(u32),
    // r0 = value, then pick the next process
    Reschedule(u32),
    // the handler already set every register
    Keep,
}

impl Kernel {
    pub fn dispatch_syscall(&mut self, call: Syscall, ctx: &mut TrapContext) -> KernelResult<Flow> {
        let args = [ctx.arg(0), ctx.arg(1), ctx.arg(2)];
        match call {
            Syscall::Yield => self.sys_yield(),
            Syscall::Write => self.sys_write(args[0], args[1], args[2]),
            Syscall::Read => self.sys_read(args[0], args[1], args[2]),
            Syscall::Fork => self.sys_fork(ctx),
            Syscall::Exit => self.sys_exit(args[0] as i32),
            Syscall::Exec => self.sys_exec(ctx, args[0]),
            Syscall::Kill => self.sys_kill(args[0] as i32, args[1]),
            Syscall::Nice => self.sys_nice(args[0], args[1]),
            Syscall::SemInit => self.sys_sem_init(args[0]),
            Syscall::SemClose => self.sys_sem_close(args[0]),
            Syscall::SemWait => self.sys_sem_wait(args[0]),
            Syscall::SemPost => self.sys_sem_post(args[0]),
            Syscall::ListProcs => self.sys_list_procs(ctx),
            Syscall::Open => self.sys_open(args[0]),
            Syscall::Close => self.sys_close(args[0]),
            Syscall::Remove => self.sys_remove(args[0]),
            Syscall::Mkdir => self.sys_mkdir(args[0]),
            Syscall::Rmdir => self.sys_rmdir(args[0]),
            Syscall::Chdir => self.sys_chdir(args[0]),
            Syscall::Getcwd => self.sys_getcwd(),
            Syscall::Listdir => self.sys_listdir(args[0]),
        }
    }
}
