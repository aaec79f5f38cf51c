use super::Flow;
use crate::config::KILL_ALL;
use crate::error::{KernelError, KernelResult};
use crate::kernel::Kernel;
use crate::mem::{copy_within, write_u32};
use crate::proc::pid::Pid;
use crate::trap::context::TrapContext;
use alloc::string::String;
use alloc::vec::Vec;
use core::convert::TryFrom;
use log::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
    Term,
    Quit,
}

impl TryFrom<u32> for Signal {
    type Error = KernelError;

    fn try_from(sig: u32) -> Result<Self, Self::Error> {
        match sig {
            0 => Ok(Signal::Term),
            1 => Ok(Signal::Quit),
            _ => Err(KernelError::InvalidArgument),
        }
    }
}

impl Kernel {
    pub fn sys_yield(&mut self) -> KernelResult<Flow> {
        return Ok(Flow::Reschedule(0));
    }

    pub fn sys_fork(&mut self, ctx: &mut TrapContext) -> KernelResult<Flow> {
        let parent = self.scheduler.current()?;
        let parent_pid = parent.pid;
        let name = parent.name.clone();
        let entry = parent.entry_point;
        let used = parent
            .stack_top
            .checked_sub(ctx.sp)
            .filter(|used| *used <= self.config.stack_size)
            .ok_or(KernelError::BadAddress)?;
        let fd_table = parent.fd_table;
        let cwd = parent.cwd.clone();

        let child = self.scheduler.procs.create(&name, entry, Some(parent_pid))?;
        let child_top = self.scheduler.procs.find(child)?.stack_top;
        let copied = child_top
            .checked_sub(used)
            .ok_or(KernelError::BadAddress)
            .and_then(|child_sp| {
                copy_within(self.devices.memory.as_ref(), ctx.sp, child_sp, used as usize)?;
                Ok(child_sp)
            });
        let child_sp = match copied {
            Ok(sp) => sp,
            Err(e) => {
                self.scheduler.terminate(child)?;
                return Err(e);
            }
        };
        for (i, row) in fd_table.iter().enumerate() {
            if let Some(row) = row {
                if let Err(e) = self.files.retain(*row) {
                    // undo the references taken so far
                    for taken in fd_table[..i].iter().flatten() {
                        self.files.release(*taken)?;
                    }
                    self.scheduler.terminate(child)?;
                    return Err(e);
                }
            }
        }
        let pcb = self.scheduler.procs.find_mut(child)?;
        pcb.context = *ctx;
        pcb.context.sp = child_sp;
        pcb.context.set_ret(0);
        pcb.fd_table = fd_table;
        pcb.next_fd = fd_table.iter().position(|r| r.is_none());
        pcb.cwd = cwd;
        self.scheduler.make_ready(child)?;
        info!("proc: {} forked {}", parent_pid, child);
        return Ok(Flow::Resume(child.0 as u32));
    }

    pub fn sys_exit(&mut self, status: i32) -> KernelResult<Flow> {
        let pid = self.scheduler.current()?.pid;
        info!("proc: {} exited with status {}", pid, status);
        self.terminate(pid)?;
        return Ok(Flow::Reschedule(0));
    }

    // restart the caller at `entry` on an empty stack
    pub fn sys_exec(&mut self, ctx: &mut TrapContext, entry: u32) -> KernelResult<Flow> {
        let pcb = self.scheduler.current_mut()?;
        pcb.entry_point = entry;
        ctx.pc = entry;
        ctx.sp = pcb.stack_top;
        return Ok(Flow::Keep);
    }

    pub fn sys_kill(&mut self, target: i32, signal: u32) -> KernelResult<Flow> {
        let signal = Signal::try_from(signal)?;
        let running = self.scheduler.running();
        let victims: Vec<Pid> = if target == KILL_ALL {
            self.scheduler
                .procs
                .pids()
                .into_iter()
                .filter(|pid| *pid != self.console_pid)
                .collect()
        } else {
            let pid = Pid(usize::try_from(target).map_err(|_| KernelError::NoSuchProcess)?);
            if !self.scheduler.procs.contains(pid) {
                return Err(KernelError::NoSuchProcess);
            }
            alloc::vec![pid]
        };
        for pid in victims.iter() {
            info!("proc: {} killed by {:?}", pid, signal);
            self.terminate(*pid)?;
        }
        if running.map_or(false, |pid| victims.contains(&pid)) {
            return Ok(Flow::Reschedule(0));
        }
        return Ok(Flow::Resume(0));
    }

    pub fn sys_nice(&mut self, pid: u32, priority: u32) -> KernelResult<Flow> {
        self.scheduler
            .set_priority(Pid(pid as usize), priority as usize)?;
        return Ok(Flow::Resume(0));
    }

    // Scratch area layout: name pointers, then pids, then the
    // NUL-terminated names. r0 = pointers, r1 = pids, r2 = count.
    pub fn sys_list_procs(&mut self, ctx: &mut TrapContext) -> KernelResult<Flow> {
        let scratch = self.scheduler.current()?.scratch;
        let limit = self.config.scratch_size;
        let entries: Vec<(Pid, String)> = self
            .scheduler
            .procs
            .iter()
            .map(|p| (p.pid, p.name.clone()))
            .collect();
        let count = entries.len() as u32;
        let ptrs = scratch;
        let ids = ptrs + 4 * count;
        let mut name_at = ids + 4 * count;
        let mem = self.devices.memory.as_ref();
        for (i, (pid, name)) in entries.iter().enumerate() {
            let end = name_at + name.len() as u32 + 1;
            if end > scratch + limit {
                return Err(KernelError::InvalidArgument);
            }
            mem.write(name_at, name.as_bytes())?;
            mem.write(name_at + name.len() as u32, &[0])?;
            write_u32(mem, ptrs + 4 * i as u32, name_at)?;
            write_u32(mem, ids + 4 * i as u32, pid.0 as u32)?;
            name_at = end;
        }
        ctx.gpr[1] = ids;
        ctx.gpr[2] = count;
        return Ok(Flow::Resume(ptrs));
    }
}
