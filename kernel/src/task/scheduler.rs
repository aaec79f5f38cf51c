use super::ready::ReadyQueueSet;
use crate::config::MAX_PRIORITY;
use crate::error::{KernelError, KernelResult};
use crate::proc::pcb::{ProcessControlBlock, ProcessState};
use crate::proc::pid::Pid;
use crate::proc::ProcessTable;
use crate::trap::context::TrapContext;
use log::debug;

// ticks a process may run at `priority`
pub fn timeslice_for(priority: usize) -> u32 {
    1 << (MAX_PRIORITY - priority.min(MAX_PRIORITY))
}

// Multi-level feedback scheduler. A process that burns its whole slice
// drops one level, one that gives the cpu back early rises one level.
pub struct Scheduler {
    pub procs: ProcessTable,
    pub ready: ReadyQueueSet,
    running: Option<Pid>,
    idle_ctx: TrapContext,
}

impl Scheduler {
    pub fn new(procs: ProcessTable, idle_ctx: TrapContext) -> Self {
        Self {
            procs,
            ready: ReadyQueueSet::new(),
            running: None,
            idle_ctx,
        }
    }

    pub fn running(&self) -> Option<Pid> {
        self.running
    }

    // the running pcb, syscalls always have one
    pub fn current(&self) -> KernelResult<&ProcessControlBlock> {
        let pid = self.running.ok_or(KernelError::NoSuchProcess)?;
        self.procs.find(pid)
    }

    pub fn current_mut(&mut self) -> KernelResult<&mut ProcessControlBlock> {
        let pid = self.running.ok_or(KernelError::NoSuchProcess)?;
        self.procs.find_mut(pid)
    }

    // fresh slice for the current priority, then to the back of its queue
    pub fn make_ready(&mut self, pid: Pid) -> KernelResult<()> {
        let pcb = self.procs.find_mut(pid)?;
        pcb.timeslice = timeslice_for(pcb.priority);
        pcb.state = ProcessState::Ready;
        let priority = pcb.priority;
        self.ready.push(pid, priority);
        Ok(())
    }

    // timer interrupt
    pub fn tick(&mut self, ctx: &mut TrapContext) -> KernelResult<()> {
        match self.running {
            Some(pid) => {
                let pcb = self.procs.find_mut(pid)?;
                pcb.timeslice = pcb.timeslice.saturating_sub(1);
                if pcb.timeslice == 0 {
                    self.reschedule(ctx)?;
                }
            }
            None => {
                if !self.ready.is_empty() {
                    self.reschedule(ctx)?;
                }
            }
        }
        Ok(())
    }

    pub fn reschedule(&mut self, ctx: &mut TrapContext) -> KernelResult<()> {
        if let Some(pid) = self.running {
            let pcb = self.procs.find_mut(pid)?;
            if pcb.state == ProcessState::Running {
                if pcb.timeslice == 0 {
                    pcb.priority = pcb.priority.saturating_sub(1);
                } else {
                    pcb.priority = (pcb.priority + 1).min(MAX_PRIORITY);
                }
                self.make_ready(pid)?;
            }
        }
        match self.ready.pop_highest() {
            Some(next) => self.dispatch(ctx, next),
            None => {
                self.enter_idle(ctx);
                Ok(())
            }
        }
    }

    // The only place a context moves between the live trap frame and a
    // pcb: save the outgoing one, load `pid`'s.
    pub fn dispatch(&mut self, ctx: &mut TrapContext, pid: Pid) -> KernelResult<()> {
        if let Some(out) = self.running {
            if let Ok(pcb) = self.procs.find_mut(out) {
                pcb.context = *ctx;
            }
        }
        let pcb = self.procs.find_mut(pid)?;
        *ctx = pcb.context;
        pcb.state = ProcessState::Running;
        debug!(
            "sched: dispatch {} at priority {} for {} ticks",
            pid, pcb.priority, pcb.timeslice
        );
        self.running = Some(pid);
        Ok(())
    }

    fn enter_idle(&mut self, ctx: &mut TrapContext) {
        if let Some(out) = self.running.take() {
            if let Ok(pcb) = self.procs.find_mut(out) {
                pcb.context = *ctx;
            }
        }
        debug!("sched: nothing ready, idle");
        *ctx = self.idle_ctx;
    }

    // running process goes to sleep, the caller reschedules
    pub fn block_running(&mut self) -> KernelResult<Pid> {
        let pcb = self.current_mut()?;
        pcb.state = ProcessState::Waiting;
        Ok(pcb.pid)
    }

    pub fn wake(&mut self, pid: Pid) -> KernelResult<()> {
        let pcb = self.procs.find_mut(pid)?;
        if pcb.state != ProcessState::Waiting {
            return Err(KernelError::InvalidArgument);
        }
        self.make_ready(pid)
    }

    // Change a process's level. A queued process moves to the new level at
    // once, anyone else picks it up at the next make_ready.
    pub fn set_priority(&mut self, pid: Pid, priority: usize) -> KernelResult<()> {
        if priority > MAX_PRIORITY {
            return Err(KernelError::InvalidArgument);
        }
        let pcb = self.procs.find_mut(pid)?;
        pcb.priority = priority;
        if pcb.state == ProcessState::Ready && self.ready.remove(pid) {
            self.make_ready(pid)?;
        }
        Ok(())
    }

    pub fn terminate(&mut self, pid: Pid) -> KernelResult<ProcessControlBlock> {
        if self.running == Some(pid) {
            self.running = None;
        }
        self.procs.destroy(pid, &mut self.ready)
    }
}
