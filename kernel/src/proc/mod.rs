pub mod pcb;
pub mod pid;
pub mod stack;

use crate::config::KernelConfig;
use crate::error::{KernelError, KernelResult};
use crate::task::ready::ReadyQueueSet;
use alloc::collections::BTreeMap;
use log::info;
use pcb::{ProcessControlBlock, ProcessState};
use pid::{Pid, PidAllocator};
use stack::StackAllocator;

const MAX_PID: usize = 4096;

// Every PCB in the system, keyed by pid.
pub struct ProcessTable {
    procs: BTreeMap<Pid, ProcessControlBlock>,
    pids: PidAllocator,
    stacks: StackAllocator,
    config: KernelConfig,
}

impl ProcessTable {
    pub fn new(config: &KernelConfig) -> Self {
        return Self {
            procs: BTreeMap::new(),
            pids: PidAllocator::new(0, MAX_PID),
            stacks: StackAllocator::new(config.max_procs),
            config: config.clone(),
        };
    }

    pub fn create(&mut self, name: &str, entry_point: u32, parent: Option<Pid>) -> KernelResult<Pid> {
        let stack = self.stacks.alloc().ok_or(KernelError::ProcessLimit)?;
        let pid = match self.pids.alloc() {
            Some(pid) => pid,
            None => {
                self.stacks.free(stack);
                return Err(KernelError::ProcessLimit);
            }
        };
        let pcb = ProcessControlBlock::new(
            pid,
            name,
            entry_point,
            stack,
            self.config.stack_top(stack.0),
            self.config.scratch_area(stack.0),
            parent,
        );
        info!("proc: created {} \"{}\" in stack slot {}", pid, name, stack.0);
        self.procs.insert(pid, pcb);
        return Ok(pid);
    }

    // take `pid` out of the system and give back its stack and id
    pub fn destroy(&mut self, pid: Pid, ready: &mut ReadyQueueSet) -> KernelResult<ProcessControlBlock> {
        let mut pcb = self.procs.remove(&pid).ok_or(KernelError::NoSuchProcess)?;
        ready.remove(pid);
        self.stacks.free(pcb.stack);
        self.pids.dealloc(pid);
        pcb.state = ProcessState::Terminated;
        return Ok(pcb);
    }

    pub fn find(&self, pid: Pid) -> KernelResult<&ProcessControlBlock> {
        self.procs.get(&pid).ok_or(KernelError::NoSuchProcess)
    }

    pub fn find_mut(&mut self, pid: Pid) -> KernelResult<&mut ProcessControlBlock> {
        self.procs.get_mut(&pid).ok_or(KernelError::NoSuchProcess)
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.procs.contains_key(&pid)
    }

    // in pid order
    pub fn iter(&self) -> impl Iterator<Item = &ProcessControlBlock> {
        self.procs.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ProcessControlBlock> {
        self.procs.values_mut()
    }

    pub fn pids(&self) -> alloc::vec::Vec<Pid> {
        self.procs.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.procs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procs.is_empty()
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }
}
