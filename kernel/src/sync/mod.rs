pub mod semaphore;

use crate::config::MAX_SEMAPHORES;
use crate::error::{KernelError, KernelResult};
use crate::proc::pid::Pid;
use array_macro::array;
use log::debug;
use semaphore::Semaphore;

// semaphore handles are slot indexes
pub struct SemaphoreTable {
    slots: [Option<Semaphore>; MAX_SEMAPHORES],
}

impl SemaphoreTable {
    pub fn new() -> Self {
        Self {
            slots: array![_ => None; MAX_SEMAPHORES],
        }
    }

    pub fn init(&mut self, value: u32) -> KernelResult<usize> {
        let handle = self
            .slots
            .iter()
            .position(|s| s.is_none())
            .ok_or(KernelError::TooManySemaphores)?;
        self.slots[handle] = Some(Semaphore::new(value));
        debug!("sync: semaphore {} = {}", handle, value);
        return Ok(handle);
    }

    // true when the caller must block
    pub fn wait(&mut self, handle: usize, pid: Pid) -> KernelResult<bool> {
        Ok(self.get_mut(handle)?.wait(pid))
    }

    // pid to wake, if any
    pub fn post(&mut self, handle: usize) -> KernelResult<Option<Pid>> {
        Ok(self.get_mut(handle)?.post())
    }

    pub fn close(&mut self, handle: usize) -> KernelResult<()> {
        if self.get_mut(handle)?.has_waiters() {
            return Err(KernelError::SemaphoreBusy);
        }
        self.slots[handle] = None;
        Ok(())
    }

    // drop a terminated process from every wait queue
    pub fn forget(&mut self, pid: Pid) {
        for sem in self.slots.iter_mut().flatten() {
            sem.forget(pid);
        }
    }

    pub fn get(&self, handle: usize) -> KernelResult<&Semaphore> {
        self.slots
            .get(handle)
            .and_then(|s| s.as_ref())
            .ok_or(KernelError::InvalidArgument)
    }

    fn get_mut(&mut self, handle: usize) -> KernelResult<&mut Semaphore> {
        self.slots
            .get_mut(handle)
            .and_then(|s| s.as_mut())
            .ok_or(KernelError::InvalidArgument)
    }
}

impl Default for SemaphoreTable {
    fn default() -> Self {
        Self::new()
    }
}
