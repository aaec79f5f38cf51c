use super::Flow;
use crate::error::KernelResult;
use crate::kernel::Kernel;
use log::debug;

impl Kernel {
    pub fn sys_sem_init(&mut self, value: u32) -> KernelResult<Flow> {
        let handle = self.semaphores.init(value)?;
        return Ok(Flow::Resume(handle as u32));
    }

    pub fn sys_sem_close(&mut self, handle: u32) -> KernelResult<Flow> {
        self.semaphores.close(handle as usize)?;
        return Ok(Flow::Resume(0));
    }

    // a blocked caller sees r0 = 0 once a post wakes it
    pub fn sys_sem_wait(&mut self, handle: u32) -> KernelResult<Flow> {
        let pid = self.scheduler.current()?.pid;
        if !self.semaphores.wait(handle as usize, pid)? {
            return Ok(Flow::Resume(0));
        }
        self.scheduler.block_running()?;
        debug!("sync: {} waits on semaphore {}", pid, handle);
        return Ok(Flow::Reschedule(0));
    }

    pub fn sys_sem_post(&mut self, handle: u32) -> KernelResult<Flow> {
        if let Some(pid) = self.semaphores.post(handle as usize)? {
            debug!("sync: semaphore {} wakes {}", handle, pid);
            self.scheduler.wake(pid)?;
        }
        return Ok(Flow::Resume(0));
    }
}
