use crate::proc::pid::Pid;
use alloc::collections::VecDeque;

// counting semaphore, waiters are woken oldest first
pub struct Semaphore {
    count: u32,
    wait_queue: VecDeque<Pid>,
}

impl Semaphore {
    pub fn new(count: u32) -> Self {
        Self {
            count,
            wait_queue: VecDeque::new(),
        }
    }

    // true when `pid` has to sleep
    pub fn wait(&mut self, pid: Pid) -> bool {
        if self.count > 0 {
            self.count -= 1;
            return false;
        }
        self.wait_queue.push_back(pid);
        return true;
    }

    // hands the unit straight to the oldest waiter if there is one
    pub fn post(&mut self) -> Option<Pid> {
        match self.wait_queue.pop_front() {
            Some(pid) => Some(pid),
            None => {
                self.count += 1;
                None
            }
        }
    }

    pub fn forget(&mut self, pid: Pid) {
        self.wait_queue.retain(|p| *p != pid);
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn has_waiters(&self) -> bool {
        !self.wait_queue.is_empty()
    }
}
