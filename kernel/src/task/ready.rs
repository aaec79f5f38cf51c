use crate::config::MAX_PRIORITY;
use crate::proc::pid::Pid;
use alloc::collections::VecDeque;
use array_macro::array;

const LEVELS: usize = MAX_PRIORITY + 1;

// one FIFO of pids per priority level
pub struct ReadyQueueSet {
    queues: [VecDeque<Pid>; LEVELS],
}

impl ReadyQueueSet {
    pub fn new() -> Self {
        Self {
            queues: array![_ => VecDeque::new(); LEVELS],
        }
    }

    pub fn push(&mut self, pid: Pid, priority: usize) {
        debug_assert!(!self.contains(pid), "pid queued twice");
        self.queues[priority.min(MAX_PRIORITY)].push_back(pid);
    }

    // head of the highest non-empty level
    pub fn pop_highest(&mut self) -> Option<Pid> {
        self.queues.iter_mut().rev().find_map(|q| q.pop_front())
    }

    pub fn remove(&mut self, pid: Pid) -> bool {
        for queue in self.queues.iter_mut() {
            if let Some(idx) = queue.iter().position(|p| *p == pid) {
                queue.remove(idx);
                return true;
            }
        }
        false
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.queues.iter().any(|q| q.contains(&pid))
    }

    pub fn len(&self) -> usize {
        self.queues.iter().map(|q| q.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.iter().all(|q| q.is_empty())
    }
}

impl Default for ReadyQueueSet {
    fn default() -> Self {
        Self::new()
    }
}
