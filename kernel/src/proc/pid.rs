use alloc::vec::Vec;
use core::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pid(pub usize);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// monotonic counter, ids come back only through dealloc
pub struct PidAllocator {
    start: usize,
    end: usize,
    recycled: Vec<usize>,
}

impl PidAllocator {
    pub fn new(start: usize, end: usize) -> Self {
        return Self {
            start: start,
            end: end,
            recycled: Vec::new(),
        };
    }

    pub fn alloc(&mut self) -> Option<Pid> {
        if !self.recycled.is_empty() {
            return self.recycled.pop().map(|id| Pid(id));
        } else {
            if self.start > self.end {
                return None;
            }
            let pid = Pid(self.start);
            self.start += 1;
            return Some(pid);
        }
    }

    pub fn dealloc(&mut self, pid: Pid) {
        self.recycled.push(pid.0);
    }
}
