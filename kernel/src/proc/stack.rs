use crate::config::MAX_PROCS_LIMIT;

// index of a user stack slot, also selects the process's scratch area
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StackSlot(pub usize);

// one bit per stack slot
pub struct StackAllocator {
    used: u64,
    slots: usize,
}

impl StackAllocator {
    pub fn new(slots: usize) -> Self {
        assert!(slots <= MAX_PROCS_LIMIT, "at most 64 stack slots");
        return Self { used: 0, slots };
    }

    pub fn alloc(&mut self) -> Option<StackSlot> {
        let idx = self.used.trailing_ones() as usize;
        if idx >= self.slots {
            return None;
        }
        self.used |= 1 << idx;
        return Some(StackSlot(idx));
    }

    pub fn free(&mut self, slot: StackSlot) {
        self.used &= !(1 << slot.0);
    }

    pub fn in_use(&self) -> usize {
        self.used.count_ones() as usize
    }
}
