use buddy_system_allocator::LockedHeap;

#[global_allocator]
pub static ALLOCATOR: LockedHeap = LockedHeap::new();

// hand the region [start, start + size) to the kernel heap, must run
// before the first allocation
pub fn init(start: usize, size: usize) {
    unsafe {
        ALLOCATOR.lock().init(start, size);
    }
}
