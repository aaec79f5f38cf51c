use log::LevelFilter;

// scheduler levels are 0..=MAX_PRIORITY, higher runs first
pub const MAX_PRIORITY: usize = 2;
// rows in the global file table and in every local descriptor table
pub const MAX_FILES: usize = 10;
pub const MAX_PATH: usize = simplefs::path::MAX_PATH;
pub const MAX_SEMAPHORES: usize = 16;
// stdin, stdout, stderr, console-out
pub const STD_FILES: usize = 4;

// cpsr values: user mode with IRQs enabled, supervisor mode
pub const USR_MODE: u32 = 0x50;
pub const SVC_MODE: u32 = 0x13;

// kill target meaning every process except the console, which is pid 0
// itself and so can only end through exit
pub const KILL_ALL: i32 = 0;

// stack slots are tracked by one u64
pub const MAX_PROCS_LIMIT: usize = 64;

// Memory layout and boot options supplied by the startup code.
#[derive(Clone, Debug)]
pub struct KernelConfig {
    // top of the user stack region, slots grow down from here
    pub stack_base: u32,
    pub stack_size: u32,
    pub max_procs: usize,
    // per-process areas where getcwd and list_procs leave their results
    pub scratch_base: u32,
    pub scratch_size: u32,
    pub console_entry: u32,
    pub idle_entry: u32,
    pub format_disk: bool,
    pub log_level: LevelFilter,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            stack_base: 0x0010_0000,
            stack_size: 0x1000,
            max_procs: 32,
            scratch_base: 0x0002_0000,
            scratch_size: 0x400,
            console_entry: 0x0000_8000,
            idle_entry: 0x0000_7000,
            format_disk: false,
            log_level: LevelFilter::Info,
        }
    }
}

impl KernelConfig {
    // top of stack slot `slot`
    pub fn stack_top(&self, slot: usize) -> u32 {
        self.stack_base - slot as u32 * self.stack_size
    }

    pub fn scratch_area(&self, slot: usize) -> u32 {
        self.scratch_base + slot as u32 * self.scratch_size
    }

    // the idle loop runs on the stack below the last slot
    pub fn idle_stack(&self) -> u32 {
        self.stack_top(self.max_procs)
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn test_slot_layout() {
        let config = KernelConfig::default();
        assert_eq!(config.stack_top(0), config.stack_base);
        assert_eq!(config.stack_top(2), config.stack_base - 2 * config.stack_size);
        assert_eq!(config.scratch_area(1), config.scratch_base + config.scratch_size);
        assert!(config.max_procs <= MAX_PROCS_LIMIT);
        // scratch areas stay below the lowest stack
        assert!(config.scratch_area(config.max_procs) <= config.idle_stack());
    }
}
