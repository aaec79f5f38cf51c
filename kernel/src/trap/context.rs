use crate::config::{SVC_MODE, USR_MODE};

// TrapContext
// registers saved by the trap trampoline, field order matches its save order
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrapContext {
    pub cpsr: u32,
    pub pc: u32,
    pub gpr: [u32; 13], // r0~r12
    pub sp: u32,
    pub lr: u32,
}

impl TrapContext {
    pub fn empty() -> Self {
        return Self::default();
    }

    // fresh user-mode context starting at `entry` on an empty stack
    pub fn user_context(entry: u32, stack_top: u32) -> Self {
        return Self {
            cpsr: USR_MODE,
            pc: entry,
            gpr: [0; 13],
            sp: stack_top,
            lr: 0,
        };
    }

    pub fn idle_context(entry: u32, stack_top: u32) -> Self {
        return Self {
            cpsr: SVC_MODE,
            pc: entry,
            gpr: [0; 13],
            sp: stack_top,
            lr: 0,
        };
    }

    // syscall arguments live in r0..r3
    pub fn arg(&self, idx: usize) -> u32 {
        self.gpr[idx]
    }

    pub fn set_ret(&mut self, value: u32) {
        self.gpr[0] = value;
    }
}
