#![cfg_attr(not(test), no_std)]
extern crate alloc;

pub mod config;
pub mod console;
pub mod driver;
pub mod error;
pub mod fs;
pub mod kernel;
pub mod mem;
pub mod proc;
pub mod sync;
pub mod syscall;
pub mod task;
pub mod trap;

#[cfg(test)]
pub mod test_util;

pub use config::KernelConfig;
pub use driver::CharDevice;
pub use error::{KernelError, KernelResult};
pub use kernel::{Devices, Kernel};
pub use mem::UserMemory;
pub use trap::context::TrapContext;
pub use trap::IrqSource;

#[cfg(target_os = "none")]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    log::error!("kernel panic: {}", info);
    loop {}
}
