pub mod context;

use crate::config::KernelConfig;
use crate::console::init_logger;
use crate::error::KernelResult;
use crate::kernel::{Devices, Kernel};
use crate::syscall::{Flow, Syscall};
use context::TrapContext;
use core::convert::TryFrom;
use log::{debug, error, trace, warn};

// interrupt controller id of the periodic timer
pub const TIMER_IRQ: u32 = 36;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IrqSource {
    Timer,
    Other(u32),
}

impl IrqSource {
    pub fn from_id(id: u32) -> Self {
        match id {
            TIMER_IRQ => IrqSource::Timer,
            other => IrqSource::Other(other),
        }
    }
}

// Trap entry points. The trampoline saves the interrupted registers into a
// TrapContext, calls one of these, then restores whatever is left in it.
impl Kernel {
    pub fn handle_reset(
        config: KernelConfig,
        devices: Devices,
        ctx: &mut TrapContext,
    ) -> KernelResult<Kernel> {
        init_logger(devices.stdio.clone(), config.log_level);
        match Kernel::boot(config, devices, ctx) {
            Ok(kernel) => Ok(kernel),
            Err(e) => {
                error!("kernel: boot failed: {}", e);
                Err(e)
            }
        }
    }

    pub fn handle_irq(&mut self, ctx: &mut TrapContext, source: IrqSource) {
        match source {
            IrqSource::Timer => {
                if let Err(e) = self.scheduler.tick(ctx) {
                    error!("trap: tick failed: {}", e);
                }
            }
            IrqSource::Other(id) => {
                debug!("trap: ignored irq {}", id);
            }
        }
    }

    pub fn handle_svc(&mut self, ctx: &mut TrapContext, id: u32) {
        trace!("trap: svc {:#x} args {:x?}", id, &ctx.gpr[..3]);
        let result = Syscall::try_from(id).and_then(|call| self.dispatch_syscall(call, ctx));
        match result {
            Ok(Flow::Resume(value)) => ctx.set_ret(value),
            Ok(Flow::Reschedule(value)) => {
                ctx.set_ret(value);
                if let Err(e) = self.scheduler.reschedule(ctx) {
                    error!("trap: reschedule failed: {}", e);
                }
            }
            Ok(Flow::Keep) => {}
            Err(e) => {
                warn!("trap: svc {:#x} failed: {}", id, e);
                ctx.set_ret(e.as_reg());
            }
        }
    }
}
