use crate::driver::CharDevice;
use alloc::sync::Arc;
use core::fmt::{self, Write};
use log::{LevelFilter, Log, Metadata, Record};
use spin::Once;

// fmt::Write adapter over a serial device
pub struct Console<'a>(pub &'a dyn CharDevice);

impl Write for Console<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.puts(s.as_bytes());
        Ok(())
    }
}

pub fn print(dev: &dyn CharDevice, args: fmt::Arguments) {
    // writing to a UART cannot fail
    let _ = Console(dev).write_fmt(args);
}

struct KernelLogger {
    dev: Once<Arc<dyn CharDevice>>,
}

impl Log for KernelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Some(dev) = self.dev.get() {
            print(
                dev.as_ref(),
                format_args!("[{}] {}\n", record.level(), record.args()),
            );
        }
    }

    fn flush(&self) {}
}

static LOGGER: KernelLogger = KernelLogger { dev: Once::new() };

// route the log facade to `dev`, the first device installed stays
pub fn init_logger(dev: Arc<dyn CharDevice>, level: LevelFilter) {
    LOGGER.dev.call_once(|| dev);
    // set_logger only fails when a logger is already installed
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}
