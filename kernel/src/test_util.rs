// Host doubles for the hardware and a booted kernel to drive syscalls
// through the trap entry point.

use crate::config::KernelConfig;
use crate::driver::CharDevice;
use crate::error::{KernelError, KernelResult};
use crate::kernel::{Devices, Kernel};
use crate::mem::{read_bytes, read_cstr, UserMemory};
use crate::proc::pid::Pid;
use crate::trap::context::TrapContext;
use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use simplefs::{FsError, MemBlockDevice};
use spin::Mutex;

pub const SYS_YIELD: u32 = 0x00;
pub const SYS_WRITE: u32 = 0x01;
pub const SYS_READ: u32 = 0x02;
pub const SYS_FORK: u32 = 0x03;
pub const SYS_EXIT: u32 = 0x04;
pub const SYS_EXEC: u32 = 0x05;
pub const SYS_KILL: u32 = 0x06;
pub const SYS_NICE: u32 = 0x07;
pub const SYS_SEM_INIT: u32 = 0x08;
pub const SYS_SEM_CLOSE: u32 = 0x09;
pub const SYS_SEM_WAIT: u32 = 0x0A;
pub const SYS_SEM_POST: u32 = 0x0B;
pub const SYS_LIST_PROCS: u32 = 0x10;
pub const SYS_OPEN: u32 = 0x11;
pub const SYS_CLOSE: u32 = 0x12;
pub const SYS_REMOVE: u32 = 0x13;
pub const SYS_MKDIR: u32 = 0x14;
pub const SYS_RMDIR: u32 = 0x15;
pub const SYS_CHDIR: u32 = 0x16;
pub const SYS_GETCWD: u32 = 0x17;
pub const SYS_LISTDIR: u32 = 0x18;

// user buffers the tests hand to syscalls, clear of stacks and scratch
pub const PATH_ADDR: u32 = 0x1000;
pub const BUF_ADDR: u32 = 0x2000;

const RAM_SIZE: usize = 0x10_0000;

pub struct RamMemory {
    bytes: Mutex<Vec<u8>>,
}

impl RamMemory {
    pub fn new(size: usize) -> Self {
        Self {
            bytes: Mutex::new(vec![0u8; size]),
        }
    }

    fn range(&self, addr: u32, len: usize) -> KernelResult<core::ops::Range<usize>> {
        let start = addr as usize;
        let end = start.checked_add(len).ok_or(KernelError::BadAddress)?;
        if end > self.bytes.lock().len() {
            return Err(KernelError::BadAddress);
        }
        Ok(start..end)
    }
}

impl UserMemory for RamMemory {
    fn read(&self, addr: u32, buf: &mut [u8]) -> KernelResult<()> {
        let range = self.range(addr, buf.len())?;
        buf.copy_from_slice(&self.bytes.lock()[range]);
        Ok(())
    }

    fn write(&self, addr: u32, data: &[u8]) -> KernelResult<()> {
        let range = self.range(addr, data.len())?;
        self.bytes.lock()[range].copy_from_slice(data);
        Ok(())
    }
}

// records output, serves scripted input then zeros
pub struct RecordingDevice {
    output: Mutex<Vec<u8>>,
    input: Mutex<VecDeque<u8>>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self {
            output: Mutex::new(Vec::new()),
            input: Mutex::new(VecDeque::new()),
        }
    }

    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.output.lock()).into_owned()
    }

    pub fn feed(&self, bytes: &[u8]) {
        self.input.lock().extend(bytes.iter().copied());
    }
}

impl CharDevice for RecordingDevice {
    fn putc(&self, ch: u8) {
        self.output.lock().push(ch);
    }

    fn getc(&self) -> u8 {
        self.input.lock().pop_front().unwrap_or(0)
    }
}

// devices over a blank disk, plus handles on the two UARTs
pub fn test_devices() -> (Devices, Arc<RecordingDevice>, Arc<RecordingDevice>) {
    let stdio = Arc::new(RecordingDevice::new());
    let console = Arc::new(RecordingDevice::new());
    let devices = Devices {
        stdio: stdio.clone(),
        console: console.clone(),
        disk: Arc::new(MemBlockDevice::new()),
        memory: Arc::new(RamMemory::new(RAM_SIZE)),
    };
    (devices, stdio, console)
}

pub struct TestRig {
    pub kernel: Kernel,
    pub ctx: TrapContext,
    pub stdio: Arc<RecordingDevice>,
    pub console: Arc<RecordingDevice>,
    pub disk: Arc<MemBlockDevice>,
    pub mem: Arc<RamMemory>,
}

impl TestRig {
    // kernel on a freshly formatted disk, the console process running
    pub fn boot() -> Self {
        let stdio = Arc::new(RecordingDevice::new());
        let console = Arc::new(RecordingDevice::new());
        let disk = Arc::new(MemBlockDevice::new());
        let mem = Arc::new(RamMemory::new(RAM_SIZE));
        let devices = Devices {
            stdio: stdio.clone(),
            console: console.clone(),
            disk: disk.clone(),
            memory: mem.clone(),
        };
        let config = KernelConfig {
            format_disk: true,
            ..KernelConfig::default()
        };
        let mut ctx = TrapContext::empty();
        let kernel = Kernel::boot(config, devices, &mut ctx).unwrap();
        Self {
            kernel,
            ctx,
            stdio,
            console,
            disk,
            mem,
        }
    }

    // trap with `args` in r0.., returns r0
    pub fn svc(&mut self, id: u32, args: &[u32]) -> u32 {
        for (i, arg) in args.iter().enumerate() {
            self.ctx.gpr[i] = *arg;
        }
        self.kernel.handle_svc(&mut self.ctx, id);
        self.ctx.gpr[0]
    }

    // a syscall expected to fail, decoded back from r0
    pub fn svc_err(&mut self, id: u32, args: &[u32]) -> KernelError {
        let reg = self.svc(id, args);
        decode_error(reg).unwrap_or_else(|| panic!("svc {:#x} returned {:#x}", id, reg))
    }

    pub fn svc_path(&mut self, id: u32, path: &str) -> u32 {
        self.put_str(PATH_ADDR, path);
        self.svc(id, &[PATH_ADDR])
    }

    pub fn svc_err_path(&mut self, id: u32, path: &str) -> KernelError {
        self.put_str(PATH_ADDR, path);
        self.svc_err(id, &[PATH_ADDR])
    }

    pub fn open(&mut self, path: &str) -> u32 {
        let fd = self.svc_path(SYS_OPEN, path);
        assert!(decode_error(fd).is_none(), "open {} failed: {:#x}", path, fd);
        fd
    }

    pub fn running(&self) -> Pid {
        self.kernel.scheduler.running().unwrap()
    }

    pub fn put_str(&self, addr: u32, s: &str) {
        self.mem.write(addr, s.as_bytes()).unwrap();
        self.mem.write(addr + s.len() as u32, &[0]).unwrap();
    }

    pub fn mem_bytes(&self, addr: u32, bytes: &[u8]) {
        self.mem.write(addr, bytes).unwrap();
    }

    pub fn read_bytes(&self, addr: u32, len: usize) -> Vec<u8> {
        read_bytes(self.mem.as_ref(), addr, len).unwrap()
    }

    pub fn read_str(&self, addr: u32) -> String {
        read_cstr(self.mem.as_ref(), addr, 4096).unwrap()
    }
}

const ALL_ERRORS: [KernelError; 20] = [
    KernelError::InvalidSyscall,
    KernelError::InvalidDescriptor,
    KernelError::AccessDenied,
    KernelError::BadAddress,
    KernelError::NoSuchProcess,
    KernelError::InvalidArgument,
    KernelError::TooManyOpenFiles,
    KernelError::ProcessLimit,
    KernelError::TooManySemaphores,
    KernelError::SemaphoreBusy,
    KernelError::Fs(FsError::AllocationExhausted),
    KernelError::Fs(FsError::NotFound),
    KernelError::Fs(FsError::InvalidPath),
    KernelError::Fs(FsError::NotDirectory),
    KernelError::Fs(FsError::IsDirectory),
    KernelError::Fs(FsError::DirectoryFull),
    KernelError::Fs(FsError::DirectoryNotEmpty),
    KernelError::Fs(FsError::AlreadyExists),
    KernelError::Fs(FsError::OversizedTransfer),
    KernelError::Fs(FsError::Corrupted),
];

fn decode_error(reg: u32) -> Option<KernelError> {
    ALL_ERRORS.iter().copied().find(|e| e.as_reg() == reg)
}
