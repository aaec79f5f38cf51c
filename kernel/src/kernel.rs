use crate::config::{KernelConfig, MAX_PROCS_LIMIT};
use crate::driver::CharDevice;
use crate::error::{KernelError, KernelResult};
use crate::fs::FileTable;
use crate::mem::UserMemory;
use crate::proc::pid::Pid;
use crate::proc::ProcessTable;
use crate::sync::SemaphoreTable;
use crate::task::scheduler::Scheduler;
use crate::trap::context::TrapContext;
use alloc::sync::Arc;
use log::{info, warn};
use simplefs::{BlockDevice, SimpleFileSystem};

// console-out row of the global file table
const CONSOLE_ROW: usize = 3;

// The hardware the kernel is handed by the startup code.
#[derive(Clone)]
pub struct Devices {
    // stdout, stderr and the kernel log
    pub stdio: Arc<dyn CharDevice>,
    // stdin and the console process's output
    pub console: Arc<dyn CharDevice>,
    pub disk: Arc<dyn BlockDevice>,
    pub memory: Arc<dyn UserMemory>,
}

// Every kernel table. One instance lives from boot to shutdown and each
// trap entry point borrows it mutably.
pub struct Kernel {
    pub config: KernelConfig,
    pub devices: Devices,
    pub fs: SimpleFileSystem,
    pub files: FileTable,
    pub scheduler: Scheduler,
    pub semaphores: SemaphoreTable,
    pub(crate) console_pid: Pid,
}

impl Kernel {
    // bring up the file system and the console process, `ctx` ends up
    // holding the console's first context
    pub fn boot(config: KernelConfig, devices: Devices, ctx: &mut TrapContext) -> KernelResult<Kernel> {
        if config.max_procs == 0 || config.max_procs > MAX_PROCS_LIMIT {
            return Err(KernelError::InvalidArgument);
        }
        let fs = if config.format_disk {
            info!("kernel: formatting disk");
            SimpleFileSystem::format(devices.disk.clone())
        } else {
            SimpleFileSystem::mount(devices.disk.clone())?
        };
        let idle_ctx = TrapContext::idle_context(config.idle_entry, config.idle_stack());
        let scheduler = Scheduler::new(ProcessTable::new(&config), idle_ctx);
        let mut kernel = Kernel {
            config,
            devices,
            fs,
            files: FileTable::new(),
            scheduler,
            semaphores: SemaphoreTable::new(),
            console_pid: Pid(0),
        };

        let console_entry = kernel.config.console_entry;
        let pid = kernel.scheduler.procs.create("console", console_entry, None)?;
        kernel.scheduler.procs.find_mut(pid)?.set_fd(1, CONSOLE_ROW);
        kernel.console_pid = pid;
        kernel.scheduler.make_ready(pid)?;
        kernel.scheduler.reschedule(ctx)?;
        info!(
            "kernel: booted, console {} at {:#x}",
            pid, console_entry
        );
        return Ok(kernel);
    }

    pub fn console_pid(&self) -> Pid {
        self.console_pid
    }

    // take `pid` out of the system along with its descriptors and waits
    pub fn terminate(&mut self, pid: Pid) -> KernelResult<()> {
        let pcb = self.scheduler.terminate(pid)?;
        for row in pcb.fd_table.iter().flatten() {
            if let Err(e) = self.files.release(*row) {
                warn!("kernel: {} held a dead row {}: {}", pid, row, e);
            }
        }
        self.semaphores.forget(pid);
        info!("kernel: {} \"{}\" terminated", pid, pcb.name);
        Ok(())
    }

    // terminate everything and hand the devices back
    pub fn shutdown(mut self) -> Devices {
        for pid in self.scheduler.procs.pids() {
            if let Err(e) = self.terminate(pid) {
                warn!("kernel: shutdown of {} failed: {}", pid, e);
            }
        }
        info!("kernel: shut down");
        self.devices
    }
}

#[cfg(test)]
mod kernel_tests {
    use super::*;
    use crate::config::STD_FILES;
    use crate::proc::pcb::ProcessState;
    use crate::test_util::*;
    use simplefs::layout::ROOT_INODE;

    #[test]
    fn test_boot_starts_console() {
        let rig = TestRig::boot();
        let console = rig.kernel.console_pid();
        assert_eq!(rig.kernel.scheduler.running(), Some(console));
        let pcb = rig.kernel.scheduler.current().unwrap();
        assert_eq!(pcb.name, "console");
        assert_eq!(pcb.state, ProcessState::Running);
        assert_eq!(pcb.row_of(1), Ok(CONSOLE_ROW));
        assert_eq!(pcb.row_of(0), Ok(0));
        assert_eq!(rig.ctx.pc, rig.kernel.config.console_entry);
        assert_eq!(rig.ctx.sp, pcb.stack_top);
        assert_eq!(rig.kernel.files.open_rows(), STD_FILES);
    }

    #[test]
    fn test_boot_rejects_bad_process_limit() {
        let (devices, _, _) = test_devices();
        let config = KernelConfig {
            max_procs: MAX_PROCS_LIMIT + 1,
            format_disk: true,
            ..KernelConfig::default()
        };
        let mut ctx = TrapContext::empty();
        assert_eq!(
            Kernel::boot(config, devices, &mut ctx).err(),
            Some(KernelError::InvalidArgument)
        );
    }

    #[test]
    fn test_mount_unformatted_disk_fails() {
        let (devices, _, _) = test_devices();
        let mut ctx = TrapContext::empty();
        assert_eq!(
            Kernel::boot(KernelConfig::default(), devices, &mut ctx).err(),
            Some(KernelError::Fs(simplefs::FsError::Corrupted))
        );
    }

    #[test]
    fn test_files_survive_remount() {
        let mut rig = TestRig::boot();
        rig.svc_path(SYS_MKDIR, "/etc");
        let fd = rig.open("/etc/motd");
        rig.mem_bytes(BUF_ADDR, b"welcome");
        rig.svc(SYS_WRITE, &[fd, BUF_ADDR, 7]);

        let devices = rig.kernel.shutdown();
        let mut ctx = TrapContext::empty();
        let kernel = Kernel::boot(KernelConfig::default(), devices, &mut ctx).unwrap();
        let root = kernel.fs.read_inode(ROOT_INODE).unwrap();
        let (_, _, etc) = kernel.fs.find_entry(&root, "etc").unwrap().unwrap();
        let etc = kernel.fs.read_inode(etc.inode_id).unwrap();
        let (_, _, motd) = kernel.fs.find_entry(&etc, "motd").unwrap().unwrap();
        let mut buf = [0u8; 16];
        assert_eq!(kernel.fs.read_file(motd.inode_id, &mut buf).unwrap(), 7);
        assert_eq!(&buf[..7], b"welcome");
    }

    #[test]
    fn test_shutdown_releases_everything() {
        let mut rig = TestRig::boot();
        rig.svc(SYS_FORK, &[]);
        rig.open("a");
        let devices = rig.kernel.shutdown();
        // the devices come back usable
        devices.console.putc(b'x');
        assert_eq!(rig.console.output(), "x");
    }
}
