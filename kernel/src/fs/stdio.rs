use super::AccessMode;
use crate::driver::CharDevice;
use crate::error::KernelResult;
use crate::kernel::Devices;
use crate::mem::check_range;
use simplefs::layout::BLOCK_SIZE;

// the four standard rows of the file table and the UART behind each
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Device {
    Stdin,
    Stdout,
    Stderr,
    Console,
}

impl Device {
    pub fn access(&self) -> AccessMode {
        match self {
            Device::Stdin => AccessMode::READ,
            _ => AccessMode::WRITE,
        }
    }

    fn target<'a>(&self, devices: &'a Devices) -> &'a dyn CharDevice {
        match self {
            Device::Stdout | Device::Stderr => devices.stdio.as_ref(),
            Device::Stdin | Device::Console => devices.console.as_ref(),
        }
    }

    pub fn write(&self, devices: &Devices, data: &[u8]) -> usize {
        self.target(devices).puts(data);
        return data.len();
    }

    // one blocking getc per byte
    pub fn read(&self, devices: &Devices, buf: &mut [u8]) -> usize {
        let dev = self.target(devices);
        for b in buf.iter_mut() {
            *b = dev.getc();
        }
        return buf.len();
    }

    // user buffer to the device, BLOCK_SIZE bytes at a time
    pub fn write_from_user(&self, devices: &Devices, addr: u32, len: usize) -> KernelResult<usize> {
        let mem = devices.memory.as_ref();
        check_range(mem, addr, len)?;
        let mut chunk = [0u8; BLOCK_SIZE];
        let mut done = 0;
        while done < len {
            let n = core::cmp::min(BLOCK_SIZE, len - done);
            mem.read(addr + done as u32, &mut chunk[..n])?;
            done += self.write(devices, &chunk[..n]);
        }
        return Ok(done);
    }

    pub fn read_into_user(&self, devices: &Devices, addr: u32, len: usize) -> KernelResult<usize> {
        let mem = devices.memory.as_ref();
        check_range(mem, addr, len)?;
        let mut chunk = [0u8; BLOCK_SIZE];
        let mut done = 0;
        while done < len {
            let n = core::cmp::min(BLOCK_SIZE, len - done);
            self.read(devices, &mut chunk[..n]);
            mem.write(addr + done as u32, &chunk[..n])?;
            done += n;
        }
        return Ok(done);
    }
}
