// Byte-at-a-time serial device. The kernel sees two of them: the stdio
// UART (stdout, stderr, log output) and the console UART (stdin and the
// console process's output).
pub trait CharDevice: Send + Sync {
    fn putc(&self, ch: u8);
    // blocks until a byte is available
    fn getc(&self) -> u8;

    fn puts(&self, bytes: &[u8]) {
        for b in bytes {
            self.putc(*b);
        }
    }
}
