#![allow(dead_code)]

use std::io;

/// An in-memory `io::Write` sink. Built with `failing_after(n)`, every write
/// after the first `n` fails with `BrokenPipe`.
#[derive(Default)]
pub struct Writer {
    buf: Vec<u8>,
    writes: usize,
    fail_after: Option<usize>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_after(n: usize) -> Self {
        Self {
            fail_after: Some(n),
            ..Self::default()
        }
    }

    #[track_caller]
    pub fn into_string(self) -> String {
        String::from_utf8(self.buf).unwrap()
    }
}

impl io::Write for Writer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail_after.map_or(false, |n| self.writes >= n) {
            return Err(io::Error::from(io::ErrorKind::BrokenPipe));
        }
        self.writes += 1;
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
