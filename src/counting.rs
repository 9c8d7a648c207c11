//! A byte-counting wrapper over an arbitrary transport.
//!
//! Used by the pull reader to report `bytes_read`/`tag_start_offset` on
//! non-seekable transports, where `Seek::stream_position` isn't available.
//!
//! The tricky part is avoiding double-counting: a `Read` impl is allowed to
//! implement bulk `read` in terms of repeated `read_u8`-style single-byte
//! reads (or vice versa), and if both the inner and outer call account for
//! bytes, the total comes out wrong. We guard each of the four call shapes
//! (bulk read, single-byte read, bulk write, single-byte write) with its own
//! reentrancy flag: the outermost call does the accounting and the flag
//! tells any call nested inside it to stay quiet.

use std::cell::Cell;
use std::io::{self, Read, Write};

/// Wraps a [`Read`] and reports the number of bytes actually consumed.
pub struct CountingReader<R> {
    inner: R,
    bytes_read: u64,
    in_bulk_read: Cell<bool>,
    in_byte_read: Cell<bool>,
}

impl<R: Read> CountingReader<R> {
    pub fn new(inner: R) -> Self {
        CountingReader {
            inner,
            bytes_read: 0,
            in_bulk_read: Cell::new(false),
            in_byte_read: Cell::new(false),
        }
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Reads exactly one byte, counting it unless an outer bulk read is
    /// already accounting for this call.
    pub fn read_byte(&mut self) -> io::Result<u8> {
        let account = !self.in_bulk_read.get() && !self.in_byte_read.get();
        self.in_byte_read.set(true);
        let mut byte = [0u8; 1];
        let result = self.inner.read_exact(&mut byte);
        self.in_byte_read.set(false);
        result?;
        if account {
            self.bytes_read += 1;
        }
        Ok(byte[0])
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let account = !self.in_bulk_read.get();
        self.in_bulk_read.set(true);
        let result = self.inner.read(buf);
        self.in_bulk_read.set(false);
        let n = result?;
        if account {
            self.bytes_read += n as u64;
        }
        Ok(n)
    }
}

/// Wraps a [`Write`] and reports the number of bytes actually written.
pub struct CountingWriter<W> {
    inner: W,
    bytes_written: u64,
    in_bulk_write: Cell<bool>,
    in_byte_write: Cell<bool>,
}

impl<W: Write> CountingWriter<W> {
    pub fn new(inner: W) -> Self {
        CountingWriter {
            inner,
            bytes_written: 0,
            in_bulk_write: Cell::new(false),
            in_byte_write: Cell::new(false),
        }
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        let account = !self.in_bulk_write.get() && !self.in_byte_write.get();
        self.in_byte_write.set(true);
        let result = self.inner.write_all(&[byte]);
        self.in_byte_write.set(false);
        result?;
        if account {
            self.bytes_written += 1;
        }
        Ok(())
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let account = !self.in_bulk_write.get();
        self.in_bulk_write.set(true);
        let result = self.inner.write(buf);
        self.in_bulk_write.set(false);
        let n = result?;
        if account {
            self.bytes_written += n as u64;
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
