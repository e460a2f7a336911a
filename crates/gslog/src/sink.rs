//! Output sinks
//!
//! A handler renders an entry into bytes and hands them to a
//! [`WriteSyncer`]. The rotating file, plain files, stdio and an in-memory
//! buffer all implement it.

use std::fs::File;
use std::io::{self, Stderr, Stdout, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use gslog_rotate::RotatingFile;
use parking_lot::Mutex;

use crate::error::Result;

/// Destination for rendered log lines
pub trait WriteSyncer: Send {
    /// Write the whole buffer, returning the number of bytes written
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    /// Flush buffered data to durable storage
    fn sync(&mut self) -> Result<()>;

    /// Release the sink; later writes may fail
    fn close(&mut self) -> Result<()>;
}

impl<W: WriteSyncer + ?Sized> WriteSyncer for Box<W> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        (**self).write(buf)
    }

    fn sync(&mut self) -> Result<()> {
        (**self).sync()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

impl WriteSyncer for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        Ok(RotatingFile::write(self, buf)?)
    }

    fn sync(&mut self) -> Result<()> {
        Ok(RotatingFile::sync(self)?)
    }

    fn close(&mut self) -> Result<()> {
        Ok(RotatingFile::close(self)?)
    }
}

/// Shared rotating file; closing through any handle closes the file
impl WriteSyncer for Arc<RotatingFile> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        Ok(RotatingFile::write(self, buf)?)
    }

    fn sync(&mut self) -> Result<()> {
        Ok(RotatingFile::sync(self)?)
    }

    fn close(&mut self) -> Result<()> {
        Ok(RotatingFile::close(self)?)
    }
}

impl WriteSyncer for File {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.write_all(buf)?;
        Ok(buf.len())
    }

    fn sync(&mut self) -> Result<()> {
        Ok(self.sync_all()?)
    }

    fn close(&mut self) -> Result<()> {
        Ok(self.sync_all()?)
    }
}

impl WriteSyncer for Stdout {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.lock().write_all(buf)?;
        Ok(buf.len())
    }

    fn sync(&mut self) -> Result<()> {
        Ok(self.flush()?)
    }

    fn close(&mut self) -> Result<()> {
        Ok(self.flush()?)
    }
}

impl WriteSyncer for Stderr {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.lock().write_all(buf)?;
        Ok(buf.len())
    }

    fn sync(&mut self) -> Result<()> {
        Ok(self.flush()?)
    }

    fn close(&mut self) -> Result<()> {
        Ok(self.flush()?)
    }
}

/// In-memory sink; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    buf: Arc<Mutex<Vec<u8>>>,
    syncs: Arc<Mutex<usize>>,
    closed: Arc<AtomicBool>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock()).into_owned()
    }

    /// Written lines without their terminators
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    pub fn clear(&self) {
        self.buf.lock().clear();
    }

    /// Number of `sync` calls received
    pub fn sync_count(&self) -> usize {
        *self.syncs.lock()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl WriteSyncer for MemorySink {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        if self.is_closed() {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "memory sink is closed").into());
        }
        self.buf.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn sync(&mut self) -> Result<()> {
        *self.syncs.lock() += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
