use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

/// Append-only destination for streamed sample bytes.
///
/// A session opens the sink when streaming starts, appends from the datagram
/// path only, and closes it when streaming stops or the session goes away.
pub trait SampleSink: Send {
    /// Start a fresh capture, discarding anything written before.
    fn open(&mut self) -> io::Result<()>;

    /// Append sample bytes.
    fn append(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Flush and release the underlying resource. Safe to call when closed.
    fn close(&mut self) -> io::Result<()>;
}

/// Flat, headerless binary file of sample bytes.
#[derive(Debug)]
pub struct FileSampleSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl FileSampleSink {
    /// Create a sink writing to `path`. Nothing is touched until first use.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            writer: None,
        }
    }

    /// The file this sink writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file is currently held open.
    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }
}

impl SampleSink for FileSampleSink {
    fn open(&mut self) -> io::Result<()> {
        self.close()?;
        let file = File::create(&self.path)?;
        self.writer = Some(BufWriter::new(file));
        info!(path = ?self.path, "sample file created");
        Ok(())
    }

    fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)?;
                debug!(path = ?self.path, "sample file opened for append");
                BufWriter::new(file)
            }
        };
        self.writer.insert(writer).write_all(bytes)
    }

    fn close(&mut self) -> io::Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            debug!(path = ?self.path, "sample file closed");
        }
        Ok(())
    }
}

impl Drop for FileSampleSink {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
