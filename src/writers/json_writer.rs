use crate::error::{ProcessingError, Result};
use crate::utils::constants::{DEFAULT_BUFFER_SIZE, WRITER_CHANNEL_CAPACITY};
use crossbeam::channel::{bounded, Sender};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use tracing::debug;

fn create_output(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, File::create(path)?))
}

fn write_line<W: Write, T: Serialize>(out: &mut W, item: &T) -> Result<()> {
    serde_json::to_writer(&mut *out, item)?;
    out.write_all(b"\n")?;
    Ok(())
}

/// JSON-lines file written on a background thread.
///
/// Documents are handed over through a bounded channel, so a slow disk applies back-pressure
/// to the producer instead of buffering the whole output in memory.
pub struct JsonLinesWriter<T: Serialize + Send + 'static> {
    path: PathBuf,
    sender: Option<Sender<T>>,
    handle: Option<JoinHandle<Result<usize>>>,
}

impl<T: Serialize + Send + 'static> JsonLinesWriter<T> {
    pub fn create(path: &Path) -> Result<Self> {
        Self::with_capacity(path, WRITER_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(path: &Path, capacity: usize) -> Result<Self> {
        let mut out = create_output(path)?;
        let (sender, receiver) = bounded::<T>(capacity.max(1));

        let handle = thread::spawn(move || -> Result<usize> {
            let mut written = 0;
            for item in receiver {
                write_line(&mut out, &item)?;
                written += 1;
            }
            out.flush()?;
            Ok(written)
        });

        Ok(Self {
            path: path.to_path_buf(),
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Queue one document. Fails with `WriterClosed` if the writer thread has stopped.
    pub fn send(&self, item: T) -> Result<()> {
        self.sender
            .as_ref()
            .ok_or(ProcessingError::WriterClosed)?
            .send(item)
            .map_err(|_| ProcessingError::WriterClosed)
    }

    /// Close the channel and wait for the writer. Returns the number of lines written, or the
    /// error that stopped the writer thread.
    pub fn finish(mut self) -> Result<usize> {
        self.close()
    }

    fn close(&mut self) -> Result<usize> {
        drop(self.sender.take());
        let handle = self.handle.take().ok_or(ProcessingError::WriterClosed)?;
        let written = handle.join().map_err(|_| ProcessingError::WriterClosed)??;
        debug!("Wrote {} lines to {}", written, self.path.display());
        Ok(written)
    }
}

impl<T: Serialize + Send + 'static> Drop for JsonLinesWriter<T> {
    fn drop(&mut self) {
        if self.handle.is_some() {
            let _ = self.close();
        }
    }
}

/// Write a whole sequence as JSON lines on the calling thread.
pub fn write_json_lines<T, I>(path: &Path, items: I) -> Result<usize>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut out = create_output(path)?;
    let mut written = 0;
    for item in items {
        write_line(&mut out, &item)?;
        written += 1;
    }
    out.flush()?;
    Ok(written)
}
