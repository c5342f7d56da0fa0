//! Append-only file datastore.
//!
//! Each entry is one frame: a little-endian `u32` length followed by the
//! postcard-encoded [`DataEntry`]. Frames are written with a single
//! `write_all` on a file opened in append mode, so several processes can
//! share one file. A truncated trailing frame (a writer died mid-write) is
//! skipped on read.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::StoreError;
use crate::traits::{DataEntry, Datastore};

const LEN_PREFIX: usize = 4;

/// Datastore backed by a single append-only file.
#[derive(Debug)]
pub struct FileDatastore {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl FileDatastore {
    /// Create a handle for the file at `path`. Nothing is touched on disk
    /// until [`Datastore::init`] or the first write.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_append(&self) -> Result<File, StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Ok(OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?)
    }
}

impl Datastore for FileDatastore {
    fn init(&self) -> Result<(), StoreError> {
        let mut guard = self.file.lock().expect("lock poisoned");
        if guard.is_none() {
            *guard = Some(self.open_append()?);
            debug!(path = %self.path.display(), "opened datastore file");
        }
        Ok(())
    }

    fn write(&self, entry: &DataEntry) -> Result<(), StoreError> {
        let body = postcard::to_allocvec(entry)?;
        let len = u32::try_from(body.len())
            .map_err(|_| StoreError::Storage(format!("entry too large: {} bytes", body.len())))?;

        let mut frame = Vec::with_capacity(LEN_PREFIX + body.len());
        frame.extend_from_slice(&len.to_le_bytes());
        frame.extend_from_slice(&body);

        let mut guard = self.file.lock().expect("lock poisoned");
        if guard.is_none() {
            *guard = Some(self.open_append()?);
        }
        if let Some(file) = guard.as_mut() {
            file.write_all(&frame)?;
            file.sync_data()?;
        }
        Ok(())
    }

    fn read(&self) -> Result<Vec<DataEntry>, StoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        let mut offset = 0;
        while offset < bytes.len() {
            let Some(prefix) = bytes.get(offset..offset + LEN_PREFIX) else {
                warn!(path = %self.path.display(), offset, "ignoring truncated frame header");
                break;
            };
            let mut len = [0u8; LEN_PREFIX];
            len.copy_from_slice(prefix);
            let len = u32::from_le_bytes(len) as usize;

            let start = offset + LEN_PREFIX;
            let Some(body) = bytes.get(start..start + len) else {
                warn!(path = %self.path.display(), offset, len, "ignoring truncated frame");
                break;
            };
            entries.push(postcard::from_bytes(body)?);
            offset = start + len;
        }
        Ok(entries)
    }
}
