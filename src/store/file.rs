//! File-backed stores
//!
//! One file per store. The file size is the store length; contents are
//! loaded on open and the modified window is written back in place on
//! `save()`. Files are never grown or truncated.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{check_range, StoreHandle, StoreProvider};

/// Provider for file-backed stores
#[derive(Debug, Clone, Default)]
pub struct FileProvider {
    /// fsync after each save
    sync_on_save: bool,
}

impl FileProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `sync_all()` after every save
    pub fn sync_on_save(mut self, enabled: bool) -> Self {
        self.sync_on_save = enabled;
        self
    }

    /// Create a zero-filled store file of `len` bytes
    pub fn create(path: &Path, len: u64) -> io::Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        file.set_len(len)?;
        Ok(())
    }
}

impl StoreProvider for FileProvider {
    type Id = PathBuf;
    type Handle = FileHandle;

    fn open(&self, id: &PathBuf) -> io::Result<FileHandle> {
        let mut file = OpenOptions::new().read(true).write(true).open(id)?;

        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;

        debug!(path = ?id, len = buffer.len(), "Opened file store");

        Ok(FileHandle {
            path: id.clone(),
            file,
            buffer,
            dirty: None,
            sync_on_save: self.sync_on_save,
        })
    }
}

/// Handle to one opened store file
#[derive(Debug)]
pub struct FileHandle {
    path: PathBuf,
    file: File,
    /// Full file contents
    buffer: Vec<u8>,
    /// Modified window `[start, end)` since the last save
    dirty: Option<(usize, usize)>,
    sync_on_save: bool,
}

impl FileHandle {
    /// Path this handle was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn mark_dirty(&mut self, start: usize, end: usize) {
        self.dirty = Some(match self.dirty {
            Some((s, e)) => (s.min(start), e.max(end)),
            None => (start, end),
        });
    }
}

impl StoreHandle for FileHandle {
    fn len(&self) -> u64 {
        self.buffer.len() as u64
    }

    fn get_byte(&mut self, offset: u64) -> io::Result<u8> {
        check_range(offset, 1, self.len())?;
        Ok(self.buffer[offset as usize])
    }

    fn set_byte(&mut self, offset: u64, value: u8) -> io::Result<()> {
        check_range(offset, 1, self.len())?;
        let pos = offset as usize;
        self.buffer[pos] = value;
        self.mark_dirty(pos, pos + 1);
        Ok(())
    }

    fn read(&mut self, offset: u64, length: u64) -> io::Result<Vec<u8>> {
        check_range(offset, length, self.len())?;
        let start = offset as usize;
        Ok(self.buffer[start..start + length as usize].to_vec())
    }

    fn write(&mut self, data: &[u8], offset: u64) -> io::Result<()> {
        check_range(offset, data.len() as u64, self.len())?;
        if data.is_empty() {
            return Ok(());
        }
        let start = offset as usize;
        self.buffer[start..start + data.len()].copy_from_slice(data);
        self.mark_dirty(start, start + data.len());
        Ok(())
    }

    fn save(&mut self) -> io::Result<()> {
        let Some((start, end)) = self.dirty else {
            return Ok(());
        };

        self.file.seek(SeekFrom::Start(start as u64))?;
        self.file.write_all(&self.buffer[start..end])?;
        self.file.flush()?;
        if self.sync_on_save {
            self.file.sync_all()?;
        }

        debug!(path = ?self.path, start, end, "Saved file store");
        self.dirty = None;
        Ok(())
    }
}
