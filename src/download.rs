//! Delivery of finished artifacts.
//!
//! In the editor a finished blob is handed to the browser's download manager;
//! here a [`DownloadSink`] receives the named bytes instead.

use crate::error::{Error, Result};
use log::debug;
use parking_lot::Mutex;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// MIME type of a PowerPoint package.
pub const PPTX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

/// MIME type of a PDF document.
pub const PDF_MIME: &str = "application/pdf";

/// Receives finished files.
pub trait DownloadSink: Send + Sync {
    /// Save `data` under `file_name`.
    fn save(&self, file_name: &str, mime_type: &str, data: &[u8]) -> Result<()>;
}

/// Writes files into a directory.
///
/// Existing files are never replaced: a name that is already taken is saved
/// as `name (1).ext`, `name (2).ext` and so on.
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    saved: Mutex<Vec<PathBuf>>,
}

impl DirectorySink {
    /// Create a sink writing into `dir`; the directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            saved: Mutex::new(Vec::new()),
        }
    }

    /// Target directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths actually written so far, in order.
    pub fn saved_paths(&self) -> Vec<PathBuf> {
        self.saved.lock().clone()
    }
}

impl DownloadSink for DirectorySink {
    fn save(&self, file_name: &str, mime_type: &str, data: &[u8]) -> Result<()> {
        validate_file_name(file_name)?;
        fs::create_dir_all(&self.dir)
            .map_err(|e| Error::Download(format!("{}: {}", self.dir.display(), e)))?;

        let path = self.write_new(file_name, data)?;
        debug!("Saved {} ({}, {} bytes)", path.display(), mime_type, data.len());
        self.saved.lock().push(path);
        Ok(())
    }
}

impl DirectorySink {
    fn write_new(&self, file_name: &str, data: &[u8]) -> Result<PathBuf> {
        for n in 0..MAX_RENAMES {
            let path = self.dir.join(numbered_name(file_name, n));
            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(Error::Download(format!("{}: {}", path.display(), e))),
            };
            file.write_all(data)
                .map_err(|e| Error::Download(format!("{}: {}", path.display(), e)))?;
            if n > 0 {
                debug!("{} exists, saved as {}", file_name, path.display());
            }
            return Ok(path);
        }
        Err(Error::Download(format!(
            "{}: too many files with this name in {}",
            file_name,
            self.dir.display()
        )))
    }
}

const MAX_RENAMES: u32 = 10_000;

/// `name (n).ext` for `n > 0`, the name itself otherwise.
fn numbered_name(file_name: &str, n: u32) -> String {
    if n == 0 {
        return file_name.to_string();
    }
    match file_name.rfind('.') {
        Some(dot) if dot > 0 => format!("{} ({}){}", &file_name[..dot], n, &file_name[dot..]),
        _ => format!("{} ({})", file_name, n),
    }
}

/// A file captured by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    /// File name as requested
    pub name: String,
    /// MIME type
    pub mime_type: String,
    /// File contents
    pub data: Vec<u8>,
}

/// Keeps saved files in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    files: Mutex<Vec<SavedFile>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Files saved so far, in order.
    pub fn files(&self) -> Vec<SavedFile> {
        self.files.lock().clone()
    }

    /// Names of saved files, in order.
    pub fn names(&self) -> Vec<String> {
        self.files.lock().iter().map(|f| f.name.clone()).collect()
    }

    /// Number of saved files.
    pub fn len(&self) -> usize {
        self.files.lock().len()
    }

    /// Whether nothing has been saved.
    pub fn is_empty(&self) -> bool {
        self.files.lock().is_empty()
    }
}

impl DownloadSink for MemorySink {
    fn save(&self, file_name: &str, mime_type: &str, data: &[u8]) -> Result<()> {
        validate_file_name(file_name)?;
        self.files.lock().push(SavedFile {
            name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            data: data.to_vec(),
        });
        Ok(())
    }
}

fn validate_file_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(Error::Download(format!("Invalid file name: {:?}", name)));
    }
    Ok(())
}
