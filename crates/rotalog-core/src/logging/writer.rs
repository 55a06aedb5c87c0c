//! Active file handle and the file + console fan-out.
//!
//! Every line is handed over in one `write_all` so concurrent readers of the
//! file never see a partial line from us.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Owner of the active log file.
///
/// The handle is `None` between closing the old file and opening the new
/// one during a rotation, or after a failed reopen.
#[derive(Debug)]
pub(crate) struct FileWriter {
    path: PathBuf,
    file: Option<File>,
}

impl FileWriter {
    /// Open `path` for appending, creating it if needed.
    pub(crate) fn open_append(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let file = append(&path)?;
        Ok(Self {
            path,
            file: Some(file),
        })
    }

    /// A writer with no handle yet.
    pub(crate) fn detached(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Write `bytes`, reopening the file first if the handle was lost.
    pub(crate) fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        let file = match &mut self.file {
            Some(file) => file,
            slot => slot.insert(append(&self.path)?),
        };
        file.write_all(bytes)
    }

    /// Flush and sync, then drop the handle.
    pub(crate) fn close(&mut self) -> io::Result<()> {
        match self.file.take() {
            Some(mut file) => {
                file.flush()?;
                file.sync_all()
            }
            None => Ok(()),
        }
    }

    /// Replace whatever is at the path with a new empty file.
    pub(crate) fn create_fresh(&mut self) -> io::Result<()> {
        self.file = None;
        self.file = Some(File::create(&self.path)?);
        Ok(())
    }

    pub(crate) fn sync(&mut self) -> io::Result<()> {
        match &mut self.file {
            Some(file) => file.sync_data(),
            None => Ok(()),
        }
    }
}

fn append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// The console side of the fan-out.
pub(crate) struct Console {
    pub(crate) enabled: bool,
    out: Box<dyn Write + Send>,
}

impl Console {
    pub(crate) fn new(enabled: bool, out: Box<dyn Write + Send>) -> Self {
        Self { enabled, out }
    }

    pub(crate) fn stderr(enabled: bool) -> Self {
        Self::new(enabled, Box::new(io::stderr()))
    }

    pub(crate) fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        if !self.enabled {
            return Ok(());
        }
        self.out.write_all(bytes)?;
        self.out.flush()
    }

    pub(crate) fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}
