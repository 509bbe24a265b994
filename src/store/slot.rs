use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// A single named durable value, the way a browser exposes one
/// `localStorage` key.
pub trait Slot {
    /// `Ok(None)` when nothing has been written yet.
    fn read(&self) -> Result<Option<String>>;

    fn write(&mut self, value: &str) -> Result<()>;
}

/// Slot backed by one file on disk. Writes go through a sibling temp file and
/// a rename so a crash never leaves half a collection behind.
#[derive(Debug, Clone)]
pub struct JsonFileSlot {
    path: PathBuf,
}

impl JsonFileSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Slot for JsonFileSlot {
    fn read(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).context(format!("Failed to read {}", self.path.display())),
        }
    }

    fn write(&mut self, value: &str) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).context("Failed to create data directory")?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, value).context(format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .context(format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}
