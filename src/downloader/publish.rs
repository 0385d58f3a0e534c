use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::registry::Registry;

const WORK_DIR_PREFIX: &str = ".fetchq";

#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
}

impl WorkDir {
    pub fn create_in(parent: &Path) -> Result<Self> {
        let path = tempfile::Builder::new()
            .prefix(WORK_DIR_PREFIX)
            .tempdir_in(parent)
            .with_context(|| {
                format!("Failed to create working directory in {}", parent.display())
            })?
            .keep();
        log::debug!("Working directory {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fails while any temp file is left inside.
    pub fn remove(self) -> Result<()> {
        fs::remove_dir(&self.path).with_context(|| {
            format!("Failed to remove working directory {}", self.path.display())
        })
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublishReport {
    pub published: usize,
    pub missing: usize,
    pub discarded: usize,
    pub failed: usize,
}

/// Renames dispatched temp files onto their destinations in occurrence order,
/// so a repeated URL keeps its last successful download. Undispatched ones are
/// deleted.
pub fn publish(registry: Registry, target_dir: &Path) -> PublishReport {
    let mut report = PublishReport::default();

    for (url, entry) in registry.into_entries() {
        let destination = target_dir.join(&entry.destination);

        for (occurrence, temp_path) in entry.temp_files.iter().enumerate() {
            if occurrence >= entry.occurrences {
                discard(temp_path, &mut report);
                continue;
            }

            match fs::rename(temp_path, &destination) {
                Ok(()) => {
                    log::debug!("Published {} as {}", url, destination.display());
                    report.published += 1;
                }
                Err(err) if err.kind() == io::ErrorKind::NotFound => report.missing += 1,
                Err(err) => {
                    log::error!(
                        "Failed to rename {} to {}: {}",
                        temp_path.display(),
                        destination.display(),
                        err
                    );
                    report.failed += 1;
                }
            }
        }
    }

    report
}

fn discard(temp_path: &Path, report: &mut PublishReport) {
    match fs::remove_file(temp_path) {
        Ok(()) => report.discarded += 1,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            log::error!("Failed to remove {}: {}", temp_path.display(), err);
            report.failed += 1;
        }
    }
}
