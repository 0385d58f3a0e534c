//! URL registry: one entry per distinct URL, holding the destination name and
//! the temp files allocated for each of its occurrences.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::utils::{destination_name, normalize_url};

#[derive(Debug)]
pub struct Entry {
    /// Occurrences handed to a fetcher so far; index of the next temp file.
    pub occurrences: usize,
    pub destination: String,
    pub temp_files: Vec<PathBuf>,
}

#[derive(Debug, Default)]
pub struct Registry {
    order: Vec<String>,
    entries: HashMap<String, Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, raw_url: &str, work_dir: &Path) -> Result<String> {
        let url = normalize_url(raw_url);
        let destination = match self.entries.get(&url) {
            Some(entry) => entry.destination.clone(),
            None => destination_name(&url),
        };

        let (_file, temp_path) = tempfile::Builder::new()
            .prefix(&destination)
            .tempfile_in(work_dir)
            .and_then(|file| file.keep().map_err(|err| err.error))
            .with_context(|| format!("Failed to create temp file for {}", url))?;

        log::debug!("Allocated {} for {}", temp_path.display(), url);

        match self.entries.get_mut(&url) {
            Some(entry) => entry.temp_files.push(temp_path),
            None => {
                self.order.push(url.clone());
                self.entries.insert(
                    url.clone(),
                    Entry {
                        occurrences: 0,
                        destination,
                        temp_files: vec![temp_path],
                    },
                );
            }
        }

        Ok(url)
    }

    /// Counts the next occurrence of `url` as dispatched.
    pub fn next_temp_file(&mut self, url: &str) -> Option<PathBuf> {
        let entry = self.entries.get_mut(url)?;
        let path = entry.temp_files.get(entry.occurrences)?.clone();
        entry.occurrences += 1;
        Some(path)
    }

    #[cfg(test)]
    pub fn get(&self, url: &str) -> Option<&Entry> {
        self.entries.get(url)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn into_entries(mut self) -> impl Iterator<Item = (String, Entry)> {
        let order = std::mem::take(&mut self.order);
        order.into_iter().filter_map(move |url| {
            let entry = self.entries.remove(&url)?;
            Some((url, entry))
        })
    }
}
