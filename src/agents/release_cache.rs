use crate::error::{PypiError, Result};
use crate::repository::Release;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Last-seen release per package, keyed by package name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReleaseMap {
    entries: BTreeMap<String, Release>,
}

/// Outcome of recording a freshly resolved release
#[derive(Debug, Clone, PartialEq)]
pub enum CacheUpdate {
    /// The package had no entry yet
    Inserted,
    /// A newer release replaced the stored one
    Replaced { previous: Release },
    /// The stored release is at least as recent
    Unchanged,
}

impl ReleaseMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, package_name: &str) -> Option<&Release> {
        self.entries.get(package_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store `release` for `package_name` if it is new or strictly newer.
    ///
    /// Dates decide when both sides have one; otherwise any version change counts.
    pub fn record(&mut self, package_name: &str, release: Release) -> CacheUpdate {
        match self.entries.entry(package_name.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(release);
                CacheUpdate::Inserted
            }
            Entry::Occupied(mut slot) => {
                if supersedes(&release, slot.get()) {
                    let previous = slot.insert(release);
                    CacheUpdate::Replaced { previous }
                } else {
                    CacheUpdate::Unchanged
                }
            }
        }
    }
}

fn supersedes(candidate: &Release, stored: &Release) -> bool {
    match (candidate.version_date, stored.version_date) {
        (Some(new_date), Some(stored_date)) => new_date > stored_date,
        _ => candidate.version != stored.version,
    }
}

/// JSON file holding a [`ReleaseMap`]; the file is rewritten whole on save
pub struct ReleaseCache {
    path: PathBuf,
}

impl ReleaseCache {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cache; a missing file is an empty cache
    pub fn load(&self) -> Result<ReleaseMap> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No release cache at {}, starting empty", self.path.display());
                return Ok(ReleaseMap::new());
            }
            Err(e) => return Err(e.into()),
        };

        let releases: ReleaseMap = serde_json::from_str(&content).map_err(|e| {
            PypiError::CacheRead(format!("{}: {}", self.path.display(), e))
        })?;

        debug!(
            "Loaded {} cached releases from {}",
            releases.len(),
            self.path.display()
        );

        Ok(releases)
    }

    /// Overwrite the cache with `releases` (2-space indented JSON)
    pub fn save(&self, releases: &ReleaseMap) -> Result<()> {
        let mut json = serde_json::to_string_pretty(releases)?;
        json.push('\n');

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Temp file sits in the same directory so the rename stays atomic
        let temp_path = self.temp_path();
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, &self.path)?;

        debug!(
            "Saved {} releases to {}",
            releases.len(),
            self.path.display()
        );
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut file_name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        file_name.push(".tmp");
        self.path.with_file_name(file_name)
    }
}
