use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::tle::{parse_tle_lines, ElementSet, Provenance, TleError};

/// On-disk copy of the last successfully downloaded element set.
///
/// The file holds exactly three lines; its modification time is the
/// freshness signal.
pub struct TleCache {
    path: PathBuf,
    expiration: Duration,
}

impl TleCache {
    pub fn new(path: PathBuf, expiration: Duration) -> Self {
        Self { path, expiration }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Age of the cache file, `None` when it does not exist.
    pub fn age_at(&self, now: SystemTime) -> Option<Duration> {
        let modified = fs::metadata(&self.path).and_then(|m| m.modified()).ok()?;
        // A timestamp in the future counts as brand new.
        Some(now.duration_since(modified).unwrap_or(Duration::ZERO))
    }

    pub fn is_fresh_at(&self, now: SystemTime) -> bool {
        self.age_at(now)
            .map(|age| age < self.expiration)
            .unwrap_or(false)
    }

    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(SystemTime::now())
    }

    pub fn read(&self) -> Result<ElementSet, TleError> {
        let content = fs::read_to_string(&self.path)?;
        let (name, line1, line2) = parse_tle_lines(&content)?;
        ElementSet::parse(&name, &line1, &line2, Provenance::Cache)
    }

    /// Overwrite the cache. Writes to a sibling temp file first so readers
    /// never observe a half-written set.
    pub fn write(&self, elements: &ElementSet) -> Result<(), TleError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, elements.to_cache_text())?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
