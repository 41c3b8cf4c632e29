//! Single-file JSON store and the group interchange format.
//!
//! The document shape is `{"groups": [...]}`. A bare top-level array of
//! groups is also accepted on read, since older exports were written that way.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};

use tl_core::Group;

use crate::{Store, StoreError};

#[derive(Serialize)]
struct Document<'a> {
    groups: &'a [Group],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Wrapped { groups: Vec<Group> },
    Bare(Vec<Group>),
}

/// Parses a group collection from either accepted JSON shape.
pub fn parse_groups(input: &str) -> Result<Vec<Group>, serde_json::Error> {
    let payload: Payload = serde_json::from_str(input)?;
    Ok(match payload {
        Payload::Wrapped { groups } | Payload::Bare(groups) => groups,
    })
}

/// Renders groups as a pretty-printed `{"groups": [...]}` document.
pub fn to_json(groups: &[Group]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&Document { groups })
}

/// Reports whether any group in a raw document was stored without an `id`.
fn lacks_ids(contents: &str) -> bool {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(contents) else {
        return false;
    };
    let groups = value.get("groups").unwrap_or(&value);
    groups
        .as_array()
        .is_some_and(|groups| groups.iter().any(|group| group.get("id").is_none()))
}

/// Store backed by one JSON file.
///
/// Writes go to a sibling temp file that is renamed over the target, under an
/// exclusive lock on `<file>.lock`. Call [`JsonStore::lock`] to hold that lock
/// across a load and the save that follows it.
///
/// Groups stored without an `id` get one generated on load, and the file is
/// rewritten right away so later loads see the same ids.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    held_lock: Option<File>,
}

impl JsonStore {
    /// Points the store at `path`. Nothing is read or created until first use.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            held_lock: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Takes the exclusive lock and keeps it until the store is dropped.
    ///
    /// Blocks while another process holds it.
    pub fn lock(&mut self) -> Result<(), StoreError> {
        if self.held_lock.is_none() {
            self.held_lock = Some(self.acquire_lock()?);
            tracing::debug!(path = %self.path.display(), "holding json store lock");
        }
        Ok(())
    }

    /// Locks for a single operation unless the lock is already held.
    fn lock_once(&self) -> Result<Option<File>, StoreError> {
        if self.held_lock.is_some() {
            Ok(None)
        } else {
            self.acquire_lock().map(Some)
        }
    }

    fn acquire_lock(&self) -> Result<File, StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let lock_file = File::create(self.sibling(".lock")).map_err(|e| self.io_error(e))?;
        lock_file.lock_exclusive().map_err(|e| self.io_error(e))?;
        Ok(lock_file)
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(suffix);
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn json_error(&self, source: serde_json::Error) -> StoreError {
        StoreError::Json {
            path: self.path.clone(),
            source,
        }
    }

    /// Reads the file, returning its groups and whether any lacked an id.
    fn read(&self) -> Result<(Vec<Group>, bool), StoreError> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no json store yet");
            return Ok((Vec::new(), false));
        }
        let contents = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        if contents.trim().is_empty() {
            return Ok((Vec::new(), false));
        }
        let groups = parse_groups(&contents).map_err(|e| self.json_error(e))?;
        let missing_ids = !groups.is_empty() && lacks_ids(&contents);
        Ok((groups, missing_ids))
    }

    /// Replaces the file. The caller holds the lock.
    fn write(&self, groups: &[Group]) -> Result<(), StoreError> {
        let rendered = to_json(groups).map_err(|e| self.json_error(e))?;
        let temp_path = self.sibling(".tmp");
        fs::write(&temp_path, rendered).map_err(|e| self.io_error(e))?;
        if let Err(source) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(self.io_error(source));
        }
        Ok(())
    }
}

impl Store for JsonStore {
    fn load(&self) -> Result<Vec<Group>, StoreError> {
        let (groups, missing_ids) = self.read()?;
        if !missing_ids {
            tracing::debug!(groups = groups.len(), path = %self.path.display(), "loaded json store");
            return Ok(groups);
        }

        // Re-read under the lock so a concurrent writer's ids are not overwritten.
        let guard = self.lock_once()?;
        let (groups, missing_ids) = if guard.is_some() {
            self.read()?
        } else {
            (groups, missing_ids)
        };
        if missing_ids {
            self.write(&groups)?;
            tracing::info!(groups = groups.len(), path = %self.path.display(), "persisted generated group ids");
        }
        Ok(groups)
    }

    fn save(&mut self, groups: &[Group]) -> Result<(), StoreError> {
        // Released on drop unless the store holds the lock itself
        let _guard = self.lock_once()?;
        self.write(groups)?;
        tracing::debug!(groups = groups.len(), path = %self.path.display(), "saved json store");
        Ok(())
    }
}
