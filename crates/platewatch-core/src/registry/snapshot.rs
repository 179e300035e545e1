//! JSON snapshot file format for the registry.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs4::fs_std::FileExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RegistryError;
use crate::models::registry::{Incident, Person, Vehicle};

use super::tables::{LastIds, Tables};

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    persons: Vec<Person>,
    vehicles: Vec<Vehicle>,
    incidents: Vec<Incident>,

    /// Highest id ever issued per table, so deleted ids are never reused.
    #[serde(default)]
    last_ids: LastIds,
}

/// Exclusive advisory lock on a snapshot, released on drop.
///
/// The lock lives on a sidecar `<snapshot>.lock` file: `save` replaces the
/// snapshot by rename, so a lock on the snapshot itself would not survive
/// the first write.
#[derive(Debug)]
pub(crate) struct SnapshotLock {
    _file: File,
}

fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".lock");
    path.with_file_name(name)
}

/// Block until this process holds the snapshot's lock.
pub(crate) fn lock(path: &Path) -> Result<SnapshotLock, RegistryError> {
    let lock_path = lock_path(path);
    if let Some(dir) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .map_err(|e| RegistryError::Snapshot(format!("{}: {}", dir.display(), e)))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(|e| RegistryError::Snapshot(format!("{}: {}", lock_path.display(), e)))?;
    FileExt::lock_exclusive(&file)
        .map_err(|e| RegistryError::Snapshot(format!("lock {}: {}", lock_path.display(), e)))?;

    Ok(SnapshotLock { _file: file })
}

pub(crate) fn load(path: &Path) -> Result<Tables, RegistryError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| RegistryError::Snapshot(format!("{}: {}", path.display(), e)))?;
    let snapshot: Snapshot = serde_json::from_str(&content)
        .map_err(|e| RegistryError::Snapshot(format!("{}: {}", path.display(), e)))?;

    if snapshot.version != SNAPSHOT_VERSION {
        return Err(RegistryError::Snapshot(format!(
            "unsupported snapshot version {} (expected {})",
            snapshot.version, SNAPSHOT_VERSION
        )));
    }

    debug!(
        "Loaded snapshot {}: {} persons, {} vehicles, {} incidents",
        path.display(),
        snapshot.persons.len(),
        snapshot.vehicles.len(),
        snapshot.incidents.len()
    );

    Tables::from_entities(
        snapshot.persons,
        snapshot.vehicles,
        snapshot.incidents,
        snapshot.last_ids,
    )
}

/// Write the tables to `path` through a temp file in the same directory,
/// so readers never observe a half-written snapshot.
pub(crate) fn save(tables: &Tables, path: &Path) -> Result<(), RegistryError> {
    let snapshot = Snapshot {
        version: SNAPSHOT_VERSION,
        persons: tables.persons().cloned().collect(),
        vehicles: tables.vehicles().cloned().collect(),
        incidents: tables.incidents().cloned().collect(),
        last_ids: tables.last_ids(),
    };

    let content = serde_json::to_string_pretty(&snapshot)
        .map_err(|e| RegistryError::Snapshot(e.to_string()))?;

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .map_err(|e| RegistryError::Snapshot(format!("{}: {}", dir.display(), e)))?;

    let mut file = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| RegistryError::Snapshot(format!("{}: {}", dir.display(), e)))?;
    file.write_all(content.as_bytes())
        .map_err(|e| RegistryError::Snapshot(e.to_string()))?;
    file.persist(path)
        .map_err(|e| RegistryError::Snapshot(format!("{}: {}", path.display(), e)))?;

    debug!("Saved snapshot to {}", path.display());
    Ok(())
}
