//! The registry of people, vehicles and incidents.
//!
//! [`Registry`] is an in-process store guarded by a single reader/writer
//! lock. Lookups share the lock; every mutation (including a whole
//! escalation transition) holds the write guard for its full duration, so
//! unique constraints are checked and applied atomically and concurrent
//! updates to one person cannot interleave.
//!
//! A registry opened on a snapshot file is write-through: each mutation
//! takes an exclusive lock on the file, reloads it, applies the change and
//! persists the result before the lock is released. Separate processes
//! sharing one snapshot therefore serialize their updates as well.
//! Lookups read the state as of the last open or mutation.

mod snapshot;
mod tables;
mod validation;

pub(crate) use tables::Tables;

use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::RegistryError;
use crate::models::registry::{
    Incident, IncidentId, MatchedRecord, NewPerson, NewVehicle, Person, PersonId, Vehicle,
    VehicleId,
};

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Store for [`Person`], [`Vehicle`] and [`Incident`] entities.
#[derive(Debug, Default)]
pub struct Registry {
    tables: RwLock<Tables>,
    path: Option<PathBuf>,
}

impl Registry {
    /// Create an empty, memory-only registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a registry backed by a JSON snapshot file.
    ///
    /// A missing file yields an empty registry; the file is created by the
    /// first mutation.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let tables = if path.exists() {
            snapshot::load(path)?
        } else {
            debug!("No snapshot at {}, starting empty", path.display());
            Tables::default()
        };

        Ok(Self {
            tables: RwLock::new(tables),
            path: Some(path.to_path_buf()),
        })
    }

    /// Backing snapshot file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write the current state to `path`, e.g. to export a memory-only registry.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let tables = self.tables.read();
        let _lock = snapshot::lock(path)?;
        snapshot::save(&tables, path)
    }

    /// Run `f` with exclusive access to the tables.
    ///
    /// `f` must validate before it mutates: nothing is rolled back if it
    /// returns an error part way through. For a file-backed registry the
    /// tables are reloaded under the file lock first and persisted after
    /// `f` succeeds.
    pub(crate) fn transaction<T>(&self, f: impl FnOnce(&mut Tables) -> Result<T>) -> Result<T> {
        let mut tables = self.tables.write();

        let Some(path) = self.path.as_deref() else {
            return f(&mut tables);
        };

        let _lock = snapshot::lock(path)?;
        if path.exists() {
            *tables = snapshot::load(path)?;
        }

        let out = f(&mut tables)?;
        snapshot::save(&tables, path)?;
        Ok(out)
    }

    /// Register a person. Control number and email must be unused.
    pub fn add_person(&self, new: NewPerson) -> Result<Person> {
        let person = self.transaction(|t| t.insert_person(new))?;
        info!("Registered person {} ({})", person.id, person.control_number);
        Ok(person)
    }

    /// Register a vehicle owned by `owner`. The normalized plate must be unused.
    pub fn add_vehicle(&self, owner: PersonId, new: NewVehicle) -> Result<Vehicle> {
        let vehicle = self.transaction(|t| t.insert_vehicle(owner, new))?;
        info!(
            "Registered vehicle {} with plate {} for person {}",
            vehicle.id, vehicle.plate, owner
        );
        Ok(vehicle)
    }

    /// Look up the vehicle carrying `plate` together with its owner.
    ///
    /// Matching is exact on the normalized key: no tolerance for
    /// look-alike characters. Absence is `None`, never an error.
    pub fn resolve(&self, plate: &str) -> Option<MatchedRecord> {
        let matched = self.tables.read().resolve(plate);
        debug!("Resolved plate {:?}: {}", plate, matched.is_some());
        matched
    }

    pub fn person(&self, id: PersonId) -> Option<Person> {
        self.tables.read().person(id).ok().cloned()
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<Vehicle> {
        self.tables.read().vehicle(id).ok().cloned()
    }

    pub fn incident(&self, id: IncidentId) -> Option<Incident> {
        self.tables.read().incident(id).ok().cloned()
    }

    pub fn persons(&self) -> Vec<Person> {
        self.tables.read().persons().cloned().collect()
    }

    pub fn vehicles(&self) -> Vec<Vehicle> {
        self.tables.read().vehicles().cloned().collect()
    }

    pub fn incidents(&self) -> Vec<Incident> {
        self.tables.read().incidents().cloned().collect()
    }

    /// Vehicles owned by a person.
    pub fn vehicles_of(&self, owner: PersonId) -> Vec<Vehicle> {
        self.tables
            .read()
            .vehicles()
            .filter(|v| v.owner_id == owner)
            .cloned()
            .collect()
    }

    /// Incidents raised against a person.
    pub fn incidents_of(&self, person: PersonId) -> Vec<Incident> {
        self.tables
            .read()
            .incidents()
            .filter(|i| i.person_id == person)
            .cloned()
            .collect()
    }

    /// Delete a person along with their vehicles and incidents.
    pub fn delete_person(&self, id: PersonId) -> Result<Person> {
        let person = self.transaction(|t| t.remove_person(id))?;
        info!("Deleted person {}", id);
        Ok(person)
    }

    /// Delete a vehicle along with the incidents that reference it.
    pub fn delete_vehicle(&self, id: VehicleId) -> Result<Vehicle> {
        let vehicle = self.transaction(|t| t.remove_vehicle(id))?;
        info!("Deleted vehicle {}", id);
        Ok(vehicle)
    }

    /// Delete an incident. The person's counter is left as it is.
    pub fn delete_incident(&self, id: IncidentId) -> Result<Incident> {
        let incident = self.transaction(|t| t.remove_incident(id))?;
        info!("Deleted incident {}", id);
        Ok(incident)
    }
}
