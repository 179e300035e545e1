//! Entity tables and their unique indexes.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::models::registry::{
    AccessStatus, Decision, Incident, IncidentFields, IncidentId, MatchedRecord, NewPerson,
    NewVehicle, Person, PersonId, Vehicle, VehicleId,
};
use crate::plate::normalize;

use super::validation::EMAIL;

/// All registry state. Every access goes through the `Registry` lock.
#[derive(Debug, Default)]
pub(crate) struct Tables {
    persons: BTreeMap<PersonId, Person>,
    vehicles: BTreeMap<VehicleId, Vehicle>,
    incidents: BTreeMap<IncidentId, Incident>,

    // Unique indexes
    plates: HashMap<String, VehicleId>,
    control_numbers: HashMap<String, PersonId>,
    emails: HashMap<String, PersonId>,

    next_person: u64,
    next_vehicle: u64,
    next_incident: u64,
}

/// Highest id issued so far for each table.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub(crate) struct LastIds {
    pub person: u64,
    pub vehicle: u64,
    pub incident: u64,
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Tables {
    /// Rebuild tables from stored entities, re-checking every unique constraint.
    pub(crate) fn from_entities(
        persons: Vec<Person>,
        vehicles: Vec<Vehicle>,
        incidents: Vec<Incident>,
        last_ids: LastIds,
    ) -> Result<Self, RegistryError> {
        let mut tables = Tables {
            next_person: last_ids.person,
            next_vehicle: last_ids.vehicle,
            next_incident: last_ids.incident,
            ..Tables::default()
        };

        for person in persons {
            tables.index_person(&person)?;
            tables.next_person = tables.next_person.max(person.id.0);
            tables.persons.insert(person.id, person);
        }

        for vehicle in vehicles {
            tables.person(vehicle.owner_id)?;
            tables.index_vehicle(&vehicle)?;
            tables.next_vehicle = tables.next_vehicle.max(vehicle.id.0);
            tables.vehicles.insert(vehicle.id, vehicle);
        }

        for incident in incidents {
            tables.person(incident.person_id)?;
            tables.vehicle(incident.vehicle_id)?;
            tables.next_incident = tables.next_incident.max(incident.id.0);
            tables.incidents.insert(incident.id, incident);
        }

        Ok(tables)
    }

    fn index_person(&mut self, person: &Person) -> Result<(), RegistryError> {
        let control = person.control_number.trim().to_string();
        let email = email_key(&person.email);

        if self.control_numbers.contains_key(&control) {
            return Err(RegistryError::ConstraintViolation {
                field: "control number",
                value: control,
            });
        }
        if self.emails.contains_key(&email) {
            return Err(RegistryError::ConstraintViolation {
                field: "email",
                value: person.email.clone(),
            });
        }

        self.control_numbers.insert(control, person.id);
        self.emails.insert(email, person.id);
        Ok(())
    }

    fn index_vehicle(&mut self, vehicle: &Vehicle) -> Result<(), RegistryError> {
        let key = normalize(&vehicle.plate);
        if key.is_empty() {
            return Err(RegistryError::InvalidField {
                field: "plate",
                reason: format!("'{}' has no letters or digits", vehicle.plate),
            });
        }
        if self.plates.contains_key(&key) {
            return Err(RegistryError::ConstraintViolation {
                field: "plate",
                value: vehicle.plate.clone(),
            });
        }

        self.plates.insert(key, vehicle.id);
        Ok(())
    }

    pub(crate) fn last_ids(&self) -> LastIds {
        LastIds {
            person: self.next_person,
            vehicle: self.next_vehicle,
            incident: self.next_incident,
        }
    }

    pub(crate) fn person(&self, id: PersonId) -> Result<&Person, RegistryError> {
        self.persons.get(&id).ok_or(RegistryError::PersonNotFound(id))
    }

    pub(crate) fn person_mut(&mut self, id: PersonId) -> Result<&mut Person, RegistryError> {
        self.persons
            .get_mut(&id)
            .ok_or(RegistryError::PersonNotFound(id))
    }

    pub(crate) fn vehicle(&self, id: VehicleId) -> Result<&Vehicle, RegistryError> {
        self.vehicles.get(&id).ok_or(RegistryError::VehicleNotFound(id))
    }

    pub(crate) fn incident(&self, id: IncidentId) -> Result<&Incident, RegistryError> {
        self.incidents
            .get(&id)
            .ok_or(RegistryError::IncidentNotFound(id))
    }

    pub(crate) fn incident_mut(&mut self, id: IncidentId) -> Result<&mut Incident, RegistryError> {
        self.incidents
            .get_mut(&id)
            .ok_or(RegistryError::IncidentNotFound(id))
    }

    pub(crate) fn insert_person(&mut self, new: NewPerson) -> Result<Person, RegistryError> {
        if !EMAIL.is_match(new.email.trim()) {
            return Err(RegistryError::InvalidField {
                field: "email",
                reason: format!("'{}' is not an email address", new.email),
            });
        }

        let person = Person {
            id: PersonId(self.next_person + 1),
            name: new.name,
            age: new.age,
            control_number: new.control_number.trim().to_string(),
            email: new.email.trim().to_string(),
            status: AccessStatus::Authorized,
            incident_count: 0,
        };

        self.index_person(&person)?;
        self.next_person += 1;
        self.persons.insert(person.id, person.clone());
        Ok(person)
    }

    pub(crate) fn insert_vehicle(
        &mut self,
        owner_id: PersonId,
        new: NewVehicle,
    ) -> Result<Vehicle, RegistryError> {
        self.person(owner_id)?;

        let vehicle = Vehicle {
            id: VehicleId(self.next_vehicle + 1),
            plate: new.plate,
            make: new.make,
            model: new.model,
            color: new.color,
            owner_id,
        };

        self.index_vehicle(&vehicle)?;
        self.next_vehicle += 1;
        self.vehicles.insert(vehicle.id, vehicle.clone());
        Ok(vehicle)
    }

    /// Append an incident. Person and vehicle must exist.
    pub(crate) fn insert_incident(
        &mut self,
        person_id: PersonId,
        vehicle_id: VehicleId,
        fields: IncidentFields,
        decision: Decision,
    ) -> Result<Incident, RegistryError> {
        self.person(person_id)?;
        self.vehicle(vehicle_id)?;

        let incident = Incident {
            id: IncidentId(self.next_incident + 1),
            description: fields.description,
            date: fields.date,
            images: fields.images,
            person_id,
            vehicle_id,
            decision,
            reporter: fields.reporter,
            reported_at: Utc::now(),
        };

        self.next_incident += 1;
        self.incidents.insert(incident.id, incident.clone());
        Ok(incident)
    }

    pub(crate) fn resolve(&self, plate: &str) -> Option<MatchedRecord> {
        let vehicle = self.vehicles.get(self.plates.get(&normalize(plate))?)?;
        let owner = self.persons.get(&vehicle.owner_id)?;
        Some(MatchedRecord {
            vehicle: vehicle.clone(),
            owner: owner.clone(),
        })
    }

    pub(crate) fn persons(&self) -> impl Iterator<Item = &Person> {
        self.persons.values()
    }

    pub(crate) fn vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values()
    }

    pub(crate) fn incidents(&self) -> impl Iterator<Item = &Incident> {
        self.incidents.values()
    }

    pub(crate) fn remove_person(&mut self, id: PersonId) -> Result<Person, RegistryError> {
        let person = self
            .persons
            .remove(&id)
            .ok_or(RegistryError::PersonNotFound(id))?;

        self.control_numbers.remove(&person.control_number);
        self.emails.remove(&email_key(&person.email));

        let owned: Vec<VehicleId> = self
            .vehicles
            .values()
            .filter(|v| v.owner_id == id)
            .map(|v| v.id)
            .collect();
        for vehicle_id in owned {
            self.remove_vehicle(vehicle_id)?;
        }
        self.incidents.retain(|_, incident| incident.person_id != id);

        Ok(person)
    }

    pub(crate) fn remove_vehicle(&mut self, id: VehicleId) -> Result<Vehicle, RegistryError> {
        let vehicle = self
            .vehicles
            .remove(&id)
            .ok_or(RegistryError::VehicleNotFound(id))?;

        self.plates.remove(&normalize(&vehicle.plate));
        self.incidents.retain(|_, incident| incident.vehicle_id != id);

        Ok(vehicle)
    }

    pub(crate) fn remove_incident(&mut self, id: IncidentId) -> Result<Incident, RegistryError> {
        self.incidents
            .remove(&id)
            .ok_or(RegistryError::IncidentNotFound(id))
    }
}
