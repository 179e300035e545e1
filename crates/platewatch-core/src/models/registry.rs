//! Registry entities: people, their vehicles, and incidents raised against them.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "#{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

entity_id!(
    /// Identifier of a registered person.
    PersonId
);
entity_id!(
    /// Identifier of a registered vehicle.
    VehicleId
);
entity_id!(
    /// Identifier of a reported incident.
    IncidentId
);

/// Access status of a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessStatus {
    #[default]
    Authorized,
    Blocked,
}

impl AccessStatus {
    /// Status implied by an incident count under the given threshold.
    pub fn for_count(count: u32, threshold: u32) -> Self {
        if count >= threshold {
            Self::Blocked
        } else {
            Self::Authorized
        }
    }
}

impl fmt::Display for AccessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessStatus::Authorized => write!(f, "authorized"),
            AccessStatus::Blocked => write!(f, "blocked"),
        }
    }
}

/// A registered person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,

    /// Display name.
    pub name: String,

    pub age: u32,

    /// Institutional control number (unique).
    pub control_number: String,

    /// Contact email (unique).
    pub email: String,

    /// Current access status. Only the escalation engine changes it.
    pub status: AccessStatus,

    /// Number of approved incidents. Never decreases.
    pub incident_count: u32,
}

/// A registered vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,

    /// Plate as it was registered. Comparisons go through `plate::normalize`.
    pub plate: String,

    pub make: String,
    pub model: String,
    pub color: String,

    /// Owning person.
    pub owner_id: PersonId,
}

/// Review state of an incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Pending => write!(f, "pending"),
            Decision::Approved => write!(f, "approved"),
            Decision::Rejected => write!(f, "rejected"),
        }
    }
}

/// A violation reported against a person and one of their vehicles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: IncidentId,
    pub description: String,

    /// Date the incident happened.
    pub date: NaiveDate,

    /// References to evidence images (paths or URLs).
    #[serde(default)]
    pub images: Vec<String>,

    pub person_id: PersonId,
    pub vehicle_id: VehicleId,

    pub decision: Decision,

    /// Email of whoever raised the report.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporter: Option<String>,

    /// When the report entered the registry.
    pub reported_at: DateTime<Utc>,
}

/// Fields needed to register a person.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPerson {
    pub name: String,
    pub age: u32,
    pub control_number: String,
    pub email: String,
}

/// Fields needed to register a vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVehicle {
    pub plate: String,
    pub make: String,
    pub model: String,
    pub color: String,
}

/// Descriptive fields of an incident report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentFields {
    pub description: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub reporter: Option<String>,
}

/// A vehicle together with its owner, as returned by plate resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedRecord {
    pub vehicle: Vehicle,
    pub owner: Person,
}
