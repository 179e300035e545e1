//! Incident escalation: counts approved incidents per person and blocks
//! access once the threshold is reached.
//!
//! A person is `Authorized` while their approved-incident count is below
//! the threshold (3 by default) and `Blocked` from then on. Nothing in this
//! module lowers a count or unblocks a person.

mod directive;

pub use directive::{Directive, IncidentSummary, NotificationKind};

use tracing::{debug, info, warn};

use crate::error::RegistryError;
use crate::models::config::EscalationConfig;
use crate::models::registry::{
    AccessStatus, Decision, Incident, IncidentFields, IncidentId, Person, PersonId, VehicleId,
};
use crate::registry::{Registry, Tables};

/// Result type for escalation operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Applies incidents to people in a [`Registry`].
///
/// Each operation runs as one registry transaction, so concurrent
/// incidents against the same person never lose an increment.
pub struct EscalationEngine<'a> {
    registry: &'a Registry,
    threshold: u32,
}

impl<'a> EscalationEngine<'a> {
    /// Create an engine with the default threshold of 3.
    pub fn new(registry: &'a Registry) -> Self {
        Self::from_config(registry, &EscalationConfig::default())
    }

    pub fn from_config(registry: &'a Registry, config: &EscalationConfig) -> Self {
        Self {
            registry,
            threshold: config.block_threshold.max(1),
        }
    }

    /// Number of approved incidents that blocks a person.
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Record an already approved incident and escalate the person.
    ///
    /// Creates the incident, bumps the person's count by one, recomputes
    /// their status and returns the updated person with the directive for
    /// them: `Warning` below the threshold, `Blocked` at or past it.
    pub fn record_incident(
        &self,
        person_id: PersonId,
        vehicle_id: VehicleId,
        fields: IncidentFields,
    ) -> Result<(Person, Directive)> {
        self.registry.transaction(|tables| {
            let incident = tables.insert_incident(person_id, vehicle_id, fields, Decision::Approved)?;
            info!(
                "Recorded approved incident {} against person {}",
                incident.id, person_id
            );
            self.escalate(tables, &incident)
        })
    }

    /// File a report for later review. The person is not affected until
    /// the incident is approved with [`decide_incident`](Self::decide_incident).
    pub fn report_incident(
        &self,
        person_id: PersonId,
        vehicle_id: VehicleId,
        fields: IncidentFields,
    ) -> Result<Incident> {
        let incident = self.registry.transaction(|tables| {
            tables.insert_incident(person_id, vehicle_id, fields, Decision::Pending)
        })?;
        info!(
            "Incident {} reported against person {}, pending review",
            incident.id, person_id
        );
        Ok(incident)
    }

    /// Approve or reject a pending incident.
    ///
    /// Approval escalates the person exactly like
    /// [`record_incident`](Self::record_incident) and yields an `Approved`
    /// directive for the reporter (when there is one) followed by the
    /// person's `Warning`/`Blocked` directive. Rejection leaves the person
    /// untouched and yields a `Rejected` directive for the reporter.
    pub fn decide_incident(&self, incident_id: IncidentId, approve: bool) -> Result<Vec<Directive>> {
        self.registry.transaction(|tables| {
            let incident = tables.incident(incident_id)?;
            if incident.decision != Decision::Pending {
                return Err(RegistryError::AlreadyDecided(incident_id));
            }
            let summary = summarize(tables, incident)?;
            let reporter = incident.reporter.clone();

            let mut directives = Vec::with_capacity(2);

            if approve {
                tables.incident_mut(incident_id)?.decision = Decision::Approved;
                let incident = tables.incident(incident_id)?.clone();
                info!("Incident {} approved", incident_id);

                if let Some(recipient) = reporter {
                    directives.push(Directive::Approved {
                        recipient,
                        incident: summary,
                    });
                }
                let (_, directive) = self.escalate(tables, &incident)?;
                directives.push(directive);
            } else {
                tables.incident_mut(incident_id)?.decision = Decision::Rejected;
                info!("Incident {} rejected", incident_id);

                match reporter {
                    Some(recipient) => directives.push(Directive::Rejected {
                        recipient,
                        incident: summary,
                    }),
                    None => debug!("Incident {} has no reporter to notify", incident_id),
                }
            }

            Ok(directives)
        })
    }

    fn escalate(&self, tables: &mut Tables, incident: &Incident) -> Result<(Person, Directive)> {
        let summary = summarize(tables, incident)?;
        let person = tables.person_mut(incident.person_id)?;

        let previous = person.status;
        person.incident_count = person.incident_count.saturating_add(1);
        // Blocked is terminal, even if the threshold has since been raised.
        if previous != AccessStatus::Blocked {
            person.status = AccessStatus::for_count(person.incident_count, self.threshold);
        }

        if previous != person.status {
            warn!(
                "Person {} blocked after {} incidents",
                person.id, person.incident_count
            );
        } else {
            debug!(
                "Person {} now has {} incident(s), status {}",
                person.id, person.incident_count, person.status
            );
        }

        let directive = match person.status {
            AccessStatus::Authorized => Directive::Warning {
                recipient: person.email.clone(),
                name: person.name.clone(),
                count: person.incident_count,
                threshold: self.threshold,
                incident: summary,
            },
            AccessStatus::Blocked => Directive::Blocked {
                recipient: person.email.clone(),
                name: person.name.clone(),
                count: person.incident_count,
                incident: summary,
            },
        };

        Ok((person.clone(), directive))
    }
}

fn summarize(tables: &Tables, incident: &Incident) -> Result<IncidentSummary> {
    let vehicle = tables.vehicle(incident.vehicle_id)?;
    Ok(IncidentSummary {
        id: incident.id,
        description: incident.description.clone(),
        date: incident.date,
        plate: vehicle.plate.clone(),
        make: vehicle.make.clone(),
        model: vehicle.model.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::registry::{NewPerson, NewVehicle};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn setup() -> (Registry, PersonId, VehicleId) {
        let registry = Registry::new();
        let person = registry
            .add_person(NewPerson {
                name: "Marta Ruiz".to_string(),
                age: 34,
                control_number: "EMP-0042".to_string(),
                email: "marta@campus.edu".to_string(),
            })
            .unwrap();
        let vehicle = registry
            .add_vehicle(
                person.id,
                NewVehicle {
                    plate: "JKL-456-7".to_string(),
                    make: "Mazda".to_string(),
                    model: "3".to_string(),
                    color: "red".to_string(),
                },
            )
            .unwrap();
        (registry, person.id, vehicle.id)
    }

    fn fields(reporter: Option<&str>) -> IncidentFields {
        IncidentFields {
            description: "Blocking the loading dock".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            images: Vec::new(),
            reporter: reporter.map(str::to_string),
        }
    }

    #[test]
    fn test_three_incidents_block() {
        let (registry, person, vehicle) = setup();
        let engine = EscalationEngine::new(&registry);

        let mut statuses = Vec::new();
        for expected in 1..=3u32 {
            let (updated, directive) = engine.record_incident(person, vehicle, fields(None)).unwrap();
            assert_eq!(updated.incident_count, expected);
            statuses.push(updated.status);

            match (expected, directive) {
                (1 | 2, Directive::Warning { count, threshold, recipient, .. }) => {
                    assert_eq!(count, expected);
                    assert_eq!(threshold, 3);
                    assert_eq!(recipient, "marta@campus.edu");
                }
                (3, Directive::Blocked { count, .. }) => assert_eq!(count, 3),
                (n, other) => panic!("unexpected directive {other:?} at count {n}"),
            }
        }

        assert_eq!(
            statuses,
            vec![
                AccessStatus::Authorized,
                AccessStatus::Authorized,
                AccessStatus::Blocked
            ]
        );
        assert_eq!(registry.incidents_of(person).len(), 3);
    }

    #[test]
    fn test_past_threshold_still_emits_blocked() {
        let (registry, person, vehicle) = setup();
        let engine = EscalationEngine::new(&registry);
        for _ in 0..3 {
            engine.record_incident(person, vehicle, fields(None)).unwrap();
        }

        let (updated, directive) = engine.record_incident(person, vehicle, fields(None)).unwrap();
        assert_eq!(updated.incident_count, 4);
        assert_eq!(updated.status, AccessStatus::Blocked);
        assert_eq!(directive.kind(), NotificationKind::Blocked);
        assert_eq!(directive.incident().plate, "JKL-456-7");
    }

    #[test]
    fn test_missing_person_or_vehicle_changes_nothing() {
        let (registry, person, vehicle) = setup();
        let engine = EscalationEngine::new(&registry);

        let err = engine
            .record_incident(PersonId(404), vehicle, fields(None))
            .unwrap_err();
        assert!(matches!(err, RegistryError::PersonNotFound(PersonId(404))));

        let err = engine
            .record_incident(person, VehicleId(404), fields(None))
            .unwrap_err();
        assert!(matches!(err, RegistryError::VehicleNotFound(VehicleId(404))));

        assert!(registry.incidents().is_empty());
        assert_eq!(registry.person(person).unwrap().incident_count, 0);
    }

    #[test]
    fn test_report_is_pending_until_decided() {
        let (registry, person, vehicle) = setup();
        let engine = EscalationEngine::new(&registry);

        let incident = engine
            .report_incident(person, vehicle, fields(Some("guard@campus.edu")))
            .unwrap();
        assert_eq!(incident.decision, Decision::Pending);
        assert_eq!(registry.person(person).unwrap().incident_count, 0);

        let directives = engine.decide_incident(incident.id, true).unwrap();
        let kinds: Vec<_> = directives.iter().map(Directive::kind).collect();
        assert_eq!(kinds, vec![NotificationKind::Approved, NotificationKind::Warning]);
        assert_eq!(directives[0].recipient(), "guard@campus.edu");
        assert_eq!(directives[1].recipient(), "marta@campus.edu");

        assert_eq!(registry.incident(incident.id).unwrap().decision, Decision::Approved);
        assert_eq!(registry.person(person).unwrap().incident_count, 1);
    }

    #[test]
    fn test_rejection_never_mutates_person() {
        let (registry, person, vehicle) = setup();
        let engine = EscalationEngine::new(&registry);

        for round in 0..5 {
            let before = registry.person(person).unwrap();
            let incident = engine
                .report_incident(person, vehicle, fields(Some("guard@campus.edu")))
                .unwrap();
            let directives = engine.decide_incident(incident.id, false).unwrap();

            assert_eq!(directives.len(), 1);
            assert_eq!(directives[0].kind(), NotificationKind::Rejected);
            assert_eq!(registry.person(person).unwrap(), before);
            assert_eq!(registry.incident(incident.id).unwrap().decision, Decision::Rejected);

            // Push the person towards and past the threshold between rounds.
            if round < 4 {
                engine.record_incident(person, vehicle, fields(None)).unwrap();
            }
        }
    }

    #[test]
    fn test_rejection_without_reporter_is_silent() {
        let (registry, person, vehicle) = setup();
        let engine = EscalationEngine::new(&registry);
        let incident = engine.report_incident(person, vehicle, fields(None)).unwrap();

        assert!(engine.decide_incident(incident.id, false).unwrap().is_empty());
    }

    #[test]
    fn test_decision_fires_once() {
        let (registry, person, vehicle) = setup();
        let engine = EscalationEngine::new(&registry);
        let incident = engine.report_incident(person, vehicle, fields(None)).unwrap();

        engine.decide_incident(incident.id, true).unwrap();
        assert!(matches!(
            engine.decide_incident(incident.id, true),
            Err(RegistryError::AlreadyDecided(_))
        ));
        assert!(matches!(
            engine.decide_incident(incident.id, false),
            Err(RegistryError::AlreadyDecided(_))
        ));
        assert!(matches!(
            engine.decide_incident(IncidentId(999), true),
            Err(RegistryError::IncidentNotFound(_))
        ));
        assert_eq!(registry.person(person).unwrap().incident_count, 1);
    }

    #[test]
    fn test_deleting_incident_keeps_count() {
        let (registry, person, vehicle) = setup();
        let engine = EscalationEngine::new(&registry);
        let (_, directive) = engine.record_incident(person, vehicle, fields(None)).unwrap();

        registry.delete_incident(directive.incident().id).unwrap();
        assert_eq!(registry.person(person).unwrap().incident_count, 1);
    }

    #[test]
    fn test_custom_threshold() {
        let (registry, person, vehicle) = setup();
        let engine = EscalationEngine::from_config(&registry, &EscalationConfig { block_threshold: 1 });

        let (updated, directive) = engine.record_incident(person, vehicle, fields(None)).unwrap();
        assert_eq!(updated.status, AccessStatus::Blocked);
        assert_eq!(directive.kind(), NotificationKind::Blocked);
    }

    #[test]
    fn test_incidents_through_separate_handles_all_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");

        let a = Registry::open(&path).unwrap();
        let person = a
            .add_person(NewPerson {
                name: "Marta Ruiz".to_string(),
                age: 34,
                control_number: "EMP-0042".to_string(),
                email: "marta@campus.edu".to_string(),
            })
            .unwrap();
        let vehicle = a
            .add_vehicle(
                person.id,
                NewVehicle {
                    plate: "JKL-456-7".to_string(),
                    make: "Mazda".to_string(),
                    model: "3".to_string(),
                    color: "red".to_string(),
                },
            )
            .unwrap();
        let b = Registry::open(&path).unwrap();

        let (_, first) = EscalationEngine::new(&a)
            .record_incident(person.id, vehicle.id, fields(None))
            .unwrap();
        let (updated, second) = EscalationEngine::new(&b)
            .record_incident(person.id, vehicle.id, fields(None))
            .unwrap();
        assert!(matches!(first, Directive::Warning { count: 1, .. }));
        assert!(matches!(second, Directive::Warning { count: 2, .. }));
        assert_eq!(updated.incident_count, 2);

        let reopened = Registry::open(&path).unwrap();
        assert_eq!(reopened.person(person.id).unwrap().incident_count, 2);
        assert_eq!(reopened.incidents_of(person.id).len(), 2);
    }

    #[test]
    fn test_raised_threshold_keeps_person_blocked() {
        let (registry, person, vehicle) = setup();
        let strict = EscalationEngine::new(&registry);
        for _ in 0..3 {
            strict.record_incident(person, vehicle, fields(None)).unwrap();
        }
        assert_eq!(registry.person(person).unwrap().status, AccessStatus::Blocked);

        let lenient = EscalationEngine::from_config(&registry, &EscalationConfig { block_threshold: 5 });
        let (updated, directive) = lenient.record_incident(person, vehicle, fields(None)).unwrap();
        assert_eq!(updated.incident_count, 4);
        assert_eq!(updated.status, AccessStatus::Blocked);
        assert_eq!(directive.kind(), NotificationKind::Blocked);

        // Same through the review path.
        let report = lenient
            .report_incident(person, vehicle, fields(Some("guard@campus.edu")))
            .unwrap();
        let directives = lenient.decide_incident(report.id, true).unwrap();
        assert_eq!(directives[1].kind(), NotificationKind::Blocked);
        assert_eq!(registry.person(person).unwrap().status, AccessStatus::Blocked);
    }

    #[test]
    fn test_concurrent_incidents_on_one_person() {
        const N: u32 = 32;
        let (registry, person, vehicle) = setup();
        let engine = EscalationEngine::new(&registry);

        let mut counts: Vec<u32> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..N)
                .map(|_| {
                    scope.spawn(|| {
                        engine
                            .record_incident(person, vehicle, fields(None))
                            .unwrap()
                            .0
                            .incident_count
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        counts.sort_unstable();

        assert_eq!(counts, (1..=N).collect::<Vec<_>>());
        let final_person = registry.person(person).unwrap();
        assert_eq!(final_person.incident_count, N);
        assert_eq!(final_person.status, AccessStatus::Blocked);
        assert_eq!(registry.incidents_of(person).len(), N as usize);
    }
}
