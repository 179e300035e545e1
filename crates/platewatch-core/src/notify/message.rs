//! Plain-text rendering of directives.

use serde::{Deserialize, Serialize};

use crate::escalation::{Directive, IncidentSummary};

const SIGNATURE: &str = "Regards,\nVehicle Access Control";

/// A rendered notification, ready for a mail transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Render the subject and body for a directive.
pub fn render(directive: &Directive) -> Message {
    let (subject, body) = match directive {
        Directive::Approved { incident, .. } => (
            format!("Incident approved - report {}", incident.id),
            format!(
                "Hello,\n\n\
                 Your incident report has been approved by an administrator.\n\n\
                 {}\n\
                 Thank you for helping keep the premises in order.\n\n{}",
                details(incident),
                SIGNATURE
            ),
        ),
        Directive::Warning {
            name,
            count,
            threshold,
            incident,
            ..
        } => (
            format!("Incident notice {} of {} - warning", count, threshold),
            format!(
                "Dear {},\n\n\
                 An incident has been recorded against you ({} of {}).\n\n\
                 {}\n\
                 You currently have {} incident(s) on record. Access is blocked \
                 automatically once you reach {}.\n\n{}",
                name,
                count,
                threshold,
                details(incident),
                count,
                threshold,
                SIGNATURE
            ),
        ),
        Directive::Blocked {
            name,
            count,
            incident,
            ..
        } => (
            "ACCESS BLOCKED - incident limit reached".to_string(),
            format!(
                "Dear {},\n\n\
                 A new incident has been recorded and your access is BLOCKED.\n\n\
                 {}\n\
                 You have {} incidents on record. To request reactivation, \
                 please contact an administrator.\n\n{}",
                name,
                details(incident),
                count,
                SIGNATURE
            ),
        ),
        Directive::Rejected { incident, .. } => (
            format!("Incident rejected - report {}", incident.id),
            format!(
                "Hello,\n\n\
                 Your incident report has been reviewed and REJECTED by an administrator.\n\n\
                 - ID: {}\n\
                 - Date: {}\n\
                 - Description: {}\n\n\
                 The report does not meet the review criteria.\n\n{}",
                incident.id, incident.date, incident.description, SIGNATURE
            ),
        ),
    };

    Message {
        to: directive.recipient().to_string(),
        subject,
        body,
    }
}

fn details(incident: &IncidentSummary) -> String {
    format!(
        "Details:\n\
         - ID: {}\n\
         - Date: {}\n\
         - Description: {}\n\
         - Vehicle: {} {}\n\
         - Plate: {}\n",
        incident.id,
        incident.date,
        incident.description,
        incident.make,
        incident.model,
        incident.plate
    )
}
