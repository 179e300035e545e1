//! Notification directives computed by the escalation engine.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::registry::IncidentId;

/// Which notification to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Tells the reporter their report was approved.
    Approved,
    /// Tells the person an incident was recorded, with their running count.
    Warning,
    /// Tells the person their access is blocked.
    Blocked,
    /// Tells the reporter their report was rejected.
    Rejected,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::Approved => write!(f, "approved"),
            NotificationKind::Warning => write!(f, "warning"),
            NotificationKind::Blocked => write!(f, "blocked"),
            NotificationKind::Rejected => write!(f, "rejected"),
        }
    }
}

/// Incident details carried by every directive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentSummary {
    pub id: IncidentId,
    pub description: String,
    pub date: NaiveDate,
    pub plate: String,
    pub make: String,
    pub model: String,
}

/// An instruction to send one notification. Computing a directive never
/// sends anything; see [`crate::notify`] for delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Directive {
    Approved {
        recipient: String,
        incident: IncidentSummary,
    },
    Warning {
        recipient: String,
        name: String,
        count: u32,
        threshold: u32,
        incident: IncidentSummary,
    },
    Blocked {
        recipient: String,
        name: String,
        count: u32,
        incident: IncidentSummary,
    },
    Rejected {
        recipient: String,
        incident: IncidentSummary,
    },
}

impl Directive {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Directive::Approved { .. } => NotificationKind::Approved,
            Directive::Warning { .. } => NotificationKind::Warning,
            Directive::Blocked { .. } => NotificationKind::Blocked,
            Directive::Rejected { .. } => NotificationKind::Rejected,
        }
    }

    /// Email address the notification goes to.
    pub fn recipient(&self) -> &str {
        match self {
            Directive::Approved { recipient, .. }
            | Directive::Warning { recipient, .. }
            | Directive::Blocked { recipient, .. }
            | Directive::Rejected { recipient, .. } => recipient,
        }
    }

    pub fn incident(&self) -> &IncidentSummary {
        match self {
            Directive::Approved { incident, .. }
            | Directive::Warning { incident, .. }
            | Directive::Blocked { incident, .. }
            | Directive::Rejected { incident, .. } => incident,
        }
    }
}
