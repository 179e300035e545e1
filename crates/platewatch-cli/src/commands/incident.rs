//! Incident command - report, record and review incidents.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand};
use console::style;
use tracing::debug;

use platewatch_core::{
    dispatch, AccessStatus, Directive, EscalationEngine, IncidentFields, IncidentId, PersonId,
    VehicleId,
};

use super::{load_config, notifier, open_registry};

/// Arguments for the incident command.
#[derive(Args)]
pub struct IncidentArgs {
    /// Registry snapshot file (default from config)
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    #[command(subcommand)]
    command: IncidentCommand,
}

#[derive(Subcommand)]
enum IncidentCommand {
    /// File a report for later review
    Report(IncidentInput),

    /// Record an approved incident and escalate immediately
    Record(IncidentInput),

    /// Approve or reject a pending report
    Decide {
        /// Incident id
        id: u64,

        /// Approve the report
        #[arg(long, conflicts_with = "reject", required_unless_present = "reject")]
        approve: bool,

        /// Reject the report
        #[arg(long)]
        reject: bool,
    },
}

#[derive(Args)]
struct IncidentInput {
    /// Person the incident is raised against
    #[arg(long)]
    person: u64,

    /// Vehicle involved
    #[arg(long)]
    vehicle: u64,

    /// What happened
    #[arg(long)]
    description: String,

    /// Date of the incident, YYYY-MM-DD (default: today)
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Evidence image reference (repeatable)
    #[arg(long = "image")]
    images: Vec<String>,

    /// Email of the person reporting
    #[arg(long)]
    reporter: Option<String>,
}

impl IncidentInput {
    fn into_parts(self) -> (PersonId, VehicleId, IncidentFields) {
        let fields = IncidentFields {
            description: self.description,
            date: self
                .date
                .unwrap_or_else(|| chrono::Local::now().date_naive()),
            images: self.images,
            reporter: self.reporter,
        };
        (PersonId(self.person), VehicleId(self.vehicle), fields)
    }
}

pub fn run(args: IncidentArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let registry = open_registry(&config, args.registry.as_deref())?;
    let engine = EscalationEngine::from_config(&registry, &config.escalation);

    let directives = match args.command {
        IncidentCommand::Report(input) => {
            let (person, vehicle, fields) = input.into_parts();
            let incident = engine.report_incident(person, vehicle, fields)?;
            println!(
                "{} Reported incident {} (pending review)",
                style("✓").green(),
                incident.id.0
            );
            Vec::new()
        }
        IncidentCommand::Record(input) => {
            let (person, vehicle, fields) = input.into_parts();
            let (person, directive) = engine.record_incident(person, vehicle, fields)?;
            println!(
                "{} Recorded incident {} against {}: {} of {} incident(s), status {}",
                style("✓").green(),
                directive.incident().id.0,
                person.name,
                person.incident_count,
                engine.threshold(),
                status_label(person.status)
            );
            vec![directive]
        }
        IncidentCommand::Decide { id, approve, .. } => {
            let directives = engine.decide_incident(IncidentId(id), approve)?;
            println!(
                "{} Incident {} {}",
                style("✓").green(),
                id,
                if approve { "approved" } else { "rejected" }
            );
            directives
        }
    };

    notify(&config, &directives);
    Ok(())
}

fn notify(config: &platewatch_core::PlatewatchConfig, directives: &[Directive]) {
    if directives.is_empty() {
        return;
    }

    let delivered = dispatch(notifier(config).as_ref(), directives);
    debug!("Delivered {}/{} notifications", delivered, directives.len());

    for directive in directives {
        println!(
            "  {} {} notification for {}",
            style("→").cyan(),
            directive.kind(),
            directive.recipient()
        );
    }
}

fn status_label(status: AccessStatus) -> String {
    match status {
        AccessStatus::Authorized => style(status).green().to_string(),
        AccessStatus::Blocked => style(status).red().bold().to_string(),
    }
}
