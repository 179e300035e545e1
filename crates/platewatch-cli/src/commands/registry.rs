//! Registry command - manage people and vehicles.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use console::style;

use platewatch_core::{
    normalize, IncidentId, NewPerson, NewVehicle, PersonId, Registry, VehicleId,
};

use super::{load_config, open_registry};

/// Arguments for the registry command.
#[derive(Args)]
pub struct RegistryArgs {
    /// Registry snapshot file (default from config)
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    #[command(subcommand)]
    command: RegistryCommand,
}

#[derive(Subcommand)]
enum RegistryCommand {
    /// Register a person
    AddPerson {
        /// Display name
        #[arg(long)]
        name: String,
        #[arg(long)]
        age: u32,
        /// Unique control number
        #[arg(long)]
        control_number: String,
        /// Unique email address
        #[arg(long)]
        email: String,
    },

    /// Register a vehicle for a person
    AddVehicle {
        /// Owner id
        #[arg(long)]
        owner: u64,
        #[arg(long)]
        plate: String,
        #[arg(long)]
        make: String,
        #[arg(long)]
        model: String,
        #[arg(long)]
        color: String,
    },

    /// Find the vehicle and owner for a plate
    Lookup {
        /// Plate text (normalized before lookup)
        plate: String,
    },

    /// List registry entries
    List {
        #[arg(value_enum, default_value = "persons")]
        what: ListKind,
    },

    /// Delete a person with their vehicles and incidents
    DeletePerson { id: u64 },

    /// Delete a vehicle with its incidents
    DeleteVehicle { id: u64 },

    /// Delete an incident (the person's count is kept)
    DeleteIncident { id: u64 },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ListKind {
    Persons,
    Vehicles,
    Incidents,
}

pub fn run(args: RegistryArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let registry = open_registry(&config, args.registry.as_deref())?;

    match args.command {
        RegistryCommand::AddPerson {
            name,
            age,
            control_number,
            email,
        } => {
            let person = registry.add_person(NewPerson {
                name,
                age,
                control_number,
                email,
            })?;
            println!(
                "{} Registered person {} ({})",
                style("✓").green(),
                person.id.0,
                person.name
            );
        }
        RegistryCommand::AddVehicle {
            owner,
            plate,
            make,
            model,
            color,
        } => {
            let vehicle = registry.add_vehicle(
                PersonId(owner),
                NewVehicle {
                    plate,
                    make,
                    model,
                    color,
                },
            )?;
            println!(
                "{} Registered vehicle {} with plate {}",
                style("✓").green(),
                vehicle.id.0,
                vehicle.plate
            );
        }
        RegistryCommand::Lookup { plate } => lookup(&registry, &plate)?,
        RegistryCommand::List { what } => list(&registry, what)?,
        RegistryCommand::DeletePerson { id } => {
            let person = registry.delete_person(PersonId(id))?;
            println!("{} Deleted person {} ({})", style("✓").green(), id, person.name);
        }
        RegistryCommand::DeleteVehicle { id } => {
            let vehicle = registry.delete_vehicle(VehicleId(id))?;
            println!("{} Deleted vehicle {} ({})", style("✓").green(), id, vehicle.plate);
        }
        RegistryCommand::DeleteIncident { id } => {
            registry.delete_incident(IncidentId(id))?;
            println!("{} Deleted incident {}", style("✓").green(), id);
        }
    }

    Ok(())
}

fn lookup(registry: &Registry, plate: &str) -> anyhow::Result<()> {
    match registry.resolve(plate) {
        Some(matched) => println!("{}", serde_json::to_string_pretty(&matched)?),
        None => anyhow::bail!("Plate {} is not registered", normalize(plate)),
    }
    Ok(())
}

fn list(registry: &Registry, what: ListKind) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(std::io::stdout());

    match what {
        ListKind::Persons => {
            wtr.write_record(["id", "name", "age", "control_number", "email", "status", "incidents"])?;
            for p in registry.persons() {
                wtr.write_record([
                    p.id.0.to_string(),
                    p.name,
                    p.age.to_string(),
                    p.control_number,
                    p.email,
                    p.status.to_string(),
                    p.incident_count.to_string(),
                ])?;
            }
        }
        ListKind::Vehicles => {
            wtr.write_record(["id", "plate", "make", "model", "color", "owner_id"])?;
            for v in registry.vehicles() {
                wtr.write_record([
                    v.id.0.to_string(),
                    v.plate,
                    v.make,
                    v.model,
                    v.color,
                    v.owner_id.0.to_string(),
                ])?;
            }
        }
        ListKind::Incidents => {
            wtr.write_record([
                "id",
                "date",
                "person_id",
                "vehicle_id",
                "decision",
                "reporter",
                "description",
            ])?;
            for i in registry.incidents() {
                wtr.write_record([
                    i.id.0.to_string(),
                    i.date.to_string(),
                    i.person_id.0.to_string(),
                    i.vehicle_id.0.to_string(),
                    i.decision.to_string(),
                    i.reporter.unwrap_or_default(),
                    i.description,
                ])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}
