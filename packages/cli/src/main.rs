#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the disaster report toolchain.
//!
//! ```text
//! disaster_report list [--type Fire] [--severity Critical] [--start 2024-05-01] [--end ...]
//! disaster_report report --type Flood --severity High --description "..." --lat 40.7 --lng -73.9
//! disaster_report serve [--interactive]
//! ```
//!
//! Running with no subcommand enters interactive mode. The backend is taken
//! from `--backend-url` or `DISASTER_REPORT_BACKEND_URL`.

mod interactive;
mod render;

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dialoguer::Select;
use disaster_report_filter::{FilterUpdate, parse_date_bound};
use disaster_report_incident_models::{IncidentDraft, IncidentType, Location, Severity};
use disaster_report_server::ServerConfig;
use disaster_report_store::{IncidentStore, lock};
use disaster_report_sync::{
    HttpRepository, Repository, RepositoryConfig, RepositoryError, SyncController, SyncError,
};

#[derive(Parser)]
#[command(
    name = "disaster_report",
    about = "Report disaster incidents and browse them with filters"
)]
struct Cli {
    /// Base URL of the incident backend
    #[arg(long, global = true)]
    backend_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List incidents matching the given filters
    List {
        /// Incident type to include (repeatable)
        #[arg(long = "type", value_parser = parse_incident_type)]
        types: Vec<IncidentType>,
        /// Severity to include (repeatable)
        #[arg(long = "severity", value_parser = parse_severity)]
        severities: Vec<Severity>,
        /// First day to include (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,
        /// Last day to include (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,
        /// Ask the backend to filter as well
        #[arg(long)]
        server_side: bool,
        /// Highlight the incident with this id
        #[arg(long)]
        select: Option<String>,
    },
    /// Submit a new incident report
    Report {
        /// Incident type, e.g. "Fire" or "Chemical Spill"
        #[arg(long = "type")]
        incident_type: String,
        /// Severity: Low, Medium, High or Critical
        #[arg(long, default_value = "Medium")]
        severity: String,
        /// What is happening
        #[arg(long)]
        description: String,
        /// Latitude of the incident
        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,
        /// Longitude of the incident
        #[arg(long, allow_negative_numbers = true)]
        lng: Option<f64>,
        /// Name of the reporter
        #[arg(long)]
        reporter: Option<String>,
    },
    /// Start the incident backend
    Serve {
        /// Prompt for server settings
        #[arg(long)]
        interactive: bool,
    },
}

fn parse_incident_type(s: &str) -> Result<IncidentType, String> {
    s.parse().map_err(|_| format!("unknown incident type: {s}"))
}

fn parse_severity(s: &str) -> Result<Severity, String> {
    s.parse().map_err(|_| format!("unknown severity: {s}"))
}

/// Top-level actions offered in interactive mode.
enum Action {
    Browse,
    Report,
    Serve,
}

impl Action {
    const ALL: &[Self] = &[Self::Browse, Self::Report, Self::Serve];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Browse => "Browse incidents",
            Self::Report => "Report an incident",
            Self::Serve => "Start server",
        }
    }
}

/// Builds the store and the controller that feeds it.
fn build_controller(
    backend_url: Option<String>,
    server_side: bool,
) -> Result<SyncController, RepositoryError> {
    let mut config = RepositoryConfig::from_env();
    if let Some(url) = backend_url {
        config.base_url = url;
    }
    log::debug!("Using backend {}", config.base_url);

    let repository: Arc<dyn Repository> = Arc::new(HttpRepository::new(&config)?);
    let store = IncidentStore::shared();
    lock(&store).subscribe(|state| {
        log::debug!(
            "State: {} incidents, {} shown, loading={}, error={:?}",
            state.incidents.len(),
            state.filtered_incidents.len(),
            state.loading,
            state.error
        );
    });

    Ok(SyncController::new(repository, store).with_server_side_filtering(server_side))
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return run_interactive(cli.backend_url).await;
    };

    match command {
        Commands::List {
            types,
            severities,
            start,
            end,
            server_side,
            select,
        } => {
            let controller = build_controller(cli.backend_url, server_side)?;

            let mut update = FilterUpdate::default();
            if !types.is_empty() {
                update = update.types(types);
            }
            if !severities.is_empty() {
                update = update.severities(severities);
            }
            if let Some(start) = start {
                update = update.start(parse_date_bound(&start));
            }
            if let Some(end) = end {
                update = update.end(parse_date_bound(&end));
            }
            lock(controller.store()).set_filters(update);

            let fetched = controller.fetch_all().await;

            let mut store = lock(controller.store());
            if let Some(id) = select {
                let found = store.state().incidents.iter().find(|i| i.id == id).cloned();
                if found.is_none() {
                    log::warn!("No incident with id {id}");
                }
                store.set_selected_incident(found);
            }
            render::print_state(store.state());

            Ok(if fetched.is_ok() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Report {
            incident_type,
            severity,
            description,
            lat,
            lng,
            reporter,
        } => {
            let controller = build_controller(cli.backend_url, false)?;
            let draft = IncidentDraft {
                incident_type,
                severity,
                description,
                location: lat.zip(lng).map(|(latitude, longitude)| Location {
                    latitude,
                    longitude,
                }),
                reporter_name: reporter,
            };

            match controller.create(&draft).await {
                Ok(incident) => {
                    println!("Reported incident {}", incident.id);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e @ SyncError::Validation(_)) => {
                    eprintln!("Invalid report: {e}");
                    Ok(ExitCode::from(2))
                }
                Err(e) => {
                    eprintln!("{e}");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Commands::Serve { interactive } => {
            serve(interactive).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_interactive(
    backend_url: Option<String>,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    println!("Disaster Report");
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Action::ALL[idx] {
        Action::Browse => {
            let controller = build_controller(backend_url, false)?;
            interactive::browse(&controller).await?;
        }
        Action::Report => {
            let controller = build_controller(backend_url, false)?;
            interactive::report(&controller).await?;
        }
        Action::Serve => serve(true).await?,
    }

    Ok(ExitCode::SUCCESS)
}

/// Runs the backend on its own actix system.
///
/// The server uses actix-web's runtime, so it runs in a blocking task to
/// avoid nesting it inside the tokio runtime.
async fn serve(interactive: bool) -> Result<(), Box<dyn std::error::Error>> {
    tokio::task::spawn_blocking(move || {
        actix_web::rt::System::new().block_on(async move {
            if interactive {
                disaster_report_server::interactive::run().await
            } else {
                disaster_report_server::run_server(ServerConfig::from_env()).await
            }
        })
    })
    .await??;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_parses_repeated_type_and_severity_flags() {
        let cli = Cli::try_parse_from([
            "disaster_report",
            "list",
            "--type",
            "Fire",
            "--type",
            "Chemical Spill",
            "--severity",
            "Critical",
        ])
        .unwrap();

        let Some(Commands::List {
            types, severities, ..
        }) = cli.command
        else {
            panic!("expected list subcommand");
        };
        assert_eq!(types, vec![IncidentType::Fire, IncidentType::ChemicalSpill]);
        assert_eq!(severities, vec![Severity::Critical]);
    }

    #[test]
    fn list_rejects_unknown_type() {
        let err = Cli::try_parse_from(["disaster_report", "list", "--type", "Volcano"])
            .err()
            .unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        assert!(parse_incident_type("Volcano").is_err());
        assert_eq!(parse_severity("High"), Ok(Severity::High));
    }

    #[test]
    fn report_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "disaster_report",
            "report",
            "--type",
            "Flood",
            "--description",
            "Levee breach",
            "--lat",
            "-33.86",
            "--lng",
            "-70.65",
        ])
        .unwrap();

        let Some(Commands::Report {
            severity, lat, lng, ..
        }) = cli.command
        else {
            panic!("expected report subcommand");
        };
        assert_eq!(severity, "Medium");
        assert_eq!(lat, Some(-33.86));
        assert_eq!(lng, Some(-70.65));
    }
}
