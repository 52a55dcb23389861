//! Interactive prompts for browsing and reporting incidents.

use disaster_report_filter::{FilterUpdate, parse_date_bound};
use disaster_report_incident_models::{IncidentDraft, IncidentType, Location, Severity};
use disaster_report_store::lock;
use disaster_report_sync::{SyncController, SyncError};
use dialoguer::{Confirm, Input, MultiSelect, Select};

use crate::render;

/// Prompts for filters, fetches incidents and prints the filtered list.
///
/// # Errors
///
/// Returns an error if a prompt fails.
pub async fn browse(controller: &SyncController) -> Result<(), Box<dyn std::error::Error>> {
    let type_labels: Vec<&str> = IncidentType::all().iter().map(AsRef::as_ref).collect();
    let type_picks = MultiSelect::new()
        .with_prompt("Incident types (none = all)")
        .items(&type_labels)
        .interact()?;

    let severity_labels: Vec<&str> = Severity::all().iter().map(AsRef::as_ref).collect();
    let severity_picks = MultiSelect::new()
        .with_prompt("Severities (none = all)")
        .items(&severity_labels)
        .interact()?;

    let start: String = Input::new()
        .with_prompt("From date (YYYY-MM-DD, blank = any)")
        .allow_empty(true)
        .interact_text()?;
    let end: String = Input::new()
        .with_prompt("To date (YYYY-MM-DD, blank = any)")
        .allow_empty(true)
        .interact_text()?;

    lock(controller.store()).set_filters(
        FilterUpdate::default()
            .types(type_picks.iter().map(|&i| IncidentType::all()[i]))
            .severities(severity_picks.iter().map(|&i| Severity::all()[i]))
            .start(parse_date_bound(&start))
            .end(parse_date_bound(&end)),
    );

    match controller.fetch_all().await {
        Ok(outcome) => log::debug!("Fetch finished: {outcome:?}"),
        Err(e) => log::debug!("Fetch failed: {e}"),
    }
    render::print_state(lock(controller.store()).state());

    Ok(())
}

/// Walks the user through the report form and submits it.
///
/// The form stays open after a failed submission so the user can retry or
/// fix the description.
///
/// # Errors
///
/// Returns an error if a prompt fails.
pub async fn report(controller: &SyncController) -> Result<(), Box<dyn std::error::Error>> {
    let type_labels: Vec<&str> = IncidentType::all().iter().map(AsRef::as_ref).collect();
    let type_idx = Select::new()
        .with_prompt("Incident type")
        .items(&type_labels)
        .default(0)
        .interact()?;

    let severity_labels: Vec<&str> = Severity::all().iter().map(AsRef::as_ref).collect();
    let severity_idx = Select::new()
        .with_prompt("Severity")
        .items(&severity_labels)
        .default(1)
        .interact()?;

    let latitude: f64 = Input::new().with_prompt("Latitude").interact_text()?;
    let longitude: f64 = Input::new().with_prompt("Longitude").interact_text()?;

    let mut draft = IncidentDraft {
        incident_type: type_labels[type_idx].to_string(),
        severity: severity_labels[severity_idx].to_string(),
        description: prompt_description()?,
        location: Some(Location {
            latitude,
            longitude,
        }),
        reporter_name: Some(
            Input::<String>::new()
                .with_prompt("Your name (optional)")
                .allow_empty(true)
                .interact_text()?,
        ),
    };

    loop {
        match controller.create(&draft).await {
            Ok(incident) => {
                println!("Reported incident {}.", incident.id);
                return Ok(());
            }
            Err(SyncError::Validation(e)) => {
                println!("{e}");
                draft.description = prompt_description()?;
            }
            Err(e) => {
                println!("{e}");
                if !Confirm::new()
                    .with_prompt("Try again?")
                    .default(true)
                    .interact()?
                {
                    println!("Report discarded.");
                    return Ok(());
                }
            }
        }
    }
}

fn prompt_description() -> Result<String, dialoguer::Error> {
    Input::new()
        .with_prompt("Description")
        .allow_empty(true)
        .interact_text()
}
