//! Plain-text rendering of the store state.

use disaster_report_filter::FilterCriteria;
use disaster_report_incident_models::Incident;
use disaster_report_store::IncidentStoreState;

/// Formats one incident as a list row.
pub fn incident_line(incident: &Incident, selected: bool) -> String {
    let marker = if selected { '>' } else { ' ' };
    let reporter = incident
        .reporter_name
        .as_deref()
        .map(|name| format!(" [{name}]"))
        .unwrap_or_default();

    format!(
        "{marker} {}  {:<8} {:<17} ({:.4}, {:.4})  {}{reporter}",
        incident.timestamp.format("%Y-%m-%d %H:%M"),
        incident.severity.as_ref(),
        incident.incident_type.as_ref(),
        incident.latitude,
        incident.longitude,
        incident.description,
    )
}

/// Describes the active filters in one line.
pub fn filter_summary(filters: &FilterCriteria) -> String {
    if filters.is_empty() {
        return "no filters".to_string();
    }

    let mut parts = Vec::new();
    if !filters.types.is_empty() {
        let types: Vec<String> = filters.types.iter().map(ToString::to_string).collect();
        parts.push(format!("types: {}", types.join(", ")));
    }
    if !filters.severities.is_empty() {
        let severities: Vec<String> = filters
            .severities
            .iter()
            .map(ToString::to_string)
            .collect();
        parts.push(format!("severities: {}", severities.join(", ")));
    }
    let range = filters.date_range;
    if !range.is_unbounded() {
        let start = range.start.map_or_else(|| "…".to_string(), |d| d.to_string());
        let end = range.end.map_or_else(|| "…".to_string(), |d| d.to_string());
        parts.push(format!("dates: {start} to {end}"));
    }
    parts.join("; ")
}

/// Prints the filtered incident list followed by a status line.
pub fn print_state(state: &IncidentStoreState) {
    let selected_id = state.selected_incident.as_ref().map(|i| i.id.as_str());

    for incident in &state.filtered_incidents {
        println!(
            "{}",
            incident_line(incident, selected_id == Some(incident.id.as_str()))
        );
    }

    println!();
    println!(
        "Showing {} of {} incidents ({})",
        state.filtered_incidents.len(),
        state.incidents.len(),
        filter_summary(&state.filters)
    );
    if let Some(error) = &state.error {
        println!("Error: {error}");
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, NaiveDate, Utc};
    use disaster_report_filter::FilterUpdate;
    use disaster_report_incident_models::{IncidentType, Severity};

    use super::*;

    #[test]
    fn formats_incident_row() {
        let incident = Incident {
            id: "3".to_string(),
            incident_type: IncidentType::Explosion,
            severity: Severity::Critical,
            description: "Industrial explosion".to_string(),
            latitude: 40.7282,
            longitude: -74.0776,
            reporter_name: Some("Emergency Services".to_string()),
            timestamp: DateTime::parse_from_rfc3339("2024-03-01T08:15:00Z")
                .unwrap()
                .with_timezone(&Utc),
        };

        let line = incident_line(&incident, true);
        assert!(line.starts_with("> 2024-03-01 08:15  Critical Explosion"));
        assert!(line.contains("(40.7282, -74.0776)"));
        assert!(line.ends_with("Industrial explosion [Emergency Services]"));
    }

    #[test]
    fn summarizes_filters() {
        assert_eq!(filter_summary(&FilterCriteria::default()), "no filters");

        let mut filters = FilterCriteria::default();
        filters.merge(
            FilterUpdate::default()
                .types([IncidentType::Flood])
                .severities([Severity::High, Severity::Critical])
                .start(NaiveDate::from_ymd_opt(2024, 5, 1)),
        );
        assert_eq!(
            filter_summary(&filters),
            "types: Flood; severities: High, Critical; dates: 2024-05-01 to …"
        );
    }
}
