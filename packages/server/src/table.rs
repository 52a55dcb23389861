//! In-memory incident table.
//!
//! Incidents live for the lifetime of the process. The table can be seeded
//! with the sample incidents embedded from `data/sample_incidents.toml`.

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use disaster_report_filter::{FilterCriteria, apply_filter};
use disaster_report_incident_models::{Incident, IncidentType, Severity};
use serde::Deserialize;
use thiserror::Error;

const SAMPLE_INCIDENTS_TOML: &str = include_str!("../data/sample_incidents.toml");

/// Errors from table writes.
#[derive(Debug, Error)]
pub enum TableError {
    /// An incident with the same id is already stored.
    #[error("Duplicate incident id: {0}")]
    DuplicateId(String),
}

/// Incident rows guarded for concurrent handler access.
#[derive(Debug, Default)]
pub struct IncidentTable {
    rows: RwLock<Vec<Incident>>,
}

impl IncidentTable {
    /// Creates a table holding `incidents`.
    #[must_use]
    pub const fn with_incidents(incidents: Vec<Incident>) -> Self {
        Self {
            rows: RwLock::new(incidents),
        }
    }

    /// Returns the incidents matching `filters`, newest first.
    #[must_use]
    pub fn list(&self, filters: &FilterCriteria) -> Vec<Incident> {
        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
        let mut incidents = apply_filter(&rows, filters);
        drop(rows);
        incidents.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        incidents
    }

    /// Stores a new incident.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::DuplicateId`] if the id is already taken.
    pub fn insert(&self, incident: Incident) -> Result<(), TableError> {
        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        if rows.iter().any(|row| row.id == incident.id) {
            return Err(TableError::DuplicateId(incident.id));
        }
        rows.push(incident);
        Ok(())
    }

    /// Number of stored incidents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Deserialize)]
struct SampleFile {
    incidents: Vec<SampleIncident>,
}

#[derive(Debug, Deserialize)]
struct SampleIncident {
    id: String,
    incident_type: IncidentType,
    severity: Severity,
    description: String,
    latitude: f64,
    longitude: f64,
    reporter_name: Option<String>,
    age_minutes: i64,
}

/// Returns the embedded sample incidents, timestamped relative to `now`.
///
/// # Panics
///
/// Panics if the embedded TOML is malformed (it is fixed at compile time).
#[must_use]
pub fn sample_incidents(now: DateTime<Utc>) -> Vec<Incident> {
    let file: SampleFile = toml::de::from_str(SAMPLE_INCIDENTS_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse sample incidents: {e}"));

    file.incidents
        .into_iter()
        .map(|sample| Incident {
            id: sample.id,
            incident_type: sample.incident_type,
            severity: sample.severity,
            description: sample.description,
            latitude: sample.latitude,
            longitude: sample.longitude,
            reporter_name: sample.reporter_name,
            timestamp: now - Duration::minutes(sample.age_minutes),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn sample_incidents_load() {
        let now = Utc::now();
        let samples = sample_incidents(now);
        assert_eq!(samples.len(), 4);

        let ids: BTreeSet<&str> = samples.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids.len(), samples.len(), "sample ids must be unique");
        assert!(samples.iter().all(|i| i.timestamp < now));
        assert!(samples.iter().all(|i| !i.description.trim().is_empty()));
    }

    #[test]
    fn list_is_newest_first() {
        let table = IncidentTable::with_incidents(sample_incidents(Utc::now()));
        let ids: Vec<String> = table
            .list(&FilterCriteria::default())
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec!["4", "3", "1", "2"]);
    }

    #[test]
    fn insert_rejects_duplicate_id() {
        let table = IncidentTable::with_incidents(sample_incidents(Utc::now()));
        let duplicate = table.list(&FilterCriteria::default()).remove(0);
        assert!(matches!(
            table.insert(duplicate),
            Err(TableError::DuplicateId(_))
        ));
        assert_eq!(table.len(), 4);
    }
}
