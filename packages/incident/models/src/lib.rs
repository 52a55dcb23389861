#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Disaster incident types, severity levels, and report validation.
//!
//! This crate defines the incident record shared by the store, the sync
//! controller, and the repository service, along with the fixed incident
//! type taxonomy and the severity scale. Wire names match the JSON contract
//! of the `/api/incidents` endpoints exactly (`"Chemical Spill"`,
//! `"Critical"`, etc).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Urgency of an incident, ordered from least to most urgent.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Severity {
    /// Minor incident, no immediate danger.
    Low,
    /// Needs attention but is contained.
    Medium,
    /// Significant danger to people or property.
    High,
    /// Life-threatening, requires immediate response.
    Critical,
}

impl Severity {
    /// Returns all variants of this enum, least urgent first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Low, Self::Medium, Self::High, Self::Critical]
    }
}

/// The kind of disaster being reported.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum IncidentType {
    Fire,
    Flood,
    Earthquake,
    Hurricane,
    Tornado,
    Landslide,
    Explosion,
    #[serde(rename = "Chemical Spill")]
    #[strum(serialize = "Chemical Spill")]
    ChemicalSpill,
    #[serde(rename = "Medical Emergency")]
    #[strum(serialize = "Medical Emergency")]
    MedicalEmergency,
    Other,
}

impl IncidentType {
    /// Returns all variants of this enum in display order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Fire,
            Self::Flood,
            Self::Earthquake,
            Self::Hurricane,
            Self::Tornado,
            Self::Landslide,
            Self::Explosion,
            Self::ChemicalSpill,
            Self::MedicalEmergency,
            Self::Other,
        ]
    }
}

/// A reported incident as stored by the repository.
///
/// Immutable once created: `id` and `timestamp` are assigned by the
/// repository and never change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    /// Opaque unique identifier.
    pub id: String,
    /// Kind of disaster.
    pub incident_type: IncidentType,
    /// Urgency.
    pub severity: Severity,
    /// Free-text narrative.
    pub description: String,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Name of the person who filed the report, if given.
    #[serde(default)]
    pub reporter_name: Option<String>,
    /// When the repository accepted the report.
    pub timestamp: DateTime<Utc>,
}

impl Incident {
    /// Builds the stored record for a validated report.
    #[must_use]
    pub fn from_new(new: NewIncident, id: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            incident_type: new.incident_type,
            severity: new.severity,
            description: new.description,
            latitude: new.latitude,
            longitude: new.longitude,
            reporter_name: new.reporter_name,
            timestamp,
        }
    }
}

/// A point picked on the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
}

/// An unvalidated incident report as entered in a submission form.
///
/// Type and severity are kept as the raw text the user picked so that
/// [`IncidentDraft::validate`] can reject unknown values before anything
/// is sent to the repository.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentDraft {
    /// Selected incident type name.
    pub incident_type: String,
    /// Selected severity name.
    pub severity: String,
    /// Narrative, untrimmed.
    pub description: String,
    /// Location picked on the map, if any.
    pub location: Option<Location>,
    /// Optional reporter name, untrimmed.
    pub reporter_name: Option<String>,
}

/// A validated report, ready to be sent to the repository.
///
/// This is the body of `POST /api/incidents`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIncident {
    /// Kind of disaster.
    pub incident_type: IncidentType,
    /// Urgency.
    pub severity: Severity,
    /// Trimmed, non-empty narrative.
    pub description: String,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Trimmed reporter name, `None` when blank.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporter_name: Option<String>,
}

/// Reasons a draft report is rejected before submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No location was picked on the map.
    #[error("Please select a location on the map")]
    MissingLocation,

    /// No incident type was selected.
    #[error("Please select an incident type")]
    MissingIncidentType,

    /// The incident type is not one of the known types.
    #[error("Unknown incident type: {0}")]
    UnknownIncidentType(String),

    /// The severity is not one of the known levels.
    #[error("Unknown severity: {0}")]
    UnknownSeverity(String),

    /// The description is empty or whitespace.
    #[error("Please provide a description")]
    EmptyDescription,
}

impl IncidentDraft {
    /// Checks the draft and converts it into a [`NewIncident`].
    ///
    /// Checks run in form order: location, incident type, severity, then
    /// description. The description and reporter name are trimmed; a blank
    /// reporter name becomes `None`.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] encountered.
    pub fn validate(&self) -> Result<NewIncident, ValidationError> {
        let location = self.location.ok_or(ValidationError::MissingLocation)?;

        let type_name = self.incident_type.trim();
        if type_name.is_empty() {
            return Err(ValidationError::MissingIncidentType);
        }
        let incident_type: IncidentType = type_name
            .parse()
            .map_err(|_| ValidationError::UnknownIncidentType(type_name.to_string()))?;

        let severity_name = self.severity.trim();
        let severity: Severity = severity_name
            .parse()
            .map_err(|_| ValidationError::UnknownSeverity(severity_name.to_string()))?;

        let description = self.description.trim();
        if description.is_empty() {
            return Err(ValidationError::EmptyDescription);
        }

        let reporter_name = self
            .reporter_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(ToString::to_string);

        Ok(NewIncident {
            incident_type,
            severity,
            description: description.to_string(),
            latitude: location.latitude,
            longitude: location.longitude,
            reporter_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> IncidentDraft {
        IncidentDraft {
            incident_type: "Chemical Spill".to_string(),
            severity: "High".to_string(),
            description: "  Tanker overturned on the interstate  ".to_string(),
            location: Some(Location {
                latitude: 40.7282,
                longitude: -74.0776,
            }),
            reporter_name: Some("   ".to_string()),
        }
    }

    #[test]
    fn severity_is_ordered_by_urgency() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
        assert_eq!(Severity::all().iter().max(), Some(&Severity::Critical));
    }

    #[test]
    fn incident_type_names_round_trip_through_strum() {
        for ty in IncidentType::all() {
            let parsed: IncidentType = ty.to_string().parse().unwrap();
            assert_eq!(parsed, *ty);
        }
        assert_eq!(IncidentType::MedicalEmergency.as_ref(), "Medical Emergency");
        assert!("Meteor".parse::<IncidentType>().is_err());
    }

    #[test]
    fn incident_uses_wire_field_names() {
        let json = r#"{
            "id": "1",
            "incidentType": "Chemical Spill",
            "severity": "Critical",
            "description": "Leak at plant",
            "latitude": 40.7,
            "longitude": -74.0,
            "reporterName": null,
            "timestamp": "2024-01-01T12:00:00.000Z"
        }"#;
        let incident: Incident = serde_json::from_str(json).unwrap();
        assert_eq!(incident.incident_type, IncidentType::ChemicalSpill);
        assert_eq!(incident.severity, Severity::Critical);
        assert!(incident.reporter_name.is_none());

        let value = serde_json::to_value(&incident).unwrap();
        assert_eq!(value["incidentType"], "Chemical Spill");
        assert!(value["reporterName"].is_null());
    }

    #[test]
    fn validate_trims_and_drops_blank_reporter() {
        let new = draft().validate().unwrap();
        assert_eq!(new.incident_type, IncidentType::ChemicalSpill);
        assert_eq!(new.severity, Severity::High);
        assert_eq!(new.description, "Tanker overturned on the interstate");
        assert!(new.reporter_name.is_none());
    }

    #[test]
    fn validate_rejects_missing_location_first() {
        let mut d = draft();
        d.location = None;
        d.description = String::new();
        assert_eq!(d.validate(), Err(ValidationError::MissingLocation));
    }

    #[test]
    fn validate_rejects_missing_and_unknown_type() {
        let mut d = draft();
        d.incident_type = String::new();
        assert_eq!(d.validate(), Err(ValidationError::MissingIncidentType));

        d.incident_type = "Volcano".to_string();
        assert_eq!(
            d.validate(),
            Err(ValidationError::UnknownIncidentType("Volcano".to_string()))
        );
    }

    #[test]
    fn validate_rejects_unknown_severity() {
        let mut d = draft();
        d.severity = "Extreme".to_string();
        assert_eq!(
            d.validate(),
            Err(ValidationError::UnknownSeverity("Extreme".to_string()))
        );
    }

    #[test]
    fn validate_rejects_blank_description() {
        let mut d = draft();
        d.description = " \n\t ".to_string();
        assert_eq!(d.validate(), Err(ValidationError::EmptyDescription));
    }

    #[test]
    fn new_incident_omits_absent_reporter_on_the_wire() {
        let new = draft().validate().unwrap();
        let value = serde_json::to_value(&new).unwrap();
        assert_eq!(value["incidentType"], "Chemical Spill");
        assert!(value.get("reporterName").is_none());
    }
}
