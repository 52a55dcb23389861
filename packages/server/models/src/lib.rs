#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the disaster report server.
//!
//! Shared by the server handlers and the HTTP repository client so both
//! sides agree on the `/api` contract. Incidents themselves are sent as
//! [`disaster_report_incident_models::Incident`] unchanged.

use chrono::{DateTime, Utc};
use disaster_report_filter::{DateRange, FilterCriteria, parse_date_bound};
use disaster_report_incident_models::{IncidentDraft, Location};
use serde::{Deserialize, Serialize};

/// Error body returned with every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable message.
    pub error: String,
}

impl ApiError {
    /// Creates an error body.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Always `"OK"` when the service answers.
    pub status: String,
    /// Server time.
    pub timestamp: DateTime<Utc>,
}

/// Body of `POST /api/incidents` as received, before validation.
///
/// Every field is optional here so that a missing field produces the
/// `Missing required fields` error instead of a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIncidentRequest {
    /// Incident type name.
    pub incident_type: Option<String>,
    /// Severity name.
    pub severity: Option<String>,
    /// Narrative.
    pub description: Option<String>,
    /// Latitude (WGS84).
    pub latitude: Option<f64>,
    /// Longitude (WGS84).
    pub longitude: Option<f64>,
    /// Optional reporter name.
    pub reporter_name: Option<String>,
}

impl CreateIncidentRequest {
    /// Converts the request into a draft, or `None` if any required field
    /// is missing or empty.
    #[must_use]
    pub fn into_draft(self) -> Option<IncidentDraft> {
        let present = |field: Option<String>| field.filter(|s| !s.is_empty());

        Some(IncidentDraft {
            incident_type: present(self.incident_type)?,
            severity: present(self.severity)?,
            description: present(self.description)?,
            location: Some(Location {
                latitude: self.latitude?,
                longitude: self.longitude?,
            }),
            reporter_name: self.reporter_name,
        })
    }
}

/// Query parameters of `GET /api/incidents`.
///
/// `types` and `severities` may be repeated (`types=Fire&types=Flood`) or
/// comma-separated (`types=Fire,Flood`). Unknown names are ignored, as are
/// unparseable dates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncidentQueryParams {
    /// Incident type names to include.
    pub types: Vec<String>,
    /// Severity names to include.
    pub severities: Vec<String>,
    /// First day included (`YYYY-MM-DD`).
    pub start_date: Option<String>,
    /// Last day included (`YYYY-MM-DD`).
    pub end_date: Option<String>,
}

impl IncidentQueryParams {
    /// Collects parameters from decoded query string pairs.
    #[must_use]
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "types" => params.types.extend(split_list(value)),
                "severities" => params.severities.extend(split_list(value)),
                "startDate" => params.start_date = Some(value.clone()),
                "endDate" => params.end_date = Some(value.clone()),
                other => log::debug!("Ignoring unknown query parameter {other:?}"),
            }
        }
        params
    }

    /// Converts the parameters into filter criteria.
    #[must_use]
    pub fn to_filter_criteria(&self) -> FilterCriteria {
        FilterCriteria {
            types: self.types.iter().filter_map(|s| s.parse().ok()).collect(),
            severities: self
                .severities
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect(),
            date_range: DateRange {
                start: self.start_date.as_deref().and_then(parse_date_bound),
                end: self.end_date.as_deref().and_then(parse_date_bound),
            },
        }
    }
}

fn split_list(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}
