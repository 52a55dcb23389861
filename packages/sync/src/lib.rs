#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Sync controller bridging the incident store to the incident repository.
//!
//! The [`Repository`] trait is the seam to the backend; [`HttpRepository`]
//! implements it against the `/api/incidents` HTTP contract. The
//! [`SyncController`] owns the request lifecycle: it flips the store's
//! `loading`/`error` status, applies results, and translates every failure
//! into the store's `error` field.

pub mod controller;
pub mod http;

use async_trait::async_trait;
use disaster_report_filter::FilterCriteria;
use disaster_report_incident_models::{Incident, NewIncident, ValidationError};

pub use controller::{FetchOutcome, SyncController};
pub use http::{HttpRepository, RepositoryConfig};

/// Errors from a repository call.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The request could not be sent or the response not read.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The repository answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status {
        /// Numeric HTTP status.
        status: u16,
        /// Message from the `{"error": ...}` body, or the status reason.
        message: String,
    },

    /// The response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors surfaced by [`SyncController`] operations.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The draft was rejected before any request was made.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Listing incidents failed.
    #[error("Failed to fetch incidents: {0}")]
    Fetch(#[source] RepositoryError),

    /// Creating an incident failed.
    #[error("Failed to create incident: {0}")]
    Create(#[source] RepositoryError),
}

/// The backend store of incidents.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Lists incidents, newest first.
    ///
    /// `filters` may be applied server-side; callers must not rely on it
    /// and re-filter the result themselves.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] if the request fails.
    async fn list(&self, filters: &FilterCriteria) -> Result<Vec<Incident>, RepositoryError>;

    /// Persists a validated report and returns the stored incident with
    /// its assigned `id` and `timestamp`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] if the request fails.
    async fn create(&self, incident: &NewIncident) -> Result<Incident, RepositoryError>;
}
