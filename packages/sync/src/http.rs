//! [`Repository`] implementation over the `/api/incidents` HTTP contract.

use std::time::Duration;

use async_trait::async_trait;
use disaster_report_filter::FilterCriteria;
use disaster_report_incident_models::{Incident, NewIncident};
use disaster_report_server_models::ApiError;
use serde::de::DeserializeOwned;

use crate::{Repository, RepositoryError};

/// Backend used when `DISASTER_REPORT_BACKEND_URL` is not set.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3001";

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 500;

/// Connection settings for [`HttpRepository`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// Base URL of the backend, without the `/api` suffix.
    pub base_url: String,
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            timeout: None,
        }
    }
}

impl RepositoryConfig {
    /// Reads `DISASTER_REPORT_BACKEND_URL` and `DISASTER_REPORT_TIMEOUT_SECS`,
    /// falling back to the defaults for anything unset or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = std::env::var("DISASTER_REPORT_BACKEND_URL")
            .unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string());
        let timeout = std::env::var("DISASTER_REPORT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs);

        Self { base_url, timeout }
    }
}

/// Talks to the repository service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRepository {
    client: reqwest::Client,
    incidents_url: String,
}

impl HttpRepository {
    /// Builds a client for the backend described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &RepositoryConfig) -> Result<Self, RepositoryError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            incidents_url: format!("{}/api/incidents", config.base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl Repository for HttpRepository {
    async fn list(&self, filters: &FilterCriteria) -> Result<Vec<Incident>, RepositoryError> {
        let params = list_query(filters);
        log::debug!("GET {} {params:?}", self.incidents_url);

        let response = self
            .client
            .get(&self.incidents_url)
            .query(&params)
            .send()
            .await?;

        read_json(response).await
    }

    async fn create(&self, incident: &NewIncident) -> Result<Incident, RepositoryError> {
        log::debug!("POST {}", self.incidents_url);

        let response = self
            .client
            .post(&self.incidents_url)
            .json(incident)
            .send()
            .await?;

        read_json(response).await
    }
}

/// Builds the query string pairs for `GET /api/incidents`.
///
/// Types and severities are sent as repeated parameters; date bounds as
/// `YYYY-MM-DD`.
fn list_query(filters: &FilterCriteria) -> Vec<(&'static str, String)> {
    let mut params: Vec<(&'static str, String)> = Vec::new();

    params.extend(filters.types.iter().map(|ty| ("types", ty.to_string())));
    params.extend(
        filters
            .severities
            .iter()
            .map(|severity| ("severities", severity.to_string())),
    );
    if let Some(start) = filters.date_range.start {
        params.push(("startDate", start.to_string()));
    }
    if let Some(end) = filters.date_range.end {
        params.push(("endDate", end.to_string()));
    }

    params
}

/// Reads a JSON response, turning non-success statuses into
/// [`RepositoryError::Status`] with the server's `error` message.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, RepositoryError> {
    let url = response.url().to_string();
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ApiError>(&text).map_or_else(
            |_| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            },
            |body| body.error,
        );
        log::warn!("{url} returned HTTP {status}: {message}");
        return Err(RepositoryError::Status {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&text).map_err(|e| {
        let preview: String = text.chars().take(BODY_PREVIEW_LEN).collect();
        log::error!(
            "JSON parse failed.\n  \
             url: {url}\n  \
             status: {status}\n  \
             parse error: {e}\n  \
             body preview: {preview}"
        );
        RepositoryError::Json(e)
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use disaster_report_filter::FilterUpdate;
    use disaster_report_incident_models::{IncidentType, Severity};

    use super::*;

    #[test]
    fn empty_filters_send_no_params() {
        assert!(list_query(&FilterCriteria::default()).is_empty());
    }

    #[test]
    fn filters_become_repeated_params() {
        let mut filters = FilterCriteria::default();
        filters.merge(
            FilterUpdate::default()
                .types([IncidentType::Fire, IncidentType::ChemicalSpill])
                .severities([Severity::Critical])
                .start(NaiveDate::from_ymd_opt(2024, 5, 1))
                .end(NaiveDate::from_ymd_opt(2024, 5, 31)),
        );

        assert_eq!(
            list_query(&filters),
            vec![
                ("types", "Fire".to_string()),
                ("types", "Chemical Spill".to_string()),
                ("severities", "Critical".to_string()),
                ("startDate", "2024-05-01".to_string()),
                ("endDate", "2024-05-31".to_string()),
            ]
        );
    }

    #[test]
    fn base_url_trailing_slash_is_ignored() {
        let repo = HttpRepository::new(&RepositoryConfig {
            base_url: "http://example.test:3001/".to_string(),
            timeout: Some(Duration::from_secs(5)),
        })
        .unwrap();
        assert_eq!(repo.incidents_url, "http://example.test:3001/api/incidents");
    }
}
