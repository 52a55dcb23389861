//! Request lifecycle for fetching and creating incidents.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use disaster_report_filter::FilterCriteria;
use disaster_report_incident_models::{Incident, IncidentDraft};
use disaster_report_store::{SharedStore, lock};

use crate::{Repository, SyncError};

/// What happened to the result of a [`SyncController::fetch_all`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The result replaced the store's incidents.
    Applied {
        /// Number of incidents received.
        count: usize,
    },
    /// A later fetch was issued before this one resolved, so the result was
    /// discarded.
    Superseded,
}

/// Orchestrates repository requests and applies their results to the
/// store.
///
/// Each `fetch_all` is tagged with a sequence number when issued; only the
/// most recently issued fetch may replace the store's incidents, so a slow
/// earlier response can never overwrite a newer one. The store's `loading`
/// flag stays on until every outstanding request has settled.
pub struct SyncController {
    repository: Arc<dyn Repository>,
    store: SharedStore,
    latest_fetch: AtomicU64,
    server_side_filtering: bool,
}

impl std::fmt::Debug for SyncController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncController")
            .field("latest_fetch", &self.latest_fetch)
            .field("server_side_filtering", &self.server_side_filtering)
            .finish_non_exhaustive()
    }
}

impl SyncController {
    /// Creates a controller that applies results to `store`.
    #[must_use]
    pub fn new(repository: Arc<dyn Repository>, store: SharedStore) -> Self {
        Self {
            repository,
            store,
            latest_fetch: AtomicU64::new(0),
            server_side_filtering: false,
        }
    }

    /// Sends the store's current filters with every fetch so the
    /// repository can narrow the result.
    ///
    /// The result is still re-filtered locally. With this enabled, widening
    /// the filters afterwards requires another fetch to see incidents the
    /// repository left out.
    #[must_use]
    pub const fn with_server_side_filtering(mut self, enabled: bool) -> Self {
        self.server_side_filtering = enabled;
        self
    }

    /// The store this controller writes to.
    #[must_use]
    pub const fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Fetches the incident collection and replaces the store's incidents
    /// with it.
    ///
    /// On failure the store's incidents and filtered view are left exactly
    /// as they were and `error` is set.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Fetch`] if the repository call fails. The same
    /// message is recorded in the store.
    pub async fn fetch_all(&self) -> Result<FetchOutcome, SyncError> {
        let (sequence, filters) = {
            let mut store = lock(&self.store);
            store.begin_request();
            let sequence = self.latest_fetch.fetch_add(1, Ordering::SeqCst) + 1;
            let filters = if self.server_side_filtering {
                store.state().filters.clone()
            } else {
                FilterCriteria::default()
            };
            (sequence, filters)
        };

        log::debug!("Fetching incidents (request {sequence})");
        let result = self.repository.list(&filters).await;

        let mut store = lock(&self.store);

        if sequence != self.latest_fetch.load(Ordering::SeqCst) {
            log::debug!("Discarding superseded fetch (request {sequence})");
            store.settle_request();
            return Ok(FetchOutcome::Superseded);
        }

        match result {
            Ok(incidents) => {
                let count = incidents.len();
                log::info!("Fetched {count} incidents");
                store.replace_incidents(incidents);
                store.settle_request();
                Ok(FetchOutcome::Applied { count })
            }
            Err(e) => {
                let err = SyncError::Fetch(e);
                log::error!("{err}");
                store.fail_request(err.to_string());
                Err(err)
            }
        }
    }

    /// Validates and submits a new report, appending the stored incident on
    /// success.
    ///
    /// Returns the created incident, which the caller may treat as the
    /// signal to close its submission form. Nothing is retried.
    ///
    /// # Errors
    ///
    /// * [`SyncError::Validation`] if the draft is invalid. No request is
    ///   made and the store is not touched.
    /// * [`SyncError::Create`] if the repository call fails. The message is
    ///   also recorded in the store.
    pub async fn create(&self, draft: &IncidentDraft) -> Result<Incident, SyncError> {
        let new_incident = draft.validate().inspect_err(|e| {
            log::warn!("Rejected incident draft: {e}");
        })?;

        lock(&self.store).begin_request();

        match self.repository.create(&new_incident).await {
            Ok(incident) => {
                log::info!(
                    "Created {} incident {} ({})",
                    incident.incident_type,
                    incident.id,
                    incident.severity
                );
                let mut store = lock(&self.store);
                store.append_incident(incident.clone());
                store.settle_request();
                Ok(incident)
            }
            Err(e) => {
                let err = SyncError::Create(e);
                log::error!("{err}");
                lock(&self.store).fail_request(err.to_string());
                Err(err)
            }
        }
    }
}
