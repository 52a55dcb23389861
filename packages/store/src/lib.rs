#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Authoritative incident state with a derived filtered view and selection.
//!
//! [`IncidentStore`] is the single source of truth for the presentation
//! layer. Every mutation recomputes `filtered_incidents` before it returns
//! and before subscribers are notified, so no observer ever sees a filtered
//! view that disagrees with `incidents` and `filters`.
//!
//! The store is constructed once by the application's composition root and
//! shared as a [`SharedStore`] with the sync controller and the
//! presentation layer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use disaster_report_filter::{FilterCriteria, FilterUpdate, apply_filter};
use disaster_report_incident_models::Incident;
use strum_macros::{AsRefStr, Display, EnumString};

/// A store shared between the sync controller and the presentation layer.
pub type SharedStore = Arc<Mutex<IncidentStore>>;

/// Locks a [`SharedStore`].
///
/// A poisoned lock is recovered: every store mutation is a plain field
/// replacement, so the state behind it is still consistent.
pub fn lock(store: &SharedStore) -> MutexGuard<'_, IncidentStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Background style of the map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum BasemapStyle {
    /// Street map tiles.
    #[default]
    Streets,
    /// Satellite imagery tiles.
    Satellite,
}

impl BasemapStyle {
    /// Returns the other style.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Streets => Self::Satellite,
            Self::Satellite => Self::Streets,
        }
    }
}

/// Everything the presentation layer renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentStoreState {
    /// Full collection, in the order received from the repository with
    /// newly created incidents appended.
    pub incidents: Vec<Incident>,
    /// Always `apply_filter(&incidents, &filters)`.
    pub filtered_incidents: Vec<Incident>,
    /// Active filter predicates.
    pub filters: FilterCriteria,
    /// Incident highlighted on the map and in the list.
    pub selected_incident: Option<Incident>,
    /// `true` while any fetch or create request is outstanding.
    pub loading: bool,
    /// Message from the most recent failed request.
    pub error: Option<String>,
    /// Map background.
    pub basemap_style: BasemapStyle,
}

/// Handle returned by [`IncidentStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Callback invoked with the new state after every mutation.
pub type Listener = Box<dyn Fn(&IncidentStoreState) + Send>;

/// Owns the incident state and mediates all mutations.
#[derive(Default)]
pub struct IncidentStore {
    state: IncidentStoreState,
    in_flight: usize,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl std::fmt::Debug for IncidentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncidentStore")
            .field("state", &self.state)
            .field("in_flight", &self.in_flight)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl IncidentStore {
    /// Creates an empty store with default filters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store wrapped for sharing.
    #[must_use]
    pub fn shared() -> SharedStore {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &IncidentStoreState {
        &self.state
    }

    /// Registers a listener that is called after every mutation.
    ///
    /// Listeners run synchronously while the caller holds the
    /// [`SharedStore`] lock, so a listener must not call [`lock`] on the
    /// same store; doing so deadlocks. Listeners that need to act on the
    /// store should forward the state (e.g. over a channel) and act once
    /// the mutation has returned.
    pub fn subscribe(
        &mut self,
        listener: impl Fn(&IncidentStoreState) + Send + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Merges `update` into the current filters and recomputes the view.
    pub fn set_filters(&mut self, update: FilterUpdate) {
        self.state.filters.merge(update);
        log::debug!("Filters changed: {:?}", self.state.filters);
        self.recompute();
        self.publish();
    }

    /// Resets filters to match everything.
    pub fn clear_filters(&mut self) {
        self.state.filters = FilterCriteria::default();
        self.recompute();
        self.publish();
    }

    /// Selects an incident, or clears the selection with `None`.
    ///
    /// Selection is independent of the filters; the filtered view is not
    /// recomputed.
    pub fn set_selected_incident(&mut self, incident: Option<Incident>) {
        self.state.selected_incident = incident;
        self.publish();
    }

    /// Replaces the whole collection after a successful fetch.
    ///
    /// The selection is re-validated by `id`: it follows the new record
    /// with the same `id`, or is cleared if that `id` is gone.
    pub fn replace_incidents(&mut self, incidents: Vec<Incident>) {
        self.state.incidents = incidents;
        self.recompute();

        if let Some(selected) = self.state.selected_incident.take() {
            self.state.selected_incident = self
                .state
                .incidents
                .iter()
                .find(|incident| incident.id == selected.id)
                .cloned();
            if self.state.selected_incident.is_none() {
                log::debug!("Cleared selection of removed incident {}", selected.id);
            }
        }

        self.publish();
    }

    /// Appends a newly created incident.
    ///
    /// The incident shows up in the filtered view only if it matches the
    /// current filters.
    pub fn append_incident(&mut self, incident: Incident) {
        if self.state.filters.matches(&incident) {
            self.state.filtered_incidents.push(incident.clone());
        }
        self.state.incidents.push(incident);
        self.publish();
    }

    /// Switches between street and satellite map backgrounds.
    pub fn toggle_basemap_style(&mut self) {
        self.state.basemap_style = self.state.basemap_style.toggled();
        self.publish();
    }

    /// Marks the start of a fetch or create request.
    ///
    /// Sets `loading` and clears the previous error.
    pub fn begin_request(&mut self) {
        self.in_flight += 1;
        self.state.loading = true;
        self.state.error = None;
        self.publish();
    }

    /// Marks a request as finished without recording an error.
    pub fn settle_request(&mut self) {
        self.finish_request();
        self.publish();
    }

    /// Marks a request as failed, recording `message` as the error.
    ///
    /// Incidents and the filtered view are left untouched.
    pub fn fail_request(&mut self, message: impl Into<String>) {
        self.finish_request();
        self.state.error = Some(message.into());
        self.publish();
    }

    fn finish_request(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.state.loading = self.in_flight > 0;
    }

    fn recompute(&mut self) {
        self.state.filtered_incidents = apply_filter(&self.state.incidents, &self.state.filters);
    }

    fn publish(&self) {
        for (_, listener) in &self.listeners {
            listener(&self.state);
        }
    }
}
