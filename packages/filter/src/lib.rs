#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Filter predicate engine for disaster incident collections.
//!
//! An incident passes a [`FilterCriteria`] when it matches every dimension:
//!
//! - **type**: its type is in `types`, or `types` is empty
//! - **severity**: its severity is in `severities`, or `severities` is empty
//! - **date**: its timestamp falls inside `date_range` (each bound optional)
//!
//! Within a dimension the selected values are OR-ed; across dimensions the
//! predicates are AND-ed. [`apply_filter`] is pure and keeps input order.
//!
//! Partial updates are expressed with [`FilterUpdate`] and
//! [`DateRangeUpdate`], where an absent field leaves the current value
//! untouched.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use disaster_report_incident_models::{Incident, IncidentType, Severity};

/// Inclusive calendar-date bounds on an incident's timestamp.
///
/// `start` admits everything from `00:00:00 UTC` on that day and `end`
/// admits every instant whose UTC date is that day, down to the last
/// nanosecond.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    /// First day included, `None` for unbounded.
    pub start: Option<NaiveDate>,
    /// Last day included, `None` for unbounded.
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Returns `true` if neither bound is set.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Returns `true` if `instant` falls within both bounds.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        let after_start = self.start.is_none_or(|start| instant >= start_of_day(start));
        let before_end = self.end.is_none_or(|end| instant.date_naive() <= end);
        after_start && before_end
    }

    fn apply(&mut self, update: DateRangeUpdate) {
        if let Some(start) = update.start {
            self.start = start;
        }
        if let Some(end) = update.end {
            self.end = end;
        }
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// The active set of filter predicates.
///
/// The default value matches every incident.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Incident types to include (empty = all).
    pub types: BTreeSet<IncidentType>,
    /// Severity levels to include (empty = all).
    pub severities: BTreeSet<Severity>,
    /// Timestamp bounds.
    pub date_range: DateRange,
}

impl FilterCriteria {
    /// Returns `true` if these criteria place no restriction at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.severities.is_empty() && self.date_range.is_unbounded()
    }

    /// Returns `true` if `incident` satisfies every dimension.
    #[must_use]
    pub fn matches(&self, incident: &Incident) -> bool {
        (self.types.is_empty() || self.types.contains(&incident.incident_type))
            && (self.severities.is_empty() || self.severities.contains(&incident.severity))
            && self.date_range.contains(incident.timestamp)
    }

    /// Merges a partial update into these criteria.
    ///
    /// Fields absent from `update` keep their current value. The date range
    /// is merged bound by bound.
    pub fn merge(&mut self, update: FilterUpdate) {
        if let Some(types) = update.types {
            self.types = types;
        }
        if let Some(severities) = update.severities {
            self.severities = severities;
        }
        if let Some(date_range) = update.date_range {
            self.date_range.apply(date_range);
        }
    }
}

/// A partial update to a [`DateRange`].
///
/// Outer `None` keeps the current bound, `Some(None)` clears it, and
/// `Some(Some(date))` replaces it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::option_option)]
pub struct DateRangeUpdate {
    /// New lower bound.
    pub start: Option<Option<NaiveDate>>,
    /// New upper bound.
    pub end: Option<Option<NaiveDate>>,
}

/// A partial update to a [`FilterCriteria`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterUpdate {
    /// Replacement type set.
    pub types: Option<BTreeSet<IncidentType>>,
    /// Replacement severity set.
    pub severities: Option<BTreeSet<Severity>>,
    /// Per-bound date range update.
    pub date_range: Option<DateRangeUpdate>,
}

impl FilterUpdate {
    /// Replaces the selected incident types.
    #[must_use]
    pub fn types(mut self, types: impl IntoIterator<Item = IncidentType>) -> Self {
        self.types = Some(types.into_iter().collect());
        self
    }

    /// Replaces the selected severities.
    #[must_use]
    pub fn severities(mut self, severities: impl IntoIterator<Item = Severity>) -> Self {
        self.severities = Some(severities.into_iter().collect());
        self
    }

    /// Sets or clears the lower date bound.
    #[must_use]
    pub fn start(mut self, start: Option<NaiveDate>) -> Self {
        self.date_range.get_or_insert_with(DateRangeUpdate::default).start = Some(start);
        self
    }

    /// Sets or clears the upper date bound.
    #[must_use]
    pub fn end(mut self, end: Option<NaiveDate>) -> Self {
        self.date_range.get_or_insert_with(DateRangeUpdate::default).end = Some(end);
        self
    }
}

/// Returns the incidents that satisfy `filters`, in their original order.
#[must_use]
pub fn apply_filter(incidents: &[Incident], filters: &FilterCriteria) -> Vec<Incident> {
    if filters.is_empty() {
        return incidents.to_vec();
    }

    incidents
        .iter()
        .filter(|incident| filters.matches(incident))
        .cloned()
        .collect()
}

/// Parses a date bound entered as text.
///
/// Accepts `YYYY-MM-DD` or a full RFC 3339 instant (whose UTC date is
/// used). Anything else is logged and returns `None`, which callers treat
/// as "no constraint" for that bound.
#[must_use]
pub fn parse_date_bound(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(instant) = DateTime::parse_from_rfc3339(s) {
        return Some(instant.with_timezone(&Utc).date_naive());
    }
    log::warn!("Ignoring unparseable date bound {s:?}");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn incident(id: &str, ty: IncidentType, severity: Severity, ts: &str) -> Incident {
        Incident {
            id: id.to_string(),
            incident_type: ty,
            severity,
            description: format!("{ty} incident"),
            latitude: 40.75,
            longitude: -73.99,
            reporter_name: None,
            timestamp: DateTime::parse_from_rfc3339(ts).unwrap().with_timezone(&Utc),
        }
    }

    fn sample() -> Vec<Incident> {
        vec![
            incident("1", IncidentType::Fire, Severity::Critical, "2024-01-01T00:00:00Z"),
            incident("2", IncidentType::Flood, Severity::Low, "2024-06-01T00:00:00Z"),
        ]
    }

    fn ids(incidents: &[Incident]) -> Vec<&str> {
        incidents.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn empty_filter_is_identity() {
        let list = sample();
        assert_eq!(apply_filter(&list, &FilterCriteria::default()), list);
    }

    #[test]
    fn filters_by_type() {
        let mut filters = FilterCriteria::default();
        filters.merge(FilterUpdate::default().types([IncidentType::Fire]));
        assert_eq!(ids(&apply_filter(&sample(), &filters)), vec!["1"]);
    }

    #[test]
    fn filters_by_start_date() {
        let mut filters = FilterCriteria::default();
        filters.merge(FilterUpdate::default().start(Some(date("2024-05-01"))));
        assert_eq!(ids(&apply_filter(&sample(), &filters)), vec!["2"]);
    }

    #[test]
    fn end_date_includes_the_whole_day() {
        let list = vec![
            incident("a", IncidentType::Fire, Severity::Low, "2024-03-10T23:59:59.999Z"),
            incident("b", IncidentType::Fire, Severity::Low, "2024-03-11T00:00:00Z"),
        ];
        let mut filters = FilterCriteria::default();
        filters.merge(FilterUpdate::default().end(Some(date("2024-03-10"))));
        assert_eq!(ids(&apply_filter(&list, &filters)), vec!["a"]);
    }

    #[test]
    fn end_date_includes_sub_millisecond_instants() {
        let list = vec![
            incident("a", IncidentType::Fire, Severity::Low, "2024-03-10T23:59:59.999500Z"),
            incident("b", IncidentType::Fire, Severity::Low, "2024-03-10T23:59:59.999999999Z"),
            incident("c", IncidentType::Fire, Severity::Low, "2024-03-11T00:00:00Z"),
        ];
        let mut filters = FilterCriteria::default();
        filters.merge(FilterUpdate::default().end(Some(date("2024-03-10"))));
        assert_eq!(ids(&apply_filter(&list, &filters)), vec!["a", "b"]);
    }

    #[test]
    fn start_date_is_inclusive_from_midnight() {
        let list = vec![
            incident("a", IncidentType::Fire, Severity::Low, "2024-03-09T23:59:59Z"),
            incident("b", IncidentType::Fire, Severity::Low, "2024-03-10T00:00:00Z"),
        ];
        let mut filters = FilterCriteria::default();
        filters.merge(FilterUpdate::default().start(Some(date("2024-03-10"))));
        assert_eq!(ids(&apply_filter(&list, &filters)), vec!["b"]);
    }

    #[test]
    fn dimensions_are_anded_and_values_ored() {
        let list = vec![
            incident("1", IncidentType::Fire, Severity::Critical, "2024-01-01T00:00:00Z"),
            incident("2", IncidentType::Flood, Severity::Critical, "2024-01-02T00:00:00Z"),
            incident("3", IncidentType::Fire, Severity::Low, "2024-01-03T00:00:00Z"),
            incident("4", IncidentType::Tornado, Severity::High, "2024-01-04T00:00:00Z"),
        ];
        let mut filters = FilterCriteria::default();
        filters.merge(
            FilterUpdate::default()
                .types([IncidentType::Fire, IncidentType::Flood])
                .severities([Severity::Critical]),
        );
        assert_eq!(ids(&apply_filter(&list, &filters)), vec!["1", "2"]);
    }

    #[test]
    fn membership_matches_predicates_for_every_combination() {
        let mut list = Vec::new();
        for (i, ty) in IncidentType::all().iter().enumerate() {
            for severity in Severity::all() {
                list.push(incident(
                    &format!("{i}-{severity}"),
                    *ty,
                    *severity,
                    &format!("2024-0{}-15T12:00:00Z", (i % 9) + 1),
                ));
            }
        }

        let mut filters = FilterCriteria::default();
        filters.merge(
            FilterUpdate::default()
                .types([IncidentType::Earthquake, IncidentType::Other])
                .severities([Severity::Medium, Severity::High])
                .start(Some(date("2024-02-01")))
                .end(Some(date("2024-08-31"))),
        );

        let filtered = apply_filter(&list, &filters);
        for item in &list {
            let expected = filters.types.contains(&item.incident_type)
                && filters.severities.contains(&item.severity)
                && item.timestamp >= start_of_day(date("2024-02-01"))
                && item.timestamp < start_of_day(date("2024-09-01"));
            assert_eq!(filtered.contains(item), expected, "{}", item.id);
        }
    }

    #[test]
    fn merge_keeps_fields_not_in_update() {
        let mut filters = FilterCriteria::default();
        filters.merge(FilterUpdate::default().severities([Severity::Critical]));
        filters.merge(FilterUpdate::default().types([IncidentType::Flood]));

        assert_eq!(filters.types, BTreeSet::from([IncidentType::Flood]));
        assert_eq!(filters.severities, BTreeSet::from([Severity::Critical]));
    }

    #[test]
    fn date_range_merges_bound_by_bound() {
        let mut filters = FilterCriteria::default();
        filters.merge(FilterUpdate::default().start(Some(date("2024-01-01"))));
        filters.merge(FilterUpdate::default().end(Some(date("2024-12-31"))));
        assert_eq!(filters.date_range.start, Some(date("2024-01-01")));
        assert_eq!(filters.date_range.end, Some(date("2024-12-31")));

        filters.merge(FilterUpdate::default().start(None));
        assert_eq!(filters.date_range.start, None);
        assert_eq!(filters.date_range.end, Some(date("2024-12-31")));
    }

    #[test]
    fn parses_date_bounds() {
        assert_eq!(parse_date_bound("2024-05-01"), Some(date("2024-05-01")));
        assert_eq!(
            parse_date_bound("2024-05-01T22:30:00-04:00"),
            Some(date("2024-05-02"))
        );
        assert_eq!(parse_date_bound(""), None);
        assert_eq!(parse_date_bound("last tuesday"), None);
    }
}
