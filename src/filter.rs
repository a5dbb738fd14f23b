//! # Filter Engine
//!
//! Narrows a job collection by a free-text query and a structured filter set,
//! and derives the distinct values that populate filter dropdowns.
//!
//! Every predicate is independent of the others, so the order in which
//! filters are checked never changes the result.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::IntoParams;

use crate::domain::Job;
use crate::fields::JobField;

/// Structured, all-optional job predicates. An absent or blank field places no
/// constraint on its dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct JobFilters {
    pub rm_name: Option<String>,
    pub shipment_type: Option<String>,
    pub mode: Option<String>,
    pub status: Option<String>,
    /// Inclusive lower bound on the creation date (`YYYY-MM-DD`)
    #[serde(default, deserialize_with = "blank_as_none")]
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on the creation date (`YYYY-MM-DD`)
    #[serde(default, deserialize_with = "blank_as_none")]
    pub date_to: Option<NaiveDate>,
    pub shipper: Option<String>,
    pub consignee: Option<String>,
    pub overseas_agent: Option<String>,
    pub port_of_loading: Option<String>,
    pub final_destination: Option<String>,
}

/// Date inputs arrive blank when the picker is cleared.
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Fields scanned by the free-text query.
pub const SEARCHABLE_FIELDS: &[JobField] = &[
    JobField::JobNumber,
    JobField::BookingNumber,
    JobField::InvoiceNumber,
    JobField::ShipperDetails,
    JobField::ConsigneeDetails,
    JobField::RmName,
    JobField::Mode,
    JobField::ShipmentType,
    JobField::PortOfLoading,
    JobField::FinalDestination,
];

/// Fields whose distinct values feed the filter dropdowns.
pub const OPTION_FIELDS: &[JobField] = &[
    JobField::RmName,
    JobField::ShipmentType,
    JobField::Mode,
    JobField::Status,
    JobField::ShipperDetails,
    JobField::ConsigneeDetails,
    JobField::OverseasAgent,
    JobField::PortOfLoading,
    JobField::FinalDestination,
];

/// Plain text of a single-valued field, or `None` when unset.
fn text_of(job: &Job, field: JobField) -> Option<&str> {
    match field {
        JobField::JobNumber => Some(&job.job_number),
        JobField::Status => Some(job.status.as_str()),
        JobField::ShipmentType => Some(job.shipment_type.as_str()),
        JobField::Mode => Some(job.mode.as_str()),
        JobField::RmName => job.rm_name.as_deref(),
        JobField::ShipperDetails => Some(&job.shipper_details),
        JobField::ConsigneeDetails => Some(&job.consignee_details),
        JobField::OverseasAgent => job.overseas_agent.as_deref(),
        JobField::BookingNumber => job.booking_number.as_deref(),
        JobField::InvoiceNumber => job.invoice_number.as_deref(),
        JobField::PortOfLoading => job.port_of_loading.as_deref(),
        JobField::FinalDestination => job.final_destination.as_deref(),
        _ => None,
    }
}

fn constraint(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|text| !text.is_empty())
}

impl JobFilters {
    /// Equality constraints paired with the field they apply to.
    fn equality_constraints(&self) -> impl Iterator<Item = (JobField, &str)> {
        [
            (JobField::RmName, &self.rm_name),
            (JobField::ShipmentType, &self.shipment_type),
            (JobField::Mode, &self.mode),
            (JobField::Status, &self.status),
            (JobField::ShipperDetails, &self.shipper),
            (JobField::ConsigneeDetails, &self.consignee),
            (JobField::OverseasAgent, &self.overseas_agent),
            (JobField::PortOfLoading, &self.port_of_loading),
            (JobField::FinalDestination, &self.final_destination),
        ]
        .into_iter()
        .filter_map(|(field, value)| constraint(value).map(|text| (field, text)))
    }

    pub fn is_empty(&self) -> bool {
        self.equality_constraints().next().is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
    }

    /// Whether a single job satisfies every non-empty predicate.
    pub fn matches(&self, job: &Job) -> bool {
        let equal = self
            .equality_constraints()
            .all(|(field, expected)| text_of(job, field) == Some(expected));

        equal && self.matches_date_range(job)
    }

    fn matches_date_range(&self, job: &Job) -> bool {
        if self.date_from.is_none() && self.date_to.is_none() {
            return true;
        }

        let Some(created) = job.created_at.to_datetime().map(|instant| instant.date_naive())
        else {
            return false;
        };

        self.date_from.is_none_or(|from| created >= from)
            && self.date_to.is_none_or(|to| created <= to)
    }
}

/// Case-insensitive substring match over [`SEARCHABLE_FIELDS`]. A blank query
/// matches everything.
pub fn matches_query(job: &Job, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }

    SEARCHABLE_FIELDS.iter().any(|field| {
        text_of(job, *field).is_some_and(|text| text.to_lowercase().contains(&needle))
    })
}

/// The visible subset of `jobs`, in input order.
pub fn apply_filters<'a>(jobs: &'a [Job], search_query: &str, filters: &JobFilters) -> Vec<&'a Job> {
    jobs.iter()
        .filter(|job| matches_query(job, search_query) && filters.matches(job))
        .collect()
}

/// Sorted distinct non-empty values per dropdown field, keyed by field key.
/// One pass over the collection.
pub fn extract_unique_values(jobs: &[Job]) -> BTreeMap<&'static str, Vec<String>> {
    let mut sets: Vec<BTreeSet<&str>> = vec![BTreeSet::new(); OPTION_FIELDS.len()];

    for job in jobs {
        for (set, field) in sets.iter_mut().zip(OPTION_FIELDS) {
            if let Some(value) = text_of(job, *field).filter(|value| !value.is_empty()) {
                set.insert(value);
            }
        }
    }

    OPTION_FIELDS
        .iter()
        .zip(sets)
        .map(|(field, set)| {
            (
                field.key(),
                set.into_iter().map(str::to_string).collect(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_value::DateValue;
    use crate::domain::{JobStatus, ShipmentType, TransportMode};

    fn job(number: &str) -> Job {
        Job::new(number, ShipmentType::Import, TransportMode::Sea, "Shipper", "Consignee")
    }

    fn created_on(mut job: Job, date: &str) -> Job {
        job.created_at = DateValue::IsoString(date.to_string());
        job
    }

    fn numbers(jobs: &[&Job]) -> Vec<String> {
        jobs.iter().map(|job| job.job_number.clone()).collect()
    }

    fn sample() -> Vec<Job> {
        let mut first = job("IMP-1/25-26");
        first.status = JobStatus::Active;
        first.rm_name = Some("A".to_string());
        first.shipper_details = "MSC LINE".to_string();
        first.port_of_loading = Some("Chennai".to_string());

        let mut second = job("EXP-1/25-26");
        second.status = JobStatus::Pending;
        second.rm_name = Some("B".to_string());
        second.shipment_type = ShipmentType::Export;
        second.mode = TransportMode::Air;
        second.booking_number = Some("BK-778".to_string());

        let mut third = job("IMP-2/25-26");
        third.status = JobStatus::Completed;
        third.rm_name = Some("A".to_string());
        third.overseas_agent = Some("".to_string());
        third.final_destination = Some("Rotterdam".to_string());

        vec![first, second, third]
    }

    #[test]
    fn empty_query_and_filters_is_identity() {
        let jobs = sample();
        let visible = apply_filters(&jobs, "", &JobFilters::default());

        assert_eq!(visible.len(), jobs.len());
        assert!(visible.iter().zip(&jobs).all(|(a, b)| std::ptr::eq(*a, b)));
    }

    #[test]
    fn status_filter_keeps_only_matching_job() {
        let mut first = job("IMP-1/25-26");
        first.status = JobStatus::Active;
        first.rm_name = Some("A".to_string());
        let mut second = job("IMP-2/25-26");
        second.status = JobStatus::Pending;
        second.rm_name = Some("B".to_string());
        let jobs = vec![first, second];

        let filters = JobFilters {
            status: Some("Active".to_string()),
            ..Default::default()
        };

        assert_eq!(numbers(&apply_filters(&jobs, "", &filters)), vec!["IMP-1/25-26"]);
    }

    #[test]
    fn query_is_case_insensitive_substring() {
        let jobs = sample();

        assert_eq!(numbers(&apply_filters(&jobs, "msc", &JobFilters::default())), vec!["IMP-1/25-26"]);
        assert_eq!(numbers(&apply_filters(&jobs, "bk-7", &JobFilters::default())), vec!["EXP-1/25-26"]);
        assert_eq!(numbers(&apply_filters(&jobs, "AIR", &JobFilters::default())), vec!["EXP-1/25-26"]);
        assert_eq!(numbers(&apply_filters(&jobs, "rotter", &JobFilters::default())), vec!["IMP-2/25-26"]);
        assert!(apply_filters(&jobs, "nowhere", &JobFilters::default()).is_empty());
    }

    #[test]
    fn query_ignores_fields_outside_search_set() {
        let mut only = job("IMP-9/25-26");
        only.remarks = Some("fragile glassware".to_string());
        let jobs = vec![only];

        assert!(apply_filters(&jobs, "glass", &JobFilters::default()).is_empty());
    }

    #[test]
    fn structured_filters_use_exact_equality() {
        let jobs = sample();
        let filters = JobFilters {
            shipper: Some("MSC".to_string()),
            ..Default::default()
        };
        assert!(apply_filters(&jobs, "", &filters).is_empty());

        let filters = JobFilters {
            shipper: Some("MSC LINE".to_string()),
            ..Default::default()
        };
        assert_eq!(numbers(&apply_filters(&jobs, "", &filters)), vec!["IMP-1/25-26"]);
    }

    #[test]
    fn filters_compose_with_and() {
        let jobs = sample();
        let filters = JobFilters {
            rm_name: Some("A".to_string()),
            status: Some("Completed".to_string()),
            ..Default::default()
        };

        assert_eq!(numbers(&apply_filters(&jobs, "", &filters)), vec!["IMP-2/25-26"]);

        let with_query = apply_filters(&jobs, "chennai", &filters);
        assert!(with_query.is_empty());
    }

    #[test]
    fn blank_filter_values_are_no_constraint() {
        let jobs = sample();
        let filters = JobFilters {
            mode: Some(String::new()),
            ..Default::default()
        };

        assert!(filters.is_empty());
        assert_eq!(apply_filters(&jobs, "", &filters).len(), 3);
    }

    #[test]
    fn every_result_satisfies_every_predicate() {
        let jobs = sample();
        let filters = JobFilters {
            rm_name: Some("A".to_string()),
            shipment_type: Some("Import".to_string()),
            mode: Some("Sea".to_string()),
            ..Default::default()
        };

        let visible = apply_filters(&jobs, "", &filters);
        assert_eq!(visible.len(), 2);
        for job in visible {
            assert_eq!(job.rm_name.as_deref(), Some("A"));
            assert_eq!(job.shipment_type, ShipmentType::Import);
            assert_eq!(job.mode, TransportMode::Sea);
            assert!(jobs.iter().any(|candidate| std::ptr::eq(candidate, job)));
        }
    }

    #[test]
    fn date_range_is_inclusive() {
        let jobs = vec![
            created_on(job("IMP-1/25-26"), "2025-04-15T10:00:00Z"),
            created_on(job("IMP-2/25-26"), "2025-05-01T00:00:00Z"),
            created_on(job("IMP-3/25-26"), "2025-04-01"),
            created_on(job("IMP-4/25-26"), "2025-04-30T23:59:59Z"),
            created_on(job("IMP-5/25-26"), "2025-03-31T23:59:59Z"),
        ];
        let filters = JobFilters {
            date_from: NaiveDate::from_ymd_opt(2025, 4, 1),
            date_to: NaiveDate::from_ymd_opt(2025, 4, 30),
            ..Default::default()
        };

        assert_eq!(
            numbers(&apply_filters(&jobs, "", &filters)),
            vec!["IMP-1/25-26", "IMP-3/25-26", "IMP-4/25-26"]
        );
    }

    #[test]
    fn single_date_bound_applies_alone() {
        let jobs = vec![
            created_on(job("IMP-1/25-26"), "2025-04-15"),
            created_on(job("IMP-2/25-26"), "2025-05-01"),
        ];

        let from_only = JobFilters {
            date_from: NaiveDate::from_ymd_opt(2025, 4, 20),
            ..Default::default()
        };
        assert_eq!(numbers(&apply_filters(&jobs, "", &from_only)), vec!["IMP-2/25-26"]);

        let to_only = JobFilters {
            date_to: NaiveDate::from_ymd_opt(2025, 4, 20),
            ..Default::default()
        };
        assert_eq!(numbers(&apply_filters(&jobs, "", &to_only)), vec!["IMP-1/25-26"]);
    }

    #[test]
    fn undated_jobs_fail_an_active_date_bound() {
        let jobs = vec![created_on(job("IMP-1/25-26"), "unknown")];
        let filters = JobFilters {
            date_from: NaiveDate::from_ymd_opt(2025, 1, 1),
            ..Default::default()
        };

        assert!(apply_filters(&jobs, "", &filters).is_empty());
        assert_eq!(apply_filters(&jobs, "", &JobFilters::default()).len(), 1);
    }

    #[test]
    fn result_is_independent_of_filter_order() {
        let jobs = sample();
        let combined = JobFilters {
            rm_name: Some("A".to_string()),
            mode: Some("Sea".to_string()),
            ..Default::default()
        };
        let rm_only = JobFilters {
            rm_name: Some("A".to_string()),
            ..Default::default()
        };
        let mode_only = JobFilters {
            mode: Some("Sea".to_string()),
            ..Default::default()
        };

        let rm_then_mode: Vec<&Job> = apply_filters(&jobs, "", &rm_only)
            .into_iter()
            .filter(|job| mode_only.matches(job))
            .collect();
        let mode_then_rm: Vec<&Job> = apply_filters(&jobs, "", &mode_only)
            .into_iter()
            .filter(|job| rm_only.matches(job))
            .collect();

        assert_eq!(numbers(&rm_then_mode), numbers(&apply_filters(&jobs, "", &combined)));
        assert_eq!(numbers(&mode_then_rm), numbers(&rm_then_mode));
    }

    #[test]
    fn filters_deserialize_from_camel_case_query() {
        let filters: JobFilters = serde_json::from_value(serde_json::json!({
            "rmName": "A",
            "portOfLoading": "Chennai",
            "dateFrom": "2025-04-01"
        }))
        .unwrap();

        assert_eq!(filters.rm_name.as_deref(), Some("A"));
        assert_eq!(filters.port_of_loading.as_deref(), Some("Chennai"));
        assert_eq!(filters.date_from, NaiveDate::from_ymd_opt(2025, 4, 1));

        let cleared: JobFilters =
            serde_json::from_value(serde_json::json!({ "dateTo": "" })).unwrap();
        assert_eq!(cleared.date_to, None);

        assert!(serde_json::from_value::<JobFilters>(serde_json::json!({ "dateTo": "30/04/2025" })).is_err());
    }

    #[test]
    fn unique_values_are_sorted_distinct_and_non_empty() {
        let jobs = sample();
        let options = extract_unique_values(&jobs);

        assert_eq!(options["rmName"], vec!["A", "B"]);
        assert_eq!(options["status"], vec!["Active", "Completed", "Pending"]);
        assert_eq!(options["mode"], vec!["Air", "Sea"]);
        assert_eq!(options["shipmentType"], vec!["Export", "Import"]);
        assert!(options["overseasAgent"].is_empty());
        assert_eq!(options.len(), OPTION_FIELDS.len());

        for values in options.values() {
            assert!(values.windows(2).all(|pair| pair[0] < pair[1]));
            assert!(values.iter().all(|value| !value.is_empty()));
        }
    }

    #[test]
    fn unique_values_of_empty_collection() {
        let options = extract_unique_values(&[]);
        assert!(options.values().all(Vec::is_empty));
    }
}
