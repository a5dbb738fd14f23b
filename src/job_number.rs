//! Job number sequencing.
//!
//! Numbers look like `IMP-12/25-26`: a prefix chosen by shipment type, a
//! sequence number, and the Indian financial year (April to March) in which
//! the job was created.

use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use regex::Regex;
use tokio::sync::{Mutex, MutexGuard};

use crate::config::JobNumberConfig;
use crate::domain::ShipmentType;

static JOB_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9]+)-(\d+)/(\d{2})-(\d{2})$").expect("job number pattern is valid")
});

/// Financial-year suffix for a date: 2025-04-01 gives `25-26`, 2025-03-31 gives `24-25`.
pub fn financial_year_suffix(date: NaiveDate) -> String {
    let start = if date.month() >= 4 {
        date.year()
    } else {
        date.year() - 1
    };
    let end = start + 1;
    format!("{:02}-{:02}", start.rem_euclid(100), end.rem_euclid(100))
}

/// Sequence number of `job_number` if it belongs to the `prefix` family.
pub fn parse_sequence(job_number: &str, prefix: &str) -> Option<u64> {
    let captures = JOB_NUMBER_RE.captures(job_number.trim())?;
    if captures.get(1)?.as_str() != prefix {
        return None;
    }
    captures.get(2)?.as_str().parse().ok()
}

/// One past the highest sequence issued for `prefix`, or 1 when there is none.
pub fn next_sequence<'a, I>(existing: I, prefix: &str) -> u64
where
    I: IntoIterator<Item = &'a str>,
{
    existing
        .into_iter()
        .filter_map(|number| parse_sequence(number, prefix))
        .max()
        .map_or(1, |highest| highest.saturating_add(1))
}

/// Time-derived number used when the sequence lookup fails. Not unique.
pub fn fallback_sequence(now: DateTime<Utc>) -> u64 {
    now.timestamp_millis().unsigned_abs() % 1_000_000
}

pub fn format_job_number(prefix: &str, sequence: u64, created: NaiveDate) -> String {
    format!("{prefix}-{sequence}/{}", financial_year_suffix(created))
}

/// Assigns job numbers using the configured prefixes.
#[derive(Debug, Clone)]
pub struct JobNumberGenerator {
    import_prefix: String,
    export_prefix: String,
    issuing: Arc<Mutex<()>>,
}

impl JobNumberGenerator {
    pub fn new(config: &JobNumberConfig) -> Self {
        Self {
            import_prefix: config.import_prefix.clone(),
            export_prefix: config.export_prefix.clone(),
            issuing: Arc::new(Mutex::new(())),
        }
    }

    /// Hold while looking up, assigning and inserting a number so creates in
    /// this process never race each other for the same sequence.
    pub async fn begin_issue(&self) -> MutexGuard<'_, ()> {
        self.issuing.lock().await
    }

    pub fn prefix(&self, shipment_type: ShipmentType) -> &str {
        match shipment_type {
            ShipmentType::Import => &self.import_prefix,
            ShipmentType::Export => &self.export_prefix,
        }
    }

    /// Build the number for a new job from the outcome of the lookup of
    /// existing numbers. A failed lookup degrades to [`fallback_sequence`].
    pub fn assign<E: std::fmt::Display>(
        &self,
        shipment_type: ShipmentType,
        existing: Result<Vec<String>, E>,
        now: DateTime<Utc>,
    ) -> String {
        let prefix = self.prefix(shipment_type);
        let sequence = match existing {
            Ok(numbers) => next_sequence(numbers.iter().map(String::as_str), prefix),
            Err(error) => {
                let fallback = fallback_sequence(now);
                tracing::warn!(
                    %error,
                    prefix,
                    fallback,
                    "Job number sequence lookup failed; using time-derived number"
                );
                fallback
            }
        };

        format_job_number(prefix, sequence, now.date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn financial_year_turns_over_in_april() {
        assert_eq!(financial_year_suffix(date(2025, 4, 1)), "25-26");
        assert_eq!(financial_year_suffix(date(2025, 3, 31)), "24-25");
        assert_eq!(financial_year_suffix(date(2026, 1, 15)), "25-26");
        assert_eq!(financial_year_suffix(date(2099, 12, 31)), "99-00");
    }

    #[test]
    fn parses_only_matching_family() {
        assert_eq!(parse_sequence("IMP-12/25-26", "IMP"), Some(12));
        assert_eq!(parse_sequence("EXP-12/25-26", "IMP"), None);
        assert_eq!(parse_sequence("IMPX-3/25-26", "IMP"), None);
        assert_eq!(parse_sequence("IMP-abc/25-26", "IMP"), None);
        assert_eq!(parse_sequence("IMP-7", "IMP"), None);
    }

    #[test]
    fn next_sequence_skips_malformed_numbers() {
        let existing = ["IMP-3/24-25", "IMP-10/25-26", "EXP-40/25-26", "IMP-??/25-26"];
        assert_eq!(next_sequence(existing, "IMP"), 11);
        assert_eq!(next_sequence(existing, "EXP"), 41);
        assert_eq!(next_sequence(std::iter::empty(), "IMP"), 1);
    }

    #[test]
    fn generator_uses_prefix_by_shipment_type() {
        let generator = JobNumberGenerator::new(&JobNumberConfig::default());
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();

        let import = generator.assign::<String>(
            ShipmentType::Import,
            Ok(vec!["IMP-4/25-26".to_string(), "EXP-9/25-26".to_string()]),
            now,
        );
        let export = generator.assign::<String>(ShipmentType::Export, Ok(Vec::new()), now);

        assert_eq!(import, "IMP-5/25-26");
        assert_eq!(export, "EXP-1/25-26");
    }

    #[test]
    fn failed_lookup_falls_back_to_time() {
        let generator = JobNumberGenerator::new(&JobNumberConfig::default());
        let now = Utc.timestamp_millis_opt(1_743_465_600_123).unwrap();

        let number = generator.assign(ShipmentType::Import, Err("database offline"), now);

        assert_eq!(fallback_sequence(now), 600_123);
        assert_eq!(number, "IMP-600123/25-26");
    }
}
