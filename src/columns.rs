//! Column projection for job tables and reports.
//!
//! A selection is a set of [`JobField`]s. Rendering always walks the master
//! field order, never the order in which columns were picked.

use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::domain::Job;
use crate::fields::JobField;
use crate::format::Formatter;

/// Columns shown before the user changes anything.
pub const DEFAULT_COLUMNS: &[JobField] = &[
    JobField::JobNumber,
    JobField::Status,
    JobField::ShipmentType,
    JobField::Mode,
    JobField::RmName,
    JobField::ShipperDetails,
    JobField::ConsigneeDetails,
    JobField::PortOfLoading,
    JobField::FinalDestination,
    JobField::CreatedAt,
];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown column '{0}'")]
pub struct UnknownColumn(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSelection {
    // JobField's Ord follows declaration order, which is the master order
    selected: BTreeSet<JobField>,
}

impl Default for ColumnSelection {
    fn default() -> Self {
        DEFAULT_COLUMNS.iter().copied().collect()
    }
}

impl FromIterator<JobField> for ColumnSelection {
    fn from_iter<I: IntoIterator<Item = JobField>>(iter: I) -> Self {
        Self {
            selected: iter.into_iter().collect(),
        }
    }
}

impl ColumnSelection {
    pub fn empty() -> Self {
        Self {
            selected: BTreeSet::new(),
        }
    }

    pub fn all() -> Self {
        JobField::ALL.iter().copied().collect()
    }

    /// Parse a comma-separated list of field keys. Blank input yields the
    /// default selection; any unknown key is an error.
    pub fn parse(keys: &str) -> Result<Self, UnknownColumn> {
        let keys: Vec<&str> = keys
            .split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .collect();

        if keys.is_empty() {
            return Ok(Self::default());
        }

        keys.into_iter()
            .map(|key| JobField::from_key(key).ok_or_else(|| UnknownColumn(key.to_string())))
            .collect()
    }

    /// Flip a column's visibility. Returns whether it is visible afterwards.
    pub fn toggle(&mut self, field: JobField) -> bool {
        if self.selected.remove(&field) {
            false
        } else {
            self.selected.insert(field);
            true
        }
    }

    pub fn is_selected(&self, field: JobField) -> bool {
        self.selected.contains(&field)
    }

    /// Selected columns in master order.
    pub fn visible(&self) -> impl Iterator<Item = JobField> + '_ {
        self.selected.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ReportColumn {
    #[schema(value_type = String)]
    pub key: &'static str,
    #[schema(value_type = String)]
    pub label: &'static str,
}

/// A rendered table: one header per visible column and one row of display
/// strings per job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ReportTable {
    pub columns: Vec<ReportColumn>,
    pub rows: Vec<Vec<String>>,
}

pub fn build_report<'a, I>(jobs: I, selection: &ColumnSelection, formatter: &Formatter) -> ReportTable
where
    I: IntoIterator<Item = &'a Job>,
{
    let fields: Vec<JobField> = selection.visible().collect();

    let columns = fields
        .iter()
        .map(|field| ReportColumn {
            key: field.key(),
            label: field.label(),
        })
        .collect();

    let rows = jobs
        .into_iter()
        .map(|job| {
            fields
                .iter()
                .map(|field| formatter.format_field(job, *field))
                .collect()
        })
        .collect();

    ReportTable { columns, rows }
}
