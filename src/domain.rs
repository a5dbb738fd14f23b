//! # Domain Records
//!
//! Plain data definitions for jobs and counterparties as the rest of the crate
//! sees them. Storage rows are converted here once, at the data-access
//! boundary, so dates arrive already decoded into [`DateValue`].

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::date_value::DateValue;
use crate::error::RepositoryError;
use crate::models;

/// A stored string did not match any known variant.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

string_enum!(
    /// Lifecycle state of a job. Closing a job is a status change, never a delete.
    JobStatus, "job status" {
        Active => "Active",
        Pending => "Pending",
        Completed => "Completed",
        Cancelled => "Cancelled",
    }
);

string_enum!(
    ShipmentType, "shipment type" {
        Import => "Import",
        Export => "Export",
    }
);

string_enum!(
    TransportMode, "mode" {
        Sea => "Sea",
        Air => "Air",
        Road => "Road",
        Rail => "Rail",
    }
);

string_enum!(
    /// Which reference list a counterparty belongs to.
    EntityKind, "entity kind" {
        Shipper => "shipper",
        Consignee => "consignee",
        OverseasAgent => "overseas-agent",
    }
);

impl EntityKind {
    /// Human label used in validation messages
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Shipper => "shipper",
            EntityKind::Consignee => "consignee",
            EntityKind::OverseasAgent => "overseas agent",
        }
    }
}

/// A shipment record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub job_number: String,
    pub status: JobStatus,
    pub shipment_type: ShipmentType,
    pub mode: TransportMode,
    pub rm_name: Option<String>,
    pub shipper_details: String,
    pub consignee_details: String,
    pub overseas_agent: Option<String>,
    pub booking_number: Option<String>,
    pub invoice_number: Option<String>,
    pub port_of_loading: Option<String>,
    pub final_destination: Option<String>,
    pub commodity: Option<String>,
    pub gross_weight: Option<String>,
    pub net_weight: Option<String>,
    pub no_of_packages: Option<String>,
    pub volume: Option<String>,
    pub hbl_number: Option<String>,
    pub hbl_date: Option<DateValue>,
    pub mbl_number: Option<String>,
    pub mbl_date: Option<DateValue>,
    pub eta_pod: Option<DateValue>,
    #[serde(default)]
    pub container_flight_numbers: Vec<String>,
    pub remarks: Option<String>,
    pub created_by: String,
    pub created_at: DateValue,
    pub updated_at: DateValue,
}

impl Job {
    /// A job with only the required fields set. Handy for fixtures.
    pub fn new(
        job_number: impl Into<String>,
        shipment_type: ShipmentType,
        mode: TransportMode,
        shipper_details: impl Into<String>,
        consignee_details: impl Into<String>,
    ) -> Self {
        let now = DateValue::Native(Utc::now());
        Self {
            id: Uuid::new_v4(),
            job_number: job_number.into(),
            status: JobStatus::Pending,
            shipment_type,
            mode,
            rm_name: None,
            shipper_details: shipper_details.into(),
            consignee_details: consignee_details.into(),
            overseas_agent: None,
            booking_number: None,
            invoice_number: None,
            port_of_loading: None,
            final_destination: None,
            commodity: None,
            gross_weight: None,
            net_weight: None,
            no_of_packages: None,
            volume: None,
            hbl_number: None,
            hbl_date: None,
            mbl_number: None,
            mbl_date: None,
            eta_pod: None,
            container_flight_numbers: Vec::new(),
            remarks: None,
            created_by: String::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

fn stored_date(value: Option<String>) -> Option<DateValue> {
    value
        .filter(|text| !text.trim().is_empty())
        .map(DateValue::IsoString)
}

fn string_list(value: serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(text) => Some(text),
                serde_json::Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        _ => Vec::new(),
    }
}

impl TryFrom<models::job::Model> for Job {
    type Error = UnknownVariant;

    fn try_from(model: models::job::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            status: model.status.parse()?,
            shipment_type: model.shipment_type.parse()?,
            mode: model.mode.parse()?,
            job_number: model.job_number,
            rm_name: model.rm_name,
            shipper_details: model.shipper_details,
            consignee_details: model.consignee_details,
            overseas_agent: model.overseas_agent,
            booking_number: model.booking_number,
            invoice_number: model.invoice_number,
            port_of_loading: model.port_of_loading,
            final_destination: model.final_destination,
            commodity: model.commodity,
            gross_weight: model.gross_weight,
            net_weight: model.net_weight,
            no_of_packages: model.no_of_packages,
            volume: model.volume,
            hbl_number: model.hbl_number,
            hbl_date: stored_date(model.hbl_date),
            mbl_number: model.mbl_number,
            mbl_date: stored_date(model.mbl_date),
            eta_pod: stored_date(model.eta_pod),
            container_flight_numbers: string_list(model.container_flight_numbers),
            remarks: model.remarks,
            created_by: model.created_by,
            created_at: DateValue::Native(model.created_at.with_timezone(&Utc)),
            updated_at: DateValue::Native(model.updated_at.with_timezone(&Utc)),
        })
    }
}

/// Editable job fields as submitted by the job form, for both create and edit.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobDraft {
    pub status: Option<JobStatus>,
    pub shipment_type: Option<ShipmentType>,
    pub mode: Option<TransportMode>,
    pub rm_name: Option<String>,
    pub shipper_details: Option<String>,
    pub consignee_details: Option<String>,
    pub overseas_agent: Option<String>,
    pub booking_number: Option<String>,
    pub invoice_number: Option<String>,
    pub port_of_loading: Option<String>,
    pub final_destination: Option<String>,
    pub commodity: Option<String>,
    pub gross_weight: Option<String>,
    pub net_weight: Option<String>,
    pub no_of_packages: Option<String>,
    pub volume: Option<String>,
    pub hbl_number: Option<String>,
    pub hbl_date: Option<DateValue>,
    pub mbl_number: Option<String>,
    pub mbl_date: Option<DateValue>,
    pub eta_pod: Option<DateValue>,
    #[serde(default)]
    pub container_flight_numbers: Vec<String>,
    pub remarks: Option<String>,
}

/// The fields a job cannot be saved without.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredJobFields {
    pub shipment_type: ShipmentType,
    pub mode: TransportMode,
    pub shipper_details: String,
    pub consignee_details: String,
}

/// Trim a free-text field, treating blank input as absent.
pub fn clean_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

impl JobDraft {
    /// Check required fields before any write happens.
    pub fn validate(&self) -> Result<RequiredJobFields, RepositoryError> {
        let shipment_type = self
            .shipment_type
            .ok_or_else(|| RepositoryError::field_error("shipmentType", "Shipment type is required"))?;
        let mode = self
            .mode
            .ok_or_else(|| RepositoryError::field_error("mode", "Mode is required"))?;
        let shipper_details = clean_text(self.shipper_details.as_deref())
            .ok_or_else(|| RepositoryError::field_error("shipperDetails", "Shipper is required"))?;
        let consignee_details = clean_text(self.consignee_details.as_deref()).ok_or_else(|| {
            RepositoryError::field_error("consigneeDetails", "Consignee is required")
        })?;

        for (field, date) in [
            ("hblDate", &self.hbl_date),
            ("mblDate", &self.mbl_date),
            ("etaPod", &self.eta_pod),
        ] {
            if date.as_ref().is_some_and(|date| !date.is_representable()) {
                return Err(RepositoryError::field_error(
                    field,
                    "Timestamp is outside the supported date range",
                ));
            }
        }

        Ok(RequiredJobFields {
            shipment_type,
            mode,
            shipper_details,
            consignee_details,
        })
    }

    /// Container/flight numbers with blanks removed, order preserved.
    pub fn cleaned_container_numbers(&self) -> Vec<String> {
        self.container_flight_numbers
            .iter()
            .filter_map(|number| clean_text(Some(number)))
            .collect()
    }
}

/// A named shipper, consignee or overseas agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Counterparty {
    pub id: Uuid,
    pub kind: EntityKind,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub document_url: Option<String>,
    pub document_name: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<models::counterparty::Model> for Counterparty {
    type Error = UnknownVariant;

    fn try_from(model: models::counterparty::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            kind: model.kind.parse()?,
            name: model.name,
            phone: model.phone,
            email: model.email,
            document_url: model.document_url,
            document_name: model.document_name,
            created_at: model.created_at.with_timezone(&Utc).to_rfc3339(),
            updated_at: model.updated_at.with_timezone(&Utc).to_rfc3339(),
        })
    }
}

/// Counterparty fields as submitted by the entity form.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CounterpartyDraft {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub document_url: Option<String>,
    pub document_name: Option<String>,
}

impl CounterpartyDraft {
    /// Normalize blanks and check field shapes. The name is compared exactly
    /// as entered, so only surrounding whitespace is removed.
    pub fn validate(&self) -> Result<CounterpartyDraft, RepositoryError> {
        let name = clean_text(Some(&self.name))
            .ok_or_else(|| RepositoryError::field_error("name", "Name is required"))?;

        let email = clean_text(self.email.as_deref());
        if let Some(email) = &email
            && !email.contains('@')
        {
            return Err(RepositoryError::field_error(
                "email",
                "Email must contain '@'",
            ));
        }

        let document_url = clean_text(self.document_url.as_deref());
        if let Some(document_url) = &document_url
            && url::Url::parse(document_url).is_err()
        {
            return Err(RepositoryError::field_error(
                "documentUrl",
                "Document URL must be an absolute URL",
            ));
        }

        let document_name = if document_url.is_some() {
            clean_text(self.document_name.as_deref())
        } else {
            None
        };

        Ok(CounterpartyDraft {
            name,
            phone: clean_text(self.phone.as_deref()),
            email,
            document_url,
            document_name,
        })
    }
}
