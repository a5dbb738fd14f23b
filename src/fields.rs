//! Typed field-accessor table for jobs.
//!
//! Every displayable job column has a stable camelCase key, a label and a
//! getter. The order of [`JobField::ALL`] is the master display order used by
//! tables and reports.

use std::borrow::Cow;

use serde_json::Value;

use crate::date_value::DateValue;
use crate::domain::Job;

/// A job field value, shaped for display.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    Null,
    Text(Cow<'a, str>),
    List(Cow<'a, [String]>),
    Date(Cow<'a, DateValue>),
    /// Untyped structured data with no better rendering
    Json(Cow<'a, Value>),
}

impl<'a> FieldValue<'a> {
    fn text(value: &'a str) -> Self {
        FieldValue::Text(Cow::Borrowed(value))
    }

    fn optional_text(value: Option<&'a str>) -> Self {
        value.map_or(FieldValue::Null, Self::text)
    }

    fn optional_date(value: Option<&'a DateValue>) -> Self {
        value.map_or(FieldValue::Null, |date| FieldValue::Date(Cow::Borrowed(date)))
    }

    /// Classify an untyped JSON value. Objects carrying a seconds/nanoseconds
    /// pair are treated as dates.
    pub fn from_json(value: &'a Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::String(text) => FieldValue::text(text),
            Value::Bool(_) | Value::Number(_) => FieldValue::Text(Cow::Owned(value.to_string())),
            Value::Array(items) => FieldValue::List(Cow::Owned(
                items
                    .iter()
                    .filter(|item| !item.is_null())
                    .map(|item| match item {
                        Value::String(text) => text.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            )),
            Value::Object(_) => match DateValue::from_json(value) {
                Some(date) => FieldValue::Date(Cow::Owned(date)),
                None => FieldValue::Json(Cow::Borrowed(value)),
            },
        }
    }
}

macro_rules! job_fields {
    ($($variant:ident => $key:literal, $label:literal, |$job:ident| $getter:expr;)+) => {
        /// Displayable job columns in master display order.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum JobField {
            $($variant,)+
        }

        impl JobField {
            pub const ALL: &'static [JobField] = &[$(JobField::$variant,)+];

            /// Stable camelCase key, as used in query strings and JSON.
            pub fn key(self) -> &'static str {
                match self {
                    $(JobField::$variant => $key,)+
                }
            }

            pub fn label(self) -> &'static str {
                match self {
                    $(JobField::$variant => $label,)+
                }
            }

            /// Look up a field by key. Unknown keys yield `None`.
            pub fn from_key(key: &str) -> Option<JobField> {
                match key {
                    $($key => Some(JobField::$variant),)+
                    _ => None,
                }
            }

            pub fn value(self, job: &Job) -> FieldValue<'_> {
                match self {
                    $(JobField::$variant => {
                        let $job = job;
                        $getter
                    })+
                }
            }
        }
    };
}

job_fields! {
    JobNumber => "jobNumber", "Job No.", |job| FieldValue::text(&job.job_number);
    Status => "status", "Status", |job| FieldValue::text(job.status.as_str());
    ShipmentType => "shipmentType", "Shipment Type", |job| FieldValue::text(job.shipment_type.as_str());
    Mode => "mode", "Mode", |job| FieldValue::text(job.mode.as_str());
    RmName => "rmName", "RM Name", |job| FieldValue::optional_text(job.rm_name.as_deref());
    ShipperDetails => "shipperDetails", "Shipper", |job| FieldValue::text(&job.shipper_details);
    ConsigneeDetails => "consigneeDetails", "Consignee", |job| FieldValue::text(&job.consignee_details);
    OverseasAgent => "overseasAgent", "Overseas Agent", |job| FieldValue::optional_text(job.overseas_agent.as_deref());
    BookingNumber => "bookingNumber", "Booking No.", |job| FieldValue::optional_text(job.booking_number.as_deref());
    InvoiceNumber => "invoiceNumber", "Invoice No.", |job| FieldValue::optional_text(job.invoice_number.as_deref());
    PortOfLoading => "portOfLoading", "Port of Loading", |job| FieldValue::optional_text(job.port_of_loading.as_deref());
    FinalDestination => "finalDestination", "Final Destination", |job| FieldValue::optional_text(job.final_destination.as_deref());
    Commodity => "commodity", "Commodity", |job| FieldValue::optional_text(job.commodity.as_deref());
    GrossWeight => "grossWeight", "Gross Weight", |job| FieldValue::optional_text(job.gross_weight.as_deref());
    NetWeight => "netWeight", "Net Weight", |job| FieldValue::optional_text(job.net_weight.as_deref());
    NoOfPackages => "noOfPackages", "No. of Packages", |job| FieldValue::optional_text(job.no_of_packages.as_deref());
    Volume => "volume", "Volume", |job| FieldValue::optional_text(job.volume.as_deref());
    HblNumber => "hblNumber", "HBL No.", |job| FieldValue::optional_text(job.hbl_number.as_deref());
    HblDate => "hblDate", "HBL Date", |job| FieldValue::optional_date(job.hbl_date.as_ref());
    MblNumber => "mblNumber", "MBL No.", |job| FieldValue::optional_text(job.mbl_number.as_deref());
    MblDate => "mblDate", "MBL Date", |job| FieldValue::optional_date(job.mbl_date.as_ref());
    EtaPod => "etaPod", "ETA POD", |job| FieldValue::optional_date(job.eta_pod.as_ref());
    ContainerFlightNumbers => "containerFlightNumbers", "Container / Flight Nos.", |job| FieldValue::List(Cow::Borrowed(job.container_flight_numbers.as_slice()));
    Remarks => "remarks", "Remarks", |job| FieldValue::optional_text(job.remarks.as_deref());
    CreatedBy => "createdBy", "Created By", |job| FieldValue::text(&job.created_by);
    CreatedAt => "createdAt", "Created At", |job| FieldValue::Date(Cow::Borrowed(&job.created_at));
    UpdatedAt => "updatedAt", "Updated At", |job| FieldValue::Date(Cow::Borrowed(&job.updated_at));
}
