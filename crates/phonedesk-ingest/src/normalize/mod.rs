//! Raw record to service-desk request mapping
//!
//! [`normalize`] is pure: no I/O, same output for the same record.

pub mod tables;

use crate::error::NormalizeError;
use crate::record::{columns, RawRecord};
use serde::Serialize;
use tables::{lookup, UsageDuration, UNKNOWN_INSTALLATION_CODE};

/// Separator of the multi-valued equipment column
pub const EQUIPMENT_SEPARATOR: char = ';';

/// Canonical phone equipment request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedRequest {
    pub name: String,
    pub job_title: String,
    pub phone: String,
    pub email: String,
    pub department: String,
    pub cost_center: String,
    pub installation_type: Vec<&'static str>,
    pub equipment: Vec<&'static str>,
    pub usage_type: Vec<&'static str>,
    /// Only present for temporary usage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ending_date: Option<String>,
    pub needed_by: String,
    pub comments: String,
}

impl NormalizedRequest {
    /// Ticket summary line
    pub fn summary(&self) -> String {
        format!("Phone equipment order - {}", self.name)
    }

    /// Ticket description line
    pub fn description(&self) -> String {
        format!("Equipment request for {} in {}", self.name, self.department)
    }
}

/// Map one raw record to a request.
///
/// Fails with [`NormalizeError::MissingField`] when a required column is
/// absent or NULL, and with [`NormalizeError::UnmappedCategory`] when the
/// usage duration is neither temporary nor permanent. Unknown installation
/// types and equipment tokens do not fail the record.
pub fn normalize(record: &RawRecord) -> Result<NormalizedRequest, NormalizeError> {
    let usage_label = required(record, columns::USAGE_TYPE)?;
    let usage = lookup(tables::USAGE_DURATIONS, &usage_label).ok_or_else(|| {
        NormalizeError::UnmappedCategory {
            field: columns::USAGE_TYPE,
            value: usage_label.clone(),
        }
    })?;

    let ending_date = match usage {
        UsageDuration::Temporary => Some(required(record, columns::ENDING_DATE)?),
        UsageDuration::Permanent => None,
    };

    let installation_label = required(record, columns::INSTALLATION_TYPE)?;
    let installation_code = lookup(tables::INSTALLATION_TYPES, &installation_label)
        .unwrap_or(UNKNOWN_INSTALLATION_CODE);

    Ok(NormalizedRequest {
        name: required(record, columns::NAME)?,
        job_title: required(record, columns::JOB_TITLE)?,
        phone: required(record, columns::PHONE)?,
        email: required(record, columns::EMAIL)?,
        department: required(record, columns::DEPARTMENT)?,
        cost_center: required(record, columns::COST_CENTER)?,
        installation_type: vec![installation_code],
        equipment: equipment_codes(&required(record, columns::EQUIPMENT)?),
        usage_type: vec![usage.code()],
        ending_date,
        needed_by: required(record, columns::NEEDED_BY)?,
        comments: record.text(columns::COMMENTS).unwrap_or_default(),
    })
}

/// Split the equipment column and map each token; unmapped tokens are dropped
pub fn equipment_codes(raw: &str) -> Vec<&'static str> {
    raw.split(EQUIPMENT_SEPARATOR)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(|token| lookup(tables::EQUIPMENT, token))
        .collect()
}

fn required(record: &RawRecord, column: &'static str) -> Result<String, NormalizeError> {
    record
        .text(column)
        .ok_or(NormalizeError::MissingField(column))
}
