//! Raw upstream records
//!
//! A [`RawRecord`] is one row of the phone request table as the row source
//! returned it: column name to scalar JSON value. Dates and timestamps arrive
//! already rendered as text.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Column names of the upstream `phonerequest` table
pub mod columns {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const JOB_TITLE: &str = "job_title";
    pub const PHONE: &str = "phone";
    pub const EMAIL: &str = "email";
    pub const DEPARTMENT: &str = "department";
    pub const COST_CENTER: &str = "cost_center";
    pub const INSTALLATION_TYPE: &str = "installation_type";
    pub const EQUIPMENT: &str = "equipment";
    pub const USAGE_TYPE: &str = "usage_type";
    pub const ENDING_DATE: &str = "ending_date";
    pub const NEEDED_BY: &str = "needed_by";
    pub const COMMENTS: &str = "comments";
    pub const CREATED_AT: &str = "created_at";
}

/// One row from the row source. Immutable once read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: Map<String, Value>,
}

impl RawRecord {
    /// Build a record from `(column, value)` pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Copy of this record with one column replaced
    pub fn with(&self, column: &str, value: impl Into<Value>) -> Self {
        let mut fields = self.fields.clone();
        fields.insert(column.to_string(), value.into());
        Self { fields }
    }

    /// Copy of this record with one column removed
    pub fn without(&self, column: &str) -> Self {
        let mut fields = self.fields.clone();
        fields.remove(column);
        Self { fields }
    }

    /// Text rendering of a column; `None` when absent or SQL NULL
    pub fn text(&self, column: &str) -> Option<String> {
        match self.fields.get(column)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
