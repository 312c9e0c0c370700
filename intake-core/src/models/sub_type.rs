use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::is_within;

/// A time-bounded sub-classification ("series") of a document type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubType {
    pub id: i64,
    pub document_type_id: i64,
    pub sub_type_key: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
}

impl SubType {
    /// True when the subtype is active and `date` falls inside its
    /// inclusive validity window.
    pub fn is_valid_on(
        &self,
        date: NaiveDate,
    ) -> bool {
        self.is_active && is_within(date, self.start_date, self.end_date)
    }
}

/// For inserting subtypes (no id yet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSubType {
    pub document_type_id: i64,
    pub sub_type_key: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
}
