use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The document-creation command sent to the document service.
///
/// Optional values that were not selected serialize as `null` rather than
/// being omitted, so the receiver can tell "not provided" from "empty".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentCreateRequest {
    pub responsibility_centre_id: i64,
    pub type_id: i64,
    pub sub_type_id: i64,
    pub title: String,
    /// Empty whenever `document_externe` is set.
    pub document_alias: String,
    pub document_externe: Option<String>,
    pub doc_date: NaiveDate,
    pub comptable_date: Option<NaiveDate>,
    pub content: String,
    pub circuit_id: Option<i64>,
    pub customer_vendor_code: Option<String>,
    pub customer_vendor_name: Option<String>,
    pub customer_vendor_address: Option<String>,
    pub customer_vendor_city: Option<String>,
    pub customer_vendor_country: Option<String>,
}

impl DocumentCreateRequest {
    /// A document without a circuit has no approval workflow.
    pub fn is_static(&self) -> bool {
        self.circuit_id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedDocument {
    pub id: i64,
    pub title: String,
    pub circuit_id: Option<i64>,
}
