//! Static subtypes used when the series service cannot be reached.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::resolver::{ConstraintResolver, ResolutionError, ResolutionSource, SubtypeResolution};
use crate::models::{Circuit, CustomerVendor, DocumentType, ResponsibilityCentre, SubType, TierType};

/// Built-in rows: `(id, type_id, key, name, start, end)` with dates as
/// `(year, month, day)`. Ids sit far above anything the service hands out.
const BUILT_IN: &[(i64, i64, &str, &str, (i32, u32, u32), (i32, u32, u32))] = &[
    (9001, 1, "INV-GEN", "General invoices", (2020, 1, 1), (2099, 12, 31)),
    (9002, 1, "INV-LEGACY", "Legacy invoices", (2000, 1, 1), (2019, 12, 31)),
    (9003, 2, "PO-GEN", "General purchase orders", (2000, 1, 1), (2099, 12, 31)),
    (9004, 3, "MEMO-GEN", "Internal memos", (2000, 1, 1), (2099, 12, 31)),
];

/// One static subtype, always active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackEntry {
    pub id: i64,
    pub document_type_id: i64,
    pub sub_type_key: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl FallbackEntry {
    pub fn new(
        id: i64,
        document_type_id: i64,
        sub_type_key: &str,
        name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            document_type_id,
            sub_type_key: sub_type_key.to_string(),
            name: name.to_string(),
            start_date,
            end_date,
        }
    }

    fn to_sub_type(&self) -> SubType {
        SubType {
            id: self.id,
            document_type_id: self.document_type_id,
            sub_type_key: self.sub_type_key.clone(),
            name: self.name.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            is_active: true,
        }
    }
}

/// Degraded-mode subtype table, filtered by the same date rule as live
/// results.
///
/// It also implements [`ConstraintResolver`] on its own so it can stand in
/// for the live service in tests; every lookup other than subtypes reports
/// [`ResolutionError::Unavailable`].
#[derive(Debug, Clone)]
pub struct FallbackDataProvider {
    entries: Vec<FallbackEntry>,
}

impl FallbackDataProvider {
    pub fn new() -> Self {
        let entries = BUILT_IN
            .iter()
            .filter_map(|&(id, type_id, key, name, (sy, sm, sd), (ey, em, ed))| {
                let start = NaiveDate::from_ymd_opt(sy, sm, sd)?;
                let end = NaiveDate::from_ymd_opt(ey, em, ed)?;
                Some(FallbackEntry::new(id, type_id, key, name, start, end))
            })
            .collect();
        Self { entries }
    }

    pub fn with_entries(entries: Vec<FallbackEntry>) -> Self {
        Self { entries }
    }

    pub fn sub_types_for(
        &self,
        type_id: i64,
        date: NaiveDate,
    ) -> Vec<SubType> {
        self.entries
            .iter()
            .filter(|e| e.document_type_id == type_id)
            .map(FallbackEntry::to_sub_type)
            .filter(|s| s.is_valid_on(date))
            .collect()
    }
}

impl Default for FallbackDataProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConstraintResolver for FallbackDataProvider {
    async fn document_types(&self) -> Result<Vec<DocumentType>, ResolutionError> {
        Err(ResolutionError::Unavailable("document types"))
    }

    async fn resolve_subtypes(
        &self,
        type_id: i64,
        date: NaiveDate,
    ) -> Result<SubtypeResolution, ResolutionError> {
        Ok(SubtypeResolution {
            type_id,
            date,
            sub_types: self.sub_types_for(type_id, date),
            source: ResolutionSource::Fallback,
        })
    }

    async fn resolve_circuits(
        &self,
        _type_id: i64,
    ) -> Result<Vec<Circuit>, ResolutionError> {
        Err(ResolutionError::Unavailable("circuits"))
    }

    async fn resolve_customer_vendors(
        &self,
        _tier: TierType,
    ) -> Result<Vec<CustomerVendor>, ResolutionError> {
        Err(ResolutionError::Unavailable("customers and vendors"))
    }

    async fn resolve_responsibility_centres(
        &self,
    ) -> Result<Vec<ResponsibilityCentre>, ResolutionError> {
        Err(ResolutionError::Unavailable("responsibility centres"))
    }
}
