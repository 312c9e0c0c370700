use std::collections::{BTreeMap, HashSet};
use std::io::Read;

use chrono::NaiveDate;
use intake_core::dates::parse_calendar_date;
use intake_core::{DocumentRepository, NewSubType, RepositoryError};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur when loading subtype (series) data.
#[derive(Debug, Error)]
pub enum SubTypeLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Subtype '{key}' ends ({end}) before it starts ({start})")]
    InvalidRange {
        key: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("Subtype '{sub_type_key}' appears more than once for document type '{type_key}'")]
    DuplicateSubType {
        type_key: String,
        sub_type_key: String,
    },

    #[error("Document type '{0}' not found in database (have you run the seeds?)")]
    DocumentTypeNotFound(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for SubTypeLoaderError {
    fn from(err: csv::Error) -> Self {
        SubTypeLoaderError::CsvParse(err.to_string())
    }
}

/// A single record from the subtypes CSV file.
///
/// - `document_type_key`: key of the owning document type (e.g. `INV`)
/// - `sub_type_key`: series key, unique within the type
/// - `name`: display name
/// - `start_date` / `end_date`: inclusive validity window; a time of day is
///   accepted and dropped
/// - `is_active`: `true`/`false` or `1`/`0`; blank means active
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SubTypeRecord {
    pub document_type_key: String,
    pub sub_type_key: String,
    pub name: String,
    #[serde(deserialize_with = "deserialize_date")]
    pub start_date: NaiveDate,
    #[serde(deserialize_with = "deserialize_date")]
    pub end_date: NaiveDate,
    #[serde(default = "active_by_default", deserialize_with = "deserialize_flag")]
    pub is_active: bool,
}

fn active_by_default() -> bool {
    true
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_calendar_date(&s).map_err(serde::de::Error::custom)
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s.as_deref().map(str::trim) {
        None | Some("") => Ok(true),
        Some(v) if v == "1" || v.eq_ignore_ascii_case("true") => Ok(true),
        Some(v) if v == "0" || v.eq_ignore_ascii_case("false") => Ok(false),
        Some(v) => Err(serde::de::Error::custom(format!("invalid is_active flag '{v}'"))),
    }
}

/// Loader for subtype data from CSV files.
///
/// Reads CSV data and writes it through the [`DocumentRepository`] trait, so
/// it works with any backend.
pub struct SubTypeLoader;

impl SubTypeLoader {
    /// Parse subtype records from a CSV reader, rejecting any record whose
    /// window ends before it starts.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<SubTypeRecord>, SubTypeLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: SubTypeRecord = result?;
            if record.end_date < record.start_date {
                return Err(SubTypeLoaderError::InvalidRange {
                    key: record.sub_type_key,
                    start: record.start_date,
                    end: record.end_date,
                });
            }
            records.push(record);
        }

        Ok(records)
    }

    /// Replace the subtypes of every document type named in `records`.
    ///
    /// All type keys are resolved and every group is checked for duplicate
    /// series keys before anything is deleted, so a bad file leaves the
    /// table untouched. Types not named in the file keep their subtypes.
    /// Running the same load twice produces the same table.
    pub async fn load<R: DocumentRepository + ?Sized>(
        repo: &R,
        records: &[SubTypeRecord],
    ) -> Result<usize, SubTypeLoaderError> {
        let mut groups: BTreeMap<&str, Vec<&SubTypeRecord>> = BTreeMap::new();
        for record in records {
            groups
                .entry(record.document_type_key.as_str())
                .or_default()
                .push(record);
        }

        let mut resolved = Vec::with_capacity(groups.len());
        for (type_key, group_records) in groups {
            let document_type = repo
                .get_document_type_by_key(type_key)
                .await
                .map_err(|e| match e {
                    RepositoryError::NotFound => {
                        SubTypeLoaderError::DocumentTypeNotFound(type_key.to_string())
                    }
                    other => SubTypeLoaderError::Repository(other),
                })?;

            let mut seen = HashSet::new();
            for record in &group_records {
                if !seen.insert(record.sub_type_key.as_str()) {
                    return Err(SubTypeLoaderError::DuplicateSubType {
                        type_key: type_key.to_string(),
                        sub_type_key: record.sub_type_key.clone(),
                    });
                }
            }

            resolved.push((document_type.id, group_records));
        }

        let mut inserted = 0;
        for (type_id, group_records) in resolved {
            let removed = repo.delete_sub_types(type_id).await?;
            debug!(type_id, removed, "existing subtypes removed");

            for record in group_records {
                let sub_type = NewSubType {
                    document_type_id: type_id,
                    sub_type_key: record.sub_type_key.clone(),
                    name: record.name.clone(),
                    start_date: record.start_date,
                    end_date: record.end_date,
                    is_active: record.is_active,
                };
                repo.insert_sub_type(&sub_type).await?;
                inserted += 1;
            }
        }

        info!(inserted, "subtypes loaded");
        Ok(inserted)
    }
}
