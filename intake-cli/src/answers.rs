//! Wizard answers file: the values `doc-intake create` enters, referenced by
//! business key rather than database id.
//!
//! ```toml
//! doc_date = "2024-03-15"
//! document_type = "INV"
//! customer_vendor = "C001"
//! content = "Consulting services for March"
//! circuit = "FIN"
//! ```
//!
//! Omitted keys are left untouched, so the wizard's own defaults apply
//! (today's date, the user's centre, a single valid subtype, a title taken
//! from the content).

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnswersError {
    #[error("Failed to read answers file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse answers: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Answers {
    /// Centre code; only asked when the user has no assigned centre.
    pub responsibility_centre: Option<String>,
    pub doc_date: Option<String>,
    pub comptable_date: Option<String>,
    /// Document type key.
    pub document_type: Option<String>,
    /// Subtype key; may be omitted when only one subtype is valid.
    pub sub_type: Option<String>,
    /// Customer code or vendor code, depending on the type's tier.
    pub customer_vendor: Option<String>,
    pub customer_vendor_name: Option<String>,
    pub customer_vendor_address: Option<String>,
    pub customer_vendor_city: Option<String>,
    pub customer_vendor_country: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub document_alias: Option<String>,
    /// Marks the document external when present.
    pub external_reference: Option<String>,
    /// Circuit key.
    pub circuit: Option<String>,
}

impl Answers {
    pub fn from_toml_str(content: &str) -> Result<Self, AnswersError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, AnswersError> {
        let content = std::fs::read_to_string(path).map_err(|source| AnswersError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}
