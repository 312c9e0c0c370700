use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{
    Circuit, CreatedDocument, CustomerVendor, DocumentCreateRequest, DocumentType, NewSubType,
    ResponsibilityCentre, SubType,
};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Everything the document-intake wizard reads from, or sends to, the
/// back office: document types, series, circuits, third parties,
/// responsibility centres and the document service itself.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    // Document types
    async fn list_document_types(&self) -> Result<Vec<DocumentType>, RepositoryError>;
    async fn get_document_type(&self, id: i64) -> Result<DocumentType, RepositoryError>;
    async fn get_document_type_by_key(&self, key: &str) -> Result<DocumentType, RepositoryError>;

    // Series / subtypes
    /// Subtypes of `type_id` the series service considers valid on `date`.
    /// Callers must still check `is_active` and the date window themselves.
    async fn list_sub_types(
        &self,
        type_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<SubType>, RepositoryError>;
    async fn delete_sub_types(&self, type_id: i64) -> Result<u64, RepositoryError>;
    async fn insert_sub_type(&self, sub_type: &NewSubType) -> Result<i64, RepositoryError>;

    // Circuits
    async fn list_circuits(&self) -> Result<Vec<Circuit>, RepositoryError>;

    // Third parties
    async fn list_customers(&self) -> Result<Vec<CustomerVendor>, RepositoryError>;
    async fn list_vendors(&self) -> Result<Vec<CustomerVendor>, RepositoryError>;

    // Responsibility centres
    async fn list_responsibility_centres(
        &self,
    ) -> Result<Vec<ResponsibilityCentre>, RepositoryError>;

    // Documents
    async fn create_document(
        &self,
        request: &DocumentCreateRequest,
    ) -> Result<CreatedDocument, RepositoryError>;
}
