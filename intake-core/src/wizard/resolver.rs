//! Externally resolved option sets.
//!
//! [`ConstraintResolver`] is the seam between the wizard and the back
//! office. [`ServiceResolver`] is the live implementation over a
//! [`DocumentRepository`]; it degrades to a [`FallbackDataProvider`] for
//! subtypes, the only lookup with a safe static default.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::fallback::FallbackDataProvider;
use crate::db::{DocumentRepository, RepositoryError};
use crate::models::{Circuit, CustomerVendor, DocumentType, ResponsibilityCentre, SubType, TierType};

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("{0} are not available from this resolver")]
    Unavailable(&'static str),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Where a subtype list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionSource {
    Live,
    Fallback,
}

/// Subtypes eligible for a `(type, date)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtypeResolution {
    pub type_id: i64,
    pub date: NaiveDate,
    pub sub_types: Vec<SubType>,
    pub source: ResolutionSource,
}

impl SubtypeResolution {
    /// The only eligible subtype, when there is exactly one.
    pub fn auto_selection(&self) -> Option<&SubType> {
        match self.sub_types.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }
}

/// Option-set lookups used by the wizard.
///
/// Every returned list is already filtered to what the wizard may offer:
/// subtypes are active and valid on the date, circuits are active and
/// compatible with the type.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConstraintResolver: Send + Sync {
    async fn document_types(&self) -> Result<Vec<DocumentType>, ResolutionError>;

    async fn resolve_subtypes(
        &self,
        type_id: i64,
        date: NaiveDate,
    ) -> Result<SubtypeResolution, ResolutionError>;

    async fn resolve_circuits(
        &self,
        type_id: i64,
    ) -> Result<Vec<Circuit>, ResolutionError>;

    async fn resolve_customer_vendors(
        &self,
        tier: TierType,
    ) -> Result<Vec<CustomerVendor>, ResolutionError>;

    async fn resolve_responsibility_centres(
        &self,
    ) -> Result<Vec<ResponsibilityCentre>, ResolutionError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// ServiceResolver
// ─────────────────────────────────────────────────────────────────────────────

pub struct ServiceResolver {
    repository: Arc<dyn DocumentRepository>,
    fallback: FallbackDataProvider,
}

impl ServiceResolver {
    pub fn new(repository: Arc<dyn DocumentRepository>) -> Self {
        Self::with_fallback(repository, FallbackDataProvider::new())
    }

    pub fn with_fallback(
        repository: Arc<dyn DocumentRepository>,
        fallback: FallbackDataProvider,
    ) -> Self {
        Self {
            repository,
            fallback,
        }
    }
}

#[async_trait]
impl ConstraintResolver for ServiceResolver {
    async fn document_types(&self) -> Result<Vec<DocumentType>, ResolutionError> {
        Ok(self.repository.list_document_types().await?)
    }

    async fn resolve_subtypes(
        &self,
        type_id: i64,
        date: NaiveDate,
    ) -> Result<SubtypeResolution, ResolutionError> {
        match self.repository.list_sub_types(type_id, date).await {
            Ok(candidates) => {
                let sub_types: Vec<SubType> = candidates
                    .into_iter()
                    .filter(|s| s.document_type_id == type_id && s.is_valid_on(date))
                    .collect();
                debug!(type_id, %date, count = sub_types.len(), "resolved subtypes");
                Ok(SubtypeResolution {
                    type_id,
                    date,
                    sub_types,
                    source: ResolutionSource::Live,
                })
            }
            Err(e) => {
                warn!(type_id, %date, error = %e, "subtype lookup failed; using static subtypes");
                Ok(SubtypeResolution {
                    type_id,
                    date,
                    sub_types: self.fallback.sub_types_for(type_id, date),
                    source: ResolutionSource::Fallback,
                })
            }
        }
    }

    async fn resolve_circuits(
        &self,
        type_id: i64,
    ) -> Result<Vec<Circuit>, ResolutionError> {
        let circuits: Vec<Circuit> = self
            .repository
            .list_circuits()
            .await?
            .into_iter()
            .filter(|c| c.is_eligible_for(type_id))
            .collect();
        debug!(type_id, count = circuits.len(), "resolved circuits");
        Ok(circuits)
    }

    async fn resolve_customer_vendors(
        &self,
        tier: TierType,
    ) -> Result<Vec<CustomerVendor>, ResolutionError> {
        let entities = match tier {
            TierType::Customer => self.repository.list_customers().await?,
            TierType::Vendor => self.repository.list_vendors().await?,
            TierType::None => Vec::new(),
        };
        Ok(entities)
    }

    async fn resolve_responsibility_centres(
        &self,
    ) -> Result<Vec<ResponsibilityCentre>, ResolutionError> {
        Ok(self.repository.list_responsibility_centres().await?)
    }
}
