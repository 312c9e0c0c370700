//! Builds the document-creation command from a completed form.

use thiserror::Error;

use super::form::FormState;
use super::validation::derive_title;
use crate::dates::{DateParseError, parse_calendar_date, parse_optional_date};
use crate::models::{DocumentCreateRequest, DocumentType, TierType};

#[derive(Debug, Error, PartialEq)]
pub enum AssemblyError {
    #[error("No responsibility centre selected")]
    MissingCentre,

    #[error("No document type selected")]
    MissingType,

    #[error("No subtype selected")]
    MissingSubType,

    #[error("Document date is required")]
    MissingDocDate,

    #[error(transparent)]
    InvalidDate(#[from] DateParseError),

    #[error("External documents need an external reference")]
    MissingExternalReference,

    #[error("Selected entity has no {} code", .0.as_str().to_ascii_lowercase())]
    MissingCustomerVendorCode(TierType),

    #[error("Customer/vendor name is required")]
    MissingCustomerVendorName,
}

pub struct RequestAssembler;

impl RequestAssembler {
    /// Produce the creation command for `form`.
    ///
    /// `document_type` is the selected type as loaded; its tier decides
    /// which code of the selected entity is sent. Unselected optional values
    /// become `None`, which serializes as `null`.
    ///
    /// # Errors
    /// Any [`AssemblyError`] for a value the form does not yet hold.
    pub fn assemble(
        form: &FormState,
        document_type: Option<&DocumentType>,
    ) -> Result<DocumentCreateRequest, AssemblyError> {
        let responsibility_centre_id = form
            .responsibility_centre_id
            .ok_or(AssemblyError::MissingCentre)?;

        let document_type = document_type
            .filter(|t| form.selected_type_id == Some(t.id))
            .ok_or(AssemblyError::MissingType)?;
        let sub_type_id = form
            .selected_sub_type_id
            .ok_or(AssemblyError::MissingSubType)?;

        if form.doc_date.trim().is_empty() {
            return Err(AssemblyError::MissingDocDate);
        }
        let doc_date = parse_calendar_date(&form.doc_date)?;
        let comptable_date = parse_optional_date(&form.comptable_date)?;

        let (document_alias, document_externe) = if form.is_external {
            let reference = form.external_reference.trim();
            if reference.is_empty() {
                return Err(AssemblyError::MissingExternalReference);
            }
            (String::new(), Some(reference.to_string()))
        } else {
            (form.document_alias.clone(), None)
        };

        let title = match form.title.trim() {
            "" => derive_title(&form.content).unwrap_or_default(),
            title => title.to_string(),
        };

        let mut request = DocumentCreateRequest {
            responsibility_centre_id,
            type_id: document_type.id,
            sub_type_id,
            title,
            document_alias,
            document_externe,
            doc_date,
            comptable_date,
            content: form.content.clone(),
            circuit_id: form.circuit_id,
            customer_vendor_code: None,
            customer_vendor_name: None,
            customer_vendor_address: None,
            customer_vendor_city: None,
            customer_vendor_country: None,
        };

        let tier = document_type.tier_type;
        if tier.requires_customer_vendor() {
            let code = form
                .selected_customer_vendor
                .as_ref()
                .and_then(|e| e.code_for(tier))
                .ok_or(AssemblyError::MissingCustomerVendorCode(tier))?;
            let name = non_blank(&form.customer_vendor_name)
                .ok_or(AssemblyError::MissingCustomerVendorName)?;

            request.customer_vendor_code = Some(code.to_string());
            request.customer_vendor_name = Some(name);
            request.customer_vendor_address = non_blank(&form.customer_vendor_address);
            request.customer_vendor_city = non_blank(&form.customer_vendor_city);
            request.customer_vendor_country = non_blank(&form.customer_vendor_country);
        }

        Ok(request)
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
