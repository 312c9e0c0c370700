//! Wizard form state and typed field updates.
//!
//! [`FormState`] is the single source of truth for an open wizard session.
//! Only the controller mutates it, through [`FieldUpdate`] values; everyone
//! else reads a shared reference.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::parse_calendar_date;
use crate::models::{CustomerVendor, UserProfile};

/// Names of the fields a wizard session edits.
///
/// Used as keys for field-level errors and in the invalidation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Field {
    ResponsibilityCentre,
    DocDate,
    ComptableDate,
    DocumentType,
    SubType,
    CustomerVendor,
    CustomerVendorName,
    CustomerVendorAddress,
    CustomerVendorCity,
    CustomerVendorCountry,
    Title,
    Content,
    DocumentAlias,
    IsExternal,
    ExternalReference,
    Circuit,
}

impl Field {
    /// Wire-style name, matching the keys of the creation payload where
    /// one exists.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ResponsibilityCentre => "responsibilityCentreId",
            Self::DocDate => "docDate",
            Self::ComptableDate => "comptableDate",
            Self::DocumentType => "typeId",
            Self::SubType => "subTypeId",
            Self::CustomerVendor => "customerVendorCode",
            Self::CustomerVendorName => "customerVendorName",
            Self::CustomerVendorAddress => "customerVendorAddress",
            Self::CustomerVendorCity => "customerVendorCity",
            Self::CustomerVendorCountry => "customerVendorCountry",
            Self::Title => "title",
            Self::Content => "content",
            Self::DocumentAlias => "documentAlias",
            Self::IsExternal => "isExternal",
            Self::ExternalReference => "documentExterne",
            Self::Circuit => "circuitId",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A change to one field, carrying a value of the right type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldUpdate {
    ResponsibilityCentre(Option<i64>),
    DocDate(String),
    ComptableDate(String),
    DocumentType(Option<i64>),
    SubType(Option<i64>),
    CustomerVendor(Option<CustomerVendor>),
    CustomerVendorName(String),
    CustomerVendorAddress(String),
    CustomerVendorCity(String),
    CustomerVendorCountry(String),
    Title(String),
    Content(String),
    DocumentAlias(String),
    IsExternal(bool),
    ExternalReference(String),
    Circuit(Option<i64>),
}

impl FieldUpdate {
    pub fn field(&self) -> Field {
        match self {
            Self::ResponsibilityCentre(_) => Field::ResponsibilityCentre,
            Self::DocDate(_) => Field::DocDate,
            Self::ComptableDate(_) => Field::ComptableDate,
            Self::DocumentType(_) => Field::DocumentType,
            Self::SubType(_) => Field::SubType,
            Self::CustomerVendor(_) => Field::CustomerVendor,
            Self::CustomerVendorName(_) => Field::CustomerVendorName,
            Self::CustomerVendorAddress(_) => Field::CustomerVendorAddress,
            Self::CustomerVendorCity(_) => Field::CustomerVendorCity,
            Self::CustomerVendorCountry(_) => Field::CustomerVendorCountry,
            Self::Title(_) => Field::Title,
            Self::Content(_) => Field::Content,
            Self::DocumentAlias(_) => Field::DocumentAlias,
            Self::IsExternal(_) => Field::IsExternal,
            Self::ExternalReference(_) => Field::ExternalReference,
            Self::Circuit(_) => Field::Circuit,
        }
    }
}

/// Everything the user has entered so far.
///
/// Dates are kept as typed so that an unparseable date can be reported on
/// the Date step instead of being lost; [`FormState::doc_date`] gives the
/// parsed value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormState {
    pub responsibility_centre_id: Option<i64>,
    pub doc_date: String,
    pub comptable_date: String,
    pub selected_type_id: Option<i64>,
    pub selected_sub_type_id: Option<i64>,
    pub title: String,
    pub content: String,
    pub document_alias: String,
    pub is_external: bool,
    pub external_reference: String,
    pub circuit_id: Option<i64>,
    pub circuit_name: String,

    /// The source record, kept as selected.
    pub selected_customer_vendor: Option<CustomerVendor>,
    // Display overrides, seeded from the selected record and then edited
    // independently of it.
    pub customer_vendor_name: String,
    pub customer_vendor_address: String,
    pub customer_vendor_city: String,
    pub customer_vendor_country: String,
}

impl FormState {
    /// Fresh state for a new session: today's date, and the user's own
    /// responsibility centre when they have one.
    pub fn new(
        profile: &UserProfile,
        today: NaiveDate,
    ) -> Self {
        Self {
            responsibility_centre_id: profile.responsibility_centre_id,
            doc_date: today.format("%Y-%m-%d").to_string(),
            ..Default::default()
        }
    }

    /// The parsed document date, if the raw value is a valid date.
    pub fn doc_date(&self) -> Option<NaiveDate> {
        parse_calendar_date(&self.doc_date).ok()
    }

    /// True when `field` holds no value. Text counts as blank when it is
    /// only whitespace.
    pub fn is_blank(
        &self,
        field: Field,
    ) -> bool {
        match field {
            Field::ResponsibilityCentre => self.responsibility_centre_id.is_none(),
            Field::DocDate => self.doc_date.trim().is_empty(),
            Field::ComptableDate => self.comptable_date.trim().is_empty(),
            Field::DocumentType => self.selected_type_id.is_none(),
            Field::SubType => self.selected_sub_type_id.is_none(),
            Field::CustomerVendor => self.selected_customer_vendor.is_none(),
            Field::CustomerVendorName => self.customer_vendor_name.trim().is_empty(),
            Field::CustomerVendorAddress => self.customer_vendor_address.trim().is_empty(),
            Field::CustomerVendorCity => self.customer_vendor_city.trim().is_empty(),
            Field::CustomerVendorCountry => self.customer_vendor_country.trim().is_empty(),
            Field::Title => self.title.trim().is_empty(),
            Field::Content => self.content.trim().is_empty(),
            Field::DocumentAlias => self.document_alias.trim().is_empty(),
            Field::IsExternal => !self.is_external,
            Field::ExternalReference => self.external_reference.trim().is_empty(),
            Field::Circuit => self.circuit_id.is_none(),
        }
    }

    /// Write `update` into the state. Returns whether the stored value
    /// actually changed.
    ///
    /// Selecting a customer/vendor reseeds the four display overrides from
    /// the record; clearing the selection clears them.
    pub(crate) fn apply(
        &mut self,
        update: FieldUpdate,
    ) -> bool {
        match update {
            FieldUpdate::ResponsibilityCentre(v) => replace(&mut self.responsibility_centre_id, v),
            FieldUpdate::DocDate(v) => replace(&mut self.doc_date, v),
            FieldUpdate::ComptableDate(v) => replace(&mut self.comptable_date, v),
            FieldUpdate::DocumentType(v) => replace(&mut self.selected_type_id, v),
            FieldUpdate::SubType(v) => replace(&mut self.selected_sub_type_id, v),
            FieldUpdate::CustomerVendor(entity) => {
                let (name, address, city, country) = match &entity {
                    Some(e) => (e.name.clone(), e.address.clone(), e.city.clone(), e.country.clone()),
                    None => Default::default(),
                };
                let changed = replace(&mut self.selected_customer_vendor, entity);
                if changed {
                    self.customer_vendor_name = name;
                    self.customer_vendor_address = address;
                    self.customer_vendor_city = city;
                    self.customer_vendor_country = country;
                }
                changed
            }
            FieldUpdate::CustomerVendorName(v) => replace(&mut self.customer_vendor_name, v),
            FieldUpdate::CustomerVendorAddress(v) => replace(&mut self.customer_vendor_address, v),
            FieldUpdate::CustomerVendorCity(v) => replace(&mut self.customer_vendor_city, v),
            FieldUpdate::CustomerVendorCountry(v) => replace(&mut self.customer_vendor_country, v),
            FieldUpdate::Title(v) => replace(&mut self.title, v),
            FieldUpdate::Content(v) => replace(&mut self.content, v),
            FieldUpdate::DocumentAlias(v) => replace(&mut self.document_alias, v),
            FieldUpdate::IsExternal(v) => replace(&mut self.is_external, v),
            FieldUpdate::ExternalReference(v) => replace(&mut self.external_reference, v),
            FieldUpdate::Circuit(v) => {
                let changed = replace(&mut self.circuit_id, v);
                if changed {
                    self.circuit_name.clear();
                }
                changed
            }
        }
    }

    /// Reset `field` to its empty value.
    pub(crate) fn clear(
        &mut self,
        field: Field,
    ) {
        match field {
            Field::ResponsibilityCentre => self.responsibility_centre_id = None,
            Field::DocDate => self.doc_date.clear(),
            Field::ComptableDate => self.comptable_date.clear(),
            Field::DocumentType => self.selected_type_id = None,
            Field::SubType => self.selected_sub_type_id = None,
            Field::CustomerVendor => {
                self.apply(FieldUpdate::CustomerVendor(None));
            }
            Field::CustomerVendorName => self.customer_vendor_name.clear(),
            Field::CustomerVendorAddress => self.customer_vendor_address.clear(),
            Field::CustomerVendorCity => self.customer_vendor_city.clear(),
            Field::CustomerVendorCountry => self.customer_vendor_country.clear(),
            Field::Title => self.title.clear(),
            Field::Content => self.content.clear(),
            Field::DocumentAlias => self.document_alias.clear(),
            Field::IsExternal => self.is_external = false,
            Field::ExternalReference => self.external_reference.clear(),
            Field::Circuit => {
                self.circuit_id = None;
                self.circuit_name.clear();
            }
        }
    }
}

fn replace<T: PartialEq>(
    slot: &mut T,
    value: T,
) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}
