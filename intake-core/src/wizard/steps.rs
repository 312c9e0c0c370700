//! The seven wizard steps and their static definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::form::{Field, FormState};
use crate::models::{Circuit, DocumentType, ResponsibilityCentre, SubType, UserProfile};

/// Total number of steps in the wizard.
pub const TOTAL_STEPS: u8 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StepId {
    ResponsibilityCentre,
    Date,
    TypeSubtype,
    CustomerVendor,
    Content,
    Circuit,
    Review,
}

impl StepId {
    pub const ALL: [StepId; TOTAL_STEPS as usize] = [
        Self::ResponsibilityCentre,
        Self::Date,
        Self::TypeSubtype,
        Self::CustomerVendor,
        Self::Content,
        Self::Circuit,
        Self::Review,
    ];

    pub const FIRST: StepId = Self::ResponsibilityCentre;
    pub const LAST: StepId = Self::Review;

    /// 1-based position.
    pub fn number(self) -> u8 {
        match self {
            Self::ResponsibilityCentre => 1,
            Self::Date => 2,
            Self::TypeSubtype => 3,
            Self::CustomerVendor => 4,
            Self::Content => 5,
            Self::Circuit => 6,
            Self::Review => 7,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1..=TOTAL_STEPS => Some(Self::ALL[usize::from(n - 1)]),
            _ => None,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::ResponsibilityCentre => "Responsibility Centre",
            Self::Date => "Date",
            Self::TypeSubtype => "Type / Subtype",
            Self::CustomerVendor => "Customer / Vendor",
            Self::Content => "Content",
            Self::Circuit => "Circuit",
            Self::Review => "Review",
        }
    }

    /// The following step, clamped to [`StepId::LAST`].
    pub fn next(self) -> Self {
        Self::from_number(self.number() + 1).unwrap_or(Self::LAST)
    }

    /// The preceding step, clamped to [`StepId::FIRST`].
    pub fn prev(self) -> Self {
        Self::from_number(self.number().saturating_sub(1)).unwrap_or(Self::FIRST)
    }

    /// The step on which `field` is edited.
    pub fn owning(field: Field) -> Self {
        match field {
            Field::ResponsibilityCentre => Self::ResponsibilityCentre,
            Field::DocDate | Field::ComptableDate => Self::Date,
            Field::DocumentType | Field::SubType => Self::TypeSubtype,
            Field::CustomerVendor
            | Field::CustomerVendorName
            | Field::CustomerVendorAddress
            | Field::CustomerVendorCity
            | Field::CustomerVendorCountry => Self::CustomerVendor,
            Field::Title
            | Field::Content
            | Field::DocumentAlias
            | Field::IsExternal
            | Field::ExternalReference => Self::Content,
            Field::Circuit => Self::Circuit,
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}. {}", self.number(), self.title())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Step context
// ─────────────────────────────────────────────────────────────────────────────

/// Read-only snapshot handed to step predicates and the validation engine.
///
/// Option lists are `None` until their resolution has completed.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub form: &'a FormState,
    pub profile: &'a UserProfile,
    /// The selected document type, looked up in the loaded type list.
    pub document_type: Option<&'a DocumentType>,
    pub document_types: Option<&'a [DocumentType]>,
    pub sub_types: Option<&'a [SubType]>,
    pub circuits: Option<&'a [Circuit]>,
    pub centres: Option<&'a [ResponsibilityCentre]>,
}

impl StepContext<'_> {
    /// True when the selected type needs a customer or vendor.
    pub fn requires_customer_vendor(&self) -> bool {
        self.document_type
            .is_some_and(|t| t.tier_type.requires_customer_vendor())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Step definitions
// ─────────────────────────────────────────────────────────────────────────────

pub struct StepDefinition {
    pub id: StepId,
    pub title: &'static str,
    /// Fields that must hold a value before the step can pass.
    pub required_fields: fn(&StepContext<'_>) -> Vec<Field>,
    /// A step that is not applicable is a pass-through.
    pub is_applicable: fn(&StepContext<'_>) -> bool,
}

impl fmt::Debug for StepDefinition {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("StepDefinition")
            .field("id", &self.id)
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

pub static STEPS: [StepDefinition; TOTAL_STEPS as usize] = [
    StepDefinition {
        id: StepId::ResponsibilityCentre,
        title: "Responsibility Centre",
        required_fields: centre_required,
        is_applicable: centre_applicable,
    },
    StepDefinition {
        id: StepId::Date,
        title: "Date",
        required_fields: date_required,
        is_applicable: always,
    },
    StepDefinition {
        id: StepId::TypeSubtype,
        title: "Type / Subtype",
        required_fields: type_required,
        is_applicable: always,
    },
    StepDefinition {
        id: StepId::CustomerVendor,
        title: "Customer / Vendor",
        required_fields: customer_vendor_required,
        is_applicable: customer_vendor_applicable,
    },
    StepDefinition {
        id: StepId::Content,
        title: "Content",
        required_fields: content_required,
        is_applicable: always,
    },
    StepDefinition {
        id: StepId::Circuit,
        title: "Circuit",
        required_fields: nothing,
        is_applicable: always,
    },
    StepDefinition {
        id: StepId::Review,
        title: "Review",
        required_fields: nothing,
        is_applicable: always,
    },
];

pub fn definition(id: StepId) -> &'static StepDefinition {
    &STEPS[usize::from(id.number() - 1)]
}

fn always(_: &StepContext<'_>) -> bool {
    true
}

fn nothing(_: &StepContext<'_>) -> Vec<Field> {
    Vec::new()
}

fn centre_applicable(ctx: &StepContext<'_>) -> bool {
    !ctx.profile.has_assigned_centre()
}

fn centre_required(ctx: &StepContext<'_>) -> Vec<Field> {
    if centre_applicable(ctx) {
        vec![Field::ResponsibilityCentre]
    } else {
        Vec::new()
    }
}

fn date_required(_: &StepContext<'_>) -> Vec<Field> {
    vec![Field::DocDate]
}

fn type_required(_: &StepContext<'_>) -> Vec<Field> {
    vec![Field::DocumentType, Field::SubType]
}

fn customer_vendor_applicable(ctx: &StepContext<'_>) -> bool {
    ctx.requires_customer_vendor()
}

fn customer_vendor_required(ctx: &StepContext<'_>) -> Vec<Field> {
    if customer_vendor_applicable(ctx) {
        vec![Field::CustomerVendor, Field::CustomerVendorName]
    } else {
        Vec::new()
    }
}

fn content_required(ctx: &StepContext<'_>) -> Vec<Field> {
    if ctx.form.is_external {
        vec![Field::Content, Field::ExternalReference]
    } else {
        vec![Field::Content]
    }
}
