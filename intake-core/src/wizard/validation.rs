//! Per-step and cross-field validation rules.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::form::Field;
use super::notice::Notice;
use super::steps::{StepContext, StepId, definition};
use crate::dates::{parse_calendar_date, parse_optional_date};

/// Longest derived title, in characters, before the ellipsis marker.
pub const TITLE_MAX_CHARS: usize = 50;
const ELLIPSIS: &str = "...";

// ─────────────────────────────────────────────────────────────────────────────
// Field errors
// ─────────────────────────────────────────────────────────────────────────────

/// Field-level validation messages, ordered by field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        field: Field,
        message: impl Into<String>,
    ) {
        self.0.insert(field, message.into());
    }

    pub fn get(
        &self,
        field: Field,
    ) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn remove(
        &mut self,
        field: Field,
    ) -> Option<String> {
        self.0.remove(&field)
    }

    pub fn contains(
        &self,
        field: Field,
    ) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        for (i, (field, message)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Step report
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of validating one step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StepReport {
    pub errors: FieldErrors,
    pub notices: Vec<Notice>,
    /// Set by the Content step when the title is empty and one can be
    /// taken from the content.
    pub derived_title: Option<String>,
}

impl StepReport {
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Engine
// ─────────────────────────────────────────────────────────────────────────────

/// Stateless rule set. Every rule reads the [`StepContext`] only.
pub struct ValidationEngine;

impl ValidationEngine {
    /// Validate a single step.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveDate;
    /// use intake_core::models::UserProfile;
    /// use intake_core::wizard::{FormState, StepContext, StepId, ValidationEngine};
    ///
    /// let profile = UserProfile::new("alice");
    /// let form = FormState::new(&profile, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    /// let ctx = StepContext {
    ///     form: &form,
    ///     profile: &profile,
    ///     document_type: None,
    ///     document_types: None,
    ///     sub_types: None,
    ///     circuits: None,
    ///     centres: None,
    /// };
    ///
    /// assert!(ValidationEngine::validate_step(StepId::Date, &ctx).passed());
    /// assert!(!ValidationEngine::validate_step(StepId::ResponsibilityCentre, &ctx).passed());
    /// ```
    pub fn validate_step(
        step: StepId,
        ctx: &StepContext<'_>,
    ) -> StepReport {
        let mut report = StepReport::default();

        if !(definition(step).is_applicable)(ctx) {
            return report;
        }

        check_required(step, ctx, &mut report);
        match step {
            StepId::ResponsibilityCentre => check_centre(ctx, &mut report),
            StepId::Date => check_dates(ctx, &mut report),
            StepId::TypeSubtype => check_type_subtype(ctx, &mut report),
            StepId::CustomerVendor => check_customer_vendor(ctx, &mut report),
            StepId::Content => check_content(ctx, &mut report),
            StepId::Circuit => check_circuit(ctx, &mut report),
            StepId::Review => {}
        }

        if !report.passed() {
            debug!(step = %step, errors = %report.errors, "step validation failed");
        }
        report
    }

    /// Validate every step in order and return the first failing one.
    ///
    /// # Errors
    /// The failing step and its field errors.
    pub fn validate_all(ctx: &StepContext<'_>) -> Result<(), (StepId, FieldErrors)> {
        for step in StepId::ALL {
            let report = Self::validate_step(step, ctx);
            if !report.passed() {
                return Err((step, report.errors));
            }
        }
        Ok(())
    }
}

/// Blank fields among the step's declared required fields.
fn check_required(
    step: StepId,
    ctx: &StepContext<'_>,
    report: &mut StepReport,
) {
    for field in (definition(step).required_fields)(ctx) {
        if ctx.form.is_blank(field) {
            report.errors.insert(field, required_message(field, ctx));
        }
    }
}

fn required_message(
    field: Field,
    ctx: &StepContext<'_>,
) -> String {
    match field {
        Field::ResponsibilityCentre => "Select a responsibility centre".to_string(),
        Field::DocDate => "Document date is required".to_string(),
        Field::DocumentType => "Select a document type".to_string(),
        Field::SubType => match ctx.sub_types {
            Some([]) => {
                "No subtype is valid for this type and date; change the type or the date".to_string()
            }
            _ => "Select a subtype".to_string(),
        },
        Field::CustomerVendor => match ctx.document_type {
            Some(t) => format!("Select a {}", t.tier_type.as_str().to_ascii_lowercase()),
            None => "Select a customer or vendor".to_string(),
        },
        Field::CustomerVendorName => "Name is required".to_string(),
        Field::Content => "Content is required".to_string(),
        Field::ExternalReference => "External reference is required".to_string(),
        other => format!("{other} is required"),
    }
}

fn check_centre(
    ctx: &StepContext<'_>,
    report: &mut StepReport,
) {
    if let Some(id) = ctx.form.responsibility_centre_id
        && let Some(centres) = ctx.centres
        && !centres.iter().any(|c| c.id == id)
    {
        report
            .errors
            .insert(Field::ResponsibilityCentre, "Unknown responsibility centre");
    }
}

fn check_dates(
    ctx: &StepContext<'_>,
    report: &mut StepReport,
) {
    let raw = ctx.form.doc_date.trim();
    if !raw.is_empty() && parse_calendar_date(raw).is_err() {
        report.errors.insert(Field::DocDate, "Document date is not a valid date");
    }

    if parse_optional_date(&ctx.form.comptable_date).is_err() {
        report
            .errors
            .insert(Field::ComptableDate, "Accounting date is not a valid date");
    }
}

fn check_type_subtype(
    ctx: &StepContext<'_>,
    report: &mut StepReport,
) {
    let form = ctx.form;

    if let Some(type_id) = form.selected_type_id
        && let Some(types) = ctx.document_types
        && !types.iter().any(|t| t.id == type_id)
    {
        report.errors.insert(Field::DocumentType, "Unknown document type");
    }

    let Some(sub_type_id) = form.selected_sub_type_id else {
        return;
    };

    let selected = ctx
        .sub_types
        .and_then(|list| list.iter().find(|s| s.id == sub_type_id));

    let Some(sub_type) = selected else {
        report
            .errors
            .insert(Field::SubType, "Subtype is not valid for the selected type and date");
        return;
    };

    if form.selected_type_id != Some(sub_type.document_type_id) {
        report
            .errors
            .insert(Field::SubType, "Subtype does not belong to the selected type");
        return;
    }

    match form.doc_date() {
        Some(date) if sub_type.is_valid_on(date) => {}
        _ => report
            .errors
            .insert(Field::SubType, "Subtype is not valid on the document date"),
    }
}

fn check_customer_vendor(
    ctx: &StepContext<'_>,
    report: &mut StepReport,
) {
    let Some(document_type) = ctx.document_type else {
        return;
    };
    let tier = document_type.tier_type;

    if let Some(entity) = &ctx.form.selected_customer_vendor
        && entity.code_for(tier).is_none()
    {
        report.errors.insert(
            Field::CustomerVendor,
            format!("Selected entity has no {} code", tier.as_str().to_ascii_lowercase()),
        );
    }
}

fn check_content(
    ctx: &StepContext<'_>,
    report: &mut StepReport,
) {
    let form = ctx.form;

    if !form.content.trim().is_empty() && form.title.trim().is_empty() {
        report.derived_title = derive_title(&form.content);
    }
}

fn check_circuit(
    ctx: &StepContext<'_>,
    report: &mut StepReport,
) {
    if let Some(circuits) = ctx.circuits
        && circuits.is_empty()
    {
        report.notices.push(Notice::warning(
            "No circuit is available for this type; the document will be static",
        ));
    }

    let Some(circuit_id) = ctx.form.circuit_id else {
        return;
    };

    let eligible = match (ctx.circuits, ctx.form.selected_type_id) {
        (Some(circuits), Some(type_id)) => circuits
            .iter()
            .any(|c| c.id == circuit_id && c.is_eligible_for(type_id)),
        _ => false,
    };

    if !eligible {
        report
            .errors
            .insert(Field::Circuit, "Circuit is not available for the selected type");
    }
}

/// A title taken from the first non-blank line of `content`, cut to
/// [`TITLE_MAX_CHARS`] characters plus `...` when longer.
///
/// # Examples
/// ```
/// use intake_core::wizard::derive_title;
///
/// assert_eq!(derive_title("\n  Quarterly invoice  \nbody"), Some("Quarterly invoice".to_string()));
/// assert_eq!(derive_title("   \n "), None);
/// ```
pub fn derive_title(content: &str) -> Option<String> {
    let line = content.lines().map(str::trim).find(|l| !l.is_empty())?;

    if line.chars().count() <= TITLE_MAX_CHARS {
        return Some(line.to_string());
    }
    let mut title: String = line.chars().take(TITLE_MAX_CHARS).collect();
    title.push_str(ELLIPSIS);
    Some(title)
}
