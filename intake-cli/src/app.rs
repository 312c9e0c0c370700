use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use intake_core::db::RepositoryRegistry;
use intake_core::wizard::{
    ConstraintResolver, FieldUpdate, NoticeLevel, ResolutionSource, ServiceResolver, StepId,
    SubtypeResolution, WizardController,
};
use intake_core::{Circuit, CreatedDocument, DocumentRepository, DocumentType};
use intake_db_sqlite::SqliteRepositoryFactory;
use tracing::{debug, info, warn};

use crate::answers::Answers;
use crate::config::AppConfig;

/// Build a [`RepositoryRegistry`] pre-loaded with every backend this binary
/// was compiled with.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

pub async fn open_repository(config: &AppConfig) -> Result<Arc<dyn DocumentRepository>> {
    let db_config = config.database.to_db_config();
    debug!(backend = %db_config.backend, "connecting");
    build_registry()
        .create(&db_config)
        .await
        .with_context(|| format!("Failed to open {} backend", db_config.backend))
}

async fn document_type_by_key(
    repo: &dyn DocumentRepository,
    key: &str,
) -> Result<DocumentType> {
    repo.get_document_type_by_key(key)
        .await
        .with_context(|| format!("Unknown document type '{key}'"))
}

/// Subtypes valid for the type on `date`, through the same resolver the
/// wizard uses (and so with the same fallback).
pub async fn resolve_sub_types(
    repo: Arc<dyn DocumentRepository>,
    type_key: &str,
    date: NaiveDate,
) -> Result<SubtypeResolution> {
    let document_type = document_type_by_key(repo.as_ref(), type_key).await?;
    let resolver = ServiceResolver::new(repo);
    resolver
        .resolve_subtypes(document_type.id, date)
        .await
        .with_context(|| format!("Failed to resolve subtypes of '{type_key}'"))
}

pub async fn resolve_circuits(
    repo: Arc<dyn DocumentRepository>,
    type_key: &str,
) -> Result<Vec<Circuit>> {
    let document_type = document_type_by_key(repo.as_ref(), type_key).await?;
    let resolver = ServiceResolver::new(repo);
    resolver
        .resolve_circuits(document_type.id)
        .await
        .with_context(|| format!("Failed to resolve circuits of '{type_key}'"))
}

// ─── rendering ───────────────────────────────────────────────────────────────

pub fn render_document_types(types: &[DocumentType]) -> String {
    let mut out = String::new();
    for t in types {
        let _ = writeln!(out, "{:<8} {:<24} {}", t.type_key, t.type_name, t.tier_type.as_str());
    }
    out
}

pub fn render_sub_types(resolution: &SubtypeResolution) -> String {
    let mut out = String::new();
    if resolution.source == ResolutionSource::Fallback {
        let _ = writeln!(out, "(series service unavailable, built-in list)");
    }
    if resolution.sub_types.is_empty() {
        let _ = writeln!(out, "No subtype is valid on {}", resolution.date);
    }
    for s in &resolution.sub_types {
        let _ = writeln!(
            out,
            "{:<12} {:<28} {} .. {}",
            s.sub_type_key, s.name, s.start_date, s.end_date
        );
    }
    out
}

pub fn render_circuits(circuits: &[Circuit]) -> String {
    if circuits.is_empty() {
        return "No circuit available; documents of this type are static\n".to_string();
    }
    let mut out = String::new();
    for c in circuits {
        let scope = if c.document_type_id.is_some() { "type" } else { "any" };
        let _ = writeln!(out, "{:<8} {:<24} [{}]", c.circuit_key, c.title, scope);
    }
    out
}

// ─── wizard driver ───────────────────────────────────────────────────────────

/// Walk `wizard` from its current step to Review, entering `answers` on
/// each applicable step, then submit.
///
/// Resolutions are awaited after every step's updates, so each step sees
/// the option sets its own answers made it load.
pub async fn run_wizard(
    wizard: &mut WizardController,
    answers: &Answers,
) -> Result<CreatedDocument> {
    wizard.resolve_pending().await;

    while wizard.current_step() != StepId::Review {
        let step = wizard.current_step();
        if wizard.is_step_applicable(step) {
            enter_answers(wizard, step, answers)
                .await
                .with_context(|| format!("Step {step}"))?;
            wizard.resolve_pending().await;
        }

        wizard
            .advance()
            .with_context(|| format!("Cannot leave step {step}"))?;
        report_notices(wizard, step);
    }

    let document = wizard
        .submit()
        .await
        .context("Failed to create document")?;
    info!(document_id = document.id, title = %document.title, "document created");
    Ok(document)
}

fn report_notices(
    wizard: &WizardController,
    step: StepId,
) {
    for notice in wizard.notices(step) {
        match notice.level {
            NoticeLevel::Info => info!(%step, "{}", notice.message),
            NoticeLevel::Warning => warn!(%step, "{}", notice.message),
        }
    }
}

fn set(
    wizard: &mut WizardController,
    update: FieldUpdate,
) -> Result<()> {
    wizard.update_field(update)?;
    Ok(())
}

fn set_text(
    wizard: &mut WizardController,
    value: &Option<String>,
    update: fn(String) -> FieldUpdate,
) -> Result<()> {
    match value {
        Some(value) => set(wizard, update(value.clone())),
        None => Ok(()),
    }
}

fn not_found(
    what: &str,
    key: &str,
    available: Vec<String>,
) -> anyhow::Error {
    anyhow!("Unknown {what} '{key}'; available: {}", available.join(", "))
}

async fn enter_answers(
    wizard: &mut WizardController,
    step: StepId,
    answers: &Answers,
) -> Result<()> {
    match step {
        StepId::ResponsibilityCentre => {
            if let Some(code) = &answers.responsibility_centre {
                let centre = wizard
                    .centres()
                    .find(|c| &c.code == code)
                    .map(|c| c.id)
                    .ok_or_else(|| {
                        not_found("centre", code, option_keys(wizard.centres().items(), |c| c.code.clone()))
                    })?;
                set(wizard, FieldUpdate::ResponsibilityCentre(Some(centre)))?;
            }
        }
        StepId::Date => {
            set_text(wizard, &answers.doc_date, FieldUpdate::DocDate)?;
            set_text(wizard, &answers.comptable_date, FieldUpdate::ComptableDate)?;
        }
        StepId::TypeSubtype => {
            if let Some(key) = &answers.document_type {
                let type_id = wizard
                    .document_types()
                    .find(|t| &t.type_key == key)
                    .map(|t| t.id)
                    .ok_or_else(|| {
                        not_found(
                            "document type",
                            key,
                            option_keys(wizard.document_types().items(), |t| t.type_key.clone()),
                        )
                    })?;
                set(wizard, FieldUpdate::DocumentType(Some(type_id)))?;
                wizard.resolve_pending().await;
            }
            if let Some(key) = &answers.sub_type {
                let sub_type_id = wizard
                    .sub_types()
                    .find(|s| &s.sub_type_key == key)
                    .map(|s| s.id)
                    .ok_or_else(|| {
                        not_found(
                            "subtype",
                            key,
                            option_keys(wizard.sub_types().items(), |s| s.sub_type_key.clone()),
                        )
                    })?;
                set(wizard, FieldUpdate::SubType(Some(sub_type_id)))?;
            }
        }
        StepId::CustomerVendor => {
            let tier = wizard
                .selected_document_type()
                .map(|t| t.tier_type)
                .unwrap_or_default();
            if let Some(code) = &answers.customer_vendor {
                let entity = wizard
                    .customer_vendors()
                    .find(|e| e.code_for(tier) == Some(code.as_str()))
                    .cloned()
                    .ok_or_else(|| {
                        not_found(
                            &tier.as_str().to_ascii_lowercase(),
                            code,
                            option_keys(wizard.customer_vendors().items(), |e| {
                                e.code_for(tier).unwrap_or_default().to_string()
                            }),
                        )
                    })?;
                set(wizard, FieldUpdate::CustomerVendor(Some(entity)))?;
            }
            set_text(wizard, &answers.customer_vendor_name, FieldUpdate::CustomerVendorName)?;
            set_text(wizard, &answers.customer_vendor_address, FieldUpdate::CustomerVendorAddress)?;
            set_text(wizard, &answers.customer_vendor_city, FieldUpdate::CustomerVendorCity)?;
            set_text(wizard, &answers.customer_vendor_country, FieldUpdate::CustomerVendorCountry)?;
        }
        StepId::Content => {
            set_text(wizard, &answers.title, FieldUpdate::Title)?;
            set_text(wizard, &answers.content, FieldUpdate::Content)?;
            set_text(wizard, &answers.document_alias, FieldUpdate::DocumentAlias)?;
            if let Some(reference) = &answers.external_reference {
                set(wizard, FieldUpdate::IsExternal(true))?;
                set(wizard, FieldUpdate::ExternalReference(reference.clone()))?;
            }
        }
        StepId::Circuit => {
            if let Some(key) = &answers.circuit {
                let circuit_id = wizard
                    .circuits()
                    .find(|c| &c.circuit_key == key)
                    .map(|c| c.id)
                    .ok_or_else(|| {
                        not_found(
                            "circuit",
                            key,
                            option_keys(wizard.circuits().items(), |c| c.circuit_key.clone()),
                        )
                    })?;
                set(wizard, FieldUpdate::Circuit(Some(circuit_id)))?;
            }
        }
        StepId::Review => bail!("Review takes no answers"),
    }
    Ok(())
}

fn option_keys<T>(
    items: Option<&[T]>,
    key: impl Fn(&T) -> String,
) -> Vec<String> {
    items.unwrap_or_default().iter().map(key).collect()
}
