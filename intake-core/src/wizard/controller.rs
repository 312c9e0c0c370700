//! The wizard controller.
//!
//! [`WizardController`] owns the [`FormState`] and the step pointer of one
//! session. All mutations go through it; it applies the declared
//! invalidation cascade, issues resolution requests for the option sets
//! that depend on the edited fields, gates step transitions with the
//! [`ValidationEngine`] and hands the finished form to the
//! [`RequestAssembler`].
//!
//! Resolution is split in three so the controller is never borrowed across
//! an await point:
//!
//! 1. [`WizardController::take_pending_requests`] hands out the requests
//!    issued since the last call.
//! 2. [`ResolutionRequest::run`] performs the lookup.
//! 3. [`WizardController::apply_resolution`] stores the result, unless a
//!    newer request of the same kind has been issued in the meantime.
//!
//! [`WizardController::resolve_pending`] chains the three for callers that
//! do not need to interleave anything.

use std::collections::{BTreeMap, BTreeSet};
use std::mem;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

use super::assembler::RequestAssembler;
use super::cascade::invalidation_closure;
use super::error::WizardError;
use super::form::{Field, FieldUpdate, FormState};
use super::notice::Notice;
use super::options::OptionSet;
use super::resolver::{ConstraintResolver, ResolutionSource, ServiceResolver};
use super::steps::{StepContext, StepId, definition};
use super::tracking::{
    ResolutionKey, ResolutionKind, ResolutionPayload, ResolutionRequest, ResolutionResponse,
    ResolutionTracker,
};
use super::validation::{FieldErrors, ValidationEngine};
use crate::db::{DocumentRepository, RepositoryError};
use crate::models::{
    Circuit, CreatedDocument, CustomerVendor, DocumentCreateRequest, DocumentType,
    ResponsibilityCentre, SubType, TierType, UserProfile,
};

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    /// A create call is outstanding.
    Submitting,
    /// Terminal.
    Submitted { document_id: i64 },
}

/// What an accepted field update did besides storing the value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateOutcome {
    /// Dependent fields reset by the cascade.
    pub cleared: Vec<Field>,
    /// Resolutions issued because of the change.
    pub scheduled: Vec<ResolutionKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// A newer request of the same kind superseded this one; nothing
    /// changed.
    Stale,
}

pub struct WizardController {
    profile: UserProfile,
    form: FormState,
    current: StepId,
    completed: BTreeSet<StepId>,
    errors: FieldErrors,
    notices: BTreeMap<StepId, Vec<Notice>>,

    document_types: OptionSet<DocumentType>,
    sub_types: OptionSet<SubType>,
    sub_type_source: Option<ResolutionSource>,
    circuits: OptionSet<Circuit>,
    customer_vendors: OptionSet<CustomerVendor>,
    centres: OptionSet<ResponsibilityCentre>,
    /// Tier of the type the selected customer/vendor was picked under.
    customer_vendor_tier: Option<TierType>,

    tracker: ResolutionTracker,
    pending: Vec<ResolutionRequest>,

    state: SessionState,
    session_error: Option<String>,

    resolver: Arc<dyn ConstraintResolver>,
    documents: Arc<dyn DocumentRepository>,
}

impl WizardController {
    /// Open a session for `profile`, with `today` as the default document
    /// date.
    ///
    /// Document types are requested immediately; responsibility centres too
    /// when the profile has none of its own.
    pub fn open(
        profile: UserProfile,
        resolver: Arc<dyn ConstraintResolver>,
        documents: Arc<dyn DocumentRepository>,
        today: NaiveDate,
    ) -> Self {
        let form = FormState::new(&profile, today);
        let mut controller = Self {
            profile,
            form,
            current: StepId::FIRST,
            completed: BTreeSet::new(),
            errors: FieldErrors::new(),
            notices: BTreeMap::new(),
            document_types: OptionSet::NotRequested,
            sub_types: OptionSet::NotRequested,
            sub_type_source: None,
            circuits: OptionSet::NotRequested,
            customer_vendors: OptionSet::NotRequested,
            centres: OptionSet::NotRequested,
            customer_vendor_tier: None,
            tracker: ResolutionTracker::new(),
            pending: Vec::new(),
            state: SessionState::Open,
            session_error: None,
            resolver,
            documents,
        };

        controller.schedule(ResolutionKey::DocumentTypes);
        if !controller.profile.has_assigned_centre() {
            controller.schedule(ResolutionKey::Centres);
        }

        info!(user = %controller.profile.username, %today, "document wizard opened");
        controller
    }

    /// [`WizardController::open`] dated with the local calendar day.
    pub fn open_today(
        profile: UserProfile,
        resolver: Arc<dyn ConstraintResolver>,
        documents: Arc<dyn DocumentRepository>,
    ) -> Self {
        Self::open(profile, resolver, documents, Local::now().date_naive())
    }

    /// Open a session backed entirely by `repository`, with the built-in
    /// subtype table as fallback.
    pub fn with_repository(
        profile: UserProfile,
        repository: Arc<dyn DocumentRepository>,
        today: NaiveDate,
    ) -> Self {
        let resolver = Arc::new(ServiceResolver::new(Arc::clone(&repository)));
        Self::open(profile, resolver, repository, today)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Field updates
    // ─────────────────────────────────────────────────────────────────────

    /// Store `update`, clear its error, reset every dependent field and
    /// issue the resolutions the new value calls for.
    ///
    /// # Errors
    /// * [`WizardError::Closed`] after a successful submit.
    /// * [`WizardError::SubmissionInFlight`] while a create call is
    ///   outstanding.
    /// * [`WizardError::ReadOnlyField`] when editing the centre of a user
    ///   who has one assigned.
    pub fn update_field(
        &mut self,
        update: FieldUpdate,
    ) -> Result<UpdateOutcome, WizardError> {
        self.ensure_open()?;

        let field = update.field();
        if field == Field::ResponsibilityCentre && self.profile.has_assigned_centre() {
            return Err(WizardError::ReadOnlyField(field));
        }

        self.errors.remove(field);
        if !self.form.apply(update) {
            return Ok(UpdateOutcome::default());
        }
        debug!(field = %field, "field updated");

        let mut cleared = invalidation_closure(field);
        if field == Field::DocumentType
            && self.form.selected_customer_vendor.is_some()
            && self.selected_tier() != self.customer_vendor_tier
        {
            cleared.push(Field::CustomerVendor);
        }
        for dependent in &cleared {
            self.form.clear(*dependent);
            self.errors.remove(*dependent);
            self.completed.remove(&StepId::owning(*dependent));
        }
        if !cleared.is_empty() {
            debug!(field = %field, cleared = ?cleared, "dependent fields cleared");
        }

        let mut scheduled = Vec::new();
        match field {
            Field::DocDate | Field::DocumentType => {
                self.reset_type_dependents();
                if field == Field::DocumentType {
                    scheduled = self.schedule_for_selected_type();
                }
            }
            Field::CustomerVendor => {
                self.customer_vendor_tier = self
                    .form
                    .selected_customer_vendor
                    .as_ref()
                    .and(self.selected_tier());
            }
            Field::Circuit => {
                let circuit_id = self.form.circuit_id;
                self.form.circuit_name = circuit_id
                    .and_then(|id| self.circuits.find(|c| c.id == id))
                    .map(|c| c.title.clone())
                    .unwrap_or_default();
            }
            _ => {}
        }

        Ok(UpdateOutcome { cleared, scheduled })
    }

    fn reset_type_dependents(&mut self) {
        for kind in [
            ResolutionKind::SubTypes,
            ResolutionKind::Circuits,
            ResolutionKind::CustomerVendors,
        ] {
            self.tracker.invalidate(kind);
        }
        self.pending.retain(|r| {
            !matches!(
                r.kind(),
                ResolutionKind::SubTypes | ResolutionKind::Circuits | ResolutionKind::CustomerVendors
            )
        });

        self.sub_types = OptionSet::NotRequested;
        self.sub_type_source = None;
        self.circuits = OptionSet::NotRequested;
        self.customer_vendors = OptionSet::NotRequested;
        self.notices.remove(&StepId::TypeSubtype);
        self.notices.remove(&StepId::CustomerVendor);
        self.notices.remove(&StepId::Circuit);
    }

    fn schedule_for_selected_type(&mut self) -> Vec<ResolutionKind> {
        let Some(type_id) = self.form.selected_type_id else {
            return Vec::new();
        };
        let mut scheduled = Vec::new();

        match self.form.doc_date() {
            Some(date) => {
                self.schedule(ResolutionKey::SubTypes { type_id, date });
                scheduled.push(ResolutionKind::SubTypes);
            }
            None => debug!(type_id, "document date unparseable; subtypes not requested"),
        }

        self.schedule(ResolutionKey::Circuits { type_id });
        scheduled.push(ResolutionKind::Circuits);

        if let Some(tier) = self
            .selected_document_type()
            .map(|t| t.tier_type)
            .filter(|tier| tier.requires_customer_vendor())
        {
            self.schedule(ResolutionKey::CustomerVendors { tier });
            scheduled.push(ResolutionKind::CustomerVendors);
        }

        scheduled
    }

    fn schedule_missing_customer_vendors(&mut self) {
        if !matches!(self.customer_vendors, OptionSet::NotRequested) {
            return;
        }
        if let Some(tier) = self
            .selected_document_type()
            .map(|t| t.tier_type)
            .filter(|tier| tier.requires_customer_vendor())
        {
            debug!(?tier, "customer/vendor list requested after types loaded");
            self.schedule(ResolutionKey::CustomerVendors { tier });
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Resolution
    // ─────────────────────────────────────────────────────────────────────

    fn schedule(
        &mut self,
        key: ResolutionKey,
    ) {
        let kind = key.kind();
        let ticket = self.tracker.issue(key);
        debug!(key = ?ticket.key, generation = ticket.generation, "resolution issued");

        self.pending.retain(|r| r.kind() != kind);
        self.pending.push(ResolutionRequest::new(ticket));

        match kind {
            ResolutionKind::DocumentTypes => self.document_types = OptionSet::Loading,
            ResolutionKind::SubTypes => self.sub_types = OptionSet::Loading,
            ResolutionKind::Circuits => self.circuits = OptionSet::Loading,
            ResolutionKind::CustomerVendors => self.customer_vendors = OptionSet::Loading,
            ResolutionKind::Centres => self.centres = OptionSet::Loading,
        }
    }

    /// Requests issued since the previous call, at most one per kind.
    pub fn take_pending_requests(&mut self) -> Vec<ResolutionRequest> {
        mem::take(&mut self.pending)
    }

    pub fn has_pending_requests(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Store a completed resolution if its request is still the latest of
    /// its kind.
    pub fn apply_resolution(
        &mut self,
        response: ResolutionResponse,
    ) -> ApplyOutcome {
        if !self.tracker.settle(&response.ticket) {
            debug!(
                key = ?response.ticket.key,
                generation = response.ticket.generation,
                "dropping stale resolution"
            );
            return ApplyOutcome::Stale;
        }

        let kind = response.ticket.key.kind();
        let payload = match response.result {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = ?response.ticket.key, error = %e, "resolution failed");
                let message = e.to_string();
                match kind {
                    ResolutionKind::DocumentTypes => self.document_types = OptionSet::Failed(message),
                    ResolutionKind::SubTypes => self.sub_types = OptionSet::Failed(message),
                    ResolutionKind::Circuits => self.circuits = OptionSet::Failed(message),
                    ResolutionKind::CustomerVendors => {
                        self.customer_vendors = OptionSet::Failed(message)
                    }
                    ResolutionKind::Centres => self.centres = OptionSet::Failed(message),
                }
                return ApplyOutcome::Applied;
            }
        };

        match payload {
            ResolutionPayload::DocumentTypes(types) => {
                debug!(count = types.len(), "document types loaded");
                self.document_types = OptionSet::Ready(types);
                // A type picked before the list arrived has no tier yet.
                self.schedule_missing_customer_vendors();
            }
            ResolutionPayload::SubTypes(resolution) => {
                let mut notices = Vec::new();
                if resolution.source == ResolutionSource::Fallback {
                    notices.push(Notice::warning(
                        "The series service is unavailable; showing built-in subtypes",
                    ));
                }

                if let Some(only) = resolution.auto_selection() {
                    info!(sub_type_id = only.id, type_id = resolution.type_id, "subtype selected automatically");
                    self.form.selected_sub_type_id = Some(only.id);
                    self.errors.remove(Field::SubType);
                    notices.push(Notice::info(format!(
                        "Subtype \"{}\" is the only one valid on {} and was selected",
                        only.name, resolution.date
                    )));
                } else if resolution.sub_types.is_empty() {
                    self.form.selected_sub_type_id = None;
                    notices.push(Notice::warning(format!(
                        "No subtype is valid on {}; change the type or the date",
                        resolution.date
                    )));
                } else if let Some(selected) = self.form.selected_sub_type_id
                    && !resolution.sub_types.iter().any(|s| s.id == selected)
                {
                    self.form.selected_sub_type_id = None;
                }

                self.notices.insert(StepId::TypeSubtype, notices);
                self.sub_type_source = Some(resolution.source);
                self.sub_types = OptionSet::Ready(resolution.sub_types);
            }
            ResolutionPayload::Circuits(circuits) => {
                if circuits.is_empty() {
                    self.notices.insert(
                        StepId::Circuit,
                        vec![Notice::warning(
                            "No circuit is available for this type; the document will be static",
                        )],
                    );
                } else {
                    self.notices.remove(&StepId::Circuit);
                }
                self.circuits = OptionSet::Ready(circuits);
            }
            ResolutionPayload::CustomerVendors(entities) => {
                self.customer_vendors = OptionSet::Ready(entities);
            }
            ResolutionPayload::Centres(centres) => {
                self.centres = OptionSet::Ready(centres);
            }
        }

        ApplyOutcome::Applied
    }

    /// Run every pending request against the session's resolver, in issue
    /// order, until none remain.
    pub async fn resolve_pending(&mut self) {
        let resolver = Arc::clone(&self.resolver);
        loop {
            let requests = self.take_pending_requests();
            if requests.is_empty() {
                break;
            }
            for request in requests {
                let response = request.run(resolver.as_ref()).await;
                self.apply_resolution(response);
            }
        }
    }

    /// Re-issue the failed resolutions owned by `step`.
    ///
    /// # Errors
    /// [`WizardError::Closed`] or [`WizardError::SubmissionInFlight`].
    pub fn retry_resolution(
        &mut self,
        step: StepId,
    ) -> Result<Vec<ResolutionKind>, WizardError> {
        self.ensure_open()?;

        let mut keys = Vec::new();
        match step {
            StepId::ResponsibilityCentre => {
                if self.centres.failure().is_some() {
                    keys.push(ResolutionKey::Centres);
                }
            }
            StepId::TypeSubtype => {
                if self.document_types.failure().is_some() {
                    keys.push(ResolutionKey::DocumentTypes);
                }
                if self.sub_types.failure().is_some()
                    && let (Some(type_id), Some(date)) = (self.form.selected_type_id, self.form.doc_date())
                {
                    keys.push(ResolutionKey::SubTypes { type_id, date });
                }
            }
            StepId::CustomerVendor => {
                let retryable = matches!(
                    self.customer_vendors,
                    OptionSet::Failed(_) | OptionSet::NotRequested
                );
                if retryable
                    && let Some(tier) = self
                        .selected_document_type()
                        .map(|t| t.tier_type)
                        .filter(|tier| tier.requires_customer_vendor())
                {
                    keys.push(ResolutionKey::CustomerVendors { tier });
                }
            }
            StepId::Circuit => {
                if self.circuits.failure().is_some()
                    && let Some(type_id) = self.form.selected_type_id
                {
                    keys.push(ResolutionKey::Circuits { type_id });
                }
            }
            StepId::Date | StepId::Content | StepId::Review => {}
        }

        let kinds = keys.iter().map(ResolutionKey::kind).collect();
        for key in keys {
            self.schedule(key);
        }
        Ok(kinds)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Navigation
    // ─────────────────────────────────────────────────────────────────────

    /// Validate the current step and move to the next one.
    ///
    /// # Errors
    /// * [`WizardError::ResolutionPending`] while the step's options are
    ///   loading.
    /// * [`WizardError::ResolutionFailed`] when they could not be loaded.
    /// * [`WizardError::Validation`] with the step's field errors.
    pub fn advance(&mut self) -> Result<StepId, WizardError> {
        self.ensure_open()?;
        let step = self.current;

        if self.is_loading(step) {
            return Err(WizardError::ResolutionPending(step));
        }
        if let Some(message) = self.blocking_failure(step) {
            return Err(WizardError::ResolutionFailed { step, message });
        }

        let report = ValidationEngine::validate_step(step, &self.step_context());

        let notices = self.notices.entry(step).or_default();
        for notice in report.notices {
            if !notices.contains(&notice) {
                notices.push(notice);
            }
        }

        if !report.errors.is_empty() {
            for (field, message) in report.errors.iter() {
                self.errors.insert(field, message);
            }
            return Err(WizardError::Validation {
                step,
                errors: report.errors,
            });
        }

        if let Some(title) = report.derived_title {
            debug!(title = %title, "title derived from content");
            self.form.title = title;
        }

        self.completed.insert(step);
        self.current = step.next();
        debug!(from = %step, to = %self.current, "advanced");
        Ok(self.current)
    }

    /// Move back one step without validating.
    ///
    /// # Errors
    /// [`WizardError::Closed`] or [`WizardError::SubmissionInFlight`].
    pub fn retreat(&mut self) -> Result<StepId, WizardError> {
        self.ensure_open()?;
        self.current = self.current.prev();
        Ok(self.current)
    }

    /// Return from Review to an already completed step.
    ///
    /// # Errors
    /// * [`WizardError::NotOnReview`] unless on the Review step.
    /// * [`WizardError::JumpNotAllowed`] for a step not yet completed.
    pub fn jump_to(
        &mut self,
        step: StepId,
    ) -> Result<StepId, WizardError> {
        self.ensure_open()?;
        if self.current != StepId::Review {
            return Err(WizardError::NotOnReview);
        }
        if step != StepId::Review && !self.completed.contains(&step) {
            return Err(WizardError::JumpNotAllowed {
                from: self.current,
                to: step,
            });
        }
        self.current = step;
        Ok(step)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Submission
    // ─────────────────────────────────────────────────────────────────────

    /// Validate every step, assemble the creation command and mark the
    /// session as submitting.
    ///
    /// # Errors
    /// * [`WizardError::NotOnReview`] unless on the Review step.
    /// * [`WizardError::SubmissionInFlight`] while a previous submission is
    ///   outstanding.
    /// * [`WizardError::Validation`] naming the first failing step.
    /// * [`WizardError::Assembly`] if the form cannot be assembled.
    pub fn begin_submit(&mut self) -> Result<DocumentCreateRequest, WizardError> {
        self.ensure_open()?;
        if self.current != StepId::Review {
            return Err(WizardError::NotOnReview);
        }

        if let Err((step, errors)) = ValidationEngine::validate_all(&self.step_context()) {
            warn!(step = %step, errors = %errors, "submission blocked by validation");
            for (field, message) in errors.iter() {
                self.errors.insert(field, message);
            }
            return Err(WizardError::Validation { step, errors });
        }

        let request = RequestAssembler::assemble(&self.form, self.selected_document_type())?;

        self.state = SessionState::Submitting;
        self.session_error = None;
        info!(type_id = request.type_id, sub_type_id = request.sub_type_id, "submitting document");
        Ok(request)
    }

    /// Record the outcome of the create call started by
    /// [`WizardController::begin_submit`].
    ///
    /// On success the session closes and the form is cleared. On failure
    /// the session stays open on Review with the form intact.
    ///
    /// # Errors
    /// * [`WizardError::NoSubmissionInFlight`] without a matching
    ///   `begin_submit`.
    /// * [`WizardError::Submission`] carrying the service error.
    pub fn finish_submit(
        &mut self,
        result: Result<CreatedDocument, RepositoryError>,
    ) -> Result<CreatedDocument, WizardError> {
        match self.state {
            SessionState::Submitting => {}
            SessionState::Submitted { .. } => return Err(WizardError::Closed),
            SessionState::Open => return Err(WizardError::NoSubmissionInFlight),
        }

        match result {
            Ok(document) => {
                info!(document_id = document.id, "document created");
                self.state = SessionState::Submitted {
                    document_id: document.id,
                };
                self.form = FormState::default();
                self.customer_vendor_tier = None;
                self.errors.clear();
                self.notices.clear();
                self.pending.clear();
                self.tracker.clear();
                Ok(document)
            }
            Err(e) => {
                warn!(error = %e, "document creation failed");
                let message = e.to_string();
                self.state = SessionState::Open;
                self.session_error = Some(message.clone());
                Err(WizardError::Submission(message))
            }
        }
    }

    /// [`begin_submit`](Self::begin_submit), the create call, then
    /// [`finish_submit`](Self::finish_submit).
    ///
    /// # Errors
    /// Anything either half returns.
    pub async fn submit(&mut self) -> Result<CreatedDocument, WizardError> {
        let request = self.begin_submit()?;
        let documents = Arc::clone(&self.documents);
        let result = documents.create_document(&request).await;
        self.finish_submit(result)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn current_step(&self) -> StepId {
        self.current
    }

    pub fn is_completed(
        &self,
        step: StepId,
    ) -> bool {
        self.completed.contains(&step)
    }

    pub fn completed_steps(&self) -> impl Iterator<Item = StepId> + '_ {
        self.completed.iter().copied()
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn notices(
        &self,
        step: StepId,
    ) -> &[Notice] {
        self.notices.get(&step).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Error from the last failed create call, cleared by the next
    /// submission attempt.
    pub fn session_error(&self) -> Option<&str> {
        self.session_error.as_deref()
    }

    pub fn document_types(&self) -> &OptionSet<DocumentType> {
        &self.document_types
    }

    pub fn sub_types(&self) -> &OptionSet<SubType> {
        &self.sub_types
    }

    pub fn sub_type_source(&self) -> Option<ResolutionSource> {
        self.sub_type_source
    }

    pub fn circuits(&self) -> &OptionSet<Circuit> {
        &self.circuits
    }

    pub fn customer_vendors(&self) -> &OptionSet<CustomerVendor> {
        &self.customer_vendors
    }

    pub fn centres(&self) -> &OptionSet<ResponsibilityCentre> {
        &self.centres
    }

    pub fn selected_document_type(&self) -> Option<&DocumentType> {
        let type_id = self.form.selected_type_id?;
        self.document_types.find(|t| t.id == type_id)
    }

    fn selected_tier(&self) -> Option<TierType> {
        self.selected_document_type().map(|t| t.tier_type)
    }

    /// True while a resolution owned by `step` is in flight.
    pub fn is_loading(
        &self,
        step: StepId,
    ) -> bool {
        match step {
            StepId::ResponsibilityCentre => self.centres.is_loading(),
            StepId::TypeSubtype => self.document_types.is_loading() || self.sub_types.is_loading(),
            StepId::CustomerVendor => self.customer_vendors.is_loading(),
            StepId::Circuit => self.circuits.is_loading(),
            StepId::Date | StepId::Content | StepId::Review => false,
        }
    }

    pub fn is_step_applicable(
        &self,
        step: StepId,
    ) -> bool {
        (definition(step).is_applicable)(&self.step_context())
    }

    pub fn step_context(&self) -> StepContext<'_> {
        StepContext {
            form: &self.form,
            profile: &self.profile,
            document_type: self.selected_document_type(),
            document_types: self.document_types.items(),
            sub_types: self.sub_types.items(),
            circuits: self.circuits.items(),
            centres: self.centres.items(),
        }
    }

    fn blocking_failure(
        &self,
        step: StepId,
    ) -> Option<String> {
        let failure = match step {
            StepId::ResponsibilityCentre if self.is_step_applicable(step) => self.centres.failure(),
            StepId::TypeSubtype => self
                .document_types
                .failure()
                .or_else(|| self.sub_types.failure()),
            StepId::CustomerVendor if self.is_step_applicable(step) => self.customer_vendors.failure(),
            StepId::Circuit => self.circuits.failure(),
            _ => None,
        };
        failure.map(str::to_string)
    }

    fn ensure_open(&self) -> Result<(), WizardError> {
        match self.state {
            SessionState::Open => Ok(()),
            SessionState::Submitting => Err(WizardError::SubmissionInFlight),
            SessionState::Submitted { .. } => Err(WizardError::Closed),
        }
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::db::repository::MockDocumentRepository;
    use crate::wizard::resolver::{MockConstraintResolver, ResolutionError, SubtypeResolution};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn invoice() -> DocumentType {
        DocumentType {
            id: 1,
            type_name: "Invoice".to_string(),
            type_key: "INV".to_string(),
            tier_type: TierType::None,
        }
    }

    fn sub_type(id: i64) -> SubType {
        SubType {
            id,
            document_type_id: 1,
            sub_type_key: format!("ST{id}"),
            name: format!("Series {id}"),
            start_date: date(2024, 1, 1),
            end_date: date(2024, 12, 31),
            is_active: true,
        }
    }

    fn resolver_with(sub_types: Vec<SubType>) -> MockConstraintResolver {
        let mut resolver = MockConstraintResolver::new();
        resolver
            .expect_document_types()
            .returning(|| Ok(vec![invoice()]));
        resolver.expect_resolve_subtypes().returning(move |type_id, date| {
            Ok(SubtypeResolution {
                type_id,
                date,
                sub_types: sub_types.clone(),
                source: ResolutionSource::Live,
            })
        });
        resolver.expect_resolve_circuits().returning(|_| Ok(Vec::new()));
        resolver
    }

    fn controller(resolver: MockConstraintResolver) -> WizardController {
        WizardController::open(
            UserProfile::new("alice").with_centre(1),
            Arc::new(resolver),
            Arc::new(MockDocumentRepository::new()),
            date(2024, 3, 15),
        )
    }

    #[test]
    fn open_requests_types_and_only_needed_centres() {
        let mut with_centre = controller(MockConstraintResolver::new());
        let kinds: Vec<_> = with_centre.take_pending_requests().iter().map(|r| r.kind()).collect();
        assert_eq!(kinds, vec![ResolutionKind::DocumentTypes]);

        let mut without = WizardController::open(
            UserProfile::new("bob"),
            Arc::new(MockConstraintResolver::new()),
            Arc::new(MockDocumentRepository::new()),
            date(2024, 3, 15),
        );
        let kinds: Vec<_> = without.take_pending_requests().iter().map(|r| r.kind()).collect();
        assert_eq!(kinds, vec![ResolutionKind::DocumentTypes, ResolutionKind::Centres]);
        assert!(without.is_loading(StepId::ResponsibilityCentre));
    }

    #[test]
    fn profile_centre_is_read_only() {
        let mut wizard = controller(MockConstraintResolver::new());
        let result = wizard.update_field(FieldUpdate::ResponsibilityCentre(Some(9)));
        assert!(matches!(result, Err(WizardError::ReadOnlyField(Field::ResponsibilityCentre))));
    }

    #[tokio::test]
    async fn type_change_clears_subtype_and_schedules() {
        let mut wizard = controller(resolver_with(vec![sub_type(10), sub_type(11)]));
        wizard.resolve_pending().await;

        let outcome = wizard.update_field(FieldUpdate::DocumentType(Some(1))).unwrap();

        assert_eq!(outcome.cleared, vec![Field::SubType, Field::Circuit]);
        assert_eq!(
            outcome.scheduled,
            vec![ResolutionKind::SubTypes, ResolutionKind::Circuits]
        );
        assert!(wizard.is_loading(StepId::TypeSubtype));
    }

    #[tokio::test]
    async fn unchanged_value_does_nothing() {
        let mut wizard = controller(resolver_with(vec![sub_type(10)]));
        wizard.resolve_pending().await;
        wizard.update_field(FieldUpdate::DocumentType(Some(1))).unwrap();
        wizard.resolve_pending().await;

        let outcome = wizard.update_field(FieldUpdate::DocumentType(Some(1))).unwrap();

        assert_eq!(outcome, UpdateOutcome::default());
        assert_eq!(wizard.form().selected_sub_type_id, Some(10));
    }

    #[tokio::test]
    async fn single_subtype_is_auto_selected_with_notice() {
        let mut wizard = controller(resolver_with(vec![sub_type(10)]));
        wizard.resolve_pending().await;
        wizard.update_field(FieldUpdate::DocumentType(Some(1))).unwrap();
        wizard.resolve_pending().await;

        assert_eq!(wizard.form().selected_sub_type_id, Some(10));
        let notices = wizard.notices(StepId::TypeSubtype);
        assert_eq!(notices.len(), 1);
        assert!(!notices[0].is_warning());
    }

    #[tokio::test]
    async fn advance_is_blocked_while_loading() {
        let mut wizard = controller(resolver_with(vec![sub_type(10)]));
        wizard.resolve_pending().await;
        wizard.advance().unwrap();
        wizard.advance().unwrap();
        wizard.update_field(FieldUpdate::DocumentType(Some(1))).unwrap();

        assert!(matches!(
            wizard.advance(),
            Err(WizardError::ResolutionPending(StepId::TypeSubtype))
        ));
    }

    #[tokio::test]
    async fn stale_response_is_dropped() {
        let mut wizard = controller(resolver_with(vec![sub_type(10)]));
        wizard.resolve_pending().await;

        wizard.update_field(FieldUpdate::DocumentType(Some(1))).unwrap();
        let first = wizard.take_pending_requests();
        wizard.update_field(FieldUpdate::DocumentType(Some(2))).unwrap();
        let second = wizard.take_pending_requests();

        let resolver = resolver_with(vec![sub_type(10)]);
        for request in second {
            let response = request.run(&resolver).await;
            assert_eq!(wizard.apply_resolution(response), ApplyOutcome::Applied);
        }
        for request in first {
            let response = request.run(&resolver).await;
            assert_eq!(wizard.apply_resolution(response), ApplyOutcome::Stale);
        }
    }

    #[tokio::test]
    async fn failed_circuits_block_circuit_step_until_retried() {
        let mut resolver = MockConstraintResolver::new();
        resolver.expect_document_types().returning(|| Ok(vec![invoice()]));
        resolver.expect_resolve_subtypes().returning(|type_id, date| {
            Ok(SubtypeResolution {
                type_id,
                date,
                sub_types: vec![sub_type(10)],
                source: ResolutionSource::Live,
            })
        });
        let mut calls = 0;
        resolver.expect_resolve_circuits().with(eq(1)).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Err(ResolutionError::Unavailable("circuits"))
            } else {
                Ok(Vec::new())
            }
        });
        let mut wizard = controller(resolver);
        wizard.resolve_pending().await;
        wizard.update_field(FieldUpdate::DocumentType(Some(1))).unwrap();
        wizard.update_field(FieldUpdate::Content("body".to_string())).unwrap();
        wizard.resolve_pending().await;
        for _ in 0..5 {
            wizard.advance().unwrap();
        }
        assert_eq!(wizard.current_step(), StepId::Circuit);

        assert!(matches!(
            wizard.advance(),
            Err(WizardError::ResolutionFailed { step: StepId::Circuit, .. })
        ));

        assert_eq!(
            wizard.retry_resolution(StepId::Circuit).unwrap(),
            vec![ResolutionKind::Circuits]
        );
        wizard.resolve_pending().await;
        assert_eq!(wizard.advance().unwrap(), StepId::Review);
        assert!(wizard.notices(StepId::Circuit)[0].is_warning());
    }

    fn typed(
        id: i64,
        tier_type: TierType,
    ) -> DocumentType {
        DocumentType {
            id,
            type_name: format!("Type {id}"),
            type_key: format!("T{id}"),
            tier_type,
        }
    }

    fn tiered_resolver(types: Vec<DocumentType>) -> MockConstraintResolver {
        let mut resolver = MockConstraintResolver::new();
        resolver
            .expect_document_types()
            .returning(move || Ok(types.clone()));
        resolver.expect_resolve_subtypes().returning(|type_id, date| {
            Ok(SubtypeResolution {
                type_id,
                date,
                sub_types: Vec::new(),
                source: ResolutionSource::Live,
            })
        });
        resolver.expect_resolve_circuits().returning(|_| Ok(Vec::new()));
        resolver.expect_resolve_customer_vendors().returning(|tier| {
            Ok(vec![match tier {
                TierType::Vendor => CustomerVendor::vendor("V001", "Acme"),
                _ => CustomerVendor::customer("C001", "Globex"),
            }])
        });
        resolver
    }

    #[tokio::test]
    async fn type_picked_before_types_load_still_gets_customers() {
        let mut wizard = controller(tiered_resolver(vec![typed(1, TierType::Customer)]));

        let outcome = wizard.update_field(FieldUpdate::DocumentType(Some(1))).unwrap();
        assert_eq!(
            outcome.scheduled,
            vec![ResolutionKind::SubTypes, ResolutionKind::Circuits]
        );

        wizard.resolve_pending().await;

        let codes: Vec<_> = wizard
            .customer_vendors()
            .items()
            .expect("customers resolved")
            .iter()
            .map(|c| c.code.clone())
            .collect();
        assert_eq!(codes, vec![Some("C001".to_string())]);
    }

    #[tokio::test]
    async fn unrequested_customer_list_can_be_retried() {
        let mut wizard = controller(tiered_resolver(vec![typed(1, TierType::Vendor)]));
        wizard.resolve_pending().await;
        wizard.update_field(FieldUpdate::DocumentType(Some(1))).unwrap();
        wizard.resolve_pending().await;
        wizard.customer_vendors = OptionSet::NotRequested;

        assert_eq!(
            wizard.retry_resolution(StepId::CustomerVendor).unwrap(),
            vec![ResolutionKind::CustomerVendors]
        );
        wizard.resolve_pending().await;
        assert!(wizard.customer_vendors().items().is_some());
    }

    #[tokio::test]
    async fn tier_change_clears_selected_entity() {
        let mut wizard = controller(tiered_resolver(vec![
            typed(1, TierType::Customer),
            typed(2, TierType::Vendor),
            typed(3, TierType::Customer),
        ]));
        wizard.resolve_pending().await;
        wizard.update_field(FieldUpdate::DocumentType(Some(1))).unwrap();
        wizard.resolve_pending().await;

        let mut both = CustomerVendor::customer("C001", "Globex");
        both.vendor_code = Some("V009".to_string());
        wizard.update_field(FieldUpdate::CustomerVendor(Some(both))).unwrap();
        wizard
            .update_field(FieldUpdate::CustomerVendorName("Globex Europe".to_string()))
            .unwrap();

        let same_tier = wizard.update_field(FieldUpdate::DocumentType(Some(3))).unwrap();
        assert!(!same_tier.cleared.contains(&Field::CustomerVendor));
        assert_eq!(wizard.form().customer_vendor_name, "Globex Europe");

        let vendor = wizard.update_field(FieldUpdate::DocumentType(Some(2))).unwrap();
        assert_eq!(
            vendor.cleared,
            vec![Field::SubType, Field::Circuit, Field::CustomerVendor]
        );
        assert_eq!(wizard.form().selected_customer_vendor, None);
        assert_eq!(wizard.form().customer_vendor_name, "");
    }

    #[test]
    fn jump_only_from_review() {
        let mut wizard = controller(MockConstraintResolver::new());
        assert!(matches!(wizard.jump_to(StepId::Date), Err(WizardError::NotOnReview)));
    }

    #[test]
    fn finish_without_begin_is_rejected() {
        let mut wizard = controller(MockConstraintResolver::new());
        let result = wizard.finish_submit(Err(RepositoryError::NotFound));
        assert!(matches!(result, Err(WizardError::NoSubmissionInFlight)));
    }
}
