//! End-to-end wizard scenarios against an in-memory document service.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use intake_core::db::{DocumentRepository, RepositoryError};
use intake_core::models::{
    Circuit, CreatedDocument, CustomerVendor, DocumentCreateRequest, DocumentType, NewSubType,
    ResponsibilityCentre, SubType, TierType, UserProfile,
};
use intake_core::wizard::{
    ApplyOutcome, Field, FieldUpdate, OptionSet, ResolutionSource, ServiceResolver, SessionState,
    StepId, WizardController, WizardError,
};
use pretty_assertions::assert_eq;

// ── in-memory service ───────────────────────────────────────────────────────

#[derive(Default)]
struct InMemoryRepository {
    types: Vec<DocumentType>,
    sub_types: Vec<SubType>,
    circuits: Vec<Circuit>,
    customers: Vec<CustomerVendor>,
    vendors: Vec<CustomerVendor>,
    centres: Vec<ResponsibilityCentre>,
    series_down: AtomicBool,
    reject_next_create: AtomicBool,
    created: Mutex<Vec<DocumentCreateRequest>>,
}

#[async_trait]
impl DocumentRepository for InMemoryRepository {
    async fn list_document_types(&self) -> Result<Vec<DocumentType>, RepositoryError> {
        Ok(self.types.clone())
    }

    async fn get_document_type(&self, id: i64) -> Result<DocumentType, RepositoryError> {
        self.types
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_document_type_by_key(&self, key: &str) -> Result<DocumentType, RepositoryError> {
        self.types
            .iter()
            .find(|t| t.type_key == key)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    // Returns every subtype of the type regardless of date or status; the
    // wizard is expected to filter.
    async fn list_sub_types(
        &self,
        type_id: i64,
        _date: NaiveDate,
    ) -> Result<Vec<SubType>, RepositoryError> {
        if self.series_down.load(Ordering::SeqCst) {
            return Err(RepositoryError::Transport("series service timed out".to_string()));
        }
        Ok(self
            .sub_types
            .iter()
            .filter(|s| s.document_type_id == type_id)
            .cloned()
            .collect())
    }

    async fn delete_sub_types(&self, _type_id: i64) -> Result<u64, RepositoryError> {
        Ok(0)
    }

    async fn insert_sub_type(&self, _sub_type: &NewSubType) -> Result<i64, RepositoryError> {
        Ok(0)
    }

    async fn list_circuits(&self) -> Result<Vec<Circuit>, RepositoryError> {
        Ok(self.circuits.clone())
    }

    async fn list_customers(&self) -> Result<Vec<CustomerVendor>, RepositoryError> {
        Ok(self.customers.clone())
    }

    async fn list_vendors(&self) -> Result<Vec<CustomerVendor>, RepositoryError> {
        Ok(self.vendors.clone())
    }

    async fn list_responsibility_centres(
        &self,
    ) -> Result<Vec<ResponsibilityCentre>, RepositoryError> {
        Ok(self.centres.clone())
    }

    async fn create_document(
        &self,
        request: &DocumentCreateRequest,
    ) -> Result<CreatedDocument, RepositoryError> {
        if self.reject_next_create.swap(false, Ordering::SeqCst) {
            return Err(RepositoryError::Transport("document service unavailable".to_string()));
        }
        let mut created = self.created.lock().expect("lock poisoned");
        created.push(request.clone());
        Ok(CreatedDocument {
            id: 100 + created.len() as i64,
            title: request.title.clone(),
            circuit_id: request.circuit_id,
        })
    }
}

// ── fixtures ────────────────────────────────────────────────────────────────

const INVOICE: i64 = 1;
const PURCHASE_ORDER: i64 = 2;
const MEMO: i64 = 3;
const ARCHIVE: i64 = 4;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn doc_type(id: i64, name: &str, key: &str, tier_type: TierType) -> DocumentType {
    DocumentType {
        id,
        type_name: name.to_string(),
        type_key: key.to_string(),
        tier_type,
    }
}

fn sub_type(
    id: i64,
    type_id: i64,
    name: &str,
    start: NaiveDate,
    end: NaiveDate,
    is_active: bool,
) -> SubType {
    SubType {
        id,
        document_type_id: type_id,
        sub_type_key: format!("ST-{id}"),
        name: name.to_string(),
        start_date: start,
        end_date: end,
        is_active,
    }
}

fn circuit(id: i64, title: &str, is_active: bool, document_type_id: Option<i64>) -> Circuit {
    Circuit {
        id,
        title: title.to_string(),
        circuit_key: format!("CIR-{id}"),
        descriptif: String::new(),
        is_active,
        document_type_id,
    }
}

fn repository() -> InMemoryRepository {
    let mut globex = CustomerVendor::customer("C001", "Globex");
    globex.vendor_code = Some("V-GLOBEX".to_string());
    globex.address = "1 Main St".to_string();
    globex.city = "Springfield".to_string();
    globex.country = "US".to_string();

    InMemoryRepository {
        types: vec![
            doc_type(INVOICE, "Invoice", "INV", TierType::Customer),
            doc_type(PURCHASE_ORDER, "Purchase order", "PO", TierType::Vendor),
            doc_type(MEMO, "Memo", "MEMO", TierType::None),
            doc_type(ARCHIVE, "Archive", "ARC", TierType::None),
        ],
        sub_types: vec![
            sub_type(10, INVOICE, "Invoices 2024", date(2024, 1, 1), date(2024, 12, 31), true),
            sub_type(11, INVOICE, "Invoices 2024 (old)", date(2024, 1, 1), date(2024, 12, 31), false),
            sub_type(12, INVOICE, "Invoices H2", date(2024, 6, 1), date(2024, 12, 31), true),
            sub_type(20, PURCHASE_ORDER, "Orders 2024", date(2024, 1, 1), date(2024, 12, 31), true),
            sub_type(30, MEMO, "Memos", date(2000, 1, 1), date(2099, 12, 31), true),
        ],
        circuits: vec![
            circuit(1, "Finance approval", true, Some(INVOICE)),
            circuit(2, "General approval", true, None),
            circuit(3, "Purchasing approval", true, Some(PURCHASE_ORDER)),
            circuit(4, "Retired approval", false, None),
        ],
        customers: vec![globex],
        vendors: vec![CustomerVendor::vendor("V001", "Initech")],
        centres: vec![
            ResponsibilityCentre {
                id: 1,
                code: "RC-FIN".to_string(),
                descr: "Finance".to_string(),
            },
            ResponsibilityCentre {
                id: 2,
                code: "RC-OPS".to_string(),
                descr: "Operations".to_string(),
            },
        ],
        ..Default::default()
    }
}

fn alice() -> UserProfile {
    UserProfile::new("alice").with_centre(1)
}

async fn open(
    repo: &Arc<InMemoryRepository>,
    profile: UserProfile,
) -> WizardController {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let mut wizard = WizardController::with_repository(profile, repo.clone(), date(2024, 3, 15));
    wizard.resolve_pending().await;
    wizard
}

fn advance_to(
    wizard: &mut WizardController,
    step: StepId,
) {
    while wizard.current_step() != step {
        let from = wizard.current_step();
        wizard
            .advance()
            .unwrap_or_else(|e| panic!("advance from {from} failed: {e}"));
    }
}

async fn select_type(
    wizard: &mut WizardController,
    type_id: i64,
) {
    wizard
        .update_field(FieldUpdate::DocumentType(Some(type_id)))
        .expect("type update");
    wizard.resolve_pending().await;
}

// ── type / subtype ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_single_valid_subtype_is_auto_selected() {
    let repo = Arc::new(repository());
    let mut wizard = open(&repo, alice()).await;
    advance_to(&mut wizard, StepId::TypeSubtype);

    select_type(&mut wizard, INVOICE).await;

    assert_eq!(wizard.form().selected_sub_type_id, Some(10));
    assert_eq!(wizard.sub_type_source(), Some(ResolutionSource::Live));
    let notices = wizard.notices(StepId::TypeSubtype);
    assert_eq!(notices.len(), 1);
    assert!(notices[0].message.contains("Invoices 2024"));

    assert_eq!(wizard.advance().expect("advance"), StepId::CustomerVendor);
}

#[tokio::test]
async fn test_resolved_subtypes_are_active_and_in_range() {
    let repo = Arc::new(repository());
    let mut wizard = open(&repo, alice()).await;
    wizard
        .update_field(FieldUpdate::DocDate("2024-07-10".to_string()))
        .expect("date update");
    select_type(&mut wizard, INVOICE).await;

    let sub_types = wizard.sub_types().items().expect("subtypes resolved");
    let ids: Vec<i64> = sub_types.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![10, 12]);
    for s in sub_types {
        assert!(s.is_active);
        assert!(s.start_date <= date(2024, 7, 10) && date(2024, 7, 10) <= s.end_date);
    }
    assert_eq!(wizard.form().selected_sub_type_id, None);
}

#[tokio::test]
async fn test_doc_date_change_resets_type_and_subtype() {
    let repo = Arc::new(repository());
    let mut wizard = open(&repo, alice()).await;
    select_type(&mut wizard, INVOICE).await;
    assert_eq!(wizard.form().selected_sub_type_id, Some(10));

    let outcome = wizard
        .update_field(FieldUpdate::DocDate("2024-06-01".to_string()))
        .expect("date update");

    assert!(outcome.cleared.contains(&Field::DocumentType));
    assert!(outcome.cleared.contains(&Field::SubType));
    assert_eq!(wizard.form().selected_type_id, None);
    assert_eq!(wizard.form().selected_sub_type_id, None);
    assert_eq!(wizard.sub_types(), &OptionSet::NotRequested);

    select_type(&mut wizard, INVOICE).await;
    let ids: Vec<i64> = wizard
        .sub_types()
        .items()
        .expect("subtypes resolved")
        .iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(ids, vec![10, 12]);
    assert_eq!(wizard.form().selected_sub_type_id, None);
}

#[tokio::test]
async fn test_zero_subtypes_blocks_advance() {
    let repo = Arc::new(repository());
    let mut wizard = open(&repo, alice()).await;
    advance_to(&mut wizard, StepId::TypeSubtype);

    select_type(&mut wizard, ARCHIVE).await;

    assert_eq!(wizard.form().selected_sub_type_id, None);
    assert!(wizard.notices(StepId::TypeSubtype)[0].is_warning());
    match wizard.advance() {
        Err(WizardError::Validation { step, errors }) => {
            assert_eq!(step, StepId::TypeSubtype);
            assert!(errors.contains(Field::SubType));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(wizard.current_step(), StepId::TypeSubtype);
    assert!(wizard.errors().contains(Field::SubType));
}

#[tokio::test]
async fn test_transport_error_falls_back_to_static_subtypes() {
    let repo = Arc::new(repository());
    repo.series_down.store(true, Ordering::SeqCst);
    let mut wizard = open(&repo, alice()).await;

    select_type(&mut wizard, INVOICE).await;

    assert_eq!(wizard.sub_type_source(), Some(ResolutionSource::Fallback));
    // Built-in invoice series valid on 2024-03-15.
    assert_eq!(wizard.form().selected_sub_type_id, Some(9001));
    assert!(
        wizard
            .notices(StepId::TypeSubtype)
            .iter()
            .any(|n| n.is_warning())
    );
}

#[tokio::test]
async fn test_stale_subtype_resolution_is_discarded() {
    let repo = Arc::new(repository());
    let mut wizard = open(&repo, alice()).await;
    let resolver = ServiceResolver::new(repo.clone());

    wizard
        .update_field(FieldUpdate::DocumentType(Some(INVOICE)))
        .expect("first type");
    let superseded = wizard.take_pending_requests();
    wizard
        .update_field(FieldUpdate::DocumentType(Some(MEMO)))
        .expect("second type");
    let latest = wizard.take_pending_requests();

    for request in latest {
        assert_eq!(
            wizard.apply_resolution(request.run(&resolver).await),
            ApplyOutcome::Applied
        );
    }
    for request in superseded {
        assert_eq!(
            wizard.apply_resolution(request.run(&resolver).await),
            ApplyOutcome::Stale
        );
    }

    assert_eq!(wizard.form().selected_type_id, Some(MEMO));
    assert_eq!(wizard.form().selected_sub_type_id, Some(30));
    let circuit_ids: Vec<i64> = wizard
        .circuits()
        .items()
        .expect("circuits resolved")
        .iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(circuit_ids, vec![2]);
}

// ── circuits ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_circuits_are_active_and_type_compatible() {
    let repo = Arc::new(repository());
    let mut wizard = open(&repo, alice()).await;

    for type_id in [INVOICE, PURCHASE_ORDER, MEMO] {
        select_type(&mut wizard, type_id).await;
        for c in wizard.circuits().items().expect("circuits resolved") {
            assert!(c.is_active);
            assert!(c.document_type_id.is_none_or(|t| t == type_id));
        }
    }
}

#[tokio::test]
async fn test_type_change_clears_circuit() {
    let repo = Arc::new(repository());
    let mut wizard = open(&repo, alice()).await;
    select_type(&mut wizard, INVOICE).await;
    wizard
        .update_field(FieldUpdate::Circuit(Some(1)))
        .expect("circuit");
    assert_eq!(wizard.form().circuit_name, "Finance approval");

    select_type(&mut wizard, PURCHASE_ORDER).await;

    assert_eq!(wizard.form().circuit_id, None);
    assert_eq!(wizard.form().circuit_name, "");
}

// ── customer / vendor ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_tier_none_skips_customer_vendor_checks() {
    let repo = Arc::new(repository());
    let mut wizard = open(&repo, alice()).await;
    advance_to(&mut wizard, StepId::TypeSubtype);
    select_type(&mut wizard, MEMO).await;
    advance_to(&mut wizard, StepId::CustomerVendor);

    assert!(!wizard.is_step_applicable(StepId::CustomerVendor));
    assert_eq!(wizard.customer_vendors(), &OptionSet::NotRequested);
    assert_eq!(wizard.advance().expect("pass-through"), StepId::Content);
}

#[tokio::test]
async fn test_customer_tier_requires_entity_and_name() {
    let repo = Arc::new(repository());
    let mut wizard = open(&repo, alice()).await;
    select_type(&mut wizard, INVOICE).await;
    advance_to(&mut wizard, StepId::CustomerVendor);

    assert!(matches!(
        wizard.advance(),
        Err(WizardError::Validation {
            step: StepId::CustomerVendor,
            ..
        })
    ));

    let globex = wizard
        .customer_vendors()
        .items()
        .expect("customers resolved")[0]
        .clone();
    wizard
        .update_field(FieldUpdate::CustomerVendor(Some(globex)))
        .expect("entity");
    wizard
        .update_field(FieldUpdate::CustomerVendorName("   ".to_string()))
        .expect("name");
    match wizard.advance() {
        Err(WizardError::Validation { errors, .. }) => {
            assert!(errors.contains(Field::CustomerVendorName));
            assert!(!errors.contains(Field::CustomerVendor));
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    wizard
        .update_field(FieldUpdate::CustomerVendorName("Globex Europe".to_string()))
        .expect("name");
    assert_eq!(wizard.advance().expect("advance"), StepId::Content);
}

// ── full runs ───────────────────────────────────────────────────────────────

async fn fill_invoice(wizard: &mut WizardController) {
    select_type(wizard, INVOICE).await;
    let globex = wizard
        .customer_vendors()
        .items()
        .expect("customers resolved")[0]
        .clone();
    wizard
        .update_field(FieldUpdate::CustomerVendor(Some(globex)))
        .expect("entity");
    wizard
        .update_field(FieldUpdate::CustomerVendorName("Globex Europe".to_string()))
        .expect("name override");
    wizard
        .update_field(FieldUpdate::Content(
            "Consulting services for March\nDetails follow.".to_string(),
        ))
        .expect("content");
    wizard
        .update_field(FieldUpdate::Circuit(Some(1)))
        .expect("circuit");
    advance_to(wizard, StepId::Review);
}

#[tokio::test]
async fn test_customer_invoice_submits_customer_code() {
    let repo = Arc::new(repository());
    let mut wizard = open(&repo, alice()).await;
    fill_invoice(&mut wizard).await;

    let created = wizard.submit().await.expect("submit");

    assert_eq!(created.id, 101);
    assert_eq!(wizard.state(), SessionState::Submitted { document_id: 101 });
    let sent = repo.created.lock().expect("lock poisoned")[0].clone();
    assert_eq!(sent.responsibility_centre_id, 1);
    assert_eq!(sent.type_id, INVOICE);
    assert_eq!(sent.sub_type_id, 10);
    assert_eq!(sent.title, "Consulting services for March");
    assert_eq!(sent.customer_vendor_code.as_deref(), Some("C001"));
    assert_eq!(sent.customer_vendor_name.as_deref(), Some("Globex Europe"));
    assert_eq!(sent.customer_vendor_city.as_deref(), Some("Springfield"));
    assert_eq!(sent.circuit_id, Some(1));
    assert_eq!(sent.comptable_date, None);
}

#[tokio::test]
async fn test_vendor_order_submits_vendor_code() {
    let repo = Arc::new(repository());
    let mut wizard = open(&repo, alice()).await;
    select_type(&mut wizard, PURCHASE_ORDER).await;
    let initech = wizard
        .customer_vendors()
        .items()
        .expect("vendors resolved")[0]
        .clone();
    wizard
        .update_field(FieldUpdate::CustomerVendor(Some(initech)))
        .expect("entity");
    wizard
        .update_field(FieldUpdate::Content("Office chairs".to_string()))
        .expect("content");
    advance_to(&mut wizard, StepId::Review);

    wizard.submit().await.expect("submit");

    let sent = repo.created.lock().expect("lock poisoned")[0].clone();
    assert_eq!(sent.customer_vendor_code.as_deref(), Some("V001"));
    assert_eq!(sent.customer_vendor_name.as_deref(), Some("Initech"));
    assert!(sent.is_static());
}

#[tokio::test]
async fn test_external_document_replaces_alias() {
    let repo = Arc::new(repository());
    let mut wizard = open(&repo, alice()).await;
    select_type(&mut wizard, MEMO).await;
    wizard
        .update_field(FieldUpdate::Content("Board minutes".to_string()))
        .expect("content");
    wizard
        .update_field(FieldUpdate::DocumentAlias("MEMO-7".to_string()))
        .expect("alias");
    wizard
        .update_field(FieldUpdate::IsExternal(true))
        .expect("external");
    advance_to(&mut wizard, StepId::Content);
    assert!(wizard.advance().is_err());
    wizard
        .update_field(FieldUpdate::ExternalReference("EXT-2024-19".to_string()))
        .expect("reference");
    advance_to(&mut wizard, StepId::Review);

    wizard.submit().await.expect("submit");

    let sent = repo.created.lock().expect("lock poisoned")[0].clone();
    assert_eq!(sent.document_alias, "");
    assert_eq!(sent.document_externe.as_deref(), Some("EXT-2024-19"));
}

#[tokio::test]
async fn test_failed_create_keeps_session_on_review() {
    let repo = Arc::new(repository());
    repo.reject_next_create.store(true, Ordering::SeqCst);
    let mut wizard = open(&repo, alice()).await;
    fill_invoice(&mut wizard).await;

    let result = wizard.submit().await;

    assert!(matches!(result, Err(WizardError::Submission(_))));
    assert_eq!(wizard.state(), SessionState::Open);
    assert_eq!(wizard.current_step(), StepId::Review);
    assert!(wizard.session_error().is_some());
    assert_eq!(wizard.form().customer_vendor_name, "Globex Europe");

    let created = wizard.submit().await.expect("retry");
    assert_eq!(created.id, 101);
    assert_eq!(wizard.session_error(), None);
}

#[tokio::test]
async fn test_submitted_session_is_closed() {
    let repo = Arc::new(repository());
    let mut wizard = open(&repo, alice()).await;
    fill_invoice(&mut wizard).await;
    wizard.submit().await.expect("submit");

    assert_eq!(wizard.form().selected_type_id, None);
    assert!(matches!(
        wizard.update_field(FieldUpdate::Title("again".to_string())),
        Err(WizardError::Closed)
    ));
    assert!(matches!(wizard.retreat(), Err(WizardError::Closed)));
    assert!(matches!(wizard.submit().await, Err(WizardError::Closed)));
}

#[tokio::test]
async fn test_double_submit_is_rejected() {
    let repo = Arc::new(repository());
    let mut wizard = open(&repo, alice()).await;
    fill_invoice(&mut wizard).await;

    let request = wizard.begin_submit().expect("first submit");
    assert!(matches!(wizard.begin_submit(), Err(WizardError::SubmissionInFlight)));
    assert!(matches!(
        wizard.update_field(FieldUpdate::Title("edit".to_string())),
        Err(WizardError::SubmissionInFlight)
    ));

    let result = repo.create_document(&request).await;
    wizard.finish_submit(result).expect("finish");
    assert_eq!(repo.created.lock().expect("lock poisoned").len(), 1);
}

// ── navigation ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_jump_back_from_review_and_revalidate_on_submit() {
    let repo = Arc::new(repository());
    let mut wizard = open(&repo, alice()).await;
    fill_invoice(&mut wizard).await;

    wizard.jump_to(StepId::Content).expect("jump");
    wizard
        .update_field(FieldUpdate::Content(String::new()))
        .expect("clear content");
    wizard.jump_to(StepId::Review).expect_err("not on review");
    advance_to(&mut wizard, StepId::Content);
    assert!(wizard.advance().is_err());

    wizard
        .update_field(FieldUpdate::Content("Restored".to_string()))
        .expect("content");
    advance_to(&mut wizard, StepId::Review);
    wizard.submit().await.expect("submit");
}

#[tokio::test]
async fn test_edit_on_review_is_caught_by_submit() {
    let repo = Arc::new(repository());
    let mut wizard = open(&repo, alice()).await;
    fill_invoice(&mut wizard).await;

    wizard
        .update_field(FieldUpdate::DocDate("2024-06-01".to_string()))
        .expect("date");

    assert!(!wizard.is_completed(StepId::TypeSubtype));
    assert!(matches!(
        wizard.jump_to(StepId::TypeSubtype),
        Err(WizardError::JumpNotAllowed { .. })
    ));
    match wizard.submit().await {
        Err(WizardError::Validation { step, .. }) => assert_eq!(step, StepId::TypeSubtype),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(repo.created.lock().expect("lock poisoned").is_empty());
    assert_eq!(wizard.state(), SessionState::Open);
}

#[tokio::test]
async fn test_jump_requires_review_step() {
    let repo = Arc::new(repository());
    let mut wizard = open(&repo, alice()).await;
    select_type(&mut wizard, MEMO).await;
    wizard
        .update_field(FieldUpdate::Content("Note".to_string()))
        .expect("content");
    advance_to(&mut wizard, StepId::Review);
    assert!(wizard.is_completed(StepId::Circuit));

    wizard.retreat().expect("retreat");
    assert_eq!(wizard.current_step(), StepId::Circuit);
    assert!(matches!(wizard.jump_to(StepId::Date), Err(WizardError::NotOnReview)));
}

// ── responsibility centre ───────────────────────────────────────────────────

#[tokio::test]
async fn test_user_without_centre_must_pick_one() {
    let repo = Arc::new(repository());
    let mut wizard = open(&repo, UserProfile::new("bob")).await;

    assert_eq!(wizard.form().responsibility_centre_id, None);
    assert_eq!(wizard.centres().items().map(<[_]>::len), Some(2));
    assert!(matches!(
        wizard.advance(),
        Err(WizardError::Validation {
            step: StepId::ResponsibilityCentre,
            ..
        })
    ));

    wizard
        .update_field(FieldUpdate::ResponsibilityCentre(Some(2)))
        .expect("centre");
    assert_eq!(wizard.advance().expect("advance"), StepId::Date);
}

#[tokio::test]
async fn test_user_with_centre_skips_lookup() {
    let repo = Arc::new(repository());
    let mut wizard = open(&repo, alice()).await;

    assert_eq!(wizard.centres(), &OptionSet::NotRequested);
    assert_eq!(wizard.form().responsibility_centre_id, Some(1));
    assert_eq!(wizard.advance().expect("advance"), StepId::Date);
}
