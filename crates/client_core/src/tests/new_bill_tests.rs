use super::*;
use std::sync::{
    atomic::{AtomicU32, Ordering},
    Mutex as StdMutex,
};

use async_trait::async_trait;
use shared::{
    domain::UserKind,
    error::{ApiException, ErrorCode},
    protocol::CreateBillReceipt,
};

use crate::BillsResource;

struct RecordingNewBillView {
    warning_visible: StdMutex<Option<bool>>,
    clear_calls: AtomicU32,
}

impl RecordingNewBillView {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            warning_visible: StdMutex::new(None),
            clear_calls: AtomicU32::new(0),
        })
    }

    fn warning_visible(&self) -> Option<bool> {
        *self.warning_visible.lock().expect("warning lock")
    }
}

impl NewBillView for RecordingNewBillView {
    fn show_file_warning(&self) {
        *self.warning_visible.lock().expect("warning lock") = Some(true);
    }

    fn hide_file_warning(&self) {
        *self.warning_visible.lock().expect("warning lock") = Some(false);
    }

    fn clear_file_input(&self) {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
    }
}

struct RecordingNavigator {
    routes: StdMutex<Vec<Route>>,
}

impl RecordingNavigator {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            routes: StdMutex::new(Vec::new()),
        })
    }

    fn routes(&self) -> Vec<Route> {
        self.routes.lock().expect("routes lock").clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes.lock().expect("routes lock").push(route);
    }
}

struct EmployeeSession;

impl SessionStore for EmployeeSession {
    fn get_item(&self, key: &str) -> Option<String> {
        (key == "user").then(|| {
            serde_json::to_string(&SessionUser {
                email: "employee@test.tld".to_string(),
                user_type: UserKind::Employee,
            })
            .expect("session json")
        })
    }
}

struct EmptySession;

impl SessionStore for EmptySession {
    fn get_item(&self, _key: &str) -> Option<String> {
        None
    }
}

#[derive(Default)]
struct CapturingDiagnostics {
    reports: StdMutex<Vec<String>>,
}

impl CapturingDiagnostics {
    fn reports(&self) -> Vec<String> {
        self.reports.lock().expect("reports lock").clone()
    }
}

impl DiagnosticsSink for CapturingDiagnostics {
    fn report(&self, context: &str, error: &anyhow::Error) {
        self.reports
            .lock()
            .expect("reports lock")
            .push(format!("{context}: {error}"));
    }
}

struct FakeBillsResource {
    fail_create: Option<ApiException>,
    fail_update: Option<ApiException>,
    created: StdMutex<Vec<CreateBillPayload>>,
    updated: StdMutex<Vec<UpdateBillPayload>>,
}

impl FakeBillsResource {
    fn ok() -> Self {
        Self {
            fail_create: None,
            fail_update: None,
            created: StdMutex::new(Vec::new()),
            updated: StdMutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl BillsResource for FakeBillsResource {
    async fn list(&self) -> Result<Vec<Bill>> {
        Ok(Vec::new())
    }

    async fn create(&self, payload: CreateBillPayload) -> Result<CreateBillReceipt> {
        if let Some(err) = &self.fail_create {
            return Err(err.clone().into());
        }
        self.created.lock().expect("created lock").push(payload);
        Ok(CreateBillReceipt {
            file_url: "https://storage.test.tld/justificatifs/justif.png".to_string(),
            key: "1234".to_string(),
        })
    }

    async fn update(&self, payload: UpdateBillPayload) -> Result<Bill> {
        if let Some(err) = &self.fail_update {
            return Err(err.clone().into());
        }
        let bill: Bill = serde_json::from_str(&payload.data).expect("update payload json");
        self.updated.lock().expect("updated lock").push(payload);
        Ok(bill)
    }
}

struct FakeStore {
    resource: Arc<FakeBillsResource>,
}

impl FakeStore {
    fn ok() -> Arc<Self> {
        Arc::new(Self {
            resource: Arc::new(FakeBillsResource::ok()),
        })
    }

    fn failing_create(err: ApiException) -> Arc<Self> {
        let mut resource = FakeBillsResource::ok();
        resource.fail_create = Some(err);
        Arc::new(Self {
            resource: Arc::new(resource),
        })
    }

    fn failing_update(err: ApiException) -> Arc<Self> {
        let mut resource = FakeBillsResource::ok();
        resource.fail_update = Some(err);
        Arc::new(Self {
            resource: Arc::new(resource),
        })
    }

    fn created(&self) -> Vec<CreateBillPayload> {
        self.resource.created.lock().expect("created lock").clone()
    }

    fn updated(&self) -> Vec<UpdateBillPayload> {
        self.resource.updated.lock().expect("updated lock").clone()
    }
}

impl Store for FakeStore {
    fn bills(&self) -> Arc<dyn BillsResource> {
        Arc::clone(&self.resource) as Arc<dyn BillsResource>
    }
}

struct Harness {
    view: Arc<RecordingNewBillView>,
    navigator: Arc<RecordingNavigator>,
    diagnostics: Arc<CapturingDiagnostics>,
    controller: Arc<NewBillController>,
}

fn harness(store: Option<Arc<FakeStore>>) -> Harness {
    harness_with_session(store, Arc::new(EmployeeSession))
}

fn harness_with_session(store: Option<Arc<FakeStore>>, session: Arc<dyn SessionStore>) -> Harness {
    let view = RecordingNewBillView::new();
    let navigator = RecordingNavigator::new();
    let diagnostics = Arc::new(CapturingDiagnostics::default());
    let controller = NewBillController::new_with_diagnostics(
        Arc::clone(&view) as Arc<dyn NewBillView>,
        Arc::clone(&navigator) as Arc<dyn Navigator>,
        store.map(|store| store as Arc<dyn Store>),
        session,
        Arc::clone(&diagnostics) as Arc<dyn DiagnosticsSink>,
    );
    Harness {
        view,
        navigator,
        diagnostics,
        controller,
    }
}

fn selected(name: &str) -> SelectedFile {
    SelectedFile {
        name: name.to_string(),
        bytes: b"img".to_vec(),
    }
}

fn form() -> BillFormInput {
    BillFormInput {
        expense_type: ExpenseType::Transports,
        name: "Vol Paris Londres".to_string(),
        date: "2023-04-14".to_string(),
        amount: "348".to_string(),
        vat: "70".to_string(),
        pct: "20".to_string(),
        commentary: "déplacement client".to_string(),
    }
}

#[tokio::test]
async fn rejected_extension_shows_warning_and_clears_the_input() {
    let harness = harness(None);

    harness
        .controller
        .handle_change_file("C:\\fakepath\\justif.webp", selected("justif.webp"))
        .await;

    assert_eq!(harness.view.warning_visible(), Some(true));
    assert_eq!(harness.view.clear_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        harness.controller.pending_upload().await,
        PendingUpload::default()
    );
}

#[tokio::test]
async fn accepted_extension_hides_warning_and_derives_the_file_name() {
    let harness = harness(None);

    harness
        .controller
        .handle_change_file("C:\\fakepath\\justif.png", selected("justif.png"))
        .await;

    assert_eq!(harness.view.warning_visible(), Some(false));
    let pending = harness.controller.pending_upload().await;
    assert_eq!(pending.file_name.as_deref(), Some("justif.png"));
    assert_eq!(pending.file, Some(selected("justif.png")));
}

#[tokio::test]
async fn extension_check_is_case_insensitive_and_handles_url_separators() {
    let harness = harness(None);

    harness
        .controller
        .handle_change_file("uploads/tmp/JUSTIF.PNG", selected("JUSTIF.PNG"))
        .await;

    assert_eq!(harness.view.warning_visible(), Some(false));
    assert_eq!(
        harness.controller.pending_upload().await.file_name.as_deref(),
        Some("JUSTIF.PNG")
    );
}

#[tokio::test]
async fn last_valid_selection_wins_after_a_rejected_one() {
    let harness = harness(None);

    harness
        .controller
        .handle_change_file("C:\\fakepath\\justif.webp", selected("justif.webp"))
        .await;
    harness
        .controller
        .handle_change_file("C:\\fakepath\\justif.png", selected("justif.png"))
        .await;

    assert_eq!(harness.view.warning_visible(), Some(false));
    let pending = harness.controller.pending_upload().await;
    assert_eq!(pending.file_name.as_deref(), Some("justif.png"));
}

#[tokio::test]
async fn rejected_selection_clears_a_previously_accepted_file() {
    let harness = harness(None);

    harness
        .controller
        .handle_change_file("C:\\fakepath\\justif.png", selected("justif.png"))
        .await;
    harness
        .controller
        .handle_change_file("C:\\fakepath\\justif.webp", selected("justif.webp"))
        .await;

    assert_eq!(harness.view.warning_visible(), Some(true));
    assert_eq!(
        harness.controller.pending_upload().await,
        PendingUpload::default()
    );
}

#[tokio::test]
async fn submit_navigates_once_then_creates_and_updates_sequentially() {
    let store = FakeStore::ok();
    let harness = harness(Some(Arc::clone(&store)));

    harness
        .controller
        .handle_change_file("C:\\fakepath\\justif.png", selected("justif.png"))
        .await;
    let persist = harness
        .controller
        .handle_submit(form())
        .await
        .expect("submit");

    // Navigation fires before the persist settles.
    assert_eq!(harness.navigator.routes(), vec![Route::Bills]);

    persist.await.expect("persist task");

    let created = store.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].data.email, "employee@test.tld");
    assert_eq!(created[0].data.file_name, "justif.png");
    assert_eq!(created[0].data.file, b"img".to_vec());
    assert!(created[0].headers.no_content_type);

    let updated = store.updated();
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].selector, "1234");
    let bill: Bill = serde_json::from_str(&updated[0].data).expect("bill json");
    assert_eq!(bill.id, "1234");
    assert_eq!(
        bill.file_url.as_deref(),
        Some("https://storage.test.tld/justificatifs/justif.png")
    );
    assert_eq!(bill.file_name.as_deref(), Some("justif.png"));
    assert_eq!(bill.amount, 348);
    assert_eq!(bill.pct, 20);
    assert_eq!(bill.status, BillStatus::Pending);

    // Navigation happened exactly once, no matter how the persist went.
    assert_eq!(harness.navigator.routes(), vec![Route::Bills]);
    assert!(harness.diagnostics.reports().is_empty());
}

#[tokio::test]
async fn pct_defaults_to_20_when_absent_or_non_numeric() {
    for raw_pct in ["", "abc"] {
        let store = FakeStore::ok();
        let harness = harness(Some(Arc::clone(&store)));

        let mut input = form();
        input.pct = raw_pct.to_string();
        let persist = harness
            .controller
            .handle_submit(input)
            .await
            .expect("submit");
        persist.await.expect("persist task");

        let bill: Bill = serde_json::from_str(&store.updated()[0].data).expect("bill json");
        assert_eq!(bill.pct, DEFAULT_PCT, "pct input: {raw_pct:?}");
    }
}

#[tokio::test]
async fn create_rejection_skips_update_and_reaches_the_diagnostics_sink() {
    let store = FakeStore::failing_create(ApiException::new(ErrorCode::NotFound, "no such user"));
    let harness = harness(Some(Arc::clone(&store)));

    let persist = harness
        .controller
        .handle_submit(form())
        .await
        .expect("submit");
    persist.await.expect("persist task");

    assert!(store.updated().is_empty());
    let reports = harness.diagnostics.reports();
    assert_eq!(reports.len(), 1);
    assert!(
        reports[0].starts_with("create bill:") && reports[0].contains("404"),
        "unexpected report: {}",
        reports[0]
    );
    assert_eq!(harness.navigator.routes(), vec![Route::Bills]);
}

#[tokio::test]
async fn update_rejection_reaches_the_diagnostics_sink() {
    let store = FakeStore::failing_update(ApiException::new(ErrorCode::Internal, "write failed"));
    let harness = harness(Some(Arc::clone(&store)));

    let persist = harness
        .controller
        .handle_submit(form())
        .await
        .expect("submit");
    persist.await.expect("persist task");

    assert_eq!(store.created().len(), 1);
    let reports = harness.diagnostics.reports();
    assert_eq!(reports.len(), 1);
    assert!(
        reports[0].starts_with("update bill:") && reports[0].contains("500"),
        "unexpected report: {}",
        reports[0]
    );
    assert_eq!(harness.navigator.routes(), vec![Route::Bills]);
}

#[tokio::test]
async fn submit_without_store_is_a_caller_error_but_still_navigates_once() {
    let harness = harness(None);

    let err = harness
        .controller
        .handle_submit(form())
        .await
        .expect_err("missing store must surface");

    assert!(err.to_string().contains("store"), "unexpected error: {err}");
    assert_eq!(harness.navigator.routes(), vec![Route::Bills]);
}

#[tokio::test]
async fn missing_session_user_is_a_precondition_violation() {
    let harness = harness_with_session(Some(FakeStore::ok()), Arc::new(EmptySession));

    let err = harness
        .controller
        .handle_submit(form())
        .await
        .expect_err("missing session must surface");

    assert!(err.to_string().contains("user"), "unexpected error: {err}");
    // The precondition fails before the optimistic navigation.
    assert!(harness.navigator.routes().is_empty());
}
