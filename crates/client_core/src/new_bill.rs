//! New-bill controller: file validation, payload assembly, and the
//! optimistic-navigation / background-persist split.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use shared::{
    domain::{Bill, BillStatus, ExpenseType, Route, SessionUser},
    protocol::{BillFormData, CreateBillPayload, CreateHeaders, SelectedFile, UpdateBillPayload},
};
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::info;

use crate::{DiagnosticsSink, Navigator, NewBillView, SessionStore, Store, TracingDiagnostics};

/// Applied when the typed percentage is absent or non-numeric.
pub const DEFAULT_PCT: u32 = 20;

const ACCEPTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Transient state of one form session. `file_name` is populated iff the
/// selected file passed extension validation; a later selection replaces
/// an earlier one wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingUpload {
    pub file: Option<SelectedFile>,
    pub file_name: Option<String>,
}

/// Raw form fields at submit time. Amount and percentage stay strings here;
/// coercion and defaulting are the controller's job.
#[derive(Debug, Clone)]
pub struct BillFormInput {
    pub expense_type: ExpenseType,
    pub name: String,
    pub date: String,
    pub amount: String,
    pub vat: String,
    pub pct: String,
    pub commentary: String,
}

pub struct NewBillController {
    view: Arc<dyn NewBillView>,
    navigator: Arc<dyn Navigator>,
    store: Option<Arc<dyn Store>>,
    session: Arc<dyn SessionStore>,
    diagnostics: Arc<dyn DiagnosticsSink>,
    pending: Mutex<PendingUpload>,
}

impl NewBillController {
    pub fn new(
        view: Arc<dyn NewBillView>,
        navigator: Arc<dyn Navigator>,
        store: Option<Arc<dyn Store>>,
        session: Arc<dyn SessionStore>,
    ) -> Arc<Self> {
        Self::new_with_diagnostics(view, navigator, store, session, Arc::new(TracingDiagnostics))
    }

    pub fn new_with_diagnostics(
        view: Arc<dyn NewBillView>,
        navigator: Arc<dyn Navigator>,
        store: Option<Arc<dyn Store>>,
        session: Arc<dyn SessionStore>,
        diagnostics: Arc<dyn DiagnosticsSink>,
    ) -> Arc<Self> {
        Arc::new(Self {
            view,
            navigator,
            store,
            session,
            diagnostics,
            pending: Mutex::new(PendingUpload::default()),
        })
    }

    /// File-input change handler. Accepts jpg/jpeg/png (case-insensitive,
    /// purely extension-based); anything else shows the warning indicator
    /// and clears the input so no invalid file can be submitted.
    pub async fn handle_change_file(&self, input_value: &str, file: SelectedFile) {
        if !has_accepted_extension(&file.name) {
            self.view.show_file_warning();
            self.view.clear_file_input();
            *self.pending.lock().await = PendingUpload::default();
            return;
        }
        self.view.hide_file_warning();
        let file_name = last_path_segment(input_value).to_string();
        *self.pending.lock().await = PendingUpload {
            file: Some(file),
            file_name: Some(file_name),
        };
    }

    /// Snapshot of the form session's upload state.
    pub async fn pending_upload(&self) -> PendingUpload {
        self.pending.lock().await.clone()
    }

    /// Submit handler. Navigates back to the bills list immediately, then
    /// persists in the background: create first, and only on success the
    /// follow-up update keyed by the returned identifier. Persistence
    /// failures go to the diagnostics sink; the UI neither waits for nor
    /// rolls back from them. A missing store is a caller error, surfaced
    /// as `Err` after the navigation has fired.
    pub async fn handle_submit(self: &Arc<Self>, form: BillFormInput) -> Result<JoinHandle<()>> {
        let email = self.session_email()?;
        let pending = self.pending.lock().await.clone();

        let bill = Bill {
            id: String::new(),
            email: email.clone(),
            expense_type: form.expense_type,
            name: form.name,
            amount: form.amount.trim().parse().unwrap_or(0),
            date: form.date,
            vat: form.vat,
            pct: form.pct.trim().parse().unwrap_or(DEFAULT_PCT),
            commentary: form.commentary,
            file_url: None,
            file_name: pending.file_name.clone(),
            status: BillStatus::Pending,
        };

        // Optimistic: the user moves on before the persist settles.
        self.navigator.navigate(Route::Bills);

        let Some(store) = self.store.clone() else {
            return Err(anyhow!("cannot create a bill without a configured store"));
        };

        let payload = CreateBillPayload {
            data: BillFormData {
                file_name: pending.file_name.unwrap_or_default(),
                file: pending.file.map(|file| file.bytes).unwrap_or_default(),
                email,
            },
            headers: CreateHeaders {
                no_content_type: true,
            },
        };

        let controller = Arc::clone(self);
        Ok(tokio::spawn(async move {
            controller.persist(store, payload, bill).await;
        }))
    }

    async fn persist(&self, store: Arc<dyn Store>, payload: CreateBillPayload, mut bill: Bill) {
        let receipt = match store.bills().create(payload).await {
            Ok(receipt) => receipt,
            Err(err) => {
                self.diagnostics.report("create bill", &err);
                return;
            }
        };
        bill.id = receipt.key;
        bill.file_url = Some(receipt.file_url);
        if let Err(err) = self.update_bill(&bill).await {
            self.diagnostics.report("update bill", &err);
        }
    }

    /// Second persist phase. A no-op when no store was supplied.
    async fn update_bill(&self, bill: &Bill) -> Result<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let payload = UpdateBillPayload {
            data: serde_json::to_string(bill).context("failed to serialize bill for update")?,
            selector: bill.id.clone(),
        };
        store.bills().update(payload).await?;
        info!(bill_id = %bill.id, "new bill persisted");
        Ok(())
    }

    fn session_email(&self) -> Result<String> {
        let raw = self
            .session
            .get_item("user")
            .context("session storage has no 'user' entry")?;
        let user: SessionUser =
            serde_json::from_str(&raw).context("session 'user' entry is not valid JSON")?;
        Ok(user.email)
    }
}

fn has_accepted_extension(file_name: &str) -> bool {
    file_name.rsplit_once('.').is_some_and(|(_, ext)| {
        ACCEPTED_EXTENSIONS
            .iter()
            .any(|accepted| ext.eq_ignore_ascii_case(accepted))
    })
}

/// Last segment of the input's value, splitting on both URL-style and
/// OS-style separators ("C:\fakepath\justif.png" and "a/b/justif.png" both
/// yield "justif.png").
fn last_path_segment(input_value: &str) -> &str {
    input_value
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(input_value)
}

#[cfg(test)]
#[path = "tests/new_bill_tests.rs"]
mod tests;
