//! Client-side controllers for the employee expense-bill pages.
//!
//! Everything with real control flow lives here: the bills-list
//! retrieval/render/error pipeline and the new-bill submission pipeline.
//! Markup, routing, and the store transport are injected collaborators.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use shared::{
    domain::{Bill, Route},
    protocol::{CreateBillPayload, CreateBillReceipt, UpdateBillPayload},
};
use tracing::error;
use url::Url;

pub mod bills;
pub mod format;
pub mod new_bill;

pub use bills::BillsListController;
pub use new_bill::{BillFormInput, NewBillController, PendingUpload};

/// The `bills()` resource of the remote store. All calls are asynchronous
/// and may reject with an error whose message embeds an HTTP-status-like
/// token; the core never depends on anything more structured than that.
#[async_trait]
pub trait BillsResource: Send + Sync {
    async fn list(&self) -> Result<Vec<Bill>>;
    async fn create(&self, payload: CreateBillPayload) -> Result<CreateBillReceipt>;
    async fn update(&self, payload: UpdateBillPayload) -> Result<Bill>;
}

/// Abstract remote store. The concrete transport is out of scope; only the
/// resource contract matters here.
pub trait Store: Send + Sync {
    fn bills(&self) -> Arc<dyn BillsResource>;
}

/// Read-only key-value session accessor (the browser's local storage in the
/// real app). Injected explicitly so tests can run with fixture sessions.
pub trait SessionStore: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
}

/// Synchronous fire-and-forget navigation callback.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Render surface of the bills-list page. `origin` is the document origin,
/// used to absolutize receipt URLs that were stored as relative paths.
pub trait BillsView: Send + Sync {
    fn render(&self, state: DisplayState);
    fn origin(&self) -> Url;
    fn show_receipt_modal(&self, url: &Url);
}

/// Render surface of the new-bill form.
pub trait NewBillView: Send + Sync {
    fn show_file_warning(&self);
    fn hide_file_warning(&self);
    fn clear_file_input(&self);
}

/// Sink for failures of the background persist. Navigation has already
/// happened when these fire, so they are diagnostics, not UI state; tests
/// inject a capturing sink instead of intercepting a global stream.
pub trait DiagnosticsSink: Send + Sync {
    fn report(&self, context: &str, error: &anyhow::Error);
}

pub struct TracingDiagnostics;

impl DiagnosticsSink for TracingDiagnostics {
    fn report(&self, context: &str, error: &anyhow::Error) {
        error!(context, "background persist failed: {error:#}");
    }
}

/// Input of the view renderer. Exactly one variant at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayState {
    Loading,
    Error { message: String },
    Ready { rows: Vec<BillRow> },
}

/// One list row: the raw bill plus its display-formatted date and status.
#[derive(Debug, Clone, PartialEq)]
pub struct BillRow {
    pub bill: Bill,
    pub date: String,
    pub status: String,
}
