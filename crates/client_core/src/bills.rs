//! Bills-list controller: fetch, order, format, and render.

use std::{cmp::Ordering, sync::Arc};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use shared::domain::{Bill, Route};
use tracing::warn;
use url::Url;

use crate::{
    format::{format_date, format_status},
    BillRow, BillsView, DisplayState, Navigator, SessionStore, Store,
};

pub struct BillsListController {
    view: Arc<dyn BillsView>,
    navigator: Arc<dyn Navigator>,
    store: Option<Arc<dyn Store>>,
    _session: Arc<dyn SessionStore>,
}

impl BillsListController {
    pub fn new(
        view: Arc<dyn BillsView>,
        navigator: Arc<dyn Navigator>,
        store: Option<Arc<dyn Store>>,
        session: Arc<dyn SessionStore>,
    ) -> Arc<Self> {
        Arc::new(Self {
            view,
            navigator,
            store,
            _session: session,
        })
    }

    /// Initial fetch-and-render pipeline. Renders the loading state, then
    /// either the ordered rows or a classified error view. Failures are
    /// never retried. Without a store this settles on an empty list.
    pub async fn load(&self) {
        if self.store.is_none() {
            self.view.render(DisplayState::Ready { rows: Vec::new() });
            return;
        }
        self.view.render(DisplayState::Loading);
        match self.get_bills().await {
            Ok(rows) => self.view.render(DisplayState::Ready { rows }),
            Err(err) => self.view.render(DisplayState::Error {
                message: list_error_message(&err),
            }),
        }
    }

    /// Fetches the current user's bills and maps them into display rows,
    /// most recent first.
    pub async fn get_bills(&self) -> Result<Vec<BillRow>> {
        let store = self.store.as_ref().context("store is not configured")?;
        let bills = store.bills().list().await?;
        Ok(order_and_format(bills))
    }

    /// "New bill" trigger. No validation, no network call.
    pub fn handle_click_new_bill(&self) {
        self.navigator.navigate(Route::NewBill);
    }

    /// Opens the receipt modal for a row's proof-of-purchase reference.
    /// Tolerates relative paths by resolving them against the document
    /// origin, so the image renders regardless of how the URL was stored.
    pub fn handle_click_icon_eye(&self, file_url: &str) -> Result<()> {
        let url = match Url::parse(file_url) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                self.view.origin().join(file_url).with_context(|| {
                    format!("receipt path '{file_url}' does not resolve against the page origin")
                })?
            }
            Err(err) => {
                return Err(err).with_context(|| format!("invalid receipt url '{file_url}'"))
            }
        };
        self.view.show_receipt_modal(&url);
        Ok(())
    }
}

fn parsed_date(bill: &Bill) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&bill.date, "%Y-%m-%d").ok()
}

/// Orders bills by date descending (stable for equal dates; rows with
/// unparseable dates keep their store order after the dated ones) and
/// attaches display-formatted date and status. A date that fails to format
/// is rendered verbatim; corrupted data degrades, it never drops the row.
fn order_and_format(mut bills: Vec<Bill>) -> Vec<BillRow> {
    bills.sort_by(|a, b| match (parsed_date(a), parsed_date(b)) {
        (Some(first), Some(second)) => second.cmp(&first),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    bills
        .into_iter()
        .map(|bill| {
            let date = match format_date(&bill.date) {
                Some(formatted) => formatted,
                None => {
                    warn!(bill_id = %bill.id, date = %bill.date, "bills: unparseable date rendered verbatim");
                    bill.date.clone()
                }
            };
            let status = format_status(bill.status).to_string();
            BillRow { date, status, bill }
        })
        .collect()
}

/// Maps a list rejection onto a user-facing error message by looking for an
/// HTTP-status-like token embedded in the message text.
pub fn list_error_message(err: &anyhow::Error) -> String {
    let text = err.to_string();
    if text.contains("404") {
        "Erreur 404: la ressource demandée est introuvable.".to_string()
    } else if text.contains("500") {
        "Erreur 500: le service est momentanément indisponible.".to_string()
    } else {
        format!("Erreur: {text}")
    }
}

#[cfg(test)]
#[path = "tests/bills_tests.rs"]
mod tests;
