//! In-memory store used by the demo: same call contract as the remote one,
//! seeded with the classic four fixture bills.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use client_core::{BillsResource, Store};
use shared::{
    domain::{Bill, BillStatus, ExpenseType},
    error::{ApiException, ErrorCode},
    protocol::{CreateBillPayload, CreateBillReceipt, UpdateBillPayload},
};
use tokio::sync::Mutex;
use uuid::Uuid;

pub struct FixtureStore {
    resource: Arc<FixtureBills>,
}

struct FixtureBills {
    rows: Mutex<Vec<Bill>>,
    outage: bool,
}

impl FixtureStore {
    pub fn seeded(outage: bool) -> Arc<Self> {
        Arc::new(Self {
            resource: Arc::new(FixtureBills {
                rows: Mutex::new(fixture_bills()),
                outage,
            }),
        })
    }
}

impl Store for FixtureStore {
    fn bills(&self) -> Arc<dyn BillsResource> {
        Arc::clone(&self.resource) as Arc<dyn BillsResource>
    }
}

#[async_trait]
impl BillsResource for FixtureBills {
    async fn list(&self) -> Result<Vec<Bill>> {
        if self.outage {
            return Err(ApiException::new(ErrorCode::Internal, "panne du service").into());
        }
        Ok(self.rows.lock().await.clone())
    }

    async fn create(&self, payload: CreateBillPayload) -> Result<CreateBillReceipt> {
        let key = Uuid::new_v4().to_string();
        Ok(CreateBillReceipt {
            file_url: format!(
                "https://storage.fixture.tld/justificatifs/{key}/{}",
                payload.data.file_name
            ),
            key,
        })
    }

    async fn update(&self, payload: UpdateBillPayload) -> Result<Bill> {
        let mut bill: Bill =
            serde_json::from_str(&payload.data).context("update payload is not a bill")?;
        bill.id = payload.selector;
        self.rows.lock().await.push(bill.clone());
        Ok(bill)
    }
}

fn bill(
    id: &str,
    expense_type: ExpenseType,
    name: &str,
    date: &str,
    amount: i64,
    status: BillStatus,
) -> Bill {
    Bill {
        id: id.to_string(),
        email: "employee@test.tld".to_string(),
        expense_type,
        name: name.to_string(),
        amount,
        date: date.to_string(),
        vat: "80".to_string(),
        pct: 20,
        commentary: String::new(),
        file_url: Some("https://storage.fixture.tld/justificatifs/1.jpg".to_string()),
        file_name: Some("preview-facture.jpg".to_string()),
        status,
    }
}

fn fixture_bills() -> Vec<Bill> {
    vec![
        bill(
            "47qAXb6fIm2zOKkLzMro",
            ExpenseType::HotelEtLogement,
            "encore",
            "2004-04-04",
            400,
            BillStatus::Pending,
        ),
        bill(
            "BeKy5Mo4jkmdfPGYpTxZ",
            ExpenseType::Transports,
            "test1",
            "2001-01-01",
            100,
            BillStatus::Refused,
        ),
        bill(
            "UIUZtnPQvnbFnB0ozvJh",
            ExpenseType::ServicesEnLigne,
            "test3",
            "2003-03-03",
            300,
            BillStatus::Accepted,
        ),
        bill(
            "qcTKIoSDSQvxerbVm0X5",
            ExpenseType::RestaurantsEtBars,
            "test2",
            "2002-02-02",
            200,
            BillStatus::Refused,
        ),
    ]
}
