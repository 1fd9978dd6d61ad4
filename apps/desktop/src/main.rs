use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use client_core::{
    BillFormInput, BillsListController, BillsView, DisplayState, Navigator, NewBillController,
    NewBillView, SessionStore, Store,
};
use shared::{
    domain::{ExpenseType, Route, SessionUser, UserKind},
    protocol::SelectedFile,
};
use tracing::info;
use url::Url;

mod fixture_store;

use fixture_store::FixtureStore;

#[derive(Parser, Debug)]
struct Args {
    /// Session email of the demo employee.
    #[arg(long, default_value = "employee@test.tld")]
    email: String,
    /// Make the fixture store reject the list call, to show the error view.
    #[arg(long)]
    simulate_outage: bool,
}

struct TerminalView {
    origin: Url,
}

impl BillsView for TerminalView {
    fn render(&self, state: DisplayState) {
        match state {
            DisplayState::Loading => println!("Loading..."),
            DisplayState::Error { message } => println!("Erreur\n  {message}"),
            DisplayState::Ready { rows } => {
                println!("Mes notes de frais ({} lignes)", rows.len());
                println!(
                    "{:<24} {:<20} {:<12} {:>8}  {}",
                    "Type", "Nom", "Date", "Montant", "Statut"
                );
                for row in rows {
                    println!(
                        "{:<24} {:<20} {:<12} {:>7}€  {}",
                        row.bill.expense_type.label(),
                        row.bill.name,
                        row.date,
                        row.bill.amount,
                        row.status
                    );
                }
            }
        }
    }

    fn origin(&self) -> Url {
        self.origin.clone()
    }

    fn show_receipt_modal(&self, url: &Url) {
        println!("Justificatif: {url}");
    }
}

struct TerminalNewBillView;

impl NewBillView for TerminalNewBillView {
    fn show_file_warning(&self) {
        println!("! Seuls les fichiers jpg, jpeg et png sont acceptés.");
    }

    fn hide_file_warning(&self) {}

    fn clear_file_input(&self) {}
}

struct PrintNavigator;

impl Navigator for PrintNavigator {
    fn navigate(&self, route: Route) {
        println!("-> navigate {}", route.as_path());
    }
}

struct StaticSession {
    user_json: String,
}

impl StaticSession {
    fn employee(email: &str) -> Result<Arc<Self>> {
        Ok(Arc::new(Self {
            user_json: serde_json::to_string(&SessionUser {
                email: email.to_string(),
                user_type: UserKind::Employee,
            })?,
        }))
    }
}

impl SessionStore for StaticSession {
    fn get_item(&self, key: &str) -> Option<String> {
        (key == "user").then(|| self.user_json.clone())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let store = FixtureStore::seeded(args.simulate_outage);
    let view = Arc::new(TerminalView {
        origin: Url::parse("http://localhost:8080/")?,
    });
    let navigator = Arc::new(PrintNavigator);
    let session = StaticSession::employee(&args.email)?;

    let bills = BillsListController::new(
        Arc::clone(&view) as Arc<dyn BillsView>,
        Arc::clone(&navigator) as Arc<dyn Navigator>,
        Some(Arc::clone(&store) as Arc<dyn Store>),
        Arc::clone(&session) as Arc<dyn SessionStore>,
    );
    bills.load().await;
    if args.simulate_outage {
        return Ok(());
    }
    bills.handle_click_icon_eye("justificatifs/1.jpg")?;

    let new_bill = NewBillController::new(
        Arc::new(TerminalNewBillView),
        Arc::clone(&navigator) as Arc<dyn Navigator>,
        Some(Arc::clone(&store) as Arc<dyn Store>),
        Arc::clone(&session) as Arc<dyn SessionStore>,
    );
    new_bill
        .handle_change_file(
            "C:\\fakepath\\justif.png",
            SelectedFile {
                name: "justif.png".to_string(),
                bytes: b"img".to_vec(),
            },
        )
        .await;
    let persist = new_bill
        .handle_submit(BillFormInput {
            expense_type: ExpenseType::Transports,
            name: "Vol Paris Londres".to_string(),
            date: "2023-04-14".to_string(),
            amount: "348".to_string(),
            vat: "70".to_string(),
            pct: "20".to_string(),
            commentary: "déplacement client".to_string(),
        })
        .await?;

    // The real app never waits for this; the demo does, so the second
    // listing shows the persisted bill before the process exits.
    persist.await?;
    info!("background persist settled");
    bills.load().await;

    Ok(())
}
