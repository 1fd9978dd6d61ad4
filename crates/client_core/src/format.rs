//! Display formatting for list rows (French, matching the stored labels).

use chrono::{Datelike, NaiveDate};
use shared::domain::BillStatus;

const MONTHS_SHORT_FR: [&str; 12] = [
    "Janv.", "Févr.", "Mars", "Avr.", "Mai", "Juin", "Juil.", "Août", "Sept.", "Oct.", "Nov.",
    "Déc.",
];

/// Formats a stored `YYYY-MM-DD` date as the short French form used by the
/// list, e.g. `2004-04-04` -> `4 Avr. 04`. Returns `None` when the value
/// does not parse; callers fall back to the raw string.
pub fn format_date(raw: &str) -> Option<String> {
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let month = MONTHS_SHORT_FR[date.month0() as usize];
    Some(format!("{} {} {:02}", date.day(), month, date.year() % 100))
}

pub fn format_status(status: BillStatus) -> &'static str {
    match status {
        BillStatus::Pending => "En attente",
        BillStatus::Accepted => "Accepté",
        BillStatus::Refused => "Refusé",
    }
}
