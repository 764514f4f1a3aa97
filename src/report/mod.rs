//! The report pages: a filtered expense report and a printable yearly report.

mod filtered;
mod yearly;

pub use filtered::get_reports_page;
pub use yearly::get_yearly_report_page;

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

/// The state shared by the report pages.
#[derive(Debug, Clone)]
pub struct ReportsState {
    /// The local timezone as a canonical timezone name, e.g. "Asia/Kuwait".
    pub local_timezone: String,
    /// The database connection for reading the user's expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ReportsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}
