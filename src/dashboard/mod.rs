//! The dashboard page summarising the user's spending.

mod aggregation;
mod cards;
mod expense;
mod handlers;
mod tables;

pub use handlers::get_dashboard_page;
