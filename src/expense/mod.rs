//! Recorded expenses and the endpoints for managing them.

mod create;
mod db;
mod delete;
mod domain;
mod edit;
mod form;
mod list;
mod query;

pub use create::{create_expense_endpoint, get_new_expense_page};
pub use db::create_expense_table;
pub use delete::delete_expense_endpoint;
pub use domain::{Expense, ExpenseId};
pub use edit::{get_edit_expense_page, update_expense_endpoint};
pub use list::{ExpensesQueryParams, get_expenses_page};
pub(crate) use list::filter_form_view;
pub use query::{AnnotatedExpense, ExpenseFilter, get_expenses, get_recent_expenses};

#[cfg(test)]
pub use db::{create_expense, delete_expense, get_expense, update_expense};
