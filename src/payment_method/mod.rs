//! Payment methods, either owned by one user or shared by an administrator.

mod create;
mod db;
mod delete;
mod domain;
mod edit;
mod list;

pub use create::{create_payment_method_endpoint, get_new_payment_method_page};
pub use db::{
    create_payment_method, create_payment_method_table, get_all_payment_methods,
    get_payment_method, update_payment_method,
};
pub use delete::delete_payment_method_endpoint;
pub use domain::{MethodType, PaymentMethod, PaymentMethodId, PaymentMethodName};
pub use edit::{get_edit_payment_method_page, update_payment_method_endpoint};
pub use list::get_payment_methods_page;
