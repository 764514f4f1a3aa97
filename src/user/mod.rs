//! User accounts and the admin page for managing them.

mod approval;
mod create;
mod db;
mod delete;
mod domain;
mod list;

pub use approval::toggle_user_approval_endpoint;
pub use create::create_user_endpoint;
pub use db::{
    count_users, create_user, create_user_table, get_all_users, get_user_by_email, get_user_by_id,
    require_admin, update_user_password,
};
pub use delete::delete_user_endpoint;
pub use domain::{Role, User, UserId};
pub use list::get_users_page;

#[cfg(test)]
pub use db::{delete_user, toggle_user_approval};
