//! The shared state handed to every route handler.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{Error, auth::DEFAULT_COOKIE_DURATION, db::initialize};

/// Everything the handlers need: the cookie key and duration for auth, the
/// local timezone for date arithmetic, and the database connection.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The key for signing and encrypting private cookies.
    pub cookie_key: Key,

    /// How long a freshly issued auth cookie stays valid.
    pub cookie_duration: Duration,

    /// The canonical name of the local timezone, e.g. "Asia/Kuwait".
    pub local_timezone: String,

    /// The SQLite connection, shared across handler invocations.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Build the app state around `db_connection`, creating the schema in the
    /// database if it is not there yet.
    ///
    /// `local_timezone` must be a canonical timezone name such as
    /// "Asia/Kuwait".
    ///
    /// # Errors
    /// Returns an error if the database schema could not be created.
    pub fn new(
        db_connection: Connection,
        cookie_secret: &str,
        local_timezone: &str,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: local_timezone.to_owned(),
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}

// Lets `PrivateCookieJar` find its key in the app state.
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Derive a cookie signing key from `secret`.
///
/// `Key` wants 64 bytes of material, which a SHA-512 digest of the secret
/// provides regardless of the secret's own length.
pub fn create_cookie_key(secret: &str) -> Key {
    Key::from(&Sha512::digest(secret))
}
