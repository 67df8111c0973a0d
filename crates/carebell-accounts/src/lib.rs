//! Credential sessions for Carebell.
//!
//! Users sign up with an email and password, sign in to obtain an opaque
//! bearer session token, and present that token on every authenticated
//! request. Sessions carry an expiry and are deleted on sign-out.

mod password;
mod session;

pub use session::{resolve_session, sign_in, sign_out, Session, DEFAULT_SESSION_TTL_HOURS};

use carebell_types::User;
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("invalid account details: {0}")]
    Invalid(String),
    #[error("an account with this email already exists")]
    EmailTaken,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("session not found or expired")]
    SessionNotFound,
    #[error("user not found: {0}")]
    UserNotFound(String),
}

/// Details supplied when registering a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
}

/// Normalizes an email for storage and lookup.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate(new_user: &NewUser) -> Result<(), AccountError> {
    let email = normalize_email(&new_user.email);
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
        _ => return Err(AccountError::Invalid("email address is malformed".to_string())),
    }
    if new_user.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AccountError::Invalid(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if new_user.name.trim().is_empty() {
        return Err(AccountError::Invalid("name is required".to_string()));
    }
    Ok(())
}

/// Registers a new user.
///
/// # Errors
///
/// Returns `AccountError::Invalid` for malformed input and
/// `AccountError::EmailTaken` if the email is already registered.
pub fn sign_up(conn: &Connection, new_user: &NewUser) -> Result<User, AccountError> {
    validate(new_user)?;

    let email = normalize_email(&new_user.email);
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
        [&email],
        |row| row.get(0),
    )?;
    if exists {
        return Err(AccountError::EmailTaken);
    }

    let id = uuid::Uuid::new_v4().to_string();
    let phone = new_user
        .phone
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty());

    conn.execute(
        "INSERT INTO users (id, email, name, phone, password_hash) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            id,
            email,
            new_user.name.trim(),
            phone,
            password::hash_password(&new_user.password),
        ],
    )?;

    tracing::info!(user_id = %id, "registered new user");

    get_user(conn, &id)
}

/// Retrieves a user by ID.
pub fn get_user(conn: &Connection, user_id: &str) -> Result<User, AccountError> {
    conn.query_row(
        "SELECT id, email, name, phone, created_at FROM users WHERE id = ?1",
        [user_id],
        map_row_to_user,
    )
    .optional()?
    .ok_or_else(|| AccountError::UserNotFound(user_id.to_string()))
}

pub(crate) fn map_row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        phone: row.get(3)?,
        created_at: row.get(4)?,
    })
}
