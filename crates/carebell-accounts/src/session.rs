//! Bearer session tokens.

use crate::{map_row_to_user, normalize_email, password, AccountError};
use carebell_types::User;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};

/// Default session lifetime.
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 7;

/// An issued session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Opaque bearer token.
    pub token: String,
    /// Expiry (RFC 3339).
    pub expires_at: String,
    pub user: User,
}

/// Verifies credentials and issues a new session valid for `ttl`.
///
/// Unknown emails and wrong passwords produce the same error.
pub fn sign_in(
    conn: &Connection,
    email: &str,
    password_input: &str,
    ttl: Duration,
) -> Result<Session, AccountError> {
    let email = normalize_email(email);
    let row: Option<(String, String)> = conn
        .query_row(
            "SELECT id, password_hash FROM users WHERE email = ?1",
            [&email],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let Some((user_id, stored_hash)) = row else {
        return Err(AccountError::InvalidCredentials);
    };
    if !password::verify_password(password_input, &stored_hash) {
        tracing::debug!(user_id = %user_id, "password mismatch on sign-in");
        return Err(AccountError::InvalidCredentials);
    }

    let token = uuid::Uuid::new_v4().simple().to_string();
    let expires_at = (Utc::now() + ttl).to_rfc3339();
    conn.execute(
        "INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
        params![token, user_id, expires_at],
    )?;

    let user = crate::get_user(conn, &user_id)?;
    Ok(Session {
        token,
        expires_at,
        user,
    })
}

/// Resolves a bearer token to its user. Expired sessions are deleted.
pub fn resolve_session(conn: &Connection, token: &str) -> Result<User, AccountError> {
    let (user_id, expires_at): (String, String) = conn
        .query_row(
            "SELECT user_id, expires_at FROM sessions WHERE token = ?1",
            [token],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?
        .ok_or(AccountError::SessionNotFound)?;

    let expired = DateTime::parse_from_rfc3339(&expires_at)
        .map(|at| at.with_timezone(&Utc) <= Utc::now())
        .unwrap_or(true);
    if expired {
        conn.execute("DELETE FROM sessions WHERE token = ?1", [token])?;
        return Err(AccountError::SessionNotFound);
    }

    conn.query_row(
        "SELECT id, email, name, phone, created_at FROM users WHERE id = ?1",
        [&user_id],
        map_row_to_user,
    )
    .optional()?
    .ok_or(AccountError::SessionNotFound)
}

/// Deletes a session. Signing out twice is not an error.
pub fn sign_out(conn: &Connection, token: &str) -> Result<(), AccountError> {
    conn.execute("DELETE FROM sessions WHERE token = ?1", [token])?;
    Ok(())
}
