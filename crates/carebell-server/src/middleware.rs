use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use carebell_types::User;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::AppState;

const WINDOW: Duration = Duration::from_secs(60);

/// The authenticated user of a request, stored in request extensions.
#[derive(Clone, Debug)]
pub struct UserContext {
    pub user: User,
    /// The bearer token that authenticated the request.
    pub token: String,
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": "unauthorized" })),
    )
        .into_response()
}

fn bearer_token(req: &Request<Body>) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Resolves `Authorization: Bearer <session token>` to a [`UserContext`].
///
/// Unknown, expired and malformed tokens are all rejected with 401.
pub async fn auth_middleware(mut req: Request<Body>, next: Next) -> Response {
    let Some(token) = bearer_token(&req) else {
        return unauthorized();
    };

    let Some(state) = req.extensions().get::<Arc<AppState>>().cloned() else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    let lookup_token = token.clone();
    let resolved = tokio::task::spawn_blocking(move || {
        let conn = state.pool.get().map_err(|e| {
            tracing::error!(error = %e, "database pool unavailable during authentication");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
        carebell_accounts::resolve_session(&conn, &lookup_token).map_err(|e| match e {
            carebell_accounts::AccountError::Database(e) => {
                tracing::error!(error = %e, "session lookup failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::UNAUTHORIZED,
        })
    })
    .await;

    let user = match resolved {
        Ok(Ok(user)) => user,
        Ok(Err(status)) if status == StatusCode::UNAUTHORIZED => return unauthorized(),
        Ok(Err(status)) => return status.into_response(),
        Err(e) => {
            tracing::error!(error = %e, "authentication task failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    req.extensions_mut().insert(UserContext { user, token });
    next.run(req).await
}

/// In-memory fixed-window request counter keyed by client IP.
#[derive(Clone, Debug, Default)]
pub struct RateLimiter {
    state: Arc<Mutex<HashMap<IpAddr, (u32, Instant)>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one request from `ip`. Returns `false` once `limit` requests
    /// have been seen in the current window.
    pub fn check(&self, ip: IpAddr, limit: u32) -> bool {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("rate limiter lock poisoned, recovering with stale state");
                poisoned.into_inner()
            }
        };
        let now = Instant::now();

        // Evict expired windows only; live ones keep counting.
        if state.len() > 10_000 {
            state.retain(|_, (_, start)| now.duration_since(*start) <= WINDOW);
        }

        let (count, start) = state.entry(ip).or_insert((0, now));
        if now.duration_since(*start) > WINDOW {
            *count = 1;
            *start = now;
            true
        } else {
            *count += 1;
            *count <= limit
        }
    }
}

/// Rejects clients that exceed the per-minute request budget with 429.
pub async fn rate_limit_middleware(req: Request<Body>, next: Next) -> Response {
    let Some(state) = req.extensions().get::<Arc<AppState>>().cloned() else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    // The server is always started with connect info; a missing one is a
    // wiring error.
    let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>().copied() else {
        tracing::error!("request without connect info, cannot rate limit");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    if !state
        .rate_limiter
        .check(addr.ip(), state.rate_limit_per_minute)
    {
        tracing::warn!(ip = %addr.ip(), path = req.uri().path(), "rate limit exceeded");
        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({ "error": "Rate limit exceeded. Please try again later." })),
        )
            .into_response();
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from_static("60"));
        return response;
    }

    next.run(req).await
}
