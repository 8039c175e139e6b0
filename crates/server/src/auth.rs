//! Request authentication (token gate) and per-route role guard.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use sea_orm::DatabaseConnection;
use tracing::{debug, warn};

use models::user::Role;
use service::auth::{AuthConfig, AuthService, Principal};
use service::auth::repo::SeaOrmAuthRepository;

use crate::errors::ApiError;

pub const AUTH_COOKIE: &str = "auth_token";
pub const LEGACY_TOKEN_HEADER: &str = "x-auth-token";

#[derive(Clone)]
pub struct ServerState {
    pub db: DatabaseConnection,
    pub auth: Arc<AuthService<SeaOrmAuthRepository>>,
}

impl ServerState {
    pub fn new(db: DatabaseConnection, cfg: AuthConfig) -> Self {
        let repo = Arc::new(SeaOrmAuthRepository::new(db.clone()));
        Self { db, auth: Arc::new(AuthService::new(repo, cfg)) }
    }
}

/// `Authorization: Bearer`, then `x-auth-token`, then the `auth_token` cookie.
pub fn extract_token(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    if let Some(authz) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        return match authz.strip_prefix("Bearer ") {
            Some(t) if !t.trim().is_empty() => Ok(Some(t.trim().to_string())),
            _ => Err(ApiError::Unauthenticated(
                "invalid Authorization format (expect Bearer)".into(),
            )),
        };
    }
    if let Some(t) = headers.get(LEGACY_TOKEN_HEADER).and_then(|v| v.to_str().ok()) {
        if !t.trim().is_empty() { return Ok(Some(t.trim().to_string())); }
    }
    let jar = CookieJar::from_headers(headers);
    Ok(jar.get(AUTH_COOKIE).map(|c| c.value().to_string()).filter(|v| !v.is_empty()))
}

/// Verify the caller's token, confirm the account still exists and attach the
/// [`Principal`] to the request.
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = req.uri().path().to_string();
    let Some(token) = extract_token(req.headers())? else {
        debug!(path = %path, "missing token");
        return Err(ApiError::Unauthenticated("no token, authorization denied".into()));
    };
    let principal = state.auth.authenticate(&token).await.map_err(|e| {
        warn!(path = %path, error = %e, "token validation failed");
        ApiError::from(e)
    })?;
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

/// Role requirement declared per route group.
#[derive(Clone, Copy, Debug)]
pub enum Capability {
    Authenticated,
    Only(Role),
    AnyOf(&'static [Role]),
}

impl Capability {
    pub fn allows(&self, role: Role) -> bool {
        match self {
            Capability::Authenticated => true,
            Capability::Only(r) => *r == role,
            Capability::AnyOf(roles) => roles.contains(&role),
        }
    }
}

/// Runs after [`require_auth`]; rejects callers whose role the route does not allow.
pub async fn require_capability(
    State(cap): State<Capability>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(principal) = req.extensions().get::<Principal>().copied() else {
        return Err(ApiError::Unauthenticated("no token, authorization denied".into()));
    };
    if !cap.allows(principal.role) {
        debug!(user_id = %principal.id, role = %principal.role, required = ?cap, "role rejected");
        return Err(ApiError::Forbidden(format!("access denied for role {}", principal.role)));
    }
    Ok(next.run(req).await)
}
