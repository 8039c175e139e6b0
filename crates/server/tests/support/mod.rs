#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;
use tower_http::cors::CorsLayer;

use server::auth::ServerState;
use server::routes;
use service::auth::AuthConfig;

pub const ADMIN_EMAIL: &str = "admin@fixit.test";
pub const ADMIN_PASSWORD: &str = "admin-pass";
pub const PASSWORD: &str = "secret1";

pub fn auth_config(secret: Option<&str>) -> AuthConfig {
    AuthConfig { jwt_secret: secret.map(str::to_string), token_ttl_secs: 3600 }
}

/// Router over a fresh in-memory database with a seeded admin account.
pub async fn app_with(cfg: AuthConfig) -> anyhow::Result<Router> {
    let db = models::db::connect_ephemeral().await?;
    let state = ServerState::new(db, cfg);
    state.auth.ensure_admin(ADMIN_EMAIL, ADMIN_PASSWORD).await?;
    Ok(routes::build_router(state, CorsLayer::very_permissive()))
}

pub async fn app() -> anyhow::Result<Router> {
    app_with(auth_config(Some("test-secret"))).await
}

pub struct Reply {
    pub status: StatusCode,
    pub set_cookie: Option<String>,
    pub body: Value,
}

pub async fn send(app: &Router, req: Request<Body>) -> anyhow::Result<Reply> {
    let resp = app.clone().oneshot(req).await?;
    let status = resp.status();
    let set_cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
    Ok(Reply { status, set_cookie, body })
}

pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: &Value,
) -> anyhow::Result<Request<Body>> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    Ok(builder.body(Body::from(serde_json::to_vec(body)?))?)
}

pub fn get(uri: &str, token: Option<&str>) -> anyhow::Result<Request<Body>> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    Ok(builder.body(Body::empty())?)
}

/// Status of a GET request.
pub async fn get_status(
    app: &Router,
    uri: &str,
    token: Option<&str>,
) -> anyhow::Result<StatusCode> {
    Ok(send(app, get(uri, token)?).await?.status)
}

/// A booking request for an arbitrary technician on Monday 2024-06-03.
pub fn booking_body(technician_id: impl serde::Serialize) -> Value {
    serde_json::json!({
        "technicianId": technician_id,
        "service": "Plumbing",
        "bookingDate": "2024-06-03",
        "bookingTime": "10:00",
    })
}

/// Register and return `(token, user_id)`.
pub async fn register(
    app: &Router,
    name: &str,
    email: &str,
    role: &str,
) -> anyhow::Result<(String, String)> {
    let body =
        serde_json::json!({ "name": name, "email": email, "password": PASSWORD, "role": role });
    let reply = send(app, json_request("POST", "/api/auth/register", None, &body)?).await?;
    let ok = reply.status == StatusCode::OK;
    anyhow::ensure!(ok, "register {email}: {} {}", reply.status, reply.body);
    let token = reply.body["token"].as_str().unwrap_or_default().to_string();
    let user_id = reply.body["userId"].as_str().unwrap_or_default().to_string();
    Ok((token, user_id))
}

pub async fn login(app: &Router, email: &str, password: &str) -> anyhow::Result<Reply> {
    let body = serde_json::json!({ "email": email, "password": password });
    send(app, json_request("POST", "/api/auth/login", None, &body)?).await
}
