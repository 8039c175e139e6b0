use axum::{extract::{rejection::JsonRejection, State}, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use service::auth::domain::{AuthSession, LoginInput, RegisterInput};

use crate::auth::{ServerState, AUTH_COOKIE};
use crate::errors::ApiError;

fn with_session_cookie(jar: CookieJar, session: &AuthSession) -> CookieJar {
    match &session.token {
        Some(token) => {
            let mut cookie = Cookie::new(AUTH_COOKIE, token.clone());
            cookie.set_path("/");
            cookie.set_http_only(true);
            cookie.set_secure(false);
            cookie.set_same_site(SameSite::Lax);
            jar.add(cookie)
        }
        None => jar,
    }
}

#[utoipa::path(post, path = "/api/auth/register", tag = "auth",
    request_body = crate::openapi::RegisterRequest,
    responses(
        (status = 200, description = "Registered", body = crate::openapi::SessionResponse),
        (status = 400, description = "Validation failed or email taken"),
    ))]
pub async fn register(
    State(state): State<ServerState>,
    jar: CookieJar,
    payload: Result<Json<RegisterInput>, JsonRejection>,
) -> Result<(CookieJar, Json<AuthSession>), ApiError> {
    let Json(input) = payload?;
    let session = state.auth.register(input).await?;
    Ok((with_session_cookie(jar, &session), Json(session)))
}

#[utoipa::path(post, path = "/api/auth/login", tag = "auth",
    request_body = crate::openapi::LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = crate::openapi::SessionResponse),
        (status = 401, description = "Invalid credentials"),
    ))]
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> Result<(CookieJar, Json<AuthSession>), ApiError> {
    let Json(input) = payload?;
    let session = state.auth.login(input).await?;
    Ok((with_session_cookie(jar, &session), Json(session)))
}

#[utoipa::path(post, path = "/api/auth/logout", tag = "auth",
    responses((status = 204, description = "Cookie cleared")))]
pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    // an expired cookie is sent whether or not the request carried one
    let mut expired = Cookie::build((AUTH_COOKIE, "")).path("/").http_only(true).build();
    expired.make_removal();
    (jar.add(expired), StatusCode::NO_CONTENT)
}
