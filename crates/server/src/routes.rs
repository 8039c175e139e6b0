use axum::{
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{TraceLayer, DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, DefaultOnFailure},
};
use tracing::Level;
use utoipa::OpenApi;
use uuid::Uuid;

use common::types::Health;
use models::user::Role;

use crate::auth::{require_auth, require_capability, Capability, ServerState};
use crate::errors::ApiError;
use crate::openapi::ApiDoc;

pub mod admin;
pub mod auth;
pub mod bookings;
pub mod profile;
pub mod reviews;
pub mod technicians;

const CUSTOMER_OR_TECHNICIAN: &[Role] = &[Role::User, Role::Technician];
const TECHNICIAN_OR_ADMIN: &[Role] = &[Role::Technician, Role::Admin];

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "OK", body = crate::openapi::HealthResponse))
)]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Ids that do not parse are reported as a missing entity.
pub(crate) fn parse_id(raw: &str, entity: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::NotFound(format!("{entity} not found")))
}

/// Auth gate first, then the role check for `cap`.
fn guarded(
    router: Router<ServerState>,
    cap: Capability,
    state: &ServerState,
) -> Router<ServerState> {
    router
        .route_layer(middleware::from_fn_with_state(cap, require_capability))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

/// Build the full application router, including public, protected, and admin routes
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/technicians", get(technicians::list))
        .route("/technicians/search", get(technicians::search))
        .route("/technicians/:id", get(technicians::get_one))
        .route("/reviews/:technician_id", get(reviews::list));

    let any_caller = guarded(
        Router::new().route("/profile/me", get(profile::me)),
        Capability::Authenticated,
        &state,
    );

    let customers = guarded(
        Router::new()
            .route("/bookings", post(bookings::create))
            .route("/reviews", post(reviews::create)),
        Capability::Only(Role::User),
        &state,
    );

    let booking_parties = guarded(
        Router::new().route("/bookings/me", get(bookings::mine)),
        Capability::AnyOf(CUSTOMER_OR_TECHNICIAN),
        &state,
    );

    let booking_staff = guarded(
        Router::new().route("/bookings/:id/status", put(bookings::update_status)),
        Capability::AnyOf(TECHNICIAN_OR_ADMIN),
        &state,
    );

    let technicians_only = guarded(
        Router::new()
            .route("/profile/technician/me", get(profile::technician_me))
            .route("/profile/technician", post(profile::upsert_technician)),
        Capability::Only(Role::Technician),
        &state,
    );

    let admin_routes = guarded(
        Router::new()
            .route("/admin/unverified-technicians", get(admin::unverified_technicians))
            .route("/admin/all-technicians", get(admin::all_technicians))
            .route("/admin/users", get(admin::users))
            .route("/admin/technicians/:id/verify", put(admin::verify))
            .route("/admin/technicians/:id/disapprove", put(admin::disapprove))
            .route("/admin/technicians/:id", delete(admin::delete_technician))
            .route("/admin/users/:id/role", put(admin::change_role))
            .route("/admin/users/:id", delete(admin::delete_user)),
        Capability::Only(Role::Admin),
        &state,
    );

    let api = public
        .merge(any_caller)
        .merge(customers)
        .merge(booking_parties)
        .merge(booking_staff)
        .merge(technicians_only)
        .merge(admin_routes);

    Router::new()
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest("/api", api)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::INFO),
                )
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                )
        )
}
