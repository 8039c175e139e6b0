use serde::Serialize;
use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// `user` (default) or `technician`
    pub role: Option<String>,
    pub location: Option<String>,
}

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse { pub token: Option<String>, pub role: String, pub user_id: Uuid }

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequestDoc {
    pub technician_id: Uuid,
    pub service: String,
    /// `YYYY-MM-DD` or RFC 3339
    pub booking_date: String,
    pub booking_time: String,
    pub total_price: Option<f64>,
    pub notes: Option<String>,
}

#[derive(ToSchema)]
pub struct StatusUpdateDoc {
    /// pending | confirmed | completed | cancelled
    pub status: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequestDoc {
    pub technician_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateDoc {
    /// array or comma-separated string
    pub services_offered: Option<Vec<String>>,
    pub specializations: Option<Vec<String>>,
    pub service_areas: Option<Vec<String>>,
    pub contact_number: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub availability: Option<Vec<String>>,
    pub is_available: Option<bool>,
}

#[derive(ToSchema)]
pub struct RoleChangeDoc {
    /// user | technician | admin
    pub role: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::technicians::list,
        crate::routes::technicians::search,
        crate::routes::technicians::get_one,
        crate::routes::bookings::create,
        crate::routes::bookings::mine,
        crate::routes::bookings::update_status,
        crate::routes::reviews::create,
        crate::routes::reviews::list,
        crate::routes::profile::me,
        crate::routes::profile::technician_me,
        crate::routes::profile::upsert_technician,
        crate::routes::admin::unverified_technicians,
        crate::routes::admin::all_technicians,
        crate::routes::admin::users,
        crate::routes::admin::verify,
        crate::routes::admin::disapprove,
        crate::routes::admin::change_role,
        crate::routes::admin::delete_technician,
        crate::routes::admin::delete_user,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            SessionResponse,
            BookingRequestDoc,
            StatusUpdateDoc,
            ReviewRequestDoc,
            ProfileUpdateDoc,
            RoleChangeDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "technicians"),
        (name = "bookings"),
        (name = "reviews"),
        (name = "profile"),
        (name = "admin")
    )
)]
pub struct ApiDoc;
