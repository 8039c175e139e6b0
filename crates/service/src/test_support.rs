#![cfg(test)]
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;

use models::booking::{self, NewBooking};
use models::technician;
use models::user::{self, NewUser, Role};

/// Fresh migrated in-memory database per test, so tests never share state.
pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    models::db::connect_ephemeral().await
}

pub async fn seed_user(db: &DatabaseConnection, email: &str, role: Role) -> user::Model {
    user::create(db, NewUser {
        name: email.split('@').next().unwrap_or("user").to_string(),
        email: email.to_string(),
        password_hash: crate::auth::service::hash_password("secret1").expect("hash"),
        role,
        location: None,
    })
    .await
    .expect("seed user")
}

/// Technician account plus placeholder profile (Monday to Friday).
pub async fn seed_technician(
    db: &DatabaseConnection,
    email: &str,
    verified: bool,
) -> technician::Model {
    let owner = seed_user(db, email, Role::Technician).await;
    let t = technician::create_placeholder(db, owner.id).await.expect("seed technician");
    if verified { technician::set_verified(db, t, true).await.expect("verify") } else { t }
}

/// 2024-06-03 is a Monday.
pub fn monday() -> NaiveDate { NaiveDate::from_ymd_opt(2024, 6, 3).expect("date") }

pub async fn seed_booking(
    db: &DatabaseConnection,
    user_id: uuid::Uuid,
    technician_id: uuid::Uuid,
    time: &str,
    status: booking::BookingStatus,
) -> booking::Model {
    let b = booking::create(db, NewBooking {
        user_id,
        technician_id,
        service: "Other".into(),
        booking_date: monday(),
        booking_time: time.into(),
        total_price: 0.0,
        notes: None,
    })
    .await
    .expect("seed booking");
    if status == booking::BookingStatus::Pending {
        return b;
    }
    booking::set_status(db, b, status).await.expect("status")
}
