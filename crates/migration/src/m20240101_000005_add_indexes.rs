use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// At most one pending/confirmed booking per (technician, date, time).
/// Written as raw SQL because the WHERE clause makes it a partial index,
/// which both Postgres and SQLite accept verbatim.
const UNIQ_ACTIVE_SLOT: &str = "CREATE UNIQUE INDEX IF NOT EXISTS uniq_booking_active_slot \
     ON booking (technician_id, booking_date, booking_time) \
     WHERE status IN ('pending', 'confirmed')";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Technician: one profile per user
        manager
            .create_index(
                Index::create()
                    .name("uniq_technician_user")
                    .table(Technician::Table)
                    .col(Technician::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Review: one review per (technician, user)
        manager
            .create_index(
                Index::create()
                    .name("uniq_review_technician_user")
                    .table(Review::Table)
                    .col(Review::TechnicianId)
                    .col(Review::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_review_user")
                    .table(Review::Table)
                    .col(Review::UserId)
                    .to_owned(),
            )
            .await?;

        // Booking: lookups by either side
        manager
            .create_index(
                Index::create()
                    .name("idx_booking_user")
                    .table(Booking::Table)
                    .col(Booking::UserId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_booking_technician")
                    .table(Booking::Table)
                    .col(Booking::TechnicianId)
                    .to_owned(),
            )
            .await?;

        manager.get_connection().execute_unprepared(UNIQ_ACTIVE_SLOT).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop().name("uniq_booking_active_slot").table(Booking::Table).to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop().name("idx_booking_technician").table(Booking::Table).to_owned(),
            )
            .await?;
        manager
            .drop_index(Index::drop().name("idx_booking_user").table(Booking::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_review_user").table(Review::Table).to_owned())
            .await?;
        manager
            .drop_index(
                Index::drop().name("uniq_review_technician_user").table(Review::Table).to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop().name("uniq_technician_user").table(Technician::Table).to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Technician { Table, UserId }

#[derive(DeriveIden)]
enum Review { Table, TechnicianId, UserId }

#[derive(DeriveIden)]
enum Booking { Table, UserId, TechnicianId }
