//! Create `technician` table with FK to `user`.
//!
//! List-valued fields are JSON arrays. `average_rating` and `review_count`
//! are a cache over `review` rows.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Technician::Table)
                    .if_not_exists()
                    .col(uuid(Technician::Id).primary_key())
                    .col(uuid(Technician::UserId))
                    .col(json(Technician::ServicesOffered))
                    .col(json(Technician::Specializations))
                    .col(string_len(Technician::ContactNumber, 32))
                    .col(string_len(Technician::Location, 255))
                    .col(json(Technician::ServiceAreas))
                    .col(string_len_null(Technician::Description, 500))
                    .col(double(Technician::AverageRating).default(0.0))
                    .col(integer(Technician::ReviewCount).default(0))
                    .col(json(Technician::Availability))
                    .col(boolean(Technician::IsAvailable).default(true))
                    .col(boolean(Technician::IsVerifiedByAdmin).default(false))
                    .col(timestamp_with_time_zone(Technician::CreatedAt))
                    .col(timestamp_with_time_zone(Technician::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_technician_user")
                            .from(Technician::Table, Technician::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Technician::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Technician {
    Table,
    Id,
    UserId,
    ServicesOffered,
    Specializations,
    ContactNumber,
    Location,
    ServiceAreas,
    Description,
    AverageRating,
    ReviewCount,
    Availability,
    IsAvailable,
    IsVerifiedByAdmin,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum User { Table, Id }
