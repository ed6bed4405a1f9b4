use sea_orm_migration::prelude::*;

use crate::m20250301_000001_create_users_table::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Lessons::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Lessons::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Lessons::Title).string().not_null())
                    .col(ColumnDef::new(Lessons::Description).text())
                    .col(ColumnDef::new(Lessons::TeacherId).integer().not_null())
                    .col(ColumnDef::new(Lessons::StudentId).integer().not_null())
                    .col(ColumnDef::new(Lessons::CreatedBy).integer())
                    .col(ColumnDef::new(Lessons::ScheduledAt).big_integer().not_null())
                    .col(ColumnDef::new(Lessons::DurationMinutes).integer().not_null().default(60))
                    .col(ColumnDef::new(Lessons::Instrument).string())
                    .col(ColumnDef::new(Lessons::LessonType).string().not_null().default("individual"))
                    .col(ColumnDef::new(Lessons::Status).string().not_null().default("scheduled"))
                    .col(ColumnDef::new(Lessons::Notes).text())
                    .col(ColumnDef::new(Lessons::InstructorNotes).text())
                    .col(ColumnDef::new(Lessons::AdminNotes).text())
                    .col(ColumnDef::new(Lessons::Cost).double())
                    .col(ColumnDef::new(Lessons::Location).string())
                    .col(ColumnDef::new(Lessons::RoomNumber).string())
                    .col(ColumnDef::new(Lessons::MaterialsNeeded).text())
                    .col(ColumnDef::new(Lessons::HomeworkAssigned).text())
                    .col(ColumnDef::new(Lessons::ProgressNotes).text())
                    .col(ColumnDef::new(Lessons::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Lessons::UpdatedAt).big_integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_lessons_teacher_id")
                            .from(Lessons::Table, Lessons::TeacherId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_lessons_student_id")
                            .from(Lessons::Table, Lessons::StudentId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            ("idx_lessons_teacher_id", Lessons::TeacherId),
            ("idx_lessons_student_id", Lessons::StudentId),
            ("idx_lessons_scheduled_at", Lessons::ScheduledAt),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Lessons::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Lessons::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Lessons {
    Table,
    Id,
    Title,
    Description,
    TeacherId,
    StudentId,
    CreatedBy,
    ScheduledAt,
    DurationMinutes,
    Instrument,
    LessonType,
    Status,
    Notes,
    InstructorNotes,
    AdminNotes,
    Cost,
    Location,
    RoomNumber,
    MaterialsNeeded,
    HomeworkAssigned,
    ProgressNotes,
    CreatedAt,
    UpdatedAt,
}
