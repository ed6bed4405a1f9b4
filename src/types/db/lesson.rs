use sea_orm::entity::prelude::*;

use crate::types::internal::lesson::LessonStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "lessons")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub teacher_id: i32,
    pub student_id: i32,
    pub created_by: Option<i32>,
    pub scheduled_at: i64,
    pub duration_minutes: i32,
    pub instrument: Option<String>,
    pub lesson_type: String,
    pub status: String,
    pub notes: Option<String>,
    pub instructor_notes: Option<String>,
    pub admin_notes: Option<String>,
    pub cost: Option<f64>,
    pub location: Option<String>,
    pub room_number: Option<String>,
    pub materials_needed: Option<String>,
    pub homework_assigned: Option<String>,
    pub progress_notes: Option<String>,
    pub created_at: i64,
    pub updated_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::TeacherId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Teacher,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Student,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn status(&self) -> LessonStatus {
        self.status.parse().unwrap_or(LessonStatus::Scheduled)
    }

    pub fn involves(&self, user_id: i32) -> bool {
        self.teacher_id == user_id || self.student_id == user_id
    }
}
