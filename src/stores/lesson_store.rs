use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, QueryTrait, Set,
};

use crate::errors::InternalError;
use crate::errors::internal::LessonError;
use crate::types::db::lesson;
use crate::types::internal::lesson::LessonStatus;
use crate::types::internal::lesson_query::{LessonChanges, LessonFilter, NewLesson, SortOrder};

/// Persistence for `lessons`
#[derive(Debug, Default)]
pub struct LessonStore;

impl LessonStore {
    pub fn new() -> Self {
        Self
    }

    pub async fn find_by_id(&self, conn: &impl ConnectionTrait, id: i32) -> Result<Option<lesson::Model>, InternalError> {
        lesson::Entity::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_lesson_by_id", e))
    }

    pub async fn get_by_id(&self, conn: &impl ConnectionTrait, id: i32) -> Result<lesson::Model, InternalError> {
        self.find_by_id(conn, id)
            .await?
            .ok_or_else(|| LessonError::NotFound(id).into())
    }

    /// New lessons always start as `scheduled`
    pub async fn insert(&self, conn: &impl ConnectionTrait, new_lesson: NewLesson) -> Result<lesson::Model, InternalError> {
        let model = lesson::ActiveModel {
            title: Set(new_lesson.title),
            description: Set(new_lesson.description),
            teacher_id: Set(new_lesson.teacher_id),
            student_id: Set(new_lesson.student_id),
            created_by: Set(new_lesson.created_by),
            scheduled_at: Set(new_lesson.scheduled_at),
            duration_minutes: Set(new_lesson.duration_minutes),
            instrument: Set(new_lesson.instrument),
            lesson_type: Set(new_lesson.lesson_type),
            status: Set(LessonStatus::Scheduled.as_str().to_string()),
            notes: Set(None),
            instructor_notes: Set(None),
            admin_notes: Set(None),
            cost: Set(new_lesson.cost),
            location: Set(new_lesson.location),
            room_number: Set(new_lesson.room_number),
            materials_needed: Set(new_lesson.materials_needed),
            homework_assigned: Set(None),
            progress_notes: Set(None),
            created_at: Set(Utc::now().timestamp()),
            updated_at: Set(None),
            ..Default::default()
        };

        model
            .insert(conn)
            .await
            .map_err(|e| InternalError::database("insert_lesson", e))
    }

    /// Apply column changes and, when given, a status already validated by
    /// [`LessonStatus::transition`]
    pub async fn update(
        &self,
        conn: &impl ConnectionTrait,
        existing: lesson::Model,
        changes: LessonChanges,
        status: Option<LessonStatus>,
    ) -> Result<lesson::Model, InternalError> {
        let mut model: lesson::ActiveModel = existing.into();

        if let Some(title) = changes.title {
            model.title = Set(title);
        }
        if let Some(teacher_id) = changes.teacher_id {
            model.teacher_id = Set(teacher_id);
        }
        if let Some(student_id) = changes.student_id {
            model.student_id = Set(student_id);
        }
        if let Some(scheduled_at) = changes.scheduled_at {
            model.scheduled_at = Set(scheduled_at);
        }
        if let Some(duration) = changes.duration_minutes {
            model.duration_minutes = Set(duration);
        }
        if let Some(lesson_type) = changes.lesson_type {
            model.lesson_type = Set(lesson_type);
        }
        if changes.description.is_some() {
            model.description = Set(changes.description);
        }
        if changes.instrument.is_some() {
            model.instrument = Set(changes.instrument);
        }
        if changes.notes.is_some() {
            model.notes = Set(changes.notes);
        }
        if changes.instructor_notes.is_some() {
            model.instructor_notes = Set(changes.instructor_notes);
        }
        if changes.admin_notes.is_some() {
            model.admin_notes = Set(changes.admin_notes);
        }
        if changes.cost.is_some() {
            model.cost = Set(changes.cost);
        }
        if changes.location.is_some() {
            model.location = Set(changes.location);
        }
        if changes.room_number.is_some() {
            model.room_number = Set(changes.room_number);
        }
        if changes.materials_needed.is_some() {
            model.materials_needed = Set(changes.materials_needed);
        }
        if changes.homework_assigned.is_some() {
            model.homework_assigned = Set(changes.homework_assigned);
        }
        if changes.progress_notes.is_some() {
            model.progress_notes = Set(changes.progress_notes);
        }
        if let Some(status) = status {
            model.status = Set(status.as_str().to_string());
        }
        model.updated_at = Set(Some(Utc::now().timestamp()));

        model
            .update(conn)
            .await
            .map_err(|e| InternalError::database("update_lesson", e))
    }

    pub async fn delete(&self, conn: &impl ConnectionTrait, id: i32) -> Result<bool, InternalError> {
        let result = lesson::Entity::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("delete_lesson", e))?;
        Ok(result.rows_affected > 0)
    }

    fn filtered(filter: &LessonFilter) -> sea_orm::Select<lesson::Entity> {
        lesson::Entity::find()
            .apply_if(filter.teacher_id, |q, id| q.filter(lesson::Column::TeacherId.eq(id)))
            .apply_if(filter.student_id, |q, id| q.filter(lesson::Column::StudentId.eq(id)))
            .apply_if(filter.participant_id, |q, id| {
                q.filter(
                    Condition::any()
                        .add(lesson::Column::TeacherId.eq(id))
                        .add(lesson::Column::StudentId.eq(id)),
                )
            })
            .apply_if(filter.status, |q, status| q.filter(lesson::Column::Status.eq(status.as_str())))
            .apply_if(filter.from, |q, from| q.filter(lesson::Column::ScheduledAt.gte(from)))
            .apply_if(filter.to, |q, to| q.filter(lesson::Column::ScheduledAt.lte(to)))
            .apply_if(filter.after, |q, after| q.filter(lesson::Column::ScheduledAt.gt(after)))
    }

    pub async fn list(&self, conn: &impl ConnectionTrait, filter: &LessonFilter) -> Result<Vec<lesson::Model>, InternalError> {
        let query = Self::filtered(filter);
        let query = match filter.order {
            SortOrder::Ascending => query.order_by_asc(lesson::Column::ScheduledAt),
            SortOrder::Descending => query.order_by_desc(lesson::Column::ScheduledAt),
        };

        query
            .order_by_asc(lesson::Column::Id)
            .offset(filter.skip)
            .limit(filter.limit)
            .all(conn)
            .await
            .map_err(|e| InternalError::database("list_lessons", e))
    }

    pub async fn count(&self, conn: &impl ConnectionTrait, filter: &LessonFilter) -> Result<u64, InternalError> {
        Self::filtered(filter)
            .count(conn)
            .await
            .map_err(|e| InternalError::database("count_lessons", e))
    }

    /// Another scheduled lesson of the same teacher at exactly `scheduled_at`
    pub async fn find_conflict(
        &self,
        conn: &impl ConnectionTrait,
        teacher_id: i32,
        scheduled_at: i64,
        exclude_id: Option<i32>,
    ) -> Result<Option<lesson::Model>, InternalError> {
        lesson::Entity::find()
            .filter(lesson::Column::TeacherId.eq(teacher_id))
            .filter(lesson::Column::ScheduledAt.eq(scheduled_at))
            .filter(lesson::Column::Status.eq(LessonStatus::Scheduled.as_str()))
            .apply_if(exclude_id, |q, id| q.filter(lesson::Column::Id.ne(id)))
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_schedule_conflict", e))
    }

    /// Distinct ids of the students a teacher has lessons with
    pub async fn student_ids_for_teacher(&self, conn: &impl ConnectionTrait, teacher_id: i32) -> Result<Vec<i32>, InternalError> {
        lesson::Entity::find()
            .select_only()
            .column(lesson::Column::StudentId)
            .distinct()
            .filter(lesson::Column::TeacherId.eq(teacher_id))
            .into_tuple::<i32>()
            .all(conn)
            .await
            .map_err(|e| InternalError::database("student_ids_for_teacher", e))
    }
}
