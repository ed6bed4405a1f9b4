use std::sync::Arc;

use sea_orm::ConnectionTrait;

use crate::errors::InternalError;
use crate::errors::internal::LessonError;
use crate::stores::{LessonStore, UserStore};
use crate::types::db::lesson;
use crate::types::internal::lesson::LessonStatus;
use crate::types::internal::lesson_query::{LessonChanges, NewLesson};

/// Lesson rules: participant validity, the lifecycle state machine and the
/// double-booking check
///
/// The conflict check is a read followed by a write in the caller's
/// transaction. Two concurrent bookings of the same slot can both pass it.
pub struct LessonProvider {
    lesson_store: Arc<LessonStore>,
    user_store: Arc<UserStore>,
}

impl LessonProvider {
    pub fn new(lesson_store: Arc<LessonStore>, user_store: Arc<UserStore>) -> Self {
        Self {
            lesson_store,
            user_store,
        }
    }

    /// The teacher must hold instructor capability and the student must be a student
    pub async fn validate_participants(
        &self,
        conn: &impl ConnectionTrait,
        teacher_id: i32,
        student_id: i32,
    ) -> Result<(), InternalError> {
        let teacher = self.user_store.find_by_id(conn, teacher_id).await?;
        if !teacher.is_some_and(|t| t.role().can_teach()) {
            return Err(LessonError::InvalidTeacher(teacher_id).into());
        }

        let student = self.user_store.find_by_id(conn, student_id).await?;
        if !student.is_some_and(|s| s.role().can_attend()) {
            return Err(LessonError::InvalidStudent(student_id).into());
        }

        Ok(())
    }

    pub async fn ensure_slot_free(
        &self,
        conn: &impl ConnectionTrait,
        teacher_id: i32,
        scheduled_at: i64,
        exclude_id: Option<i32>,
    ) -> Result<(), InternalError> {
        if let Some(existing) = self
            .lesson_store
            .find_conflict(conn, teacher_id, scheduled_at, exclude_id)
            .await?
        {
            tracing::debug!(teacher_id, scheduled_at, conflicting_lesson = existing.id, "Slot already booked");
            return Err(LessonError::ScheduleConflict { teacher_id, scheduled_at }.into());
        }
        Ok(())
    }

    pub async fn create(&self, conn: &impl ConnectionTrait, new_lesson: NewLesson) -> Result<lesson::Model, InternalError> {
        self.validate_participants(conn, new_lesson.teacher_id, new_lesson.student_id)
            .await?;
        self.ensure_slot_free(conn, new_lesson.teacher_id, new_lesson.scheduled_at, None)
            .await?;

        self.lesson_store.insert(conn, new_lesson).await
    }

    /// Apply a partial update and, optionally, a status transition
    ///
    /// Changed participants are re-validated. A lesson that ends up
    /// `scheduled` at a new time or with a new teacher is re-checked for
    /// conflicts.
    pub async fn update(
        &self,
        conn: &impl ConnectionTrait,
        existing: lesson::Model,
        changes: LessonChanges,
        status: Option<LessonStatus>,
    ) -> Result<lesson::Model, InternalError> {
        let teacher_id = changes.teacher_id.unwrap_or(existing.teacher_id);
        let student_id = changes.student_id.unwrap_or(existing.student_id);
        if changes.touches_participants() {
            self.validate_participants(conn, teacher_id, student_id).await?;
        }

        let next_status = match status {
            Some(to) => Some(existing.status().transition(to)?),
            None => None,
        };

        let rebooked = changes.scheduled_at.is_some_and(|at| at != existing.scheduled_at)
            || teacher_id != existing.teacher_id;
        let stays_scheduled = next_status.unwrap_or(existing.status()) == LessonStatus::Scheduled;
        if rebooked && stays_scheduled {
            let scheduled_at = changes.scheduled_at.unwrap_or(existing.scheduled_at);
            self.ensure_slot_free(conn, teacher_id, scheduled_at, Some(existing.id))
                .await?;
        }

        self.lesson_store.update(conn, existing, changes, next_status).await
    }

    /// Move a lesson out of `scheduled`
    pub async fn transition(
        &self,
        conn: &impl ConnectionTrait,
        existing: lesson::Model,
        to: LessonStatus,
        changes: LessonChanges,
    ) -> Result<lesson::Model, InternalError> {
        let next = existing.status().transition(to)?;
        self.lesson_store.update(conn, existing, changes, Some(next)).await
    }

    /// Move a scheduled lesson to a new time; it stays `scheduled`
    pub async fn reschedule(
        &self,
        conn: &impl ConnectionTrait,
        existing: lesson::Model,
        scheduled_at: i64,
    ) -> Result<lesson::Model, InternalError> {
        existing.status().ensure_movable()?;
        self.ensure_slot_free(conn, existing.teacher_id, scheduled_at, Some(existing.id))
            .await?;

        let changes = LessonChanges {
            scheduled_at: Some(scheduled_at),
            ..Default::default()
        };
        self.lesson_store.update(conn, existing, changes, None).await
    }
}
