use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::app_data::AppData;
use crate::audit::AuditLogger;
use crate::config::DatabaseConnections;
use crate::errors::InternalError;
use crate::errors::internal::AccessError;
use crate::providers::{GuardProvider, LessonProvider, Notification, NotificationProvider};
use crate::stores::LessonStore;
use crate::types::db::lesson;
use crate::types::dto::lesson::{LessonCreateRequest, LessonUpdateRequest};
use crate::types::internal::audit::{AuditAction, ResourceType};
use crate::types::internal::auth::Principal;
use crate::types::internal::context::RequestContext;
use crate::types::internal::lesson::LessonStatus;
use crate::types::internal::lesson_query::{LessonChanges, LessonFilter};
use crate::types::internal::role::Guard;

/// Lesson endpoints open to every role, with per-lesson visibility rules
pub struct LessonCoordinator {
    connections: DatabaseConnections,
    lesson_store: Arc<LessonStore>,
    lesson_provider: LessonProvider,
    guard_provider: GuardProvider,
    audit_logger: AuditLogger,
    notifier: NotificationProvider,
}

impl LessonCoordinator {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            connections: app_data.connections.clone(),
            lesson_store: app_data.lesson_store.clone(),
            lesson_provider: LessonProvider::new(app_data.lesson_store.clone(), app_data.user_store.clone()),
            guard_provider: GuardProvider::new(app_data.user_store.clone()),
            audit_logger: AuditLogger::new(app_data.audit_store.clone()),
            notifier: NotificationProvider::new(),
        }
    }

    /// The lesson's teacher, or any admin
    fn manages(principal: &Principal, lesson: &lesson::Model) -> bool {
        principal.role.is_admin() || lesson.teacher_id == principal.id()
    }

    fn can_see(principal: &Principal, lesson: &lesson::Model) -> bool {
        principal.role.is_admin() || lesson.involves(principal.id())
    }

    /// Instructors see the lessons they teach, admins see every lesson
    pub async fn list(&self, ctx: &RequestContext, skip: u64, limit: u64) -> Result<Vec<lesson::Model>, InternalError> {
        let conn = &self.connections.main;
        let principal = self.guard_provider.authorize(conn, ctx, Guard::TeacherOrAdmin).await?;

        let filter = if principal.role.is_admin() {
            LessonFilter::default()
        } else {
            LessonFilter::default().teacher(principal.id())
        };
        self.lesson_store.list(conn, &filter.page(skip, limit)).await
    }

    pub async fn create(&self, ctx: &RequestContext, request: LessonCreateRequest) -> Result<lesson::Model, InternalError> {
        let principal = self
            .guard_provider
            .authorize(&self.connections.main, ctx, Guard::TeacherOrAdmin)
            .await?;

        if !principal.role.is_admin() && request.teacher_id != principal.id() {
            return Err(AccessError::not_permitted("Cannot create lessons for other teachers").into());
        }

        let txn = self.connections.begin().await?;
        let lesson = self
            .lesson_provider
            .create(&txn, request.to_new_lesson(Some(principal.id())))
            .await?;
        self.audit_logger
            .log_staff_action(
                &txn,
                ctx,
                &principal,
                AuditAction::Create,
                ResourceType::Lesson,
                Some(lesson.id),
                format!("Lesson created: {}", lesson.title),
            )
            .await?;
        DatabaseConnections::commit(txn).await?;

        tracing::info!(request_id = %ctx.request_id, lesson_id = lesson.id, teacher_id = lesson.teacher_id, "Lesson booked");
        self.notifier.dispatch(Notification::LessonBooked {
            lesson_id: lesson.id,
            teacher_id: lesson.teacher_id,
            student_id: lesson.student_id,
            scheduled_at: lesson.scheduled_at,
        });

        Ok(lesson)
    }

    pub async fn get(&self, ctx: &RequestContext, lesson_id: i32) -> Result<lesson::Model, InternalError> {
        let conn = &self.connections.main;
        let principal = self.guard_provider.authenticate(conn, ctx).await?;

        let lesson = self.lesson_store.get_by_id(conn, lesson_id).await?;
        if !Self::can_see(&principal, &lesson) {
            return Err(AccessError::not_permitted("Not authorized to view this lesson").into());
        }
        Ok(lesson)
    }

    /// Participants and admins may edit; a student may only touch `notes`
    pub async fn update(
        &self,
        ctx: &RequestContext,
        lesson_id: i32,
        request: LessonUpdateRequest,
    ) -> Result<lesson::Model, InternalError> {
        let principal = self.guard_provider.authenticate(&self.connections.main, ctx).await?;
        let changes = request.changes();

        let txn = self.connections.begin().await?;
        let existing = self.lesson_store.get_by_id(&txn, lesson_id).await?;
        if !Self::can_see(&principal, &existing) {
            return Err(AccessError::not_permitted("Not authorized to update this lesson").into());
        }
        if !Self::manages(&principal, &existing) && (!changes.only_notes() || request.status.is_some()) {
            return Err(AccessError::not_permitted("Students can only update notes field").into());
        }

        let updated = self
            .lesson_provider
            .update(&txn, existing, changes, request.status)
            .await?;
        self.audit_logger
            .log_staff_action(
                &txn,
                ctx,
                &principal,
                AuditAction::Update,
                ResourceType::Lesson,
                Some(updated.id),
                format!("Lesson updated: {}", updated.title),
            )
            .await?;
        DatabaseConnections::commit(txn).await?;

        Ok(updated)
    }

    pub async fn delete(&self, ctx: &RequestContext, lesson_id: i32) -> Result<(), InternalError> {
        let principal = self.guard_provider.authenticate(&self.connections.main, ctx).await?;

        let txn = self.connections.begin().await?;
        let existing = self.lesson_store.get_by_id(&txn, lesson_id).await?;
        if !Self::manages(&principal, &existing) {
            return Err(AccessError::not_permitted("Only the teacher can delete this lesson").into());
        }

        self.lesson_store.delete(&txn, lesson_id).await?;
        self.audit_logger
            .log_staff_action(
                &txn,
                ctx,
                &principal,
                AuditAction::Delete,
                ResourceType::Lesson,
                Some(lesson_id),
                format!("Lesson deleted: {}", existing.title),
            )
            .await?;
        DatabaseConnections::commit(txn).await?;

        tracing::info!(request_id = %ctx.request_id, lesson_id, "Lesson deleted");
        Ok(())
    }

    /// All of a teacher's lessons for that teacher or an admin; a student
    /// only sees the ones they attend
    pub async fn by_teacher(
        &self,
        ctx: &RequestContext,
        teacher_id: i32,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<lesson::Model>, InternalError> {
        let conn = &self.connections.main;
        let principal = self.guard_provider.authenticate(conn, ctx).await?;

        let filter = LessonFilter::default().teacher(teacher_id);
        let filter = if principal.role.is_admin() || principal.id() == teacher_id {
            filter
        } else if principal.role.can_attend() {
            filter.student(principal.id())
        } else {
            return Err(AccessError::not_permitted("Not authorized to view lessons from this teacher").into());
        };

        self.lesson_store.list(conn, &filter.page(skip, limit)).await
    }

    pub async fn by_student(
        &self,
        ctx: &RequestContext,
        student_id: i32,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<lesson::Model>, InternalError> {
        let conn = &self.connections.main;
        let principal = self.guard_provider.authenticate(conn, ctx).await?;

        if principal.id() != student_id && !principal.is_staff() {
            return Err(AccessError::not_permitted("Not authorized to view lessons from this student").into());
        }

        let filter = LessonFilter::default().student(student_id).page(skip, limit);
        self.lesson_store.list(conn, &filter).await
    }

    pub async fn complete(&self, ctx: &RequestContext, lesson_id: i32) -> Result<lesson::Model, InternalError> {
        let principal = self.guard_provider.authenticate(&self.connections.main, ctx).await?;

        let txn = self.connections.begin().await?;
        let existing = self.lesson_store.get_by_id(&txn, lesson_id).await?;
        if !Self::manages(&principal, &existing) {
            return Err(AccessError::not_permitted("Only the teacher or an admin can complete this lesson").into());
        }

        let completed = self
            .lesson_provider
            .transition(&txn, existing, LessonStatus::Completed, LessonChanges::default())
            .await?;
        self.audit_logger
            .log_staff_action(
                &txn,
                ctx,
                &principal,
                AuditAction::Complete,
                ResourceType::Lesson,
                Some(completed.id),
                format!("Lesson completed: {}", completed.title),
            )
            .await?;
        DatabaseConnections::commit(txn).await?;

        Ok(completed)
    }

    /// Move a scheduled lesson; a clash with another scheduled lesson of
    /// the same teacher at the exact new time is rejected
    pub async fn reschedule(
        &self,
        ctx: &RequestContext,
        lesson_id: i32,
        scheduled_at: DateTime<Utc>,
    ) -> Result<lesson::Model, InternalError> {
        let principal = self.guard_provider.authenticate(&self.connections.main, ctx).await?;

        let txn = self.connections.begin().await?;
        let existing = self.lesson_store.get_by_id(&txn, lesson_id).await?;
        if !Self::manages(&principal, &existing) {
            return Err(AccessError::not_permitted("Only the teacher or an admin can reschedule this lesson").into());
        }

        let previous = existing.scheduled_at;
        let moved = self
            .lesson_provider
            .reschedule(&txn, existing, scheduled_at.timestamp())
            .await?;
        self.audit_logger
            .log_staff_action(
                &txn,
                ctx,
                &principal,
                AuditAction::Reschedule,
                ResourceType::Lesson,
                Some(moved.id),
                format!("Lesson rescheduled: {}", moved.title),
            )
            .await?;
        DatabaseConnections::commit(txn).await?;

        tracing::info!(
            request_id = %ctx.request_id,
            lesson_id,
            from = previous,
            to = moved.scheduled_at,
            "Lesson rescheduled"
        );
        Ok(moved)
    }
}
