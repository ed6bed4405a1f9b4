use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::app_data::AppData;
use crate::audit::AuditLogger;
use crate::config::DatabaseConnections;
use crate::coordinators::time_window;
use crate::errors::InternalError;
use crate::errors::internal::{AccessError, LessonError, UserError};
use crate::providers::{
    GuardProvider, InstructorRole, InstructorRoleCatalog, LessonProvider, Notification, NotificationProvider,
    UserProvider,
};
use crate::stores::{LessonStore, UserStore};
use crate::types::db::{lesson, user};
use crate::types::dto::admin::{AdminDashboardResponse, InstructorStats, LessonReportResponse, UserReportResponse};
use crate::types::dto::common::to_optional_datetime;
use crate::types::dto::lesson::{LessonCreateRequest, LessonUpdateRequest};
use crate::types::dto::user::{UserCreateRequest, UserSummary, UserUpdateRequest};
use crate::types::internal::audit::{AuditAction, ResourceType};
use crate::types::internal::auth::Principal;
use crate::types::internal::context::RequestContext;
use crate::types::internal::lesson::LessonStatus;
use crate::types::internal::lesson_query::LessonFilter;
use crate::types::internal::role::{Guard, Role};
use crate::types::internal::user::{UserChanges, UserFilter};

/// Rows created by a bulk request plus one message per rejected row
#[derive(Debug)]
pub struct BulkOutcome<T> {
    pub created: Vec<T>,
    pub errors: Vec<String>,
}

impl<T> BulkOutcome<T> {
    fn new() -> Self {
        Self {
            created: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// "Created N {noun} with M errors", or "Created N {noun}"
    pub fn message(&self, noun: &str) -> String {
        if self.has_errors() {
            format!("Created {} {} with {} errors", self.created.len(), noun, self.errors.len())
        } else {
            format!("Created {} {}", self.created.len(), noun)
        }
    }
}

/// Message recorded for a rejected bulk row (1-based)
fn row_error(row: usize, error: &InternalError) -> String {
    let reason = match error {
        InternalError::User(UserError::DuplicateEmail(email)) => format!("Email {} already registered", email),
        InternalError::User(UserError::DuplicateUsername(username)) => format!("Username {} already taken", username),
        InternalError::Lesson(LessonError::InvalidTeacher(id)) => format!("Invalid teacher ID {}", id),
        InternalError::Lesson(LessonError::InvalidStudent(id)) => format!("Invalid student ID {}", id),
        InternalError::Database(_) | InternalError::Crypto { .. } => "An internal error occurred".to_string(),
        other => other.to_string(),
    };
    format!("Row {}: {}", row, reason)
}

/// Admin-only account, lesson, report and instructor-role workflows
///
/// Every mutation writes its audit row in the mutation's transaction.
pub struct AdminCoordinator {
    connections: DatabaseConnections,
    user_store: Arc<UserStore>,
    lesson_store: Arc<LessonStore>,
    user_provider: UserProvider,
    lesson_provider: LessonProvider,
    role_catalog: InstructorRoleCatalog,
    guard_provider: GuardProvider,
    audit_logger: AuditLogger,
    notifier: NotificationProvider,
}

impl AdminCoordinator {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            connections: app_data.connections.clone(),
            user_store: app_data.user_store.clone(),
            lesson_store: app_data.lesson_store.clone(),
            user_provider: UserProvider::new(app_data.user_store.clone(), app_data.crypto_provider.clone()),
            lesson_provider: LessonProvider::new(app_data.lesson_store.clone(), app_data.user_store.clone()),
            role_catalog: InstructorRoleCatalog::new(app_data.user_store.clone()),
            guard_provider: GuardProvider::new(app_data.user_store.clone()),
            audit_logger: AuditLogger::new(app_data.audit_store.clone()),
            notifier: NotificationProvider::new(),
        }
    }

    async fn admin(&self, ctx: &RequestContext) -> Result<Principal, InternalError> {
        self.guard_provider
            .authorize(&self.connections.main, ctx, Guard::Admin)
            .await
    }

    pub async fn dashboard(&self, ctx: &RequestContext) -> Result<AdminDashboardResponse, InternalError> {
        self.admin(ctx).await?;
        let conn = &self.connections.main;

        let now = Utc::now();
        let week_ago = (now - Duration::days(7)).timestamp();
        let month_ago = (now - Duration::days(30)).timestamp();
        let (today_start, today_end) = time_window::today_bounds(now);

        let users = |filter: UserFilter| async move { self.user_store.count(conn, &filter).await };
        let lessons = |filter: LessonFilter| async move { self.lesson_store.count(conn, &filter).await };

        Ok(AdminDashboardResponse {
            total_users: users(UserFilter::default()).await?,
            total_instructors: users(UserFilter {
                role: Some(Role::Instructor),
                ..Default::default()
            })
            .await?,
            total_students: users(UserFilter {
                role: Some(Role::Student),
                ..Default::default()
            })
            .await?,
            total_lessons: lessons(LessonFilter::default()).await?,
            lessons_today: lessons(LessonFilter::default().between(Some(today_start), Some(today_end))).await?,
            lessons_this_week: lessons(LessonFilter::default().between(Some(week_ago), Some(now.timestamp()))).await?,
            lessons_this_month: lessons(LessonFilter::default().between(Some(month_ago), Some(now.timestamp()))).await?,
            active_users: users(UserFilter {
                is_active: Some(true),
                ..Default::default()
            })
            .await?,
            recent_registrations: users(UserFilter {
                created_since: Some(week_ago),
                ..Default::default()
            })
            .await?,
        })
    }

    // Users

    pub async fn list_users(&self, ctx: &RequestContext, filter: UserFilter) -> Result<Vec<user::Model>, InternalError> {
        self.admin(ctx).await?;
        self.user_store.list(&self.connections.main, &filter).await
    }

    pub async fn count_users(&self, ctx: &RequestContext, filter: UserFilter) -> Result<u64, InternalError> {
        self.admin(ctx).await?;
        self.user_store.count(&self.connections.main, &filter).await
    }

    pub async fn get_user(&self, ctx: &RequestContext, user_id: i32) -> Result<user::Model, InternalError> {
        self.admin(ctx).await?;
        self.user_store.get_by_id(&self.connections.main, user_id).await
    }

    pub async fn create_user(&self, ctx: &RequestContext, request: UserCreateRequest) -> Result<user::Model, InternalError> {
        let principal = self.admin(ctx).await?;

        let txn = self.connections.begin().await?;
        let user = self.user_provider.create(&txn, request.registration()).await?;
        self.audit_logger
            .log_staff_action(
                &txn,
                ctx,
                &principal,
                AuditAction::Create,
                ResourceType::User,
                Some(user.id),
                format!("Admin created user: {}", user.username),
            )
            .await?;
        DatabaseConnections::commit(txn).await?;

        Ok(user)
    }

    pub async fn update_user(
        &self,
        ctx: &RequestContext,
        user_id: i32,
        request: UserUpdateRequest,
    ) -> Result<user::Model, InternalError> {
        let principal = self.admin(ctx).await?;

        let txn = self.connections.begin().await?;
        let updated = self
            .user_provider
            .update(&txn, user_id, request.changes(), request.password.as_deref())
            .await?;
        self.audit_logger
            .log_staff_action(
                &txn,
                ctx,
                &principal,
                AuditAction::Update,
                ResourceType::User,
                Some(user_id),
                format!("Admin updated user: {}", updated.username),
            )
            .await?;
        DatabaseConnections::commit(txn).await?;

        Ok(updated)
    }

    /// Returns the deleted user's username
    pub async fn delete_user(&self, ctx: &RequestContext, user_id: i32) -> Result<String, InternalError> {
        let principal = self.admin(ctx).await?;
        if principal.id() == user_id {
            return Err(UserError::SelfDeletion.into());
        }

        let txn = self.connections.begin().await?;
        let target = self.user_store.get_by_id(&txn, user_id).await?;
        self.user_store.delete(&txn, user_id).await?;
        self.audit_logger
            .log_staff_action(
                &txn,
                ctx,
                &principal,
                AuditAction::Delete,
                ResourceType::User,
                Some(user_id),
                format!("Admin deleted user: {}", target.username),
            )
            .await?;
        DatabaseConnections::commit(txn).await?;

        tracing::info!(request_id = %ctx.request_id, user_id, "Admin deleted user {}", target.username);
        Ok(target.username)
    }

    /// Each row commits on its own; one summary audit row covers the batch
    pub async fn bulk_create_users(
        &self,
        ctx: &RequestContext,
        requests: Vec<UserCreateRequest>,
    ) -> Result<BulkOutcome<user::Model>, InternalError> {
        let principal = self.admin(ctx).await?;
        let mut outcome = BulkOutcome::new();

        for (index, request) in requests.into_iter().enumerate() {
            match self.create_user_row(request).await {
                Ok(user) => outcome.created.push(user),
                Err(e) => {
                    tracing::debug!(request_id = %ctx.request_id, row = index + 1, "Bulk user row rejected: {}", e);
                    outcome.errors.push(row_error(index + 1, &e));
                }
            }
        }

        self.write_bulk_summary(ctx, &principal, ResourceType::User, "users", &outcome)
            .await?;
        Ok(outcome)
    }

    /// One bulk row as its own unit of work; begin and commit failures stay
    /// local to the row
    async fn create_user_row(&self, request: UserCreateRequest) -> Result<user::Model, InternalError> {
        let txn = self.connections.begin().await?;
        let user = self.user_provider.create(&txn, request.registration()).await?;
        DatabaseConnections::commit(txn).await?;
        Ok(user)
    }

    async fn create_lesson_row(&self, request: &LessonCreateRequest, created_by: i32) -> Result<lesson::Model, InternalError> {
        let txn = self.connections.begin().await?;
        let lesson = self
            .lesson_provider
            .create(&txn, request.to_new_lesson(Some(created_by)))
            .await?;
        DatabaseConnections::commit(txn).await?;
        Ok(lesson)
    }

    async fn write_bulk_summary<T>(
        &self,
        ctx: &RequestContext,
        principal: &Principal,
        resource_type: ResourceType,
        noun: &str,
        outcome: &BulkOutcome<T>,
    ) -> Result<(), InternalError> {
        let txn = self.connections.begin().await?;
        self.audit_logger
            .log_staff_action(
                &txn,
                ctx,
                principal,
                AuditAction::BulkCreate,
                resource_type,
                None,
                format!(
                    "Admin bulk created {} {}. Errors: {}",
                    outcome.created.len(),
                    noun,
                    outcome.errors.len()
                ),
            )
            .await?;
        DatabaseConnections::commit(txn).await?;

        tracing::info!(
            request_id = %ctx.request_id,
            created = outcome.created.len(),
            errors = outcome.errors.len(),
            "Bulk {} create finished",
            noun
        );
        Ok(())
    }

    /// Admins cannot change their own role
    pub async fn update_role(&self, ctx: &RequestContext, user_id: i32, role: Role) -> Result<user::Model, InternalError> {
        let principal = self.admin(ctx).await?;
        if principal.id() == user_id {
            return Err(AccessError::not_permitted("Cannot change your own role").into());
        }
        self.set_role(ctx, &principal, user_id, role, "Admin changed role").await
    }

    pub async fn promote_to_admin(&self, ctx: &RequestContext, user_id: i32) -> Result<user::Model, InternalError> {
        let principal = self.admin(ctx).await?;
        self.set_role(ctx, &principal, user_id, Role::Admin, "Admin promoted user")
            .await
    }

    async fn set_role(
        &self,
        ctx: &RequestContext,
        principal: &Principal,
        user_id: i32,
        role: Role,
        verb: &str,
    ) -> Result<user::Model, InternalError> {
        let txn = self.connections.begin().await?;
        let changes = UserChanges {
            role: Some(role),
            ..Default::default()
        };
        let updated = self.user_store.update(&txn, user_id, changes).await?;
        self.audit_logger
            .log_staff_action(
                &txn,
                ctx,
                principal,
                AuditAction::Update,
                ResourceType::User,
                Some(user_id),
                format!("{}: {} is now {}", verb, updated.username, role),
            )
            .await?;
        DatabaseConnections::commit(txn).await?;

        tracing::info!(request_id = %ctx.request_id, user_id, role = %role, "Role changed");
        Ok(updated)
    }

    // Lessons

    pub async fn list_lessons(&self, ctx: &RequestContext, filter: LessonFilter) -> Result<Vec<lesson::Model>, InternalError> {
        self.admin(ctx).await?;
        self.lesson_store.list(&self.connections.main, &filter).await
    }

    pub async fn count_lessons(&self, ctx: &RequestContext, filter: LessonFilter) -> Result<u64, InternalError> {
        self.admin(ctx).await?;
        self.lesson_store.count(&self.connections.main, &filter).await
    }

    pub async fn get_lesson(&self, ctx: &RequestContext, lesson_id: i32) -> Result<lesson::Model, InternalError> {
        self.admin(ctx).await?;
        self.lesson_store.get_by_id(&self.connections.main, lesson_id).await
    }

    pub async fn create_lesson(&self, ctx: &RequestContext, request: LessonCreateRequest) -> Result<lesson::Model, InternalError> {
        let principal = self.admin(ctx).await?;

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
                format!("Admin created lesson: {}", lesson.title),
            )
            .await?;
        DatabaseConnections::commit(txn).await?;

        self.notify_booked(&lesson);
        Ok(lesson)
    }

    fn notify_booked(&self, lesson: &lesson::Model) {
        self.notifier.dispatch(Notification::LessonBooked {
            lesson_id: lesson.id,
            teacher_id: lesson.teacher_id,
            student_id: lesson.student_id,
            scheduled_at: lesson.scheduled_at,
        });
    }

    pub async fn update_lesson(
        &self,
        ctx: &RequestContext,
        lesson_id: i32,
        request: LessonUpdateRequest,
    ) -> Result<lesson::Model, InternalError> {
        let principal = self.admin(ctx).await?;

        let txn = self.connections.begin().await?;
        let existing = self.lesson_store.get_by_id(&txn, lesson_id).await?;
        let updated = self
            .lesson_provider
            .update(&txn, existing, request.changes(), request.status)
            .await?;
        self.audit_logger
            .log_staff_action(
                &txn,
                ctx,
                &principal,
                AuditAction::Update,
                ResourceType::Lesson,
                Some(lesson_id),
                format!("Admin updated lesson: {}", updated.title),
            )
            .await?;
        DatabaseConnections::commit(txn).await?;

        Ok(updated)
    }

    pub async fn delete_lesson(&self, ctx: &RequestContext, lesson_id: i32) -> Result<(), InternalError> {
        let principal = self.admin(ctx).await?;

        let txn = self.connections.begin().await?;
        let existing = self.lesson_store.get_by_id(&txn, lesson_id).await?;
        self.lesson_store.delete(&txn, lesson_id).await?;
        self.audit_logger
            .log_staff_action(
                &txn,
                ctx,
                &principal,
                AuditAction::Delete,
                ResourceType::Lesson,
                Some(lesson_id),
                format!("Admin deleted lesson: {}", existing.title),
            )
            .await?;
        DatabaseConnections::commit(txn).await?;

        Ok(())
    }

    pub async fn bulk_create_lessons(
        &self,
        ctx: &RequestContext,
        requests: Vec<LessonCreateRequest>,
    ) -> Result<BulkOutcome<lesson::Model>, InternalError> {
        let principal = self.admin(ctx).await?;
        let mut outcome = BulkOutcome::new();

        for (index, request) in requests.iter().enumerate() {
            match self.create_lesson_row(request, principal.id()).await {
                Ok(lesson) => {
                    self.notify_booked(&lesson);
                    outcome.created.push(lesson);
                }
                Err(e) => {
                    tracing::debug!(request_id = %ctx.request_id, row = index + 1, "Bulk lesson row rejected: {}", e);
                    outcome.errors.push(row_error(index + 1, &e));
                }
            }
        }

        self.write_bulk_summary(ctx, &principal, ResourceType::Lesson, "lessons", &outcome)
            .await?;
        Ok(outcome)
    }

    // Reports

    /// Per-user lesson statistics, counting lessons the user teaches or attends
    pub async fn user_report(&self, ctx: &RequestContext, skip: u64, limit: u64) -> Result<Vec<UserReportResponse>, InternalError> {
        self.admin(ctx).await?;
        let conn = &self.connections.main;
        let now = Utc::now().timestamp();

        let users = self
            .user_store
            .list(
                conn,
                &UserFilter {
                    skip,
                    limit: Some(limit),
                    ..Default::default()
                },
            )
            .await?;

        let mut reports = Vec::with_capacity(users.len());
        for user in &users {
            let involving = || LessonFilter::default().participant(user.id);
            let last_lesson = self
                .lesson_store
                .list(conn, &involving().newest_first().page(0, 1))
                .await?;

            reports.push(UserReportResponse {
                user: UserSummary::from(user),
                total_lessons: self.lesson_store.count(conn, &involving()).await?,
                completed_lessons: self
                    .lesson_store
                    .count(conn, &involving().status(LessonStatus::Completed))
                    .await?,
                cancelled_lessons: self
                    .lesson_store
                    .count(conn, &involving().status(LessonStatus::Cancelled))
                    .await?,
                upcoming_lessons: self
                    .lesson_store
                    .count(conn, &involving().status(LessonStatus::Scheduled).after(now))
                    .await?,
                last_lesson_date: to_optional_datetime(last_lesson.first().map(|l| l.scheduled_at)),
            });
        }

        Ok(reports)
    }

    /// Lesson totals over `[from, to]`, defaulting to the current month so far
    pub async fn lesson_report(
        &self,
        ctx: &RequestContext,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<LessonReportResponse, InternalError> {
        self.admin(ctx).await?;
        let conn = &self.connections.main;

        let (from, to) = time_window::month_to_date(from, to, Utc::now());
        let lessons = self
            .lesson_store
            .list(
                conn,
                &LessonFilter::default().between(Some(from.timestamp()), Some(to.timestamp())),
            )
            .await?;

        let mut teacher_ids: Vec<i32> = lessons.iter().map(|l| l.teacher_id).collect();
        teacher_ids.sort_unstable();
        teacher_ids.dedup();
        let teacher_names: HashMap<i32, String> = self
            .user_store
            .find_many(conn, &teacher_ids)
            .await?
            .into_iter()
            .map(|t| (t.id, t.full_name))
            .collect();

        let mut report = LessonReportResponse {
            date_range: time_window::range_label(from, to),
            total_lessons: lessons.len() as u64,
            completed_lessons: 0,
            cancelled_lessons: 0,
            revenue: 0.0,
            popular_instruments: HashMap::new(),
            instructor_stats: HashMap::new(),
        };

        for lesson in &lessons {
            let status = lesson.status();
            let completed = status == LessonStatus::Completed;
            let earned = if completed { lesson.cost.unwrap_or(0.0) } else { 0.0 };

            match status {
                LessonStatus::Completed => report.completed_lessons += 1,
                LessonStatus::Cancelled => report.cancelled_lessons += 1,
                _ => {}
            }
            report.revenue += earned;

            if let Some(instrument) = &lesson.instrument {
                *report.popular_instruments.entry(instrument.clone()).or_default() += 1;
            }

            let name = teacher_names
                .get(&lesson.teacher_id)
                .cloned()
                .unwrap_or_else(|| format!("Teacher {}", lesson.teacher_id));
            let stats: &mut InstructorStats = report.instructor_stats.entry(name).or_default();
            stats.total_lessons += 1;
            if completed {
                stats.completed_lessons += 1;
                stats.revenue += earned;
            }
        }

        Ok(report)
    }

    // Instructor roles

    pub async fn instructor_roles(&self, ctx: &RequestContext) -> Result<&'static [InstructorRole], InternalError> {
        self.admin(ctx).await?;
        Ok(self.role_catalog.all())
    }

    pub async fn assign_instructor_role(
        &self,
        ctx: &RequestContext,
        instructor_id: i32,
        role_id: &str,
    ) -> Result<(user::Model, &'static InstructorRole), InternalError> {
        let principal = self.admin(ctx).await?;

        let txn = self.connections.begin().await?;
        let (instructor, role) = self.role_catalog.assign(&txn, instructor_id, role_id).await?;
        self.audit_logger
            .log_staff_action(
                &txn,
                ctx,
                &principal,
                AuditAction::AssignRole,
                ResourceType::User,
                Some(instructor_id),
                format!("Admin assigned role {} to {}", role.name, instructor.username),
            )
            .await?;
        DatabaseConnections::commit(txn).await?;

        Ok((instructor, role))
    }

    pub async fn remove_instructor_role(
        &self,
        ctx: &RequestContext,
        instructor_id: i32,
        role_id: &str,
    ) -> Result<(user::Model, &'static InstructorRole), InternalError> {
        let principal = self.admin(ctx).await?;

        let txn = self.connections.begin().await?;
        let (instructor, role) = self.role_catalog.remove(&txn, instructor_id, role_id).await?;
        self.audit_logger
            .log_staff_action(
                &txn,
                ctx,
                &principal,
                AuditAction::RemoveRole,
                ResourceType::User,
                Some(instructor_id),
                format!("Admin removed role {} from {}", role.name, instructor.username),
            )
            .await?;
        DatabaseConnections::commit(txn).await?;

        Ok((instructor, role))
    }

    pub async fn roles_of_instructor(
        &self,
        ctx: &RequestContext,
        instructor_id: i32,
    ) -> Result<(user::Model, Vec<&'static InstructorRole>), InternalError> {
        self.admin(ctx).await?;
        self.role_catalog
            .instructor_with_roles(&self.connections.main, instructor_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::utils::{TEST_PASSWORD, context_for, seed_user, setup_test_app_data};
    use crate::types::internal::audit::AuditFilter;

    fn user_row(username: &str, email: &str) -> UserCreateRequest {
        UserCreateRequest {
            email: email.to_string(),
            username: username.to_string(),
            full_name: "Bulk User".to_string(),
            password: TEST_PASSWORD.to_string(),
            role: Some(Role::Student),
            is_teacher: None,
            is_active: None,
            phone: None,
            address: None,
            emergency_contact: None,
            notes: None,
            hourly_rate: None,
            specializations: None,
        }
    }

    fn lesson_row(teacher_id: i32, student_id: i32, at: i64, cost: f64) -> LessonCreateRequest {
        LessonCreateRequest {
            title: "Theory".to_string(),
            description: None,
            teacher_id,
            student_id,
            scheduled_at: DateTime::from_timestamp(at, 0).unwrap(),
            duration_minutes: Some(45),
            instrument: Some("violin".to_string()),
            lesson_type: None,
            cost: Some(cost),
            location: None,
            room_number: None,
            materials_needed: None,
        }
    }

    #[tokio::test]
    async fn test_bulk_users_isolates_failed_rows() {
        let app_data = setup_test_app_data().await;
        let admin = seed_user(&app_data, "admin", Role::Admin).await;
        let coordinator = AdminCoordinator::new(app_data.clone());
        let ctx = context_for(&app_data, &admin);

        let mut short_password = user_row("shorty", "shorty@example.com");
        short_password.password = "short".to_string();
        let rows = vec![
            user_row("ok1", "ok1@example.com"),
            user_row("dupe", "admin@example.com"),
            short_password,
            user_row("ok1", "other@example.com"),
            user_row("ok2", "ok2@example.com"),
        ];

        let outcome = coordinator.bulk_create_users(&ctx, rows).await.unwrap();
        assert_eq!(outcome.created.len(), 2);
        assert_eq!(
            outcome.errors,
            vec![
                "Row 2: Email admin@example.com already registered".to_string(),
                "Row 3: Password must be at least 8 characters long".to_string(),
                "Row 4: Username ok1 already taken".to_string(),
            ]
        );
        assert!(outcome.has_errors());
        assert_eq!(outcome.message("users"), "Created 2 users with 3 errors");

        let audit = app_data
            .audit_store
            .list(&app_data.connections.main, &AuditFilter { limit: 10, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].action, "BULK_CREATE");
        assert_eq!(audit[0].details.as_deref(), Some("Admin bulk created 2 users. Errors: 3"));
    }

    #[tokio::test]
    async fn test_bulk_lessons_reports_invalid_participants() {
        let app_data = setup_test_app_data().await;
        let admin = seed_user(&app_data, "admin", Role::Admin).await;
        let teacher = seed_user(&app_data, "teach", Role::Instructor).await;
        let student = seed_user(&app_data, "stu", Role::Student).await;
        let coordinator = AdminCoordinator::new(app_data.clone());
        let ctx = context_for(&app_data, &admin);

        let outcome = coordinator
            .bulk_create_lessons(
                &ctx,
                vec![
                    lesson_row(teacher.id, student.id, 1_900_000_000, 50.0),
                    lesson_row(student.id, student.id, 1_900_000_000, 50.0),
                    lesson_row(teacher.id, 9_999, 1_900_003_600, 50.0),
                ],
            )
            .await
            .unwrap();

        assert_eq!(outcome.created.len(), 1);
        assert_eq!(
            outcome.errors,
            vec![
                format!("Row 2: Invalid teacher ID {}", student.id),
                "Row 3: Invalid student ID 9999".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_bulk_database_failures_become_row_errors() {
        use sea_orm::ConnectionTrait;

        let app_data = setup_test_app_data().await;
        let admin = seed_user(&app_data, "admin", Role::Admin).await;
        let teacher = seed_user(&app_data, "teach", Role::Instructor).await;
        let student = seed_user(&app_data, "stu", Role::Student).await;
        let coordinator = AdminCoordinator::new(app_data.clone());
        let ctx = context_for(&app_data, &admin);

        app_data
            .connections
            .main
            .execute_unprepared("DROP TABLE lessons")
            .await
            .unwrap();

        let outcome = coordinator
            .bulk_create_lessons(
                &ctx,
                vec![
                    lesson_row(teacher.id, student.id, 1_900_000_000, 50.0),
                    lesson_row(teacher.id, student.id, 1_900_003_600, 50.0),
                ],
            )
            .await
            .unwrap();

        assert!(outcome.created.is_empty());
        assert_eq!(
            outcome.errors,
            vec![
                "Row 1: An internal error occurred".to_string(),
                "Row 2: An internal error occurred".to_string(),
            ]
        );

        let audit = app_data
            .audit_store
            .list(&app_data.connections.main, &AuditFilter { limit: 10, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].action, "BULK_CREATE");
        assert_eq!(audit[0].details.as_deref(), Some("Admin bulk created 0 lessons. Errors: 2"));
    }

    #[tokio::test]
    async fn test_instructor_is_refused_everywhere() {
        let app_data = setup_test_app_data().await;
        let teacher = seed_user(&app_data, "teach", Role::Instructor).await;
        let coordinator = AdminCoordinator::new(app_data.clone());
        let ctx = context_for(&app_data, &teacher);

        assert!(matches!(
            coordinator.dashboard(&ctx).await,
            Err(InternalError::Access(AccessError::RoleRequired { .. }))
        ));
        assert!(coordinator.list_users(&ctx, UserFilter::default()).await.is_err());
        assert!(coordinator.instructor_roles(&ctx).await.is_err());
    }

    #[tokio::test]
    async fn test_dashboard_counts() {
        let app_data = setup_test_app_data().await;
        let admin = seed_user(&app_data, "admin", Role::Admin).await;
        let teacher = seed_user(&app_data, "teach", Role::Instructor).await;
        let student = seed_user(&app_data, "stu", Role::Student).await;
        let coordinator = AdminCoordinator::new(app_data.clone());
        let ctx = context_for(&app_data, &admin);

        let yesterday = (Utc::now() - Duration::days(1)).timestamp();
        coordinator
            .create_lesson(&ctx, lesson_row(teacher.id, student.id, yesterday, 30.0))
            .await
            .unwrap();

        let stats = coordinator.dashboard(&ctx).await.unwrap();
        assert_eq!(stats.total_users, 3);
        assert_eq!(stats.total_instructors, 1);
        assert_eq!(stats.total_students, 1);
        assert_eq!(stats.total_lessons, 1);
        assert_eq!(stats.lessons_this_week, 1);
        assert_eq!(stats.lessons_this_month, 1);
        assert_eq!(stats.active_users, 3);
        assert_eq!(stats.recent_registrations, 3);
    }

    #[tokio::test]
    async fn test_lesson_report_aggregates_completed_revenue_by_teacher() {
        let app_data = setup_test_app_data().await;
        let admin = seed_user(&app_data, "admin", Role::Admin).await;
        let teacher = seed_user(&app_data, "teach", Role::Instructor).await;
        let student = seed_user(&app_data, "stu", Role::Student).await;
        let coordinator = AdminCoordinator::new(app_data.clone());
        let ctx = context_for(&app_data, &admin);

        let base = 1_800_000_000;
        let first = coordinator
            .create_lesson(&ctx, lesson_row(teacher.id, student.id, base, 40.0))
            .await
            .unwrap();
        coordinator
            .create_lesson(&ctx, lesson_row(teacher.id, student.id, base + 3_600, 60.0))
            .await
            .unwrap();
        coordinator
            .update_lesson(
                &ctx,
                first.id,
                LessonUpdateRequest {
                    status: Some(LessonStatus::Completed),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let from = DateTime::from_timestamp(base - 10, 0);
        let to = DateTime::from_timestamp(base + 7_200, 0);
        let report = coordinator.lesson_report(&ctx, from, to).await.unwrap();

        assert_eq!(report.total_lessons, 2);
        assert_eq!(report.completed_lessons, 1);
        assert_eq!(report.revenue, 40.0);
        assert_eq!(report.popular_instruments.get("violin"), Some(&2));
        let stats = &report.instructor_stats["teach Test"];
        assert_eq!((stats.total_lessons, stats.completed_lessons, stats.revenue), (2, 1, 40.0));
    }

    #[tokio::test]
    async fn test_instructor_role_assignment_round() {
        let app_data = setup_test_app_data().await;
        let admin = seed_user(&app_data, "admin", Role::Admin).await;
        let teacher = seed_user(&app_data, "teach", Role::Instructor).await;
        let student = seed_user(&app_data, "stu", Role::Student).await;
        let coordinator = AdminCoordinator::new(app_data.clone());
        let ctx = context_for(&app_data, &admin);

        coordinator.assign_instructor_role(&ctx, teacher.id, "role-1").await.unwrap();
        coordinator.assign_instructor_role(&ctx, teacher.id, "role-3").await.unwrap();
        let (_, roles) = coordinator.roles_of_instructor(&ctx, teacher.id).await.unwrap();
        assert_eq!(roles.iter().map(|r| r.id).collect::<Vec<_>>(), vec!["role-1", "role-3"]);

        let (updated, _) = coordinator.remove_instructor_role(&ctx, teacher.id, "role-1").await.unwrap();
        assert_eq!(updated.instructor_role_ids(), vec!["role-3".to_string()]);

        let not_instructor = coordinator.assign_instructor_role(&ctx, student.id, "role-1").await;
        assert!(matches!(not_instructor, Err(InternalError::User(UserError::NotAnInstructor(_)))));
        let unknown = coordinator.assign_instructor_role(&ctx, teacher.id, "role-99").await;
        assert!(matches!(unknown, Err(InternalError::User(UserError::UnknownInstructorRole(_)))));
    }

    #[tokio::test]
    async fn test_promote_and_self_role_change() {
        let app_data = setup_test_app_data().await;
        let admin = seed_user(&app_data, "admin", Role::Admin).await;
        let student = seed_user(&app_data, "stu", Role::Student).await;
        let coordinator = AdminCoordinator::new(app_data.clone());
        let ctx = context_for(&app_data, &admin);

        let promoted = coordinator.promote_to_admin(&ctx, student.id).await.unwrap();
        assert_eq!(promoted.role(), Role::Admin);

        let own = coordinator.update_role(&ctx, admin.id, Role::Student).await;
        assert!(matches!(own, Err(InternalError::Access(AccessError::NotPermitted { .. }))));
    }
}
