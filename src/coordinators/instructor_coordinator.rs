use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sea_orm::ConnectionTrait;

use crate::app_data::AppData;
use crate::audit::AuditLogger;
use crate::config::DatabaseConnections;
use crate::coordinators::time_window;
use crate::errors::InternalError;
use crate::errors::internal::AccessError;
use crate::providers::{GuardProvider, LessonProvider, Notification, NotificationProvider, UserProvider};
use crate::stores::{LessonStore, UserStore};
use crate::types::db::{lesson, user};
use crate::types::dto::instructor::{
    InstructorDashboardResponse, InstructorProfileUpdate, InstructorSummaryReport, LessonCompletionRequest,
    ScheduleResponse,
};
use crate::types::dto::lesson::{LessonResponse, LessonUpdateRequest, ScheduleDay};
use crate::types::internal::audit::{AuditAction, ResourceType};
use crate::types::internal::auth::Principal;
use crate::types::internal::context::RequestContext;
use crate::types::internal::lesson::LessonStatus;
use crate::types::internal::lesson_query::{LessonChanges, LessonFilter};
use crate::types::internal::role::Guard;

pub const DEFAULT_UPCOMING_LIMIT: u64 = 10;
pub const DEFAULT_SCHEDULE_DAYS: i64 = 30;
const DASHBOARD_LIST_SIZE: u64 = 5;

/// Workflows scoped to the calling instructor's own lessons and students
pub struct InstructorCoordinator {
    connections: DatabaseConnections,
    user_store: Arc<UserStore>,
    lesson_store: Arc<LessonStore>,
    user_provider: UserProvider,
    lesson_provider: LessonProvider,
    guard_provider: GuardProvider,
    audit_logger: AuditLogger,
    notifier: NotificationProvider,
}

impl InstructorCoordinator {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            connections: app_data.connections.clone(),
            user_store: app_data.user_store.clone(),
            lesson_store: app_data.lesson_store.clone(),
            user_provider: UserProvider::new(app_data.user_store.clone(), app_data.crypto_provider.clone()),
            lesson_provider: LessonProvider::new(app_data.lesson_store.clone(), app_data.user_store.clone()),
            guard_provider: GuardProvider::new(app_data.user_store.clone()),
            audit_logger: AuditLogger::new(app_data.audit_store.clone()),
            notifier: NotificationProvider::new(),
        }
    }

    async fn instructor(&self, ctx: &RequestContext) -> Result<Principal, InternalError> {
        self.guard_provider
            .authorize(&self.connections.main, ctx, Guard::Instructor)
            .await
    }

    /// One of the caller's lessons, loaded on `conn`
    async fn own_lesson(
        &self,
        conn: &impl ConnectionTrait,
        principal: &Principal,
        lesson_id: i32,
        verb: &str,
    ) -> Result<lesson::Model, InternalError> {
        let lesson = self.lesson_store.get_by_id(conn, lesson_id).await?;
        if lesson.teacher_id != principal.id() {
            return Err(AccessError::not_permitted(format!("Not authorized to {} this lesson", verb)).into());
        }
        Ok(lesson)
    }

    pub async fn dashboard(&self, ctx: &RequestContext) -> Result<InstructorDashboardResponse, InternalError> {
        let principal = self.instructor(ctx).await?;
        let conn = &self.connections.main;

        let now = Utc::now();
        let (today_start, today_end) = time_window::today_bounds(now);
        let taught = || LessonFilter::default().teacher(principal.id());
        let since = |days: i64| taught().between(Some((now - Duration::days(days)).timestamp()), Some(now.timestamp()));

        let upcoming = self
            .lesson_store
            .list(
                conn,
                &taught()
                    .status(LessonStatus::Scheduled)
                    .after(now.timestamp())
                    .page(0, DASHBOARD_LIST_SIZE),
            )
            .await?;
        let recent = self
            .lesson_store
            .list(
                conn,
                &taught()
                    .status(LessonStatus::Completed)
                    .newest_first()
                    .page(0, DASHBOARD_LIST_SIZE),
            )
            .await?;

        Ok(InstructorDashboardResponse {
            total_students: self.lesson_store.student_ids_for_teacher(conn, principal.id()).await?.len() as u64,
            lessons_today: self
                .lesson_store
                .count(conn, &taught().between(Some(today_start), Some(today_end)))
                .await?,
            lessons_this_week: self.lesson_store.count(conn, &since(7)).await?,
            lessons_this_month: self.lesson_store.count(conn, &since(30)).await?,
            upcoming_lessons: upcoming.into_iter().map(LessonResponse::from).collect(),
            recent_lessons: recent.into_iter().map(LessonResponse::from).collect(),
        })
    }

    pub async fn profile(&self, ctx: &RequestContext) -> Result<user::Model, InternalError> {
        Ok(self.instructor(ctx).await?.user)
    }

    /// Own profile edits; repeating the current role is allowed, changing it is not
    pub async fn update_profile(
        &self,
        ctx: &RequestContext,
        request: InstructorProfileUpdate,
    ) -> Result<user::Model, InternalError> {
        let principal = self.instructor(ctx).await?;
        if request.role.is_some_and(|role| role != principal.role) {
            return Err(AccessError::not_permitted("Cannot change your own role").into());
        }

        let txn = self.connections.begin().await?;
        let updated = self
            .user_provider
            .update(&txn, principal.id(), request.changes(), None)
            .await?;
        self.audit_logger
            .log_staff_action(
                &txn,
                ctx,
                &principal,
                AuditAction::Update,
                ResourceType::User,
                Some(principal.id()),
                "Instructor updated own profile",
            )
            .await?;
        DatabaseConnections::commit(txn).await?;

        Ok(updated)
    }

    pub async fn lessons(
        &self,
        ctx: &RequestContext,
        status: Option<LessonStatus>,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<lesson::Model>, InternalError> {
        let principal = self.instructor(ctx).await?;

        let mut filter = LessonFilter::default().teacher(principal.id()).page(skip, limit);
        filter.status = status;
        self.lesson_store.list(&self.connections.main, &filter).await
    }

    pub async fn upcoming_lessons(&self, ctx: &RequestContext, limit: u64) -> Result<Vec<lesson::Model>, InternalError> {
        let principal = self.instructor(ctx).await?;

        let filter = LessonFilter::default()
            .teacher(principal.id())
            .status(LessonStatus::Scheduled)
            .after(Utc::now().timestamp())
            .page(0, limit);
        self.lesson_store.list(&self.connections.main, &filter).await
    }

    pub async fn today_lessons(&self, ctx: &RequestContext) -> Result<Vec<lesson::Model>, InternalError> {
        let principal = self.instructor(ctx).await?;

        let (start, end) = time_window::today_bounds(Utc::now());
        let filter = LessonFilter::default()
            .teacher(principal.id())
            .between(Some(start), Some(end));
        self.lesson_store.list(&self.connections.main, &filter).await
    }

    pub async fn lesson(&self, ctx: &RequestContext, lesson_id: i32) -> Result<lesson::Model, InternalError> {
        let principal = self.instructor(ctx).await?;
        self.own_lesson(&self.connections.main, &principal, lesson_id, "view")
            .await
    }

    /// Participants are fixed once booked
    pub async fn update_lesson(
        &self,
        ctx: &RequestContext,
        lesson_id: i32,
        request: LessonUpdateRequest,
    ) -> Result<lesson::Model, InternalError> {
        let principal = self.instructor(ctx).await?;
        let changes = request.changes();
        if changes.touches_participants() {
            return Err(AccessError::not_permitted("Cannot change lesson participants").into());
        }

        let txn = self.connections.begin().await?;
        let existing = self.own_lesson(&txn, &principal, lesson_id, "update").await?;
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
                Some(lesson_id),
                format!("Instructor updated lesson: {}", updated.title),
            )
            .await?;
        DatabaseConnections::commit(txn).await?;

        Ok(updated)
    }

    pub async fn complete_lesson(
        &self,
        ctx: &RequestContext,
        lesson_id: i32,
        request: LessonCompletionRequest,
    ) -> Result<lesson::Model, InternalError> {
        let principal = self.instructor(ctx).await?;
        let notes = LessonChanges {
            instructor_notes: request.instructor_notes,
            progress_notes: request.progress_notes,
            homework_assigned: request.homework_assigned,
            ..Default::default()
        };

        let txn = self.connections.begin().await?;
        let existing = self.own_lesson(&txn, &principal, lesson_id, "complete").await?;
        let completed = self
            .lesson_provider
            .transition(&txn, existing, LessonStatus::Completed, notes)
            .await?;
        self.audit_logger
            .log_staff_action(
                &txn,
                ctx,
                &principal,
                AuditAction::Complete,
                ResourceType::Lesson,
                Some(lesson_id),
                format!("Instructor completed lesson: {}", completed.title),
            )
            .await?;
        DatabaseConnections::commit(txn).await?;

        tracing::info!(request_id = %ctx.request_id, lesson_id, "Lesson completed");
        Ok(completed)
    }

    pub async fn cancel_lesson(
        &self,
        ctx: &RequestContext,
        lesson_id: i32,
        reason: Option<String>,
    ) -> Result<lesson::Model, InternalError> {
        let principal = self.instructor(ctx).await?;
        let changes = LessonChanges {
            instructor_notes: reason
                .as_ref()
                .map(|reason| format!("Cancelled by instructor: {}", reason)),
            ..Default::default()
        };

        let txn = self.connections.begin().await?;
        let existing = self.own_lesson(&txn, &principal, lesson_id, "cancel").await?;
        let cancelled = self
            .lesson_provider
            .transition(&txn, existing, LessonStatus::Cancelled, changes)
            .await?;
        let details = match &reason {
            Some(reason) => format!("Instructor cancelled lesson: {}. Reason: {}", cancelled.title, reason),
            None => format!("Instructor cancelled lesson: {}", cancelled.title),
        };
        self.audit_logger
            .log_staff_action(
                &txn,
                ctx,
                &principal,
                AuditAction::Cancel,
                ResourceType::Lesson,
                Some(lesson_id),
                details,
            )
            .await?;
        DatabaseConnections::commit(txn).await?;

        self.notifier
            .dispatch(Notification::LessonCancelled { lesson_id, reason });
        Ok(cancelled)
    }

    /// Everyone the caller has at least one lesson with
    pub async fn students(&self, ctx: &RequestContext) -> Result<Vec<user::Model>, InternalError> {
        let principal = self.instructor(ctx).await?;
        let conn = &self.connections.main;

        let ids = self.lesson_store.student_ids_for_teacher(conn, principal.id()).await?;
        self.user_store.find_many(conn, &ids).await
    }

    pub async fn student_lessons(
        &self,
        ctx: &RequestContext,
        student_id: i32,
        status: Option<LessonStatus>,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<lesson::Model>, InternalError> {
        let principal = self.instructor(ctx).await?;
        let conn = &self.connections.main;

        let shared = LessonFilter::default().teacher(principal.id()).student(student_id);
        if self.lesson_store.count(conn, &shared).await? == 0 {
            return Err(AccessError::not_permitted("You don't teach this student").into());
        }

        let mut filter = shared.page(skip, limit);
        filter.status = status;
        self.lesson_store.list(conn, &filter).await
    }

    /// Scheduled lessons from the start of today over `days`, grouped by day
    pub async fn schedule(&self, ctx: &RequestContext, days: Option<i64>) -> Result<ScheduleResponse, InternalError> {
        let principal = self.instructor(ctx).await?;

        let days = days.unwrap_or(DEFAULT_SCHEDULE_DAYS).max(1);
        let from = time_window::start_of_day(Utc::now());
        let to = from + Duration::days(days);

        let filter = LessonFilter::default()
            .teacher(principal.id())
            .status(LessonStatus::Scheduled)
            .between(Some(from.timestamp()), Some(to.timestamp()));
        let lessons = self.lesson_store.list(&self.connections.main, &filter).await?;

        let mut by_day: BTreeMap<String, Vec<LessonResponse>> = BTreeMap::new();
        for lesson in lessons {
            by_day
                .entry(time_window::day_key(lesson.scheduled_at))
                .or_default()
                .push(LessonResponse::from(lesson));
        }

        Ok(ScheduleResponse {
            date_range: time_window::range_label(from, to),
            schedule: by_day
                .into_iter()
                .map(|(date, lessons)| ScheduleDay { date, lessons })
                .collect(),
        })
    }

    pub async fn summary_report(
        &self,
        ctx: &RequestContext,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<InstructorSummaryReport, InternalError> {
        let principal = self.instructor(ctx).await?;

        let (from, to) = time_window::month_to_date(from, to, Utc::now());
        let filter = LessonFilter::default()
            .teacher(principal.id())
            .between(Some(from.timestamp()), Some(to.timestamp()));
        let lessons = self.lesson_store.list(&self.connections.main, &filter).await?;

        Ok(summarize(time_window::range_label(from, to), &lessons))
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn summarize(date_range: String, lessons: &[lesson::Model]) -> InstructorSummaryReport {
    let count = |status: LessonStatus| lessons.iter().filter(|l| l.status() == status).count() as u64;
    let completed: Vec<&lesson::Model> = lessons
        .iter()
        .filter(|l| l.status() == LessonStatus::Completed)
        .collect();

    let mut instruments_taught: HashMap<String, u64> = HashMap::new();
    for instrument in lessons.iter().filter_map(|l| l.instrument.as_ref()) {
        *instruments_taught.entry(instrument.clone()).or_default() += 1;
    }

    let total_lessons = lessons.len() as u64;
    let completed_lessons = completed.len() as u64;
    let completion_rate = if total_lessons > 0 {
        round2(completed_lessons as f64 / total_lessons as f64 * 100.0)
    } else {
        0.0
    };
    let minutes: i64 = completed.iter().map(|l| i64::from(l.duration_minutes)).sum();

    InstructorSummaryReport {
        date_range,
        total_lessons,
        completed_lessons,
        cancelled_lessons: count(LessonStatus::Cancelled),
        scheduled_lessons: count(LessonStatus::Scheduled),
        unique_students: lessons.iter().map(|l| l.student_id).collect::<HashSet<_>>().len() as u64,
        total_revenue: completed.iter().filter_map(|l| l.cost).sum(),
        total_teaching_hours: round2(minutes as f64 / 60.0),
        instruments_taught,
        completion_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::internal::LessonError;
    use crate::test::utils::{context_for, new_lesson, seed_user, setup_test_app_data};
    use crate::types::internal::audit::AuditFilter;
    use crate::types::internal::role::Role;

    struct Fixture {
        app_data: Arc<AppData>,
        instructor: InstructorCoordinator,
        teacher: user::Model,
        student: user::Model,
    }

    async fn fixture() -> Fixture {
        let app_data = setup_test_app_data().await;
        let teacher = seed_user(&app_data, "teach", Role::Instructor).await;
        let student = seed_user(&app_data, "stu", Role::Student).await;
        Fixture {
            instructor: InstructorCoordinator::new(app_data.clone()),
            app_data,
            teacher,
            student,
        }
    }

    async fn book(f: &Fixture, teacher_id: i32, at: i64) -> lesson::Model {
        f.app_data
            .lesson_store
            .insert(&f.app_data.connections.main, new_lesson(teacher_id, f.student.id, at))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_students_are_refused() {
        let f = fixture().await;
        let ctx = context_for(&f.app_data, &f.student);
        assert!(matches!(
            f.instructor.dashboard(&ctx).await,
            Err(InternalError::Access(AccessError::RoleRequired { .. }))
        ));
    }

    #[tokio::test]
    async fn test_cancel_records_reason_and_audit() {
        let f = fixture().await;
        let lesson = book(&f, f.teacher.id, Utc::now().timestamp() + 86_400).await;
        let ctx = context_for(&f.app_data, &f.teacher);

        let cancelled = f
            .instructor
            .cancel_lesson(&ctx, lesson.id, Some("sick".to_string()))
            .await
            .unwrap();
        assert_eq!(cancelled.status(), LessonStatus::Cancelled);
        assert_eq!(cancelled.instructor_notes.as_deref(), Some("Cancelled by instructor: sick"));

        let rows = f
            .app_data
            .audit_store
            .list(&f.app_data.connections.main, &AuditFilter { limit: 5, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(rows[0].action, "CANCEL");
        assert_eq!(rows[0].details.as_deref(), Some("Instructor cancelled lesson: Piano basics. Reason: sick"));

        let again = f.instructor.cancel_lesson(&ctx, lesson.id, None).await;
        assert!(matches!(again, Err(InternalError::Lesson(LessonError::InvalidTransition { .. }))));
    }

    #[tokio::test]
    async fn test_other_instructors_lessons_are_off_limits() {
        let f = fixture().await;
        let other = seed_user(&f.app_data, "other", Role::Instructor).await;
        let lesson = book(&f, other.id, 1_900_000_000).await;
        let ctx = context_for(&f.app_data, &f.teacher);

        assert!(f.instructor.lesson(&ctx, lesson.id).await.is_err());
        let complete = f
            .instructor
            .complete_lesson(&ctx, lesson.id, LessonCompletionRequest::default())
            .await;
        assert!(matches!(complete, Err(InternalError::Access(AccessError::NotPermitted { .. }))));
    }

    #[tokio::test]
    async fn test_participants_cannot_change() {
        let f = fixture().await;
        let lesson = book(&f, f.teacher.id, 1_900_000_000).await;
        let ctx = context_for(&f.app_data, &f.teacher);

        let request = LessonUpdateRequest {
            student_id: Some(f.teacher.id),
            ..Default::default()
        };
        assert!(f.instructor.update_lesson(&ctx, lesson.id, request).await.is_err());
    }

    #[tokio::test]
    async fn test_profile_role_change_is_refused() {
        let f = fixture().await;
        let ctx = context_for(&f.app_data, &f.teacher);

        let same_role = InstructorProfileUpdate {
            role: Some(Role::Instructor),
            phone: Some("555-0199".to_string()),
            ..Default::default()
        };
        let updated = f.instructor.update_profile(&ctx, same_role).await.unwrap();
        assert_eq!(updated.phone.as_deref(), Some("555-0199"));

        let promotion = InstructorProfileUpdate {
            role: Some(Role::Admin),
            ..Default::default()
        };
        assert!(f.instructor.update_profile(&ctx, promotion).await.is_err());
    }

    #[tokio::test]
    async fn test_student_lessons_require_a_shared_lesson() {
        let f = fixture().await;
        let stranger = seed_user(&f.app_data, "stranger", Role::Student).await;
        book(&f, f.teacher.id, 1_900_000_000).await;
        let ctx = context_for(&f.app_data, &f.teacher);

        let shared = f.instructor.student_lessons(&ctx, f.student.id, None, 0, 100).await.unwrap();
        assert_eq!(shared.len(), 1);
        assert!(f.instructor.student_lessons(&ctx, stranger.id, None, 0, 100).await.is_err());

        let students = f.instructor.students(&ctx).await.unwrap();
        assert_eq!(students.iter().map(|s| s.id).collect::<Vec<_>>(), vec![f.student.id]);
    }

    #[tokio::test]
    async fn test_schedule_groups_by_day() {
        let f = fixture().await;
        let tomorrow = time_window::start_of_day(Utc::now()) + Duration::days(1);
        book(&f, f.teacher.id, (tomorrow + Duration::hours(9)).timestamp()).await;
        book(&f, f.teacher.id, (tomorrow + Duration::hours(11)).timestamp()).await;
        book(&f, f.teacher.id, (tomorrow + Duration::days(2)).timestamp()).await;
        book(&f, f.teacher.id, (tomorrow + Duration::days(60)).timestamp()).await;

        let schedule = f
            .instructor
            .schedule(&context_for(&f.app_data, &f.teacher), None)
            .await
            .unwrap();
        assert_eq!(schedule.schedule.len(), 2);
        assert_eq!(schedule.schedule[0].date, tomorrow.format("%Y-%m-%d").to_string());
        assert_eq!(schedule.schedule[0].lessons.len(), 2);
    }

    #[test]
    fn test_summary_rates_and_hours() {
        let mut lessons = Vec::new();
        for (id, status, minutes) in [
            (1, LessonStatus::Completed, 45),
            (2, LessonStatus::Completed, 60),
            (3, LessonStatus::Cancelled, 60),
        ] {
            lessons.push(lesson::Model {
                id,
                title: "Lesson".to_string(),
                description: None,
                teacher_id: 1,
                student_id: id + 10,
                created_by: None,
                scheduled_at: 0,
                duration_minutes: minutes,
                instrument: Some("guitar".to_string()),
                lesson_type: "individual".to_string(),
                status: status.as_str().to_string(),
                notes: None,
                instructor_notes: None,
                admin_notes: None,
                cost: Some(25.0),
                location: None,
                room_number: None,
                materials_needed: None,
                homework_assigned: None,
                progress_notes: None,
                created_at: 0,
                updated_at: None,
            });
        }

        let report = summarize("x".to_string(), &lessons);
        assert_eq!(report.completion_rate, 66.67);
        assert_eq!(report.total_teaching_hours, 1.75);
        assert_eq!(report.total_revenue, 50.0);
        assert_eq!(report.unique_students, 3);
        assert_eq!(report.instruments_taught.get("guitar"), Some(&3));

        let empty = summarize("x".to_string(), &[]);
        assert_eq!(empty.completion_rate, 0.0);
    }
}
