use std::sync::Arc;

use chrono::{DateTime, Utc};
use poem::Request;
use poem_openapi::param::{Path, Query};
use poem_openapi::payload::Json;
use poem_openapi::{OpenApi, Tags};

use crate::api::{ApiResult, helpers};
use crate::app_data::AppData;
use crate::coordinators::InstructorCoordinator;
use crate::coordinators::instructor_coordinator::DEFAULT_UPCOMING_LIMIT;
use crate::errors::ApiError;
use crate::providers::TokenProvider;
use crate::types::db::lesson;
use crate::types::dto::instructor::{
    InstructorDashboardResponse, InstructorProfileUpdate, InstructorSummaryReport, LessonActionResponse,
    LessonCompletionRequest, ScheduleResponse,
};
use crate::types::dto::lesson::{LessonResponse, LessonUpdateRequest};
use crate::types::dto::user::UserResponse;
use crate::types::internal::lesson::LessonStatus;

const MAX_UPCOMING_LIMIT: u64 = 100;

/// Endpoints scoped to the calling instructor
pub struct InstructorApi {
    instructor_coordinator: InstructorCoordinator,
    token_provider: Arc<TokenProvider>,
}

impl InstructorApi {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            token_provider: app_data.token_provider.clone(),
            instructor_coordinator: InstructorCoordinator::new(app_data),
        }
    }
}

#[derive(Tags)]
enum InstructorTags {
    /// Instructor workspace
    Instructor,
}

fn responses(lessons: Vec<lesson::Model>) -> Json<Vec<LessonResponse>> {
    Json(lessons.into_iter().map(LessonResponse::from).collect())
}

#[OpenApi(prefix_path = "/instructor")]
impl InstructorApi {
    #[oai(path = "/dashboard", method = "get", tag = "InstructorTags::Instructor")]
    async fn dashboard(&self, req: &Request) -> ApiResult<Json<InstructorDashboardResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        Ok(Json(self.instructor_coordinator.dashboard(&ctx).await?))
    }

    #[oai(path = "/profile", method = "get", tag = "InstructorTags::Instructor")]
    async fn profile(&self, req: &Request) -> ApiResult<Json<UserResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        Ok(Json(self.instructor_coordinator.profile(&ctx).await?.into()))
    }

    /// Edit the caller's own profile; the role cannot change here
    #[oai(path = "/profile", method = "put", tag = "InstructorTags::Instructor")]
    async fn update_profile(
        &self,
        req: &Request,
        body: Json<InstructorProfileUpdate>,
    ) -> ApiResult<Json<UserResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let user = self.instructor_coordinator.update_profile(&ctx, body.0).await?;
        Ok(Json(user.into()))
    }

    #[oai(path = "/lessons", method = "get", tag = "InstructorTags::Instructor")]
    async fn lessons(
        &self,
        req: &Request,
        skip: Query<Option<u64>>,
        limit: Query<Option<u64>>,
        status: Query<Option<LessonStatus>>,
    ) -> ApiResult<Json<Vec<LessonResponse>>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let (skip, limit) = helpers::pagination(skip.0, limit.0)?;
        Ok(responses(
            self.instructor_coordinator
                .lessons(&ctx, status.0, skip, limit)
                .await?,
        ))
    }

    /// Next scheduled lessons, soonest first
    #[oai(path = "/lessons/upcoming", method = "get", tag = "InstructorTags::Instructor")]
    async fn upcoming_lessons(&self, req: &Request, limit: Query<Option<u64>>) -> ApiResult<Json<Vec<LessonResponse>>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let limit = limit.0.unwrap_or(DEFAULT_UPCOMING_LIMIT);
        if !(1..=MAX_UPCOMING_LIMIT).contains(&limit) {
            return Err(ApiError::unprocessable(format!(
                "limit must be between 1 and {}",
                MAX_UPCOMING_LIMIT
            )));
        }

        Ok(responses(
            self.instructor_coordinator
                .upcoming_lessons(&ctx, limit)
                .await?,
        ))
    }

    #[oai(path = "/lessons/today", method = "get", tag = "InstructorTags::Instructor")]
    async fn today_lessons(&self, req: &Request) -> ApiResult<Json<Vec<LessonResponse>>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        Ok(responses(self.instructor_coordinator.today_lessons(&ctx).await?))
    }

    #[oai(path = "/lessons/:lesson_id", method = "get", tag = "InstructorTags::Instructor")]
    async fn lesson(&self, req: &Request, lesson_id: Path<i32>) -> ApiResult<Json<LessonResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        Ok(Json(self.instructor_coordinator.lesson(&ctx, lesson_id.0).await?.into()))
    }

    /// Update one of the caller's lessons; participants are fixed
    #[oai(path = "/lessons/:lesson_id", method = "put", tag = "InstructorTags::Instructor")]
    async fn update_lesson(
        &self,
        req: &Request,
        lesson_id: Path<i32>,
        body: Json<LessonUpdateRequest>,
    ) -> ApiResult<Json<LessonResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let lesson = self
            .instructor_coordinator
            .update_lesson(&ctx, lesson_id.0, body.0)
            .await?;
        Ok(Json(lesson.into()))
    }

    #[oai(path = "/lessons/:lesson_id/complete", method = "post", tag = "InstructorTags::Instructor")]
    async fn complete_lesson(
        &self,
        req: &Request,
        lesson_id: Path<i32>,
        body: Json<LessonCompletionRequest>,
    ) -> ApiResult<Json<LessonActionResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let lesson = self
            .instructor_coordinator
            .complete_lesson(&ctx, lesson_id.0, body.0)
            .await?;
        Ok(Json(LessonActionResponse {
            message: "Lesson marked as completed".to_string(),
            lesson: lesson.into(),
        }))
    }

    #[oai(path = "/lessons/:lesson_id/cancel", method = "post", tag = "InstructorTags::Instructor")]
    async fn cancel_lesson(
        &self,
        req: &Request,
        lesson_id: Path<i32>,
        cancellation_reason: Query<String>,
    ) -> ApiResult<Json<LessonActionResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let lesson = self
            .instructor_coordinator
            .cancel_lesson(&ctx, lesson_id.0, Some(cancellation_reason.0))
            .await?;
        Ok(Json(LessonActionResponse {
            message: "Lesson cancelled successfully".to_string(),
            lesson: lesson.into(),
        }))
    }

    /// Students the caller has taught or is booked with
    #[oai(path = "/students", method = "get", tag = "InstructorTags::Instructor")]
    async fn students(&self, req: &Request) -> ApiResult<Json<Vec<UserResponse>>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let students = self.instructor_coordinator.students(&ctx).await?;
        Ok(Json(students.into_iter().map(UserResponse::from).collect()))
    }

    #[oai(path = "/students/:student_id/lessons", method = "get", tag = "InstructorTags::Instructor")]
    async fn student_lessons(
        &self,
        req: &Request,
        student_id: Path<i32>,
        skip: Query<Option<u64>>,
        limit: Query<Option<u64>>,
        status: Query<Option<LessonStatus>>,
    ) -> ApiResult<Json<Vec<LessonResponse>>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let (skip, limit) = helpers::pagination(skip.0, limit.0)?;
        Ok(responses(
            self.instructor_coordinator
                .student_lessons(&ctx, student_id.0, status.0, skip, limit)
                .await?,
        ))
    }

    /// Scheduled lessons grouped by day, starting today
    #[oai(path = "/schedule", method = "get", tag = "InstructorTags::Instructor")]
    async fn schedule(&self, req: &Request, days: Query<Option<i64>>) -> ApiResult<Json<ScheduleResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        if days.0.is_some_and(|days| !(1..=365).contains(&days)) {
            return Err(ApiError::unprocessable("days must be between 1 and 365"));
        }
        Ok(Json(self.instructor_coordinator.schedule(&ctx, days.0).await?))
    }

    /// Teaching summary for a date range, month to date by default
    #[oai(path = "/reports/summary", method = "get", tag = "InstructorTags::Instructor")]
    async fn summary_report(
        &self,
        req: &Request,
        date_from: Query<Option<DateTime<Utc>>>,
        date_to: Query<Option<DateTime<Utc>>>,
    ) -> ApiResult<Json<InstructorSummaryReport>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        Ok(Json(
            self.instructor_coordinator
                .summary_report(&ctx, date_from.0, date_to.0)
                .await?,
        ))
    }
}
