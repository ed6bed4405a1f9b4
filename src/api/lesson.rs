use std::sync::Arc;

use poem::Request;
use poem_openapi::param::{Path, Query};
use poem_openapi::payload::Json;
use poem_openapi::{OpenApi, Tags};

use crate::api::{ApiResult, helpers};
use crate::app_data::AppData;
use crate::coordinators::LessonCoordinator;
use crate::providers::TokenProvider;
use crate::types::db::lesson;
use crate::types::dto::MessageResponse;
use crate::types::dto::lesson::{LessonCreateRequest, LessonResponse, LessonUpdateRequest, RescheduleRequest};

pub struct LessonApi {
    lesson_coordinator: LessonCoordinator,
    token_provider: Arc<TokenProvider>,
}

impl LessonApi {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            token_provider: app_data.token_provider.clone(),
            lesson_coordinator: LessonCoordinator::new(app_data),
        }
    }
}

#[derive(Tags)]
enum LessonTags {
    /// Lesson booking and lifecycle
    Lessons,
}

fn responses(lessons: Vec<lesson::Model>) -> Json<Vec<LessonResponse>> {
    Json(lessons.into_iter().map(LessonResponse::from).collect())
}

#[OpenApi(prefix_path = "/lessons")]
impl LessonApi {
    /// List lessons: instructors see the ones they teach, admins see all
    #[oai(path = "/", method = "get", tag = "LessonTags::Lessons")]
    async fn list(
        &self,
        req: &Request,
        skip: Query<Option<u64>>,
        limit: Query<Option<u64>>,
    ) -> ApiResult<Json<Vec<LessonResponse>>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let (skip, limit) = helpers::pagination(skip.0, limit.0)?;
        Ok(responses(self.lesson_coordinator.list(&ctx, skip, limit).await?))
    }

    /// Book a lesson
    ///
    /// Instructors may only book lessons they teach. A clash with another
    /// scheduled lesson of the same teacher is a 409.
    #[oai(path = "/", method = "post", tag = "LessonTags::Lessons")]
    async fn create(&self, req: &Request, body: Json<LessonCreateRequest>) -> ApiResult<Json<LessonResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let lesson = self.lesson_coordinator.create(&ctx, body.0).await?;
        Ok(Json(lesson.into()))
    }

    #[oai(path = "/teacher/:teacher_id", method = "get", tag = "LessonTags::Lessons")]
    async fn by_teacher(
        &self,
        req: &Request,
        teacher_id: Path<i32>,
        skip: Query<Option<u64>>,
        limit: Query<Option<u64>>,
    ) -> ApiResult<Json<Vec<LessonResponse>>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let (skip, limit) = helpers::pagination(skip.0, limit.0)?;
        Ok(responses(
            self.lesson_coordinator
                .by_teacher(&ctx, teacher_id.0, skip, limit)
                .await?,
        ))
    }

    #[oai(path = "/student/:student_id", method = "get", tag = "LessonTags::Lessons")]
    async fn by_student(
        &self,
        req: &Request,
        student_id: Path<i32>,
        skip: Query<Option<u64>>,
        limit: Query<Option<u64>>,
    ) -> ApiResult<Json<Vec<LessonResponse>>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let (skip, limit) = helpers::pagination(skip.0, limit.0)?;
        Ok(responses(
            self.lesson_coordinator
                .by_student(&ctx, student_id.0, skip, limit)
                .await?,
        ))
    }

    #[oai(path = "/:lesson_id", method = "get", tag = "LessonTags::Lessons")]
    async fn get(&self, req: &Request, lesson_id: Path<i32>) -> ApiResult<Json<LessonResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let lesson = self.lesson_coordinator.get(&ctx, lesson_id.0).await?;
        Ok(Json(lesson.into()))
    }

    /// Update a lesson; students may only touch `notes`
    #[oai(path = "/:lesson_id", method = "put", tag = "LessonTags::Lessons")]
    async fn update(
        &self,
        req: &Request,
        lesson_id: Path<i32>,
        body: Json<LessonUpdateRequest>,
    ) -> ApiResult<Json<LessonResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let lesson = self.lesson_coordinator.update(&ctx, lesson_id.0, body.0).await?;
        Ok(Json(lesson.into()))
    }

    #[oai(path = "/:lesson_id", method = "delete", tag = "LessonTags::Lessons")]
    async fn delete(&self, req: &Request, lesson_id: Path<i32>) -> ApiResult<Json<MessageResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        self.lesson_coordinator.delete(&ctx, lesson_id.0).await?;
        Ok(Json(MessageResponse::new("Lesson deleted successfully")))
    }

    /// Mark a scheduled lesson completed
    #[oai(path = "/:lesson_id/complete", method = "post", tag = "LessonTags::Lessons")]
    async fn complete(&self, req: &Request, lesson_id: Path<i32>) -> ApiResult<Json<LessonResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let lesson = self.lesson_coordinator.complete(&ctx, lesson_id.0).await?;
        Ok(Json(lesson.into()))
    }

    /// Move a scheduled lesson to a new time; it stays `scheduled`
    #[oai(path = "/:lesson_id/reschedule", method = "post", tag = "LessonTags::Lessons")]
    async fn reschedule(
        &self,
        req: &Request,
        lesson_id: Path<i32>,
        body: Json<RescheduleRequest>,
    ) -> ApiResult<Json<LessonResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let lesson = self
            .lesson_coordinator
            .reschedule(&ctx, lesson_id.0, body.scheduled_at)
            .await?;
        Ok(Json(lesson.into()))
    }
}
