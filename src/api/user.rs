use std::sync::Arc;

use poem::Request;
use poem_openapi::param::{Path, Query};
use poem_openapi::payload::Json;
use poem_openapi::{OpenApi, Tags};

use crate::api::{ApiResult, helpers};
use crate::app_data::AppData;
use crate::coordinators::UserCoordinator;
use crate::providers::TokenProvider;
use crate::types::dto::MessageResponse;
use crate::types::dto::lesson::LessonResponse;
use crate::types::dto::user::{UserCreateRequest, UserResponse, UserUpdateRequest};

pub struct UserApi {
    user_coordinator: UserCoordinator,
    token_provider: Arc<TokenProvider>,
}

impl UserApi {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            token_provider: app_data.token_provider.clone(),
            user_coordinator: UserCoordinator::new(app_data),
        }
    }
}

#[derive(Tags)]
enum UserTags {
    /// User accounts
    Users,
}

#[OpenApi(prefix_path = "/users")]
impl UserApi {
    /// List users (admin or instructor)
    #[oai(path = "/", method = "get", tag = "UserTags::Users")]
    async fn list(
        &self,
        req: &Request,
        skip: Query<Option<u64>>,
        limit: Query<Option<u64>>,
    ) -> ApiResult<Json<Vec<UserResponse>>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let (skip, limit) = helpers::pagination(skip.0, limit.0)?;

        let users = self.user_coordinator.list(&ctx, skip, limit).await?;
        Ok(Json(users.into_iter().map(UserResponse::from).collect()))
    }

    /// Create a user (admin)
    #[oai(path = "/", method = "post", tag = "UserTags::Users")]
    async fn create(&self, req: &Request, body: Json<UserCreateRequest>) -> ApiResult<Json<UserResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let user = self.user_coordinator.create(&ctx, body.0).await?;
        Ok(Json(user.into()))
    }

    /// The caller's lessons: taught for instructors, attended for students
    #[oai(path = "/me/lessons", method = "get", tag = "UserTags::Users")]
    async fn my_lessons(
        &self,
        req: &Request,
        skip: Query<Option<u64>>,
        limit: Query<Option<u64>>,
    ) -> ApiResult<Json<Vec<LessonResponse>>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let (skip, limit) = helpers::pagination(skip.0, limit.0)?;

        let lessons = self.user_coordinator.my_lessons(&ctx, skip, limit).await?;
        Ok(Json(lessons.into_iter().map(LessonResponse::from).collect()))
    }

    /// Future scheduled lessons the caller takes part in
    #[oai(path = "/me/upcoming-lessons", method = "get", tag = "UserTags::Users")]
    async fn my_upcoming_lessons(&self, req: &Request) -> ApiResult<Json<Vec<LessonResponse>>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let lessons = self.user_coordinator.my_upcoming_lessons(&ctx).await?;
        Ok(Json(lessons.into_iter().map(LessonResponse::from).collect()))
    }

    /// Fetch a user (self, admin or instructor)
    #[oai(path = "/:user_id", method = "get", tag = "UserTags::Users")]
    async fn get(&self, req: &Request, user_id: Path<i32>) -> ApiResult<Json<UserResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let user = self.user_coordinator.get(&ctx, user_id.0).await?;
        Ok(Json(user.into()))
    }

    /// Update a user
    ///
    /// Only admins may change `role` or `is_active`, and nobody may change
    /// their own role here.
    #[oai(path = "/:user_id", method = "put", tag = "UserTags::Users")]
    async fn update(
        &self,
        req: &Request,
        user_id: Path<i32>,
        body: Json<UserUpdateRequest>,
    ) -> ApiResult<Json<UserResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let user = self.user_coordinator.update(&ctx, user_id.0, body.0).await?;
        Ok(Json(user.into()))
    }

    /// Delete a user (admin, not self)
    #[oai(path = "/:user_id", method = "delete", tag = "UserTags::Users")]
    async fn delete(&self, req: &Request, user_id: Path<i32>) -> ApiResult<Json<MessageResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        self.user_coordinator.delete(&ctx, user_id.0).await?;
        Ok(Json(MessageResponse::new("User deleted successfully")))
    }
}
