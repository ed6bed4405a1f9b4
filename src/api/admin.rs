use std::sync::Arc;

use chrono::{DateTime, Utc};
use poem::Request;
use poem_openapi::param::{Path, Query};
use poem_openapi::payload::Json;
use poem_openapi::{ApiResponse, OpenApi, Tags};

use crate::api::{ApiResult, helpers};
use crate::app_data::AppData;
use crate::coordinators::AdminCoordinator;
use crate::providers::TokenProvider;
use crate::types::dto::admin::{
    AdminDashboardResponse, AssignInstructorRoleRequest, InstructorRoleResponse, InstructorWithRolesResponse,
    LessonReportResponse, PromoteToAdminRequest, RoleUpdateRequest, UserReportResponse,
};
use crate::types::dto::lesson::{
    BulkLessonCreateRequest, BulkLessonCreateResponse, LessonCreateRequest, LessonResponse, LessonUpdateRequest,
};
use crate::types::dto::user::{
    BulkUserCreateRequest, BulkUserCreateResponse, UserCreateRequest, UserResponse, UserSummary, UserUpdateRequest,
};
use crate::types::dto::{CountResponse, MessageResponse};
use crate::types::internal::lesson::LessonStatus;
use crate::types::internal::lesson_query::LessonFilter;
use crate::types::internal::role::Role;
use crate::types::internal::user::UserFilter;

/// Admin-only management endpoints
pub struct AdminApi {
    admin_coordinator: AdminCoordinator,
    token_provider: Arc<TokenProvider>,
}

impl AdminApi {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            token_provider: app_data.token_provider.clone(),
            admin_coordinator: AdminCoordinator::new(app_data),
        }
    }
}

/// API tags for admin endpoints
#[derive(Tags)]
enum AdminTags {
    /// Admin user and lesson management
    Admin,
    /// Admin reports
    Reports,
    /// Instructor-role catalog
    InstructorRoles,
}

/// 207 when any row was rejected
#[derive(ApiResponse)]
pub enum BulkUsersResponse {
    #[oai(status = 200)]
    Ok(Json<BulkUserCreateResponse>),
    #[oai(status = 207)]
    MultiStatus(Json<BulkUserCreateResponse>),
}

/// 207 when any row was rejected
#[derive(ApiResponse)]
pub enum BulkLessonsResponse {
    #[oai(status = 200)]
    Ok(Json<BulkLessonCreateResponse>),
    #[oai(status = 207)]
    MultiStatus(Json<BulkLessonCreateResponse>),
}

fn user_filter(role: Option<Role>, is_active: Option<bool>) -> UserFilter {
    UserFilter {
        role,
        is_active,
        ..Default::default()
    }
}

fn lesson_filter(
    status: Option<LessonStatus>,
    date_from: Option<DateTime<Utc>>,
    date_to: Option<DateTime<Utc>>,
) -> LessonFilter {
    let mut filter = LessonFilter::default()
        .between(
            date_from.map(|d| d.timestamp()),
            date_to.map(|d| d.timestamp()),
        )
        .newest_first();
    filter.status = status;
    filter
}

#[OpenApi(prefix_path = "/admin")]
impl AdminApi {
    /// System-wide counters
    #[oai(path = "/dashboard", method = "get", tag = "AdminTags::Admin")]
    async fn dashboard(&self, req: &Request) -> ApiResult<Json<AdminDashboardResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        Ok(Json(self.admin_coordinator.dashboard(&ctx).await?))
    }

    #[oai(path = "/users", method = "get", tag = "AdminTags::Admin")]
    async fn list_users(
        &self,
        req: &Request,
        skip: Query<Option<u64>>,
        limit: Query<Option<u64>>,
        role: Query<Option<Role>>,
        is_active: Query<Option<bool>>,
    ) -> ApiResult<Json<Vec<UserResponse>>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let (skip, limit) = helpers::pagination(skip.0, limit.0)?;

        let filter = UserFilter {
            skip,
            limit: Some(limit),
            ..user_filter(role.0, is_active.0)
        };
        let users = self.admin_coordinator.list_users(&ctx, filter).await?;
        Ok(Json(users.into_iter().map(UserResponse::from).collect()))
    }

    #[oai(path = "/users", method = "post", tag = "AdminTags::Admin")]
    async fn create_user(&self, req: &Request, body: Json<UserCreateRequest>) -> ApiResult<Json<UserResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let user = self.admin_coordinator.create_user(&ctx, body.0).await?;
        Ok(Json(user.into()))
    }

    #[oai(path = "/users/count", method = "get", tag = "AdminTags::Admin")]
    async fn count_users(
        &self,
        req: &Request,
        role: Query<Option<Role>>,
        is_active: Query<Option<bool>>,
    ) -> ApiResult<Json<CountResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let count = self
            .admin_coordinator
            .count_users(&ctx, user_filter(role.0, is_active.0))
            .await?;
        Ok(Json(CountResponse { count }))
    }

    /// Create many users; each row succeeds or fails on its own
    #[oai(path = "/users/bulk", method = "post", tag = "AdminTags::Admin")]
    async fn bulk_create_users(&self, req: &Request, body: Json<BulkUserCreateRequest>) -> ApiResult<BulkUsersResponse> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let outcome = self.admin_coordinator.bulk_create_users(&ctx, body.0.users).await?;

        let partial = outcome.has_errors();
        let response = BulkUserCreateResponse {
            message: outcome.message("users"),
            created: outcome.created.len() as u32,
            errors: outcome.errors,
            users: outcome.created.into_iter().map(UserResponse::from).collect(),
        };
        Ok(if partial {
            BulkUsersResponse::MultiStatus(Json(response))
        } else {
            BulkUsersResponse::Ok(Json(response))
        })
    }

    #[oai(path = "/users/promote-to-admin", method = "post", tag = "AdminTags::Admin")]
    async fn promote_to_admin(
        &self,
        req: &Request,
        body: Json<PromoteToAdminRequest>,
    ) -> ApiResult<Json<UserResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let user = self.admin_coordinator.promote_to_admin(&ctx, body.user_id).await?;
        Ok(Json(user.into()))
    }

    #[oai(path = "/users/:user_id", method = "get", tag = "AdminTags::Admin")]
    async fn get_user(&self, req: &Request, user_id: Path<i32>) -> ApiResult<Json<UserResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let user = self.admin_coordinator.get_user(&ctx, user_id.0).await?;
        Ok(Json(user.into()))
    }

    #[oai(path = "/users/:user_id", method = "put", tag = "AdminTags::Admin")]
    async fn update_user(
        &self,
        req: &Request,
        user_id: Path<i32>,
        body: Json<UserUpdateRequest>,
    ) -> ApiResult<Json<UserResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let user = self.admin_coordinator.update_user(&ctx, user_id.0, body.0).await?;
        Ok(Json(user.into()))
    }

    #[oai(path = "/users/:user_id", method = "delete", tag = "AdminTags::Admin")]
    async fn delete_user(&self, req: &Request, user_id: Path<i32>) -> ApiResult<Json<MessageResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let username = self.admin_coordinator.delete_user(&ctx, user_id.0).await?;
        Ok(Json(MessageResponse::new(format!("User {} deleted successfully", username))))
    }

    /// Change a user's role; admins cannot change their own
    #[oai(path = "/users/:user_id/role", method = "put", tag = "AdminTags::Admin")]
    async fn update_role(
        &self,
        req: &Request,
        user_id: Path<i32>,
        body: Json<RoleUpdateRequest>,
    ) -> ApiResult<Json<UserResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let user = self.admin_coordinator.update_role(&ctx, user_id.0, body.role).await?;
        Ok(Json(user.into()))
    }

    /// All lessons, newest first
    #[oai(path = "/lessons", method = "get", tag = "AdminTags::Admin")]
    async fn list_lessons(
        &self,
        req: &Request,
        skip: Query<Option<u64>>,
        limit: Query<Option<u64>>,
        status: Query<Option<LessonStatus>>,
        date_from: Query<Option<DateTime<Utc>>>,
        date_to: Query<Option<DateTime<Utc>>>,
    ) -> ApiResult<Json<Vec<LessonResponse>>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let (skip, limit) = helpers::pagination(skip.0, limit.0)?;

        let filter = lesson_filter(status.0, date_from.0, date_to.0).page(skip, limit);
        let lessons = self.admin_coordinator.list_lessons(&ctx, filter).await?;
        Ok(Json(lessons.into_iter().map(LessonResponse::from).collect()))
    }

    #[oai(path = "/lessons", method = "post", tag = "AdminTags::Admin")]
    async fn create_lesson(&self, req: &Request, body: Json<LessonCreateRequest>) -> ApiResult<Json<LessonResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let lesson = self.admin_coordinator.create_lesson(&ctx, body.0).await?;
        Ok(Json(lesson.into()))
    }

    #[oai(path = "/lessons/count", method = "get", tag = "AdminTags::Admin")]
    async fn count_lessons(
        &self,
        req: &Request,
        status: Query<Option<LessonStatus>>,
        date_from: Query<Option<DateTime<Utc>>>,
        date_to: Query<Option<DateTime<Utc>>>,
    ) -> ApiResult<Json<CountResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let count = self
            .admin_coordinator
            .count_lessons(&ctx, lesson_filter(status.0, date_from.0, date_to.0))
            .await?;
        Ok(Json(CountResponse { count }))
    }

    /// Create many lessons; each row succeeds or fails on its own
    #[oai(path = "/lessons/bulk", method = "post", tag = "AdminTags::Admin")]
    async fn bulk_create_lessons(
        &self,
        req: &Request,
        body: Json<BulkLessonCreateRequest>,
    ) -> ApiResult<BulkLessonsResponse> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let outcome = self
            .admin_coordinator
            .bulk_create_lessons(&ctx, body.0.lessons)
            .await?;

        let partial = outcome.has_errors();
        let response = BulkLessonCreateResponse {
            message: outcome.message("lessons"),
            created: outcome.created.len() as u32,
            errors: outcome.errors,
            lessons: outcome.created.into_iter().map(LessonResponse::from).collect(),
        };
        Ok(if partial {
            BulkLessonsResponse::MultiStatus(Json(response))
        } else {
            BulkLessonsResponse::Ok(Json(response))
        })
    }

    #[oai(path = "/lessons/:lesson_id", method = "get", tag = "AdminTags::Admin")]
    async fn get_lesson(&self, req: &Request, lesson_id: Path<i32>) -> ApiResult<Json<LessonResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let lesson = self.admin_coordinator.get_lesson(&ctx, lesson_id.0).await?;
        Ok(Json(lesson.into()))
    }

    #[oai(path = "/lessons/:lesson_id", method = "put", tag = "AdminTags::Admin")]
    async fn update_lesson(
        &self,
        req: &Request,
        lesson_id: Path<i32>,
        body: Json<LessonUpdateRequest>,
    ) -> ApiResult<Json<LessonResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let lesson = self.admin_coordinator.update_lesson(&ctx, lesson_id.0, body.0).await?;
        Ok(Json(lesson.into()))
    }

    #[oai(path = "/lessons/:lesson_id", method = "delete", tag = "AdminTags::Admin")]
    async fn delete_lesson(&self, req: &Request, lesson_id: Path<i32>) -> ApiResult<Json<MessageResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        self.admin_coordinator.delete_lesson(&ctx, lesson_id.0).await?;
        Ok(Json(MessageResponse::new("Lesson deleted successfully")))
    }

    /// Per-user lesson counters
    #[oai(path = "/reports/users", method = "get", tag = "AdminTags::Reports")]
    async fn user_report(
        &self,
        req: &Request,
        skip: Query<Option<u64>>,
        limit: Query<Option<u64>>,
    ) -> ApiResult<Json<Vec<UserReportResponse>>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let (skip, limit) = helpers::pagination(skip.0, limit.0)?;
        Ok(Json(self.admin_coordinator.user_report(&ctx, skip, limit).await?))
    }

    /// Lesson statistics for a date range, month to date by default
    #[oai(path = "/reports/lessons", method = "get", tag = "AdminTags::Reports")]
    async fn lesson_report(
        &self,
        req: &Request,
        date_from: Query<Option<DateTime<Utc>>>,
        date_to: Query<Option<DateTime<Utc>>>,
    ) -> ApiResult<Json<LessonReportResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        Ok(Json(
            self.admin_coordinator
                .lesson_report(&ctx, date_from.0, date_to.0)
                .await?,
        ))
    }

    #[oai(path = "/instructor-roles", method = "get", tag = "AdminTags::InstructorRoles")]
    async fn instructor_roles(&self, req: &Request) -> ApiResult<Json<Vec<InstructorRoleResponse>>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let roles = self.admin_coordinator.instructor_roles(&ctx).await?;
        Ok(Json(roles.iter().map(InstructorRoleResponse::from).collect()))
    }

    #[oai(path = "/instructor-roles/assign", method = "post", tag = "AdminTags::InstructorRoles")]
    async fn assign_instructor_role(
        &self,
        req: &Request,
        body: Json<AssignInstructorRoleRequest>,
    ) -> ApiResult<Json<MessageResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let (instructor, role) = self
            .admin_coordinator
            .assign_instructor_role(&ctx, body.instructor_id, &body.role_id)
            .await?;
        Ok(Json(MessageResponse::new(format!(
            "Role '{}' assigned to {}",
            role.name, instructor.username
        ))))
    }

    #[oai(
        path = "/instructor-roles/remove/:instructor_id/:role_id",
        method = "delete",
        tag = "AdminTags::InstructorRoles"
    )]
    async fn remove_instructor_role(
        &self,
        req: &Request,
        instructor_id: Path<i32>,
        role_id: Path<String>,
    ) -> ApiResult<Json<MessageResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let (instructor, role) = self
            .admin_coordinator
            .remove_instructor_role(&ctx, instructor_id.0, &role_id.0)
            .await?;
        Ok(Json(MessageResponse::new(format!(
            "Role '{}' removed from {}",
            role.name, instructor.username
        ))))
    }

    #[oai(path = "/instructors/:instructor_id/roles", method = "get", tag = "AdminTags::InstructorRoles")]
    async fn roles_of_instructor(
        &self,
        req: &Request,
        instructor_id: Path<i32>,
    ) -> ApiResult<Json<InstructorWithRolesResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let (instructor, roles) = self
            .admin_coordinator
            .roles_of_instructor(&ctx, instructor_id.0)
            .await?;
        Ok(Json(InstructorWithRolesResponse {
            instructor: UserSummary::from(&instructor),
            roles: roles.into_iter().map(InstructorRoleResponse::from).collect(),
        }))
    }
}
