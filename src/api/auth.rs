use std::sync::Arc;

use poem::Request;
use poem_openapi::payload::{Form, Json};
use poem_openapi::{OpenApi, Tags};

use crate::api::{ApiResult, helpers};
use crate::app_data::AppData;
use crate::coordinators::AuthCoordinator;
use crate::types::dto::MessageResponse;
use crate::types::dto::auth::{ChangePasswordRequest, LoginForm, RegisterRequest, TokenResponse};
use crate::types::dto::user::UserResponse;

/// Registration, login and the caller's own account
pub struct AuthApi {
    auth_coordinator: AuthCoordinator,
}

impl AuthApi {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            auth_coordinator: AuthCoordinator::new(app_data),
        }
    }
}

/// API tags for authentication endpoints
#[derive(Tags)]
enum AuthTags {
    /// Authentication endpoints
    Authentication,
}

#[OpenApi(prefix_path = "/auth")]
impl AuthApi {
    /// Register a new account
    ///
    /// Open to anyone. The role defaults to `student`; `admin` is refused.
    #[oai(path = "/register", method = "post", tag = "AuthTags::Authentication")]
    async fn register(&self, req: &Request, body: Json<RegisterRequest>) -> ApiResult<Json<UserResponse>> {
        let ctx = helpers::request_context(req, &self.auth_coordinator.token_provider());
        let user = self.auth_coordinator.register(&ctx, body.0).await?;
        Ok(Json(user.into()))
    }

    /// Exchange a username (or email) and password for an access token
    ///
    /// Form-encoded. Any failure is reported as the same 401.
    #[oai(path = "/login", method = "post", tag = "AuthTags::Authentication")]
    async fn login(&self, req: &Request, form: Form<LoginForm>) -> ApiResult<Json<TokenResponse>> {
        let ctx = helpers::request_context(req, &self.auth_coordinator.token_provider());
        let (access_token, expires_in) = self
            .auth_coordinator
            .login(&ctx, &form.username, &form.password)
            .await?;

        Ok(Json(TokenResponse {
            access_token,
            token_type: "bearer".to_string(),
            expires_in,
        }))
    }

    /// The authenticated user's own record
    #[oai(path = "/me", method = "get", tag = "AuthTags::Authentication")]
    async fn me(&self, req: &Request) -> ApiResult<Json<UserResponse>> {
        let ctx = helpers::request_context(req, &self.auth_coordinator.token_provider());
        let user = self.auth_coordinator.me(&ctx).await?;
        Ok(Json(user.into()))
    }

    /// Change the authenticated user's password
    ///
    /// Requires the current password. Tokens already issued stay valid until
    /// they expire.
    #[oai(path = "/change-password", method = "post", tag = "AuthTags::Authentication")]
    async fn change_password(
        &self,
        req: &Request,
        body: Json<ChangePasswordRequest>,
    ) -> ApiResult<Json<MessageResponse>> {
        let ctx = helpers::request_context(req, &self.auth_coordinator.token_provider());
        self.auth_coordinator
            .change_password(&ctx, &body.old_password, &body.new_password)
            .await?;

        Ok(Json(MessageResponse::new("Password changed successfully")))
    }
}
