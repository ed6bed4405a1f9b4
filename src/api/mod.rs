// API layer - HTTP endpoints
pub mod admin;
pub mod admin_system;
pub mod auth;
pub mod health;
pub mod helpers;
pub mod instructor;
pub mod lesson;
pub mod user;

#[cfg(test)]
mod helpers_test;

use std::sync::Arc;

pub use admin::AdminApi;
pub use admin_system::AdminSystemApi;
pub use auth::AuthApi;
pub use health::HealthApi;
pub use instructor::InstructorApi;
pub use lesson::LessonApi;
pub use user::UserApi;

use poem::Route;
use poem_openapi::OpenApiService;

use crate::app_data::AppData;
use crate::errors::ApiError;

pub type ApiResult<T> = Result<T, ApiError>;

pub const API_TITLE: &str = "Lesson Scheduler API";

/// Every endpoint group in one OpenAPI service
pub fn api_service(app_data: Arc<AppData>, server_url: &str) -> OpenApiService<impl poem_openapi::OpenApi, ()> {
    let apis = (
        HealthApi,
        AuthApi::new(app_data.clone()),
        UserApi::new(app_data.clone()),
        LessonApi::new(app_data.clone()),
        AdminApi::new(app_data.clone()),
        AdminSystemApi::new(app_data.clone()),
        InstructorApi::new(app_data),
    );

    OpenApiService::new(apis, API_TITLE, env!("CARGO_PKG_VERSION")).server(server_url)
}

/// Route tree served by the binary: the API under `/api`, Swagger UI under `/swagger`
pub fn routes(app_data: Arc<AppData>, server_url: &str) -> Route {
    let service = api_service(app_data, server_url);
    let ui = service.swagger_ui();

    Route::new().nest("/api", service).nest("/swagger", ui)
}
