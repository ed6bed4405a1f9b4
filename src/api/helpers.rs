use poem::Request;
use poem::http::header;
use poem_openapi::auth::Bearer;

use crate::errors::ApiError;
use crate::providers::TokenProvider;
use crate::types::internal::context::RequestContext;

pub const DEFAULT_LIMIT: u64 = 100;
pub const MAX_LIMIT: u64 = 1000;

/// Bearer token from the Authorization header
///
/// Read by hand instead of through a `SecurityScheme` parameter so a missing
/// token still reaches the guard chain and gets the uniform 401 body.
pub fn bearer_token(req: &Request) -> Option<Bearer> {
    let value = req.header(header::AUTHORIZATION)?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return None;
    }

    Some(Bearer {
        token: token.trim().to_string(),
    })
}

pub fn request_context(req: &Request, token_provider: &TokenProvider) -> RequestContext {
    let auth = bearer_token(req);
    RequestContext::from_request(req, auth.as_ref(), token_provider)
}

/// Resolve `skip`/`limit` query parameters; `limit` must be 1..=1000
pub fn pagination(skip: Option<u64>, limit: Option<u64>) -> Result<(u64, u64), ApiError> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(ApiError::unprocessable(format!(
            "limit must be between 1 and {}",
            MAX_LIMIT
        )));
    }

    Ok((skip.unwrap_or(0), limit))
}
