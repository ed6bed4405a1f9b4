#[cfg(test)]
mod tests {
    use poem::Request;

    use crate::api::helpers::*;
    use crate::test::utils::{seed_user, setup_test_app_data};
    use crate::types::internal::role::Role;

    #[test]
    fn test_bearer_token_is_read_from_header() {
        let req = Request::builder().header("Authorization", "Bearer abc.def").finish();
        assert_eq!(bearer_token(&req).map(|b| b.token), Some("abc.def".to_string()));

        let req = Request::builder().header("Authorization", "bearer xyz").finish();
        assert_eq!(bearer_token(&req).map(|b| b.token), Some("xyz".to_string()));
    }

    #[test]
    fn test_other_schemes_are_ignored() {
        let req = Request::builder().header("Authorization", "Basic dXNlcjpwYXNz").finish();
        assert!(bearer_token(&req).is_none());

        let req = Request::builder().header("Authorization", "Bearer ").finish();
        assert!(bearer_token(&req).is_none());

        assert!(bearer_token(&Request::builder().finish()).is_none());
    }

    #[tokio::test]
    async fn test_request_context_with_valid_token() {
        let app_data = setup_test_app_data().await;
        let user = seed_user(&app_data, "alice", Role::Student).await;
        let token = app_data.token_provider.issue_token(&user).unwrap();

        let req = Request::builder()
            .header("Authorization", format!("Bearer {}", token))
            .header("User-Agent", "tests")
            .finish();
        let ctx = request_context(&req, &app_data.token_provider);

        assert!(ctx.authenticated);
        assert_eq!(ctx.claimed_user_id(), Some(user.id));
        assert_eq!(ctx.user_agent.as_deref(), Some("tests"));
    }

    #[tokio::test]
    async fn test_request_context_with_tampered_token() {
        let app_data = setup_test_app_data().await;
        let user = seed_user(&app_data, "alice", Role::Student).await;
        let token = app_data.token_provider.issue_token(&user).unwrap();

        let req = Request::builder()
            .header("Authorization", format!("Bearer {}x", token))
            .finish();
        let ctx = request_context(&req, &app_data.token_provider);

        assert!(!ctx.authenticated);
        assert!(ctx.claims.is_none());
    }

    #[test]
    fn test_pagination_defaults_and_bounds() {
        assert_eq!(pagination(None, None).unwrap(), (0, DEFAULT_LIMIT));
        assert_eq!(pagination(Some(20), Some(5)).unwrap(), (20, 5));
        assert_eq!(pagination(None, Some(0)).unwrap_err().status_code(), 422);
        assert_eq!(pagination(None, Some(MAX_LIMIT + 1)).unwrap_err().status_code(), 422);
    }
}
