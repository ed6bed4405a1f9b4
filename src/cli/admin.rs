use crate::app_data::AppData;
use crate::audit::AuditLogger;
use crate::cli::CreateAdminArgs;
use crate::config::DatabaseConnections;
use crate::errors::InternalError;
use crate::providers::UserProvider;
use crate::types::db::user;
use crate::types::internal::audit::{AuditAction, ResourceType};
use crate::types::internal::context::RequestContext;
use crate::types::internal::role::Role;
use crate::types::internal::user::{UserProfile, UserRegistration};

#[derive(Debug)]
pub struct CreatedAdmin {
    pub user: user::Model,
    /// Set only when the password was generated
    pub generated_password: Option<String>,
}

/// Create an admin account from the command line
///
/// The account and its `CREATE` audit row commit together. The audit row has
/// no actor since no user is signed in.
pub async fn create_admin(app_data: &AppData, args: CreateAdminArgs) -> Result<CreatedAdmin, InternalError> {
    let ctx = RequestContext::for_cli();
    let user_provider = UserProvider::new(app_data.user_store.clone(), app_data.crypto_provider.clone());
    let audit_logger = AuditLogger::new(app_data.audit_store.clone());

    let (password, generated_password) = match args.password {
        Some(password) => (password, None),
        None => {
            let password = user_provider.generate_password();
            (password.clone(), Some(password))
        }
    };

    let txn = app_data.connections.begin().await?;
    let user = user_provider
        .create(
            &txn,
            UserRegistration {
                email: args.email,
                username: args.username,
                full_name: args.full_name,
                password,
                role: Role::Admin,
                is_active: true,
                profile: UserProfile::default(),
            },
        )
        .await?;
    audit_logger
        .log_cli_action(
            &txn,
            &ctx,
            AuditAction::Create,
            ResourceType::User,
            user.id,
            format!("Admin account created from CLI: {}", user.username),
        )
        .await?;
    DatabaseConnections::commit(txn).await?;

    tracing::info!(request_id = %ctx.request_id, user_id = user.id, "Admin account created from CLI");
    Ok(CreatedAdmin { user, generated_password })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::internal::UserError;
    use crate::test::utils::setup_test_app_data;
    use crate::types::internal::audit::AuditFilter;

    fn args(password: Option<&str>) -> CreateAdminArgs {
        CreateAdminArgs {
            username: "root".to_string(),
            email: "root@example.com".to_string(),
            full_name: "Root Admin".to_string(),
            password: password.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_generated_password_is_returned_and_usable() {
        let app_data = setup_test_app_data().await;

        let created = create_admin(&app_data, args(None)).await.unwrap();
        assert_eq!(created.user.role(), Role::Admin);

        let password = created.generated_password.expect("password generated");
        assert!(
            app_data
                .crypto_provider
                .verify_password(&password, &created.user.password_hash)
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_given_password_is_validated() {
        let app_data = setup_test_app_data().await;

        let result = create_admin(&app_data, args(Some("short"))).await;
        assert!(matches!(result, Err(InternalError::Validation { .. })));

        let created = create_admin(&app_data, args(Some("long-enough-password"))).await.unwrap();
        assert!(created.generated_password.is_none());
    }

    #[tokio::test]
    async fn test_writes_cli_audit_row() {
        let app_data = setup_test_app_data().await;
        create_admin(&app_data, args(None)).await.unwrap();

        let rows = app_data
            .audit_store
            .list(&app_data.connections.main, &AuditFilter { limit: 10, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].action, "CREATE");
        assert_eq!(rows[0].user_id, None);
    }

    #[tokio::test]
    async fn test_duplicate_username_is_rejected() {
        let app_data = setup_test_app_data().await;
        create_admin(&app_data, args(None)).await.unwrap();

        let mut second = args(None);
        second.email = "other@example.com".to_string();
        let result = create_admin(&app_data, second).await;
        assert!(matches!(result, Err(InternalError::User(UserError::DuplicateUsername(_)))));
    }
}
