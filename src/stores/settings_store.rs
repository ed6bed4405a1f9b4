use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, QueryOrder, Set};

use crate::errors::InternalError;
use crate::errors::internal::SettingError;
use crate::types::db::system_setting;

/// Key/value store for runtime system settings
#[derive(Debug, Default)]
pub struct SettingsStore;

impl SettingsStore {
    pub fn new() -> Self {
        Self
    }

    pub async fn find(&self, conn: &impl ConnectionTrait, key: &str) -> Result<Option<system_setting::Model>, InternalError> {
        system_setting::Entity::find_by_id(key.to_string())
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_setting", e))
    }

    pub async fn get(&self, conn: &impl ConnectionTrait, key: &str) -> Result<system_setting::Model, InternalError> {
        self.find(conn, key)
            .await?
            .ok_or_else(|| SettingError::NotFound(key.to_string()).into())
    }

    /// All settings ordered by key
    pub async fn list(&self, conn: &impl ConnectionTrait) -> Result<Vec<system_setting::Model>, InternalError> {
        system_setting::Entity::find()
            .order_by_asc(system_setting::Column::Key)
            .all(conn)
            .await
            .map_err(|e| InternalError::database("list_settings", e))
    }

    /// Insert a new setting
    ///
    /// # Errors
    /// * `SettingError::AlreadyExists` - A setting with this key is present
    pub async fn insert(
        &self,
        conn: &impl ConnectionTrait,
        key: &str,
        value: &str,
        description: Option<String>,
    ) -> Result<system_setting::Model, InternalError> {
        if self.find(conn, key).await?.is_some() {
            return Err(SettingError::AlreadyExists(key.to_string()).into());
        }

        system_setting::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            description: Set(description),
            created_at: Set(Utc::now().timestamp()),
            updated_at: Set(None),
        }
        .insert(conn)
        .await
        .map_err(|e| InternalError::database("insert_setting", e))
    }

    /// Replace the value of an existing setting; the description is only
    /// touched when one is given
    pub async fn update(
        &self,
        conn: &impl ConnectionTrait,
        key: &str,
        value: &str,
        description: Option<String>,
    ) -> Result<system_setting::Model, InternalError> {
        let existing = self.get(conn, key).await?;
        let mut model: system_setting::ActiveModel = existing.into();

        model.value = Set(value.to_string());
        if description.is_some() {
            model.description = Set(description);
        }
        model.updated_at = Set(Some(Utc::now().timestamp()));

        model
            .update(conn)
            .await
            .map_err(|e| InternalError::database("update_setting", e))
    }

    pub async fn upsert(
        &self,
        conn: &impl ConnectionTrait,
        key: &str,
        value: &str,
        description: Option<String>,
    ) -> Result<system_setting::Model, InternalError> {
        match self.find(conn, key).await? {
            Some(_) => self.update(conn, key, value, description).await,
            None => self.insert(conn, key, value, description).await,
        }
    }
}
