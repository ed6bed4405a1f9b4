use sea_orm::entity::prelude::*;

use crate::types::internal::role::Role;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub email: String,
    #[sea_orm(unique)]
    pub username: String,
    pub full_name: String,
    pub password_hash: String,

    // Stored as the lowercase role name; use `Model::role()` for the typed view
    pub role: String,
    pub is_active: bool,

    // Profile
    pub phone: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub notes: Option<String>,
    pub hourly_rate: Option<f64>,
    pub specializations: Option<String>,

    // Comma-joined instructor-role ids, e.g. "role-1,role-4"
    pub instructor_roles: Option<String>,

    pub created_at: i64,
    pub updated_at: Option<i64>,
    pub last_login: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Typed role; unknown values fall back to the least privileged role
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or(Role::Student)
    }

    pub fn instructor_role_ids(&self) -> Vec<String> {
        self.instructor_roles
            .as_deref()
            .map(|joined| {
                joined
                    .split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}
