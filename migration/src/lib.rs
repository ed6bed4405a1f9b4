pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_users_table;
mod m20250301_000002_create_lessons_table;
mod m20250301_000003_create_system_settings_table;
mod m20250301_000004_create_audit_logs_table;

/// Schema for the scheduler database.
///
/// Audit logs share the database with the entities they describe so an
/// audit row can commit in the same transaction as its mutation.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_users_table::Migration),
            Box::new(m20250301_000002_create_lessons_table::Migration),
            Box::new(m20250301_000003_create_system_settings_table::Migration),
            Box::new(m20250301_000004_create_audit_logs_table::Migration),
        ]
    }
}
