use std::sync::Arc;

use sea_orm::ConnectionTrait;

use crate::errors::InternalError;
use crate::errors::internal::UserError;
use crate::stores::UserStore;
use crate::types::db::user;

/// One entry of the static instrument-role catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructorRole {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Suffix of the `teach_*` permission
    pub instrument: &'static str,
}

impl InstructorRole {
    pub fn permissions(&self) -> Vec<String> {
        vec![
            format!("teach_{}", self.instrument),
            "schedule_lessons".to_string(),
            "view_students".to_string(),
        ]
    }
}

const fn role(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    instrument: &'static str,
) -> InstructorRole {
    InstructorRole { id, name, description, instrument }
}

pub const INSTRUCTOR_ROLES: [InstructorRole; 25] = [
    role("role-1", "Piano Instructor", "Certified piano teacher", "piano"),
    role("role-2", "Guitar Instructor", "Professional guitar instructor", "guitar"),
    role("role-3", "Voice Coach", "Vocal training specialist", "vocals"),
    role("role-4", "Violin Instructor", "Classical and contemporary violin teacher", "violin"),
    role("role-5", "Trumpet Instructor", "Brass instrument specialist - trumpet", "trumpet"),
    role("role-6", "Clarinet Instructor", "Woodwind instrument teacher - clarinet", "clarinet"),
    role("role-7", "Saxophone Instructor", "Professional saxophone teacher", "saxophone"),
    role("role-8", "Flute Instructor", "Woodwind specialist - flute", "flute"),
    role("role-9", "Drums Instructor", "Percussion and drum kit teacher", "drums"),
    role("role-10", "Cello Instructor", "String instrument teacher - cello", "cello"),
    role("role-11", "Trombone Instructor", "Brass instrument specialist - trombone", "trombone"),
    role("role-12", "French Horn Instructor", "Advanced brass instrument teacher", "french_horn"),
    role("role-13", "Oboe Instructor", "Double reed woodwind specialist", "oboe"),
    role("role-14", "Bassoon Instructor", "Double reed woodwind teacher - bassoon", "bassoon"),
    role("role-15", "Viola Instructor", "String instrument teacher - viola", "viola"),
    role("role-16", "Double Bass Instructor", "String bass and upright bass teacher", "double_bass"),
    role("role-17", "Tuba Instructor", "Low brass instrument specialist", "tuba"),
    role("role-18", "Harp Instructor", "Classical and contemporary harp teacher", "harp"),
    role("role-19", "Percussion Instructor", "General percussion and mallet instruments", "percussion"),
    role("role-20", "Ukulele Instructor", "Four-string ukulele teacher", "ukulele"),
    role("role-21", "Bass Guitar Instructor", "Electric and acoustic bass guitar teacher", "bass_guitar"),
    role("role-22", "Banjo Instructor", "Traditional and bluegrass banjo teacher", "banjo"),
    role("role-23", "Mandolin Instructor", "String instrument teacher - mandolin", "mandolin"),
    role("role-24", "Accordion Instructor", "Traditional and modern accordion teacher", "accordion"),
    role("role-25", "Harmonica Instructor", "Blues and folk harmonica specialist", "harmonica"),
];

/// Catalog lookups and assignment of catalog roles to instructors
pub struct InstructorRoleCatalog {
    user_store: Arc<UserStore>,
}

impl InstructorRoleCatalog {
    pub fn new(user_store: Arc<UserStore>) -> Self {
        Self { user_store }
    }

    pub fn all(&self) -> &'static [InstructorRole] {
        &INSTRUCTOR_ROLES
    }

    pub fn find(&self, role_id: &str) -> Option<&'static InstructorRole> {
        INSTRUCTOR_ROLES.iter().find(|r| r.id == role_id)
    }

    pub fn get(&self, role_id: &str) -> Result<&'static InstructorRole, InternalError> {
        self.find(role_id)
            .ok_or_else(|| UserError::UnknownInstructorRole(role_id.to_string()).into())
    }

    /// Catalog entries for the ids stored on a user; unknown ids are skipped
    pub fn roles_of(&self, instructor: &user::Model) -> Vec<&'static InstructorRole> {
        instructor
            .instructor_role_ids()
            .iter()
            .filter_map(|id| self.find(id))
            .collect()
    }

    async fn instructor(&self, conn: &impl ConnectionTrait, instructor_id: i32) -> Result<user::Model, InternalError> {
        let instructor = self.user_store.get_by_id(conn, instructor_id).await?;
        if !instructor.role().can_teach() {
            return Err(UserError::NotAnInstructor(instructor_id).into());
        }
        Ok(instructor)
    }

    /// Add `role_id` to the instructor; assigning an already-held role is a no-op
    pub async fn assign(
        &self,
        conn: &impl ConnectionTrait,
        instructor_id: i32,
        role_id: &str,
    ) -> Result<(user::Model, &'static InstructorRole), InternalError> {
        let role = self.get(role_id)?;
        let instructor = self.instructor(conn, instructor_id).await?;

        let mut ids = instructor.instructor_role_ids();
        if ids.iter().any(|id| id == role.id) {
            return Ok((instructor, role));
        }
        ids.push(role.id.to_string());

        let updated = self.user_store.set_instructor_roles(conn, instructor_id, &ids).await?;
        Ok((updated, role))
    }

    pub async fn remove(
        &self,
        conn: &impl ConnectionTrait,
        instructor_id: i32,
        role_id: &str,
    ) -> Result<(user::Model, &'static InstructorRole), InternalError> {
        let role = self.get(role_id)?;
        let instructor = self.instructor(conn, instructor_id).await?;

        let ids: Vec<String> = instructor
            .instructor_role_ids()
            .into_iter()
            .filter(|id| id != role.id)
            .collect();

        let updated = self.user_store.set_instructor_roles(conn, instructor_id, &ids).await?;
        Ok((updated, role))
    }

    /// The instructor together with their catalog roles
    pub async fn instructor_with_roles(
        &self,
        conn: &impl ConnectionTrait,
        instructor_id: i32,
    ) -> Result<(user::Model, Vec<&'static InstructorRole>), InternalError> {
        let instructor = self.instructor(conn, instructor_id).await?;
        let roles = self.roles_of(&instructor);
        Ok((instructor, roles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::utils::{new_user, setup_test_db};
    use crate::types::internal::role::Role;

    #[test]
    fn test_catalog_has_unique_ids_and_three_permissions_each() {
        let mut ids: Vec<&str> = INSTRUCTOR_ROLES.iter().map(|r| r.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 25);

        let piano = &INSTRUCTOR_ROLES[0];
        assert_eq!(piano.permissions(), vec!["teach_piano", "schedule_lessons", "view_students"]);
        assert_eq!(INSTRUCTOR_ROLES[24].name, "Harmonica Instructor");
    }

    #[tokio::test]
    async fn test_assign_is_idempotent_and_remove_drops_role() {
        let db = setup_test_db().await;
        let store = Arc::new(UserStore::new());
        let teacher = store.insert(&db, new_user("teach", Role::Instructor)).await.unwrap();
        let catalog = InstructorRoleCatalog::new(store);

        catalog.assign(&db, teacher.id, "role-1").await.unwrap();
        catalog.assign(&db, teacher.id, "role-4").await.unwrap();
        let (again, _) = catalog.assign(&db, teacher.id, "role-1").await.unwrap();
        assert_eq!(again.instructor_roles.as_deref(), Some("role-1,role-4"));

        let (after, removed) = catalog.remove(&db, teacher.id, "role-1").await.unwrap();
        assert_eq!(removed.name, "Piano Instructor");
        assert_eq!(after.instructor_role_ids(), vec!["role-4".to_string()]);

        let (_, last) = catalog.remove(&db, teacher.id, "role-4").await.unwrap();
        assert_eq!(last.id, "role-4");
        let (cleared, roles) = catalog.instructor_with_roles(&db, teacher.id).await.unwrap();
        assert!(cleared.instructor_roles.is_none());
        assert!(roles.is_empty());
    }

    #[tokio::test]
    async fn test_only_instructors_receive_roles() {
        let db = setup_test_db().await;
        let store = Arc::new(UserStore::new());
        let student = store.insert(&db, new_user("learner", Role::Student)).await.unwrap();
        let catalog = InstructorRoleCatalog::new(store);

        let result = catalog.assign(&db, student.id, "role-2").await;
        assert!(matches!(result, Err(InternalError::User(UserError::NotAnInstructor(_)))));

        let unknown = catalog.assign(&db, student.id, "role-99").await;
        assert!(matches!(unknown, Err(InternalError::User(UserError::UnknownInstructorRole(_)))));
    }
}
