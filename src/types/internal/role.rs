use std::fmt;
use std::str::FromStr;

use poem_openapi::Enum;
use serde::{Deserialize, Serialize};

use crate::errors::InternalError;
use crate::errors::internal::AccessError;

/// Account role
///
/// The single source of truth for what a user may do. The legacy
/// "is this person a teacher" flag is derived from it with [`Role::is_teacher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Enum)]
#[serde(rename_all = "lowercase")]
#[oai(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Instructor,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Instructor => "instructor",
            Role::Student => "student",
        }
    }

    /// Legacy teacher flag, kept only at the API and token edges
    pub fn is_teacher(&self) -> bool {
        matches!(self, Role::Instructor)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Whether this role may be the teacher of a lesson
    pub fn can_teach(&self) -> bool {
        matches!(self, Role::Instructor)
    }

    /// Whether this role may act on lessons it teaches (or any lesson, for admins)
    pub fn can_manage_lessons(&self) -> bool {
        matches!(self, Role::Instructor | Role::Admin)
    }

    /// Whether this role may book lessons as the student
    pub fn can_attend(&self) -> bool {
        matches!(self, Role::Student)
    }

    /// Resolve a role from an explicit value or the legacy teacher flag
    pub fn from_legacy(role: Option<Role>, is_teacher: Option<bool>) -> Option<Role> {
        match (role, is_teacher) {
            (Some(role), _) => Some(role),
            (None, Some(true)) => Some(Role::Instructor),
            (None, Some(false)) => Some(Role::Student),
            (None, None) => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = InternalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "instructor" | "teacher" => Ok(Role::Instructor),
            "student" => Ok(Role::Student),
            other => Err(InternalError::parse("role", format!("Unknown role: {}", other))),
        }
    }
}

/// Role-specific authorization checks, applied after authentication and the
/// active-account check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Admin,
    Instructor,
    TeacherOrAdmin,
    Student,
    AdminOrInstructor,
}

impl Guard {
    pub fn allows(&self, role: Role) -> bool {
        match self {
            Guard::Admin => role.is_admin(),
            Guard::Instructor => role.can_teach(),
            Guard::TeacherOrAdmin => role.can_manage_lessons(),
            Guard::Student => role.can_attend(),
            Guard::AdminOrInstructor => matches!(role, Role::Admin | Role::Instructor),
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Guard::Admin => "Admin role required",
            Guard::Instructor => "Instructor role required",
            Guard::TeacherOrAdmin => "Teacher/Instructor role required",
            Guard::Student => "Student role required",
            Guard::AdminOrInstructor => "Admin or Instructor role required",
        }
    }

    pub fn check(&self, role: Role) -> Result<(), AccessError> {
        if self.allows(role) {
            Ok(())
        } else {
            Err(AccessError::RoleRequired {
                reason: self.reason().to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_storage_string() {
        for role in [Role::Admin, Role::Instructor, Role::Student] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_legacy_teacher_value_maps_to_instructor() {
        assert_eq!("teacher".parse::<Role>().unwrap(), Role::Instructor);
        assert_eq!("INSTRUCTOR".parse::<Role>().unwrap(), Role::Instructor);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_is_teacher_is_derived_from_role() {
        assert!(Role::Instructor.is_teacher());
        assert!(!Role::Admin.is_teacher());
        assert!(!Role::Student.is_teacher());
    }

    #[test]
    fn test_from_legacy_prefers_explicit_role() {
        assert_eq!(Role::from_legacy(Some(Role::Student), Some(true)), Some(Role::Student));
        assert_eq!(Role::from_legacy(None, Some(true)), Some(Role::Instructor));
        assert_eq!(Role::from_legacy(None, Some(false)), Some(Role::Student));
        assert_eq!(Role::from_legacy(None, None), None);
    }

    #[test]
    fn test_guard_matrix() {
        let cases = [
            (Guard::Admin, [true, false, false]),
            (Guard::Instructor, [false, true, false]),
            (Guard::TeacherOrAdmin, [true, true, false]),
            (Guard::Student, [false, false, true]),
            (Guard::AdminOrInstructor, [true, true, false]),
        ];

        for (guard, expected) in cases {
            let actual = [Role::Admin, Role::Instructor, Role::Student].map(|r| guard.allows(r));
            assert_eq!(actual, expected, "guard {:?}", guard);
        }
    }

    #[test]
    fn test_guard_failure_carries_reason() {
        match Guard::Admin.check(Role::Student) {
            Err(AccessError::RoleRequired { reason }) => assert_eq!(reason, "Admin role required"),
            other => panic!("Expected RoleRequired, got {:?}", other),
        }
        assert!(Guard::Student.check(Role::Student).is_ok());
    }
}
