use std::fmt;

/// Verb recorded on an audit row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    BulkCreate,
    Complete,
    Cancel,
    Reschedule,
    AssignRole,
    RemoveRole,
    ApplyUpdate,
}

impl AuditAction {
    /// Convert to the string stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::BulkCreate => "BULK_CREATE",
            Self::Complete => "COMPLETE",
            Self::Cancel => "CANCEL",
            Self::Reschedule => "RESCHEDULE",
            Self::AssignRole => "ASSIGN_ROLE",
            Self::RemoveRole => "REMOVE_ROLE",
            Self::ApplyUpdate => "APPLY_UPDATE",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of resource an audit row refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    User,
    Lesson,
    SystemSetting,
    System,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Lesson => "lesson",
            Self::SystemSetting => "system_setting",
            Self::System => "system",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit row ready to be appended
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub user_id: Option<i32>,
    pub action: AuditAction,
    pub resource_type: ResourceType,
    pub resource_id: Option<i32>,
    pub details: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub request_id: Option<String>,
}

impl AuditEntry {
    pub fn new(action: AuditAction, resource_type: ResourceType) -> Self {
        Self {
            user_id: None,
            action,
            resource_type,
            resource_id: None,
            details: None,
            ip_address: None,
            user_agent: None,
            request_id: None,
        }
    }
}

/// Query filter for reading the audit trail
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub user_id: Option<i32>,
    pub resource_type: Option<String>,
    pub action: Option<String>,
    pub skip: u64,
    pub limit: u64,
}
