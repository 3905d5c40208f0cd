//! Request types for moderation operations

use warden_core::entities::DbUser;
use warden_core::value_objects::{ModeratorContext, Subject};

use crate::services::{ServiceError, ServiceResult};

/// The moderator invoking an operation: who they are and what they may do
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActingModerator {
    pub user: DbUser,
    pub context: ModeratorContext,
}

impl ActingModerator {
    pub fn new(user: DbUser, context: ModeratorContext) -> Self {
        Self { user, context }
    }

    /// Fail with `PermissionDenied` unless the moderator may act on `subject`
    pub fn require(&self, subject: &Subject) -> ServiceResult<()> {
        if self.context.can_modify(subject) {
            return Ok(());
        }
        let needed = match subject {
            Subject::Channel(_) => "MANAGE_MESSAGES",
            Subject::Member(_) => "BAN_MEMBERS",
            Subject::Guild(_) => "MANAGE_GUILD",
            Subject::Role { .. } => "MANAGE_ROLES",
        };
        Err(ServiceError::permission_denied(needed))
    }
}
