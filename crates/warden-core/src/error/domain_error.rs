//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::{InfractionId, Snowflake};

/// Domain layer errors
///
/// Expected absence is never an error at the storage ports (they return
/// `Ok(None)`); the not-found variants are for operations that need the
/// thing to exist.
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Infraction not found: {0}")]
    InfractionNotFound(InfractionId),

    #[error("Guild not found: {0}")]
    GuildNotFound(Snowflake),

    #[error("Member not found: {0}")]
    MemberNotFound(Snowflake),

    #[error("Role not found: {0}")]
    RoleNotFound(Snowflake),

    #[error("Channel not found: {0}")]
    ChannelNotFound(Snowflake),

    #[error("Channel is not locked: {0}")]
    LockNotFound(Snowflake),

    #[error("Member is not muted: {0}")]
    MuteNotFound(Snowflake),

    // =========================================================================
    // Rule Violations
    // =========================================================================
    /// A state-transition rule was violated; the message is shown to the moderator
    #[error("{0}")]
    InvalidOperation(String),

    #[error("Not allowed to act on {0}")]
    Unauthorized(String),

    #[error("Validation error: {0}")]
    Validation(String),

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("External action failed: {0}")]
    ExternalActionFailed(#[from] ActorError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    /// Get an error code string for logs and reports
    pub fn code(&self) -> &'static str {
        match self {
            Self::InfractionNotFound(_) => "UNKNOWN_INFRACTION",
            Self::GuildNotFound(_) => "UNKNOWN_GUILD",
            Self::MemberNotFound(_) => "UNKNOWN_MEMBER",
            Self::RoleNotFound(_) => "UNKNOWN_ROLE",
            Self::ChannelNotFound(_) => "UNKNOWN_CHANNEL",
            Self::LockNotFound(_) => "UNKNOWN_LOCK",
            Self::MuteNotFound(_) => "UNKNOWN_MUTE",
            Self::InvalidOperation(_) => "INVALID_OPERATION",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::ExternalActionFailed(_) => "EXTERNAL_ACTION_FAILED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::InfractionNotFound(_)
                | Self::GuildNotFound(_)
                | Self::MemberNotFound(_)
                | Self::RoleNotFound(_)
                | Self::ChannelNotFound(_)
                | Self::LockNotFound(_)
                | Self::MuteNotFound(_)
        )
    }

    pub fn is_invalid_operation(&self) -> bool {
        matches!(self, Self::InvalidOperation(_))
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, Self::DatabaseError(_))
    }

    pub fn is_external(&self) -> bool {
        matches!(self, Self::ExternalActionFailed(_))
    }
}

/// Failures reported by the `GuildActor`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActorError {
    /// The target no longer exists upstream (deleted message, member left, ...)
    #[error("not found upstream: {0}")]
    NotFound(String),

    /// The bot lacks the platform permission to do this
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Network or platform failure
    #[error("transport error: {0}")]
    Transport(String),
}

impl ActorError {
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
