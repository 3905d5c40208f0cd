//! Service layer error types
//!
//! Provides a unified error type for all service operations.

use std::fmt;

use warden_common::AppError;
use warden_core::{ActorError, DomainError};

/// Service layer error type
#[derive(Debug)]
pub enum ServiceError {
    /// Domain rule violation, storage or platform failure
    Domain(DomainError),

    /// Resource not found
    NotFound { resource: &'static str, id: String },

    /// State-transition rule violated (pardon a ban, publish an unpardoned unban)
    InvalidOperation(String),

    /// Permission denied
    PermissionDenied { permission: String },

    /// Validation error
    Validation(String),

    /// Internal error
    Internal(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain(e) => write!(f, "{e}"),
            Self::NotFound { resource, id } => write!(f, "{resource} not found: {id}"),
            Self::InvalidOperation(msg) => write!(f, "{msg}"),
            Self::PermissionDenied { permission } => {
                write!(f, "Missing required permission: {permission}")
            }
            Self::Validation(msg) => write!(f, "Validation error: {msg}"),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Domain(e) => Some(e),
            _ => None,
        }
    }
}

impl ServiceError {
    /// Create a not found error
    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            id: id.into(),
        }
    }

    /// Create an invalid operation error
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    /// Create a permission denied error
    pub fn permission_denied(permission: impl Into<String>) -> Self {
        Self::PermissionDenied {
            permission: permission.into(),
        }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Domain(e) => e.is_not_found(),
            Self::NotFound { .. } => true,
            _ => false,
        }
    }

    pub fn is_invalid_operation(&self) -> bool {
        match self {
            Self::Domain(e) => e.is_invalid_operation(),
            Self::InvalidOperation(_) => true,
            _ => false,
        }
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Domain(e) if e.is_storage())
    }

    /// Heading shown above the rejection when reported to a moderator
    pub fn title(&self) -> &'static str {
        match self {
            Self::PermissionDenied { .. } | Self::Domain(DomainError::Unauthorized(_)) => {
                "Unauthorized."
            }
            Self::Validation(_) | Self::Domain(DomainError::Validation(_)) => {
                "Please restate query."
            }
            _ => "Unable to comply.",
        }
    }

    /// Get the error code for reports and logs
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Domain(e) => e.code(),
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InvalidOperation(_) => "INVALID_OPERATION",
            Self::PermissionDenied { .. } => "UNAUTHORIZED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl From<ActorError> for ServiceError {
    fn from(err: ActorError) -> Self {
        Self::Domain(DomainError::ExternalActionFailed(err))
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(e) => AppError::Domain(e),
            ServiceError::Validation(msg) => AppError::Domain(DomainError::Validation(msg)),
            ServiceError::InvalidOperation(msg) => {
                AppError::Domain(DomainError::InvalidOperation(msg))
            }
            ServiceError::NotFound { resource, id } => {
                AppError::Internal(anyhow::anyhow!("{resource} not found: {id}"))
            }
            ServiceError::PermissionDenied { permission } => {
                AppError::Domain(DomainError::Unauthorized(permission))
            }
            ServiceError::Internal(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
