//! Business logic services
//!
//! Services borrow a `ServiceContext` and talk to storage and the platform
//! only through its ports. The scheduler and runtime own an `Arc` of it
//! instead, since they outlive any single call.

pub mod context;
pub mod error;
pub mod events;
pub mod ledger;
pub mod moderation;
pub mod policy;
pub mod render;
pub mod runtime;
pub mod scheduler;

// Re-export all services for convenience
pub use context::{ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use events::EventService;
pub use ledger::LedgerService;
pub use moderation::ModerationService;
pub use policy::PolicyService;
pub use runtime::Runtime;
pub use scheduler::{Scheduler, SchedulerHandle};
