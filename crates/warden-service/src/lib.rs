//! # warden-service
//!
//! Application layer: the infraction ledger, guild policy, moderation
//! commands, platform event handling and the expiry scheduler, plus the
//! runtime that wires them to storage and the platform actor.

pub mod dto;
pub mod services;

pub use dto::{ActingModerator, BatchOutcome, SubjectFailure, SweepReport};
pub use services::{
    EventService, LedgerService, ModerationService, PolicyService, Runtime, Scheduler,
    SchedulerHandle, ServiceContext, ServiceContextBuilder, ServiceError, ServiceResult,
};
