//! Data transfer objects
//!
//! - Request types describing who is acting
//! - Response types for batch outcomes and sweep summaries

pub mod requests;
pub mod responses;

pub use requests::ActingModerator;
pub use responses::{BatchOutcome, SubjectFailure, SweepReport};
