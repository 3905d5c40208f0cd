//! Response types for moderation operations
//!
//! Snowflake IDs serialize as strings, like everything else on the wire.

use serde::Serialize;

use crate::services::ServiceError;

/// One subject of a batch operation that could not be processed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectFailure {
    /// Mention or id of the subject, as shown to the moderator
    pub subject: String,
    pub code: &'static str,
    pub reason: String,
}

impl SubjectFailure {
    pub fn new(subject: impl Into<String>, error: &ServiceError) -> Self {
        Self {
            subject: subject.into(),
            code: error.error_code(),
            reason: error.to_string(),
        }
    }
}

/// Per-subject results of a multi-subject operation
///
/// A failure for one subject never stops the others, so both lists can be
/// populated at once.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome<T> {
    pub succeeded: Vec<T>,
    pub failed: Vec<SubjectFailure>,
}

impl<T> BatchOutcome<T> {
    pub fn new() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn succeed(&mut self, item: T) {
        self.succeeded.push(item);
    }

    pub fn fail(&mut self, subject: impl Into<String>, error: &ServiceError) {
        self.failed.push(SubjectFailure::new(subject, error));
    }

    /// Every subject succeeded
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn has_successes(&self) -> bool {
        !self.succeeded.is_empty()
    }
}

impl<T> Default for BatchOutcome<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// What one expiry sweep did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Mutes whose role was removed (or whose member had already left)
    pub mutes_reversed: u32,
    /// Mutes deleted without a reversal (guild or role gone, actor refused)
    pub mutes_dropped: u32,
    pub locks_reversed: u32,
    /// Locks deleted without restoring the channel
    pub locks_dropped: u32,
    /// Records left in place for the next tick (timeout, storage failure)
    pub deferred: u32,
}

impl SweepReport {
    pub fn processed(&self) -> u32 {
        self.mutes_reversed + self.mutes_dropped + self.locks_reversed + self.locks_dropped
    }

    pub fn is_empty(&self) -> bool {
        self.processed() == 0 && self.deferred == 0
    }
}
