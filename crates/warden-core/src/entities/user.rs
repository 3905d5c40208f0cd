//! User snapshot stored alongside every record

use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// A user as they were when the record was written
///
/// The name is a `name#discriminator` snapshot and is never re-resolved, so
/// history keeps showing who the user was at the time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DbUser {
    pub id: Snowflake,
    pub name: String,
}

impl DbUser {
    pub const UNKNOWN_NAME: &'static str = "Unknown#????";

    pub fn new(id: Snowflake, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Placeholder moderator for actions taken outside the bot
    pub fn unknown() -> Self {
        Self::new(Snowflake::new(0), Self::UNKNOWN_NAME)
    }

    #[inline]
    pub fn is_unknown(&self) -> bool {
        self.id.is_zero()
    }
}
