//! Value objects - immutable types that represent domain concepts

mod duration;
mod permissions;
mod snowflake;

pub use duration::{parse_retention, parse_sanction_duration, DurationType};
pub use permissions::{ModeratorContext, Permissions, Subject};
pub use snowflake::{InfractionId, Snowflake, SnowflakeParseError};
