//! Moderator-typed durations
//!
//! Two formats appear in commands: sanction lengths such as `"1d 12h"` for
//! mutes and locks, and retention windows such as `"6m"` for how long
//! infractions stay visible in history views.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Unit of a guild's retention window (stored as smallint)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DurationType {
    Days = 1,
    Months = 2,
    Years = 3,
}

impl DurationType {
    /// Stable storage code
    #[inline]
    pub const fn code(self) -> i16 {
        self as i16
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(Self::Days),
            2 => Some(Self::Months),
            3 => Some(Self::Years),
            _ => None,
        }
    }

    /// Approximate length of one unit (months are 30 days, years 365)
    pub fn unit_days(self) -> i64 {
        match self {
            Self::Days => 1,
            Self::Months => 30,
            Self::Years => 365,
        }
    }

    pub fn suffix(self) -> char {
        match self {
            Self::Days => 'd',
            Self::Months => 'm',
            Self::Years => 'y',
        }
    }
}

/// Parse a sanction length of the form `[N]d [N]h [N]m [N]s`
///
/// Units accept their long spellings (`days`, `hours`, `min`, `minutes`,
/// `sec`, `seconds`) and an optional single space after the number.
/// A zero total or an unknown unit is a validation error.
pub fn parse_sanction_duration(input: &str) -> Result<Duration, DomainError> {
    let invalid = || DomainError::Validation(format!("unrecognised duration: {input:?}"));

    let mut total_secs: i64 = 0;
    let mut chars = input.trim().chars().peekable();
    let mut saw_component = false;

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() || c == ',' {
            chars.next();
            continue;
        }
        if !c.is_ascii_digit() {
            return Err(invalid());
        }

        let mut number = String::new();
        while let Some(&d) = chars.peek() {
            if !d.is_ascii_digit() {
                break;
            }
            number.push(d);
            chars.next();
        }
        if chars.peek() == Some(&' ') {
            chars.next();
        }
        let mut unit = String::new();
        while let Some(&u) = chars.peek() {
            if !u.is_ascii_alphabetic() {
                break;
            }
            unit.push(u.to_ascii_lowercase());
            chars.next();
        }

        let seconds_per_unit = match unit.as_str() {
            "d" | "day" | "days" => 86_400,
            "h" | "hr" | "hrs" | "hour" | "hours" => 3_600,
            "m" | "min" | "mins" | "minute" | "minutes" => 60,
            "s" | "sec" | "secs" | "second" | "seconds" => 1,
            _ => return Err(invalid()),
        };
        let amount: i64 = number.parse().map_err(|_| invalid())?;
        total_secs = amount
            .checked_mul(seconds_per_unit)
            .and_then(|secs| total_secs.checked_add(secs))
            .ok_or_else(invalid)?;
        saw_component = true;
    }

    if !saw_component || total_secs == 0 {
        return Err(DomainError::Validation(
            "duration must be longer than zero".to_string(),
        ));
    }

    Duration::try_seconds(total_secs).ok_or_else(invalid)
}

/// Parse a retention window such as `"30d"`, `"6m"` or `"2Y"`
pub fn parse_retention(input: &str) -> Result<(DurationType, u32), DomainError> {
    let invalid = || {
        DomainError::Validation(format!(
            "retention must be an amount followed by d, m or y, got {input:?}"
        ))
    };

    let input = input.trim();
    let suffix = input.chars().last().ok_or_else(invalid)?;
    let duration_type = match suffix.to_ascii_lowercase() {
        'd' => DurationType::Days,
        'm' => DurationType::Months,
        'y' => DurationType::Years,
        _ => return Err(invalid()),
    };

    let amount: u32 = input[..input.len() - suffix.len_utf8()]
        .trim()
        .parse()
        .map_err(|_| invalid())?;
    if amount == 0 {
        return Err(invalid());
    }

    Ok((duration_type, amount))
}
