use std::fmt;

use chrono::NaiveDate;
use thiserror::Error;

/// Identity Verifier が払い出す安定ユーザー識別子
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UserIdError {
    #[error("UserId is empty")]
    Empty,
}

impl UserId {
    pub fn new(value: impl Into<String>) -> Result<Self, UserIdError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(UserIdError::Empty);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `YYYY-MM-DD` の日付キー。レコードとその元ブロブの日付を識別する。
///
/// Strictly validated at construction: the fixed-width format keeps keys
/// lexically comparable, so a malformed key must never be minted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateKey(String);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DateKeyError {
    #[error("Date is empty")]
    Empty,
    #[error("Date must be YYYY-MM-DD: {0}")]
    Malformed(String),
}

impl DateKey {
    pub fn new(value: impl Into<String>) -> Result<Self, DateKeyError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DateKeyError::Empty);
        }
        // Parse-then-reformat rejects both bogus dates and non-zero-padded
        // variants ("2024-1-1") that would break lexical range queries.
        match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            Ok(date) if date.format("%Y-%m-%d").to_string() == trimmed => {
                Ok(Self(trimmed.to_string()))
            }
            _ => Err(DateKeyError::Malformed(trimmed.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
