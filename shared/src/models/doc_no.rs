//! Document numbers
//!
//! Format: `CL-<YYYYMMDD>-<seq>` with `seq` zero-padded to four digits and
//! restarting at 1 for every issue date.
//! Example: `CL-20240501-0001`

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DOC_NO_PREFIX: &str = "CL";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocNoError {
    #[error("issue date must contain exactly 8 digits, got {0:?}")]
    InvalidShard(String),

    #[error("issue date is not a calendar date: {0}")]
    InvalidDate(String),
}

/// Per-day partition of the document counter (`YYYYMMDD`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocShard(String);

impl DocShard {
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.format("%Y%m%d").to_string())
    }

    /// Derive the shard from an issue date by keeping its digits
    ///
    /// Accepts `2024-05-01`, `2024/05/01` or `20240501`.
    pub fn parse(issue_date: &str) -> Result<Self, DocNoError> {
        let digits: String = issue_date.chars().filter(char::is_ascii_digit).collect();
        if digits.len() != 8 {
            return Err(DocNoError::InvalidShard(issue_date.to_string()));
        }
        NaiveDate::parse_from_str(&digits, "%Y%m%d")
            .map_err(|_| DocNoError::InvalidDate(issue_date.to_string()))?;
        Ok(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn doc_no(&self, seq: u64) -> String {
        format!("{DOC_NO_PREFIX}-{}-{seq:04}", self.0)
    }
}

impl std::fmt::Display for DocShard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_from_iso_date() {
        let shard = DocShard::parse("2024-05-01").unwrap();
        assert_eq!(shard.as_str(), "20240501");
        assert_eq!(shard, DocShard::from_date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()));
    }

    #[test]
    fn test_doc_no_padding() {
        let shard = DocShard::parse("20240501").unwrap();
        assert_eq!(shard.doc_no(1), "CL-20240501-0001");
        assert_eq!(shard.doc_no(42), "CL-20240501-0042");
        assert_eq!(shard.doc_no(12345), "CL-20240501-12345");
    }

    #[test]
    fn test_rejects_bad_dates() {
        assert!(matches!(DocShard::parse("2024-5-1"), Err(DocNoError::InvalidShard(_))));
        assert!(matches!(DocShard::parse(""), Err(DocNoError::InvalidShard(_))));
        assert!(matches!(DocShard::parse("2024-13-40"), Err(DocNoError::InvalidDate(_))));
    }
}
