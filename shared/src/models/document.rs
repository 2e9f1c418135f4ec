//! Wire documents exchanged with the record server

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::form::FormRecord;
use super::record_key::QueryParams;

/// Stored form document: the record plus the parameters it was opened with
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecordDocument {
    #[serde(flatten)]
    pub record: FormRecord,
    /// Raw PI parameter
    #[serde(rename = "PI", default)]
    pub pi: Option<String>,
    /// Raw SN parameter
    #[serde(rename = "SN", default)]
    pub sn: Option<String>,
    /// Set by the server on every write
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RecordDocument {
    pub fn new(record: FormRecord, params: &QueryParams) -> Self {
        Self {
            record,
            pi: params.pi.clone(),
            sn: params.sn.clone(),
            updated_at: None,
        }
    }
}

/// Per-day document counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocCounter {
    pub seq: u64,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueDocNoRequest {
    /// `YYYY-MM-DD`
    pub issue_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedDocNo {
    pub doc_no: String,
    pub shard: String,
    pub seq: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocCounterView {
    pub shard: String,
    pub seq: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Result of an anonymous sign-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnonymousSession {
    pub uid: String,
    pub token: String,
    /// Unix seconds
    pub expires_at: i64,
}
