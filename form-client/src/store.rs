//! Remote record store

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::RecordDocument;
use shared::models::{IssueDocNoRequest, IssuedDocNo, RecordKey};

use crate::http::HttpClient;
use crate::identity::Principal;
use crate::{ClientError, ClientResult};

/// Durable record storage addressed by record key
///
/// Every call runs as `principal`. A missing record is `Ok(None)`, never
/// an error.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn load(
        &self,
        principal: &Principal,
        key: &RecordKey,
    ) -> ClientResult<Option<RecordDocument>>;

    /// Merge-write; returns the stored document
    async fn save(
        &self,
        principal: &Principal,
        key: &RecordKey,
        document: &RecordDocument,
    ) -> ClientResult<RecordDocument>;

    /// Next `CL-<YYYYMMDD>-<seq>` for the issue date
    async fn issue_doc_no(&self, principal: &Principal, issue_date: NaiveDate)
    -> ClientResult<String>;
}

/// [`RecordStore`] over the record server HTTP API
#[derive(Debug, Clone)]
pub struct HttpRecordStore {
    http: HttpClient,
}

impl HttpRecordStore {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// `RecordKey` never holds a dot segment, so one encoded segment
    /// always reaches the record route
    fn record_path(key: &RecordKey) -> String {
        format!("/api/records/{}", urlencoding::encode(key.as_str()))
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn load(
        &self,
        principal: &Principal,
        key: &RecordKey,
    ) -> ClientResult<Option<RecordDocument>> {
        match self
            .http
            .get::<RecordDocument>(&Self::record_path(key), Some(&principal.token))
            .await
        {
            Ok(document) => Ok(Some(document)),
            Err(ClientError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn save(
        &self,
        principal: &Principal,
        key: &RecordKey,
        document: &RecordDocument,
    ) -> ClientResult<RecordDocument> {
        self.http
            .patch(&Self::record_path(key), Some(&principal.token), document)
            .await
    }

    async fn issue_doc_no(
        &self,
        principal: &Principal,
        issue_date: NaiveDate,
    ) -> ClientResult<String> {
        let request = IssueDocNoRequest {
            issue_date: issue_date.format("%Y-%m-%d").to_string(),
        };
        let issued: IssuedDocNo = self
            .http
            .post("/api/doc-counters/issue", Some(&principal.token), &request)
            .await?;
        tracing::info!(doc_no = %issued.doc_no, "doc number issued");
        Ok(issued.doc_no)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_path_escapes_key() {
        let key = RecordKey::parse("SN 4/56").unwrap();
        assert_eq!(HttpRecordStore::record_path(&key), "/api/records/SN%204%2F56");
        assert_eq!(
            HttpRecordStore::record_path(&RecordKey::for_pi("123")),
            "/api/records/PI_123"
        );
    }

    #[test]
    fn test_record_path_stays_on_record_route() {
        let base = reqwest::Url::parse("http://localhost:3000").unwrap();
        for raw in ["...", "SN.1", "a/../b", "%2e%2e", "?x=1#y"] {
            let key = RecordKey::parse(raw).unwrap();
            let url = base.join(&HttpRecordStore::record_path(&key)).unwrap();
            let segments: Vec<_> = url.path_segments().unwrap().collect();
            assert_eq!(segments.len(), 3, "key {raw:?} -> {url}");
            assert_eq!(&segments[..2], ["api", "records"]);
            assert_eq!(urlencoding::decode(segments[2]).unwrap(), raw);
            assert!(url.query().is_none() && url.fragment().is_none());
        }
        assert!(RecordKey::parse("..").is_none());
        assert!(RecordKey::parse(".").is_none());
    }
}
