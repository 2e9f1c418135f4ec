//! Record reconciler
//!
//! Decides where a form's state comes from on boot and how an explicit
//! save reaches the record store.
//!
//! # Boot order
//!
//! 1. Sign in (identity gate)
//! 2. Load the record under its key
//! 3. Not found and both `PI` and `SN` given: copy the record stored under
//!    the bare SN to the PI key, then reload it
//! 4. Still nothing: issue a document number for a new record

use chrono::NaiveDate;
use shared::models::{QueryParams, RecordKey};
use shared::{FormRecord, RecordDocument};

use crate::context::StorageContext;
use crate::{ClientError, FormError};
use crate::identity::Principal;

/// Where the booted state came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootSource {
    /// Found under the record key
    Loaded,
    /// Copied from the legacy SN key
    Migrated,
    /// No stored record; a doc number was issued
    Fresh,
    /// No `PI`/`SN`; nothing remote was touched
    Unaddressed,
}

#[derive(Debug, Clone)]
pub struct BootOutcome {
    pub record: FormRecord,
    pub source: BootSource,
}

/// Result of an explicit save
#[derive(Debug, Clone, PartialEq)]
pub struct SaveReport {
    pub key: RecordKey,
    pub doc_no: String,
    /// Server write timestamp
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

pub struct Reconciler {
    ctx: StorageContext,
    params: QueryParams,
    key: Option<RecordKey>,
}

impl Reconciler {
    pub fn new(ctx: StorageContext, params: QueryParams) -> Self {
        let key = params.record_key();
        Self { ctx, params, key }
    }

    pub fn key(&self) -> Option<&RecordKey> {
        self.key.as_ref()
    }

    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    /// Resolve the initial state of the form
    ///
    /// `draft` is the locally restored snapshot, kept when the record turns
    /// out to be new. Load failures other than absence are errors, never a
    /// reason to start a fresh record.
    pub async fn boot(
        &self,
        draft: Option<FormRecord>,
        today: NaiveDate,
    ) -> Result<BootOutcome, FormError> {
        let Some(key) = &self.key else {
            tracing::info!("no PI or SN given, form is local only");
            return Ok(BootOutcome {
                record: draft.unwrap_or_else(|| FormRecord::new("", today)),
                source: BootSource::Unaddressed,
            });
        };

        let principal = self.ctx.identity.ensure_identity().await?;

        if let Some(doc) = self.load(&principal, key).await? {
            tracing::info!(key = %key, "record loaded");
            return Ok(BootOutcome {
                record: with_key(doc.record, key),
                source: BootSource::Loaded,
            });
        }

        if let Some(legacy) = self.params.legacy_key()
            && let Some(doc) = self.load(&principal, &legacy).await?
        {
            let record = self.migrate(&principal, key, &legacy, doc).await?;
            return Ok(BootOutcome {
                record,
                source: BootSource::Migrated,
            });
        }

        let mut record = draft.unwrap_or_else(|| FormRecord::new(key.as_str(), today));
        record = with_key(record, key);
        if record.issue_date.is_none() {
            record.issue_date = Some(today);
        }
        if !record.has_doc_no() {
            record.doc_no = self.issue(&principal, &record, today).await?;
        }
        tracing::info!(key = %key, doc_no = %record.doc_no, "new record");

        Ok(BootOutcome {
            record,
            source: BootSource::Fresh,
        })
    }

    /// Copy a record stored under the bare SN to the PI key
    async fn migrate(
        &self,
        principal: &Principal,
        key: &RecordKey,
        legacy: &RecordKey,
        doc: RecordDocument,
    ) -> Result<FormRecord, FormError> {
        let copy = RecordDocument::new(with_key(doc.record, key), &self.params);
        let saved = match self.ctx.records.save(principal, key, &copy).await {
            Ok(saved) => saved,
            Err(e) => return Err(self.write_failure(principal, e).await),
        };
        tracing::info!(from = %legacy, to = %key, "record migrated to PI key");

        let canonical = self.load(principal, key).await?.unwrap_or(saved);
        Ok(with_key(canonical.record, key))
    }

    /// Save the record, issuing a document number first when it has none
    ///
    /// The issued number is adopted into `record` even if the save itself
    /// fails afterwards.
    pub async fn save(
        &self,
        record: &mut FormRecord,
        today: NaiveDate,
    ) -> Result<SaveReport, FormError> {
        let key = self.key.as_ref().ok_or(FormError::KeyMissing)?;
        let principal = self.ctx.identity.ensure_identity().await?;

        self.adopt_doc_no(&principal, record, today).await?;
        record.key = key.as_str().to_string();

        let document = RecordDocument::new(record.clone(), &self.params);
        let stored = match self.ctx.records.save(&principal, key, &document).await {
            Ok(stored) => stored,
            Err(e) => return Err(self.write_failure(&principal, e).await),
        };
        tracing::info!(key = %key, doc_no = %record.doc_no, "record saved");

        Ok(SaveReport {
            key: key.clone(),
            doc_no: record.doc_no.clone(),
            updated_at: stored.updated_at,
        })
    }

    /// Issue a document number now if the record has none
    ///
    /// Returns the new number, or `None` when one was already assigned; an
    /// assigned number is never replaced.
    pub async fn generate_doc_no(
        &self,
        record: &mut FormRecord,
        today: NaiveDate,
    ) -> Result<Option<String>, FormError> {
        if record.has_doc_no() {
            return Ok(None);
        }
        if self.key.is_none() {
            return Err(FormError::KeyMissing);
        }
        let principal = self.ctx.identity.ensure_identity().await?;
        self.adopt_doc_no(&principal, record, today).await
    }

    async fn adopt_doc_no(
        &self,
        principal: &Principal,
        record: &mut FormRecord,
        today: NaiveDate,
    ) -> Result<Option<String>, FormError> {
        if record.has_doc_no() {
            return Ok(None);
        }
        let doc_no = self.issue(principal, record, today).await?;
        tracing::info!(doc_no = %doc_no, "doc number adopted");
        record.doc_no = doc_no.clone();
        Ok(Some(doc_no))
    }

    async fn load(
        &self,
        principal: &Principal,
        key: &RecordKey,
    ) -> Result<Option<RecordDocument>, FormError> {
        match self.ctx.records.load(principal, key).await {
            Ok(document) => Ok(document),
            Err(e) => {
                self.drop_rejected(principal, &e).await;
                Err(FormError::read(e))
            }
        }
    }

    async fn issue(
        &self,
        principal: &Principal,
        record: &FormRecord,
        today: NaiveDate,
    ) -> Result<String, FormError> {
        let issue_date = record.issue_date.unwrap_or(today);
        match self.ctx.records.issue_doc_no(principal, issue_date).await {
            Ok(doc_no) => Ok(doc_no),
            Err(e) => Err(self.write_failure(principal, e).await),
        }
    }

    async fn write_failure(&self, principal: &Principal, e: ClientError) -> FormError {
        self.drop_rejected(principal, &e).await;
        FormError::write(e)
    }

    /// A rejected token is dropped so the next boot or save signs in again
    async fn drop_rejected(&self, principal: &Principal, e: &ClientError) {
        if e.is_auth() {
            self.ctx.identity.invalidate(principal).await;
        }
    }
}

fn with_key(mut record: FormRecord, key: &RecordKey) -> FormRecord {
    record.key = key.as_str().to_string();
    record
}
