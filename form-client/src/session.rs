//! Form session
//!
//! [`FormSession`] owns the form state. Every edit arrives as a
//! [`FormCommand`], is applied to the record and handed to the draft store.
//! Store and identity outcomes come back as [`Notice`]s.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use form_capture::{ImageProcessingError, SignaturePad, StrokeCommand, process_photo};
use shared::models::{Department, QueryParams, RecordKey};
use shared::{EvalResult, FormRecord, SignatureSlot, TriState};
use tokio_util::sync::CancellationToken;

use crate::context::StorageContext;
use crate::{ClientError, ClientResult, FormError};
use crate::draft::DraftStore;
use crate::reconciler::{BootSource, Reconciler, SaveReport};

/// `PI` / `SN` parameters of the page the form is opened from
pub fn page_params(page_url: &str) -> ClientResult<QueryParams> {
    let url = reqwest::Url::parse(page_url)
        .map_err(|e| ClientError::Validation(format!("invalid page URL: {e}")))?;
    Ok(QueryParams::from_pairs(url.query_pairs()))
}

/// Free-text fields of the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    PartName,
    PartDetails,
    ReasonDetails,
    LocationDetails,
    RequestComment,
    QaRemark,
    QaMgrComment,
}

/// Date fields of the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateField {
    IssueDate,
    ImportDate,
    ReceivedDate,
}

/// Yes / no / unanswered questions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChoiceField {
    HasMsds,
    NeedInform,
    QaMgrApprove,
}

/// One user edit
#[derive(Debug, Clone)]
pub enum FormCommand {
    SetText(TextField, String),
    SetDate(DateField, Option<NaiveDate>),
    SetChoice(ChoiceField, TriState),
    SetEvalResult(EvalResult),
    ToggleRelated(Department),
    Stroke {
        slot: SignatureSlot,
        command: StrokeCommand,
    },
    /// Raw bytes of the selected image file
    PhotoSelected(Vec<u8>),
    PhotoCleared,
    /// Fetch a document number now; ignored once one is assigned
    GenerateDocNo,
}

/// User-visible outcome
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Saved { doc_no: String },
    SaveFailed(String),
    DocNoIssued { doc_no: String },
    /// Sign-in failed or the token was rejected; the next attempt signs in again
    AuthFailed(String),
    /// No `PI`/`SN`; saving is impossible
    KeyMissing,
    /// Shown next to the image control; the form keeps its previous state
    ImageError(String),
    LoadFailed(String),
}

impl From<FormError> for Notice {
    fn from(e: FormError) -> Self {
        match e {
            FormError::KeyMissing => Notice::KeyMissing,
            FormError::Image(e) => Notice::ImageError(e.to_string()),
            FormError::Auth(_) => Notice::AuthFailed(e.to_string()),
            FormError::StoreRead(_) => Notice::LoadFailed(e.to_string()),
            FormError::StoreWrite(_) => Notice::SaveFailed(e.to_string()),
        }
    }
}

/// Result of [`FormSession::boot`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootStatus {
    Hydrated(BootSource),
    /// The session was cancelled while booting; nothing was applied
    Discarded,
}

pub struct FormSession {
    record: FormRecord,
    reconciler: Reconciler,
    drafts: Arc<DraftStore>,
    pads: HashMap<SignatureSlot, SignaturePad>,
    today: NaiveDate,
    cancel: CancellationToken,
    booted: Option<BootSource>,
}

impl FormSession {
    /// Open a form for the given page parameters
    ///
    /// A local draft for the record key is restored right away; the remote
    /// record replaces it on [`boot`](Self::boot).
    pub fn open(
        ctx: StorageContext,
        params: QueryParams,
        drafts: Arc<DraftStore>,
        today: NaiveDate,
    ) -> Self {
        let reconciler = Reconciler::new(ctx, params);
        let key = reconciler.key().map(|k| k.as_str().to_string()).unwrap_or_default();
        let record = drafts
            .restore(&key)
            .unwrap_or_else(|| FormRecord::new(key.as_str(), today));

        Self {
            record,
            reconciler,
            drafts,
            pads: HashMap::new(),
            today,
            cancel: CancellationToken::new(),
            booted: None,
        }
    }

    pub fn record(&self) -> &FormRecord {
        &self.record
    }

    pub fn key(&self) -> Option<&RecordKey> {
        self.reconciler.key()
    }

    pub fn is_booted(&self) -> bool {
        self.booted.is_some()
    }

    /// Token that aborts a running boot; cancelled on [`close`](Self::close)
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn draft_key(&self) -> &str {
        self.reconciler.key().map(RecordKey::as_str).unwrap_or("")
    }

    /// Load or create the remote record and hydrate the form; runs once
    ///
    /// Cancelling the session token while this runs drops the result
    /// without touching the form.
    pub async fn boot(&mut self) -> Result<BootStatus, FormError> {
        if let Some(source) = self.booted {
            return Ok(BootStatus::Hydrated(source));
        }

        let draft = Some(self.record.clone());
        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            outcome = self.reconciler.boot(draft, self.today) => Some(outcome),
        };
        let Some(outcome) = outcome else {
            tracing::debug!("boot cancelled, result discarded");
            return Ok(BootStatus::Discarded);
        };

        let outcome = outcome?;
        self.record = outcome.record;
        // Pads redraw from the hydrated record when mounted again
        self.pads.clear();
        self.booted = Some(outcome.source);
        self.autosave();
        Ok(BootStatus::Hydrated(outcome.source))
    }

    /// Attach a drawing surface for a signature box
    ///
    /// The box height comes from the slot; an existing signature is drawn
    /// into the new surface.
    pub fn mount_pad(
        &mut self,
        slot: SignatureSlot,
        width: u32,
        device_pixel_ratio: f32,
    ) -> Result<(), FormError> {
        let pad = SignaturePad::mount(
            width,
            slot.surface_height(),
            device_pixel_ratio,
            self.record.signatures.get(slot),
        )?;
        self.pads.insert(slot, pad);
        Ok(())
    }

    pub fn pad(&self, slot: SignatureSlot) -> Option<&SignaturePad> {
        self.pads.get(&slot)
    }

    /// Apply one edit and schedule a draft write
    pub async fn apply(&mut self, command: FormCommand) -> Option<Notice> {
        if matches!(command, FormCommand::GenerateDocNo) {
            return self.generate_doc_no().await;
        }
        match self.apply_inner(command) {
            Ok(true) => {
                self.autosave();
                None
            }
            Ok(false) => None,
            Err(e) => {
                tracing::warn!(error = %e, "image input rejected");
                Some(Notice::ImageError(e.to_string()))
            }
        }
    }

    /// Returns whether the record changed
    fn apply_inner(&mut self, command: FormCommand) -> Result<bool, ImageProcessingError> {
        let record = &mut self.record;
        match command {
            FormCommand::SetText(field, value) => {
                let target = match field {
                    TextField::PartName => &mut record.part_name,
                    TextField::PartDetails => &mut record.part_details,
                    TextField::ReasonDetails => &mut record.reason_details,
                    TextField::LocationDetails => &mut record.location_details,
                    TextField::RequestComment => &mut record.request_comment,
                    TextField::QaRemark => &mut record.qa_remark,
                    TextField::QaMgrComment => &mut record.qa_mgr_comment,
                };
                *target = value;
            }
            FormCommand::SetDate(field, value) => {
                let target = match field {
                    DateField::IssueDate => &mut record.issue_date,
                    DateField::ImportDate => &mut record.import_date,
                    DateField::ReceivedDate => &mut record.received_date,
                };
                *target = value;
            }
            FormCommand::SetChoice(field, value) => {
                let target = match field {
                    ChoiceField::HasMsds => &mut record.has_msds,
                    ChoiceField::NeedInform => &mut record.need_inform,
                    ChoiceField::QaMgrApprove => &mut record.qa_mgr_approve,
                };
                *target = value;
            }
            FormCommand::SetEvalResult(value) => record.eval_result = value,
            FormCommand::ToggleRelated(dept) => record.related.toggle(dept),
            FormCommand::Stroke { slot, command } => {
                let Some(pad) = self.pads.get_mut(&slot) else {
                    tracing::debug!(slot = slot.field_name(), "stroke for unmounted pad ignored");
                    return Ok(false);
                };
                match pad.apply(command)? {
                    Some(output) => record.signatures.set(slot, output.into_slot_value()),
                    None => return Ok(false),
                }
            }
            FormCommand::PhotoSelected(bytes) => {
                let photo = process_photo(&bytes)?;
                record.photo = Some(photo.data_uri);
            }
            FormCommand::PhotoCleared => record.photo = None,
            FormCommand::GenerateDocNo => return Ok(false),
        }
        Ok(true)
    }

    async fn generate_doc_no(&mut self) -> Option<Notice> {
        match self
            .reconciler
            .generate_doc_no(&mut self.record, self.today)
            .await
        {
            Ok(Some(doc_no)) => {
                self.autosave();
                Some(Notice::DocNoIssued { doc_no })
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "doc number request failed");
                Some(e.into())
            }
        }
    }

    fn autosave(&self) {
        self.drafts.persist(self.draft_key(), &self.record);
    }

    /// Explicit save
    pub async fn save(&mut self) -> Notice {
        let before = self.record.doc_no.clone();
        let result = self.reconciler.save(&mut self.record, self.today).await;
        if self.record.doc_no != before {
            self.autosave();
        }

        match result {
            Ok(SaveReport { doc_no, .. }) => Notice::Saved { doc_no },
            Err(e) => {
                tracing::warn!(error = %e, "save failed");
                e.into()
            }
        }
    }

    /// Stop the session: abort a running boot and flush drafts
    pub fn close(self) {
        self.cancel.cancel();
        self.drafts.flush();
    }
}
