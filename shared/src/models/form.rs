//! Cleanroom import notification form
//!
//! One [`FormRecord`] is one physical "Import part to Clean room Notification"
//! sheet. Field names on the wire are camelCase and match the stored document.

use chrono::NaiveDate;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Yes / No answer that may still be unanswered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriState {
    Yes,
    No,
    #[default]
    Unset,
}

impl TriState {
    pub fn as_option(self) -> Option<bool> {
        match self {
            TriState::Yes => Some(true),
            TriState::No => Some(false),
            TriState::Unset => None,
        }
    }

    pub fn is_set(self) -> bool {
        self != TriState::Unset
    }
}

impl From<bool> for TriState {
    fn from(value: bool) -> Self {
        if value { TriState::Yes } else { TriState::No }
    }
}

impl From<Option<bool>> for TriState {
    fn from(value: Option<bool>) -> Self {
        value.map(TriState::from).unwrap_or_default()
    }
}

impl Serialize for TriState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_option().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TriState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<bool>::deserialize(deserializer).map(TriState::from)
    }
}

/// QA evaluation result (ผ่าน / ไม่ผ่าน)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvalResult {
    Pass,
    NotPass,
    #[default]
    Unset,
}

impl EvalResult {
    pub fn as_str(self) -> Option<&'static str> {
        match self {
            EvalResult::Pass => Some("pass"),
            EvalResult::NotPass => Some("notpass"),
            EvalResult::Unset => None,
        }
    }
}

impl Serialize for EvalResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_str().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EvalResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<String>::deserialize(deserializer)?.as_deref() {
            None => Ok(EvalResult::Unset),
            Some("pass") => Ok(EvalResult::Pass),
            Some("notpass") => Ok(EvalResult::NotPass),
            Some(other) => Err(D::Error::unknown_variant(other, &["pass", "notpass"])),
        }
    }
}

/// Departments that can be marked as co-reviewers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Department {
    Mfg1,
    Mfg2,
    Eng1,
    Eng2,
    Qa,
    Qe,
    Qev,
    Mca,
    Pos,
}

impl Department {
    /// Display order on the sheet
    pub const ALL: [Department; DEPARTMENT_COUNT] = [
        Department::Mfg1,
        Department::Mfg2,
        Department::Eng1,
        Department::Eng2,
        Department::Qa,
        Department::Qe,
        Department::Qev,
        Department::Mca,
        Department::Pos,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Department::Mfg1 => "MFG1",
            Department::Mfg2 => "MFG2",
            Department::Eng1 => "ENG1",
            Department::Eng2 => "ENG2",
            Department::Qa => "QA",
            Department::Qe => "QE",
            Department::Qev => "QEV",
            Department::Mca => "MCA",
            Department::Pos => "POS",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Department {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown department code: {0}")]
pub struct UnknownDepartment(pub String);

impl FromStr for Department {
    type Err = UnknownDepartment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Department::ALL
            .into_iter()
            .find(|d| d.code() == s)
            .ok_or_else(|| UnknownDepartment(s.to_string()))
    }
}

const DEPARTMENT_COUNT: usize = 9;

/// Related-section checkboxes, every department defaults to unchecked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelatedSections {
    flags: [bool; DEPARTMENT_COUNT],
}

impl RelatedSections {
    pub fn get(&self, dept: Department) -> bool {
        self.flags[dept.index()]
    }

    pub fn set(&mut self, dept: Department, checked: bool) {
        self.flags[dept.index()] = checked;
    }

    pub fn toggle(&mut self, dept: Department) {
        self.flags[dept.index()] = !self.flags[dept.index()];
    }

    pub fn iter(&self) -> impl Iterator<Item = (Department, bool)> + '_ {
        Department::ALL.into_iter().map(|d| (d, self.get(d)))
    }

    pub fn selected(&self) -> Vec<Department> {
        self.iter().filter(|(_, on)| *on).map(|(d, _)| d).collect()
    }
}

impl Serialize for RelatedSections {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter().map(|(d, on)| (d.code(), on)))
    }
}

impl<'de> Deserialize<'de> for RelatedSections {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<BTreeMap<String, bool>>::deserialize(deserializer)?.unwrap_or_default();
        let mut sections = RelatedSections::default();
        // Codes outside the closed set are dropped
        for (code, on) in raw {
            if let Ok(dept) = code.parse::<Department>() {
                sections.set(dept, on);
            }
        }
        Ok(sections)
    }
}

/// Signature boxes on the sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureSlot {
    Requester,
    Chief,
    Manager,
    SectionManager,
    QaStaff,
    QaChief,
    QaManager,
}

impl SignatureSlot {
    pub const ALL: [SignatureSlot; 7] = [
        SignatureSlot::Requester,
        SignatureSlot::Chief,
        SignatureSlot::Manager,
        SignatureSlot::SectionManager,
        SignatureSlot::QaStaff,
        SignatureSlot::QaChief,
        SignatureSlot::QaManager,
    ];

    /// Stored document field
    pub fn field_name(&self) -> &'static str {
        match self {
            SignatureSlot::Requester => "sigRequester",
            SignatureSlot::Chief => "sigChief",
            SignatureSlot::Manager => "sigManager",
            SignatureSlot::SectionManager => "sigSectionMgr",
            SignatureSlot::QaStaff => "sigQaStaff",
            SignatureSlot::QaChief => "sigQaChief",
            SignatureSlot::QaManager => "sigQaMgr",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SignatureSlot::Requester => "Requester",
            SignatureSlot::Chief => "Chief",
            SignatureSlot::Manager => "MGR",
            SignatureSlot::SectionManager => "Section MGR",
            SignatureSlot::QaStaff => "QA Staff",
            SignatureSlot::QaChief => "QA Chief",
            SignatureSlot::QaManager => "Approval sign",
        }
    }

    /// Drawing area height in display units
    pub fn surface_height(&self) -> u32 {
        match self {
            SignatureSlot::QaManager => 140,
            _ => 120,
        }
    }
}

/// PNG data URIs per signature box, `None` = not signed yet
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Signatures {
    pub sig_requester: Option<String>,
    pub sig_chief: Option<String>,
    pub sig_manager: Option<String>,
    pub sig_section_mgr: Option<String>,
    pub sig_qa_staff: Option<String>,
    pub sig_qa_chief: Option<String>,
    pub sig_qa_mgr: Option<String>,
}

impl Signatures {
    fn slot_mut(&mut self, slot: SignatureSlot) -> &mut Option<String> {
        match slot {
            SignatureSlot::Requester => &mut self.sig_requester,
            SignatureSlot::Chief => &mut self.sig_chief,
            SignatureSlot::Manager => &mut self.sig_manager,
            SignatureSlot::SectionManager => &mut self.sig_section_mgr,
            SignatureSlot::QaStaff => &mut self.sig_qa_staff,
            SignatureSlot::QaChief => &mut self.sig_qa_chief,
            SignatureSlot::QaManager => &mut self.sig_qa_mgr,
        }
    }

    pub fn get(&self, slot: SignatureSlot) -> Option<&str> {
        let value = match slot {
            SignatureSlot::Requester => &self.sig_requester,
            SignatureSlot::Chief => &self.sig_chief,
            SignatureSlot::Manager => &self.sig_manager,
            SignatureSlot::SectionManager => &self.sig_section_mgr,
            SignatureSlot::QaStaff => &self.sig_qa_staff,
            SignatureSlot::QaChief => &self.sig_qa_chief,
            SignatureSlot::QaManager => &self.sig_qa_mgr,
        };
        value.as_deref()
    }

    pub fn set(&mut self, slot: SignatureSlot, image: Option<String>) {
        *self.slot_mut(slot) = image;
    }

    pub fn signed(&self) -> Vec<SignatureSlot> {
        SignatureSlot::ALL
            .into_iter()
            .filter(|slot| self.get(*slot).is_some())
            .collect()
    }
}

/// Full in-memory state of one form
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormRecord {
    /// Record key (`PI_<id>` or raw SN)
    pub key: String,
    pub issue_date: Option<NaiveDate>,
    /// `CL-<YYYYMMDD>-<seq>`, empty until issued
    pub doc_no: String,

    pub part_name: String,
    pub part_details: String,
    pub reason_details: String,
    pub location_details: String,
    pub import_date: Option<NaiveDate>,
    #[serde(rename = "hasMSDS")]
    pub has_msds: TriState,
    pub need_inform: TriState,
    /// JPEG data URI
    pub photo: Option<String>,

    // Request section
    pub request_comment: String,
    pub related: RelatedSections,

    // QA section
    pub eval_result: EvalResult,
    pub received_date: Option<NaiveDate>,
    pub qa_remark: String,
    pub qa_mgr_approve: TriState,
    pub qa_mgr_comment: String,

    #[serde(flatten)]
    pub signatures: Signatures,
}

impl FormRecord {
    /// Blank form for a record key, issued on `issue_date`
    pub fn new(key: impl Into<String>, issue_date: NaiveDate) -> Self {
        Self {
            key: key.into(),
            issue_date: Some(issue_date),
            ..Default::default()
        }
    }

    pub fn has_doc_no(&self) -> bool {
        !self.doc_no.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tristate_wire_values() {
        assert_eq!(serde_json::to_value(TriState::Yes).unwrap(), json!(true));
        assert_eq!(serde_json::to_value(TriState::No).unwrap(), json!(false));
        assert_eq!(serde_json::to_value(TriState::Unset).unwrap(), json!(null));
        let unset: TriState = serde_json::from_value(json!(null)).unwrap();
        assert_eq!(unset, TriState::Unset);
        assert!(!unset.is_set());
    }

    #[test]
    fn test_eval_result_rejects_unknown_value() {
        let pass: EvalResult = serde_json::from_value(json!("pass")).unwrap();
        assert_eq!(pass, EvalResult::Pass);
        assert!(serde_json::from_value::<EvalResult>(json!("maybe")).is_err());
    }

    #[test]
    fn test_related_sections_always_write_every_code() {
        let mut related = RelatedSections::default();
        related.toggle(Department::Qev);
        let value = serde_json::to_value(related).unwrap();
        let map = value.as_object().unwrap();
        assert_eq!(map.len(), 9);
        assert_eq!(map["QEV"], json!(true));
        assert_eq!(map["MFG1"], json!(false));
    }

    #[test]
    fn test_related_sections_ignore_unknown_codes() {
        let related: RelatedSections =
            serde_json::from_value(json!({"QA": true, "HR": true})).unwrap();
        assert_eq!(related.selected(), vec![Department::Qa]);
    }

    #[test]
    fn test_record_field_names() {
        let mut record = FormRecord::new("PI_123", NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        record.has_msds = TriState::Yes;
        record.eval_result = EvalResult::NotPass;
        record
            .signatures
            .set(SignatureSlot::QaManager, Some("data:image/png;base64,AA==".into()));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["key"], json!("PI_123"));
        assert_eq!(value["issueDate"], json!("2024-05-01"));
        assert_eq!(value["hasMSDS"], json!(true));
        assert_eq!(value["evalResult"], json!("notpass"));
        assert_eq!(value["needInform"], json!(null));
        assert_eq!(value["sigQaMgr"], json!("data:image/png;base64,AA=="));
        assert_eq!(value["sigRequester"], json!(null));
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let record: FormRecord =
            serde_json::from_value(json!({"partName": "Bracket", "sigChief": "x"})).unwrap();
        assert_eq!(record.part_name, "Bracket");
        assert_eq!(record.signatures.get(SignatureSlot::Chief), Some("x"));
        assert_eq!(record.qa_mgr_approve, TriState::Unset);
        assert!(!record.has_doc_no());
        assert_eq!(record.related, RelatedSections::default());
    }

    #[test]
    fn test_surface_heights() {
        assert_eq!(SignatureSlot::QaManager.surface_height(), 140);
        assert_eq!(SignatureSlot::Requester.surface_height(), 120);
        assert_eq!(
            SignatureSlot::ALL
                .iter()
                .map(|s| s.field_name())
                .collect::<std::collections::HashSet<_>>()
                .len(),
            7
        );
    }
}
