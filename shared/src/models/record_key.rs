//! Record key resolution from page query parameters

use serde::{Deserialize, Serialize};

/// Prefix of keys derived from a PI number
pub const PI_KEY_PREFIX: &str = "PI_";

/// Namespace of local drafts
pub const DRAFT_PREFIX: &str = "draft:";

/// Identifier of one form, `PI_<pi>` or the raw SN
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordKey(String);

impl RecordKey {
    pub fn for_pi(pi: &str) -> Self {
        Self(format!("{PI_KEY_PREFIX}{pi}"))
    }

    /// Wrap an already-resolved key
    ///
    /// Empty keys are rejected, and so are `.` and `..`: as a URL path
    /// segment they are dot segments, even percent-encoded, and would
    /// address another route.
    pub fn parse(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        match raw.as_str() {
            "" | "." | ".." => None,
            _ => Some(Self(raw)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RecordKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// `PI` / `SN` as read from the page URL
///
/// Both upper- and lower-case parameter names are accepted, upper-case wins.
/// Empty values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pub pi: Option<String>,
    pub sn: Option<String>,
}

impl QueryParams {
    pub fn new(pi: Option<&str>, sn: Option<&str>) -> Self {
        Self {
            pi: non_empty(pi),
            sn: non_empty(sn),
        }
    }

    /// Build from decoded query pairs; the first occurrence of a name wins
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut upper_pi = None;
        let mut lower_pi = None;
        let mut upper_sn = None;
        let mut lower_sn = None;

        for (name, value) in pairs {
            let slot = match name.as_ref() {
                "PI" => &mut upper_pi,
                "pi" => &mut lower_pi,
                "SN" => &mut upper_sn,
                "sn" => &mut lower_sn,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.as_ref().to_string());
            }
        }

        Self {
            pi: non_empty(upper_pi.as_deref()).or_else(|| non_empty(lower_pi.as_deref())),
            sn: non_empty(upper_sn.as_deref()).or_else(|| non_empty(lower_sn.as_deref())),
        }
    }

    /// Key of the record this page addresses
    pub fn record_key(&self) -> Option<RecordKey> {
        match (&self.pi, &self.sn) {
            (Some(pi), _) => Some(RecordKey::for_pi(pi)),
            (None, Some(sn)) => RecordKey::parse(sn.as_str()),
            (None, None) => None,
        }
    }

    /// Pre-PI key the record may still live under (only when both are given)
    pub fn legacy_key(&self) -> Option<RecordKey> {
        match (&self.pi, &self.sn) {
            (Some(_), Some(sn)) => RecordKey::parse(sn.as_str()),
            _ => None,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}
