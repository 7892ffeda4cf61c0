//! Raw findings - the evidence handed over by upstream collectors
//!
//! A results bundle arrives as JSON with findings grouped by kind. Every
//! collection is optional: a missing key, an explicit `null` and an empty
//! array all deserialize to an empty collection. Keys a collector adds that
//! are not modeled here are kept in an `extra` map so text-level checks
//! (name co-occurrence, business keywords, ages) still see them.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Provenance of a piece of evidence.
///
/// Ordering follows declaration order and is only used to keep source sets
/// deterministic in output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    /// Values the searcher typed in
    UserInput,
    /// County and other official records
    PublicRecords,
    /// Phone-validation API result
    PhoneApi,
    /// Email confirmed deliverable by a collector
    VerifiedEmail,
    /// Social-network profile hits
    SocialMedia,
    /// Generic web pages, phone and email mentions
    WebMention,
}

impl SourceTag {
    pub const ALL: [SourceTag; 6] = [
        Self::UserInput,
        Self::PublicRecords,
        Self::PhoneApi,
        Self::VerifiedEmail,
        Self::SocialMedia,
        Self::WebMention,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserInput => "user_input",
            Self::PublicRecords => "public_records",
            Self::PhoneApi => "phone_api",
            Self::VerifiedEmail => "verified_email",
            Self::SocialMedia => "social_media",
            Self::WebMention => "web_mention",
        }
    }
}

impl std::fmt::Display for SourceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a raw finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    PublicRecord,
    PhoneMention,
    SocialProfile,
    WebMention,
    UserInput,
}

impl std::fmt::Display for FindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PublicRecord => write!(f, "public_record"),
            Self::PhoneMention => write!(f, "phone_mention"),
            Self::SocialProfile => write!(f, "social_profile"),
            Self::WebMention => write!(f, "web_mention"),
            Self::UserInput => write!(f, "user_input"),
        }
    }
}

/// Treat `null` the same as a missing key.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Trimmed, non-empty view of an optional string field
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Append every string reachable from a JSON value to `out`, space separated.
pub(crate) fn collect_text(value: &Value, out: &mut String) {
    match value {
        Value::String(s) => {
            out.push(' ');
            out.push_str(s);
        }
        Value::Number(n) => {
            out.push(' ');
            out.push_str(&n.to_string());
        }
        Value::Array(items) => items.iter().for_each(|v| collect_text(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_text(v, out)),
        Value::Bool(_) | Value::Null => {}
    }
}

/// What the user searched for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Two-letter region (state) the search was scoped to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// County or city within the region
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_region: Option<String>,
}

impl SearchParams {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// The search subject's name, if one was supplied
    pub fn subject_name(&self) -> Option<&str> {
        non_empty(&self.name)
    }

    /// True when no parameter carries a value
    pub fn is_empty(&self) -> bool {
        [
            &self.name,
            &self.phone,
            &self.address,
            &self.email,
            &self.region,
            &self.sub_region,
        ]
        .iter()
        .all(|v| non_empty(v).is_none())
    }

    /// Stable key for result caches, derived from name, phone, address and email.
    ///
    /// Values are trimmed and lower-cased so trivially different spellings of
    /// the same search share a key. The engine never consults it.
    pub fn cache_key(&self) -> String {
        let mut h = Sha256::new();
        for (label, value) in [
            (&b"n:"[..], &self.name),
            (&b"\np:"[..], &self.phone),
            (&b"\na:"[..], &self.address),
            (&b"\ne:"[..], &self.email),
        ] {
            h.update(label);
            h.update(non_empty(value).unwrap_or_default().to_lowercase().as_bytes());
        }
        hex_encode(&h.finalize())
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    const HEX_CHARS: &[u8; 16] = b"0123456789abcdef";
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        s.push(HEX_CHARS[(b >> 4) as usize] as char);
        s.push(HEX_CHARS[(b & 0x0f) as usize] as char);
    }
    s
}

/// A county or other official record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicRecord {
    /// Name the collector searched for when it found this record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// e.g. "property", "voter", "court"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub phones: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Either a number or a string such as "45"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<Value>,
    #[serde(alias = "birth_date", alias = "date_of_birth", skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    /// Co-owners, officers, parties listed on the record
    #[serde(
        alias = "owner_names",
        deserialize_with = "nullable",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub owners: Vec<String>,
    #[serde(alias = "snippet", alias = "description", skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PublicRecord {
    /// The record's subject name: `search_name`, falling back to `name`
    pub fn subject_name(&self) -> Option<&str> {
        non_empty(&self.search_name).or_else(|| non_empty(&self.name))
    }

    pub fn all_addresses(&self) -> Vec<&str> {
        non_empty(&self.address)
            .into_iter()
            .chain(self.addresses.iter().map(|s| s.trim()))
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn all_phones(&self) -> Vec<&str> {
        non_empty(&self.phone)
            .into_iter()
            .chain(self.phones.iter().map(|s| s.trim()))
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Every textual value on the record, including unmodeled keys
    pub fn text_blob(&self) -> String {
        let mut out = String::new();
        let fields = [
            &self.search_name,
            &self.name,
            &self.record_type,
            &self.address,
            &self.phone,
            &self.email,
            &self.state,
            &self.dob,
            &self.text,
        ];
        for value in fields.into_iter().flatten() {
            out.push(' ');
            out.push_str(value);
        }
        for value in self.addresses.iter().chain(&self.phones).chain(&self.owners) {
            out.push(' ');
            out.push_str(value);
        }
        if let Some(age) = &self.age {
            out.push_str(" age ");
            collect_text(age, &mut out);
        }
        for value in self.extra.values() {
            collect_text(value, &mut out);
        }
        out
    }
}

/// A phone, social, web or email mention found online
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mention {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Names the page associates with this hit
    #[serde(
        alias = "names",
        alias = "associated_people",
        deserialize_with = "nullable",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub associated_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    /// Social network name for profile hits
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Set by email collectors that confirmed deliverability
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub verified: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Mention {
    /// Names this mention is about: the associated-name list, else `name`
    pub fn subject_names(&self) -> Vec<&str> {
        let listed: Vec<&str> = self
            .associated_names
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        if listed.is_empty() {
            non_empty(&self.name).into_iter().collect()
        } else {
            listed
        }
    }

    /// Title, snippet and unmodeled keys - the text a reader would see
    pub fn text_blob(&self) -> String {
        let mut out = String::new();
        for value in [&self.title, &self.snippet].into_iter().flatten() {
            out.push(' ');
            out.push_str(value);
        }
        for value in self.extra.values() {
            collect_text(value, &mut out);
        }
        out
    }
}

/// Result of the upstream phone-validation API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhoneValidation {
    #[serde(alias = "number", alias = "phone_number", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(alias = "is_valid", skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PhoneValidation {
    /// A result that did not explicitly report the number invalid
    pub fn is_usable(&self) -> bool {
        self.valid != Some(false) && non_empty(&self.phone).is_some()
    }
}

/// Findings from official sources
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfficialResults {
    #[serde(alias = "public_records", deserialize_with = "nullable")]
    pub county_records: Vec<PublicRecord>,
    pub phone_validation: Option<PhoneValidation>,
}

/// Findings scraped from the open web
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebResults {
    #[serde(deserialize_with = "nullable")]
    pub social_media: Vec<Mention>,
    #[serde(alias = "general", deserialize_with = "nullable")]
    pub web_mentions: Vec<Mention>,
    #[serde(deserialize_with = "nullable")]
    pub phone_mentions: Vec<Mention>,
    #[serde(deserialize_with = "nullable")]
    pub email_mentions: Vec<Mention>,
}

/// Everything upstream collectors found for one search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultsBundle {
    #[serde(deserialize_with = "nullable")]
    pub official_results: OfficialResults,
    #[serde(deserialize_with = "nullable")]
    pub web_results: WebResults,
    #[serde(deserialize_with = "nullable")]
    pub search_params: SearchParams,
}

impl ResultsBundle {
    /// Flatten the bundle into typed findings, in extraction order.
    ///
    /// The phone-validation payload is not a finding; it is attached to a
    /// candidate separately.
    pub fn findings(&self) -> Vec<RawFinding> {
        let mut findings = Vec::new();
        if !self.search_params.is_empty() {
            findings.push(RawFinding::UserInput(self.search_params.clone()));
        }
        findings.extend(
            self.official_results
                .county_records
                .iter()
                .cloned()
                .map(RawFinding::PublicRecord),
        );
        findings.extend(
            self.web_results
                .phone_mentions
                .iter()
                .cloned()
                .map(RawFinding::PhoneMention),
        );
        findings.extend(
            self.web_results
                .social_media
                .iter()
                .cloned()
                .map(RawFinding::SocialProfile),
        );
        findings.extend(
            self.web_results
                .web_mentions
                .iter()
                .chain(&self.web_results.email_mentions)
                .cloned()
                .map(RawFinding::WebMention),
        );
        findings
    }
}

/// One atomic fact from one source
#[derive(Debug, Clone, PartialEq)]
pub enum RawFinding {
    PublicRecord(PublicRecord),
    PhoneMention(Mention),
    SocialProfile(Mention),
    WebMention(Mention),
    UserInput(SearchParams),
}

impl RawFinding {
    pub fn kind(&self) -> FindingKind {
        match self {
            Self::PublicRecord(_) => FindingKind::PublicRecord,
            Self::PhoneMention(_) => FindingKind::PhoneMention,
            Self::SocialProfile(_) => FindingKind::SocialProfile,
            Self::WebMention(_) => FindingKind::WebMention,
            Self::UserInput(_) => FindingKind::UserInput,
        }
    }

    /// Provenance tag used for confidence weighting
    pub fn source(&self) -> SourceTag {
        match self {
            Self::PublicRecord(_) => SourceTag::PublicRecords,
            Self::PhoneMention(_) => SourceTag::WebMention,
            Self::SocialProfile(_) => SourceTag::SocialMedia,
            Self::WebMention(m) if m.verified && non_empty(&m.email).is_some() => {
                SourceTag::VerifiedEmail
            }
            Self::WebMention(_) => SourceTag::WebMention,
            Self::UserInput(_) => SourceTag::UserInput,
        }
    }

    /// Names this finding is attributed to. Empty when none can be extracted.
    pub fn subject_names(&self) -> Vec<&str> {
        match self {
            Self::PublicRecord(r) => r.subject_name().into_iter().collect(),
            Self::PhoneMention(m) | Self::SocialProfile(m) | Self::WebMention(m) => {
                m.subject_names()
            }
            Self::UserInput(p) => p.subject_name().into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_and_null_collections_are_empty() {
        let bundle: ResultsBundle = serde_json::from_value(json!({
            "official_results": {"county_records": null},
            "web_results": {"social_media": null, "web_mentions": []},
        }))
        .unwrap();
        assert!(bundle.official_results.county_records.is_empty());
        assert!(bundle.official_results.phone_validation.is_none());
        assert!(bundle.web_results.social_media.is_empty());
        assert!(bundle.search_params.is_empty());
        assert!(bundle.findings().is_empty());
    }

    #[test]
    fn unknown_record_keys_reach_text_blob() {
        let record: PublicRecord = serde_json::from_value(json!({
            "search_name": "John Smith",
            "grantee": "Mary Jones",
            "parcel": {"id": 42},
        }))
        .unwrap();
        let blob = record.text_blob();
        assert!(blob.contains("Mary Jones"));
        assert!(blob.contains("42"));
        assert_eq!(record.subject_name(), Some("John Smith"));
    }

    #[test]
    fn mention_names_prefer_associated_list() {
        let m = Mention {
            name: Some("Page Owner".into()),
            associated_names: vec!["  ".into(), "Jane Doe".into()],
            ..Mention::default()
        };
        assert_eq!(m.subject_names(), vec!["Jane Doe"]);

        let m = Mention {
            name: Some("Page Owner".into()),
            ..Mention::default()
        };
        assert_eq!(m.subject_names(), vec!["Page Owner"]);
    }

    #[test]
    fn verified_email_mentions_carry_verified_source() {
        let verified = RawFinding::WebMention(Mention {
            email: Some("a@b.com".into()),
            verified: true,
            ..Mention::default()
        });
        assert_eq!(verified.source(), SourceTag::VerifiedEmail);

        let plain = RawFinding::WebMention(Mention {
            verified: true,
            ..Mention::default()
        });
        assert_eq!(plain.source(), SourceTag::WebMention);
    }

    #[test]
    fn cache_key_ignores_case_and_padding() {
        let a = SearchParams {
            name: Some("John Smith".into()),
            phone: Some("740-827-6423".into()),
            ..SearchParams::default()
        };
        let b = SearchParams {
            name: Some("  JOHN SMITH ".into()),
            phone: Some("740-827-6423".into()),
            region: Some("OH".into()),
            ..SearchParams::default()
        };
        assert_eq!(a.cache_key(), b.cache_key());
        assert_eq!(a.cache_key().len(), 64);
        assert_ne!(a.cache_key(), SearchParams::named("Jane Smith").cache_key());
    }
}
