//! Person candidates - provisional per-name aggregates of findings

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::finding::{FindingKind, Mention, PhoneValidation, PublicRecord, SourceTag};
use crate::organize::{normalize_address, normalize_email, normalize_phone};

/// Case-insensitive, whitespace-normalized identity key for a name
pub fn name_key(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Trim and collapse internal whitespace, keeping case
pub(crate) fn clean_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A raw attribute string and every source that supplied it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcedValue {
    pub value: String,
    pub sources: BTreeSet<SourceTag>,
}

impl SourcedValue {
    pub fn new(value: impl Into<String>, source: SourceTag) -> Self {
        Self {
            value: value.into(),
            sources: BTreeSet::from([source]),
        }
    }
}

/// A web or social mention together with where it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcedMention {
    pub kind: FindingKind,
    pub source: SourceTag,
    #[serde(flatten)]
    pub mention: Mention,
}

/// Kind of identifier two candidates have in common
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharedData {
    Phone,
    Email,
    Address,
}

impl std::fmt::Display for SharedData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Phone => write!(f, "phone"),
            Self::Email => write!(f, "email"),
            Self::Address => write!(f, "address"),
        }
    }
}

/// Relation recorded on every cross-reference
pub const SHARES_DATA_WITH: &str = "shares_data_with";

/// Link to a distinct person that shares data with this one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossReference {
    pub person_name: String,
    pub relation: String,
    pub shared_data: Vec<SharedData>,
}

impl CrossReference {
    pub fn new(person_name: impl Into<String>, shared_data: Vec<SharedData>) -> Self {
        Self {
            person_name: person_name.into(),
            relation: SHARES_DATA_WITH.to_string(),
            shared_data,
        }
    }
}

/// Provisional aggregate of findings attributed to one name.
///
/// Attribute collections keep first-seen order and never hold the same raw
/// string twice; different spellings of one value are collapsed later by the
/// organizers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonCandidate {
    pub name: String,
    pub phones: Vec<SourcedValue>,
    pub addresses: Vec<SourcedValue>,
    pub emails: Vec<SourcedValue>,
    pub public_records: Vec<PublicRecord>,
    pub mentions: Vec<SourcedMention>,
    pub confidence_sources: BTreeSet<SourceTag>,
    pub phone_validation: Option<PhoneValidation>,
    /// Number of other candidates folded into this one
    pub merged_from_sources: u32,
    pub cross_references: Vec<CrossReference>,
}

fn push_sourced(values: &mut Vec<SourcedValue>, raw: &str, source: SourceTag) {
    let raw = raw.trim();
    if raw.is_empty() {
        return;
    }
    match values.iter_mut().find(|v| v.value == raw) {
        Some(existing) => {
            existing.sources.insert(source);
        }
        None => values.push(SourcedValue::new(raw, source)),
    }
}

fn merge_sourced(into: &mut Vec<SourcedValue>, from: Vec<SourcedValue>) {
    for value in from {
        match into.iter_mut().find(|v| v.value == value.value) {
            Some(existing) => existing.sources.extend(value.sources),
            None => into.push(value),
        }
    }
}

impl PersonCandidate {
    pub fn new(name: &str) -> Self {
        Self {
            name: clean_name(name),
            ..Self::default()
        }
    }

    /// Identity key used by the extractor and the deduplicator
    pub fn key(&self) -> String {
        name_key(&self.name)
    }

    pub fn add_source(&mut self, source: SourceTag) {
        self.confidence_sources.insert(source);
    }

    pub fn add_phone(&mut self, raw: &str, source: SourceTag) {
        push_sourced(&mut self.phones, raw, source);
    }

    pub fn add_address(&mut self, raw: &str, source: SourceTag) {
        push_sourced(&mut self.addresses, raw, source);
    }

    pub fn add_email(&mut self, raw: &str, source: SourceTag) {
        push_sourced(&mut self.emails, raw, source);
    }

    pub fn add_public_record(&mut self, record: PublicRecord) {
        if !self.public_records.contains(&record) {
            self.public_records.push(record);
        }
    }

    pub fn add_mention(&mut self, kind: FindingKind, source: SourceTag, mention: Mention) {
        let sourced = SourcedMention {
            kind,
            source,
            mention,
        };
        if !self.mentions.contains(&sourced) {
            self.mentions.push(sourced);
        }
    }

    /// Fold another candidate into this one.
    ///
    /// Attributes, records, mentions and sources are unioned without
    /// duplicates; the longer name string is kept.
    pub fn absorb(&mut self, other: PersonCandidate) {
        if other.name.chars().count() > self.name.chars().count() {
            self.name = other.name;
        }
        merge_sourced(&mut self.phones, other.phones);
        merge_sourced(&mut self.addresses, other.addresses);
        merge_sourced(&mut self.emails, other.emails);
        for record in other.public_records {
            self.add_public_record(record);
        }
        for m in other.mentions {
            self.add_mention(m.kind, m.source, m.mention);
        }
        self.confidence_sources.extend(other.confidence_sources);
        if self.phone_validation.is_none() {
            self.phone_validation = other.phone_validation;
        }
        self.merged_from_sources += 1 + other.merged_from_sources;
    }

    /// Phone numbers in canonical 10-digit form
    pub fn normalized_phones(&self) -> BTreeSet<String> {
        self.phones
            .iter()
            .filter_map(|v| normalize_phone(&v.value))
            .collect()
    }

    pub fn normalized_emails(&self) -> BTreeSet<String> {
        self.emails
            .iter()
            .filter_map(|v| normalize_email(&v.value))
            .collect()
    }

    pub fn normalized_addresses(&self) -> BTreeSet<String> {
        self.addresses
            .iter()
            .filter_map(|v| normalize_address(&v.value))
            .collect()
    }

    /// Identifier kinds this candidate shares exactly with `other`
    pub fn shared_identifiers(&self, other: &PersonCandidate) -> Vec<SharedData> {
        let mut shared = Vec::new();
        if !self.normalized_phones().is_disjoint(&other.normalized_phones()) {
            shared.push(SharedData::Phone);
        }
        if !self.normalized_emails().is_disjoint(&other.normalized_emails()) {
            shared.push(SharedData::Email);
        }
        if !self
            .normalized_addresses()
            .is_disjoint(&other.normalized_addresses())
        {
            shared.push(SharedData::Address);
        }
        shared
    }

    pub fn has_source(&self, source: SourceTag) -> bool {
        self.confidence_sources.contains(&source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_key_is_case_and_space_insensitive() {
        assert_eq!(name_key("  John   SMITH "), "john smith");
        assert_eq!(PersonCandidate::new(" John  Smith ").name, "John Smith");
    }

    #[test]
    fn raw_values_dedup_and_collect_sources() {
        let mut c = PersonCandidate::new("John Smith");
        c.add_phone("740-827-6423", SourceTag::UserInput);
        c.add_phone(" 740-827-6423 ", SourceTag::PublicRecords);
        c.add_phone("", SourceTag::WebMention);
        assert_eq!(c.phones.len(), 1);
        assert_eq!(
            c.phones[0].sources,
            BTreeSet::from([SourceTag::UserInput, SourceTag::PublicRecords])
        );
    }

    #[test]
    fn absorb_unions_and_counts() {
        let mut a = PersonCandidate::new("John Smith");
        a.add_phone("740-827-6423", SourceTag::UserInput);
        a.add_source(SourceTag::UserInput);

        let mut b = PersonCandidate::new("John  Smith Jr");
        b.add_phone("740-827-6423", SourceTag::PublicRecords);
        b.add_email("js@example.com", SourceTag::PublicRecords);
        b.add_source(SourceTag::PublicRecords);

        a.absorb(b);
        assert_eq!(a.name, "John Smith Jr");
        assert_eq!(a.phones.len(), 1);
        assert_eq!(a.emails.len(), 1);
        assert_eq!(a.merged_from_sources, 1);
        assert!(a.has_source(SourceTag::PublicRecords));
    }

    #[test]
    fn shared_identifiers_use_normalized_forms() {
        let mut a = PersonCandidate::new("A");
        a.add_phone("(740) 827-6423", SourceTag::UserInput);
        a.add_email("John@Example.com", SourceTag::UserInput);
        let mut b = PersonCandidate::new("B");
        b.add_phone("1-740-827-6423", SourceTag::WebMention);
        b.add_email("john@example.com", SourceTag::WebMention);
        assert_eq!(
            a.shared_identifiers(&b),
            vec![SharedData::Phone, SharedData::Email]
        );
    }
}
