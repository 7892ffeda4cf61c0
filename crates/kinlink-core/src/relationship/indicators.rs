//! Pairwise relationship indicators

use std::collections::BTreeSet;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::candidate::name_key;
use crate::finding::PublicRecord;
use crate::organize::AddressComponents;
use crate::result::OrganizedPerson;

/// One piece of evidence linking two persons
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipIndicator {
    SameAddress,
    SamePhone,
    SameLastName,
    PropertyCoOwner,
    AgeParentChild,
    AgeSibling,
    BusinessAssociate,
    CoOccurrence,
}

impl RelationshipIndicator {
    pub fn weight(self) -> f64 {
        match self {
            Self::SameAddress => 0.30,
            Self::SamePhone => 0.25,
            Self::SameLastName => 0.15,
            Self::PropertyCoOwner => 0.30,
            Self::AgeParentChild => 0.10,
            Self::AgeSibling => 0.15,
            Self::BusinessAssociate => 0.25,
            Self::CoOccurrence => 0.10,
        }
    }

    /// Indicators that can create an edge on their own. Last name and age
    /// only qualify a link found some other way.
    pub fn is_linking(self) -> bool {
        !matches!(
            self,
            Self::SameLastName | Self::AgeParentChild | Self::AgeSibling
        )
    }
}

impl std::fmt::Display for RelationshipIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::SameAddress => "same_address",
            Self::SamePhone => "same_phone",
            Self::SameLastName => "same_last_name",
            Self::PropertyCoOwner => "property_co_owner",
            Self::AgeParentChild => "age_parent_child",
            Self::AgeSibling => "age_sibling",
            Self::BusinessAssociate => "business_associate",
            Self::CoOccurrence => "co_occurrence",
        };
        write!(f, "{}", s)
    }
}

const NAME_SUFFIXES: &[&str] = &["jr", "sr", "ii", "iii", "iv"];

const BUSINESS_KEYWORDS: &[&str] = &[
    "llc",
    "inc",
    "corp",
    "corporation",
    "ltd",
    "lp",
    "llp",
    "company",
    "partner",
    "partners",
    "owner",
    "officer",
    "director",
    "president",
    "registered agent",
    "member",
    "manager",
];

lazy_static! {
    static ref BORN_YEAR: Regex = Regex::new(r"(?i)\bborn:?\s*(?:in\s+)?((?:19|20)\d{2})\b")
        .expect("valid born regex");
    static ref AGE_NN: Regex =
        Regex::new(r"(?i)\bage:?\s*(\d{1,3})\b").expect("valid age regex");
    static ref YEARS_OLD: Regex =
        Regex::new(r"(?i)\b(\d{1,3})\s+years?\s+old\b").expect("valid years old regex");
    static ref YEAR: Regex = Regex::new(r"\b((?:19|20)\d{2})\b").expect("valid year regex");
}

const MAX_AGE: u32 = 120;

/// Lower-case, punctuation to spaces, commas as standalone tokens, padded
/// with one space on each side so whole-token checks are plain substring
/// checks.
pub(crate) fn match_text(raw: &str) -> String {
    let mut mapped = String::with_capacity(raw.len() + 2);
    for c in raw.chars() {
        if c.is_alphanumeric() {
            mapped.extend(c.to_lowercase());
        } else if c == ',' {
            mapped.push_str(" , ");
        } else {
            mapped.push(' ');
        }
    }
    format!(" {} ", mapped.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Name tokens without punctuation or generational suffixes
fn name_tokens(name: &str) -> Vec<String> {
    match_text(name)
        .split_whitespace()
        .filter(|t| *t != "," && !NAME_SUFFIXES.contains(t))
        .map(str::to_string)
        .collect()
}

/// Ways a name is written in free text, each in [`match_text`] form
pub fn name_variants(name: &str) -> Vec<String> {
    let tokens = name_tokens(name);
    let mut variants = Vec::new();
    let mut push = |v: String| {
        let v = match_text(&v);
        if !v.trim().is_empty() && !variants.contains(&v) {
            variants.push(v);
        }
    };
    push(name.to_string());
    if let (Some(first), Some(last)) = (tokens.first(), tokens.last()) {
        if tokens.len() > 1 {
            push(format!("{} {}", first, last));
            push(format!("{} {}", last, first));
            push(format!("{}, {}", last, first));
        }
    }
    variants
}

/// Age in years, if any field or text of the records states one
pub fn extract_age(records: &[PublicRecord], current_year: i32) -> Option<u32> {
    records
        .iter()
        .find_map(|r| record_age(r, current_year))
}

fn valid_age(age: i64) -> Option<u32> {
    u32::try_from(age).ok().filter(|a| *a <= MAX_AGE)
}

fn age_from_birth_year(year: i64, current_year: i32) -> Option<u32> {
    valid_age(i64::from(current_year) - year)
}

fn record_age(record: &PublicRecord, current_year: i32) -> Option<u32> {
    let explicit = match &record.age {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s
            .trim()
            .trim_end_matches('+')
            .parse::<i64>()
            .ok()
            .or_else(|| AGE_NN.captures(s).and_then(|c| c[1].parse().ok())),
        _ => None,
    };
    if let Some(age) = explicit.and_then(valid_age) {
        return Some(age);
    }

    if let Some(dob) = record.dob.as_deref() {
        if let Some(year) = YEAR.captures(dob).and_then(|c| c[1].parse::<i64>().ok()) {
            if let Some(age) = age_from_birth_year(year, current_year) {
                return Some(age);
            }
        }
    }

    let text = record.text_blob();
    if let Some(year) = BORN_YEAR.captures(&text).and_then(|c| c[1].parse::<i64>().ok()) {
        if let Some(age) = age_from_birth_year(year, current_year) {
            return Some(age);
        }
    }
    AGE_NN
        .captures(&text)
        .or_else(|| YEARS_OLD.captures(&text))
        .and_then(|c| c[1].parse::<i64>().ok())
        .and_then(valid_age)
}

/// Comparison view of one person for indicator evaluation
#[derive(Debug, Clone)]
pub struct PersonFeatures {
    pub name: String,
    pub key: String,
    pub last_name: Option<String>,
    pub variants: Vec<String>,
    pub addresses: Vec<AddressComponents>,
    pub phones: BTreeSet<String>,
    pub age: Option<u32>,
    /// Normalized text of every public record held by the person
    pub record_texts: Vec<String>,
    /// Normalized text of every web or social mention held by the person
    pub mention_texts: Vec<String>,
}

impl PersonFeatures {
    pub fn from_person(person: &OrganizedPerson, current_year: i32) -> Self {
        let tokens = name_tokens(&person.name);
        Self {
            name: person.name.clone(),
            key: name_key(&person.name),
            last_name: tokens.last().cloned(),
            variants: name_variants(&person.name),
            addresses: person
                .organized_addresses
                .iter()
                .map(|a| a.details.components.clone())
                .collect(),
            phones: person
                .organized_phones
                .iter()
                .filter(|p| p.details.valid_format)
                .map(|p| p.normalized.clone())
                .collect(),
            age: extract_age(&person.public_records, current_year),
            record_texts: person
                .public_records
                .iter()
                .map(|r| match_text(&r.text_blob()))
                .collect(),
            mention_texts: person
                .mentions
                .iter()
                .map(|m| {
                    let mention = &m.mention;
                    let mut text = mention.text_blob();
                    for name in mention.subject_names() {
                        text.push_str(" , ");
                        text.push_str(name);
                    }
                    match_text(&text)
                })
                .collect(),
        }
    }

    /// True when any written form of this person's name is in `text`
    pub fn named_in(&self, text: &str) -> bool {
        self.variants.iter().any(|v| text.contains(v.as_str()))
    }
}

/// Texts in which both persons are named
pub(crate) fn texts_naming_both<'a>(
    texts: &'a [String],
    a: &'a PersonFeatures,
    b: &'a PersonFeatures,
) -> impl Iterator<Item = &'a String> + 'a {
    texts
        .iter()
        .filter(move |text| a.named_in(text) && b.named_in(text))
}

pub(crate) fn has_business_keyword(text: &str) -> bool {
    BUSINESS_KEYWORDS
        .iter()
        .any(|k| text.contains(&format!(" {} ", k)))
}
