//! Email organizer

use serde::{Deserialize, Serialize};

use super::{group_values, sort_by_confidence, OrganizedEmail};
use crate::candidate::PersonCandidate;
use crate::confidence::WeightTable;

/// Per-source points for an email address
pub const EMAIL_WEIGHTS: WeightTable = WeightTable {
    verified_email: 40,
    public_records: 30,
    user_input: 20,
    web_mention: 10,
    social_media: 10,
    phone_api: 5,
};

const PERSONAL_PROVIDERS: &[&str] = &[
    "gmail.com",
    "googlemail.com",
    "yahoo.com",
    "ymail.com",
    "hotmail.com",
    "outlook.com",
    "live.com",
    "msn.com",
    "aol.com",
    "icloud.com",
    "me.com",
    "mac.com",
    "protonmail.com",
    "proton.me",
    "gmx.com",
    "mail.com",
    "yandex.com",
    "comcast.net",
    "att.net",
    "sbcglobal.net",
    "bellsouth.net",
    "verizon.net",
    "charter.net",
    "cox.net",
    "earthlink.net",
    "frontier.com",
    "windstream.net",
];

const DISPOSABLE_PROVIDERS: &[&str] = &[
    "mailinator.com",
    "guerrillamail.com",
    "sharklasers.com",
    "10minutemail.com",
    "tempmail.com",
    "temp-mail.org",
    "yopmail.com",
    "trashmail.com",
    "getnada.com",
    "dispostable.com",
    "throwawaymail.com",
    "maildrop.cc",
    "fakeinbox.com",
];

const NAME_SUFFIXES: &[&str] = &["jr", "sr", "ii", "iii", "iv"];

/// Lower-cased address with a `mailto:` prefix removed. `None` unless it has
/// exactly one `@`, a non-empty local part and a dotted domain.
pub fn normalize_email(raw: &str) -> Option<String> {
    let trimmed = raw.trim().to_lowercase();
    let email = trimmed.strip_prefix("mailto:").unwrap_or(&trimmed);
    if email.chars().any(char::is_whitespace) {
        return None;
    }
    let (local, domain) = email.split_once('@')?;
    let well_formed = !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.');
    well_formed.then(|| email.to_string())
}

/// Mailbox provider classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailType {
    Personal,
    #[default]
    Business,
    Disposable,
}

pub fn classify_domain(domain: &str) -> EmailType {
    let domain = domain.to_lowercase();
    if DISPOSABLE_PROVIDERS.contains(&domain.as_str()) {
        EmailType::Disposable
    } else if PERSONAL_PROVIDERS.contains(&domain.as_str()) {
        EmailType::Personal
    } else {
        EmailType::Business
    }
}

/// Describe how a local part is built from the person's name, e.g.
/// `first.last`, `flast` or `first.last+digits`.
pub fn infer_local_pattern(local: &str, name: &str) -> Option<String> {
    let tokens: Vec<String> = name
        .split_whitespace()
        .map(|t| {
            t.chars()
                .filter(|c| c.is_alphabetic())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|t| !t.is_empty() && !NAME_SUFFIXES.contains(&t.as_str()))
        .collect();
    let first = tokens.first()?;

    let local = local.to_lowercase();
    let base = local.trim_end_matches(|c: char| c.is_ascii_digit());
    let numbered = base.len() < local.len();
    if base.is_empty() {
        return None;
    }

    let mut candidates: Vec<(&str, String)> = Vec::new();
    if let Some(last) = tokens.last().filter(|_| tokens.len() > 1) {
        let f = &first[..first.chars().next().map_or(0, char::len_utf8)];
        let l = &last[..last.chars().next().map_or(0, char::len_utf8)];
        candidates.extend([
            ("first.last", format!("{}.{}", first, last)),
            ("first_last", format!("{}_{}", first, last)),
            ("first-last", format!("{}-{}", first, last)),
            ("firstlast", format!("{}{}", first, last)),
            ("last.first", format!("{}.{}", last, first)),
            ("lastfirst", format!("{}{}", last, first)),
            ("flast", format!("{}{}", f, last)),
            ("f.last", format!("{}.{}", f, last)),
            ("firstl", format!("{}{}", first, l)),
            ("first", first.clone()),
            ("last", last.clone()),
        ]);
    } else {
        candidates.push(("first", first.clone()));
    }

    candidates
        .into_iter()
        .find(|(_, expected)| expected == base)
        .map(|(pattern, _)| {
            if numbered {
                format!("{}+digits", pattern)
            } else {
                pattern.to_string()
            }
        })
}

/// Structural metadata for one email address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailDetails {
    pub local_part: String,
    pub domain: String,
    pub email_type: EmailType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    pub valid_format: bool,
}

/// Deduplicates and scores a candidate's email addresses
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailOrganizer;

impl EmailOrganizer {
    pub fn new() -> Self {
        Self
    }

    pub fn organize(&self, candidate: &PersonCandidate) -> Vec<OrganizedEmail> {
        let groups = group_values(&candidate.emails, |raw| {
            normalize_email(raw).unwrap_or_else(|| raw.trim().to_lowercase())
        });

        let mut organized: Vec<OrganizedEmail> = groups
            .into_iter()
            .map(|group| {
                let details = details(&group.normalized, &candidate.name);
                group.into_attribute(&EMAIL_WEIGHTS, &[], details)
            })
            .collect();

        sort_by_confidence(&mut organized);
        organized
    }
}

fn details(normalized: &str, name: &str) -> EmailDetails {
    let valid_format = normalize_email(normalized).is_some();
    let (local, domain) = normalized.split_once('@').unwrap_or((normalized, ""));
    EmailDetails {
        local_part: local.to_string(),
        domain: domain.to_string(),
        email_type: classify_domain(domain),
        pattern: valid_format
            .then(|| infer_local_pattern(local, name))
            .flatten(),
        valid_format,
    }
}
