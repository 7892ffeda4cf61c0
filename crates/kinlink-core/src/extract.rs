//! Finding extraction: results bundle to per-name candidates
//!
//! Candidates are keyed by the exact case-insensitive, whitespace-normalized
//! subject name of each finding. Findings without a name go to the search
//! subject when one was given and are otherwise counted as unattributed.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::candidate::{name_key, PersonCandidate};
use crate::finding::{non_empty, PhoneValidation, RawFinding, ResultsBundle, SourceTag};
use crate::organize::normalize_phone;

/// Candidates in first-seen order plus the number of dropped findings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub candidates: Vec<PersonCandidate>,
    pub unattributed: usize,
}

/// Builds candidates from a results bundle
#[derive(Debug, Clone, Copy, Default)]
pub struct FindingExtractor;

/// Insertion-ordered candidate table
#[derive(Default)]
struct CandidateTable {
    candidates: Vec<PersonCandidate>,
    index: HashMap<String, usize>,
}

impl CandidateTable {
    fn entry(&mut self, name: &str) -> &mut PersonCandidate {
        let key = name_key(name);
        let idx = match self.index.get(&key) {
            Some(&idx) => idx,
            None => {
                self.candidates.push(PersonCandidate::new(name));
                self.index.insert(key, self.candidates.len() - 1);
                self.candidates.len() - 1
            }
        };
        &mut self.candidates[idx]
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.index.get(&name_key(name)).copied()
    }
}

impl FindingExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, bundle: &ResultsBundle) -> Extraction {
        let subject = bundle.search_params.subject_name();
        let mut table = CandidateTable::default();
        let mut unattributed = 0;

        // User input and public records come first so the validation payload
        // can find a record that holds its number.
        let findings = bundle.findings();
        let split = findings
            .iter()
            .position(|f| !matches!(f, RawFinding::UserInput(_) | RawFinding::PublicRecord(_)))
            .unwrap_or(findings.len());
        let (official, web) = findings.split_at(split);

        for finding in official {
            unattributed += Self::apply(&mut table, finding, subject);
        }
        if let Some(validation) = &bundle.official_results.phone_validation {
            Self::attach_validation(&mut table, validation, subject);
        }
        for finding in web {
            unattributed += Self::apply(&mut table, finding, subject);
        }

        if unattributed > 0 {
            warn!(
                unattributed,
                "dropped findings with no extractable name and no search subject"
            );
        }
        debug!(candidates = table.candidates.len(), "extracted candidates");

        Extraction {
            candidates: table.candidates,
            unattributed,
        }
    }

    /// Record one finding on every candidate it names. Returns 1 when the
    /// finding could not be attributed.
    fn apply(table: &mut CandidateTable, finding: &RawFinding, subject: Option<&str>) -> usize {
        let mut names = finding.subject_names();
        if names.is_empty() {
            match subject {
                Some(subject) => names.push(subject),
                None => {
                    debug!(kind = %finding.kind(), "unattributed finding");
                    return 1;
                }
            }
        }

        let source = finding.source();
        for name in names {
            let candidate = table.entry(name);
            candidate.add_source(source);
            match finding {
                RawFinding::UserInput(params) => {
                    if let Some(phone) = non_empty(&params.phone) {
                        candidate.add_phone(phone, source);
                    }
                    if let Some(address) = non_empty(&params.address) {
                        candidate.add_address(address, source);
                    }
                    if let Some(email) = non_empty(&params.email) {
                        candidate.add_email(email, source);
                    }
                }
                RawFinding::PublicRecord(record) => {
                    for phone in record.all_phones() {
                        candidate.add_phone(phone, source);
                    }
                    for address in record.all_addresses() {
                        candidate.add_address(address, source);
                    }
                    if let Some(email) = non_empty(&record.email) {
                        candidate.add_email(email, source);
                    }
                    candidate.add_public_record(record.clone());
                }
                RawFinding::PhoneMention(mention)
                | RawFinding::SocialProfile(mention)
                | RawFinding::WebMention(mention) => {
                    if let Some(phone) = non_empty(&mention.phone) {
                        candidate.add_phone(phone, source);
                    }
                    if let Some(address) = non_empty(&mention.address) {
                        candidate.add_address(address, source);
                    }
                    if let Some(email) = non_empty(&mention.email) {
                        candidate.add_email(email, source);
                    }
                    candidate.add_mention(finding.kind(), source, mention.clone());
                }
            }
        }
        0
    }

    /// Attach the validation payload to the search subject, else to the
    /// first candidate already holding the validated number.
    fn attach_validation(
        table: &mut CandidateTable,
        validation: &PhoneValidation,
        subject: Option<&str>,
    ) {
        let target = match subject {
            Some(name) => table.position(name),
            None => validation
                .phone
                .as_deref()
                .and_then(normalize_phone)
                .and_then(|number| {
                    table
                        .candidates
                        .iter()
                        .position(|c| c.normalized_phones().contains(&number))
                }),
        };

        let Some(idx) = target else {
            debug!("phone validation matched no candidate");
            return;
        };

        let candidate = &mut table.candidates[idx];
        if validation.is_usable() {
            if let Some(phone) = non_empty(&validation.phone) {
                candidate.add_phone(phone, SourceTag::PhoneApi);
            }
            candidate.add_source(SourceTag::PhoneApi);
        }
        candidate.phone_validation = Some(validation.clone());
    }
}
