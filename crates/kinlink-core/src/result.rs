//! Organized output: per-person views, ranking and run summary

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::candidate::{CrossReference, PersonCandidate, SourcedMention};
use crate::confidence::{ConfidenceBand, ConfidenceScorer, ScoreBreakdown};
use crate::finding::{PhoneValidation, PublicRecord, SearchParams, SourceTag};
use crate::organize::{
    AddressOrganizer, EmailOrganizer, OrganizedAddress, OrganizedEmail, OrganizedPhone,
    PhoneOrganizer,
};
use crate::relationship::{RelationshipCategory, RelationshipsOutput};

/// Relevance bonus for persons the user searched for directly
const USER_INPUT_BONUS: u32 = 20;
const MAX_RECORD_POINTS: usize = 5;

/// A surviving person with organized attributes and scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizedPerson {
    pub name: String,
    /// Raw strings as collected, before organizing
    pub phones: Vec<String>,
    pub addresses: Vec<String>,
    pub emails: Vec<String>,
    pub public_records: Vec<PublicRecord>,
    pub mentions: Vec<SourcedMention>,
    pub confidence_sources: Vec<SourceTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_validation: Option<PhoneValidation>,
    pub merged_from_sources: u32,
    pub organized_phones: Vec<OrganizedPhone>,
    pub organized_addresses: Vec<OrganizedAddress>,
    pub organized_emails: Vec<OrganizedEmail>,
    pub overall_confidence_score: u32,
    pub overall_confidence_band: ConfidenceBand,
    pub score_breakdown: ScoreBreakdown,
    pub cross_references: Vec<CrossReference>,
    pub relevance_score: u32,
}

impl OrganizedPerson {
    pub fn has_source(&self, source: SourceTag) -> bool {
        self.confidence_sources.contains(&source)
    }
}

/// Confidence band histogram
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl BandCounts {
    fn record(&mut self, band: ConfidenceBand) {
        match band {
            ConfidenceBand::High => self.high += 1,
            ConfidenceBand::Medium => self.medium += 1,
            ConfidenceBand::Low => self.low += 1,
        }
    }
}

/// Aggregate counts over one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub total_persons: usize,
    pub total_phones: usize,
    pub total_addresses: usize,
    pub total_emails: usize,
    pub total_public_records: usize,
    pub total_mentions: usize,
    /// Candidates folded into a surviving person
    pub merged_candidates: u32,
    /// Persons holding at least one cross-reference
    pub cross_referenced_persons: usize,
    pub unattributed_findings: usize,
    pub confidence_bands: BandCounts,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub relationship_categories: BTreeMap<RelationshipCategory, usize>,
}

/// Final output of the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizedResults {
    pub search_params: SearchParams,
    /// RFC 3339
    pub timestamp: String,
    pub persons: Vec<OrganizedPerson>,
    pub total_persons_found: usize,
    pub summary: ResultSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationships: Option<RelationshipsOutput>,
}

impl OrganizedResults {
    /// Attach relationship output and record per-category edge counts
    pub fn attach_relationships(&mut self, relationships: RelationshipsOutput) {
        self.summary.relationship_categories = relationships
            .categories
            .iter()
            .map(|(category, edges)| (*category, edges.len()))
            .collect();
        self.relationships = Some(relationships);
    }

    /// Person by name, case- and whitespace-insensitive
    pub fn person(&self, name: &str) -> Option<&OrganizedPerson> {
        let key = crate::candidate::name_key(name);
        self.persons
            .iter()
            .find(|p| crate::candidate::name_key(&p.name) == key)
    }
}

/// Organizes, scores and ranks surviving candidates
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultBuilder {
    scorer: ConfidenceScorer,
    phones: PhoneOrganizer,
    addresses: AddressOrganizer,
    emails: EmailOrganizer,
}

impl ResultBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn organize_person(&self, candidate: &PersonCandidate) -> OrganizedPerson {
        let breakdown = self.scorer.breakdown(candidate);
        let mut person = OrganizedPerson {
            name: candidate.name.clone(),
            phones: candidate.phones.iter().map(|v| v.value.clone()).collect(),
            addresses: candidate.addresses.iter().map(|v| v.value.clone()).collect(),
            emails: candidate.emails.iter().map(|v| v.value.clone()).collect(),
            public_records: candidate.public_records.clone(),
            mentions: candidate.mentions.clone(),
            confidence_sources: candidate.confidence_sources.iter().copied().collect(),
            phone_validation: candidate.phone_validation.clone(),
            merged_from_sources: candidate.merged_from_sources,
            organized_phones: self.phones.organize(candidate),
            organized_addresses: self.addresses.organize(candidate),
            organized_emails: self.emails.organize(candidate),
            overall_confidence_score: breakdown.total,
            overall_confidence_band: ConfidenceBand::from_score(breakdown.total),
            score_breakdown: breakdown,
            cross_references: candidate.cross_references.clone(),
            relevance_score: 0,
        };
        person.relevance_score = relevance(&person);
        person
    }

    /// Organize every candidate, rank by relevance and summarize
    pub fn build(
        &self,
        search_params: SearchParams,
        candidates: &[PersonCandidate],
        timestamp: String,
        unattributed_findings: usize,
    ) -> OrganizedResults {
        let mut persons: Vec<OrganizedPerson> =
            candidates.iter().map(|c| self.organize_person(c)).collect();
        persons.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));

        let summary = summarize(&persons, unattributed_findings);
        OrganizedResults {
            search_params,
            timestamp,
            total_persons_found: persons.len(),
            persons,
            summary,
            relationships: None,
        }
    }
}

/// confidence + 3 per phone + 2 per address + 2 per email
/// + one per record (max 5) + 20 for user-input provenance
pub fn relevance(person: &OrganizedPerson) -> u32 {
    let mut score = person.overall_confidence_score
        + 3 * person.organized_phones.len() as u32
        + 2 * person.organized_addresses.len() as u32
        + 2 * person.organized_emails.len() as u32
        + person.public_records.len().min(MAX_RECORD_POINTS) as u32;
    if person.has_source(SourceTag::UserInput) {
        score += USER_INPUT_BONUS;
    }
    score
}

fn summarize(persons: &[OrganizedPerson], unattributed_findings: usize) -> ResultSummary {
    let mut summary = ResultSummary {
        total_persons: persons.len(),
        unattributed_findings,
        ..ResultSummary::default()
    };
    for p in persons {
        summary.total_phones += p.organized_phones.len();
        summary.total_addresses += p.organized_addresses.len();
        summary.total_emails += p.organized_emails.len();
        summary.total_public_records += p.public_records.len();
        summary.total_mentions += p.mentions.len();
        summary.merged_candidates += p.merged_from_sources;
        if !p.cross_references.is_empty() {
            summary.cross_referenced_persons += 1;
        }
        summary.confidence_bands.record(p.overall_confidence_band);
    }
    summary
}
