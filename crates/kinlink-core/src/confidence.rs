//! Confidence scoring for persons and their attributes
//!
//! A person's score is the sum of fixed weights for each distinct source that
//! contributed evidence, plus bonuses for attribute richness:
//!
//! ```text
//! user_input 30 | public_records 25 | phone_api 20
//! verified_email 15 | social_media 5 | web_mention 3
//!
//! +5  more than one phone
//! +5  more than one address
//! +5  any email
//! +3  per public record      (max 15)
//! +5  per cross-reference    (max 10)
//! ```
//!
//! Scores are clamped to 0-100 and banded: high >= 70, medium 40-69, low < 40.
//! Attribute organizers reuse the banding with their own weight tables.

use serde::{Deserialize, Serialize};

use crate::candidate::PersonCandidate;
use crate::finding::SourceTag;
use crate::organize::{normalize_address, normalize_email, normalize_phone};

pub const MAX_SCORE: u32 = 100;
pub const HIGH_THRESHOLD: u32 = 70;
pub const MEDIUM_THRESHOLD: u32 = 40;

/// Categorical confidence label
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    Low,
    Medium,
    High,
}

impl ConfidenceBand {
    pub fn from_score(score: u32) -> Self {
        if score >= HIGH_THRESHOLD {
            Self::High
        } else if score >= MEDIUM_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl std::fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// Points contributed by each source tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightTable {
    pub user_input: u32,
    pub public_records: u32,
    pub phone_api: u32,
    pub verified_email: u32,
    pub social_media: u32,
    pub web_mention: u32,
}

impl WeightTable {
    pub fn weight(&self, source: SourceTag) -> u32 {
        match source {
            SourceTag::UserInput => self.user_input,
            SourceTag::PublicRecords => self.public_records,
            SourceTag::PhoneApi => self.phone_api,
            SourceTag::VerifiedEmail => self.verified_email,
            SourceTag::SocialMedia => self.social_media,
            SourceTag::WebMention => self.web_mention,
        }
    }

    /// Sum of weights over distinct sources
    pub fn total<'a>(&self, sources: impl IntoIterator<Item = &'a SourceTag>) -> u32 {
        sources.into_iter().map(|s| self.weight(*s)).sum()
    }
}

/// Weights for whole-person scoring
pub const PERSON_WEIGHTS: WeightTable = WeightTable {
    user_input: 30,
    public_records: 25,
    phone_api: 20,
    verified_email: 15,
    social_media: 5,
    web_mention: 3,
};

/// Score an attribute from its sources and the number of raw spellings that
/// collapsed into it.
pub fn attribute_score<'a>(
    weights: &WeightTable,
    sources: impl IntoIterator<Item = &'a SourceTag>,
    variant_count: usize,
) -> u32 {
    let repeat_bonus = 10 * variant_count.saturating_sub(1) as u32;
    (weights.total(sources) + repeat_bonus).min(MAX_SCORE)
}

/// Itemized person score, for explaining a result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub source_points: u32,
    pub phone_bonus: u32,
    pub address_bonus: u32,
    pub email_bonus: u32,
    pub record_bonus: u32,
    pub cross_reference_bonus: u32,
    pub total: u32,
}

/// Whole-person confidence scorer. Pure: the same candidate always scores
/// the same.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceScorer {
    weights: WeightTable,
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfidenceScorer {
    pub fn new() -> Self {
        Self {
            weights: PERSON_WEIGHTS,
        }
    }

    pub fn score(&self, candidate: &PersonCandidate) -> u32 {
        self.breakdown(candidate).total
    }

    pub fn band(&self, candidate: &PersonCandidate) -> ConfidenceBand {
        ConfidenceBand::from_score(self.score(candidate))
    }

    pub fn breakdown(&self, candidate: &PersonCandidate) -> ScoreBreakdown {
        let source_points = self.weights.total(&candidate.confidence_sources);
        let phone_bonus = Self::multi_bonus(distinct_count(&candidate.phones, normalize_phone));
        let address_bonus =
            Self::multi_bonus(distinct_count(&candidate.addresses, normalize_address));
        let email_bonus = if distinct_count(&candidate.emails, normalize_email) > 0 {
            5
        } else {
            0
        };
        let record_bonus = (3 * candidate.public_records.len() as u32).min(15);
        let cross_reference_bonus = (5 * candidate.cross_references.len() as u32).min(10);

        let total = (source_points
            + phone_bonus
            + address_bonus
            + email_bonus
            + record_bonus
            + cross_reference_bonus)
            .min(MAX_SCORE);

        ScoreBreakdown {
            source_points,
            phone_bonus,
            address_bonus,
            email_bonus,
            record_bonus,
            cross_reference_bonus,
            total,
        }
    }

    /// +5 when there is more than one distinct value
    fn multi_bonus(count: usize) -> u32 {
        if count > 1 {
            5
        } else {
            0
        }
    }
}

/// Distinct values after normalization. Values that do not normalize count by
/// their trimmed, lower-cased text.
fn distinct_count(
    values: &[crate::candidate::SourcedValue],
    normalize: fn(&str) -> Option<String>,
) -> usize {
    values
        .iter()
        .map(|v| normalize(&v.value).unwrap_or_else(|| v.value.trim().to_lowercase()))
        .collect::<std::collections::BTreeSet<_>>()
        .len()
}
