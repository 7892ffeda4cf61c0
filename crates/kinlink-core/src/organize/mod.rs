//! Attribute organizers
//!
//! Each organizer takes the raw strings of one attribute type from a
//! candidate, collapses spellings of the same value onto one canonical form,
//! attaches structural metadata, scores each value from the sources that
//! mentioned it and sorts the result by confidence.
//!
//! - [`PhoneOrganizer`]: digits-only 10-digit form, area-code region,
//!   toll-free / VOIP / spam flags
//! - [`AddressOrganizer`]: USPS-style abbreviations, parsed components,
//!   po_box / business / residential classification
//! - [`EmailOrganizer`]: lower-cased form, provider classification, local-part
//!   pattern relative to the person's name
//!
//! No two entries in an organized list share a normalized form.

mod address;
mod email;
mod phone;

pub use address::{
    normalize_address, parse_address, AddressComponents, AddressDetails, AddressOrganizer,
    AddressType, ADDRESS_WEIGHTS,
};
pub use email::{
    classify_domain, infer_local_pattern, normalize_email, EmailDetails, EmailOrganizer,
    EmailType, EMAIL_WEIGHTS,
};
pub use phone::{
    area_code_region, format_phone, normalize_phone, PhoneDetails, PhoneOrganizer, PHONE_WEIGHTS,
};

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::candidate::SourcedValue;
use crate::confidence::{attribute_score, ConfidenceBand, WeightTable};
use crate::finding::SourceTag;

/// One deduplicated, scored attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizedAttribute<D> {
    /// First raw spelling seen
    pub value: String,
    /// Canonical comparable form
    pub normalized: String,
    /// Every raw spelling that collapsed into this value
    pub variants: Vec<String>,
    #[serde(flatten)]
    pub details: D,
    pub confidence_score: u32,
    pub confidence: ConfidenceBand,
    pub source_count: usize,
    pub sources: Vec<SourceTag>,
}

pub type OrganizedPhone = OrganizedAttribute<PhoneDetails>;
pub type OrganizedAddress = OrganizedAttribute<AddressDetails>;
pub type OrganizedEmail = OrganizedAttribute<EmailDetails>;

/// Raw values sharing one canonical form
#[derive(Debug, Clone)]
pub(crate) struct ValueGroup {
    pub value: String,
    pub normalized: String,
    pub variants: Vec<String>,
    pub sources: BTreeSet<SourceTag>,
}

/// Group raw values by canonical key, keeping first-seen order.
/// Values whose key is empty are dropped.
pub(crate) fn group_values(
    values: &[SourcedValue],
    key: impl Fn(&str) -> String,
) -> Vec<ValueGroup> {
    let mut groups: Vec<ValueGroup> = Vec::new();
    for v in values {
        let normalized = key(&v.value);
        if normalized.is_empty() {
            continue;
        }
        match groups.iter_mut().find(|g| g.normalized == normalized) {
            Some(group) => {
                if !group.variants.contains(&v.value) {
                    group.variants.push(v.value.clone());
                }
                group.sources.extend(v.sources.iter().copied());
            }
            None => groups.push(ValueGroup {
                value: v.value.clone(),
                normalized,
                variants: vec![v.value.clone()],
                sources: v.sources.clone(),
            }),
        }
    }
    groups
}

impl ValueGroup {
    /// Score the group and attach details
    pub(crate) fn into_attribute<D>(
        self,
        weights: &WeightTable,
        extra_sources: &[SourceTag],
        details: D,
    ) -> OrganizedAttribute<D> {
        let mut sources = self.sources;
        sources.extend(extra_sources.iter().copied());
        let confidence_score = attribute_score(weights, &sources, self.variants.len());
        OrganizedAttribute {
            value: self.value,
            normalized: self.normalized,
            variants: self.variants,
            details,
            confidence_score,
            confidence: ConfidenceBand::from_score(confidence_score),
            source_count: sources.len(),
            sources: sources.into_iter().collect(),
        }
    }
}

/// Stable sort, highest confidence first
pub(crate) fn sort_by_confidence<D>(items: &mut [OrganizedAttribute<D>]) {
    items.sort_by(|a, b| b.confidence_score.cmp(&a.confidence_score));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_values_merges_sources_and_variants() {
        let values = vec![
            SourcedValue::new("A-1", SourceTag::UserInput),
            SourcedValue::new("a 1", SourceTag::WebMention),
            SourcedValue::new("", SourceTag::WebMention),
        ];
        let groups = group_values(&values, |s| {
            s.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        });
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].value, "A-1");
        assert_eq!(groups[0].variants, vec!["A-1", "a 1"]);
        assert_eq!(groups[0].sources.len(), 2);
    }
}
