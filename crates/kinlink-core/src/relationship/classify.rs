//! Relationship category decision list and edge strength

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::indicators::RelationshipIndicator;

/// Bonus for indicator pairs that reinforce each other
const COMPOUND_BONUS: f64 = 0.3;

/// Best guess at how two persons are related
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipCategory {
    ImmediateFamily,
    PossibleParent,
    PossibleChild,
    PossibleSibling,
    PossibleSpouse,
    BusinessAssociate,
    Roommate,
    CloseContact,
    PossibleFriend,
    OtherAssociate,
}

impl RelationshipCategory {
    pub const ALL: [RelationshipCategory; 10] = [
        Self::ImmediateFamily,
        Self::PossibleParent,
        Self::PossibleChild,
        Self::PossibleSibling,
        Self::PossibleSpouse,
        Self::BusinessAssociate,
        Self::Roommate,
        Self::CloseContact,
        Self::PossibleFriend,
        Self::OtherAssociate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ImmediateFamily => "immediate_family",
            Self::PossibleParent => "possible_parent",
            Self::PossibleChild => "possible_child",
            Self::PossibleSibling => "possible_sibling",
            Self::PossibleSpouse => "possible_spouse",
            Self::BusinessAssociate => "business_associate",
            Self::Roommate => "roommate",
            Self::CloseContact => "close_contact",
            Self::PossibleFriend => "possible_friend",
            Self::OtherAssociate => "other_associate",
        }
    }

    /// Family categories, including the refined family guesses
    pub fn is_family(&self) -> bool {
        matches!(
            self,
            Self::ImmediateFamily
                | Self::PossibleParent
                | Self::PossibleChild
                | Self::PossibleSibling
                | Self::PossibleSpouse
        )
    }
}

impl std::fmt::Display for RelationshipCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sum of indicator weights plus compound bonuses, capped at 1.0 and rounded
/// to two decimals.
pub fn strength(indicators: &BTreeSet<RelationshipIndicator>) -> f64 {
    use RelationshipIndicator::*;

    let mut total: f64 = indicators.iter().map(|i| i.weight()).sum();
    if indicators.contains(&SameAddress) && indicators.contains(&SameLastName) {
        total += COMPOUND_BONUS;
    }
    if indicators.contains(&SameAddress) && indicators.contains(&SamePhone) {
        total += COMPOUND_BONUS;
    }
    (total.min(1.0) * 100.0).round() / 100.0
}

/// First matching rule wins. Parent and child describe `person_b` relative to
/// `person_a`; they need both ages and a gap of at least `parent_child_gap`.
pub fn classify(
    indicators: &BTreeSet<RelationshipIndicator>,
    age_a: Option<u32>,
    age_b: Option<u32>,
    parent_child_gap: u32,
) -> RelationshipCategory {
    use RelationshipIndicator::*;

    let has = |i: RelationshipIndicator| indicators.contains(&i);

    if has(SameAddress) && has(SameLastName) {
        if has(AgeSibling) {
            return RelationshipCategory::PossibleSibling;
        }
        if let (Some(a), Some(b)) = (age_a, age_b) {
            if b >= a.saturating_add(parent_child_gap) {
                return RelationshipCategory::PossibleParent;
            }
            if a >= b.saturating_add(parent_child_gap) {
                return RelationshipCategory::PossibleChild;
            }
        }
        return RelationshipCategory::ImmediateFamily;
    }
    if has(SameAddress) && has(PropertyCoOwner) {
        return RelationshipCategory::PossibleSpouse;
    }
    if has(BusinessAssociate) {
        return RelationshipCategory::BusinessAssociate;
    }
    if has(SameAddress) {
        return RelationshipCategory::Roommate;
    }
    if has(SamePhone) {
        return RelationshipCategory::CloseContact;
    }
    if has(CoOccurrence) {
        return RelationshipCategory::PossibleFriend;
    }
    RelationshipCategory::OtherAssociate
}
