//! Relationship inference over organized persons
//!
//! Every unordered pair of persons is scored for a fixed set of indicators:
//!
//! | indicator            | weight | evidence                                     |
//! |----------------------|--------|----------------------------------------------|
//! | `same_address`       | 0.30   | same locality and street similarity > 0.8    |
//! | `same_phone`         | 0.25   | equal normalized phone                       |
//! | `same_last_name`     | 0.15   | equal last token or similarity > 0.9         |
//! | `property_co_owner`  | 0.30   | both named in one public record              |
//! | `age_parent_child`   | 0.10   | ages at least 20 years apart                 |
//! | `age_sibling`        | 0.15   | ages within 10 years and same last name      |
//! | `business_associate` | 0.25   | business keyword in a record naming both     |
//! | `co_occurrence`      | 0.10   | both named in one web or social mention      |
//!
//! Addresses match only within one locality: equal ZIP, or equal city and
//! state when a ZIP is missing. The similarity threshold then applies to the
//! street and unit alone, so two houses in one ZIP are not one address.
//!
//! Pairs with at least one linking indicator (anything but last name and
//! age) become edges. Text checks are skipped for persons with the same name,
//! since one name cannot tell two people apart in free text.

mod classify;
mod graph;
mod indicators;

pub use classify::{classify, strength, RelationshipCategory};
pub use graph::{Associate, RelationshipEdge, RelationshipGraph, RelationshipsOutput};
pub use indicators::{extract_age, name_variants, PersonFeatures, RelationshipIndicator};

use std::collections::BTreeSet;
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::debug;

use crate::config::EngineConfig;
use crate::organize::AddressComponents;
use crate::result::OrganizedPerson;
use crate::similarity::SimilarityStrategy;
use indicators::{has_business_keyword, texts_naming_both};

/// Builds the relationship graph for a set of organized persons
#[derive(Debug, Clone)]
pub struct RelationshipDetector {
    similarity: Arc<dyn SimilarityStrategy>,
    address_threshold: f64,
    last_name_threshold: f64,
    parent_child_gap: u32,
    sibling_gap: u32,
    #[cfg(feature = "parallel")]
    parallel_threshold: usize,
}

impl RelationshipDetector {
    pub fn new(config: &EngineConfig, similarity: Arc<dyn SimilarityStrategy>) -> Self {
        Self {
            similarity,
            address_threshold: config.address_similarity_threshold,
            last_name_threshold: config.last_name_similarity_threshold,
            parent_child_gap: config.parent_child_min_age_gap,
            sibling_gap: config.sibling_max_age_gap,
            #[cfg(feature = "parallel")]
            parallel_threshold: config.parallel_threshold,
        }
    }

    /// Score all pairs and build the graph. `current_year` converts birth
    /// years to ages.
    pub fn detect(&self, persons: &[OrganizedPerson], current_year: i32) -> RelationshipGraph {
        let features: Vec<PersonFeatures> = persons
            .iter()
            .map(|p| PersonFeatures::from_person(p, current_year))
            .collect();

        let pairs: Vec<(usize, usize)> = (0..features.len())
            .flat_map(|i| ((i + 1)..features.len()).map(move |j| (i, j)))
            .collect();

        let edges = self.evaluate_pairs(&features, &pairs);

        let mut graph = RelationshipGraph::new(features.iter().map(|f| f.name.clone()).collect());
        for edge in edges {
            graph.add_edge(edge);
        }
        debug!(
            persons = graph.node_count(),
            edges = graph.edge_count(),
            "relationships detected"
        );
        graph
    }

    #[cfg(feature = "parallel")]
    fn evaluate_pairs(
        &self,
        features: &[PersonFeatures],
        pairs: &[(usize, usize)],
    ) -> Vec<RelationshipEdge> {
        if features.len() >= self.parallel_threshold {
            pairs
                .par_iter()
                .filter_map(|&(i, j)| self.edge(features, i, j))
                .collect()
        } else {
            self.evaluate_sequential(features, pairs)
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn evaluate_pairs(
        &self,
        features: &[PersonFeatures],
        pairs: &[(usize, usize)],
    ) -> Vec<RelationshipEdge> {
        self.evaluate_sequential(features, pairs)
    }

    fn evaluate_sequential(
        &self,
        features: &[PersonFeatures],
        pairs: &[(usize, usize)],
    ) -> Vec<RelationshipEdge> {
        pairs
            .iter()
            .filter_map(|&(i, j)| self.edge(features, i, j))
            .collect()
    }

    fn edge(&self, features: &[PersonFeatures], i: usize, j: usize) -> Option<RelationshipEdge> {
        let (a, b) = (&features[i], &features[j]);
        let indicators = self.indicators(a, b);
        if !indicators.iter().any(|ind| ind.is_linking()) {
            return None;
        }
        Some(RelationshipEdge {
            person_a: a.name.clone(),
            person_b: b.name.clone(),
            person_a_index: i,
            person_b_index: j,
            strength: strength(&indicators),
            category: classify(&indicators, a.age, b.age, self.parent_child_gap),
            indicators,
            age_a: a.age,
            age_b: b.age,
        })
    }

    fn same_address(&self, x: &AddressComponents, y: &AddressComponents) -> bool {
        let (Some(street_x), Some(street_y)) = (street_line(x), street_line(y)) else {
            return false;
        };
        if x == y {
            return true;
        }
        let same_locality = match (&x.zip, &y.zip) {
            (Some(zip_x), Some(zip_y)) => {
                zip_x == zip_y && (x.city.is_none() || y.city.is_none() || x.city == y.city)
            }
            _ => x.city.is_some() && x.city == y.city && x.state == y.state,
        };
        same_locality
            && (street_x == street_y
                || self.similarity.similarity(&street_x, &street_y) > self.address_threshold)
    }

    /// Every indicator that holds between `a` and `b`
    pub fn indicators(
        &self,
        a: &PersonFeatures,
        b: &PersonFeatures,
    ) -> BTreeSet<RelationshipIndicator> {
        use RelationshipIndicator::*;

        let mut found = BTreeSet::new();

        let same_address = a
            .addresses
            .iter()
            .any(|x| b.addresses.iter().any(|y| self.same_address(x, y)));
        if same_address {
            found.insert(SameAddress);
        }

        if !a.phones.is_disjoint(&b.phones) {
            found.insert(SamePhone);
        }

        let same_last_name = match (&a.last_name, &b.last_name) {
            (Some(x), Some(y)) => {
                x == y || self.similarity.similarity(x, y) > self.last_name_threshold
            }
            _ => false,
        };
        if same_last_name {
            found.insert(SameLastName);
        }

        if let (Some(age_a), Some(age_b)) = (a.age, b.age) {
            let gap = age_a.abs_diff(age_b);
            if gap >= self.parent_child_gap {
                found.insert(AgeParentChild);
            }
            if gap <= self.sibling_gap && same_last_name {
                found.insert(AgeSibling);
            }
        }

        if a.key != b.key {
            let records: Vec<String> = a
                .record_texts
                .iter()
                .chain(&b.record_texts)
                .cloned()
                .collect();
            let mut naming_both = texts_naming_both(&records, a, b).peekable();
            if naming_both.peek().is_some() {
                found.insert(PropertyCoOwner);
            }
            if naming_both.any(|text| has_business_keyword(text)) {
                found.insert(BusinessAssociate);
            }

            let mentions: Vec<String> = a
                .mention_texts
                .iter()
                .chain(&b.mention_texts)
                .cloned()
                .collect();
            if texts_naming_both(&mentions, a, b).next().is_some() {
                found.insert(CoOccurrence);
            }
        }

        found
    }
}

/// Street plus unit, e.g. "12 OAK ST APT 4"
fn street_line(address: &AddressComponents) -> Option<String> {
    let street = address.street.as_deref()?;
    Some(match &address.unit {
        Some(unit) => format!("{} {}", street, unit),
        None => street.to_string(),
    })
}
