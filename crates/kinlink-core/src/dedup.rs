//! Candidate deduplication
//!
//! Two candidates merge only when all of the following hold:
//!
//! 1. their names are equal after case folding and whitespace collapsing
//!    (fuzzy similarity never merges);
//! 2. they share at least one exact normalized phone, email or address;
//! 3. their known regions are equal or neighboring.
//!
//! Merges are the connected components of that pairwise relation over the
//! original candidates, so the outcome does not depend on input order. A
//! chain A-B, B-C collapses into one person even when A and C share nothing,
//! as long as every member's regions stay compatible with every other's.
//!
//! A component that mixes incompatible regions fails closed. Only its members
//! with known regions are regrouped, and only where the regrouped set is
//! consistent; everyone else stays a separate person. A region-less candidate
//! therefore never bridges an Ohio and a California record into one person.
//!
//! Surviving persons that still share an identifier (different names, or a
//! merge refused on geography) are cross-referenced to each other.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::candidate::{CrossReference, PersonCandidate, SharedData};
use crate::geo;

/// Outcome of comparing two candidates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "decision", content = "shared_data")]
pub enum MergeDecision {
    Merge,
    /// Keep separate, but link them through the shared identifiers
    CrossReference(Vec<SharedData>),
    Unrelated,
}

/// Comparison view of one candidate, computed once per run
#[derive(Debug, Clone)]
struct Profile {
    key: String,
    phones: BTreeSet<String>,
    emails: BTreeSet<String>,
    addresses: BTreeSet<String>,
    regions: BTreeSet<String>,
}

impl Profile {
    fn of(candidate: &PersonCandidate) -> Self {
        Self {
            key: candidate.key(),
            phones: candidate.normalized_phones(),
            emails: candidate.normalized_emails(),
            addresses: candidate.normalized_addresses(),
            regions: geo::candidate_regions(candidate),
        }
    }

    fn shared(&self, other: &Profile) -> Vec<SharedData> {
        let mut shared = Vec::new();
        if !self.phones.is_disjoint(&other.phones) {
            shared.push(SharedData::Phone);
        }
        if !self.emails.is_disjoint(&other.emails) {
            shared.push(SharedData::Email);
        }
        if !self.addresses.is_disjoint(&other.addresses) {
            shared.push(SharedData::Address);
        }
        shared
    }

    fn decide(&self, other: &Profile) -> MergeDecision {
        let shared = self.shared(other);
        if shared.is_empty() {
            MergeDecision::Unrelated
        } else if self.key == other.key && geo::compatible(&self.regions, &other.regions) {
            MergeDecision::Merge
        } else {
            MergeDecision::CrossReference(shared)
        }
    }
}

/// Disjoint-set forest over candidate indices
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Join two sets; the smaller index stays the root
    fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        let (root, child) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent[child] = root;
        true
    }
}

/// Member indices of every set with more than one member, keyed by root
fn groups(sets: &mut UnionFind, n: usize) -> BTreeMap<usize, Vec<usize>> {
    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for i in 0..n {
        groups.entry(sets.find(i)).or_default().push(i);
    }
    groups.retain(|_, members| members.len() > 1);
    groups
}

/// Every pair of members has compatible regions
fn consistent(members: &[usize], profiles: &[Profile]) -> bool {
    members.iter().enumerate().all(|(k, &a)| {
        members[k + 1..]
            .iter()
            .all(|&b| geo::compatible(&profiles[a].regions, &profiles[b].regions))
    })
}

/// Result of a deduplication run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DedupOutcome {
    /// Surviving persons in first-seen order
    pub persons: Vec<PersonCandidate>,
    /// Candidates folded into another
    pub merges: usize,
    /// Same-name pairs sharing an identifier but kept apart on geography,
    /// directly or because their merge group mixed incompatible regions
    pub refused_merges: usize,
}

/// Pairwise merge decisions and partitioning
#[derive(Debug, Clone, Copy, Default)]
pub struct Deduplicator;

impl Deduplicator {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, a: &PersonCandidate, b: &PersonCandidate) -> MergeDecision {
        Profile::of(a).decide(&Profile::of(b))
    }

    /// Symmetric merge predicate
    pub fn should_merge(&self, a: &PersonCandidate, b: &PersonCandidate) -> bool {
        self.evaluate(a, b) == MergeDecision::Merge
    }

    /// Partition candidates into persons and cross-reference the survivors
    pub fn deduplicate(&self, candidates: Vec<PersonCandidate>) -> DedupOutcome {
        let profiles: Vec<Profile> = candidates.iter().map(Profile::of).collect();
        let n = candidates.len();
        let mut linked = UnionFind::new(n);
        let mut edges = Vec::new();
        let mut refused_merges = 0;

        for i in 0..n {
            for j in (i + 1)..n {
                match profiles[i].decide(&profiles[j]) {
                    MergeDecision::Merge => {
                        debug!(
                            a = %candidates[i].name,
                            b = %candidates[j].name,
                            "merge"
                        );
                        linked.union(i, j);
                        edges.push((i, j));
                    }
                    MergeDecision::CrossReference(shared) if profiles[i].key == profiles[j].key => {
                        info!(
                            name = %candidates[i].name,
                            a_regions = ?profiles[i].regions,
                            b_regions = ?profiles[j].regions,
                            shared = ?shared,
                            "merge refused on geography"
                        );
                        refused_merges += 1;
                    }
                    _ => {}
                }
            }
        }

        let mut sets = settle_groups(&profiles, &candidates, &mut linked, &edges);
        for &(i, j) in &edges {
            if sets.find(i) != sets.find(j) {
                refused_merges += 1;
            }
        }

        let roots: Vec<usize> = (0..n).map(|i| sets.find(i)).collect();
        let mut slots: Vec<Option<PersonCandidate>> = candidates.into_iter().map(Some).collect();
        let mut persons = Vec::new();
        for i in 0..n {
            if roots[i] != i {
                continue;
            }
            let Some(mut survivor) = slots[i].take() else {
                continue;
            };
            for j in (i + 1)..n {
                if roots[j] == i {
                    if let Some(member) = slots[j].take() {
                        survivor.absorb(member);
                    }
                }
            }
            persons.push(survivor);
        }

        let merges = n - persons.len();
        cross_reference(&mut persons);

        debug!(
            candidates = n,
            persons = persons.len(),
            merges,
            refused_merges,
            "deduplicated"
        );
        DedupOutcome {
            persons,
            merges,
            refused_merges,
        }
    }
}

/// Final merge sets. Consistent components are kept whole; an inconsistent
/// one is regrouped over its members with known regions.
fn settle_groups(
    profiles: &[Profile],
    candidates: &[PersonCandidate],
    linked: &mut UnionFind,
    edges: &[(usize, usize)],
) -> UnionFind {
    let n = profiles.len();
    let mut settled = UnionFind::new(n);
    let mut regrouped = UnionFind::new(n);
    let mut conflicted = vec![false; n];

    for members in groups(linked, n).into_values() {
        if consistent(&members, profiles) {
            continue;
        }
        let regions: BTreeSet<&String> =
            members.iter().flat_map(|&m| &profiles[m].regions).collect();
        info!(
            name = %candidates[members[0]].name,
            members = members.len(),
            regions = ?regions,
            "merge group mixes incompatible regions"
        );
        for m in members {
            conflicted[m] = true;
        }
    }

    for &(i, j) in edges {
        if !conflicted[i] {
            settled.union(i, j);
        } else if !profiles[i].regions.is_empty() && !profiles[j].regions.is_empty() {
            regrouped.union(i, j);
        }
    }

    for members in groups(&mut regrouped, n).into_values() {
        if consistent(&members, profiles) {
            for pair in members.windows(2) {
                settled.union(pair[0], pair[1]);
            }
        }
    }
    settled
}

/// Link every pair of persons that shares an exact identifier
pub fn cross_reference(persons: &mut [PersonCandidate]) {
    let n = persons.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let shared = persons[i].shared_identifiers(&persons[j]);
            if shared.is_empty() {
                continue;
            }
            let (name_i, name_j) = (persons[i].name.clone(), persons[j].name.clone());
            add_reference(&mut persons[i], CrossReference::new(name_j, shared.clone()));
            add_reference(&mut persons[j], CrossReference::new(name_i, shared));
        }
    }
}

fn add_reference(person: &mut PersonCandidate, reference: CrossReference) {
    if !person.cross_references.contains(&reference) {
        person.cross_references.push(reference);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::{PublicRecord, SourceTag};
    use pretty_assertions::assert_eq;

    fn person(name: &str, phone: &str, state: Option<&str>) -> PersonCandidate {
        let mut c = PersonCandidate::new(name);
        c.add_phone(phone, SourceTag::PublicRecords);
        c.add_source(SourceTag::PublicRecords);
        if let Some(state) = state {
            c.add_public_record(PublicRecord {
                name: Some(name.to_string()),
                state: Some(state.to_string()),
                ..PublicRecord::default()
            });
        }
        c
    }

    #[test]
    fn decision_is_symmetric() {
        let dedup = Deduplicator::new();
        let pairs = [
            (person("John Smith", "740-827-6423", Some("OH")), person("john  smith", "(740) 827-6423", Some("PA"))),
            (person("John Smith", "740-827-6423", Some("OH")), person("John Smith", "7408276423", Some("CA"))),
            (person("John Smith", "740-827-6423", None), person("Jon Smith", "7408276423", None)),
            (person("John Smith", "740-827-6423", None), person("John Smith", "614-555-0100", None)),
        ];
        for (a, b) in &pairs {
            assert_eq!(dedup.evaluate(a, b), dedup.evaluate(b, a));
            assert_eq!(dedup.should_merge(a, b), dedup.should_merge(b, a));
        }
        assert!(dedup.should_merge(&pairs[0].0, &pairs[0].1));
        assert_eq!(
            dedup.evaluate(&pairs[1].0, &pairs[1].1),
            MergeDecision::CrossReference(vec![SharedData::Phone])
        );
        assert_eq!(
            dedup.evaluate(&pairs[2].0, &pairs[2].1),
            MergeDecision::CrossReference(vec![SharedData::Phone])
        );
        assert_eq!(dedup.evaluate(&pairs[3].0, &pairs[3].1), MergeDecision::Unrelated);
    }

    #[test]
    fn similar_names_never_merge() {
        let dedup = Deduplicator::new();
        let a = person("John Smith", "740-827-6423", Some("OH"));
        let b = person("John Smyth", "740-827-6423", Some("OH"));
        assert!(!dedup.should_merge(&a, &b));
    }

    #[test]
    fn geography_refusal_cross_references_both() {
        let outcome = Deduplicator::new().deduplicate(vec![
            person("John Smith", "740-827-6423", Some("OH")),
            person("John Smith", "740-827-6423", Some("CA")),
        ]);
        assert_eq!(outcome.persons.len(), 2);
        assert_eq!(outcome.merges, 0);
        assert_eq!(outcome.refused_merges, 1);
        for p in &outcome.persons {
            assert_eq!(
                p.cross_references,
                vec![CrossReference::new("John Smith", vec![SharedData::Phone])]
            );
        }
    }

    #[test]
    fn chains_merge_transitively() {
        let mut a = PersonCandidate::new("John Smith");
        a.add_phone("740-827-6423", SourceTag::UserInput);
        let mut b = PersonCandidate::new("JOHN SMITH");
        b.add_phone("740-827-6423", SourceTag::PublicRecords);
        b.add_email("js@example.com", SourceTag::PublicRecords);
        let mut c = PersonCandidate::new("john smith");
        c.add_email("JS@example.com", SourceTag::WebMention);

        let dedup = Deduplicator::new();
        assert!(!dedup.should_merge(&a, &c));

        let outcome = dedup.deduplicate(vec![a, b, c]);
        assert_eq!(outcome.persons.len(), 1);
        assert_eq!(outcome.merges, 2);
        let merged = &outcome.persons[0];
        assert_eq!(merged.merged_from_sources, 2);
        assert_eq!(merged.phones.len(), 1);
        assert_eq!(merged.emails.len(), 2);
    }

    #[test]
    fn region_less_candidate_does_not_bridge_distant_regions() {
        let mut a = person("John Smith", "740-827-6423", Some("OH"));
        a.add_phone("740-555-0111", SourceTag::UserInput);
        let ohio_twin = person("John Smith", "740-555-0111", Some("OH"));
        let mut b = PersonCandidate::new("John Smith");
        b.add_phone("740-827-6423", SourceTag::WebMention);
        b.add_email("js@example.com", SourceTag::WebMention);
        let mut c = person("John Smith", "213-555-0188", Some("CA"));
        c.add_email("js@example.com", SourceTag::WebMention);

        let dedup = Deduplicator::new();
        assert!(!dedup.should_merge(&a, &c));
        assert!(dedup.should_merge(&a, &b));
        assert!(dedup.should_merge(&b, &c));

        let forward = dedup.deduplicate(vec![a.clone(), ohio_twin.clone(), b.clone(), c.clone()]);
        // the two Ohio records still merge; the bridge and California stay apart
        assert_eq!(forward.persons.len(), 3);
        assert_eq!(forward.merges, 1);
        assert!(forward.refused_merges >= 1);
        let ohio = forward
            .persons
            .iter()
            .find(|p| p.normalized_phones().contains("7405550111"))
            .unwrap();
        assert_eq!(ohio.merged_from_sources, 1);
        assert!(ohio
            .cross_references
            .contains(&CrossReference::new("John Smith", vec![SharedData::Phone])));

        let reversed = dedup.deduplicate(vec![c, b, ohio_twin, a]);
        assert_eq!(reversed.persons.len(), 3);
        assert_eq!(reversed.refused_merges, forward.refused_merges);
    }

    #[test]
    fn partition_ignores_input_order() {
        let build = || {
            vec![
                person("John Smith", "740-827-6423", Some("OH")),
                person("Mary Smith", "740-827-6423", Some("OH")),
                person("John Smith", "740-827-6423", Some("PA")),
                person("John Smith", "614-555-0100", Some("CA")),
                person("John Smith", "614-555-0100", Some("OH")),
            ]
        };
        let dedup = Deduplicator::new();
        let summary = |persons: &[PersonCandidate]| {
            let mut groups: Vec<(String, Vec<String>)> = persons
                .iter()
                .map(|p| {
                    let mut phones: Vec<String> = p.normalized_phones().into_iter().collect();
                    phones.sort();
                    (p.key(), phones)
                })
                .collect();
            groups.sort();
            groups
        };

        let forward = dedup.deduplicate(build());
        let mut reversed_input = build();
        reversed_input.reverse();
        let reversed = dedup.deduplicate(reversed_input);
        let mut rotated_input = build();
        rotated_input.rotate_left(2);
        let rotated = dedup.deduplicate(rotated_input);

        assert_eq!(forward.persons.len(), 4);
        assert_eq!(summary(&forward.persons), summary(&reversed.persons));
        assert_eq!(summary(&forward.persons), summary(&rotated.persons));
    }

    #[test]
    fn survivor_keeps_longest_name() {
        let mut a = PersonCandidate::new("John Smith");
        a.add_phone("740-827-6423", SourceTag::UserInput);
        let mut b = PersonCandidate::new("JOHN SMITH");
        b.add_phone("740-827-6423", SourceTag::PublicRecords);
        let outcome = Deduplicator::new().deduplicate(vec![a, b]);
        // Equal length keeps the first-seen spelling
        assert_eq!(outcome.persons[0].name, "John Smith");
    }
}
