//! Top-level linkage engine
//!
//! Wires extraction, deduplication, organizing, scoring and relationship
//! detection together. The engine holds no mutable state and can be shared
//! across threads.

use std::sync::Arc;

use tracing::info;

use crate::candidate::PersonCandidate;
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::dedup::Deduplicator;
use crate::error::{EngineError, EngineResult};
use crate::extract::FindingExtractor;
use crate::finding::{ResultsBundle, SearchParams};
use crate::relationship::{RelationshipDetector, RelationshipGraph};
use crate::result::{OrganizedPerson, OrganizedResults, ResultBuilder};
use crate::similarity::SimilarityStrategy;

#[derive(Clone)]
pub struct LinkageEngine {
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    similarity: Arc<dyn SimilarityStrategy>,
    extractor: FindingExtractor,
    deduplicator: Deduplicator,
    builder: ResultBuilder,
}

impl Default for LinkageEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for LinkageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkageEngine")
            .field("config", &self.config)
            .field("similarity", &self.similarity.name())
            .finish()
    }
}

impl LinkageEngine {
    pub fn new(config: EngineConfig) -> Self {
        let similarity = config.similarity.build();
        Self {
            config,
            clock: Arc::new(SystemClock),
            similarity,
            extractor: FindingExtractor::new(),
            deduplicator: Deduplicator::new(),
            builder: ResultBuilder::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the strategy chosen by the config
    pub fn with_similarity(mut self, similarity: Arc<dyn SimilarityStrategy>) -> Self {
        self.similarity = similarity;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Organize a bundle. Relationships are included when the config asks
    /// for them.
    pub fn organize(&self, bundle: &ResultsBundle) -> OrganizedResults {
        self.run(bundle, self.config.detect_relationships)
    }

    /// Organize a bundle and always include relationships
    pub fn organize_with_relationships(&self, bundle: &ResultsBundle) -> OrganizedResults {
        self.run(bundle, true)
    }

    /// Organize candidates a caller already holds, e.g. from a previous hop
    pub fn organize_candidates(
        &self,
        search_params: SearchParams,
        candidates: Vec<PersonCandidate>,
    ) -> OrganizedResults {
        self.finish(search_params, candidates, 0, self.config.detect_relationships)
    }

    /// Organize and score a single candidate as-is
    pub fn organize_person(&self, candidate: &PersonCandidate) -> OrganizedPerson {
        self.builder.organize_person(candidate)
    }

    pub fn detect_relationships(&self, persons: &[OrganizedPerson]) -> RelationshipGraph {
        RelationshipDetector::new(&self.config, Arc::clone(&self.similarity))
            .detect(persons, self.clock.current_year())
    }

    /// Typed JSON boundary: bundle JSON in, organized results JSON out
    pub fn try_organize_json(&self, input: &str) -> EngineResult<String> {
        let bundle: ResultsBundle =
            serde_json::from_str(input).map_err(|e| EngineError::InvalidBundle(e.to_string()))?;
        let results = self.organize(&bundle);
        serde_json::to_string(&results).map_err(|e| EngineError::Serialization(e.to_string()))
    }

    /// JSON boundary that never fails: errors come back as `{"error": "..."}`
    pub fn organize_json(&self, input: &str) -> String {
        match self.try_organize_json(input) {
            Ok(json) => json,
            Err(e) => serde_json::json!({ "error": e.to_string() }).to_string(),
        }
    }

    fn run(&self, bundle: &ResultsBundle, relationships: bool) -> OrganizedResults {
        let extraction = self.extractor.extract(bundle);
        self.finish(
            bundle.search_params.clone(),
            extraction.candidates,
            extraction.unattributed,
            relationships,
        )
    }

    fn finish(
        &self,
        search_params: SearchParams,
        candidates: Vec<PersonCandidate>,
        unattributed: usize,
        relationships: bool,
    ) -> OrganizedResults {
        let candidate_count = candidates.len();
        let outcome = self.deduplicator.deduplicate(candidates);
        let mut results = self.builder.build(
            search_params,
            &outcome.persons,
            self.clock.now().to_rfc3339(),
            unattributed,
        );

        if relationships {
            let graph = self.detect_relationships(&results.persons);
            results.attach_relationships(graph.to_output());
        }

        info!(
            candidates = candidate_count,
            persons = results.total_persons_found,
            merges = outcome.merges,
            refused_merges = outcome.refused_merges,
            edges = results.relationships.as_ref().map_or(0, |r| r.total_edges),
            "organized results"
        );
        results
    }
}
