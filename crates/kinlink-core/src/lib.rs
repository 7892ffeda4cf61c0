//! Kinlink Core Engine
//!
//! Turns noisy, multi-source findings about a person (public records, phone
//! validation, web and social mentions) into a few canonical, confidence-scored
//! person records plus a graph of inferred relationships between them.
//!
//! Pipeline:
//!
//! 1. [`extract`]: bundle to per-name candidates
//! 2. [`dedup`]: merge candidates under strict evidence rules, cross-reference
//!    the rest
//! 3. [`organize`] and [`confidence`]: normalize, deduplicate and score
//!    phones, addresses and emails; score each person
//! 4. [`result`]: rank by relevance and summarize
//! 5. [`relationship`]: optional associate graph over the final persons
//!
//! The engine is a pure synchronous transformation. Time is read only through
//! an injected [`Clock`].
//!
//! # Features
//!
//! - `parallel` - Evaluate relationship pairs on the rayon pool for large
//!   person sets
//!
//! # Example
//!
//! ```rust
//! use kinlink_core::{LinkageEngine, ResultsBundle, SearchParams};
//!
//! let engine = LinkageEngine::default();
//! let bundle = ResultsBundle {
//!     search_params: SearchParams::named("John Smith"),
//!     ..ResultsBundle::default()
//! };
//!
//! let results = engine.organize_with_relationships(&bundle);
//! assert_eq!(results.total_persons_found, 1);
//! assert_eq!(results.persons[0].overall_confidence_score, 30);
//! ```

pub mod candidate;
pub mod clock;
pub mod confidence;
pub mod config;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod extract;
pub mod finding;
pub mod geo;
pub mod organize;
pub mod relationship;
pub mod result;
pub mod similarity;

// Re-export main types at crate root
pub use candidate::{name_key, CrossReference, PersonCandidate, SharedData, SourcedValue};
pub use clock::{Clock, FixedClock, SystemClock};
pub use confidence::{ConfidenceBand, ConfidenceScorer, ScoreBreakdown};
pub use config::EngineConfig;
pub use dedup::{DedupOutcome, Deduplicator, MergeDecision};
pub use engine::LinkageEngine;
pub use error::{EngineError, EngineResult};
pub use extract::{Extraction, FindingExtractor};
pub use finding::{
    FindingKind, Mention, OfficialResults, PhoneValidation, PublicRecord, RawFinding,
    ResultsBundle, SearchParams, SourceTag, WebResults,
};
pub use organize::{
    AddressOrganizer, EmailOrganizer, OrganizedAddress, OrganizedEmail, OrganizedPhone,
    PhoneOrganizer,
};
pub use relationship::{
    Associate, RelationshipCategory, RelationshipDetector, RelationshipEdge, RelationshipGraph,
    RelationshipIndicator, RelationshipsOutput,
};
pub use result::{OrganizedPerson, OrganizedResults, ResultBuilder, ResultSummary};
pub use similarity::{SimilarityAlgorithm, SimilarityStrategy};
