//! String similarity strategies
//!
//! One strategy is chosen when the engine is built and used for every fuzzy
//! comparison (address and last-name indicators). Fuzzy similarity never
//! causes a merge on its own.
//!
//! ```rust
//! use kinlink_core::similarity::{SimilarityAlgorithm, SimilarityStrategy};
//!
//! let strategy = SimilarityAlgorithm::Levenshtein.build();
//! assert_eq!(strategy.similarity("smith", "smith"), 1.0);
//! assert!(strategy.similarity("smith", "smyth") > 0.7);
//! ```

use std::fmt::Debug;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strsim::{damerau_levenshtein, jaro_winkler, normalized_levenshtein};

/// Normalized similarity in [0, 1], 1.0 for identical strings
pub trait SimilarityStrategy: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    fn similarity(&self, a: &str, b: &str) -> f64;
}

/// Edit distance over the longer length
#[derive(Debug, Clone, Copy, Default)]
pub struct Levenshtein;

impl SimilarityStrategy for Levenshtein {
    fn name(&self) -> &'static str {
        "levenshtein"
    }

    #[inline]
    fn similarity(&self, a: &str, b: &str) -> f64 {
        normalized_levenshtein(a, b)
    }
}

/// Levenshtein with adjacent transpositions counted as one edit
#[derive(Debug, Clone, Copy, Default)]
pub struct DamerauLevenshtein;

impl SimilarityStrategy for DamerauLevenshtein {
    fn name(&self) -> &'static str {
        "damerau_levenshtein"
    }

    fn similarity(&self, a: &str, b: &str) -> f64 {
        let max_len = a.chars().count().max(b.chars().count());
        if max_len == 0 {
            return 1.0;
        }
        1.0 - damerau_levenshtein(a, b) as f64 / max_len as f64
    }
}

/// Prefix-weighted Jaro similarity
#[derive(Debug, Clone, Copy, Default)]
pub struct JaroWinkler;

impl SimilarityStrategy for JaroWinkler {
    fn name(&self) -> &'static str {
        "jaro_winkler"
    }

    #[inline]
    fn similarity(&self, a: &str, b: &str) -> f64 {
        jaro_winkler(a, b)
    }
}

/// Configurable choice of strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityAlgorithm {
    #[default]
    Levenshtein,
    DamerauLevenshtein,
    JaroWinkler,
}

impl SimilarityAlgorithm {
    pub fn build(self) -> Arc<dyn SimilarityStrategy> {
        match self {
            Self::Levenshtein => Arc::new(Levenshtein),
            Self::DamerauLevenshtein => Arc::new(DamerauLevenshtein),
            Self::JaroWinkler => Arc::new(JaroWinkler),
        }
    }
}
