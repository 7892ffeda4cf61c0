//! Engine thresholds

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::similarity::SimilarityAlgorithm;

/// Tunable thresholds. Scoring weights are fixed constants and not part of
/// the configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Strategy for fuzzy address and last-name comparison
    pub similarity: SimilarityAlgorithm,
    /// Addresses above this similarity count as the same (default: 0.8)
    pub address_similarity_threshold: f64,
    /// Last names above this similarity count as the same (default: 0.9)
    pub last_name_similarity_threshold: f64,
    /// Minimum age gap for a parent/child indicator (default: 20 years)
    pub parent_child_min_age_gap: u32,
    /// Maximum age gap for a sibling indicator (default: 10 years)
    pub sibling_max_age_gap: u32,
    /// Run relationship detection from `organize` (default: false)
    pub detect_relationships: bool,
    /// Person count above which pair scanning runs on the rayon pool when the
    /// `parallel` feature is on (default: 32)
    pub parallel_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            similarity: SimilarityAlgorithm::default(),
            address_similarity_threshold: 0.8,
            last_name_similarity_threshold: 0.9,
            parent_child_min_age_gap: 20,
            sibling_max_age_gap: 10,
            detect_relationships: false,
            parallel_threshold: 32,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config. Missing keys take their defaults.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EngineResult<()> {
        for (field, value) in [
            ("address_similarity_threshold", self.address_similarity_threshold),
            ("last_name_similarity_threshold", self.last_name_similarity_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::InvalidConfig(format!(
                    "{} must be within [0, 1], got {}",
                    field, value
                )));
            }
        }
        if self.sibling_max_age_gap >= self.parent_child_min_age_gap {
            return Err(EngineError::InvalidConfig(format!(
                "sibling_max_age_gap ({}) must be below parent_child_min_age_gap ({})",
                self.sibling_max_age_gap, self.parent_child_min_age_gap
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{"similarity": "jaro_winkler"}"#).unwrap();
        assert_eq!(config.similarity, SimilarityAlgorithm::JaroWinkler);
        assert_eq!(config.address_similarity_threshold, 0.8);
        assert_eq!(config.parent_child_min_age_gap, 20);
        assert!(!config.detect_relationships);
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let err = EngineConfig::from_json(r#"{"address_similarity_threshold": 1.5}"#).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn overlapping_age_gaps_are_rejected() {
        let config = EngineConfig {
            sibling_max_age_gap: 25,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        assert!(matches!(
            EngineConfig::from_json("{not json"),
            Err(EngineError::InvalidConfig(_))
        ));
    }
}
