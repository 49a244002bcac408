//! Engine configuration contracts that can be shared across crates.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Alignment engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct EngineConfig {
    /// DTW configuration
    #[serde(default)]
    #[validate(nested)]
    pub dtw: DtwConfig,
}

/// Dynamic time warping configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DtwConfig {
    /// Tolerance on the mean optimal-path cost (seconds per path cell).
    /// `None` disables the check.
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub max_mean_cost: Option<f64>,

    /// Minimum anchors per DTW block; consecutive trials are coalesced
    /// until a block reaches this size
    #[serde(default = "default_min_chunk_anchors")]
    #[validate(range(min = 2))]
    pub min_chunk_anchors: usize,

    /// Size guard: a single DTW block above this many anchors fails fast
    /// instead of building a runaway cost matrix
    #[serde(default = "default_max_chunk_anchors")]
    #[validate(range(min = 2))]
    pub max_chunk_anchors: usize,

    /// Extra ephys anchors admitted into each block's search window beyond
    /// the block's own length
    #[serde(default = "default_ephys_window_slack")]
    pub ephys_window_slack: usize,
}

fn default_min_chunk_anchors() -> usize {
    2
}

fn default_max_chunk_anchors() -> usize {
    4096
}

fn default_ephys_window_slack() -> usize {
    16
}

impl Default for DtwConfig {
    fn default() -> Self {
        Self {
            max_mean_cost: None,
            min_chunk_anchors: default_min_chunk_anchors(),
            max_chunk_anchors: default_max_chunk_anchors(),
            ephys_window_slack: default_ephys_window_slack(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DtwConfig::default();
        assert_eq!(config.max_mean_cost, None);
        assert_eq!(config.min_chunk_anchors, 2);
        assert_eq!(config.max_chunk_anchors, 4096);
        assert_eq!(config.ephys_window_slack, 16);
    }

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.dtw.min_chunk_anchors, 2);
    }

    #[test]
    fn test_validate_rejects_tiny_chunks() {
        let config = EngineConfig {
            dtw: DtwConfig {
                min_chunk_anchors: 1,
                ..Default::default()
            },
        };
        assert!(config.validate().is_err());
    }
}
