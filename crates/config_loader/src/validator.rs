//! Configuration validation
//!
//! Rules:
//! - field-level ranges (via the derive on the config types)
//! - min_chunk_anchors <= max_chunk_anchors
//! - max_mean_cost, when set, is a finite number

use contracts::{CoreError, EngineConfig};
use validator::Validate;

/// Validate an EngineConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &EngineConfig) -> Result<(), CoreError> {
    validate_field_ranges(config)?;
    validate_chunk_bounds(config)?;
    validate_tolerance(config)?;
    Ok(())
}

/// Field-level range checks from the derive
fn validate_field_ranges(config: &EngineConfig) -> Result<(), CoreError> {
    config.validate().map_err(|errors| {
        let field = errors
            .field_errors()
            .keys()
            .next()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "dtw".to_string());
        CoreError::config_validation(field, errors.to_string())
    })
}

/// Block size bounds must be ordered
fn validate_chunk_bounds(config: &EngineConfig) -> Result<(), CoreError> {
    if config.dtw.min_chunk_anchors > config.dtw.max_chunk_anchors {
        return Err(CoreError::config_validation(
            "dtw.max_chunk_anchors",
            format!(
                "max_chunk_anchors ({}) must be >= min_chunk_anchors ({})",
                config.dtw.max_chunk_anchors, config.dtw.min_chunk_anchors
            ),
        ));
    }
    Ok(())
}

/// Tolerance must be finite when present
fn validate_tolerance(config: &EngineConfig) -> Result<(), CoreError> {
    if let Some(limit) = config.dtw.max_mean_cost {
        if !limit.is_finite() {
            return Err(CoreError::config_validation(
                "dtw.max_mean_cost",
                format!("tolerance must be finite, got {limit}"),
            ));
        }
    }
    Ok(())
}
