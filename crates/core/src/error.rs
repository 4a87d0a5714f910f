//! Construction-time configuration errors
//!
//! Every failure the core can report belongs to invalid configuration and is
//! caught once, when a pool, clusterer, projector, emitter or scene is built.
//! Per-frame operations never return errors.

use thiserror::Error;

/// Invalid configuration detected while constructing a simulation component
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A count that must be at least one was zero
    #[error("{what} must be at least 1")]
    NonPositiveCount {
        /// Name of the offending parameter
        what: &'static str,
    },

    /// Lit slots (`clump_count * clump_size`) exceed the particle pool
    #[error(
        "{clump_count} clumps of {clump_size} particles need {} slots, pool only has {capacity}",
        clump_count * clump_size
    )]
    ClumpCapacityExceeded {
        /// Configured number of clumps
        clump_count: usize,
        /// Configured particles per clump
        clump_size: usize,
        /// Particle pool capacity
        capacity: usize,
    },

    /// A `mean ± variance` distribution whose range is invalid
    #[error("{what}: mean {mean} ± variance {variance} is not a valid range")]
    InvalidSpread {
        /// Name of the offending distribution
        what: &'static str,
        /// Configured mean
        mean: f32,
        /// Configured variance
        variance: f32,
    },

    /// A scalar parameter that is negative, non-finite or otherwise out of range
    #[error("{what} has invalid value {value}")]
    InvalidValue {
        /// Name of the offending parameter
        what: &'static str,
        /// Rejected value
        value: f32,
    },

    /// More clump lights than the point-light consumer accepts
    #[error("{requested} point lights requested, consumer accepts at most {max}")]
    TooManyLights {
        /// Lights the clusterer would export
        requested: usize,
        /// Consumer limit
        max: usize,
    },

    /// Unsupported spherical-harmonic band count
    #[error("spherical harmonic basis with {bands} bands is not supported (1..={max})")]
    InvalidBasis {
        /// Requested band count
        bands: u32,
        /// Largest supported band count
        max: u32,
    },

    /// Two sides of the SH pipeline disagree on the number of coefficients
    #[error("basis mismatch: expected {expected} SH coefficients, found {found}")]
    BasisMismatch {
        /// Coefficient count of the owning side
        expected: usize,
        /// Coefficient count of the other side
        found: usize,
    },

    /// Decay table is empty, negative, non-finite or increasing
    #[error("invalid decay curve: {0}")]
    InvalidDecayCurve(String),
}

/// Reject values that are negative or not finite
pub(crate) fn ensure_non_negative(what: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue { what, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_message_includes_required_slots() {
        let err = ConfigError::ClumpCapacityExceeded {
            clump_count: 5,
            clump_size: 10,
            capacity: 40,
        };
        assert_eq!(
            err.to_string(),
            "5 clumps of 10 particles need 50 slots, pool only has 40"
        );
    }

    #[test]
    fn test_ensure_non_negative() {
        assert!(ensure_non_negative("x", 0.0).is_ok());
        assert!(ensure_non_negative("x", 3.5).is_ok());
        assert!(ensure_non_negative("x", -0.1).is_err());
        assert!(ensure_non_negative("x", f32::NAN).is_err());
        assert!(ensure_non_negative("x", f32::INFINITY).is_err());
    }
}
