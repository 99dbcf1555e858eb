//! Statistical properties a measurement histogram can be checked against.

use serde::{Deserialize, Serialize};

/// Default minimum fraction of correlated shots.
pub const DEFAULT_THRESHOLD: f64 = 0.85;

/// Default maximum fraction of anti-correlated shots.
pub const DEFAULT_TOLERANCE: f64 = 0.05;

/// An expected statistical signature.
///
/// Bit positions index into the result bitstrings, classical bit 0 first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationProperty {
    /// Two bits agree on at least `threshold` of shots and disagree on at
    /// most `tolerance` of shots (Bell-type entanglement).
    PairwiseCorrelation {
        /// The two bit positions compared.
        bits: (usize, usize),
        /// Minimum correlated fraction.
        threshold: f64,
        /// Maximum anti-correlated fraction.
        tolerance: f64,
    },

    /// All bits agree on at least `threshold` of shots (GHZ-type).
    AllEqual {
        /// Minimum all-equal fraction.
        threshold: f64,
    },
}

impl ValidationProperty {
    /// Bell check on bits 0 and 1 with the default limits.
    pub fn bell() -> Self {
        Self::PairwiseCorrelation {
            bits: (0, 1),
            threshold: DEFAULT_THRESHOLD,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Bell check on bits 0 and 1 with custom limits.
    pub fn bell_with(threshold: f64, tolerance: f64) -> Self {
        Self::PairwiseCorrelation {
            bits: (0, 1),
            threshold,
            tolerance,
        }
    }

    /// GHZ check with the given threshold.
    pub fn all_equal(threshold: f64) -> Self {
        Self::AllEqual { threshold }
    }

    /// Short name for logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PairwiseCorrelation { .. } => "pairwise_correlation",
            Self::AllEqual { .. } => "all_equal",
        }
    }
}

impl Default for ValidationProperty {
    fn default() -> Self {
        Self::bell()
    }
}
