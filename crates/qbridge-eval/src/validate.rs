//! Threshold tests on relative outcome frequencies.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use qbridge_hal::ExecutionResult;

use crate::property::ValidationProperty;

/// Outcome of checking one property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    /// Whether the property held.
    pub passed: bool,
    /// Observed fraction of shots showing the expected signature.
    pub statistic: f64,
    /// Human-readable explanation.
    pub reason: String,
}

impl ValidationVerdict {
    fn fail(statistic: f64, reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            statistic,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ValidationVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = if self.passed { "PASS" } else { "FAIL" };
        write!(f, "{tag} ({:.3}): {}", self.statistic, self.reason)
    }
}

/// Check `result` against `property`.
///
/// Comparisons are inclusive: a correlated fraction equal to the threshold
/// passes, as does an anti-correlated fraction equal to the tolerance.
pub fn validate(result: &ExecutionResult, property: &ValidationProperty) -> ValidationVerdict {
    if result.shots == 0 || result.counts.total_shots() == 0 {
        return ValidationVerdict::fail(0.0, "no shots to validate");
    }
    let shots = result.counts.total_shots() as f64;

    let verdict = match *property {
        ValidationProperty::PairwiseCorrelation {
            bits: (a, b),
            threshold,
            tolerance,
        } => {
            let mut correlated = 0u64;
            let mut anti = 0u64;
            for (bitstring, count) in result.counts.iter() {
                let bytes = bitstring.as_bytes();
                let (Some(x), Some(y)) = (bytes.get(a), bytes.get(b)) else {
                    return ValidationVerdict::fail(
                        0.0,
                        format!("outcome '{bitstring}' has no bits {a} and {b}"),
                    );
                };
                if x == y {
                    correlated += count;
                } else {
                    anti += count;
                }
            }

            let correlated = correlated as f64 / shots;
            let anti = anti as f64 / shots;
            let passed = correlated >= threshold && anti <= tolerance;
            let reason = format!(
                "correlated {correlated:.3} {} {threshold}, anti-correlated {anti:.3} {} {tolerance}",
                if correlated >= threshold { ">=" } else { "<" },
                if anti <= tolerance { "<=" } else { ">" },
            );
            ValidationVerdict {
                passed,
                statistic: correlated,
                reason,
            }
        }

        ValidationProperty::AllEqual { threshold } => {
            let uniform: u64 = result
                .counts
                .iter()
                .filter(|(bitstring, _)| {
                    let bytes = bitstring.as_bytes();
                    bytes.iter().all(|b| Some(b) == bytes.first())
                })
                .map(|(_, count)| count)
                .sum();
            let fraction = uniform as f64 / shots;
            ValidationVerdict {
                passed: fraction >= threshold,
                statistic: fraction,
                reason: format!(
                    "all-equal {fraction:.3} {} {threshold}",
                    if fraction >= threshold { ">=" } else { "<" }
                ),
            }
        }
    };

    debug!(property = property.name(), passed = verdict.passed, "{}", verdict.reason);
    verdict
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use proptest::prelude::*;
    use qbridge_hal::{Counts, TargetId};

    fn result(entries: &[(&str, u64)]) -> ExecutionResult {
        let counts: Counts = entries.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        ExecutionResult {
            shots: counts.total_shots() as u32,
            counts,
            produced_by: TargetId::local("local_simulator"),
            duration: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_ideal_bell_passes() {
        let verdict = validate(&result(&[("00", 503), ("11", 497)]), &ValidationProperty::bell());
        assert!(verdict.passed);
        assert_eq!(verdict.statistic, 1.0);
        assert!(verdict.to_string().starts_with("PASS"));
    }

    #[test]
    fn test_noisy_bell_within_limits() {
        let verdict = validate(
            &result(&[("00", 470), ("11", 490), ("01", 25), ("10", 15)]),
            &ValidationProperty::bell(),
        );
        assert!(verdict.passed);
        assert!((verdict.statistic - 0.96).abs() < 1e-12);
    }

    #[test]
    fn test_uncorrelated_fails() {
        let verdict = validate(
            &result(&[("00", 250), ("01", 250), ("10", 250), ("11", 250)]),
            &ValidationProperty::bell(),
        );
        assert!(!verdict.passed);
        assert_eq!(verdict.statistic, 0.5);
        assert!(verdict.reason.contains("0.500 < 0.85"));
    }

    #[test]
    fn test_anti_correlation_over_tolerance_fails() {
        // 90% correlated clears the threshold, but 10% anti exceeds 5%.
        let verdict = validate(&result(&[("00", 90), ("01", 10)]), &ValidationProperty::bell());
        assert!(!verdict.passed);
        assert!(verdict.reason.contains("0.100 > 0.05"));
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let property = ValidationProperty::bell_with(0.9, 0.1);
        let verdict = validate(&result(&[("00", 45), ("11", 45), ("10", 10)]), &property);
        assert!(verdict.passed, "{verdict}");
    }

    #[test]
    fn test_zero_shots_fails() {
        let verdict = validate(&result(&[]), &ValidationProperty::bell());
        assert!(!verdict.passed);
        assert_eq!(verdict.statistic, 0.0);
    }

    #[test]
    fn test_short_bitstrings_fail() {
        let verdict = validate(&result(&[("0", 10)]), &ValidationProperty::bell());
        assert!(!verdict.passed);
        assert!(verdict.reason.contains("no bits 0 and 1"));
    }

    #[test]
    fn test_other_bit_pair() {
        let property = ValidationProperty::PairwiseCorrelation {
            bits: (0, 2),
            threshold: 0.85,
            tolerance: 0.05,
        };
        assert!(validate(&result(&[("010", 50), ("101", 50)]), &property).passed);
    }

    #[test]
    fn test_all_equal_ghz() {
        let ghz = result(&[("000", 480), ("111", 500), ("010", 20)]);
        let verdict = validate(&ghz, &ValidationProperty::all_equal(0.95));
        assert!(verdict.passed);
        assert!((verdict.statistic - 0.98).abs() < 1e-12);

        let verdict = validate(&ghz, &ValidationProperty::all_equal(0.99));
        assert!(!verdict.passed);
    }

    proptest! {
        #[test]
        fn test_pairwise_verdict_matches_frequencies(
            c00 in 0u64..500, c01 in 0u64..500, c10 in 0u64..500, c11 in 0u64..500,
        ) {
            prop_assume!(c00 + c01 + c10 + c11 > 0);
            let r = result(&[("00", c00), ("01", c01), ("10", c10), ("11", c11)]);
            let total = (c00 + c01 + c10 + c11) as f64;
            let correlated = (c00 + c11) as f64 / total;
            let anti = (c01 + c10) as f64 / total;

            let verdict = validate(&r, &ValidationProperty::bell());
            prop_assert!((verdict.statistic - correlated).abs() < 1e-12);
            prop_assert_eq!(verdict.passed, correlated >= 0.85 && anti <= 0.05);
        }
    }
}
