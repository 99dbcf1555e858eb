//! Measurement histograms and execution results.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::target::TargetId;

/// Histogram from measured bitstring to occurrence count.
///
/// Bitstrings list classical bit 0 first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Counts(BTreeMap<String, u64>);

impl Counts {
    /// Create an empty histogram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` occurrences of `bitstring`.
    pub fn insert(&mut self, bitstring: impl Into<String>, count: u64) {
        *self.0.entry(bitstring.into()).or_insert(0) += count;
    }

    /// Occurrences of `bitstring` (zero if never seen).
    pub fn get(&self, bitstring: &str) -> u64 {
        self.0.get(bitstring).copied().unwrap_or(0)
    }

    /// Sum of all counts.
    pub fn total_shots(&self) -> u64 {
        self.0.values().sum()
    }

    /// Number of distinct outcomes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Outcome with the highest count; ties go to the lexicographically first.
    pub fn most_frequent(&self) -> Option<(&str, u64)> {
        self.0
            .iter()
            .fold(None, |best: Option<(&str, u64)>, (k, &v)| match best {
                Some((_, bv)) if bv >= v => best,
                _ => Some((k.as_str(), v)),
            })
    }

    /// Outcomes sorted by count, highest first.
    pub fn sorted(&self) -> Vec<(&str, u64)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }

    /// Iterate over `(bitstring, count)` in bitstring order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, &v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, u64)> for Counts {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        let mut counts = Counts::new();
        for (k, v) in iter {
            counts.insert(k, v);
        }
        counts
    }
}

/// Outcome of one execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Measurement histogram; sums to `shots`.
    pub counts: Counts,
    /// Requested shots.
    pub shots: u32,
    /// The backend or simulator that produced the counts.
    pub produced_by: TargetId,
    /// Wall-clock duration of the execution call.
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

impl ExecutionResult {
    /// Relative frequency of `bitstring`.
    pub fn probability(&self, bitstring: &str) -> f64 {
        if self.shots == 0 {
            return 0.0;
        }
        self.counts.get(bitstring) as f64 / f64::from(self.shots)
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
