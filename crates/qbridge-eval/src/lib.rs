//! qbridge Result Validator
//!
//! Checks a measurement histogram for an expected statistical signature and
//! reports a [`ValidationVerdict`]. Checks compare summed relative
//! frequencies against thresholds; they never match histograms exactly.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use qbridge_eval::{ValidationProperty, validate};
//! use qbridge_hal::{Counts, ExecutionResult, TargetId};
//!
//! let counts: Counts = [("00".to_string(), 498), ("11".to_string(), 502)].into_iter().collect();
//! let result = ExecutionResult {
//!     counts,
//!     shots: 1000,
//!     produced_by: TargetId::local("local_simulator"),
//!     duration: Duration::from_millis(3),
//! };
//! assert!(validate(&result, &ValidationProperty::bell()).passed);
//! ```

pub mod property;
pub mod validate;

pub use property::{DEFAULT_THRESHOLD, DEFAULT_TOLERANCE, ValidationProperty};
pub use validate::{ValidationVerdict, validate};
