//! Circuits submitted to the pipeline, with their expected signature.

use qbridge_eval::ValidationProperty;
use qbridge_ir::{Circuit, IrResult};

use crate::config::ValidationConfig;

/// One circuit to run, optionally checked after execution.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitJob {
    /// The abstract circuit.
    pub circuit: Circuit,
    /// Property the result must satisfy, if any.
    pub property: Option<ValidationProperty>,
}

impl CircuitJob {
    /// Run `circuit` without validation.
    pub fn new(circuit: Circuit) -> Self {
        Self {
            circuit,
            property: None,
        }
    }

    /// Check the result against `property`.
    #[must_use]
    pub fn with_property(mut self, property: ValidationProperty) -> Self {
        self.property = Some(property);
        self
    }

    /// Bell pair with the pairwise correlation check.
    pub fn bell(limits: &ValidationConfig) -> IrResult<Self> {
        Ok(Self::new(Circuit::bell()?)
            .with_property(ValidationProperty::bell_with(limits.threshold, limits.tolerance)))
    }

    /// `n`-qubit GHZ state with the all-equal check.
    pub fn ghz(n: u32, limits: &ValidationConfig) -> IrResult<Self> {
        Ok(Self::new(Circuit::ghz(n)?).with_property(ValidationProperty::all_equal(limits.threshold)))
    }

    /// Look up a built-in job: `bell`, or `ghz<N>` / `ghz:<N>`.
    pub fn builtin(name: &str, limits: &ValidationConfig) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        if name == "bell" {
            return Self::bell(limits).ok();
        }
        let n: u32 = name
            .strip_prefix("ghz")
            .map(|rest| rest.trim_start_matches(':'))
            .and_then(|n| n.parse().ok())?;
        if n < 2 {
            return None;
        }
        Self::ghz(n, limits).ok()
    }

    /// Name used in logs and reports.
    pub fn name(&self) -> &str {
        self.circuit.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names() {
        let limits = ValidationConfig::default();

        let bell = CircuitJob::builtin("bell", &limits).unwrap();
        assert_eq!(bell.circuit.num_qubits(), 2);
        assert_eq!(bell.property, Some(ValidationProperty::bell()));

        let ghz = CircuitJob::builtin("GHZ:4", &limits).unwrap();
        assert_eq!(ghz.circuit.num_qubits(), 4);
        assert_eq!(ghz.property, Some(ValidationProperty::all_equal(0.85)));

        assert_eq!(CircuitJob::builtin("ghz5", &limits).unwrap().circuit.num_qubits(), 5);
    }

    #[test]
    fn test_unknown_builtin() {
        let limits = ValidationConfig::default();
        assert!(CircuitJob::builtin("grover", &limits).is_none());
        assert!(CircuitJob::builtin("ghz", &limits).is_none());
        assert!(CircuitJob::builtin("ghz1", &limits).is_none());
    }
}
