//! End-to-end entanglement checks against the local simulator.

use std::time::Duration;

use qbridge_adapter_sim::SimulatorBackend;
use qbridge_eval::{ValidationProperty, validate};
use qbridge_hal::{CancelToken, Executor};
use qbridge_ir::{Circuit, ClbitId, QubitId};

async fn simulate(circuit: &Circuit, shots: u32) -> qbridge_hal::ExecutionResult {
    let sim = SimulatorBackend::new().with_seed(2024);
    let program = qbridge_compile::compile(circuit, &sim.target()).unwrap();
    sim.execute(&program, shots, Duration::from_secs(10), &CancelToken::new())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_bell_circuit_validates() {
    let mut circuit = Circuit::with_size("bell", 2, 2);
    circuit
        .h(QubitId(0))
        .unwrap()
        .cx(QubitId(0), QubitId(1))
        .unwrap()
        .measure(QubitId(0), ClbitId(0))
        .unwrap()
        .measure(QubitId(1), ClbitId(1))
        .unwrap();

    let result = simulate(&circuit, 1000).await;
    assert_eq!(result.counts.total_shots(), 1000);

    let correlated = result.counts.get("00") + result.counts.get("11");
    let anti = result.counts.get("01") + result.counts.get("10");
    assert!(correlated >= 850);
    assert!(anti <= 50);

    let verdict = validate(&result, &ValidationProperty::bell());
    assert!(verdict.passed, "{verdict}");
}

#[tokio::test]
async fn test_product_state_does_not_validate() {
    // Independent superpositions: no correlation between the two bits.
    let mut circuit = Circuit::with_size("product", 2, 2);
    circuit
        .h(QubitId(0))
        .unwrap()
        .h(QubitId(1))
        .unwrap()
        .measure_all()
        .unwrap();

    let result = simulate(&circuit, 2000).await;
    let verdict = validate(&result, &ValidationProperty::bell());
    assert!(!verdict.passed, "{verdict}");
}

#[tokio::test]
async fn test_ghz_validates_all_equal() {
    let result = simulate(&Circuit::ghz(4).unwrap(), 1000).await;
    let verdict = validate(&result, &ValidationProperty::all_equal(0.99));
    assert!(verdict.passed, "{verdict}");
}
