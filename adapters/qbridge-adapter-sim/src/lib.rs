//! qbridge local simulator
//!
//! A statevector simulator implementing [`Executor`](qbridge_hal::Executor)
//! for [`Target::Local`](qbridge_hal::Target::Local) programs. It is the
//! fallback target when no remote backend is reachable.
//!
//! # Example
//!
//! ```
//! use qbridge_adapter_sim::SimulatorBackend;
//! use qbridge_ir::Circuit;
//!
//! let sim = SimulatorBackend::new().with_seed(1);
//! let counts = sim.sample(&Circuit::bell().unwrap(), 100).unwrap();
//! assert_eq!(counts.get("00") + counts.get("11"), 100);
//! ```

mod simulator;
mod statevector;

pub use simulator::SimulatorBackend;
