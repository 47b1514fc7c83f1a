//! zkbench core - timing harness for noir circuits on barretenberg
//!
//! Repeatedly runs witness generation, proof generation and proof
//! verification for a fixed circuit and input across two proving schemes
//! (UltraHonk and UltraPlonk), and reports the mean duration of each step.
//!
//! The proving work itself is done by external tools (`nargo`, `bb`); this
//! crate is the loop, the clock and the accumulator around them:
//! - [`runner`]: one timed trial (witness -> prove -> verify)
//! - [`driver`]: interleaved fixed-iteration loop over backends
//! - [`aggregate`] / [`timings`]: field-wise sums and means
//! - [`toolchain`]: the real `nargo` / `bb` collaborators
//! - `mock` (feature `test-utils`): deterministic collaborators for tests

pub mod aggregate;
pub mod artifact;
pub mod backend;
pub mod clock;
pub mod config;
pub mod driver;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod report;
pub mod runner;
pub mod timings;
pub mod toolchain;

pub use aggregate::Aggregator;
pub use artifact::{CircuitArtifact, CircuitInput, NoirPackage};
pub use backend::{BackendFactory, BackendKind, Proof, ProvingBackend, Witness, WitnessEngine};
pub use clock::{Clock, MonotonicClock};
pub use config::BenchConfig;
pub use driver::{run_benchmark, BenchPlan, FailurePolicy};
pub use error::{BenchError, Result};
pub use report::{BackendSummary, BenchReport};
pub use runner::{RunTrial, TrialRunner};
pub use timings::{Checkpoints, TrialTimings};
pub use toolchain::{BbBackend, BbBackendFactory, NargoWitnessEngine};

/// trials per backend when not configured
pub const DEFAULT_ITERATIONS: u32 = 10;
