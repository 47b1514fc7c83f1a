//! single timed proving trial

use tracing::debug;

use crate::artifact::{CircuitArtifact, CircuitInput};
use crate::backend::{BackendFactory, BackendKind, WitnessEngine};
use crate::clock::Clock;
use crate::error::{BenchError, Result};
use crate::timings::{Checkpoints, TrialTimings};

/// anything that can run one trial for a backend
pub trait RunTrial {
    fn run_trial(&self, kind: BackendKind) -> Result<TrialTimings>;
}

/// witness -> prove -> verify against the external toolchain
pub struct TrialRunner<'a, C, W, F> {
    clock: C,
    engine: W,
    factory: F,
    circuit: &'a CircuitArtifact,
    input: &'a CircuitInput,
}

impl<'a, C, W, F> TrialRunner<'a, C, W, F>
where
    C: Clock,
    W: WitnessEngine,
    F: BackendFactory,
{
    pub fn new(
        clock: C,
        engine: W,
        factory: F,
        circuit: &'a CircuitArtifact,
        input: &'a CircuitInput,
    ) -> Self {
        Self {
            clock,
            engine,
            factory,
            circuit,
            input,
        }
    }
}

impl<C, W, F> RunTrial for TrialRunner<'_, C, W, F>
where
    C: Clock,
    W: WitnessEngine,
    F: BackendFactory,
{
    fn run_trial(&self, kind: BackendKind) -> Result<TrialTimings> {
        // backend setup (vk generation for bb) happens before the first checkpoint
        let backend = self.factory.create(kind, self.circuit)?;

        let start = self.clock.now();
        let witness = self.engine.execute(self.circuit, self.input)?;
        let witness_done = self.clock.now();
        let proof = backend.generate_proof(&witness)?;
        let proof_done = self.clock.now();
        let valid = backend.verify_proof(&proof)?;
        let verify_done = self.clock.now();

        if !valid {
            return Err(BenchError::InvalidProof(kind));
        }

        let timings = TrialTimings::from_checkpoints(Checkpoints {
            start,
            witness_done,
            proof_done,
            verify_done,
        });
        debug!(
            "{} trial: witness {:.3}s ({} bytes), prove {:.3}s ({} bytes), verify {:.3}s",
            backend.kind().label(),
            timings.witness_generation,
            witness.len(),
            timings.proof_generation,
            proof.len(),
            timings.proof_verification
        );
        Ok(timings)
    }
}
