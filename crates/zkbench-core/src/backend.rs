//! Proving backend abstraction
//!
//! The harness never proves anything itself. Witness execution, proving and
//! verification are delegated to an external toolchain through the three
//! traits below:
//!
//! - [`WitnessEngine`]: executes the circuit on the fixed input
//! - [`ProvingBackend`]: proves and verifies for one scheme
//! - [`BackendFactory`]: the single construction path for every [`BackendKind`]
//!
//! A backend is created fresh for each trial and dropped when the trial ends,
//! which is where implementations release native resources.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::artifact::{CircuitArtifact, CircuitInput};
use crate::error::{BenchError, Result};

/// proving scheme selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    UltraHonk,
    UltraPlonk,
}

impl BackendKind {
    /// default run order, one trial of each per iteration
    pub const ALL: [BackendKind; 2] = [BackendKind::UltraHonk, BackendKind::UltraPlonk];

    /// config / cli spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::UltraHonk => "ultra_honk",
            BackendKind::UltraPlonk => "ultra_plonk",
        }
    }

    /// human readable name for reports
    pub fn label(&self) -> &'static str {
        match self {
            BackendKind::UltraHonk => "UltraHonk",
            BackendKind::UltraPlonk => "UltraPlonk",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "ultra_honk" | "ultrahonk" | "honk" => Ok(BackendKind::UltraHonk),
            "ultra_plonk" | "ultraplonk" | "plonk" => Ok(BackendKind::UltraPlonk),
            _ => Err(BenchError::UnknownBackend(s.to_string())),
        }
    }
}

/// solved witness, opaque to the harness
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Witness(pub Vec<u8>);

/// proof bytes, opaque to the harness
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proof(pub Vec<u8>);

impl Witness {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Proof {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// executes a circuit on an input record
pub trait WitnessEngine {
    /// fails with [`BenchError::Witness`] when the input does not satisfy the circuit
    fn execute(&self, circuit: &CircuitArtifact, input: &CircuitInput) -> Result<Witness>;
}

/// one proving scheme bound to one circuit
pub trait ProvingBackend {
    fn kind(&self) -> BackendKind;

    /// fails with [`BenchError::Proving`]
    fn generate_proof(&self, witness: &Witness) -> Result<Proof>;

    /// `Ok(false)` means the verifier ran and rejected the proof.
    /// fails with [`BenchError::Verification`] when the verifier itself errors
    fn verify_proof(&self, proof: &Proof) -> Result<bool>;
}

/// builds backends for either scheme
pub trait BackendFactory {
    fn create(&self, kind: BackendKind, circuit: &CircuitArtifact) -> Result<Box<dyn ProvingBackend>>;
}
