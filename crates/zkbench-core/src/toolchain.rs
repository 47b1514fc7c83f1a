//! noir + barretenberg via their CLIs
//!
//! witness execution shells out to `nargo execute`, proving and verification to
//! `bb`. each [`BbBackend`] owns a scratch directory holding its verification
//! key, the witness and the proof; the directory is removed when the backend
//! is dropped at the end of a trial.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;
use tracing::{debug, trace, warn};

use crate::artifact::{CircuitArtifact, CircuitInput, NoirPackage};
use crate::backend::{BackendFactory, BackendKind, Proof, ProvingBackend, Witness, WitnessEngine};
use crate::error::{BenchError, Result};

/// witness file stem nargo writes under `<program_dir>/target/`
pub const DEFAULT_WITNESS_NAME: &str = "zkbench_witness";

/// bb subcommands for one proving scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BbCommands {
    pub write_vk: &'static str,
    pub prove: &'static str,
    pub verify: &'static str,
}

impl BbCommands {
    pub fn for_kind(kind: BackendKind) -> Self {
        match kind {
            BackendKind::UltraHonk => BbCommands {
                write_vk: "write_vk_ultra_honk",
                prove: "prove_ultra_honk",
                verify: "verify_ultra_honk",
            },
            BackendKind::UltraPlonk => BbCommands {
                write_vk: "write_vk",
                prove: "prove",
                verify: "verify",
            },
        }
    }
}

/// run a tool to completion, capturing output
fn run(cmd: &mut Command) -> Result<Output> {
    trace!("exec {:?}", cmd);
    let output = cmd.output().map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!("failed to run {:?}: {}", cmd.get_program(), e),
        )
    })?;
    Ok(output)
}

/// stderr of a failed run, falling back to stdout and then the exit status
fn failure_message(what: &str, output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let detail = if !stderr.trim().is_empty() {
        stderr.trim().to_string()
    } else if !stdout.trim().is_empty() {
        stdout.trim().to_string()
    } else {
        output.status.to_string()
    };
    format!("{}: {}", what, detail)
}

/// `nargo execute` against the program directory
///
/// nargo solves the witness for the package it is pointed at, so the engine
/// is bound to the circuit at construction and refuses any other. the
/// measured witness time includes nargo loading the package as well as
/// solving it. the witness file is removed again once read.
#[derive(Debug, Clone)]
pub struct NargoWitnessEngine {
    nargo: PathBuf,
    package: NoirPackage,
    compiled: CircuitArtifact,
    witness_name: String,
}

impl NargoWitnessEngine {
    /// fails unless `circuit` is the program compiled from `program_dir`
    pub fn new(
        nargo: impl Into<PathBuf>,
        program_dir: impl AsRef<Path>,
        circuit: &CircuitArtifact,
    ) -> Result<Self> {
        let package = NoirPackage::load(program_dir)?;
        let compiled = package.compiled_matching(circuit)?;
        debug!(
            "witness engine bound to package '{}' ({})",
            package.name,
            compiled.path.display()
        );
        Ok(Self {
            nargo: nargo.into(),
            package,
            compiled,
            witness_name: DEFAULT_WITNESS_NAME.to_string(),
        })
    }

    pub fn with_witness_name(mut self, name: impl Into<String>) -> Self {
        self.witness_name = name.into();
        self
    }

    pub fn witness_path(&self) -> PathBuf {
        self.package
            .dir
            .join("target")
            .join(format!("{}.gz", self.witness_name))
    }
}

impl WitnessEngine for NargoWitnessEngine {
    fn execute(&self, circuit: &CircuitArtifact, input: &CircuitInput) -> Result<Witness> {
        if !self.compiled.same_program(circuit) {
            return Err(BenchError::Artifact(format!(
                "{} is not the program nargo executes for package '{}'",
                circuit.path.display(),
                self.package.name
            )));
        }
        debug!(
            "nargo execute {} with {}",
            self.package.name,
            input.path.display()
        );
        let output = run(Command::new(&self.nargo)
            .arg("execute")
            .arg("--program-dir")
            .arg(&self.package.dir)
            .arg("--prover-name")
            .arg(&input.prover_name)
            .arg(&self.witness_name))?;

        if !output.status.success() {
            return Err(BenchError::Witness(failure_message("nargo execute", &output)));
        }

        let path = self.witness_path();
        let bytes = fs::read(&path).map_err(|e| {
            BenchError::Witness(format!("missing witness {}: {}", path.display(), e))
        })?;
        if let Err(e) = fs::remove_file(&path) {
            warn!("could not remove {}: {}", path.display(), e);
        }
        Ok(Witness(bytes))
    }
}

/// constructs a [`BbBackend`] for either scheme
#[derive(Debug, Clone)]
pub struct BbBackendFactory {
    bb: PathBuf,
}

impl BbBackendFactory {
    pub fn new(bb: impl Into<PathBuf>) -> Self {
        Self { bb: bb.into() }
    }
}

impl BackendFactory for BbBackendFactory {
    fn create(&self, kind: BackendKind, circuit: &CircuitArtifact) -> Result<Box<dyn ProvingBackend>> {
        Ok(Box::new(BbBackend::new(kind, &self.bb, &circuit.path)?))
    }
}

/// barretenberg prover/verifier for one scheme and one circuit
#[derive(Debug)]
pub struct BbBackend {
    kind: BackendKind,
    commands: BbCommands,
    bb: PathBuf,
    bytecode_path: PathBuf,
    scratch: TempDir,
}

impl BbBackend {
    /// writes the verification key up front
    pub fn new(kind: BackendKind, bb: &Path, bytecode_path: &Path) -> Result<Self> {
        let scratch = tempfile::Builder::new().prefix("zkbench-").tempdir()?;
        let backend = Self {
            kind,
            commands: BbCommands::for_kind(kind),
            bb: bb.to_path_buf(),
            bytecode_path: bytecode_path.to_path_buf(),
            scratch,
        };

        let output = run(Command::new(&backend.bb)
            .arg(backend.commands.write_vk)
            .arg("-b")
            .arg(&backend.bytecode_path)
            .arg("-o")
            .arg(backend.vk_path()))?;
        if !output.status.success() {
            return Err(BenchError::Proving(failure_message(
                backend.commands.write_vk,
                &output,
            )));
        }
        debug!(
            "{} backend ready in {}",
            kind.label(),
            backend.scratch.path().display()
        );
        Ok(backend)
    }

    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    fn vk_path(&self) -> PathBuf {
        self.scratch.path().join("vk")
    }

    fn witness_path(&self) -> PathBuf {
        self.scratch.path().join("witness.gz")
    }

    fn proof_path(&self) -> PathBuf {
        self.scratch.path().join("proof")
    }
}

impl ProvingBackend for BbBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn generate_proof(&self, witness: &Witness) -> Result<Proof> {
        fs::write(self.witness_path(), &witness.0)?;
        let output = run(Command::new(&self.bb)
            .arg(self.commands.prove)
            .arg("-b")
            .arg(&self.bytecode_path)
            .arg("-w")
            .arg(self.witness_path())
            .arg("-o")
            .arg(self.proof_path()))?;
        if !output.status.success() {
            return Err(BenchError::Proving(failure_message(self.commands.prove, &output)));
        }

        let bytes = fs::read(self.proof_path()).map_err(|e| {
            BenchError::Proving(format!("{} wrote no proof: {}", self.commands.prove, e))
        })?;
        Ok(Proof(bytes))
    }

    fn verify_proof(&self, proof: &Proof) -> Result<bool> {
        fs::write(self.proof_path(), &proof.0)?;
        let output = run(Command::new(&self.bb)
            .arg(self.commands.verify)
            .arg("-k")
            .arg(self.vk_path())
            .arg("-p")
            .arg(self.proof_path()))?;
        // bb exits non-zero for both a rejected proof and a broken run
        if !output.status.success() {
            return Err(BenchError::Verification(failure_message(
                self.commands.verify,
                &output,
            )));
        }
        Ok(true)
    }
}
