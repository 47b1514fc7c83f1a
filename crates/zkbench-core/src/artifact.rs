//! compiled circuit artifact and its fixed input record
//!
//! both are loaded once at startup and shared by every trial.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{BenchError, Result};

/// noir program artifact (`nargo compile` output, `target/<name>.json`)
#[derive(Debug, Clone, Deserialize)]
pub struct CircuitArtifact {
    /// where the artifact was read from, handed to the prover
    #[serde(skip)]
    pub path: PathBuf,
    #[serde(default)]
    pub noir_version: String,
    /// nargo's hash of the program source
    #[serde(default)]
    pub hash: Option<u64>,
    pub abi: Abi,
    /// base64 gzipped ACIR, passed through untouched
    pub bytecode: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Abi {
    #[serde(default)]
    pub parameters: Vec<AbiParameter>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AbiParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub typ: serde_json::Value,
    #[serde(default)]
    pub visibility: Option<String>,
}

impl CircuitArtifact {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read(path)
            .map_err(|e| BenchError::Artifact(format!("{}: {}", path.display(), e)))?;
        let mut artifact: CircuitArtifact = serde_json::from_slice(&raw)?;
        if artifact.bytecode.is_empty() {
            return Err(BenchError::Artifact(format!(
                "{}: empty bytecode",
                path.display()
            )));
        }
        artifact.path = path.to_path_buf();
        debug!(
            "loaded circuit {} (noir {}, {} parameters)",
            path.display(),
            artifact.noir_version,
            artifact.abi.parameters.len()
        );
        Ok(artifact)
    }

    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.abi.parameters.iter().map(|p| p.name.as_str())
    }

    /// same compiled program, by source hash when both carry one
    pub fn same_program(&self, other: &CircuitArtifact) -> bool {
        match (self.hash, other.hash) {
            (Some(a), Some(b)) => a == b,
            _ => self.bytecode == other.bytecode,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Manifest {
    package: ManifestPackage,
}

#[derive(Debug, Deserialize)]
struct ManifestPackage {
    name: String,
}

/// noir package directory, as named by its `Nargo.toml`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoirPackage {
    pub dir: PathBuf,
    pub name: String,
}

impl NoirPackage {
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let path = dir.join("Nargo.toml");
        let raw = fs::read_to_string(&path)
            .map_err(|e| BenchError::Artifact(format!("{}: {}", path.display(), e)))?;
        let manifest: Manifest = toml::from_str(&raw)
            .map_err(|e| BenchError::Artifact(format!("{}: {}", path.display(), e)))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            name: manifest.package.name,
        })
    }

    /// where `nargo compile` leaves this package's program
    pub fn compiled_path(&self) -> PathBuf {
        self.dir.join("target").join(format!("{}.json", self.name))
    }

    /// the package's compiled program, which must be `circuit`
    ///
    /// `nargo execute` solves the witness for whatever the package compiles
    /// to, so a circuit loaded from elsewhere has to be that same program.
    pub fn compiled_matching(&self, circuit: &CircuitArtifact) -> Result<CircuitArtifact> {
        let compiled = CircuitArtifact::load(self.compiled_path())?;
        if !compiled.same_program(circuit) {
            return Err(BenchError::Artifact(format!(
                "{} is not the program compiled from package '{}' ({})",
                circuit.path.display(),
                self.name,
                compiled.path.display()
            )));
        }
        Ok(compiled)
    }
}

/// structured input in nargo's prover file format
#[derive(Debug, Clone)]
pub struct CircuitInput {
    pub path: PathBuf,
    /// file stem nargo looks up via `--prover-name`
    pub prover_name: String,
    pub values: toml::Table,
}

impl CircuitInput {
    /// read `<program_dir>/<prover_name>.toml`
    pub fn load(program_dir: impl AsRef<Path>, prover_name: &str) -> Result<Self> {
        let path = program_dir.as_ref().join(format!("{}.toml", prover_name));
        let raw = fs::read_to_string(&path)
            .map_err(|e| BenchError::Input(format!("{}: {}", path.display(), e)))?;
        let values: toml::Table = toml::from_str(&raw)
            .map_err(|e| BenchError::Input(format!("{}: {}", path.display(), e)))?;
        Ok(Self {
            path,
            prover_name: prover_name.to_string(),
            values,
        })
    }

    /// every abi parameter needs a value; extra keys are tolerated
    pub fn validate(&self, circuit: &CircuitArtifact) -> Result<()> {
        let missing: Vec<&str> = circuit
            .parameter_names()
            .filter(|name| !self.values.contains_key(*name))
            .collect();
        if !missing.is_empty() {
            return Err(BenchError::Input(format!(
                "{} is missing parameters: {}",
                self.path.display(),
                missing.join(", ")
            )));
        }

        for key in self.values.keys() {
            if !circuit.parameter_names().any(|name| name == key.as_str()) {
                warn!("input key '{}' is not a circuit parameter", key);
            }
        }
        Ok(())
    }
}
