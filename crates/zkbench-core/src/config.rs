//! benchmark configuration
//!
//! every field has a default, so an empty (or absent) TOML file is a valid
//! config. the binary layers its command line flags on top.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::backend::BackendKind;
use crate::driver::{BenchPlan, FailurePolicy};
use crate::error::{BenchError, Result};
use crate::DEFAULT_ITERATIONS;

/// compiled circuit name under `<program_dir>/target/`
pub const DEFAULT_CIRCUIT_NAME: &str = "noir_zkemail_benchmarks";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenchConfig {
    pub iterations: u32,
    pub warmup: u32,
    pub backends: Vec<BackendKind>,
    pub on_failure: FailurePolicy,
    /// noir package holding Nargo.toml and the prover file
    pub program_dir: PathBuf,
    /// compiled artifact, defaults to `<program_dir>/target/<circuit>.json`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,
    pub prover_name: String,
    pub nargo: PathBuf,
    pub bb: PathBuf,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            warmup: 0,
            backends: BackendKind::ALL.to_vec(),
            on_failure: FailurePolicy::Abort,
            program_dir: PathBuf::from("circuits"),
            artifact: None,
            prover_name: "Prover".to_string(),
            nargo: PathBuf::from("nargo"),
            bb: PathBuf::from("bb"),
        }
    }
}

impl BenchConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| BenchError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: BenchConfig = toml::from_str(raw)?;
        config.plan().validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| BenchError::Config(e.to_string()))
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.artifact.clone().unwrap_or_else(|| {
            self.program_dir
                .join("target")
                .join(format!("{}.json", DEFAULT_CIRCUIT_NAME))
        })
    }

    pub fn plan(&self) -> BenchPlan {
        BenchPlan {
            iterations: self.iterations,
            warmup: self.warmup,
            backends: self.backends.clone(),
            on_failure: self.on_failure,
        }
    }
}
