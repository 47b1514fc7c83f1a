//! error types for zkbench

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("witness execution failed: {0}")]
    Witness(String),

    #[error("proof generation failed: {0}")]
    Proving(String),

    #[error("proof verification failed: {0}")]
    Verification(String),

    #[error("proof rejected by {0} verifier")]
    InvalidProof(crate::BackendKind),

    #[error("no successful trials to average")]
    NoTrials,

    #[error("backend listed twice: {0}")]
    DuplicateBackend(crate::BackendKind),

    #[error("unknown backend '{0}', expected ultra_honk or ultra_plonk")]
    UnknownBackend(String),

    #[error("invalid circuit artifact: {0}")]
    Artifact(String),

    #[error("invalid circuit input: {0}")]
    Input(String),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl BenchError {
    /// true for failures raised by the external prover toolchain
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(
            self,
            BenchError::Witness(_)
                | BenchError::Proving(_)
                | BenchError::Verification(_)
                | BenchError::InvalidProof(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;
