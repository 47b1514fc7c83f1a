//! Deterministic collaborators for tests
//!
//! Nothing here touches a subprocess. Every mock records what it was asked to
//! do into a shared [`MockLog`] so tests can assert on call order, and each can
//! be told to fail on a given call.

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::artifact::{Abi, AbiParameter, CircuitArtifact, CircuitInput};
use crate::backend::{BackendFactory, BackendKind, Proof, ProvingBackend, Witness, WitnessEngine};
use crate::clock::Clock;
use crate::error::{BenchError, Result};
use crate::runner::RunTrial;
use crate::timings::TrialTimings;

/// one observable collaborator call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Create(BackendKind),
    Execute,
    Prove(BackendKind),
    Verify(BackendKind),
    Drop(BackendKind),
    Trial(BackendKind),
}

/// shared, append-only call log
#[derive(Debug, Clone, Default)]
pub struct MockLog(Rc<RefCell<Vec<Step>>>);

impl MockLog {
    pub fn push(&self, step: Step) {
        self.0.borrow_mut().push(step);
    }

    pub fn steps(&self) -> Vec<Step> {
        self.0.borrow().clone()
    }

    pub fn count(&self, step: Step) -> usize {
        self.0.borrow().iter().filter(|s| **s == step).count()
    }
}

/// in-memory circuit with one parameter and a matching input
pub fn fixture_circuit() -> (CircuitArtifact, CircuitInput) {
    let circuit = CircuitArtifact {
        path: PathBuf::from("target/fixture.json"),
        noir_version: "mock".into(),
        hash: None,
        abi: Abi {
            parameters: vec![AbiParameter {
                name: "x".into(),
                typ: serde_json::json!({ "kind": "field" }),
                visibility: Some("private".into()),
            }],
        },
        bytecode: "AA==".into(),
    };

    let mut values = toml::Table::new();
    values.insert("x".into(), toml::Value::String("1".into()));
    let input = CircuitInput {
        path: PathBuf::from("Prover.toml"),
        prover_name: "Prover".into(),
        values,
    };
    (circuit, input)
}

/// compiled program of the package written by [`fixture_package`]
pub const FIXTURE_ARTIFACT: &str = r#"{
    "noir_version": "mock",
    "hash": 42,
    "abi": {
        "parameters": [{"name": "x", "type": {"kind": "field"}, "visibility": "private"}],
        "return_type": null
    },
    "bytecode": "H4sIAAAAAAAA/w=="
}"#;

/// write a compiled noir package named `fixture` into `dir` and load it
///
/// the package has `Nargo.toml`, `Prover.toml` and `target/fixture.json`.
pub fn fixture_package(dir: &Path) -> Result<(CircuitArtifact, CircuitInput)> {
    fs::write(
        dir.join("Nargo.toml"),
        "[package]\nname = \"fixture\"\ntype = \"bin\"\n",
    )?;
    fs::write(dir.join("Prover.toml"), "x = \"1\"\n")?;
    fs::create_dir_all(dir.join("target"))?;
    fs::write(dir.join("target").join("fixture.json"), FIXTURE_ARTIFACT)?;

    let circuit = CircuitArtifact::load(dir.join("target").join("fixture.json"))?;
    let input = CircuitInput::load(dir, "Prover")?;
    Ok((circuit, input))
}

/// checkpoint clock that replays a script
///
/// after the last scripted value the script repeats, shifted by its final
/// value, so every trial sees the same deltas.
#[derive(Debug)]
pub struct ScriptedClock {
    script: Vec<f64>,
    period: f64,
    calls: Cell<usize>,
}

impl ScriptedClock {
    pub fn new(script: impl IntoIterator<Item = f64>) -> Self {
        let script: Vec<f64> = script.into_iter().collect();
        let period = script.last().copied().unwrap_or(0.0);
        Self {
            script,
            period,
            calls: Cell::new(0),
        }
    }

    /// 0, step, 2*step, ...
    pub fn ticking(step: f64) -> Self {
        Self {
            script: vec![0.0],
            period: step,
            calls: Cell::new(0),
        }
    }
}

impl Clock for ScriptedClock {
    fn now(&self) -> f64 {
        let i = self.calls.get();
        self.calls.set(i + 1);
        if self.script.is_empty() {
            return 0.0;
        }
        let len = self.script.len();
        self.script[i % len] + (i / len) as f64 * self.period
    }
}

/// witness engine returning a fixed witness
#[derive(Debug, Clone, Default)]
pub struct MockWitnessEngine {
    log: MockLog,
    calls: Rc<Cell<usize>>,
    fail_on: Option<usize>,
}

impl MockWitnessEngine {
    /// fail the `n`th execution (0-based)
    pub fn failing_on(n: usize) -> Self {
        Self {
            fail_on: Some(n),
            ..Self::default()
        }
    }

    pub fn log(&self) -> MockLog {
        self.log.clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl WitnessEngine for MockWitnessEngine {
    fn execute(&self, _circuit: &CircuitArtifact, _input: &CircuitInput) -> Result<Witness> {
        let call = self.calls.get();
        self.calls.set(call + 1);
        self.log.push(Step::Execute);
        if self.fail_on == Some(call) {
            return Err(BenchError::Witness("mock witness failure".into()));
        }
        Ok(Witness(vec![0x1f, 0x8b, 0x08]))
    }
}

/// factory for [`MockBackend`]s sharing one log
#[derive(Debug, Clone, Default)]
pub struct MockBackendFactory {
    log: MockLog,
    reject: Option<BackendKind>,
    fail_prove: Option<BackendKind>,
}

impl MockBackendFactory {
    pub fn with_log(log: MockLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    /// verifier for `kind` reports every proof invalid
    pub fn rejecting(mut self, kind: BackendKind) -> Self {
        self.reject = Some(kind);
        self
    }

    /// prover for `kind` always errors
    pub fn failing_prove(mut self, kind: BackendKind) -> Self {
        self.fail_prove = Some(kind);
        self
    }

    pub fn log(&self) -> MockLog {
        self.log.clone()
    }
}

impl BackendFactory for MockBackendFactory {
    fn create(&self, kind: BackendKind, _circuit: &CircuitArtifact) -> Result<Box<dyn ProvingBackend>> {
        self.log.push(Step::Create(kind));
        Ok(Box::new(MockBackend {
            kind,
            log: self.log.clone(),
            reject: self.reject == Some(kind),
            fail_prove: self.fail_prove == Some(kind),
        }))
    }
}

pub struct MockBackend {
    kind: BackendKind,
    log: MockLog,
    reject: bool,
    fail_prove: bool,
}

impl ProvingBackend for MockBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn generate_proof(&self, witness: &Witness) -> Result<Proof> {
        self.log.push(Step::Prove(self.kind));
        if self.fail_prove {
            return Err(BenchError::Proving(format!("mock {} prover failure", self.kind)));
        }
        Ok(Proof(witness.0.iter().rev().copied().collect()))
    }

    fn verify_proof(&self, _proof: &Proof) -> Result<bool> {
        self.log.push(Step::Verify(self.kind));
        Ok(!self.reject)
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.log.push(Step::Drop(self.kind));
    }
}

/// trial source returning canned timings without any collaborators
#[derive(Debug, Clone, Default)]
pub struct ScriptedTrials {
    log: MockLog,
    timings: Vec<(BackendKind, TrialTimings)>,
    calls: Rc<Cell<usize>>,
    fail_on: Vec<usize>,
}

impl ScriptedTrials {
    pub fn new() -> Self {
        Self::default()
    }

    /// timings returned for every trial of `kind`
    pub fn with(mut self, kind: BackendKind, timings: TrialTimings) -> Self {
        self.timings.retain(|(k, _)| *k != kind);
        self.timings.push((kind, timings));
        self
    }

    /// fail the `n`th trial overall (0-based), counting across backends
    pub fn failing_on(mut self, n: usize) -> Self {
        self.fail_on.push(n);
        self
    }

    pub fn log(&self) -> MockLog {
        self.log.clone()
    }
}

impl RunTrial for ScriptedTrials {
    fn run_trial(&self, kind: BackendKind) -> Result<TrialTimings> {
        let call = self.calls.get();
        self.calls.set(call + 1);
        self.log.push(Step::Trial(kind));
        if self.fail_on.contains(&call) {
            return Err(BenchError::Proving(format!("scripted failure on trial {}", call)));
        }
        Ok(self
            .timings
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, t)| *t)
            .unwrap_or(TrialTimings::ZERO))
    }
}

/// stand-in `nargo` and `bb` shell scripts
///
/// the happy-path scripts append their command lines to `nargo-calls.log` and
/// `bb-calls.log` next to themselves.
#[cfg(unix)]
pub mod scripts {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    use crate::error::Result;

    const NARGO: &str = r#"#!/bin/sh
echo "$@" >> "$(dirname "$0")/nargo-calls.log"
dir=""; name=""
shift
while [ $# -gt 0 ]; do
  case "$1" in
    --program-dir) dir="$2"; shift 2 ;;
    --prover-name) shift 2 ;;
    *) name="$1"; shift ;;
  esac
done
mkdir -p "$dir/target"
printf 'witness-bytes' > "$dir/target/$name.gz"
"#;

    const FAILING_NARGO: &str = r#"#!/bin/sh
echo "error: Failed constraint" >&2
exit 1
"#;

    const BB: &str = r#"#!/bin/sh
cmd="$1"; shift
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
echo "$cmd" >> "$(dirname "$0")/bb-calls.log"
case "$cmd" in
  write_vk*) printf 'vk' > "$out" ;;
  prove*) printf 'proof-bytes' > "$out" ;;
  verify*) exit 0 ;;
  *) echo "unknown command $cmd" >&2; exit 1 ;;
esac
"#;

    const REJECTING_BB: &str = r#"#!/bin/sh
cmd="$1"; shift
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
case "$cmd" in
  verify*) echo "verified: 0"; exit 1 ;;
  *) printf 'x' > "$out" ;;
esac
"#;

    #[derive(Debug, Clone)]
    pub struct StandInTools {
        pub dir: PathBuf,
        pub nargo: PathBuf,
        pub failing_nargo: PathBuf,
        pub bb: PathBuf,
        pub rejecting_bb: PathBuf,
    }

    impl StandInTools {
        /// write every script into `dir`
        ///
        /// keep tests that spawn these on one thread, so no concurrent fork
        /// inherits a script still open for writing (ETXTBSY).
        pub fn install(dir: &Path) -> Result<Self> {
            Ok(Self {
                dir: dir.to_path_buf(),
                nargo: script(dir, "nargo", NARGO)?,
                failing_nargo: script(dir, "nargo-failing", FAILING_NARGO)?,
                bb: script(dir, "bb", BB)?,
                rejecting_bb: script(dir, "bb-rejecting", REJECTING_BB)?,
            })
        }

        /// lines logged by the stand-in `bb`, empty if it never ran
        pub fn bb_calls(&self) -> Vec<String> {
            calls(&self.dir.join("bb-calls.log"))
        }

        /// argument lines logged by the stand-in `nargo`
        pub fn nargo_calls(&self) -> Vec<String> {
            calls(&self.dir.join("nargo-calls.log"))
        }
    }

    fn script(dir: &Path, name: &str, body: &str) -> Result<PathBuf> {
        let path = dir.join(name);
        fs::write(&path, body)?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        Ok(path)
    }

    fn calls(log: &Path) -> Vec<String> {
        fs::read_to_string(log)
            .map(|raw| raw.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_clock_repeats_with_offset() {
        let clock = ScriptedClock::new([0.0, 2.0, 5.0, 6.0]);
        let seen: Vec<f64> = (0..8).map(|_| clock.now()).collect();
        assert_eq!(seen, [0.0, 2.0, 5.0, 6.0, 6.0, 8.0, 11.0, 12.0]);
    }

    #[test]
    fn test_ticking_clock() {
        let clock = ScriptedClock::ticking(0.5);
        let seen: Vec<f64> = (0..3).map(|_| clock.now()).collect();
        assert_eq!(seen, [0.0, 0.5, 1.0]);
    }
}
