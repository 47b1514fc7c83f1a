//! Drive the nargo / bb wrappers against stand-in shell scripts
//!
//! Everything runs inside one test so no other test thread forks while a
//! script is still open for writing.

#![cfg(unix)]

use std::fs;

use zkbench_core::mock::scripts::StandInTools;
use zkbench_core::mock::{fixture_circuit, fixture_package};
use zkbench_core::{
    run_benchmark, BackendFactory, BackendKind, BbBackendFactory, BenchError, BenchPlan,
    MonotonicClock, NargoWitnessEngine, ProvingBackend, TrialRunner, WitnessEngine,
};

#[test]
fn toolchain_wrappers() {
    let tools_dir = tempfile::tempdir().unwrap();
    let program = tempfile::tempdir().unwrap();
    let tools = StandInTools::install(tools_dir.path()).unwrap();
    let (circuit, input) = fixture_package(program.path()).unwrap();

    // witness is read from <program_dir>/target/<name>.gz, then removed
    let engine = NargoWitnessEngine::new(&tools.nargo, program.path(), &circuit).unwrap();
    let witness = engine.execute(&circuit, &input).unwrap();
    assert_eq!(witness.0, b"witness-bytes");
    assert!(!engine.witness_path().exists());
    assert_eq!(
        tools.nargo_calls(),
        [format!(
            "execute --program-dir {} --prover-name Prover zkbench_witness",
            program.path().display()
        )]
    );

    let err = NargoWitnessEngine::new(&tools.failing_nargo, program.path(), &circuit)
        .unwrap()
        .execute(&circuit, &input)
        .unwrap_err();
    assert!(matches!(err, BenchError::Witness(ref msg) if msg.contains("Failed constraint")));

    // a circuit that is not the package's program never reaches nargo
    let (mut other, _) = fixture_circuit();
    other.path = "/does/not/exist/other_circuit.json".into();
    other.bytecode = "garbage".into();
    let err = engine.execute(&other, &input).unwrap_err();
    assert!(matches!(err, BenchError::Artifact(_)));
    assert_eq!(tools.nargo_calls().len(), 1);

    // each backend writes its vk at construction and cleans up on drop
    let factory = BbBackendFactory::new(&tools.bb);
    let backend = factory.create(BackendKind::UltraHonk, &circuit).unwrap();
    let proof = backend.generate_proof(&witness).unwrap();
    assert_eq!(proof.0, b"proof-bytes");
    assert!(backend.verify_proof(&proof).unwrap());
    drop(backend);
    assert_eq!(
        tools.bb_calls(),
        ["write_vk_ultra_honk", "prove_ultra_honk", "verify_ultra_honk"]
    );

    let plonk = zkbench_core::BbBackend::new(BackendKind::UltraPlonk, &tools.bb, &circuit.path).unwrap();
    let scratch = plonk.scratch_dir().to_path_buf();
    assert!(scratch.join("vk").exists());
    drop(plonk);
    assert!(!scratch.exists());

    let rejecting = BbBackendFactory::new(&tools.rejecting_bb)
        .create(BackendKind::UltraPlonk, &circuit)
        .unwrap();
    let proof = rejecting.generate_proof(&witness).unwrap();
    let err = rejecting.verify_proof(&proof).unwrap_err();
    assert!(matches!(err, BenchError::Verification(ref msg) if msg.contains("verified: 0")));

    // full loop over the scripts
    fs::remove_file(tools_dir.path().join("bb-calls.log")).unwrap();
    let runner = TrialRunner::new(
        MonotonicClock::new(),
        NargoWitnessEngine::new(&tools.nargo, program.path(), &circuit).unwrap(),
        BbBackendFactory::new(&tools.bb),
        &circuit,
        &input,
    );
    let plan = BenchPlan {
        iterations: 2,
        ..BenchPlan::default()
    };
    let report = run_benchmark(&runner, &plan).unwrap();
    for summary in &report.summaries {
        assert_eq!(summary.trials, 2);
        assert!(summary.average.total >= 0.0);
    }
    let calls = tools.bb_calls();
    assert_eq!(calls.iter().filter(|l| l.starts_with("prove")).count(), 4);
    assert!(!program.path().join("target/zkbench_witness.gz").exists());
}
