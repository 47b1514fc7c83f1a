//! fixed-iteration benchmark loop
//!
//! each iteration runs one trial per backend, in plan order, before moving on
//! to the next iteration. everything is sequential.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::aggregate::Aggregator;
use crate::backend::BackendKind;
use crate::error::{BenchError, Result};
use crate::report::{BackendSummary, BenchReport};
use crate::runner::RunTrial;
use crate::DEFAULT_ITERATIONS;

/// what to do when a trial fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// stop at the first failure and propagate it
    #[default]
    Abort,
    /// count the failure, leave it out of the mean, keep going
    Continue,
}

impl FromStr for FailurePolicy {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "abort" => Ok(FailurePolicy::Abort),
            "continue" => Ok(FailurePolicy::Continue),
            _ => Err(BenchError::Config(format!(
                "unknown failure policy '{}', expected abort or continue",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BenchPlan {
    pub iterations: u32,
    pub warmup: u32,
    pub backends: Vec<BackendKind>,
    pub on_failure: FailurePolicy,
}

impl Default for BenchPlan {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            warmup: 0,
            backends: BackendKind::ALL.to_vec(),
            on_failure: FailurePolicy::Abort,
        }
    }
}

impl BenchPlan {
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 || self.backends.is_empty() {
            return Err(BenchError::NoTrials);
        }
        for (i, kind) in self.backends.iter().enumerate() {
            if self.backends[..i].contains(kind) {
                return Err(BenchError::DuplicateBackend(*kind));
            }
        }
        Ok(())
    }

    /// whether `err` may be tolerated under this plan
    fn tolerates(&self, err: &BenchError) -> bool {
        self.on_failure == FailurePolicy::Continue && err.is_collaborator_failure()
    }
}

pub fn run_benchmark<R>(runner: &R, plan: &BenchPlan) -> Result<BenchReport>
where
    R: RunTrial + ?Sized,
{
    plan.validate()?;

    for round in 0..plan.warmup {
        for &kind in &plan.backends {
            debug!("warmup {}/{}: {}", round + 1, plan.warmup, kind.label());
            match runner.run_trial(kind) {
                Ok(_) => {}
                Err(e) if plan.tolerates(&e) => warn!("warmup {} trial failed: {}", kind.label(), e),
                Err(e) => return Err(e),
            }
        }
    }

    let mut aggregates: Vec<(BackendKind, Aggregator)> = plan
        .backends
        .iter()
        .map(|&kind| (kind, Aggregator::new()))
        .collect();

    for i in 0..plan.iterations {
        for (kind, agg) in aggregates.iter_mut() {
            debug!("iteration {}/{}: {}", i + 1, plan.iterations, kind.label());
            match runner.run_trial(*kind) {
                Ok(trial) => agg.record(trial),
                Err(e) if plan.tolerates(&e) => {
                    warn!("{} trial {} failed: {}", kind.label(), i + 1, e);
                    agg.record_failure();
                }
                Err(e) => return Err(e),
            }
        }
    }

    let summaries = aggregates
        .into_iter()
        .map(|(kind, agg)| -> Result<BackendSummary> {
            let average = agg.mean()?;
            info!(
                "{}: {} trials ({} failed), mean total {:.3}s",
                kind.label(),
                agg.trials(),
                agg.failures(),
                average.total
            );
            Ok(BackendSummary {
                backend: kind,
                trials: agg.trials(),
                failures: agg.failures(),
                average,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(BenchReport {
        iterations: plan.iterations,
        summaries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{ScriptedTrials, Step};
    use crate::timings::TrialTimings;

    fn timings(w: f64, p: f64, v: f64) -> TrialTimings {
        TrialTimings {
            witness_generation: w,
            proof_generation: p,
            proof_verification: v,
            total: w + p + v,
        }
    }

    #[test]
    fn test_default_plan() {
        let plan = BenchPlan::default();
        assert_eq!(plan.iterations, 10);
        assert_eq!(plan.backends, [BackendKind::UltraHonk, BackendKind::UltraPlonk]);
        assert_eq!(plan.on_failure, FailurePolicy::Abort);
    }

    #[test]
    fn test_trials_interleave_backends() {
        let trials = ScriptedTrials::new();
        let plan = BenchPlan {
            iterations: 3,
            ..BenchPlan::default()
        };
        run_benchmark(&trials, &plan).unwrap();

        let honk = Step::Trial(BackendKind::UltraHonk);
        let plonk = Step::Trial(BackendKind::UltraPlonk);
        assert_eq!(trials.log().steps(), [honk, plonk, honk, plonk, honk, plonk]);
    }

    #[test]
    fn test_report_averages_per_backend() {
        let trials = ScriptedTrials::new()
            .with(BackendKind::UltraHonk, timings(1.0, 4.0, 0.5))
            .with(BackendKind::UltraPlonk, timings(1.0, 8.0, 0.25));
        let report = run_benchmark(&trials, &BenchPlan::default()).unwrap();

        assert_eq!(report.iterations, 10);
        let honk = report.summary(BackendKind::UltraHonk).unwrap();
        assert_eq!(honk.trials, 10);
        assert_eq!(honk.failures, 0);
        assert!((honk.average.proof_generation - 4.0).abs() < 1e-9);
        assert!((honk.average.total - 5.5).abs() < 1e-9);
        let plonk = report.summary(BackendKind::UltraPlonk).unwrap();
        assert!((plonk.average.proof_generation - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_iterations_rejected_before_any_trial() {
        let trials = ScriptedTrials::new();
        let plan = BenchPlan {
            iterations: 0,
            ..BenchPlan::default()
        };
        assert!(matches!(run_benchmark(&trials, &plan), Err(BenchError::NoTrials)));
        assert!(trials.log().steps().is_empty());
    }

    #[test]
    fn test_duplicate_backend_rejected() {
        let plan = BenchPlan {
            backends: vec![BackendKind::UltraPlonk, BackendKind::UltraPlonk],
            ..BenchPlan::default()
        };
        assert!(matches!(
            plan.validate(),
            Err(BenchError::DuplicateBackend(BackendKind::UltraPlonk))
        ));
    }

    #[test]
    fn test_failure_aborts_remaining_trials() {
        // trial #3 overall is the second UltraPlonk trial
        let trials = ScriptedTrials::new().failing_on(3);
        let err = run_benchmark(&trials, &BenchPlan::default()).unwrap_err();

        assert!(matches!(err, BenchError::Proving(_)));
        assert_eq!(trials.log().steps().len(), 4);
    }

    #[test]
    fn test_continue_policy_counts_failures() {
        let trials = ScriptedTrials::new()
            .with(BackendKind::UltraHonk, timings(1.0, 2.0, 1.0))
            .failing_on(0)
            .failing_on(2);
        let plan = BenchPlan {
            iterations: 4,
            on_failure: FailurePolicy::Continue,
            ..BenchPlan::default()
        };
        let report = run_benchmark(&trials, &plan).unwrap();

        let honk = report.summary(BackendKind::UltraHonk).unwrap();
        assert_eq!(honk.trials, 2);
        assert_eq!(honk.failures, 2);
        assert_eq!(honk.average.total, 4.0);
        let plonk = report.summary(BackendKind::UltraPlonk).unwrap();
        assert_eq!(plonk.trials, 4);
        assert_eq!(plonk.failures, 0);
    }

    #[test]
    fn test_continue_policy_with_no_successes_is_error() {
        let trials = ScriptedTrials::new().failing_on(0).failing_on(1);
        let plan = BenchPlan {
            iterations: 2,
            backends: vec![BackendKind::UltraHonk],
            on_failure: FailurePolicy::Continue,
            ..BenchPlan::default()
        };
        assert!(matches!(run_benchmark(&trials, &plan), Err(BenchError::NoTrials)));
    }

    #[test]
    fn test_warmup_trials_are_not_aggregated() {
        let trials = ScriptedTrials::new().with(BackendKind::UltraHonk, timings(1.0, 1.0, 1.0));
        let plan = BenchPlan {
            iterations: 2,
            warmup: 3,
            backends: vec![BackendKind::UltraHonk],
            ..BenchPlan::default()
        };
        let report = run_benchmark(&trials, &plan).unwrap();

        assert_eq!(trials.log().count(Step::Trial(BackendKind::UltraHonk)), 5);
        assert_eq!(report.summary(BackendKind::UltraHonk).unwrap().trials, 2);
    }

    #[test]
    fn test_parse_failure_policy() {
        assert_eq!("continue".parse::<FailurePolicy>().unwrap(), FailurePolicy::Continue);
        assert_eq!("Continue".parse::<FailurePolicy>().unwrap(), FailurePolicy::Continue);
        assert_eq!("ABORT".parse::<FailurePolicy>().unwrap(), FailurePolicy::Abort);
        assert!("retry".parse::<FailurePolicy>().is_err());
    }
}
