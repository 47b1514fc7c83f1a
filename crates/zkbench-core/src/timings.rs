//! per-trial timing record
//!
//! all durations are seconds as `f64`. a record is produced once per trial from
//! four checkpoints, summed field-wise into a running total and finally divided
//! by the trial count.

use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use crate::error::{BenchError, Result};

/// four checkpoints of one trial, in seconds on a monotonic clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Checkpoints {
    /// immediately before witness execution
    pub start: f64,
    /// after the witness is available
    pub witness_done: f64,
    /// after the proof is generated
    pub proof_done: f64,
    /// after the proof is verified
    pub verify_done: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrialTimings {
    /// whole witness engine call; with `nargo execute` this includes nargo
    /// loading and checking the package, not only solving the circuit
    pub witness_generation: f64,
    pub proof_generation: f64,
    pub proof_verification: f64,
    pub total: f64,
}

impl TrialTimings {
    pub const ZERO: Self = Self {
        witness_generation: 0.0,
        proof_generation: 0.0,
        proof_verification: 0.0,
        total: 0.0,
    };

    /// inter-checkpoint deltas plus the full span
    pub fn from_checkpoints(cp: Checkpoints) -> Self {
        Self {
            witness_generation: cp.witness_done - cp.start,
            proof_generation: cp.proof_done - cp.witness_done,
            proof_verification: cp.verify_done - cp.proof_done,
            total: cp.verify_done - cp.start,
        }
    }

    /// field-wise mean of a sum over `trials` trials
    pub fn average(&self, trials: u32) -> Result<Self> {
        if trials == 0 {
            return Err(BenchError::NoTrials);
        }
        let n = f64::from(trials);
        Ok(Self {
            witness_generation: self.witness_generation / n,
            proof_generation: self.proof_generation / n,
            proof_verification: self.proof_verification / n,
            total: self.total / n,
        })
    }

    /// metric name / value pairs in report order
    pub fn metrics(&self) -> [(&'static str, f64); 4] {
        [
            ("witness_generation", self.witness_generation),
            ("proof_generation", self.proof_generation),
            ("proof_verification", self.proof_verification),
            ("total", self.total),
        ]
    }
}

impl Add for TrialTimings {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            witness_generation: self.witness_generation + rhs.witness_generation,
            proof_generation: self.proof_generation + rhs.proof_generation,
            proof_verification: self.proof_verification + rhs.proof_verification,
            total: self.total + rhs.total,
        }
    }
}

impl AddAssign for TrialTimings {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for TrialTimings {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a TrialTimings> for TrialTimings {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timings(w: f64, p: f64, v: f64, t: f64) -> TrialTimings {
        TrialTimings {
            witness_generation: w,
            proof_generation: p,
            proof_verification: v,
            total: t,
        }
    }

    #[test]
    fn test_deltas_from_checkpoints() {
        let cp = Checkpoints {
            start: 0.0,
            witness_done: 2.0,
            proof_done: 5.0,
            verify_done: 6.0,
        };
        assert_eq!(TrialTimings::from_checkpoints(cp), timings(2.0, 3.0, 1.0, 6.0));
    }

    #[test]
    fn test_deltas_ignore_clock_origin() {
        let cp = Checkpoints {
            start: 100.0,
            witness_done: 102.0,
            proof_done: 105.0,
            verify_done: 106.0,
        };
        assert_eq!(TrialTimings::from_checkpoints(cp), timings(2.0, 3.0, 1.0, 6.0));
    }

    #[test]
    fn test_average_of_two_trials() {
        let sum: TrialTimings = [timings(2.0, 3.0, 1.0, 6.0), timings(4.0, 5.0, 1.0, 10.0)]
            .into_iter()
            .sum();
        assert_eq!(sum.average(2).unwrap(), timings(3.0, 4.0, 1.0, 8.0));
    }

    #[test]
    fn test_average_zero_trials_is_error() {
        let sum = timings(1.0, 1.0, 1.0, 3.0);
        assert!(matches!(sum.average(0), Err(BenchError::NoTrials)));
    }

    #[test]
    fn test_add_assign_matches_add() {
        let a = timings(1.0, 2.0, 3.0, 6.0);
        let b = timings(0.5, 0.25, 0.125, 0.875);
        let mut c = a;
        c += b;
        assert_eq!(c, a + b);
    }

    #[test]
    fn test_metrics_order() {
        let names: Vec<_> = TrialTimings::ZERO.metrics().iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            ["witness_generation", "proof_generation", "proof_verification", "total"]
        );
    }
}
