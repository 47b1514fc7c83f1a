//! running per-backend accumulator

use crate::error::Result;
use crate::timings::TrialTimings;

#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    total: TrialTimings,
    trials: u32,
    failures: u32,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// add one successful trial to the running sum
    pub fn record(&mut self, trial: TrialTimings) {
        self.total += trial;
        self.trials += 1;
    }

    /// count a failed trial; it contributes nothing to the sum
    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    pub fn total(&self) -> TrialTimings {
        self.total
    }

    pub fn trials(&self) -> u32 {
        self.trials
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// simple arithmetic mean over recorded trials
    pub fn mean(&self) -> Result<TrialTimings> {
        self.total.average(self.trials)
    }
}

impl FromIterator<TrialTimings> for Aggregator {
    fn from_iter<I: IntoIterator<Item = TrialTimings>>(iter: I) -> Self {
        let mut agg = Aggregator::new();
        for trial in iter {
            agg.record(trial);
        }
        agg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BenchError;

    #[test]
    fn test_empty_aggregator_has_no_mean() {
        let agg = Aggregator::new();
        assert_eq!(agg.trials(), 0);
        assert!(matches!(agg.mean(), Err(BenchError::NoTrials)));
    }

    #[test]
    fn test_failures_do_not_affect_mean() {
        let mut agg = Aggregator::new();
        agg.record(TrialTimings {
            witness_generation: 1.0,
            proof_generation: 2.0,
            proof_verification: 0.5,
            total: 3.5,
        });
        agg.record_failure();
        agg.record_failure();

        assert_eq!(agg.trials(), 1);
        assert_eq!(agg.failures(), 2);
        assert_eq!(agg.mean().unwrap().total, 3.5);
    }

    #[test]
    fn test_collect_into_aggregator() {
        let agg: Aggregator = (1..=4)
            .map(|i| TrialTimings {
                total: f64::from(i),
                ..TrialTimings::ZERO
            })
            .collect();
        assert_eq!(agg.trials(), 4);
        assert_eq!(agg.total().total, 10.0);
        assert_eq!(agg.mean().unwrap().total, 2.5);
    }
}
