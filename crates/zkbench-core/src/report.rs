//! averaged benchmark output

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::backend::BackendKind;
use crate::error::Result;
use crate::timings::TrialTimings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendSummary {
    pub backend: BackendKind,
    /// successful trials behind the average
    pub trials: u32,
    pub failures: u32,
    pub average: TrialTimings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchReport {
    pub iterations: u32,
    pub summaries: Vec<BackendSummary>,
}

impl BenchReport {
    pub fn summary(&self, kind: BackendKind) -> Option<&BackendSummary> {
        self.summaries.iter().find(|s| s.backend == kind)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for BackendSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} averages ({} trials", self.backend.label(), self.trials)?;
        if self.failures > 0 {
            write!(f, ", {} failed", self.failures)?;
        }
        writeln!(f, "):")?;
        for (name, secs) in self.average.metrics() {
            writeln!(f, "  {:<20} {:>10.4}s", name, secs)?;
        }
        Ok(())
    }
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, summary) in self.summaries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", summary)?;
        }
        Ok(())
    }
}
