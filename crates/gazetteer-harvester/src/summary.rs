//! Run summary collected by the engine

use crate::collector::{UnitOutcome, UnitState};
use crate::report::FailureEntry;
use std::time::Duration;

/// Per-unit line of a [`HarvestSummary`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitReport {
    /// Group name
    pub group: String,
    /// Unit name
    pub unit: String,
    /// Terminal state
    pub state: UnitState,
    /// Records persisted (zero for failed units)
    pub records: usize,
    /// Batches requested
    pub batches: usize,
}

/// A group whose unit list could not be obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupFailure {
    /// Group name
    pub group: String,
    /// What went wrong
    pub reason: String,
}

/// Outcome of a harvest or retry run
#[derive(Debug, Clone, Default)]
pub struct HarvestSummary {
    /// Groups whose units were enumerated
    pub groups_processed: usize,
    /// Groups skipped because enumeration failed
    pub group_failures: Vec<GroupFailure>,
    /// One line per collected unit, in completion order
    pub units: Vec<UnitReport>,
    /// Units skipped because the store already had them
    pub skipped: usize,
    /// Failed units, in the shape of the failure report
    pub failures: Vec<FailureEntry>,
    /// Provider attempts made during the run, retries included
    pub provider_calls: usize,
    /// Wall-clock time of the run
    pub elapsed: Duration,
}

impl HarvestSummary {
    /// Create an empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one unit
    pub fn record_unit(&mut self, outcome: &UnitOutcome) {
        self.units.push(UnitReport {
            group: outcome.unit.group().name().to_string(),
            unit: outcome.unit.name().to_string(),
            state: outcome.state,
            records: if outcome.state.is_success() {
                outcome.records.len()
            } else {
                0
            },
            batches: outcome.batches,
        });
        if let Some(failure) = &outcome.failure {
            self.failures.push(failure.clone());
        }
    }

    /// Record a group whose units could not be enumerated
    pub fn record_group_failure(&mut self, group: impl Into<String>, reason: impl Into<String>) {
        self.group_failures.push(GroupFailure {
            group: group.into(),
            reason: reason.into(),
        });
    }

    /// Units that ended in `state`
    pub fn count(&self, state: UnitState) -> usize {
        self.units.iter().filter(|u| u.state == state).count()
    }

    /// Units whose records were persisted
    pub fn succeeded(&self) -> usize {
        self.units.iter().filter(|u| u.state.is_success()).count()
    }

    /// Records persisted during the run
    pub fn total_records(&self) -> usize {
        self.units.iter().map(|u| u.records).sum()
    }

    /// True when no unit and no group failed
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.group_failures.is_empty()
    }

    /// Generate a summary report
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Harvest Summary".to_string(),
            "===============".to_string(),
            format!("Groups processed: {}", self.groups_processed),
            format!("Units collected: {}", self.units.len()),
            format!("  Complete: {}", self.count(UnitState::Complete)),
            format!("  Exhausted: {}", self.count(UnitState::Exhausted)),
            format!("  Failed: {}", self.count(UnitState::Failed)),
            format!("Units skipped (already stored): {}", self.skipped),
            format!("Records saved: {}", self.total_records()),
            format!("Provider calls: {}", self.provider_calls),
            format!("Elapsed: {:.1}s", self.elapsed.as_secs_f64()),
        ];

        if !self.group_failures.is_empty() {
            lines.push(String::new());
            lines.push("Groups not enumerated:".to_string());
            for failure in &self.group_failures {
                lines.push(format!("  {}: {}", failure.group, failure.reason));
            }
        }

        if !self.failures.is_empty() {
            lines.push(String::new());
            lines.push("Failed units:".to_string());
            for failure in &self.failures {
                lines.push(format!("  {} ({}): {}", failure.unit, failure.group, failure.reason));
            }
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gazetteer_domain::{Group, Record};
    use serde_json::json;

    fn outcome(unit: &str, state: UnitState, records: usize) -> UnitOutcome {
        let unit = Group::new("Asia").unwrap().unit(unit).unwrap();
        if state == UnitState::Failed {
            return UnitOutcome::failed(unit, "No sources collected", 1);
        }
        UnitOutcome {
            unit,
            state,
            records: (0..records)
                .map(|i| Record::from_value(json!({ "source_name": format!("S{}", i) })).unwrap())
                .collect(),
            batches: 2,
            failure: None,
        }
    }

    #[test]
    fn test_empty_summary() {
        let summary = HarvestSummary::new();
        assert_eq!(summary.total_records(), 0);
        assert_eq!(summary.succeeded(), 0);
        assert!(summary.is_clean());
    }

    #[test]
    fn test_record_units() {
        let mut summary = HarvestSummary::new();
        summary.record_unit(&outcome("Japan", UnitState::Complete, 25));
        summary.record_unit(&outcome("Korea", UnitState::Exhausted, 100));
        summary.record_unit(&outcome("Laos", UnitState::Failed, 0));

        assert_eq!(summary.succeeded(), 2);
        assert_eq!(summary.count(UnitState::Failed), 1);
        assert_eq!(summary.total_records(), 125);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].unit, "Laos");
        assert!(!summary.is_clean());
    }

    #[test]
    fn test_summary_text() {
        let mut summary = HarvestSummary::new();
        summary.groups_processed = 1;
        summary.skipped = 4;
        summary.record_unit(&outcome("Japan", UnitState::Complete, 25));
        summary.record_unit(&outcome("Laos", UnitState::Failed, 0));
        summary.record_group_failure("Oceania", "No response");

        let text = summary.summary();
        assert!(text.contains("Groups processed: 1"));
        assert!(text.contains("Units skipped (already stored): 4"));
        assert!(text.contains("Records saved: 25"));
        assert!(text.contains("Oceania: No response"));
        assert!(text.contains("Laos (Asia): No sources collected"));
    }
}
