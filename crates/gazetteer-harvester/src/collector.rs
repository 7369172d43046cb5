//! Per-unit batch loop

use crate::report::FailureEntry;
use gazetteer_domain::{LlmProvider, Record, Unit};
use gazetteer_extractor::{parse_records, Deduplicator, PromptBuilder};
use gazetteer_llm::{QueryClient, QueryOutcome};
use std::fmt;
use tracing::{debug, info, warn};

/// Lifecycle of one unit inside a run
///
/// ```text
/// Pending → Collecting → Complete | Exhausted | Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitState {
    /// Not started yet
    Pending,
    /// Batches are being requested
    Collecting,
    /// A short batch (or a failed batch after earlier data) ended collection
    Complete,
    /// Every allowed batch came back full
    Exhausted,
    /// Nothing usable was collected
    Failed,
}

impl UnitState {
    /// True for states whose records are persisted
    pub fn is_success(self) -> bool {
        matches!(self, UnitState::Complete | UnitState::Exhausted)
    }

    /// True once the unit can no longer change
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            UnitState::Complete | UnitState::Exhausted | UnitState::Failed
        )
    }
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UnitState::Pending => "pending",
            UnitState::Collecting => "collecting",
            UnitState::Complete => "complete",
            UnitState::Exhausted => "exhausted",
            UnitState::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// What collecting one unit produced
#[derive(Debug, Clone)]
pub struct UnitOutcome {
    /// The unit
    pub unit: Unit,
    /// Terminal state
    pub state: UnitState,
    /// Unique records, in first-seen order
    pub records: Vec<Record>,
    /// Batches requested
    pub batches: usize,
    /// Set iff `state` is [`UnitState::Failed`]
    pub failure: Option<FailureEntry>,
}

impl UnitOutcome {
    /// A unit that failed outside the batch loop
    pub fn failed(unit: Unit, reason: impl Into<String>, batches: usize) -> Self {
        let failure = FailureEntry::new(&unit, reason, None);
        Self {
            unit,
            state: UnitState::Failed,
            records: Vec::new(),
            batches,
            failure: Some(failure),
        }
    }
}

/// Why a batch ended the loop early
struct Stop {
    reason: String,
    raw: Option<String>,
}

/// Collects one unit by requesting batches until it runs dry
pub struct UnitCollector<'a, L: LlmProvider> {
    client: &'a QueryClient<L>,
    prompts: &'a PromptBuilder,
    identity_field: &'a str,
    batch_size: usize,
    max_batches: usize,
}

impl<'a, L: LlmProvider> UnitCollector<'a, L> {
    /// Create a collector
    pub fn new(
        client: &'a QueryClient<L>,
        prompts: &'a PromptBuilder,
        identity_field: &'a str,
        batch_size: usize,
        max_batches: usize,
    ) -> Self {
        Self {
            client,
            prompts,
            identity_field,
            batch_size,
            max_batches,
        }
    }

    /// Run the batch loop for `unit`
    ///
    /// Per batch:
    /// - no answer or an undecodable answer stops the loop
    /// - fewer than `batch_size` new unique records stops the loop
    /// - a full batch continues, up to `max_batches`
    ///
    /// The unit fails only if it ends with zero records.
    pub async fn collect(&self, unit: Unit) -> UnitOutcome {
        info!("[COLLECT] Sources for: {}", unit);

        let mut state = UnitState::Pending;
        advance(&unit, &mut state, UnitState::Collecting);
        let mut dedup = Deduplicator::new(self.identity_field);
        let mut records = Vec::new();
        let mut batches = 0;
        let mut stop = None;

        for batch in 1..=self.max_batches {
            batches = batch;
            let prompt = self.prompts.records(&unit, batch);

            let text = match self.client.ask(&prompt).await {
                QueryOutcome::Answered(text) => text,
                QueryOutcome::Unavailable { reason } => {
                    warn!("[ERROR] Failed to get sources for {}, batch {}: {}", unit, batch, reason);
                    stop = Some(Stop {
                        reason: format!("No response (batch {}): {}", batch, reason),
                        raw: None,
                    });
                    break;
                }
            };
            debug!(unit = %unit.path(), batch, "Raw response:\n{}", text);

            let parsed = match parse_records(&text, self.identity_field) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!("[ERROR] Unusable response for {} (batch {}): {}", unit, batch, e);
                    stop = Some(Stop {
                        reason: format!("{} (batch {})", e, batch),
                        raw: Some(text),
                    });
                    break;
                }
            };

            let fresh = dedup.filter(parsed);
            let unique = fresh.len();
            records.extend(fresh);
            debug!(unit = %unit.path(), batch, unique, total = records.len(), "Batch decoded");

            if unique < self.batch_size {
                if !records.is_empty() {
                    advance(&unit, &mut state, UnitState::Complete);
                }
                break;
            }
            if batch == self.max_batches {
                advance(&unit, &mut state, UnitState::Exhausted);
            }
        }

        if records.is_empty() {
            let (reason, raw) = match stop {
                Some(stop) => (stop.reason, stop.raw),
                None => ("No sources collected".to_string(), None),
            };
            warn!("[ERROR] No sources collected for {}", unit);
            advance(&unit, &mut state, UnitState::Failed);
            let failure = FailureEntry::new(&unit, reason, raw.as_deref());
            return UnitOutcome {
                unit,
                state,
                records,
                batches,
                failure: Some(failure),
            };
        }

        if stop.is_some() {
            // Keep what earlier batches produced
            advance(&unit, &mut state, UnitState::Complete);
        }

        info!(
            "[COLLECT] {} finished: {} ({} records, {} batches)",
            unit,
            state,
            records.len(),
            batches
        );
        UnitOutcome {
            unit,
            state,
            records,
            batches,
            failure: None,
        }
    }
}

/// Move `state` to `next`; terminal states never change again
fn advance(unit: &Unit, state: &mut UnitState, next: UnitState) {
    if state.is_terminal() {
        return;
    }
    debug!(unit = %unit.path(), "{} -> {}", state, next);
    *state = next;
}
