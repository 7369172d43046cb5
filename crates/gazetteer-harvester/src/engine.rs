//! The harvest engine: enumerate, skip, dispatch, persist, report

use crate::collector::{UnitCollector, UnitOutcome, UnitState};
use crate::report::{read_report, remove_report, write_report, FailureEntry};
use crate::{HarvestError, HarvestSummary, HarvesterConfig};
use gazetteer_domain::{Group, HarvestStore, LlmProvider, PutOutcome, Unit};
use gazetteer_extractor::{parse_names, PromptBuilder};
use gazetteer_llm::{QueryClient, QueryOutcome};
use gazetteer_store::{export_group, export_path, paths_collide};
use std::collections::{BTreeSet, HashSet};
use std::fmt::Display;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Drives a full harvest over the group → unit hierarchy
///
/// The engine owns the query client (and through it the shared rate limiter),
/// the store and the configuration. Units are collected on a bounded pool of
/// tasks; batches within a unit are strictly sequential.
///
/// # Examples
///
/// ```no_run
/// use gazetteer_harvester::{HarvestEngine, HarvesterConfig};
/// use gazetteer_llm::{MockProvider, QueryClient, QueryConfig, RateLimiter};
/// use gazetteer_store::JsonFileStore;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let limiter = Arc::new(RateLimiter::per_minute(10));
/// let client = QueryClient::new(MockProvider::new("[]"), limiter, QueryConfig::default());
/// let store = JsonFileStore::new("osint_sources.json");
///
/// let engine = HarvestEngine::new(client, store, HarvesterConfig::default())?;
/// let summary = engine.run().await?;
/// println!("{}", summary.summary());
/// # Ok(())
/// # }
/// ```
pub struct HarvestEngine<L: LlmProvider, S: HarvestStore> {
    client: Arc<QueryClient<L>>,
    store: Arc<S>,
    config: Arc<HarvesterConfig>,
    prompts: Arc<PromptBuilder>,
}

impl<L, S> HarvestEngine<L, S>
where
    L: LlmProvider + 'static,
    S: HarvestStore + 'static,
{
    /// Create an engine
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Config`] if the configuration is invalid or
    /// the failure report would overwrite the store file
    pub fn new(client: QueryClient<L>, store: S, config: HarvesterConfig) -> Result<Self, HarvestError> {
        config.validate().map_err(HarvestError::Config)?;
        if let (Some(report), Some(location)) = (config.failure_report.as_deref(), store.location()) {
            if paths_collide(report, location) {
                return Err(HarvestError::Config(format!(
                    "failure_report {} is the store file",
                    report.display()
                )));
            }
        }
        let prompts = PromptBuilder::new(config.prompts.clone(), config.batch_size);
        Ok(Self {
            client: Arc::new(client),
            store: Arc::new(store),
            config: Arc::new(config),
            prompts: Arc::new(prompts),
        })
    }

    /// The query client
    pub fn client(&self) -> &QueryClient<L> {
        &self.client
    }

    /// The store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The configuration
    pub fn config(&self) -> &HarvesterConfig {
        &self.config
    }

    /// Run a full harvest
    ///
    /// # Errors
    ///
    /// Fatal conditions only: the store cannot be read or written, the group
    /// list cannot be obtained, or the failure report cannot be written.
    /// Failed units and groups are recorded in the returned summary.
    pub async fn run(&self) -> Result<HarvestSummary, HarvestError> {
        let started = Instant::now();
        let calls_before = self.client.attempts();
        let mut summary = HarvestSummary::new();

        self.store.load().await.map_err(store_error)?;

        let groups = self.enumerate_groups().await?;
        info!("Found {} groups", groups.len());

        for group in groups {
            info!("[START] Group: {}", group);

            let units = match self.enumerate_units(&group).await {
                Ok(units) => units,
                Err(reason) => {
                    warn!("[ERROR] Failed to get units for {}: {}", group, reason);
                    summary.record_group_failure(group.name(), reason);
                    continue;
                }
            };
            summary.groups_processed += 1;

            let pending = self.remaining(units, &mut summary).await?;
            let (mut succeeded, mut failed) = (0, 0);
            for outcome in self.dispatch(pending).await {
                if outcome.state.is_success() {
                    succeeded += 1;
                } else {
                    failed += 1;
                }
                summary.record_unit(&outcome);
            }
            info!("[DONE] Group: {} ({} collected, {} failed)", group, succeeded, failed);

            if self.config.export_groups {
                self.export(group.name()).await?;
            }
        }

        match &self.config.failure_report {
            Some(path) if !summary.failures.is_empty() => write_report(path, &summary.failures).await?,
            _ if summary.failures.is_empty() => info!("[REPORT] All units processed successfully!"),
            _ => warn!("{} units failed and no failure report is configured", summary.failures.len()),
        }

        summary.provider_calls = self.client.attempts() - calls_before;
        summary.elapsed = started.elapsed();
        Ok(summary)
    }

    /// Collect the units listed in a failure report again
    ///
    /// Entries already present in the store are skipped. Entries that fail
    /// again form the new report: it is rewritten if non-empty and removed
    /// once every entry has succeeded.
    pub async fn retry(&self, entries: Vec<FailureEntry>) -> Result<HarvestSummary, HarvestError> {
        let started = Instant::now();
        let calls_before = self.client.attempts();
        let mut summary = HarvestSummary::new();

        if entries.is_empty() {
            info!("[INFO] No failed units to retry.");
        }

        let mut seen = HashSet::new();
        let mut units = Vec::new();
        for entry in &entries {
            match entry.to_unit() {
                Ok(unit) if seen.insert(unit.clone()) => units.push(unit),
                Ok(_) => {}
                Err(e) => warn!("Ignoring report entry {:?}: {}", entry, e),
            }
        }

        let pending = self.remaining(units, &mut summary).await?;
        let groups: BTreeSet<String> = pending.iter().map(|u| u.group().name().to_string()).collect();
        summary.groups_processed = groups.len();

        for outcome in self.dispatch(pending).await {
            summary.record_unit(&outcome);
        }

        if self.config.export_groups {
            for group in &groups {
                self.export(group).await?;
            }
        }

        if let Some(path) = &self.config.failure_report {
            if summary.failures.is_empty() {
                remove_report(path).await?;
                info!("[REPORT] All retried units succeeded");
            } else {
                write_report(path, &summary.failures).await?;
            }
        }

        summary.provider_calls = self.client.attempts() - calls_before;
        summary.elapsed = started.elapsed();
        Ok(summary)
    }

    /// Retry the units in the configured failure report
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Config`] if no failure report is configured
    pub async fn retry_from_report(&self) -> Result<HarvestSummary, HarvestError> {
        let path = self
            .config
            .failure_report
            .as_deref()
            .ok_or_else(|| HarvestError::Config("failure_report is not configured".to_string()))?;
        let entries = read_report(path).await?;
        info!("Retrying {} failed units from {}", entries.len(), path.display());
        self.retry(entries).await
    }

    async fn enumerate_groups(&self) -> Result<Vec<Group>, HarvestError> {
        let text = match self.client.ask(&self.prompts.groups()).await {
            QueryOutcome::Answered(text) => text,
            QueryOutcome::Unavailable { reason } => return Err(HarvestError::Enumeration(reason)),
        };
        debug!("Raw groups response: {:?}", text);

        let groups: Vec<Group> = parse_names(&text)
            .map_err(|e| HarvestError::Enumeration(e.to_string()))?
            .into_iter()
            .filter_map(|name| Group::new(name).ok())
            .collect();

        if groups.is_empty() {
            return Err(HarvestError::Enumeration("No groups returned".to_string()));
        }
        Ok(groups)
    }

    async fn enumerate_units(&self, group: &Group) -> Result<Vec<Unit>, String> {
        let text = match self.client.ask(&self.prompts.units(group)).await {
            QueryOutcome::Answered(text) => text,
            QueryOutcome::Unavailable { reason } => return Err(format!("No response: {}", reason)),
        };
        debug!(group = %group, "Raw units response: {:?}", text);

        let names = parse_names(&text).map_err(|e| e.to_string())?;
        Ok(names
            .into_iter()
            .filter_map(|name| group.unit(name).ok())
            .collect())
    }

    /// Drop units the store already holds
    async fn remaining(&self, units: Vec<Unit>, summary: &mut HarvestSummary) -> Result<Vec<Unit>, HarvestError> {
        let document = self.store.load().await.map_err(store_error)?;
        let total = units.len();

        let pending: Vec<Unit> = units
            .into_iter()
            .filter(|unit| {
                let stored = document.contains(unit.group().name(), unit.name());
                if stored {
                    debug!("[INFO] {} already collected, skipping", unit);
                }
                !stored
            })
            .collect();

        summary.skipped += total - pending.len();
        info!("{} units to collect, {} already stored", pending.len(), total - pending.len());
        Ok(pending)
    }

    /// Collect `units` on the worker pool and wait for all of them
    async fn dispatch(&self, units: Vec<Unit>) -> Vec<UnitOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_workers));
        let mut workers = JoinSet::new();
        let mut in_flight = HashSet::new();

        for unit in units {
            in_flight.insert(unit.clone());

            let semaphore = Arc::clone(&semaphore);
            let client = Arc::clone(&self.client);
            let store = Arc::clone(&self.store);
            let config = Arc::clone(&self.config);
            let prompts = Arc::clone(&self.prompts);
            let span = info_span!("unit", path = %unit.path());

            workers.spawn(
                async move {
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(e) => return UnitOutcome::failed(unit, format!("Semaphore error: {}", e), 0),
                    };
                    harvest_unit(&*client, &*store, &prompts, &config, unit).await
                }
                .instrument(span),
            );
        }

        let mut outcomes = Vec::with_capacity(in_flight.len());
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(outcome) => {
                    in_flight.remove(&outcome.unit);
                    outcomes.push(outcome);
                }
                Err(e) => error!("Worker task failed: {}", e),
            }
        }

        // Units whose task died without reporting
        for unit in in_flight {
            outcomes.push(UnitOutcome::failed(unit, "Worker task panicked", 0));
        }
        outcomes
    }

    async fn export(&self, group: &str) -> Result<(), HarvestError> {
        let target = export_path(&self.config.export_dir, &self.config.export_prefix, group);
        let clobbers = |other: Option<&Path>| other.is_some_and(|path| paths_collide(&target, path));
        if clobbers(self.store.location()) || clobbers(self.config.failure_report.as_deref()) {
            warn!(
                "[EXPORT] Skipping {}: {} would overwrite the store or the failure report",
                group,
                target.display()
            );
            return Ok(());
        }

        let document = self.store.load().await.map_err(store_error)?;
        export_group(&document, group, &self.config.export_dir, &self.config.export_prefix)
            .await
            .map_err(store_error)?;
        Ok(())
    }
}

/// Collect one unit and persist it if it produced records
async fn harvest_unit<L, S>(
    client: &QueryClient<L>,
    store: &S,
    prompts: &PromptBuilder,
    config: &HarvesterConfig,
    unit: Unit,
) -> UnitOutcome
where
    L: LlmProvider,
    S: HarvestStore,
{
    let collector = UnitCollector::new(
        client,
        prompts,
        &config.identity_field,
        config.batch_size,
        config.max_batches,
    );
    let outcome = collector.collect(unit).await;
    if !outcome.state.is_success() {
        return outcome;
    }

    let group = outcome.unit.group().name();
    match store.put(group, outcome.unit.name(), outcome.records.clone()).await {
        Ok(PutOutcome::Inserted) => outcome,
        Ok(PutOutcome::AlreadyPresent) => {
            info!("[INFO] {} already collected, skipping save.", outcome.unit);
            outcome
        }
        Err(e) => {
            error!("Failed to save {}: {}", outcome.unit, e);
            UnitOutcome {
                state: UnitState::Failed,
                failure: Some(FailureEntry::new(
                    &outcome.unit,
                    format!("Store write failed: {}", e),
                    None,
                )),
                records: Vec::new(),
                ..outcome
            }
        }
    }
}

fn store_error(e: impl Display) -> HarvestError {
    HarvestError::Store(e.to_string())
}
