//! End-to-end harvest runs against a scripted provider and a real store file

use async_trait::async_trait;
use gazetteer_domain::{Group, HarvestStore, PutOutcome, Record, StoreDocument, Unit};
use gazetteer_extractor::PromptBuilder;
use gazetteer_harvester::{read_report, HarvestEngine, HarvestError, HarvesterConfig, UnitState};
use gazetteer_llm::{MockProvider, QueryClient, QueryConfig, RateLimiter};
use gazetteer_store::JsonFileStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
    provider: MockProvider,
    config: HarvesterConfig,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = HarvesterConfig {
            export_dir: dir.path().join("exports"),
            failure_report: Some(dir.path().join("failed.json")),
            ..HarvesterConfig::default()
        };
        Self {
            dir,
            provider: MockProvider::new("I don't know."),
            config,
        }
    }

    fn store_path(&self) -> PathBuf {
        self.dir.path().join("store.json")
    }

    fn report_path(&self) -> &Path {
        self.config.failure_report.as_deref().unwrap()
    }

    fn prompts(&self) -> PromptBuilder {
        PromptBuilder::new(self.config.prompts.clone(), self.config.batch_size)
    }

    fn groups(&self, names: &[&str]) {
        self.provider.add_response(self.prompts().groups(), names_json(names));
    }

    fn units(&self, group: &str, names: &[&str]) {
        let group = Group::new(group).unwrap();
        self.provider.add_response(self.prompts().units(&group), names_json(names));
    }

    fn batch(&self, group: &str, unit: &str, batch: usize, response: impl Into<String>) {
        self.provider
            .add_response(self.prompts().records(&unit_of(group, unit), batch), response);
    }

    fn engine(&self) -> HarvestEngine<MockProvider, JsonFileStore> {
        HarvestEngine::new(client(&self.provider), JsonFileStore::new(self.store_path()), self.config.clone())
            .unwrap()
    }
}

fn client(provider: &MockProvider) -> QueryClient<MockProvider> {
    QueryClient::new(
        provider.clone(),
        Arc::new(RateLimiter::per_minute(1000)),
        QueryConfig::default(),
    )
}

fn unit_of(group: &str, unit: &str) -> Unit {
    Group::new(group).unwrap().unit(unit).unwrap()
}

fn names_json(names: &[&str]) -> String {
    serde_json::to_string(names).unwrap()
}

/// A fenced, chatty batch of `count` sources named `<prefix> <n>`
fn sources(prefix: &str, count: usize) -> String {
    let items: Vec<String> = (0..count)
        .map(|i| {
            format!(
                "{{\"country\": \"Japan\", \"source_name\": \"{} {}\", \"bucket\": \"Tech\", \"trust_tier\": 2}}",
                prefix, i
            )
        })
        .collect();
    format!("Here are the sources 🔎:\n```json\n[\n{}\n]\n```", items.join(",\n"))
}

fn load(path: &Path) -> StoreDocument {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_end_to_end_short_batch_and_rerun() {
    let fx = Fixture::new();
    fx.groups(&["Asia"]);
    fx.units("Asia", &["Japan"]);
    fx.batch("Asia", "Japan", 1, sources("Alpha", 20));
    fx.batch("Asia", "Japan", 2, sources("Beta", 5));

    let summary = fx.engine().run().await.unwrap();

    assert_eq!(summary.groups_processed, 1);
    assert_eq!(summary.units.len(), 1);
    assert_eq!(summary.units[0].state, UnitState::Complete);
    assert_eq!(summary.units[0].batches, 2);
    assert_eq!(summary.total_records(), 25);
    assert!(summary.is_clean());
    // groups + units + two batches
    assert_eq!(summary.provider_calls, 4);

    let document = load(&fx.store_path());
    let japan = document.unit("Asia", "Japan").unwrap();
    assert_eq!(japan.len(), 25);
    assert_eq!(japan[0].display_name("source_name"), Some("Alpha 0"));
    assert_eq!(japan[24].display_name("source_name"), Some("Beta 4"));
    assert!(fx.dir.path().join("exports").join("osint_sources_Asia.json").exists());
    assert!(!fx.report_path().exists());

    // Second run skips Japan and leaves the store untouched
    let before = std::fs::read(fx.store_path()).unwrap();
    fx.provider.reset_call_count();

    let summary = fx.engine().run().await.unwrap();

    assert_eq!(summary.skipped, 1);
    assert!(summary.units.is_empty());
    assert_eq!(fx.provider.call_count(), 2);
    assert_eq!(std::fs::read(fx.store_path()).unwrap(), before);
}

#[tokio::test]
async fn test_duplicates_across_batches_stop_collection() {
    let fx = Fixture::new();
    fx.groups(&["Asia"]);
    fx.units("Asia", &["Japan"]);
    fx.batch("Asia", "Japan", 1, sources("Alpha", 20));
    // Same names, different case: nothing new
    fx.batch("Asia", "Japan", 2, sources("ALPHA", 20));

    let summary = fx.engine().run().await.unwrap();

    assert_eq!(summary.total_records(), 20);
    assert_eq!(fx.provider.calls_for(&fx.prompts().records(&unit_of("Asia", "Japan"), 3)), 0);
}

#[tokio::test]
async fn test_full_batches_exhaust_max_batches() {
    let mut fx = Fixture::new();
    fx.config.max_batches = 3;
    fx.groups(&["Asia"]);
    fx.units("Asia", &["Japan"]);
    for batch in 1..=3 {
        fx.batch("Asia", "Japan", batch, sources(&format!("Batch{}", batch), 20));
    }

    let summary = fx.engine().run().await.unwrap();

    assert_eq!(summary.units[0].state, UnitState::Exhausted);
    assert_eq!(load(&fx.store_path()).unit("Asia", "Japan").unwrap().len(), 60);
}

#[tokio::test]
async fn test_failed_unit_is_reported_not_persisted_then_retried() {
    let fx = Fixture::new();
    fx.groups(&["Asia"]);
    fx.units("Asia", &["Japan", "Laos"]);
    fx.batch("Asia", "Japan", 1, sources("Alpha", 3));
    fx.batch("Asia", "Laos", 1, "Sorry, I cannot help with that.");

    let summary = fx.engine().run().await.unwrap();

    assert_eq!(summary.succeeded(), 1);
    assert_eq!(summary.count(UnitState::Failed), 1);
    let document = load(&fx.store_path());
    assert!(document.contains("Asia", "Japan"));
    assert!(!document.contains("Asia", "Laos"));

    let report = read_report(fx.report_path()).await.unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].unit, "Laos");
    assert_eq!(report[0].reason, "No JSON array found in response (batch 1)");
    assert_eq!(report[0].raw_response.as_deref(), Some("Sorry, I cannot help with that."));

    // The service recovers; retrying collects Laos and clears the report
    fx.batch("Asia", "Laos", 1, sources("Lao", 4));
    let summary = fx.engine().retry_from_report().await.unwrap();

    assert_eq!(summary.succeeded(), 1);
    assert!(summary.is_clean());
    assert_eq!(load(&fx.store_path()).unit("Asia", "Laos").unwrap().len(), 4);
    assert!(!fx.report_path().exists());
}

#[tokio::test]
async fn test_retry_skips_stored_units_and_keeps_failures() {
    let fx = Fixture::new();
    fx.groups(&["Asia"]);
    fx.units("Asia", &["Japan", "Laos"]);
    fx.batch("Asia", "Japan", 1, sources("Alpha", 3));
    fx.engine().run().await.unwrap();

    // Laos still fails; Japan is already stored
    let entries = vec![
        gazetteer_harvester::FailureEntry::new(&unit_of("Asia", "Japan"), "old", None),
        gazetteer_harvester::FailureEntry::new(&unit_of("Asia", "Laos"), "old", None),
    ];
    fx.provider.reset_call_count();
    let summary = fx.engine().retry(entries).await.unwrap();

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.count(UnitState::Failed), 1);
    assert_eq!(fx.provider.call_count(), 1);
    let report = read_report(fx.report_path()).await.unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].unit, "Laos");
}

#[tokio::test]
async fn test_group_enumeration_failure_is_fatal() {
    let fx = Fixture::new();

    let result = fx.engine().run().await;

    assert!(matches!(result, Err(HarvestError::Enumeration(_))));
    // The store was still initialized
    assert!(load(&fx.store_path()).is_empty());
}

#[tokio::test]
async fn test_unit_enumeration_failure_skips_only_that_group() {
    let fx = Fixture::new();
    fx.groups(&["Asia", "Europe"]);
    fx.provider.add_error(fx.prompts().units(&Group::new("Asia").unwrap()));
    fx.units("Europe", &["France"]);
    fx.batch("Europe", "France", 1, sources("Gallic", 2));

    let summary = fx.engine().run().await.unwrap();

    assert_eq!(summary.groups_processed, 1);
    assert_eq!(summary.group_failures.len(), 1);
    assert_eq!(summary.group_failures[0].group, "Asia");
    assert!(load(&fx.store_path()).contains("Europe", "France"));
}

#[tokio::test]
async fn test_corrupt_store_is_fatal() {
    let fx = Fixture::new();
    std::fs::write(fx.store_path(), "{ truncated").unwrap();
    fx.groups(&["Asia"]);

    let result = fx.engine().run().await;

    assert!(matches!(result, Err(HarvestError::Store(_))));
    assert_eq!(fx.provider.call_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_units_on_the_pool_are_all_stored() {
    let fx = Fixture::new();
    let countries: Vec<String> = (0..12).map(|i| format!("Country {}", i)).collect();
    let names: Vec<&str> = countries.iter().map(String::as_str).collect();
    fx.groups(&["Asia"]);
    fx.units("Asia", &names);
    for country in &countries {
        fx.batch("Asia", country, 1, sources(country, 3));
    }

    let summary = fx.engine().run().await.unwrap();

    assert_eq!(summary.succeeded(), 12);
    let document = load(&fx.store_path());
    assert_eq!(document.unit_count(), 12);
    assert_eq!(document.record_count(), 36);
}

/// Store whose writes always fail
struct ReadOnlyStore;

#[derive(Debug, thiserror::Error)]
#[error("disk full")]
struct DiskFull;

#[async_trait]
impl HarvestStore for ReadOnlyStore {
    type Error = DiskFull;

    async fn load(&self) -> Result<StoreDocument, Self::Error> {
        Ok(StoreDocument::new())
    }

    async fn has(&self, _group: &str, _unit: &str) -> Result<bool, Self::Error> {
        Ok(false)
    }

    async fn put(&self, _group: &str, _unit: &str, _records: Vec<Record>) -> Result<PutOutcome, Self::Error> {
        Err(DiskFull)
    }
}

#[tokio::test]
async fn test_store_write_failure_fails_only_the_unit() {
    let mut fx = Fixture::new();
    fx.config.export_groups = false;
    fx.groups(&["Asia"]);
    fx.units("Asia", &["Japan", "Korea"]);
    fx.batch("Asia", "Japan", 1, sources("Alpha", 3));
    fx.batch("Asia", "Korea", 1, sources("Hangul", 3));

    let engine = HarvestEngine::new(client(&fx.provider), ReadOnlyStore, fx.config.clone()).unwrap();
    let summary = engine.run().await.unwrap();

    assert_eq!(summary.count(UnitState::Failed), 2);
    assert!(summary.failures.iter().all(|f| f.reason.contains("disk full")));
    assert_eq!(read_report(fx.report_path()).await.unwrap().len(), 2);
}

#[test]
fn test_invalid_config_is_rejected() {
    let fx = Fixture::new();
    let config = HarvesterConfig {
        max_workers: 0,
        ..fx.config.clone()
    };
    let result = HarvestEngine::new(client(&fx.provider), JsonFileStore::new(fx.store_path()), config);
    assert!(matches!(result, Err(HarvestError::Config(_))));
}

#[tokio::test]
async fn test_group_export_never_overwrites_the_store() {
    let mut fx = Fixture::new();
    fx.config.export_dir = fx.dir.path().to_path_buf();
    fx.groups(&["Asia", "global"]);
    fx.units("Asia", &["Japan"]);
    fx.units("global", &["Earth"]);
    fx.batch("Asia", "Japan", 1, sources("Alpha", 2));
    fx.batch("global", "Earth", 1, sources("Gaia", 2));

    let store = fx.dir.path().join("osint_sources_global.json");
    let engine = HarvestEngine::new(client(&fx.provider), JsonFileStore::new(&store), fx.config.clone()).unwrap();
    let summary = engine.run().await.unwrap();

    assert_eq!(summary.succeeded(), 2);
    let document = load(&store);
    assert!(document.contains("Asia", "Japan"));
    assert!(document.contains("global", "Earth"));
    assert!(fx.dir.path().join("osint_sources_Asia.json").exists());
}

#[tokio::test]
async fn test_failure_report_on_the_store_file_is_rejected() {
    let mut fx = Fixture::new();
    fx.config.failure_report = Some(fx.store_path());

    let result = HarvestEngine::new(client(&fx.provider), JsonFileStore::new(fx.store_path()), fx.config.clone());
    assert!(matches!(result, Err(HarvestError::Config(_))));
}

#[tokio::test]
async fn test_cjk_source_names_are_collected() {
    let fx = Fixture::new();
    fx.groups(&["Asia"]);
    fx.units("Asia", &["Japan"]);
    fx.batch(
        "Asia",
        "Japan",
        1,
        r#"[{"source_name": "朝日新聞 📰"}, {"source_name": "연합뉴스"}, {"source_name": "NHK World"}]"#,
    );

    let summary = fx.engine().run().await.unwrap();

    assert!(summary.is_clean());
    let document = load(&fx.store_path());
    let names: Vec<_> = document
        .unit("Asia", "Japan")
        .unwrap()
        .iter()
        .filter_map(|r| r.display_name("source_name"))
        .collect();
    assert_eq!(names, vec!["朝日新聞 ", "연합뉴스", "NHK World"]);
}
