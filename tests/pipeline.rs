//! End-to-end pipeline runs against in-process fetchers and an in-memory store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use bizacquire::models::{BusinessRecord, Category, ParserKind, SourceDefinition};
use bizacquire::repository::{
    persist_records, BusinessStore, PersistenceError, StoredBusiness, UpsertOutcome,
};
use bizacquire::scrapers::{
    deduplicate, FetchError, FetchStrategy, FetchStrategyResolver, PageFetcher, Pipeline,
    PolitenessConfig, RunState,
};

const LOCALITY: &str = "Wellingborough, Northamptonshire";

const CARDS_URL: &str = "https://cards.example/directory";
const TABLE_URL: &str = "https://table.example/town";
const BLOCKS_URL: &str = "https://blocks.example/in/town";
const MISSING_URL: &str = "https://gone.example/";
const BLANK_URL: &str = "https://blank.example/";

const CARDS_HTML: &str = r#"<html><body>
    <div class="business-card"><h3>Joe's Cafe</h3><p>Best coffee in town</p><p>Tel: 01933 123456</p></div>
</body></html>"#;

const TABLE_HTML: &str = r#"<html><body><table>
    <tr><th>Company Name</th><th>Details</th></tr>
    <tr><td>ABC Motors</td><td>Used cars and servicing, 12 High Street, Wellingborough NN8 1AB</td></tr>
</table></body></html>"#;

const BLOCKS_HTML: &str = r#"<html><body>
    <div class="listing"><h3>abc motors</h3><p>12 HIGH STREET, WELLINGBOROUGH NN8 1AB</p></div>
    <div class="listing"><h3>Nene Valley Bakery</h3><p>Tel: 01933 555666</p></div>
</body></html>"#;

/// Serves fixed pages; anything else is a 404. Optionally raises a stop flag
/// once it has served a page.
struct FixtureFetcher {
    label: &'static str,
    pages: HashMap<&'static str, &'static str>,
    stop_after_fetch: Option<Arc<AtomicBool>>,
}

impl FixtureFetcher {
    fn new(label: &'static str, pages: &[(&'static str, &'static str)]) -> Arc<Self> {
        Arc::new(Self {
            label,
            pages: pages.iter().copied().collect(),
            stop_after_fetch: None,
        })
    }
}

#[async_trait]
impl PageFetcher for FixtureFetcher {
    fn name(&self) -> &str {
        self.label
    }

    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if let Some(ref stop) = self.stop_after_fetch {
            stop.store(true, Ordering::SeqCst);
        }
        self.pages
            .get(url)
            .map(|html| html.to_string())
            .ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

/// Rendering service that rejects every request, like a revoked credential.
struct UnauthorizedRenderer;

#[async_trait]
impl PageFetcher for UnauthorizedRenderer {
    fn name(&self) -> &str {
        "rendering"
    }

    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        Err(FetchError::Status {
            url: url.to_string(),
            status: 401,
        })
    }
}

fn source(id: &str, url: &str, parser: ParserKind) -> SourceDefinition {
    SourceDefinition::new(id, id, url, parser).rendered(true)
}

fn all_pages() -> Vec<(&'static str, &'static str)> {
    vec![
        (CARDS_URL, CARDS_HTML),
        (TABLE_URL, TABLE_HTML),
        (BLOCKS_URL, BLOCKS_HTML),
        (BLANK_URL, "  \n  "),
    ]
}

fn pipeline(resolver: FetchStrategyResolver, sources: Vec<SourceDefinition>) -> Pipeline {
    Pipeline::new(resolver, sources, LOCALITY).with_politeness(PolitenessConfig::none())
}

#[derive(Default)]
struct MemoryStore {
    rows: Mutex<Vec<StoredBusiness>>,
}

#[async_trait]
impl BusinessStore for MemoryStore {
    async fn find_existing(
        &self,
        name: &str,
        address_prefix: &str,
    ) -> Result<Option<StoredBusiness>, PersistenceError> {
        let first_word = name.split_whitespace().next().unwrap_or(name);
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .find(|b| {
                b.record.name == name
                    || (b.record.address.contains(address_prefix)
                        && b.record.name.contains(first_word))
            })
            .cloned())
    }

    async fn upsert(&self, record: &BusinessRecord) -> Result<UpsertOutcome, PersistenceError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(existing) = rows
            .iter()
            .find(|b| b.record.name == record.name && b.record.address == record.address)
        {
            return Ok(UpsertOutcome::Skipped {
                existing_id: existing.id.clone(),
            });
        }
        let id = format!("biz-{}", rows.len() + 1);
        rows.push(StoredBusiness {
            id: id.clone(),
            slug: record.name.to_lowercase().replace(' ', "-"),
            status: "ACTIVE".to_string(),
            created_at: Utc::now(),
            record: record.clone(),
        });
        Ok(UpsertOutcome::Created { id })
    }
}

/// Delegates to a [`MemoryStore`] but refuses to write one business.
struct RefusingStore {
    inner: MemoryStore,
    refuse: &'static str,
}

#[async_trait]
impl BusinessStore for RefusingStore {
    async fn find_existing(
        &self,
        name: &str,
        address_prefix: &str,
    ) -> Result<Option<StoredBusiness>, PersistenceError> {
        self.inner.find_existing(name, address_prefix).await
    }

    async fn upsert(&self, record: &BusinessRecord) -> Result<UpsertOutcome, PersistenceError> {
        if record.name == self.refuse {
            return Err(PersistenceError::Database("disk I/O error".to_string()));
        }
        self.inner.upsert(record).await
    }
}

#[tokio::test]
async fn business_card_through_rendered_fetch() {
    let resolver = FetchStrategyResolver::with_rendering(
        FixtureFetcher::new("rendering", &all_pages()),
        FixtureFetcher::new("direct", &[]),
    );
    let mut run = pipeline(resolver, vec![source("cards", CARDS_URL, ParserKind::Cards)]);

    let report = run.run().await;

    assert_eq!(report.state, RunState::Completed);
    assert_eq!(run.state(), RunState::Completed);
    assert_eq!(report.sources[0].strategy, Some(FetchStrategy::Rendered));
    assert_eq!(report.records.len(), 1);

    let joes = &report.records[0];
    assert_eq!(joes.name, "Joe's Cafe");
    assert_eq!(joes.category, Category::FoodAndDrink);
    assert_eq!(joes.phone.as_deref(), Some("01933 123456"));
    assert_eq!(joes.address, LOCALITY);
    assert_eq!(joes.source, "cards");
}

#[tokio::test]
async fn rejected_rendering_falls_back_to_direct() {
    let resolver = FetchStrategyResolver::with_rendering(
        Arc::new(UnauthorizedRenderer),
        FixtureFetcher::new("direct", &all_pages()),
    );
    let mut run = pipeline(resolver, vec![source("cards", CARDS_URL, ParserKind::Cards)]);

    let report = run.run().await;

    assert_eq!(report.state, RunState::Completed);
    assert_eq!(report.sources[0].strategy, Some(FetchStrategy::Direct));
    assert_eq!(report.records[0].name, "Joe's Cafe");
}

#[tokio::test]
async fn without_rendering_every_source_is_direct() {
    let resolver = FetchStrategyResolver::direct_only(FixtureFetcher::new("direct", &all_pages()));
    let mut run = pipeline(
        resolver,
        vec![
            source("cards", CARDS_URL, ParserKind::Cards),
            source("magnet", TABLE_URL, ParserKind::Table),
        ],
    );

    let report = run.run().await;

    assert!(report
        .sources
        .iter()
        .all(|s| s.strategy == Some(FetchStrategy::Direct)));
}

#[tokio::test]
async fn failing_source_does_not_stop_the_run() {
    let resolver = FetchStrategyResolver::with_rendering(
        Arc::new(UnauthorizedRenderer),
        FixtureFetcher::new("direct", &all_pages()),
    );
    let mut run = pipeline(
        resolver,
        vec![
            source("gone", MISSING_URL, ParserKind::Blocks),
            source("cards", CARDS_URL, ParserKind::Cards),
        ],
    );

    let report = run.run().await;

    assert_eq!(report.state, RunState::PartiallyFailed);
    let failed: Vec<_> = report.failed_sources().map(|s| s.source_id.as_str()).collect();
    assert_eq!(failed, vec!["gone"]);
    let error = report.sources[0].error.as_deref().unwrap();
    assert!(error.contains("401"));
    assert!(error.contains("404"));

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].source, "cards");
}

#[tokio::test]
async fn unparseable_sources_do_not_stop_the_run() {
    let resolver = FetchStrategyResolver::direct_only(FixtureFetcher::new("direct", &all_pages()));
    let mut bad_override = source("bad-selectors", CARDS_URL, ParserKind::Cards);
    bad_override.selectors = vec!["div[".to_string()];
    let mut run = pipeline(
        resolver,
        vec![
            source("blank", BLANK_URL, ParserKind::Blocks),
            source("cards", CARDS_URL, ParserKind::Cards),
            bad_override,
            source("magnet", TABLE_URL, ParserKind::Table),
        ],
    );

    let report = run.run().await;

    assert_eq!(report.state, RunState::PartiallyFailed);
    let failed: Vec<_> = report.failed_sources().map(|s| s.source_id.as_str()).collect();
    assert_eq!(failed, vec!["blank", "bad-selectors"]);
    assert!(report.sources[0].error.as_deref().unwrap().contains("empty"));
    assert!(report.sources[2].error.as_deref().unwrap().contains("div["));

    let names: Vec<_> = report.records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Joe's Cafe", "ABC Motors"]);
}

#[tokio::test]
async fn duplicate_across_sources_is_kept_once() {
    let resolver = FetchStrategyResolver::direct_only(FixtureFetcher::new("direct", &all_pages()));
    let mut run = pipeline(
        resolver,
        vec![
            source("magnet", TABLE_URL, ParserKind::Table),
            source("northampton", BLOCKS_URL, ParserKind::Blocks),
        ],
    );

    let report = run.run().await;

    let names: Vec<_> = report.records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["ABC Motors", "Nene Valley Bakery"]);

    let abc = &report.records[0];
    assert_eq!(abc.source, "magnet");
    assert_eq!(abc.category, Category::Automotive);
    assert_eq!(abc.address, "12 High Street, Wellingborough NN8 1AB");
    assert_eq!(abc.postcode.as_deref(), Some("NN8 1AB"));

    assert_eq!(report.sources[0].records, 1);
    assert_eq!(report.sources[1].records, 2);
}

#[tokio::test]
async fn disabled_sources_are_not_fetched() {
    let resolver = FetchStrategyResolver::direct_only(FixtureFetcher::new("direct", &all_pages()));
    let mut disabled = source("magnet", TABLE_URL, ParserKind::Table);
    disabled.enabled = false;

    let mut run = pipeline(resolver, vec![disabled, source("cards", CARDS_URL, ParserKind::Cards)]);
    let report = run.run().await;

    assert_eq!(report.sources.len(), 1);
    assert_eq!(report.sources[0].source_id, "cards");
}

#[tokio::test]
async fn stop_flag_ends_run_between_sources() {
    let stop = Arc::new(AtomicBool::new(false));
    let direct = Arc::new(FixtureFetcher {
        label: "direct",
        pages: all_pages().into_iter().collect(),
        stop_after_fetch: Some(stop.clone()),
    });
    let mut run = pipeline(
        FetchStrategyResolver::direct_only(direct),
        vec![
            source("cards", CARDS_URL, ParserKind::Cards),
            source("magnet", TABLE_URL, ParserKind::Table),
        ],
    )
    .with_stop_flag(stop);

    let report = run.run().await;

    // The in-flight source finishes; the next one is never started.
    assert!(report.stopped_early);
    assert_eq!(report.sources.len(), 1);
    assert_eq!(report.sources[0].source_id, "cards");
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.state, RunState::Completed);
}

#[tokio::test]
async fn stop_before_run_skips_everything() {
    let resolver = FetchStrategyResolver::direct_only(FixtureFetcher::new("direct", &all_pages()));
    let mut run = pipeline(resolver, vec![source("cards", CARDS_URL, ParserKind::Cards)]);
    run.stop_handle().store(true, Ordering::SeqCst);

    let report = run.run().await;

    assert!(report.stopped_early);
    assert!(report.sources.is_empty());
    assert!(report.records.is_empty());
}

#[tokio::test]
async fn runs_are_deterministic() {
    let sources = vec![
        source("cards", CARDS_URL, ParserKind::Cards),
        source("magnet", TABLE_URL, ParserKind::Table),
        source("northampton", BLOCKS_URL, ParserKind::Blocks),
    ];

    let first = pipeline(
        FetchStrategyResolver::direct_only(FixtureFetcher::new("direct", &all_pages())),
        sources.clone(),
    )
    .run()
    .await;
    let second = pipeline(
        FetchStrategyResolver::direct_only(FixtureFetcher::new("direct", &all_pages())),
        sources,
    )
    .run()
    .await;

    assert_eq!(first.records, second.records);
    assert_eq!(first.category_summary(), second.category_summary());
}

#[tokio::test]
async fn aggregate_is_already_deduplicated() {
    let resolver = FetchStrategyResolver::direct_only(FixtureFetcher::new("direct", &all_pages()));
    let mut run = pipeline(
        resolver,
        vec![
            source("magnet", TABLE_URL, ParserKind::Table),
            source("northampton", BLOCKS_URL, ParserKind::Blocks),
        ],
    );

    let report = run.run().await;
    assert_eq!(deduplicate(report.records.clone()), report.records);
}

#[tokio::test]
async fn persisting_a_run_twice_creates_nothing_new() {
    let resolver = FetchStrategyResolver::direct_only(FixtureFetcher::new("direct", &all_pages()));
    let mut run = pipeline(
        resolver,
        vec![
            source("cards", CARDS_URL, ParserKind::Cards),
            source("magnet", TABLE_URL, ParserKind::Table),
            source("northampton", BLOCKS_URL, ParserKind::Blocks),
        ],
    );
    let report = run.run().await;
    let store = MemoryStore::default();

    let first = persist_records(&store, &report.records).await;
    assert_eq!(first.created, report.records.len());
    assert_eq!(first.skipped, 0);

    let second = persist_records(&store, &report.records).await;
    assert_eq!(second.created, 0);
    assert_eq!(second.skipped, report.records.len());
    assert_eq!(store.rows.lock().unwrap().len(), report.records.len());
}

#[tokio::test]
async fn one_failed_write_does_not_block_the_batch() {
    let resolver = FetchStrategyResolver::direct_only(FixtureFetcher::new("direct", &all_pages()));
    let mut run = pipeline(
        resolver,
        vec![
            source("cards", CARDS_URL, ParserKind::Cards),
            source("magnet", TABLE_URL, ParserKind::Table),
            source("northampton", BLOCKS_URL, ParserKind::Blocks),
        ],
    );
    let report = run.run().await;
    assert_eq!(report.records.len(), 3);

    let store = RefusingStore {
        inner: MemoryStore::default(),
        refuse: "ABC Motors",
    };
    let persisted = persist_records(&store, &report.records).await;

    assert_eq!(persisted.failed, 1);
    assert_eq!(persisted.created, 2);
    assert_eq!(persisted.skipped, 0);

    let stored: Vec<_> = store
        .inner
        .rows
        .lock()
        .unwrap()
        .iter()
        .map(|b| b.record.name.clone())
        .collect();
    assert_eq!(stored, vec!["Joe's Cafe", "Nene Valley Bakery"]);
}
