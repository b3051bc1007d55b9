//! Pipeline orchestrator.
//!
//! Runs every enabled source in declared order: fetch, parse, per-source
//! dedup, then a politeness delay. A failing source is logged and recorded
//! in the report; it never stops the remaining sources. After the last
//! source the aggregate is deduplicated once more.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::dedup::deduplicate;
use super::fetch::{FetchError, FetchStrategy, FetchStrategyResolver};
use super::parsers::{create_parser, ParseContext, ParseError};
use crate::models::{BusinessRecord, Category, SourceDefinition};

/// Why a single source produced nothing.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Delays inserted after each source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolitenessConfig {
    pub direct_delay: Duration,
    /// Longer pause after a rendered fetch, which costs the upstream more.
    pub rendered_delay: Duration,
}

impl PolitenessConfig {
    /// No delays at all; for tests and local fixtures.
    pub fn none() -> Self {
        Self {
            direct_delay: Duration::ZERO,
            rendered_delay: Duration::ZERO,
        }
    }
}

impl Default for PolitenessConfig {
    fn default() -> Self {
        Self {
            direct_delay: Duration::from_millis(1000),
            rendered_delay: Duration::from_millis(3000),
        }
    }
}

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    /// Processing the enabled source at this index.
    Running { source_index: usize },
    /// Every processed source succeeded.
    Completed,
    /// At least one source failed.
    PartiallyFailed,
}

impl RunState {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::PartiallyFailed)
    }
}

/// What happened to one source.
#[derive(Debug, Clone)]
pub struct SourceOutcome {
    pub source_id: String,
    /// Strategy that produced the document, if any did.
    pub strategy: Option<FetchStrategy>,
    /// Records after per-source dedup.
    pub records: usize,
    pub error: Option<String>,
}

impl SourceOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub state: RunState,
    pub sources: Vec<SourceOutcome>,
    /// Aggregate after cross-source dedup, in first-seen order.
    pub records: Vec<BusinessRecord>,
    /// Set when the stop flag ended the run before every source was tried.
    pub stopped_early: bool,
}

impl RunReport {
    pub fn failed_sources(&self) -> impl Iterator<Item = &SourceOutcome> {
        self.sources.iter().filter(|s| !s.succeeded())
    }

    /// Record count per category.
    pub fn category_summary(&self) -> BTreeMap<Category, usize> {
        summarize_categories(&self.records)
    }
}

/// Record count per category.
pub fn summarize_categories(records: &[BusinessRecord]) -> BTreeMap<Category, usize> {
    let mut summary = BTreeMap::new();
    for record in records {
        *summary.entry(record.category).or_insert(0) += 1;
    }
    summary
}

/// Sequential multi-source acquisition run.
pub struct Pipeline {
    resolver: FetchStrategyResolver,
    sources: Vec<SourceDefinition>,
    default_address: String,
    politeness: PolitenessConfig,
    stop: Arc<AtomicBool>,
    state: RunState,
}

impl Pipeline {
    pub fn new(
        resolver: FetchStrategyResolver,
        sources: Vec<SourceDefinition>,
        default_address: &str,
    ) -> Self {
        Self {
            resolver,
            sources,
            default_address: default_address.to_string(),
            politeness: PolitenessConfig::default(),
            stop: Arc::new(AtomicBool::new(false)),
            state: RunState::Idle,
        }
    }

    pub fn with_politeness(mut self, politeness: PolitenessConfig) -> Self {
        self.politeness = politeness;
        self
    }

    /// Share an existing stop flag instead of the pipeline's own.
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    /// Flag that ends the run once the in-flight source completes.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run every enabled source and return the deduplicated aggregate.
    pub async fn run(&mut self) -> RunReport {
        let enabled: Vec<SourceDefinition> =
            self.sources.iter().filter(|s| s.enabled).cloned().collect();
        info!(
            "Starting run over {} source(s) ({} rendering)",
            enabled.len(),
            if self.resolver.has_rendering() {
                "with"
            } else {
                "without"
            }
        );

        let mut outcomes = Vec::with_capacity(enabled.len());
        let mut aggregate = Vec::new();
        let mut stopped_early = false;

        for (index, source) in enabled.iter().enumerate() {
            if self.stop.load(Ordering::SeqCst) {
                warn!("Stop requested; skipping remaining {} source(s)", enabled.len() - index);
                stopped_early = true;
                break;
            }
            self.state = RunState::Running {
                source_index: index,
            };

            info!("[{}] {} ({})", source.id, source.name, source.url);
            let (outcome, delay) = match self.run_source(source).await {
                Ok((records, strategy)) => {
                    info!(
                        "[{}] {} record(s) via {} fetch",
                        source.id,
                        records.len(),
                        strategy.as_str()
                    );
                    let outcome = SourceOutcome {
                        source_id: source.id.clone(),
                        strategy: Some(strategy),
                        records: records.len(),
                        error: None,
                    };
                    aggregate.extend(records);
                    (outcome, self.delay_after(source))
                }
                Err(e) => {
                    error!("[{}] source failed: {}", source.id, e);
                    let outcome = SourceOutcome {
                        source_id: source.id.clone(),
                        strategy: None,
                        records: 0,
                        error: Some(e.to_string()),
                    };
                    (outcome, self.delay_after(source))
                }
            };
            outcomes.push(outcome);

            if index + 1 < enabled.len() && !delay.is_zero() {
                debug!("Waiting {}ms before next source", delay.as_millis());
                tokio::time::sleep(delay).await;
            }
        }

        let before = aggregate.len();
        let records = deduplicate(aggregate);
        info!(
            "Run finished: {} unique record(s) ({} duplicate(s) across sources)",
            records.len(),
            before - records.len()
        );

        self.state = if outcomes.iter().all(SourceOutcome::succeeded) {
            RunState::Completed
        } else {
            RunState::PartiallyFailed
        };

        RunReport {
            state: self.state,
            sources: outcomes,
            records,
            stopped_early,
        }
    }

    /// Fetch, parse and dedup one source.
    pub async fn run_source(
        &self,
        source: &SourceDefinition,
    ) -> Result<(Vec<BusinessRecord>, FetchStrategy), SourceError> {
        let parser = create_parser(source)?;
        let page = self
            .resolver
            .fetch(&source.url, source.requires_rendered_fetch)
            .await?;

        let ctx = ParseContext {
            source,
            default_address: &self.default_address,
        };
        let candidates = parser.parse(&page.html, &ctx)?;
        let found = candidates.len();
        let records = deduplicate(candidates);
        debug!(
            "[{}] {} parser: {} candidate(s), {} after dedup",
            source.id,
            parser.kind().as_str(),
            found,
            records.len()
        );

        Ok((records, page.strategy))
    }

    /// Delay after a source. Any rendering attempt earns the longer pause,
    /// even when the direct fallback produced the document.
    fn delay_after(&self, source: &SourceDefinition) -> Duration {
        if source.requires_rendered_fetch && self.resolver.has_rendering() {
            self.politeness.rendered_delay
        } else {
            self.politeness.direct_delay
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParserKind;
    use crate::scrapers::fetch::PageFetcher;

    struct NoFetch;

    #[async_trait::async_trait]
    impl PageFetcher for NoFetch {
        fn name(&self) -> &str {
            "none"
        }

        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            Err(FetchError::Status {
                url: url.to_string(),
                status: 503,
            })
        }
    }

    fn source(rendered: bool) -> SourceDefinition {
        SourceDefinition::new("s", "S", "https://s.example/", ParserKind::Cards).rendered(rendered)
    }

    #[test]
    fn rendering_attempt_earns_the_longer_delay() {
        let with_rendering = Pipeline::new(
            FetchStrategyResolver::with_rendering(Arc::new(NoFetch), Arc::new(NoFetch)),
            Vec::new(),
            "Town",
        );
        assert_eq!(with_rendering.delay_after(&source(true)), Duration::from_millis(3000));
        assert_eq!(with_rendering.delay_after(&source(false)), Duration::from_millis(1000));

        let direct_only =
            Pipeline::new(FetchStrategyResolver::direct_only(Arc::new(NoFetch)), Vec::new(), "Town");
        assert_eq!(direct_only.delay_after(&source(true)), Duration::from_millis(1000));
    }

    #[test]
    fn category_summary_counts() {
        let records = vec![
            BusinessRecord::new("Joe's Cafe", Category::FoodAndDrink, "", "Town", "s").unwrap(),
            BusinessRecord::new("Pizza Palace", Category::FoodAndDrink, "", "Town", "s").unwrap(),
            BusinessRecord::new("ABC Motors", Category::Automotive, "", "Town", "s").unwrap(),
        ];
        let summary = summarize_categories(&records);
        assert_eq!(summary[&Category::FoodAndDrink], 2);
        assert_eq!(summary[&Category::Automotive], 1);
        assert_eq!(summary.len(), 2);
    }

    #[test]
    fn finished_states() {
        assert!(!RunState::Idle.is_finished());
        assert!(!RunState::Running { source_index: 0 }.is_finished());
        assert!(RunState::Completed.is_finished());
        assert!(RunState::PartiallyFailed.is_finished());
    }
}
