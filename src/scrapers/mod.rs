//! Acquisition pipeline for business directories.
//!
//! Fetching (`fetch`, `render`, `http_client`), structural parsing
//! (`parsers`), field extraction (`extract`), categorization (`category`),
//! deduplication (`dedup`) and the run orchestrator (`pipeline`). The
//! geo-places integration (`places`) feeds the same record type.

pub mod category;
pub mod dedup;
pub mod extract;
pub mod fetch;
pub mod http_client;
pub mod parsers;
pub mod pipeline;
pub mod places;
pub mod render;

pub use dedup::{dedup_key, deduplicate};
pub use fetch::{
    DirectFetcher, FetchError, FetchStrategy, FetchStrategyResolver, FetchedPage, PageFetcher,
};
pub use http_client::HttpClient;
pub use parsers::{create_parser, ParseContext, ParseError, SourceParser};
pub use pipeline::{
    summarize_categories, Pipeline, PolitenessConfig, RunReport, RunState, SourceError,
    SourceOutcome,
};
pub use places::{PlacesClient, PlacesError};
pub use render::{RenderOptions, RenderingFetcher, DEFAULT_RENDER_ENDPOINT};
