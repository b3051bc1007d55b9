//! bizacquire - local business directory acquisition.
//!
//! Fetches public business directories, extracts and categorizes listings,
//! deduplicates them and hands them to a backing store or a CSV export.

#![allow(clippy::should_implement_trait)]

pub mod config;
pub mod export;
pub mod models;
pub mod repository;
pub mod schema;
pub mod scrapers;
