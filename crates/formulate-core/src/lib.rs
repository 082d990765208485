//! formulate-core — Question parsing, scoring, and attempt aggregation.
//!
//! This crate defines the test/submission data model, the parsers that turn
//! delimited question payloads into typed answer keys, the partial-credit
//! scorer, and the aggregation and analytics built on top of it.

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod parser;
pub mod payload;
pub mod report;
pub mod results;
pub mod scoring;
pub mod source;
pub mod statistics;
pub mod traits;
