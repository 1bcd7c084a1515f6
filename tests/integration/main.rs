//! Integration tests for scrape-batch
//!
//! These tests run the whole pipeline against wiremock servers and inspect
//! what lands on disk.

mod fetch_tests;
