//! End-to-end tests for the proxy.
//!
//! These tests run against a live proxy instance listening on the addresses
//! in `tests_e2e::common` (override by pointing the proxy at a matching
//! configuration before running `cargo test --package tests-e2e`).

mod health_checks;
mod load_balancing;
