//! Integration tests for catalog-forge
//!
//! These tests verify the interaction between multiple components:
//! full pipeline runs, rate-window pacing, resume planning, and the
//! HTTP enrichment backend against a mock vendor server.

pub mod pipeline_tests;
pub mod rate_limit_tests;
pub mod resume_tests;
