//! Common test utilities for catalog-forge
//!
//! This module provides shared test infrastructure for all tests:
//! - Scripted enrichment backends with call recording
//! - Factories for backlogs, configurations, and persisted records
//!
//! # Usage
//!
//! ```rust
//! use crate::common::{backends::ScriptedBackend, fixtures::BacklogFactory};
//!
//! #[tokio::test]
//! async fn my_test() {
//!     let backend = ScriptedBackend::always_ok();
//!     let backlog = BacklogFactory::records(5);
//!     // ...
//! }
//! ```


// Re-export commonly used items
pub use backends::{Reply, Route, RoutedBackend, ScriptedBackend};
pub use fixtures::{BacklogFactory, CatalogRecordFactory, ConfigFactory};
