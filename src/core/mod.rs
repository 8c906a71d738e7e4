//! Core pipeline machinery
//!
//! Everything between a cleaned backlog and a persisted catalog lives
//! here: ordinal classification, the shared work queue, the credential
//! pool with its rolling budgets, the rate-limit governor, the worker
//! loops, resume planning, and the orchestrator that ties them
//! together.

pub mod classifier;
pub mod enrichment;
pub mod governor;
pub mod orchestrator;
pub mod pool;
pub mod queue;
pub mod resume;
pub mod types;
pub mod worker;
