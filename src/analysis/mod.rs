//! Analysis Module
//!
//! The number-property checks and the orchestrator that fans them out
//! concurrently and joins their outcomes into one record.

pub mod checks;
mod orchestrator;
mod types;

pub use checks::NumberAnalyzer;
pub use orchestrator::{Orchestrator, OrchestratorConfig, DEFAULT_JOIN_TIMEOUT, DEFAULT_MAX_CONCURRENT_CHECKS};
pub use types::{AnalysisError, AnalysisResult, CheckError, CheckKind, CheckResult, NumberProperties, Parity};

use async_trait::async_trait;

/// The four independent property checks over one integer.
///
/// Implementations must be free of shared mutable state: the orchestrator
/// runs all four methods concurrently against the same input.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn is_even(&self, n: i64) -> CheckResult<bool>;

    async fn is_prime(&self, n: i64) -> CheckResult<bool>;

    async fn is_perfect_square(&self, n: i64) -> CheckResult<bool>;

    async fn parity(&self, n: i64) -> CheckResult<Parity>;
}
