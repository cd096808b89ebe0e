//! Number Analyzer
//!
//! HTTP service reporting whether a non-negative integer is even, prime and
//! a perfect square, plus its parity label:
//! - Four independent checks fanned out concurrently and joined
//! - Typed error taxonomy mapped onto HTTP status codes
//! - Cancellation and join deadlines for in-flight analyses

pub mod analysis;
pub mod config;
pub mod server;
pub mod utils;

// Re-exports for convenience
pub use analysis::{AnalysisError, Analyzer, NumberAnalyzer, NumberProperties, Orchestrator, Parity};
pub use config::ServerConfig;
