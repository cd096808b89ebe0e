//! Analysis Types
//!
//! Result record, check identities and the error taxonomy shared by the
//! analyzer, the orchestrator and the HTTP layer.

use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinError;

/// Parity label of an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Parity::Even => "Even",
            Parity::Odd => "Odd",
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four independent checks, in the order their outcomes are folded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckKind {
    Even,
    Prime,
    PerfectSquare,
    Parity,
}

impl CheckKind {
    pub fn name(&self) -> &'static str {
        match self {
            CheckKind::Even => "even",
            CheckKind::Prime => "prime",
            CheckKind::PerfectSquare => "perfect_square",
            CheckKind::Parity => "parity",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Properties of one analyzed number.
///
/// Only [`NumberProperties::assemble`] builds a record, so `is_even` and
/// `parity` can never disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberProperties {
    number: i64,
    is_even: bool,
    is_prime: bool,
    is_perfect_square: bool,
    parity: Parity,
}

impl NumberProperties {
    /// Build the record from the joined check outputs.
    pub fn assemble(
        number: i64,
        is_even: bool,
        is_prime: bool,
        is_perfect_square: bool,
        parity: Parity,
    ) -> Result<Self, CheckError> {
        if is_even != (parity == Parity::Even) {
            return Err(CheckError::ParityMismatch { number, is_even, parity });
        }
        Ok(Self { number, is_even, is_prime, is_perfect_square, parity })
    }

    pub fn number(&self) -> i64 { self.number }
    pub fn is_even(&self) -> bool { self.is_even }
    pub fn is_prime(&self) -> bool { self.is_prime }
    pub fn is_perfect_square(&self) -> bool { self.is_perfect_square }
    pub fn parity(&self) -> Parity { self.parity }
}

/// Fault raised inside a single check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    #[error("{check} check received negative input {number}")]
    NegativeInput { check: CheckKind, number: i64 },

    #[error("{check} check failed: {message}")]
    Failed { check: CheckKind, message: String },

    #[error("even check reported {is_even} but parity check reported {parity} for {number}")]
    ParityMismatch { number: i64, is_even: bool, parity: Parity },

    #[error("{check} check panicked: {message}")]
    Panicked { check: CheckKind, message: String },

    #[error("worker pool closed before the {check} check could run")]
    PoolClosed { check: CheckKind },
}

impl CheckError {
    /// Map a task that did not return normally: panics keep their payload
    /// message, anything else is reported as a failure.
    pub fn from_join_error(check: CheckKind, err: JoinError) -> Self {
        if !err.is_panic() {
            return CheckError::Failed { check, message: err.to_string() };
        }
        let message = match err.try_into_panic() {
            Ok(payload) => payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic payload".to_string()),
            Err(err) => err.to_string(),
        };
        CheckError::Panicked { check, message }
    }
}

/// Why an analysis did not produce a [`NumberProperties`].
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{message}")]
    InvalidInput { message: String },

    #[error("Analysis interrupted for number: {number}")]
    Cancelled { number: i64 },

    #[error("Analysis timed out for number: {number} after {}ms", .after.as_millis())]
    TimedOut { number: i64, after: Duration },

    #[error("Error during number analysis for {number}")]
    CheckFailed {
        number: i64,
        #[source]
        cause: CheckError,
    },
}

impl AnalysisError {
    pub fn negative_input() -> Self {
        AnalysisError::InvalidInput {
            message: "Input number cannot be negative.".to_string(),
        }
    }

    /// Message of the underlying cause, as reported to callers.
    pub fn details(&self) -> String {
        match self {
            AnalysisError::CheckFailed { cause, .. } => cause.to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, AnalysisError::InvalidInput { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, AnalysisError::Cancelled { .. })
    }
}

pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;
pub type CheckResult<T> = std::result::Result<T, CheckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_properties_serialize_with_wire_names() {
        let props = NumberProperties::assemble(16, true, false, true, Parity::Even).unwrap();
        let json = serde_json::to_value(&props).unwrap();

        assert_eq!(json, serde_json::json!({
            "number": 16,
            "isEven": true,
            "isPrime": false,
            "isPerfectSquare": true,
            "parity": "Even"
        }));
    }

    #[test]
    fn test_assemble_rejects_disagreeing_parity() {
        let err = NumberProperties::assemble(3, true, true, false, Parity::Odd).unwrap_err();
        assert!(matches!(err, CheckError::ParityMismatch { number: 3, .. }));
    }

    #[test]
    fn test_details_use_underlying_cause() {
        let err = AnalysisError::CheckFailed {
            number: 9,
            cause: CheckError::Failed { check: CheckKind::Prime, message: "divisor search overflowed".into() },
        };
        assert_eq!(err.to_string(), "Error during number analysis for 9");
        assert_eq!(err.details(), "prime check failed: divisor search overflowed");

        assert_eq!(AnalysisError::negative_input().details(), "Input number cannot be negative.");
        assert_eq!(
            AnalysisError::Cancelled { number: 4 }.details(),
            "Analysis interrupted for number: 4"
        );
    }

    #[tokio::test]
    async fn test_blocking_panic_maps_to_panicked() {
        let err = tokio::task::spawn_blocking(|| -> bool { panic!("divisor overflow at {}", 3) })
            .await
            .unwrap_err();
        assert_eq!(
            CheckError::from_join_error(CheckKind::Prime, err),
            CheckError::Panicked { check: CheckKind::Prime, message: "divisor overflow at 3".into() }
        );
    }

    #[tokio::test]
    async fn test_cancelled_task_maps_to_failed() {
        let handle = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        handle.abort();
        let err = handle.await.unwrap_err();
        assert!(matches!(
            CheckError::from_join_error(CheckKind::Prime, err),
            CheckError::Failed { check: CheckKind::Prime, .. }
        ));
    }
}
