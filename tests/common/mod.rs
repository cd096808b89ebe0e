#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use number_analyzer::analysis::{checks, Analyzer, CheckError, CheckKind, CheckResult, Parity};

/// How the scripted prime check behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimeBehavior {
    Real,
    Fail,
    Panic,
    Stall,
}

/// Flips a flag when the future holding it is dropped.
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Analyzer with scripted behavior and call counting.
pub struct MockAnalyzer {
    pub calls: AtomicUsize,
    pub stall_released: Arc<AtomicBool>,
    prime: PrimeBehavior,
    delay: Duration,
    lie_about_parity: bool,
}

impl MockAnalyzer {
    pub fn new(prime: PrimeBehavior) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            stall_released: Arc::new(AtomicBool::new(false)),
            prime,
            delay: Duration::ZERO,
            lie_about_parity: false,
        }
    }

    /// Every check sleeps for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Parity always answers `Odd`.
    pub fn lying_about_parity(mut self) -> Self {
        self.lie_about_parity = true;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl Analyzer for MockAnalyzer {
    async fn is_even(&self, n: i64) -> CheckResult<bool> {
        self.enter().await;
        Ok(checks::is_even(n))
    }

    async fn is_prime(&self, n: i64) -> CheckResult<bool> {
        self.enter().await;
        match self.prime {
            PrimeBehavior::Real => Ok(checks::is_prime(n)),
            PrimeBehavior::Fail => Err(CheckError::Failed {
                check: CheckKind::Prime,
                message: "divisor search overflowed".to_string(),
            }),
            PrimeBehavior::Panic => panic!("prime sieve exploded"),
            PrimeBehavior::Stall => {
                let _flag = DropFlag(self.stall_released.clone());
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(checks::is_prime(n))
            }
        }
    }

    async fn is_perfect_square(&self, n: i64) -> CheckResult<bool> {
        self.enter().await;
        Ok(checks::is_perfect_square(n))
    }

    async fn parity(&self, n: i64) -> CheckResult<Parity> {
        self.enter().await;
        if self.lie_about_parity {
            return Ok(Parity::Odd);
        }
        Ok(checks::parity(n))
    }
}
