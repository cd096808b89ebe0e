//! Property Checks
//!
//! Pure arithmetic for the four number properties, and the production
//! [`Analyzer`] that wraps them with simulated work.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::types::{CheckError, CheckKind, CheckResult, Parity};
use super::Analyzer;

// Simulated cost of each check
pub const DELAY_EVEN_CHECK: Duration = Duration::from_millis(10);
pub const DELAY_PRIME_CHECK: Duration = Duration::from_millis(50);
pub const DELAY_SQUARE_CHECK: Duration = Duration::from_millis(20);

/// Divisors tried between two looks at the stop flag.
const STOP_CHECK_STRIDE: u64 = 4096;

/// Exact `floor(sqrt(n))`.
///
/// The f64 estimate is only trusted to be within a step of the root (f64 has
/// 53 bits of mantissa), so it is corrected with u128 products.
pub fn floor_sqrt(n: u64) -> u64 {
    let target = n as u128;
    let mut root = (n as f64).sqrt() as u64;

    while (root as u128) * (root as u128) > target {
        root -= 1;
    }
    while ((root + 1) as u128) * ((root + 1) as u128) <= target {
        root += 1;
    }
    root
}

pub fn is_even(n: i64) -> bool {
    n % 2 == 0
}

/// Trial division by odd divisors up to `floor(sqrt(n))` inclusive.
pub fn is_prime(n: i64) -> bool {
    // Nothing sets the flag, so the search always completes.
    is_prime_interruptible(n, &AtomicBool::new(false)).unwrap_or(false)
}

/// [`is_prime`] that gives up with `None` once `stop` is set.
///
/// The flag is read every [`STOP_CHECK_STRIDE`] divisors, so a search over
/// the ~1.5e9 candidates below `sqrt(i64::MAX)` stops within microseconds.
pub fn is_prime_interruptible(n: i64, stop: &AtomicBool) -> Option<bool> {
    if n <= 1 {
        return Some(false);
    }
    if n == 2 {
        return Some(true);
    }
    if n % 2 == 0 {
        return Some(false);
    }

    let limit = floor_sqrt(n as u64) as i64;
    let mut divisor = 3;
    let mut tried: u64 = 0;
    while divisor <= limit {
        if tried % STOP_CHECK_STRIDE == 0 && stop.load(Ordering::Relaxed) {
            return None;
        }
        if n % divisor == 0 {
            return Some(false);
        }
        divisor += 2;
        tried += 1;
    }
    Some(true)
}

pub fn is_perfect_square(n: i64) -> bool {
    if n < 0 {
        return false;
    }
    if n == 0 || n == 1 {
        return true;
    }
    let root = floor_sqrt(n as u64);
    (root as u128) * (root as u128) == n as u128
}

/// `n % 2` is -1 for negative odd numbers; any nonzero remainder is odd.
pub fn parity(n: i64) -> Parity {
    match n % 2 {
        0 => Parity::Even,
        _ => Parity::Odd,
    }
}

/// Sets the flag when the owning future is dropped, e.g. on task abort.
struct StopOnDrop(Arc<AtomicBool>);

impl Drop for StopOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Production analyzer: the pure checks plus their fixed simulated delays.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberAnalyzer;

impl NumberAnalyzer {
    pub fn new() -> Self {
        Self
    }

    async fn simulate_work(check: CheckKind, duration: Duration) {
        debug!("Simulating {}ms of work for {} check", duration.as_millis(), check);
        tokio::time::sleep(duration).await;
    }

    fn require_non_negative(check: CheckKind, n: i64) -> CheckResult<()> {
        if n < 0 {
            return Err(CheckError::NegativeInput { check, number: n });
        }
        Ok(())
    }
}

#[async_trait]
impl Analyzer for NumberAnalyzer {
    async fn is_even(&self, n: i64) -> CheckResult<bool> {
        Self::require_non_negative(CheckKind::Even, n)?;
        Self::simulate_work(CheckKind::Even, DELAY_EVEN_CHECK).await;
        Ok(is_even(n))
    }

    async fn is_prime(&self, n: i64) -> CheckResult<bool> {
        Self::require_non_negative(CheckKind::Prime, n)?;
        Self::simulate_work(CheckKind::Prime, DELAY_PRIME_CHECK).await;

        // The divisor search is CPU-bound for large n; keep it off the async
        // workers. Aborting a blocking task does not stop it, so the search
        // polls a flag that is set when this future is dropped.
        let stop = Arc::new(AtomicBool::new(false));
        let _stop_on_drop = StopOnDrop(stop.clone());
        let search = tokio::task::spawn_blocking(move || is_prime_interruptible(n, &stop));

        match search.await {
            Ok(Some(prime)) => Ok(prime),
            Ok(None) => Err(CheckError::Failed {
                check: CheckKind::Prime,
                message: "divisor search was stopped".to_string(),
            }),
            Err(err) => Err(CheckError::from_join_error(CheckKind::Prime, err)),
        }
    }

    async fn is_perfect_square(&self, n: i64) -> CheckResult<bool> {
        Self::require_non_negative(CheckKind::PerfectSquare, n)?;
        Self::simulate_work(CheckKind::PerfectSquare, DELAY_SQUARE_CHECK).await;
        Ok(is_perfect_square(n))
    }

    async fn parity(&self, n: i64) -> CheckResult<Parity> {
        Self::require_non_negative(CheckKind::Parity, n)?;
        Ok(parity(n))
    }
}
