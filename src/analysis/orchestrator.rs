//! Analysis Orchestrator
//!
//! Validates the input, fans the four checks out onto the owned runtime,
//! waits for every one of them to reach a terminal state and folds the
//! outcomes (even, prime, perfect square, parity) into a single result.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{watch, Semaphore};
use tokio::task::{AbortHandle, JoinError, JoinHandle};
use tracing::{debug, error, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use super::types::{AnalysisError, AnalysisResult, CheckError, CheckKind, CheckResult, NumberProperties, Parity};
use super::Analyzer;

/// Ten times the slowest simulated check.
pub const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_CONCURRENT_CHECKS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Wall-clock bound on one analysis, measured from dispatch. Time a check
    /// spends waiting for a permit counts against it, so a saturated pool
    /// surfaces as `TimedOut`. Checks still running afterwards are aborted.
    pub join_timeout: Duration,
    /// Checks allowed to run at once across all in-flight analyses.
    pub max_concurrent_checks: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            join_timeout: DEFAULT_JOIN_TIMEOUT,
            max_concurrent_checks: DEFAULT_MAX_CONCURRENT_CHECKS,
        }
    }
}

type Joined<T> = Result<CheckResult<T>, JoinError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interruption {
    Shutdown,
    Deadline,
}

/// Aborts the dispatched checks if the join is abandoned.
struct AbortOnDrop(Vec<AbortHandle>);

impl AbortOnDrop {
    fn abort_all(&self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.abort_all();
    }
}

pub struct Orchestrator {
    analyzer: Arc<dyn Analyzer>,
    runtime: Handle,
    permits: Arc<Semaphore>,
    join_timeout: Duration,
    shutdown: watch::Sender<bool>,
}

impl Orchestrator {
    pub fn new(analyzer: Arc<dyn Analyzer>, runtime: Handle) -> Self {
        Self::with_config(analyzer, runtime, OrchestratorConfig::default())
    }

    pub fn with_config(analyzer: Arc<dyn Analyzer>, runtime: Handle, config: OrchestratorConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            analyzer,
            runtime,
            permits: Arc::new(Semaphore::new(config.max_concurrent_checks.clamp(1, Semaphore::MAX_PERMITS))),
            join_timeout: config.join_timeout,
            shutdown,
        }
    }

    pub fn join_timeout(&self) -> Duration {
        self.join_timeout
    }

    /// Interrupt every in-flight analysis and refuse new ones.
    pub fn shutdown(&self) {
        if !self.shutdown.send_replace(true) {
            info!("Orchestrator shutting down; in-flight analyses will be cancelled");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Analyze one number.
    ///
    /// Negative input fails with `InvalidInput` before anything is dispatched.
    /// Otherwise all four checks run concurrently and are joined without
    /// failing fast; dropping the returned future aborts the checks.
    pub async fn analyze(&self, number: i64) -> AnalysisResult<NumberProperties> {
        let span = info_span!("analyze", analysis_id = %Uuid::new_v4(), number);
        self.run(number).instrument(span).await
    }

    async fn run(&self, number: i64) -> AnalysisResult<NumberProperties> {
        if number < 0 {
            warn!("Rejecting negative input {}", number);
            return Err(AnalysisError::negative_input());
        }

        let mut shutdown_rx = self.shutdown.subscribe();
        if *shutdown_rx.borrow_and_update() {
            warn!("Orchestrator is shut down; not dispatching checks for {}", number);
            return Err(AnalysisError::Cancelled { number });
        }

        let even = self.dispatch(CheckKind::Even, number, |analyzer, n| async move { analyzer.is_even(n).await });
        let prime = self.dispatch(CheckKind::Prime, number, |analyzer, n| async move { analyzer.is_prime(n).await });
        let square = self.dispatch(CheckKind::PerfectSquare, number, |analyzer, n| async move {
            analyzer.is_perfect_square(n).await
        });
        let parity = self.dispatch(CheckKind::Parity, number, |analyzer, n| async move { analyzer.parity(n).await });

        let guard = AbortOnDrop(vec![
            even.abort_handle(),
            prime.abort_handle(),
            square.abort_handle(),
            parity.abort_handle(),
        ]);
        debug!("Dispatched 4 checks for {}", number);

        let joined = async { tokio::join!(even, prime, square, parity) };
        tokio::pin!(joined);
        // Starts before the permits are acquired; queueing is part of the budget.
        let deadline = tokio::time::sleep(self.join_timeout);
        tokio::pin!(deadline);

        // Interrupted checks are aborted, and the join still waits for them
        // to reach a terminal state.
        let mut interruption = None;
        let (even, prime, square, parity) = loop {
            tokio::select! {
                biased;
                outcomes = &mut joined => break outcomes,
                _ = shutdown_requested(&mut shutdown_rx), if interruption.is_none() => {
                    interruption = Some(Interruption::Shutdown);
                    guard.abort_all();
                }
                _ = &mut deadline, if interruption.is_none() => {
                    interruption = Some(Interruption::Deadline);
                    guard.abort_all();
                }
            }
        };

        match interruption {
            Some(Interruption::Shutdown) => {
                warn!("Analysis of {} interrupted by shutdown", number);
                Err(AnalysisError::Cancelled { number })
            }
            Some(Interruption::Deadline) => {
                warn!("Analysis of {} exceeded {}ms", number, self.join_timeout.as_millis());
                Err(AnalysisError::TimedOut { number, after: self.join_timeout })
            }
            None => {
                let result = fold(number, even, prime, square, parity);
                if result.is_ok() {
                    info!("Successfully analyzed {}", number);
                }
                result
            }
        }
    }

    fn dispatch<T, F, Fut>(&self, check: CheckKind, number: i64, run: F) -> JoinHandle<CheckResult<T>>
    where
        T: Send + 'static,
        F: FnOnce(Arc<dyn Analyzer>, i64) -> Fut,
        Fut: Future<Output = CheckResult<T>> + Send + 'static,
    {
        let permits = self.permits.clone();
        let work = run(self.analyzer.clone(), number);

        self.runtime.spawn(
            async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|_| CheckError::PoolClosed { check })?;
                debug!("{} check started", check);
                work.await
            }
            .instrument(Span::current()),
        )
    }
}

async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    // The sender lives as long as the orchestrator, so this only returns once
    // shutdown is flagged.
    let _ = rx.wait_for(|stop| *stop).await;
}

/// Fold the terminal outcomes in the fixed order even, prime, perfect
/// square, parity: cancellation first, then check failures.
fn fold(
    number: i64,
    even: Joined<bool>,
    prime: Joined<bool>,
    square: Joined<bool>,
    parity: Joined<Parity>,
) -> AnalysisResult<NumberProperties> {
    let cancelled = [
        even.as_ref().err(),
        prime.as_ref().err(),
        square.as_ref().err(),
        parity.as_ref().err(),
    ]
    .into_iter()
    .flatten()
    .any(JoinError::is_cancelled);
    if cancelled {
        warn!("A check for {} was cancelled before completing", number);
        return Err(AnalysisError::Cancelled { number });
    }

    let failed = |cause: CheckError| {
        error!("Check failed for {}: {}", number, cause);
        AnalysisError::CheckFailed { number, cause }
    };

    let even = settle(CheckKind::Even, even).map_err(failed)?;
    let prime = settle(CheckKind::Prime, prime).map_err(failed)?;
    let square = settle(CheckKind::PerfectSquare, square).map_err(failed)?;
    let parity = settle(CheckKind::Parity, parity).map_err(failed)?;

    NumberProperties::assemble(number, even, prime, square, parity).map_err(failed)
}

fn settle<T>(check: CheckKind, joined: Joined<T>) -> CheckResult<T> {
    joined.unwrap_or_else(|err| Err(CheckError::from_join_error(check, err)))
}
