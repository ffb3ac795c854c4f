// src/monitor.rs
// =============================================================================
// Background connectivity monitor.
//
// While files download, a separate tokio task wakes up every 2 seconds and
// checks that the network is still there (a DNS lookup of a well-known
// host). If a check fails we keep probing until the grace period (--timeout)
// runs out; if the network never comes back we raise the abort signal.
//
// The monitor never touches download state. The only thing it shares with
// the main flow is the AbortSignal, which the main flow checks before every
// network call. A request that is already running is left to finish or fail
// on its own.
//
// With no timeout (or 0) the monitor only logs failed probes.
//
// Rust concepts:
// - tokio::spawn: Runs a future as an independent task
// - Arc<AtomicBool>: A flag shared between tasks without locks
// - Drop: Stops the task automatically when the handle goes away
// =============================================================================

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::FetchError;

/// How often the probe runs
pub const PROBE_INTERVAL: Duration = Duration::from_millis(2000);

#[derive(Debug, Default)]
struct AbortState {
    aborted: AtomicBool,
    grace_ms: AtomicU64,
}

/// Write-once flag raised when connectivity is lost
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    state: Arc<AbortState>,
}

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal. Later calls are ignored.
    pub fn trigger(&self, grace_ms: u64) {
        if self
            .state
            .aborted
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.state.grace_ms.store(grace_ms, Ordering::Release);
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.state.aborted.load(Ordering::Acquire)
    }

    /// Called before each network call
    pub fn check(&self) -> Result<(), FetchError> {
        if self.is_aborted() {
            Err(FetchError::ConnectivityLost {
                grace_ms: self.state.grace_ms.load(Ordering::Acquire),
            })
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MonitorConfig {
    pub interval: Duration,
    /// None disables the forced abort
    pub grace: Option<Duration>,
}

impl MonitorConfig {
    pub fn new(timeout: Option<Duration>) -> Self {
        MonitorConfig {
            interval: PROBE_INTERVAL,
            grace: timeout.filter(|grace| !grace.is_zero()),
        }
    }
}

/// Owns the monitor task; stops it when dropped
#[derive(Debug)]
pub struct MonitorHandle {
    task: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Resolves `host` (host:port); true when at least one address comes back
pub async fn dns_probe(host: String) -> bool {
    match tokio::net::lookup_host(host).await {
        Ok(mut addresses) => addresses.next().is_some(),
        Err(_) => false,
    }
}

/// Starts the monitor task
pub fn spawn<P, Fut>(config: MonitorConfig, mut probe: P, signal: AbortSignal) -> MonitorHandle
where
    P: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = bool> + Send,
{
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if probe().await {
                continue;
            }

            tracing::warn!("connectivity check failed");
            let Some(grace) = config.grace else {
                continue;
            };

            if wait_for_recovery(&mut probe, config.interval, grace).await {
                tracing::info!("connectivity restored");
                continue;
            }

            let grace_ms = u64::try_from(grace.as_millis()).unwrap_or(u64::MAX);
            tracing::error!(grace_ms, "network unreachable, aborting");
            signal.trigger(grace_ms);
            break;
        }
    });

    MonitorHandle { task: Some(task) }
}

// Keeps probing until the deadline; true as soon as one probe succeeds
async fn wait_for_recovery<P, Fut>(probe: &mut P, interval: Duration, grace: Duration) -> bool
where
    P: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + grace;
    loop {
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        tokio::time::sleep(interval.min(deadline - now)).await;
        if probe().await {
            return true;
        }
    }
}
