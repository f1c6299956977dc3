//! Fixed-window rate limiting.
//!
//! Each identity gets a counter that lives for one window. A burst straddling
//! a window boundary can see up to `2 × max_attempts` allowed calls in quick
//! succession; that is inherent to fixed windows.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use futures_util::future::BoxFuture;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::RateLimitConfig;
use crate::http::exchange::Exchange;
use crate::http::hooks::Hook;
use crate::observability::metrics;
use crate::routing::reply::error_json;

/// Time source for window bookkeeping.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Instant;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap_or_else(|e| e.into_inner()) += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Counter for one identity within its current window.
#[derive(Debug, Clone, Copy)]
struct RateRecord {
    count: u32,
    /// `None` when the window reaches past what `Instant` can represent.
    reset_at: Option<Instant>,
}

impl RateRecord {
    fn expired(&self, now: Instant) -> bool {
        self.reset_at.is_some_and(|reset_at| now >= reset_at)
    }
}

/// Per-identity attempt counter.
///
/// Records live in a sharded map: a check locks only the shard holding its
/// identity, so the read-increment-write is atomic per identity while other
/// identities proceed in parallel.
pub struct RateLimiter {
    records: DashMap<String, RateRecord>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: DashMap::new(),
            clock,
        }
    }

    /// Record one attempt for `identity`; returns whether it is allowed.
    ///
    /// A missing or expired record starts a fresh window with a count of one.
    /// Inside a live window the call is denied, without counting, once
    /// `max_attempts` is reached.
    pub fn check(&self, identity: &str, max_attempts: u32, window: Duration) -> bool {
        let now = self.clock.now();
        let mut record = self
            .records
            .entry(identity.to_owned())
            .or_insert(RateRecord {
                count: 0,
                reset_at: Some(now),
            });

        if record.expired(now) {
            *record = RateRecord {
                count: 1,
                reset_at: now.checked_add(window),
            };
            return true;
        }

        if record.count >= max_attempts {
            return false;
        }
        record.count += 1;
        true
    }

    /// Forget `identity` immediately (e.g. after a successful login).
    pub fn reset(&self, identity: &str) {
        self.records.remove(identity);
    }

    /// Drop every record whose window has elapsed. Returns how many went.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let before = self.records.len();
        self.records.retain(|_, record| !record.expired(now));
        before.saturating_sub(self.records.len())
    }

    /// Number of tracked identities (live or not yet swept).
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sweep expired records every `interval` until shutdown.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = limiter.sweep();
                        if removed > 0 {
                            tracing::debug!(removed, remaining = limiter.len(), "Swept rate limit records");
                        }
                    }
                    _ = shutdown.recv() => break,
                }
            }
            tracing::debug!("Rate limit sweeper stopped");
        })
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("records", &self.records.len())
            .field("clock", &self.clock)
            .finish()
    }
}

/// Before-hook limiting requests per client address.
pub struct RateLimitHook {
    limiter: Arc<RateLimiter>,
    max_requests: u32,
    window: Duration,
}

impl RateLimitHook {
    pub fn new(limiter: Arc<RateLimiter>, config: &RateLimitConfig) -> Self {
        Self {
            limiter,
            max_requests: config.max_requests,
            window: Duration::from_millis(config.window_ms),
        }
    }

    fn apply(&self, exchange: &mut Exchange) -> anyhow::Result<()> {
        if exchange.responded() {
            return Ok(());
        }

        let key = exchange
            .peer()
            .map(|addr| format!("ip:{}", addr.ip()))
            .unwrap_or_else(|| "ip:unknown".to_string());

        if !self.limiter.check(&key, self.max_requests, self.window) {
            tracing::warn!(client = %key, path = %exchange.path(), "Rate limit exceeded");
            metrics::record_rate_limited("request_limit");
            exchange.respond(error_json(
                axum::http::StatusCode::TOO_MANY_REQUESTS,
                "Too many requests",
            ))?;
        }
        Ok(())
    }
}

impl Hook for RateLimitHook {
    fn run<'a>(&'a self, exchange: &'a mut Exchange) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(std::future::ready(self.apply(exchange)))
    }
}
