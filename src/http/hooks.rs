//! Before/after hook pipeline.
//!
//! # Responsibilities
//! - Keep ordered lists of before- and after-hooks
//! - Run every hook of a stage in registration order
//! - Log and count failures without aborting the stage
//!
//! # Design Decisions
//! - Hooks mutate the shared `Exchange`; a before-hook short-circuits by
//!   writing a response, and the outcome of the stage reports that explicitly
//! - Lists are append-only and frozen once the dispatcher is shared

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};

use crate::http::exchange::Exchange;
use crate::observability::metrics;
use crate::routing::router::panic_message;

/// A callback run around every request.
pub trait Hook: Send + Sync {
    fn run<'a>(&'a self, exchange: &'a mut Exchange) -> BoxFuture<'a, anyhow::Result<()>>;
}

/// Adapter for async functions of the form `fn(&mut Exchange) -> BoxFuture<..>`.
struct AsyncHook<F>(F);

impl<F> Hook for AsyncHook<F>
where
    F: for<'a> Fn(&'a mut Exchange) -> BoxFuture<'a, anyhow::Result<()>> + Send + Sync,
{
    fn run<'a>(&'a self, exchange: &'a mut Exchange) -> BoxFuture<'a, anyhow::Result<()>> {
        (self.0)(exchange)
    }
}

/// Adapter for plain closures that finish without awaiting.
struct SyncHook<F>(F);

impl<F> Hook for SyncHook<F>
where
    F: Fn(&mut Exchange) -> anyhow::Result<()> + Send + Sync,
{
    fn run<'a>(&'a self, exchange: &'a mut Exchange) -> BoxFuture<'a, anyhow::Result<()>> {
        let result = (self.0)(exchange);
        Box::pin(std::future::ready(result))
    }
}

/// Pipeline stage, used for logging and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Before,
    After,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Before => "before",
            Stage::After => "after",
        }
    }
}

/// Result of running the before-hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Nothing was written; run the main branch.
    Continue,
    /// A hook wrote a response; skip the main branch.
    Responded,
}

#[derive(Clone)]
struct NamedHook {
    name: String,
    hook: Arc<dyn Hook>,
}

/// Ordered before/after hooks.
#[derive(Clone, Default)]
pub struct HookPipeline {
    before: Vec<NamedHook>,
    after: Vec<NamedHook>,
}

impl fmt::Debug for HookPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |hooks: &[NamedHook]| hooks.iter().map(|h| h.name.clone()).collect::<Vec<_>>();
        f.debug_struct("HookPipeline")
            .field("before", &names(&self.before))
            .field("after", &names(&self.after))
            .finish()
    }
}

impl HookPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an async before-hook.
    pub fn before<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Exchange) -> BoxFuture<'a, anyhow::Result<()>>
            + Send
            + Sync
            + 'static,
    {
        self.add(Stage::Before, name.into(), Arc::new(AsyncHook(f)))
    }

    /// Append a synchronous before-hook.
    pub fn before_sync<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&mut Exchange) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.add(Stage::Before, name.into(), Arc::new(SyncHook(f)))
    }

    /// Append an async after-hook.
    pub fn after<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Exchange) -> BoxFuture<'a, anyhow::Result<()>>
            + Send
            + Sync
            + 'static,
    {
        self.add(Stage::After, name.into(), Arc::new(AsyncHook(f)))
    }

    /// Append a synchronous after-hook.
    pub fn after_sync<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&mut Exchange) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.add(Stage::After, name.into(), Arc::new(SyncHook(f)))
    }

    /// Append a hook object to a stage.
    pub fn add(&mut self, stage: Stage, name: impl Into<String>, hook: Arc<dyn Hook>) -> &mut Self {
        let entry = NamedHook {
            name: name.into(),
            hook,
        };
        match stage {
            Stage::Before => self.before.push(entry),
            Stage::After => self.after.push(entry),
        }
        self
    }

    pub fn len(&self, stage: Stage) -> usize {
        match stage {
            Stage::Before => self.before.len(),
            Stage::After => self.after.len(),
        }
    }

    /// Run all before-hooks and report whether the main branch should run.
    pub async fn run_before(&self, exchange: &mut Exchange) -> Flow {
        run_all(Stage::Before, &self.before, exchange).await;
        if exchange.responded() {
            Flow::Responded
        } else {
            Flow::Continue
        }
    }

    /// Run all after-hooks.
    pub async fn run_after(&self, exchange: &mut Exchange) {
        run_all(Stage::After, &self.after, exchange).await;
    }
}

/// Run every hook in order; failures and panics are logged and counted,
/// never propagated.
async fn run_all(stage: Stage, hooks: &[NamedHook], exchange: &mut Exchange) -> usize {
    let mut failures = 0;
    for entry in hooks {
        let outcome = AssertUnwindSafe(async { entry.hook.run(exchange).await })
            .catch_unwind()
            .await;
        let error = match outcome {
            Ok(Ok(())) => continue,
            Ok(Err(e)) => format!("{e:#}"),
            Err(panic) => panic_message(panic.as_ref()),
        };
        failures += 1;
        tracing::warn!(
            stage = stage.as_str(),
            hook = %entry.name,
            path = %exchange.path(),
            error = %error,
            "Hook failed"
        );
        metrics::record_hook_failure(stage.as_str());
    }
    failures
}
