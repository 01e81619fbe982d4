use std::fmt;
use std::future::Future;

use tokio::runtime::RuntimeFlavor;

/// Async runtime bridge between the async HTTP client and the sync ADBC traits.
///
/// `reqwest` is async, but every ADBC call is blocking. This enum reuses the
/// caller's Tokio runtime when it is multi-threaded (`Handle::try_current()`)
/// and otherwise owns a small multi-threaded runtime. A current-thread
/// runtime cannot host `block_in_place`, so callers on one get an owned
/// runtime too.
pub enum Runtime {
    Handle(tokio::runtime::Handle),
    /// Always `Some` until the runtime is dropped.
    TokioRuntime(Option<tokio::runtime::Runtime>),
}

impl Runtime {
    /// Creates a new runtime instance.
    pub fn new() -> std::io::Result<Self> {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() != RuntimeFlavor::CurrentThread => {
                Ok(Self::Handle(handle))
            }
            _ => {
                let rt = tokio::runtime::Builder::new_multi_thread()
                    .worker_threads(1)
                    .enable_all()
                    .build()?;

                Ok(Self::TokioRuntime(Some(rt)))
            }
        }
    }

    /// Blocks on a future, bridging async calls to sync context.
    ///
    /// Called from inside an async context, an owned runtime is driven from
    /// a helper thread, since a runtime cannot be entered from within another.
    pub fn block_on<F>(&self, fut: F) -> F::Output
    where
        F: Future + Send,
        F::Output: Send,
    {
        match self {
            Runtime::Handle(handle) => tokio::task::block_in_place(|| handle.block_on(fut)),
            Runtime::TokioRuntime(Some(runtime)) => {
                if tokio::runtime::Handle::try_current().is_err() {
                    return runtime.block_on(fut);
                }
                std::thread::scope(|s| match s.spawn(|| runtime.block_on(fut)).join() {
                    Ok(output) => output,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
            }
            Runtime::TokioRuntime(None) => unreachable!("runtime used after drop"),
        }
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        // Dropping a runtime waits for its blocking pool, which is not
        // allowed inside an async context.
        if let Runtime::TokioRuntime(slot) = self
            && let Some(runtime) = slot.take()
            && tokio::runtime::Handle::try_current().is_ok()
        {
            runtime.shutdown_background();
        }
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Runtime::Handle(_) => f.write_str("Runtime::Handle(...)"),
            Runtime::TokioRuntime(_) => f.write_str("Runtime::TokioRuntime(...)"),
        }
    }
}


// Rust guideline compliant 2025-01-02
