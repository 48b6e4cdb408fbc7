//! Supervised background workers.
//!
//! A [`WorkerHandle`] owns one tokio task started for a specific [`Mode`].
//! The task receives a [`WorkerContext`] and must call
//! [`WorkerContext::should_run`] before every unit of work.  Stopping a
//! worker sets its cancel flag and blocks until the task has finished, so by
//! the time [`WorkerHandle::stop`] returns the worker can no longer touch
//! shared state.
//!
//! ```text
//! spawn ──▶ active = true ──▶ body(ctx) … ──▶ ActiveGuard drop ──▶ active = false
//!                               ▲
//! stop ── cancel = true ────────┘ then block_on(join)
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::state::{Mode, ModeCell};

// ---------------------------------------------------------------------------
// WorkerContext
// ---------------------------------------------------------------------------

/// Cancellation view handed to a worker body.  Cheap to clone.
#[derive(Debug, Clone)]
pub struct WorkerContext {
    mode: ModeCell,
    expected: Mode,
    cancel: Arc<AtomicBool>,
}

impl WorkerContext {
    /// `true` while the worker is still wanted: not cancelled and the
    /// current mode is still the one it was started for.
    pub fn should_run(&self) -> bool {
        !self.cancel.load(Ordering::Acquire) && self.mode.get() == self.expected
    }

    /// A context that is never cancelled by a handle; for driving worker
    /// bodies directly in tests.
    #[cfg(test)]
    pub(crate) fn detached(mode: ModeCell, expected: Mode) -> (Self, Arc<AtomicBool>) {
        let cancel = Arc::new(AtomicBool::new(false));
        (
            Self {
                mode,
                expected,
                cancel: Arc::clone(&cancel),
            },
            cancel,
        )
    }
}

// ---------------------------------------------------------------------------
// WorkerHandle
// ---------------------------------------------------------------------------

/// Clears the active flag when the task ends, however it ends.
struct ActiveGuard(Arc<AtomicBool>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owner of one running worker task.
pub struct WorkerHandle {
    mode: Mode,
    cancel: Arc<AtomicBool>,
    active: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    /// Spawn `body` on `runtime` for `mode`.
    ///
    /// The active flag is set before this returns.
    pub fn spawn<F, Fut>(runtime: &Handle, mode_cell: &ModeCell, mode: Mode, body: F) -> Self
    where
        F: FnOnce(WorkerContext) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = Arc::new(AtomicBool::new(false));
        let active = Arc::new(AtomicBool::new(true));

        let ctx = WorkerContext {
            mode: mode_cell.clone(),
            expected: mode,
            cancel: Arc::clone(&cancel),
        };
        let fut = body(ctx);
        let guard = ActiveGuard(Arc::clone(&active));

        let task = runtime.spawn(async move {
            let _guard = guard;
            fut.await;
        });

        log::debug!("controller: {} worker started", mode.label());
        Self {
            mode,
            cancel,
            active,
            task,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// `true` until the worker body has returned (or panicked).
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Signal the worker to stop and block the calling thread until it has.
    ///
    /// Must not be called from inside the runtime's own worker threads.
    pub fn stop(self, runtime: &Handle) {
        self.cancel.store(true, Ordering::Release);
        match runtime.block_on(self.task) {
            Ok(()) => log::debug!("controller: {} worker stopped", self.mode.label()),
            Err(e) if e.is_panic() => {
                log::error!("controller: {} worker panicked: {e}", self.mode.label())
            }
            Err(e) => log::warn!("controller: {} worker aborted: {e}", self.mode.label()),
        }
    }
}

impl std::fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("mode", &self.mode)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .expect("runtime")
    }

    async fn spin(ctx: WorkerContext) {
        while ctx.should_run() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[test]
    fn stop_joins_and_clears_active_flag() {
        let rt = runtime();
        let cell = ModeCell::new(Mode::VoiceControl);
        let handle = WorkerHandle::spawn(rt.handle(), &cell, Mode::VoiceControl, spin);
        assert!(handle.is_active());

        let active = Arc::clone(&handle.active);
        handle.stop(rt.handle());
        assert!(!active.load(Ordering::Acquire));
    }

    #[test]
    fn mode_change_ends_the_worker() {
        let rt = runtime();
        let cell = ModeCell::new(Mode::GestureControl);
        let handle = WorkerHandle::spawn(rt.handle(), &cell, Mode::GestureControl, spin);

        cell.set(Mode::Menu);
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while handle.is_active() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(!handle.is_active());
        handle.stop(rt.handle());
    }

    #[test]
    fn panicking_worker_is_contained() {
        let rt = runtime();
        let cell = ModeCell::new(Mode::VoiceControl);
        let handle = WorkerHandle::spawn(rt.handle(), &cell, Mode::VoiceControl, |_ctx| async {
            panic!("worker blew up");
        });
        let active = Arc::clone(&handle.active);
        handle.stop(rt.handle());
        assert!(!active.load(Ordering::Acquire));
    }

    #[test]
    fn context_rejects_other_modes() {
        let cell = ModeCell::new(Mode::VoiceControl);
        let (ctx, cancel) = WorkerContext::detached(cell.clone(), Mode::VoiceControl);
        assert!(ctx.should_run());

        cell.set(Mode::GestureControl);
        assert!(!ctx.should_run());

        cell.set(Mode::VoiceControl);
        cancel.store(true, Ordering::Release);
        assert!(!ctx.should_run());
    }
}
