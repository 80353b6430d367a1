//! Process-wide graceful shutdown coordinator
//!
//! The first SIGINT/SIGTERM runs every registered defer function once, in
//! registration order, on a dedicated notifier thread. The process is
//! force-exited if the configured timeout elapses first, or if another
//! termination signal arrives.
//!
//! ```text
//! Idle ──signal #1──► Notifying ──callbacks return──► Completed
//!                        │
//!                        ├── timeout elapsed ──► exit(EXIT_TIMEOUT)
//!  (any state) ──signal #2+──► exit(EXIT_SECOND_SIGNAL)
//! ```
//!
//! The force-exit timer is never cancelled, even after a clean pass. A
//! process that outlives the timeout after shutting down gracefully will
//! still be terminated by it.

use crate::completion::Completion;
use crate::logging::{info, log, Level};
use crate::observer::{ObserverId, Subject};
use crate::signal::TerminationSignal;

use once_cell::sync::OnceCell;
use signal_hook::iterator::Signals;
use std::fmt;
use std::io;
use std::process;
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

/// Exit status when shutdown callbacks overrun the timeout
pub const EXIT_TIMEOUT: i32 = 1;

/// Exit status when a termination signal arrives during shutdown
pub const EXIT_SECOND_SIGNAL: i32 = 2;

/// Process termination primitive; must not be expected to return
pub type ExitFn = Arc<dyn Fn(i32) + Send + Sync>;

static INSTANCE: OnceCell<Arc<ShutdownCoordinator>> = OnceCell::new();

/// Returns the process-wide coordinator, installing it on first call
///
/// Installation subscribes to SIGINT and SIGTERM and starts the listener
/// and notifier threads. Concurrent first callers block until installation
/// finishes and all receive the same instance.
///
/// # Errors
/// Signal registration or thread spawn failure. Nothing is stored in that
/// case, so a later call retries the installation.
pub fn instance() -> io::Result<&'static ShutdownCoordinator> {
    INSTANCE
        .get_or_try_init(ShutdownCoordinator::install)
        .map(|coordinator| &**coordinator)
}

#[derive(Debug, Default)]
struct State {
    /// `None` disables the force-exit timer
    timeout: Option<Duration>,
    signals_received: u32,
    last_signal: Option<TerminationSignal>,
}

pub struct ShutdownCoordinator {
    state: Mutex<State>,
    callbacks: Arc<Subject<()>>,
    completion: Arc<Completion>,
    trigger: SyncSender<()>,
    exit: ExitFn,
}

impl ShutdownCoordinator {
    /// Builds a coordinator that is not wired to OS signals
    ///
    /// Shutdown is started with [`request_shutdown`](Self::request_shutdown).
    /// `exit` replaces `std::process::exit` on both force-exit paths.
    pub fn with_exit(exit: ExitFn) -> io::Result<Self> {
        let (trigger, pending) = mpsc::sync_channel(1);
        let callbacks = Arc::new(Subject::new());
        let completion = Arc::new(Completion::new());

        spawn_notifier(pending, Arc::clone(&callbacks), Arc::clone(&completion))?;

        Ok(ShutdownCoordinator {
            state: Mutex::new(State::default()),
            callbacks,
            completion,
            trigger,
            exit,
        })
    }

    fn install() -> io::Result<Arc<Self>> {
        let mut signals = Signals::new(TerminationSignal::RAW)?;
        let coordinator = Arc::new(Self::with_exit(Arc::new(exit_process))?);

        let listener = Arc::clone(&coordinator);
        thread::Builder::new()
            .name("sigterm-listener".to_string())
            .spawn(move || {
                // Daemon: lives until the process exits.
                for raw in signals.forever() {
                    match TerminationSignal::from_raw(raw) {
                        Some(signal) => listener.handle_signal(signal),
                        None => {
                            let _ = log(Level::Warn, &format!("Ignoring unexpected signal {}", raw));
                        }
                    }
                }
            })?;

        let _ = log(Level::Debug, "Shutdown coordinator installed for SIGINT and SIGTERM");
        Ok(coordinator)
    }

    /// Sets the force-exit deadline armed by the next first signal
    ///
    /// `Duration::ZERO` disables the timer.
    pub fn set_timeout(&self, timeout: Duration) {
        self.lock_state().timeout = (!timeout.is_zero()).then_some(timeout);
    }

    /// Disables the force-exit timer
    pub fn clear_timeout(&self) {
        self.lock_state().timeout = None;
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.lock_state().timeout
    }

    /// Registers a function to run once when shutdown begins
    ///
    /// Functions run synchronously in registration order. Registering the
    /// same function twice runs it twice. Once the first termination signal
    /// has been handled the registration is rejected with a warning.
    pub fn register_defer_func<F>(&self, f: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.register(f);
    }

    /// Like [`register_defer_func`](Self::register_defer_func), returning a
    /// handle that removes the registration
    pub fn register_defer_func_with_cancel<F>(&self, f: F) -> CancelHandle
    where
        F: Fn() + Send + Sync + 'static,
    {
        CancelHandle {
            callbacks: Arc::clone(&self.callbacks),
            id: self.register(f),
        }
    }

    fn register<F>(&self, f: F) -> Option<ObserverId>
    where
        F: Fn() + Send + Sync + 'static,
    {
        // Held across the insert so a registration is ordered entirely
        // before or after the first signal.
        let state = self.lock_state();
        if state.signals_received > 0 {
            drop(state);
            let _ = log(
                Level::Warn,
                "Defer function registered after shutdown started; ignoring it",
            );
            return None;
        }
        Some(self.callbacks.register_observer(move |_: &()| f()))
    }

    /// Starts shutdown as if SIGTERM had been received
    ///
    /// A second request escalates to a forced exit exactly like a second
    /// signal.
    pub fn request_shutdown(&self) {
        self.handle_signal(TerminationSignal::Terminate);
    }

    /// Blocks until every defer function of the shutdown pass has returned
    pub fn wait_for_completion(&self) {
        self.completion.wait();
    }

    /// Bounded [`wait_for_completion`](Self::wait_for_completion); returns
    /// whether the pass completed within `timeout`
    pub fn wait_for_completion_timeout(&self, timeout: Duration) -> bool {
        self.completion.wait_timeout(timeout)
    }

    pub fn is_completed(&self) -> bool {
        self.completion.is_completed()
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.lock_state().signals_received > 0
    }

    pub fn signals_received(&self) -> u32 {
        self.lock_state().signals_received
    }

    pub fn last_signal(&self) -> Option<TerminationSignal> {
        self.lock_state().last_signal
    }

    pub fn registered(&self) -> usize {
        self.callbacks.len()
    }

    /// Advances the state machine for one observed signal
    ///
    /// Counting, arming the timer and handing off to the notifier all
    /// happen under the state lock, so a racing signal or registration sees
    /// either none or all of them. Logging and exiting happen after the lock
    /// is released.
    pub(crate) fn handle_signal(&self, signal: TerminationSignal) {
        let mut state = self.lock_state();
        state.signals_received = state.signals_received.saturating_add(1);
        state.last_signal = Some(signal);

        if state.signals_received > 1 {
            drop(state);
            let _ = info(&format!(
                "Receive signal {} again while shutting down. Force application to exit.",
                signal
            ));
            (self.exit)(EXIT_SECOND_SIGNAL);
            return;
        }

        let armed = state.timeout.map(|timeout| self.arm_force_exit_timer(timeout));
        let handed_off = !matches!(
            self.trigger.try_send(()),
            Err(TrySendError::Disconnected(()))
        );
        drop(state);

        let _ = info(&format!("Receive signal: {}", signal));
        if let Some(Err(e)) = armed {
            let _ = log(Level::Error, &format!("Failed to arm shutdown timeout: {}", e));
        }
        let _ = info("Waiting for gracefully finishing current works before shutdown...");
        if !handed_off {
            let _ = log(Level::Error, "Shutdown notifier thread is gone; defer functions will not run");
        }
    }

    fn arm_force_exit_timer(&self, timeout: Duration) -> io::Result<()> {
        let exit = Arc::clone(&self.exit);
        thread::Builder::new()
            .name("sigterm-timeout".to_string())
            .spawn(move || {
                thread::sleep(timeout);
                let _ = info("Timeout! Force application to exit.");
                exit(EXIT_TIMEOUT);
            })?;
        Ok(())
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ShutdownCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock_state();
        f.debug_struct("ShutdownCoordinator")
            .field("timeout", &state.timeout)
            .field("signals_received", &state.signals_received)
            .field("last_signal", &state.last_signal)
            .field("registered", &self.callbacks.len())
            .field("completed", &self.completion.is_completed())
            .finish()
    }
}

/// Removes a defer function registered with
/// [`ShutdownCoordinator::register_defer_func_with_cancel`]
///
/// Cancelling only affects a shutdown pass that has not started yet; a
/// function already running is never interrupted.
#[must_use = "dropping the handle keeps the registration; call cancel() to remove it"]
#[derive(Debug)]
pub struct CancelHandle {
    callbacks: Arc<Subject<()>>,
    /// `None` when the registration was rejected because shutdown had started
    id: Option<ObserverId>,
}

impl CancelHandle {
    /// Returns `false` if the registration was already removed or never made
    pub fn cancel(self) -> bool {
        match self.id {
            Some(id) => self.callbacks.unregister_observer(id),
            None => false,
        }
    }

    pub fn id(&self) -> Option<ObserverId> {
        self.id
    }
}

fn spawn_notifier(
    pending: Receiver<()>,
    callbacks: Arc<Subject<()>>,
    completion: Arc<Completion>,
) -> io::Result<()> {
    thread::Builder::new()
        .name("sigterm-notifier".to_string())
        .spawn(move || {
            // Err means the coordinator was dropped without a shutdown.
            if pending.recv().is_ok() {
                callbacks.notify_all(&());
                completion.complete();
                let _ = log(Level::Debug, "All defer functions finished");
            }
        })?;
    Ok(())
}

fn exit_process(code: i32) {
    process::exit(code)
}
