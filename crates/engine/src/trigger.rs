//! Periodic due-flag triggers
//!
//! A trigger owns a background timer thread that, while armed, raises a
//! "due" flag every period. Firing only sets the flag; the ingest thread
//! observes and clears it on its next `process` call, so no work ever runs
//! on the timer thread.
//!
//! # Thread Lifecycle
//!
//! - `start()` spawns the timer thread (named `keyhunt-<name>-timer`)
//! - `arm()` restarts the period from now, `disarm()` pauses it
//! - `stop()` (or `Drop`) signals shutdown and joins the thread

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

struct TimerState {
    armed: bool,
    // bumped by arm/disarm so a sleeping timer restarts its period
    generation: u64,
    shutdown: bool,
}

struct Shared {
    name: &'static str,
    period: Duration,
    due: AtomicBool,
    state: Mutex<TimerState>,
    signal: Condvar,
}

impl Shared {
    fn timer_loop(&self) {
        let mut state = self.state.lock();
        loop {
            if state.shutdown {
                break;
            }
            if !state.armed {
                self.signal.wait(&mut state);
                continue;
            }

            let generation = state.generation;
            let deadline = Instant::now() + self.period;
            let mut elapsed = false;
            while !state.shutdown && state.armed && state.generation == generation {
                if self.signal.wait_until(&mut state, deadline).timed_out() {
                    elapsed = true;
                    break;
                }
            }

            if elapsed {
                self.due.store(true, Ordering::Release);
                trace!(target: "keyhunt::trigger", trigger = self.name, "Trigger fired");
            }
        }
    }
}

/// Fixed-period trigger raising an atomic due flag
pub struct PeriodicTrigger {
    shared: Arc<Shared>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl PeriodicTrigger {
    /// Create a disarmed trigger. No thread runs until `start()`.
    pub fn new(name: &'static str, period: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                name,
                period,
                due: AtomicBool::new(false),
                state: Mutex::new(TimerState {
                    armed: false,
                    generation: 0,
                    shutdown: false,
                }),
                signal: Condvar::new(),
            }),
            thread: Mutex::new(None),
        }
    }

    /// Spawn the timer thread. Calling it twice is a no-op.
    pub fn start(&self) -> std::io::Result<()> {
        let mut slot = self.thread.lock();
        if slot.is_some() {
            return Ok(());
        }
        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name(format!("keyhunt-{}-timer", self.shared.name))
            .spawn(move || shared.timer_loop())?;
        *slot = Some(handle);
        Ok(())
    }

    /// Trigger name, used in logs and thread names
    pub fn name(&self) -> &'static str {
        self.shared.name
    }

    /// Firing period
    pub fn period(&self) -> Duration {
        self.shared.period
    }

    /// Start (or restart) the period from now
    pub fn arm(&self) {
        let mut state = self.shared.state.lock();
        if state.shutdown {
            return;
        }
        state.armed = true;
        state.generation = state.generation.wrapping_add(1);
        self.shared.signal.notify_all();
    }

    /// Stop firing until re-armed. A flag already raised stays raised.
    pub fn disarm(&self) {
        let mut state = self.shared.state.lock();
        state.armed = false;
        state.generation = state.generation.wrapping_add(1);
        self.shared.signal.notify_all();
    }

    /// True while the timer is counting down
    pub fn is_armed(&self) -> bool {
        self.shared.state.lock().armed
    }

    /// Raise the due flag now, as if the period had elapsed
    pub fn fire(&self) {
        self.shared.due.store(true, Ordering::Release);
    }

    /// True if the flag is raised
    pub fn is_due(&self) -> bool {
        self.shared.due.load(Ordering::Acquire)
    }

    /// Lower the flag, returning whether it was raised
    pub fn take(&self) -> bool {
        self.shared.due.swap(false, Ordering::AcqRel)
    }

    /// Lower the flag
    pub fn clear(&self) {
        self.shared.due.store(false, Ordering::Release);
    }

    /// Shut the timer thread down and wait for it
    pub fn stop(&self) {
        {
            let mut state = self.shared.state.lock();
            state.shutdown = true;
            state.armed = false;
            self.shared.signal.notify_all();
        }
        let handle = self.thread.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                debug!(target: "keyhunt::trigger", trigger = self.shared.name, "Timer thread panicked");
            }
        }
    }
}

impl Drop for PeriodicTrigger {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for PeriodicTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeriodicTrigger")
            .field("name", &self.shared.name)
            .field("period", &self.shared.period)
            .field("due", &self.is_due())
            .finish()
    }
}
