//! Barriers between the thread calling select and the helper threads.

use std::io;
use std::time::Duration;

use log::{error, warn};
use parking_lot::{Condvar, Mutex};

use super::wakeup::Wakeup;

/// State of a helper thread, checked every time it's released.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum HelperState {
    Active,
    /// No longer needed, exits on the next release.
    Redundant,
}

/// What a helper should do after being released from the [`StartGate`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Release {
    /// Poll with the given timeout.
    Poll(Option<Duration>),
    Exit,
}

/// Releases all idle helpers at the start of a select cycle.
///
/// Every call to `open` starts a new run, a helper waits until the run count
/// differs from the last run it polled in. A helper created in the middle of
/// a cycle takes part from the next run onwards.
#[derive(Debug)]
pub(crate) struct StartGate {
    state: Mutex<StartState>,
    cond: Condvar,
}

#[derive(Debug)]
struct StartState {
    runs: u64,
    timeout: Option<Duration>,
}

impl StartGate {
    pub(crate) fn new() -> StartGate {
        StartGate { state: Mutex::new(StartState { runs: 0, timeout: None }), cond: Condvar::new() }
    }

    /// Current run count.
    pub(crate) fn runs(&self) -> u64 {
        self.state.lock().runs
    }

    /// Start a new run, releasing all waiting helpers.
    pub(crate) fn open(&self, timeout: Option<Duration>) {
        let mut state = self.state.lock();
        state.runs += 1;
        state.timeout = timeout;
        self.cond.notify_all();
    }

    /// Wait for a run after `last_run`.
    pub(crate) fn wait(&self, last_run: &mut u64, helper: &Mutex<HelperState>) -> Release {
        let mut state = self.state.lock();
        while state.runs == *last_run {
            self.cond.wait(&mut state);
        }

        if *helper.lock() == HelperState::Redundant {
            return Release::Exit;
        }
        *last_run = state.runs;
        Release::Poll(state.timeout)
    }
}

/// Counts down the helpers of a select cycle.
///
/// The first helper to finish signals the wakeup so the other pollers, the
/// calling thread's included, return early.
#[derive(Debug)]
pub(crate) struct FinishGate {
    state: Mutex<FinishState>,
    cond: Condvar,
}

#[derive(Debug)]
struct FinishState {
    helpers: usize,
    remaining: usize,
    /// First poll error of the cycle.
    error: Option<io::Error>,
}

impl FinishState {
    fn nobody_finished(&self) -> bool {
        self.remaining == self.helpers
    }
}

impl FinishGate {
    pub(crate) fn new() -> FinishGate {
        FinishGate {
            state: Mutex::new(FinishState { helpers: 0, remaining: 0, error: None }),
            cond: Condvar::new(),
        }
    }

    /// Prepare for a cycle with `helpers` helper threads.
    pub(crate) fn reset(&self, helpers: usize) {
        let mut state = self.state.lock();
        state.helpers = helpers;
        state.remaining = helpers;
    }

    pub(crate) fn helper_finished(&self, wakeup: &Wakeup) {
        let mut state = self.state.lock();
        if state.nobody_finished() {
            signal(wakeup);
        }
        debug_assert!(state.remaining > 0, "more helpers finished than started");
        state.remaining = state.remaining.saturating_sub(1);
        if state.remaining == 0 {
            self.cond.notify_all();
        }
    }

    /// Called by the thread calling select once its own poll returned.
    pub(crate) fn wait_for_helpers(&self, wakeup: &Wakeup) {
        let mut state = self.state.lock();
        if state.nobody_finished() {
            signal(wakeup);
        }
        while state.remaining != 0 {
            self.cond.wait(&mut state);
        }
    }

    /// Record a poll error, only the first of a cycle is kept.
    pub(crate) fn set_error(&self, err: io::Error) {
        let mut state = self.state.lock();
        if state.error.is_none() {
            state.error = Some(err);
        } else {
            warn!("dropping additional error during multi-threaded select: {}", err);
        }
    }

    /// Returns the recorded error, if any.
    pub(crate) fn take_error(&self) -> io::Result<()> {
        match self.state.lock().error.take() {
            Some(err) => {
                Err(io::Error::new(err.kind(), format!("error during multi-threaded select: {}", err)))
            },
            None => Ok(()),
        }
    }
}

fn signal(wakeup: &Wakeup) {
    if let Err(err) = wakeup.signal() {
        error!("error signalling wakeup: {}", err);
    }
}
