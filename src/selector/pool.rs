//! Helper threads, each polling one sub-range beyond the first.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, error};
use parking_lot::Mutex;

use super::gate::{HelperState, Release};
use super::sub_poller::SubPoller;
use super::Shared;

#[derive(Debug)]
struct Helper {
    state: Arc<Mutex<HelperState>>,
    poller: Arc<Mutex<SubPoller>>,
    thread: JoinHandle<()>,
}

/// Helper `n` polls sub-range `n + 1`.
#[derive(Debug, Default)]
pub(crate) struct Pool {
    helpers: Vec<Helper>,
    /// Redundant helpers that may not have exited yet.
    retired: Vec<JoinHandle<()>>,
}

impl Pool {
    pub(crate) fn new() -> Pool {
        Pool::default()
    }

    /// Number of active helpers.
    pub(crate) fn len(&self) -> usize {
        self.helpers.len()
    }

    /// Spawn or retire helpers until there are `required` active helpers.
    ///
    /// Must be called before the start gate is opened for the cycle.
    pub(crate) fn adjust(&mut self, required: usize, shared: &Arc<Shared>) -> io::Result<()> {
        self.reap();

        while self.helpers.len() < required {
            let helper = spawn(self.helpers.len(), shared)?;
            self.helpers.push(helper);
        }

        while self.helpers.len() > required {
            if let Some(helper) = self.helpers.pop() {
                debug!("retiring helper thread: index={}", self.helpers.len());
                *helper.state.lock() = HelperState::Redundant;
                self.retired.push(helper.thread);
            }
        }
        Ok(())
    }

    pub(crate) fn pollers(&self) -> impl Iterator<Item = &Arc<Mutex<SubPoller>>> {
        self.helpers.iter().map(|helper| &helper.poller)
    }

    /// Retire all helpers, returning the threads to join once they're
    /// released.
    pub(crate) fn shutdown(&mut self) -> Vec<JoinHandle<()>> {
        for helper in self.helpers.iter() {
            *helper.state.lock() = HelperState::Redundant;
        }
        let mut threads: Vec<JoinHandle<()>> = self.helpers.drain(..).map(|helper| helper.thread).collect();
        threads.append(&mut self.retired);
        threads
    }

    /// Join retired helpers that have exited.
    fn reap(&mut self) {
        let (finished, running): (Vec<_>, Vec<_>) = self.retired.drain(..).partition(|thread| thread.is_finished());
        self.retired = running;
        for thread in finished {
            join(thread);
        }
    }
}

pub(crate) fn join(thread: JoinHandle<()>) {
    let name = thread.thread().name().map(|name| name.to_owned());
    if thread.join().is_err() {
        error!("helper thread panicked: name={:?}", name);
    }
}

fn spawn(index: usize, shared: &Arc<Shared>) -> io::Result<Helper> {
    let state = Arc::new(Mutex::new(HelperState::Active));
    let poller = Arc::new(Mutex::new(SubPoller::new(index + 1)));
    // Takes part from the next opening of the start gate.
    let last_run = shared.start.runs();

    let mut builder = thread::Builder::new().name(format!("{}-{}", shared.config.helper_name, index));
    if let Some(size) = shared.config.helper_stack_size {
        builder = builder.stack_size(size);
    }

    let thread = {
        let shared = Arc::clone(shared);
        let state = Arc::clone(&state);
        let poller = Arc::clone(&poller);
        builder.spawn(move || run(&shared, &state, &poller, last_run))?
    };
    debug!("spawned helper thread: index={}", index);
    Ok(Helper { state, poller, thread })
}

fn run(shared: &Shared, state: &Mutex<HelperState>, poller: &Mutex<SubPoller>, mut last_run: u64) {
    loop {
        let timeout = match shared.start.wait(&mut last_run, state) {
            Release::Poll(timeout) => timeout,
            Release::Exit => break,
        };

        let result = poller.lock().poll(&shared.registry, timeout);
        if let Err(err) = result {
            shared.finish.set_error(err);
        }
        shared.finish.helper_finished(&shared.wakeup);
    }
    debug!("helper thread exiting: range={}", poller.lock().range());
}
