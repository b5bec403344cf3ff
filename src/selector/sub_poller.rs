use std::fmt;
use std::io;
use std::os::unix::io::RawFd;
use std::time::Duration;

use log::trace;
use parking_lot::Mutex;

use super::registry::Registry;
use super::selected::SelectedKeys;
use super::wakeup::Wakeup;
use crate::{sys, RawEvents};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum PollState {
    Idle,
    Polling,
    /// Polled, results not yet processed.
    Done,
}

/// Polls a single sub-range of the poll batch.
///
/// The entries are copied out of the batch at the start of every poll, so
/// registrations can change while the poll is in flight.
pub(crate) struct SubPoller {
    range: usize,
    fds: Vec<libc::pollfd>,
    ready: sys::ReadySets,
    state: PollState,
    /// Error returned by the next poll instead of polling.
    #[cfg(test)]
    fail: Option<io::ErrorKind>,
}

impl SubPoller {
    pub(crate) fn new(range: usize) -> SubPoller {
        SubPoller {
            range,
            fds: Vec::new(),
            ready: sys::ReadySets::default(),
            state: PollState::Idle,
            #[cfg(test)]
            fail: None,
        }
    }

    pub(crate) fn range(&self) -> usize {
        self.range
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> PollState {
        self.state
    }

    #[cfg(test)]
    pub(crate) fn fail_next_poll(&mut self, kind: io::ErrorKind) {
        self.fail = Some(kind);
    }

    /// Poll the sub-range, blocking for at most `timeout`. An empty sub-range
    /// isn't polled.
    pub(crate) fn poll(&mut self, registry: &Mutex<Option<Registry>>, timeout: Option<Duration>) -> io::Result<usize> {
        self.state = PollState::Polling;
        self.ready.clear();
        self.fds.clear();
        #[cfg(test)]
        {
            if let Some(kind) = self.fail.take() {
                self.state = PollState::Done;
                return Err(io::Error::new(kind, "injected poll failure"));
            }
        }
        if let Some(registry) = registry.lock().as_ref() {
            self.fds.extend_from_slice(registry.sub_range(self.range));
        }

        let result = if self.fds.is_empty() {
            Ok(0)
        } else {
            trace!("polling sub-range: range={}, descriptors={}, timeout={:?}", self.range, self.fds.len(), timeout);
            sys::poll(&mut self.fds, &mut self.ready, timeout)
        };
        self.state = PollState::Done;
        result
    }

    /// Merge the results of the last poll into the keys and `selected`.
    /// Returns the number of keys updated in cycle `update`.
    pub(crate) fn process_selected_keys(
        &mut self,
        update: u64,
        registry: &mut Registry,
        selected: &mut SelectedKeys,
        wakeup: &Wakeup,
    ) -> usize {
        if self.state != PollState::Done {
            return 0;
        }
        self.state = PollState::Idle;

        let mut processor = Processor { update, registry, selected, wakeup };
        processor.process(&self.ready.readable, RawEvents::READ, false) +
            processor.process(&self.ready.writable, RawEvents::WRITE, false) +
            processor.process(&self.ready.errored, RawEvents::ERRORED, true)
    }
}

impl fmt::Debug for SubPoller {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SubPoller")
            .field("range", &self.range)
            .field("state", &self.state)
            .field("ready", &self.ready)
            .finish()
    }
}

struct Processor<'a> {
    update: u64,
    registry: &'a mut Registry,
    selected: &'a mut SelectedKeys,
    wakeup: &'a Wakeup,
}

impl<'a> Processor<'a> {
    fn process(&mut self, fds: &[RawFd], raw: RawEvents, errored: bool) -> usize {
        let mut updated = 0;
        for &fd in fds {
            if fd == self.wakeup.source_fd() {
                self.wakeup.mark_triggered();
                continue;
            }

            let record = match self.registry.record_mut(fd) {
                Some(record) => record,
                // Deregistered while polling.
                None => continue,
            };

            // Urgent data only, the descriptor isn't actually ready.
            if errored && sys::is_stream_socket(fd) && sys::discard_urgent_data(fd) {
                trace!("discarded urgent data: fd={}", fd);
                continue;
            }

            let key = &record.key;
            if self.selected.contains(key) {
                // Ready operations only accumulate while selected.
                let changed = key.translate_and_update_ready_ops(raw);
                if changed && record.updated != self.update {
                    record.updated = self.update;
                    updated += 1;
                }
            } else {
                if record.cleared != self.update {
                    key.translate_and_set_ready_ops(raw);
                } else {
                    key.translate_and_update_ready_ops(raw);
                }
                if key.ready().matches(key.interests()) {
                    trace!("selected key: id={}, fd={}, ready={:?}", key.id(), fd, key.ready());
                    self.selected.insert(key.clone());
                    record.updated = self.update;
                    updated += 1;
                }
            }
            record.cleared = self.update;
        }
        updated
    }
}
