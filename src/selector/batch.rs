use std::fmt;
use std::ops::Range;
use std::os::unix::io::RawFd;

use crate::Interests;

/// Initial capacity of a new batch.
pub(crate) const INIT_CAP: usize = 8;

/// Growable array of native `pollfd` entries, indexed by slot.
///
/// All mutating methods must be called with the registry lock held, the
/// sub-pollers copy their range out of the batch under the same lock.
pub(crate) struct PollBatch {
    entries: Vec<libc::pollfd>,
}

impl PollBatch {
    pub(crate) fn new() -> PollBatch {
        PollBatch { entries: Vec::with_capacity(INIT_CAP) }
    }

    /// Number of used slots.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    pub(crate) fn is_full(&self) -> bool {
        self.entries.len() == self.entries.capacity()
    }

    /// Reallocate to hold at least `new_capacity` slots, keeping all entries.
    pub(crate) fn grow(&mut self, new_capacity: usize) {
        debug_assert!(new_capacity >= self.entries.len(), "shrinking poll batch");
        self.entries.reserve_exact(new_capacity - self.entries.len());
    }

    /// Add an entry for `fd` at `slot`, which must be the first unused slot.
    pub(crate) fn add_entry(&mut self, slot: usize, fd: RawFd, interests: Interests) {
        debug_assert_eq!(slot, self.entries.len(), "adding poll batch entry out of order");
        self.entries.push(libc::pollfd { fd, events: interests.to_poll_events(), revents: 0 });
    }

    /// Install the wakeup descriptor at `slot`, which must be the first unused
    /// slot.
    pub(crate) fn add_wakeup_socket(&mut self, fd: RawFd, slot: usize) {
        debug_assert_eq!(slot, self.entries.len(), "adding wakeup entry out of order");
        self.entries.push(libc::pollfd { fd, events: libc::POLLIN, revents: 0 });
    }

    /// Overwrite the interests of the entry at `slot`.
    pub(crate) fn put_event_ops(&mut self, slot: usize, interests: Interests) {
        self.entries[slot].events = interests.to_poll_events();
    }

    /// Copy the entry at `from` to `to`.
    pub(crate) fn replace_entry(&mut self, from: usize, to: usize) {
        self.entries[to] = self.entries[from];
    }

    /// Drop all entries from slot `len` onwards.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }

    /// Descriptor at `slot`.
    pub(crate) fn fd(&self, slot: usize) -> RawFd {
        self.entries[slot].fd
    }

    /// Native interests of the entry at `slot`.
    #[cfg(test)]
    pub(crate) fn events(&self, slot: usize) -> libc::c_short {
        self.entries[slot].events
    }

    /// Entries in `range`, clamped to the used slots.
    pub(crate) fn entries(&self, range: Range<usize>) -> &[libc::pollfd] {
        let end = range.end.min(self.entries.len());
        let start = range.start.min(end);
        &self.entries[start..end]
    }
}

impl fmt::Debug for PollBatch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PollBatch")
            .field("len", &self.entries.len())
            .field("capacity", &self.entries.capacity())
            .finish()
    }
}
