//! Layout of registrations in the poll batch.
//!
//! The batch is divided in sub-ranges of `batch_size + 1` slots. Slot 0 of
//! every sub-range holds the wakeup descriptor, the other slots hold channel
//! entries. Sub-range 0 is polled by the thread calling select, every other
//! sub-range by its own helper thread. There are no holes: all used slots are
//! contiguous, the last used slot always holds a channel (or the wakeup
//! descriptor of sub-range 0 if nothing is registered).

use std::io;
use std::os::unix::io::{AsRawFd, RawFd};

use log::trace;

use super::batch::{PollBatch, INIT_CAP};
use super::index::{DescriptorIndex, Record};
use crate::{Interests, Key};

#[derive(Debug)]
pub(crate) struct Registry {
    batch: PollBatch,
    index: DescriptorIndex,
    wakeup_fd: RawFd,
    /// Slots per sub-range, including the wakeup slot.
    stride: usize,
    required_helpers: usize,
}

impl Registry {
    pub(crate) fn new(wakeup_fd: RawFd, batch_size: usize) -> Registry {
        let mut batch = PollBatch::new();
        batch.add_wakeup_socket(wakeup_fd, 0);
        Registry {
            batch,
            index: DescriptorIndex::new(),
            wakeup_fd,
            stride: batch_size + 1,
            required_helpers: 0,
        }
    }

    /// Number of registered channels.
    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    /// Number of helper threads the next select needs.
    pub(crate) fn required_helpers(&self) -> usize {
        self.required_helpers
    }

    /// Number of sub-ranges with at least one used slot.
    #[cfg(test)]
    pub(crate) fn sub_ranges(&self) -> usize {
        (self.batch.len() + self.stride - 1) / self.stride
    }

    /// Entries of sub-range `range`, empty if it's not in use.
    pub(crate) fn sub_range(&self, range: usize) -> &[libc::pollfd] {
        let start = range * self.stride;
        self.batch.entries(start..start + self.stride)
    }

    pub(crate) fn register(&mut self, key: Key) -> io::Result<()> {
        let fd = key.as_raw_fd();
        if self.index.contains(fd) || fd == self.wakeup_fd {
            return Err(io::Error::new(io::ErrorKind::AlreadyExists, "descriptor already registered"));
        }

        if self.batch.len() % self.stride == 0 {
            // First registration of a new sub-range.
            let slot = self.batch.len();
            self.reserve_slot();
            self.batch.add_wakeup_socket(self.wakeup_fd, slot);
            self.required_helpers += 1;
            trace!("started new poll sub-range: slot={}, required_helpers={}", slot, self.required_helpers);
        }

        self.reserve_slot();
        let slot = self.batch.len();
        self.batch.add_entry(slot, fd, key.interests());
        trace!("registered descriptor: fd={}, slot={}", fd, slot);
        let previous = self.index.put(Record::new(key, slot));
        debug_assert!(previous.is_none(), "overwrote registration record");
        Ok(())
    }

    /// Remove the registration of `key`, returning its record. Returns `None`
    /// if `key` isn't registered here.
    pub(crate) fn deregister(&mut self, key: &Key) -> Option<Record> {
        let slot = self.index.get_key(key)?.slot;
        let last = self.batch.len() - 1;
        if slot != last {
            // Move the last entry into the hole.
            let moved_fd = self.batch.fd(last);
            self.batch.replace_entry(last, slot);
            if let Some(moved) = self.index.get_mut(moved_fd) {
                moved.slot = slot;
            }
        }
        self.batch.truncate(last);

        let len = self.batch.len();
        if len != 1 && len % self.stride == 1 {
            // Only the wakeup entry of the last sub-range is left.
            self.batch.truncate(len - 1);
            self.required_helpers -= 1;
            trace!("removed poll sub-range: slot={}, required_helpers={}", len - 1, self.required_helpers);
        }

        trace!("deregistered descriptor: fd={}, slot={}", key.as_raw_fd(), slot);
        self.index.remove(key)
    }

    /// Change the native interests of `key`. Does nothing if `key` isn't
    /// registered here.
    pub(crate) fn put_event_ops(&mut self, key: &Key, interests: Interests) {
        if !key.is_valid() {
            return;
        }
        if let Some(slot) = self.index.get_key(key).map(|record| record.slot) {
            key.set_interests(interests);
            self.batch.put_event_ops(slot, interests);
        }
    }

    pub(crate) fn record_mut(&mut self, fd: RawFd) -> Option<&mut Record> {
        self.index.get_mut(fd)
    }

    pub(crate) fn keys(&self) -> Vec<Key> {
        self.index.records().map(|record| record.key.clone()).collect()
    }

    /// Remove all registrations.
    pub(crate) fn close(mut self) -> Vec<Record> {
        self.index.drain().collect()
    }

    fn reserve_slot(&mut self) {
        if self.batch.is_full() {
            let new_capacity = (self.batch.capacity() * 2).max(INIT_CAP);
            trace!("growing poll batch: capacity={}", new_capacity);
            self.batch.grow(new_capacity);
        }
    }

    /// Panics if the layout is broken.
    #[cfg(test)]
    pub(crate) fn assert_layout(&self) {
        let len = self.batch.len();
        assert!(len >= 1, "missing wakeup entry of sub-range 0");
        assert_eq!(self.index.len() + self.sub_ranges(), len, "batch size");
        assert_eq!(self.required_helpers, self.sub_ranges() - 1, "required helpers");
        assert!(len == 1 || len % self.stride != 1, "trailing wakeup entry");

        for slot in 0..len {
            let fd = self.batch.fd(slot);
            if slot % self.stride == 0 {
                assert_eq!(fd, self.wakeup_fd, "wakeup entry at slot {}", slot);
            } else {
                let record = self.index.get(fd).expect("missing record");
                assert_eq!(record.slot, slot, "slot of fd {}", fd);
                assert_eq!(self.batch.events(slot), record.key.interests().to_poll_events());
            }
        }
        for record in self.index.records() {
            assert!(record.slot < len, "record slot out of bounds");
        }
    }
}
