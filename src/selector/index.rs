use std::collections::HashMap;
use std::os::unix::io::{AsRawFd, RawFd};

use crate::Key;

/// Registration record, owned by the registry.
#[derive(Debug)]
pub(crate) struct Record {
    pub(crate) key: Key,
    /// Slot of the key's entry in the poll batch.
    pub(crate) slot: usize,
    /// Select cycle in which the key was last counted as updated.
    pub(crate) updated: u64,
    /// Select cycle in which the key's ready operations were last reset.
    pub(crate) cleared: u64,
}

impl Record {
    pub(crate) fn new(key: Key, slot: usize) -> Record {
        Record { key, slot, updated: 0, cleared: 0 }
    }
}

/// Maps a native descriptor to its registration record.
///
/// A missing record is not an error: the registration may have been retracted
/// after the descriptor was polled, callers skip those descriptors.
#[derive(Debug, Default)]
pub(crate) struct DescriptorIndex {
    records: HashMap<RawFd, Record>,
}

impl DescriptorIndex {
    pub(crate) fn new() -> DescriptorIndex {
        DescriptorIndex { records: HashMap::new() }
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn contains(&self, fd: RawFd) -> bool {
        self.records.contains_key(&fd)
    }

    /// Insert `record`, returning the record previously stored for the same
    /// descriptor.
    pub(crate) fn put(&mut self, record: Record) -> Option<Record> {
        self.records.insert(record.key.as_raw_fd(), record)
    }

    #[cfg(test)]
    pub(crate) fn get(&self, fd: RawFd) -> Option<&Record> {
        self.records.get(&fd)
    }

    pub(crate) fn get_mut(&mut self, fd: RawFd) -> Option<&mut Record> {
        self.records.get_mut(&fd)
    }

    /// Record of `key`, `None` if the descriptor is now registered by a
    /// different key.
    pub(crate) fn get_key(&self, key: &Key) -> Option<&Record> {
        self.records.get(&key.as_raw_fd()).filter(|record| record.key == *key)
    }

    /// Remove the record of `key`.
    pub(crate) fn remove(&mut self, key: &Key) -> Option<Record> {
        let fd = key.as_raw_fd();
        match self.records.get(&fd) {
            Some(record) if record.key == *key => self.records.remove(&fd),
            _ => None,
        }
    }

    pub(crate) fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// Remove all records.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = Record> + '_ {
        self.records.drain().map(|(_, record)| record)
    }
}
