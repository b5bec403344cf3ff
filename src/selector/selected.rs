use std::collections::HashSet;

use crate::Key;

/// Keys found ready, kept until removed by the user.
#[derive(Debug, Default)]
pub(crate) struct SelectedKeys {
    keys: HashSet<Key>,
}

impl SelectedKeys {
    pub(crate) fn new() -> SelectedKeys {
        SelectedKeys { keys: HashSet::new() }
    }

    pub(crate) fn contains(&self, key: &Key) -> bool {
        self.keys.contains(key)
    }

    pub(crate) fn insert(&mut self, key: Key) -> bool {
        self.keys.insert(key)
    }

    pub(crate) fn remove(&mut self, key: &Key) -> bool {
        self.keys.remove(key)
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.keys.clear()
    }

    pub(crate) fn snapshot(&self) -> Vec<Key> {
        self.keys.iter().cloned().collect()
    }

    pub(crate) fn take(&mut self) -> Vec<Key> {
        self.keys.drain().collect()
    }
}
