use std::{
    collections::HashSet,
    ops::Deref,
    sync::{Arc, Mutex},
};

use arc_swap::ArcSwap;

use crate::ListenerHandle;

/// A point-in-time, read-only view of the registered listeners.
///
/// Taking a snapshot never blocks, and later registry changes never alter
/// a snapshot already taken.
#[derive(Debug, Clone)]
pub struct Snapshot(Arc<Vec<ListenerHandle>>);

impl Snapshot {
    pub fn contains(&self, listener: &ListenerHandle) -> bool {
        self.0.contains(listener)
    }
}

impl Deref for Snapshot {
    type Target = [ListenerHandle];

    fn deref(&self) -> &Self::Target {
        self.0.as_slice()
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a ListenerHandle;
    type IntoIter = std::slice::Iter<'a, ListenerHandle>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Concurrently mutable set of listeners.
///
/// Writers serialize on a single lock, build a new list and publish it
/// atomically. Readers load whatever list is currently published without
/// locking, so dispatch never waits for writers and writers never wait
/// for dispatch. A dispatch that started before a change may or may not
/// observe it.
pub struct ListenerRegistry {
    current: ArcSwap<Vec<ListenerHandle>>,
    write_lock: Mutex<()>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Vec::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// Register a listener.
    ///
    /// Returns `false`, and leaves the registry untouched, when the same
    /// listener is already registered.
    pub fn add(&self, listener: ListenerHandle) -> bool {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let current = self.current.load();
        if current.contains(&listener) {
            tracing::warn!(listener = %listener, "The listener was doubly-added");
            return false;
        }
        let mut next = Vec::with_capacity(current.len() + 1);
        next.extend(current.iter().cloned());
        next.push(listener);
        self.current.store(Arc::new(next));
        true
    }

    /// Register several listeners in one critical section.
    ///
    /// Returns how many of them were newly added.
    pub fn add_all<I>(&self, listeners: I) -> usize
    where
        I: IntoIterator<Item = ListenerHandle>,
    {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut next: Vec<ListenerHandle> = Vec::clone(&self.current.load());
        let before = next.len();
        for listener in listeners {
            if next.contains(&listener) {
                tracing::warn!(listener = %listener, "The listener was doubly-added");
            } else {
                next.push(listener);
            }
        }
        let added = next.len() - before;
        if added > 0 {
            self.current.store(Arc::new(next));
        }
        added
    }

    /// Unregister a listener. Returns `false` if it was not registered.
    pub fn remove(&self, listener: &ListenerHandle) -> bool {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let current = self.current.load();
        if !current.contains(listener) {
            return false;
        }
        let next: Vec<ListenerHandle> = current
            .iter()
            .filter(|l| *l != listener)
            .cloned()
            .collect();
        self.current.store(Arc::new(next));
        true
    }

    /// Detach every listener, returning exactly the set that was registered.
    pub fn remove_all(&self) -> HashSet<ListenerHandle> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let previous = self.current.swap(Arc::new(Vec::new()));
        previous.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, listener: &ListenerHandle) -> bool {
        self.current.load().contains(listener)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot(self.current.load_full())
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.current.load().iter()).finish()
    }
}
