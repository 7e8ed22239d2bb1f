// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Write-through key/value persistence.
//!
//! A [`Store`] owns the canonical in-memory copy of every key it has touched.
//! Each mutation is written to the backend immediately; a write that fails
//! stays pending until [`Store::flush`] succeeds. Writes made elsewhere (another
//! browser tab, another process) are folded in by the host through
//! [`Store::apply_external_change`], with the external value winning.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;

/// Where serialized values end up.
pub trait StorageBackend {
    fn read(&self, key: &str) -> Fallible<Option<String>>;

    fn write(&mut self, key: &str, value: &str) -> Fallible<()>;

    fn remove(&mut self, key: &str) -> Fallible<()>;
}

/// Backend that keeps everything in memory. Writes can be made to fail, to
/// stand in for a full or unavailable device store.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: BTreeMap<String, String>,
    failing: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> Fallible<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Fallible<()> {
        if self.failing {
            return fail(format!("storage unavailable, could not write '{key}'"));
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Fallible<()> {
        if self.failing {
            return fail(format!("storage unavailable, could not remove '{key}'"));
        }
        self.entries.remove(key);
        Ok(())
    }
}

/// A value written by someone other than this store.
#[derive(Clone, Debug, PartialEq)]
pub struct ExternalChange {
    pub key: String,
    /// The new serialized value, or `None` if the key was removed.
    pub value: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&ExternalChange)>;

pub struct Store<B: StorageBackend> {
    backend: B,
    state: BTreeMap<String, String>,
    /// Keys whose in-memory state has not reached the backend. A pending key
    /// that is absent from `state` is a pending removal.
    pending: BTreeSet<String>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl<B: StorageBackend> Store<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: BTreeMap::new(),
            pending: BTreeSet::new(),
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Reads `key` from the backend into memory and deserializes it. Unsaved
    /// local state for the key takes precedence over what the backend holds.
    pub fn load<T: DeserializeOwned>(&mut self, key: &str) -> Fallible<Option<T>> {
        if !self.pending.contains(key) {
            match self.backend.read(key)? {
                Some(raw) => {
                    self.state.insert(key.to_string(), raw);
                }
                None => {
                    self.state.remove(key);
                }
            }
        }
        self.get(key)
    }

    /// Deserializes the in-memory value of `key` without touching the backend.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Fallible<Option<T>> {
        match self.state.get(key) {
            Some(raw) => {
                let value: T = serde_json::from_str(raw).map_err(|e| {
                    ErrorReport::new(format!("stored value for '{key}' is malformed: {e}"))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.state.get(key).map(String::as_str)
    }

    /// Updates the in-memory value and writes it through to the backend.
    pub fn save<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Fallible<()> {
        let raw: String = serde_json::to_string(value)?;
        self.state.insert(key.to_string(), raw);
        self.write_through(key)
    }

    pub fn remove(&mut self, key: &str) -> Fallible<()> {
        self.state.remove(key);
        self.write_through(key)
    }

    fn write_through(&mut self, key: &str) -> Fallible<()> {
        match self.push(key) {
            Ok(()) => {
                self.pending.remove(key);
                Ok(())
            }
            Err(e) => {
                log::warn!("write-through of '{key}' failed, will retry on flush: {e}");
                self.pending.insert(key.to_string());
                Err(e)
            }
        }
    }

    fn push(&mut self, key: &str) -> Fallible<()> {
        match self.state.get(key) {
            Some(raw) => self.backend.write(key, raw),
            None => self.backend.remove(key),
        }
    }

    pub fn subscribe_to_external_changes(
        &mut self,
        callback: impl FnMut(&ExternalChange) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    /// Converges on a value written elsewhere. The external value replaces the
    /// in-memory one, and any local write still pending for the key is
    /// dropped. Returns whether anything changed; subscribers are only told
    /// about actual changes.
    pub fn apply_external_change(&mut self, key: &str, value: Option<String>) -> bool {
        self.pending.remove(key);
        if self.state.get(key) == value.as_ref() {
            return false;
        }
        match &value {
            Some(raw) => {
                self.state.insert(key.to_string(), raw.clone());
            }
            None => {
                self.state.remove(key);
            }
        }
        log::debug!("external change to '{key}' applied");
        let change = ExternalChange {
            key: key.to_string(),
            value,
        };
        for (_, listener) in self.listeners.iter_mut() {
            listener(&change);
        }
        true
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Lifecycle hook for suspend and teardown: retries every pending write.
    /// Returns how many keys reached the backend. Keys that fail again stay
    /// pending and the first error is returned.
    pub fn flush(&mut self) -> Fallible<usize> {
        let keys: Vec<String> = self.pending.iter().cloned().collect();
        let mut written = 0;
        let mut first_error: Option<ErrorReport> = None;
        for key in keys {
            match self.push(&key) {
                Ok(()) => {
                    self.pending.remove(&key);
                    written += 1;
                }
                Err(e) => {
                    log::warn!("flush of '{key}' failed: {e}");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => {
                if written > 0 {
                    log::info!("flushed {written} pending key(s)");
                }
                Ok(written)
            }
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn test_save_writes_through() -> Fallible<()> {
        let mut store = Store::new(MemoryBackend::new());
        store.save("numbers", &vec![1, 2, 3])?;
        assert_eq!(store.backend().read("numbers")?, Some("[1,2,3]".to_string()));
        assert_eq!(store.get::<Vec<u32>>("numbers")?, Some(vec![1, 2, 3]));
        assert!(!store.has_pending());
        Ok(())
    }

    #[test]
    fn test_load_reads_backend() -> Fallible<()> {
        let mut backend = MemoryBackend::new();
        backend.write("name", "\"Ruth\"")?;
        let mut store = Store::new(backend);
        assert_eq!(store.get::<String>("name")?, None);
        assert_eq!(store.load::<String>("name")?, Some("Ruth".to_string()));
        assert_eq!(store.load::<String>("missing")?, None);
        Ok(())
    }

    #[test]
    fn test_malformed_value_is_an_error() -> Fallible<()> {
        let mut backend = MemoryBackend::new();
        backend.write("n", "not json")?;
        let mut store = Store::new(backend);
        assert!(store.load::<u32>("n").is_err());
        Ok(())
    }

    #[test]
    fn test_remove() -> Fallible<()> {
        let mut store = Store::new(MemoryBackend::new());
        store.save("k", &1)?;
        store.remove("k")?;
        assert_eq!(store.backend().read("k")?, None);
        assert_eq!(store.get::<u32>("k")?, None);
        Ok(())
    }

    #[test]
    fn test_failed_write_stays_pending_until_flush() -> Fallible<()> {
        let mut store = Store::new(MemoryBackend::new());
        store.backend_mut().set_failing(true);
        assert!(store.save("k", &7).is_err());
        // The in-memory copy is still authoritative.
        assert_eq!(store.get::<u32>("k")?, Some(7));
        assert!(store.has_pending());
        assert!(store.flush().is_err());
        assert!(store.has_pending());

        store.backend_mut().set_failing(false);
        assert_eq!(store.flush()?, 1);
        assert!(!store.has_pending());
        assert_eq!(store.backend().read("k")?, Some("7".to_string()));
        assert_eq!(store.flush()?, 0);
        Ok(())
    }

    #[test]
    fn test_pending_removal_is_flushed() -> Fallible<()> {
        let mut store = Store::new(MemoryBackend::new());
        store.save("k", &1)?;
        store.backend_mut().set_failing(true);
        assert!(store.remove("k").is_err());
        store.backend_mut().set_failing(false);
        store.flush()?;
        assert_eq!(store.backend().read("k")?, None);
        Ok(())
    }

    #[test]
    fn test_load_keeps_unsaved_local_value() -> Fallible<()> {
        let mut store = Store::new(MemoryBackend::new());
        store.backend_mut().set_failing(true);
        let _ = store.save("k", &5);
        assert_eq!(store.load::<u32>("k")?, Some(5));
        Ok(())
    }

    #[test]
    fn test_external_change_notifies_subscribers() -> Fallible<()> {
        let seen: Rc<RefCell<Vec<ExternalChange>>> = Rc::new(RefCell::new(Vec::new()));
        let mut store = Store::new(MemoryBackend::new());
        let sink = Rc::clone(&seen);
        store.subscribe_to_external_changes(move |c| sink.borrow_mut().push(c.clone()));

        assert!(store.apply_external_change("k", Some("3".to_string())));
        assert_eq!(store.get::<u32>("k")?, Some(3));
        // Same value again is not a change.
        assert!(!store.apply_external_change("k", Some("3".to_string())));
        assert!(store.apply_external_change("k", None));
        assert_eq!(store.get::<u32>("k")?, None);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].value.as_deref(), Some("3"));
        assert_eq!(seen[1].value, None);
        Ok(())
    }

    #[test]
    fn test_external_change_wins_over_pending_write() -> Fallible<()> {
        let mut store = Store::new(MemoryBackend::new());
        store.backend_mut().set_failing(true);
        let _ = store.save("k", &1);
        assert!(store.has_pending());
        store.apply_external_change("k", Some("2".to_string()));
        assert!(!store.has_pending());
        assert_eq!(store.get::<u32>("k")?, Some(2));
        Ok(())
    }

    #[test]
    fn test_unsubscribe() {
        let count = Rc::new(RefCell::new(0));
        let mut store = Store::new(MemoryBackend::new());
        let c = Rc::clone(&count);
        let id = store.subscribe_to_external_changes(move |_| *c.borrow_mut() += 1);
        store.apply_external_change("a", Some("1".to_string()));
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.apply_external_change("a", Some("2".to_string()));
        assert_eq!(*count.borrow(), 1);
    }
}
