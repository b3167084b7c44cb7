//! Lazily populated, cached collections.
//!
//! A [`LazyCollection`] holds a producer closure that fetches its entries
//! from a provider. Nothing is fetched until the first lookup, containment
//! check or iteration; after that the cached entries are served until
//! [`LazyCollection::refresh`] is called again.
//!
//! ```
//! use amlkit::collection::LazyCollection;
//! use indexmap::IndexMap;
//!
//! let mut runs = LazyCollection::new("run", || {
//!     let mut entries = IndexMap::new();
//!     entries.insert("run-1".to_string(), "Completed");
//!     Ok(entries)
//! });
//!
//! assert!(!runs.is_populated());
//! assert_eq!(*runs.get("run-1")?, "Completed");
//! assert_eq!(runs.refresh_count(), 1);
//! # Ok::<(), amlkit::AmlError>(())
//! ```

use crate::error::{AmlError, Result};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Ordered entries held by a collection.
pub type Entries<T> = IndexMap<String, T>;

/// Zero-argument fetch function supplied by the owning entity.
pub type Producer<T> = Box<dyn FnMut() -> Result<Entries<T>> + Send>;

/// Names probed by interactive display tooling. Looking them up never
/// triggers a fetch.
pub const DEFAULT_PROBE_NAMES: &[&str] = &[
    "_ipython_canary_method_should_not_exist_",
    "_repr_mimebundle_",
];

/// Whether a collection has fetched its entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Producer not yet called.
    Uninitialized,
    /// Entries fetched and cached.
    Populated,
}

/// A keyed collection populated on first access.
pub struct LazyCollection<T> {
    kind: String,
    producer: Producer<T>,
    state: CacheState,
    entries: Entries<T>,
    probe_names: Vec<String>,
    refresh_count: u64,
}

impl<T> LazyCollection<T> {
    /// Create an unpopulated collection.
    ///
    /// `kind` names the entries (e.g. "experiment") in not-found errors.
    pub fn new<F>(kind: impl Into<String>, producer: F) -> Self
    where
        F: FnMut() -> Result<Entries<T>> + Send + 'static,
    {
        Self {
            kind: kind.into(),
            producer: Box::new(producer),
            state: CacheState::Uninitialized,
            entries: IndexMap::new(),
            probe_names: DEFAULT_PROBE_NAMES.iter().map(|s| (*s).to_string()).collect(),
            refresh_count: 0,
        }
    }

    /// Add names that [`lookup`](Self::lookup) rejects without fetching.
    #[must_use]
    pub fn with_probe_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.probe_names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Kind label of the entries.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Current cache state.
    #[must_use]
    pub fn state(&self) -> CacheState {
        self.state
    }

    /// Whether the producer has been called.
    #[must_use]
    pub fn is_populated(&self) -> bool {
        self.state == CacheState::Populated
    }

    /// Number of successful producer calls so far.
    #[must_use]
    pub fn refresh_count(&self) -> u64 {
        self.refresh_count
    }

    /// Cached entries, without fetching.
    #[must_use]
    pub fn cached(&self) -> Option<&Entries<T>> {
        match self.state {
            CacheState::Populated => Some(&self.entries),
            CacheState::Uninitialized => None,
        }
    }

    /// Whether `name` is on the probe list.
    #[must_use]
    pub fn is_probe(&self, name: &str) -> bool {
        self.probe_names.iter().any(|p| p == name)
    }

    /// Call the producer and replace the cached entries.
    ///
    /// # Errors
    ///
    /// Returns the producer's error unchanged; the previous cache is kept.
    pub fn refresh(&mut self) -> Result<()> {
        let entries = (self.producer)().map_err(|e| {
            if self.state == CacheState::Populated {
                warn!(kind = %self.kind, error = %e, "refresh failed, keeping cached entries");
            }
            e
        })?;
        debug!(kind = %self.kind, entries = entries.len(), "refreshed collection");
        self.entries = entries;
        self.state = CacheState::Populated;
        self.refresh_count += 1;
        Ok(())
    }

    fn ensure_populated(&mut self) -> Result<()> {
        if self.state == CacheState::Uninitialized {
            self.refresh()?;
        }
        Ok(())
    }

    /// Get the entry stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the key is absent, or the producer's error if
    /// the first fetch fails.
    pub fn get(&mut self, key: &str) -> Result<&T> {
        self.ensure_populated()?;
        self.entries
            .get(key)
            .ok_or_else(|| AmlError::not_found(&self.kind, key))
    }

    /// Mutable access to the entry stored under `key`.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    pub fn get_mut(&mut self, key: &str) -> Result<&mut T> {
        self.ensure_populated()?;
        self.entries
            .get_mut(key)
            .ok_or_else(|| AmlError::not_found(&self.kind, key))
    }

    /// Named lookup with the probe pre-check.
    ///
    /// Probe names fail with `NotFound` immediately, even on an
    /// unpopulated collection. Everything else behaves like [`get`](Self::get).
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for probe names and absent keys.
    pub fn lookup(&mut self, name: &str) -> Result<&T> {
        if self.is_probe(name) {
            debug!(kind = %self.kind, name, "rejected probe lookup");
            return Err(AmlError::not_found(&self.kind, name));
        }
        self.get(name)
    }

    /// Mutable named lookup; see [`lookup`](Self::lookup).
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for probe names and absent keys.
    pub fn lookup_mut(&mut self, name: &str) -> Result<&mut T> {
        if self.is_probe(name) {
            debug!(kind = %self.kind, name, "rejected probe lookup");
            return Err(AmlError::not_found(&self.kind, name));
        }
        self.get_mut(name)
    }

    /// Whether `key` is present.
    ///
    /// # Errors
    ///
    /// Returns the producer's error if the first fetch fails.
    pub fn contains(&mut self, key: &str) -> Result<bool> {
        self.ensure_populated()?;
        Ok(self.entries.contains_key(key))
    }

    /// Iterate cached values in insertion order.
    ///
    /// # Errors
    ///
    /// Returns the producer's error if the first fetch fails.
    pub fn values(&mut self) -> Result<indexmap::map::Values<'_, String, T>> {
        self.ensure_populated()?;
        Ok(self.entries.values())
    }

    /// Iterate cached values mutably in insertion order.
    ///
    /// # Errors
    ///
    /// Returns the producer's error if the first fetch fails.
    pub fn values_mut(&mut self) -> Result<indexmap::map::ValuesMut<'_, String, T>> {
        self.ensure_populated()?;
        Ok(self.entries.values_mut())
    }

    /// Iterate cached key/value pairs in insertion order.
    ///
    /// # Errors
    ///
    /// Returns the producer's error if the first fetch fails.
    pub fn iter(&mut self) -> Result<indexmap::map::Iter<'_, String, T>> {
        self.ensure_populated()?;
        Ok(self.entries.iter())
    }

    /// Iterate cached keys in insertion order.
    ///
    /// # Errors
    ///
    /// Returns the producer's error if the first fetch fails.
    pub fn keys(&mut self) -> Result<indexmap::map::Keys<'_, String, T>> {
        self.ensure_populated()?;
        Ok(self.entries.keys())
    }

    /// Number of entries.
    ///
    /// # Errors
    ///
    /// Returns the producer's error if the first fetch fails.
    pub fn len(&mut self) -> Result<usize> {
        self.ensure_populated()?;
        Ok(self.entries.len())
    }

    /// Whether there are no entries.
    ///
    /// # Errors
    ///
    /// Returns the producer's error if the first fetch fails.
    pub fn is_empty(&mut self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

// An unpopulated collection holds an empty map, so it compares equal to
// another empty one.
impl<T: PartialEq> PartialEq for LazyCollection<T> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<T> fmt::Debug for LazyCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyCollection")
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl<T: fmt::Display> fmt::Display for LazyCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.state == CacheState::Uninitialized {
            return write!(f, "<not fetched>");
        }
        for value in self.entries.values() {
            writeln!(f, "{value}")?;
        }
        Ok(())
    }
}

/// A lock-guarded [`LazyCollection`] shared between threads.
///
/// Every accessor holds the lock for its whole duration, so callers that
/// arrive during a refresh wait for it and read its result instead of
/// fetching again.
pub struct SharedCollection<T> {
    inner: Arc<Mutex<LazyCollection<T>>>,
}

impl<T> Clone for SharedCollection<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for SharedCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedCollection").field(&*self.inner.lock()).finish()
    }
}

impl<T: Clone> SharedCollection<T> {
    /// Wrap a collection for shared use.
    #[must_use]
    pub fn new(collection: LazyCollection<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(collection)),
        }
    }

    /// Run `f` with exclusive access to the underlying collection.
    pub fn with<R>(&self, f: impl FnOnce(&mut LazyCollection<T>) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// See [`LazyCollection::refresh`].
    ///
    /// # Errors
    ///
    /// Returns the producer's error unchanged.
    pub fn refresh(&self) -> Result<()> {
        self.inner.lock().refresh()
    }

    /// See [`LazyCollection::get`].
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or the producer's error.
    pub fn get(&self, key: &str) -> Result<T> {
        self.inner.lock().get(key).cloned()
    }

    /// See [`LazyCollection::lookup`].
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or the producer's error.
    pub fn lookup(&self, name: &str) -> Result<T> {
        self.inner.lock().lookup(name).cloned()
    }

    /// See [`LazyCollection::contains`].
    ///
    /// # Errors
    ///
    /// Returns the producer's error.
    pub fn contains(&self, key: &str) -> Result<bool> {
        self.inner.lock().contains(key)
    }

    /// Snapshot of the values in insertion order.
    ///
    /// # Errors
    ///
    /// Returns the producer's error.
    pub fn values(&self) -> Result<Vec<T>> {
        Ok(self.inner.lock().values()?.cloned().collect())
    }

    /// Snapshot of the keys in insertion order.
    ///
    /// # Errors
    ///
    /// Returns the producer's error.
    pub fn keys(&self) -> Result<Vec<String>> {
        Ok(self.inner.lock().keys()?.cloned().collect())
    }

    /// Whether the producer has been called.
    #[must_use]
    pub fn is_populated(&self) -> bool {
        self.inner.lock().is_populated()
    }

    /// Number of successful producer calls so far.
    #[must_use]
    pub fn refresh_count(&self) -> u64 {
        self.inner.lock().refresh_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn abc() -> Entries<i32> {
        let mut entries = IndexMap::new();
        entries.insert("a".to_string(), 1);
        entries.insert("b".to_string(), 2);
        entries.insert("c".to_string(), 3);
        entries
    }

    fn counted(entries: Entries<i32>) -> (LazyCollection<i32>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let collection = LazyCollection::new("item", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(entries.clone())
        });
        (collection, calls)
    }

    #[test]
    fn test_no_fetch_before_access() {
        let (collection, calls) = counted(abc());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(collection.state(), CacheState::Uninitialized);
        assert!(collection.cached().is_none());
    }

    #[test]
    fn test_fetch_once_across_accesses() {
        let (mut collection, calls) = counted(abc());

        assert_eq!(*collection.get("a").unwrap(), 1);
        assert!(collection.contains("b").unwrap());
        assert_eq!(collection.values().unwrap().count(), 3);
        assert_eq!(*collection.lookup("c").unwrap(), 3);
        assert_eq!(collection.len().unwrap(), 3);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(collection.refresh_count(), 1);
    }

    #[test]
    fn test_explicit_refresh_fetches_again() {
        let (mut collection, calls) = counted(abc());
        collection.get("a").unwrap();
        collection.refresh().unwrap();
        collection.get("a").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_values_in_insertion_order() {
        let (mut collection, _) = counted(abc());
        for _ in 0..3 {
            let values: Vec<i32> = collection.values().unwrap().copied().collect();
            assert_eq!(values, vec![1, 2, 3]);
        }
        let keys: Vec<&String> = collection.keys().unwrap().collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }

    #[test]
    fn test_missing_key_is_not_found() {
        let mut entries = IndexMap::new();
        entries.insert("a".to_string(), 1);
        let (mut collection, _) = counted(entries);

        let err = collection.get("missing").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "not found: item 'missing'");
        assert_eq!(collection.cached().unwrap().len(), 1);
        assert_eq!(*collection.get("a").unwrap(), 1);
    }

    #[test]
    fn test_probe_names_never_fetch() {
        let (mut collection, calls) = counted(abc());
        for probe in DEFAULT_PROBE_NAMES {
            assert!(collection.lookup(probe).unwrap_err().is_not_found());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!collection.is_populated());
    }

    #[test]
    fn test_custom_probe_names() {
        let (collection, calls) = counted(abc());
        let mut collection = collection.with_probe_names(["_repr_html_"]);
        assert!(collection.lookup("_repr_html_").is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_producer_error_propagates_and_keeps_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut collection = LazyCollection::new("item", move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(abc())
            } else {
                Err(AmlError::Provider("service unavailable".to_string()))
            }
        });

        collection.get("a").unwrap();
        let err = collection.refresh().unwrap_err();
        assert!(matches!(err, AmlError::Provider(ref msg) if msg == "service unavailable"));
        assert_eq!(*collection.get("b").unwrap(), 2);
        assert_eq!(collection.refresh_count(), 1);
    }

    #[test]
    fn test_first_fetch_error_leaves_uninitialized() {
        let mut collection: LazyCollection<i32> =
            LazyCollection::new("item", || Err(AmlError::Provider("offline".to_string())));
        assert!(matches!(collection.get("a"), Err(AmlError::Provider(_))));
        assert!(!collection.is_populated());
    }

    #[test]
    fn test_equality() {
        let (mut a, _) = counted(abc());
        let (mut b, _) = counted(abc());
        let mut other = IndexMap::new();
        other.insert("a".to_string(), 10);
        let (mut c, _) = counted(other);

        // Unpopulated collections compare as empty.
        assert_eq!(a, b);

        a.refresh().unwrap();
        assert_ne!(a, b);
        b.refresh().unwrap();
        c.refresh().unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_display() {
        let (mut collection, _) = counted(abc());
        assert_eq!(collection.to_string(), "<not fetched>");
        collection.refresh().unwrap();
        assert_eq!(collection.to_string(), "1\n2\n3\n");
    }

    #[test]
    fn test_values_mut() {
        let (mut collection, _) = counted(abc());
        for v in collection.values_mut().unwrap() {
            *v *= 10;
        }
        assert_eq!(*collection.get("c").unwrap(), 30);
    }

    #[test]
    fn test_shared_single_fetch_across_threads() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let shared = SharedCollection::new(LazyCollection::new("item", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(20));
            Ok(abc())
        }));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = shared.clone();
                std::thread::spawn(move || shared.get("b").unwrap())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 2);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(shared.refresh_count(), 1);
        assert_eq!(shared.keys().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_shared_probe_and_refresh() {
        let (collection, calls) = counted(abc());
        let shared = SharedCollection::new(collection);
        assert!(shared.lookup("_repr_mimebundle_").is_err());
        assert!(!shared.is_populated());
        shared.refresh().unwrap();
        assert_eq!(shared.values().unwrap(), vec![1, 2, 3]);
        assert!(shared.contains("a").unwrap());
        assert_eq!(shared.with(|c| c.refresh_count()), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Access {
            Get(u8),
            Lookup(u8),
            Contains(u8),
            Iterate,
            Probe,
        }

        fn access() -> impl Strategy<Value = Access> {
            prop_oneof![
                (0u8..5).prop_map(Access::Get),
                (0u8..5).prop_map(Access::Lookup),
                (0u8..5).prop_map(Access::Contains),
                Just(Access::Iterate),
                Just(Access::Probe),
            ]
        }

        proptest! {
            #[test]
            fn prop_producer_called_at_most_once(accesses in prop::collection::vec(access(), 0..20)) {
                let (mut collection, calls) = counted(abc());
                let mut touched = false;
                for access in &accesses {
                    match access {
                        Access::Get(i) => { let _ = collection.get(&format!("k{i}")); touched = true; }
                        Access::Lookup(i) => { let _ = collection.lookup(&format!("k{i}")); touched = true; }
                        Access::Contains(i) => { let _ = collection.contains(&format!("k{i}")); touched = true; }
                        Access::Iterate => { let _ = collection.values().map(Iterator::count); touched = true; }
                        Access::Probe => { let _ = collection.lookup(DEFAULT_PROBE_NAMES[0]); }
                    }
                }
                prop_assert_eq!(calls.load(Ordering::SeqCst), usize::from(touched));
            }
        }
    }
}
