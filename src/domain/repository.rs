//! In-memory record repository.
//!
//! Stands in for the relational store: records are kept ordered by id so
//! every listing is stable and paging is deterministic.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Ordered, thread-safe collection of one record type.
pub struct Repository<T> {
    records: RwLock<BTreeMap<u64, T>>,
    next_id: AtomicU64,
}

impl<T: Clone> Repository<T> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Insert a record built from a freshly allocated id.
    pub fn insert_with(&self, build: impl FnOnce(u64) -> T) -> T {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let record = build(id);
        self.records
            .write()
            .expect("repository lock poisoned")
            .insert(id, record.clone());
        record
    }

    pub fn find(&self, id: u64) -> Option<T> {
        self.records
            .read()
            .expect("repository lock poisoned")
            .get(&id)
            .cloned()
    }

    /// All records in id order.
    pub fn list(&self) -> Vec<T> {
        self.list_where(|_| true)
    }

    /// Records matching `predicate`, in id order.
    pub fn list_where(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.records
            .read()
            .expect("repository lock poisoned")
            .values()
            .filter(|record| predicate(record))
            .cloned()
            .collect()
    }

    /// Apply `change` to the record with `id`. Returns the updated record.
    pub fn update(&self, id: u64, change: impl FnOnce(&mut T)) -> Option<T> {
        let mut records = self.records.write().expect("repository lock poisoned");
        let record = records.get_mut(&id)?;
        change(record);
        Some(record.clone())
    }

    pub fn remove(&self, id: u64) -> Option<T> {
        self.records
            .write()
            .expect("repository lock poisoned")
            .remove(&id)
    }

    /// Remove every record matching `predicate`. Returns how many went.
    pub fn remove_where(&self, predicate: impl Fn(&T) -> bool) -> usize {
        let mut records = self.records.write().expect("repository lock poisoned");
        let before = records.len();
        records.retain(|_, record| !predicate(record));
        before - records.len()
    }

    pub fn len(&self) -> usize {
        self.records.read().expect("repository lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone> Default for Repository<T> {
    fn default() -> Self {
        Self::new()
    }
}
