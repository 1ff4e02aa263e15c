//! Quota module - bounded per-key collection
//!
//! A `QuotaTracker` retains at most `quota` items for each key of interest and
//! keeps the set of keys that still need more. Once that set is empty nothing
//! offered afterwards can change the retained items, which is what lets a scan
//! stop early.

use std::collections::{HashMap, HashSet};

/// Result of offering an item to the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    /// The key is not one of the keys of interest
    NotOfInterest,
    /// The key already holds `quota` items; the item was dropped
    QuotaFull,
    /// The item was retained and the key still needs more
    Accepted,
    /// The item was retained and filled the key's quota
    Filled,
}

impl Offer {
    /// Whether the item was retained
    pub fn is_retained(&self) -> bool {
        matches!(self, Offer::Accepted | Offer::Filled)
    }
}

/// Per-key bounded collection with a pending-key set
///
/// Invariants:
/// - no key ever holds more than `quota` items
/// - a key leaves the pending set exactly when it reaches `quota`, and never
///   comes back
/// - keys are reported in the order their first item was retained
#[derive(Debug, Clone)]
pub struct QuotaTracker<T> {
    quota: usize,
    interest: HashSet<String>,
    pending: HashSet<String>,
    order: Vec<String>,
    retained: HashMap<String, Vec<T>>,
}

impl<T> QuotaTracker<T> {
    /// Create a tracker for the given keys. A zero quota satisfies every key
    /// up front.
    pub fn new<I, S>(keys: I, quota: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let interest: HashSet<String> = keys.into_iter().map(Into::into).collect();
        let pending = if quota == 0 {
            HashSet::new()
        } else {
            interest.clone()
        };

        Self {
            quota,
            interest,
            pending,
            order: Vec::new(),
            retained: HashMap::new(),
        }
    }

    /// Offer an item for `key`
    pub fn offer(&mut self, key: &str, item: T) -> Offer {
        if !self.interest.contains(key) {
            return Offer::NotOfInterest;
        }

        if self.count(key) >= self.quota {
            return Offer::QuotaFull;
        }

        if !self.retained.contains_key(key) {
            self.order.push(key.to_string());
        }
        let items = self.retained.entry(key.to_string()).or_default();

        items.push(item);
        if items.len() == self.quota {
            self.pending.remove(key);
            Offer::Filled
        } else {
            Offer::Accepted
        }
    }

    /// True once every key of interest has reached its quota
    pub fn is_satisfied(&self) -> bool {
        self.pending.is_empty()
    }

    /// Keys still below quota, sorted for stable reporting
    pub fn pending(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.pending.iter().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// The per-key cap
    pub fn quota(&self) -> usize {
        self.quota
    }

    /// Number of items retained for `key`
    pub fn count(&self, key: &str) -> usize {
        self.retained.get(key).map_or(0, Vec::len)
    }

    /// Number of items retained across all keys
    pub fn total(&self) -> usize {
        self.retained.values().map(Vec::len).sum()
    }

    /// Consume the tracker, yielding `(key, items)` groups in first-insertion
    /// order
    pub fn into_groups(mut self) -> Vec<(String, Vec<T>)> {
        self.order
            .into_iter()
            .map(|key| {
                let items = self.retained.remove(&key).unwrap_or_default();
                (key, items)
            })
            .collect()
    }
}
