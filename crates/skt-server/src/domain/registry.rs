//! ConnectionRegistry: the server's "master set" of open connections.
//!
//! The registry records every accepted, still-open client descriptor plus
//! `max_descriptor`, the largest descriptor value currently tracked
//! (including the listener).  Only the connection driver mutates it: insert
//! on accept, remove on eviction.
//!
//! # Lifecycle of an entry (for beginners)
//!
//! ```text
//! accept() ──► insert(fd) ──► [tracked: in every snapshot] ──► remove(fd) ──► close
//! ```
//!
//! At the start of every wait cycle the driver takes a [`ReadinessSnapshot`]:
//! a throwaway copy of the tracked descriptors plus the listener.  The
//! multiplexer only reports readiness for descriptors in that snapshot, so a
//! descriptor removed in one cycle can never show up in the next.
//!
//! # Invariants
//!
//! - `max_descriptor >= d` for every tracked `d`.
//! - `max_descriptor == listener` whenever no connection is tracked.
//! - The listener itself is never a member.

use std::collections::btree_set;
use std::collections::BTreeSet;

use super::descriptor::Descriptor;

/// The set of open connections watched by the server.
///
/// A `BTreeSet` keeps members sorted, which makes both `max_descriptor`
/// maintenance and ascending-order snapshots cheap.
#[derive(Debug, Clone)]
pub struct ConnectionRegistry {
    listener: Descriptor,
    members: BTreeSet<Descriptor>,
    max_descriptor: Descriptor,
}

impl ConnectionRegistry {
    /// Creates an empty registry for the given listener.
    pub fn new(listener: Descriptor) -> Self {
        Self {
            listener,
            members: BTreeSet::new(),
            max_descriptor: listener,
        }
    }

    /// The listener descriptor this registry was created for.
    pub fn listener(&self) -> Descriptor {
        self.listener
    }

    /// Starts tracking a newly accepted connection.
    ///
    /// Returns `false` (and changes nothing) if the descriptor is already
    /// tracked or is the listener.
    pub fn insert(&mut self, descriptor: Descriptor) -> bool {
        if descriptor == self.listener || !self.members.insert(descriptor) {
            return false;
        }
        if descriptor > self.max_descriptor {
            self.max_descriptor = descriptor;
        }
        true
    }

    /// Stops tracking a connection.
    ///
    /// Returns `false` if the descriptor was not tracked.  When the removed
    /// descriptor was the maximum, the maximum falls back to the next-largest
    /// tracked value, or to the listener.
    pub fn remove(&mut self, descriptor: Descriptor) -> bool {
        if !self.members.remove(&descriptor) {
            return false;
        }
        if descriptor == self.max_descriptor {
            self.max_descriptor = self
                .members
                .last()
                .copied()
                .map_or(self.listener, |d| d.max(self.listener));
        }
        true
    }

    /// Whether the descriptor is a tracked connection.
    pub fn contains(&self, descriptor: Descriptor) -> bool {
        self.members.contains(&descriptor)
    }

    /// Number of tracked connections (the listener is not counted).
    pub fn connection_count(&self) -> usize {
        self.members.len()
    }

    /// Whether no connection is tracked.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Largest descriptor value tracked, listener included.
    pub fn max_descriptor(&self) -> Descriptor {
        self.max_descriptor
    }

    /// Tracked connections in ascending order.
    pub fn iter(&self) -> btree_set::Iter<'_, Descriptor> {
        self.members.iter()
    }

    /// Copies the watched set (connections plus listener) for one wait cycle.
    pub fn snapshot(&self) -> ReadinessSnapshot {
        let mut descriptors = self.members.clone();
        descriptors.insert(self.listener);
        ReadinessSnapshot { descriptors }
    }

    /// Removes and returns every tracked connection, leaving the registry empty.
    pub fn drain(&mut self) -> Vec<Descriptor> {
        let drained = std::mem::take(&mut self.members).into_iter().collect();
        self.max_descriptor = self.listener;
        drained
    }
}

/// A transient copy of the watched descriptors, taken at the start of one
/// wait cycle and discarded at its end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessSnapshot {
    descriptors: BTreeSet<Descriptor>,
}

impl ReadinessSnapshot {
    /// Builds a snapshot directly from a set of descriptors.
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = Descriptor>) -> Self {
        Self {
            descriptors: descriptors.into_iter().collect(),
        }
    }

    /// Whether the descriptor is watched in this cycle.
    pub fn contains(&self, descriptor: Descriptor) -> bool {
        self.descriptors.contains(&descriptor)
    }

    /// Watched descriptors in ascending order.
    pub fn iter(&self) -> btree_set::Iter<'_, Descriptor> {
        self.descriptors.iter()
    }

    /// Number of watched descriptors.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether nothing is watched.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const LISTENER: Descriptor = Descriptor::new(3);

    fn fd(raw: i32) -> Descriptor {
        Descriptor::new(raw)
    }

    #[test]
    fn test_empty_registry_max_is_listener() {
        let registry = ConnectionRegistry::new(LISTENER);
        assert_eq!(registry.max_descriptor(), LISTENER);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_insert_tracks_maximum_across_accepts() {
        // Arrange
        let mut registry = ConnectionRegistry::new(LISTENER);

        // Act: descriptors issued out of order
        for raw in [5, 9, 4, 7] {
            assert!(registry.insert(fd(raw)));
        }

        // Assert
        assert_eq!(registry.max_descriptor(), fd(9));
        assert_eq!(registry.connection_count(), 4);
    }

    #[test]
    fn test_insert_rejects_listener_and_duplicates() {
        let mut registry = ConnectionRegistry::new(LISTENER);
        assert!(!registry.insert(LISTENER));
        assert!(registry.insert(fd(4)));
        assert!(!registry.insert(fd(4)));
        assert_eq!(registry.connection_count(), 1);
    }

    #[test]
    fn test_remove_only_affects_that_descriptor() {
        // Arrange
        let mut registry = ConnectionRegistry::new(LISTENER);
        registry.insert(fd(4));
        registry.insert(fd(5));
        registry.insert(fd(6));

        // Act
        assert!(registry.remove(fd(5)));

        // Assert
        assert!(registry.contains(fd(4)));
        assert!(!registry.contains(fd(5)));
        assert!(registry.contains(fd(6)));
        assert_eq!(registry.connection_count(), 2);
    }

    #[test]
    fn test_remove_of_maximum_falls_back_to_next_largest() {
        let mut registry = ConnectionRegistry::new(LISTENER);
        registry.insert(fd(4));
        registry.insert(fd(8));
        registry.remove(fd(8));
        assert_eq!(registry.max_descriptor(), fd(4));
    }

    #[test]
    fn test_remove_of_last_connection_restores_listener_as_maximum() {
        let mut registry = ConnectionRegistry::new(LISTENER);
        registry.insert(fd(4));
        registry.remove(fd(4));
        assert_eq!(registry.max_descriptor(), LISTENER);
    }

    #[test]
    fn test_remove_unknown_descriptor_is_noop() {
        let mut registry = ConnectionRegistry::new(LISTENER);
        registry.insert(fd(4));
        assert!(!registry.remove(fd(42)));
        assert_eq!(registry.max_descriptor(), fd(4));
    }

    #[test]
    fn test_connection_below_listener_keeps_listener_as_maximum() {
        // Descriptor numbers are reused, so a connection can be lower than
        // the listener.
        let mut registry = ConnectionRegistry::new(Descriptor::new(10));
        registry.insert(fd(4));
        assert_eq!(registry.max_descriptor(), Descriptor::new(10));
        registry.insert(fd(12));
        registry.remove(fd(12));
        assert_eq!(registry.max_descriptor(), Descriptor::new(10));
    }

    #[test]
    fn test_snapshot_includes_listener_in_ascending_order() {
        let mut registry = ConnectionRegistry::new(LISTENER);
        registry.insert(fd(6));
        registry.insert(fd(4));

        let snapshot = registry.snapshot();

        let order: Vec<_> = snapshot.iter().copied().collect();
        assert_eq!(order, vec![LISTENER, fd(4), fd(6)]);
    }

    #[test]
    fn test_snapshot_is_independent_of_later_mutation() {
        let mut registry = ConnectionRegistry::new(LISTENER);
        registry.insert(fd(4));
        let snapshot = registry.snapshot();

        registry.remove(fd(4));

        assert!(snapshot.contains(fd(4)));
        assert!(!registry.snapshot().contains(fd(4)));
    }

    #[test]
    fn test_drain_empties_registry() {
        let mut registry = ConnectionRegistry::new(LISTENER);
        registry.insert(fd(4));
        registry.insert(fd(5));

        let drained = registry.drain();

        assert_eq!(drained, vec![fd(4), fd(5)]);
        assert!(registry.is_empty());
        assert_eq!(registry.max_descriptor(), LISTENER);
    }
}
