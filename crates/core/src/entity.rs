//! Entity trait: records that keep their identity while their state changes.

/// A record addressed by a stable, strongly-typed id.
///
/// Customers and accounts are entities: two snapshots with the same id describe
/// the same customer or account even when their other fields differ.
pub trait Entity {
    /// Identifier type; ordered so collections can be kept in id order.
    type Id: Clone + Ord + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    fn id(&self) -> &Self::Id;

    /// Whether `other` is a (possibly older) snapshot of the same record.
    fn is_same_entity(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}
