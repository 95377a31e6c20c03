//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have **no identity**: they are defined entirely by their
/// attribute values and are immutable. To "modify" one, build a new one.
///
/// - **Value Object**: `Money(100.00)` equals any other `Money(100.00)`
/// - **Entity**: a `Customer` is the same customer whatever its address is
///
/// The trait requires `Clone`, `PartialEq` and `Debug` so values can be copied,
/// compared and logged freely.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
