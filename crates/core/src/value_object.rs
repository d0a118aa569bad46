//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. A value object
/// can only be obtained through its validating constructor, so holding one
/// means the value already satisfies the domain rules (e.g. a `Weekday` is
/// always within 1..=7, an `Email` always matches the address pattern).
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
