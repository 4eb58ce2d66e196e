//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values. To
/// "modify" one, build a new value from the old one.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq)]
/// struct Snapshot(Vec<String>);
///
/// impl ValueObject for Snapshot {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
