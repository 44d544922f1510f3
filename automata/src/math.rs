/// Type alias for sets that keep their elements in insertion order. We use this to hide
/// which type of set we are actually using. The position of an element doubles as a stable id.
pub type Set<S> = indexmap::IndexSet<S>;
/// Type alias for maps that keep their entries in insertion order.
pub type Map<K, V> = indexmap::IndexMap<K, V>;
