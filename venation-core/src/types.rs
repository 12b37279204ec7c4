/// Identifier for a node in a [`crate::tree::Tree`].
///
/// This is an index into `Tree::nodes`, and is only meaningful within
/// the lifetime of a given `Tree` instance.
pub type NodeId = usize;

/// Identifier for an attractor in a [`crate::attractor::AttractorSet`].
///
/// Assigned in insertion order and never reused, so it doubles as the
/// attractor's index into `AttractorSet::points`.
pub type AttractorId = usize;
