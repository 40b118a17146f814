//! Pure ordering logic: position allocation, renumbering and move planning.
//!
//! Nothing in this module performs I/O or takes locks. Callers hand in a
//! snapshot and get back a [`MutationPlan`] to commit atomically.

pub mod allocator;
pub mod normalizer;
pub mod plan;
pub mod planner;

pub use allocator::{Allocation, PositionAllocator};
pub use normalizer::{Normalization, SequenceNormalizer};
pub use plan::{CardPlan, Change, ListPlan, Mutation, MutationPlan};
pub use planner::{Destination, MoveEngine, Placement};
