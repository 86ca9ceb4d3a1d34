//! # Knowledge Graph Model
//!
//! Clean DTOs for the chunk graph the evolution engine walks over.
//! These types cross every boundary: storage ↔ query ↔ evolution ↔ user.
//!
//! Pure data: no I/O, no locks, no async.

pub mod node;
pub mod relationship;
pub mod value;

pub use node::{Node, NodeId, NodeLevel, NodeType, merge_contents};
pub use relationship::{Relationship, RelId, Direction, PREV, NEXT, SIMILAR};
pub use value::{Value, PropertyMap};
