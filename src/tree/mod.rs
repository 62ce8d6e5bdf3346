//! Slicer tree: node model, matrix-to-tree builder, and path index.

pub mod builder;
pub mod index;
pub mod node;

pub use builder::{BuiltTree, TreeBuilder};
pub use index::TreeIndex;
pub use node::{NodeKind, PathContext, SlicerNode, TooltipItem};
