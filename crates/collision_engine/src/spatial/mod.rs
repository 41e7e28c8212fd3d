//! Spatial partitioning data structures
//!
//! Provides spatial indexing for broad-phase collision detection: which
//! stored objects have bounds intersecting a query region.

mod bounding_box;
mod flat_list;
mod quadtree;
pub mod spatial_query;

pub use bounding_box::BoundingBox;
pub use flat_list::FlatList;
pub use quadtree::{Quadtree, QuadtreeConfig, QuadtreeNode, MAX_DEPTH_LIMIT};
pub use spatial_query::{QueryStats, SpatialError, SpatialQuery};
