//! Abstract spatial query interface for broad-phase collision detection
//!
//! This abstraction allows swapping different spatial partitioning schemes
//! (quadtree, flat list, ...) without changing the collision engine.

use super::BoundingBox;
use thiserror::Error;

/// Errors reported by spatial index backends
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpatialError {
    /// Bounds contain NaN/infinite coordinates or have min > max
    #[error("Invalid bounds: min {min:?}, max {max:?}")]
    InvalidBounds {
        /// Rejected minimum corner
        min: [f32; 3],
        /// Rejected maximum corner
        max: [f32; 3],
    },

    /// The item is already stored in the index
    #[error("Item is already present in the spatial index")]
    AlreadyPresent,

    /// The item was never inserted or has already been removed
    #[error("Item not found in the spatial index")]
    NotFound,
}

impl SpatialError {
    /// Build an [`SpatialError::InvalidBounds`] for the given box
    pub fn invalid_bounds(bounds: &BoundingBox) -> Self {
        Self::InvalidBounds {
            min: [bounds.min.x, bounds.min.y, bounds.min.z],
            max: [bounds.max.x, bounds.max.y, bounds.max.z],
        }
    }
}

/// Work done by a single region query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryStats {
    /// Number of tree nodes (or buckets) visited
    pub nodes_visited: usize,
    /// Number of stored items whose bounds were tested
    pub items_tested: usize,
    /// Number of items appended to the result
    pub matches: usize,
}

impl std::ops::AddAssign for QueryStats {
    fn add_assign(&mut self, rhs: Self) {
        self.nodes_visited += rhs.nodes_visited;
        self.items_tested += rhs.items_tested;
        self.matches += rhs.matches;
    }
}

/// Abstract interface for spatial partitioning used in broad-phase collision detection
///
/// Items are identified by `Eq`; backends never compare bounds to find an item.
pub trait SpatialQuery<T> {
    /// Insert an item with its bounding volume at insertion time
    fn insert(&mut self, item: T, bounds: BoundingBox) -> Result<(), SpatialError>;

    /// Remove an item, returning the bounds it was inserted with
    fn remove(&mut self, item: &T) -> Result<BoundingBox, SpatialError>;

    /// Append every item whose bounds intersect `region` to `results`
    fn collect_intersecting(&self, region: &BoundingBox, results: &mut Vec<T>) -> QueryStats;

    /// Check whether an item is stored
    fn contains(&self, item: &T) -> bool;

    /// Keep only the items for which `keep` returns true; returns how many were dropped
    fn retain(&mut self, keep: &mut dyn FnMut(&T) -> bool) -> usize;

    /// Remove every item
    fn clear(&mut self);

    /// Number of stored items
    fn len(&self) -> usize;

    /// Check whether the index is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All items whose bounds intersect `region`
    fn intersecting_elements(&self, region: &BoundingBox) -> Vec<T> {
        let mut results = Vec::new();
        self.collect_intersecting(region, &mut results);
        results
    }
}
