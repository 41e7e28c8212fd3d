//! Flat list backend with linear scans
//!
//! Small and simple; good for tiny sets and as the baseline the quadtree is
//! measured against.

use super::spatial_query::{QueryStats, SpatialError, SpatialQuery};
use super::BoundingBox;

/// Flat list backend with linear scans
#[derive(Debug, Clone)]
pub struct FlatList<T> {
    entries: Vec<(T, BoundingBox)>,
}

impl<T> Default for FlatList<T> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T> FlatList<T> {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Clone + PartialEq> SpatialQuery<T> for FlatList<T> {
    fn insert(&mut self, item: T, bounds: BoundingBox) -> Result<(), SpatialError> {
        if !bounds.is_valid() {
            return Err(SpatialError::invalid_bounds(&bounds));
        }
        if self.contains(&item) {
            return Err(SpatialError::AlreadyPresent);
        }
        self.entries.push((item, bounds));
        Ok(())
    }

    fn remove(&mut self, item: &T) -> Result<BoundingBox, SpatialError> {
        let position = self
            .entries
            .iter()
            .position(|(stored, _)| stored == item)
            .ok_or(SpatialError::NotFound)?;
        Ok(self.entries.remove(position).1)
    }

    fn collect_intersecting(&self, region: &BoundingBox, results: &mut Vec<T>) -> QueryStats {
        let mut stats = QueryStats {
            nodes_visited: 1,
            ..QueryStats::default()
        };
        for (item, bounds) in &self.entries {
            stats.items_tested += 1;
            if bounds.intersects(region) {
                results.push(item.clone());
                stats.matches += 1;
            }
        }
        stats
    }

    fn contains(&self, item: &T) -> bool {
        self.entries.iter().any(|(stored, _)| stored == item)
    }

    fn retain(&mut self, keep: &mut dyn FnMut(&T) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(item, _)| keep(item));
        before - self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
