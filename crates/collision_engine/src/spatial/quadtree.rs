//! Quadtree spatial partitioning structure
//!
//! Divides a fixed world region into hierarchical quadrants on the X/Y
//! plane. A leaf subdivides into 4 children once it holds more items than
//! the configured threshold. Items are stored exactly once: an item that
//! straddles a quadrant boundary stays at the deepest node that fully
//! contains it, and items reaching outside the world bounds stay at the root.

use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use super::spatial_query::{QueryStats, SpatialError, SpatialQuery};
use super::BoundingBox;
use crate::config::ConfigError;
use crate::foundation::math::Vec3;

/// Deepest subdivision a configuration may ask for
pub const MAX_DEPTH_LIMIT: u32 = 32;

/// Configuration for quadtree behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadtreeConfig {
    /// Maximum items per leaf before subdivision
    pub max_items_per_node: usize,

    /// Maximum subdivision depth
    pub max_depth: u32,

    /// Minimum node half-size (prevents excessive subdivision)
    pub min_node_size: f32,
}

impl Default for QuadtreeConfig {
    fn default() -> Self {
        Self {
            max_items_per_node: 8,
            max_depth: 8,
            min_node_size: 1.0,
        }
    }
}

impl QuadtreeConfig {
    /// Reject settings the tree cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_items_per_node == 0 {
            return Err(ConfigError::Invalid("max_items_per_node must be at least 1".to_string()));
        }
        if self.max_depth > MAX_DEPTH_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "max_depth must be at most {} (got {})",
                MAX_DEPTH_LIMIT, self.max_depth
            )));
        }
        if !self.min_node_size.is_finite() || self.min_node_size < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "min_node_size must be a finite, non-negative number (got {})",
                self.min_node_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct QuadtreeEntry<T> {
    item: T,
    bounds: BoundingBox,
}

/// Single node in the quadtree hierarchy
#[derive(Debug, Clone)]
pub struct QuadtreeNode<T> {
    bounds: BoundingBox,
    entries: Vec<QuadtreeEntry<T>>,
    children: Option<Box<[QuadtreeNode<T>; 4]>>,
    depth: u32,
}

impl<T: Clone + PartialEq> QuadtreeNode<T> {
    fn new(bounds: BoundingBox, depth: u32) -> Self {
        Self {
            bounds,
            entries: Vec::new(),
            children: None,
            depth,
        }
    }

    /// World-space region covered by this node
    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    /// Depth in the tree (0 = root)
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Check if this node is a leaf (has no children)
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Number of items stored directly at this node
    pub fn item_count(&self) -> usize {
        self.entries.len()
    }

    /// Get the quadrant index (0-3) that fully contains `bounds`, if any
    ///
    /// Quadrant layout:
    /// 0: -X, -Y
    /// 1: +X, -Y
    /// 2: -X, +Y
    /// 3: +X, +Y
    fn quadrant_for(&self, bounds: &BoundingBox) -> Option<usize> {
        if !self.bounds.contains_xy(bounds) {
            return None;
        }

        let center = self.bounds.center();
        let x_bit = if bounds.max.x <= center.x {
            0
        } else if bounds.min.x >= center.x {
            1
        } else {
            return None;
        };
        let y_bit = if bounds.max.y <= center.y {
            0
        } else if bounds.min.y >= center.y {
            1
        } else {
            return None;
        };

        Some((y_bit << 1) | x_bit)
    }

    fn should_split(&self, config: &QuadtreeConfig) -> bool {
        let half = self.bounds.extents();
        self.entries.len() > config.max_items_per_node
            && self.depth < config.max_depth
            && half.x.min(half.y) > config.min_node_size
            && self.center_is_interior()
    }

    /// A center that rounds onto an edge would give a child the parent's bounds
    fn center_is_interior(&self) -> bool {
        let center = self.bounds.center();
        let (min, max) = (self.bounds.min, self.bounds.max);
        min.x < center.x && center.x < max.x && min.y < center.y && center.y < max.y
    }

    /// Subdivide this node into 4 children and push down every item that fits
    fn subdivide(&mut self, config: &QuadtreeConfig) {
        if self.children.is_some() {
            return;
        }

        let min = self.bounds.min;
        let max = self.bounds.max;
        let center = self.bounds.center();
        let depth = self.depth + 1;

        // Children share the parent's Z extent; split points are the exact center
        // so quadrant_for and child bounds agree on boundary items.
        let child = |lo_x: f32, hi_x: f32, lo_y: f32, hi_y: f32| {
            QuadtreeNode::new(
                BoundingBox::new(Vec3::new(lo_x, lo_y, min.z), Vec3::new(hi_x, hi_y, max.z)),
                depth,
            )
        };
        self.children = Some(Box::new([
            child(min.x, center.x, min.y, center.y),
            child(center.x, max.x, min.y, center.y),
            child(min.x, center.x, center.y, max.y),
            child(center.x, max.x, center.y, max.y),
        ]));

        log::trace!(
            "Quadtree node at depth {} split with {} items",
            self.depth,
            self.entries.len()
        );

        let entries = std::mem::take(&mut self.entries);
        for entry in entries {
            self.insert(entry, config);
        }
    }

    fn insert(&mut self, entry: QuadtreeEntry<T>, config: &QuadtreeConfig) {
        let quadrant = self.quadrant_for(&entry.bounds);

        if let Some(children) = &mut self.children {
            match quadrant {
                Some(index) => children[index].insert(entry, config),
                None => self.entries.push(entry),
            }
            return;
        }

        self.entries.push(entry);
        if self.should_split(config) {
            self.subdivide(config);
        }
    }

    /// Remove an item, descending along the path its insertion bounds select
    fn remove(&mut self, item: &T, bounds: &BoundingBox, config: &QuadtreeConfig) -> bool {
        let quadrant = self.quadrant_for(bounds);

        let removed = match (self.children.as_mut(), quadrant) {
            (Some(children), Some(index)) => children[index].remove(item, bounds, config),
            _ => self.remove_local(item),
        };

        if removed {
            self.try_merge(config);
        }
        removed
    }

    fn remove_local(&mut self, item: &T) -> bool {
        match self.entries.iter().position(|e| e.item == *item) {
            Some(position) => {
                self.entries.swap_remove(position);
                true
            }
            None => false,
        }
    }

    /// Pull leaf children back into this node once they hold few enough items
    fn try_merge(&mut self, config: &QuadtreeConfig) {
        let Some(children) = &self.children else {
            return;
        };
        if !children.iter().all(QuadtreeNode::is_leaf) {
            return;
        }

        let total = self.entries.len() + children.iter().map(|c| c.entries.len()).sum::<usize>();
        if total > config.max_items_per_node {
            return;
        }

        if let Some(children) = self.children.take() {
            for child in *children {
                self.entries.extend(child.entries);
            }
            log::trace!("Quadtree node at depth {} merged back to {} items", self.depth, total);
        }
    }

    /// Post-order merge pass over the whole subtree
    fn collapse(&mut self, config: &QuadtreeConfig) {
        if let Some(children) = &mut self.children {
            for child in children.iter_mut() {
                child.collapse(config);
            }
        }
        self.try_merge(config);
    }

    fn query(&self, region: &BoundingBox, results: &mut Vec<T>, stats: &mut QueryStats) {
        stats.nodes_visited += 1;
        for entry in &self.entries {
            stats.items_tested += 1;
            if entry.bounds.intersects(region) {
                results.push(entry.item.clone());
                stats.matches += 1;
            }
        }

        if let Some(children) = &self.children {
            for child in children.iter() {
                if child.bounds.intersects_xy(region) {
                    child.query(region, results, stats);
                }
            }
        }
    }

    fn retain(&mut self, keep: &mut dyn FnMut(&T) -> bool, removed: &mut Vec<T>) {
        self.entries.retain(|entry| {
            let kept = keep(&entry.item);
            if !kept {
                removed.push(entry.item.clone());
            }
            kept
        });

        if let Some(children) = &mut self.children {
            for child in children.iter_mut() {
                child.retain(keep, removed);
            }
        }
    }

    fn node_count(&self) -> usize {
        1 + self
            .children
            .as_ref()
            .map_or(0, |children| children.iter().map(QuadtreeNode::node_count).sum())
    }

    fn max_depth(&self) -> u32 {
        self.children.as_ref().map_or(self.depth, |children| {
            children.iter().map(QuadtreeNode::max_depth).max().unwrap_or(self.depth)
        })
    }
}

/// Quadtree spatial partitioning structure
///
/// Remembers each item's insertion bounds so removal can walk straight to the
/// node that holds it.
#[derive(Debug, Clone)]
pub struct Quadtree<T> {
    root: QuadtreeNode<T>,
    config: QuadtreeConfig,
    locations: HashMap<T, BoundingBox>,
}

impl<T: Clone + Eq + Hash> Quadtree<T> {
    /// Create a new quadtree covering `world_bounds` for its whole lifetime
    pub fn new(world_bounds: BoundingBox, config: QuadtreeConfig) -> Result<Self, SpatialError> {
        if !world_bounds.is_valid() {
            return Err(SpatialError::invalid_bounds(&world_bounds));
        }

        Ok(Self {
            root: QuadtreeNode::new(world_bounds, 0),
            config,
            locations: HashMap::new(),
        })
    }

    /// World bounds fixed at construction
    pub fn bounds(&self) -> &BoundingBox {
        &self.root.bounds
    }

    /// Active configuration
    pub fn config(&self) -> &QuadtreeConfig {
        &self.config
    }

    /// Root node of the hierarchy
    pub fn root(&self) -> &QuadtreeNode<T> {
        &self.root
    }

    /// Bounds an item was inserted with
    pub fn item_bounds(&self, item: &T) -> Option<&BoundingBox> {
        self.locations.get(item)
    }

    /// Total number of nodes, root included
    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }

    /// Depth of the deepest node
    pub fn depth(&self) -> u32 {
        self.root.max_depth()
    }
}

impl<T: Clone + Eq + Hash> SpatialQuery<T> for Quadtree<T> {
    fn insert(&mut self, item: T, bounds: BoundingBox) -> Result<(), SpatialError> {
        if !bounds.is_valid() {
            return Err(SpatialError::invalid_bounds(&bounds));
        }
        if self.locations.contains_key(&item) {
            return Err(SpatialError::AlreadyPresent);
        }

        if !self.root.bounds.contains_xy(&bounds) {
            log::debug!("Item bounds {:?} exceed quadtree bounds, keeping it at the root", bounds);
        }

        self.locations.insert(item.clone(), bounds);
        self.root.insert(QuadtreeEntry { item, bounds }, &self.config);
        Ok(())
    }

    fn remove(&mut self, item: &T) -> Result<BoundingBox, SpatialError> {
        let bounds = self.locations.remove(item).ok_or(SpatialError::NotFound)?;

        if self.root.remove(item, &bounds, &self.config) {
            Ok(bounds)
        } else {
            log::error!("Quadtree lost track of an item with bounds {:?}", bounds);
            Err(SpatialError::NotFound)
        }
    }

    fn collect_intersecting(&self, region: &BoundingBox, results: &mut Vec<T>) -> QueryStats {
        let mut stats = QueryStats::default();
        self.root.query(region, results, &mut stats);
        stats
    }

    fn contains(&self, item: &T) -> bool {
        self.locations.contains_key(item)
    }

    fn retain(&mut self, keep: &mut dyn FnMut(&T) -> bool) -> usize {
        let mut removed = Vec::new();
        self.root.retain(keep, &mut removed);
        for item in &removed {
            self.locations.remove(item);
        }
        self.root.collapse(&self.config);
        removed.len()
    }

    fn clear(&mut self) {
        self.root = QuadtreeNode::new(self.root.bounds, 0);
        self.locations.clear();
    }

    fn len(&self) -> usize {
        self.locations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec2;

    fn rect(x0: f32, y0: f32, x1: f32, y1: f32) -> BoundingBox {
        BoundingBox::from_2d(Vec2::new(x0, y0), Vec2::new(x1, y1))
    }

    fn small_config() -> QuadtreeConfig {
        QuadtreeConfig {
            max_items_per_node: 4,
            max_depth: 5,
            min_node_size: 1.0,
        }
    }

    fn world() -> Quadtree<u32> {
        Quadtree::new(rect(0.0, 0.0, 100.0, 100.0), small_config()).unwrap()
    }

    #[test]
    fn test_quadtree_basic_insertion() {
        let mut tree = world();
        tree.insert(1, rect(10.0, 10.0, 20.0, 20.0)).unwrap();

        assert_eq!(tree.len(), 1);
        assert!(tree.contains(&1));
        assert_eq!(tree.intersecting_elements(&rect(10.0, 10.0, 20.0, 20.0)), vec![1]);
    }

    #[test]
    fn test_quadtree_subdivision() {
        let mut tree = world();
        for i in 0..10 {
            let offset = i as f32 * 2.0;
            tree.insert(i, rect(offset, offset, offset + 1.0, offset + 1.0)).unwrap();
        }

        assert_eq!(tree.len(), 10);
        assert!(!tree.root().is_leaf());
        assert!(tree.node_count() > 1);
        assert!(tree.depth() >= 1);
    }

    #[test]
    fn test_straddling_item_stays_at_parent() {
        let mut tree = world();
        // Forces a split, then adds one item across the center lines
        for i in 0..5 {
            let offset = i as f32;
            tree.insert(i, rect(offset, offset, offset + 0.5, offset + 0.5)).unwrap();
        }
        tree.insert(99, rect(45.0, 45.0, 55.0, 55.0)).unwrap();

        assert!(!tree.root().is_leaf());
        assert_eq!(tree.root().item_count(), 1);
        assert_eq!(tree.intersecting_elements(&rect(54.0, 54.0, 60.0, 60.0)), vec![99]);
    }

    #[test]
    fn test_split_respects_max_depth() {
        let config = QuadtreeConfig {
            max_items_per_node: 1,
            max_depth: 2,
            min_node_size: 0.0,
        };
        let mut tree = Quadtree::new(rect(0.0, 0.0, 100.0, 100.0), config).unwrap();
        for i in 0..20 {
            tree.insert(i, rect(1.0, 1.0, 2.0, 2.0)).unwrap();
        }

        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.intersecting_elements(&rect(0.0, 0.0, 3.0, 3.0)).len(), 20);
    }

    #[test]
    fn test_items_outside_world_bounds_are_kept() {
        let mut tree = world();
        tree.insert(1, rect(-50.0, -50.0, -40.0, -40.0)).unwrap();
        tree.insert(2, rect(90.0, 90.0, 150.0, 150.0)).unwrap();

        assert_eq!(tree.intersecting_elements(&rect(-45.0, -45.0, -44.0, -44.0)), vec![1]);
        assert_eq!(tree.intersecting_elements(&rect(140.0, 140.0, 141.0, 141.0)), vec![2]);
    }

    #[test]
    fn test_quadtree_remove() {
        let mut tree = world();
        let bounds = rect(10.0, 10.0, 20.0, 20.0);
        tree.insert(7, bounds).unwrap();

        assert_eq!(tree.remove(&7), Ok(bounds));
        assert!(tree.is_empty());
        assert!(tree.intersecting_elements(&bounds).is_empty());
        assert_eq!(tree.remove(&7), Err(SpatialError::NotFound));
    }

    #[test]
    fn test_remove_never_inserted() {
        let mut tree = world();
        assert_eq!(tree.remove(&3), Err(SpatialError::NotFound));
    }

    #[test]
    fn test_double_insert_rejected() {
        let mut tree = world();
        tree.insert(1, rect(0.0, 0.0, 1.0, 1.0)).unwrap();

        assert_eq!(tree.insert(1, rect(5.0, 5.0, 6.0, 6.0)), Err(SpatialError::AlreadyPresent));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        let mut tree = world();
        let inverted = rect(10.0, 10.0, 5.0, 5.0);
        let nan = rect(f32::NAN, 0.0, 1.0, 1.0);

        assert!(matches!(tree.insert(1, inverted), Err(SpatialError::InvalidBounds { .. })));
        assert!(matches!(tree.insert(2, nan), Err(SpatialError::InvalidBounds { .. })));
        assert!(tree.is_empty());
        assert!(Quadtree::<u32>::new(inverted, QuadtreeConfig::default()).is_err());
    }

    #[test]
    fn test_empty_subtrees_merge_after_removal() {
        let mut tree = world();
        for i in 0..12 {
            let offset = i as f32 * 7.0;
            tree.insert(i, rect(offset, offset, offset + 1.0, offset + 1.0)).unwrap();
        }
        assert!(tree.node_count() > 1);

        for i in 0..12 {
            tree.remove(&i).unwrap();
        }

        assert_eq!(tree.node_count(), 1);
        assert!(tree.root().is_leaf());
    }

    #[test]
    fn test_query_prunes_distant_nodes() {
        let mut tree = world();
        let mut id = 0;
        for x in 0..10 {
            for y in 0..10 {
                let (fx, fy) = (x as f32 * 10.0 + 1.0, y as f32 * 10.0 + 1.0);
                tree.insert(id, rect(fx, fy, fx + 2.0, fy + 2.0)).unwrap();
                id += 1;
            }
        }

        let mut results = Vec::new();
        let stats = tree.collect_intersecting(&rect(1.0, 1.0, 3.0, 3.0), &mut results);

        assert_eq!(results, vec![0]);
        assert_eq!(stats.matches, 1);
        assert!(stats.items_tested < tree.len() / 4, "tested {} items", stats.items_tested);
    }

    #[test]
    fn test_retain_drops_items() {
        let mut tree = world();
        for i in 0..10 {
            let offset = i as f32 * 5.0;
            tree.insert(i, rect(offset, offset, offset + 1.0, offset + 1.0)).unwrap();
        }

        let dropped = tree.retain(&mut |item| item % 2 == 0);

        assert_eq!(dropped, 5);
        assert_eq!(tree.len(), 5);
        assert!(!tree.contains(&3));
        assert!(tree.intersecting_elements(&rect(15.0, 15.0, 16.0, 16.0)).is_empty());
        assert_eq!(tree.remove(&3), Err(SpatialError::NotFound));
    }

    #[test]
    fn test_clear_keeps_world_bounds() {
        let mut tree = world();
        tree.insert(1, rect(0.0, 0.0, 1.0, 1.0)).unwrap();
        tree.clear();

        assert!(tree.is_empty());
        assert_eq!(*tree.bounds(), rect(0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn test_config_validation() {
        assert!(QuadtreeConfig::default().validate().is_ok());
        let zero = QuadtreeConfig {
            max_items_per_node: 0,
            ..QuadtreeConfig::default()
        };
        assert!(zero.validate().is_err());

        let too_deep = QuadtreeConfig {
            max_depth: MAX_DEPTH_LIMIT + 1,
            ..QuadtreeConfig::default()
        };
        assert!(matches!(too_deep.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_identical_points_stop_splitting_at_float_precision() {
        let config = QuadtreeConfig {
            max_items_per_node: 1,
            max_depth: 200_000,
            min_node_size: 0.0,
        };
        let mut tree = Quadtree::new(rect(0.0, 0.0, 1000.0, 1000.0), config).unwrap();
        let point = rect(700.3, 700.3, 700.3, 700.3);

        tree.insert(1, point).unwrap();
        tree.insert(2, point).unwrap();
        tree.insert(3, point).unwrap();

        // f32 runs out of distinct centers long before the configured depth
        assert!(tree.depth() < 64, "depth {}", tree.depth());
        assert_eq!(tree.intersecting_elements(&point).len(), 3);

        tree.remove(&2).unwrap();
        assert_eq!(tree.intersecting_elements(&point).len(), 2);
    }
}
