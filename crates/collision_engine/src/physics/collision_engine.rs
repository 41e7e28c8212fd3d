//! Broad-phase collision engine
//!
//! Static collidables live in a spatial index, dynamic ones in a flat list.
//! Every tick each dynamic object queries the index with its current bounds;
//! every static candidate then decides whether the pair really collides, and
//! both sides get their response callback.
//!
//! Dynamic objects are never tested against each other. Catching those pairs
//! would need a second structure (sort-and-sweep, a per-tick tree) and is
//! outside what this broad phase does.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::collidable::{CollidableHandle, SharedCollidable};
use super::commands::{CollisionCommand, CollisionCommands};
use crate::application::{Component, ComponentError, RenderContext};
use crate::config::{Config, ConfigError};
use crate::foundation::math::Vec2;
use crate::foundation::time::FrameTime;
use crate::spatial::{BoundingBox, Quadtree, QuadtreeConfig, QueryStats, SpatialError, SpatialQuery};

/// Collision engine errors
#[derive(Error, Debug)]
pub enum CollisionError {
    /// Argument the engine cannot store, such as non-finite bounds
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The collidable is already registered
    #[error("Collidable is already registered")]
    AlreadyRegistered,

    /// The collidable was never registered or was already removed
    #[error("Collidable is not registered")]
    NotRegistered,

    /// Registered collidables were dropped without being removed first
    #[error("{count} registered collidable(s) were dropped without being removed")]
    Expired {
        /// Number of stale registrations pruned
        count: usize,
    },

    /// Invalid engine configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<SpatialError> for CollisionError {
    fn from(error: SpatialError) -> Self {
        match error {
            SpatialError::AlreadyPresent => Self::AlreadyRegistered,
            SpatialError::NotFound => Self::NotRegistered,
            invalid @ SpatialError::InvalidBounds { .. } => Self::InvalidArgument(invalid.to_string()),
        }
    }
}

/// Collision engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Region covered by the static index for the engine's lifetime
    pub world_bounds: BoundingBox,

    /// Static index tuning
    pub quadtree: QuadtreeConfig,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            world_bounds: BoundingBox::from_2d(Vec2::new(0.0, 0.0), Vec2::new(1000.0, 1000.0)),
            quadtree: QuadtreeConfig::default(),
        }
    }
}

impl Config for CollisionConfig {}

/// Counters from one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Dynamic objects that queried the index
    pub dynamic_tested: usize,
    /// Static candidates whose `collides` was evaluated
    pub candidates: usize,
    /// Confirmed collisions (each dispatched to both sides)
    pub collisions: usize,
    /// Accumulated index work
    pub query: QueryStats,
}

/// Broad-phase collision engine
pub struct CollisionEngine {
    /// Registered dynamic objects in registration order
    dynamics: Vec<CollidableHandle>,

    /// Membership of `dynamics`
    dynamic_set: HashSet<CollidableHandle>,

    /// Spatial partitioning structure holding the static objects
    statics: Box<dyn SpatialQuery<CollidableHandle>>,

    /// Membership of `statics`, scanned for dropped objects after each sweep
    static_set: HashSet<CollidableHandle>,

    /// Changes waiting for the next apply phase
    commands: CollisionCommands,

    /// Counters from the most recent successful sweep
    last_sweep: SweepStats,
}

impl CollisionEngine {
    /// Create an engine whose quadtree covers `world_bounds`
    pub fn new(world_bounds: BoundingBox) -> Result<Self, CollisionError> {
        Self::with_config(&CollisionConfig {
            world_bounds,
            ..CollisionConfig::default()
        })
    }

    /// Create an engine from configuration
    pub fn with_config(config: &CollisionConfig) -> Result<Self, CollisionError> {
        config.quadtree.validate()?;
        let quadtree = Quadtree::new(config.world_bounds, config.quadtree.clone())?;
        Ok(Self::with_spatial_query(Box::new(quadtree)))
    }

    /// Create an engine backed by any spatial index implementation
    pub fn with_spatial_query(statics: Box<dyn SpatialQuery<CollidableHandle>>) -> Self {
        Self {
            dynamics: Vec::new(),
            dynamic_set: HashSet::new(),
            statics,
            static_set: HashSet::new(),
            commands: CollisionCommands::new(),
            last_sweep: SweepStats::default(),
        }
    }

    /// Register a collidable, routing it by `is_static`
    pub fn add(&mut self, collidable: &SharedCollidable) -> Result<(), CollisionError> {
        let handle = CollidableHandle::new(collidable);
        if self.contains_handle(&handle) {
            return Err(CollisionError::AlreadyRegistered);
        }

        let (is_static, bounds) = {
            let object = collidable.borrow();
            (object.is_static(), object.bounding_box())
        };

        if is_static {
            self.statics.insert(handle.clone(), bounds)?;
            self.static_set.insert(handle);
            log::debug!("Registered static collidable at {:?}", bounds);
        } else {
            self.dynamics.push(handle.clone());
            self.dynamic_set.insert(handle);
            log::debug!("Registered dynamic collidable ({} dynamic total)", self.dynamics.len());
        }
        Ok(())
    }

    /// Unregister a collidable
    pub fn remove(&mut self, collidable: &SharedCollidable) -> Result<(), CollisionError> {
        let handle = CollidableHandle::new(collidable);
        let is_static = collidable.borrow().is_static();

        if self.static_set.remove(&handle) {
            self.statics.remove(&handle)?;
            if !is_static {
                log::warn!("Collidable changed classification while registered (was static)");
            }
            return Ok(());
        }

        if !self.dynamic_set.remove(&handle) {
            return Err(CollisionError::NotRegistered);
        }
        if let Some(position) = self.dynamics.iter().position(|stored| *stored == handle) {
            self.dynamics.remove(position);
        }
        if is_static {
            log::warn!("Collidable changed classification while registered (was dynamic)");
        }
        Ok(())
    }

    /// Queue for registration changes that must wait for the sweep to finish
    pub fn commands(&self) -> CollisionCommands {
        self.commands.clone()
    }

    /// Apply every queued change
    ///
    /// All changes are attempted; the first failure is returned.
    pub fn apply_pending(&mut self) -> Result<usize, CollisionError> {
        let pending = self.commands.drain();
        let applied = pending.len();
        let mut first_error = None;

        for command in pending {
            let result = match &command {
                CollisionCommand::Add(collidable) => self.add(collidable),
                CollisionCommand::Remove(collidable) => self.remove(collidable),
            };
            if let Err(error) = result {
                log::warn!("Deferred {:?} failed: {}", command, error);
                first_error.get_or_insert(error);
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(applied),
        }
    }

    /// Test every dynamic object against the static objects near it
    ///
    /// For each confirmed pair the dynamic object's response runs first, then
    /// the static object's. Registrations dropped without `remove` are pruned
    /// after the sweep and reported as [`CollisionError::Expired`].
    pub fn sweep(&mut self) -> Result<SweepStats, CollisionError> {
        let mut stats = SweepStats::default();
        let mut candidates = Vec::new();
        let mut stale_dynamic = false;

        for handle in &self.dynamics {
            let Some(dynamic) = handle.upgrade() else {
                stale_dynamic = true;
                continue;
            };

            let region = dynamic.borrow().bounding_box();
            candidates.clear();
            stats.query += self.statics.collect_intersecting(&region, &mut candidates);
            stats.dynamic_tested += 1;

            for candidate in &candidates {
                let Some(fixed) = candidate.upgrade() else {
                    continue;
                };
                stats.candidates += 1;

                let hit = fixed.borrow().collides(&*dynamic.borrow());
                if hit {
                    dynamic.borrow_mut().collision_response(&*fixed.borrow());
                    fixed.borrow_mut().collision_response(&*dynamic.borrow());
                    stats.collisions += 1;
                }
            }
        }

        let mut expired = 0;
        if stale_dynamic {
            let before = self.dynamics.len();
            self.dynamics.retain(CollidableHandle::is_alive);
            self.dynamic_set.retain(CollidableHandle::is_alive);
            expired += before - self.dynamics.len();
        }
        if self.static_set.iter().any(|handle| !handle.is_alive()) {
            self.static_set.retain(CollidableHandle::is_alive);
            expired += self.statics.retain(&mut |handle| handle.is_alive());
        }

        if expired > 0 {
            log::warn!("Pruned {} collidable(s) dropped while still registered", expired);
            return Err(CollisionError::Expired { count: expired });
        }

        log::trace!(
            "Sweep: {} dynamic, {} candidates, {} collisions, {} items tested",
            stats.dynamic_tested,
            stats.candidates,
            stats.collisions,
            stats.query.items_tested
        );
        self.last_sweep = stats;
        Ok(stats)
    }

    /// Apply queued changes, sweep, then apply changes queued during the sweep
    pub fn step(&mut self) -> Result<SweepStats, CollisionError> {
        let before = self.apply_pending();
        let swept = self.sweep();
        let after = self.apply_pending();

        before?;
        let stats = swept?;
        after?;
        Ok(stats)
    }

    /// Counters from the most recent sweep that completed without error
    pub fn last_sweep(&self) -> SweepStats {
        self.last_sweep
    }

    /// Static collidables whose insertion bounds intersect `region`
    pub fn query_static(&self, region: &BoundingBox) -> Vec<SharedCollidable> {
        self.statics
            .intersecting_elements(region)
            .iter()
            .filter_map(CollidableHandle::upgrade)
            .collect()
    }

    /// Registered dynamic collidables in sweep order
    pub fn dynamic_objects(&self) -> impl Iterator<Item = SharedCollidable> + '_ {
        self.dynamics.iter().filter_map(CollidableHandle::upgrade)
    }

    /// Check whether a collidable is registered
    pub fn contains(&self, collidable: &SharedCollidable) -> bool {
        self.contains_handle(&CollidableHandle::new(collidable))
    }

    fn contains_handle(&self, handle: &CollidableHandle) -> bool {
        self.static_set.contains(handle) || self.dynamic_set.contains(handle)
    }

    /// Number of registered dynamic collidables
    pub fn dynamic_count(&self) -> usize {
        self.dynamics.len()
    }

    /// Number of registered static collidables
    pub fn static_count(&self) -> usize {
        self.statics.len()
    }

    /// Unregister everything and drop pending changes
    pub fn clear(&mut self) {
        self.dynamics.clear();
        self.dynamic_set.clear();
        self.statics.clear();
        self.static_set.clear();
        self.last_sweep = SweepStats::default();
        drop(self.commands.drain());
    }
}

impl Component for CollisionEngine {
    fn update(&mut self, _frame: &FrameTime) -> Result<(), ComponentError> {
        self.step()?;
        Ok(())
    }

    fn render(&mut self, _context: &mut dyn RenderContext, _frame: &FrameTime) -> Result<(), ComponentError> {
        Ok(())
    }
}

impl fmt::Debug for CollisionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollisionEngine")
            .field("dynamic", &self.dynamics.len())
            .field("static", &self.statics.len())
            .field("pending", &self.commands.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collidable::{shared, Collidable};
    use crate::spatial::FlatList;
    use std::cell::RefCell;
    use std::rc::Rc;

    type EventLog = Rc<RefCell<Vec<String>>>;

    struct Block {
        name: &'static str,
        bounds: BoundingBox,
        is_static: bool,
        log: EventLog,
    }

    impl Block {
        fn new(name: &'static str, bounds: BoundingBox, is_static: bool, log: &EventLog) -> Self {
            Self {
                name,
                bounds,
                is_static,
                log: Rc::clone(log),
            }
        }
    }

    impl Collidable for Block {
        fn bounding_box(&self) -> BoundingBox {
            self.bounds
        }

        fn is_static(&self) -> bool {
            self.is_static
        }

        fn collides(&self, other: &dyn Collidable) -> bool {
            self.bounds.intersects(&other.bounding_box())
        }

        fn collision_response(&mut self, other: &dyn Collidable) {
            let corner = other.bounding_box().min;
            self.log
                .borrow_mut()
                .push(format!("{} hit ({}, {})", self.name, corner.x, corner.y));
        }
    }

    fn rect(x0: f32, y0: f32, x1: f32, y1: f32) -> BoundingBox {
        BoundingBox::from_2d(Vec2::new(x0, y0), Vec2::new(x1, y1))
    }

    fn engine() -> CollisionEngine {
        CollisionEngine::new(rect(0.0, 0.0, 100.0, 100.0)).unwrap()
    }

    #[test]
    fn test_routing_by_classification() {
        let log = EventLog::default();
        let mut engine = engine();
        let wall = shared(Block::new("wall", rect(10.0, 10.0, 20.0, 20.0), true, &log));
        let ball = shared(Block::new("ball", rect(50.0, 50.0, 60.0, 60.0), false, &log));

        engine.add(&wall).unwrap();
        engine.add(&ball).unwrap();

        assert_eq!(engine.static_count(), 1);
        assert_eq!(engine.dynamic_count(), 1);
        assert_eq!(engine.query_static(&rect(10.0, 10.0, 20.0, 20.0)).len(), 1);
        assert!(engine.query_static(&rect(50.0, 50.0, 60.0, 60.0)).is_empty());
        assert_eq!(engine.dynamic_objects().count(), 1);
    }

    #[test]
    fn test_dispatch_order_dynamic_then_static() {
        let log = EventLog::default();
        let mut engine = engine();
        let wall = shared(Block::new("wall", rect(10.0, 10.0, 20.0, 20.0), true, &log));
        let ball = shared(Block::new("ball", rect(12.0, 12.0, 18.0, 18.0), false, &log));
        engine.add(&wall).unwrap();
        engine.add(&ball).unwrap();

        let stats = engine.sweep().unwrap();

        assert_eq!(stats.collisions, 1);
        assert_eq!(engine.last_sweep(), stats);
        assert_eq!(
            *log.borrow(),
            vec!["ball hit (10, 10)".to_string(), "wall hit (12, 12)".to_string()]
        );
    }

    #[test]
    fn test_double_add_and_missing_remove_fail() {
        let log = EventLog::default();
        let mut engine = engine();
        let wall = shared(Block::new("wall", rect(10.0, 10.0, 20.0, 20.0), true, &log));
        let ball = shared(Block::new("ball", rect(50.0, 50.0, 60.0, 60.0), false, &log));

        engine.add(&wall).unwrap();
        engine.add(&ball).unwrap();
        assert!(matches!(engine.add(&wall), Err(CollisionError::AlreadyRegistered)));
        assert!(matches!(engine.add(&ball), Err(CollisionError::AlreadyRegistered)));

        engine.remove(&wall).unwrap();
        engine.remove(&ball).unwrap();
        assert!(matches!(engine.remove(&wall), Err(CollisionError::NotRegistered)));
        assert!(matches!(engine.remove(&ball), Err(CollisionError::NotRegistered)));
    }

    #[test]
    fn test_invalid_static_bounds_rejected() {
        let log = EventLog::default();
        let mut engine = engine();
        let broken = shared(Block::new("broken", rect(f32::NAN, 0.0, 1.0, 1.0), true, &log));

        assert!(matches!(engine.add(&broken), Err(CollisionError::InvalidArgument(_))));
        assert!(!engine.contains(&broken));
    }

    #[test]
    fn test_dropped_registration_is_reported_and_pruned() {
        let log = EventLog::default();
        let mut engine = engine();
        let wall = shared(Block::new("wall", rect(10.0, 10.0, 20.0, 20.0), true, &log));
        let ball = shared(Block::new("ball", rect(12.0, 12.0, 18.0, 18.0), false, &log));
        engine.add(&wall).unwrap();
        engine.add(&ball).unwrap();

        drop(wall);

        assert!(matches!(engine.sweep(), Err(CollisionError::Expired { count: 1 })));
        assert_eq!(engine.static_count(), 0);
        assert!(log.borrow().is_empty());
        assert_eq!(engine.sweep().unwrap().collisions, 0);
    }

    #[test]
    fn test_dropped_static_reported_without_dynamics() {
        let log = EventLog::default();
        let mut engine = engine();
        let wall = shared(Block::new("wall", rect(10.0, 10.0, 20.0, 20.0), true, &log));
        let kept = shared(Block::new("kept", rect(70.0, 70.0, 80.0, 80.0), true, &log));
        engine.add(&wall).unwrap();
        engine.add(&kept).unwrap();

        drop(wall);

        assert!(matches!(engine.step(), Err(CollisionError::Expired { count: 1 })));
        assert_eq!(engine.static_count(), 1);
        assert!(engine.contains(&kept));
        assert!(engine.step().is_ok());
    }

    #[test]
    fn test_batched_despawn_keeps_remaining_order() {
        let log = EventLog::default();
        let mut engine = engine();
        let balls: Vec<SharedCollidable> = (0..6u8)
            .map(|i| {
                let x = f32::from(i) * 10.0;
                shared(Block::new("ball", rect(x, 50.0, x + 1.0, 51.0), false, &log))
            })
            .collect();
        for ball in &balls {
            engine.add(ball).unwrap();
        }

        let commands = engine.commands();
        for ball in balls.iter().step_by(2) {
            commands.remove(ball);
        }
        assert_eq!(engine.apply_pending().unwrap(), 3);

        let remaining: Vec<SharedCollidable> = engine.dynamic_objects().collect();
        assert_eq!(remaining.len(), 3);
        for (kept, expected) in remaining.iter().zip(balls.iter().skip(1).step_by(2)) {
            assert!(Rc::ptr_eq(kept, expected));
        }
        assert!(!engine.contains(&balls[0]));
        assert!(matches!(engine.remove(&balls[0]), Err(CollisionError::NotRegistered)));
    }

    #[test]
    fn test_flat_list_backend() {
        let log = EventLog::default();
        let mut engine = CollisionEngine::with_spatial_query(Box::new(FlatList::new()));
        let wall = shared(Block::new("wall", rect(10.0, 10.0, 20.0, 20.0), true, &log));
        let ball = shared(Block::new("ball", rect(15.0, 15.0, 25.0, 25.0), false, &log));
        engine.add(&wall).unwrap();
        engine.add(&ball).unwrap();

        assert_eq!(engine.sweep().unwrap().collisions, 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = CollisionConfig {
            quadtree: QuadtreeConfig {
                max_items_per_node: 0,
                ..QuadtreeConfig::default()
            },
            ..CollisionConfig::default()
        };

        assert!(matches!(CollisionEngine::with_config(&config), Err(CollisionError::Config(_))));
    }
}
