//! # Collision Engine
//!
//! Broad-phase collision detection for real-time simulations, plus the small
//! frame loop that drives it.
//!
//! ## Features
//!
//! - **Quadtree Index**: Static objects are partitioned once at spawn
//! - **Hybrid Broad Phase**: Dynamic objects query the static index every tick
//! - **Double Dispatch**: Both participants of a collision get a response call
//! - **Deferred Changes**: Spawns and despawns queued during a sweep apply after it
//!
//! ## Quick Start
//!
//! ```rust
//! use collision_engine::prelude::*;
//!
//! struct Block {
//!     bounds: BoundingBox,
//!     is_static: bool,
//!     hits: u32,
//! }
//!
//! impl Collidable for Block {
//!     fn bounding_box(&self) -> BoundingBox {
//!         self.bounds
//!     }
//!
//!     fn is_static(&self) -> bool {
//!         self.is_static
//!     }
//!
//!     fn collides(&self, other: &dyn Collidable) -> bool {
//!         self.bounds.intersects(&other.bounding_box())
//!     }
//!
//!     fn collision_response(&mut self, _other: &dyn Collidable) {
//!         self.hits += 1;
//!     }
//! }
//!
//! fn main() -> Result<(), CollisionError> {
//!     let world = BoundingBox::from_2d(Vec2::new(0.0, 0.0), Vec2::new(100.0, 100.0));
//!     let mut engine = CollisionEngine::new(world)?;
//!
//!     let wall = shared(Block {
//!         bounds: BoundingBox::from_2d(Vec2::new(10.0, 10.0), Vec2::new(20.0, 20.0)),
//!         is_static: true,
//!         hits: 0,
//!     });
//!     let ball = shared(Block {
//!         bounds: BoundingBox::from_2d(Vec2::new(12.0, 12.0), Vec2::new(18.0, 18.0)),
//!         is_static: false,
//!         hits: 0,
//!     });
//!
//!     engine.add(&wall)?;
//!     engine.add(&ball)?;
//!
//!     let stats = engine.step()?;
//!     assert_eq!(stats.collisions, 1);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod spatial;
pub mod physics;

mod application;
mod engine;

pub use application::{AppError, Application, Component, ComponentError, HeadlessRenderContext, RenderContext};
pub use engine::{ComponentKey, Engine, EngineConfig, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        Application, AppError,
        Component, ComponentError, RenderContext,
        Engine, EngineConfig, EngineError,
        config::Config,
        foundation::{
            math::{Vec2, Vec3},
            time::FrameTime,
        },
        spatial::{BoundingBox, Quadtree, QuadtreeConfig, SpatialQuery},
        physics::{
            shared, Collidable, CollidableHandle, CollisionCommands, CollisionConfig,
            CollisionEngine, CollisionError, SharedCollidable, SweepStats,
        },
    };
}
