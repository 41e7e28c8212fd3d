//! Physics module for collision detection
//!
//! Broad-phase detection of dynamic/static overlaps using a spatial
//! partitioning index for the static side. Response is delegated to the
//! colliding objects themselves.

pub mod collidable;
pub mod collision_engine;
pub mod commands;

pub use collidable::{shared, Collidable, CollidableHandle, SharedCollidable};
pub use collision_engine::{CollisionConfig, CollisionEngine, CollisionError, SweepStats};
pub use commands::{CollisionCommand, CollisionCommands};
