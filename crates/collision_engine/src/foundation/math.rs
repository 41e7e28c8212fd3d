//! Math utilities and types
//!
//! Thin aliases over `nalgebra` so the rest of the crate never names a
//! concrete scalar type.

pub use nalgebra::{Vector2, Vector3};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;
