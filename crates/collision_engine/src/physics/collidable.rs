//! Collidable capability contract and the handles the engine stores

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use crate::spatial::BoundingBox;

/// Anything that takes part in broad-phase collision detection
///
/// The object owns its position and shape; the engine only ever asks.
pub trait Collidable {
    /// Current axis-aligned bounds, recomputed on every call
    fn bounding_box(&self) -> BoundingBox;

    /// Whether the object never moves
    ///
    /// Must not change while the object is registered with an engine.
    fn is_static(&self) -> bool;

    /// Exact overlap test beyond the bounding-box check
    ///
    /// Called on the static participant with the dynamic one as `other`.
    fn collides(&self, other: &dyn Collidable) -> bool;

    /// Reaction to a confirmed collision with `other`
    fn collision_response(&mut self, other: &dyn Collidable);
}

/// Shared, interior-mutable collidable as owned by the simulation
pub type SharedCollidable = Rc<RefCell<dyn Collidable>>;

/// Wrap a collidable for registration
pub fn shared<C: Collidable + 'static>(collidable: C) -> SharedCollidable {
    Rc::new(RefCell::new(collidable))
}

/// Non-owning reference to a registered collidable
///
/// Equality and hashing use the address of the shared allocation. The
/// allocation stays reserved while any handle exists, so an address is never
/// reused by another object behind a live handle.
#[derive(Clone)]
pub struct CollidableHandle(Weak<RefCell<dyn Collidable>>);

impl CollidableHandle {
    /// Create a handle without taking ownership
    pub fn new(collidable: &SharedCollidable) -> Self {
        Self(Rc::downgrade(collidable))
    }

    /// Get the collidable back if it is still alive
    pub fn upgrade(&self) -> Option<SharedCollidable> {
        self.0.upgrade()
    }

    /// Check whether the collidable has not been dropped yet
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }

    /// Check whether this handle points at `collidable`
    pub fn refers_to(&self, collidable: &SharedCollidable) -> bool {
        self.address() == Rc::as_ptr(collidable).cast::<()>()
    }

    fn address(&self) -> *const () {
        self.0.as_ptr().cast::<()>()
    }
}

impl PartialEq for CollidableHandle {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl Eq for CollidableHandle {}

impl Hash for CollidableHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address().hash(state);
    }
}

impl fmt::Debug for CollidableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollidableHandle")
            .field("address", &self.address())
            .field("alive", &self.is_alive())
            .finish()
    }
}
