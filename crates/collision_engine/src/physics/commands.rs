//! Deferred registration changes
//!
//! The engine's containers are never mutated while a sweep is running.
//! Anything that wants to spawn or despawn a collidable from inside a
//! collision response (or from anywhere without `&mut CollisionEngine`)
//! queues the change here; the engine applies the queue right before and
//! right after each sweep.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use super::collidable::SharedCollidable;

/// A queued structural change
#[derive(Clone)]
pub enum CollisionCommand {
    /// Register a collidable
    Add(SharedCollidable),
    /// Unregister a collidable
    Remove(SharedCollidable),
}

impl fmt::Debug for CollisionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, collidable) = match self {
            Self::Add(collidable) => ("Add", collidable),
            Self::Remove(collidable) => ("Remove", collidable),
        };
        f.debug_tuple(name).field(&Rc::as_ptr(collidable).cast::<()>()).finish()
    }
}

/// Cloneable queue of pending registration changes
///
/// Every clone feeds the same queue. Queued objects are kept alive until the
/// change is applied.
#[derive(Clone, Default)]
pub struct CollisionCommands {
    queue: Rc<RefCell<VecDeque<CollisionCommand>>>,
}

impl CollisionCommands {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue registration of `collidable`
    pub fn add(&self, collidable: &SharedCollidable) {
        self.queue.borrow_mut().push_back(CollisionCommand::Add(Rc::clone(collidable)));
    }

    /// Queue removal of `collidable`
    pub fn remove(&self, collidable: &SharedCollidable) {
        self.queue.borrow_mut().push_back(CollisionCommand::Remove(Rc::clone(collidable)));
    }

    /// Number of pending changes
    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Check whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Take every pending change in submission order
    pub(crate) fn drain(&self) -> Vec<CollisionCommand> {
        self.queue.borrow_mut().drain(..).collect()
    }
}

impl fmt::Debug for CollisionCommands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollisionCommands")
            .field("pending", &self.len())
            .finish()
    }
}
