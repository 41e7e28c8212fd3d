//! Rocks and ships taking part in the collision sweep

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use collision_engine::foundation::math::{Vec2, Vec3};
use collision_engine::physics::{Collidable, CollisionCommands, SharedCollidable};
use collision_engine::spatial::BoundingBox;

/// Immovable circular rock
#[derive(Debug, Clone)]
pub struct Rock {
    center: Vec2,
    radius: f32,
    impacts: u32,
}

impl Rock {
    /// Create a rock
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self {
            center,
            radius,
            impacts: 0,
        }
    }

    /// Ships that struck this rock so far
    pub fn impacts(&self) -> u32 {
        self.impacts
    }
}

impl Collidable for Rock {
    fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_center_extents(
            Vec3::new(self.center.x, self.center.y, 0.0),
            Vec3::new(self.radius, self.radius, 0.0),
        )
    }

    fn is_static(&self) -> bool {
        true
    }

    // Circle against the other object's box, using the closest point on the box
    fn collides(&self, other: &dyn Collidable) -> bool {
        let bounds = other.bounding_box();
        let closest = Vec2::new(
            self.center.x.clamp(bounds.min.x, bounds.max.x),
            self.center.y.clamp(bounds.min.y, bounds.max.y),
        );
        (closest - self.center).norm_squared() <= self.radius * self.radius
    }

    fn collision_response(&mut self, _other: &dyn Collidable) {
        self.impacts += 1;
    }
}

/// Square ship flying in a straight line until it hits something
#[derive(Debug)]
pub struct Ship {
    position: Vec2,
    velocity: Vec2,
    half_size: f32,
    hull: u32,
    wrecked: bool,
    this: Weak<RefCell<Ship>>,
    commands: CollisionCommands,
}

impl Ship {
    /// Create a ship that despawns itself through `commands` once its hull is gone
    pub fn spawn(
        position: Vec2,
        velocity: Vec2,
        half_size: f32,
        hull: u32,
        commands: CollisionCommands,
    ) -> Rc<RefCell<Self>> {
        Rc::new_cyclic(|this| {
            RefCell::new(Self {
                position,
                velocity,
                half_size,
                hull,
                wrecked: false,
                this: this.clone(),
                commands,
            })
        })
    }

    /// Advance along the current heading, wrapping around the field edges
    pub fn fly(&mut self, dt: f32, world_size: f32) {
        self.position += self.velocity * dt;
        self.position.x = self.position.x.rem_euclid(world_size);
        self.position.y = self.position.y.rem_euclid(world_size);
    }

    /// Remaining hull points
    pub fn hull(&self) -> u32 {
        self.hull
    }

    /// Whether the ship ran out of hull and queued its own removal
    pub fn is_wrecked(&self) -> bool {
        self.wrecked
    }

    /// Current position
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Current velocity
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    fn bounce_off(&mut self, obstacle: &BoundingBox) {
        let center = obstacle.center();
        let away = self.position - Vec2::new(center.x, center.y);
        let speed = self.velocity.norm();
        if away.norm_squared() > f32::EPSILON {
            self.velocity = away.normalize() * speed;
        } else {
            self.velocity = -self.velocity;
        }
    }
}

impl Collidable for Ship {
    fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_center_extents(
            Vec3::new(self.position.x, self.position.y, 0.0),
            Vec3::new(self.half_size, self.half_size, 0.0),
        )
    }

    fn is_static(&self) -> bool {
        false
    }

    fn collides(&self, other: &dyn Collidable) -> bool {
        self.bounding_box().intersects(&other.bounding_box())
    }

    fn collision_response(&mut self, other: &dyn Collidable) {
        if self.wrecked {
            return;
        }

        self.bounce_off(&other.bounding_box());
        self.hull = self.hull.saturating_sub(1);

        if self.hull == 0 {
            self.wrecked = true;
            if let Some(this) = self.this.upgrade() {
                let this: SharedCollidable = this;
                self.commands.remove(&this);
            }
            log::debug!("Ship wrecked at ({:.1}, {:.1})", self.position.x, self.position.y);
        }
    }
}
