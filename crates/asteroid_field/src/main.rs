//! Asteroid field demo
//!
//! Scatters static rocks over a square field and flies dynamic ships
//! through it. Ships bounce off rocks, lose hull on every impact and are
//! replaced once wrecked. Runs headless for a fixed number of frames.
//!
//! Usage: `asteroid_field [config.toml|config.ron]`

mod bodies;
mod config;

use std::cell::RefCell;
use std::f32::consts::TAU;
use std::rc::Rc;

use collision_engine::foundation::logging;
use collision_engine::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use bodies::{Rock, Ship};
use config::FieldConfig;

/// Simulation state shared between frames
pub struct AsteroidField {
    config: FieldConfig,
    collisions: Rc<RefCell<CollisionEngine>>,
    rocks: Vec<Rc<RefCell<Rock>>>,
    ships: Vec<Rc<RefCell<Ship>>>,
    rng: StdRng,
    wrecked: usize,
}

impl AsteroidField {
    /// Create an empty field; rocks and ships are spawned on initialize
    pub fn new(config: FieldConfig) -> Result<Self, AppError> {
        let collisions = CollisionEngine::with_config(&config.engine_config().collision)?;
        let rng = StdRng::seed_from_u64(config.simulation.seed);
        Ok(Self {
            config,
            collisions: Rc::new(RefCell::new(collisions)),
            rocks: Vec::new(),
            ships: Vec::new(),
            rng,
            wrecked: 0,
        })
    }

    fn spawn_rocks(&mut self) -> Result<(), AppError> {
        let world = &self.config.world;
        let mut collisions = self.collisions.borrow_mut();

        for _ in 0..world.rock_count {
            let radius = self.rng.gen_range(world.rock_min_radius..=world.rock_max_radius);
            let center = Vec2::new(
                self.rng.gen_range(radius..world.size - radius),
                self.rng.gen_range(radius..world.size - radius),
            );
            let rock = Rc::new(RefCell::new(Rock::new(center, radius)));
            let shared: SharedCollidable = rock.clone();
            collisions.add(&shared)?;
            self.rocks.push(rock);
        }

        log::info!("Scattered {} rocks", self.rocks.len());
        Ok(())
    }

    fn launch_ship(&mut self) -> Rc<RefCell<Ship>> {
        let settings = &self.config.ships;
        let size = self.config.world.size;
        let position = Vec2::new(self.rng.gen_range(0.0..size), self.rng.gen_range(0.0..size));
        let heading = self.rng.gen_range(0.0..TAU);
        let velocity = Vec2::new(heading.cos(), heading.sin()) * settings.speed;

        let ship = Ship::spawn(
            position,
            velocity,
            settings.half_size,
            settings.hull,
            self.collisions.borrow().commands(),
        );
        self.ships.push(Rc::clone(&ship));
        ship
    }

    fn report(&self, frame: &FrameTime) {
        let collisions = self.collisions.borrow();
        let sweep = collisions.last_sweep();
        log::info!(
            "Frame {}: {} ships, {} rocks, {} hits, {} candidates, {} items tested, {} wrecked so far",
            frame.frame,
            collisions.dynamic_count(),
            collisions.static_count(),
            sweep.collisions,
            sweep.candidates,
            sweep.query.items_tested,
            self.wrecked
        );
    }
}

impl Application for AsteroidField {
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
        self.spawn_rocks()?;

        for _ in 0..self.config.ships.count {
            let ship = self.launch_ship();
            let shared: SharedCollidable = ship;
            self.collisions.borrow_mut().add(&shared)?;
        }
        log::info!("Launched {} ships", self.ships.len());

        engine.add_component(Box::new(Rc::clone(&self.collisions)));
        Ok(())
    }

    fn update(&mut self, _engine: &mut Engine, frame: &FrameTime) -> Result<(), AppError> {
        // Wrecks were unregistered at the end of the previous sweep
        let before = self.ships.len();
        self.ships.retain(|ship| !ship.borrow().is_wrecked());
        let lost = before - self.ships.len();
        self.wrecked += lost;

        // Replacements join through the command queue before the next sweep
        let commands = self.collisions.borrow().commands();
        for _ in 0..lost {
            let ship = self.launch_ship();
            let shared: SharedCollidable = ship;
            commands.add(&shared);
        }

        let dt = frame.delta_secs();
        let size = self.config.world.size;
        for ship in &self.ships {
            ship.borrow_mut().fly(dt, size);
        }

        if frame.frame > 0 && frame.frame % self.config.simulation.report_interval == 0 {
            self.report(frame);
        }
        Ok(())
    }

    fn cleanup(&mut self, _engine: &mut Engine) {
        let impacts: u32 = self.rocks.iter().map(|rock| rock.borrow().impacts()).sum();
        log::info!(
            "Field closed: {} ships wrecked, {} rock impacts recorded",
            self.wrecked,
            impacts
        );
        self.collisions.borrow_mut().clear();
        self.ships.clear();
        self.rocks.clear();
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_with_default("info");

    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading configuration from {}", path);
            FieldConfig::load_from_file(&path)?
        }
        None => FieldConfig::default(),
    };
    config.validate()?;

    let mut app = AsteroidField::new(config.clone())?;
    Engine::run(config.engine_config(), &mut app)?;
    Ok(())
}
