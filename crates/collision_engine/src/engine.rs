//! Core engine implementation
//!
//! The engine owns the frame loop: every tick it updates each registered
//! component in registration order, then renders them all inside one
//! attach/detach pair of the render context.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};
use thiserror::Error;

use crate::application::{Application, Component, ComponentError, HeadlessRenderContext, RenderContext};
use crate::config::{Config, ConfigError};
use crate::foundation::time::{FrameTime, Timer};
use crate::physics::CollisionConfig;

new_key_type! {
    /// Key of a component registered with the engine
    pub struct ComponentKey;
}

/// Main engine struct
///
/// The engine coordinates all components and manages the main loop.
pub struct Engine {
    /// Registered components
    components: SlotMap<ComponentKey, Box<dyn Component>>,

    /// Update/render order
    order: Vec<ComponentKey>,

    /// Target handed to every component during render
    render_context: Box<dyn RenderContext>,

    /// Frame timing
    timer: Timer,

    /// Engine configuration
    config: EngineConfig,

    /// Whether the engine should continue running
    running: bool,
}

impl Engine {
    /// Create a new engine instance rendering into a headless context
    pub fn new(config: EngineConfig) -> Self {
        Self::with_render_context(config, Box::new(HeadlessRenderContext::new()))
    }

    /// Create a new engine instance with a custom render context
    pub fn with_render_context(config: EngineConfig, render_context: Box<dyn RenderContext>) -> Self {
        log::info!("Initializing engine...");
        Self {
            components: SlotMap::with_key(),
            order: Vec::new(),
            render_context,
            timer: Timer::new(),
            config,
            running: true,
        }
    }

    /// Run the engine main loop with the given application
    pub fn run<T: Application>(config: EngineConfig, app: &mut T) -> Result<(), EngineError> {
        config.validate().map_err(|e| EngineError::ConfigError(e.to_string()))?;
        let mut engine = Self::new(config);
        engine.run_app(app)
    }

    /// Run the main loop on this engine until [`Engine::quit`] or the frame limit
    pub fn run_app<T: Application>(&mut self, app: &mut T) -> Result<(), EngineError> {
        app.initialize(self)
            .map_err(|e| EngineError::ApplicationError(format!("App initialization: {}", e)))?;

        log::info!("Starting main loop...");
        self.running = true;

        let result = self.main_loop(app);

        app.cleanup(self);
        log::info!("Engine shutdown complete after {} frames", self.timer.frame_count());
        result
    }

    fn main_loop<T: Application>(&mut self, app: &mut T) -> Result<(), EngineError> {
        while self.running {
            if let Some(limit) = self.config.max_frames {
                if self.timer.frame_count() >= limit {
                    break;
                }
            }

            let frame = self.next_frame();

            app.update(self, &frame)
                .map_err(|e| EngineError::ApplicationError(format!("App update: {}", e)))?;

            self.tick(&frame)?;
        }
        Ok(())
    }

    /// Produce timing for the next frame
    ///
    /// Uses the configured fixed timestep when there is one, the wall clock otherwise.
    pub fn next_frame(&mut self) -> FrameTime {
        match self.config.fixed_timestep {
            Some(step) => self.timer.advance(Duration::try_from_secs_f32(step).unwrap_or_default()),
            None => self.timer.update(),
        }
    }

    /// Update every component, then render every component
    ///
    /// The first component error aborts the rest of the tick.
    pub fn tick(&mut self, frame: &FrameTime) -> Result<(), EngineError> {
        for key in &self.order {
            if let Some(component) = self.components.get_mut(*key) {
                component.update(frame)?;
            }
        }

        self.render_context.attach();
        let rendered = self.render_components(frame);
        self.render_context.detach();
        rendered
    }

    fn render_components(&mut self, frame: &FrameTime) -> Result<(), EngineError> {
        for key in &self.order {
            if let Some(component) = self.components.get_mut(*key) {
                component.render(self.render_context.as_mut(), frame)?;
            }
        }
        Ok(())
    }

    /// Register a component at the end of the update order
    pub fn add_component(&mut self, component: Box<dyn Component>) -> ComponentKey {
        let key = self.components.insert(component);
        self.order.push(key);
        log::debug!("Component added ({} total)", self.order.len());
        key
    }

    /// Unregister a component, handing it back to the caller
    pub fn remove_component(&mut self, key: ComponentKey) -> Option<Box<dyn Component>> {
        let component = self.components.remove(key)?;
        self.order.retain(|stored| *stored != key);
        Some(component)
    }

    /// Number of registered components
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Request engine shutdown
    pub fn quit(&mut self) {
        log::info!("Engine shutdown requested");
        self.running = false;
    }

    /// Whether the main loop keeps going
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Frames produced so far
    pub fn frame_count(&self) -> u64 {
        self.timer.frame_count()
    }

    /// Get the current frame delta time
    pub fn delta_time(&self) -> f32 {
        self.timer.delta_time()
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Stop after this many frames (runs until `quit` when unset)
    pub max_frames: Option<u64>,

    /// Fixed simulation step in seconds (wall clock when unset)
    pub fixed_timestep: Option<f32>,

    /// Collision engine settings
    pub collision: CollisionConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_frames: None,
            fixed_timestep: Some(1.0 / 60.0),
            collision: CollisionConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Reject settings the frame loop or collision engine cannot use
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(step) = self.fixed_timestep {
            if !step.is_finite() || step <= 0.0 {
                return Err(ConfigError::Invalid(format!("fixed_timestep must be positive (got {})", step)));
            }
        }
        if !self.collision.world_bounds.is_valid() {
            return Err(ConfigError::Invalid("collision.world_bounds is not a valid box".to_string()));
        }
        self.collision.quadtree.validate()
    }
}

impl Config for EngineConfig {}

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// A component failed during update or render
    #[error("Component error: {0}")]
    Component(#[from] ComponentError),

    /// Application error
    #[error("Application error: {0}")]
    ApplicationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}
