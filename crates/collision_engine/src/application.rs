//! Application trait, frame components and lifecycle management

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::ConfigError;
use crate::engine::{Engine, EngineError};
use crate::foundation::time::FrameTime;
use crate::physics::CollisionError;
use thiserror::Error;

/// Application lifecycle trait
///
/// Implement this trait to drive a simulation with [`Engine::run`].
pub trait Application {
    /// Initialize the application
    ///
    /// Called once before the first frame. Register components and spawn
    /// the initial objects here.
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError>;

    /// Update the application
    ///
    /// Called every frame before the engine updates its components.
    fn update(&mut self, engine: &mut Engine, frame: &FrameTime) -> Result<(), AppError>;

    /// Cleanup the application
    ///
    /// Called once after the last frame.
    fn cleanup(&mut self, engine: &mut Engine);
}

/// Something the frame loop tells to update and render once per tick
pub trait Component {
    /// Advance one tick
    fn update(&mut self, frame: &FrameTime) -> Result<(), ComponentError>;

    /// Draw into the frame's render context
    fn render(&mut self, context: &mut dyn RenderContext, frame: &FrameTime) -> Result<(), ComponentError>;
}

impl<C: Component + ?Sized> Component for Rc<RefCell<C>> {
    fn update(&mut self, frame: &FrameTime) -> Result<(), ComponentError> {
        self.borrow_mut().update(frame)
    }

    fn render(&mut self, context: &mut dyn RenderContext, frame: &FrameTime) -> Result<(), ComponentError> {
        self.borrow_mut().render(context, frame)
    }
}

/// Render target bound around the render pass of each frame
pub trait RenderContext {
    /// Bind the target before components render
    fn attach(&mut self);

    /// Release the target after all components rendered
    fn detach(&mut self);
}

/// Render context that draws nothing and counts frames
#[derive(Debug, Default)]
pub struct HeadlessRenderContext {
    attached: bool,
    frames: u64,
}

impl HeadlessRenderContext {
    /// Create a new headless context
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completed attach/detach cycles
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Whether a frame is currently being rendered
    pub fn is_attached(&self) -> bool {
        self.attached
    }
}

impl RenderContext for HeadlessRenderContext {
    fn attach(&mut self) {
        if self.attached {
            log::warn!("Render context attached twice without detach");
        }
        self.attached = true;
    }

    fn detach(&mut self) {
        if self.attached {
            self.frames += 1;
        }
        self.attached = false;
    }
}

/// Errors raised by frame components
#[derive(Error, Debug)]
pub enum ComponentError {
    /// Collision engine failure
    #[error("Collision error: {0}")]
    Collision(#[from] CollisionError),

    /// Custom component error
    #[error("Component error: {0}")]
    Custom(String),
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Engine error propagated to application level
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Component error raised while the application drove it directly
    #[error("Component error: {0}")]
    Component(#[from] ComponentError),

    /// Collision registration error
    #[error("Collision error: {0}")]
    Collision(#[from] CollisionError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Custom application error
    #[error("Application error: {0}")]
    Custom(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_context_counts_frames() {
        let mut context = HeadlessRenderContext::new();
        context.attach();
        assert!(context.is_attached());
        context.detach();
        context.detach();

        assert_eq!(context.frames(), 1);
        assert!(!context.is_attached());
    }
}
