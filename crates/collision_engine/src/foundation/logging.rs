//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system from `RUST_LOG`
///
/// Returns `false` when a logger was already installed; the existing one stays active.
pub fn init() -> bool {
    report(env_logger::try_init())
}

/// Initialize logging with a default filter used when `RUST_LOG` is unset
pub fn init_with_default(filter: &str) -> bool {
    report(env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).try_init())
}

fn report(result: Result<(), log::SetLoggerError>) -> bool {
    match result {
        Ok(()) => true,
        Err(error) => {
            log::debug!("Logger already installed, keeping it: {}", error);
            false
        }
    }
}
