//! Record server for the cleanroom import form
//!
//! Stores form documents addressed by record key and hands out
//! per-day document numbers. Callers sign in anonymously and send the
//! returned JWT as a bearer token.
//!
//! # Modules
//!
//! ```text
//! record-server/src/
//! ├── core/      # config, state, server
//! ├── auth/      # JWT and middleware
//! ├── api/       # HTTP routes and handlers
//! ├── records/   # redb storage
//! └── utils/     # errors, logging
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod records;
pub mod utils;

pub use api::build_app;
pub use auth::JwtService;
pub use core::{Config, Server, ServerError, ServerState, serve};
pub use records::RecordStorage;
pub use utils::{AppError, AppResult};

pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro, supports tracing field syntax
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// Create the log directory and install the logger
pub fn setup_environment(config: &Config) -> anyhow::Result<()> {
    std::fs::create_dir_all(config.log_dir())?;
    init_logger_with_file(
        Some(&config.log_level),
        config.log_json,
        Some(config.log_dir().as_path()),
    )
}
