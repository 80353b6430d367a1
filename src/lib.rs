//! Graceful shutdown on SIGINT/SIGTERM
//!
//! This library installs a process-wide coordinator that runs registered
//! cleanup functions once when the first termination signal arrives, and
//! force-exits the process when cleanup overruns its timeout or a second
//! signal arrives.
//!
//! ```text
//! // let handler = sigterm_handler::instance()?;
//! // handler.set_timeout(Duration::from_secs(30));
//! // handler.register_defer_func(|| flush_buffers());
//! // handler.wait_for_completion();
//! ```

pub mod cli;
pub mod completion;
pub mod config;
pub mod logging;
pub mod observer;
pub mod shutdown;
pub mod signal;

// Re-export key items for easy use by the binary (main.rs)
pub use cli::parse_args;
pub use config::{parse_config, Config};
pub use logging::{log, set_log_file, Level};
pub use observer::{ObserverId, Subject};
pub use shutdown::{
    instance, CancelHandle, ShutdownCoordinator, EXIT_SECOND_SIGNAL, EXIT_TIMEOUT,
};
pub use signal::TerminationSignal;

/// Name of the program used in usage and version output
pub const PROGRAM_NAME: &str = "sigterm-handler";

/// Current version of the program (from Cargo.toml)
pub const PROGRAM_VERSION: &str = env!("CARGO_PKG_VERSION");
