// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod archive;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod inspection;
pub mod practice;
pub mod runtime;
pub mod scheduler;
pub mod scramble;
pub mod session;
pub mod solve;
pub mod stats;
pub mod timer;
pub mod util;
pub mod warning;

pub use error::{Error, Result};
