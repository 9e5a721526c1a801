pub mod apis;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod observability;
pub mod pipeline;
pub mod report;
pub mod server;
pub mod types;

// Layered boundaries: use cases and ports, then their infrastructure adapters
pub mod app;
pub mod infra;

pub use app::{FinderPorts, ResolveArtistsUseCase, ResolveOptions};
pub use error::{FinderError, Result};
