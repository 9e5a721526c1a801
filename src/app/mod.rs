pub mod ports;
pub mod resolve_use_case;

pub use resolve_use_case::{FinderPorts, ResolveArtistsUseCase, ResolveOptions};
