//! Core infrastructure shared by every stage
//!
//! Errors, diagnostics, configuration, logging and the renderer seam.

mod config;
mod diagnostics;
mod error;
pub mod logging;
mod renderer;

pub use config::*;
pub use diagnostics::*;
pub use error::*;
pub use logging::*;
pub use renderer::*;
