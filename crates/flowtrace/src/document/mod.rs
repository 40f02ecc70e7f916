//! AsciiDoc documentation and PlantUML output

mod aggregates;
mod asciidoc;
mod builder;
mod commands;
mod events;
mod plantuml;
mod text;

pub use asciidoc::*;
pub use builder::{Document, DocumentBuilder};
pub use plantuml::*;
pub use text::*;
