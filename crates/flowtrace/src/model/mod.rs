//! Input model of the analysed codebase
//!
//! Descriptors deserialised from the analyser's JSON, the loaded
//! [`TypeModel`], type-reference parsing, and the convention-driven
//! [`Catalog`] queries built on top of them.

mod catalog;
mod classify;
mod type_model;
mod type_name;
mod types;

pub use catalog::*;
pub use classify::*;
pub use type_model::*;
pub use type_name::*;
pub use types::*;
