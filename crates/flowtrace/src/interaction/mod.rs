//! Interaction reconstruction
//!
//! [`ConsequenceExtractor`] builds an [`Interactions`] tree for a message;
//! [`DiagramSynthesizer`] turns that tree into an ordered [`DirectiveStream`].
//! Neither depends on a diagram dialect.

mod directive;
mod extractor;
mod fragment;
mod synthesizer;

pub use directive::*;
pub use extractor::*;
pub use fragment::*;
pub use synthesizer::*;
