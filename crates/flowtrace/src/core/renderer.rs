//! Core renderer trait for directive output
//!
//! A renderer turns the syntax-free [`DirectiveStream`] produced by the
//! synthesizer into a concrete diagram dialect.

use anyhow::Result;

use crate::interaction::DirectiveStream;

/// Core trait for directive renderers
///
/// # Example
/// ```
/// use flowtrace::core::Renderer;
/// use flowtrace::document::PlantUmlRenderer;
/// use flowtrace::interaction::DirectiveStream;
///
/// let renderer = PlantUmlRenderer::new();
/// let output = renderer.render(&DirectiveStream::new()).unwrap();
/// assert!(output.is_empty());
/// ```
pub trait Renderer: Send + Sync {
    /// The output type of this renderer
    type Output;

    /// Render the directives into the output format
    fn render(&self, directives: &DirectiveStream) -> Result<Self::Output>;

    /// Get the name of this renderer
    fn name(&self) -> &'static str;

    /// Get the supported output format
    fn format(&self) -> &'static str;
}
