//! Flowtrace - Message-flow sequence diagrams from an analyzed type model
//!
//! A library for following a message through the handlers of a
//! message-driven system and drawing what happens as a PlantUML sequence
//! diagram.
//!
//! # Quick Start
//!
//! ```rust
//! use flowtrace::sequence_diagram;
//!
//! let model = r#"[
//!   { "kind": "class", "fullName": "Pitstop.Billing.Events.InvoicePaid",
//!     "baseTypes": ["Pitstop.Infrastructure.Messaging.Event"] },
//!   { "kind": "class", "fullName": "Pitstop.Shipping.Handlers.PaymentHandler",
//!     "baseTypes": ["Pitstop.Infrastructure.Messaging.IMessageHandlerCallback"],
//!     "methods": [ { "name": "HandleAsync",
//!       "parameters": [ { "name": "e", "type": "Pitstop.Shipping.Events.InvoicePaid" } ] } ] }
//! ]"#;
//!
//! let diagram = sequence_diagram(model, "Pitstop.Billing.Events.InvoicePaid").unwrap();
//! assert!(diagram.contains("A-[#ForestGreen]>Shipping:InvoicePaid"));
//! ```
//!
//! # Advanced Usage
//!
//! Each stage can be driven on its own:
//!
//! ```rust
//! use flowtrace::prelude::*;
//!
//! let conventions = Conventions::default();
//! let model = TypeModel::from_types(
//!     vec![
//!         TypeDescriptor::class("Pitstop.Billing.Events.InvoicePaid")
//!             .with_base("Pitstop.Infrastructure.Messaging.Event"),
//!         TypeDescriptor::class("Pitstop.Shipping.Handlers.PaymentHandler")
//!             .with_base("Pitstop.Infrastructure.Messaging.IMessageHandlerCallback")
//!             .with_method(Method::new("HandleAsync").with_parameter(Parameter::new(
//!                 "e",
//!                 "Pitstop.Shipping.Events.InvoicePaid",
//!             ))),
//!     ],
//!     &conventions,
//! )
//! .unwrap();
//! let catalog = Catalog::new(&model, &conventions);
//! let message = catalog.message("Pitstop.Billing.Events.InvoicePaid").unwrap();
//!
//! // Extract the interaction tree
//! let mut participants = Participants::new();
//! let tree = ConsequenceExtractor::new(catalog).extract(message, &mut participants);
//! assert_eq!(participants.to_vec(), vec!["Shipping".to_string()]);
//!
//! // Synthesize and render
//! let directives = DiagramSynthesizer::default().render_tree(&tree);
//! let body = PlantUmlRenderer::new().render(&directives).unwrap();
//! assert_eq!(body, "A-[#ForestGreen]>Shipping:InvoicePaid\nactivate Shipping\ndeactivate Shipping\n");
//! ```

pub mod core;
pub mod document;
pub mod interaction;
pub mod model;

pub use crate::core::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{
        Conventions, Diagnostic, Diagnostics, DocumentOptions, FlowError, Renderer,
        SynthesisOptions,
    };
    pub use crate::document::{Document, DocumentBuilder, PlantUmlRenderer, SequenceDiagram};
    pub use crate::interaction::{
        Alt, AltSection, Arrow, ConsequenceExtractor, DiagramSynthesizer, Directive,
        DirectiveStream, GroupKind, InteractionFragment, Interactions, Participants,
    };
    pub use crate::model::{
        Catalog, Method, Parameter, Statement, TypeDescriptor, TypeModel, TypeRef,
    };
}

/// Load a model from JSON under the default conventions
///
/// # Example
/// ```rust
/// let model = flowtrace::load_model(r#"[{ "kind": "class", "fullName": "Shop.Order" }]"#).unwrap();
/// assert_eq!(model.len(), 1);
/// ```
pub fn load_model(json: &str) -> Result<model::TypeModel, FlowError> {
    model::TypeModel::from_json(json, &Conventions::default())
}

/// Render the sequence diagram of one message in a JSON model
///
/// # Returns
/// * `Ok(String)` - A complete `@startuml` ... `@enduml` diagram
/// * `Err` - If the model is malformed or the name is not a known message
pub fn sequence_diagram(json: &str, message: &str) -> anyhow::Result<String> {
    let conventions = Conventions::default();
    let model = model::TypeModel::from_json(json, &conventions)?;
    let catalog = model::Catalog::new(&model, &conventions);
    let message = catalog.message(message)?;
    let (diagram, _) =
        document::DocumentBuilder::new(catalog, DocumentOptions::default()).message_diagram(message)?;
    Ok(diagram)
}

/// Generate the AsciiDoc documentation of a JSON model
///
/// # Example
/// ```rust
/// let doc = flowtrace::generate_documentation("[]", false).unwrap();
/// assert!(doc.content.contains("// tag::events[]"));
/// ```
pub fn generate_documentation(json: &str, experimental: bool) -> anyhow::Result<document::Document> {
    let conventions = Conventions::default();
    let model = model::TypeModel::from_json(json, &conventions)?;
    let catalog = model::Catalog::new(&model, &conventions);
    document::DocumentBuilder::new(catalog, DocumentOptions { experimental }).build()
}
