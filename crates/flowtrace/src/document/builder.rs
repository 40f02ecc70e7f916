//! Document assembly
//!
//! [`DocumentBuilder`] drives extraction, synthesis and rendering for every
//! message in a model and assembles the results into one AsciiDoc document.

use anyhow::{Context, Result};
use indexmap::{IndexMap, IndexSet};
use tracing::{debug, info, span, Level};

use super::asciidoc::AsciiDoc;
use super::plantuml::{PlantUmlRenderer, SequenceDiagram};
use super::{aggregates, commands, events};
use crate::core::{Diagnostic, Diagnostics, DocumentOptions, Renderer};
use crate::interaction::{
    Arrow, ConsequenceExtractor, DiagramSynthesizer, Interactions, Participants, ACTOR,
};
use crate::model::{Catalog, TypeDescriptor, TypeRef};

/// A generated document together with what was noticed while building it
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub content: String,
    pub diagnostics: Diagnostics,
}

/// Builds AsciiDoc documentation for a catalog
#[derive(Debug, Clone, Copy)]
pub struct DocumentBuilder<'a> {
    catalog: Catalog<'a>,
    options: DocumentOptions,
}

impl<'a> DocumentBuilder<'a> {
    pub fn new(catalog: Catalog<'a>, options: DocumentOptions) -> Self {
        Self { catalog, options }
    }

    pub fn catalog(&self) -> Catalog<'a> {
        self.catalog
    }

    pub fn options(&self) -> DocumentOptions {
        self.options
    }

    pub(crate) fn extractor(&self) -> ConsequenceExtractor<'a> {
        ConsequenceExtractor::new(self.catalog)
    }

    /// Header, aggregates, events, then commands
    pub fn build(&self) -> Result<Document> {
        let build_span = span!(Level::INFO, "build_document", types = self.catalog.model().len());
        let _enter = build_span.enter();

        let mut doc = AsciiDoc::new();
        let mut diagnostics = Diagnostics::new();

        header(&mut doc);
        aggregates::render(self, &mut doc);
        events::render(self, &mut doc, &mut diagnostics).context("Failed to render events")?;
        commands::render(self, &mut doc, &mut diagnostics).context("Failed to render commands")?;

        info!(
            bytes = doc.as_str().len(),
            diagnostics = diagnostics.len(),
            warnings = diagnostics.warnings().count(),
            "Document assembled"
        );
        Ok(Document {
            content: doc.into_string(),
            diagnostics,
        })
    }

    /// The complete sequence diagram of one message, unsplit and with a legend
    pub fn message_diagram(&self, message: &TypeDescriptor) -> Result<(String, Diagnostics)> {
        let mut diagnostics = Diagnostics::new();
        let mut participants = Participants::new();
        let mut interactions =
            self.extractor()
                .extract_with_diagnostics(message, &mut participants, &mut diagnostics);

        let callers = self.catalog.calling_services(message);
        if let Some(first) = interactions.root_arrows_mut().next() {
            self.rewrite_caller(message, first, &callers, &mut diagnostics);
        }

        let diagram = self.render_sequence(&interactions, participants.to_vec(), callers, true)?;
        Ok((diagram, diagnostics))
    }

    /// Point an arrow leaving the actor at the one service that sends `message`.
    /// Several candidate senders leave the actor in place.
    pub(crate) fn rewrite_caller(
        &self,
        message: &TypeDescriptor,
        arrow: &mut Arrow,
        callers: &[String],
        diagnostics: &mut Diagnostics,
    ) {
        if arrow.source != ACTOR {
            return;
        }
        match callers {
            [caller] => arrow.source = caller.clone(),
            [] => {}
            _ => diagnostics.push(Diagnostic::AmbiguousCaller {
                message: message.full_name.clone(),
                services: callers.to_vec(),
            }),
        }
    }

    /// Synthesize, render and wrap one interaction tree
    pub(crate) fn render_sequence(
        &self,
        interactions: &Interactions,
        services: Vec<String>,
        callers: Vec<String>,
        legend: bool,
    ) -> Result<String> {
        let directives = DiagramSynthesizer::new(self.options.synthesis()).render_tree(interactions);
        let body = PlantUmlRenderer::new().render(&directives)?;
        debug!(directives = directives.len(), services = services.len(), "Rendered sequence");

        let mut diagram = SequenceDiagram::new(body)
            .experimental(self.options.experimental)
            .with_callers(callers)
            .with_services(services);
        if legend {
            diagram = diagram.with_legend();
        }
        Ok(diagram.render())
    }
}

fn header(doc: &mut AsciiDoc) {
    doc.line("= Living Documentation");
    doc.line(format!(":revnumber: {}", env!("CARGO_PKG_VERSION")));
    doc.line(":toc: left");
    doc.line(":toclevels: 2");
    doc.line(":sectnums:");
    doc.line(":plantuml-format: svg");
    doc.blank();
    doc.line("NOTE: This document contains generated content.");
    doc.blank();
}

/// Messages grouped under their display name, in model order
pub(super) fn group_by_display_name<'a>(
    messages: Vec<&'a TypeDescriptor>,
) -> IndexMap<String, Vec<&'a TypeDescriptor>> {
    let mut groups: IndexMap<String, Vec<&'a TypeDescriptor>> = IndexMap::new();
    for message in messages {
        groups.entry(message.display_name()).or_default().push(message);
    }
    groups
}

/// Payload rows for a message group: distinct fields sorted by name
pub(super) fn payload_rows(group: &[&TypeDescriptor]) -> Vec<(String, String, String)> {
    let mut seen = IndexSet::new();
    let mut rows: Vec<(String, String, String)> = group
        .iter()
        .flat_map(|message| message.fields.iter())
        .filter(|field| seen.insert((field.type_name.clone(), field.name.clone())))
        .map(|field| {
            (
                field.name.clone(),
                TypeRef::parse(&field.type_name).for_diagram(),
                field.summary().unwrap_or_default().to_string(),
            )
        })
        .collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0));
    rows
}

/// Opening lines shared by the event and command chapters
pub(super) fn message_preamble(
    builder: &DocumentBuilder<'_>,
    doc: &mut AsciiDoc,
    heading: &str,
    kind: &str,
    group: &[&TypeDescriptor],
) {
    let Some(first) = group.first() else {
        return;
    };
    doc.line(format!("== {}", heading));
    doc.blank();
    if let Some(summary) = first.summary() {
        doc.line(summary.trim());
        doc.blank();
    }
    if let Some(reason) = builder.catalog.conventions().deprecation(first) {
        doc.important(&format!("{} is deprecated", kind), &reason);
    }
}
