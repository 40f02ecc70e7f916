//! PlantUML emission
//!
//! [`PlantUmlRenderer`] writes the body of a sequence diagram from a
//! [`DirectiveStream`]; [`SequenceDiagram`] wraps such a body with the
//! preamble, styling and participant declarations.

use std::fmt::Write as _;

use anyhow::Result;
use tracing::trace;

use super::text::service_display_name;
use crate::core::{FlowError, Renderer};
use crate::interaction::{Directive, DirectiveStream, GroupStyle};
use crate::model::{COMMAND_COLOR, EVENT_COLOR};

const SKIN_PARAMETERS: &[&str] = &[
    "skinparam SequenceMessageAlign reverseDirection",
    "skinparam SequenceGroupBodyBackgroundColor Transparent",
    "skinparam SequenceBoxBackgroundColor #Gainsboro",
    "skinparam SequenceArrowThickness 2",
    "skinparam BoxPadding 10",
    "skinparam ParticipantPadding 10",
    "skinparam LifeLineStrategy solid",
    "skinparam WrapMessageWidth 250",
    "skinparam WrapWidth 250",
    "skinparam NoteBackgroundColor Khaki",
    "skinparam NoteBorderColor Black",
    "skinparam Shadowing<<noshadow>> False",
];

/// Renders directives as PlantUML sequence-diagram lines
#[derive(Debug, Clone, Copy, Default)]
pub struct PlantUmlRenderer;

impl PlantUmlRenderer {
    pub fn new() -> Self {
        Self
    }

    fn line(directive: &Directive) -> String {
        match directive {
            Directive::Arrow {
                source,
                target,
                label,
                color,
                dashed,
                parallel,
            } => {
                let mut line = String::new();
                if *parallel {
                    line.push_str("& ");
                }
                line.push_str(source);
                line.push('-');
                if let Some(color) = color {
                    let _ = write!(line, "[#{}]", color);
                }
                if *dashed {
                    line.push('-');
                }
                let _ = write!(line, ">{}:{}", target, label);
                line
            }
            Directive::Activate { participant } => format!("activate {}", participant),
            Directive::Deactivate { participant } => format!("deactivate {}", participant),
            Directive::Spacer => "||5||".to_string(),
            Directive::GroupStart { style, label } => match style {
                GroupStyle::Alternative => format!("alt [{}]", label),
                GroupStyle::Switch => format!("group switch\nelse {}", label),
                GroupStyle::Loop => format!("group forEach [{}]", label),
                GroupStyle::StateMachine => format!("group #Khaki stateMachine\nelse {}", label),
            },
            Directive::GroupElse { style, label } => match style {
                GroupStyle::Alternative | GroupStyle::Loop => format!("else [{}]", label),
                GroupStyle::Switch | GroupStyle::StateMachine => format!("else {}", label),
            },
            Directive::GroupEnd => "end".to_string(),
        }
    }
}

impl Renderer for PlantUmlRenderer {
    type Output = String;

    fn render(&self, directives: &DirectiveStream) -> Result<String> {
        let mut out = String::new();
        for directive in directives {
            if let Directive::Arrow { source, target, label, .. } = directive {
                if source.is_empty() || target.is_empty() {
                    return Err(FlowError::render_error(format!(
                        "arrow '{}' has no {}",
                        label,
                        if source.is_empty() { "source" } else { "target" }
                    ))
                    .into());
                }
            }
            out.push_str(&Self::line(directive));
            out.push('\n');
        }
        trace!(lines = directives.len(), "Rendered PlantUML body");
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "plantuml"
    }

    fn format(&self) -> &'static str {
        "text/x-plantuml"
    }
}

/// A complete `@startuml` ... `@enduml` sequence diagram
#[derive(Debug, Clone, Default)]
pub struct SequenceDiagram {
    experimental: bool,
    legend: bool,
    callers: Vec<String>,
    services: Vec<String>,
    body: String,
}

impl SequenceDiagram {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    /// Enable the teoz layout engine
    pub fn experimental(mut self, experimental: bool) -> Self {
        self.experimental = experimental;
        self
    }

    /// Add the command/event color legend
    pub fn with_legend(mut self) -> Self {
        self.legend = true;
        self
    }

    /// Services sending the originating message, declared outside the box
    pub fn with_callers(mut self, callers: impl IntoIterator<Item = String>) -> Self {
        self.callers = callers.into_iter().collect();
        self
    }

    /// Participants declared inside the "Services" box, in order
    pub fn with_services(mut self, services: impl IntoIterator<Item = String>) -> Self {
        self.services = services.into_iter().collect();
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("@startuml\n");
        if self.experimental {
            out.push_str("!pragma teoz true\n");
        }
        for parameter in SKIN_PARAMETERS {
            out.push_str(parameter);
            out.push('\n');
        }
        out.push_str("scale max 4096 height\n");

        if self.legend {
            out.push_str("legend bottom right\n");
            out.push_str("|= |= Message |\n");
            let _ = writeln!(out, "|<#{}>   | Command |", COMMAND_COLOR);
            let _ = writeln!(out, "|<#{}>   | Event |", EVENT_COLOR);
            out.push_str("endlegend\n");
        }

        for caller in self.callers.iter().filter(|c| !self.services.contains(c)) {
            let _ = writeln!(out, "participant \"{}\" as {}", service_display_name(caller), caller);
        }

        out.push_str("box \"Services\" #Ivory\n");
        for service in &self.services {
            match entity_caption(service) {
                Some(entity) => {
                    let _ = writeln!(out, "entity \"{}\" as {}", entity, service);
                }
                None => {
                    let _ = writeln!(
                        out,
                        "participant \"{}\" as {}",
                        service_display_name(service),
                        service
                    );
                }
            }
        }
        out.push_str("end box\n");

        out.push_str(&self.body);
        out.push_str("@enduml\n");
        out
    }
}

/// `Billing_Invoice_Entity` → `Invoice`
fn entity_caption(participant: &str) -> Option<&str> {
    if !participant.ends_with("Entity") {
        return None;
    }
    participant.split('_').nth(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arrow(parallel: bool, dashed: bool, color: Option<&str>) -> Directive {
        Directive::Arrow {
            source: "Billing".to_string(),
            target: "Q".to_string(),
            label: "InvoiceCreated".to_string(),
            color: color.map(str::to_string),
            dashed,
            parallel,
        }
    }

    #[test]
    fn test_arrow_lines() {
        assert_eq!(
            PlantUmlRenderer::line(&arrow(false, false, Some("ForestGreen"))),
            "Billing-[#ForestGreen]>Q:InvoiceCreated"
        );
        assert_eq!(
            PlantUmlRenderer::line(&arrow(true, true, None)),
            "& Billing-->Q:InvoiceCreated"
        );
    }

    #[test]
    fn test_group_framing() {
        let mut stream = DirectiveStream::new();
        stream.push(Directive::GroupStart {
            style: GroupStyle::Switch,
            label: "Status.Open".to_string(),
        });
        stream.push(Directive::GroupElse {
            style: GroupStyle::Switch,
            label: "Status.Closed".to_string(),
        });
        stream.push(Directive::GroupEnd);

        let text = PlantUmlRenderer::new().render(&stream).unwrap();
        assert_eq!(text, "group switch\nelse Status.Open\nelse Status.Closed\nend\n");
    }

    #[test]
    fn test_blank_participant_rejected() {
        let mut stream = DirectiveStream::new();
        stream.push(Directive::Arrow {
            source: String::new(),
            target: "Billing".to_string(),
            label: "Go".to_string(),
            color: None,
            dashed: false,
            parallel: false,
        });
        let error = PlantUmlRenderer::new().render(&stream).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<FlowError>(),
            Some(FlowError::RenderError { .. })
        ));
    }

    #[test]
    fn test_sequence_diagram_declarations() {
        let diagram = SequenceDiagram::new("A->Billing:Go\n")
            .experimental(true)
            .with_callers(vec!["WebApp".to_string()])
            .with_services(vec!["Billing".to_string(), "Billing_Invoice_Entity".to_string()])
            .render();

        assert!(diagram.starts_with("@startuml\n!pragma teoz true\n"));
        assert!(diagram.contains("participant \"Web App\" as WebApp\n"));
        assert!(diagram.contains("entity \"Invoice\" as Billing_Invoice_Entity\n"));
        assert!(diagram.ends_with("A->Billing:Go\n@enduml\n"));
        assert!(!diagram.contains("legend"));
    }
}
