//! The events chapter
//!
//! Each event gets one sub-diagram per handler: the extracted tree is cut at
//! every root arrow leaving the actor.

use anyhow::Result;
use tracing::{debug, span, Level};

use super::asciidoc::AsciiDoc;
use super::builder::{group_by_display_name, message_preamble, payload_rows, DocumentBuilder};
use super::text::{sentence_case, split_camel_case};
use crate::core::{Diagnostic, Diagnostics};
use crate::interaction::{InteractionFragment, Interactions, Participants, ACTOR};
use crate::model::TypeDescriptor;

const SECTION: &str = "events";

pub(super) fn render(
    builder: &DocumentBuilder<'_>,
    doc: &mut AsciiDoc,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    let catalog = builder.catalog();
    doc.begin_section(SECTION);

    for (name, group) in group_by_display_name(catalog.events()) {
        let event_span = span!(Level::DEBUG, "event", name = %name);
        let _enter = event_span.enter();

        message_preamble(builder, doc, &sentence_case(&name), "Event", &group);

        let (received, published): (Vec<&TypeDescriptor>, Vec<&TypeDescriptor>) = group
            .iter()
            .copied()
            .partition(|event| catalog.has_receiver_in_same_namespace(event));
        doc.bullets(
            "Event published by",
            &published.iter().filter_map(|e| publisher(e)).collect::<Vec<_>>(),
        );
        doc.bullets(
            "Event received by",
            &received.iter().filter_map(|e| receiver(e)).collect::<Vec<_>>(),
        );
        doc.payload_table(&payload_rows(&group));

        let tag = format!("events-{}", name.to_lowercase());
        doc.begin_tag(&tag);
        diagrams(builder, doc, group[0], &name, diagnostics)?;
        doc.end_tag(&tag);
        doc.blank();
    }

    doc.end_section(SECTION);
    Ok(())
}

/// `Shop.Billing.Events.InvoicePaid` → `Billing`
fn publisher(event: &TypeDescriptor) -> Option<String> {
    let namespace = event.namespace();
    namespace.rsplit('.').nth(1).map(split_camel_case)
}

/// `Shop.ShippingService.Handlers.InvoicePaid` → `Shipping Service`
fn receiver(event: &TypeDescriptor) -> Option<String> {
    let namespace = event.namespace();
    namespace.split('.').nth(1).map(split_camel_case)
}

fn diagrams(
    builder: &DocumentBuilder<'_>,
    doc: &mut AsciiDoc,
    event: &TypeDescriptor,
    name: &str,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    let mut participants = Participants::new();
    let interactions =
        builder
            .extractor()
            .extract_with_diagnostics(event, &mut participants, diagnostics);
    if interactions.is_empty() {
        debug!("No handlers, skipping diagram");
        return Ok(());
    }

    let callers = builder.catalog().calling_services(event);
    if callers.len() > 1 {
        diagnostics.push(Diagnostic::AmbiguousCaller {
            message: event.full_name.clone(),
            services: callers.clone(),
        });
    }

    for mut handled in split_at_actor(interactions) {
        if let (Some(arrow), [caller]) = (handled.root_arrows_mut().next(), callers.as_slice()) {
            if arrow.source == ACTOR {
                arrow.source = caller.clone();
            }
        }

        let handler = handled
            .arrows()
            .next()
            .map(|arrow| split_camel_case(&arrow.target))
            .unwrap_or_default();
        let services: Vec<String> = participants
            .iter()
            .filter(|service| handled.arrows().any(|arrow| arrow.target == *service))
            .map(str::to_string)
            .collect();

        let diagram = builder.render_sequence(&handled, services, callers.clone(), false)?;
        doc.line(format!("=== {}", handler));
        doc.blank();
        doc.plantuml(
            &format!("{} Event as handled by {}", sentence_case(name), handler),
            &diagram,
        );
        doc.blank();
    }
    Ok(())
}

/// Cut a tree before every root arrow leaving the actor
fn split_at_actor(interactions: Interactions) -> Vec<Interactions> {
    let mut parts = Vec::new();
    let mut current = Interactions::new();
    for fragment in interactions {
        let starts_part = matches!(&fragment, InteractionFragment::Arrow(arrow) if arrow.source == ACTOR);
        if starts_part && !current.is_empty() {
            parts.push(std::mem::take(&mut current));
        }
        current.push(fragment);
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::Arrow;

    #[test]
    fn test_split_at_actor() {
        let mut tree = Interactions::new();
        tree.push(Arrow::new("A", "Billing", "Paid"));
        tree.push(Arrow::new("Billing", "Q", "Invoiced"));
        tree.push(Arrow::new("A", "Shipping", "Paid"));

        let parts = split_at_actor(tree);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].len(), 2);
        assert_eq!(parts[1].len(), 1);
    }

    #[test]
    fn test_publisher_and_receiver_names() {
        let event = TypeDescriptor::class("Pitstop.WorkshopManagementAPI.Events.JobPlanned");
        assert_eq!(publisher(&event).as_deref(), Some("Workshop Management API"));
        assert_eq!(receiver(&event).as_deref(), Some("Workshop Management API"));
    }
}
