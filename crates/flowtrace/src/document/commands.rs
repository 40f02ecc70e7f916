//! The commands chapter

use anyhow::Result;
use tracing::{span, Level};

use super::asciidoc::AsciiDoc;
use super::builder::{group_by_display_name, message_preamble, payload_rows, DocumentBuilder};
use super::text::sentence_case;
use crate::core::Diagnostics;
use crate::interaction::Participants;
use crate::model::TypeDescriptor;

const SECTION: &str = "commands";

pub(super) fn render(
    builder: &DocumentBuilder<'_>,
    doc: &mut AsciiDoc,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    let catalog = builder.catalog();
    doc.begin_section(SECTION);

    for (name, group) in group_by_display_name(catalog.commands()) {
        let command_span = span!(Level::DEBUG, "command", name = %name);
        let _enter = command_span.enter();

        message_preamble(builder, doc, &sentence_case(&name), "Command", &group);
        doc.payload_table(&payload_rows(&group));

        let command = group[0];
        if catalog.command_handlers_for(command).is_empty() {
            continue;
        }

        let tag = format!("commands-{}", name.to_lowercase());
        doc.begin_tag(&tag);
        diagram(builder, doc, command, &name, diagnostics)?;
        doc.end_tag(&tag);
        doc.blank();
    }

    doc.end_section(SECTION);
    Ok(())
}

fn diagram(
    builder: &DocumentBuilder<'_>,
    doc: &mut AsciiDoc,
    command: &TypeDescriptor,
    name: &str,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    let mut participants = Participants::new();
    let mut interactions =
        builder
            .extractor()
            .extract_with_diagnostics(command, &mut participants, diagnostics);

    let callers = builder.catalog().calling_services(command);
    if let Some(first) = interactions.root_arrows_mut().next() {
        builder.rewrite_caller(command, first, &callers, diagnostics);
    }

    let diagram = builder.render_sequence(&interactions, participants.to_vec(), callers, true)?;
    doc.plantuml(&format!("{} Command", sentence_case(name)), &diagram);
    Ok(())
}
