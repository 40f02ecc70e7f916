//! The aggregates chapter: one class diagram per aggregate root

use std::collections::HashSet;
use std::fmt::Write as _;

use tracing::trace;

use super::asciidoc::AsciiDoc;
use super::builder::DocumentBuilder;
use super::text::sentence_case;
use crate::core::Conventions;
use crate::model::{Modifier, TypeDescriptor, TypeKind, TypeModel, TypeRef};

pub(super) fn render(builder: &DocumentBuilder<'_>, doc: &mut AsciiDoc) {
    let catalog = builder.catalog();
    let conventions = catalog.conventions();
    let model = catalog.model();

    for aggregate in model.iter().filter(|t| conventions.is_aggregate_root(t)) {
        let name = aggregate.name();
        let section = format!("aggregate-{}", name.to_lowercase());
        doc.begin_section(&section);
        doc.plantuml(
            &format!("Aggregate - {}", sentence_case(&name)),
            &class_diagram(model, conventions, aggregate),
        );
        doc.end_section(&section);
    }
}

fn class_diagram(model: &TypeModel, conventions: &Conventions, aggregate: &TypeDescriptor) -> String {
    let name = aggregate.name();
    let mut out = String::new();
    out.push_str("@startuml\n");
    out.push_str("skinparam MinClassWidth 160\n");
    out.push_str("scale max 4096 height\n");
    let _ = writeln!(out, "namespace {} <<aggregate>> {{", name);

    let mut visited = HashSet::new();
    let id = conventions
        .aggregate_root_id(aggregate)
        .and_then(|id| model.resolve(&id));
    if let Some(id) = id {
        class(model, conventions, id, &mut visited, &mut out);
        let _ = writeln!(out, "{} -- {}", id.name(), name);
    }
    class(model, conventions, aggregate, &mut visited, &mut out);

    out.push_str("}\n");
    out.push_str("@enduml\n");
    out
}

/// Declare `descriptor`, then every model type reachable through its properties
fn class(
    model: &TypeModel,
    conventions: &Conventions,
    descriptor: &TypeDescriptor,
    visited: &mut HashSet<String>,
    out: &mut String,
) {
    if !visited.insert(descriptor.full_name.clone()) {
        return;
    }
    trace!(class = %descriptor.full_name, "Declaring class");

    let keyword = if descriptor.kind == TypeKind::Enum { "enum" } else { "class" };
    let abstract_prefix = if descriptor.is_abstract() { "abstract " } else { "" };
    let _ = write!(out, "{}{} {} ", abstract_prefix, keyword, descriptor.name());
    if let Some(stereotype) = stereotype(conventions, descriptor) {
        let _ = write!(out, "<<{}>> ", stereotype);
    }
    out.push_str("{\n");

    if descriptor.kind == TypeKind::Enum {
        for member in &descriptor.enum_members {
            let _ = writeln!(out, "  {}", member.name);
        }
    } else {
        for property in descriptor.properties.iter().filter(|p| !p.modifiers.contains(&Modifier::Private)) {
            let _ = writeln!(
                out,
                "  {}{}{}: {}",
                visibility(&property.modifiers),
                static_marker(&property.modifiers),
                property.name,
                property.type_ref().for_diagram()
            );
        }
        for method in descriptor.methods.iter().filter(|m| !m.is_private() && !m.is_override()) {
            let parameters: Vec<String> = method
                .parameters
                .iter()
                .map(|p| TypeRef::parse(&p.type_name).for_diagram())
                .collect();
            let _ = writeln!(
                out,
                "  {}{}{}({})",
                visibility(&method.modifiers),
                static_marker(&method.modifiers),
                method.name,
                parameters.join(", ")
            );
        }
    }
    out.push_str("}\n");

    for property in &descriptor.properties {
        let reference = property.type_ref();
        let (related, many) = match model.get(&property.type_name) {
            Some(related) => (related, false),
            None if reference.is_enumerable() => {
                match reference.arguments.first().and_then(|a| model.get(&a.to_string())) {
                    Some(related) => (related, true),
                    None => continue,
                }
            }
            None => continue,
        };
        class(model, conventions, related, visited, out);
        let _ = writeln!(
            out,
            "{} -- {}{}",
            descriptor.name(),
            related.name(),
            if many { " : 1..*" } else { "" }
        );
    }
}

fn stereotype(conventions: &Conventions, descriptor: &TypeDescriptor) -> Option<&'static str> {
    if conventions.is_enumeration(descriptor) {
        Some("enumeration")
    } else if conventions.is_aggregate_root(descriptor) {
        Some("(R,LightGreen)root")
    } else if conventions.is_value_object(descriptor) {
        Some("(O,LightBlue)value object")
    } else if conventions.is_entity(descriptor) {
        Some("entity")
    } else {
        None
    }
}

fn visibility(modifiers: &[Modifier]) -> &'static str {
    if modifiers.contains(&Modifier::Public) {
        "+"
    } else if modifiers.contains(&Modifier::Protected) {
        "#"
    } else if modifiers.contains(&Modifier::Internal) {
        "~"
    } else if modifiers.contains(&Modifier::Private) {
        "-"
    } else {
        ""
    }
}

fn static_marker(modifiers: &[Modifier]) -> &'static str {
    if modifiers.contains(&Modifier::Static) {
        "{static} "
    } else {
        ""
    }
}
