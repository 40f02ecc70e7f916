//! Integration tests for AsciiDoc document assembly

use flowtrace::model::{Attribute, Invocation, Member};
use flowtrace::prelude::*;

const EVENT: &str = "Pitstop.Infrastructure.Messaging.Event";
const COMMAND: &str = "Pitstop.Infrastructure.Messaging.Command";
const CALLBACK: &str = "Pitstop.Infrastructure.Messaging.IMessageHandlerCallback";
const PUBLISHER: &str = "Pitstop.Infrastructure.Messaging.IMessagePublisher";
const AGGREGATE_ROOT: &str = "Pitstop.WorkshopManagementAPI.Domain.Core.AggregateRoot";

fn publish(message: &str) -> Statement {
    Invocation::new(PUBLISHER, "PublishMessageAsync")
        .with_argument("System.String", "\"type\"")
        .with_argument(message, "e")
        .into_statement()
}

/// A controller creating `message` through its constructor
fn creator(controller: &str, message: &str) -> TypeDescriptor {
    let name = message.rsplit('.').next().unwrap();
    TypeDescriptor::class(controller)
        .with_method(Method::new("Send").with_statement(Invocation::new(message, name).into_statement()))
}

fn workshop() -> Vec<TypeDescriptor> {
    vec![
        TypeDescriptor::class(EVENT),
        TypeDescriptor::class(COMMAND),
        TypeDescriptor::class("Pitstop.WorkshopManagementAPI.Commands.PlanMaintenanceJob")
            .with_base(COMMAND)
            .with_summary("Plans a job in the workshop.")
            .with_field(Member::new("JobId", "System.Guid").with_summary("Job to plan")),
        TypeDescriptor::class("Pitstop.WorkshopManagementAPI.Events.MaintenanceJobPlanned").with_base(EVENT),
        TypeDescriptor::class("Pitstop.WorkshopManagementAPI.Controllers.WorkshopPlanningController").with_method(
            Method::new("PlanMaintenanceJobAsync")
                .with_parameter(
                    Parameter::new("command", "Pitstop.WorkshopManagementAPI.Commands.PlanMaintenanceJob")
                        .with_attribute(Attribute::new("Microsoft.AspNetCore.Mvc.FromBodyAttribute")),
                )
                .with_statement(publish("Pitstop.WorkshopManagementAPI.Events.MaintenanceJobPlanned")),
        ),
        TypeDescriptor::class("Pitstop.WebApp.Commands.PlanMaintenanceJob"),
        creator(
            "Pitstop.WebApp.Controllers.WorkshopController",
            "Pitstop.WebApp.Commands.PlanMaintenanceJob",
        ),
    ]
}

fn build(types: Vec<TypeDescriptor>, options: DocumentOptions) -> Document {
    let conventions = Conventions::default();
    let model = TypeModel::from_types(types, &conventions).unwrap();
    DocumentBuilder::new(Catalog::new(&model, &conventions), options)
        .build()
        .unwrap()
}

fn position(content: &str, needle: &str) -> usize {
    content
        .find(needle)
        .unwrap_or_else(|| panic!("missing {needle:?} in\n{content}"))
}

#[test]
fn test_chapters_in_order() {
    let mut types = workshop();
    types.push(
        TypeDescriptor::class("Pitstop.WorkshopManagementAPI.Domain.WorkshopPlanning")
            .with_base(format!(
                "{}<Pitstop.WorkshopManagementAPI.Domain.ValueObjects.WorkshopPlanningId>",
                AGGREGATE_ROOT
            )),
    );
    types.push(TypeDescriptor::class(
        "Pitstop.WorkshopManagementAPI.Domain.ValueObjects.WorkshopPlanningId",
    ));
    let content = build(types, DocumentOptions::default()).content;

    assert!(content.starts_with("= Living Documentation\n"));
    let aggregate = position(&content, "// tag::aggregate-workshopplanning[]");
    let events = position(&content, "// tag::events[]");
    let commands = position(&content, "// tag::commands[]");
    assert!(aggregate < events && events < commands);
    assert!(content.contains(".Aggregate - Workshop planning\n"));
    assert!(content.contains("WorkshopPlanningId -- WorkshopPlanning\n"));
}

#[test]
fn test_command_chapter() {
    let document = build(workshop(), DocumentOptions::default());
    let content = &document.content;

    assert!(content.contains("== Plan maintenance job\n\nPlans a job in the workshop.\n"));
    assert!(content.contains("|JobId\n|Guid\n|Job to plan\n"));
    assert!(content.contains("// tag::commands-planmaintenancejob[]"));
    assert!(content.contains(".Plan maintenance job Command\n"));
    assert!(content.contains("participant \"Web App\" as WebApp\n"));
    assert!(content.contains("WebApp-[#DodgerBlue]>WorkshopManagementAPI:PlanMaintenanceJob\n"));
    assert!(content.contains("WorkshopManagementAPI-[#ForestGreen]>Q:MaintenanceJobPlanned\n"));
    assert!(content.contains("legend bottom right\n"));
    assert!(!content.contains("!pragma teoz true"));
}

#[test]
fn test_unhandled_messages_have_no_diagram() {
    let content = build(workshop(), DocumentOptions::default()).content;

    assert!(content.contains("== Maintenance job planned\n"));
    assert!(!content.contains("// tag::events-maintenancejobplanned[]\n."));
    assert_eq!(content.matches("@startuml").count(), 1);
}

#[test]
fn test_event_split_per_handler() {
    let types = vec![
        TypeDescriptor::class(EVENT),
        TypeDescriptor::class("Pitstop.Billing.Events.InvoicePaid").with_base(EVENT),
        TypeDescriptor::class("Pitstop.Shipping.Handlers.PaymentHandler").with_base(CALLBACK).with_method(
            Method::new("HandleAsync").with_parameter(Parameter::new("e", "Pitstop.Shipping.Events.InvoicePaid")),
        ),
        TypeDescriptor::class("Pitstop.Audit.Handlers.AuditHandler").with_base(CALLBACK).with_method(
            Method::new("HandleAsync").with_parameter(Parameter::new("e", "Pitstop.Audit.Events.InvoicePaid")),
        ),
    ];
    let content = build(types, DocumentOptions::default()).content;

    assert!(content.contains(".Event published by\n* Billing\n"));
    let shipping = position(&content, "=== Shipping\n");
    let audit = position(&content, "=== Audit\n");
    assert!(shipping < audit);
    assert!(content.contains(".Invoice paid Event as handled by Shipping\n"));
    assert!(content.contains(".Invoice paid Event as handled by Audit\n"));
    assert_eq!(content.matches("@startuml").count(), 2);
    assert!(!content.contains("legend bottom right"));
}

#[test]
fn test_several_senders_keep_the_actor() {
    let types = vec![
        TypeDescriptor::class(EVENT),
        TypeDescriptor::class("Pitstop.Billing.Events.InvoicePaid").with_base(EVENT),
        TypeDescriptor::class("Pitstop.Accounting.Events.InvoicePaid"),
        TypeDescriptor::class("Pitstop.Shipping.Handlers.PaymentHandler").with_base(CALLBACK).with_method(
            Method::new("HandleAsync").with_parameter(Parameter::new("e", "Pitstop.Shipping.Events.InvoicePaid")),
        ),
        creator("Pitstop.Billing.Controllers.InvoiceController", "Pitstop.Billing.Events.InvoicePaid"),
        creator("Pitstop.Accounting.Controllers.LedgerController", "Pitstop.Accounting.Events.InvoicePaid"),
    ];
    let document = build(types, DocumentOptions::default());

    assert!(document.content.contains("A-[#ForestGreen]>Shipping:InvoicePaid\n"));
    let ambiguous: Vec<_> = document
        .diagnostics
        .iter()
        .filter_map(|d| match d {
            Diagnostic::AmbiguousCaller { message, services } => Some((message.as_str(), services.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(
        ambiguous,
        vec![(
            "Pitstop.Billing.Events.InvoicePaid",
            vec!["Billing".to_string(), "Accounting".to_string()]
        )]
    );
}

#[test]
fn test_deprecated_message() {
    let types = vec![
        TypeDescriptor::class(EVENT),
        TypeDescriptor::class("Pitstop.Billing.Events.InvoiceVoided")
            .with_base(EVENT)
            .with_attribute(Attribute::new("System.ObsoleteAttribute").with_argument("\"Use InvoiceCancelled\"")),
    ];
    let content = build(types, DocumentOptions::default()).content;

    assert!(content.contains("[IMPORTANT]\n====\n*Event is deprecated* + \n Use InvoiceCancelled\n====\n"));
}

#[test]
fn test_experimental_layout() {
    let content = build(
        workshop(),
        DocumentOptions {
            experimental: true,
        },
    )
    .content;
    assert!(content.contains("!pragma teoz true\n"));
}

#[test]
fn test_message_diagram_matches_document() {
    let conventions = Conventions::default();
    let model = TypeModel::from_types(workshop(), &conventions).unwrap();
    let catalog = Catalog::new(&model, &conventions);
    let builder = DocumentBuilder::new(catalog, DocumentOptions::default());

    let command = catalog
        .message("Pitstop.WorkshopManagementAPI.Commands.PlanMaintenanceJob")
        .unwrap();
    let (diagram, diagnostics) = builder.message_diagram(command).unwrap();

    assert!(diagnostics.is_empty());
    assert!(builder.build().unwrap().content.contains(&diagram));
}
