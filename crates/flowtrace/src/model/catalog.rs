//! Queries over a [`TypeModel`] under a set of [`Conventions`]
//!
//! The catalog answers the questions the extractor and the document ask of
//! the model: who handles a message, which method receives it, which method
//! a call lands in, and who sends a message in the first place.

use indexmap::IndexSet;
use tracing::trace;

use super::type_model::TypeModel;
use super::types::{Invocation, Method, TypeDescriptor, TypeKind};
use crate::core::{Conventions, Diagnostic, Diagnostics, FlowError};

/// Borrowed view of a model together with its conventions
#[derive(Debug, Clone, Copy)]
pub struct Catalog<'a> {
    model: &'a TypeModel,
    conventions: &'a Conventions,
}

impl<'a> Catalog<'a> {
    pub fn new(model: &'a TypeModel, conventions: &'a Conventions) -> Self {
        Self { model, conventions }
    }

    pub fn model(&self) -> &'a TypeModel {
        self.model
    }

    pub fn conventions(&self) -> &'a Conventions {
        self.conventions
    }

    /// Look up a message by full name
    pub fn message(&self, full_name: &str) -> Result<&'a TypeDescriptor, FlowError> {
        let descriptor = self
            .model
            .get(full_name)
            .ok_or_else(|| FlowError::unknown_message(full_name))?;
        if !self.conventions.is_message(descriptor) {
            return Err(FlowError::not_a_message(full_name));
        }
        Ok(descriptor)
    }

    /// Events in model order
    pub fn events(&self) -> Vec<&'a TypeDescriptor> {
        self.model
            .iter()
            .filter(|t| self.conventions.is_event(t))
            .collect()
    }

    /// Commands in model order
    pub fn commands(&self) -> Vec<&'a TypeDescriptor> {
        self.model
            .iter()
            .filter(|t| self.conventions.is_command(t))
            .collect()
    }

    /// Types owning a method that binds `message` from the request body
    pub fn command_handlers_for(&self, message: &TypeDescriptor) -> Vec<&'a TypeDescriptor> {
        let suffix = &self.conventions.request_body_attribute_suffix;
        self.model
            .iter()
            .filter(|t| {
                t.methods.iter().any(|m| {
                    m.parameters.iter().any(|p| {
                        p.type_name == message.full_name
                            && p.attributes.iter().any(|a| a.type_name.ends_with(suffix.as_str()))
                    })
                })
            })
            .collect()
    }

    /// Callback classes with an event-handling method taking `message`
    pub fn event_handlers_for(&self, message: &TypeDescriptor) -> Vec<&'a TypeDescriptor> {
        let parameter_suffix = format!(".{}", message.name());
        self.model
            .iter()
            .filter(|t| {
                t.kind == TypeKind::Class
                    && t.base_types
                        .iter()
                        .any(|b| *b == self.conventions.message_handler_callback)
            })
            .filter(|t| {
                t.methods.iter().any(|m| {
                    m.name == self.conventions.event_handling_method
                        && m.parameters
                            .iter()
                            .any(|p| p.type_name.ends_with(&parameter_suffix))
                })
            })
            .collect()
    }

    /// Command handlers first, then event handlers
    pub fn handlers_for(&self, message: &TypeDescriptor) -> Vec<&'a TypeDescriptor> {
        let mut handlers = self.command_handlers_for(message);
        handlers.extend(self.event_handlers_for(message));
        trace!(message = %message.full_name, handlers = handlers.len(), "Resolved handlers");
        handlers
    }

    /// The method of `handler` that receives `message`
    pub fn handling_method(
        &self,
        handler: &'a TypeDescriptor,
        message: &TypeDescriptor,
    ) -> Option<&'a Method> {
        let parameter_suffix = format!(".{}", message.name());
        let takes_by_suffix =
            |m: &Method| m.parameters.iter().any(|p| p.type_name.ends_with(&parameter_suffix));

        if self.conventions.is_event(message) {
            return handler
                .methods
                .iter()
                .find(|m| m.name == self.conventions.event_handling_method && takes_by_suffix(m));
        }

        if self.conventions.is_command(message) {
            let suffix = &self.conventions.request_body_attribute_suffix;
            return handler.methods.iter().find(|m| {
                m.parameters.iter().any(|p| {
                    p.type_name == message.full_name
                        && p.attributes.iter().any(|a| a.type_name.ends_with(suffix.as_str()))
                }) || (m.name == self.conventions.command_handling_method && takes_by_suffix(m))
            });
        }

        None
    }

    /// The method an invocation lands in. Calls through an interface go to
    /// the first implementation in model order.
    pub fn resolve_invocation(
        &self,
        invocation: &Invocation,
        diagnostics: &mut Diagnostics,
    ) -> Option<&'a Method> {
        let declared = self.model.resolve(&invocation.containing_type)?;

        let target = if declared.kind == TypeKind::Interface {
            let implementations = self.model.implementations_of(&declared.full_name);
            let chosen = implementations.first().copied()?;
            if implementations.len() > 1 {
                diagnostics.push(Diagnostic::AmbiguousInterfaceImplementation {
                    interface: declared.full_name.clone(),
                    chosen: chosen.full_name.clone(),
                    candidates: implementations.len(),
                });
            }
            chosen
        } else {
            declared
        };

        let arity = invocation.arguments.len();
        let mut candidates = target.methods.iter().filter(|m| m.name == invocation.name);
        let first = candidates.next()?;
        if first.parameters.len() == arity {
            return Some(first);
        }
        Some(
            candidates
                .find(|m| m.parameters.len() == arity)
                .unwrap_or(first),
        )
    }

    /// Types whose constructor is invoked to create `message` anywhere in the model
    pub fn source_commands(&self, message: &TypeDescriptor) -> Vec<&'a TypeDescriptor> {
        let name = message.name();
        self.model
            .methods()
            .flat_map(|m| m.statements.iter())
            .flat_map(|s| s.invocations())
            .filter(|i| i.containing_type.ends_with(&name) && i.name == name)
            .filter_map(|i| self.model.get(&i.containing_type))
            .collect()
    }

    /// Distinct services that create `message`, in first-seen order
    pub fn calling_services(&self, message: &TypeDescriptor) -> Vec<String> {
        let services: IndexSet<String> = self
            .source_commands(message)
            .into_iter()
            .filter_map(|t| self.conventions.service_name(t))
            .collect();
        services.into_iter().collect()
    }

    /// Whether a handler in the same top-level namespace receives `message`
    pub fn has_receiver_in_same_namespace(&self, message: &TypeDescriptor) -> bool {
        let namespace = message.namespace();
        let prefix: Vec<&str> = namespace.splitn(3, '.').take(2).collect();
        let prefix = prefix.join(".");

        self.model.iter().any(|t| {
            t.namespace().starts_with(&prefix)
                && t.base_types
                    .iter()
                    .any(|b| *b == self.conventions.message_handler_callback)
                && t.methods.iter().any(|m| {
                    m.name == self.conventions.event_handling_method
                        && m.parameters
                            .first()
                            .is_some_and(|p| p.type_name == message.full_name)
                })
        })
    }

    /// Service of a type under the configured conventions
    pub fn service_name(&self, descriptor: &TypeDescriptor) -> Option<String> {
        self.conventions.service_name(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::{Attribute, Method, Parameter};

    const CALLBACK: &str = "Pitstop.Infrastructure.Messaging.IMessageHandlerCallback";

    fn model(types: Vec<TypeDescriptor>) -> TypeModel {
        TypeModel::from_types(types, &Conventions::default()).unwrap()
    }

    #[test]
    fn test_command_handlers_before_event_handlers() {
        let command = TypeDescriptor::class("Pitstop.Workshop.Commands.PlanJob")
            .with_base("Pitstop.Infrastructure.Messaging.Command");
        let controller = TypeDescriptor::class("Pitstop.WorkshopAPI.Controllers.JobController")
            .with_method(Method::new("Plan").with_parameter(
                Parameter::new("command", "Pitstop.Workshop.Commands.PlanJob")
                    .with_attribute(Attribute::new("Microsoft.AspNetCore.Mvc.FromBodyAttribute")),
            ));
        let listener = TypeDescriptor::class("Pitstop.Audit.Handler")
            .with_base(CALLBACK)
            .with_method(
                Method::new("HandleAsync")
                    .with_parameter(Parameter::new("e", "Pitstop.Audit.Copies.PlanJob")),
            );
        let model = model(vec![command.clone(), listener, controller]);
        let conventions = Conventions::default();
        let catalog = Catalog::new(&model, &conventions);

        let handlers: Vec<_> = catalog
            .handlers_for(&command)
            .into_iter()
            .map(|t| t.full_name.as_str())
            .collect();
        assert_eq!(
            handlers,
            vec!["Pitstop.WorkshopAPI.Controllers.JobController", "Pitstop.Audit.Handler"]
        );

        let controller = model.get("Pitstop.WorkshopAPI.Controllers.JobController").unwrap();
        assert_eq!(catalog.handling_method(controller, &command).unwrap().name, "Plan");
    }

    #[test]
    fn test_message_lookup_errors() {
        let model = model(vec![TypeDescriptor::class("Shop.Plain")]);
        let conventions = Conventions::default();
        let catalog = Catalog::new(&model, &conventions);

        assert!(matches!(
            catalog.message("Shop.Missing"),
            Err(FlowError::UnknownMessage { .. })
        ));
        assert!(matches!(
            catalog.message("Shop.Plain"),
            Err(FlowError::NotAMessage { .. })
        ));
    }

    #[test]
    fn test_interface_resolution_records_ambiguity() {
        let model = model(vec![
            TypeDescriptor::interface("Shop.IRepo"),
            TypeDescriptor::class("Shop.SqlRepo")
                .with_base("Shop.IRepo")
                .with_method(Method::new("Save")),
            TypeDescriptor::class("Shop.MemoryRepo")
                .with_base("Shop.IRepo")
                .with_method(Method::new("Save")),
        ]);
        let conventions = Conventions::default();
        let catalog = Catalog::new(&model, &conventions);
        let mut diagnostics = Diagnostics::new();

        let method = catalog
            .resolve_invocation(&Invocation::new("Shop.IRepo", "Save"), &mut diagnostics)
            .unwrap();
        assert_eq!(method.owner, "Shop.SqlRepo");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.warnings().count(), 0);
    }

    #[test]
    fn test_overload_chosen_by_arity() {
        let model = model(vec![TypeDescriptor::class("Shop.Service")
            .with_method(Method::new("Run"))
            .with_method(Method::new("Run").with_parameter(Parameter::new("x", "System.Int32")))]);
        let conventions = Conventions::default();
        let catalog = Catalog::new(&model, &conventions);
        let mut diagnostics = Diagnostics::new();

        let invocation = Invocation::new("Shop.Service", "Run").with_argument("System.Int32", "1");
        let method = catalog.resolve_invocation(&invocation, &mut diagnostics).unwrap();
        assert_eq!(method.parameters.len(), 1);
    }

    #[test]
    fn test_calling_services_are_distinct() {
        let command = TypeDescriptor::class("Pitstop.Workshop.Commands.PlanJob")
            .with_base("Pitstop.Infrastructure.Messaging.Command");
        let web_copy = TypeDescriptor::class("Pitstop.WebApp.Commands.PlanJob");
        let caller = TypeDescriptor::class("Pitstop.WebApp.Controllers.HomeController").with_method(
            Method::new("Plan")
                .with_statement(
                    Invocation::new("Pitstop.WebApp.Commands.PlanJob", "PlanJob").into_statement(),
                )
                .with_statement(
                    Invocation::new("Pitstop.WebApp.Commands.PlanJob", "PlanJob").into_statement(),
                ),
        );
        let model = model(vec![command.clone(), web_copy, caller]);
        let conventions = Conventions::default();
        let catalog = Catalog::new(&model, &conventions);

        assert_eq!(catalog.source_commands(&command).len(), 2);
        assert_eq!(catalog.calling_services(&command), vec!["WebApp".to_string()]);
    }
}
