//! Consequence extraction
//!
//! Starting from a message, the extractor finds every handler, walks the
//! handling method's statements and turns each observable side effect into
//! an [`Arrow`]: further messages (followed recursively), storage actions
//! and outgoing mail. Plain calls into known code are expanded in place, and
//! conditional or repeated flow becomes an [`Alt`].

use tracing::{debug, span, trace, Level};

use super::fragment::{
    is_reserved, Alt, AltSection, Arrow, GroupKind, Interactions, Participants, ACTOR,
    EXTERNAL_SINK, UNRESOLVED,
};
use crate::core::{Diagnostic, Diagnostics};
use crate::model::{
    Catalog, Invocation, InvocationKind, Statement, TypeDescriptor, TypeRef, STORAGE_COLOR,
};

/// Entity name used when a storage call's entity type is unknown
const ANONYMOUS_ENTITY: &str = "anonymous";

/// Walks handler bodies to reconstruct the flow a message sets off
#[derive(Debug, Clone, Copy)]
pub struct ConsequenceExtractor<'a> {
    catalog: Catalog<'a>,
}

impl<'a> ConsequenceExtractor<'a> {
    pub fn new(catalog: Catalog<'a>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> Catalog<'a> {
        self.catalog
    }

    /// Extract the interactions `message` causes, registering every service
    /// and storage entity met along the way in `participants`.
    ///
    /// A message without handlers yields an empty tree.
    pub fn extract(&self, message: &TypeDescriptor, participants: &mut Participants) -> Interactions {
        let mut diagnostics = Diagnostics::new();
        self.extract_with_diagnostics(message, participants, &mut diagnostics)
    }

    /// Like [`extract`](Self::extract), recording unresolved references and
    /// truncated branches in `diagnostics`
    pub fn extract_with_diagnostics(
        &self,
        message: &TypeDescriptor,
        participants: &mut Participants,
        diagnostics: &mut Diagnostics,
    ) -> Interactions {
        let extract_span = span!(Level::DEBUG, "extract_consequences", message = %message.full_name);
        let _enter = extract_span.enter();

        let mut walk = Walk {
            catalog: self.catalog,
            participants,
            diagnostics,
            message_chain: Vec::new(),
            method_chain: Vec::new(),
        };
        let interactions = walk.consequences(message, None, &Activations::default());

        debug!(
            fragments = interactions.len(),
            participants = walk.participants.len(),
            "Extraction completed"
        );
        interactions
    }
}

/// Services with an open activation along the current recursion path.
/// Each level derives its own copy, so leaving a level drops what it opened.
#[derive(Debug, Clone, Default)]
struct Activations {
    open: Vec<String>,
}

impl Activations {
    fn is_open(&self, service: &str) -> bool {
        self.open.iter().any(|s| s == service)
    }

    fn enter(&self, service: &str) -> Self {
        let mut next = self.clone();
        if !next.is_open(service) {
            next.open.push(service.to_string());
        }
        next
    }

    fn len(&self) -> usize {
        self.open.len()
    }
}

/// State of one extraction request
struct Walk<'a, 'r> {
    catalog: Catalog<'a>,
    participants: &'r mut Participants,
    diagnostics: &'r mut Diagnostics,
    /// Full names of the messages being expanded, outermost first
    message_chain: Vec<String>,
    /// `(owner, name)` of the methods being inlined
    method_chain: Vec<(String, String)>,
}

impl<'a, 'r> Walk<'a, 'r> {
    fn depth(&self) -> usize {
        self.message_chain.len() + self.method_chain.len()
    }

    fn max_depth(&self) -> usize {
        self.catalog.conventions().max_depth
    }

    fn consequences(
        &mut self,
        message: &TypeDescriptor,
        previous: Option<&str>,
        activations: &Activations,
    ) -> Interactions {
        let mut result = Interactions::new();
        let handlers = self.catalog.handlers_for(message);
        if handlers.is_empty() {
            debug!(message = %message.full_name, "No handlers");
            return result;
        }

        let truncation = if self.message_chain.contains(&message.full_name) {
            Some("message is already being expanded")
        } else if self.depth() >= self.max_depth() {
            Some("maximum depth reached")
        } else {
            None
        };

        let conventions = self.catalog.conventions();
        let label = message.display_name();
        let color = conventions.message_color(message);

        if truncation.is_none() {
            self.message_chain.push(message.full_name.clone());
        }

        for handler in handlers {
            let service = conventions.service_name(handler);
            let target = service.as_deref().unwrap_or(UNRESOLVED);
            let source = previous.unwrap_or(ACTOR);

            trace!(handler = %handler.full_name, from = source, to = target, "Handler arrow");
            result.push(Arrow::new(source, target, label.clone()).with_color(color));
            if !is_reserved(target) {
                self.participants.insert(target);
            }

            if truncation.is_some() {
                continue;
            }

            let handler_activations = match service.as_deref() {
                Some(s) if activations.is_open(s) => {
                    trace!(service = s, "Service already active");
                    activations.clone()
                }
                Some(s) => activations.enter(s),
                None => activations.clone(),
            };
            debug_assert!(handler_activations.len() <= self.message_chain.len());

            let Some(method) = self.catalog.handling_method(handler, message) else {
                self.diagnostics.push(Diagnostic::UnresolvedMethodReference {
                    containing_type: handler.full_name.clone(),
                    method: format!("handler of {}", message.name()),
                });
                continue;
            };

            debug!(handler = %handler.full_name, method = %method.name, "Walking handler");
            self.statements(&method.statements, target, &handler_activations, &mut result);
        }

        match truncation {
            Some(reason) => self.diagnostics.push(Diagnostic::Truncated {
                subject: message.full_name.clone(),
                reason: reason.to_string(),
            }),
            None => {
                self.message_chain.pop();
            }
        }

        result
    }

    fn statements(
        &mut self,
        statements: &'a [Statement],
        service: &str,
        activations: &Activations,
        out: &mut Interactions,
    ) {
        for statement in statements {
            self.statement(statement, service, activations, out);
        }
    }

    fn collect(
        &mut self,
        statements: &'a [Statement],
        service: &str,
        activations: &Activations,
    ) -> Interactions {
        let mut out = Interactions::new();
        self.statements(statements, service, activations, &mut out);
        out
    }

    fn statement(
        &mut self,
        statement: &'a Statement,
        service: &str,
        activations: &Activations,
        out: &mut Interactions,
    ) {
        match statement {
            Statement::Invocation(invocation) => {
                let kind = self.catalog.conventions().classify_invocation(invocation);
                trace!(call = %invocation.name, ?kind, "Invocation");
                match kind {
                    InvocationKind::MessagePublish { skip } => {
                        self.publish(invocation, skip, service, activations, out)
                    }
                    InvocationKind::MailSend => out.push(mail_arrow(invocation, service)),
                    InvocationKind::StorageAction { bulk } => self.storage(invocation, bulk, service, out),
                    InvocationKind::PlainCall => self.inline(invocation, service, activations, out),
                }
            }
            Statement::If { sections } => {
                let mut alt = Alt::new();
                for section in sections {
                    let body = self.collect(&section.statements, service, activations);
                    if body.is_empty() {
                        continue;
                    }
                    let group = if alt.is_empty() { GroupKind::If } else { GroupKind::None };
                    alt.push(AltSection::new(group, section.condition.clone(), body));
                }
                if !alt.is_empty() {
                    out.push(alt);
                }
            }
            Statement::Switch { sections, .. } => {
                let mut alt = Alt::new();
                for section in sections {
                    let body = self.collect(&section.statements, service, activations);
                    if body.is_empty() {
                        continue;
                    }
                    let group = if alt.is_empty() { GroupKind::Case } else { GroupKind::None };
                    alt.push(AltSection::new(group, section.labels.concat(), body));
                }
                if !alt.is_empty() {
                    out.push(alt);
                }
            }
            Statement::ForEach {
                expression,
                statements,
            } => {
                let body = self.collect(statements, service, activations);
                if !body.is_empty() {
                    out.push(Alt::new().with_section(AltSection::new(
                        GroupKind::ForEach,
                        expression.clone(),
                        body,
                    )));
                }
            }
            Statement::Block { statements } => self.statements(statements, service, activations, out),
        }
    }

    fn publish(
        &mut self,
        invocation: &Invocation,
        skip: usize,
        service: &str,
        activations: &Activations,
        out: &mut Interactions,
    ) {
        let context = format!("{}.{}", invocation.containing_type, invocation.name);
        let Some(argument) = invocation.arguments.get(skip) else {
            self.diagnostics.push(Diagnostic::UnresolvedTypeReference {
                type_name: format!("argument {}", skip + 1),
                context,
            });
            return;
        };
        let Some(message) = self.catalog.model().resolve(&argument.type_name) else {
            self.diagnostics.push(Diagnostic::UnresolvedTypeReference {
                type_name: argument.type_name.clone(),
                context,
            });
            return;
        };

        if self.catalog.handlers_for(message).is_empty() {
            let color = self.catalog.conventions().message_color(message);
            out.push(Arrow::new(service, UNRESOLVED, message.display_name()).with_color(color));
            return;
        }

        let nested = self.consequences(message, Some(service), activations);
        out.extend(nested);
    }

    fn storage(&mut self, invocation: &Invocation, bulk: bool, service: &str, out: &mut Interactions) {
        let entity_type = if invocation.arguments.is_empty() {
            TypeRef::parse(&invocation.containing_type)
                .arguments
                .first()
                .cloned()
        } else if bulk {
            invocation
                .arguments
                .last()
                .map(|argument| TypeRef::parse(&argument.type_name))
        } else {
            invocation
                .arguments
                .first()
                .map(|argument| TypeRef::parse(&argument.type_name).innermost())
        };

        let entity = entity_type
            .and_then(|reference| self.catalog.model().resolve(&reference.to_string()))
            .map(TypeDescriptor::name)
            .unwrap_or_else(|| ANONYMOUS_ENTITY.to_string());

        let target = format!("{}_{}_Entity", service, entity);
        let verb = invocation
            .name
            .strip_suffix("Async")
            .unwrap_or(&invocation.name);

        trace!(entity = %target, verb, "Storage action");
        self.participants.insert(target.clone());
        out.push(Arrow::new(service, target, verb).with_color(STORAGE_COLOR));
    }

    fn inline(
        &mut self,
        invocation: &Invocation,
        service: &str,
        activations: &Activations,
        out: &mut Interactions,
    ) {
        let Some(method) = self.catalog.resolve_invocation(invocation, self.diagnostics) else {
            self.diagnostics.push(Diagnostic::UnresolvedMethodReference {
                containing_type: invocation.containing_type.clone(),
                method: invocation.name.clone(),
            });
            return;
        };

        let key = (method.owner.clone(), method.name.clone());
        let subject = format!("{}.{}", key.0, key.1);
        if self.method_chain.contains(&key) {
            self.diagnostics.push(Diagnostic::Truncated {
                subject,
                reason: "method is already being expanded".to_string(),
            });
            return;
        }
        if self.depth() >= self.max_depth() {
            self.diagnostics.push(Diagnostic::Truncated {
                subject,
                reason: "maximum depth reached".to_string(),
            });
            return;
        }

        debug!(method = %subject, "Inlining call");
        self.method_chain.push(key);
        self.statements(&method.statements, service, activations, out);
        self.method_chain.pop();
    }
}

fn mail_arrow(invocation: &Invocation, service: &str) -> Arrow {
    let label = match invocation.arguments.get(2) {
        Some(subject) => format!("Email \"{}\"", subject.text.trim_matches('"').trim()),
        None => "Email".to_string(),
    };
    Arrow::new(service, EXTERNAL_SINK, label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Conventions;
    use crate::model::{Method, Parameter, TypeModel};

    const EVENT: &str = "Pitstop.Infrastructure.Messaging.Event";
    const CALLBACK: &str = "Pitstop.Infrastructure.Messaging.IMessageHandlerCallback";

    #[test]
    fn test_activations_never_duplicate() {
        let root = Activations::default();
        let billing = root.enter("Billing");
        let again = billing.enter("Billing");
        assert_eq!(again.len(), 1);
        assert!(!root.is_open("Billing"));
    }

    #[test]
    fn test_mail_subject_is_trimmed() {
        let invocation = Invocation::new("Shop.IMail", "SendEmailAsync")
            .with_argument("System.String", "to")
            .with_argument("System.String", "body")
            .with_argument("System.String", "\" Reminder \"");
        let arrow = mail_arrow(&invocation, "Billing");
        assert_eq!(arrow.label, "Email \"Reminder\"");
        assert_eq!(arrow.target, EXTERNAL_SINK);
    }

    #[test]
    fn test_unresolved_publish_drops_branch() {
        let placed = TypeDescriptor::class("Pitstop.Billing.Events.OrderPlaced").with_base(EVENT);
        let handler = TypeDescriptor::class("Pitstop.Billing.Handlers.OrderHandler")
            .with_base(CALLBACK)
            .with_method(
                Method::new("HandleAsync")
                    .with_parameter(Parameter::new("e", "Pitstop.Billing.Events.OrderPlaced"))
                    .with_statement(
                        Invocation::new("Pitstop.Infrastructure.Messaging.IMessagePublisher", "PublishMessageAsync")
                            .with_argument("System.String", "\"type\"")
                            .with_argument("Pitstop.Billing.Events.Missing", "e")
                            .into_statement(),
                    ),
            );
        let conventions = Conventions::default();
        let model = TypeModel::from_types(vec![placed, handler], &conventions).unwrap();
        let extractor = ConsequenceExtractor::new(Catalog::new(&model, &conventions));

        let mut participants = Participants::new();
        let mut diagnostics = Diagnostics::new();
        let message = model.get("Pitstop.Billing.Events.OrderPlaced").unwrap();
        let tree = extractor.extract_with_diagnostics(message, &mut participants, &mut diagnostics);

        assert_eq!(tree.len(), 1);
        assert_eq!(diagnostics.warnings().count(), 1);
    }
}
