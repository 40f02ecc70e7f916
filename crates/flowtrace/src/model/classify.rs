//! Classification of types and invocations by naming convention
//!
//! Every predicate is a pure function of a descriptor and the configured
//! [`Conventions`]. Nothing here touches the model.

use super::type_name::TypeRef;
use super::types::{Invocation, TypeDescriptor, TypeKind};
use crate::core::Conventions;

/// Arrow color of command messages
pub const COMMAND_COLOR: &str = "DodgerBlue";
/// Arrow color of event messages
pub const EVENT_COLOR: &str = "ForestGreen";
/// Arrow color of storage actions
pub const STORAGE_COLOR: &str = "Black";

/// What an invocation means for the message flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationKind {
    /// Publishes or raises a message; `skip` arguments precede the message
    MessagePublish { skip: usize },
    /// Sends an email
    MailSend,
    /// Reads or writes storage; `bulk` calls name their entity in the last argument
    StorageAction { bulk: bool },
    /// Anything else, expanded in place when the callee is known
    PlainCall,
}

impl Conventions {
    pub fn is_event(&self, descriptor: &TypeDescriptor) -> bool {
        descriptor
            .base_types
            .iter()
            .any(|b| *b == self.event_base_type)
    }

    pub fn is_command(&self, descriptor: &TypeDescriptor) -> bool {
        descriptor
            .base_types
            .iter()
            .any(|b| *b == self.command_base_type)
    }

    pub fn is_message(&self, descriptor: &TypeDescriptor) -> bool {
        self.is_event(descriptor) || self.is_command(descriptor)
    }

    pub fn is_aggregate_root(&self, descriptor: &TypeDescriptor) -> bool {
        descriptor.kind == TypeKind::Class
            && descriptor
                .base_types
                .iter()
                .any(|b| b.starts_with(&self.aggregate_root_prefix))
    }

    /// Full name of the id type an aggregate root is keyed by
    pub fn aggregate_root_id(&self, descriptor: &TypeDescriptor) -> Option<String> {
        let base = descriptor
            .base_types
            .iter()
            .find(|b| b.starts_with(&self.aggregate_root_prefix))?;
        TypeRef::parse(base)
            .arguments
            .first()
            .map(|argument| argument.to_string())
    }

    pub fn is_enumeration(&self, descriptor: &TypeDescriptor) -> bool {
        descriptor.kind == TypeKind::Enum
    }

    pub fn is_value_object(&self, descriptor: &TypeDescriptor) -> bool {
        descriptor.kind == TypeKind::Class
            && descriptor
                .namespace()
                .split('.')
                .any(|segment| segment == self.value_object_segment)
    }

    pub fn is_aggregate_id(&self, descriptor: &TypeDescriptor) -> bool {
        self.is_value_object(descriptor) && descriptor.name().ends_with("Id")
    }

    pub fn is_entity(&self, descriptor: &TypeDescriptor) -> bool {
        descriptor.kind == TypeKind::Class
            && !self.is_aggregate_root(descriptor)
            && !self.is_aggregate_id(descriptor)
            && !self.is_value_object(descriptor)
    }

    /// The deprecation message when the type carries the obsolete attribute.
    /// An attribute without arguments yields an empty message.
    pub fn deprecation(&self, descriptor: &TypeDescriptor) -> Option<String> {
        descriptor
            .attributes
            .iter()
            .find(|a| a.type_name == self.obsolete_attribute)
            .map(|a| {
                a.arguments
                    .first()
                    .map(|argument| argument.value.trim_matches('"').to_string())
                    .unwrap_or_default()
            })
    }

    /// Arrow color for a message type
    pub fn message_color(&self, message: &TypeDescriptor) -> &'static str {
        if self.is_command(message) {
            COMMAND_COLOR
        } else {
            EVENT_COLOR
        }
    }

    /// Classify a call by its name. Publish conventions win over mail, mail
    /// over storage.
    pub fn classify_invocation(&self, invocation: &Invocation) -> InvocationKind {
        let name = invocation.name.as_str();
        if self.raise_calls.iter().any(|c| c == name) {
            InvocationKind::MessagePublish { skip: 0 }
        } else if self.publish_calls.iter().any(|c| c == name) {
            InvocationKind::MessagePublish { skip: 1 }
        } else if self.mail_calls.iter().any(|c| c == name) {
            InvocationKind::MailSend
        } else if self.storage_calls.iter().any(|c| c == name) {
            InvocationKind::StorageAction {
                bulk: self.bulk_storage_calls.iter().any(|c| c == name),
            }
        } else {
            InvocationKind::PlainCall
        }
    }

    /// Service a type belongs to: the first namespace segment after the
    /// configured root segments
    pub fn service_name(&self, descriptor: &TypeDescriptor) -> Option<String> {
        descriptor
            .full_name
            .split('.')
            .skip_while(|segment| {
                self.service_root_segments
                    .iter()
                    .any(|root| root.eq_ignore_ascii_case(segment))
            })
            .next()
            .map(str::to_string)
    }
}
