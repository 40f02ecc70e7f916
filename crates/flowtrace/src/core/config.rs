//! Run configuration
//!
//! [`Conventions`] describes how the analysed codebase names its messages,
//! handlers and infrastructure calls. These are part of the input contract:
//! every classification the extractor performs is a lookup against them.
//! The defaults match a codebase built on a `Pitstop.Infrastructure.Messaging`
//! style message bus.

use serde::{Deserialize, Serialize};

use super::FlowError;

/// Naming and base-type conventions of the analysed codebase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Conventions {
    /// Base type every command derives from
    pub command_base_type: String,
    /// Base type every event derives from
    pub event_base_type: String,
    /// Interface implemented by event handler classes
    pub message_handler_callback: String,
    /// Prefix of the generic aggregate-root base type (including `<`)
    pub aggregate_root_prefix: String,
    /// Prefix of the generic entity base type (including `<`)
    pub entity_prefix: String,
    /// Namespace segment that marks value objects
    pub value_object_segment: String,
    /// Method that receives an event
    pub event_handling_method: String,
    /// Method that receives a command outside of an HTTP endpoint
    pub command_handling_method: String,
    /// Attribute suffix marking a parameter bound from the request body
    pub request_body_attribute_suffix: String,
    /// Calls that publish a message; the message is the second argument
    pub publish_calls: Vec<String>,
    /// Calls that raise a domain event; the event is the first argument
    pub raise_calls: Vec<String>,
    /// Calls that send an email; the optional third argument is the subject
    pub mail_calls: Vec<String>,
    /// Calls that touch storage
    pub storage_calls: Vec<String>,
    /// Storage calls whose entity is the type of the last argument
    pub bulk_storage_calls: Vec<String>,
    /// Leading namespace segments skipped when deriving a service name
    pub service_root_segments: Vec<String>,
    /// Types whose namespace contains one of these fragments are ignored
    pub excluded_namespaces: Vec<String>,
    /// Attribute type marking deprecated messages
    pub obsolete_attribute: String,
    /// Maximum nesting of message hops and inlined calls
    pub max_depth: usize,
}

impl Default for Conventions {
    fn default() -> Self {
        Self {
            command_base_type: "Pitstop.Infrastructure.Messaging.Command".to_string(),
            event_base_type: "Pitstop.Infrastructure.Messaging.Event".to_string(),
            message_handler_callback: "Pitstop.Infrastructure.Messaging.IMessageHandlerCallback"
                .to_string(),
            aggregate_root_prefix: "Pitstop.WorkshopManagementAPI.Domain.Core.AggregateRoot<"
                .to_string(),
            entity_prefix: "Pitstop.WorkshopManagementAPI.Domain.Core.Entity<".to_string(),
            value_object_segment: "ValueObjects".to_string(),
            event_handling_method: "HandleAsync".to_string(),
            command_handling_method: "HandleCommandAsync".to_string(),
            request_body_attribute_suffix: "FromBodyAttribute".to_string(),
            publish_calls: vec!["PublishMessageAsync".to_string()],
            raise_calls: vec!["RaiseEvent".to_string()],
            mail_calls: vec!["SendEmailAsync".to_string()],
            storage_calls: vec![
                "AddAsync".to_string(),
                "FirstOrDefaultAsync".to_string(),
                "ExecuteAsync".to_string(),
                "QueryAsync".to_string(),
                "QueryFirstOrDefaultAsync".to_string(),
            ],
            bulk_storage_calls: vec!["ExecuteAsync".to_string(), "QueryAsync".to_string()],
            service_root_segments: vec!["Pitstop".to_string(), "Application".to_string()],
            excluded_namespaces: vec!["LivingDocumentation".to_string()],
            obsolete_attribute: "System.ObsoleteAttribute".to_string(),
            max_depth: 32,
        }
    }
}

impl Conventions {
    /// Load conventions from JSON; missing keys keep their defaults
    pub fn from_json(json: &str) -> Result<Self, FlowError> {
        let conventions: Conventions = serde_json::from_str(json)?;
        if conventions.max_depth == 0 {
            return Err(FlowError::malformed("maxDepth must be at least 1"));
        }
        Ok(conventions)
    }
}

/// Options for [`DiagramSynthesizer`](crate::interaction::DiagramSynthesizer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SynthesisOptions {
    /// Mark consecutive arrows carrying the same label as parallel
    pub parallel_arrows: bool,
}

/// Options for document assembly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DocumentOptions {
    /// Use experimental PlantUML features (teoz layout, parallel arrows)
    pub experimental: bool,
}

impl DocumentOptions {
    pub fn synthesis(&self) -> SynthesisOptions {
        SynthesisOptions {
            parallel_arrows: self.experimental,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let conventions = Conventions::from_json(r#"{ "maxDepth": 4 }"#).unwrap();
        assert_eq!(conventions.max_depth, 4);
        assert_eq!(conventions.event_handling_method, "HandleAsync");
    }

    #[test]
    fn test_zero_depth_rejected() {
        let result = Conventions::from_json(r#"{ "maxDepth": 0 }"#);
        assert!(matches!(result, Err(FlowError::MalformedInput { .. })));
    }

    #[test]
    fn test_experimental_enables_parallel_arrows() {
        let options = DocumentOptions { experimental: true };
        assert!(options.synthesis().parallel_arrows);
        assert!(!DocumentOptions::default().synthesis().parallel_arrows);
    }
}
