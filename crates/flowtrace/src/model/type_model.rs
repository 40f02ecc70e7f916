//! The loaded, cross-referenced type model
//!
//! [`TypeModel`] owns every [`TypeDescriptor`] of a run. Building one
//! validates the input, drops excluded namespaces, and resolves inheritance
//! so the extractor can treat base types and inherited members as if they
//! were declared directly.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use indexmap::IndexMap;
use tracing::{debug, info, span, trace, Level};

use super::type_name::TypeRef;
use super::types::{Method, Statement, TypeDescriptor, TypeKind};
use crate::core::{Conventions, FlowError};

/// Read-only model of the analysed codebase, keyed by full name
#[derive(Debug, Clone, Default)]
pub struct TypeModel {
    types: IndexMap<String, TypeDescriptor>,
    /// Generic-stripped name to the full name of the first type carrying it
    generic_definitions: HashMap<String, String>,
}

impl TypeModel {
    /// Parse and build a model from the analyser's JSON document
    pub fn from_json(json: &str, conventions: &Conventions) -> Result<Self, FlowError> {
        let types: Vec<TypeDescriptor> = serde_json::from_str(json)?;
        Self::from_types(types, conventions)
    }

    /// Read a JSON document from disk and build a model from it
    pub fn from_path(path: impl AsRef<Path>, conventions: &Conventions) -> Result<Self, FlowError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json, conventions)
    }

    /// Build a model from already-deserialised descriptors
    pub fn from_types(
        types: Vec<TypeDescriptor>,
        conventions: &Conventions,
    ) -> Result<Self, FlowError> {
        let load_span = span!(Level::INFO, "load_model", input_types = types.len());
        let _enter = load_span.enter();

        let mut model = TypeModel::default();
        let mut excluded = 0usize;
        let mut statements = 0usize;

        for mut descriptor in types {
            validate(&descriptor)?;

            let namespace = descriptor.namespace();
            if conventions
                .excluded_namespaces
                .iter()
                .any(|fragment| namespace.contains(fragment.as_str()))
            {
                trace!(type_name = %descriptor.full_name, "Skipping excluded namespace");
                excluded += 1;
                continue;
            }

            if model.types.contains_key(&descriptor.full_name) {
                return Err(FlowError::malformed(format!(
                    "duplicate type '{}'",
                    descriptor.full_name
                )));
            }

            for method in &mut descriptor.methods {
                method.owner = descriptor.full_name.clone();
                statements += statement_count(&method.statements);
            }

            let stripped = TypeRef::parse(&descriptor.full_name).name;
            model
                .generic_definitions
                .entry(stripped)
                .or_insert_with(|| descriptor.full_name.clone());
            model.types.insert(descriptor.full_name.clone(), descriptor);
        }

        model.populate_inherited_base_types();
        model.populate_inherited_members();

        info!(types = model.len(), excluded, statements, "Type model loaded");
        Ok(model)
    }

    /// Exact lookup by full name
    pub fn get(&self, full_name: &str) -> Option<&TypeDescriptor> {
        self.types.get(full_name)
    }

    /// Lookup by full name, falling back to the generic definition so that
    /// `Shop.Repository<Shop.Invoice>` finds `Shop.Repository<T>`
    pub fn resolve(&self, reference: &str) -> Option<&TypeDescriptor> {
        self.types.get(reference).or_else(|| {
            let stripped = TypeRef::parse(reference).name;
            self.generic_definitions
                .get(&stripped)
                .and_then(|full_name| self.types.get(full_name))
        })
    }

    pub fn contains(&self, full_name: &str) -> bool {
        self.types.contains_key(full_name)
    }

    /// Types in input order
    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Non-interface types listing `interface` among their base types, in model order
    pub fn implementations_of(&self, interface: &str) -> Vec<&TypeDescriptor> {
        self.types
            .values()
            .filter(|t| t.kind != TypeKind::Interface)
            .filter(|t| t.base_types.iter().any(|b| b == interface))
            .collect()
    }

    /// Every method of every type, with its declaring type
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.types.values().flat_map(|t| t.methods.iter())
    }

    /// Close each type's base-type list over the model. Cycles in the input
    /// are tolerated: a base already listed is never expanded twice.
    fn populate_inherited_base_types(&mut self) {
        let mut resolved: Vec<(String, Vec<String>)> = Vec::with_capacity(self.types.len());

        for descriptor in self.types.values() {
            let mut bases = descriptor.base_types.clone();
            let mut seen: HashSet<String> = bases.iter().cloned().collect();
            seen.insert(descriptor.full_name.clone());

            let mut cursor = 0;
            while cursor < bases.len() {
                if let Some(base) = self.resolve(&bases[cursor]) {
                    for inherited in &base.base_types {
                        if seen.insert(inherited.clone()) {
                            bases.push(inherited.clone());
                        }
                    }
                }
                cursor += 1;
            }

            if bases.len() > descriptor.base_types.len() {
                trace!(
                    type_name = %descriptor.full_name,
                    inherited = bases.len() - descriptor.base_types.len(),
                    "Inherited base types"
                );
            }
            resolved.push((descriptor.full_name.clone(), bases));
        }

        for (full_name, bases) in resolved {
            if let Some(descriptor) = self.types.get_mut(&full_name) {
                descriptor.base_types = bases;
            }
        }
    }

    /// Copy fields, properties and methods from base types that the derived
    /// type does not declare itself. Inherited methods keep their declaring
    /// type as owner.
    fn populate_inherited_members(&mut self) {
        let declared: HashMap<String, TypeDescriptor> = self
            .types
            .iter()
            .map(|(name, descriptor)| (name.clone(), descriptor.clone()))
            .collect();
        let definitions = &self.generic_definitions;
        let mut inherited_total = 0usize;

        for descriptor in self.types.values_mut() {
            let bases: Vec<&TypeDescriptor> = descriptor
                .base_types
                .iter()
                .filter_map(|base| {
                    declared.get(base).or_else(|| {
                        let stripped = TypeRef::parse(base).name;
                        definitions
                            .get(&stripped)
                            .and_then(|full_name| declared.get(full_name))
                    })
                })
                .filter(|base| base.full_name != descriptor.full_name)
                .collect();

            for base in bases {
                for field in &base.fields {
                    if !descriptor.fields.iter().any(|f| f.name == field.name) {
                        descriptor.fields.push(field.clone());
                        inherited_total += 1;
                    }
                }
                for property in &base.properties {
                    if !descriptor.properties.iter().any(|p| p.name == property.name) {
                        descriptor.properties.push(property.clone());
                        inherited_total += 1;
                    }
                }
                for method in &base.methods {
                    let overridden = descriptor.methods.iter().any(|m| {
                        m.name == method.name && m.parameters.len() == method.parameters.len()
                    });
                    if !overridden {
                        descriptor.methods.push(method.clone());
                        inherited_total += 1;
                    }
                }
            }
        }

        debug!(members = inherited_total, "Inherited members populated");
    }
}

fn validate(descriptor: &TypeDescriptor) -> Result<(), FlowError> {
    if descriptor.full_name.trim().is_empty() {
        return Err(FlowError::malformed("type with an empty full name"));
    }
    for method in &descriptor.methods {
        if method.name.trim().is_empty() {
            return Err(FlowError::malformed(format!(
                "nameless method on '{}'",
                descriptor.full_name
            )));
        }
        for statement in &method.statements {
            for invocation in statement.invocations() {
                if invocation.name.trim().is_empty() || invocation.containing_type.trim().is_empty()
                {
                    return Err(FlowError::malformed(format!(
                        "nameless invocation in '{}.{}'",
                        descriptor.full_name, method.name
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Statements of every kind, nested ones included
fn statement_count(statements: &[Statement]) -> usize {
    statements
        .iter()
        .map(|statement| match statement {
            Statement::Invocation(_) => 1,
            Statement::If { sections } => {
                1 + sections.iter().map(|s| statement_count(&s.statements)).sum::<usize>()
            }
            Statement::Switch { sections, .. } => {
                1 + sections.iter().map(|s| statement_count(&s.statements)).sum::<usize>()
            }
            Statement::ForEach { statements, .. } | Statement::Block { statements } => {
                1 + statement_count(statements)
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::{Invocation, Member, Method, Parameter};

    fn conventions() -> Conventions {
        Conventions::default()
    }

    #[test]
    fn test_duplicate_full_name_rejected() {
        let types = vec![
            TypeDescriptor::class("Shop.Billing.Invoice"),
            TypeDescriptor::class("Shop.Billing.Invoice"),
        ];
        let result = TypeModel::from_types(types, &conventions());
        assert!(matches!(result, Err(FlowError::MalformedInput { .. })));
    }

    #[test]
    fn test_empty_full_name_rejected() {
        let result = TypeModel::from_types(vec![TypeDescriptor::class(" ")], &conventions());
        assert!(matches!(result, Err(FlowError::MalformedInput { .. })));
    }

    #[test]
    fn test_nameless_invocation_rejected() {
        let handler = TypeDescriptor::class("Shop.Billing.Handler").with_method(
            Method::new("Handle").with_statement(Invocation::new("Shop.Repo", "").into_statement()),
        );
        let result = TypeModel::from_types(vec![handler], &conventions());
        assert!(matches!(result, Err(FlowError::MalformedInput { .. })));
    }

    #[test]
    fn test_excluded_namespace_dropped() {
        let types = vec![
            TypeDescriptor::class("Pitstop.LivingDocumentation.Program"),
            TypeDescriptor::class("Pitstop.Billing.Invoice"),
        ];
        let model = TypeModel::from_types(types, &conventions()).unwrap();
        assert_eq!(model.len(), 1);
        assert!(model.contains("Pitstop.Billing.Invoice"));
    }

    #[test]
    fn test_owner_back_reference() {
        let model = TypeModel::from_types(
            vec![TypeDescriptor::class("Shop.A").with_method(Method::new("Run"))],
            &conventions(),
        )
        .unwrap();
        assert_eq!(model.get("Shop.A").unwrap().methods[0].owner, "Shop.A");
    }

    #[test]
    fn test_transitive_base_types_through_generic_definition() {
        let types = vec![
            TypeDescriptor::class("Shop.Core.Message"),
            TypeDescriptor::class("Shop.Core.Event<T>").with_base("Shop.Core.Message"),
            TypeDescriptor::class("Shop.Events.OrderPlaced")
                .with_base("Shop.Core.Event<Shop.Events.OrderPlaced>"),
        ];
        let model = TypeModel::from_types(types, &conventions()).unwrap();
        let placed = model.get("Shop.Events.OrderPlaced").unwrap();
        assert_eq!(
            placed.base_types,
            vec![
                "Shop.Core.Event<Shop.Events.OrderPlaced>".to_string(),
                "Shop.Core.Message".to_string()
            ]
        );
    }

    #[test]
    fn test_base_type_cycle_terminates() {
        let types = vec![
            TypeDescriptor::class("Shop.A").with_base("Shop.B"),
            TypeDescriptor::class("Shop.B").with_base("Shop.A"),
        ];
        let model = TypeModel::from_types(types, &conventions()).unwrap();
        assert_eq!(model.get("Shop.A").unwrap().base_types, vec!["Shop.B".to_string()]);
    }

    #[test]
    fn test_inherited_members_do_not_shadow_declared() {
        let types = vec![
            TypeDescriptor::class("Shop.Base")
                .with_field(Member::new("Id", "System.Guid"))
                .with_field(Member::new("Name", "System.String"))
                .with_method(Method::new("Save"))
                .with_method(Method::new("Load").with_parameter(Parameter::new("id", "System.Guid"))),
            TypeDescriptor::class("Shop.Derived")
                .with_base("Shop.Base")
                .with_field(Member::new("Name", "Shop.Name"))
                .with_method(
                    Method::new("Load").with_parameter(Parameter::new("id", "System.Guid")),
                ),
        ];
        let model = TypeModel::from_types(types, &conventions()).unwrap();
        let derived = model.get("Shop.Derived").unwrap();

        assert_eq!(derived.fields.len(), 2);
        assert_eq!(derived.fields[0].type_name, "Shop.Name");
        assert_eq!(derived.methods.len(), 2);
        assert_eq!(derived.method("Load").unwrap().owner, "Shop.Derived");
        assert_eq!(derived.method("Save").unwrap().owner, "Shop.Base");
    }

    #[test]
    fn test_implementations_of_interface() {
        let types = vec![
            TypeDescriptor::interface("Shop.IRepo"),
            TypeDescriptor::class("Shop.SqlRepo").with_base("Shop.IRepo"),
        ];
        let model = TypeModel::from_types(types, &conventions()).unwrap();
        let implementations = model.implementations_of("Shop.IRepo");
        assert_eq!(implementations.len(), 1);
        assert_eq!(implementations[0].full_name, "Shop.SqlRepo");
    }

    #[test]
    fn test_statement_count_includes_nested() {
        let statements = vec![Statement::for_each(
            "var x in xs",
            vec![
                Invocation::new("Shop.A", "B").into_statement(),
                Invocation::new("Shop.A", "C").into_statement(),
            ],
        )];
        assert_eq!(statement_count(&statements), 3);
    }
}
