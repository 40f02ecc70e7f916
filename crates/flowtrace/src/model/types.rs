//! Type model descriptors
//!
//! These mirror the JSON document produced by the upstream analyser. Every
//! collection defaults to empty so sparse documents load.

use serde::{Deserialize, Serialize};

use super::type_name::TypeRef;

/// What sort of type a descriptor describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Struct,
}

/// Declaration modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Modifier {
    Public,
    Private,
    Protected,
    Internal,
    Static,
    Abstract,
    Override,
    Virtual,
    Sealed,
    Async,
    Readonly,
    #[serde(other)]
    Other,
}

/// Documentation comments attached to a declaration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Documentation {
    pub summary: Option<String>,
}

/// An attribute argument such as `"Use V2 instead"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeArgument {
    #[serde(default)]
    pub name: Option<String>,
    pub value: String,
}

/// An attribute applied to a type or parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub arguments: Vec<AttributeArgument>,
}

impl Attribute {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            arguments: Vec::new(),
        }
    }

    pub fn with_argument(mut self, value: impl Into<String>) -> Self {
        self.arguments.push(AttributeArgument {
            name: None,
            value: value.into(),
        });
        self
    }
}

/// A field or property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(default)]
    pub documentation: Option<Documentation>,
}

impl Member {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            modifiers: vec![Modifier::Public],
            documentation: None,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Vec<Modifier>) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.documentation = Some(Documentation {
            summary: Some(summary.into()),
        });
        self
    }

    pub fn summary(&self) -> Option<&str> {
        self.documentation.as_ref()?.summary.as_deref()
    }

    pub fn type_ref(&self) -> TypeRef {
        TypeRef::parse(&self.type_name)
    }
}

/// An enum member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumMember {
    pub name: String,
}

/// A method parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }
}

/// A method with its body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Method {
    pub name: String,
    #[serde(default)]
    pub return_type: Option<String>,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub statements: Vec<Statement>,
    /// Full name of the declaring type, filled in when the model is built
    #[serde(skip)]
    pub owner: String,
}

impl Method {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            return_type: None,
            modifiers: vec![Modifier::Public],
            parameters: Vec::new(),
            statements: Vec::new(),
            owner: String::new(),
        }
    }

    pub fn with_modifiers(mut self, modifiers: Vec<Modifier>) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_statement(mut self, statement: Statement) -> Self {
        self.statements.push(statement);
        self
    }

    pub fn is_private(&self) -> bool {
        self.modifiers.contains(&Modifier::Private)
    }

    pub fn is_override(&self) -> bool {
        self.modifiers.contains(&Modifier::Override)
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.contains(&Modifier::Static)
    }
}

/// A call argument: its static type and its source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Argument {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub text: String,
}

impl Argument {
    pub fn new(type_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            text: text.into(),
        }
    }
}

/// A method call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invocation {
    pub containing_type: String,
    pub name: String,
    #[serde(default)]
    pub arguments: Vec<Argument>,
}

impl Invocation {
    pub fn new(containing_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            containing_type: containing_type.into(),
            name: name.into(),
            arguments: Vec::new(),
        }
    }

    pub fn with_argument(mut self, type_name: impl Into<String>, text: impl Into<String>) -> Self {
        self.arguments.push(Argument::new(type_name, text));
        self
    }

    pub fn into_statement(self) -> Statement {
        Statement::Invocation(self)
    }
}

/// One branch of an `if`/`else if`/`else` chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalSection {
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub statements: Vec<Statement>,
}

/// One `case` group of a switch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchSection {
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub statements: Vec<Statement>,
}

/// A method body statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "$type", rename_all = "camelCase")]
pub enum Statement {
    Invocation(Invocation),
    #[serde(rename_all = "camelCase")]
    If {
        sections: Vec<ConditionalSection>,
    },
    #[serde(rename_all = "camelCase")]
    Switch {
        #[serde(default)]
        expression: String,
        sections: Vec<SwitchSection>,
    },
    #[serde(rename_all = "camelCase")]
    ForEach {
        #[serde(default)]
        expression: String,
        #[serde(default)]
        statements: Vec<Statement>,
    },
    #[serde(rename_all = "camelCase")]
    Block {
        #[serde(default)]
        statements: Vec<Statement>,
    },
}

impl Statement {
    /// Build an `if` chain from `(condition, body)` pairs
    pub fn if_chain(sections: Vec<(&str, Vec<Statement>)>) -> Self {
        Statement::If {
            sections: sections
                .into_iter()
                .map(|(condition, statements)| ConditionalSection {
                    condition: condition.to_string(),
                    statements,
                })
                .collect(),
        }
    }

    /// Build a switch from `(labels, body)` pairs
    pub fn switch(expression: &str, sections: Vec<(Vec<&str>, Vec<Statement>)>) -> Self {
        Statement::Switch {
            expression: expression.to_string(),
            sections: sections
                .into_iter()
                .map(|(labels, statements)| SwitchSection {
                    labels: labels.into_iter().map(str::to_string).collect(),
                    statements,
                })
                .collect(),
        }
    }

    pub fn for_each(expression: &str, statements: Vec<Statement>) -> Self {
        Statement::ForEach {
            expression: expression.to_string(),
            statements,
        }
    }

    /// Every invocation in this statement, depth first
    pub fn invocations(&self) -> Vec<&Invocation> {
        let mut found = Vec::new();
        self.collect_invocations(&mut found);
        found
    }

    fn collect_invocations<'a>(&'a self, found: &mut Vec<&'a Invocation>) {
        match self {
            Statement::Invocation(invocation) => found.push(invocation),
            Statement::If { sections } => sections
                .iter()
                .flat_map(|s| &s.statements)
                .for_each(|s| s.collect_invocations(found)),
            Statement::Switch { sections, .. } => sections
                .iter()
                .flat_map(|s| &s.statements)
                .for_each(|s| s.collect_invocations(found)),
            Statement::ForEach { statements, .. } | Statement::Block { statements } => {
                statements.iter().for_each(|s| s.collect_invocations(found))
            }
        }
    }
}

/// A type in the analysed codebase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDescriptor {
    pub kind: TypeKind,
    pub full_name: String,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(default)]
    pub base_types: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub fields: Vec<Member>,
    #[serde(default)]
    pub properties: Vec<Member>,
    #[serde(default)]
    pub methods: Vec<Method>,
    #[serde(default)]
    pub enum_members: Vec<EnumMember>,
    #[serde(default)]
    pub documentation: Option<Documentation>,
}

impl TypeDescriptor {
    pub fn new(kind: TypeKind, full_name: impl Into<String>) -> Self {
        Self {
            kind,
            full_name: full_name.into(),
            modifiers: vec![Modifier::Public],
            base_types: Vec::new(),
            attributes: Vec::new(),
            fields: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            enum_members: Vec::new(),
            documentation: None,
        }
    }

    pub fn class(full_name: impl Into<String>) -> Self {
        Self::new(TypeKind::Class, full_name)
    }

    pub fn interface(full_name: impl Into<String>) -> Self {
        Self::new(TypeKind::Interface, full_name)
    }

    pub fn with_base(mut self, base_type: impl Into<String>) -> Self {
        self.base_types.push(base_type.into());
        self
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_field(mut self, field: Member) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_property(mut self, property: Member) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_enum_member(mut self, name: impl Into<String>) -> Self {
        self.enum_members.push(EnumMember { name: name.into() });
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.documentation = Some(Documentation {
            summary: Some(summary.into()),
        });
        self
    }

    /// The full name parsed as a type reference
    pub fn type_ref(&self) -> TypeRef {
        TypeRef::parse(&self.full_name)
    }

    /// Simple name, without namespace or generic parameters
    pub fn name(&self) -> String {
        self.type_ref().simple_name().to_string()
    }

    pub fn namespace(&self) -> String {
        self.type_ref().namespace().to_string()
    }

    /// Name shown on arrows and in headings
    pub fn display_name(&self) -> String {
        self.name()
    }

    pub fn summary(&self) -> Option<&str> {
        self.documentation
            .as_ref()?
            .summary
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }

    pub fn is_abstract(&self) -> bool {
        self.modifiers.contains(&Modifier::Abstract)
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }
}
