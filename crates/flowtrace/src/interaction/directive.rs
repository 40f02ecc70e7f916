//! Ordered drawing instructions produced by the synthesizer

use serde::Serialize;

use super::fragment::GroupKind;

/// How a group of alternative sections is framed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GroupStyle {
    /// Guarded alternatives, labels are conditions
    Alternative,
    /// Switch over case labels
    Switch,
    /// Repeated flow
    Loop,
    /// State machine transitions
    StateMachine,
}

impl From<GroupKind> for GroupStyle {
    fn from(kind: GroupKind) -> Self {
        match kind {
            GroupKind::None | GroupKind::If => GroupStyle::Alternative,
            GroupKind::Case => GroupStyle::Switch,
            GroupKind::ForEach => GroupStyle::Loop,
            GroupKind::StateMachine => GroupStyle::StateMachine,
        }
    }
}

/// One drawing instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Directive {
    Arrow {
        source: String,
        target: String,
        label: String,
        color: Option<String>,
        dashed: bool,
        /// Drawn at the same height as the previous arrow
        parallel: bool,
    },
    Activate {
        participant: String,
    },
    Deactivate {
        participant: String,
    },
    Spacer,
    GroupStart {
        style: GroupStyle,
        label: String,
    },
    GroupElse {
        style: GroupStyle,
        label: String,
    },
    GroupEnd,
}

impl Directive {
    pub fn activate(participant: impl Into<String>) -> Self {
        Directive::Activate {
            participant: participant.into(),
        }
    }

    pub fn deactivate(participant: impl Into<String>) -> Self {
        Directive::Deactivate {
            participant: participant.into(),
        }
    }
}

/// Ordered directive sequence for one diagram
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DirectiveStream {
    directives: Vec<Directive>,
}

impl DirectiveStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, directive: Directive) {
        self.directives.push(directive);
    }

    /// Move every directive of `other` to the end of this stream
    pub fn append(&mut self, other: DirectiveStream) {
        self.directives.extend(other.directives);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Directive> {
        self.directives.iter()
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Activation count minus deactivation count for `participant`
    pub fn activation_balance(&self, participant: &str) -> isize {
        self.directives.iter().fold(0, |balance, directive| match directive {
            Directive::Activate { participant: p } if p == participant => balance + 1,
            Directive::Deactivate { participant: p } if p == participant => balance - 1,
            _ => balance,
        })
    }
}

impl<'a> IntoIterator for &'a DirectiveStream {
    type Item = &'a Directive;
    type IntoIter = std::slice::Iter<'a, Directive>;

    fn into_iter(self) -> Self::IntoIter {
        self.directives.iter()
    }
}

impl IntoIterator for DirectiveStream {
    type Item = Directive;
    type IntoIter = std::vec::IntoIter<Directive>;

    fn into_iter(self) -> Self::IntoIter {
        self.directives.into_iter()
    }
}
