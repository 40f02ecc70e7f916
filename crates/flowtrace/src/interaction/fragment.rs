//! Interaction tree
//!
//! The extractor's output: arrows between participants, nested in
//! alternative blocks for conditional and repeated flow. Nothing here knows
//! about diagram syntax.

use indexmap::IndexSet;
use serde::Serialize;

/// The external actor that sends the originating message
pub const ACTOR: &str = "A";
/// A message nobody in the model handles
pub const UNRESOLVED: &str = "Q";
/// A callback into the external actor
pub const CALLBACK: &str = "W";
/// Systems outside the diagram receiving output, such as mail
pub const EXTERNAL_SINK: &str = "]";
/// Systems outside the diagram sending input
pub const EXTERNAL_SOURCE: &str = "[";

/// Pseudo-participants that are never activated
pub const RESERVED: [&str; 5] = [ACTOR, UNRESOLVED, CALLBACK, EXTERNAL_SINK, EXTERNAL_SOURCE];

pub fn is_reserved(participant: &str) -> bool {
    RESERVED.contains(&participant)
}

/// A message or call from one participant to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Arrow {
    pub source: String,
    pub target: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub dashed: bool,
}

impl Arrow {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            label: label.into(),
            color: None,
            dashed: false,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn dashed(mut self) -> Self {
        self.dashed = true;
        self
    }
}

/// How an alternative section is framed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GroupKind {
    /// Continues the frame opened by an earlier section
    #[default]
    None,
    If,
    Case,
    ForEach,
    StateMachine,
}

/// One branch of an [`Alt`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AltSection {
    pub group: GroupKind,
    pub label: String,
    pub fragments: Interactions,
}

impl AltSection {
    pub fn new(group: GroupKind, label: impl Into<String>, fragments: Interactions) -> Self {
        Self {
            group,
            label: label.into(),
            fragments,
        }
    }

    pub fn fragments(&self) -> &[InteractionFragment] {
        self.fragments.fragments()
    }
}

/// A block of alternative or repeated flow
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Alt {
    pub sections: Vec<AltSection>,
}

impl Alt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_section(mut self, section: AltSection) -> Self {
        self.sections.push(section);
        self
    }

    pub fn push(&mut self, section: AltSection) {
        self.sections.push(section);
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// A node of the interaction tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum InteractionFragment {
    Arrow(Arrow),
    Alt(Alt),
}

impl InteractionFragment {
    pub fn as_arrow(&self) -> Option<&Arrow> {
        match self {
            InteractionFragment::Arrow(arrow) => Some(arrow),
            InteractionFragment::Alt(_) => None,
        }
    }

    /// This fragment's arrows and every arrow nested below it, in order
    pub fn arrows(&self) -> Box<dyn Iterator<Item = &Arrow> + '_> {
        match self {
            InteractionFragment::Arrow(arrow) => Box::new(std::iter::once(arrow)),
            InteractionFragment::Alt(alt) => Box::new(
                alt.sections
                    .iter()
                    .flat_map(|section| section.fragments().iter())
                    .flat_map(InteractionFragment::arrows),
            ),
        }
    }
}

impl From<Arrow> for InteractionFragment {
    fn from(arrow: Arrow) -> Self {
        InteractionFragment::Arrow(arrow)
    }
}

impl From<Alt> for InteractionFragment {
    fn from(alt: Alt) -> Self {
        InteractionFragment::Alt(alt)
    }
}

/// Ordered, append-only sequence of fragments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Interactions {
    fragments: Vec<InteractionFragment>,
}

impl Interactions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fragment: impl Into<InteractionFragment>) {
        self.fragments.push(fragment.into());
    }

    pub fn extend(&mut self, other: Interactions) {
        self.fragments.extend(other.fragments);
    }

    pub fn fragments(&self) -> &[InteractionFragment] {
        &self.fragments
    }

    /// Mutable access to the root arrows, for rewriting a caller before rendering
    pub fn root_arrows_mut(&mut self) -> impl Iterator<Item = &mut Arrow> {
        self.fragments.iter_mut().filter_map(|fragment| match fragment {
            InteractionFragment::Arrow(arrow) => Some(arrow),
            InteractionFragment::Alt(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Every arrow in the tree, depth first in source order
    pub fn arrows(&self) -> impl Iterator<Item = &Arrow> {
        self.fragments.iter().flat_map(InteractionFragment::arrows)
    }
}

impl FromIterator<InteractionFragment> for Interactions {
    fn from_iter<I: IntoIterator<Item = InteractionFragment>>(iter: I) -> Self {
        Self {
            fragments: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Interactions {
    type Item = InteractionFragment;
    type IntoIter = std::vec::IntoIter<InteractionFragment>;

    fn into_iter(self) -> Self::IntoIter {
        self.fragments.into_iter()
    }
}

/// Participants discovered during extraction, each once, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Participants(IndexSet<String>);

impl Participants {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a participant; returns false when it was already known
    pub fn insert(&mut self, participant: impl Into<String>) -> bool {
        self.0.insert(participant.into())
    }

    pub fn contains(&self, participant: &str) -> bool {
        self.0.contains(participant)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}
