//! Recoverable problems found while walking the model
//!
//! Extraction never aborts on a missing reference. Each problem is recorded
//! here and logged through `tracing`, and the run carries on with a partial
//! result.

use thiserror::Error;
use tracing::{debug, warn};

/// How loudly a diagnostic is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Expected noise, e.g. calls into framework code outside the model
    Debug,
    /// Documentation will be incomplete
    Warning,
}

/// A single recoverable problem
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    #[error("'{type_name}' referenced by {context} not found in the analysed types; documentation will be incomplete")]
    UnresolvedTypeReference { type_name: String, context: String },

    #[error("method '{method}' on '{containing_type}' not found; treated as an opaque call")]
    UnresolvedMethodReference {
        containing_type: String,
        method: String,
    },

    #[error("interface '{interface}' has {candidates} implementations; using '{chosen}'")]
    AmbiguousInterfaceImplementation {
        interface: String,
        chosen: String,
        candidates: usize,
    },

    #[error("expansion of {subject} truncated: {reason}")]
    Truncated { subject: String, reason: String },

    #[error("'{message}' is sent by {services:?}; caller not rewritten")]
    AmbiguousCaller {
        message: String,
        services: Vec<String>,
    },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::UnresolvedMethodReference { .. }
            | Diagnostic::AmbiguousInterfaceImplementation { .. } => Severity::Debug,
            Diagnostic::UnresolvedTypeReference { .. }
            | Diagnostic::Truncated { .. }
            | Diagnostic::AmbiguousCaller { .. } => Severity::Warning,
        }
    }
}

/// Ordered collector for diagnostics of one run
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and log it at its severity
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity() {
            Severity::Warning => warn!(%diagnostic, "Flow reconstruction degraded"),
            Severity::Debug => debug!(%diagnostic, "Flow reconstruction note"),
        }
        self.entries.push(diagnostic);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Diagnostics that leave the output incomplete
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity() == Severity::Warning)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Move all diagnostics of `other` into this collector without logging them again
    pub fn absorb(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
