//! Diagram synthesis
//!
//! Turns an [`Interactions`] tree into an ordered [`DirectiveStream`]. Each
//! recursion level is a scope: participants activated by an ancestor are
//! inherited and left alone, participants activated here are local and are
//! closed before the scope ends. Alternative sections render in isolation so
//! an empty branch disappears without a trace.

use tracing::{debug, span, trace, Level};

use super::directive::{Directive, DirectiveStream, GroupStyle};
use super::fragment::{
    is_reserved, Alt, Arrow, InteractionFragment, Interactions, ACTOR, CALLBACK, UNRESOLVED,
};
use crate::core::SynthesisOptions;

/// Predicate deciding whether an arrow is drawn
pub type ArrowFilter<'f> = &'f dyn Fn(&Arrow) -> bool;

/// Renders interaction trees into directives
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagramSynthesizer {
    options: SynthesisOptions,
}

impl DiagramSynthesizer {
    pub fn new(options: SynthesisOptions) -> Self {
        Self { options }
    }

    /// Render `fragments`, which is `tree`'s root sequence or a sequence
    /// nested inside it. Arrows drawn earlier in enclosing scopes of `tree`
    /// suppress re-activation of their targets. Arrows rejected by `filter`
    /// are skipped as if absent.
    pub fn render(
        &self,
        fragments: &[InteractionFragment],
        tree: &Interactions,
        filter: Option<ArrowFilter<'_>>,
    ) -> DirectiveStream {
        let render_span = span!(Level::DEBUG, "synthesize", fragments = fragments.len());
        let _enter = render_span.enter();

        let pass = Pass {
            parallel_arrows: self.options.parallel_arrows,
            filter,
        };
        let (direct_priors, descend_priors) = pass.seed(fragments, tree);

        let mut out = DirectiveStream::new();
        pass.scope(fragments, &[], &direct_priors, &descend_priors, &mut out);

        debug!(directives = out.len(), "Synthesis completed");
        out
    }

    /// Render a whole tree
    pub fn render_tree(&self, tree: &Interactions) -> DirectiveStream {
        self.render(tree.fragments(), tree, None)
    }
}

struct Pass<'f> {
    parallel_arrows: bool,
    filter: Option<ArrowFilter<'f>>,
}

impl Pass<'_> {
    fn visible(&self, arrow: &Arrow) -> bool {
        self.filter.map_or(true, |filter| filter(arrow))
    }

    /// Targets of the visible arrows directly in `fragments`
    fn direct_targets(&self, fragments: &[InteractionFragment]) -> Vec<String> {
        fragments
            .iter()
            .filter_map(InteractionFragment::as_arrow)
            .filter(|arrow| self.visible(arrow))
            .map(|arrow| arrow.target.clone())
            .collect()
    }

    /// Prior targets for a sequence located inside `tree`: those of the
    /// ancestors (for its direct arrows) and those plus the arrows preceding
    /// it in its own sequence (for nested sections)
    fn seed(&self, fragments: &[InteractionFragment], tree: &Interactions) -> (Vec<String>, Vec<String>) {
        let Some(first) = fragments.first() else {
            return (Vec::new(), Vec::new());
        };
        match self.locate(tree.fragments(), first, Vec::new()) {
            Some((sequence, offset, ancestors)) => {
                let mut descend = ancestors.clone();
                descend.extend(self.direct_targets(&sequence[..offset]));
                trace!(offset, priors = descend.len(), "Located fragments in tree");
                (ancestors, descend)
            }
            None => (Vec::new(), Vec::new()),
        }
    }

    fn locate<'t>(
        &self,
        sequence: &'t [InteractionFragment],
        first: &InteractionFragment,
        priors: Vec<String>,
    ) -> Option<(&'t [InteractionFragment], usize, Vec<String>)> {
        if let Some(offset) = sequence.iter().position(|f| std::ptr::eq(f, first)) {
            return Some((sequence, offset, priors));
        }
        for (index, fragment) in sequence.iter().enumerate() {
            if let InteractionFragment::Alt(alt) = fragment {
                let mut nested = priors.clone();
                nested.extend(self.direct_targets(&sequence[..index]));
                for section in &alt.sections {
                    if let Some(found) = self.locate(section.fragments(), first, nested.clone()) {
                        return Some(found);
                    }
                }
            }
        }
        None
    }

    /// Whether a visible arrow anywhere in `rest`, nested ones included, leaves `source`
    fn has_later_source(&self, rest: &[InteractionFragment], source: &str) -> bool {
        rest.iter()
            .flat_map(InteractionFragment::arrows)
            .any(|arrow| self.visible(arrow) && arrow.source == source)
    }

    /// Whether the arrow at `index` is the first visible direct arrow targeting `target`
    fn is_first_target(&self, fragments: &[InteractionFragment], index: usize, target: &str) -> bool {
        fragments
            .iter()
            .enumerate()
            .filter_map(|(i, fragment)| fragment.as_arrow().map(|arrow| (i, arrow)))
            .filter(|(_, arrow)| self.visible(arrow))
            .find(|(_, arrow)| arrow.target == target)
            .is_some_and(|(i, _)| i == index)
    }

    fn scope(
        &self,
        fragments: &[InteractionFragment],
        inherited: &[String],
        direct_priors: &[String],
        descend_priors: &[String],
        out: &mut DirectiveStream,
    ) {
        let mut local: Vec<String> = Vec::new();
        let mut earlier_targets = descend_priors.to_vec();
        let mut previous_label: Option<&str> = None;

        for (index, fragment) in fragments.iter().enumerate() {
            let arrow = match fragment {
                InteractionFragment::Arrow(arrow) => arrow,
                InteractionFragment::Alt(alt) => {
                    self.alt(alt, inherited, &local, &earlier_targets, out);
                    continue;
                }
            };
            if !self.visible(arrow) {
                continue;
            }

            let source = arrow.source.as_str();
            let target = if arrow.target == ACTOR && source != CALLBACK {
                UNRESOLVED
            } else {
                arrow.target.as_str()
            };
            let parallel = self.parallel_arrows && previous_label == Some(arrow.label.as_str());
            previous_label = Some(arrow.label.as_str());

            out.push(Directive::Arrow {
                source: source.to_string(),
                target: target.to_string(),
                label: arrow.label.clone(),
                color: arrow.color.clone(),
                dashed: arrow.dashed,
                parallel,
            });

            if !is_reserved(source)
                && source != target
                && local.iter().any(|p| p == source)
                && !self.has_later_source(&fragments[index + 1..], source)
            {
                out.push(Directive::deactivate(source));
                local.retain(|p| p != source);
            }

            if !is_reserved(target)
                && target != source
                && !inherited.iter().any(|p| p == target)
                && !local.iter().any(|p| p == target)
                && self.is_first_target(fragments, index, &arrow.target)
                && !direct_priors.iter().any(|p| p == target)
            {
                out.push(Directive::activate(target));
                local.push(target.to_string());
            }

            earlier_targets.push(arrow.target.clone());
        }

        for participant in local {
            out.push(Directive::deactivate(participant));
        }
    }

    fn alt(
        &self,
        alt: &Alt,
        inherited: &[String],
        local: &[String],
        priors: &[String],
        out: &mut DirectiveStream,
    ) {
        let mut section_inherited = inherited.to_vec();
        section_inherited.extend(local.iter().cloned());

        let mut rendered = Vec::with_capacity(alt.sections.len());
        for section in &alt.sections {
            let mut body = DirectiveStream::new();
            self.scope(section.fragments(), &section_inherited, priors, priors, &mut body);
            if body.is_empty() {
                trace!(label = %section.label, "Omitting empty section");
                continue;
            }
            rendered.push((section, body));
        }

        let mut sections = rendered.into_iter();
        let Some((first, body)) = sections.next() else {
            return;
        };
        let style = GroupStyle::from(first.group);

        out.push(Directive::Spacer);
        out.push(Directive::GroupStart {
            style,
            label: first.label.clone(),
        });
        out.append(body);
        out.push(Directive::Spacer);

        for (section, body) in sections {
            out.push(Directive::GroupElse {
                style,
                label: section.label.clone(),
            });
            out.append(body);
            out.push(Directive::Spacer);
        }

        out.push(Directive::GroupEnd);
    }
}
