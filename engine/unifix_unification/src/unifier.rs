//! Contains the unification algorithm and its entry points over a plain
//! [`BindingStore`].

use std::{marker::PhantomData, sync::Arc};

use log::{debug, trace};
use unifix_binding::{BindingStore, StoreTerm};
use unifix_term::{Term, Unifiable, Zipped};

use crate::{
    bind,
    prune::{prune, Path, Pruned},
    resolve::occurs_in,
    Failure, StoreLayer, UnificationError,
};

/// The outcome of deciding how two distinct variables are linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Union {
    /// The left variable becomes the representative; otherwise the right
    /// one does.
    pub(crate) keep_left: bool,

    /// The representative absorbs a chain as long as its own.
    pub(crate) promote: bool,
}

/// Decides which of two distinct variables represents their union.
pub(crate) trait Link<B: BindingStore> {
    fn choose(
        store: &B,
        left: &B::Variable,
        left_bound: bool,
        right: &B::Variable,
        right_bound: bool,
    ) -> Result<Union, Failure<B>>;

    fn promote(
        store: &mut B,
        representative: &B::Variable,
    ) -> Result<(), Failure<B>>;
}

/// Links variables by their binding state alone: a bound variable is kept
/// over a free one, otherwise the right variable is kept.
pub(crate) struct Plain;

impl<B: BindingStore> Link<B> for Plain {
    fn choose(
        _: &B,
        _: &B::Variable,
        left_bound: bool,
        _: &B::Variable,
        right_bound: bool,
    ) -> Result<Union, Failure<B>> {
        Ok(Union { keep_left: left_bound && !right_bound, promote: false })
    }

    fn promote(_: &mut B, _: &B::Variable) -> Result<(), Failure<B>> {
        Ok(())
    }
}

/// The state of a single unification call.
pub(crate) struct Unifier<'a, B: BindingStore, L> {
    store: &'a mut B,
    path: Path<B>,
    eager: bool,
    link: PhantomData<L>,
}

impl<'a, B: BindingStore, L: Link<B>> Unifier<'a, B, L> {
    /// If `eager` is set, every free variable is checked against the term
    /// it's about to be bound to.
    pub(crate) fn new(store: &'a mut B, eager: bool) -> Self {
        Self { store, path: Path::new(), eager, link: PhantomData }
    }

    pub(crate) fn unify(
        &mut self,
        left: &StoreTerm<B>,
        right: &StoreTerm<B>,
    ) -> Result<StoreTerm<B>, Failure<B>> {
        let left = prune(self.store, left)?;
        let right = prune(self.store, right)?;

        match (left, right) {
            (Pruned::Structure(left), Pruned::Structure(right)) => {
                if Arc::ptr_eq(&left, &right) {
                    return Ok(Term::Structured(left));
                }

                self.match_layers(&left, &right).map(Term::structured)
            }

            (Pruned::Variable(variable, None), Pruned::Structure(layer))
            | (Pruned::Structure(layer), Pruned::Variable(variable, None)) => {
                let term = Term::Structured(layer);

                self.check_occurs(&variable, &term)?;
                bind(self.store, &variable, term)?;

                Ok(Term::Variable(variable))
            }

            (
                Pruned::Variable(variable, Some(bound)),
                Pruned::Structure(layer),
            ) => {
                self.refine(variable, &bound, &bound, &layer)
            }

            (
                Pruned::Structure(layer),
                Pruned::Variable(variable, Some(bound)),
            ) => {
                self.refine(variable, &bound, &layer, &bound)
            }

            (
                Pruned::Variable(left, left_binding),
                Pruned::Variable(right, right_binding),
            ) => {
                if left == right {
                    return Ok(Term::Variable(right));
                }

                self.union(left, left_binding, right, right_binding)
            }
        }
    }

    /// Matches the binding of a bound variable against a structured term
    /// and rebinds the variable to the result. `bound` is one of `left` or
    /// `right`.
    fn refine(
        &mut self,
        variable: B::Variable,
        bound: &Arc<StoreLayer<B>>,
        left: &StoreLayer<B>,
        right: &StoreLayer<B>,
    ) -> Result<StoreTerm<B>, Failure<B>> {
        self.path.enter(Some(&variable), bound)?;
        let unified = self.match_layers(left, right);
        self.path.leave(Some(&variable));

        bind(self.store, &variable, Term::structured(unified?))?;

        Ok(Term::Variable(variable))
    }

    fn union(
        &mut self,
        left: B::Variable,
        left_binding: Option<Arc<StoreLayer<B>>>,
        right: B::Variable,
        right_binding: Option<Arc<StoreLayer<B>>>,
    ) -> Result<StoreTerm<B>, Failure<B>> {
        let union = L::choose(
            &*self.store,
            &left,
            left_binding.is_some(),
            &right,
            right_binding.is_some(),
        )?;

        let unified = match (&left_binding, &right_binding) {
            (Some(left_layer), Some(right_layer)) => {
                self.path.enter(Some(&left), left_layer)?;
                self.path.enter(Some(&right), right_layer)?;
                let unified = self.match_layers(left_layer, right_layer);
                self.path.leave(Some(&left));
                self.path.leave(Some(&right));

                Some(Term::structured(unified?))
            }
            _ => None,
        };

        let (
            (representative, representative_binding),
            (absorbed, absorbed_binding),
        ) = if union.keep_left {
            ((left, left_binding), (right, right_binding))
        } else {
            ((right, right_binding), (left, left_binding))
        };

        let representative_free = representative_binding.is_none();
        let absorbed_free = absorbed_binding.is_none();

        let binding = match (unified, absorbed_binding) {
            (Some(unified), _) => Some(unified),
            (None, Some(layer)) if representative_free => {
                Some(Term::Structured(layer))
            }
            (None, _) => None,
        };

        if let Some(binding) = binding {
            if representative_free {
                self.check_occurs(&representative, &binding)?;
            }

            bind(self.store, &representative, binding)?;
        }

        if union.promote {
            L::promote(self.store, &representative)?;
        }

        let link = Term::Variable(representative);

        if absorbed_free {
            self.check_occurs(&absorbed, &link)?;
        }

        trace!("linking {absorbed:?} to {link:?}");
        bind(self.store, &absorbed, link.clone())?;

        Ok(link)
    }

    fn match_layers(
        &mut self,
        left: &StoreLayer<B>,
        right: &StoreLayer<B>,
    ) -> Result<StoreLayer<B>, Failure<B>> {
        let Some(zipped) = B::Structure::zip_match(
            B::Structure::as_ref(left),
            B::Structure::as_ref(right),
        ) else {
            debug!("structural mismatch between {left:?} and {right:?}");

            return Err(UnificationError::term_mismatch(
                left.clone(),
                right.clone(),
            ));
        };

        B::Structure::try_map(zipped, |slot| match slot {
            Zipped::Resolved(term) => Ok(term.clone()),
            Zipped::Pair(left, right) => self.unify(left, right),
        })
    }

    fn check_occurs(
        &self,
        variable: &B::Variable,
        term: &StoreTerm<B>,
    ) -> Result<(), Failure<B>> {
        if self.eager && occurs_in(&*self.store, variable, term)? {
            debug!("refusing to bind {variable:?} to {term:?}");

            return Err(UnificationError::occurs_in(
                variable.clone(),
                term.clone(),
            ));
        }

        Ok(())
    }
}

/// Unifies the two terms, binding variables in the store until both terms
/// denote the same tree.
///
/// The occurs-check is lazy: binding a free variable to a term containing
/// the variable itself succeeds, and the cycle is reported by the first
/// later call that walks through the binding.
///
/// # Errors
///
/// - [`UnificationError::TermMismatch`] if two structured terms disagree on
///   their top-level shape.
/// - [`UnificationError::OccursIn`] if a cyclic binding is walked into.
/// - [`UnificationError::Store`] if the store fails.
///
/// Bindings written before the failure are left in the store.
pub fn unify<B: BindingStore>(
    store: &mut B,
    left: &StoreTerm<B>,
    right: &StoreTerm<B>,
) -> Result<(), Failure<B>> {
    unify_term(store, left, right)?;

    Ok(())
}

/// Same as [`unify`], but also returns the unified term.
///
/// The returned term may still contain variables; resolve it with
/// [`apply_bindings`](crate::apply_bindings) to obtain the fully substituted
/// tree.
///
/// # Errors
///
/// See [`unify`].
pub fn unify_term<B: BindingStore>(
    store: &mut B,
    left: &StoreTerm<B>,
    right: &StoreTerm<B>,
) -> Result<StoreTerm<B>, Failure<B>> {
    trace!("unifying {left:?} with {right:?}");

    Unifier::<B, Plain>::new(store, false).unify(left, right)
}

/// Same as [`unify`], but performs a full occurs-check before binding a free
/// variable, so a cyclic binding is never written.
///
/// # Errors
///
/// See [`unify`]. [`UnificationError::OccursIn`] is raised as soon as a free
/// variable would be bound to a term containing it.
pub fn unify_occurs<B: BindingStore>(
    store: &mut B,
    left: &StoreTerm<B>,
    right: &StoreTerm<B>,
) -> Result<(), Failure<B>> {
    trace!("unifying {left:?} with {right:?} with the occurs-check");

    Unifier::<B, Plain>::new(store, true).unify(left, right)?;

    Ok(())
}

#[cfg(test)]
mod test;
