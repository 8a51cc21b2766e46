//! Contains the weighted union variants of the unification algorithm.
//!
//! The algorithm is the same as [`crate::unify`], except that when two
//! distinct variables are linked the one with the lower [`Rank`] is
//! redirected to the one with the higher rank. On a tie the left variable
//! becomes the representative and its rank is incremented. This keeps the
//! rank of every variable an upper bound on the length of the longest chain
//! of variable-to-variable bindings ending at it, and keeps those chains
//! logarithmic in the number of variables.
//!
//! [`Rank`]: unifix_binding::Rank

use std::cmp::Ordering;

use log::trace;
use unifix_binding::{RankedBindingStore, StoreTerm};

use crate::{
    unifier::{Link, Union, Unifier},
    Failure, UnificationError,
};

/// Links variables by comparing their ranks.
pub(crate) struct Ranked;

impl<B: RankedBindingStore> Link<B> for Ranked {
    fn choose(
        store: &B,
        left: &B::Variable,
        _: bool,
        right: &B::Variable,
        _: bool,
    ) -> Result<Union, Failure<B>> {
        let left_rank = store
            .lookup_rank_var(left)
            .map_err(UnificationError::Store)?
            .rank;
        let right_rank = store
            .lookup_rank_var(right)
            .map_err(UnificationError::Store)?
            .rank;

        Ok(match left_rank.cmp(&right_rank) {
            Ordering::Less => Union { keep_left: false, promote: false },
            Ordering::Equal => Union { keep_left: true, promote: true },
            Ordering::Greater => Union { keep_left: true, promote: false },
        })
    }

    fn promote(
        store: &mut B,
        representative: &B::Variable,
    ) -> Result<(), Failure<B>> {
        trace!("promoting {representative:?}");

        store.increment_rank(representative).map_err(UnificationError::Store)
    }
}

/// Unifies the two terms, linking variables by rank.
///
/// # Errors
///
/// See [`crate::unify`].
pub fn unify<B: RankedBindingStore>(
    store: &mut B,
    left: &StoreTerm<B>,
    right: &StoreTerm<B>,
) -> Result<(), Failure<B>> {
    unify_term(store, left, right)?;

    Ok(())
}

/// Same as [`unify`], but also returns the unified term.
///
/// # Errors
///
/// See [`crate::unify`].
pub fn unify_term<B: RankedBindingStore>(
    store: &mut B,
    left: &StoreTerm<B>,
    right: &StoreTerm<B>,
) -> Result<StoreTerm<B>, Failure<B>> {
    trace!("unifying {left:?} with {right:?} by rank");

    Unifier::<B, Ranked>::new(store, false).unify(left, right)
}

/// Same as [`unify`], but performs a full occurs-check before binding a free
/// variable.
///
/// # Errors
///
/// See [`crate::unify_occurs`].
pub fn unify_occurs<B: RankedBindingStore>(
    store: &mut B,
    left: &StoreTerm<B>,
    right: &StoreTerm<B>,
) -> Result<(), Failure<B>> {
    trace!("unifying {left:?} with {right:?} by rank with the occurs-check");

    Unifier::<B, Ranked>::new(store, true).unify(left, right)?;

    Ok(())
}
