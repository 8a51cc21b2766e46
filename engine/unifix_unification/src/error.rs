//! Contains the definition of [`UnificationError`].

use derive_new::new;
use enum_as_inner::EnumAsInner;
use unifix_term::{Term, Unifiable, Variable};

/// A variable was rediscovered inside the term it is bound to.
///
/// Following the variable's binding would never terminate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error, new)]
#[error("the variable {variable:?} occurs in {term:?}")]
pub struct OccursInError<F: Unifiable, V: Variable> {
    /// The variable found on its own binding path.
    pub variable: V,

    /// The term in which the variable was rediscovered.
    pub term: Term<F, V>,
}

/// Two structured terms disagree on their top-level shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error, new)]
#[error("the terms {left:?} and {right:?} can't be matched")]
pub struct TermMismatchError<F: Unifiable, V: Variable> {
    /// The top-level layer of the left-hand side.
    pub left: F::Layer<Term<F, V>>,

    /// The top-level layer of the right-hand side.
    pub right: F::Layer<Term<F, V>>,
}

/// The reason a unification (or any other operation of this crate) failed.
///
/// The algorithm fails fast: the first irreconcilable pair or the first
/// cycle aborts the whole call. Bindings written before the failure stay in
/// the store; wrap the call in a store-level transaction to discard them.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, thiserror::Error, EnumAsInner,
)]
pub enum UnificationError<F: Unifiable, V: Variable, E> {
    /// A variable occurs in the term it's bound to.
    #[error(transparent)]
    OccursIn(#[from] OccursInError<F, V>),

    /// Two structured terms have different top-level shapes.
    #[error(transparent)]
    TermMismatch(#[from] TermMismatchError<F, V>),

    /// The binding store itself failed. The algorithm never constructs this
    /// variant, it only forwards the store's error.
    #[error("the binding store failed: {0}")]
    Store(E),
}

impl<F: Unifiable, V: Variable, E> UnificationError<F, V, E> {
    pub(crate) fn occurs_in(variable: V, term: Term<F, V>) -> Self {
        Self::OccursIn(OccursInError::new(variable, term))
    }

    pub(crate) fn term_mismatch(
        left: F::Layer<Term<F, V>>,
        right: F::Layer<Term<F, V>>,
    ) -> Self {
        Self::TermMismatch(TermMismatchError::new(left, right))
    }
}
