//! Contains the definition of [`Pure`] and the bridge between variable-free
//! and variable-bearing terms.

use std::{
    fmt::{self, Debug},
    hash::{Hash, Hasher},
};

use crate::{Term, Unifiable, Variable};

/// A variable-free term: every node is a layer of the structure `F`.
pub struct Pure<F: Unifiable>(Box<F::Layer<Pure<F>>>);

impl<F: Unifiable> Pure<F> {
    /// Creates a new [`Pure`] term from its top-level layer.
    #[must_use]
    pub fn new(layer: F::Layer<Self>) -> Self { Self(Box::new(layer)) }

    /// Returns the top-level layer of the term.
    #[must_use]
    pub fn layer(&self) -> &F::Layer<Self> { &self.0 }

    /// Converts the term into its top-level layer.
    #[must_use]
    pub fn into_layer(self) -> F::Layer<Self> { *self.0 }
}

/// Attempts to project the term into a variable-free [`Pure`] term.
///
/// Returns [`None`] if any reachable node is a variable. No binding store is
/// consulted: a bound variable still counts as a variable, so callers wanting
/// a faithful projection must resolve the bindings first.
#[must_use]
pub fn freeze<F: Unifiable, V: Variable>(term: &Term<F, V>) -> Option<Pure<F>> {
    match term {
        Term::Variable(_) => None,
        Term::Structured(layer) => {
            F::try_map(F::as_ref(&**layer), |slot| freeze(slot).ok_or(()))
                .ok()
                .map(Pure::new)
        }
    }
}

/// Embeds the variable-free term into the universe of variable-bearing terms.
#[must_use]
pub fn unfreeze<F: Unifiable, V: Variable>(pure: Pure<F>) -> Term<F, V> {
    Term::structured(F::map(pure.into_layer(), unfreeze))
}

impl<F: Unifiable, V: Variable> From<Pure<F>> for Term<F, V> {
    fn from(pure: Pure<F>) -> Self { unfreeze(pure) }
}

impl<F: Unifiable> Clone for Pure<F> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<F: Unifiable> PartialEq for Pure<F> {
    fn eq(&self, other: &Self) -> bool { self.0 == other.0 }
}

impl<F: Unifiable> Eq for Pure<F> {}

impl<F: Unifiable> Hash for Pure<F> {
    fn hash<H: Hasher>(&self, state: &mut H) { self.0.hash(state) }
}

impl<F: Unifiable> Debug for Pure<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pure").field(&*self.0).finish()
    }
}
