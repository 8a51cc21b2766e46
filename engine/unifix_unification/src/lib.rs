//! Implements first-order structural unification over any [`Unifiable`]
//! structure and any [`BindingStore`].
//!
//! The entry point is [`unify`]: it walks two terms in lock-step, binding
//! variables in the store until both terms denote the same tree or a failure
//! is found. Chains of variable-to-variable bindings are compressed while
//! they're followed ([`semiprune`]), and the occurs-check is performed
//! lazily: a cyclic binding is only reported when the algorithm actually
//! walks into it. [`unify_occurs`] is the eager alternative that refuses to
//! create a cyclic binding in the first place, and [`ranked`] contains the
//! weighted union variants for stores that keep a rank per variable.
//!
//! The remaining operations ([`apply_bindings`], [`get_free_vars`],
//! [`freshen`], [`equals`], [`equiv`], [`subsumes`]) share the same
//! chain-following and cycle-detection discipline.
//!
//! [`Unifiable`]: unifix_term::Unifiable

use unifix_binding::{BindingStore, StoreTerm};
use unifix_term::Unifiable;

pub mod compare;
pub mod error;
pub mod prune;
pub mod ranked;
pub mod resolve;
pub mod unifier;

#[doc(inline)]
pub use compare::{equals, equiv, subsumes};
#[doc(inline)]
pub use error::{OccursInError, TermMismatchError, UnificationError};
#[doc(inline)]
pub use prune::{fullprune, semiprune};
#[doc(inline)]
pub use resolve::{
    apply_bindings, apply_bindings_all, freshen, freshen_all, get_free_vars,
    get_free_vars_all, occurs_in,
};
#[doc(inline)]
pub use unifier::{unify, unify_occurs, unify_term};

/// The [`UnificationError`] raised by operations over the binding store `B`.
pub type Failure<B> = UnificationError<
    <B as BindingStore>::Structure,
    <B as BindingStore>::Variable,
    <B as BindingStore>::Error,
>;

/// A single layer of the terms held by the binding store `B`.
pub(crate) type StoreLayer<B> =
    <<B as BindingStore>::Structure as Unifiable>::Layer<StoreTerm<B>>;

pub(crate) fn lookup<B: BindingStore>(
    store: &B,
    variable: &B::Variable,
) -> Result<Option<StoreTerm<B>>, Failure<B>> {
    store.lookup_var(variable).map_err(UnificationError::Store)
}

pub(crate) fn bind<B: BindingStore>(
    store: &mut B,
    variable: &B::Variable,
    term: StoreTerm<B>,
) -> Result<(), Failure<B>> {
    store.bind_var(variable, term).map_err(UnificationError::Store)
}

pub(crate) fn fresh<B: BindingStore>(
    store: &mut B,
) -> Result<B::Variable, Failure<B>> {
    store.free_var().map_err(UnificationError::Store)
}
