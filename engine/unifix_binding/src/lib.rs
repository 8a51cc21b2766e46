//! Contains the contracts a binding store must satisfy to be driven by the
//! unification algorithm, and [`IntBindingStore`], a ready to use
//! implementation.
//!
//! The algorithm never knows how variables are stored. It only allocates
//! variables, reads their current binding, and overwrites it, all through
//! [`BindingStore`]. Stores that additionally keep a [`Rank`] per variable
//! implement [`RankedBindingStore`], which lets the algorithm perform weighted
//! union and keep chains of variable-to-variable bindings short.

use derive_new::new;
use unifix_term::{Term, Unifiable, Variable};

pub mod int;

#[doc(inline)]
pub use int::{Config, IntBindingStore, IntVar, StoreError, UnboundedStore};

/// The term type handled by the binding store `B`.
pub type StoreTerm<B> = Term<
    <B as BindingStore>::Structure,
    <B as BindingStore>::Variable,
>;

/// A mapping from variables to their current binding.
///
/// The store determines the structure and variable types of the terms it
/// holds. Every operation may fail with the store's own [`Self::Error`]; the
/// unification algorithm propagates those errors untouched.
///
/// # Contract
///
/// - Identifiers of allocated variables are never reused within the lifetime
///   of the store.
/// - A read observes the most recent write made to the same variable.
/// - [`BindingStore::bind_var`] performs no occurs-check.
pub trait BindingStore {
    /// The structure family of the stored terms.
    type Structure: Unifiable;

    /// The variable handle allocated by this store.
    type Variable: Variable;

    /// The error raised by the store itself.
    type Error: std::error::Error;

    /// Returns the term the variable is currently bound to, or [`None`] if
    /// the variable is free.
    ///
    /// # Errors
    ///
    /// Returns the store's own error if the binding can't be read.
    fn lookup_var(
        &self,
        variable: &Self::Variable,
    ) -> Result<Option<StoreTerm<Self>>, Self::Error>;

    /// Allocates a new free variable distinct from every variable previously
    /// allocated by this store.
    ///
    /// # Errors
    ///
    /// Returns the store's own error if no more variables can be allocated.
    fn free_var(&mut self) -> Result<Self::Variable, Self::Error>;

    /// Binds the variable to the given term, replacing any existing binding.
    ///
    /// # Errors
    ///
    /// Returns the store's own error if the binding can't be written.
    fn bind_var(
        &mut self,
        variable: &Self::Variable,
        term: StoreTerm<Self>,
    ) -> Result<(), Self::Error>;
}

/// The binding of a variable paired with its rank.
///
/// The rank is an upper bound on the length of the longest chain of
/// variable-to-variable bindings ending at this variable. It is metadata for
/// weighted union only and says nothing about the depth of the bound term.
#[derive(Debug, Clone, PartialEq, Eq, Hash, new)]
pub struct Rank<F: Unifiable, V: Variable> {
    /// The chain length estimate.
    pub rank: u8,

    /// The term the variable is bound to, if any.
    pub binding: Option<Term<F, V>>,
}

impl<F: Unifiable, V: Variable> Default for Rank<F, V> {
    fn default() -> Self { Self { rank: 0, binding: None } }
}

/// The rank of a variable held by the binding store `B`.
pub type StoreRank<B> =
    Rank<<B as BindingStore>::Structure, <B as BindingStore>::Variable>;

/// A [`BindingStore`] that additionally keeps a [`Rank`] per variable.
pub trait RankedBindingStore: BindingStore {
    /// Returns the rank and the binding of the variable in a single read.
    ///
    /// The binding must agree with [`BindingStore::lookup_var`].
    ///
    /// # Errors
    ///
    /// Returns the store's own error if the rank can't be read.
    fn lookup_rank_var(
        &self,
        variable: &Self::Variable,
    ) -> Result<StoreRank<Self>, Self::Error>;

    /// Increments the rank of the variable by one.
    ///
    /// # Errors
    ///
    /// Returns the store's own error if the rank can't be written.
    fn increment_rank(
        &mut self,
        variable: &Self::Variable,
    ) -> Result<(), Self::Error>;
}

/// Allocates a new variable and binds it to the given term.
///
/// # Errors
///
/// Returns the store's own error raised while allocating or binding.
pub fn new_var<B: BindingStore + ?Sized>(
    store: &mut B,
    term: StoreTerm<B>,
) -> Result<B::Variable, B::Error> {
    let variable = store.free_var()?;
    store.bind_var(&variable, term)?;

    Ok(variable)
}

/// Increments the rank of the variable and then binds it to the given term.
///
/// # Errors
///
/// Returns the store's own error raised while incrementing or binding.
pub fn increment_bind_var<B: RankedBindingStore + ?Sized>(
    store: &mut B,
    variable: &B::Variable,
    term: StoreTerm<B>,
) -> Result<(), B::Error> {
    store.increment_rank(variable)?;
    store.bind_var(variable, term)
}
