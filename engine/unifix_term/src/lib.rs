//! Contains the definition of [`Term`] and the capabilities a caller supplies
//! to describe its own structure and variables.
//!
//! A term mixes two things: one-level *layers* of a caller-defined structure
//! and unification variables. The structure is described by a family type
//! implementing [`Unifiable`]; its generic associated type
//! [`Unifiable::Layer`] is the shape of a single node whose recursive slots
//! can be filled with anything, which lets the same shape carry terms,
//! variable-free terms ([`Pure`]), borrowed terms, or the result of a
//! one-level match ([`Zipped`]).

use std::{convert::Infallible, fmt::Debug, hash::Hash};

use enum_as_inner::EnumAsInner;

pub mod pure;
pub mod term;

#[doc(inline)]
pub use pure::{freeze, unfreeze, Pure};
#[doc(inline)]
pub use term::Term;

/// The bound every value stored in a slot of a [`Unifiable::Layer`] must
/// satisfy.
///
/// This trait is implemented for every type that satisfies its super traits.
pub trait Element: Clone + Debug + Eq + Hash {}

impl<T: Clone + Debug + Eq + Hash> Element for T {}

/// An opaque handle to a unification variable.
///
/// The handle is a lightweight reference into a binding store; it never owns
/// the term it is bound to.
///
/// Two variables are equal if and only if their [`Variable::var_id`] are
/// equal. The identifier must not depend on the variable's current binding.
pub trait Variable: Element + Ord {
    /// Returns the identifier of the variable, unique and stable for the
    /// lifetime of the store that allocated it.
    fn var_id(&self) -> usize;
}

/// The result of matching a single slot of two layers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumAsInner,
)]
pub enum Zipped<T> {
    /// The two slots were already identical; no further unification is
    /// required.
    Resolved(T),

    /// The two slots still have to be unified with each other.
    Pair(T, T),
}

impl<T: Eq> Zipped<T> {
    /// Zips two slots, resolving them right away if they are equal.
    pub fn from_slots(left: T, right: T) -> Self {
        if left == right {
            Self::Resolved(left)
        } else {
            Self::Pair(left, right)
        }
    }
}

/// A family of structures that can be matched one level at a time.
///
/// The implementing type is usually a unit struct used only as a marker; the
/// actual shape lives in [`Unifiable::Layer`]. For example, a family of
/// binary pairs and integer literals could use
///
/// ```ignore
/// enum Node<T> {
///     Int(i64),
///     Pair(T, T),
/// }
/// ```
///
/// as its layer, where `T` is the type of each recursive slot.
pub trait Unifiable:
    Debug + Clone + Copy + PartialEq + Eq + Hash + Default + 'static
{
    /// One layer of the structure whose recursive slots are of type `T`.
    type Layer<T: Element>: Element;

    /// Borrows every slot of the layer.
    fn as_ref<'a, T: Element + 'a>(
        layer: &'a Self::Layer<T>,
    ) -> Self::Layer<&'a T>;

    /// Rebuilds the layer by applying `f` to every slot, from left to right,
    /// stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first error returned by `f`.
    fn try_map<T: Element, U: Element, E>(
        layer: Self::Layer<T>,
        f: impl FnMut(T) -> Result<U, E>,
    ) -> Result<Self::Layer<U>, E>;

    /// Compares the two layers one level deep.
    ///
    /// Returns [`None`] if the constructors disagree (different tag, arity,
    /// or non-recursive payload). Otherwise, returns the same shape where
    /// every slot is either [`Zipped::Resolved`] when no further work is
    /// needed or [`Zipped::Pair`] when the two sub-values still have to be
    /// unified.
    fn zip_match<T: Element>(
        left: Self::Layer<T>,
        right: Self::Layer<T>,
    ) -> Option<Self::Layer<Zipped<T>>>;

    /// Rebuilds the layer by applying `f` to every slot.
    fn map<T: Element, U: Element>(
        layer: Self::Layer<T>,
        mut f: impl FnMut(T) -> U,
    ) -> Self::Layer<U> {
        match Self::try_map(layer, |slot| Ok::<_, Infallible>(f(slot))) {
            Ok(layer) => layer,
            Err(never) => match never {},
        }
    }

    /// Collects the slots of the layer from left to right.
    fn into_slots<T: Element>(layer: Self::Layer<T>) -> Vec<T> {
        let mut slots = Vec::new();
        Self::map(layer, |slot| slots.push(slot));
        slots
    }
}

#[cfg(test)]
mod test;
