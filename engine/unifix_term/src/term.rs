//! Contains the definition of [`Term`].

use std::{
    fmt::{self, Debug},
    hash::{Hash, Hasher},
    sync::Arc,
};

use enum_as_inner::EnumAsInner;

use crate::{Unifiable, Variable};

/// A tree mixing layers of the structure `F` with unification variables of
/// type `V`.
///
/// Terms are immutable values. Structured layers are reference counted so
/// cloning a term is cheap and sub-terms are shared between the terms built
/// from them. A term pointing at a variable never changes; the binding store
/// is what maps the variable to a different term over time.
#[derive(EnumAsInner)]
pub enum Term<F: Unifiable, V: Variable> {
    /// A leaf referencing a unification variable.
    Variable(V),

    /// One layer of the structure whose slots are themselves terms.
    Structured(Arc<F::Layer<Term<F, V>>>),
}

impl<F: Unifiable, V: Variable> Term<F, V> {
    /// Creates a structured term from the given layer.
    #[must_use]
    pub fn structured(layer: F::Layer<Self>) -> Self {
        Self::Structured(Arc::new(layer))
    }

    /// Returns `true` if the term contains no variables at all.
    ///
    /// This doesn't consult any binding store: a term containing a bound
    /// variable is not ground.
    #[must_use]
    pub fn is_ground(&self) -> bool {
        match self {
            Self::Variable(_) => false,
            Self::Structured(layer) => F::into_slots(F::as_ref(&**layer))
                .into_iter()
                .all(Self::is_ground),
        }
    }

    /// Returns every variable occurrence in the term from left to right.
    ///
    /// The result is not de-duplicated.
    #[must_use]
    pub fn variables(&self) -> Vec<&V> {
        let mut variables = Vec::new();
        self.collect_variables(&mut variables);
        variables
    }

    fn collect_variables<'a>(&'a self, variables: &mut Vec<&'a V>) {
        match self {
            Self::Variable(variable) => variables.push(variable),
            Self::Structured(layer) => {
                for slot in F::into_slots(F::as_ref(&**layer)) {
                    slot.collect_variables(variables);
                }
            }
        }
    }

    /// Folds over every variable occurrence in the term from left to right.
    pub fn fold_variables<A>(
        &self,
        init: A,
        f: impl FnMut(A, &V) -> A,
    ) -> A {
        self.variables().into_iter().fold(init, f)
    }

    /// Rebuilds the term replacing every variable occurrence with the term
    /// returned by `f`.
    #[must_use]
    pub fn map_variables<W: Variable>(
        self,
        mut f: impl FnMut(V) -> Term<F, W>,
    ) -> Term<F, W> {
        match self.try_map_variables_with(&mut |variable| {
            Ok::<_, std::convert::Infallible>(f(variable))
        }) {
            Ok(term) => term,
            Err(never) => match never {},
        }
    }

    /// Rebuilds the term replacing every variable occurrence with the term
    /// returned by `f`, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first error returned by `f`.
    pub fn try_map_variables<W: Variable, E>(
        self,
        mut f: impl FnMut(V) -> Result<Term<F, W>, E>,
    ) -> Result<Term<F, W>, E> {
        self.try_map_variables_with(&mut f)
    }

    fn try_map_variables_with<W: Variable, E>(
        self,
        f: &mut impl FnMut(V) -> Result<Term<F, W>, E>,
    ) -> Result<Term<F, W>, E> {
        match self {
            Self::Variable(variable) => f(variable),
            Self::Structured(layer) => {
                let layer = F::try_map(Arc::unwrap_or_clone(layer), |slot| {
                    slot.try_map_variables_with(&mut *f)
                })?;

                Ok(Term::structured(layer))
            }
        }
    }
}

impl<F: Unifiable, V: Variable> From<V> for Term<F, V> {
    fn from(variable: V) -> Self { Self::Variable(variable) }
}

impl<F: Unifiable, V: Variable> Clone for Term<F, V> {
    fn clone(&self) -> Self {
        match self {
            Self::Variable(variable) => Self::Variable(variable.clone()),
            Self::Structured(layer) => Self::Structured(layer.clone()),
        }
    }
}

impl<F: Unifiable, V: Variable> PartialEq for Term<F, V> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Variable(left), Self::Variable(right)) => left == right,
            (Self::Structured(left), Self::Structured(right)) => {
                Arc::ptr_eq(left, right) || left == right
            }
            _ => false,
        }
    }
}

impl<F: Unifiable, V: Variable> Eq for Term<F, V> {}

impl<F: Unifiable, V: Variable> Hash for Term<F, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);

        match self {
            Self::Variable(variable) => variable.hash(state),
            Self::Structured(layer) => layer.hash(state),
        }
    }
}

impl<F: Unifiable, V: Variable> Debug for Term<F, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable(variable) => {
                f.debug_tuple("Variable").field(variable).finish()
            }
            Self::Structured(layer) => {
                f.debug_tuple("Structured").field(&**layer).finish()
            }
        }
    }
}
