//! Contains the operations following chains of variable-to-variable
//! bindings down to their end, compressing the chain on the way back.

use std::{collections::BTreeSet, marker::PhantomData, mem, sync::Arc};

use log::{debug, trace};
use unifix_binding::{BindingStore, StoreTerm};
use unifix_term::{Term, Variable};

use crate::{bind, lookup, Failure, StoreLayer, UnificationError};

/// A term after its leading chain of variables has been followed.
pub(crate) enum Pruned<B: BindingStore> {
    /// The term was structured to begin with.
    Structure(Arc<StoreLayer<B>>),

    /// The chain ends at this variable, either free or bound to the given
    /// structured term.
    Variable(B::Variable, Option<Arc<StoreLayer<B>>>),
}

impl<B: BindingStore> Pruned<B> {
    /// Converts back into a term, keeping the final variable of the chain
    /// rather than its binding.
    pub(crate) fn to_term(&self) -> StoreTerm<B> {
        match self {
            Self::Structure(layer) => Term::Structured(layer.clone()),
            Self::Variable(variable, _) => Term::Variable(variable.clone()),
        }
    }

    /// Returns the structured term together with the variable bound to it,
    /// or the free variable the chain ends at.
    #[allow(clippy::type_complexity)]
    pub(crate) fn into_structure(
        self,
    ) -> Result<(Option<B::Variable>, Arc<StoreLayer<B>>), B::Variable> {
        match self {
            Self::Structure(layer) => Ok((None, layer)),
            Self::Variable(variable, Some(layer)) => {
                Ok((Some(variable), layer))
            }
            Self::Variable(variable, None) => Err(variable),
        }
    }
}

/// The bound variables whose binding is currently being walked.
///
/// Entering a variable that's already on the path means its binding contains
/// the variable itself.
pub(crate) struct Path<B: BindingStore> {
    visited: BTreeSet<usize>,
    store: PhantomData<B>,
}

impl<B: BindingStore> Path<B> {
    pub(crate) const fn new() -> Self {
        Self { visited: BTreeSet::new(), store: PhantomData }
    }

    /// Does nothing if `variable` is [`None`].
    pub(crate) fn enter(
        &mut self,
        variable: Option<&B::Variable>,
        binding: &Arc<StoreLayer<B>>,
    ) -> Result<(), Failure<B>> {
        let Some(variable) = variable else {
            return Ok(());
        };

        if self.visited.insert(variable.var_id()) {
            return Ok(());
        }

        debug!("{variable:?} was reached again through its own binding");

        Err(UnificationError::occurs_in(
            variable.clone(),
            Term::Structured(binding.clone()),
        ))
    }

    pub(crate) fn leave(&mut self, variable: Option<&B::Variable>) {
        if let Some(variable) = variable {
            self.visited.remove(&variable.var_id());
        }
    }
}

/// A chain of variable-to-variable bindings.
struct Chain<B: BindingStore> {
    /// The variables bound directly to another variable, in the order they
    /// were followed.
    links: Vec<B::Variable>,

    /// The final variable of the chain.
    last: B::Variable,

    /// The structured term the final variable is bound to, if any.
    binding: Option<Arc<StoreLayer<B>>>,
}

impl<B: BindingStore> Chain<B> {
    fn follow(store: &B, variable: &B::Variable) -> Result<Self, Failure<B>> {
        let mut links = Vec::new();
        let mut seen = BTreeSet::new();
        let mut current = variable.clone();

        let binding = loop {
            match lookup(store, &current)? {
                None => break None,
                Some(Term::Structured(layer)) => break Some(layer),
                Some(Term::Variable(next)) => {
                    seen.insert(current.var_id());

                    if seen.contains(&next.var_id()) {
                        debug!("{next:?} is bound back to itself");

                        return Err(UnificationError::occurs_in(
                            next.clone(),
                            Term::Variable(next),
                        ));
                    }

                    links.push(mem::replace(&mut current, next));
                }
            }
        };

        Ok(Self { links, last: current, binding })
    }

    /// Redirects every link to the final variable. The last link already
    /// points there and isn't written again.
    fn compress(&self, store: &mut B) -> Result<(), Failure<B>> {
        let Some((_, rest)) = self.links.split_last() else {
            return Ok(());
        };

        for link in rest {
            trace!("compressing {link:?} to {:?}", self.last);

            bind(store, link, Term::Variable(self.last.clone()))?;
        }

        Ok(())
    }

    fn into_pruned(self) -> Pruned<B> {
        Pruned::Variable(self.last, self.binding)
    }
}

/// Follows the leading chain of variables without writing to the store.
pub(crate) fn inspect<B: BindingStore>(
    store: &B,
    term: &StoreTerm<B>,
) -> Result<Pruned<B>, Failure<B>> {
    match term {
        Term::Structured(layer) => Ok(Pruned::Structure(layer.clone())),
        Term::Variable(variable) => {
            Ok(Chain::follow(store, variable)?.into_pruned())
        }
    }
}

/// Follows the leading chain of variables, compressing it to its final
/// variable.
pub(crate) fn prune<B: BindingStore>(
    store: &mut B,
    term: &StoreTerm<B>,
) -> Result<Pruned<B>, Failure<B>> {
    match term {
        Term::Structured(layer) => Ok(Pruned::Structure(layer.clone())),
        Term::Variable(variable) => {
            let chain = Chain::follow(store, variable)?;
            chain.compress(store)?;

            Ok(chain.into_pruned())
        }
    }
}

/// Follows the chain of variable-to-variable bindings starting at the term
/// and returns the last variable of the chain.
///
/// The returned variable is either free or bound to a structured term. Every
/// variable on the way is rebound directly to it, so a later call walks at
/// most one link. A structured term is returned unchanged.
///
/// # Errors
///
/// - [`UnificationError::OccursIn`] if the chain loops back on itself.
/// - [`UnificationError::Store`] if the store fails.
pub fn semiprune<B: BindingStore>(
    store: &mut B,
    term: &StoreTerm<B>,
) -> Result<StoreTerm<B>, Failure<B>> {
    Ok(prune(store, term)?.to_term())
}

/// Follows the chain of variable-to-variable bindings starting at the term
/// down to its terminal term: a free variable or a structured term.
///
/// Every variable on the way is rebound directly to the terminal term.
///
/// # Errors
///
/// - [`UnificationError::OccursIn`] if the chain loops back on itself.
/// - [`UnificationError::Store`] if the store fails.
pub fn fullprune<B: BindingStore>(
    store: &mut B,
    term: &StoreTerm<B>,
) -> Result<StoreTerm<B>, Failure<B>> {
    let Term::Variable(variable) = term else {
        return Ok(term.clone());
    };

    let chain = Chain::follow(store, variable)?;

    let Some(layer) = chain.binding.clone() else {
        chain.compress(store)?;
        return Ok(Term::Variable(chain.last));
    };

    let terminal = Term::Structured(layer);

    for link in &chain.links {
        trace!("compressing {link:?} to its terminal term");

        bind(store, link, terminal.clone())?;
    }

    Ok(terminal)
}
