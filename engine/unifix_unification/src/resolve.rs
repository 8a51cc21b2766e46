//! Contains the operations resolving the variables of a term through the
//! binding store.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, trace};
use unifix_binding::{new_var, BindingStore, StoreTerm};
use unifix_term::{Term, Unifiable, Variable};

use crate::{
    fresh, lookup,
    prune::{inspect, prune, Pruned},
    Failure, StoreLayer, UnificationError,
};

/// The progress of resolving a bound variable.
enum Memo<T> {
    InProgress,
    Done(T),
}

/// Returns `true` if the variable is reachable from the term, following the
/// bindings of every variable on the way.
///
/// Cyclic bindings are walked at most once, so this always terminates.
///
/// # Errors
///
/// Returns [`UnificationError::Store`] if the store fails.
pub fn occurs_in<B: BindingStore>(
    store: &B,
    variable: &B::Variable,
    term: &StoreTerm<B>,
) -> Result<bool, Failure<B>> {
    let mut visited = BTreeSet::new();
    let mut stack = vec![term.clone()];

    while let Some(term) = stack.pop() {
        match term {
            Term::Variable(current) => {
                if current == *variable {
                    return Ok(true);
                }

                if visited.insert(current.var_id()) {
                    stack.extend(lookup(store, &current)?);
                }
            }

            Term::Structured(layer) => {
                stack.extend(
                    B::Structure::into_slots(B::Structure::as_ref(&*layer))
                        .into_iter()
                        .cloned(),
                );
            }
        }
    }

    Ok(false)
}

struct Substitution<'a, B: BindingStore> {
    store: &'a B,
    memo: BTreeMap<usize, Memo<StoreTerm<B>>>,
}

impl<'a, B: BindingStore> Substitution<'a, B> {
    const fn new(store: &'a B) -> Self { Self { store, memo: BTreeMap::new() } }

    fn apply(
        &mut self,
        term: &StoreTerm<B>,
    ) -> Result<StoreTerm<B>, Failure<B>> {
        match inspect(self.store, term)?.into_structure() {
            Err(variable) => Ok(Term::Variable(variable)),
            Ok((None, layer)) => self.apply_layer(&layer),
            Ok((Some(variable), layer)) => {
                let id = variable.var_id();

                match self.memo.get(&id) {
                    Some(Memo::Done(resolved)) => return Ok(resolved.clone()),
                    Some(Memo::InProgress) => {
                        debug!("{variable:?} is bound to a cyclic term");

                        return Err(UnificationError::occurs_in(
                            variable,
                            Term::Structured(layer),
                        ));
                    }
                    None => {}
                }

                self.memo.insert(id, Memo::InProgress);
                let resolved = self.apply_layer(&layer)?;
                self.memo.insert(id, Memo::Done(resolved.clone()));

                Ok(resolved)
            }
        }
    }

    fn apply_layer(
        &mut self,
        layer: &StoreLayer<B>,
    ) -> Result<StoreTerm<B>, Failure<B>> {
        B::Structure::try_map(B::Structure::as_ref(layer), |slot| {
            self.apply(slot)
        })
        .map(Term::structured)
    }
}

/// Returns the term with every bound variable replaced by its fully
/// resolved binding.
///
/// Free variables are kept. Each bound variable is resolved once and the
/// result is shared by all of its occurrences.
///
/// # Errors
///
/// - [`UnificationError::OccursIn`] if a variable is bound to a term
///   containing the variable itself.
/// - [`UnificationError::Store`] if the store fails.
pub fn apply_bindings<B: BindingStore>(
    store: &B,
    term: &StoreTerm<B>,
) -> Result<StoreTerm<B>, Failure<B>> {
    Substitution::new(store).apply(term)
}

/// Same as [`apply_bindings`] for each of the terms, sharing the resolved
/// bindings between them.
///
/// # Errors
///
/// See [`apply_bindings`].
pub fn apply_bindings_all<B: BindingStore>(
    store: &B,
    terms: &[StoreTerm<B>],
) -> Result<Vec<StoreTerm<B>>, Failure<B>> {
    let mut substitution = Substitution::new(store);

    terms.iter().map(|term| substitution.apply(term)).collect()
}

/// Returns the distinct free variables reachable from the term, following
/// bindings, ordered by their identifier.
///
/// # Errors
///
/// Returns [`UnificationError::Store`] if the store fails.
pub fn get_free_vars<B: BindingStore>(
    store: &B,
    term: &StoreTerm<B>,
) -> Result<Vec<B::Variable>, Failure<B>> {
    get_free_vars_all(store, std::slice::from_ref(term))
}

/// Same as [`get_free_vars`] over all the terms.
///
/// # Errors
///
/// Returns [`UnificationError::Store`] if the store fails.
pub fn get_free_vars_all<B: BindingStore>(
    store: &B,
    terms: &[StoreTerm<B>],
) -> Result<Vec<B::Variable>, Failure<B>> {
    let mut visited = BTreeSet::new();
    let mut free = BTreeMap::new();
    let mut stack = terms.to_vec();

    while let Some(term) = stack.pop() {
        match term {
            Term::Variable(variable) => {
                if !visited.insert(variable.var_id()) {
                    continue;
                }

                match lookup(store, &variable)? {
                    Some(binding) => stack.push(binding),
                    None => {
                        free.insert(variable.var_id(), variable);
                    }
                }
            }

            Term::Structured(layer) => {
                stack.extend(
                    B::Structure::into_slots(B::Structure::as_ref(&*layer))
                        .into_iter()
                        .cloned(),
                );
            }
        }
    }

    Ok(free.into_values().collect())
}

struct Freshener<'a, B: BindingStore> {
    store: &'a mut B,
    memo: BTreeMap<usize, Memo<StoreTerm<B>>>,
}

impl<'a, B: BindingStore> Freshener<'a, B> {
    fn new(store: &'a mut B) -> Self { Self { store, memo: BTreeMap::new() } }

    fn freshen(
        &mut self,
        term: &StoreTerm<B>,
    ) -> Result<StoreTerm<B>, Failure<B>> {
        let (variable, binding) = match prune(self.store, term)? {
            Pruned::Structure(layer) => return self.freshen_layer(&layer),
            Pruned::Variable(variable, binding) => (variable, binding),
        };

        let id = variable.var_id();

        match self.memo.get(&id) {
            Some(Memo::Done(copy)) => return Ok(copy.clone()),
            Some(Memo::InProgress) => {
                debug!("{variable:?} is bound to a cyclic term");

                let term = binding.map_or_else(
                    || Term::Variable(variable.clone()),
                    Term::Structured,
                );

                return Err(UnificationError::occurs_in(variable, term));
            }
            None => {}
        }

        let copy = match binding {
            None => fresh(self.store)?,
            Some(layer) => {
                self.memo.insert(id, Memo::InProgress);
                let copy = self.freshen_layer(&layer)?;

                new_var(self.store, copy).map_err(UnificationError::Store)?
            }
        };

        trace!("{variable:?} is freshened to {copy:?}");

        let copy = Term::Variable(copy);
        self.memo.insert(id, Memo::Done(copy.clone()));

        Ok(copy)
    }

    fn freshen_layer(
        &mut self,
        layer: &StoreLayer<B>,
    ) -> Result<StoreTerm<B>, Failure<B>> {
        B::Structure::try_map(B::Structure::as_ref(layer), |slot| {
            self.freshen(slot)
        })
        .map(Term::structured)
    }
}

/// Returns a copy of the term where every variable is replaced by a fresh
/// one.
///
/// Occurrences of the same variable are replaced by the same fresh
/// variable. A bound variable is replaced by a fresh variable bound to a
/// freshened copy of its binding, so the copy shares nothing with the
/// original.
///
/// # Errors
///
/// - [`UnificationError::OccursIn`] if a variable is bound to a term
///   containing the variable itself.
/// - [`UnificationError::Store`] if the store fails.
pub fn freshen<B: BindingStore>(
    store: &mut B,
    term: &StoreTerm<B>,
) -> Result<StoreTerm<B>, Failure<B>> {
    Freshener::new(store).freshen(term)
}

/// Same as [`freshen`] for each of the terms. A variable shared between the
/// terms is replaced by the same fresh variable in every copy.
///
/// # Errors
///
/// See [`freshen`].
pub fn freshen_all<B: BindingStore>(
    store: &mut B,
    terms: &[StoreTerm<B>],
) -> Result<Vec<StoreTerm<B>>, Failure<B>> {
    let mut freshener = Freshener::new(store);

    terms.iter().map(|term| freshener.freshen(term)).collect()
}
