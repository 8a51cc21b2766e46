//! Contains the operations comparing two terms through the binding store
//! without unifying them.

use std::{
    collections::{btree_map::Entry, BTreeMap, BTreeSet},
    sync::Arc,
};

use unifix_binding::{BindingStore, StoreTerm};
use unifix_term::{Unifiable, Zipped};

use crate::{
    bind,
    prune::{inspect, prune, Path},
    Failure, StoreLayer,
};

/// A structured term together with the variable it was reached through.
type Node<B> = (Option<<B as BindingStore>::Variable>, Arc<StoreLayer<B>>);

/// A one-to-one mapping between the free variables of two terms.
struct Renaming<V> {
    forward: BTreeMap<V, V>,
    image: BTreeSet<V>,
}

impl<V: Ord + Clone> Renaming<V> {
    const fn new() -> Self {
        Self { forward: BTreeMap::new(), image: BTreeSet::new() }
    }

    /// Maps `left` to `right`, returning `false` if either one is already
    /// mapped to something else.
    fn link(&mut self, left: V, right: V) -> bool {
        match self.forward.entry(left) {
            Entry::Occupied(entry) => *entry.get() == right,
            Entry::Vacant(entry) => {
                if !self.image.insert(right.clone()) {
                    return false;
                }

                entry.insert(right);
                true
            }
        }
    }
}

/// Compares two terms after resolving their bindings. Free variables must be
/// identical, or, when `rename` is set, consistently renamed.
struct Comparison<'a, B: BindingStore> {
    store: &'a B,
    rename: bool,
    renaming: Renaming<B::Variable>,
    left: Path<B>,
    right: Path<B>,
}

impl<'a, B: BindingStore> Comparison<'a, B> {
    const fn new(store: &'a B, rename: bool) -> Self {
        Self {
            store,
            rename,
            renaming: Renaming::new(),
            left: Path::new(),
            right: Path::new(),
        }
    }

    fn compare(
        &mut self,
        left: &StoreTerm<B>,
        right: &StoreTerm<B>,
    ) -> Result<bool, Failure<B>> {
        let left = inspect(self.store, left)?.into_structure();
        let right = inspect(self.store, right)?.into_structure();

        match (left, right) {
            (Err(left), Err(right)) => Ok(if self.rename {
                self.renaming.link(left, right)
            } else {
                left == right
            }),

            (Ok((Some(left), _)), Ok((Some(right), _)))
                if !self.rename && left == right =>
            {
                Ok(true)
            }

            (Ok(left), Ok(right)) => self.descend(&left, &right),

            _ => Ok(false),
        }
    }

    fn descend(
        &mut self,
        (left_variable, left): &Node<B>,
        (right_variable, right): &Node<B>,
    ) -> Result<bool, Failure<B>> {
        self.left.enter(left_variable.as_ref(), left)?;
        self.right.enter(right_variable.as_ref(), right)?;

        let result = self.match_layers(left, right);

        self.left.leave(left_variable.as_ref());
        self.right.leave(right_variable.as_ref());

        result
    }

    fn match_layers(
        &mut self,
        left: &StoreLayer<B>,
        right: &StoreLayer<B>,
    ) -> Result<bool, Failure<B>> {
        let Some(zipped) = B::Structure::zip_match(
            B::Structure::as_ref(left),
            B::Structure::as_ref(right),
        ) else {
            return Ok(false);
        };

        for slot in B::Structure::into_slots(zipped) {
            let equal = match slot {
                // identical slots still contribute their free variables to
                // the renaming
                Zipped::Resolved(term) => {
                    !self.rename || self.compare(term, term)?
                }
                Zipped::Pair(left, right) => self.compare(left, right)?,
            };

            if !equal {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

/// Returns `true` if the two terms are syntactically equal once every bound
/// variable is replaced by its binding.
///
/// Nothing is written to the store.
///
/// # Errors
///
/// - [`UnificationError::OccursIn`] if a cyclic binding is walked into.
/// - [`UnificationError::Store`] if the store fails.
///
/// [`UnificationError::OccursIn`]: crate::UnificationError::OccursIn
/// [`UnificationError::Store`]: crate::UnificationError::Store
pub fn equals<B: BindingStore>(
    store: &B,
    left: &StoreTerm<B>,
    right: &StoreTerm<B>,
) -> Result<bool, Failure<B>> {
    Comparison::new(store, false).compare(left, right)
}

/// Determines whether the two terms are equal up to a one-to-one renaming
/// of their free variables, once every bound variable is replaced by its
/// binding.
///
/// Returns the renaming from the free variables of `left` to those of
/// `right`, or [`None`] if the terms aren't equivalent. Nothing is written
/// to the store.
///
/// # Errors
///
/// See [`equals`].
pub fn equiv<B: BindingStore>(
    store: &B,
    left: &StoreTerm<B>,
    right: &StoreTerm<B>,
) -> Result<Option<BTreeMap<B::Variable, B::Variable>>, Failure<B>> {
    let mut comparison = Comparison::new(store, true);

    Ok(comparison
        .compare(left, right)?
        .then_some(comparison.renaming.forward))
}

struct Subsumption<'a, B: BindingStore> {
    store: &'a mut B,
    left: Path<B>,
    right: Path<B>,
}

impl<'a, B: BindingStore> Subsumption<'a, B> {
    fn new(store: &'a mut B) -> Self {
        Self { store, left: Path::new(), right: Path::new() }
    }

    fn subsumes(
        &mut self,
        left: &StoreTerm<B>,
        right: &StoreTerm<B>,
    ) -> Result<bool, Failure<B>> {
        let left = prune(self.store, left)?;
        let right = prune(self.store, right)?;
        let right_term = right.to_term();

        match (left.into_structure(), right.into_structure()) {
            (Err(left), Err(right)) if left == right => Ok(true),

            (Err(variable), _) => {
                bind(self.store, &variable, right_term)?;

                Ok(true)
            }

            (Ok(_), Err(_)) => Ok(false),

            (Ok(left), Ok(right)) => self.descend(&left, &right),
        }
    }

    fn descend(
        &mut self,
        (left_variable, left): &Node<B>,
        (right_variable, right): &Node<B>,
    ) -> Result<bool, Failure<B>> {
        if left_variable.is_some() && left_variable == right_variable {
            return Ok(true);
        }

        self.left.enter(left_variable.as_ref(), left)?;
        self.right.enter(right_variable.as_ref(), right)?;

        let result = self.match_layers(left, right);

        self.left.leave(left_variable.as_ref());
        self.right.leave(right_variable.as_ref());

        result
    }

    fn match_layers(
        &mut self,
        left: &StoreLayer<B>,
        right: &StoreLayer<B>,
    ) -> Result<bool, Failure<B>> {
        let Some(zipped) = B::Structure::zip_match(
            B::Structure::as_ref(left),
            B::Structure::as_ref(right),
        ) else {
            return Ok(false);
        };

        for slot in B::Structure::into_slots(zipped) {
            if let Zipped::Pair(left, right) = slot {
                if !self.subsumes(left, right)? {
                    return Ok(false);
                }
            }
        }

        Ok(true)
    }
}

/// Returns `true` if the left term is at least as general as the right one:
/// some binding of the left term's variables makes it equal to the right
/// term.
///
/// Only variables reached from the left term are bound, and the bindings are
/// left in the store even if the answer is `false`. Run it inside a
/// store-level transaction to discard them.
///
/// # Errors
///
/// - [`UnificationError::OccursIn`] if a cyclic binding is walked into.
/// - [`UnificationError::Store`] if the store fails.
///
/// [`UnificationError::OccursIn`]: crate::UnificationError::OccursIn
/// [`UnificationError::Store`]: crate::UnificationError::Store
pub fn subsumes<B: BindingStore>(
    store: &mut B,
    left: &StoreTerm<B>,
    right: &StoreTerm<B>,
) -> Result<bool, Failure<B>> {
    Subsumption::new(store).subsumes(left, right)
}
