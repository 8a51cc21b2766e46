//! Contains the definition of [`IntBindingStore`], a binding store keyed by
//! integer variables.

use std::{collections::BTreeMap, convert::Infallible, mem};

use derive_new::new;
use getset::CopyGetters;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use unifix_term::{Term, Unifiable, Variable};

use crate::{BindingStore, Rank, RankedBindingStore};

/// A variable allocated by an [`IntBindingStore`].
///
/// The wrapped integer is the variable's identifier; it's handed out by a
/// counter that only ever increases.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[display(fmt = "?{}", _0)]
pub struct IntVar(usize);

impl IntVar {
    /// Returns the integer identifier of the variable.
    #[must_use]
    pub const fn index(self) -> usize { self.0 }
}

impl Variable for IntVar {
    fn var_id(&self) -> usize { self.0 }
}

/// The configuration of an [`IntBindingStore`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    new,
)]
#[serde(default)]
pub struct Config {
    /// The maximum number of variables the store may allocate. [`None`]
    /// means unlimited.
    pub variable_limit: Option<usize>,
}

/// An error raised by an [`IntBindingStore`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, thiserror::Error,
)]
pub enum StoreError {
    /// The store already allocated as many variables as it's allowed to.
    #[error("the binding store exhausted its limit of {limit} variables")]
    Exhausted {
        /// The number of variables the store was allowed to allocate.
        limit: usize,
    },

    /// A transaction was committed or rolled back while none was open.
    #[error("there is no open transaction in the binding store")]
    NoTransaction,
}

/// The state of a single variable before it was overwritten inside a
/// transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Undo<F: Unifiable> {
    index: usize,
    previous: Option<Rank<F, IntVar>>,
}

/// A binding store mapping [`IntVar`]s to their [`Rank`] and binding.
///
/// Variables are allocated by incrementing a counter, so identifiers are
/// never reused, not even after a rollback. The store keeps an entry only for
/// variables that were bound or ranked at least once.
///
/// The store supports nested transactions: while a transaction is open, every
/// write (including the path compression performed by the unification
/// algorithm) is journaled and can be undone with
/// [`IntBindingStore::rollback`].
#[derive(Debug, Clone, PartialEq, Eq, CopyGetters)]
pub struct IntBindingStore<F: Unifiable> {
    /// Gets the configuration the store was created with.
    #[get_copy = "pub"]
    config: Config,

    next_index: usize,
    entries: BTreeMap<usize, Rank<F, IntVar>>,
    journal: Vec<Vec<Undo<F>>>,
}

impl<F: Unifiable> Default for IntBindingStore<F> {
    fn default() -> Self { Self::new(Config::default()) }
}

impl<F: Unifiable> IntBindingStore<F> {
    /// Creates a new empty store with the given configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self {
            config,
            next_index: 0,
            entries: BTreeMap::new(),
            journal: Vec::new(),
        }
    }

    /// Returns the number of variables allocated so far.
    #[must_use]
    pub const fn variable_count(&self) -> usize { self.next_index }

    /// Returns the number of variables currently bound to a term.
    #[must_use]
    pub fn bound_count(&self) -> usize {
        self.entries.values().filter(|entry| entry.binding.is_some()).count()
    }

    /// Returns the rank of the given variable.
    #[must_use]
    pub fn rank_of(&self, variable: IntVar) -> u8 {
        self.entries.get(&variable.0).map_or(0, |entry| entry.rank)
    }

    /// Returns the number of currently open transactions.
    #[must_use]
    pub fn transaction_depth(&self) -> usize { self.journal.len() }

    /// Opens a new, possibly nested, transaction.
    pub fn begin(&mut self) {
        self.journal.push(Vec::new());

        debug!("began transaction at depth {}", self.journal.len());
    }

    /// Commits the innermost transaction.
    ///
    /// The writes made by a committed nested transaction still belong to the
    /// enclosing transaction and are undone if the enclosing one rolls back.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoTransaction`] if no transaction is open.
    pub fn commit(&mut self) -> Result<(), StoreError> {
        let frame = self.journal.pop().ok_or(StoreError::NoTransaction)?;

        debug!("committed transaction with {} writes", frame.len());

        if let Some(parent) = self.journal.last_mut() {
            parent.extend(frame);
        }

        Ok(())
    }

    /// Rolls back the innermost transaction, restoring every binding and rank
    /// written since it began.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoTransaction`] if no transaction is open.
    pub fn rollback(&mut self) -> Result<(), StoreError> {
        let frame = self.journal.pop().ok_or(StoreError::NoTransaction)?;

        debug!("rolled back transaction with {} writes", frame.len());

        self.undo(frame);

        Ok(())
    }

    /// Runs `f` inside a transaction, committing it if `f` succeeds and
    /// rolling it back if `f` fails.
    ///
    /// Any transaction `f` leaves open is closed along with the one opened
    /// here.
    ///
    /// # Errors
    ///
    /// Returns the error returned by `f`.
    pub fn atomically<T, E>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, E>,
    ) -> Result<T, E> {
        let depth = self.journal.len();
        self.begin();

        let result = f(self);

        while self.journal.len() > depth {
            let Some(frame) = self.journal.pop() else { break };

            if result.is_ok() {
                if let Some(parent) = self.journal.last_mut() {
                    parent.extend(frame);
                }
            } else {
                self.undo(frame);
            }
        }

        debug!(
            "{} atomic section",
            if result.is_ok() { "committed" } else { "rolled back" }
        );

        result
    }

    fn undo(&mut self, frame: Vec<Undo<F>>) {
        for Undo { index, previous } in frame.into_iter().rev() {
            match previous {
                Some(previous) => {
                    self.entries.insert(index, previous);
                }
                None => {
                    self.entries.remove(&index);
                }
            }
        }
    }

    /// Returns the entry of the variable for writing, journaling its current
    /// state if a transaction is open.
    fn entry_mut(&mut self, variable: IntVar) -> &mut Rank<F, IntVar> {
        if let Some(frame) = self.journal.last_mut() {
            frame.push(Undo {
                index: variable.0,
                previous: self.entries.get(&variable.0).cloned(),
            });
        }

        self.entries.entry(variable.0).or_default()
    }

    fn binding(&self, variable: IntVar) -> Option<Term<F, IntVar>> {
        self.entries.get(&variable.0).and_then(|entry| entry.binding.clone())
    }

    fn rank_entry(&self, variable: IntVar) -> Rank<F, IntVar> {
        self.entries.get(&variable.0).cloned().unwrap_or_default()
    }

    /// Hands out the next identifier, or [`None`] once the counter can't
    /// grow anymore. The variable limit isn't checked here.
    fn allocate(&mut self) -> Option<IntVar> {
        let index = self.next_index;
        self.next_index = index.checked_add(1)?;

        Some(IntVar(index))
    }

    fn write(&mut self, variable: IntVar, term: Term<F, IntVar>) {
        trace!("binding {variable} to {term:?}");

        let previous =
            mem::replace(&mut self.entry_mut(variable).binding, Some(term));

        if previous.is_some() {
            trace!("{variable} was bound before, its binding is replaced");
        }
    }

    fn promote(&mut self, variable: IntVar) {
        let entry = self.entry_mut(variable);
        entry.rank = entry.rank.saturating_add(1);

        trace!("incremented the rank of {variable} to {}", entry.rank);
    }
}

impl<F: Unifiable> BindingStore for IntBindingStore<F> {
    type Structure = F;
    type Variable = IntVar;
    type Error = StoreError;

    fn lookup_var(
        &self,
        variable: &IntVar,
    ) -> Result<Option<Term<F, IntVar>>, StoreError> {
        Ok(self.binding(*variable))
    }

    fn free_var(&mut self) -> Result<IntVar, StoreError> {
        if let Some(limit) = self.config.variable_limit {
            if self.next_index >= limit {
                debug!("refusing to allocate beyond {limit} variables");
                return Err(StoreError::Exhausted { limit });
            }
        }

        self.allocate().ok_or(StoreError::Exhausted { limit: usize::MAX })
    }

    fn bind_var(
        &mut self,
        variable: &IntVar,
        term: Term<F, IntVar>,
    ) -> Result<(), StoreError> {
        self.write(*variable, term);

        Ok(())
    }
}

impl<F: Unifiable> RankedBindingStore for IntBindingStore<F> {
    fn lookup_rank_var(
        &self,
        variable: &IntVar,
    ) -> Result<Rank<F, IntVar>, StoreError> {
        Ok(self.rank_entry(*variable))
    }

    fn increment_rank(&mut self, variable: &IntVar) -> Result<(), StoreError> {
        self.promote(*variable);

        Ok(())
    }
}

/// A store whose operations can't fail, wrapped around an
/// [`IntBindingStore`] without a variable limit.
///
/// Useful for callers that want [`Infallible`] as the store error so the
/// only failures left are the ones produced by unification itself. Like the
/// wrapped store, it keeps a rank per variable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnboundedStore<F: Unifiable>(IntBindingStore<F>);

impl<F: Unifiable> UnboundedStore<F> {
    /// Creates a new empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self(IntBindingStore::new(Config { variable_limit: None }))
    }

    /// Returns the underlying [`IntBindingStore`].
    #[must_use]
    pub const fn inner(&self) -> &IntBindingStore<F> { &self.0 }
}

impl<F: Unifiable> BindingStore for UnboundedStore<F> {
    type Structure = F;
    type Variable = IntVar;
    type Error = Infallible;

    fn lookup_var(
        &self,
        variable: &IntVar,
    ) -> Result<Option<Term<F, IntVar>>, Infallible> {
        Ok(self.0.binding(*variable))
    }

    /// # Panics
    ///
    /// Panics once every `usize` identifier has been handed out.
    fn free_var(&mut self) -> Result<IntVar, Infallible> {
        Ok(self.0.allocate().expect("the variable identifiers are exhausted"))
    }

    fn bind_var(
        &mut self,
        variable: &IntVar,
        term: Term<F, IntVar>,
    ) -> Result<(), Infallible> {
        self.0.write(*variable, term);

        Ok(())
    }
}

impl<F: Unifiable> RankedBindingStore for UnboundedStore<F> {
    fn lookup_rank_var(
        &self,
        variable: &IntVar,
    ) -> Result<Rank<F, IntVar>, Infallible> {
        Ok(self.0.rank_entry(*variable))
    }

    fn increment_rank(&mut self, variable: &IntVar) -> Result<(), Infallible> {
        self.0.promote(*variable);

        Ok(())
    }
}
