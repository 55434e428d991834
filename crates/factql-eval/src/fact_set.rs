//! Fact grouping types
//!
//! A [`FactSet`] holds the facts sharing one primary group key (by default
//! a reporting context); a [`FactSetList`] holds the fact sets sharing one
//! secondary group key and is the unit over which aggregates reduce. Both
//! are created fresh per query execution and discarded after formatting.

use crate::error::{EvalError, EvalResult};
use factql_model::{Evaluator, FactId};
use indexmap::IndexMap;
use once_cell::sync::OnceCell;

/// Facts sharing a primary group key.
///
/// Within one fact set at most one fact may resolve to a given concept;
/// the memoized concept index enforces this on first use. The memo is
/// scoped to this instance, so regrouping facts always recomputes it.
#[derive(Debug, Default)]
pub struct FactSet {
    facts: Vec<FactId>,
    concept_index: OnceCell<IndexMap<String, FactId>>,
}

impl FactSet {
    /// Create an empty fact set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fact set from a list of facts
    pub fn from_facts(facts: Vec<FactId>) -> Self {
        Self {
            facts,
            concept_index: OnceCell::new(),
        }
    }

    /// Add a fact
    pub fn push(&mut self, fact: FactId) {
        // The memo is only built after grouping is complete
        debug_assert!(self.concept_index.get().is_none());
        self.facts.push(fact);
    }

    /// The facts in this set, in discovery order
    pub fn facts(&self) -> &[FactId] {
        &self.facts
    }

    /// Number of facts in this set
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// Check if the set is empty
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Iterate over the facts
    pub fn iter(&self) -> impl Iterator<Item = FactId> + '_ {
        self.facts.iter().copied()
    }

    /// The first fact, if any
    pub fn first(&self) -> Option<FactId> {
        self.facts.first().copied()
    }

    /// The concept index: concept identifier to the unique fact reporting
    /// it. Built on first use and memoized for the life of this instance.
    ///
    /// Fails with [`EvalError::DuplicateConcept`] if two facts resolve to
    /// the same concept, which signals an under-specified primary group-by.
    pub fn by_concept(
        &self,
        evaluator: &dyn Evaluator,
    ) -> EvalResult<&IndexMap<String, FactId>> {
        self.concept_index.get_or_try_init(|| {
            let mut index = IndexMap::new();
            for &fact in &self.facts {
                let Some(concept) = evaluator.concept_name(Some(fact), None)? else {
                    continue;
                };
                if index.insert(concept.clone(), fact).is_some() {
                    return Err(EvalError::duplicate_concept(concept));
                }
            }
            Ok(index)
        })
    }
}

/// Fact sets sharing a secondary group key.
#[derive(Debug, Default)]
pub struct FactSetList {
    sets: Vec<FactSet>,
}

impl FactSetList {
    /// Create a fact-set list
    pub fn from_sets(sets: Vec<FactSet>) -> Self {
        Self { sets }
    }

    /// The member fact sets, in grouping order
    pub fn sets(&self) -> &[FactSet] {
        &self.sets
    }

    /// Number of member fact sets
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Check if the list is empty
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// The first member fact set, if any
    pub fn first(&self) -> Option<&FactSet> {
        self.sets.first()
    }
}

impl From<Vec<FactSet>> for FactSetList {
    fn from(sets: Vec<FactSet>) -> Self {
        Self::from_sets(sets)
    }
}
