//! In-memory reference adapter
//!
//! [`MemoryEvaluator`] implements the full [`Evaluator`] interface over a
//! plain collection of [`FactRecord`]s. It is the adapter used by the test
//! suites and by hosts that already hold their facts in memory; adapters
//! over real document processors implement the same trait.

use crate::evaluator::{Evaluator, EvaluatorError};
use crate::fact::FactId;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use factql_types::{PeriodFormats, Value};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{DefaultHasher, Hash, Hasher};

/// A member reported on one dimensional axis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DimMember {
    /// Member drawn from the taxonomy, identified by name
    Explicit(String),
    /// Free-typed member value
    Typed(Value),
}

/// The time period a fact was reported for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    /// A single point in time
    Instant(NaiveDateTime),
    /// A start/end range; `end` is the exclusive end instant, so a year
    /// ending 31 March carries `end` = 1 April at midnight
    Duration {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    /// Unbounded
    Forever,
}

impl Period {
    fn end_instant(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Instant(dt) => Some(*dt),
            Self::Duration { end, .. } => Some(*end),
            Self::Forever => None,
        }
    }
}

/// One reported fact: a concept, a typed value, and its context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactRecord {
    pub concept: String,
    pub context_id: String,
    pub entity: String,
    pub value: Value,
    pub dims: BTreeMap<String, DimMember>,
    pub period: Option<Period>,
}

impl FactRecord {
    /// Create a fact for a concept in a context
    pub fn new(
        concept: impl Into<String>,
        context_id: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            concept: concept.into(),
            context_id: context_id.into(),
            entity: String::new(),
            value: value.into(),
            dims: BTreeMap::new(),
            period: None,
        }
    }

    /// Set the reporting entity
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = entity.into();
        self
    }

    /// Add an explicit dimension member
    pub fn with_dim(mut self, axis: impl Into<String>, member: impl Into<String>) -> Self {
        self.dims.insert(axis.into(), DimMember::Explicit(member.into()));
        self
    }

    /// Add a typed dimension member
    pub fn with_typed_dim(mut self, axis: impl Into<String>, value: impl Into<Value>) -> Self {
        self.dims.insert(axis.into(), DimMember::Typed(value.into()));
        self
    }

    /// Set an instant period
    pub fn with_instant(mut self, at: NaiveDateTime) -> Self {
        self.period = Some(Period::Instant(at));
        self
    }

    /// Set a duration period; `end` is the exclusive end instant
    pub fn with_duration(mut self, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        self.period = Some(Period::Duration { start, end });
        self
    }

    /// Mark the period as unbounded
    pub fn with_forever(mut self) -> Self {
        self.period = Some(Period::Forever);
        self
    }
}

/// In-memory fact store implementing the [`Evaluator`] interface.
#[derive(Debug, Clone, Default)]
pub struct MemoryEvaluator {
    facts: Vec<FactRecord>,
    labels: BTreeMap<(String, Option<String>), String>,
    dim_defaults: BTreeMap<String, String>,
}

impl MemoryEvaluator {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fact and return its handle
    pub fn insert(&mut self, record: FactRecord) -> FactId {
        let id = FactId(self.facts.len() as u64);
        self.facts.push(record);
        id
    }

    /// Set the default-role label of a concept or member
    pub fn set_label(&mut self, name: impl Into<String>, label: impl Into<String>) {
        self.labels.insert((name.into(), None), label.into());
    }

    /// Set a role-specific label
    pub fn set_role_label(
        &mut self,
        name: impl Into<String>,
        role: impl Into<String>,
        label: impl Into<String>,
    ) {
        self.labels
            .insert((name.into(), Some(role.into())), label.into());
    }

    /// Declare the default member of a dimensional axis
    pub fn set_dim_default(&mut self, axis: impl Into<String>, member: impl Into<String>) {
        self.dim_defaults.insert(axis.into(), member.into());
    }

    fn record(&self, fact: FactId) -> Option<&FactRecord> {
        self.facts.get(fact.0 as usize)
    }

    fn known_names(&self) -> BTreeSet<&str> {
        let mut names: BTreeSet<&str> = BTreeSet::new();
        for record in &self.facts {
            names.insert(record.concept.as_str());
            for (axis, member) in &record.dims {
                names.insert(axis.as_str());
                if let DimMember::Explicit(m) = member {
                    names.insert(m.as_str());
                }
            }
        }
        for (name, _role) in self.labels.keys() {
            names.insert(name.as_str());
        }
        for (axis, member) in &self.dim_defaults {
            names.insert(axis.as_str());
            names.insert(member.as_str());
        }
        names
    }

    /// Resolve an identifier: prefixed names are used verbatim, bare local
    /// names must match exactly one known name's local part.
    fn resolve(&self, name: &str) -> Result<String, EvaluatorError> {
        if name.contains(':') {
            return Ok(name.to_string());
        }
        let matches: Vec<&str> = self
            .known_names()
            .into_iter()
            .filter(|known| {
                *known == name || known.rsplit(':').next() == Some(name)
            })
            .collect();
        match matches.as_slice() {
            [] => Ok(name.to_string()),
            [unique] => Ok((*unique).to_string()),
            many => Err(EvaluatorError::AmbiguousName {
                name: name.to_string(),
                candidates: many.iter().map(ToString::to_string).collect(),
            }),
        }
    }

    fn fiscal_years(&self) -> Vec<i32> {
        let mut years: BTreeSet<i32> = BTreeSet::new();
        for record in &self.facts {
            if let Some(end) = record.period.as_ref().and_then(Period::end_instant) {
                years.insert(to_fiscal_year(end));
            }
        }
        years.into_iter().rev().collect()
    }

    fn label_for(&self, name: &str, role: Option<&str>) -> Option<String> {
        if let Some(role) = role {
            if let Some(label) = self.labels.get(&(name.to_string(), Some(role.to_string()))) {
                return Some(label.clone());
            }
        }
        self.labels.get(&(name.to_string(), None)).cloned()
    }

    fn resolved_concept_name(
        &self,
        fact: Option<FactId>,
        name: Option<&str>,
    ) -> Result<Option<String>, EvaluatorError> {
        if let Some(record) = fact.and_then(|f| self.record(f)) {
            return Ok(Some(record.concept.clone()));
        }
        match name {
            Some(name) => {
                let resolved = self.resolve(name)?;
                if self.known_names().contains(resolved.as_str()) {
                    Ok(Some(resolved))
                } else {
                    Ok(None)
                }
            }
            None => {
                if fact.is_some() {
                    // Dangling handle from another evaluator
                    Ok(None)
                } else {
                    Err(EvaluatorError::internal(
                        "either a fact or a concept name is required",
                    ))
                }
            }
        }
    }

    fn provided_dim(&self, fact: FactId, axis: &str) -> Result<Option<&DimMember>, EvaluatorError> {
        let axis = self.resolve(axis)?;
        Ok(self.record(fact).and_then(|r| r.dims.get(&axis)))
    }

    fn default_member(&self, axis: &str) -> Result<Option<&str>, EvaluatorError> {
        let axis = self.resolve(axis)?;
        Ok(self.dim_defaults.get(&axis).map(String::as_str))
    }
}

/// Fiscal year of an exclusive period end instant: the year of the last
/// day actually covered.
fn to_fiscal_year(end: NaiveDateTime) -> i32 {
    use chrono::Datelike;
    (end - Duration::days(1)).date().year()
}

impl Evaluator for MemoryEvaluator {
    fn facts(&self, concept: Option<&str>) -> Result<Vec<FactId>, EvaluatorError> {
        match concept {
            None => Ok((0..self.facts.len() as u64).map(FactId).collect()),
            Some(name) => {
                let resolved = self.resolve(name)?;
                Ok(self
                    .facts
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| r.concept == resolved)
                    .map(|(i, _)| FactId(i as u64))
                    .collect())
            }
        }
    }

    fn year(&self, offset: i32) -> Option<i32> {
        if offset > 0 {
            return Some(offset);
        }
        self.fiscal_years().get((-offset) as usize).copied()
    }

    fn concept(
        &self,
        fact: Option<FactId>,
        name: Option<&str>,
    ) -> Result<Option<Value>, EvaluatorError> {
        Ok(self
            .resolved_concept_name(fact, name)?
            .map(Value::Str))
    }

    fn concept_name(
        &self,
        fact: Option<FactId>,
        name: Option<&str>,
    ) -> Result<Option<String>, EvaluatorError> {
        self.resolved_concept_name(fact, name)
    }

    fn concept_label(
        &self,
        fact: Option<FactId>,
        name: Option<&str>,
        role: Option<&str>,
    ) -> Result<Option<String>, EvaluatorError> {
        match self.resolved_concept_name(fact, name)? {
            Some(concept) => Ok(self.label_for(&concept, role)),
            None => Ok(None),
        }
    }

    fn concept_value(&self, fact: Option<FactId>, default: Option<&Value>) -> Option<Value> {
        match fact.and_then(|f| self.record(f)) {
            Some(record) if !record.value.is_null() => Some(record.value.clone()),
            _ => default.cloned(),
        }
    }

    fn dim_member(
        &self,
        fact: FactId,
        axis: &str,
        include_defaults: bool,
    ) -> Result<Option<Value>, EvaluatorError> {
        match self.provided_dim(fact, axis)? {
            Some(DimMember::Explicit(member)) => Ok(Some(Value::Str(member.clone()))),
            Some(DimMember::Typed(value)) => Ok(Some(value.clone())),
            None if include_defaults => Ok(self
                .default_member(axis)?
                .map(|m| Value::Str(m.to_string()))),
            None => Ok(None),
        }
    }

    fn dim_member_name(
        &self,
        fact: FactId,
        axis: &str,
        include_defaults: bool,
    ) -> Result<Option<String>, EvaluatorError> {
        match self.provided_dim(fact, axis)? {
            Some(DimMember::Explicit(member)) => Ok(Some(member.clone())),
            Some(DimMember::Typed(_)) => Ok(None),
            None if include_defaults => Ok(self.default_member(axis)?.map(ToString::to_string)),
            None => Ok(None),
        }
    }

    fn dim_member_label(
        &self,
        fact: FactId,
        axis: &str,
        include_defaults: bool,
        role: Option<&str>,
    ) -> Result<Option<String>, EvaluatorError> {
        match self.provided_dim(fact, axis)? {
            Some(DimMember::Explicit(member)) => {
                Ok(Some(self.label_for(member, role).unwrap_or_else(|| member.clone())))
            }
            Some(DimMember::Typed(value)) => Ok(Some(value.to_string())),
            None if include_defaults => match self.default_member(axis)? {
                Some(member) => Ok(Some(
                    self.label_for(member, role).unwrap_or_else(|| member.to_string()),
                )),
                None => Ok(None),
            },
            None => Ok(None),
        }
    }

    fn dim_member_value(
        &self,
        fact: FactId,
        axis: &str,
        include_defaults: bool,
        _role: Option<&str>,
    ) -> Result<Option<Value>, EvaluatorError> {
        match self.provided_dim(fact, axis)? {
            Some(DimMember::Explicit(member)) => Ok(Some(Value::Str(member.clone()))),
            Some(DimMember::Typed(value)) => Ok(Some(value.clone())),
            None if include_defaults => Ok(self
                .default_member(axis)?
                .map(|m| Value::Str(m.to_string()))),
            None => Ok(None),
        }
    }

    fn dim_axes(&self, fact: FactId) -> BTreeSet<String> {
        self.record(fact)
            .map(|r| r.dims.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn period(&self, fact: FactId, forever: Option<&Value>) -> Option<Value> {
        match self.record(fact)?.period? {
            Period::Instant(at) => Some(Value::DateTime(at)),
            Period::Duration { start, end } => Some(Value::List(vec![
                Value::DateTime(start),
                Value::DateTime(end),
            ])),
            Period::Forever => forever.cloned(),
        }
    }

    fn period_str(&self, fact: FactId, formats: &PeriodFormats) -> Option<String> {
        match self.record(fact)?.period? {
            Period::Instant(at) => Some(at.format(&formats.instant).to_string()),
            Period::Duration { start, end } => {
                let start = start.format(&formats.instant).to_string();
                let end = end.format(&formats.instant).to_string();
                Some(formats.render_duration(&start, &end))
            }
            Period::Forever => Some(formats.forever.clone()),
        }
    }

    fn start_datetime(&self, fact: FactId) -> Option<NaiveDateTime> {
        match self.record(fact)?.period? {
            Period::Duration { start, .. } => Some(start),
            _ => None,
        }
    }

    fn end_datetime(&self, fact: FactId) -> Option<NaiveDateTime> {
        self.record(fact)?.period?.end_instant()
    }

    fn end_date(&self, fact: FactId) -> Option<NaiveDate> {
        self.end_datetime(fact).map(|dt| (dt - Duration::days(1)).date())
    }

    fn fiscal_year(&self, fact: FactId) -> Option<i32> {
        self.end_datetime(fact).map(to_fiscal_year)
    }

    fn context_id(&self, fact: FactId) -> Option<String> {
        self.record(fact).map(|r| r.context_id.clone())
    }

    fn context_hash_no_period_type(&self, fact: FactId) -> Option<u64> {
        let record = self.record(fact)?;
        let mut hasher = DefaultHasher::new();
        record.entity.hash(&mut hasher);
        record.dims.hash(&mut hasher);
        record.period.as_ref().and_then(Period::end_instant).hash(&mut hasher);
        Some(hasher.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dt(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn sample() -> MemoryEvaluator {
        let mut ev = MemoryEvaluator::new();
        ev.insert(
            FactRecord::new("gaap:Revenue", "C1", 100i64)
                .with_duration(dt(2018, 4, 1), dt(2019, 4, 1)),
        );
        ev.insert(
            FactRecord::new("gaap:Revenue", "C2", 200i64)
                .with_duration(dt(2017, 4, 1), dt(2018, 4, 1)),
        );
        ev.insert(
            FactRecord::new("gaap:Assets", "C3", 500i64).with_instant(dt(2019, 4, 1)),
        );
        ev.set_label("gaap:Revenue", "Revenue");
        ev
    }

    #[test]
    fn test_local_name_resolution() {
        let ev = sample();
        assert_eq!(ev.facts(Some("Revenue")).unwrap().len(), 2);
        assert_eq!(ev.facts(Some("gaap:Revenue")).unwrap().len(), 2);
        assert_eq!(ev.facts(Some("Missing")).unwrap().len(), 0);
    }

    #[test]
    fn test_ambiguous_local_name() {
        let mut ev = sample();
        ev.insert(FactRecord::new("ifrs:Revenue", "C9", 1i64));
        let err = ev.facts(Some("Revenue")).unwrap_err();
        assert!(matches!(err, EvaluatorError::AmbiguousName { .. }));
        // Prefixed names stay unambiguous
        assert_eq!(ev.facts(Some("ifrs:Revenue")).unwrap().len(), 1);
    }

    #[test]
    fn test_fiscal_year_offsets() {
        let ev = sample();
        // End instant 2019-04-01 covers through 2019-03-31, so fy 2019
        assert_eq!(ev.year(0), Some(2019));
        assert_eq!(ev.year(-1), Some(2018));
        assert_eq!(ev.year(-2), None);
        assert_eq!(ev.year(2017), Some(2017));
    }

    #[test]
    fn test_dimension_defaults() {
        let mut ev = MemoryEvaluator::new();
        let plain = ev.insert(FactRecord::new("gaap:Shares", "C1", 10i64));
        let tagged = ev.insert(
            FactRecord::new("gaap:Shares", "C2", 20i64)
                .with_dim("gaap:ClassAxis", "gaap:PreferenceMember"),
        );
        ev.set_dim_default("gaap:ClassAxis", "gaap:OrdinaryMember");

        assert_eq!(
            ev.dim_member_name(tagged, "gaap:ClassAxis", true).unwrap(),
            Some("gaap:PreferenceMember".to_string())
        );
        assert_eq!(
            ev.dim_member_name(plain, "gaap:ClassAxis", true).unwrap(),
            Some("gaap:OrdinaryMember".to_string())
        );
        assert_eq!(ev.dim_member_name(plain, "gaap:ClassAxis", false).unwrap(), None);
        assert_eq!(ev.dim_axes(plain), BTreeSet::new());
        assert_eq!(
            ev.dim_axes(tagged),
            BTreeSet::from(["gaap:ClassAxis".to_string()])
        );
    }

    #[test]
    fn test_typed_dimension_member() {
        let mut ev = MemoryEvaluator::new();
        let fact = ev.insert(
            FactRecord::new("gaap:Remuneration", "C1", 9i64)
                .with_typed_dim("gaap:DirectorAxis", "D. Smith"),
        );
        assert_eq!(ev.dim_member_name(fact, "gaap:DirectorAxis", true).unwrap(), None);
        assert_eq!(
            ev.dim_member_value(fact, "gaap:DirectorAxis", true, None).unwrap(),
            Some(Value::Str("D. Smith".to_string()))
        );
        assert_eq!(
            ev.dim_member_label(fact, "gaap:DirectorAxis", true, None).unwrap(),
            Some("D. Smith".to_string())
        );
    }

    #[test]
    fn test_period_accessors() {
        let ev = sample();
        let duration_fact = FactId(0);
        let instant_fact = FactId(2);

        assert_eq!(ev.start_datetime(duration_fact), Some(dt(2018, 4, 1)));
        assert_eq!(ev.end_datetime(duration_fact), Some(dt(2019, 4, 1)));
        assert_eq!(
            ev.end_date(duration_fact),
            Some(NaiveDate::from_ymd_opt(2019, 3, 31).unwrap())
        );
        assert_eq!(ev.fiscal_year(duration_fact), Some(2019));

        assert_eq!(ev.start_datetime(instant_fact), None);
        assert_eq!(ev.fiscal_year(instant_fact), Some(2019));

        assert_eq!(
            ev.period_str(duration_fact, &PeriodFormats::default()),
            Some("01/04/2018 to 01/04/2019".to_string())
        );
    }

    #[test]
    fn test_context_hash_ignores_period_type() {
        let mut ev = MemoryEvaluator::new();
        // Same entity and end instant, one instant and one duration period
        let a = ev.insert(
            FactRecord::new("gaap:Assets", "I1", 1i64)
                .with_entity("E")
                .with_instant(dt(2019, 4, 1)),
        );
        let b = ev.insert(
            FactRecord::new("gaap:TypeOfShare", "D1", "preference")
                .with_entity("E")
                .with_duration(dt(2018, 4, 1), dt(2019, 4, 1)),
        );
        let c = ev.insert(
            FactRecord::new("gaap:Assets", "I2", 2i64)
                .with_entity("E")
                .with_instant(dt(2018, 4, 1)),
        );
        assert_eq!(
            ev.context_hash_no_period_type(a),
            ev.context_hash_no_period_type(b)
        );
        assert_ne!(
            ev.context_hash_no_period_type(a),
            ev.context_hash_no_period_type(c)
        );
    }

    #[test]
    fn test_concept_value_default() {
        let ev = sample();
        assert_eq!(
            ev.concept_value(Some(FactId(0)), None),
            Some(Value::Int(100))
        );
        let fallback = Value::Int(-1);
        assert_eq!(ev.concept_value(None, Some(&fallback)), Some(Value::Int(-1)));
    }

    #[test]
    fn test_labels_and_roles() {
        let mut ev = sample();
        ev.set_role_label("gaap:Revenue", "terse", "Rev");
        assert_eq!(
            ev.concept_label(None, Some("gaap:Revenue"), None).unwrap(),
            Some("Revenue".to_string())
        );
        assert_eq!(
            ev.concept_label(None, Some("gaap:Revenue"), Some("terse")).unwrap(),
            Some("Rev".to_string())
        );
        // Unknown role falls back to the default label
        assert_eq!(
            ev.concept_label(None, Some("gaap:Revenue"), Some("verbose")).unwrap(),
            Some("Revenue".to_string())
        );
        assert_eq!(ev.concept_label(None, Some("gaap:Assets"), None).unwrap(), None);
    }
}
