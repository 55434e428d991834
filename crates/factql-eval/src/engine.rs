//! Expression evaluation engine
//!
//! [`ExprEngine`] borrows an evaluator for one query execution and
//! dispatches on expression kind. The evaluation target is an explicit
//! tagged variant ([`Target`]): a single fact, one fact set, or an ordered
//! sequence of fact sets. Sequence targets map elementwise, except for
//! aggregates and distinct projections, which reduce the sequence.

use crate::error::{EvalError, EvalResult};
use crate::fact_set::{FactSet, FactSetList};
use crate::operators;
use crate::query::HeaderDisplay;
use factql_ast::{AggregateExpr, BinaryExpr, DistinctExpr, Expr, Property};
use factql_model::{Evaluator, FactId};
use factql_types::Value;
use indexmap::IndexSet;

/// What an expression is evaluated against.
#[derive(Clone, Copy)]
pub enum Target<'a> {
    /// A single fact
    Fact(FactId),
    /// One fact set (a primary group)
    Set(&'a FactSet),
    /// An ordered sequence of fact sets
    Sets(&'a [FactSet]),
}

impl Target<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Self::Fact(_) => "a fact",
            Self::Set(_) => "a fact set",
            Self::Sets(_) => "a fact-set sequence",
        }
    }
}

/// Evaluates expressions against facts through an evaluator adapter.
pub struct ExprEngine<'a> {
    evaluator: &'a dyn Evaluator,
    strict_groups: bool,
}

impl<'a> ExprEngine<'a> {
    /// Create an engine for one execution.
    ///
    /// Group-consistency checking defaults to on in debug builds.
    pub fn new(evaluator: &'a dyn Evaluator) -> Self {
        Self {
            evaluator,
            strict_groups: cfg!(debug_assertions),
        }
    }

    /// Enable or disable group-consistency checking (invariant: a
    /// non-aggregate expression must agree across all members of a group)
    pub fn with_strict_groups(mut self, strict: bool) -> Self {
        self.strict_groups = strict;
        self
    }

    /// The evaluator this engine resolves properties through
    pub fn evaluator(&self) -> &dyn Evaluator {
        self.evaluator
    }

    /// Evaluate an expression against a target.
    pub fn evaluate(&self, expr: &Expr, target: Target<'_>) -> EvalResult<Value> {
        match expr {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Constant(label) => Ok(Value::Symbol(label.clone())),
            Expr::Year(y) => Ok(match self.evaluator.year(y.offset) {
                Some(year) => Value::Int(i64::from(year)),
                None => Value::Null,
            }),
            Expr::Property(p) => self.eval_property(p, target),
            Expr::Binary(b) => self.eval_binary(b, target),
            Expr::Aggregate(a) => self.eval_aggregate_expr(a, target),
            Expr::Distinct(d) => self.eval_distinct(d, target),
        }
    }

    /// Evaluate an expression once per member of a fact-set list, as the
    /// aggregate branch of the executor does for select and having clauses.
    ///
    /// Aggregate expressions reduce the list; non-aggregate expressions
    /// must agree across all members (checked in strict mode) and yield the
    /// common value.
    pub fn evaluate_aggregate(&self, expr: &Expr, list: &FactSetList) -> EvalResult<Value> {
        if expr.is_aggregate() {
            return self.evaluate(expr, Target::Sets(list.sets()));
        }
        if self.strict_groups {
            let mut common: Option<Value> = None;
            for set in list.sets() {
                let value = self.evaluate(expr, Target::Set(set))?;
                match &common {
                    None => common = Some(value),
                    Some(seen) if *seen == value => {}
                    Some(_) => return Err(EvalError::group_mismatch(expr.to_string())),
                }
            }
            Ok(common.unwrap_or(Value::Null))
        } else {
            match list.first() {
                Some(set) => self.evaluate(expr, Target::Set(set)),
                None => Ok(Value::Null),
            }
        }
    }

    /// Render the human header for an expression.
    ///
    /// Value-only nodes (a fiscal-year offset) have no display form and
    /// fail with [`EvalError::NotDisplayable`].
    pub fn display(&self, expr: &Expr, show: HeaderDisplay) -> EvalResult<String> {
        match expr {
            Expr::Literal(v) => Ok(v.to_string()),
            Expr::Constant(label) => Ok(label.to_uppercase()),
            Expr::Year(_) => Err(EvalError::not_displayable(expr.to_string())),
            Expr::Property(p) => self.display_property(p, show),
            Expr::Binary(b) => Ok(format!(
                "({} ${} {})",
                self.display(&b.lhs, show)?,
                b.op.symbol().to_ascii_uppercase(),
                self.display(&b.rhs, show)?
            )),
            Expr::Aggregate(a) => Ok(format!(
                "{}({})",
                a.op.name(),
                self.display(&a.expr, show)?
            )),
            Expr::Distinct(d) => {
                let mut parts = Vec::with_capacity(d.exprs.len());
                for expr in &d.exprs {
                    parts.push(self.display(expr, show)?);
                }
                Ok(format!("DISTINCT({})", parts.join(", ")))
            }
        }
    }

    fn display_property(&self, prop: &Property, show: HeaderDisplay) -> EvalResult<String> {
        if let Some(concept) = prop.concept_ref() {
            return Ok(match show {
                HeaderDisplay::Repr => prop.to_string(),
                HeaderDisplay::Name => match &concept.name {
                    Some(name) => name.clone(),
                    None => prop.to_string(),
                },
                HeaderDisplay::Label => match &concept.name {
                    Some(name) => self
                        .evaluator
                        .concept_label(None, Some(name), concept.label_role.as_deref())?
                        .unwrap_or_else(|| name.clone()),
                    None => prop.to_string(),
                },
            });
        }
        if let Some(dim) = prop.dim_ref() {
            return Ok(match show {
                HeaderDisplay::Repr => prop.to_string(),
                HeaderDisplay::Name => dim.axis.clone(),
                HeaderDisplay::Label => self
                    .evaluator
                    .concept_label(None, Some(&dim.axis), dim.label_role.as_deref())?
                    .unwrap_or_else(|| dim.axis.clone()),
            });
        }
        Ok(match prop {
            Property::DimAxes => "Dimensions".to_string(),
            Property::Period { .. } | Property::PeriodStr(_) => "Period".to_string(),
            Property::StartDateTime => "Start Datetime".to_string(),
            Property::EndDateTime => "End Datetime".to_string(),
            Property::EndDate => "End Date".to_string(),
            Property::FiscalYear => "FY".to_string(),
            Property::ContextId => "Context ID".to_string(),
            Property::ContextHash => "Context Hash".to_string(),
            // Concept and dimension families are handled above
            _ => prop.to_string(),
        })
    }

    fn eval_property(&self, prop: &Property, target: Target<'_>) -> EvalResult<Value> {
        match target {
            Target::Fact(fact) => self.eval_property_fact(prop, Some(fact)),
            Target::Set(set) => self.eval_property_set(prop, set),
            Target::Sets(sets) => {
                let mut values = Vec::with_capacity(sets.len());
                for set in sets {
                    values.push(self.eval_property_set(prop, set)?);
                }
                Ok(Value::List(values))
            }
        }
    }

    fn eval_property_fact(&self, prop: &Property, fact: Option<FactId>) -> EvalResult<Value> {
        if prop.concept_ref().is_some() {
            return self.eval_concept_property(prop, fact);
        }
        match fact {
            Some(fact) => self.eval_context_property(prop, fact),
            None => Ok(Value::Null),
        }
    }

    /// Concept-family properties accept a missing fact: the evaluator then
    /// resolves the bare concept name against its own metadata.
    fn eval_concept_property(&self, prop: &Property, fact: Option<FactId>) -> EvalResult<Value> {
        let ev = self.evaluator;
        match prop {
            Property::Concept(c) => Ok(value_or_null(ev.concept(fact, c.name.as_deref())?)),
            Property::ConceptName(c) => Ok(value_or_null(
                ev.concept_name(fact, c.name.as_deref())?.map(Value::Str),
            )),
            Property::ConceptLabel(c) => Ok(value_or_null(
                ev.concept_label(fact, c.name.as_deref(), c.label_role.as_deref())?
                    .map(Value::Str),
            )),
            Property::ConceptValue { default, .. } => {
                Ok(value_or_null(ev.concept_value(fact, default.as_ref())))
            }
            _ => Err(EvalError::internal("not a concept property")),
        }
    }

    fn eval_context_property(&self, prop: &Property, fact: FactId) -> EvalResult<Value> {
        let ev = self.evaluator;
        match prop {
            Property::DimMember(d) => {
                Ok(value_or_null(ev.dim_member(fact, &d.axis, d.include_defaults)?))
            }
            Property::DimMemberName(d) => Ok(value_or_null(
                ev.dim_member_name(fact, &d.axis, d.include_defaults)?
                    .map(Value::Str),
            )),
            Property::DimMemberLabel(d) => Ok(value_or_null(
                ev.dim_member_label(fact, &d.axis, d.include_defaults, d.label_role.as_deref())?
                    .map(Value::Str),
            )),
            Property::DimMemberValue(d) => Ok(value_or_null(
                ev.dim_member_value(fact, &d.axis, d.include_defaults, d.label_role.as_deref())?,
            )),
            Property::DimAxes => Ok(Value::Set(
                ev.dim_axes(fact).into_iter().map(Value::Str).collect(),
            )),
            Property::Period { forever } => Ok(value_or_null(ev.period(fact, forever.as_ref()))),
            Property::PeriodStr(formats) => {
                Ok(value_or_null(ev.period_str(fact, formats).map(Value::Str)))
            }
            Property::StartDateTime => {
                Ok(value_or_null(ev.start_datetime(fact).map(Value::DateTime)))
            }
            Property::EndDateTime => Ok(value_or_null(ev.end_datetime(fact).map(Value::DateTime))),
            Property::EndDate => Ok(value_or_null(ev.end_date(fact).map(Value::Date))),
            Property::FiscalYear => Ok(value_or_null(
                ev.fiscal_year(fact).map(|y| Value::Int(i64::from(y))),
            )),
            Property::ContextId => Ok(value_or_null(ev.context_id(fact).map(Value::Str))),
            Property::ContextHash => Ok(value_or_null(
                ev.context_hash_no_period_type(fact)
                    .map(|h| Value::Int(h as i64)),
            )),
            _ => Err(EvalError::internal("not a context property")),
        }
    }

    fn eval_property_set(&self, prop: &Property, set: &FactSet) -> EvalResult<Value> {
        if let Some(concept) = prop.concept_ref() {
            let Some(name) = concept.name.as_deref() else {
                return Err(EvalError::unsupported_target(
                    prop.to_string(),
                    "a fact set",
                    "a named concept",
                ));
            };
            // The index is keyed by canonical identifiers; resolve first so
            // bare local names find their fact
            let canonical = self
                .evaluator
                .concept_name(None, Some(name))?
                .unwrap_or_else(|| name.to_string());
            let fact = set.by_concept(self.evaluator)?.get(&canonical).copied();
            return self.eval_concept_property(prop, fact);
        }
        self.reduce_over_set(prop, set)
    }

    /// A non-concept property must agree across every fact of a set; the
    /// group key already fixed the context, so disagreement means the
    /// primary group-by is mis-specified.
    fn reduce_over_set(&self, prop: &Property, set: &FactSet) -> EvalResult<Value> {
        if self.strict_groups {
            let mut common: Option<Value> = None;
            for fact in set.iter() {
                let value = self.eval_context_property(prop, fact)?;
                match &common {
                    None => common = Some(value),
                    Some(seen) if *seen == value => {}
                    Some(_) => return Err(EvalError::group_mismatch(prop.to_string())),
                }
            }
            Ok(common.unwrap_or(Value::Null))
        } else {
            match set.first() {
                Some(fact) => self.eval_context_property(prop, fact),
                None => Ok(Value::Null),
            }
        }
    }

    fn eval_binary(&self, b: &BinaryExpr, target: Target<'_>) -> EvalResult<Value> {
        let aggregates = b.lhs.is_aggregate() || b.rhs.is_aggregate();
        if let Target::Sets(sets) = target {
            if !aggregates {
                let mut values = Vec::with_capacity(sets.len());
                for set in sets {
                    values.push(self.eval_binary(b, Target::Set(set))?);
                }
                return Ok(Value::List(values));
            }
        }
        // Null propagation: predicates are false on a missing operand,
        // arithmetic results are missing themselves
        let missing = if b.op.is_predicate() {
            Value::Bool(false)
        } else {
            Value::Null
        };
        let lhs = self.evaluate(&b.lhs, target)?;
        if lhs.is_null() {
            return Ok(missing);
        }
        let rhs = self.evaluate(&b.rhs, target)?;
        if rhs.is_null() {
            return Ok(missing);
        }
        operators::apply_binary(b.op, lhs, rhs)
    }

    fn eval_aggregate_expr(&self, agg: &AggregateExpr, target: Target<'_>) -> EvalResult<Value> {
        let Target::Sets(sets) = target else {
            return Err(EvalError::unsupported_target(
                format!("{}({})", agg.op.name(), agg.expr),
                target.kind(),
                "a fact-set sequence",
            ));
        };
        let mut values = Vec::with_capacity(sets.len());
        for set in sets {
            values.push(self.evaluate(&agg.expr, Target::Set(set))?);
        }
        if agg.skip_missing {
            values.retain(|v| !v.is_null());
        }
        if values.is_empty() {
            return Ok(agg.on_empty.clone());
        }
        operators::aggregate::reduce(&agg.op, values)
    }

    fn eval_distinct(&self, d: &DistinctExpr, target: Target<'_>) -> EvalResult<Value> {
        let Target::Sets(sets) = target else {
            return Err(EvalError::unsupported_target(
                "DISTINCT(...)",
                target.kind(),
                "a fact-set sequence",
            ));
        };
        let mut seen: IndexSet<Value> = IndexSet::new();
        for set in sets {
            if d.exprs.len() == 1 {
                let value = self.evaluate(&d.exprs[0], Target::Set(set))?;
                if d.skip_missing && value.is_null() {
                    continue;
                }
                seen.insert(value);
            } else {
                let mut tuple = Vec::with_capacity(d.exprs.len());
                for expr in &d.exprs {
                    tuple.push(self.evaluate(expr, Target::Set(set))?);
                }
                if d.skip_missing && tuple.iter().all(Value::is_null) {
                    continue;
                }
                seen.insert(Value::List(tuple));
            }
        }
        Ok(Value::List(seen.into_iter().collect()))
    }
}

fn value_or_null(opt: Option<Value>) -> Value {
    opt.unwrap_or(Value::Null)
}
