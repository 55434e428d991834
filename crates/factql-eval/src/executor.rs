//! Query executor
//!
//! One execution runs the pipeline: normalize the select clause, apply the
//! implicit dimension filter, discover referenced concepts, fetch facts,
//! group them into fact sets by the primary key, filter, and either
//! evaluate columns directly or group again into fact-set lists for
//! aggregate queries. Formatting is the last stage.

use crate::engine::{ExprEngine, Target};
use crate::error::{EvalError, EvalResult};
use crate::fact_set::{FactSet, FactSetList};
use crate::format::{QueryOutput, format_output};
use crate::query::{Header, OutputFormat, QuerySpec};
use factql_ast::{BinaryExpr, BinaryOp, Expr};
use factql_model::{Evaluator, FactId};
use factql_types::Value;
use indexmap::{IndexMap, IndexSet};
use log::{debug, warn};
use std::collections::BTreeSet;

/// Executes declarative queries against an evaluator adapter.
///
/// The executor owns no facts and no caches; per-execution state lives and
/// dies inside [`QueryExecutor::query`].
pub struct QueryExecutor<'a> {
    evaluator: &'a dyn Evaluator,
    strict_groups: bool,
}

impl<'a> QueryExecutor<'a> {
    /// Create an executor over an evaluator.
    ///
    /// Group-consistency checking defaults to on in debug builds.
    pub fn new(evaluator: &'a dyn Evaluator) -> Self {
        Self {
            evaluator,
            strict_groups: cfg!(debug_assertions),
        }
    }

    /// Enable or disable group-consistency checking
    pub fn with_strict_groups(mut self, strict: bool) -> Self {
        self.strict_groups = strict;
        self
    }

    /// Execute a query and return its formatted output.
    pub fn query(&self, spec: &QuerySpec) -> EvalResult<QueryOutput> {
        let engine = ExprEngine::new(self.evaluator).with_strict_groups(self.strict_groups);
        let (header_exprs, select_exprs) = spec.normalized_select();
        let context_group_by = spec
            .context_group_by
            .clone()
            .unwrap_or_else(|| vec![Expr::context_id()]);
        let where_exprs = effective_where(spec, &select_exprs, &context_group_by);

        let concepts = referenced_concepts(
            &select_exprs,
            &where_exprs,
            &context_group_by,
            &spec.group_by,
            &spec.having,
        );
        let facts = self.discover_facts(&concepts)?;
        debug!("query references {} concepts, {} facts", concepts.len(), facts.len());

        let fact_sets = self.group_facts(&engine, facts, &context_group_by)?;
        let fact_sets = self.filter_sets(&engine, fact_sets, &where_exprs)?;
        debug!("{} fact sets after filtering", fact_sets.len());

        let is_aggregate_query = select_exprs.iter().any(Expr::is_aggregate);
        let columns = if is_aggregate_query {
            let lists = self.group_sets(&engine, fact_sets, &spec.group_by)?;
            let lists = self.filter_lists(&engine, lists, &spec.having)?;
            debug!("{} fact-set lists after having", lists.len());
            let mut columns = Vec::with_capacity(select_exprs.len());
            for expr in &select_exprs {
                let mut column = Vec::with_capacity(lists.len());
                for list in &lists {
                    column.push(engine.evaluate_aggregate(expr, list)?);
                }
                columns.push(column);
            }
            columns
        } else {
            let mut columns = Vec::with_capacity(select_exprs.len());
            for expr in &select_exprs {
                let column = match engine.evaluate(expr, Target::Sets(&fact_sets))? {
                    Value::List(values) => values,
                    value => vec![value],
                };
                columns.push(column);
            }
            columns
        };

        let mut headers = Vec::with_capacity(header_exprs.len());
        for header in header_exprs {
            headers.push(match header {
                Header::Text(text) => text,
                Header::Expr(expr) => engine.display(&expr, spec.header_display)?,
            });
        }
        Ok(format_output(headers, columns, spec.output_format))
    }

    /// Fetch the single value of a concept for the current fiscal year.
    ///
    /// Fails with [`EvalError::NoUniqueRow`] unless exactly one fact
    /// matches.
    pub fn get(&self, concept: &str) -> EvalResult<Value> {
        let spec = QuerySpec::new(vec![Expr::concept_value(concept)])
            .with_where(vec![Expr::fiscal_year().eq(Expr::year(0))?])
            .with_output_format(OutputFormat::RowWise);
        let output = self.query(&spec)?;
        let QueryOutput::Rows(rows) = output else {
            return Err(EvalError::internal("expected row-wise output"));
        };
        if rows.len() != 1 {
            return Err(EvalError::NoUniqueRow { rows: rows.len() });
        }
        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .unwrap_or(Value::Null))
    }

    /// Fetch `(value, fiscal year)` pairs of a concept for all years.
    pub fn get_all(&self, concept: &str) -> EvalResult<Vec<(Value, Value)>> {
        let spec = QuerySpec::new(vec![Expr::concept_value(concept), Expr::fiscal_year()])
            .with_output_format(OutputFormat::RowWise);
        let output = self.query(&spec)?;
        let QueryOutput::Rows(rows) = output else {
            return Err(EvalError::internal("expected row-wise output"));
        };
        Ok(rows
            .into_iter()
            .map(|row| {
                let mut values = row.into_iter();
                let value = values.next().unwrap_or(Value::Null);
                let year = values.next().unwrap_or(Value::Null);
                (value, year)
            })
            .collect())
    }

    /// Fetch the facts of every referenced concept, de-duplicated in
    /// first-seen order. An empty concept set falls back to the full fact
    /// collection, which can be expensive.
    fn discover_facts(&self, concepts: &BTreeSet<String>) -> EvalResult<Vec<FactId>> {
        if concepts.is_empty() {
            warn!("no concepts referenced in query; fetching the full fact collection");
            return Ok(self.evaluator.facts(None)?);
        }
        let mut facts: IndexSet<FactId> = IndexSet::new();
        for concept in concepts {
            facts.extend(self.evaluator.facts(Some(concept))?);
        }
        Ok(facts.into_iter().collect())
    }

    /// Bucket facts by the tuple of primary group-by values.
    fn group_facts(
        &self,
        engine: &ExprEngine<'_>,
        facts: Vec<FactId>,
        key_exprs: &[Expr],
    ) -> EvalResult<Vec<FactSet>> {
        let mut groups: IndexMap<Vec<Value>, FactSet> = IndexMap::new();
        for fact in facts {
            let mut key = Vec::with_capacity(key_exprs.len());
            for expr in key_exprs {
                key.push(engine.evaluate(expr, Target::Fact(fact))?);
            }
            groups.entry(key).or_default().push(fact);
        }
        Ok(groups.into_values().collect())
    }

    /// Keep fact sets for which every where expression is truthy.
    fn filter_sets(
        &self,
        engine: &ExprEngine<'_>,
        sets: Vec<FactSet>,
        where_exprs: &[Expr],
    ) -> EvalResult<Vec<FactSet>> {
        let mut kept = Vec::with_capacity(sets.len());
        for set in sets {
            let mut keep = true;
            for expr in where_exprs {
                if !engine.evaluate(expr, Target::Set(&set))?.is_truthy() {
                    keep = false;
                    break;
                }
            }
            if keep {
                kept.push(set);
            }
        }
        Ok(kept)
    }

    /// Bucket fact sets by the tuple of secondary group-by values. An
    /// empty group-by yields a single list holding every fact set.
    fn group_sets(
        &self,
        engine: &ExprEngine<'_>,
        sets: Vec<FactSet>,
        key_exprs: &[Expr],
    ) -> EvalResult<Vec<FactSetList>> {
        let mut groups: IndexMap<Vec<Value>, Vec<FactSet>> = IndexMap::new();
        for set in sets {
            let mut key = Vec::with_capacity(key_exprs.len());
            for expr in key_exprs {
                key.push(engine.evaluate(expr, Target::Set(&set))?);
            }
            groups.entry(key).or_default().push(set);
        }
        Ok(groups.into_values().map(FactSetList::from_sets).collect())
    }

    /// Keep fact-set lists for which every having expression is truthy.
    fn filter_lists(
        &self,
        engine: &ExprEngine<'_>,
        lists: Vec<FactSetList>,
        having: &[Expr],
    ) -> EvalResult<Vec<FactSetList>> {
        let mut kept = Vec::with_capacity(lists.len());
        for list in lists {
            let mut keep = true;
            for expr in having {
                if !engine.evaluate_aggregate(expr, &list)?.is_truthy() {
                    keep = false;
                    break;
                }
            }
            if keep {
                kept.push(list);
            }
        }
        Ok(kept)
    }
}

/// The caller's where clause, plus the implicit no-dimensions filter when
/// nothing in the query mentions a dimensional property. Without it,
/// dimensionally-qualified facts would silently mix into every query.
fn effective_where(
    spec: &QuerySpec,
    select_exprs: &[Expr],
    context_group_by: &[Expr],
) -> Vec<Expr> {
    let mut where_exprs = spec.where_clauses.clone();
    let has_dimension = select_exprs
        .iter()
        .chain(&spec.where_clauses)
        .chain(context_group_by)
        .chain(&spec.group_by)
        .chain(&spec.having)
        .any(Expr::has_dimension_property);
    if !has_dimension {
        where_exprs.push(Expr::Binary(BinaryExpr {
            op: BinaryOp::Eq,
            lhs: Box::new(Expr::dim_axes()),
            rhs: Box::new(Expr::literal(Value::empty_set())),
        }));
    }
    where_exprs
}

/// Union of concept identifiers across every clause, for fact discovery.
fn referenced_concepts(
    select_exprs: &[Expr],
    where_exprs: &[Expr],
    context_group_by: &[Expr],
    group_by: &[Expr],
    having: &[Expr],
) -> BTreeSet<String> {
    let mut concepts = BTreeSet::new();
    for expr in select_exprs
        .iter()
        .chain(where_exprs)
        .chain(context_group_by)
        .chain(group_by)
        .chain(having)
    {
        concepts.extend(expr.concept_names().into_iter().map(str::to_string));
    }
    concepts
}
