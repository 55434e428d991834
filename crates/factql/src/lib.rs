//! factql: an embeddable query/expression-evaluation engine
//!
//! factql lets a host express SQL-like analytical queries (select, where,
//! group-by, having, aggregates) over a collection of opaque,
//! context-tagged facts supplied by an external data source, and receive
//! tabular results. The engine never parses the underlying document format
//! itself; all domain resolution goes through the
//! [`Evaluator`](factql_model::Evaluator) trait.
//!
//! # Example
//!
//! ```
//! use factql::{Expr, FactRecord, MemoryEvaluator, QueryExecutor, QuerySpec};
//!
//! let mut facts = MemoryEvaluator::new();
//! facts.insert(FactRecord::new("gaap:Revenue", "C1", 100i64));
//! facts.insert(FactRecord::new("gaap:Revenue", "C2", 200i64));
//! facts.set_label("gaap:Revenue", "Revenue");
//!
//! let executor = QueryExecutor::new(&facts);
//! let spec = QuerySpec::new(vec![Expr::concept_value("gaap:Revenue")]);
//! let output = executor.query(&spec).unwrap();
//! let rows = output.as_row_dicts().unwrap();
//! assert_eq!(rows.len(), 2);
//! ```

// Re-export all public APIs from internal crates
pub use factql_ast as ast;
pub use factql_eval as eval;
pub use factql_model as model;
pub use factql_types as types;

// Convenience re-exports
pub use factql_ast::{
    AggregateExpr, AggregateOp, AstResult, BinaryExpr, BinaryOp, ConceptRef, DimRef,
    DistinctExpr, Expr, ExprError, Property, YearExpr,
};
pub use factql_eval::{
    EvalError, EvalResult, ExprEngine, FactSet, FactSetList, Header, HeaderDisplay,
    OutputFormat, QueryExecutor, QueryOutput, QuerySpec, Select, SelectItem, Target,
};
pub use factql_model::{
    DimMember, Evaluator, EvaluatorError, FactId, FactRecord, MemoryEvaluator, Period,
};
pub use factql_types::{PeriodFormats, Value};
