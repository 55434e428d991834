//! factql evaluation engine
//!
//! This crate turns declarative query specifications into tabular results:
//!
//! - [`ExprEngine`]: evaluates expressions against facts, fact sets and
//!   fact-set sequences through an [`Evaluator`](factql_model::Evaluator)
//!   adapter
//! - [`FactSet`] / [`FactSetList`]: the two grouping levels of the pipeline
//! - [`QueryExecutor`]: select / where / group-by / having / aggregate
//!   orchestration
//! - [`QueryOutput`]: the six output shapes
//!
//! # Example
//!
//! ```
//! use factql_ast::Expr;
//! use factql_eval::{QueryExecutor, QuerySpec};
//! use factql_model::{FactRecord, MemoryEvaluator};
//!
//! let mut facts = MemoryEvaluator::new();
//! facts.insert(FactRecord::new("gaap:Revenue", "C1", 100i64));
//! facts.insert(FactRecord::new("gaap:Revenue", "C2", 200i64));
//!
//! let executor = QueryExecutor::new(&facts);
//! let spec = QuerySpec::new(vec![Expr::sum(Expr::concept_value("gaap:Revenue")).unwrap()]);
//! let output = executor.query(&spec).unwrap();
//! assert_eq!(output.len(), 1);
//! ```

mod engine;
mod error;
mod executor;
mod fact_set;
mod format;
pub mod operators;
mod query;

pub use engine::{ExprEngine, Target};
pub use error::{EvalError, EvalResult};
pub use executor::QueryExecutor;
pub use fact_set::{FactSet, FactSetList};
pub use format::QueryOutput;
pub use query::{Header, HeaderDisplay, OutputFormat, QuerySpec, Select, SelectItem};
