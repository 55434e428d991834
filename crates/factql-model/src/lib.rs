//! Evaluator interface and fact model
//!
//! This crate provides:
//! - The opaque [`FactId`] handle the engine passes around but never inspects
//! - The [`Evaluator`] trait: the capability set the query executor requires
//!   from a domain adapter (fact retrieval and property resolution)
//! - [`MemoryEvaluator`], an in-memory reference adapter for tests, examples
//!   and hosts that hold their facts in memory

mod evaluator;
mod fact;
mod memory;

pub use evaluator::{Evaluator, EvaluatorError};
pub use fact::FactId;
pub use memory::{DimMember, FactRecord, MemoryEvaluator, Period};
