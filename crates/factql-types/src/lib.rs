//! Runtime value types for the factql query engine
//!
//! This crate defines [`Value`], the single value representation that flows
//! through expression evaluation, grouping and output formatting, along with
//! [`PeriodFormats`], the formatting configuration for period properties.

mod period;
mod value;

pub use period::PeriodFormats;
pub use value::Value;
