//! # Pipeline stages
//!
//! Typed stage specifications. Every parameter that can be malformed is
//! checked when the stage is built, so a pipeline that constructs without
//! error will execute without error.
//!
//! ## Organization
//!
//! - **[stages]** - The [`Stage`] variant and sort keys
//! - **[condition]** - `$match` predicates (`$all`, `$regex`, comparisons)
//! - **[accumulator]** - `$group` accumulators and the `$avg` fallback policy
//! - **[expression]** - Group keys, date parts and `$addFields` expressions
//! - **[pipeline]** - The ordered [`Pipeline`] container
//!
//! ## Example
//!
//! ```text
//! [
//!   { $match: { isActive: true } },
//!   { $count: "activeUsers" }
//! ]
//! ```
//!
//! built directly:
//!
//! ```
//! use pipette::{Pipeline, Stage, stage::Predicate};
//!
//! let active = Pipeline::from_stages(vec![
//!     Stage::match_all(vec![Predicate::eq("isActive", true)?])?,
//!     Stage::count("activeUsers")?,
//! ])?;
//! # Ok::<(), pipette::PipelineError>(())
//! ```
pub mod accumulator;
pub mod condition;
pub mod expression;
pub mod pipeline;
pub mod stages;

pub use accumulator::{Accumulator, AvgFallback, SumOperand};
pub use condition::{Condition, Pattern, Predicate};
pub use expression::{DatePart, Expression, GroupKey};
pub use pipeline::Pipeline;
pub use stages::{SortKey, SortOrder, Stage};
