//! # pipette
//!
//! Run MongoDB-style aggregation pipelines over in-memory JSON documents.
//!
//! A [`Pipeline`] is an ordered list of typed [`Stage`]s. It can be built
//! directly or parsed from the usual stage literals:
//!
//! ```
//! use pipette::{Pipeline, Value, execute, convert::json_to_document};
//! use serde_json::json;
//!
//! let users: Vec<_> = [json!({"gender": "male"}), json!({"gender": "female"}), json!({"gender": "male"})]
//!     .into_iter()
//!     .filter_map(json_to_document)
//!     .collect();
//!
//! let pipeline = Pipeline::parse(r#"[
//!     {"$group": {"_id": "$gender", "genderCount": {"$sum": 1}}},
//!     {"$sort": {"genderCount": -1}}
//! ]"#)?;
//!
//! let result = execute(&users, &pipeline)?;
//! assert_eq!(result[0].get("_id"), Some(&Value::from("male")));
//! assert_eq!(result[0].get("genderCount"), Some(&Value::Integer(2)));
//! # Ok::<(), pipette::PipelineError>(())
//! ```

pub mod convert;
pub mod document;
pub mod error;
pub mod executor;
pub mod output;
pub mod parser;
pub mod path;
pub mod stage;
pub mod value;

#[cfg(feature = "cli")]
pub mod cli;

pub use document::Document;
pub use error::PipelineError;
pub use executor::execute;
pub use output::{document_to_json, to_json, to_json_pretty};
pub use path::FieldPath;
pub use stage::{Accumulator, AvgFallback, Pipeline, Stage};
pub use value::Value;
