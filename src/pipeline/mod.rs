//! Declarative pipelines.
//!
//! A [`PipelineSpec`] lists verbs to apply in order. Specs are plain data
//! (serde) and load from JSON, YAML or TOML:
//!
//! ```yaml
//! name: recent-cases
//! steps:
//!   - op: gather
//!     key: year
//!     value: n
//!     columns: ["2010", "2015"]
//!   - op: group_by
//!     columns: [country]
//!   - op: summarize
//!     columns:
//!       - name: total
//!         expr: sum(n, na_rm = TRUE)
//! ```
//!
//! [`Pipeline::run`] applies the steps to a table and returns the result
//! with a [`RunReport`].

pub mod executor;
pub mod spec;

pub use executor::{run_pipeline, Pipeline, RunReport};
pub use spec::{Definition, PipelineSpec, Step, SPEC_VERSION};
