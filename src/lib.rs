//! Tabular data pipelines in the tidyverse style.
//!
//! A [`DataFrame`] is an ordered set of equally long, typed, uniquely named
//! columns. Verbs such as [`DataFrame::select`], [`DataFrame::filter`],
//! [`DataFrame::mutate`], [`DataFrame::summarize`], [`DataFrame::arrange`],
//! [`DataFrame::group_by`] and [`DataFrame::gather`] each return a new table
//! and never modify their input, so they chain naturally:
//!
//! ```
//! use tidyrs::prelude::*;
//!
//! let wide = DataFrame::from_columns(vec![
//!     ("country", vec!["US", "CA", "DE"].into()),
//!     ("2010", vec![7000i64, 6500, 5000].into()),
//!     ("2015", vec![3000i64, 4500, 6000].into()),
//! ])?;
//!
//! let totals = wide
//!     .gather("year", "n", &[Selector::name("2010"), Selector::name("2015")])?
//!     .group_by(&["year"])?
//!     .summarize(&[("total", sum(col("n")).exclude_missing())])?;
//!
//! assert_eq!(totals.row_count(), 2);
//! # Ok::<(), tidyrs::Error>(())
//! ```
//!
//! Aggregates must state how they treat missing values
//! ([`MissingPolicy`]); there is no silent default.

pub mod column;
pub mod core;
pub mod dataframe;
pub mod error;
pub mod expr;
pub mod groupby;
pub mod io;
pub mod na;
pub mod pipeline;
pub mod stats;

// Re-export commonly used types
pub use column::{Column, ColumnType};
pub use crate::core::{DataValue, GroupKey};
pub use dataframe::{DataFrame, Direction, Selector, SortKey};
pub use error::{Error, Result};
pub use expr::{AggExpr, AggFunc, Expr};
pub use groupby::GroupIndex;
pub use io::{read_csv, write_csv, CsvOptions};
pub use na::MissingPolicy;
pub use pipeline::{Pipeline, PipelineSpec, RunReport, Step};

/// Everything needed to build and run pipelines from Rust
pub mod prelude {
    pub use crate::column::{Column, ColumnType};
    pub use crate::core::DataValue;
    pub use crate::dataframe::{DataFrame, Direction, Selector, SortKey};
    pub use crate::error::{Error, Result};
    pub use crate::expr::{
        coalesce, col, count, count_distinct, cumsum, first, if_else, lag, last, lead, lit, max,
        mean, median, min, min_rank, n, na, row_number, sd, sum, var, AggExpr, AggFunc, Expr,
    };
    pub use crate::io::{read_csv, write_csv, CsvOptions};
    pub use crate::na::MissingPolicy;
    pub use crate::pipeline::{Pipeline, PipelineSpec, Step};
}

// Export version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
