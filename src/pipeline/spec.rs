//! Pipeline specification data structures.
//!
//! A pipeline spec is a named, versioned list of steps. Expressions, column
//! selectors and sort keys are stored as text and parsed when the spec is
//! validated or run, so specs stay readable in JSON, YAML and TOML.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::DataValue;
use crate::dataframe::{DataFrame, Selector, SortKey};
use crate::error::{Error, Result};
use crate::expr::{AggExpr, Expr};

/// Current pipeline spec version
pub const SPEC_VERSION: &str = "0.1";

fn default_version() -> String {
    SPEC_VERSION.to_owned()
}

/// Root pipeline specification structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSpec {
    /// Specification version for future migrations
    #[serde(default = "default_version")]
    pub version: String,

    /// Human-readable pipeline name
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Ordered sequence of steps
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl PipelineSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: SPEC_VERSION.to_owned(),
            name: name.into(),
            description: None,
            steps: Vec::new(),
        }
    }

    /// Appends a step
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Loads a spec, choosing the format from the file extension
    /// (`.json`, `.yaml`/`.yml` or `.toml`)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => Self::from_json(&content),
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            Some("toml") => Self::from_toml(&content),
            _ => Err(Error::UnsupportedFormat(format!(
                "cannot infer pipeline format from `{}`",
                path.display()
            ))),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Parses every expression, selector and sort key without running anything
    pub fn validate(&self) -> Result<()> {
        for (index, step) in self.steps.iter().enumerate() {
            step.validate().map_err(|e| {
                log::error!(
                    "pipeline `{}` step {} ({}) is invalid: {}",
                    self.name,
                    index + 1,
                    step,
                    e
                );
                e
            })?;
        }
        Ok(())
    }
}

/// A named expression, `name = expr`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    pub name: String,
    pub expr: String,
}

impl Definition {
    pub fn new(name: impl Into<String>, expr: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expr: expr.into(),
        }
    }
}

/// Transformation step (tagged enum)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Keep columns matching the selectors
    Select { columns: Vec<String> },

    /// Rename columns, old name to new name
    Rename { mapping: BTreeMap<String, String> },

    /// Keep rows where the predicate is true
    Filter { predicate: String },

    /// Add or replace columns, in order
    Mutate { columns: Vec<Definition> },

    /// Reduce each group to one row
    #[serde(alias = "summarise")]
    Summarize { columns: Vec<Definition> },

    /// Sort rows; `-x` or `desc(x)` sorts descending
    Arrange { by: Vec<String> },

    GroupBy { columns: Vec<String> },

    Ungroup,

    /// Collapse columns into key/value pairs
    Gather {
        key: String,
        value: String,
        columns: Vec<String>,
    },

    /// Spread a key/value pair across columns
    Spread {
        key: String,
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fill: Option<DataValue>,
    },

    /// Drop duplicate rows, comparing the selected columns (all when empty)
    Distinct {
        #[serde(default)]
        columns: Vec<String>,
    },

    /// Keep `length` rows starting at `offset`
    #[serde(alias = "head")]
    Slice {
        #[serde(default)]
        offset: usize,
        length: usize,
    },

    /// Row counts per combination of columns
    Count {
        #[serde(default)]
        columns: Vec<String>,
    },
}

fn selectors(columns: &[String]) -> Result<Vec<Selector>> {
    columns.iter().map(|c| Selector::parse(c)).collect()
}

fn sort_keys(by: &[String]) -> Result<Vec<SortKey>> {
    by.iter().map(|k| k.parse()).collect()
}

fn expressions(columns: &[Definition]) -> Result<Vec<(String, Expr)>> {
    columns
        .iter()
        .map(|d| Ok((d.name.clone(), Expr::parse(&d.expr)?)))
        .collect()
}

fn aggregates(columns: &[Definition]) -> Result<Vec<(String, AggExpr)>> {
    columns
        .iter()
        .map(|d| Ok((d.name.clone(), AggExpr::parse(&d.expr)?)))
        .collect()
}

impl Step {
    /// The step's `op` tag
    pub fn name(&self) -> &'static str {
        match self {
            Step::Select { .. } => "select",
            Step::Rename { .. } => "rename",
            Step::Filter { .. } => "filter",
            Step::Mutate { .. } => "mutate",
            Step::Summarize { .. } => "summarize",
            Step::Arrange { .. } => "arrange",
            Step::GroupBy { .. } => "group_by",
            Step::Ungroup => "ungroup",
            Step::Gather { .. } => "gather",
            Step::Spread { .. } => "spread",
            Step::Distinct { .. } => "distinct",
            Step::Slice { .. } => "slice",
            Step::Count { .. } => "count",
        }
    }

    /// Parses the step's textual arguments
    pub fn validate(&self) -> Result<()> {
        match self {
            Step::Select { columns } | Step::Distinct { columns } => {
                selectors(columns)?;
            }
            Step::Gather { columns, .. } => {
                selectors(columns)?;
            }
            Step::Filter { predicate } => {
                Expr::parse(predicate)?;
            }
            Step::Mutate { columns } => {
                expressions(columns)?;
            }
            Step::Summarize { columns } => {
                aggregates(columns)?;
            }
            Step::Arrange { by } => {
                sort_keys(by)?;
            }
            Step::Rename { .. }
            | Step::GroupBy { .. }
            | Step::Ungroup
            | Step::Spread { .. }
            | Step::Slice { .. }
            | Step::Count { .. } => {}
        }
        Ok(())
    }

    /// Applies the step to a table
    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        match self {
            Step::Select { columns } => df.select(&selectors(columns)?),
            Step::Rename { mapping } => {
                let pairs: Vec<(&String, &String)> = mapping.iter().collect();
                df.rename(&pairs)
            }
            Step::Filter { predicate } => df.filter(&Expr::parse(predicate)?),
            Step::Mutate { columns } => df.mutate(&expressions(columns)?),
            Step::Summarize { columns } => df.summarize(&aggregates(columns)?),
            Step::Arrange { by } => df.arrange(&sort_keys(by)?),
            Step::GroupBy { columns } => df.group_by(columns),
            Step::Ungroup => Ok(df.ungroup()),
            Step::Gather {
                key,
                value,
                columns,
            } => df.gather(key, value, &selectors(columns)?),
            Step::Spread { key, value, fill } => df.spread(key, value, fill.clone()),
            Step::Distinct { columns } => df.distinct(&selectors(columns)?),
            Step::Slice { offset, length } => Ok(df.slice(*offset, *length)),
            Step::Count { columns } => df.count(columns),
        }
    }
}

fn join_definitions(columns: &[Definition]) -> String {
    columns
        .iter()
        .map(|d| format!("{} = {}", d.name, d.expr))
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Select { columns }
            | Step::GroupBy { columns }
            | Step::Distinct { columns }
            | Step::Count { columns } => write!(f, "{}({})", self.name(), columns.join(", ")),
            Step::Rename { mapping } => {
                let pairs: Vec<String> = mapping
                    .iter()
                    .map(|(old, new)| format!("{} = {}", new, old))
                    .collect();
                write!(f, "rename({})", pairs.join(", "))
            }
            Step::Filter { predicate } => write!(f, "filter({})", predicate),
            Step::Mutate { columns } | Step::Summarize { columns } => {
                write!(f, "{}({})", self.name(), join_definitions(columns))
            }
            Step::Arrange { by } => write!(f, "arrange({})", by.join(", ")),
            Step::Ungroup => write!(f, "ungroup()"),
            Step::Gather {
                key,
                value,
                columns,
            } => write!(f, "gather({}, {}, {})", key, value, columns.join(", ")),
            Step::Spread { key, value, fill } => match fill {
                Some(fill) => write!(f, "spread({}, {}, fill = {})", key, value, fill),
                None => write!(f, "spread({}, {})", key, value),
            },
            Step::Slice { offset, length } => write!(f, "slice({}, {})", offset, length),
        }
    }
}
