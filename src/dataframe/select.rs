//! Column selection and renaming

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use regex::Regex;

use super::DataFrame;
use crate::error::{Error, Result};

/// Picks columns of a table by name, position, pattern or range.
///
/// Selectors resolve against a table's column names in order. Exclusions
/// remove columns chosen by earlier selectors; a selector list that starts
/// with an exclusion starts from every column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Name(String),
    /// Zero-based column position
    Position(usize),
    StartsWith(String),
    EndsWith(String),
    Contains(String),
    /// Regular expression matched anywhere in the name
    Matches(String),
    /// Every column from the first name through the second, inclusive
    Range(String, String),
    Everything,
    Exclude(Box<Selector>),
}

impl Selector {
    pub fn name(name: impl Into<String>) -> Self {
        Selector::Name(name.into())
    }

    pub fn starts_with(prefix: impl Into<String>) -> Self {
        Selector::StartsWith(prefix.into())
    }

    pub fn ends_with(suffix: impl Into<String>) -> Self {
        Selector::EndsWith(suffix.into())
    }

    pub fn contains(part: impl Into<String>) -> Self {
        Selector::Contains(part.into())
    }

    pub fn matches(pattern: impl Into<String>) -> Self {
        Selector::Matches(pattern.into())
    }

    pub fn range(from: impl Into<String>, to: impl Into<String>) -> Self {
        Selector::Range(from.into(), to.into())
    }

    pub fn exclude(selector: impl Into<Selector>) -> Self {
        Selector::Exclude(Box::new(selector.into()))
    }

    /// Parses the textual selector syntax.
    ///
    /// `name`, `-sel` (exclusion), `#2` (position), `from:to`,
    /// `starts_with(p)`, `ends_with(s)`, `contains(s)`, `matches(re)`,
    /// `everything()`. A name that would otherwise be read as syntax can be
    /// wrapped in backticks.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::InvalidInput("empty column selector".to_string()));
        }

        if let Some(inner) = text.strip_prefix('-') {
            return Ok(Selector::Exclude(Box::new(Selector::parse(inner)?)));
        }

        if let Some(name) = text.strip_prefix('`').and_then(|t| t.strip_suffix('`')) {
            return Ok(Selector::Name(name.to_string()));
        }

        if let Some(position) = text.strip_prefix('#') {
            return position
                .trim()
                .parse::<usize>()
                .map(Selector::Position)
                .map_err(|_| Error::InvalidInput(format!("invalid column position `{}`", text)));
        }

        if let Some((func, rest)) = text.split_once('(') {
            if let Some(arg) = rest.strip_suffix(')') {
                let arg = unquote(arg.trim()).to_string();
                return match func.trim() {
                    "starts_with" => Ok(Selector::StartsWith(arg)),
                    "ends_with" => Ok(Selector::EndsWith(arg)),
                    "contains" => Ok(Selector::Contains(arg)),
                    "matches" => Ok(Selector::Matches(arg)),
                    "everything" if arg.is_empty() => Ok(Selector::Everything),
                    other => Err(Error::InvalidInput(format!(
                        "unknown selector function `{}`",
                        other
                    ))),
                };
            }
        }

        if let Some((from, to)) = text.split_once(':') {
            return Ok(Selector::Range(
                unquote(from.trim()).to_string(),
                unquote(to.trim()).to_string(),
            ));
        }

        Ok(Selector::Name(text.to_string()))
    }

    /// Column indices this selector picks, in table order
    fn matching(&self, df: &DataFrame) -> Result<Vec<usize>> {
        let names = df.column_names();
        let by_predicate = |pred: &dyn Fn(&str) -> bool| -> Vec<usize> {
            names
                .iter()
                .enumerate()
                .filter(|(_, name)| pred(name))
                .map(|(i, _)| i)
                .collect()
        };

        let indices = match self {
            Selector::Name(name) => vec![df.column_index(name)?],
            Selector::Position(index) => {
                if *index >= names.len() {
                    return Err(Error::UnknownColumn(format!("#{}", index)));
                }
                vec![*index]
            }
            Selector::StartsWith(prefix) => by_predicate(&|n: &str| n.starts_with(prefix.as_str())),
            Selector::EndsWith(suffix) => by_predicate(&|n: &str| n.ends_with(suffix.as_str())),
            Selector::Contains(part) => by_predicate(&|n: &str| n.contains(part.as_str())),
            Selector::Matches(pattern) => {
                let re = Regex::new(pattern)?;
                by_predicate(&|n: &str| re.is_match(n))
            }
            Selector::Range(from, to) => {
                let start = df.column_index(from)?;
                let end = df.column_index(to)?;
                if start <= end {
                    (start..=end).collect()
                } else {
                    (end..=start).rev().collect()
                }
            }
            Selector::Everything => (0..names.len()).collect(),
            Selector::Exclude(inner) => inner.matching(df)?,
        };
        Ok(indices)
    }
}

fn unquote(text: &str) -> &str {
    for quote in ['\'', '"', '`'] {
        if let Some(inner) = text.strip_prefix(quote).and_then(|t| t.strip_suffix(quote)) {
            return inner;
        }
    }
    text
}

impl From<&str> for Selector {
    /// A plain column name; use [`Selector::parse`] for the selector syntax
    fn from(name: &str) -> Self {
        Selector::Name(name.to_string())
    }
}

impl From<String> for Selector {
    fn from(name: String) -> Self {
        Selector::Name(name)
    }
}

impl FromStr for Selector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Selector::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Name(name) => write!(f, "{}", name),
            Selector::Position(index) => write!(f, "#{}", index),
            Selector::StartsWith(p) => write!(f, "starts_with({})", p),
            Selector::EndsWith(s) => write!(f, "ends_with({})", s),
            Selector::Contains(s) => write!(f, "contains({})", s),
            Selector::Matches(re) => write!(f, "matches({})", re),
            Selector::Range(from, to) => write!(f, "{}:{}", from, to),
            Selector::Everything => write!(f, "everything()"),
            Selector::Exclude(inner) => write!(f, "-{}", inner),
        }
    }
}

/// Resolves a selector list to column indices, in selection order
pub(crate) fn resolve_selectors(df: &DataFrame, selectors: &[Selector]) -> Result<Vec<usize>> {
    let mut selected: Vec<usize> = match selectors.first() {
        Some(Selector::Exclude(_)) => (0..df.column_count()).collect(),
        _ => Vec::new(),
    };

    for selector in selectors {
        let indices = selector.matching(df)?;
        if let Selector::Exclude(_) = selector {
            let excluded: HashSet<usize> = indices.into_iter().collect();
            selected.retain(|i| !excluded.contains(i));
        } else {
            for index in indices {
                if !selected.contains(&index) {
                    selected.push(index);
                }
            }
        }
    }

    Ok(selected)
}

impl DataFrame {
    /// Keeps the selected columns, in selection order.
    ///
    /// Row count and row order are unchanged. Grouping keys that are not
    /// selected are dropped from the grouping.
    pub fn select(&self, selectors: &[Selector]) -> Result<DataFrame> {
        let indices = resolve_selectors(self, selectors)?;
        log::debug!(
            "select: {} of {} columns",
            indices.len(),
            self.column_count()
        );
        Ok(self.take_columns(&indices))
    }

    /// Renames columns given `(old, new)` pairs; other columns keep their
    /// names and every column keeps its position
    pub fn rename<S: AsRef<str>, T: AsRef<str>>(&self, mapping: &[(S, T)]) -> Result<DataFrame> {
        let mut names = self.column_names().to_vec();
        for (old, new) in mapping {
            let index = self.column_index(old.as_ref())?;
            names[index] = new.as_ref().to_string();
        }
        log::debug!("rename: {} columns", mapping.len());
        self.with_names(names)
    }
}
