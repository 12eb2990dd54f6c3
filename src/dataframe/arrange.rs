//! Row ordering

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::DataFrame;
use crate::core::DataValue;
use crate::error::{Error, Result};

/// Sort direction of one key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// One sort key: a column and its direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub direction: Direction,
}

impl SortKey {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Ascending,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Descending,
        }
    }
}

impl FromStr for SortKey {
    type Err = Error;

    /// `x` sorts ascending; `-x` and `desc(x)` sort descending
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let key = if let Some(column) = s.strip_prefix('-') {
            SortKey::desc(column.trim())
        } else if let Some(column) = s.strip_prefix("desc(").and_then(|c| c.strip_suffix(')')) {
            SortKey::desc(column.trim())
        } else {
            SortKey::asc(s)
        };

        let column = key.column.trim_matches('`');
        if column.is_empty() {
            return Err(Error::InvalidInput(format!("invalid sort key `{}`", s)));
        }
        Ok(SortKey {
            column: column.to_string(),
            direction: key.direction,
        })
    }
}

impl From<&str> for SortKey {
    fn from(column: &str) -> Self {
        SortKey::asc(column)
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Direction::Ascending => write!(f, "{}", self.column),
            Direction::Descending => write!(f, "desc({})", self.column),
        }
    }
}

/// Orders two values with missing values last regardless of direction
fn compare_values(a: &DataValue, b: &DataValue, direction: Direction) -> Ordering {
    match (a.is_na(), b.is_na()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ordering = a.total_cmp(b);
            match direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            }
        }
    }
}

impl DataFrame {
    /// Reorders rows by the keys, earlier keys taking precedence.
    ///
    /// The sort is stable: rows equal on every key keep their input order.
    /// Grouping is ignored for ordering and kept on the result.
    pub fn arrange(&self, keys: &[SortKey]) -> Result<DataFrame> {
        let columns = keys
            .iter()
            .map(|key| self.column(&key.column).map(|c| (c.values(), key.direction)))
            .collect::<Result<Vec<_>>>()?;

        let mut order: Vec<usize> = (0..self.row_count()).collect();
        order.sort_by(|&a, &b| {
            columns
                .iter()
                .map(|(values, direction)| compare_values(&values[a], &values[b], *direction))
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });

        log::debug!(
            "arrange by {}",
            keys.iter().map(|k| k.to_string()).collect::<Vec<_>>().join(", ")
        );
        Ok(self.take_rows(&order))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sort_keys() {
        assert_eq!("n".parse::<SortKey>().unwrap(), SortKey::asc("n"));
        assert_eq!("-n".parse::<SortKey>().unwrap(), SortKey::desc("n"));
        assert_eq!("desc(`2010`)".parse::<SortKey>().unwrap(), SortKey::desc("2010"));
        assert!("-".parse::<SortKey>().is_err());
    }

    #[test]
    fn missing_last_in_both_directions() {
        let na = DataValue::Na;
        let one = DataValue::Int64(1);
        assert_eq!(compare_values(&na, &one, Direction::Ascending), Ordering::Greater);
        assert_eq!(compare_values(&na, &one, Direction::Descending), Ordering::Greater);
    }
}
