use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::DataValue;

/// How an aggregate treats missing (NA) inputs.
///
/// There is no default: every aggregate over column values has to state its
/// policy before it can be evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    /// Missing inputs participate; any missing input makes the result missing
    Include,
    /// Missing inputs are dropped before the aggregate runs
    Exclude,
}

impl MissingPolicy {
    /// Builds the policy from an R-style `na_rm` flag
    pub fn from_na_rm(na_rm: bool) -> Self {
        if na_rm {
            MissingPolicy::Exclude
        } else {
            MissingPolicy::Include
        }
    }

    /// Applies the policy to a set of inputs.
    ///
    /// Returns `None` when the policy is `Include` and a missing value is
    /// present, i.e. the aggregate result is itself missing.
    pub fn apply(self, values: Vec<DataValue>) -> Option<Vec<DataValue>> {
        match self {
            MissingPolicy::Include => {
                if values.iter().any(DataValue::is_na) {
                    None
                } else {
                    Some(values)
                }
            }
            MissingPolicy::Exclude => Some(values.into_iter().filter(|v| !v.is_na()).collect()),
        }
    }
}

impl fmt::Display for MissingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingPolicy::Include => write!(f, "na_rm = false"),
            MissingPolicy::Exclude => write!(f, "na_rm = true"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn include_poisons_result() {
        let values = vec![DataValue::Int64(1), DataValue::Na];
        assert_eq!(MissingPolicy::Include.apply(values), None);
    }

    #[test]
    fn exclude_drops_missing() {
        let values = vec![DataValue::Int64(1), DataValue::Na, DataValue::Int64(3)];
        let kept = MissingPolicy::Exclude.apply(values).unwrap();
        assert_eq!(kept, vec![DataValue::Int64(1), DataValue::Int64(3)]);
    }
}
