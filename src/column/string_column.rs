use std::sync::Arc;

use crate::column::common::BitMask;
use crate::error::{Error, Result};

/// Column of UTF-8 strings
#[derive(Debug, Clone, PartialEq)]
pub struct StringColumn {
    pub(crate) data: Arc<[String]>,
    pub(crate) null_mask: Option<BitMask>,
}

impl StringColumn {
    pub fn new(data: Vec<String>) -> Self {
        Self {
            data: data.into(),
            null_mask: None,
        }
    }

    pub fn with_nulls(data: Vec<String>, nulls: Vec<bool>) -> Result<Self> {
        if data.len() != nulls.len() {
            return Err(Error::InconsistentRowCount {
                expected: data.len(),
                found: nulls.len(),
            });
        }
        Ok(Self {
            data: data.into(),
            null_mask: BitMask::from_bools_sparse(&nulls),
        })
    }

    pub fn from_options(values: Vec<Option<String>>) -> Self {
        let nulls: Vec<bool> = values.iter().map(Option::is_none).collect();
        let data: Vec<String> = values.into_iter().map(Option::unwrap_or_default).collect();
        Self {
            data: data.into(),
            null_mask: BitMask::from_bools_sparse(&nulls),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_null(&self, index: usize) -> bool {
        self.null_mask.as_ref().is_some_and(|m| m.bit(index))
    }

    pub fn null_count(&self) -> usize {
        self.null_mask.as_ref().map_or(0, BitMask::count_ones)
    }

    pub(crate) fn value(&self, index: usize) -> Option<&str> {
        if self.is_null(index) {
            None
        } else {
            Some(&self.data[index])
        }
    }

    pub fn get(&self, index: usize) -> Result<Option<&str>> {
        if index >= self.data.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                size: self.data.len(),
            });
        }
        Ok(self.value(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        (0..self.len()).map(move |i| self.value(i))
    }

    pub fn take(&self, indices: &[usize]) -> Self {
        let data: Vec<String> = indices.iter().map(|&i| self.data[i].clone()).collect();
        Self {
            data: data.into(),
            null_mask: self
                .null_mask
                .as_ref()
                .map(|m| m.take(indices))
                .filter(|m| m.count_ones() > 0),
        }
    }
}

impl From<Vec<&str>> for StringColumn {
    fn from(values: Vec<&str>) -> Self {
        Self::new(values.into_iter().map(str::to_string).collect())
    }
}
