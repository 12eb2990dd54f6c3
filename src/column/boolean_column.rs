use crate::column::common::BitMask;
use crate::error::{Error, Result};

/// Column of booleans, stored packed in a [`BitMask`]
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanColumn {
    pub(crate) data: BitMask,
    pub(crate) null_mask: Option<BitMask>,
}

impl BooleanColumn {
    pub fn new(data: Vec<bool>) -> Self {
        Self {
            data: BitMask::from_bools(&data),
            null_mask: None,
        }
    }

    pub fn with_nulls(data: Vec<bool>, nulls: Vec<bool>) -> Result<Self> {
        if data.len() != nulls.len() {
            return Err(Error::InconsistentRowCount {
                expected: data.len(),
                found: nulls.len(),
            });
        }
        Ok(Self {
            data: BitMask::from_bools(&data),
            null_mask: BitMask::from_bools_sparse(&nulls),
        })
    }

    pub fn from_options(values: Vec<Option<bool>>) -> Self {
        let nulls: Vec<bool> = values.iter().map(Option::is_none).collect();
        let data: Vec<bool> = values.into_iter().map(|v| v.unwrap_or(false)).collect();
        Self {
            data: BitMask::from_bools(&data),
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

    pub(crate) fn value(&self, index: usize) -> Option<bool> {
        if self.is_null(index) {
            None
        } else {
            Some(self.data.bit(index))
        }
    }

    pub fn get(&self, index: usize) -> Result<Option<bool>> {
        if index >= self.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                size: self.len(),
            });
        }
        Ok(self.value(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<bool>> + '_ {
        (0..self.len()).map(move |i| self.value(i))
    }

    pub fn take(&self, indices: &[usize]) -> Self {
        Self {
            data: self.data.take(indices),
            null_mask: self
                .null_mask
                .as_ref()
                .map(|m| m.take(indices))
                .filter(|m| m.count_ones() > 0),
        }
    }
}
