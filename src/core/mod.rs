// Core scalar types shared by columns, expressions and the table verbs
pub mod data_value;

pub use data_value::{DataValue, GroupKey};
