// DataFrame and its verbs
mod arrange;
mod base;
mod display;
mod filter;
mod group;
mod mutate;
mod reshape;
mod select;
mod summarize;

pub use arrange::{Direction, SortKey};
pub use base::DataFrame;
pub use select::Selector;
