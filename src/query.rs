//! Query expressions applied to descriptor-backed data.
//!
//! Analyses select rows with a subset (`year==2010; row>=1`) and cut the
//! plot into sub-plots with splits (`row:2; column:2`). Both are checked
//! against the descriptor before any data is read.

pub mod splits;
pub mod subset;

pub use splits::{Split, SplitEdges, SplitRule, Splits, split_edges};
pub use subset::{BoundSubset, Condition, Op, Subset, Value};
