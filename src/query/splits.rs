//! Split expressions such as `row:2; column:2; year:split`.
//!
//! `column:N` cuts the column's declared range into N equal parts;
//! `column:split` produces one part per distinct value in the data.

use crate::descriptor::model::{Bounds, Dataset};
use crate::error::{DescriptorError, Result};
use crate::validation::{Violation, ViolationKind};
use serde::{Deserialize, Serialize};
use std::fmt;

const DISTINCT_KEYWORD: &str = "split";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitRule {
    /// Equal-width parts over the declared bounds
    Parts(u32),
    /// One part per distinct value
    Distinct,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub column: String,
    pub rule: SplitRule,
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rule {
            SplitRule::Parts(n) => write!(f, "{}:{n}", self.column),
            SplitRule::Distinct => write!(f, "{}:{DISTINCT_KEYWORD}", self.column),
        }
    }
}

/// Edges of one N-way split, ready to bin data with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitEdges {
    pub column: String,
    pub edges: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Splits(Vec<Split>);

impl Splits {
    /// Parse `row:2; year:split`. Blank text means no splitting.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuery` for a piece without `:`, a part count that is
    /// not a positive integer, or a column split twice.
    pub fn parse(expr: &str) -> Result<Self> {
        let mut splits: Vec<Split> = Vec::new();

        for piece in expr.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let Some((column, rule)) = piece.split_once(':') else {
                return Err(DescriptorError::InvalidQuery(format!(
                    "split '{piece}' is not of the form 'column:N' or 'column:split'"
                )));
            };
            let (column, rule) = (column.trim(), rule.trim());
            if column.is_empty() {
                return Err(DescriptorError::InvalidQuery(format!(
                    "split '{piece}' has no column"
                )));
            }

            let rule = if rule.eq_ignore_ascii_case(DISTINCT_KEYWORD) {
                SplitRule::Distinct
            } else {
                match rule.parse::<u32>() {
                    Ok(n) if n > 0 => SplitRule::Parts(n),
                    _ => {
                        return Err(DescriptorError::InvalidQuery(format!(
                            "split '{piece}' needs a positive part count or '{DISTINCT_KEYWORD}'"
                        )));
                    }
                }
            };

            if splits.iter().any(|s| s.column == column) {
                return Err(DescriptorError::InvalidQuery(format!(
                    "column '{column}' is split more than once"
                )));
            }
            splits.push(Split {
                column: column.to_owned(),
                rule,
            });
        }

        Ok(Self(splits))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Split> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check that every split can be carried out on the descriptor's grid.
    pub fn validate(&self, dataset: &Dataset, tolerance: f64) -> Vec<Violation> {
        let mut violations = Vec::new();

        for split in &self.0 {
            let Some(column) = dataset.column(&split.column) else {
                violations.push(Violation::error(
                    ViolationKind::UnknownQueryColumn,
                    None,
                    format!("split '{split}' refers to undeclared column '{}'", split.column),
                ));
                continue;
            };
            let SplitRule::Parts(parts) = split.rule else {
                continue;
            };
            let section = Some(column.name.as_str());

            let Some(cells) = column.bounds().and_then(|b| b.cell_count(tolerance)) else {
                violations.push(Violation::error(
                    ViolationKind::SplitUnbounded,
                    section,
                    format!("split '{split}' needs consistent min, max and step on '{}'", column.name),
                ));
                continue;
            };

            if cells % u64::from(parts) != 0 {
                violations.push(Violation::error(
                    ViolationKind::SplitMisaligned,
                    section,
                    format!("{cells} cells of '{}' cannot be split into {parts} equal parts", column.name),
                ));
            }
        }

        violations
    }

    /// Edges for every N-way split whose column is bounded.
    pub fn edges(&self, dataset: &Dataset) -> Vec<SplitEdges> {
        self.0
            .iter()
            .filter_map(|split| {
                let SplitRule::Parts(parts) = split.rule else {
                    return None;
                };
                let bounds = dataset.column(&split.column)?.bounds()?;
                Some(SplitEdges {
                    column: split.column.clone(),
                    edges: split_edges(&bounds, parts),
                })
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a Splits {
    type Item = &'a Split;
    type IntoIter = std::slice::Iter<'a, Split>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for Splits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join("; "))
    }
}

/// `parts + 1` evenly spaced edges from `min` to `max + step`.
///
/// The upper edge sits one step past `max` so the last grid value falls
/// inside the final half-open bin.
pub fn split_edges(bounds: &Bounds, parts: u32) -> Vec<f64> {
    let parts = parts.max(1);
    let upper = bounds.max + bounds.step;
    let width = (upper - bounds.min) / f64::from(parts);
    (0..=parts)
        .map(|i| {
            if i == parts {
                upper
            } else {
                bounds.min + width * f64::from(i)
            }
        })
        .collect()
}
