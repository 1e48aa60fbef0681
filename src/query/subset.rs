//! Row filters such as `year==2010; row>=1`.

use crate::descriptor::model::Dataset;
use crate::error::{DescriptorError, Result};
use crate::validation::{Violation, ViolationKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison operator. Longer spellings are matched first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

const OPERATORS: [(&str, Op); 7] = [
    ("==", Op::Eq),
    ("!=", Op::Ne),
    (">=", Op::Ge),
    ("<=", Op::Le),
    (">", Op::Gt),
    ("<", Op::Lt),
    ("=", Op::Eq),
];

impl Op {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    pub fn is_ordering(self) -> bool {
        matches!(self, Self::Lt | Self::Le | Self::Gt | Self::Ge)
    }

    fn holds(self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::{Equal, Greater, Less};
        match self {
            Self::Eq => ordering == Equal,
            Self::Ne => ordering != Equal,
            Self::Lt => ordering == Less,
            Self::Le => ordering != Greater,
            Self::Gt => ordering == Greater,
            Self::Ge => ordering != Less,
        }
    }
}

/// Right-hand side of a condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    fn parse(raw: &str) -> Self {
        for quote in ['"', '\''] {
            if let Some(inner) = raw.strip_prefix(quote).and_then(|r| r.strip_suffix(quote)) {
                return Self::Text(inner.to_owned());
            }
        }
        match raw.parse::<f64>() {
            Ok(n) if n.is_finite() => Self::Number(n),
            _ => Self::Text(raw.to_owned()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "'{s}'"),
        }
    }
}

/// `column OP value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub column: String,
    pub op: Op,
    pub value: Value,
}

impl Condition {
    fn parse(text: &str) -> Result<Self> {
        let Some((pos, symbol, op)) = find_operator(text) else {
            return Err(DescriptorError::InvalidQuery(format!(
                "condition '{text}' has no comparison operator"
            )));
        };

        let column = text.get(..pos).unwrap_or_default().trim();
        let raw_value = text.get(pos + symbol.len()..).unwrap_or_default().trim();
        if column.is_empty() || raw_value.is_empty() {
            return Err(DescriptorError::InvalidQuery(format!(
                "condition '{text}' needs a column and a value"
            )));
        }

        Ok(Self {
            column: column.to_owned(),
            op,
            value: Value::parse(raw_value),
        })
    }

    /// Evaluate against one data field.
    ///
    /// Numeric conditions on a non-numeric field only hold for `!=`.
    pub fn matches(&self, field: &str) -> bool {
        let field = field.trim();
        match &self.value {
            Value::Number(threshold) => match field.parse::<f64>() {
                Ok(v) => v
                    .partial_cmp(threshold)
                    .is_some_and(|ordering| self.op.holds(ordering)),
                Err(_) => self.op == Op::Ne,
            },
            Value::Text(text) => self.op.holds(field.cmp(text.as_str())),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.column, self.op.symbol(), self.value)
    }
}

/// Earliest operator in `text`, preferring two-character spellings.
fn find_operator(text: &str) -> Option<(usize, &'static str, Op)> {
    text.char_indices().find_map(|(pos, _)| {
        let rest = text.get(pos..)?;
        OPERATORS
            .iter()
            .find(|(symbol, _)| rest.starts_with(symbol))
            .map(|&(symbol, op)| (pos, symbol, op))
    })
}

/// A conjunction of conditions, separated by `;` in text form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subset {
    conditions: Vec<Condition>,
}

impl Subset {
    /// Parse `year==2010; row>=1`. Blank text selects every row.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuery` for a condition without an operator, column
    /// or value.
    pub fn parse(expr: &str) -> Result<Self> {
        let conditions = expr
            .split(';')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(Condition::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { conditions })
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Check the conditions against the descriptor's columns and bounds.
    pub fn validate(&self, dataset: &Dataset) -> Vec<Violation> {
        let mut violations = Vec::new();

        for condition in &self.conditions {
            let Some(column) = dataset.column(&condition.column) else {
                violations.push(Violation::error(
                    ViolationKind::UnknownQueryColumn,
                    None,
                    format!("subset '{condition}' refers to undeclared column '{}'", condition.column),
                ));
                continue;
            };
            let section = Some(column.name.as_str());

            match &condition.value {
                Value::Text(_) if condition.op.is_ordering() => {
                    violations.push(Violation::error(
                        ViolationKind::QueryValueType,
                        section,
                        format!("subset '{condition}' compares against a non-numeric value"),
                    ));
                }
                Value::Number(threshold) => {
                    let effect = if selects_nothing(condition.op, *threshold, column.min, column.max) {
                        Some("lies outside the declared range and selects no rows")
                    } else if selects_everything(condition.op, *threshold, column.min, column.max) {
                        Some("covers the whole declared range and selects every row")
                    } else {
                        None
                    };
                    if let Some(effect) = effect {
                        violations.push(Violation::warning(
                            ViolationKind::QueryOutOfRange,
                            section,
                            format!("subset '{condition}' {effect}"),
                        ));
                    }
                }
                Value::Text(_) => {}
            }
        }

        violations
    }

    /// Resolve column positions against a data file header.
    ///
    /// # Errors
    ///
    /// Returns `UnresolvedColumnReference` if a condition names a column the
    /// header lacks.
    pub fn bind<'a>(&'a self, header: &[String]) -> Result<BoundSubset<'a>> {
        let conditions = self
            .conditions
            .iter()
            .map(|condition| {
                header
                    .iter()
                    .position(|h| *h == condition.column)
                    .map(|idx| (idx, condition))
                    .ok_or_else(|| DescriptorError::UnresolvedColumnReference {
                        role: None,
                        column: condition.column.clone(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(BoundSubset { conditions })
    }
}

impl fmt::Display for Subset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.conditions.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join("; "))
    }
}

fn selects_nothing(op: Op, threshold: f64, min: Option<f64>, max: Option<f64>) -> bool {
    let below_min = min.is_some_and(|min| threshold < min);
    let above_max = max.is_some_and(|max| threshold > max);
    match op {
        Op::Eq => below_min || above_max,
        Op::Gt => above_max || max.is_some_and(|max| threshold >= max),
        Op::Ge => above_max,
        Op::Lt => below_min || min.is_some_and(|min| threshold <= min),
        Op::Le => below_min,
        Op::Ne => false,
    }
}

fn selects_everything(op: Op, threshold: f64, min: Option<f64>, max: Option<f64>) -> bool {
    let below_min = min.is_some_and(|min| threshold < min);
    let above_max = max.is_some_and(|max| threshold > max);
    match op {
        Op::Ne => below_min || above_max,
        Op::Gt => below_min,
        Op::Ge => min.is_some_and(|min| threshold <= min),
        Op::Lt => above_max,
        Op::Le => max.is_some_and(|max| threshold >= max),
        Op::Eq => false,
    }
}

/// A [`Subset`] whose conditions know their field positions.
#[derive(Debug)]
pub struct BoundSubset<'a> {
    conditions: Vec<(usize, &'a Condition)>,
}

impl BoundSubset<'_> {
    pub fn matches(&self, record: &csv::StringRecord) -> bool {
        self.conditions
            .iter()
            .all(|(idx, condition)| condition.matches(record.get(*idx).unwrap_or_default()))
    }
}
