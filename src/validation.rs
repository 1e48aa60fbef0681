//! Descriptor invariant checks.
//!
//! Validation never fails: it returns every violation it finds so callers
//! can decide how strict to be. Checks against the data file itself live in
//! [`data`].

pub mod data;

use crate::config::Settings;
use crate::descriptor::model::{ColumnSpec, DEFAULT_STEP_TOLERANCE, Dataset, Role};
use crate::error::ErrorKind;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How much a violation matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// What was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Two column sections share one identifier
    DuplicateColumn,
    /// `min` is greater than `max`
    BoundsOrder,
    /// `step` is zero or negative
    NonPositiveStep,
    /// `max - min` is not a whole number of steps
    StepMisaligned,
    /// A mapped column has no section, or is absent from the data file
    UnresolvedColumnReference,
    /// An X/Y role column has no complete numeric domain
    UnboundedGridAxis,
    /// A declared column is absent from the data file
    MissingDataColumn,
    NonNumericValue,
    OutOfBounds,
    OffStepGrid,
    /// A subset or split names an undeclared column
    UnknownQueryColumn,
    /// Ordering comparison against a text value
    QueryValueType,
    /// A subset threshold selects no rows or every row of the declared range
    QueryOutOfRange,
    /// An N-way split on a column without bounds
    SplitUnbounded,
    /// An N-way split that does not divide the column's cells evenly
    SplitMisaligned,
}

impl ViolationKind {
    /// Where this kind sits in the crate's error taxonomy.
    pub fn error_kind(self) -> ErrorKind {
        match self {
            Self::DuplicateColumn => ErrorKind::MalformedDescriptor,
            Self::BoundsOrder
            | Self::NonPositiveStep
            | Self::StepMisaligned
            | Self::UnboundedGridAxis
            | Self::NonNumericValue
            | Self::OutOfBounds
            | Self::OffStepGrid => ErrorKind::InvalidFieldValue,
            Self::UnresolvedColumnReference | Self::MissingDataColumn => {
                ErrorKind::UnresolvedColumnReference
            }
            Self::UnknownQueryColumn
            | Self::QueryValueType
            | Self::QueryOutOfRange
            | Self::SplitUnbounded
            | Self::SplitMisaligned => ErrorKind::InvalidQuery,
        }
    }
}

/// One failed check, with the section it concerns when there is one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub severity: Severity,
    pub section: Option<String>,
    pub message: String,
}

impl Violation {
    pub fn error(
        kind: ViolationKind,
        section: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            section: section.map(str::to_owned),
            message: message.into(),
        }
    }

    pub fn warning(
        kind: ViolationKind,
        section: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity: Severity::Warning,
            section: section.map(str::to_owned),
            message: message.into(),
        }
    }

    pub fn error_kind(&self) -> ErrorKind {
        self.kind.error_kind()
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        if let Some(section) = &self.section {
            write!(f, "{level} [{section}]: {}", self.message)
        } else {
            write!(f, "{level}: {}", self.message)
        }
    }
}

/// Knobs for [`validate_with`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidateOptions {
    /// Accept `cols` entries that have no column section
    pub allow_free_form_columns: bool,
    /// Relative tolerance for the whole-number-of-steps check
    pub step_tolerance: f64,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            allow_free_form_columns: false,
            step_tolerance: DEFAULT_STEP_TOLERANCE,
        }
    }
}

impl From<&Settings> for ValidateOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            allow_free_form_columns: settings.allow_free_form_columns,
            step_tolerance: settings.step_tolerance,
        }
    }
}

/// Validate a descriptor with default options.
pub fn validate(dataset: &Dataset) -> Vec<Violation> {
    validate_with(dataset, &ValidateOptions::default())
}

/// Validate a descriptor.
pub fn validate_with(dataset: &Dataset, options: &ValidateOptions) -> Vec<Violation> {
    let mut violations = Vec::new();

    validate_unique_columns(dataset, &mut violations);

    for column in &dataset.columns {
        validate_bounds(column, options.step_tolerance, &mut violations);
    }

    validate_mapping(dataset, options, &mut violations);
    validate_grid_axes(dataset, &mut violations);

    tracing::debug!(
        "Validated '{}': {} violation(s)",
        dataset.name,
        violations.len()
    );
    violations
}

/// True if any violation is an error, or any violation at all when `strict`.
pub fn is_failure(violations: &[Violation], strict: bool) -> bool {
    if strict {
        !violations.is_empty()
    } else {
        violations.iter().any(Violation::is_error)
    }
}

/// `(errors, warnings)`
pub fn count_by_severity(violations: &[Violation]) -> (usize, usize) {
    let errors = violations.iter().filter(|v| v.is_error()).count();
    (errors, violations.len() - errors)
}

fn validate_unique_columns(dataset: &Dataset, violations: &mut Vec<Violation>) {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();

    for column in &dataset.columns {
        let name = column.name.as_str();
        if !seen.insert(name) && reported.insert(name) {
            violations.push(Violation::error(
                ViolationKind::DuplicateColumn,
                Some(name),
                format!("column '{name}' is declared more than once"),
            ));
        }
    }
}

/// Ordering, step sign, then divisibility; a field that already failed is
/// not checked again.
fn validate_bounds(column: &ColumnSpec, tolerance: f64, violations: &mut Vec<Violation>) {
    let section = Some(column.name.as_str());
    let mut consistent = true;

    if let (Some(min), Some(max)) = (column.min, column.max)
        && min > max
    {
        violations.push(Violation::error(
            ViolationKind::BoundsOrder,
            section,
            format!("min ({min}) is greater than max ({max})"),
        ));
        consistent = false;
    }

    if let Some(step) = column.step
        && step <= 0.0
    {
        violations.push(Violation::error(
            ViolationKind::NonPositiveStep,
            section,
            format!("step ({step}) must be greater than zero"),
        ));
        consistent = false;
    }

    if consistent
        && let Some(bounds) = column.bounds()
        && bounds.steps(tolerance).is_none()
    {
        violations.push(Violation::error(
            ViolationKind::StepMisaligned,
            section,
            format!(
                "range {}..{} is not a whole number of steps of {}",
                bounds.min, bounds.max, bounds.step
            ),
        ));
    }
}

fn validate_mapping(dataset: &Dataset, options: &ValidateOptions, violations: &mut Vec<Violation>) {
    if options.allow_free_form_columns {
        return;
    }

    for binding in &dataset.cols {
        if dataset.column(&binding.column).is_none() {
            violations.push(Violation::error(
                ViolationKind::UnresolvedColumnReference,
                None,
                format!(
                    "cols maps {} to '{}', which has no [{}] section",
                    binding.role, binding.column, binding.column
                ),
            ));
        }
    }
}

fn validate_grid_axes(dataset: &Dataset, violations: &mut Vec<Violation>) {
    for role in [Role::X, Role::Y] {
        if let Some(column) = dataset.column_for_role(&role)
            && column.bounds().is_none()
        {
            violations.push(Violation::warning(
                ViolationKind::UnboundedGridAxis,
                Some(&column.name),
                format!("{role} column '{}' should declare min, max and step", column.name),
            ));
        }
    }
}
