//! Core data structures for dataset descriptors.

use crate::error::{DescriptorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Name of the metadata section.
pub const METADATA_SECTION: &str = "Description";

/// Relative tolerance used when checking that a range is a whole number of steps.
pub const DEFAULT_STEP_TOLERANCE: f64 = 1e-9;

/// A complete dataset descriptor.
///
/// Immutable once parsed: the whole record is loaded from one document and
/// dropped as a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Human-readable dataset name
    pub name: String,

    pub author: Option<String>,

    /// Free-text description of the census
    pub description: Option<String>,

    pub citation: Option<String>,

    /// Path of the CSV data file, relative to the descriptor
    pub datapath: String,

    /// Which literal data column plays which analysis role
    pub cols: ColumnMapping,

    /// Per-column schema in document order
    pub columns: Vec<ColumnSpec>,

    /// Metadata keys this crate does not interpret, kept for round trips
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl Dataset {
    /// Read and parse a descriptor file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, otherwise any error of
    /// [`crate::parse`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Reading descriptor {}", path.display());
        let text = std::fs::read_to_string(path)?;
        super::parser::parse(&text)
    }

    /// Write the descriptor back to a file in descriptor syntax.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be written.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_descriptor_string())?;
        Ok(())
    }

    /// Serialize to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns `Config` if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a dataset previously written by [`Dataset::to_json`].
    ///
    /// # Errors
    ///
    /// Returns `Config` if the JSON does not describe a dataset.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Column section with the given identifier (first one if duplicated).
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Column section bound to `role` through `cols`.
    pub fn column_for_role(&self, role: &Role) -> Option<&ColumnSpec> {
        self.cols.column(role).and_then(|name| self.column(name))
    }

    /// Location of the data file.
    ///
    /// Relative `datapath` values are resolved against the directory holding
    /// the descriptor.
    pub fn resolve_data_path(&self, descriptor_path: &Path) -> PathBuf {
        let datapath = Path::new(&self.datapath);
        if datapath.is_absolute() {
            return datapath.to_path_buf();
        }
        descriptor_path
            .parent()
            .map(|dir| dir.join(datapath))
            .unwrap_or_else(|| datapath.to_path_buf())
    }

    /// Cells along the X and Y role columns, when both are bounded and aligned.
    pub fn grid(&self, tolerance: f64) -> Option<GridShape> {
        let x = self.column_for_role(&Role::X)?.bounds()?;
        let y = self.column_for_role(&Role::Y)?.bounds()?;
        Some(GridShape {
            x_cells: x.cell_count(tolerance)?,
            y_cells: y.cell_count(tolerance)?,
        })
    }
}

/// Schema of one data column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub description: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            min: None,
            max: None,
            step: None,
            extra: BTreeMap::new(),
        }
    }

    /// Builder-style helper for tests and programmatic descriptors.
    #[must_use]
    pub fn with_bounds(mut self, min: f64, max: f64, step: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self.step = Some(step);
        self
    }

    /// Complete numeric domain, if min, max and step are all declared.
    pub fn bounds(&self) -> Option<Bounds> {
        Some(Bounds {
            min: self.min?,
            max: self.max?,
            step: self.step?,
        })
    }

    pub fn has_numeric_domain(&self) -> bool {
        self.min.is_some() || self.max.is_some() || self.step.is_some()
    }
}

/// Numeric domain `min..=max` sampled every `step`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Bounds {
    /// Number of steps between `min` and `max`, if it is whole within `tolerance`.
    pub fn steps(&self, tolerance: f64) -> Option<u64> {
        if self.step <= 0.0 || self.max < self.min {
            return None;
        }
        let n = (self.max - self.min) / self.step;
        let rounded = n.round();
        if (n - rounded).abs() > tolerance * rounded.abs().max(1.0) {
            return None;
        }
        // u64::MAX as f64 rounds up to 2^64, which itself does not fit
        if rounded >= u64::MAX as f64 {
            return None;
        }
        Some(rounded as u64)
    }

    /// Distinct grid values in the domain (`steps + 1`).
    pub fn cell_count(&self, tolerance: f64) -> Option<u64> {
        self.steps(tolerance).and_then(|n| n.checked_add(1))
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Whether `value` sits on the `min + k * step` lattice.
    pub fn on_grid(&self, value: f64, tolerance: f64) -> bool {
        if self.step <= 0.0 {
            return false;
        }
        let k = (value - self.min) / self.step;
        (k - k.round()).abs() <= tolerance * k.round().abs().max(1.0)
    }
}

/// Plot geometry derived from the X and Y role columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridShape {
    pub x_cells: u64,
    pub y_cells: u64,
}

impl GridShape {
    /// Number of cells, or `None` if it does not fit in a `u64`.
    pub fn total(&self) -> Option<u64> {
        self.x_cells.checked_mul(self.y_cells)
    }
}

impl fmt::Display for GridShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.total() {
            Some(total) => write!(f, "{} x {} ({total} cells)", self.x_cells, self.y_cells),
            None => write!(f, "{} x {} (too many cells to count)", self.x_cells, self.y_cells),
        }
    }
}

/// Analysis role a data column can play.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Species,
    Count,
    X,
    Y,
    Energy,
    Mass,
    /// Any role name the analyses do not know about
    Other(String),
}

impl Role {
    /// Key used in the `cols` mapping, e.g. `spp_col`.
    pub fn key(&self) -> &str {
        match self {
            Self::Species => "spp_col",
            Self::Count => "count_col",
            Self::X => "x_col",
            Self::Y => "y_col",
            Self::Energy => "energy_col",
            Self::Mass => "mass_col",
            Self::Other(name) => name,
        }
    }

    pub fn from_key(key: &str) -> Self {
        match key {
            "spp_col" => Self::Species,
            "count_col" => Self::Count,
            "x_col" => Self::X,
            "y_col" => Self::Y,
            "energy_col" => Self::Energy,
            "mass_col" => Self::Mass,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for Role {
    fn from(key: String) -> Self {
        Self::from_key(&key)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.key().to_owned()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One `role: column` pair from the `cols` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleBinding {
    pub role: Role,
    pub column: String,
}

/// Ordered role-to-column mapping declared by `cols`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnMapping(Vec<RoleBinding>);

impl ColumnMapping {
    /// Parse `spp_col: spp; count_col: count`.
    ///
    /// Empty pieces (such as a trailing `;`) are skipped.
    ///
    /// # Errors
    ///
    /// Returns `MalformedDescriptor` when a piece lacks `:` or a side is
    /// empty, when a role is bound twice, or when no binding is present.
    pub fn parse(value: &str) -> Result<Self> {
        let mut bindings: Vec<RoleBinding> = Vec::new();

        for piece in value.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let Some((role, column)) = piece.split_once(':') else {
                return Err(DescriptorError::malformed(format!(
                    "cols entry '{piece}' is not of the form 'role: column'"
                )));
            };
            let (role, column) = (role.trim(), column.trim());
            if role.is_empty() || column.is_empty() {
                return Err(DescriptorError::malformed(format!(
                    "cols entry '{piece}' has an empty role or column"
                )));
            }

            let role = Role::from_key(role);
            if bindings.iter().any(|b| b.role == role) {
                return Err(DescriptorError::malformed(format!(
                    "role '{role}' is mapped more than once in cols"
                )));
            }
            bindings.push(RoleBinding {
                role,
                column: column.to_owned(),
            });
        }

        if bindings.is_empty() {
            return Err(DescriptorError::malformed("cols declares no columns"));
        }
        Ok(Self(bindings))
    }

    pub fn from_bindings(bindings: Vec<RoleBinding>) -> Self {
        Self(bindings)
    }

    /// Literal column bound to `role`.
    pub fn column(&self, role: &Role) -> Option<&str> {
        self.0
            .iter()
            .find(|b| &b.role == role)
            .map(|b| b.column.as_str())
    }

    /// Role a literal column is bound to, if any.
    pub fn role_of(&self, column: &str) -> Option<&Role> {
        self.0.iter().find(|b| b.column == column).map(|b| &b.role)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RoleBinding> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value for the `cols` key in descriptor syntax.
    pub fn to_descriptor_value(&self) -> String {
        self.0
            .iter()
            .map(|b| format!("{}: {}", b.role, b.column))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl<'a> IntoIterator for &'a ColumnMapping {
    type Item = &'a RoleBinding;
    type IntoIter = std::slice::Iter<'a, RoleBinding>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
