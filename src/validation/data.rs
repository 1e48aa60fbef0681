//! Checks of a descriptor against its CSV data file.
//!
//! The file is streamed once: the header resolves column references and each
//! record's bounded fields are checked against the declared domain. Nothing
//! is kept in memory beyond per-column counters and a few example values.

use super::{Violation, ViolationKind};
use crate::config::Settings;
use crate::descriptor::model::{ColumnSpec, DEFAULT_STEP_TOLERANCE, Dataset};
use crate::error::Result;
use crate::query::Subset;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Knobs for [`check_data_file`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataCheckOptions {
    pub step_tolerance: f64,
    /// Offending values quoted per column and problem
    pub max_examples_per_column: usize,
}

impl Default for DataCheckOptions {
    fn default() -> Self {
        Self {
            step_tolerance: DEFAULT_STEP_TOLERANCE,
            max_examples_per_column: 5,
        }
    }
}

impl From<&Settings> for DataCheckOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            step_tolerance: settings.step_tolerance,
            max_examples_per_column: settings.max_examples_per_column,
        }
    }
}

/// Outcome of one pass over the data file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataReport {
    pub path: Option<PathBuf>,
    pub header: Vec<String>,
    /// Records read
    pub rows: u64,
    /// Records kept by the subset (equal to `rows` without one)
    pub rows_selected: u64,
    pub violations: Vec<Violation>,
}

/// Compare the data header with the descriptor.
///
/// Mapped columns missing from the header are errors; declared column
/// sections missing from it are warnings.
pub fn resolve_columns(dataset: &Dataset, header: &[String]) -> Vec<Violation> {
    let in_header = |name: &str| header.iter().any(|h| h == name);
    let mut violations = Vec::new();

    for binding in &dataset.cols {
        if !in_header(&binding.column) {
            violations.push(Violation::error(
                ViolationKind::UnresolvedColumnReference,
                None,
                format!(
                    "cols maps {} to '{}', which is not a column of the data file",
                    binding.role, binding.column
                ),
            ));
        }
    }

    for column in &dataset.columns {
        if dataset.cols.role_of(&column.name).is_none() && !in_header(&column.name) {
            violations.push(Violation::warning(
                ViolationKind::MissingDataColumn,
                Some(&column.name),
                format!("declared column '{}' is not in the data file", column.name),
            ));
        }
    }

    violations
}

/// Stream a CSV file and check it against the descriptor.
///
/// # Errors
///
/// Returns `Io`/`Csv` errors from reading the file, and
/// `UnresolvedColumnReference` if the subset names a column the file lacks.
pub fn check_data_file(
    dataset: &Dataset,
    path: &Path,
    subset: Option<&Subset>,
    options: &DataCheckOptions,
) -> Result<DataReport> {
    tracing::info!("Checking data file {}", path.display());
    let file = std::fs::File::open(path)?;
    let mut report = check_data_reader(dataset, file, subset, options)?;
    report.path = Some(path.to_path_buf());
    Ok(report)
}

/// [`check_data_file`] over any reader.
///
/// # Errors
///
/// See [`check_data_file`].
pub fn check_data_reader<R: Read>(
    dataset: &Dataset,
    reader: R,
    subset: Option<&Subset>,
    options: &DataCheckOptions,
) -> Result<DataReport> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let header: Vec<String> = reader.headers()?.iter().map(str::to_owned).collect();
    let mut violations = resolve_columns(dataset, &header);

    let bound = subset.map(|s| s.bind(&header)).transpose()?;
    let mut trackers: Vec<FieldTracker<'_>> = dataset
        .columns
        .iter()
        .filter(|c| c.has_numeric_domain())
        .filter_map(|c| {
            header
                .iter()
                .position(|h| *h == c.name)
                .map(|idx| FieldTracker::new(idx, c))
        })
        .collect();

    let mut rows = 0_u64;
    let mut rows_selected = 0_u64;
    for record in reader.records() {
        let record = record?;
        rows += 1;
        if let Some(bound) = &bound
            && !bound.matches(&record)
        {
            continue;
        }
        rows_selected += 1;

        for tracker in &mut trackers {
            let field = record.get(tracker.index).unwrap_or_default();
            tracker.observe(field, options);
        }
    }

    for tracker in &trackers {
        tracker.report(&mut violations);
    }

    tracing::info!(
        "Checked {rows} rows ({rows_selected} selected), {} violation(s)",
        violations.len()
    );

    Ok(DataReport {
        path: None,
        header,
        rows,
        rows_selected,
        violations,
    })
}

/// Problem counts for one bounded column.
#[derive(Debug, Default)]
struct Tally {
    count: u64,
    examples: Vec<String>,
}

impl Tally {
    fn record(&mut self, value: &str, max_examples: usize) {
        self.count += 1;
        if self.examples.len() < max_examples {
            self.examples.push(value.to_owned());
        }
    }

    fn describe(&self) -> String {
        let quoted: Vec<String> = self.examples.iter().map(|e| format!("'{e}'")).collect();
        format!("{} value(s), e.g. {}", self.count, quoted.join(", "))
    }
}

struct FieldTracker<'a> {
    index: usize,
    spec: &'a ColumnSpec,
    non_numeric: Tally,
    out_of_bounds: Tally,
    off_grid: Tally,
}

impl<'a> FieldTracker<'a> {
    fn new(index: usize, spec: &'a ColumnSpec) -> Self {
        Self {
            index,
            spec,
            non_numeric: Tally::default(),
            out_of_bounds: Tally::default(),
            off_grid: Tally::default(),
        }
    }

    /// Empty fields are treated as missing values and skipped.
    fn observe(&mut self, field: &str, options: &DataCheckOptions) {
        if field.is_empty() {
            return;
        }
        let max_examples = options.max_examples_per_column;

        let Ok(value) = field.parse::<f64>() else {
            self.non_numeric.record(field, max_examples);
            return;
        };

        let below = self.spec.min.is_some_and(|min| value < min);
        let above = self.spec.max.is_some_and(|max| value > max);
        if below || above {
            self.out_of_bounds.record(field, max_examples);
            return;
        }

        if let Some(bounds) = self.spec.bounds()
            && bounds.step > 0.0
            && !bounds.on_grid(value, options.step_tolerance)
        {
            self.off_grid.record(field, max_examples);
        }
    }

    fn report(&self, violations: &mut Vec<Violation>) {
        let name = self.spec.name.as_str();
        let section = Some(name);

        if self.non_numeric.count > 0 {
            violations.push(Violation::error(
                ViolationKind::NonNumericValue,
                section,
                format!("non-numeric data in '{name}': {}", self.non_numeric.describe()),
            ));
        }
        if self.out_of_bounds.count > 0 {
            violations.push(Violation::error(
                ViolationKind::OutOfBounds,
                section,
                format!(
                    "data outside [{}, {}] in '{name}': {}",
                    crate::utils::fmt_opt(self.spec.min),
                    crate::utils::fmt_opt(self.spec.max),
                    self.out_of_bounds.describe()
                ),
            ));
        }
        if self.off_grid.count > 0 {
            violations.push(Violation::error(
                ViolationKind::OffStepGrid,
                section,
                format!("data off the step grid in '{name}': {}", self.off_grid.describe()),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::parser::parse;

    fn dataset() -> Dataset {
        parse(
            "[Description]\nname = t\ndatapath = t.csv\ncols = spp_col: spp; count_col: count; x_col: row\n\n[year]\ndescription = Year\n\n[row]\ndescription = Row\nmin = 0\nmax = 3\nstep = 1\n\n[spp]\ndescription = Species\n\n[count]\ndescription = Count\nmin = 0\n",
        )
        .unwrap()
    }

    fn check(csv: &str, subset: Option<&Subset>) -> DataReport {
        check_data_reader(&dataset(), csv.as_bytes(), subset, &DataCheckOptions::default())
            .unwrap()
    }

    #[test]
    fn test_clean_data() {
        let report = check("year,row,spp,count\n2010,0,ARTR,4\n2010,3,ERFA,1\n", None);

        assert_eq!(report.rows, 2);
        assert_eq!(report.rows_selected, 2);
        assert!(report.violations.is_empty(), "{:?}", report.violations);
    }

    #[test]
    fn test_resolve_columns() {
        let header = vec!["row".to_owned(), "spp".to_owned()];
        let violations = resolve_columns(&dataset(), &header);

        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].kind, ViolationKind::UnresolvedColumnReference);
        assert!(violations[0].message.contains("'count'"));
        assert_eq!(violations[1].kind, ViolationKind::MissingDataColumn);
        assert!(!violations[1].is_error());
    }

    #[test]
    fn test_bad_values() {
        let report = check(
            "year,row,spp,count\n2010,7,ARTR,4\n2010,1.5,ARTR,x\n2010,,ARTR,-1\n2010,8,ARTR,2\n",
            None,
        );

        let kinds: Vec<ViolationKind> = report.violations.iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ViolationKind::OutOfBounds,
                ViolationKind::OffStepGrid,
                ViolationKind::NonNumericValue,
                ViolationKind::OutOfBounds,
            ]
        );
        assert!(report.violations[0].message.contains("2 value(s), e.g. '7', '8'"));
    }

    #[test]
    fn test_subset_restricts_rows() {
        let subset = Subset::parse("spp==ERFA").unwrap();
        let report = check(
            "year,row,spp,count\n2010,7,ARTR,4\n2010,2,ERFA,1\n",
            Some(&subset),
        );

        assert_eq!(report.rows, 2);
        assert_eq!(report.rows_selected, 1);
        assert!(report.violations.is_empty());
    }

    #[test]
    fn test_subset_column_missing_from_file() {
        let subset = Subset::parse("year==2010").unwrap();
        let err = check_data_reader(
            &dataset(),
            "row,spp,count\n1,ARTR,4\n".as_bytes(),
            Some(&subset),
            &DataCheckOptions::default(),
        )
        .unwrap_err();

        assert_eq!(err.kind(), crate::error::ErrorKind::UnresolvedColumnReference);
    }

    #[test]
    fn test_ragged_rows_fail() {
        let result = check_data_reader(
            &dataset(),
            "year,row,spp,count\n2010,1\n".as_bytes(),
            None,
            &DataCheckOptions::default(),
        );
        assert!(result.is_err());
    }
}
