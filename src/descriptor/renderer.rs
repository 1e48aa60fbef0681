//! Markdown rendering for dataset descriptors.
//!
//! Generates a human-readable data dictionary from a parsed descriptor.

use super::model::{ColumnSpec, Dataset};
use crate::utils::fmt_opt;

/// Render a descriptor as Markdown documentation.
///
/// Generates a document including:
/// - Dataset overview and citation
/// - Column role mapping
/// - Column catalog with numeric domains
/// - Plot grid summary when X and Y roles are bounded and aligned within
///   `step_tolerance`
pub fn render_markdown(dataset: &Dataset, step_tolerance: f64) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Dataset: {}\n\n", dataset.name));
    if let Some(author) = &dataset.author {
        md.push_str(&format!("> **Author:** {author}  \n"));
    }
    md.push_str(&format!("> **Data File:** `{}`  \n\n", dataset.datapath));

    md.push_str("## Overview\n\n");
    render_overview(&mut md, dataset);

    md.push_str("## Column Roles\n\n");
    md.push_str("| Role | Column | Declared |\n");
    md.push_str("|------|--------|----------|\n");
    for binding in &dataset.cols {
        let declared = if dataset.column(&binding.column).is_some() {
            "yes"
        } else {
            "no"
        };
        md.push_str(&format!(
            "| `{}` | `{}` | {declared} |\n",
            binding.role, binding.column
        ));
    }
    md.push('\n');

    md.push_str("## Column Catalog\n\n");
    md.push_str(&format!("**Total Columns:** {}  \n\n", dataset.columns.len()));
    md.push_str("| Column | Role | Description | Min | Max | Step |\n");
    md.push_str("|--------|------|-------------|-----|-----|------|\n");
    for column in &dataset.columns {
        render_column_row(&mut md, dataset, column);
    }
    md.push('\n');

    if let Some(grid) = dataset.grid(step_tolerance) {
        md.push_str("## Plot Grid\n\n");
        md.push_str(&format!("**Cells:** {grid}\n"));
    }

    md
}

fn render_overview(md: &mut String, dataset: &Dataset) {
    if let Some(desc) = &dataset.description {
        md.push_str(&format!("{desc}\n\n"));
    } else {
        md.push_str("*No dataset description provided.*\n\n");
    }

    if let Some(citation) = &dataset.citation {
        md.push_str(&format!("**Citation:** {citation}\n\n"));
    }

    for (key, value) in &dataset.extra {
        md.push_str(&format!("**{key}:** {value}\n\n"));
    }
}

fn render_column_row(md: &mut String, dataset: &Dataset, column: &ColumnSpec) {
    let role = dataset
        .cols
        .iter()
        .find(|b| b.column == column.name)
        .map(|b| format!("`{}`", b.role))
        .unwrap_or_default();

    md.push_str(&format!(
        "| `{}` | {role} | {} | {} | {} | {} |\n",
        column.name,
        table_cell(&column.description),
        fmt_opt(column.min),
        fmt_opt(column.max),
        fmt_opt(column.step),
    ));
}

/// Flatten a value so it fits in one table cell.
fn table_cell(text: &str) -> String {
    text.replace('\n', " ").replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::model::DEFAULT_STEP_TOLERANCE;
    use crate::descriptor::parser::parse;

    const GRID: &str = "[Description]\nname = Grid\ndatapath = g.csv\ncols = x_col: row; y_col: column\n\n[row]\ndescription = Row\nmin = 0\nmax = MAX\nstep = 1\n\n[column]\ndescription = Column\nmin = 0\nmax = MAX\nstep = 1\n";

    #[test]
    fn test_render_basic_markdown() {
        let dataset = parse(
            "[Description]\nname = Test Dataset\ndescription = A test dataset\ndatapath = t.csv\ncols = x_col: row; y_col: column; spp_col: spp\n\n[row]\ndescription = Row | index\nmin = 0\nmax = 3\nstep = 1\n\n[column]\ndescription = Column index\nmin = 0\nmax = 1\nstep = 1\n",
        )
        .unwrap();

        let markdown = render_markdown(&dataset, DEFAULT_STEP_TOLERANCE);

        assert!(markdown.contains("# Dataset: Test Dataset"));
        assert!(markdown.contains("A test dataset"));
        assert!(markdown.contains("## Column Catalog"));
        assert!(markdown.contains("| `row` | `x_col` | Row \\| index | 0 | 3 | 1 |"));
        assert!(markdown.contains("| `y_col` | `column` | yes |"));
        assert!(markdown.contains("| `spp_col` | `spp` | no |"));
        assert!(markdown.contains("**Cells:** 4 x 2 (8 cells)"));
    }

    #[test]
    fn test_render_oversized_grid() {
        let dataset = parse(&GRID.replace("MAX", "10000000000")).unwrap();
        assert!(crate::validation::validate(&dataset).is_empty());

        let markdown = render_markdown(&dataset, DEFAULT_STEP_TOLERANCE);
        assert!(markdown.contains("**Cells:** 10000000001 x 10000000001 (too many cells to count)"));
    }

    #[test]
    fn test_render_grid_uses_tolerance() {
        let dataset = parse(&GRID.replace("MAX", "3.001")).unwrap();

        assert!(!render_markdown(&dataset, DEFAULT_STEP_TOLERANCE).contains("## Plot Grid"));
        assert!(render_markdown(&dataset, 1e-3).contains("**Cells:** 4 x 4 (16 cells)"));
    }
}
