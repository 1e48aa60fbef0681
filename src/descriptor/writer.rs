//! Serialization of a [`Dataset`] back to descriptor syntax.

use super::model::{ColumnSpec, Dataset, METADATA_SECTION};

impl Dataset {
    /// Render the dataset as a descriptor document.
    ///
    /// Parsing the output yields a dataset equal to `self`.
    pub fn to_descriptor_string(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!("[{METADATA_SECTION}]\n"));
        write_entry(&mut out, "name", &self.name);
        write_optional(&mut out, "author", self.author.as_deref());
        write_optional(&mut out, "description", self.description.as_deref());
        write_optional(&mut out, "citation", self.citation.as_deref());
        write_entry(&mut out, "datapath", &self.datapath);
        write_entry(&mut out, "cols", &self.cols.to_descriptor_value());
        for (key, value) in &self.extra {
            write_entry(&mut out, key, value);
        }

        for column in &self.columns {
            out.push('\n');
            write_column(&mut out, column);
        }

        out
    }
}

fn write_column(out: &mut String, column: &ColumnSpec) {
    out.push_str(&format!("[{}]\n", column.name));
    write_entry(out, "description", &column.description);
    write_number(out, "min", column.min);
    write_number(out, "max", column.max);
    write_number(out, "step", column.step);
    for (key, value) in &column.extra {
        write_entry(out, key, value);
    }
}

fn write_optional(out: &mut String, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        write_entry(out, key, value);
    }
}

fn write_number(out: &mut String, key: &str, value: Option<f64>) {
    if let Some(value) = value {
        write_entry(out, key, &format_number(value));
    }
}

/// Multi-line values continue on tab-indented lines.
fn write_entry(out: &mut String, key: &str, value: &str) {
    let mut lines = value.split('\n');
    let first = lines.next().unwrap_or_default();
    if first.is_empty() {
        out.push_str(&format!("{key} =\n"));
    } else {
        out.push_str(&format!("{key} = {first}\n"));
    }
    for line in lines {
        out.push_str(&format!("\t{line}\n"));
    }
}

/// Shortest representation that parses back to the same value (`3`, `0.5`).
pub fn format_number(value: f64) -> String {
    format!("{value}")
}
