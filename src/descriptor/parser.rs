//! Builds a [`Dataset`] from descriptor text.

use super::ini::{Section, read_sections};
use super::model::{ColumnMapping, ColumnSpec, Dataset, METADATA_SECTION};
use crate::error::{DescriptorError, Result};
use std::collections::BTreeMap;

const METADATA_KEYS: [&str; 6] = ["name", "author", "description", "citation", "datapath", "cols"];
const COLUMN_KEYS: [&str; 4] = ["description", "min", "max", "step"];

/// Parse a descriptor document.
///
/// The document must hold exactly one `[Description]` section with `name`,
/// `datapath` and `cols`; every other section describes one data column and
/// must carry a `description`.
///
/// Invariants between fields (bound ordering, unique identifiers, mapped
/// columns) are left to [`crate::validation::validate`].
///
/// # Errors
///
/// `MalformedDescriptor` for structural problems, `InvalidFieldValue` for
/// `min`/`max`/`step` values that are not finite numbers.
pub fn parse(text: &str) -> Result<Dataset> {
    let sections = read_sections(text)?;

    let mut metadata: Option<&Section> = None;
    let mut columns = Vec::new();
    for section in &sections {
        if section.name == METADATA_SECTION {
            if metadata.is_some() {
                return Err(DescriptorError::malformed_at(
                    section.line,
                    format!("[{METADATA_SECTION}] appears more than once"),
                ));
            }
            metadata = Some(section);
        } else {
            columns.push(parse_column(section)?);
        }
    }

    let Some(metadata) = metadata else {
        return Err(DescriptorError::malformed(format!(
            "missing [{METADATA_SECTION}] section"
        )));
    };

    let dataset = Dataset {
        name: required(metadata, "name")?.to_owned(),
        author: optional(metadata, "author"),
        description: optional(metadata, "description"),
        citation: optional(metadata, "citation"),
        datapath: required(metadata, "datapath")?.to_owned(),
        cols: ColumnMapping::parse(required(metadata, "cols")?)?,
        columns,
        extra: extra_entries(metadata, &METADATA_KEYS),
    };

    tracing::debug!(
        "Parsed descriptor '{}' with {} column sections",
        dataset.name,
        dataset.columns.len()
    );
    Ok(dataset)
}

fn parse_column(section: &Section) -> Result<ColumnSpec> {
    let description = required(section, "description")?;
    Ok(ColumnSpec {
        name: section.name.clone(),
        description: description.to_owned(),
        min: number(section, "min")?,
        max: number(section, "max")?,
        step: number(section, "step")?,
        extra: extra_entries(section, &COLUMN_KEYS),
    })
}

fn required<'a>(section: &'a Section, key: &str) -> Result<&'a str> {
    match section.get(key) {
        Some(value) if !value.is_empty() => Ok(value),
        Some(_) => Err(DescriptorError::malformed_at(
            section.line,
            format!("key '{key}' in [{}] is empty", section.name),
        )),
        None => Err(DescriptorError::malformed_at(
            section.line,
            format!("[{}] is missing required key '{key}'", section.name),
        )),
    }
}

fn optional(section: &Section, key: &str) -> Option<String> {
    section
        .get(key)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

fn number(section: &Section, key: &str) -> Result<Option<f64>> {
    let Some(raw) = section.get(key) else {
        return Ok(None);
    };

    let invalid = |reason: &str| DescriptorError::InvalidFieldValue {
        section: section.name.clone(),
        key: key.to_owned(),
        value: raw.to_owned(),
        reason: reason.to_owned(),
    };

    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        Ok(_) => Err(invalid("value must be finite")),
        Err(_) => Err(invalid("not a number")),
    }
}

fn extra_entries(section: &Section, known: &[&str]) -> BTreeMap<String, String> {
    section
        .entries
        .iter()
        .filter(|e| !known.contains(&e.key.as_str()))
        .map(|e| (e.key.clone(), e.value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::model::Role;
    use crate::error::ErrorKind;

    const MINIMAL: &str = "\
[Description]
name = Test plot
datapath = plot.csv
cols = spp_col: spp; count_col: count

[spp]
description = Species code

[count]
description = Individuals
";

    #[test]
    fn test_parse_minimal() {
        let dataset = parse(MINIMAL).unwrap();

        assert_eq!(dataset.name, "Test plot");
        assert_eq!(dataset.author, None);
        assert_eq!(dataset.datapath, "plot.csv");
        assert_eq!(dataset.cols.column(&Role::Count), Some("count"));
        assert_eq!(dataset.column_names(), vec!["spp", "count"]);
        assert!(dataset.columns.iter().all(|c| !c.has_numeric_domain()));
    }

    #[test]
    fn test_missing_required_keys() {
        for key in ["name", "datapath", "cols"] {
            let text: String = MINIMAL
                .lines()
                .filter(|l| !l.starts_with(key))
                .map(|l| format!("{l}\n"))
                .collect();
            let err = parse(&text).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedDescriptor, "missing {key}");
            assert!(err.to_string().contains(key));
        }
    }

    #[test]
    fn test_missing_or_repeated_metadata_section() {
        let err = parse("[spp]\ndescription = x\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedDescriptor);

        let doubled = format!("{MINIMAL}\n[Description]\nname = again\n");
        let err = parse(&doubled).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedDescriptor);
    }

    #[test]
    fn test_column_without_description() {
        let text = format!("{MINIMAL}\n[year]\nmin = 2000\n");
        let err = parse(&text).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedDescriptor);
        assert!(err.to_string().contains("[year]"));
    }

    #[test]
    fn test_non_numeric_bounds() {
        for value in ["three", "", "nan", "inf"] {
            let text = format!("{MINIMAL}\n[row]\ndescription = Row\nmax = {value}\n");
            let err = parse(&text).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidFieldValue, "max = {value:?}");
            assert!(err.is_malformed());
        }
    }

    #[test]
    fn test_extra_keys_preserved() {
        let text = MINIMAL.replace("datapath = plot.csv", "datapath = plot.csv\nlicense = CC-BY");
        let text = text.replace("description = Individuals", "description = Individuals\nunits = stems");
        let dataset = parse(&text).unwrap();

        assert_eq!(dataset.extra.get("license").map(String::as_str), Some("CC-BY"));
        assert_eq!(
            dataset.column("count").and_then(|c| c.extra.get("units")).map(String::as_str),
            Some("stems")
        );
    }
}
