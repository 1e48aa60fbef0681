//! Dataset descriptors: the metadata files that document one census dataset.
//!
//! A descriptor is a plain-text document with one `[Description]` section of
//! dataset metadata and one section per data column:
//!
//! ```text
//! [Description]
//! name = Anza-Borrego
//! datapath = ANBO.csv
//! cols = spp_col: spp; count_col: count; x_col: row; y_col: column
//!
//! [row]
//! description = Row of cell in gridded plot
//! min = 0
//! max = 3
//! step = 1
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use ecodesc::descriptor::{DEFAULT_STEP_TOLERANCE, Dataset, render_markdown};
//!
//! # fn example() -> ecodesc::error::Result<()> {
//! let dataset = Dataset::from_file("ANBO.txt")?;
//! println!("{} declares {} columns", dataset.name, dataset.columns.len());
//!
//! // Write it back, or document it
//! std::fs::write("ANBO.md", render_markdown(&dataset, DEFAULT_STEP_TOLERANCE))?;
//! # Ok(())
//! # }
//! ```

pub mod ini;
pub mod model;
pub mod parser;
pub mod renderer;
pub mod writer;

pub use model::{
    Bounds, ColumnMapping, ColumnSpec, DEFAULT_STEP_TOLERANCE, Dataset, GridShape,
    METADATA_SECTION, Role, RoleBinding,
};
pub use parser::parse;
pub use renderer::render_markdown;
