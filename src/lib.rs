//! # ecodesc - Ecological Dataset Descriptors
//!
//! `ecodesc` reads the plain-text descriptors that document census datasets:
//! who collected the data, where the CSV file lives, which column holds the
//! species, the counts and the grid coordinates, and what numeric domain each
//! column may take.
//!
//! ## Quick Start
//!
//! ```no_run
//! use ecodesc::{Dataset, validate};
//!
//! # fn example() -> ecodesc::error::Result<()> {
//! let dataset = Dataset::from_file("ANBO.txt")?;
//! for violation in validate(&dataset) {
//!     println!("{violation}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Modules
//!
//! - [`descriptor`]: Descriptor model, parser, writer and Markdown renderer
//! - [`validation`]: Invariant checks returning violation lists
//!   - [`validation::data`]: Checks against the referenced CSV file
//! - [`query`]: Subset and split expressions
//! - [`error`]: Error types and handling utilities
//! - [`config`]: User settings
//! - [`logging`]: Tracing subscriber setup
//!
//! ## Parse vs. Validate
//!
//! [`parse`] accepts or rejects a document as a unit: a missing `datapath`
//! or a `step` that is not a number is an error. [`validate`] never fails;
//! it reports every broken invariant (such as `min > max`) so the caller can
//! choose how strict to be.

#![warn(clippy::all, rust_2018_idioms)]

pub mod config;
pub mod descriptor;
pub mod error;
pub mod logging;
pub mod query;
pub mod utils;
pub mod validation;

pub use descriptor::{ColumnSpec, Dataset, parse};
pub use error::{DescriptorError, ErrorKind};
pub use validation::{ValidateOptions, Violation, ViolationKind, validate, validate_with};
