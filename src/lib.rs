//! # dxq
//!
//! Converts SQL WHERE-style filter strings into DevExtreme-style nested-array
//! grid filters. Filters may carry `{Entity.Attribute}` placeholders whose
//! values are only known at run time; they are resolved against a data map
//! and conditions that can be decided up front are folded away.
//!
//! ```
//! use dxq::{convert_filter_string, DataMap, FilterOptions};
//!
//! let data = DataMap::new().with("Company", "ID", 42i64);
//! let filter = convert_filter_string(
//!     "CompanyID = {Company.ID} AND Status IN (1, 2)",
//!     &data,
//!     &FilterOptions::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(
//!     filter.to_string(),
//!     r#"[["CompanyID","=",42],"and",[["Status","=",1],"or",["Status","=",2]]]"#
//! );
//! ```
//!
//! The pipeline is split across the workspace crates:
//! - [`dxq_parser`]: canonicalization, tokenizing and parsing
//! - [`dxq_filter`]: data maps, placeholder resolution and conversion
//! - [`dxq_shared`]: the shared [`Value`] type and build information

pub use dxq_filter::{
    compile_filter, convert_ast, convert_filter, CompiledFilter, ConvertOptions, DataMap,
    DataSource, FilterError, FilterOptions, GridFilter, GridOperator, MissingAttribute,
};
pub use dxq_parser::{canonicalize, tokenize, FilterParser, Node, ParseError, ParseOptions};
pub use dxq_shared::{BuildInfo, Value};

pub use dxq_filter;
pub use dxq_parser;
pub use dxq_shared;

use anyhow::Context;
use serde_json::Value as JsonValue;

/// Convert `input` against `data` and render the result as JSON.
///
/// A filter that is decided outright, or input that is not a filter at all,
/// yields `null`.
pub fn convert_filter_string<D: DataSource + ?Sized>(
    input: &str,
    data: &D,
    options: &FilterOptions,
) -> anyhow::Result<JsonValue> {
    let compiled = compile_filter(input, options)
        .with_context(|| format!("Failed to compile filter '{}'", input))?;
    log::debug!("converting filter with variables {:?}", compiled.variables());
    Ok(compiled.convert_to_json(data)?)
}

/// Like [`convert_filter_string`] with the data map given as JSON text.
pub fn convert_filter_json(
    input: &str,
    data_json: &str,
    options: &FilterOptions,
) -> anyhow::Result<JsonValue> {
    let data = DataMap::from_json_str(data_json).context("Failed to load data map")?;
    convert_filter_string(input, &data, options)
}

/// Version and build details captured at compile time
#[must_use]
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        git_hash: option_env!("GIT_HASH"),
        build_date: option_env!("BUILD_DATE"),
        rust_version: option_env!("RUSTC_VERSION"),
    }
}
