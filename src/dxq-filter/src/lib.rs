//! # dxq-filter
//!
//! Resolves placeholders in parsed filters and converts them into
//! DevExtreme-style nested-array grid filters.
//!
//! This crate provides:
//! - data maps loaded from JSON, and placeholder resolution against them
//! - three-valued constant evaluation with short-circuit folding
//! - flattening of same-connective chains
//! - compiled filters that convert against many data maps

pub mod converter;
pub mod data;
pub mod error;
pub mod evaluate;
pub mod grid;
pub mod pipeline;
pub mod resolver;

pub use converter::{convert_ast, ConvertOptions, Converter};
pub use data::{DataMap, DataSource, EntityData, Record};
pub use error::{FilterError, Result};
pub use evaluate::evaluate;
pub use grid::{GridFilter, GridOperator};
pub use pipeline::{compile_filter, convert_filter, CompiledFilter, FilterOptions};
pub use resolver::{MissingAttribute, Resolution, Resolver};

/// Re-export commonly used types from dxq-shared
pub use dxq_shared::Value;
