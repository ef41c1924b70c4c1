//! dxq-shared: pieces every dxq crate needs
//!
//! - [`Value`], the literal/attribute value model
//! - the `anyhow`-based [`Result`] used by glue code, with error constructors
//! - [`BuildInfo`] for version output
//! - parser defaults and placeholder syntax constants

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::doc_markdown,
    clippy::uninlined_format_args
)]

use std::fmt;

/// Result type alias for dxq glue code
pub type Result<T> = anyhow::Result<T>;

/// Version of the dxq crates
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version and build details.
///
/// The optional parts are captured by the build script of the crate that
/// constructs it, so they are `None` when git or rustc were unavailable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    /// Package version
    pub version: &'static str,
    /// Short git commit hash
    pub git_hash: Option<&'static str>,
    /// Build date, `YYYY-MM-DD`
    pub build_date: Option<&'static str>,
    /// rustc version
    pub rust_version: Option<&'static str>,
}

impl BuildInfo {
    /// Build details as `label value` pairs, skipping unknown ones
    pub fn details(&self) -> Vec<(&'static str, &'static str)> {
        [
            ("commit", self.git_hash),
            ("built", self.build_date),
            ("rustc", self.rust_version),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.map(|value| (label, value)))
        .collect()
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dxq {}", self.version)?;
        let details = self.details();
        if !details.is_empty() {
            let joined: Vec<String> = details
                .iter()
                .map(|(label, value)| format!("{label} {value}"))
                .collect();
            write!(f, " ({})", joined.join(", "))?;
        }
        Ok(())
    }
}

/// Error constructors for glue code
pub mod error {
    /// A value that cannot be represented where it is needed
    pub fn value_error(msg: impl Into<String>) -> anyhow::Error {
        anyhow::anyhow!("Value error: {}", msg.into())
    }

    /// Invalid or unreadable configuration
    pub fn config_error(msg: impl Into<String>) -> anyhow::Error {
        anyhow::anyhow!("Configuration error: {}", msg.into())
    }
}

pub mod value;

pub use value::Value;

/// String helpers
pub mod utils {
    /// Nothing but whitespace?
    #[must_use]
    pub fn is_blank(s: &str) -> bool {
        s.trim().is_empty()
    }

    /// Split a comma-separated list into trimmed, non-empty items
    #[must_use]
    pub fn split_csv(s: &str) -> Vec<&str> {
        s.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .collect()
    }
}

/// Parser defaults and placeholder syntax
pub mod constants {
    /// Default maximum nesting depth accepted by the parser
    pub const DEFAULT_MAX_DEPTH: usize = 256;

    /// Field/attribute separator inside a placeholder name
    pub const PLACEHOLDER_SEPARATOR: char = '.';
}
