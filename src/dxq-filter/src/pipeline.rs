//! Compile once, convert many times

use dxq_parser::{canonicalize, FilterParser, Node, ParseOptions, ParsedFilter};
use dxq_shared::utils::is_blank;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::converter::{ConvertOptions, Converter};
use crate::data::DataSource;
use crate::error::Result;
use crate::grid::GridFilter;

/// Parser and converter settings together
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    /// Maximum expression nesting depth
    pub max_depth: Option<usize>,
    /// Conversion settings
    #[serde(flatten)]
    pub convert: ConvertOptions,
}

impl FilterOptions {
    /// Parser options derived from these settings
    #[must_use]
    pub fn parse_options(&self) -> ParseOptions {
        let mut options = ParseOptions::default();
        if let Some(max_depth) = self.max_depth {
            options.max_depth = max_depth;
        }
        options
    }
}

/// A canonicalized and parsed filter, ready to convert against data
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFilter {
    normalized: String,
    variables: Vec<String>,
    parsed: Option<ParsedFilter>,
    options: ConvertOptions,
}

impl CompiledFilter {
    /// The filter text with inline placeholders
    #[must_use]
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Placeholder names the filter refers to
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// The parsed expression, absent for blank input and whole queries
    #[must_use]
    pub fn ast(&self) -> Option<&Node> {
        self.parsed.as_ref().map(|parsed| &parsed.ast)
    }

    /// True when there is nothing to convert
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parsed.is_none()
    }

    /// Conversion settings used by [`CompiledFilter::convert`]
    #[must_use]
    pub fn options(&self) -> ConvertOptions {
        self.options
    }

    /// Convert against `data`. `None` means "no filter".
    pub fn convert<D: DataSource + ?Sized>(&self, data: &D) -> Option<GridFilter> {
        let parsed = self.parsed.as_ref()?;
        Converter::new(data, self.options)
            .convert(&parsed.ast)
            .into_root()
    }

    /// Convert against `data` and render as JSON (`null` for no filter)
    pub fn convert_to_json<D: DataSource + ?Sized>(&self, data: &D) -> Result<JsonValue> {
        match self.convert(data) {
            Some(filter) => filter.to_json(),
            None => Ok(JsonValue::Null),
        }
    }
}

/// Canonicalize and parse a filter string.
///
/// Blank input and whole queries (`SELECT ... FROM`, `JOIN`) compile to an
/// empty filter.
pub fn compile_filter(input: &str, options: &FilterOptions) -> Result<CompiledFilter> {
    if is_blank(input) {
        return Ok(CompiledFilter {
            normalized: String::new(),
            variables: Vec::new(),
            parsed: None,
            options: options.convert,
        });
    }

    let canonical = canonicalize(input);
    let parser = FilterParser::with_options(options.parse_options());
    let parsed = parser.parse_with_variables(&canonical.normalized, &canonical.variables)?;
    let variables = parsed
        .as_ref()
        .map_or_else(|| canonical.variables.clone(), |p| p.variables.clone());

    Ok(CompiledFilter {
        normalized: canonical.normalized,
        variables,
        parsed,
        options: options.convert,
    })
}

/// Compile and convert in one call
pub fn convert_filter<D: DataSource + ?Sized>(
    input: &str,
    data: &D,
    options: &FilterOptions,
) -> Result<Option<GridFilter>> {
    Ok(compile_filter(input, options)?.convert(data))
}
