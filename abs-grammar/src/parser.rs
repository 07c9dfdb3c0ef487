#![forbid(unsafe_code)]

//! # ABS Parser Module
//!
//! Parsing is a collaborator of the front end, not part of its core: the core
//! only needs a correctly shaped [`CompilationUnit`] or a syntax error. This
//! module provides that collaborator behind a small trait so other parser
//! backends can be plugged in.
//!
//! ## Architecture
//!
//! 1. **Trait-based abstraction**: [`AbsParser`] is the contract every backend
//!    fulfils. The driver only depends on the trait.
//! 2. **Pest backend**: [`PestParser`] parses with the grammar in `abs.pest`
//!    and builds the tree with [`PestAstBuilder`](crate::pest_ast_builder::PestAstBuilder).
//! 3. **Factory**: [`get_parser()`] returns the default backend.
//!
//! ## Usage
//!
//! ```
//! use abs_grammar::parser::{get_parser, AbsParser};
//!
//! let unit = get_parser()
//!     .parse_unit(Some("hello.abs"), "module Hello; interface Greeter { String greet(); }")
//!     .unwrap();
//! assert_eq!(unit.modules[0].name, "Hello");
//! ```

use crate::nodes::{CompilationUnit, Location};
use crate::pest_ast_builder::PestAstBuilder;

/// Syntax error produced by a parser backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{at}: {message}", at = location_text(.location))]
pub struct ParseError {
    pub message: String,
    pub location: Option<Location>,
}

fn location_text(location: &Option<Location>) -> String {
    match location {
        Some(l) => l.to_string(),
        None => "<unknown>".to_string(),
    }
}

impl ParseError {
    pub fn new(message: impl Into<String>, location: Option<Location>) -> Self {
        Self {
            message: message.into(),
            location,
        }
    }
}

/// Parser abstraction over concrete syntax backends.
///
/// # Implementing a Custom Parser
///
/// ```ignore
/// pub struct MyParser;
///
/// impl AbsParser for MyParser {
///     fn parse_unit(&self, file: Option<&str>, input: &str) -> Result<CompilationUnit, ParseError> {
///         // Build the unit from `input`
///         Ok(CompilationUnit::default())
///     }
///
///     fn name(&self) -> &'static str {
///         "MyParser"
///     }
/// }
/// ```
pub trait AbsParser {
    /// Parse one source file into a compilation unit.
    ///
    /// `file` is only used for source locations; nothing is read from disk.
    fn parse_unit(&self, file: Option<&str>, input: &str) -> Result<CompilationUnit, ParseError>;

    /// Name of this backend (for logging).
    fn name(&self) -> &'static str;
}

/// Pest-derived parser holding the compiled grammar.
#[derive(pest_derive::Parser)]
#[grammar = "abs.pest"]
pub struct AbsPestParser;

/// Pest parser backend.
///
/// Parsing happens in two stages:
///
/// 1. **Grammar parsing** (`abs.pest`): raw input becomes a parse tree.
/// 2. **Tree building** (`pest_ast_builder.rs`): the parse tree becomes a
///    [`CompilationUnit`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PestParser;

impl PestParser {
    pub fn new() -> Self {
        Self
    }
}

impl AbsParser for PestParser {
    #[tracing::instrument(skip(self, input), fields(bytes = input.len()))]
    fn parse_unit(&self, file: Option<&str>, input: &str) -> Result<CompilationUnit, ParseError> {
        use pest::Parser;

        let file = file.map(str::to_string);
        let pairs = AbsPestParser::parse(Rule::unit, input)
            .map_err(|e| pest_error_to_parse_error(e, file.clone()))?;

        PestAstBuilder::new(file.clone())
            .build_unit(pairs)
            .map_err(|message| ParseError::new(message, None))
    }

    fn name(&self) -> &'static str {
        "Pest"
    }
}

fn pest_error_to_parse_error(e: pest::error::Error<Rule>, file: Option<String>) -> ParseError {
    let (line, column) = match e.line_col {
        pest::error::LineColLocation::Pos((l, c)) => (l, c),
        pest::error::LineColLocation::Span((l, c), _) => (l, c),
    };
    let message = match &e.variant {
        pest::error::ErrorVariant::ParsingError { positives, .. } if !positives.is_empty() => {
            use itertools::Itertools;
            format!(
                "expected {}",
                positives.iter().map(|r| format!("{:?}", r)).join(" or ")
            )
        }
        pest::error::ErrorVariant::ParsingError { .. } => "unexpected input".to_string(),
        pest::error::ErrorVariant::CustomError { message } => message.clone(),
    };
    ParseError::new(message, Some(Location::new(file, line, column)))
}

/// Returns the default parser backend.
pub fn get_parser() -> PestParser {
    PestParser::new()
}

/// Parse a source string with the default backend.
pub fn parse_unit(file: Option<&str>, input: &str) -> Result<CompilationUnit, ParseError> {
    get_parser().parse_unit(file, input)
}
