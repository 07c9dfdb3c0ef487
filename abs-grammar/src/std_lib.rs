//! The embedded standard library unit.
//!
//! The source is compiled into the binary and parsed at most once per
//! process.

use crate::nodes::CompilationUnit;
use crate::parser::{parse_unit, ParseError};
use once_cell::sync::Lazy;

pub const STDLIB_FILE: &str = "abslang.abs";
pub const STDLIB_MODULE: &str = "ABS.StdLib";
pub const STDLIB_SOURCE: &str = include_str!("abslang.abs");

static STDLIB: Lazy<Result<CompilationUnit, ParseError>> =
    Lazy::new(|| parse_unit(Some(STDLIB_FILE), STDLIB_SOURCE));

/// A fresh copy of the parsed standard library unit.
pub fn stdlib_unit() -> Result<CompilationUnit, ParseError> {
    STDLIB.clone()
}
