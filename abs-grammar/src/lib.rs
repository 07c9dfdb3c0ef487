#![forbid(unsafe_code)]

//! # ABS Grammar Library
//!
//! Program tree, diagnostics and parser infrastructure for the ABS modeling
//! language.
//!
//! ## Overview
//!
//! - **Program tree** ([`nodes`]): pure data for units, modules, interfaces,
//!   classes, traits, deltas and products
//! - **Diagnostics** ([`diagnostics`]): the append-only sink shared by every
//!   phase
//! - **Pest-based parser** ([`parser`]): a PEG grammar behind the
//!   [`parser::AbsParser`] trait
//! - **Symbol table** ([`symbol_table`]): qualified and unqualified lookup
//! - **Standard library** ([`std_lib`]): an embedded unit merged like any
//!   other
//!
//! ## Quick Start
//!
//! ```
//! use abs_grammar::parse_unit;
//!
//! let unit = parse_unit(None, "module M; trait T = { Bool f() { return true; } };").unwrap();
//! assert_eq!(unit.modules[0].traits().count(), 1);
//! ```
//!
//! ## Grammar File
//!
//! - **Pest**: `src/abs.pest` defines the concrete syntax

pub use itertools;

pub mod diagnostics;
pub mod nodes;
pub mod parser;
pub mod pest_ast_builder;
pub mod std_lib;
pub mod symbol_table;

/// Parse one source file with the default parser backend.
///
/// Alias for [`parser::parse_unit`].
pub fn parse_unit(
    file: Option<&str>,
    input: &str,
) -> Result<nodes::CompilationUnit, parser::ParseError> {
    parser::parse_unit(file, input)
}
