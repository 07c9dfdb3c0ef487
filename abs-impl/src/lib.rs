#![forbid(unsafe_code)]

//! Core of the ABS front end: product derivation by delta application, trait
//! composition, and the extensible type-checking pass.

pub use abs_grammar;

pub mod delta;
pub mod eval;
pub mod extension;
pub mod location_types;
pub mod method_set;
pub mod product_line;
pub mod semantic;
pub mod traits;
pub mod typecheck;
pub mod types;

pub use delta::{flatten, FlattenError, Flattened, ProductConfig};
pub use extension::{ExtensionContext, ExtensionRegistry, TypeSystemExtension};
pub use method_set::MethodSet;
pub use product_line::resolve_product;
pub use typecheck::{type_check, TypeCheckOutcome};
