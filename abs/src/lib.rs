//! ABS is a modeling language for concurrent object-oriented systems with
//! first-class support for software product lines. This crate is its front
//! end: it parses ABS sources, derives the requested product by applying
//! deltas, composes classes from traits and type checks the result.
//!
//! ## Example Usage
//!
//! ```rust
//! use abs::{compile, CompilerOptions, SourceFile};
//!
//! let source = SourceFile::new(
//!     "hello.abs",
//!     r#"module Hello;
//!     interface Greeter { Bool greet(); }
//!     class GreeterImpl implements Greeter {
//!         Bool greet() { return true; }
//!     }"#,
//! );
//!
//! let compilation = compile(&[source], &CompilerOptions::default()).unwrap();
//! assert!(compilation.succeeded(), "{:?}", compilation.diagnostics);
//! ```

use abs_grammar::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use abs_grammar::nodes::Model;
use abs_grammar::parser::ParseError;
use abs_grammar::std_lib::stdlib_unit;
use abs_impl::extension::{Annotations, ExtensionError};
use abs_impl::location_types::{LocationTypeExtension, LocationTypeOptions};
use abs_impl::semantic::check_model;
use abs_impl::typecheck::TypeCheckError;
use serde::Serialize;

pub use abs_grammar;
pub use abs_impl;
pub use abs_impl::{flatten, resolve_product, type_check, ExtensionRegistry, ProductConfig, TypeSystemExtension};

/// One ABS source text and the name it is reported under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: Option<String>,
    pub contents: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            contents: contents.into(),
        }
    }

    /// A source without a file name, e.g. read from standard input.
    pub fn anonymous(contents: impl Into<String>) -> Self {
        Self {
            name: None,
            contents: contents.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompilerOptions {
    /// Product to derive; without one, no delta is applied.
    pub product: Option<String>,
    pub typecheck: bool,
    /// Merge the bundled standard library into the program.
    pub stdlib: bool,
    /// Run location-type inference with these options.
    pub location_types: Option<LocationTypeOptions>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            product: None,
            typecheck: true,
            stdlib: true,
            location_types: None,
        }
    }
}

/// The phase after which compilation stopped because of errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Parse,
    Semantic,
    ProductLine,
    Flatten,
    Composition,
}

#[derive(Debug, Clone, Default)]
pub struct Compilation {
    /// The flattened model, once product derivation succeeded.
    pub model: Option<Model>,
    pub product: Option<ProductConfig>,
    pub annotations: Annotations,
    pub diagnostics: Diagnostics,
    pub stopped_after: Option<Phase>,
}

impl Compilation {
    pub fn succeeded(&self) -> bool {
        self.stopped_after.is_none() && !self.diagnostics.has_errors()
    }

    fn stop(mut self, phase: Phase) -> Self {
        tracing::debug!(?phase, errors = self.diagnostics.error_count(), "compilation stopped");
        self.stopped_after = Some(phase);
        self
    }
}

/// Hard failures; everything else is reported through
/// [`Compilation::diagnostics`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Registration(#[from] ExtensionError),
    #[error(transparent)]
    Configuration(#[from] TypeCheckError),
}

fn syntax_error(e: ParseError) -> Diagnostic {
    Diagnostic::error(DiagnosticKind::Syntax, e.message).at(e.location.as_ref())
}

pub fn compile(sources: &[SourceFile], options: &CompilerOptions) -> Result<Compilation, CompileError> {
    compile_with(sources, options, ExtensionRegistry::new())
}

/// Runs every phase over `sources`, with the extensions of `registry` in
/// addition to those requested by `options`.
#[tracing::instrument(skip_all, fields(files = sources.len(), product = ?options.product))]
pub fn compile_with(
    sources: &[SourceFile],
    options: &CompilerOptions,
    mut registry: ExtensionRegistry,
) -> Result<Compilation, CompileError> {
    let mut out = Compilation::default();

    let mut units = Vec::with_capacity(sources.len() + 1);
    if options.stdlib {
        match stdlib_unit() {
            Ok(unit) => units.push(unit),
            Err(e) => out.diagnostics.push(syntax_error(e)),
        }
    }
    for source in sources {
        match abs_grammar::parse_unit(source.name.as_deref(), &source.contents) {
            Ok(unit) => units.push(unit),
            Err(e) => out.diagnostics.push(syntax_error(e)),
        }
    }
    if out.diagnostics.has_errors() {
        return Ok(out.stop(Phase::Parse));
    }

    let model = Model::new(units);
    out.diagnostics.append(check_model(&model));
    if out.diagnostics.has_errors() {
        return Ok(out.stop(Phase::Semantic));
    }

    let config = match &options.product {
        Some(name) => match resolve_product(&model, name) {
            Ok(config) => config,
            Err(e) => {
                out.diagnostics.push(e.to_diagnostic());
                return Ok(out.stop(Phase::ProductLine));
            }
        },
        None => ProductConfig::empty(),
    };
    out.product = Some(config.clone());

    let flattened = match flatten(&model, &config) {
        Ok(flattened) => flattened,
        Err(e) => {
            out.diagnostics.append(e.diagnostics);
            return Ok(out.stop(Phase::Flatten));
        }
    };
    let composition_failed = flattened.diagnostics.has_errors();
    out.diagnostics.append(flattened.diagnostics);
    let model = flattened.model;
    if composition_failed {
        out.model = Some(model);
        return Ok(out.stop(Phase::Composition));
    }

    if options.typecheck {
        if let Some(location_types) = options.location_types {
            registry.register(Box::new(LocationTypeExtension::new(location_types)))?;
        }
        let outcome = type_check(&model, &mut registry)?;
        out.diagnostics.append(outcome.diagnostics);
        out.annotations = outcome.annotations;
    }
    out.model = Some(model);
    Ok(out)
}
