//! Type-System Extension Framework
//!
//! Extensions are values implementing [`TypeSystemExtension`]. They are
//! collected in an [`ExtensionRegistry`] and driven by the core type checker,
//! which owns the one traversal of the flattened tree and calls every
//! extension's hook, in registration order, at each point of it.
//!
//! ## Isolation
//!
//! Each hook receives an [`ExtensionContext`] scoped to the calling
//! extension. Annotations written through it are keyed by the extension's
//! name, and an extension can only read back its own. Findings reported
//! through it carry the extension's name as their origin.
//!
//! ## Failure
//!
//! Findings are soft: the traversal always continues. The only hard failure
//! is [`TypeSystemExtension::configure`] returning an error, which aborts the
//! phase before any node is visited.

use crate::types::Type;
use abs_grammar::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use abs_grammar::nodes::{Block, ClassDecl, Expr, Location, MethodImpl, MethodSig, Model, Stmt};
use abs_grammar::symbol_table::SymbolTable;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Stable reference to a node of the flattened tree.
///
/// Class names are qualified with their module. `body` is a method name,
/// `<init>` or `<recover>`. Expressions are numbered in the order the core
/// finishes checking them within their body.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum NodeRef {
    Class { class: String },
    Field { class: String, field: String },
    ClassParam { class: String, param: String },
    Method { class: String, method: String },
    Param { class: String, body: String, param: String },
    Local { class: String, body: String, name: String, index: usize },
    Expr { class: String, body: String, index: usize },
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRef::Class { class } => write!(f, "{}", class),
            NodeRef::Field { class, field } => write!(f, "{}.{}", class, field),
            NodeRef::ClassParam { class, param } => write!(f, "{}({})", class, param),
            NodeRef::Method { class, method } => write!(f, "{}.{}()", class, method),
            NodeRef::Param { class, body, param } => write!(f, "{}.{}({})", class, body, param),
            NodeRef::Local { class, body, name, .. } => write!(f, "{}.{}:{}", class, body, name),
            NodeRef::Expr { class, body, index } => write!(f, "{}.{}#{}", class, body, index),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AnnotationValue {
    Flag(bool),
    Int(i64),
    Text(String),
}

impl fmt::Display for AnnotationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotationValue::Flag(b) => write!(f, "{}", b),
            AnnotationValue::Int(i) => write!(f, "{}", i),
            AnnotationValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One annotation in serializable form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotationRecord {
    pub extension: String,
    pub node: NodeRef,
    pub value: AnnotationValue,
}

/// Annotation table keyed by (extension name, node).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    entries: BTreeMap<(String, NodeRef), AnnotationValue>,
}

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, extension: &str, node: &NodeRef) -> Option<&AnnotationValue> {
        self.entries.get(&(extension.to_string(), node.clone()))
    }

    fn insert(&mut self, extension: &str, node: NodeRef, value: AnnotationValue) {
        self.entries.insert((extension.to_string(), node), value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NodeRef, &AnnotationValue)> {
        self.entries
            .iter()
            .map(|((ext, node), value)| (ext.as_str(), node, value))
    }

    /// Annotations written by `extension`, in node order.
    pub fn for_extension<'a>(
        &'a self,
        extension: &'a str,
    ) -> impl Iterator<Item = (&'a NodeRef, &'a AnnotationValue)> + 'a {
        self.iter()
            .filter(move |(ext, _, _)| *ext == extension)
            .map(|(_, node, value)| (node, value))
    }

    pub fn records(&self) -> Vec<AnnotationRecord> {
        self.iter()
            .map(|(extension, node, value)| AnnotationRecord {
                extension: extension.to_string(),
                node: node.clone(),
                value: value.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtensionError {
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("an extension named {0} is already registered")]
    DuplicateName(String),
}

/// A variable visible at the current point of the traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub node: NodeRef,
    pub ty: Type,
}

/// Traversal state of the method body being checked.
#[derive(Debug)]
pub(crate) struct BodyState<'m> {
    pub(crate) name: String,
    pub(crate) method: Option<&'m MethodImpl>,
    pub(crate) return_type: Type,
    pub(crate) scopes: Vec<Vec<Binding>>,
    pub(crate) exprs: HashMap<*const Expr, (NodeRef, Type)>,
    pub(crate) calls: HashMap<*const Expr, &'m MethodSig>,
    pub(crate) next_expr: usize,
    pub(crate) next_local: usize,
}

impl<'m> BodyState<'m> {
    pub(crate) fn new(name: impl Into<String>, method: Option<&'m MethodImpl>, return_type: Type) -> Self {
        Self {
            name: name.into(),
            method,
            return_type,
            scopes: vec![Vec::new()],
            exprs: HashMap::new(),
            calls: HashMap::new(),
            next_expr: 0,
            next_local: 0,
        }
    }
}

/// Position of the traversal: the class being checked and, inside a body,
/// that body's state.
#[derive(Debug)]
pub(crate) struct Cursor<'m> {
    pub(crate) module: &'m str,
    pub(crate) class: &'m ClassDecl,
    pub(crate) class_name: String,
    /// Fields and class parameters.
    pub(crate) fields: Vec<Binding>,
    pub(crate) body: Option<BodyState<'m>>,
}

impl<'m> Cursor<'m> {
    pub(crate) fn lookup(&self, name: &str) -> Option<&Binding> {
        self.body
            .iter()
            .flat_map(|b| b.scopes.iter().rev())
            .flat_map(|scope| scope.iter().rev())
            .find(|b| b.name == name)
            .or_else(|| self.field(name))
    }

    pub(crate) fn field(&self, name: &str) -> Option<&Binding> {
        self.fields.iter().find(|b| b.name == name)
    }
}

/// Per-call view handed to an extension hook.
pub struct ExtensionContext<'a> {
    extension: &'a str,
    diagnostics: &'a mut Diagnostics,
    annotations: &'a mut Annotations,
    model: &'a Model,
    symbols: &'a SymbolTable<'a>,
    cursor: Option<&'a Cursor<'a>>,
}

impl<'a> ExtensionContext<'a> {
    pub(crate) fn new(
        extension: &'a str,
        diagnostics: &'a mut Diagnostics,
        annotations: &'a mut Annotations,
        model: &'a Model,
        symbols: &'a SymbolTable<'a>,
        cursor: Option<&'a Cursor<'a>>,
    ) -> Self {
        Self {
            extension,
            diagnostics,
            annotations,
            model,
            symbols,
            cursor,
        }
    }

    pub fn extension_name(&self) -> &str {
        self.extension
    }

    pub fn model(&self) -> &'a Model {
        self.model
    }

    pub fn symbols(&self) -> &'a SymbolTable<'a> {
        self.symbols
    }

    /// Appends a finding attributed to this extension.
    pub fn report(&mut self, mut diagnostic: Diagnostic) {
        diagnostic.kind = DiagnosticKind::Extension;
        self.diagnostics
            .push(diagnostic.from_extension(self.extension));
    }

    pub fn warn(&mut self, message: impl Into<String>, location: Option<&Location>) {
        self.report(Diagnostic::warning(DiagnosticKind::Extension, message).at(location));
    }

    pub fn annotate(&mut self, node: NodeRef, value: AnnotationValue) {
        self.annotations.insert(self.extension, node, value);
    }

    /// This extension's annotation of `node`.
    pub fn annotation(&self, node: &NodeRef) -> Option<&AnnotationValue> {
        self.annotations.get(self.extension, node)
    }

    pub fn module(&self) -> Option<&'a str> {
        self.cursor.map(|c| c.module)
    }

    pub fn class(&self) -> Option<&'a ClassDecl> {
        self.cursor.map(|c| c.class)
    }

    /// Qualified name of the current class.
    pub fn class_name(&self) -> Option<&'a str> {
        self.cursor.map(|c| c.class_name.as_str())
    }

    /// Fields and class parameters of the current class.
    pub fn fields(&self) -> &'a [Binding] {
        self.cursor.map(|c| c.fields.as_slice()).unwrap_or(&[])
    }

    pub fn body_name(&self) -> Option<&'a str> {
        self.body().map(|b| b.name.as_str())
    }

    /// The method whose body is being checked; `None` in `<init>` and
    /// `<recover>`.
    pub fn method(&self) -> Option<&'a MethodImpl> {
        self.body().and_then(|b| b.method)
    }

    /// Resolves a variable name at the current point.
    pub fn variable(&self, name: &str) -> Option<&'a Binding> {
        self.cursor.and_then(|c| c.lookup(name))
    }

    /// Reference of an expression the core has already checked.
    pub fn node_of(&self, expr: &Expr) -> Option<&'a NodeRef> {
        self.body()
            .and_then(|b| b.exprs.get(&(expr as *const Expr)))
            .map(|(node, _)| node)
    }

    pub fn type_of(&self, expr: &Expr) -> Option<&'a Type> {
        self.body()
            .and_then(|b| b.exprs.get(&(expr as *const Expr)))
            .map(|(_, ty)| ty)
    }

    /// Signature a call expression was resolved to.
    pub fn call_target(&self, expr: &Expr) -> Option<&'a MethodSig> {
        self.body()
            .and_then(|b| b.calls.get(&(expr as *const Expr)))
            .copied()
    }

    fn body(&self) -> Option<&'a BodyState<'a>> {
        self.cursor.and_then(|c| c.body.as_ref())
    }
}

/// A pluggable analysis run during the core type-checking traversal.
///
/// Every hook but [`name`](Self::name) has an empty default, so an extension
/// implements only what it needs.
pub trait TypeSystemExtension {
    /// Unique name; also the key of this extension's annotations.
    fn name(&self) -> &str;

    /// Called once before the traversal. An error aborts type checking.
    fn configure(&mut self, _cx: &mut ExtensionContext<'_>) -> Result<(), ExtensionError> {
        Ok(())
    }

    fn before_class(&mut self, _cx: &mut ExtensionContext<'_>, _class: &ClassDecl) {}

    fn after_class(&mut self, _cx: &mut ExtensionContext<'_>, _class: &ClassDecl) {}

    fn before_method_body(&mut self, _cx: &mut ExtensionContext<'_>, _body: &Block) {}

    fn after_method_body(&mut self, _cx: &mut ExtensionContext<'_>, _body: &Block) {}

    /// Called after the statement and everything inside it was checked.
    fn check_statement(&mut self, _cx: &mut ExtensionContext<'_>, _stmt: &Stmt) {}

    /// Called after the core has typed `expr`; sub-expressions come first.
    fn check_expression(
        &mut self,
        _cx: &mut ExtensionContext<'_>,
        _expr: &Expr,
        _ty: &Type,
        _node: &NodeRef,
    ) {
    }

    /// Called once after the traversal.
    fn finish(&mut self, _cx: &mut ExtensionContext<'_>) {}
}

#[derive(Default)]
pub struct ExtensionRegistry {
    extensions: Vec<Box<dyn TypeSystemExtension>>,
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, extension: Box<dyn TypeSystemExtension>) -> Result<(), ExtensionError> {
        if self.names().any(|n| n == extension.name()) {
            return Err(ExtensionError::DuplicateName(extension.name().to_string()));
        }
        tracing::debug!(extension = %extension.name(), "registered type system extension");
        self.extensions.push(extension);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(|e| e.name())
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn TypeSystemExtension>> {
        self.extensions.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl TypeSystemExtension for Named {
        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut registry = ExtensionRegistry::new();
        registry.register(Box::new(Named("a"))).unwrap();
        registry.register(Box::new(Named("b"))).unwrap();
        assert_eq!(
            registry.register(Box::new(Named("a"))),
            Err(ExtensionError::DuplicateName("a".into()))
        );
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_context_scopes_annotations_by_extension() {
        let model = Model::default();
        let symbols = SymbolTable::new(&model);
        let mut diagnostics = Diagnostics::new();
        let mut annotations = Annotations::new();
        let node = NodeRef::Class { class: "M.C".into() };

        {
            let mut cx = ExtensionContext::new("a", &mut diagnostics, &mut annotations, &model, &symbols, None);
            cx.annotate(node.clone(), AnnotationValue::Int(1));
            cx.warn("from a", None);
        }
        {
            let mut cx = ExtensionContext::new("b", &mut diagnostics, &mut annotations, &model, &symbols, None);
            assert_eq!(cx.annotation(&node), None);
            cx.annotate(node.clone(), AnnotationValue::Flag(true));
        }

        assert_eq!(annotations.get("a", &node), Some(&AnnotationValue::Int(1)));
        assert_eq!(annotations.get("b", &node), Some(&AnnotationValue::Flag(true)));
        assert_eq!(annotations.len(), 2);
        let d = diagnostics.iter().next().unwrap();
        assert_eq!(d.origin.as_deref(), Some("a"));
        assert_eq!(d.kind, DiagnosticKind::Extension);
    }
}
