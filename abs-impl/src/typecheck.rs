//! Core type checking of a flattened model.
//!
//! One traversal visits every class: its interfaces, field types, the
//! synthesized `<init>` body (field initializers followed by the init block),
//! each method body including predecessors reached through `original`, and
//! the `<recover>` block. Registered extensions are called at every step of
//! that same traversal, after the core has checked the node they are shown.

use crate::extension::{
    Annotations, Binding, BodyState, Cursor, ExtensionContext, ExtensionError, ExtensionRegistry, NodeRef,
    TypeSystemExtension,
};
use crate::types::{is_assignable, is_comparable, resolve_type, Type, TypeError};
use abs_grammar::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use abs_grammar::nodes::*;
use abs_grammar::symbol_table::{LookupError, SymbolTable};
use std::collections::BTreeSet;

pub const INIT_BODY: &str = "<init>";
pub const RECOVER_BODY: &str = "<recover>";

#[derive(Debug, Clone, Default)]
pub struct TypeCheckOutcome {
    pub diagnostics: Diagnostics,
    pub annotations: Annotations,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeCheckError {
    #[error("extension {extension} rejected its configuration: {source}")]
    Configuration { extension: String, source: ExtensionError },
}

/// Type checks `model` and runs every extension of `registry` along the way.
///
/// Findings, including those of extensions, are returned in the outcome; the
/// only error is an extension refusing its configuration.
#[tracing::instrument(skip_all, fields(extensions = registry.len()))]
pub fn type_check(model: &Model, registry: &mut ExtensionRegistry) -> Result<TypeCheckOutcome, TypeCheckError> {
    let symbols = SymbolTable::new(model);
    let mut checker = Checker {
        model,
        symbols: &symbols,
        registry,
        diagnostics: Diagnostics::new(),
        annotations: Annotations::new(),
    };

    checker.configure()?;
    for module in model.modules() {
        for iface in module.interfaces() {
            checker.check_interface(module, iface);
        }
        for class in module.classes() {
            checker.check_class(module, class);
        }
    }
    checker.run_hooks(None, |ext, cx| ext.finish(cx));

    tracing::debug!(findings = checker.diagnostics.len(), "type checking done");
    Ok(TypeCheckOutcome {
        diagnostics: checker.diagnostics,
        annotations: checker.annotations,
    })
}

struct Checker<'m, 'r> {
    model: &'m Model,
    symbols: &'r SymbolTable<'m>,
    registry: &'r mut ExtensionRegistry,
    diagnostics: Diagnostics,
    annotations: Annotations,
}

impl<'m, 'r> Checker<'m, 'r> {
    fn configure(&mut self) -> Result<(), TypeCheckError> {
        for extension in self.registry.iter_mut() {
            let name = extension.name().to_string();
            let mut cx = ExtensionContext::new(
                &name,
                &mut self.diagnostics,
                &mut self.annotations,
                self.model,
                self.symbols,
                None,
            );
            if let Err(source) = extension.configure(&mut cx) {
                return Err(TypeCheckError::Configuration { extension: name, source });
            }
        }
        Ok(())
    }

    fn run_hooks(
        &mut self,
        cursor: Option<&Cursor<'m>>,
        mut hook: impl FnMut(&mut dyn TypeSystemExtension, &mut ExtensionContext<'_>),
    ) {
        for extension in self.registry.iter_mut() {
            let name = extension.name().to_string();
            let mut cx = ExtensionContext::new(
                &name,
                &mut self.diagnostics,
                &mut self.annotations,
                self.model,
                self.symbols,
                cursor,
            );
            hook(extension.as_mut(), &mut cx);
        }
    }

    fn error(&mut self, kind: DiagnosticKind, message: String, at: Option<&Location>) {
        self.diagnostics.push(Diagnostic::error(kind, message).at(at));
    }

    /// Resolves a written type, reporting failures at `at`.
    fn resolve(&mut self, module: &str, ty: &TypeUse, at: Option<&Location>) -> Type {
        match resolve_type(self.symbols, Some(module), ty) {
            Ok(t) => t,
            Err(e @ TypeError::Ambiguous { .. }) => {
                self.error(DiagnosticKind::AmbiguousName, e.to_string(), at);
                Type::Unknown
            }
            Err(e) => {
                self.error(DiagnosticKind::UnknownType, e.to_string(), at);
                Type::Unknown
            }
        }
    }

    /// Resolves a type whose failure was already reported at its declaration.
    fn resolve_quiet(&self, module: &str, ty: &TypeUse) -> Type {
        resolve_type(self.symbols, Some(module), ty).unwrap_or(Type::Unknown)
    }

    fn expect_assignable(&mut self, found: &Type, expected: &Type, what: &str, at: Option<&Location>) {
        if !is_assignable(self.symbols, found, expected) {
            self.error(
                DiagnosticKind::TypeMismatch,
                format!("{} has type {}, expected {}", what, found, expected),
                at,
            );
        }
    }

    fn check_interface(&mut self, module: &'m ModuleDecl, iface: &'m InterfaceDecl) {
        for sig in &iface.methods {
            self.resolve(&module.name, &sig.return_type, sig.location.as_ref());
            for p in &sig.params {
                self.resolve(&module.name, &p.ty, p.location.as_ref().or(sig.location.as_ref()));
            }
        }
    }

    fn check_class(&mut self, module: &'m ModuleDecl, class: &'m ClassDecl) {
        let class_name = format!("{}.{}", module.name, class.name);
        let _span = tracing::debug_span!("check_class", class = %class_name).entered();

        let mut cursor = Cursor {
            module: &module.name,
            class,
            class_name: class_name.clone(),
            fields: Vec::new(),
            body: None,
        };
        for p in &class.params {
            let ty = self.resolve(&module.name, &p.ty, p.location.as_ref().or(class.location.as_ref()));
            cursor.fields.push(Binding {
                name: p.name.clone(),
                node: NodeRef::ClassParam {
                    class: class_name.clone(),
                    param: p.name.clone(),
                },
                ty,
            });
        }
        for f in &class.fields {
            let ty = self.resolve(&module.name, &f.ty, f.location.as_ref());
            cursor.fields.push(Binding {
                name: f.name.clone(),
                node: NodeRef::Field {
                    class: class_name.clone(),
                    field: f.name.clone(),
                },
                ty,
            });
        }

        self.run_hooks(Some(&cursor), |ext, cx| ext.before_class(cx, class));

        self.check_interface_methods(&cursor);
        self.check_init(&mut cursor);
        for method in &class.methods {
            self.check_method(&mut cursor, method);
        }
        if let Some(recover) = &class.recover {
            self.check_body(&mut cursor, BodyState::new(RECOVER_BODY, None, Type::Unit), recover, &[]);
        }

        self.run_hooks(Some(&cursor), |ext, cx| ext.after_class(cx, class));
    }

    /// Every signature of an implemented interface needs a method of the same
    /// name; each missing name is reported once per class.
    fn check_interface_methods(&mut self, cursor: &Cursor<'m>) {
        let class = cursor.class;
        let mut reported = BTreeSet::new();
        for iface in self.symbols.implemented_interfaces(class) {
            for sig in &iface.methods {
                if class.method(&sig.name).is_none() && reported.insert(sig.name.as_str()) {
                    self.error(
                        DiagnosticKind::MissingInterfaceMethod,
                        format!(
                            "class {} does not implement method {} of interface {}",
                            cursor.class_name, sig.name, iface.name
                        ),
                        class.location.as_ref(),
                    );
                }
            }
        }
    }

    fn check_init(&mut self, cursor: &mut Cursor<'m>) {
        let class = cursor.class;
        let prelude: Vec<Stmt> = class
            .fields
            .iter()
            .filter_map(|f| {
                f.init.as_ref().map(|init| Stmt {
                    kind: StmtKind::Assign {
                        target: LValue::Field(f.name.clone()),
                        value: init.clone(),
                    },
                    location: f.location.clone(),
                })
            })
            .collect();
        let empty = Block::default();
        let block = class.init.as_ref().unwrap_or(&empty);
        self.check_body(cursor, BodyState::new(INIT_BODY, None, Type::Unit), block, &prelude);
    }

    fn check_method(&mut self, cursor: &mut Cursor<'m>, method: &'m MethodImpl) {
        let mut current = Some(method);
        let mut depth = 0;
        while let Some(m) = current {
            let body_name = if depth == 0 {
                m.name().to_string()
            } else {
                format!("{}#original{}", m.name(), depth)
            };
            let at = m.sig.location.as_ref();
            let ret = self.resolve(cursor.module, &m.sig.return_type, at);
            let mut body = BodyState::new(body_name.clone(), Some(m), ret);
            for p in &m.sig.params {
                let ty = self.resolve(cursor.module, &p.ty, p.location.as_ref().or(at));
                body.scopes[0].push(Binding {
                    name: p.name.clone(),
                    node: NodeRef::Param {
                        class: cursor.class_name.clone(),
                        body: body_name.clone(),
                        param: p.name.clone(),
                    },
                    ty,
                });
            }
            self.check_body(cursor, body, &m.body, &[]);

            current = m.original.as_deref();
            depth += 1;
        }
    }

    fn check_body(&mut self, cursor: &mut Cursor<'m>, body: BodyState<'m>, block: &Block, prelude: &[Stmt]) {
        cursor.body = Some(body);
        self.run_hooks(Some(&*cursor), |ext, cx| ext.before_method_body(cx, block));
        for stmt in prelude {
            self.check_stmt(cursor, stmt);
        }
        self.check_block(cursor, block);
        self.run_hooks(Some(&*cursor), |ext, cx| ext.after_method_body(cx, block));
        cursor.body = None;
    }

    fn check_block(&mut self, cursor: &mut Cursor<'m>, block: &Block) {
        if let Some(body) = cursor.body.as_mut() {
            body.scopes.push(Vec::new());
        }
        for stmt in &block.stmts {
            self.check_stmt(cursor, stmt);
        }
        if let Some(body) = cursor.body.as_mut() {
            body.scopes.pop();
        }
    }

    fn check_stmt(&mut self, cursor: &mut Cursor<'m>, stmt: &Stmt) {
        let at = stmt.location.as_ref();
        match &stmt.kind {
            StmtKind::Skip => {}
            StmtKind::Return(value) => {
                let found = self.check_expr(cursor, value);
                let expected = cursor
                    .body
                    .as_ref()
                    .map(|b| b.return_type.clone())
                    .unwrap_or(Type::Unit);
                self.expect_assignable(&found, &expected, "returned value", at);
            }
            StmtKind::VarDecl { ty, name, init } => {
                let declared = self.resolve(cursor.module, ty, at);
                if let Some(init) = init {
                    let found = self.check_expr(cursor, init);
                    self.expect_assignable(&found, &declared, &format!("initial value of {}", name), at);
                }
                declare_local(cursor, name, declared);
            }
            StmtKind::Assign { target, value } => {
                let found = self.check_expr(cursor, value);
                let expected = match target {
                    LValue::Var(name) => match cursor.lookup(name) {
                        Some(b) => Some(b.ty.clone()),
                        None => {
                            self.error(
                                DiagnosticKind::UnknownVariable,
                                format!("variable {} is not declared", name),
                                at,
                            );
                            None
                        }
                    },
                    LValue::Field(name) => match cursor.field(name) {
                        Some(b) => Some(b.ty.clone()),
                        None => {
                            self.error(
                                DiagnosticKind::UnknownField,
                                format!("class {} has no field {}", cursor.class_name, name),
                                at,
                            );
                            None
                        }
                    },
                };
                if let Some(expected) = expected {
                    self.expect_assignable(&found, &expected, "assigned value", at);
                }
            }
            StmtKind::If { cond, then, otherwise } => {
                let found = self.check_expr(cursor, cond);
                self.expect_assignable(&found, &Type::Bool, "condition", at);
                self.check_block(cursor, then);
                if let Some(otherwise) = otherwise {
                    self.check_block(cursor, otherwise);
                }
            }
            StmtKind::While { cond, body } => {
                let found = self.check_expr(cursor, cond);
                self.expect_assignable(&found, &Type::Bool, "loop condition", at);
                self.check_block(cursor, body);
            }
            StmtKind::Expr(e) => {
                self.check_expr(cursor, e);
            }
        }
        self.run_hooks(Some(&*cursor), |ext, cx| ext.check_statement(cx, stmt));
    }

    /// Types `expr`, records it in the body state and shows it to the
    /// extensions.
    fn check_expr(&mut self, cursor: &mut Cursor<'m>, expr: &Expr) -> Type {
        let ty = self.type_expr(cursor, expr);
        let Some(body) = cursor.body.as_mut() else {
            return ty;
        };
        let node = NodeRef::Expr {
            class: cursor.class_name.clone(),
            body: body.name.clone(),
            index: body.next_expr,
        };
        body.next_expr += 1;
        body.exprs.insert(expr as *const Expr, (node.clone(), ty.clone()));
        self.run_hooks(Some(&*cursor), |ext, cx| ext.check_expression(cx, expr, &ty, &node));
        ty
    }

    fn type_expr(&mut self, cursor: &mut Cursor<'m>, expr: &Expr) -> Type {
        let at = expr.location.as_ref();
        match &expr.kind {
            ExprKind::Bool(_) => Type::Bool,
            ExprKind::Int(_) => Type::Int,
            ExprKind::Str(_) => Type::String,
            ExprKind::Null => Type::Null,
            ExprKind::This => Type::Class(cursor.class_name.clone()),
            ExprKind::Var(name) => match cursor.lookup(name) {
                Some(b) => b.ty.clone(),
                None => {
                    self.error(
                        DiagnosticKind::UnknownVariable,
                        format!("variable {} is not declared", name),
                        at,
                    );
                    Type::Unknown
                }
            },
            ExprKind::Field(name) => match cursor.field(name) {
                Some(b) => b.ty.clone(),
                None => {
                    self.error(
                        DiagnosticKind::UnknownField,
                        format!("class {} has no field {}", cursor.class_name, name),
                        at,
                    );
                    Type::Unknown
                }
            },
            ExprKind::Unary { op, operand } => {
                let found = self.check_expr(cursor, operand);
                let expected = match op {
                    UnaryOp::Not => Type::Bool,
                    UnaryOp::Neg => Type::Int,
                };
                self.expect_assignable(&found, &expected, "operand", at);
                expected
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let l = self.check_expr(cursor, lhs);
                let r = self.check_expr(cursor, rhs);
                self.type_binary(*op, &l, &r, at)
            }
            ExprKind::Call {
                target,
                method,
                args,
                asynchronous,
            } => {
                let receiver = self.check_expr(cursor, target);
                let found: Vec<Type> = args.iter().map(|a| self.check_expr(cursor, a)).collect();
                let Some((sig, sig_module)) = self.lookup_method(&receiver, method, at) else {
                    return Type::Unknown;
                };
                if let Some(body) = cursor.body.as_mut() {
                    body.calls.insert(expr as *const Expr, sig);
                }
                self.check_args(&format!("method {}", method), &sig.params, sig_module, &found, at);
                let ret = self.resolve_quiet(sig_module, &sig.return_type);
                if *asynchronous {
                    Type::Fut(Box::new(ret))
                } else {
                    ret
                }
            }
            ExprKind::Get(future) => match self.check_expr(cursor, future) {
                Type::Fut(inner) => *inner,
                Type::Unknown => Type::Unknown,
                other => {
                    self.error(
                        DiagnosticKind::TypeMismatch,
                        format!("get on a value of type {}, expected a future", other),
                        at,
                    );
                    Type::Unknown
                }
            },
            ExprKind::New { class, args, .. } => {
                let found: Vec<Type> = args.iter().map(|a| self.check_expr(cursor, a)).collect();
                match self.symbols.classes.resolve_entry(Some(cursor.module), class) {
                    Ok(entry) => {
                        self.check_args(&format!("class {}", class), &entry.decl.params, entry.module, &found, at);
                        Type::Class(format!("{}.{}", entry.module, entry.decl.name))
                    }
                    Err(LookupError::Unresolved) => {
                        self.error(
                            DiagnosticKind::UnknownClass,
                            format!("class {} is not declared", class),
                            at,
                        );
                        Type::Unknown
                    }
                    Err(e) => {
                        self.error(DiagnosticKind::AmbiguousName, format!("class {} is {}", class, e), at);
                        Type::Unknown
                    }
                }
            }
            ExprKind::Original(args) => {
                let found: Vec<Type> = args.iter().map(|a| self.check_expr(cursor, a)).collect();
                match cursor.body.as_ref().and_then(|b| b.method) {
                    Some(m) => {
                        self.check_args("original", &m.sig.params, cursor.module, &found, at);
                        self.resolve_quiet(cursor.module, &m.sig.return_type)
                    }
                    None => {
                        self.error(
                            DiagnosticKind::UnknownMethod,
                            "original() used outside of a method".to_string(),
                            at,
                        );
                        Type::Unknown
                    }
                }
            }
        }
    }

    fn type_binary(&mut self, op: BinaryOp, l: &Type, r: &Type, at: Option<&Location>) -> Type {
        let operand = format!("operand of {}", op.symbol());
        match op {
            BinaryOp::And | BinaryOp::Or => {
                self.expect_assignable(l, &Type::Bool, &operand, at);
                self.expect_assignable(r, &Type::Bool, &operand, at);
                Type::Bool
            }
            BinaryOp::Eq | BinaryOp::Ne => {
                if !is_comparable(self.symbols, l, r) {
                    self.error(
                        DiagnosticKind::TypeMismatch,
                        format!("cannot compare {} with {}", l, r),
                        at,
                    );
                }
                Type::Bool
            }
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                self.expect_assignable(l, &Type::Int, &operand, at);
                self.expect_assignable(r, &Type::Int, &operand, at);
                Type::Bool
            }
            BinaryOp::Add if *l == Type::String || *r == Type::String => {
                self.expect_assignable(l, &Type::String, &operand, at);
                self.expect_assignable(r, &Type::String, &operand, at);
                Type::String
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                self.expect_assignable(l, &Type::Int, &operand, at);
                self.expect_assignable(r, &Type::Int, &operand, at);
                Type::Int
            }
        }
    }

    /// Finds the signature called on a receiver of type `receiver`, with the
    /// module its types are written in.
    fn lookup_method(
        &mut self,
        receiver: &Type,
        method: &str,
        at: Option<&Location>,
    ) -> Option<(&'m MethodSig, &'m str)> {
        match receiver {
            Type::Unknown => None,
            Type::Interface(name) => {
                let entry = self.symbols.interfaces.resolve_entry(None, name).ok()?;
                let found = self.symbols.find_interface_method(entry.decl, method);
                if found.is_none() {
                    self.error(
                        DiagnosticKind::UnknownMethod,
                        format!("interface {} has no method {}", name, method),
                        at,
                    );
                }
                found.map(|sig| (sig, entry.module))
            }
            Type::Class(name) => {
                let entry = self.symbols.classes.resolve_entry(None, name).ok()?;
                if let Some(m) = entry.decl.method(method) {
                    return Some((&m.sig, entry.module));
                }
                let inherited = self
                    .symbols
                    .implemented_interfaces(entry.decl)
                    .into_iter()
                    .find_map(|i| i.methods.iter().find(|s| s.name == method));
                if inherited.is_none() {
                    self.error(
                        DiagnosticKind::UnknownMethod,
                        format!("class {} has no method {}", name, method),
                        at,
                    );
                }
                inherited.map(|sig| (sig, entry.module))
            }
            other => {
                self.error(
                    DiagnosticKind::TypeMismatch,
                    format!("cannot call method {} on a value of type {}", method, other),
                    at,
                );
                None
            }
        }
    }

    fn check_args(&mut self, what: &str, params: &[Param], module: &str, found: &[Type], at: Option<&Location>) {
        if params.len() != found.len() {
            self.error(
                DiagnosticKind::WrongArgumentCount,
                format!("{} expects {} argument(s), found {}", what, params.len(), found.len()),
                at,
            );
            return;
        }
        for (param, ty) in params.iter().zip(found) {
            let expected = self.resolve_quiet(module, &param.ty);
            self.expect_assignable(ty, &expected, &format!("argument {} of {}", param.name, what), at);
        }
    }
}

fn declare_local(cursor: &mut Cursor<'_>, name: &str, ty: Type) {
    let class = cursor.class_name.clone();
    let Some(body) = cursor.body.as_mut() else {
        return;
    };
    let node = NodeRef::Local {
        class,
        body: body.name.clone(),
        name: name.to_string(),
        index: body.next_local,
    };
    body.next_local += 1;
    if let Some(scope) = body.scopes.last_mut() {
        scope.push(Binding {
            name: name.to_string(),
            node,
            ty,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::AnnotationValue;
    use abs_grammar::parse_unit;

    fn model(src: &str) -> Model {
        Model::new(vec![parse_unit(None, src).unwrap()])
    }

    fn check(src: &str) -> Diagnostics {
        type_check(&model(src), &mut ExtensionRegistry::new())
            .unwrap()
            .diagnostics
    }

    #[test]
    fn test_clean_program() {
        let diags = check(
            r#"module M;
            interface Counter { Int countTo(Int n); }
            class CounterImpl(Int start) implements Counter {
                Int total = start;
                Int countTo(Int n) {
                    Int i = 0;
                    while (i < n) { i = i + 1; this.total = this.total + i; }
                    return total;
                }
                Unit run() {
                    Counter other = new local CounterImpl(1);
                    Fut<Int> f = other!countTo(10);
                    Int r = f.get;
                    Bool same = other == this;
                    String s = "a" + "b";
                }
            }"#,
        );
        assert!(diags.is_empty(), "{:?}", diags);
    }

    #[test]
    fn test_missing_interface_method_reported_once() {
        let diags = check(
            r#"module M;
            interface A { Unit m(); }
            interface B extends A { Unit m(); Unit n(); }
            class C implements A, B { Unit n() { skip; } }"#,
        );
        assert_eq!(diags.count_of(DiagnosticKind::MissingInterfaceMethod), 1);
        assert!(diags.iter().next().unwrap().message.contains("method m"));
    }

    #[test]
    fn test_core_errors() {
        let diags = check(
            r#"module M;
            interface I { Bool f(Int x); }
            class C implements I {
                Nope field;
                Bool f(Int x) {
                    if (x) { skip; }
                    y = 1;
                    I other = new C();
                    other.f(1, 2);
                    other.g();
                    Int bad = other.f(true);
                    return 1;
                }
            }"#,
        );
        assert_eq!(diags.count_of(DiagnosticKind::UnknownType), 1);
        assert_eq!(diags.count_of(DiagnosticKind::UnknownVariable), 1);
        assert_eq!(diags.count_of(DiagnosticKind::WrongArgumentCount), 1);
        assert_eq!(diags.count_of(DiagnosticKind::UnknownMethod), 1);
        // if (x), Int bad = <Bool>, f(true), return 1
        assert_eq!(diags.count_of(DiagnosticKind::TypeMismatch), 4);
    }

    #[test]
    fn test_unknown_class_and_field() {
        let diags = check(
            r#"module M;
            class C {
                Unit m() { this.missing = 1; Int v = this.other; new Ghost(); }
            }"#,
        );
        assert_eq!(diags.count_of(DiagnosticKind::UnknownField), 2);
        assert_eq!(diags.count_of(DiagnosticKind::UnknownClass), 1);
    }

    #[test]
    fn test_original_uses_current_signature() {
        let mut m = model(
            r#"module M;
            class C { Int f(Int x) { return original(x) + 1; } }"#,
        );
        let base = MethodImpl::new(
            m.classes().next().unwrap().methods[0].sig.clone(),
            Block::new(vec![Stmt::new(StmtKind::Return(Expr::new(ExprKind::Var("x".into()))))]),
        );
        m.units[0].modules[0].classes_mut().next().unwrap().methods[0].original = Some(Box::new(base));
        let outcome = type_check(&m, &mut ExtensionRegistry::new()).unwrap();
        assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl TypeSystemExtension for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn before_class(&mut self, cx: &mut ExtensionContext<'_>, _class: &ClassDecl) {
            self.events.push(format!("class {}", cx.class_name().unwrap_or("?")));
        }

        fn before_method_body(&mut self, cx: &mut ExtensionContext<'_>, _body: &Block) {
            self.events.push(format!("body {}", cx.body_name().unwrap_or("?")));
        }

        fn check_statement(&mut self, cx: &mut ExtensionContext<'_>, stmt: &Stmt) {
            if let StmtKind::Return(e) = &stmt.kind {
                let ty = cx.type_of(e).cloned().unwrap_or(Type::Unknown);
                self.events.push(format!("return {}", ty));
                if let Some(node) = cx.node_of(e).cloned() {
                    cx.annotate(node, AnnotationValue::Text(ty.to_string()));
                }
            }
        }

        fn check_expression(&mut self, cx: &mut ExtensionContext<'_>, expr: &Expr, _ty: &Type, _node: &NodeRef) {
            if let Some(sig) = cx.call_target(expr) {
                self.events.push(format!("call {}", sig.name));
            }
        }

        fn finish(&mut self, cx: &mut ExtensionContext<'_>) {
            cx.warn(format!("{} events", self.events.len()), None);
        }
    }

    #[test]
    fn test_extension_hooks_follow_traversal() {
        let m = model(
            r#"module M;
            interface I { Int read(); }
            class C implements I {
                Int v = 1;
                Int read() { return this.v; }
                Int twice() { return this.read() + this.read(); }
            }"#,
        );
        let mut registry = ExtensionRegistry::new();
        registry.register(Box::new(Recorder::default())).unwrap();
        let outcome = type_check(&m, &mut registry).unwrap();

        assert_eq!(outcome.diagnostics.len(), 1);
        let finding = outcome.diagnostics.iter().next().unwrap();
        assert_eq!(finding.origin.as_deref(), Some("recorder"));
        assert_eq!(finding.message, "8 events");

        let annotated: Vec<String> = outcome
            .annotations
            .for_extension("recorder")
            .map(|(node, value)| format!("{} = {}", node, value))
            .collect();
        assert_eq!(annotated, vec!["M.C.read#0 = Int", "M.C.twice#4 = Int"]);
    }

    struct Picky;

    impl TypeSystemExtension for Picky {
        fn name(&self) -> &str {
            "picky"
        }

        fn configure(&mut self, _cx: &mut ExtensionContext<'_>) -> Result<(), ExtensionError> {
            Err(ExtensionError::Configuration("no".into()))
        }
    }

    #[test]
    fn test_configuration_failure_aborts() {
        let mut registry = ExtensionRegistry::new();
        registry.register(Box::new(Picky)).unwrap();
        let err = type_check(&model("module M;"), &mut registry).unwrap_err();
        assert_eq!(
            err,
            TypeCheckError::Configuration {
                extension: "picky".into(),
                source: ExtensionError::Configuration("no".into()),
            }
        );
    }
}
