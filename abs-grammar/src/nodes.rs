//! Program Tree
//!
//! In-memory representation of parsed ABS compilation units. The tree is pure
//! data: every other component (symbol table, trait composition, delta
//! application, type checking) reads it, and product derivation produces a new
//! tree instead of editing an existing one.
//!
//! Ownership is strictly hierarchical. Cross references between declarations
//! (`extends`, `implements`, trait references, delta targets) are plain names
//! and are resolved through [`SymbolTable`](crate::symbol_table::SymbolTable).

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// A position in a source file (1-based line and column).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Location {
    pub file: Option<String>,
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(file: Option<String>, line: usize, column: usize) -> Self {
        Self { file, line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}:{}", file, self.line, self.column),
            None => write!(f, "{}:{}", self.line, self.column),
        }
    }
}

/// The whole program: every compilation unit, standard library included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Model {
    pub units: Vec<CompilationUnit>,
}

impl Model {
    pub fn new(units: Vec<CompilationUnit>) -> Self {
        Self { units }
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleDecl> {
        self.units.iter().flat_map(|u| u.modules.iter())
    }

    pub fn modules_mut(&mut self) -> impl Iterator<Item = &mut ModuleDecl> {
        self.units.iter_mut().flat_map(|u| u.modules.iter_mut())
    }

    pub fn module(&self, name: &str) -> Option<&ModuleDecl> {
        self.modules().find(|m| m.name == name)
    }

    pub fn module_mut(&mut self, name: &str) -> Option<&mut ModuleDecl> {
        self.modules_mut().find(|m| m.name == name)
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &InterfaceDecl> {
        self.modules().flat_map(|m| m.interfaces())
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassDecl> {
        self.modules().flat_map(|m| m.classes())
    }

    pub fn traits(&self) -> impl Iterator<Item = &TraitDecl> {
        self.modules().flat_map(|m| m.traits())
    }

    pub fn deltas(&self) -> impl Iterator<Item = &DeltaDecl> {
        self.modules().flat_map(|m| m.deltas())
    }

    pub fn products(&self) -> impl Iterator<Item = &ProductDecl> {
        self.modules().flat_map(|m| m.products())
    }
}

/// One parsed source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompilationUnit {
    pub file: Option<String>,
    pub modules: Vec<ModuleDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleDecl {
    pub name: String,
    /// Declarations in source order.
    pub decls: Vec<Decl>,
    pub location: Option<Location>,
}

impl ModuleDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            decls: Vec::new(),
            location: None,
        }
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &InterfaceDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Interface(i) => Some(i),
            _ => None,
        })
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Class(c) => Some(c),
            _ => None,
        })
    }

    pub fn classes_mut(&mut self) -> impl Iterator<Item = &mut ClassDecl> {
        self.decls.iter_mut().filter_map(|d| match d {
            Decl::Class(c) => Some(c),
            _ => None,
        })
    }

    pub fn traits(&self) -> impl Iterator<Item = &TraitDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Trait(t) => Some(t),
            _ => None,
        })
    }

    pub fn deltas(&self) -> impl Iterator<Item = &DeltaDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Delta(d) => Some(d),
            _ => None,
        })
    }

    pub fn products(&self) -> impl Iterator<Item = &ProductDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Product(p) => Some(p),
            _ => None,
        })
    }

    /// Index of the declaration of `kind` named `name`, if any.
    pub fn position(&self, kind: DeclKind, name: &str) -> Option<usize> {
        self.decls
            .iter()
            .position(|d| d.kind() == kind && d.name() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Decl {
    Interface(InterfaceDecl),
    Class(ClassDecl),
    Trait(TraitDecl),
    Delta(DeltaDecl),
    Product(ProductDecl),
}

impl Decl {
    pub fn name(&self) -> &str {
        match self {
            Decl::Interface(i) => &i.name,
            Decl::Class(c) => &c.name,
            Decl::Trait(t) => &t.name,
            Decl::Delta(d) => &d.name,
            Decl::Product(p) => &p.name,
        }
    }

    pub fn kind(&self) -> DeclKind {
        match self {
            Decl::Interface(_) => DeclKind::Interface,
            Decl::Class(_) => DeclKind::Class,
            Decl::Trait(_) => DeclKind::Trait,
            Decl::Delta(_) => DeclKind::Delta,
            Decl::Product(_) => DeclKind::Product,
        }
    }

    pub fn location(&self) -> Option<&Location> {
        match self {
            Decl::Interface(i) => i.location.as_ref(),
            Decl::Class(c) => c.location.as_ref(),
            Decl::Trait(t) => t.location.as_ref(),
            Decl::Delta(d) => d.location.as_ref(),
            Decl::Product(p) => p.location.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DeclKind {
    Interface,
    Class,
    Trait,
    Delta,
    Product,
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeclKind::Interface => "interface",
            DeclKind::Class => "class",
            DeclKind::Trait => "trait",
            DeclKind::Delta => "delta",
            DeclKind::Product => "product",
        };
        write!(f, "{}", s)
    }
}

/// A use of a type, e.g. `Fut<Bool>` or `[Near] Service`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TypeUse {
    pub name: String,
    pub args: Vec<TypeUse>,
    /// Bracketed annotations written before the type, in source order.
    pub annotations: Vec<String>,
}

impl TypeUse {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a == name)
    }
}

impl fmt::Display for TypeUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Param {
    pub name: String,
    pub ty: TypeUse,
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodSig {
    pub name: String,
    pub return_type: TypeUse,
    pub params: Vec<Param>,
    pub location: Option<Location>,
}

impl MethodSig {
    pub fn new(name: impl Into<String>, return_type: TypeUse) -> Self {
        Self {
            name: name.into(),
            return_type,
            params: Vec::new(),
            location: None,
        }
    }
}

/// A method with a body.
///
/// `original` holds the implementation this method replaced through a trait
/// `modifies` or a delta `modifies`. Calls to `original(..)` in `body` run
/// that predecessor; a chain of modifications is a chain of predecessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodImpl {
    pub sig: MethodSig,
    pub body: Block,
    pub original: Option<Box<MethodImpl>>,
}

impl MethodImpl {
    pub fn new(sig: MethodSig, body: Block) -> Self {
        Self {
            sig,
            body,
            original: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.sig.name
    }

    /// Whether the body (not its predecessors) contains an `original(..)` call.
    pub fn calls_original(&self) -> bool {
        self.body.contains_original()
    }

    /// Number of predecessors reachable through `original`.
    pub fn modification_depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.original.as_deref();
        while let Some(m) = current {
            depth += 1;
            current = m.original.as_deref();
        }
        depth
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeUse,
    pub init: Option<Expr>,
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceDecl {
    pub name: String,
    pub extends: Vec<String>,
    pub methods: Vec<MethodSig>,
    pub location: Option<Location>,
}

impl InterfaceDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extends: Vec::new(),
            methods: Vec::new(),
            location: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassDecl {
    pub name: String,
    /// Class parameters; each one is also a field of the class.
    pub params: Vec<Param>,
    pub fields: Vec<FieldDecl>,
    pub init: Option<Block>,
    pub recover: Option<Block>,
    pub implements: Vec<String>,
    /// Trait-use clauses, applied in order on top of `methods`.
    pub trait_uses: Vec<TraitUse>,
    pub methods: Vec<MethodImpl>,
    pub location: Option<Location>,
}

impl ClassDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            fields: Vec::new(),
            init: None,
            recover: None,
            implements: Vec::new(),
            trait_uses: Vec::new(),
            methods: Vec::new(),
            location: None,
        }
    }

    pub fn method(&self, name: &str) -> Option<&MethodImpl> {
        self.methods.iter().find(|m| m.name() == name)
    }

    /// The `run` method, started when an object of this class is created.
    pub fn run_method(&self) -> Option<&MethodImpl> {
        self.method("run")
    }

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Type of a field or class parameter.
    pub fn field_type(&self, name: &str) -> Option<&TypeUse> {
        self.field(name)
            .map(|f| &f.ty)
            .or_else(|| self.param(name).map(|p| &p.ty))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraitDecl {
    pub name: String,
    pub expr: TraitExpr,
    pub location: Option<Location>,
}

/// Trait algebra. The right operand of `Adds` and `Modifies` is any trait
/// expression that resolves to a method set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TraitExpr {
    Ref {
        name: String,
        location: Option<Location>,
    },
    Set(Vec<MethodImpl>),
    Adds(Box<TraitExpr>, Box<TraitExpr>),
    Modifies(Box<TraitExpr>, Box<TraitExpr>),
    Removes(Box<TraitExpr>, Vec<MethodSig>),
}

impl TraitExpr {
    pub fn reference(name: impl Into<String>) -> Self {
        TraitExpr::Ref {
            name: name.into(),
            location: None,
        }
    }

    /// Names of every trait referenced anywhere in this expression.
    pub fn references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TraitExpr::Ref { name, .. } => out.push(name),
            TraitExpr::Set(_) => {}
            TraitExpr::Adds(base, extra) | TraitExpr::Modifies(base, extra) => {
                base.collect_references(out);
                extra.collect_references(out);
            }
            TraitExpr::Removes(base, _) => base.collect_references(out),
        }
    }
}

/// A class's `uses` clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TraitUse {
    Adds(TraitExpr),
    Modifies(TraitExpr),
    Removes(Vec<MethodSig>),
}

impl TraitUse {
    pub fn expr(&self) -> Option<&TraitExpr> {
        match self {
            TraitUse::Adds(e) | TraitUse::Modifies(e) => Some(e),
            TraitUse::Removes(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeltaDecl {
    pub name: String,
    /// Module receiving added declarations.
    pub uses: Option<String>,
    pub after: Vec<String>,
    pub before: Vec<String>,
    pub condition: Option<AppCond>,
    pub ops: Vec<DeltaOp>,
    pub location: Option<Location>,
}

impl DeltaDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uses: None,
            after: Vec::new(),
            before: Vec::new(),
            condition: None,
            ops: Vec::new(),
            location: None,
        }
    }
}

/// Application condition over feature names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AppCond {
    Feature(String),
    Not(Box<AppCond>),
    And(Box<AppCond>, Box<AppCond>),
    Or(Box<AppCond>, Box<AppCond>),
}

impl AppCond {
    pub fn holds(&self, features: &BTreeSet<String>) -> bool {
        match self {
            AppCond::Feature(f) => features.contains(f),
            AppCond::Not(c) => !c.holds(features),
            AppCond::And(a, b) => a.holds(features) && b.holds(features),
            AppCond::Or(a, b) => a.holds(features) || b.holds(features),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DeltaOp {
    AddInterface(InterfaceDecl),
    AddClass(ClassDecl),
    AddTrait(TraitDecl),
    RemoveInterface {
        name: String,
        location: Option<Location>,
    },
    RemoveClass {
        name: String,
        location: Option<Location>,
    },
    RemoveTrait {
        name: String,
        location: Option<Location>,
    },
    ModifyInterface(InterfaceModifier),
    ModifyClass(ClassModifier),
    /// Replaces the expression of an existing trait.
    ModifyTrait {
        name: String,
        expr: TraitExpr,
        location: Option<Location>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceModifier {
    pub name: String,
    pub ops: Vec<InterfaceOp>,
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum InterfaceOp {
    AddMethod(MethodSig),
    RemoveMethod(MethodSig),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassModifier {
    pub name: String,
    pub add_implements: Vec<String>,
    pub ops: Vec<ClassOp>,
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ClassOp {
    AddMethod(MethodImpl),
    ModifyMethod(MethodImpl),
    RemoveMethod(MethodSig),
    AddField(FieldDecl),
    RemoveField {
        name: String,
        location: Option<Location>,
    },
    AddTraitUse(TraitUse),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductDecl {
    pub name: String,
    pub features: Vec<String>,
    pub location: Option<Location>,
}

impl ProductDecl {
    pub fn feature_set(&self) -> BTreeSet<String> {
        self.features.iter().cloned().collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self { stmts }
    }

    pub fn contains_original(&self) -> bool {
        self.stmts.iter().any(Stmt::contains_original)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub location: Option<Location>,
}

impl Stmt {
    pub fn new(kind: StmtKind) -> Self {
        Self {
            kind,
            location: None,
        }
    }

    pub fn contains_original(&self) -> bool {
        match &self.kind {
            StmtKind::Skip => false,
            StmtKind::Return(e) | StmtKind::Expr(e) => e.contains_original(),
            StmtKind::VarDecl { init, .. } => init.as_ref().is_some_and(Expr::contains_original),
            StmtKind::Assign { value, .. } => value.contains_original(),
            StmtKind::If {
                cond,
                then,
                otherwise,
            } => {
                cond.contains_original()
                    || then.contains_original()
                    || otherwise.as_ref().is_some_and(Block::contains_original)
            }
            StmtKind::While { cond, body } => cond.contains_original() || body.contains_original(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StmtKind {
    Skip,
    Return(Expr),
    VarDecl {
        ty: TypeUse,
        name: String,
        init: Option<Expr>,
    },
    Assign {
        target: LValue,
        value: Expr,
    },
    If {
        cond: Expr,
        then: Block,
        otherwise: Option<Block>,
    },
    While {
        cond: Expr,
        body: Block,
    },
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LValue {
    Var(String),
    /// `this.name`
    Field(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub location: Option<Location>,
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Self {
            kind,
            location: None,
        }
    }

    pub fn contains_original(&self) -> bool {
        match &self.kind {
            ExprKind::Original(_) => true,
            ExprKind::Bool(_)
            | ExprKind::Int(_)
            | ExprKind::Str(_)
            | ExprKind::Null
            | ExprKind::This
            | ExprKind::Var(_)
            | ExprKind::Field(_) => false,
            ExprKind::Unary { operand, .. } => operand.contains_original(),
            ExprKind::Binary { lhs, rhs, .. } => lhs.contains_original() || rhs.contains_original(),
            ExprKind::Call { target, args, .. } => {
                target.contains_original() || args.iter().any(Expr::contains_original)
            }
            ExprKind::Get(e) => e.contains_original(),
            ExprKind::New { args, .. } => args.iter().any(Expr::contains_original),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ExprKind {
    Bool(bool),
    Int(i64),
    Str(String),
    Null,
    This,
    Var(String),
    /// `this.name`
    Field(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `target.method(args)` or, when `asynchronous`, `target!method(args)`.
    Call {
        target: Box<Expr>,
        method: String,
        args: Vec<Expr>,
        asynchronous: bool,
    },
    /// `future.get`
    Get(Box<Expr>),
    New {
        class: String,
        args: Vec<Expr>,
        local: bool,
    },
    Original(Vec<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOp {
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
        }
    }

    pub fn from_symbol(s: &str) -> Option<Self> {
        let op = match s {
            "&&" => BinaryOp::And,
            "||" => BinaryOp::Or,
            "==" => BinaryOp::Eq,
            "!=" => BinaryOp::Ne,
            "<" => BinaryOp::Lt,
            "<=" => BinaryOp::Le,
            ">" => BinaryOp::Gt,
            ">=" => BinaryOp::Ge,
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Mod,
            _ => return None,
        };
        Some(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ret(kind: ExprKind) -> Block {
        Block::new(vec![Stmt::new(StmtKind::Return(Expr::new(kind)))])
    }

    #[test]
    fn test_contains_original_nested() {
        let body = ret(ExprKind::Unary {
            op: UnaryOp::Not,
            operand: Box::new(Expr::new(ExprKind::Original(vec![]))),
        });
        assert!(body.contains_original());
        assert!(!ret(ExprKind::Bool(true)).contains_original());
    }

    #[test]
    fn test_modification_depth() {
        let sig = MethodSig::new("f", TypeUse::named("Bool"));
        let base = MethodImpl::new(sig.clone(), ret(ExprKind::Bool(false)));
        let mut once = MethodImpl::new(sig.clone(), ret(ExprKind::Original(vec![])));
        once.original = Some(Box::new(base.clone()));
        let mut twice = MethodImpl::new(sig, ret(ExprKind::Original(vec![])));
        twice.original = Some(Box::new(once));
        assert_eq!(base.modification_depth(), 0);
        assert_eq!(twice.modification_depth(), 2);
    }

    #[test]
    fn test_app_cond_holds() {
        let features: BTreeSet<String> = ["A".to_string()].into_iter().collect();
        let cond = AppCond::And(
            Box::new(AppCond::Feature("A".into())),
            Box::new(AppCond::Not(Box::new(AppCond::Feature("B".into())))),
        );
        assert!(cond.holds(&features));
        assert!(!AppCond::Feature("B".into()).holds(&features));
    }

    #[test]
    fn test_type_use_display() {
        let mut fut = TypeUse::named("Fut");
        fut.args.push(TypeUse::named("Bool"));
        assert_eq!(fut.to_string(), "Fut<Bool>");
    }

    #[test]
    fn test_trait_expr_references() {
        let expr = TraitExpr::Modifies(
            Box::new(TraitExpr::Adds(
                Box::new(TraitExpr::reference("A")),
                Box::new(TraitExpr::Set(vec![])),
            )),
            Box::new(TraitExpr::reference("B")),
        );
        assert_eq!(expr.references(), vec!["A", "B"]);
    }
}
