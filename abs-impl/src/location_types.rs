//! Location-Type Inference
//!
//! A [`TypeSystemExtension`] that infers, for every reference-typed
//! declaration, whether the object it holds lives in the same concurrent
//! object group as the current one (`Near`), in another one (`Far`), or
//! either (`Somewhere`).
//!
//! During the traversal it records one term per reference-typed expression
//! and a flow for every value stored into a declaration. At
//! [`finish`](TypeSystemExtension::finish) the flows are solved by fixpoint
//! iteration, every declaration is annotated with its solution and the
//! recorded checks are evaluated into warnings.
//!
//! Declarations written with an annotation (`[Near] I x`) are fixed to it;
//! method parameters and return values without one take the configured
//! default, since a caller may pass anything allowed by the signature.

use crate::extension::{AnnotationValue, ExtensionContext, ExtensionError, NodeRef, TypeSystemExtension};
use crate::types::Type;
use abs_grammar::diagnostics::{Diagnostic, DiagnosticKind};
use abs_grammar::nodes::{Block, ClassDecl, Expr, ExprKind, LValue, Location, Stmt, StmtKind, TypeUse};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

pub const EXTENSION_NAME: &str = "location-types";

/// `Bottom ≤ Near, Far ≤ Somewhere`, and `ParametricFar(_) ≤ Far`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum LocationType {
    Bottom,
    Near,
    Far,
    Somewhere,
    /// A far location created at one particular `new` site.
    ParametricFar(u32),
}

impl LocationType {
    pub const USER_TYPES: [LocationType; 3] = [LocationType::Near, LocationType::Far, LocationType::Somewhere];

    /// Whether users may write this type as an annotation or default.
    pub fn is_user_type(self) -> bool {
        Self::USER_TYPES.contains(&self)
    }

    fn is_far(self) -> bool {
        matches!(self, LocationType::Far | LocationType::ParametricFar(_))
    }

    pub fn is_subtype_of(self, other: LocationType) -> bool {
        self == other
            || self == LocationType::Bottom
            || other == LocationType::Somewhere
            || (matches!(self, LocationType::ParametricFar(_)) && other == LocationType::Far)
    }

    /// Least upper bound.
    pub fn join(self, other: LocationType) -> LocationType {
        if self.is_subtype_of(other) {
            other
        } else if other.is_subtype_of(self) {
            self
        } else if self.is_far() && other.is_far() {
            LocationType::Far
        } else {
            LocationType::Somewhere
        }
    }

    /// Type of a value declared as `declared` on an object located at
    /// `self`, as seen from the current object.
    pub fn adapt(self, declared: LocationType) -> LocationType {
        use LocationType::*;
        match (self, declared) {
            (Bottom, _) | (_, Bottom) => Bottom,
            (Near, d) => d,
            (receiver, Near) => receiver,
            _ => Somewhere,
        }
    }

    /// Drops the creation site of a parametric far location once it is
    /// stored beyond `precision`'s scope.
    fn widen(self, rank: u8, precision: Precision) -> LocationType {
        match self {
            LocationType::ParametricFar(_) if rank > precision.scope() => LocationType::Far,
            t => t,
        }
    }

    fn kind_name(self) -> &'static str {
        match self {
            LocationType::Bottom => "Bottom",
            LocationType::Near => "Near",
            LocationType::Far => "Far",
            LocationType::Somewhere => "Somewhere",
            LocationType::ParametricFar(_) => "ParametricFar",
        }
    }
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationType::ParametricFar(site) => write!(f, "Far({})", site),
            t => write!(f, "{}", t.kind_name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {what} {value}")]
pub struct ParseOptionError {
    what: &'static str,
    value: String,
}

impl FromStr for LocationType {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bottom" => Ok(LocationType::Bottom),
            "near" => Ok(LocationType::Near),
            "far" => Ok(LocationType::Far),
            "somewhere" => Ok(LocationType::Somewhere),
            _ => Err(ParseOptionError {
                what: "location type",
                value: s.to_string(),
            }),
        }
    }
}

/// How far named creation sites are tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Precision {
    /// Every `new` is plainly `Far`.
    Basic,
    /// Creation sites survive in method locals.
    MethodLocal,
    /// Creation sites also survive in fields and class parameters.
    #[default]
    ClassLocal,
    /// Creation sites survive everywhere.
    Global,
}

impl Precision {
    /// Highest storage rank a parametric location survives in.
    fn scope(self) -> u8 {
        match self {
            Precision::Basic => 0,
            Precision::MethodLocal => 1,
            Precision::ClassLocal => 2,
            Precision::Global => 3,
        }
    }
}

impl FromStr for Precision {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BASIC" => Ok(Precision::Basic),
            "METHOD" | "METHOD_LOCAL_FAR_LOCATIONS" => Ok(Precision::MethodLocal),
            "CLASS" | "CLASS_LOCAL_FAR_LOCATIONS" => Ok(Precision::ClassLocal),
            "GLOBAL" | "GLOBAL_FAR_LOCATIONS" => Ok(Precision::Global),
            _ => Err(ParseOptionError {
                what: "location typing precision",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LocationTypeOptions {
    /// Type of declarations nothing flows into, and of unannotated method
    /// parameters and return values.
    pub default: LocationType,
    pub precision: Precision,
    /// Report how many declarations got each kind of type.
    pub statistics: bool,
}

impl Default for LocationTypeOptions {
    fn default() -> Self {
        Self {
            default: LocationType::Somewhere,
            precision: Precision::default(),
            statistics: false,
        }
    }
}

/// Location of a value, possibly depending on declarations not solved yet.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Term {
    Const(LocationType),
    Var(NodeRef),
    /// A value declared as `declared` on the object `receiver` points to.
    Adapt { receiver: Box<Term>, declared: LocationType },
}

#[derive(Debug, Clone)]
struct Declaration {
    annotated: Option<LocationType>,
    /// 1 for locals and parameters, 2 for fields and class parameters.
    rank: u8,
}

/// `value` is stored into `target`.
#[derive(Debug, Clone)]
struct Flow {
    value: Term,
    target: NodeRef,
    location: Option<Location>,
}

/// `value` must be a subtype of `expected`, checked only if `guard`, when
/// present, turns out near.
#[derive(Debug, Clone)]
struct Check {
    value: Term,
    expected: LocationType,
    guard: Option<Term>,
    message: String,
    location: Option<Location>,
}

#[derive(Debug, Default)]
pub struct LocationTypeExtension {
    options: LocationTypeOptions,
    decls: BTreeMap<NodeRef, Declaration>,
    flows: Vec<Flow>,
    checks: Vec<Check>,
    terms: HashMap<NodeRef, Term>,
    current_return: Option<LocationType>,
    sites: u32,
}

impl LocationTypeExtension {
    pub fn new(options: LocationTypeOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &LocationTypeOptions {
        &self.options
    }

    fn annotated(&self, ty: &TypeUse) -> Option<LocationType> {
        ty.annotations
            .iter()
            .find_map(|a| a.parse::<LocationType>().ok())
    }

    /// Type of a parameter or return value.
    fn declared(&self, ty: &TypeUse) -> LocationType {
        self.annotated(ty).unwrap_or(self.options.default)
    }

    fn term_of(&self, cx: &ExtensionContext<'_>, expr: &Expr) -> Option<Term> {
        cx.node_of(expr).and_then(|node| self.terms.get(node)).cloned()
    }

    fn new_site(&mut self) -> Term {
        if self.options.precision == Precision::Basic {
            return Term::Const(LocationType::Far);
        }
        self.sites += 1;
        Term::Const(LocationType::ParametricFar(self.sites))
    }

    fn eval(&self, term: &Term, values: &BTreeMap<NodeRef, LocationType>) -> LocationType {
        match term {
            Term::Const(t) => *t,
            Term::Var(node) => match self.decls.get(node) {
                Some(Declaration {
                    annotated: Some(t), ..
                }) => *t,
                _ => values.get(node).copied().unwrap_or(LocationType::Bottom),
            },
            Term::Adapt { receiver, declared } => self.eval(receiver, values).adapt(*declared),
        }
    }

    /// Least solution of the recorded flows.
    fn solve(&self) -> BTreeMap<NodeRef, LocationType> {
        let targets: BTreeSet<&NodeRef> = self.flows.iter().map(|f| &f.target).collect();
        let mut values: BTreeMap<NodeRef, LocationType> = self
            .decls
            .iter()
            .filter(|(_, d)| d.annotated.is_none())
            .map(|(node, _)| {
                let start = if targets.contains(node) {
                    LocationType::Bottom
                } else {
                    self.options.default
                };
                (node.clone(), start)
            })
            .collect();

        let mut rounds = 0;
        loop {
            rounds += 1;
            let mut changed = false;
            for flow in &self.flows {
                let Some(decl) = self.decls.get(&flow.target) else {
                    continue;
                };
                if decl.annotated.is_some() {
                    continue;
                }
                let incoming = self
                    .eval(&flow.value, &values)
                    .widen(decl.rank, self.options.precision);
                let current = values.get(&flow.target).copied().unwrap_or(LocationType::Bottom);
                let next = current.join(incoming);
                if next != current {
                    values.insert(flow.target.clone(), next);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        tracing::debug!(rounds, declarations = values.len(), "solved location types");
        values
    }

    fn declare(&mut self, node: NodeRef, annotated: Option<LocationType>, rank: u8) {
        self.decls.insert(node, Declaration { annotated, rank });
    }

    fn flow(&mut self, value: Option<Term>, target: Option<NodeRef>, location: Option<&Location>) {
        if let (Some(value), Some(target)) = (value, target) {
            self.flows.push(Flow {
                value,
                target,
                location: location.cloned(),
            });
        }
    }
}

fn lvalue_node(cx: &ExtensionContext<'_>, target: &LValue) -> Option<NodeRef> {
    let binding = match target {
        LValue::Var(name) => cx.variable(name),
        LValue::Field(name) => cx.fields().iter().find(|b| &b.name == name),
    }?;
    binding.ty.is_reference().then(|| binding.node.clone())
}

impl TypeSystemExtension for LocationTypeExtension {
    fn name(&self) -> &str {
        EXTENSION_NAME
    }

    fn configure(&mut self, _cx: &mut ExtensionContext<'_>) -> Result<(), ExtensionError> {
        if !self.options.default.is_user_type() {
            return Err(ExtensionError::Configuration(format!(
                "default location type must be one of Near, Far, Somewhere; got {}",
                self.options.default
            )));
        }
        tracing::debug!(options = ?self.options, "location type inference configured");
        Ok(())
    }

    fn before_class(&mut self, cx: &mut ExtensionContext<'_>, class: &ClassDecl) {
        for binding in cx.fields() {
            if !binding.ty.is_reference() {
                continue;
            }
            let annotated = class.field_type(&binding.name).and_then(|ty| self.annotated(ty));
            self.declare(binding.node.clone(), annotated, 2);
        }
    }

    fn before_method_body(&mut self, cx: &mut ExtensionContext<'_>, _body: &Block) {
        self.current_return = None;
        let Some(method) = cx.method() else {
            return;
        };
        self.current_return = Some(self.declared(&method.sig.return_type));
        for param in &method.sig.params {
            if let Some(binding) = cx.variable(&param.name).filter(|b| b.ty.is_reference()) {
                let declared = self.declared(&param.ty);
                self.declare(binding.node.clone(), Some(declared), 1);
            }
        }
    }

    fn after_method_body(&mut self, _cx: &mut ExtensionContext<'_>, _body: &Block) {
        self.terms.clear();
    }

    fn check_expression(&mut self, cx: &mut ExtensionContext<'_>, expr: &Expr, ty: &Type, node: &NodeRef) {
        let at = expr.location.as_ref();
        match &expr.kind {
            ExprKind::Call {
                target,
                method,
                args,
                asynchronous,
            } => {
                let receiver = self.term_of(cx, target);
                if let Some(receiver) = &receiver {
                    if !asynchronous {
                        self.checks.push(Check {
                            value: receiver.clone(),
                            expected: LocationType::Near,
                            guard: None,
                            message: format!("synchronous call of {} on a receiver that may not be near", method),
                            location: at.cloned(),
                        });
                    }
                }
                if let Some(sig) = cx.call_target(expr) {
                    for (arg, param) in args.iter().zip(&sig.params) {
                        if let Some(value) = self.term_of(cx, arg) {
                            let expected = self.declared(&param.ty);
                            self.checks.push(Check {
                                value,
                                expected,
                                guard: receiver.clone(),
                                message: format!("argument {} of {} has an incompatible location", param.name, method),
                                location: at.cloned(),
                            });
                        }
                    }
                }
            }
            ExprKind::New { args, .. } => {
                if let Some(Type::Class(class)) = cx.type_of(expr) {
                    if let Ok(decl) = cx.symbols().class(None, class) {
                        for (arg, param) in args.iter().zip(&decl.params) {
                            let target = NodeRef::ClassParam {
                                class: class.clone(),
                                param: param.name.clone(),
                            };
                            let value = self.term_of(cx, arg);
                            self.flow(value, Some(target), at);
                        }
                    }
                }
            }
            _ => {}
        }

        if !ty.is_reference() {
            return;
        }
        let term = match &expr.kind {
            ExprKind::Null => Term::Const(LocationType::Bottom),
            ExprKind::This => Term::Const(LocationType::Near),
            ExprKind::Var(name) => match cx.variable(name) {
                Some(b) => Term::Var(b.node.clone()),
                None => return,
            },
            ExprKind::Field(name) => match cx.fields().iter().find(|b| &b.name == name) {
                Some(b) => Term::Var(b.node.clone()),
                None => return,
            },
            ExprKind::New { local: true, .. } => Term::Const(LocationType::Near),
            ExprKind::New { .. } => self.new_site(),
            ExprKind::Call { target, .. } => {
                let declared = cx
                    .call_target(expr)
                    .map(|sig| self.declared(&sig.return_type))
                    .unwrap_or(self.options.default);
                match self.term_of(cx, target) {
                    Some(receiver) => Term::Adapt {
                        receiver: Box::new(receiver),
                        declared,
                    },
                    None => Term::Const(declared),
                }
            }
            ExprKind::Get(future) => match self.term_of(cx, future) {
                Some(t) => t,
                None => return,
            },
            ExprKind::Original(_) => Term::Const(self.current_return.unwrap_or(self.options.default)),
            _ => return,
        };
        self.terms.insert(node.clone(), term);
    }

    fn check_statement(&mut self, cx: &mut ExtensionContext<'_>, stmt: &Stmt) {
        let at = stmt.location.as_ref();
        match &stmt.kind {
            StmtKind::VarDecl { ty, name, init } => {
                let Some(binding) = cx.variable(name).filter(|b| b.ty.is_reference()) else {
                    return;
                };
                let node = binding.node.clone();
                let annotated = self.annotated(ty);
                self.declare(node.clone(), annotated, 1);
                if let Some(init) = init {
                    let value = self.term_of(cx, init);
                    self.flow(value, Some(node), at);
                }
            }
            StmtKind::Assign { target, value } => {
                let value = self.term_of(cx, value);
                self.flow(value, lvalue_node(cx, target), at);
            }
            StmtKind::Return(value) => {
                if let (Some(term), Some(expected)) = (self.term_of(cx, value), self.current_return) {
                    self.checks.push(Check {
                        value: term,
                        expected,
                        guard: None,
                        message: "returned value has an incompatible location".to_string(),
                        location: at.cloned(),
                    });
                }
            }
            _ => {}
        }
    }

    fn finish(&mut self, cx: &mut ExtensionContext<'_>) {
        let values = self.solve();

        for flow in &self.flows {
            let Some(Declaration {
                annotated: Some(expected),
                ..
            }) = self.decls.get(&flow.target)
            else {
                continue;
            };
            let found = self.eval(&flow.value, &values);
            if !found.is_subtype_of(*expected) {
                cx.report(
                    Diagnostic::warning(
                        DiagnosticKind::Extension,
                        format!("{} value stored into {} declared {}", found, flow.target, expected),
                    )
                    .at(flow.location.as_ref()),
                );
            }
        }

        for check in &self.checks {
            if let Some(guard) = &check.guard {
                if !self.eval(guard, &values).is_subtype_of(LocationType::Near) {
                    continue;
                }
            }
            let found = self.eval(&check.value, &values);
            if !found.is_subtype_of(check.expected) {
                cx.report(
                    Diagnostic::warning(
                        DiagnosticKind::Extension,
                        format!("{}: found {}, expected {}", check.message, found, check.expected),
                    )
                    .at(check.location.as_ref()),
                );
            }
        }

        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        for node in self.decls.keys() {
            let inferred = self.eval(&Term::Var(node.clone()), &values);
            *counts.entry(inferred.kind_name()).or_default() += 1;
            cx.annotate(node.clone(), AnnotationValue::Text(inferred.to_string()));
        }

        if self.options.statistics {
            let summary = counts
                .iter()
                .map(|(kind, n)| format!("{}={}", kind, n))
                .collect::<Vec<_>>()
                .join(", ");
            cx.report(Diagnostic::info(
                DiagnosticKind::Extension,
                format!("inferred {} location types: {}", self.decls.len(), summary),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::{Annotations, ExtensionRegistry};
    use crate::typecheck::{type_check, TypeCheckError};
    use abs_grammar::diagnostics::{Diagnostics, Severity};
    use abs_grammar::nodes::Model;
    use abs_grammar::parse_unit;

    const SERVICE: &str = r#"module M;
        interface Service { Unit work(); [Near] Service peer(); }
        class ServiceImpl implements Service {
            Service partner = null;
            Unit work() { skip; }
            Service peer() { return this.partner; }
        }
        class Client {
            Unit run() {
                Service near = new local ServiceImpl();
                Service far = new ServiceImpl();
                Service either = near;
                either = far;
                near.work();
                Fut<Service> f = far!peer();
                far.work();
            }
        }"#;

    fn infer(src: &str, options: LocationTypeOptions) -> (Diagnostics, Annotations) {
        let model = Model::new(vec![parse_unit(None, src).unwrap()]);
        let mut registry = ExtensionRegistry::new();
        registry
            .register(Box::new(LocationTypeExtension::new(options)))
            .unwrap();
        let outcome = type_check(&model, &mut registry).unwrap();
        (outcome.diagnostics, outcome.annotations)
    }

    fn local(name: &str) -> NodeRef {
        let index = ["near", "far", "either", "f"].iter().position(|n| *n == name).unwrap();
        NodeRef::Local {
            class: "M.Client".into(),
            body: "run".into(),
            name: name.into(),
            index,
        }
    }

    fn inferred<'a>(annotations: &'a Annotations, node: &NodeRef) -> Option<&'a AnnotationValue> {
        annotations.get(EXTENSION_NAME, node)
    }

    #[test]
    fn test_lattice() {
        use LocationType::*;
        assert!(Bottom.is_subtype_of(Near));
        assert!(ParametricFar(1).is_subtype_of(Far));
        assert!(!Far.is_subtype_of(ParametricFar(1)));
        assert_eq!(Near.join(Far), Somewhere);
        assert_eq!(ParametricFar(1).join(ParametricFar(2)), Far);
        assert_eq!(ParametricFar(1).join(ParametricFar(1)), ParametricFar(1));
        assert_eq!(Bottom.join(Near), Near);
        assert_eq!(Far.adapt(Near), Far);
        assert_eq!(Far.adapt(Far), Somewhere);
        assert_eq!(Near.adapt(Far), Far);
    }

    #[test]
    fn test_parse_options() {
        assert_eq!("near".parse::<LocationType>(), Ok(LocationType::Near));
        assert_eq!(
            "CLASS_LOCAL_FAR_LOCATIONS".parse::<Precision>(),
            Ok(Precision::ClassLocal)
        );
        assert_eq!("global".parse::<Precision>(), Ok(Precision::Global));
        assert!("nowhere".parse::<LocationType>().is_err());
    }

    #[test]
    fn test_inference_and_sync_call_warning() {
        let (diags, annotations) = infer(
            SERVICE,
            LocationTypeOptions {
                precision: Precision::Basic,
                ..LocationTypeOptions::default()
            },
        );
        assert_eq!(inferred(&annotations, &local("near")), Some(&AnnotationValue::Text("Near".into())));
        assert_eq!(inferred(&annotations, &local("far")), Some(&AnnotationValue::Text("Far".into())));
        assert_eq!(
            inferred(&annotations, &local("either")),
            Some(&AnnotationValue::Text("Somewhere".into()))
        );
        assert_eq!(inferred(&annotations, &local("f")), Some(&AnnotationValue::Text("Far".into())));

        let field = NodeRef::Field {
            class: "M.ServiceImpl".into(),
            field: "partner".into(),
        };
        assert_eq!(inferred(&annotations, &field), Some(&AnnotationValue::Text("Bottom".into())));

        let warnings: Vec<&str> = diags.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(warnings.len(), 1, "{:?}", warnings);
        assert!(warnings[0].starts_with("synchronous call of work"));
        assert!(diags.iter().all(|d| d.severity == Severity::Warning));
    }

    #[test]
    fn test_parametric_sites_widen_by_precision() {
        let src = r#"module M;
            interface I { }
            class K implements I { }
            class C {
                I kept = null;
                Unit run() { I a = new K(); this.kept = new K(); }
            }"#;
        let kept = NodeRef::Field {
            class: "M.C".into(),
            field: "kept".into(),
        };
        let a = NodeRef::Local {
            class: "M.C".into(),
            body: "run".into(),
            name: "a".into(),
            index: 0,
        };

        let (_, method) = infer(
            src,
            LocationTypeOptions {
                precision: Precision::MethodLocal,
                ..LocationTypeOptions::default()
            },
        );
        assert_eq!(inferred(&method, &a), Some(&AnnotationValue::Text("Far(1)".into())));
        assert_eq!(inferred(&method, &kept), Some(&AnnotationValue::Text("Far".into())));

        let (_, class) = infer(
            src,
            LocationTypeOptions {
                precision: Precision::ClassLocal,
                ..LocationTypeOptions::default()
            },
        );
        assert_eq!(inferred(&class, &kept), Some(&AnnotationValue::Text("Far(2)".into())));
    }

    #[test]
    fn test_annotated_declarations_are_checked() {
        let src = r#"module M;
            interface I { }
            class K implements I { }
            class C {
                Unit run() { [Near] I n = new K(); [Far] I f = new local K(); [Somewhere] I s = n; }
            }"#;
        let (diags, annotations) = infer(src, LocationTypeOptions::default());
        assert_eq!(diags.len(), 2, "{:?}", diags);
        let n = NodeRef::Local {
            class: "M.C".into(),
            body: "run".into(),
            name: "n".into(),
            index: 0,
        };
        assert_eq!(inferred(&annotations, &n), Some(&AnnotationValue::Text("Near".into())));
    }

    #[test]
    fn test_unused_declaration_takes_default_and_stats() {
        let src = r#"module M;
            interface I { }
            class C(I given) { }"#;
        let (diags, annotations) = infer(
            src,
            LocationTypeOptions {
                default: LocationType::Far,
                statistics: true,
                ..LocationTypeOptions::default()
            },
        );
        let given = NodeRef::ClassParam {
            class: "M.C".into(),
            param: "given".into(),
        };
        assert_eq!(inferred(&annotations, &given), Some(&AnnotationValue::Text("Far".into())));
        let info = diags.iter().next().unwrap();
        assert_eq!(info.severity, Severity::Info);
        assert_eq!(info.message, "inferred 1 location types: Far=1");
    }

    #[test]
    fn test_bottom_default_is_rejected() {
        let model = Model::new(vec![parse_unit(None, "module M;").unwrap()]);
        let mut registry = ExtensionRegistry::new();
        registry
            .register(Box::new(LocationTypeExtension::new(LocationTypeOptions {
                default: LocationType::Bottom,
                ..LocationTypeOptions::default()
            })))
            .unwrap();
        assert!(matches!(
            type_check(&model, &mut registry),
            Err(TypeCheckError::Configuration { .. })
        ));
    }
}
