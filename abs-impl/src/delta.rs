//! Delta Application
//!
//! [`flatten`] derives a product variant from the base program tree: it
//! validates the delta list, applies the deltas in order to a deep copy of
//! the tree, and finally composes every class's trait uses into a concrete
//! method list. The base tree is never modified and can be shared between
//! concurrent flattenings.
//!
//! ## Failure policy
//!
//! - A malformed delta list (unknown or repeated delta, cyclic or violated
//!   ordering constraints) fails before any delta is applied.
//! - A structural error inside a delta fails the whole call. The remaining
//!   operations of that delta are still attempted so that all of its errors
//!   are reported.
//! - Trait composition errors do not fail the call: they are returned with
//!   the flattened tree.
//!
//! ## Classes using traits
//!
//! Method operations on a class that has `uses` clauses act on the composed
//! method set: they are appended as further `uses` clauses instead of
//! editing the class's own method list. Adding a method the composed set
//! already has, or removing one it lacks, is a structural error as for any
//! other class.

use crate::product_line::{order_deltas, ordering_edges};
use crate::traits::{attach_original, TraitResolver};
use abs_grammar::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use abs_grammar::nodes::*;
use abs_grammar::symbol_table::{split_qualified, LookupError, SymbolTable};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// The product to build: an optional product name and the deltas deriving
/// it, in application order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProductConfig {
    pub product: Option<String>,
    pub deltas: Vec<String>,
}

impl ProductConfig {
    pub fn new(product: Option<String>, deltas: Vec<String>) -> Self {
        Self { product, deltas }
    }

    /// No product and no deltas: only trait composition runs.
    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flattened {
    pub model: Model,
    /// Non-fatal findings, trait composition errors included.
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenError {
    pub product: Option<String>,
    pub diagnostics: Diagnostics,
}

impl fmt::Display for FlattenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.product {
            Some(p) => write!(f, "flattening product {} failed", p)?,
            None => write!(f, "flattening failed")?,
        }
        write!(f, " with {} error(s)", self.diagnostics.error_count())
    }
}

impl std::error::Error for FlattenError {}

/// Position of a declaration inside a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DeclPath {
    unit: usize,
    module: usize,
    decl: usize,
}

fn locate(
    model: &Model,
    kind: DeclKind,
    name: &str,
    preferred_module: &str,
) -> Result<DeclPath, LookupError> {
    let (qualifier, simple) = split_qualified(name);
    let mut found = Vec::new();
    for (u, unit) in model.units.iter().enumerate() {
        for (m, module) in unit.modules.iter().enumerate() {
            if qualifier.is_some_and(|q| q != module.name) {
                continue;
            }
            if let Some(d) = module.position(kind, simple) {
                found.push((module.name.as_str(), DeclPath { unit: u, module: m, decl: d }));
            }
        }
    }

    if qualifier.is_none() {
        if let Some((_, path)) = found.iter().find(|(m, _)| *m == preferred_module) {
            return Ok(*path);
        }
    }
    let modules: BTreeSet<&str> = found.iter().map(|(m, _)| *m).collect();
    match modules.len() {
        0 => Err(LookupError::Unresolved),
        1 => Ok(found[0].1),
        _ => Err(LookupError::Ambiguous(
            modules.into_iter().map(str::to_string).collect(),
        )),
    }
}

fn decl_mut(model: &mut Model, path: DeclPath) -> &mut Decl {
    &mut model.units[path.unit].modules[path.module].decls[path.decl]
}

fn remove_decl(model: &mut Model, path: DeclPath) {
    model.units[path.unit].modules[path.module]
        .decls
        .remove(path.decl);
}

/// Derives the variant described by `config` from `model`.
#[tracing::instrument(skip(model, config), fields(product = ?config.product, deltas = config.deltas.len()))]
pub fn flatten(model: &Model, config: &ProductConfig) -> Result<Flattened, FlattenError> {
    let fail = |diagnostics: Diagnostics| FlattenError {
        product: config.product.clone(),
        diagnostics,
    };

    let deltas = validate_delta_list(model, &config.deltas).map_err(fail)?;

    let mut working = model.clone();
    for (module, delta) in &deltas {
        tracing::debug!(delta = %delta.name, "applying delta");
        let errors = apply_delta(&mut working, module, delta);
        if !errors.is_empty() {
            tracing::warn!(delta = %delta.name, errors = errors.len(), "delta application failed");
            return Err(fail(errors));
        }
    }

    let mut diagnostics = Diagnostics::new();
    compose_classes(&mut working, &mut diagnostics);

    Ok(Flattened {
        model: working,
        diagnostics,
    })
}

/// Looks up every listed delta and checks the list against the ordering
/// constraints. Returns owned copies paired with their declaring module.
fn validate_delta_list(
    model: &Model,
    names: &[String],
) -> Result<Vec<(String, DeltaDecl)>, Diagnostics> {
    let symbols = SymbolTable::new(model);
    let mut errors = Diagnostics::new();
    let mut seen = BTreeSet::new();
    let mut listed = Vec::new();

    for name in names {
        if !seen.insert(name.as_str()) {
            errors.push(Diagnostic::error(
                DiagnosticKind::InvalidDeltaOrder,
                format!("delta {} is listed more than once", name),
            ));
            continue;
        }
        match symbols.deltas.resolve_entry(None, name) {
            Ok(entry) => listed.push(entry),
            Err(LookupError::Unresolved) => errors.push(Diagnostic::error(
                DiagnosticKind::UnknownDelta,
                format!("delta {} is not declared", name),
            )),
            Err(e) => errors.push(Diagnostic::error(
                DiagnosticKind::AmbiguousName,
                format!("delta {} is {}", name, e),
            )),
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    let decls: Vec<&DeltaDecl> = listed.iter().map(|e| e.decl).collect();
    if let Err(cycle) = order_deltas(&decls) {
        errors.push(Diagnostic::error(
            DiagnosticKind::CyclicDeltaOrder,
            format!("delta ordering constraints form a cycle among: {}", cycle.join(", ")),
        ));
        return Err(errors);
    }
    for (before, after) in ordering_edges(&decls) {
        if before > after {
            errors.push(
                Diagnostic::error(
                    DiagnosticKind::InvalidDeltaOrder,
                    format!(
                        "delta {} must be applied before delta {}",
                        decls[before].name, decls[after].name
                    ),
                )
                .at(decls[after].location.as_ref()),
            );
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(listed
        .into_iter()
        .map(|e| (e.module.to_string(), e.decl.clone()))
        .collect())
}

fn error_at(kind: DiagnosticKind, message: String, location: &Option<Location>) -> Diagnostic {
    Diagnostic::error(kind, message).at(location.as_ref())
}

fn lookup_error(
    what: DeclKind,
    name: &str,
    missing: DiagnosticKind,
    error: LookupError,
    location: &Option<Location>,
    delta: &str,
) -> Diagnostic {
    match error {
        LookupError::Unresolved => error_at(
            missing,
            format!("delta {}: {} {} does not exist", delta, what, name),
            location,
        ),
        ambiguous => error_at(
            DiagnosticKind::AmbiguousName,
            format!("delta {}: {} {} is {}", delta, what, name, ambiguous),
            location,
        ),
    }
}

/// Applies every operation of `delta`, declared in `module`, to `model`.
/// Returns the structural errors; empty means success.
fn apply_delta(model: &mut Model, module: &str, delta: &DeltaDecl) -> Diagnostics {
    let mut errors = Diagnostics::new();
    let target_module = delta.uses.as_deref().unwrap_or(module);
    let target_exists = model.module(target_module).is_some();
    if !target_exists {
        errors.push(error_at(
            DiagnosticKind::ModifyTargetNotFound,
            format!("delta {}: module {} does not exist", delta.name, target_module),
            &delta.location,
        ));
    }

    for op in &delta.ops {
        match op {
            DeltaOp::AddInterface(i) => {
                if target_exists {
                    add_decl(model, target_module, Decl::Interface(i.clone()), &delta.name, &mut errors)
                }
            }
            DeltaOp::AddClass(c) => {
                if target_exists {
                    add_decl(model, target_module, Decl::Class(c.clone()), &delta.name, &mut errors)
                }
            }
            DeltaOp::AddTrait(t) => {
                if target_exists {
                    add_decl(model, target_module, Decl::Trait(t.clone()), &delta.name, &mut errors)
                }
            }
            DeltaOp::RemoveInterface { name, location } => {
                remove(model, DeclKind::Interface, name, location, target_module, &delta.name, &mut errors)
            }
            DeltaOp::RemoveClass { name, location } => {
                remove(model, DeclKind::Class, name, location, target_module, &delta.name, &mut errors)
            }
            DeltaOp::RemoveTrait { name, location } => {
                remove(model, DeclKind::Trait, name, location, target_module, &delta.name, &mut errors)
            }
            DeltaOp::ModifyInterface(modifier) => {
                match locate(model, DeclKind::Interface, &modifier.name, target_module) {
                    Ok(path) => {
                        if let Decl::Interface(iface) = decl_mut(model, path) {
                            modify_interface(iface, modifier, &delta.name, &mut errors);
                        }
                    }
                    Err(e) => errors.push(lookup_error(
                        DeclKind::Interface,
                        &modifier.name,
                        DiagnosticKind::ModifyTargetNotFound,
                        e,
                        &modifier.location,
                        &delta.name,
                    )),
                }
            }
            DeltaOp::ModifyClass(modifier) => {
                match locate(model, DeclKind::Class, &modifier.name, target_module) {
                    Ok(path) => {
                        modify_class(model, path, modifier, &delta.name, &mut errors);
                    }
                    Err(e) => errors.push(lookup_error(
                        DeclKind::Class,
                        &modifier.name,
                        DiagnosticKind::ModifyTargetNotFound,
                        e,
                        &modifier.location,
                        &delta.name,
                    )),
                }
            }
            DeltaOp::ModifyTrait {
                name,
                expr,
                location,
            } => match locate(model, DeclKind::Trait, name, target_module) {
                Ok(path) => {
                    if let Decl::Trait(t) = decl_mut(model, path) {
                        t.expr = expr.clone();
                    }
                }
                Err(e) => errors.push(lookup_error(
                    DeclKind::Trait,
                    name,
                    DiagnosticKind::ModifyTargetNotFound,
                    e,
                    location,
                    &delta.name,
                )),
            },
        }
    }

    errors
}

fn add_decl(model: &mut Model, module_name: &str, decl: Decl, delta: &str, errors: &mut Diagnostics) {
    let Some(module) = model.module_mut(module_name) else {
        return;
    };
    if module.position(decl.kind(), decl.name()).is_some() {
        errors.push(
            Diagnostic::error(
                DiagnosticKind::DuplicateDeclaration,
                format!(
                    "delta {}: {} {} already exists in module {}",
                    delta,
                    decl.kind(),
                    decl.name(),
                    module_name
                ),
            )
            .at(decl.location()),
        );
        return;
    }
    module.decls.push(decl);
}

fn remove(
    model: &mut Model,
    kind: DeclKind,
    name: &str,
    location: &Option<Location>,
    preferred_module: &str,
    delta: &str,
    errors: &mut Diagnostics,
) {
    match locate(model, kind, name, preferred_module) {
        Ok(path) => remove_decl(model, path),
        Err(e) => errors.push(lookup_error(
            kind,
            name,
            DiagnosticKind::RemoveTargetNotFound,
            e,
            location,
            delta,
        )),
    }
}

fn modify_interface(
    iface: &mut InterfaceDecl,
    modifier: &InterfaceModifier,
    delta: &str,
    errors: &mut Diagnostics,
) {
    for op in &modifier.ops {
        match op {
            InterfaceOp::AddMethod(sig) => {
                if iface.methods.iter().any(|m| m.name == sig.name) {
                    errors.push(error_at(
                        DiagnosticKind::DuplicateDeclaration,
                        format!(
                            "delta {}: interface {} already declares method {}",
                            delta, iface.name, sig.name
                        ),
                        &sig.location,
                    ));
                } else {
                    iface.methods.push(sig.clone());
                }
            }
            InterfaceOp::RemoveMethod(sig) => {
                match iface.methods.iter().position(|m| m.name == sig.name) {
                    Some(i) => {
                        iface.methods.remove(i);
                    }
                    None => errors.push(error_at(
                        DiagnosticKind::RemoveTargetNotFound,
                        format!(
                            "delta {}: interface {} has no method {}",
                            delta, iface.name, sig.name
                        ),
                        &sig.location,
                    )),
                }
            }
        }
    }
}

/// Method names of the class at `path` after composing its `uses` clauses,
/// or `None` when it has none. Composition errors are left for the final
/// composition pass to report.
fn composed_method_names(model: &Model, path: DeclPath) -> Option<BTreeSet<String>> {
    let module = &model.units[path.unit].modules[path.module];
    let Decl::Class(class) = &module.decls[path.decl] else {
        return None;
    };
    if class.trait_uses.is_empty() {
        return None;
    }
    let symbols = SymbolTable::new(model);
    let mut resolver = TraitResolver::new(&symbols);
    let set = resolver.compose_class(&module.name, class, &mut Diagnostics::new());
    Some(set.names().into_iter().map(str::to_string).collect())
}

fn modify_class(
    model: &mut Model,
    path: DeclPath,
    modifier: &ClassModifier,
    delta: &str,
    errors: &mut Diagnostics,
) {
    let Decl::Class(class) = decl_mut(model, path) else {
        return;
    };
    for iface in &modifier.add_implements {
        if class.implements.contains(iface) {
            errors.push(error_at(
                DiagnosticKind::DuplicateDeclaration,
                format!("delta {}: class {} already implements {}", delta, class.name, iface),
                &modifier.location,
            ));
        } else {
            class.implements.push(iface.clone());
        }
    }

    // Methods of a class using traits only exist once composed, so its
    // method operations are checked against the composed names and then
    // appended as further `uses` clauses.
    let mut composed: Option<BTreeSet<String>> = None;
    for op in &modifier.ops {
        if composed.is_none() {
            composed = composed_method_names(model, path);
        }
        let Decl::Class(class) = decl_mut(model, path) else {
            return;
        };
        match op {
            ClassOp::AddMethod(m) => {
                let exists = match &composed {
                    Some(names) => names.contains(m.name()),
                    None => class.method(m.name()).is_some(),
                };
                if exists {
                    errors.push(error_at(
                        DiagnosticKind::DuplicateDeclaration,
                        format!(
                            "delta {}: class {} already has method {}",
                            delta,
                            class.name,
                            m.name()
                        ),
                        &m.sig.location,
                    ));
                } else if let Some(names) = composed.as_mut() {
                    names.insert(m.name().to_string());
                    class
                        .trait_uses
                        .push(TraitUse::Adds(TraitExpr::Set(vec![m.clone()])));
                } else {
                    class.methods.push(m.clone());
                }
            }
            ClassOp::ModifyMethod(m) => {
                if let Some(names) = composed.as_mut() {
                    names.insert(m.name().to_string());
                    class
                        .trait_uses
                        .push(TraitUse::Modifies(TraitExpr::Set(vec![m.clone()])));
                    continue;
                }
                let mut m = m.clone();
                match class.methods.iter().position(|old| old.name() == m.name()) {
                    Some(i) => {
                        attach_original(&mut m, class.methods[i].clone());
                        class.methods[i] = m;
                    }
                    None => class.methods.push(m),
                }
            }
            ClassOp::RemoveMethod(sig) => {
                let found = match composed.as_mut() {
                    Some(names) => names.remove(&sig.name),
                    None => match class.methods.iter().position(|m| m.name() == sig.name) {
                        Some(i) => {
                            class.methods.remove(i);
                            true
                        }
                        None => false,
                    },
                };
                if !found {
                    errors.push(error_at(
                        DiagnosticKind::RemoveTargetNotFound,
                        format!(
                            "delta {}: class {} has no method {}",
                            delta, class.name, sig.name
                        ),
                        &sig.location,
                    ));
                } else if composed.is_some() {
                    class.trait_uses.push(TraitUse::Removes(vec![sig.clone()]));
                }
            }
            ClassOp::AddField(field) => {
                if class.field_type(&field.name).is_some() {
                    errors.push(error_at(
                        DiagnosticKind::DuplicateDeclaration,
                        format!(
                            "delta {}: class {} already has field {}",
                            delta, class.name, field.name
                        ),
                        &field.location,
                    ));
                } else {
                    class.fields.push(field.clone());
                }
            }
            ClassOp::RemoveField { name, location } => {
                match class.fields.iter().position(|f| f.name == *name) {
                    Some(i) => {
                        class.fields.remove(i);
                    }
                    None => errors.push(error_at(
                        DiagnosticKind::RemoveTargetNotFound,
                        format!("delta {}: class {} has no field {}", delta, class.name, name),
                        location,
                    )),
                }
            }
            ClassOp::AddTraitUse(clause) => {
                class.trait_uses.push(clause.clone());
                composed = None;
            }
        }
    }
}

/// Replaces every class's methods by its composed method set and clears its
/// `uses` clauses. Trait declarations are resolved first, in declaration
/// order, so that each trait's errors are reported once.
fn compose_classes(model: &mut Model, diagnostics: &mut Diagnostics) {
    let composed: Vec<(DeclPath, Vec<MethodImpl>)> = {
        let symbols = SymbolTable::new(model);
        let mut resolver = TraitResolver::new(&symbols);

        for module in model.modules() {
            for t in module.traits() {
                resolver.resolve_decl(&module.name, t, diagnostics);
            }
        }

        let mut composed = Vec::new();
        for (u, unit) in model.units.iter().enumerate() {
            for (m, module) in unit.modules.iter().enumerate() {
                for (d, decl) in module.decls.iter().enumerate() {
                    if let Decl::Class(class) = decl {
                        let set = resolver.compose_class(&module.name, class, diagnostics);
                        let path = DeclPath { unit: u, module: m, decl: d };
                        composed.push((path, set.into_vec()));
                    }
                }
            }
        }
        composed
    };

    for (path, methods) in composed {
        if let Decl::Class(class) = decl_mut(model, path) {
            class.methods = methods;
            class.trait_uses.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abs_grammar::parse_unit;

    fn model(src: &str) -> Model {
        Model::new(vec![parse_unit(None, src).unwrap()])
    }

    fn config(deltas: &[&str]) -> ProductConfig {
        ProductConfig::new(None, deltas.iter().map(|d| d.to_string()).collect())
    }

    fn class<'m>(m: &'m Model, name: &str) -> &'m ClassDecl {
        m.classes().find(|c| c.name == name).unwrap()
    }

    const BASE: &str = r#"module M;
        interface I { Bool f(); }
        class C implements I { Bool f() { return false; } Unit g() { skip; } }
        delta Neg { modifies class C { modifies Bool f() { return !original(); } } }
        delta Neg2 after Neg { modifies class C { modifies Bool f() { return !original(); } } }
        delta AddK { adds class K { } }
        delta AddKAgain { adds class K { } }
        delta RemoveG { modifies class C { removes Unit g(); } }
        delta ReAddG { modifies class C { adds Unit g() { skip; } } }
        delta Broken { removes class Nope; modifies class Missing { } adds class C { } }
    "#;

    #[test]
    fn test_empty_config_is_identity_without_traits() {
        let m = model(BASE);
        let flat = flatten(&m, &ProductConfig::empty()).unwrap();
        assert_eq!(flat.model, m);
        assert!(flat.diagnostics.is_empty());
    }

    #[test]
    fn test_modification_chain() {
        let m = model(BASE);
        let flat = flatten(&m, &config(&["Neg", "Neg2"])).unwrap();
        let f = class(&flat.model, "C").method("f").unwrap();
        assert_eq!(f.modification_depth(), 2);
        // the base tree is untouched
        assert_eq!(class(&m, "C").method("f").unwrap().modification_depth(), 0);
    }

    #[test]
    fn test_order_violation_fails_whole_call() {
        let m = model(BASE);
        let err = flatten(&m, &config(&["Neg2", "Neg"])).unwrap_err();
        assert_eq!(err.diagnostics.count_of(DiagnosticKind::InvalidDeltaOrder), 1);
    }

    #[test]
    fn test_unknown_and_repeated_deltas() {
        let m = model(BASE);
        let err = flatten(&m, &config(&["Nope", "AddK", "AddK"])).unwrap_err();
        assert_eq!(err.diagnostics.count_of(DiagnosticKind::UnknownDelta), 1);
        assert_eq!(err.diagnostics.count_of(DiagnosticKind::InvalidDeltaOrder), 1);
    }

    #[test]
    fn test_duplicate_add_is_fatal() {
        let m = model(BASE);
        let err = flatten(&m, &config(&["AddK", "AddKAgain"])).unwrap_err();
        assert_eq!(err.diagnostics.count_of(DiagnosticKind::DuplicateDeclaration), 1);
    }

    #[test]
    fn test_all_errors_of_failing_delta_reported() {
        let m = model(BASE);
        let err = flatten(&m, &config(&["Broken"])).unwrap_err();
        assert_eq!(err.diagnostics.count_of(DiagnosticKind::RemoveTargetNotFound), 1);
        assert_eq!(err.diagnostics.count_of(DiagnosticKind::ModifyTargetNotFound), 1);
        assert_eq!(err.diagnostics.count_of(DiagnosticKind::DuplicateDeclaration), 1);
        assert_eq!(err.to_string(), "flattening failed with 3 error(s)");
    }

    #[test]
    fn test_remove_then_readd() {
        let m = model(BASE);
        let flat = flatten(&m, &config(&["RemoveG", "ReAddG"])).unwrap();
        let c = class(&flat.model, "C");
        assert_eq!(c.methods.iter().map(|m| m.name()).collect::<Vec<_>>(), vec!["f", "g"]);
        let err = flatten(&m, &config(&["ReAddG"])).unwrap_err();
        assert_eq!(err.diagnostics.count_of(DiagnosticKind::DuplicateDeclaration), 1);
    }

    #[test]
    fn test_uses_clause_targets_module() {
        let m = Model::new(vec![
            parse_unit(None, "module A; delta D { uses B; adds interface J { } }").unwrap(),
            parse_unit(None, "module B;").unwrap(),
        ]);
        let flat = flatten(&m, &config(&["D"])).unwrap();
        assert_eq!(flat.model.module("B").unwrap().interfaces().count(), 1);
        assert_eq!(flat.model.module("A").unwrap().interfaces().count(), 0);

        let missing = model("module A; delta D { uses Nowhere; adds interface J { } }");
        let err = flatten(&missing, &config(&["D"])).unwrap_err();
        assert_eq!(err.diagnostics.count_of(DiagnosticKind::ModifyTargetNotFound), 1);
    }

    #[test]
    fn test_delta_method_ops_apply_after_traits() {
        let m = model(
            r#"module M;
            trait T = { Bool f() { return false; } };
            class C { uses T; }
            delta D { modifies class C { modifies Bool f() { return !original(); } } }"#,
        );
        let flat = flatten(&m, &config(&["D"])).unwrap();
        assert!(flat.diagnostics.is_empty());
        let c = class(&flat.model, "C");
        assert!(c.trait_uses.is_empty());
        assert_eq!(c.method("f").unwrap().modification_depth(), 1);
    }

    #[test]
    fn test_method_clash_on_trait_class_is_fatal() {
        let m = model(
            r#"module M;
            trait T = { Bool f() { return false; } };
            class C { uses T; }
            delta AddF { modifies class C { adds Bool f() { return true; } } }
            delta RemoveNope { modifies class C { removes Unit nope(); } }
            delta RemoveF { modifies class C { removes Bool f(); } }
            delta ReAddF after RemoveF { modifies class C { adds Bool f() { return true; } } }"#,
        );
        let err = flatten(&m, &config(&["AddF"])).unwrap_err();
        assert_eq!(err.diagnostics.count_of(DiagnosticKind::DuplicateDeclaration), 1);
        assert_eq!(err.diagnostics.count_of(DiagnosticKind::DuplicateMethod), 0);

        let err = flatten(&m, &config(&["RemoveNope"])).unwrap_err();
        assert_eq!(err.diagnostics.count_of(DiagnosticKind::RemoveTargetNotFound), 1);
        assert_eq!(err.diagnostics.count_of(DiagnosticKind::RemoveMissingMethod), 0);

        let flat = flatten(&m, &config(&["RemoveF", "ReAddF"])).unwrap();
        assert!(flat.diagnostics.is_empty(), "{:?}", flat.diagnostics);
        assert_eq!(class(&flat.model, "C").method("f").unwrap().modification_depth(), 0);
    }

    #[test]
    fn test_flatten_is_idempotent_and_deterministic() {
        let m = model(
            r#"module M;
            trait T = { Bool f() { return false; } Int g() { return 1; } };
            class C { uses T; uses modifies { Int g() { return original() + 1; } }; }"#,
        );
        let once = flatten(&m, &ProductConfig::empty()).unwrap();
        let again = flatten(&m, &ProductConfig::empty()).unwrap();
        assert_eq!(once, again);
        let twice = flatten(&once.model, &ProductConfig::empty()).unwrap();
        assert_eq!(twice.model, once.model);
    }

    #[test]
    fn test_composition_errors_do_not_fail_flattening() {
        let m = model("module M; class C { uses { Unit a() { skip; } } adds { Unit a() { skip; } }; }");
        let flat = flatten(&m, &ProductConfig::empty()).unwrap();
        assert!(flat.diagnostics.has_errors());
        assert_eq!(flat.diagnostics.count_of(DiagnosticKind::DuplicateMethod), 1);
    }
}
