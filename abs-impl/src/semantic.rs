//! Core semantic checks over the merged program tree, run before any delta
//! is applied.
//!
//! Names referenced by base declarations must resolve to exactly one
//! declaration. Names inside delta operations are not checked here, since
//! earlier deltas may add what later ones refer to.

use abs_grammar::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use abs_grammar::nodes::*;
use abs_grammar::symbol_table::{LookupError, Namespace, SymbolTable};
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};

#[tracing::instrument(skip(model), fields(units = model.units.len()))]
pub fn check_model(model: &Model) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    let symbols = SymbolTable::new(model);

    check_duplicate_modules(model, &mut diagnostics);
    for module in model.modules() {
        check_duplicate_declarations(module, &mut diagnostics);
        check_references(module, &symbols, &mut diagnostics);
    }
    check_interface_cycles(model, &symbols, &mut diagnostics);
    check_interface_signatures(model, &symbols, &mut diagnostics);

    diagnostics
}

fn check_duplicate_modules(model: &Model, diagnostics: &mut Diagnostics) {
    let mut seen = BTreeSet::new();
    for module in model.modules() {
        if !seen.insert(module.name.as_str()) {
            diagnostics.push(
                Diagnostic::error(
                    DiagnosticKind::DuplicateModule,
                    format!("module {} is declared more than once", module.name),
                )
                .at(module.location.as_ref()),
            );
        }
    }
}

fn check_duplicate_declarations(module: &ModuleDecl, diagnostics: &mut Diagnostics) {
    let mut seen = BTreeSet::new();
    for decl in &module.decls {
        if !seen.insert((decl.kind(), decl.name())) {
            diagnostics.push(
                Diagnostic::error(
                    DiagnosticKind::DuplicateDeclaration,
                    format!(
                        "{} {} is declared more than once in module {}",
                        decl.kind(),
                        decl.name(),
                        module.name
                    ),
                )
                .at(decl.location()),
            );
        }
    }
}

fn check_name<T>(
    namespace: &Namespace<'_, T>,
    module: &str,
    what: &str,
    name: &str,
    location: Option<&Location>,
    diagnostics: &mut Diagnostics,
) {
    let (kind, reason) = match namespace.resolve(Some(module), name) {
        Ok(_) => return,
        Err(LookupError::Unresolved) => (DiagnosticKind::UnresolvedName, "is not declared".to_string()),
        Err(e) => (DiagnosticKind::AmbiguousName, format!("is {}", e)),
    };
    diagnostics.push(Diagnostic::error(kind, format!("{} {} {}", what, name, reason)).at(location));
}

fn check_trait_expr(
    expr: &TraitExpr,
    symbols: &SymbolTable<'_>,
    module: &str,
    location: Option<&Location>,
    diagnostics: &mut Diagnostics,
) {
    match expr {
        TraitExpr::Ref { name, location: at } => check_name(
            &symbols.traits,
            module,
            "trait",
            name,
            at.as_ref().or(location),
            diagnostics,
        ),
        TraitExpr::Set(_) => {}
        TraitExpr::Adds(base, extra) | TraitExpr::Modifies(base, extra) => {
            check_trait_expr(base, symbols, module, location, diagnostics);
            check_trait_expr(extra, symbols, module, location, diagnostics);
        }
        TraitExpr::Removes(base, _) => check_trait_expr(base, symbols, module, location, diagnostics),
    }
}

fn check_references(module: &ModuleDecl, symbols: &SymbolTable<'_>, diagnostics: &mut Diagnostics) {
    let m = module.name.as_str();
    for decl in &module.decls {
        match decl {
            Decl::Interface(i) => {
                for parent in &i.extends {
                    check_name(&symbols.interfaces, m, "interface", parent, i.location.as_ref(), diagnostics);
                }
            }
            Decl::Class(c) => {
                for iface in &c.implements {
                    check_name(&symbols.interfaces, m, "interface", iface, c.location.as_ref(), diagnostics);
                }
                for clause in &c.trait_uses {
                    if let Some(expr) = clause.expr() {
                        check_trait_expr(expr, symbols, m, c.location.as_ref(), diagnostics);
                    }
                }
            }
            Decl::Trait(t) => check_trait_expr(&t.expr, symbols, m, t.location.as_ref(), diagnostics),
            Decl::Delta(d) => {
                for other in d.after.iter().chain(d.before.iter()) {
                    check_name(&symbols.deltas, m, "delta", other, d.location.as_ref(), diagnostics);
                }
                if let Some(uses) = &d.uses {
                    if symbols.module(uses).is_none() {
                        diagnostics.push(
                            Diagnostic::error(
                                DiagnosticKind::UnresolvedName,
                                format!("module {} used by delta {} is not declared", uses, d.name),
                            )
                            .at(d.location.as_ref()),
                        );
                    }
                }
            }
            Decl::Product(_) => {}
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Active,
    Done,
}

/// Reports each cycle of interface extension once, at the interface where
/// the depth-first search closes it.
fn check_interface_cycles(model: &Model, symbols: &SymbolTable<'_>, diagnostics: &mut Diagnostics) {
    fn visit<'a>(
        iface: &'a InterfaceDecl,
        symbols: &SymbolTable<'a>,
        marks: &mut BTreeMap<*const InterfaceDecl, Mark>,
        path: &mut Vec<&'a InterfaceDecl>,
        diagnostics: &mut Diagnostics,
    ) {
        marks.insert(iface, Mark::Active);
        path.push(iface);
        for parent in &iface.extends {
            let Ok(p) = symbols.interfaces.resolve(None, parent) else {
                continue;
            };
            match marks.get(&(p as *const InterfaceDecl)) {
                Some(Mark::Active) => {
                    let start = path.iter().position(|i| std::ptr::eq(*i, p)).unwrap_or(0);
                    let cycle = path[start..]
                        .iter()
                        .map(|i| i.name.as_str())
                        .chain(std::iter::once(p.name.as_str()))
                        .join(" -> ");
                    diagnostics.push(
                        Diagnostic::error(
                            DiagnosticKind::CyclicInheritance,
                            format!("interface extension is cyclic: {}", cycle),
                        )
                        .at(iface.location.as_ref()),
                    );
                }
                Some(Mark::Done) => {}
                None => visit(p, symbols, marks, path, diagnostics),
            }
        }
        path.pop();
        marks.insert(iface, Mark::Done);
    }

    let mut marks = BTreeMap::new();
    for iface in model.interfaces() {
        if !marks.contains_key(&(iface as *const InterfaceDecl)) {
            visit(iface, symbols, &mut marks, &mut Vec::new(), diagnostics);
        }
    }
}

fn check_interface_signatures(model: &Model, symbols: &SymbolTable<'_>, diagnostics: &mut Diagnostics) {
    for iface in model.interfaces() {
        let counts = symbols
            .interface_methods(iface)
            .iter()
            .map(|m| m.name.as_str())
            .counts();
        for (name, count) in counts.into_iter().sorted() {
            if count > 1 {
                diagnostics.push(
                    Diagnostic::error(
                        DiagnosticKind::DuplicateMethod,
                        format!("interface {} has {} signatures named {}", iface.name, count, name),
                    )
                    .at(iface.location.as_ref()),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abs_grammar::parse_unit;

    fn check(sources: &[&str]) -> Diagnostics {
        let model = Model::new(sources.iter().map(|s| parse_unit(None, s).unwrap()).collect());
        check_model(&model)
    }

    #[test]
    fn test_clean_model() {
        let diags = check(&[
            "module A; interface I { Unit m(); } trait T = { Unit m() { skip; } };",
            "module B; class C implements A.I { uses T; } delta D after E { uses A; } delta E { }",
        ]);
        assert!(diags.is_empty(), "{:?}", diags);
    }

    #[test]
    fn test_duplicates() {
        let diags = check(&[
            "module A; interface I { } interface I { } class I { }",
            "module A;",
        ]);
        assert_eq!(diags.count_of(DiagnosticKind::DuplicateModule), 1);
        assert_eq!(diags.count_of(DiagnosticKind::DuplicateDeclaration), 1);
    }

    #[test]
    fn test_unresolved_and_ambiguous() {
        let diags = check(&[
            "module A; interface I { }",
            "module B; interface I { }",
            "module C; class K implements I, Missing { uses NoTrait; } delta D after Ghost { uses Nowhere; }",
        ]);
        assert_eq!(diags.count_of(DiagnosticKind::AmbiguousName), 1);
        assert_eq!(diags.count_of(DiagnosticKind::UnresolvedName), 4);
    }

    #[test]
    fn test_interface_cycle_reported_once() {
        let diags = check(&["module M; interface A extends B { } interface B extends C { } interface C extends A { }"]);
        assert_eq!(diags.count_of(DiagnosticKind::CyclicInheritance), 1);
        let message = &diags.iter().next().unwrap().message;
        assert!(message.contains("A -> B -> C -> A"), "{}", message);
    }

    #[test]
    fn test_duplicate_inherited_signature() {
        let diags = check(&[
            "module M; interface J { Unit m(); } interface K { Unit m(); } interface I extends J, K { }",
        ]);
        assert_eq!(diags.count_of(DiagnosticKind::DuplicateMethod), 1);
    }

    #[test]
    fn test_diamond_is_not_duplicate() {
        let diags = check(&[
            "module M; interface B { Unit m(); } interface J extends B { } interface K extends B { } interface I extends J, K { }",
        ]);
        assert!(diags.is_empty(), "{:?}", diags);
    }
}
