//! Trait Composition
//!
//! Resolves trait expressions to concrete [`MethodSet`]s and composes each
//! class's own methods with its `uses` clauses.
//!
//! ## Operators
//!
//! - `Ref`: the referenced trait, resolved once per run and memoized
//! - `Set`: the methods verbatim
//! - `Adds`: union; a name already present is `DuplicateMethod`
//! - `Modifies`: replacement; the replaced method becomes the new method's
//!   `original` predecessor, and a name not present is simply added. A
//!   modifier that already has a chain (a trait composed of modifiers) is
//!   bound at its oldest link, so the whole chain runs before the replaced
//!   method. An unbound `original()` left at the end of a class's chain is
//!   `NoOriginalMethod`.
//! - `Removes`: deletion; a missing name is `RemoveMissingMethod`
//!
//! ## Error Handling
//!
//! Errors are collected for a whole class (or top-level trait) and appended
//! to the sink when that chain completes. Each trait's own errors are
//! reported once, on its first resolution.

use crate::method_set::MethodSet;
use abs_grammar::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use abs_grammar::nodes::{ClassDecl, Location, MethodImpl, MethodSig, TraitDecl, TraitExpr, TraitUse};
use abs_grammar::symbol_table::{LookupError, SymbolTable};
use std::collections::BTreeMap;

/// Sets `predecessor` as the `original` of the oldest link of `method`'s
/// chain.
pub fn attach_original(method: &mut MethodImpl, predecessor: MethodImpl) {
    match method.original {
        Some(ref mut older) => attach_original(older, predecessor),
        None => method.original = Some(Box::new(predecessor)),
    }
}

pub struct TraitResolver<'a> {
    symbols: &'a SymbolTable<'a>,
    cache: BTreeMap<String, MethodSet>,
    /// Traits on the active resolution path, outermost first.
    visiting: Vec<String>,
}

impl<'a> TraitResolver<'a> {
    pub fn new(symbols: &'a SymbolTable<'a>) -> Self {
        Self {
            symbols,
            cache: BTreeMap::new(),
            visiting: Vec::new(),
        }
    }

    /// Resolves a trait declaration of `module`, appending its errors.
    #[tracing::instrument(skip(self, decl, diagnostics), fields(name = %decl.name))]
    pub fn resolve_decl(
        &mut self,
        module: &str,
        decl: &TraitDecl,
        diagnostics: &mut Diagnostics,
    ) -> MethodSet {
        let mut errors = Vec::new();
        let set = self.resolve_declared(module, decl, &mut errors);
        diagnostics.extend(errors);
        set
    }

    /// Resolves an expression written in `module`.
    pub fn resolve(
        &mut self,
        module: Option<&str>,
        expr: &TraitExpr,
        errors: &mut Vec<Diagnostic>,
    ) -> MethodSet {
        match expr {
            TraitExpr::Ref { name, location } => {
                self.resolve_ref(module, name, location.as_ref(), errors)
            }
            TraitExpr::Set(methods) => {
                let mut set = MethodSet::new();
                for m in methods {
                    if let Err(m) = set.insert(m.clone()) {
                        errors.push(duplicate(&m, "defined twice in one method set"));
                    }
                }
                set
            }
            TraitExpr::Adds(base, extra) => {
                let base = self.resolve(module, base, errors);
                let extra = self.resolve(module, extra, errors);
                add_all(base, extra, errors)
            }
            TraitExpr::Modifies(base, extra) => {
                let base = self.resolve(module, base, errors);
                let extra = self.resolve(module, extra, errors);
                modify_all(base, extra)
            }
            TraitExpr::Removes(base, sigs) => {
                let base = self.resolve(module, base, errors);
                remove_all(base, sigs, errors)
            }
        }
    }

    fn resolve_ref(
        &mut self,
        module: Option<&str>,
        name: &str,
        location: Option<&Location>,
        errors: &mut Vec<Diagnostic>,
    ) -> MethodSet {
        match self.symbols.traits.resolve_entry(module, name) {
            Ok(entry) => self.resolve_declared(entry.module, entry.decl, errors),
            Err(LookupError::Unresolved) => {
                errors.push(
                    Diagnostic::error(
                        DiagnosticKind::UnresolvedName,
                        format!("trait {} is not declared", name),
                    )
                    .at(location),
                );
                MethodSet::new()
            }
            Err(e @ LookupError::Ambiguous(_)) => {
                errors.push(
                    Diagnostic::error(DiagnosticKind::AmbiguousName, format!("trait {} is {}", name, e))
                        .at(location),
                );
                MethodSet::new()
            }
        }
    }

    fn resolve_declared(
        &mut self,
        module: &str,
        decl: &TraitDecl,
        errors: &mut Vec<Diagnostic>,
    ) -> MethodSet {
        let key = format!("{}.{}", module, decl.name);

        if let Some(start) = self.visiting.iter().position(|k| *k == key) {
            let mut cycle = self.visiting[start..].to_vec();
            cycle.push(key);
            errors.push(
                Diagnostic::error(
                    DiagnosticKind::CyclicTraitDefinition,
                    format!("trait {} is defined in terms of itself: {}", decl.name, cycle.join(" -> ")),
                )
                .at(decl.location.as_ref()),
            );
            return MethodSet::new();
        }

        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }

        tracing::debug!(trait_name = %key, "resolving trait");
        self.visiting.push(key.clone());
        let set = self.resolve(Some(module), &decl.expr, errors);
        self.visiting.pop();

        self.cache.insert(key, set.clone());
        set
    }

    /// Final method set of `class`: its own methods with every `uses`
    /// clause applied in order.
    #[tracing::instrument(skip(self, class, diagnostics), fields(class = %class.name))]
    pub fn compose_class(
        &mut self,
        module: &str,
        class: &ClassDecl,
        diagnostics: &mut Diagnostics,
    ) -> MethodSet {
        let mut errors = Vec::new();
        let mut set = MethodSet::new();
        for m in &class.methods {
            if let Err(m) = set.insert(m.clone()) {
                errors.push(duplicate(&m, &format!("defined twice in class {}", class.name)));
            }
        }

        for clause in &class.trait_uses {
            set = match clause {
                TraitUse::Adds(expr) => {
                    let extra = self.resolve(Some(module), expr, &mut errors);
                    add_all(set, extra, &mut errors)
                }
                TraitUse::Modifies(expr) => {
                    let extra = self.resolve(Some(module), expr, &mut errors);
                    modify_all(set, extra)
                }
                TraitUse::Removes(sigs) => remove_all(set, sigs, &mut errors),
            };
        }

        for m in set.iter() {
            check_original_chain(class, m, &mut errors);
        }

        diagnostics.extend(errors);
        set
    }
}

fn duplicate(method: &MethodImpl, what: &str) -> Diagnostic {
    Diagnostic::error(
        DiagnosticKind::DuplicateMethod,
        format!("method {} is {}", method.name(), what),
    )
    .at(method.sig.location.as_ref())
}

fn add_all(mut base: MethodSet, extra: MethodSet, errors: &mut Vec<Diagnostic>) -> MethodSet {
    for m in extra {
        if let Err(m) = base.insert(m) {
            errors.push(duplicate(&m, "already present"));
        }
    }
    base
}

fn modify_all(mut base: MethodSet, extra: MethodSet) -> MethodSet {
    for mut m in extra {
        if let Some(replaced) = base.get(m.name()).cloned() {
            attach_original(&mut m, replaced);
        }
        base.replace(m);
    }
    base
}

fn remove_all(mut base: MethodSet, sigs: &[MethodSig], errors: &mut Vec<Diagnostic>) -> MethodSet {
    for sig in sigs {
        if base.remove(&sig.name).is_none() {
            errors.push(
                Diagnostic::error(
                    DiagnosticKind::RemoveMissingMethod,
                    format!("cannot remove method {}: no such method", sig.name),
                )
                .at(sig.location.as_ref()),
            );
        }
    }
    base
}

fn check_original_chain(class: &ClassDecl, method: &MethodImpl, errors: &mut Vec<Diagnostic>) {
    let mut current = Some(method);
    while let Some(m) = current {
        if m.calls_original() && m.original.is_none() {
            errors.push(
                Diagnostic::error(
                    DiagnosticKind::NoOriginalMethod,
                    format!(
                        "method {} of class {} calls original() but replaces no method",
                        m.name(),
                        class.name
                    ),
                )
                .at(m.sig.location.as_ref()),
            );
        }
        current = m.original.as_deref();
    }
}
