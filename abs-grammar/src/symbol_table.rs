//! Symbol Table for Declarations
//!
//! Name lookup over a merged [`Model`]. References in the tree are plain
//! names, optionally qualified with a module (`Module.Name`, where module
//! names may themselves contain dots).
//!
//! ## Lookup rules
//!
//! - A qualified name selects the declaration of that name in that module.
//! - An unqualified name used from inside a module prefers that module's own
//!   declaration.
//! - Otherwise an unqualified name must be declared in exactly one module;
//!   more than one is [`LookupError::Ambiguous`].
//!
//! ```ignore
//! let table = SymbolTable::new(&model);
//! let iface = table.interface(Some("Main"), "Greeter")?;
//! let all = table.interface_methods(iface);
//! ```

use crate::nodes::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Splits `A.B.C` into `(Some("A.B"), "C")`.
pub fn split_qualified(name: &str) -> (Option<&str>, &str) {
    match name.rsplit_once('.') {
        Some((module, simple)) => (Some(module), simple),
        None => (None, name),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    Unresolved,
    /// Modules declaring the name.
    Ambiguous(Vec<String>),
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::Unresolved => write!(f, "not declared"),
            LookupError::Ambiguous(modules) => {
                write!(f, "declared in several modules: {}", modules.join(", "))
            }
        }
    }
}

/// A declaration together with the module declaring it.
#[derive(Debug)]
pub struct Entry<'a, T> {
    pub module: &'a str,
    pub decl: &'a T,
}

impl<'a, T> Clone for Entry<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T> Copy for Entry<'a, T> {}

/// Declarations of one kind, keyed by simple name, in model order.
#[derive(Debug)]
pub struct Namespace<'a, T> {
    by_name: BTreeMap<&'a str, Vec<Entry<'a, T>>>,
}

impl<'a, T> Default for Namespace<'a, T> {
    fn default() -> Self {
        Self {
            by_name: BTreeMap::new(),
        }
    }
}

impl<'a, T> Namespace<'a, T> {
    fn insert(&mut self, module: &'a str, name: &'a str, decl: &'a T) {
        self.by_name
            .entry(name)
            .or_default()
            .push(Entry { module, decl });
    }

    /// Resolves `name` as seen from `from_module`.
    pub fn resolve(&self, from_module: Option<&str>, name: &str) -> Result<&'a T, LookupError> {
        self.resolve_entry(from_module, name).map(|e| e.decl)
    }

    pub fn resolve_entry(
        &self,
        from_module: Option<&str>,
        name: &str,
    ) -> Result<Entry<'a, T>, LookupError> {
        let (qualifier, simple) = split_qualified(name);
        let candidates = self.by_name.get(simple).map(Vec::as_slice).unwrap_or(&[]);

        if let Some(module) = qualifier {
            return candidates
                .iter()
                .find(|e| e.module == module)
                .copied()
                .ok_or(LookupError::Unresolved);
        }

        if let Some(local) = from_module.and_then(|m| candidates.iter().find(|e| e.module == m)) {
            return Ok(*local);
        }

        let modules: BTreeSet<&str> = candidates.iter().map(|e| e.module).collect();
        match modules.len() {
            0 => Err(LookupError::Unresolved),
            1 => Ok(candidates[0]),
            _ => Err(LookupError::Ambiguous(
                modules.into_iter().map(str::to_string).collect(),
            )),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolve(None, name).is_ok()
    }

    /// Every entry, grouped by simple name in name order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry<'a, T>> {
        self.by_name.values().flat_map(|v| v.iter())
    }
}

#[derive(Debug, Default)]
pub struct SymbolTable<'a> {
    pub interfaces: Namespace<'a, InterfaceDecl>,
    pub classes: Namespace<'a, ClassDecl>,
    pub traits: Namespace<'a, TraitDecl>,
    pub deltas: Namespace<'a, DeltaDecl>,
    pub products: Namespace<'a, ProductDecl>,
    modules: BTreeMap<&'a str, &'a ModuleDecl>,
    class_modules: BTreeMap<*const ClassDecl, &'a str>,
}

impl<'a> SymbolTable<'a> {
    pub fn new(model: &'a Model) -> Self {
        let mut table = Self::default();

        for module in model.modules() {
            table.modules.entry(module.name.as_str()).or_insert(module);
            let m = module.name.as_str();
            for decl in &module.decls {
                match decl {
                    Decl::Interface(i) => table.interfaces.insert(m, &i.name, i),
                    Decl::Class(c) => {
                        table.class_modules.insert(c as *const ClassDecl, m);
                        table.classes.insert(m, &c.name, c)
                    }
                    Decl::Trait(t) => table.traits.insert(m, &t.name, t),
                    Decl::Delta(d) => table.deltas.insert(m, &d.name, d),
                    Decl::Product(p) => table.products.insert(m, &p.name, p),
                }
            }
        }

        table
    }

    pub fn module(&self, name: &str) -> Option<&'a ModuleDecl> {
        self.modules.get(name).copied()
    }

    /// Module declaring `class`, if the class belongs to the indexed model.
    pub fn module_of_class(&self, class: &ClassDecl) -> Option<&'a str> {
        self.class_modules
            .get(&(class as *const ClassDecl))
            .copied()
    }

    pub fn interface(&self, from: Option<&str>, name: &str) -> Result<&'a InterfaceDecl, LookupError> {
        self.interfaces.resolve(from, name)
    }

    pub fn class(&self, from: Option<&str>, name: &str) -> Result<&'a ClassDecl, LookupError> {
        self.classes.resolve(from, name)
    }

    pub fn trait_decl(&self, from: Option<&str>, name: &str) -> Result<&'a TraitDecl, LookupError> {
        self.traits.resolve(from, name)
    }

    /// Every signature of `iface` and of the interfaces it extends,
    /// transitively, in depth-first order with the interface's own methods
    /// first. Unresolvable parents and extension cycles are skipped.
    pub fn interface_methods(&self, iface: &'a InterfaceDecl) -> Vec<&'a MethodSig> {
        let mut out = Vec::new();
        let mut visited = BTreeSet::new();
        self.collect_interface_methods(iface, &mut visited, &mut out);
        out
    }

    fn collect_interface_methods(
        &self,
        iface: &'a InterfaceDecl,
        visited: &mut BTreeSet<*const InterfaceDecl>,
        out: &mut Vec<&'a MethodSig>,
    ) {
        if !visited.insert(iface as *const InterfaceDecl) {
            return;
        }
        out.extend(iface.methods.iter());
        for parent in &iface.extends {
            if let Ok(p) = self.interfaces.resolve(None, parent) {
                self.collect_interface_methods(p, visited, out);
            }
        }
    }

    /// Looks up a method signature by name in `iface` or its ancestors.
    pub fn find_interface_method(&self, iface: &'a InterfaceDecl, method: &str) -> Option<&'a MethodSig> {
        self.interface_methods(iface)
            .into_iter()
            .find(|m| m.name == method)
    }

    /// Whether `sub` is `sup` or extends it transitively.
    pub fn is_subinterface(&self, sub: &str, sup: &str) -> bool {
        let (Ok(start), Ok(target)) = (self.interface(None, sub), self.interface(None, sup)) else {
            return false;
        };
        let mut visited = BTreeSet::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if std::ptr::eq(current, target) {
                return true;
            }
            if !visited.insert(current as *const InterfaceDecl) {
                continue;
            }
            for parent in &current.extends {
                if let Ok(p) = self.interfaces.resolve(None, parent) {
                    stack.push(p);
                }
            }
        }
        false
    }

    /// Interfaces implemented by `class`, including inherited ones.
    pub fn implemented_interfaces(&self, class: &'a ClassDecl) -> Vec<&'a InterfaceDecl> {
        let from = self.module_of_class(class);
        let mut out: Vec<&'a InterfaceDecl> = Vec::new();
        let mut stack: Vec<&'a InterfaceDecl> = class
            .implements
            .iter()
            .filter_map(|n| self.interfaces.resolve(from, n).ok())
            .collect();
        stack.reverse();
        while let Some(i) = stack.pop() {
            if out.iter().any(|seen| std::ptr::eq(*seen, i)) {
                continue;
            }
            out.push(i);
            for parent in i.extends.iter().rev() {
                if let Ok(p) = self.interfaces.resolve(None, parent) {
                    stack.push(p);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_unit;

    fn model(sources: &[&str]) -> Model {
        Model::new(
            sources
                .iter()
                .map(|s| parse_unit(None, s).unwrap())
                .collect(),
        )
    }

    #[test]
    fn test_split_qualified() {
        assert_eq!(split_qualified("A.B.C"), (Some("A.B"), "C"));
        assert_eq!(split_qualified("C"), (None, "C"));
    }

    #[test]
    fn test_qualified_and_ambiguous_lookup() {
        let m = model(&[
            "module A; interface I { }",
            "module B; interface I { } class C implements I { }",
        ]);
        let table = SymbolTable::new(&m);
        assert!(table.interface(None, "A.I").is_ok());
        assert!(matches!(
            table.interface(None, "I"),
            Err(LookupError::Ambiguous(ref ms)) if ms == &vec!["A".to_string(), "B".to_string()]
        ));
        let from_b = table.interfaces.resolve_entry(Some("B"), "I").unwrap();
        assert_eq!(from_b.module, "B");
        assert_eq!(table.interface(None, "Z.I"), Err(LookupError::Unresolved));
    }

    #[test]
    fn test_transitive_methods_survive_cycles() {
        let m = model(&[
            "module M; interface A extends B { Unit a(); } interface B extends A { Unit b(); }",
        ]);
        let table = SymbolTable::new(&m);
        let a = table.interface(None, "A").unwrap();
        let names: Vec<&str> = table
            .interface_methods(a)
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(table.is_subinterface("A", "B"));
    }

    #[test]
    fn test_implemented_interfaces_include_ancestors() {
        let m = model(&[
            "module M; interface Base { Unit b(); } interface I extends Base { } class C implements I { }",
        ]);
        let table = SymbolTable::new(&m);
        let class = table.class(None, "C").unwrap();
        let names: Vec<&str> = table
            .implemented_interfaces(class)
            .iter()
            .map(|i| i.name.as_str())
            .collect();
        assert_eq!(names, vec!["I", "Base"]);
        assert_eq!(table.module_of_class(class), Some("M"));
    }
}
