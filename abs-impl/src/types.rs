//! Static types of the core checker.

use abs_grammar::nodes::TypeUse;
use abs_grammar::symbol_table::{LookupError, SymbolTable};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Type {
    Bool,
    Int,
    String,
    Unit,
    Fut(Box<Type>),
    /// Qualified interface name, `Module.Name`.
    Interface(String),
    /// Qualified class name; the type of `this` and of `new` expressions.
    Class(String),
    Null,
    /// Result of an earlier error. Compatible with everything so that one
    /// mistake is reported once.
    Unknown,
}

impl Type {
    /// Whether values of this type are object references (or futures of
    /// them).
    pub fn is_reference(&self) -> bool {
        match self {
            Type::Interface(_) | Type::Class(_) | Type::Null => true,
            Type::Fut(inner) => inner.is_reference(),
            _ => false,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Unknown)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bool => write!(f, "Bool"),
            Type::Int => write!(f, "Int"),
            Type::String => write!(f, "String"),
            Type::Unit => write!(f, "Unit"),
            Type::Fut(inner) => write!(f, "Fut<{}>", inner),
            Type::Interface(name) => write!(f, "{}", name),
            Type::Class(name) => write!(f, "class {}", name),
            Type::Null => write!(f, "null"),
            Type::Unknown => write!(f, "<unknown>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    #[error("unknown type {0}")]
    Unknown(String),
    #[error("type {name} is {reason}")]
    Ambiguous { name: String, reason: String },
    #[error("type {name} expects {expected} type argument(s), found {found}")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },
}

/// Resolves a written type in the context of `module`.
pub fn resolve_type(symbols: &SymbolTable<'_>, module: Option<&str>, ty: &TypeUse) -> Result<Type, TypeError> {
    let arity = |expected: usize| {
        if ty.args.len() == expected {
            Ok(())
        } else {
            Err(TypeError::Arity {
                name: ty.name.clone(),
                expected,
                found: ty.args.len(),
            })
        }
    };

    match ty.name.as_str() {
        "Bool" => arity(0).map(|_| Type::Bool),
        "Int" => arity(0).map(|_| Type::Int),
        "String" => arity(0).map(|_| Type::String),
        "Unit" => arity(0).map(|_| Type::Unit),
        "Fut" => {
            arity(1)?;
            let inner = resolve_type(symbols, module, &ty.args[0])?;
            Ok(Type::Fut(Box::new(inner)))
        }
        name => {
            arity(0)?;
            match symbols.interfaces.resolve_entry(module, name) {
                Ok(entry) => Ok(Type::Interface(format!("{}.{}", entry.module, entry.decl.name))),
                Err(LookupError::Unresolved) => Err(TypeError::Unknown(name.to_string())),
                Err(e) => Err(TypeError::Ambiguous {
                    name: name.to_string(),
                    reason: e.to_string(),
                }),
            }
        }
    }
}

/// Whether a value of type `from` may be stored where `to` is expected.
pub fn is_assignable(symbols: &SymbolTable<'_>, from: &Type, to: &Type) -> bool {
    match (from, to) {
        (Type::Unknown, _) | (_, Type::Unknown) => true,
        (a, b) if a == b => true,
        (Type::Null, t) => t.is_reference(),
        (Type::Fut(a), Type::Fut(b)) => is_assignable(symbols, a, b),
        (Type::Interface(sub), Type::Interface(sup)) => symbols.is_subinterface(sub, sup),
        (Type::Class(class), Type::Interface(sup)) => {
            let (Ok(class), Ok(target)) = (symbols.class(None, class), symbols.interface(None, sup)) else {
                return false;
            };
            symbols
                .implemented_interfaces(class)
                .into_iter()
                .any(|i| std::ptr::eq(i, target))
        }
        _ => false,
    }
}

/// Whether `a` and `b` may be compared with `==`.
pub fn is_comparable(symbols: &SymbolTable<'_>, a: &Type, b: &Type) -> bool {
    is_assignable(symbols, a, b) || is_assignable(symbols, b, a) || (a.is_reference() && b.is_reference())
}

#[cfg(test)]
mod tests {
    use super::*;
    use abs_grammar::nodes::Model;
    use abs_grammar::parse_unit;

    fn model() -> Model {
        Model::new(vec![parse_unit(
            None,
            "module M; interface Base { } interface I extends Base { } interface Other { } class C implements I { }",
        )
        .unwrap()])
    }

    fn fut(inner: &str) -> TypeUse {
        let mut ty = TypeUse::named("Fut");
        ty.args.push(TypeUse::named(inner));
        ty
    }

    #[test]
    fn test_resolve_builtin_and_interfaces() {
        let m = model();
        let symbols = SymbolTable::new(&m);
        assert_eq!(resolve_type(&symbols, None, &TypeUse::named("Int")), Ok(Type::Int));
        assert_eq!(
            resolve_type(&symbols, None, &fut("I")),
            Ok(Type::Fut(Box::new(Type::Interface("M.I".into()))))
        );
        assert_eq!(
            resolve_type(&symbols, None, &TypeUse::named("Nope")),
            Err(TypeError::Unknown("Nope".into()))
        );
        assert!(matches!(
            resolve_type(&symbols, None, &TypeUse::named("Fut")),
            Err(TypeError::Arity { expected: 1, found: 0, .. })
        ));
    }

    #[test]
    fn test_subtyping() {
        let m = model();
        let symbols = SymbolTable::new(&m);
        let base = Type::Interface("M.Base".into());
        let i = Type::Interface("M.I".into());
        let other = Type::Interface("M.Other".into());
        let c = Type::Class("M.C".into());

        assert!(is_assignable(&symbols, &i, &base));
        assert!(!is_assignable(&symbols, &base, &i));
        assert!(is_assignable(&symbols, &c, &base));
        assert!(!is_assignable(&symbols, &c, &other));
        assert!(is_assignable(&symbols, &Type::Null, &other));
        assert!(!is_assignable(&symbols, &Type::Null, &Type::Int));
        assert!(is_assignable(&symbols, &Type::Unknown, &Type::Int));
        assert!(is_comparable(&symbols, &other, &i));
        assert!(!is_comparable(&symbols, &Type::Int, &Type::Bool));
    }
}
