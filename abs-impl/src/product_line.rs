//! Product-line resolution: from a product declaration to the ordered list
//! of deltas that derive it.

use crate::delta::ProductConfig;
use abs_grammar::diagnostics::{Diagnostic, DiagnosticKind};
use abs_grammar::nodes::{DeltaDecl, Model};
use abs_grammar::symbol_table::SymbolTable;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductLineError {
    #[error("product {0} is not declared")]
    UnknownProduct(String),
    #[error("product {name} is {reason}")]
    AmbiguousProduct { name: String, reason: String },
    #[error("delta ordering constraints form a cycle among: {}", .0.join(", "))]
    CyclicDeltaOrder(Vec<String>),
}

impl ProductLineError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        let kind = match self {
            ProductLineError::UnknownProduct(_) => DiagnosticKind::UnknownProduct,
            ProductLineError::AmbiguousProduct { .. } => DiagnosticKind::AmbiguousName,
            ProductLineError::CyclicDeltaOrder(_) => DiagnosticKind::CyclicDeltaOrder,
        };
        Diagnostic::error(kind, self.to_string())
    }
}

/// Ordering edges `(before, after)` between `deltas`, by index, from every
/// `after` and `before` clause naming another delta of the list.
pub fn ordering_edges(deltas: &[&DeltaDecl]) -> Vec<(usize, usize)> {
    let index_of = |name: &str| deltas.iter().position(|d| d.name == name);
    let mut edges = BTreeSet::new();
    for (i, d) in deltas.iter().enumerate() {
        for a in &d.after {
            if let Some(j) = index_of(a) {
                edges.insert((j, i));
            }
        }
        for b in &d.before {
            if let Some(j) = index_of(b) {
                edges.insert((i, j));
            }
        }
    }
    edges.into_iter().collect()
}

/// Stable topological order of `deltas`: among the deltas whose
/// predecessors are all placed, the earliest in the list goes next.
///
/// On a cycle, returns the names of the deltas that could not be placed.
pub fn order_deltas(deltas: &[&DeltaDecl]) -> Result<Vec<usize>, Vec<String>> {
    let edges = ordering_edges(deltas);
    let mut indegree = vec![0usize; deltas.len()];
    for &(_, to) in &edges {
        indegree[to] += 1;
    }

    let mut ready: BTreeSet<usize> = (0..deltas.len()).filter(|&i| indegree[i] == 0).collect();
    let mut order = Vec::with_capacity(deltas.len());
    while let Some(next) = ready.pop_first() {
        order.push(next);
        for &(from, to) in &edges {
            if from == next {
                indegree[to] -= 1;
                if indegree[to] == 0 {
                    ready.insert(to);
                }
            }
        }
    }

    if order.len() == deltas.len() {
        Ok(order)
    } else {
        Err((0..deltas.len())
            .filter(|i| !order.contains(i))
            .map(|i| deltas[i].name.clone())
            .collect())
    }
}

/// Delta list for product `name`.
///
/// A delta without a `when` clause applies to every product. Selected deltas
/// are ordered by their `after`/`before` constraints, ties broken by
/// declaration order.
#[tracing::instrument(skip(model))]
pub fn resolve_product(model: &Model, name: &str) -> Result<ProductConfig, ProductLineError> {
    let symbols = SymbolTable::new(model);
    let product = symbols.products.resolve(None, name).map_err(|e| match e {
        abs_grammar::symbol_table::LookupError::Unresolved => {
            ProductLineError::UnknownProduct(name.to_string())
        }
        ambiguous => ProductLineError::AmbiguousProduct {
            name: name.to_string(),
            reason: ambiguous.to_string(),
        },
    })?;
    let features = product.feature_set();

    let selected: Vec<&DeltaDecl> = model
        .deltas()
        .filter(|d| d.condition.as_ref().map_or(true, |c| c.holds(&features)))
        .collect();

    let order = order_deltas(&selected).map_err(ProductLineError::CyclicDeltaOrder)?;
    let deltas: Vec<String> = order.into_iter().map(|i| selected[i].name.clone()).collect();
    tracing::debug!(product = %name, ?deltas, "resolved product");

    Ok(ProductConfig {
        product: Some(product.name.clone()),
        deltas,
    })
}
