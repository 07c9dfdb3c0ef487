//! Diagnostics Sink
//!
//! An append-only, ordered list of findings. Every phase appends to it and
//! callers read it between phases to decide whether to continue. Findings are
//! never edited or removed once appended.

use crate::nodes::Location;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Kind tag of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DiagnosticKind {
    Syntax,
    // name resolution
    DuplicateModule,
    UnresolvedName,
    AmbiguousName,
    CyclicInheritance,
    // structural composition
    DuplicateDeclaration,
    RemoveTargetNotFound,
    ModifyTargetNotFound,
    RemoveMissingMethod,
    DuplicateMethod,
    NoOriginalMethod,
    CyclicTraitDefinition,
    // product line
    UnknownProduct,
    UnknownDelta,
    InvalidDeltaOrder,
    CyclicDeltaOrder,
    // type checking
    MissingInterfaceMethod,
    UnknownType,
    UnknownClass,
    UnknownVariable,
    UnknownMethod,
    UnknownField,
    WrongArgumentCount,
    TypeMismatch,
    /// Reported by a registered type-system extension.
    Extension,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    pub location: Option<Location>,
    /// Name of the extension that produced this finding.
    pub origin: Option<String>,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            message: message.into(),
            location: None,
            origin: None,
        }
    }

    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(kind, message)
        }
    }

    pub fn info(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            ..Self::error(kind, message)
        }
    }

    pub fn at(mut self, location: Option<&Location>) -> Self {
        self.location = location.cloned();
        self
    }

    pub fn from_extension(mut self, name: impl Into<String>) -> Self {
        self.origin = Some(name.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(location) = &self.location {
            write!(f, "{}: ", location)?;
        }
        write!(f, "{}[{}]", self.severity, self.kind)?;
        if let Some(origin) = &self.origin {
            write!(f, "({})", origin)?;
        }
        write!(f, ": {}", self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(kind = %diagnostic.kind, message = %diagnostic.message, "diagnostic");
        self.items.push(diagnostic);
    }

    /// Appends every finding of `other`, keeping its order.
    pub fn append(&mut self, other: Diagnostics) {
        for d in other.items {
            self.push(d);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.items.iter().filter(|d| d.is_error()).count()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.is_error())
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.kind == kind)
    }

    pub fn count_of(&self, kind: DiagnosticKind) -> usize {
        self.of_kind(kind).count()
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.items
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<T: IntoIterator<Item = Diagnostic>>(&mut self, iter: T) {
        for d in iter {
            self.push(d);
        }
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_keeps_order() {
        let mut first = Diagnostics::new();
        first.push(Diagnostic::error(DiagnosticKind::DuplicateMethod, "a"));
        let mut second = Diagnostics::new();
        second.push(Diagnostic::warning(DiagnosticKind::Extension, "b"));
        second.push(Diagnostic::error(DiagnosticKind::UnknownType, "c"));
        first.append(second);

        let messages: Vec<&str> = first.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["a", "b", "c"]);
        assert_eq!(first.error_count(), 2);
        assert!(first.has_errors());
    }

    #[test]
    fn test_display_with_location_and_origin() {
        let d = Diagnostic::warning(DiagnosticKind::Extension, "far call")
            .at(Some(&Location::new(Some("a.abs".into()), 3, 7)))
            .from_extension("location-types");
        assert_eq!(
            d.to_string(),
            "a.abs:3:7: warning[Extension](location-types): far call"
        );
    }

    #[test]
    fn test_warnings_are_not_errors() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::info(DiagnosticKind::Extension, "stats"));
        assert!(!diags.has_errors());
        assert_eq!(diags.count_of(DiagnosticKind::Extension), 1);
    }
}
