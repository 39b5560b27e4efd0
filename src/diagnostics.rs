//! # Diagnostics Module
//!
//! Non-fatal findings reported while loading and compiling a schema dump.
//!
//! The controller's schema is weakly typed and occasionally inconsistent. Nothing in
//! it is allowed to abort a generation run: an unknown selector, an unexpected device
//! class, or an enum entity without its options list degrade to a looser type and
//! leave a [`Diagnostic`] behind that names the offending domain, service, entity or
//! field.
//!
//! ## Usage
//!
//! ```rust
//! use hatyper::diagnostics::{Diagnostic, Diagnostics, Severity};
//!
//! let mut diagnostics = Diagnostics::default();
//! diagnostics.push(Diagnostic::new(
//!     "service:light.turn_on/field:flash",
//!     Severity::Warning,
//!     "unknown_selector",
//!     "no type rule matches selector {\"weird\":null}",
//! ));
//! assert_eq!(diagnostics.warnings().count(), 1);
//! ```

use std::fmt;

/// Severity level for a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Something was degraded (typed looser than it could be, or skipped)
    Warning,
    /// Informational only, output is unaffected
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A finding about the schema dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Where the issue occurred (e.g., "entity:sensor.power", "service:light.turn_on/field:flash")
    pub location: String,
    /// Severity of the issue
    pub severity: Severity,
    /// Machine-readable kind (e.g., "unknown_selector", "unknown_device_class")
    pub kind: String,
    /// Human-readable description
    pub message: String,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(
        location: impl Into<String>,
        severity: Severity,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Diagnostic {
            location: location.into(),
            severity,
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a warning
    pub fn warning(
        location: impl Into<String>,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(location, Severity::Warning, kind, message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}): {}",
            self.severity, self.location, self.kind, self.message
        )
    }
}

/// Ordered collection of diagnostics for one run.
///
/// Pushed diagnostics are traced at `debug`; the user-facing report is
/// [`print_diagnostics`].
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Record a diagnostic
    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(
            location = %diagnostic.location,
            severity = %diagnostic.severity,
            kind = %diagnostic.kind,
            "{}",
            diagnostic.message
        );
        self.items.push(diagnostic);
    }

    /// Move all diagnostics of `other` into `self`, keeping order
    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    /// All warnings, in the order they were recorded
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    /// Whether a diagnostic of the given kind was recorded
    pub fn has_kind(&self, kind: &str) -> bool {
        self.items.iter().any(|d| d.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

/// Print a summary of diagnostics to stderr
///
/// Diagnostics never change the exit status of a run.
pub fn print_diagnostics(diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    eprintln!(
        "\n⚠️  Schema compiled with {} diagnostic(s):\n",
        diagnostics.len()
    );
    for diagnostic in diagnostics {
        eprintln!("{diagnostic}");
    }
    eprintln!();
}
