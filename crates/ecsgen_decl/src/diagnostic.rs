//! Structured diagnostics.
//!
//! Every failure in a generation pass is reported as a [`Diagnostic`] rather
//! than an `Err`, so a project with one broken registry still produces the
//! others. The ordered list of diagnostics is the only side channel besides
//! the primary outputs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::declaration::SourceLocation;

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// The output is complete but something looks wrong.
    Warning,
    /// Something was dropped from the output.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// Category of a diagnostic.
///
/// # Invariant
///
/// Codes are stable: once published, a code keeps its meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// The adapter flagged the declaration as structurally invalid.
    #[serde(rename = "ECS0001")]
    StructuralDefect,
    /// A component or tag contains managed references.
    #[serde(rename = "ECS0002")]
    NotUnmanaged,
    /// A tag declares instance fields.
    #[serde(rename = "ECS0003")]
    TagHasFields,
    /// The type is nested inside a generic container.
    #[serde(rename = "ECS0004")]
    NestedInGeneric,
    /// The attached GUID does not parse.
    #[serde(rename = "ECS0005")]
    MalformedGuid,
    /// A manual ID request exceeds the configured maximum.
    #[serde(rename = "ECS0006")]
    ManualIdAboveLimit,
    /// Two declarations of one kind share a fully-qualified name.
    #[serde(rename = "ECS0007")]
    DuplicateName,
    /// Two declarations of one kind request the same manual ID.
    #[serde(rename = "ECS0008")]
    DuplicateId,
    /// The highest assigned ID exceeds the configured maximum.
    #[serde(rename = "ECS0009")]
    CapacityExceeded,
    /// A query names a type that is not a valid component or tag.
    #[serde(rename = "ECS0010")]
    UnknownReference,
    /// A query requires and excludes the same type.
    #[serde(rename = "ECS0011")]
    DuplicateUsage,
    /// An ordering relation names a system that does not exist.
    #[serde(rename = "ECS0012")]
    UnknownSystem,
    /// The system ordering relations contain a cycle.
    #[serde(rename = "ECS0013")]
    DependencyCycle,
    /// The schedule cannot be built because system IDs are unavailable.
    #[serde(rename = "ECS0014")]
    ScheduleUnavailable,
}

impl DiagnosticCode {
    /// The stable `ECSnnnn` identifier for this code.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            DiagnosticCode::StructuralDefect => "ECS0001",
            DiagnosticCode::NotUnmanaged => "ECS0002",
            DiagnosticCode::TagHasFields => "ECS0003",
            DiagnosticCode::NestedInGeneric => "ECS0004",
            DiagnosticCode::MalformedGuid => "ECS0005",
            DiagnosticCode::ManualIdAboveLimit => "ECS0006",
            DiagnosticCode::DuplicateName => "ECS0007",
            DiagnosticCode::DuplicateId => "ECS0008",
            DiagnosticCode::CapacityExceeded => "ECS0009",
            DiagnosticCode::UnknownReference => "ECS0010",
            DiagnosticCode::DuplicateUsage => "ECS0011",
            DiagnosticCode::UnknownSystem => "ECS0012",
            DiagnosticCode::DependencyCycle => "ECS0013",
            DiagnosticCode::ScheduleUnavailable => "ECS0014",
        }
    }

    /// The severity this code is always reported with.
    #[must_use]
    pub const fn severity(self) -> Severity {
        match self {
            DiagnosticCode::DuplicateUsage | DiagnosticCode::UnknownSystem => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A single diagnostic record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    /// Location of the originating declaration. `None` for cross-cutting
    /// failures such as capacity overflow or dependency cycles.
    pub location: Option<SourceLocation>,
}

impl Diagnostic {
    /// Create a diagnostic with the code's default severity and no location.
    #[must_use]
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: code.severity(),
            message: message.into(),
            location: None,
        }
    }

    /// Attach a source location, if one is known.
    #[must_use]
    pub fn at(mut self, location: Option<&SourceLocation>) -> Self {
        self.location = location.cloned();
        self
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)?;
        if let Some(location) = &self.location {
            write!(f, " ({location})")?;
        }
        Ok(())
    }
}
