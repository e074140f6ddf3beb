//! Declaration records supplied by the discovery adapter.
//!
//! A [`TypeDeclaration`] is the normalized form of one annotated type
//! (component, tag, queryable, or system). The generator never looks at
//! source syntax: whatever discovers the declarations reports the structural
//! facts it knows, and the validator decides what to keep.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of an annotated declaration.
///
/// Each kind is numbered in its own ID space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    /// A data-carrying type attachable to an entity.
    Component,
    /// A zero-size marker type used only for filtering.
    Tag,
    /// A type that can appear as a query target.
    Queryable,
    /// A system participating in the schedule.
    System,
}

impl DeclKind {
    /// All kinds, in the order a generation pass processes them.
    pub const ALL: [DeclKind; 4] = [
        DeclKind::Component,
        DeclKind::Tag,
        DeclKind::Queryable,
        DeclKind::System,
    ];

    /// Lowercase name used in diagnostics and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            DeclKind::Component => "component",
            DeclKind::Tag => "tag",
            DeclKind::Queryable => "queryable",
            DeclKind::System => "system",
        }
    }
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a declaration was found.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    #[must_use]
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

fn default_true() -> bool {
    true
}

fn default_alignment() -> u32 {
    1
}

/// One annotated type, as reported by the discovery adapter.
///
/// Produced once per generation pass and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDeclaration {
    /// Fully-qualified type name, e.g. `"game.physics.Velocity"`.
    pub name: String,
    pub kind: DeclKind,
    /// Aggregate structural verdict from the adapter.
    #[serde(default = "default_true")]
    pub is_structurally_valid: bool,
    /// Whether the type declares instance fields. Only checked for tags.
    #[serde(default)]
    pub has_instance_fields: bool,
    /// Whether the type contains no managed references.
    #[serde(default = "default_true")]
    pub is_unmanaged: bool,
    /// Whether the type is declared inside a generic container type.
    #[serde(default)]
    pub nested_in_generic: bool,
    /// Alignment in bytes. Only meaningful for components.
    #[serde(default = "default_alignment")]
    pub alignment: u32,
    /// User-pinned ID request.
    #[serde(default)]
    pub manual_id: Option<u32>,
    /// Optional stable GUID attached to the type.
    #[serde(default)]
    pub guid: Option<String>,
    /// Systems this system must run after. Only meaningful for systems.
    #[serde(default)]
    pub after: Vec<String>,
    /// Systems this system must run before. Only meaningful for systems.
    #[serde(default)]
    pub before: Vec<String>,
    #[serde(default)]
    pub location: Option<SourceLocation>,
}

impl TypeDeclaration {
    /// Create a structurally valid declaration with no manual ID.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: DeclKind) -> Self {
        Self {
            name: name.into(),
            kind,
            is_structurally_valid: true,
            has_instance_fields: false,
            is_unmanaged: true,
            nested_in_generic: false,
            alignment: 1,
            manual_id: None,
            guid: None,
            after: Vec::new(),
            before: Vec::new(),
            location: None,
        }
    }

    #[must_use]
    pub fn component(name: impl Into<String>) -> Self {
        Self::new(name, DeclKind::Component)
    }

    #[must_use]
    pub fn tag(name: impl Into<String>) -> Self {
        Self::new(name, DeclKind::Tag)
    }

    #[must_use]
    pub fn queryable(name: impl Into<String>) -> Self {
        Self::new(name, DeclKind::Queryable)
    }

    #[must_use]
    pub fn system(name: impl Into<String>) -> Self {
        Self::new(name, DeclKind::System)
    }

    /// Pin the declaration to a manual ID.
    #[must_use]
    pub fn with_manual_id(mut self, id: u32) -> Self {
        self.manual_id = Some(id);
        self
    }

    #[must_use]
    pub fn with_alignment(mut self, alignment: u32) -> Self {
        self.alignment = alignment;
        self
    }

    #[must_use]
    pub fn with_guid(mut self, guid: impl Into<String>) -> Self {
        self.guid = Some(guid.into());
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Declare that this system runs after `other`.
    #[must_use]
    pub fn after(mut self, other: impl Into<String>) -> Self {
        self.after.push(other.into());
        self
    }

    /// Declare that this system runs before `other`.
    #[must_use]
    pub fn before(mut self, other: impl Into<String>) -> Self {
        self.before.push(other.into());
        self
    }
}

/// A declared query filter, naming components and tags by their
/// fully-qualified names.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryDeclaration {
    pub name: String,
    /// Every one of these must be present.
    #[serde(default)]
    pub all: Vec<String>,
    /// None of these may be present.
    #[serde(default)]
    pub none: Vec<String>,
    /// At least one of these must be present (ignored when empty).
    #[serde(default)]
    pub any: Vec<String>,
    #[serde(default)]
    pub location: Option<SourceLocation>,
}

impl QueryDeclaration {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn all(mut self, name: impl Into<String>) -> Self {
        self.all.push(name.into());
        self
    }

    #[must_use]
    pub fn none(mut self, name: impl Into<String>) -> Self {
        self.none.push(name.into());
        self
    }

    #[must_use]
    pub fn any(mut self, name: impl Into<String>) -> Self {
        self.any.push(name.into());
        self
    }
}
