//! Declaration manifest: the serialized form of one declaration snapshot.
//!
//! The discovery step that turns annotated source into declarations lives
//! outside the generator. It hands over a JSON manifest; this module loads it.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GeneratorConfig;
use crate::declaration::{DeclKind, QueryDeclaration, TypeDeclaration};

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid manifest: {0}")]
    Json(#[from] serde_json::Error),
}

/// A complete declaration snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub config: GeneratorConfig,
    #[serde(default)]
    pub declarations: Vec<TypeDeclaration>,
    #[serde(default)]
    pub queries: Vec<QueryDeclaration>,
}

impl Manifest {
    /// Read and parse a manifest file.
    pub fn load_file(path: &Path) -> Result<Self, ManifestError> {
        let source = std::fs::read_to_string(path)?;
        Self::load_source(&source)
    }

    /// Parse a manifest from a JSON string.
    pub fn load_source(source: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Declarations of one kind, in input order.
    pub fn of_kind(&self, kind: DeclKind) -> impl Iterator<Item = &TypeDeclaration> {
        self.declarations.iter().filter(move |d| d.kind == kind)
    }
}
