//! # ecsgen_decl
//!
//! The input and output vocabulary of the ECS code generator.
//!
//! This crate provides:
//!
//! - [`TypeDeclaration`]: one annotated component, tag, queryable, or system.
//! - [`QueryDeclaration`]: a declared `all`/`none`/`any` filter.
//! - [`Diagnostic`]: structured failure records with stable codes.
//! - [`Outcome`]: the tagged result every generation stage returns.
//! - [`GeneratorConfig`]: project-wide constants such as the maximum ID.
//! - [`Manifest`]: a serialized declaration snapshot.

pub mod config;
pub mod declaration;
pub mod diagnostic;
pub mod manifest;
pub mod outcome;

pub use config::GeneratorConfig;
pub use declaration::{DeclKind, QueryDeclaration, SourceLocation, TypeDeclaration};
pub use diagnostic::{Diagnostic, DiagnosticCode, Severity};
pub use manifest::{Manifest, ManifestError};
pub use outcome::Outcome;
