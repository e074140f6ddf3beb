//! # ecsgen_core
//!
//! The part of the ECS code generator that has to be right: everything here
//! is a pure function of the declaration snapshot, and the same snapshot
//! always yields the same IDs, masks, and schedule.
//!
//! This crate provides:
//!
//! - [`validate`]: per-item structural checks that drop invalid declarations.
//! - [`allocate`]: dense, deterministic ID assignment honoring manual IDs.
//! - [`MaskWidth`] / [`BitMask`]: mask sizing and fixed-width bit vectors.
//! - [`build_query`]: `{all, none, any}` masks for declared queries.
//! - [`build_graph`] / [`detect_cycles`]: system ordering normalization and
//!   cycle detection.
//! - [`Generator`]: one full generation pass.

pub mod allocator;
pub mod generator;
pub mod graph;
pub mod mask;
pub mod query;
pub mod validate;

pub use allocator::{AllocatedId, IdSource, allocate};
pub use generator::{GenerationOutput, Generator, Registry};
pub use graph::{Schedule, SystemNode, build_graph, build_schedule, detect_cycles};
pub use mask::{BitMask, MaskWidth};
pub use query::{QueryDescription, QueryMasks, build_query};
pub use validate::{FilterIds, IdLookup, ResolvedQuery, Validated, validate, validate_query};
