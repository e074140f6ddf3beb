//! One generation pass over a declaration snapshot.
//!
//! Wires the stages together:
//!
//! ```text
//! declarations ─► validate ─► allocate ─► mask width ─► query masks
//!                                  └─────► system graph ─► cycle check
//! ```
//!
//! Every kind is processed independently, so one rejected registry never
//! takes the others down with it. Nothing is cached between passes.

use ecsgen_decl::{
    DeclKind, Diagnostic, DiagnosticCode, GeneratorConfig, Outcome, QueryDeclaration,
    TypeDeclaration,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::allocator::{AllocatedId, allocate};
use crate::graph::{Schedule, build_schedule};
use crate::mask::MaskWidth;
use crate::query::QueryMasks;
use crate::validate::{IdLookup, validate, validate_query};

/// The allocated IDs of one kind plus the mask width they need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registry<'a> {
    pub kind: DeclKind,
    /// IDs in ascending order.
    pub ids: Vec<AllocatedId<'a>>,
    pub mask_width: MaskWidth,
    /// Set for components whose mask is wider than the custom-storage
    /// threshold and needs an explicitly-sized representation.
    pub requires_custom_storage: bool,
}

impl<'a> Registry<'a> {
    /// The ID assigned to `name`, if any.
    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<u32> {
        self.ids.iter().find(|id| id.name() == name).map(|id| id.value)
    }

    /// Name → ID lookup over this registry.
    #[must_use]
    pub fn lookup(&self) -> IdLookup<'a> {
        self.ids.iter().map(|id| (id.owner.name.as_str(), id.value)).collect()
    }
}

/// Everything one generation pass produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationOutput<'a> {
    pub components: Outcome<Registry<'a>>,
    pub tags: Outcome<Registry<'a>>,
    pub queryables: Outcome<Registry<'a>>,
    pub systems: Outcome<Registry<'a>>,
    pub queries: Outcome<Vec<QueryMasks<'a>>>,
    pub schedule: Outcome<Schedule<'a>>,
}

impl<'a> GenerationOutput<'a> {
    /// The registry for `kind`.
    #[must_use]
    pub fn registry(&self, kind: DeclKind) -> &Outcome<Registry<'a>> {
        match kind {
            DeclKind::Component => &self.components,
            DeclKind::Tag => &self.tags,
            DeclKind::Queryable => &self.queryables,
            DeclKind::System => &self.systems,
        }
    }

    /// Every diagnostic of the pass, in stage order.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.components
            .diagnostics()
            .iter()
            .chain(self.tags.diagnostics())
            .chain(self.queryables.diagnostics())
            .chain(self.systems.diagnostics())
            .chain(self.queries.diagnostics())
            .chain(self.schedule.diagnostics())
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics().any(Diagnostic::is_error)
    }
}

/// Runs generation passes with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    #[must_use]
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Validate and allocate one kind.
    #[must_use]
    pub fn registry<'a>(
        &self,
        declarations: &'a [TypeDeclaration],
        kind: DeclKind,
    ) -> Outcome<Registry<'a>> {
        let validated = validate(declarations, kind, &self.config);
        debug!(
            kind = %kind,
            candidates = validated.candidates.len(),
            dropped = validated.diagnostics.len(),
            "validated declarations"
        );

        allocate(&validated.candidates, kind, self.config.max_id)
            .map(|ids| {
                let mask_width = MaskWidth::for_ids(ids.iter().map(|id| id.value));
                let requires_custom_storage = kind == DeclKind::Component
                    && mask_width.bits() > self.config.custom_storage_threshold as usize;
                Registry {
                    kind,
                    ids,
                    mask_width,
                    requires_custom_storage,
                }
            })
            .with_leading(validated.diagnostics)
    }

    /// Run a full pass over one declaration snapshot.
    #[must_use]
    pub fn run<'a>(
        &self,
        declarations: &'a [TypeDeclaration],
        queries: &'a [QueryDeclaration],
    ) -> GenerationOutput<'a> {
        let components = self.registry(declarations, DeclKind::Component);
        let tags = self.registry(declarations, DeclKind::Tag);
        let queryables = self.registry(declarations, DeclKind::Queryable);
        let systems = self.registry(declarations, DeclKind::System);

        let queries = compile_queries(queries, components.value(), tags.value());

        let schedule = match systems.value() {
            Some(registry) => build_schedule(&registry.ids),
            None => Outcome::Rejected(vec![Diagnostic::new(
                DiagnosticCode::ScheduleUnavailable,
                "system IDs could not be allocated; no schedule is generated",
            )]),
        };

        let output = GenerationOutput {
            components,
            tags,
            queryables,
            systems,
            queries,
            schedule,
        };
        info!(
            diagnostics = output.diagnostics().count(),
            errors = output.has_errors(),
            "generation pass complete"
        );
        output
    }
}

fn compile_queries<'a>(
    queries: &'a [QueryDeclaration],
    components: Option<&Registry<'a>>,
    tags: Option<&Registry<'a>>,
) -> Outcome<Vec<QueryMasks<'a>>> {
    let component_ids = components.map(Registry::lookup).unwrap_or_default();
    let tag_ids = tags.map(Registry::lookup).unwrap_or_default();
    let component_width = components.map_or(MaskWidth::MIN, |r| r.mask_width);
    let tag_width = tags.map_or(MaskWidth::MIN, |r| r.mask_width);

    let mut diagnostics = Vec::new();
    let mut compiled = Vec::with_capacity(queries.len());
    for query in queries {
        let (resolved, raised) = validate_query(query, &component_ids, &tag_ids);
        diagnostics.extend(raised);
        if let Some(resolved) = resolved {
            compiled.push(QueryMasks::build(&resolved, component_width, tag_width));
        }
    }
    debug!(declared = queries.len(), compiled = compiled.len(), "compiled queries");
    Outcome::from_parts(compiled, diagnostics)
}

#[cfg(test)]
mod tests {
    use ecsgen_decl::Severity;

    use super::*;
    use crate::mask::BitMask;

    fn generator(max_id: u32) -> Generator {
        Generator::new(GeneratorConfig::default().with_max_id(max_id))
    }

    fn registry<'o, 'a>(outcome: &'o Outcome<Registry<'a>>) -> &'o Registry<'a> {
        outcome.value().expect("registry rejected")
    }

    #[test]
    fn test_scenario_alignment_ordering() {
        let decls = vec![
            TypeDeclaration::component("A").with_alignment(8),
            TypeDeclaration::component("B").with_alignment(4),
            TypeDeclaration::component("C").with_alignment(8),
        ];
        let output = generator(10).run(&decls, &[]);
        let components = registry(&output.components);
        assert_eq!(components.id_of("A"), Some(0));
        assert_eq!(components.id_of("C"), Some(1));
        assert_eq!(components.id_of("B"), Some(2));
        assert_eq!(components.mask_width.bits(), 32);
    }

    #[test]
    fn test_scenario_manual_and_auto() {
        let decls = vec![
            TypeDeclaration::component("X").with_manual_id(5),
            TypeDeclaration::component("Y"),
        ];
        let output = generator(10).run(&decls, &[]);
        let components = registry(&output.components);
        assert_eq!(components.id_of("X"), Some(5));
        assert_eq!(components.id_of("Y"), Some(0));
    }

    #[test]
    fn test_scenario_forty_tags() {
        let decls: Vec<_> = (0..40)
            .map(|i| TypeDeclaration::tag(format!("game.Tag{i:02}")))
            .collect();
        let output = generator(100).run(&decls, &[]);
        assert_eq!(registry(&output.tags).mask_width.bits(), 64);
        assert_eq!(registry(&output.tags).ids.len(), 40);
    }

    #[test]
    fn test_scenario_schedule() {
        let decls = vec![
            TypeDeclaration::system("S1").after("S2"),
            TypeDeclaration::system("S2").before("S3"),
            TypeDeclaration::system("S3"),
        ];
        let output = generator(10).run(&decls, &[]);
        let schedule = output.schedule.value().unwrap();
        let s2 = registry(&output.systems).id_of("S2").unwrap();
        assert_eq!(schedule.predecessors_of("S1").unwrap().iter().copied().collect::<Vec<_>>(), vec![s2]);
        assert_eq!(schedule.predecessors_of("S3").unwrap().iter().copied().collect::<Vec<_>>(), vec![s2]);
        assert!(schedule.predecessors_of("S2").unwrap().is_empty());
        assert!(!output.has_errors());
    }

    #[test]
    fn test_scenario_cycle() {
        let decls = vec![
            TypeDeclaration::system("S1").after("S2"),
            TypeDeclaration::system("S2").after("S1"),
        ];
        let output = generator(10).run(&decls, &[]);
        assert!(output.schedule.is_rejected());
        // The system registry itself is still produced.
        assert_eq!(registry(&output.systems).ids.len(), 2);
        let cycle: Vec<_> = output
            .diagnostics()
            .filter(|d| d.code == DiagnosticCode::DependencyCycle)
            .collect();
        assert_eq!(cycle.len(), 1);
        assert!(cycle[0].message.contains("S1") && cycle[0].message.contains("S2"));
    }

    #[test]
    fn test_scenario_duplicate_manual_ids() {
        let decls = vec![
            TypeDeclaration::component("P").with_manual_id(3),
            TypeDeclaration::component("Q").with_manual_id(3),
        ];
        let output = generator(10).run(&decls, &[]);
        let components = registry(&output.components);
        assert!(components.ids.is_empty());
        let duplicates: Vec<_> = output
            .diagnostics()
            .filter(|d| d.code == DiagnosticCode::DuplicateId)
            .collect();
        assert_eq!(duplicates.len(), 1);
        assert!(duplicates[0].message.contains('P') && duplicates[0].message.contains('Q'));
    }

    #[test]
    fn test_capacity_failure_is_isolated_to_its_kind() {
        let mut decls: Vec<_> = (0..5)
            .map(|i| TypeDeclaration::component(format!("C{i}")))
            .collect();
        decls.push(TypeDeclaration::tag("T"));
        let output = generator(3).run(&decls, &[]);

        assert!(output.components.is_rejected());
        assert_eq!(registry(&output.tags).id_of("T"), Some(0));
        assert!(output.has_errors());
    }

    #[test]
    fn test_validation_failures_are_partial() {
        let mut bad = TypeDeclaration::tag("Bad");
        bad.has_instance_fields = true;
        let decls = vec![bad, TypeDeclaration::tag("Good")];
        let output = generator(10).run(&decls, &[]);
        assert!(matches!(output.tags, Outcome::PartialOk(..)));
        assert_eq!(registry(&output.tags).id_of("Good"), Some(0));
        assert_eq!(registry(&output.tags).id_of("Bad"), None);
    }

    #[test]
    fn test_empty_snapshot() {
        let output = generator(10).run(&[], &[]);
        for kind in DeclKind::ALL {
            let reg = registry(output.registry(kind));
            assert!(reg.ids.is_empty());
            assert_eq!(reg.mask_width, MaskWidth::MIN);
        }
        assert!(output.schedule.value().unwrap().nodes.is_empty());
        assert_eq!(output.diagnostics().count(), 0);
    }

    #[test]
    fn test_custom_storage_threshold() {
        let decls = vec![
            TypeDeclaration::component("Wide").with_manual_id(1100),
            TypeDeclaration::tag("WideTag").with_manual_id(1100),
        ];
        let output = generator(2000).run(&decls, &[]);
        let components = registry(&output.components);
        assert_eq!(components.mask_width.bits(), 1280);
        assert!(components.requires_custom_storage);
        // Tags never need custom storage.
        assert!(!registry(&output.tags).requires_custom_storage);
    }

    #[test]
    fn test_queries_compile_against_registries() {
        let decls = vec![
            TypeDeclaration::component("Position").with_alignment(4),
            TypeDeclaration::component("Velocity").with_alignment(4),
            TypeDeclaration::tag("Frozen"),
        ];
        let queries = vec![
            QueryDeclaration::new("moving")
                .all("Position")
                .all("Velocity")
                .none("Frozen"),
            QueryDeclaration::new("broken").all("Missing"),
        ];
        let output = generator(10).run(&decls, &queries);

        let compiled = output.queries.value().unwrap();
        assert_eq!(compiled.len(), 1);
        let moving = &compiled[0];
        assert_eq!(moving.name, "moving");

        let components = registry(&output.components);
        let width = components.mask_width;
        let both = BitMask::from_bits(width, [0, 1]);
        let no_tags = BitMask::new(registry(&output.tags).mask_width);
        let frozen = BitMask::from_bits(registry(&output.tags).mask_width, [0]);
        assert!(moving.matches(&both, &no_tags));
        assert!(!moving.matches(&both, &frozen));
        assert!(!moving.matches(&BitMask::from_bits(width, [0]), &no_tags));

        let severities: Vec<_> = output.queries.diagnostics().iter().map(|d| d.severity).collect();
        assert_eq!(severities, vec![Severity::Error]);
    }

    #[test]
    fn test_rejected_systems_reject_schedule() {
        let decls: Vec<_> = (0..3)
            .map(|i| TypeDeclaration::system(format!("S{i}")))
            .collect();
        let output = generator(1).run(&decls, &[]);
        assert!(output.systems.is_rejected());
        assert!(output.schedule.is_rejected());
        assert_eq!(
            output.schedule.diagnostics()[0].code,
            DiagnosticCode::ScheduleUnavailable
        );
    }

    #[test]
    fn test_passes_are_repeatable() {
        let decls = vec![
            TypeDeclaration::component("A").with_alignment(16),
            TypeDeclaration::component("B").with_manual_id(0),
            TypeDeclaration::tag("T"),
            TypeDeclaration::system("S1").after("S2"),
            TypeDeclaration::system("S2"),
        ];
        let queries = vec![QueryDeclaration::new("q").all("A").none("T")];
        let generator = generator(10);
        let first = generator.run(&decls, &queries);
        let second = generator.run(&decls, &queries);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
