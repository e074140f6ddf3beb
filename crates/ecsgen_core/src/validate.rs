//! Per-item structural validation.
//!
//! Each declaration is checked against its kind's rules. Items with a defect
//! are dropped from every later stage and reported; the rest of the batch
//! carries on. Query declarations are resolved against the allocated IDs
//! here as well, since a filter naming a dropped type is a per-item failure.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use ecsgen_decl::{
    DeclKind, Diagnostic, DiagnosticCode, GeneratorConfig, QueryDeclaration, TypeDeclaration,
};
use tracing::debug;
use uuid::Uuid;

/// Declarations of one kind that passed validation.
#[derive(Debug, Clone, Default)]
pub struct Validated<'a> {
    /// Surviving declarations, in input order.
    pub candidates: Vec<&'a TypeDeclaration>,
    pub diagnostics: Vec<Diagnostic>,
}

fn defect(decl: &TypeDeclaration, code: DiagnosticCode, message: String) -> Diagnostic {
    Diagnostic::new(code, message).at(decl.location.as_ref())
}

/// Structural checks for a single declaration. Empty means the item passes.
fn check_item(decl: &TypeDeclaration, config: &GeneratorConfig) -> Vec<Diagnostic> {
    let name = &decl.name;
    let kind = decl.kind;
    let mut defects = Vec::new();

    if !decl.is_structurally_valid {
        defects.push(defect(
            decl,
            DiagnosticCode::StructuralDefect,
            format!("{kind} '{name}' is not a valid {kind} declaration"),
        ));
    }

    if matches!(kind, DeclKind::Component | DeclKind::Tag) && !decl.is_unmanaged {
        defects.push(defect(
            decl,
            DiagnosticCode::NotUnmanaged,
            format!("{kind} '{name}' must be an unmanaged type"),
        ));
    }

    if kind == DeclKind::Tag && decl.has_instance_fields {
        defects.push(defect(
            decl,
            DiagnosticCode::TagHasFields,
            format!("tag '{name}' must not declare instance fields"),
        ));
    }

    if decl.nested_in_generic {
        defects.push(defect(
            decl,
            DiagnosticCode::NestedInGeneric,
            format!("{kind} '{name}' must not be nested inside a generic type"),
        ));
    }

    if let Some(guid) = &decl.guid
        && Uuid::parse_str(guid).is_err()
    {
        defects.push(defect(
            decl,
            DiagnosticCode::MalformedGuid,
            format!("{kind} '{name}' has malformed GUID '{guid}'"),
        ));
    }

    if let Some(id) = decl.manual_id
        && id > config.max_id
    {
        defects.push(defect(
            decl,
            DiagnosticCode::ManualIdAboveLimit,
            format!(
                "{kind} '{name}' requests ID {id}, above the maximum of {}",
                config.max_id
            ),
        ));
    }

    defects
}

/// Validate every declaration of `kind` in `declarations`, ignoring other
/// kinds.
///
/// Declarations sharing a fully-qualified name are all dropped with one
/// diagnostic per name, since neither can be told apart by the allocator's
/// name ordering.
#[must_use]
pub fn validate<'a>(
    declarations: impl IntoIterator<Item = &'a TypeDeclaration>,
    kind: DeclKind,
    config: &GeneratorConfig,
) -> Validated<'a> {
    let mut diagnostics = Vec::new();
    let mut passed = Vec::new();

    for decl in declarations.into_iter().filter(|d| d.kind == kind) {
        let defects = check_item(decl, config);
        if defects.is_empty() {
            passed.push(decl);
        } else {
            debug!(kind = %kind, name = %decl.name, defects = defects.len(), "dropping declaration");
            diagnostics.extend(defects);
        }
    }

    let mut by_name: BTreeMap<&str, usize> = BTreeMap::new();
    for decl in &passed {
        *by_name.entry(decl.name.as_str()).or_default() += 1;
    }
    let duplicated: BTreeSet<&str> = by_name
        .into_iter()
        .filter(|&(_, count)| count > 1)
        .map(|(name, _)| name)
        .collect();

    for &name in &duplicated {
        let members: Vec<&TypeDeclaration> =
            passed.iter().copied().filter(|d| d.name == name).collect();
        diagnostics.push(
            Diagnostic::new(
                DiagnosticCode::DuplicateName,
                format!(
                    "{kind} '{name}' is declared {} times; all declarations are ignored",
                    members.len()
                ),
            )
            .at(members.iter().find_map(|d| d.location.as_ref())),
        );
    }

    let candidates = passed
        .into_iter()
        .filter(|d| !duplicated.contains(d.name.as_str()))
        .collect();

    Validated {
        candidates,
        diagnostics,
    }
}

/// Name → ID lookup for one kind's allocated IDs.
pub type IdLookup<'a> = HashMap<&'a str, u32>;

/// Component and tag IDs referenced by one filter list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterIds {
    pub components: BTreeSet<u32>,
    pub tags: BTreeSet<u32>,
}

/// A query whose filter names all resolved to IDs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQuery<'a> {
    pub declaration: &'a QueryDeclaration,
    pub all: FilterIds,
    pub none: FilterIds,
    pub any: FilterIds,
}

/// Resolve a query's filter names against the component and tag IDs.
///
/// Returns `None` when a name does not resolve; the query is dropped and
/// reported. A type that is both required and excluded only warns: the query
/// can never match, which is well-defined.
#[must_use]
pub fn validate_query<'a>(
    query: &'a QueryDeclaration,
    components: &IdLookup<'_>,
    tags: &IdLookup<'_>,
) -> (Option<ResolvedQuery<'a>>, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    let mut unknown: BTreeSet<&str> = BTreeSet::new();

    let mut resolve = |names: &'a [String]| {
        let mut ids = FilterIds::default();
        for name in names {
            if let Some(&id) = components.get(name.as_str()) {
                ids.components.insert(id);
            } else if let Some(&id) = tags.get(name.as_str()) {
                ids.tags.insert(id);
            } else {
                unknown.insert(name.as_str());
            }
        }
        ids
    };

    let all = resolve(&query.all);
    let none = resolve(&query.none);
    let any = resolve(&query.any);

    let none_names: BTreeSet<&str> = query.none.iter().map(String::as_str).collect();
    let overlap: BTreeSet<&str> = query
        .all
        .iter()
        .map(String::as_str)
        .filter(|name| none_names.contains(name))
        .collect();
    if !overlap.is_empty() {
        diagnostics.push(
            Diagnostic::new(
                DiagnosticCode::DuplicateUsage,
                format!(
                    "query '{}' both requires and excludes {}; it will never match",
                    query.name,
                    overlap.into_iter().collect::<Vec<_>>().join(", ")
                ),
            )
            .at(query.location.as_ref()),
        );
    }

    if !unknown.is_empty() {
        diagnostics.push(
            Diagnostic::new(
                DiagnosticCode::UnknownReference,
                format!(
                    "query '{}' references {}, which {} not a valid component or tag",
                    query.name,
                    unknown.iter().copied().collect::<Vec<_>>().join(", "),
                    if unknown.len() == 1 { "is" } else { "are" }
                ),
            )
            .at(query.location.as_ref()),
        );
        return (None, diagnostics);
    }

    let resolved = ResolvedQuery {
        declaration: query,
        all,
        none,
        any,
    };
    (Some(resolved), diagnostics)
}

#[cfg(test)]
mod tests {
    use ecsgen_decl::SourceLocation;

    use super::*;

    fn config() -> GeneratorConfig {
        GeneratorConfig::default().with_max_id(10)
    }

    fn codes(diagnostics: &[Diagnostic]) -> Vec<DiagnosticCode> {
        diagnostics.iter().map(|d| d.code).collect()
    }

    #[test]
    fn test_valid_declarations_pass() {
        let decls = vec![
            TypeDeclaration::component("game.Position"),
            TypeDeclaration::component("game.Velocity"),
        ];
        let validated = validate(&decls, DeclKind::Component, &config());
        assert_eq!(validated.candidates.len(), 2);
        assert!(validated.diagnostics.is_empty());
    }

    #[test]
    fn test_other_kinds_are_ignored() {
        let decls = vec![
            TypeDeclaration::component("game.Position"),
            TypeDeclaration::tag("game.Frozen"),
        ];
        let validated = validate(&decls, DeclKind::Tag, &config());
        assert_eq!(validated.candidates.len(), 1);
        assert_eq!(validated.candidates[0].name, "game.Frozen");
    }

    #[test]
    fn test_structural_defects_drop_item_and_continue() {
        let mut broken = TypeDeclaration::component("game.Broken");
        broken.is_structurally_valid = false;
        let mut managed = TypeDeclaration::component("game.Managed");
        managed.is_unmanaged = false;
        let ok = TypeDeclaration::component("game.Ok");

        let decls = vec![broken, managed, ok];
        let validated = validate(&decls, DeclKind::Component, &config());
        assert_eq!(validated.candidates.len(), 1);
        assert_eq!(validated.candidates[0].name, "game.Ok");
        assert_eq!(
            codes(&validated.diagnostics),
            vec![DiagnosticCode::StructuralDefect, DiagnosticCode::NotUnmanaged]
        );
    }

    #[test]
    fn test_tag_with_fields() {
        let mut tag = TypeDeclaration::tag("game.Frozen")
            .with_location(SourceLocation::new("tags.cs", 3, 1));
        tag.has_instance_fields = true;
        let decls = vec![tag];
        let validated = validate(&decls, DeclKind::Tag, &config());
        assert!(validated.candidates.is_empty());
        assert_eq!(validated.diagnostics[0].code, DiagnosticCode::TagHasFields);
        assert_eq!(
            validated.diagnostics[0].location,
            Some(SourceLocation::new("tags.cs", 3, 1))
        );
    }

    #[test]
    fn test_systems_may_be_managed() {
        let mut system = TypeDeclaration::system("game.Move");
        system.is_unmanaged = false;
        let decls = vec![system];
        let validated = validate(&decls, DeclKind::System, &config());
        assert_eq!(validated.candidates.len(), 1);
    }

    #[test]
    fn test_nested_in_generic() {
        let mut decl = TypeDeclaration::queryable("game.Outer.Inner");
        decl.nested_in_generic = true;
        let decls = vec![decl];
        let validated = validate(&decls, DeclKind::Queryable, &config());
        assert_eq!(codes(&validated.diagnostics), vec![DiagnosticCode::NestedInGeneric]);
    }

    #[test]
    fn test_guid_validation() {
        let decls = vec![
            TypeDeclaration::component("game.Good")
                .with_guid("67e55044-10b1-426f-9247-bb680e5fe0c8"),
            TypeDeclaration::component("game.Bad").with_guid("not-a-guid"),
        ];
        let validated = validate(&decls, DeclKind::Component, &config());
        assert_eq!(validated.candidates.len(), 1);
        assert_eq!(validated.candidates[0].name, "game.Good");
        assert_eq!(codes(&validated.diagnostics), vec![DiagnosticCode::MalformedGuid]);
    }

    #[test]
    fn test_manual_id_above_limit() {
        let decls = vec![
            TypeDeclaration::tag("game.AtLimit").with_manual_id(10),
            TypeDeclaration::tag("game.Above").with_manual_id(11),
        ];
        let validated = validate(&decls, DeclKind::Tag, &config());
        assert_eq!(validated.candidates.len(), 1);
        assert_eq!(codes(&validated.diagnostics), vec![DiagnosticCode::ManualIdAboveLimit]);
    }

    #[test]
    fn test_multiple_defects_reported_together() {
        let mut decl = TypeDeclaration::tag("game.Worst").with_guid("zzz");
        decl.has_instance_fields = true;
        decl.is_unmanaged = false;
        let decls = vec![decl];
        let validated = validate(&decls, DeclKind::Tag, &config());
        assert_eq!(
            codes(&validated.diagnostics),
            vec![
                DiagnosticCode::NotUnmanaged,
                DiagnosticCode::TagHasFields,
                DiagnosticCode::MalformedGuid
            ]
        );
    }

    #[test]
    fn test_duplicate_names_drop_all_members() {
        let decls = vec![
            TypeDeclaration::component("game.Twice"),
            TypeDeclaration::component("game.Once"),
            TypeDeclaration::component("game.Twice"),
        ];
        let validated = validate(&decls, DeclKind::Component, &config());
        assert_eq!(validated.candidates.len(), 1);
        assert_eq!(validated.candidates[0].name, "game.Once");
        assert_eq!(codes(&validated.diagnostics), vec![DiagnosticCode::DuplicateName]);
    }

    fn lookups() -> (IdLookup<'static>, IdLookup<'static>) {
        let components = HashMap::from([("Position", 0), ("Velocity", 1)]);
        let tags = HashMap::from([("Frozen", 0)]);
        (components, tags)
    }

    #[test]
    fn test_query_resolves_components_and_tags() {
        let (components, tags) = lookups();
        let query = QueryDeclaration::new("moving")
            .all("Position")
            .all("Velocity")
            .none("Frozen");
        let (resolved, diagnostics) = validate_query(&query, &components, &tags);
        let resolved = resolved.unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(resolved.all.components, BTreeSet::from([0, 1]));
        assert_eq!(resolved.none.tags, BTreeSet::from([0]));
        assert!(resolved.any.components.is_empty());
    }

    #[test]
    fn test_query_unknown_reference_drops_query() {
        let (components, tags) = lookups();
        let query = QueryDeclaration::new("broken").all("Position").any("Missing");
        let (resolved, diagnostics) = validate_query(&query, &components, &tags);
        assert!(resolved.is_none());
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::UnknownReference]);
        assert!(diagnostics[0].message.contains("Missing"));
    }

    #[test]
    fn test_query_all_none_overlap_is_a_warning() {
        let (components, tags) = lookups();
        let query = QueryDeclaration::new("never").all("Position").none("Position");
        let (resolved, diagnostics) = validate_query(&query, &components, &tags);
        assert!(resolved.is_some());
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::DuplicateUsage]);
        assert!(!diagnostics[0].is_error());
    }
}
