//! Query masks.
//!
//! A [`QueryDescription`] is the `{all, none, any}` mask triple a declared
//! query compiles to. Matching an archetype is three word-wise tests against
//! the archetype's own mask, which is why IDs are dense and zero-based.

use serde::Serialize;

use crate::mask::{BitMask, MaskWidth};
use crate::validate::ResolvedQuery;

/// The `{all, none, any}` masks of a query over one ID space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct QueryDescription {
    pub all: BitMask,
    pub none: BitMask,
    pub any: BitMask,
}

impl QueryDescription {
    /// Whether an archetype with the given mask satisfies this query.
    ///
    /// An empty `any` mask places no constraint. A query whose `all` and
    /// `none` overlap never matches.
    #[must_use]
    pub fn matches(&self, archetype: &BitMask) -> bool {
        self.all.is_subset_of(archetype)
            && !self.none.intersects(archetype)
            && (self.any.is_empty() || self.any.intersects(archetype))
    }
}

/// Build the masks for one query from its three ID sets.
///
/// The sets are taken as given: overlap between `all` and `none` is reported
/// by validation, not here. `width` is widened if any ID does not fit, so no
/// bit is ever dropped.
#[must_use]
pub fn build_query(
    all: impl IntoIterator<Item = u32>,
    none: impl IntoIterator<Item = u32>,
    any: impl IntoIterator<Item = u32>,
    width: MaskWidth,
) -> QueryDescription {
    let all: Vec<u32> = all.into_iter().collect();
    let none: Vec<u32> = none.into_iter().collect();
    let any: Vec<u32> = any.into_iter().collect();
    let width = width.max(MaskWidth::for_ids(
        all.iter().chain(&none).chain(&any).copied(),
    ));

    QueryDescription {
        all: BitMask::from_bits(width, all),
        none: BitMask::from_bits(width, none),
        any: BitMask::from_bits(width, any),
    }
}

/// Compiled masks for one declared query.
///
/// Components and tags are numbered independently, so each gets its own
/// triple at its own width.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryMasks<'a> {
    pub name: &'a str,
    pub components: QueryDescription,
    pub tags: QueryDescription,
}

impl<'a> QueryMasks<'a> {
    /// Compile a resolved query at the given component and tag widths.
    #[must_use]
    pub fn build(
        query: &ResolvedQuery<'a>,
        component_width: MaskWidth,
        tag_width: MaskWidth,
    ) -> Self {
        Self {
            name: &query.declaration.name,
            components: build_query(
                query.all.components.iter().copied(),
                query.none.components.iter().copied(),
                query.any.components.iter().copied(),
                component_width,
            ),
            tags: build_query(
                query.all.tags.iter().copied(),
                query.none.tags.iter().copied(),
                query.any.tags.iter().copied(),
                tag_width,
            ),
        }
    }

    /// Whether an archetype with the given component and tag masks matches.
    #[must_use]
    pub fn matches(&self, components: &BitMask, tags: &BitMask) -> bool {
        self.components.matches(components) && self.tags.matches(tags)
    }
}
