//! Union (couple / single parent) detection.

use crate::graph::FamilyGraph;
use indexmap::IndexMap;

/// A parental grouping: one or two parents and the children they share, or a recorded couple
/// without children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Union {
    /// `p1` or `p1&p2`, parents in layout order.
    pub id: String,
    /// One or two parent ids, in layout order.
    pub parents: Vec<String>,
    /// Children in layout order.
    pub children: Vec<String>,
    /// `true` only for two parents with a recorded spouse relationship.
    pub explicit: bool,
    pub(crate) parent_ixs: Vec<usize>,
    pub(crate) child_ixs: Vec<usize>,
}

impl Union {
    pub fn spouse1(&self) -> &str {
        &self.parents[0]
    }

    pub fn spouse2(&self) -> Option<&str> {
        self.parents.get(1).map(String::as_str)
    }

    pub fn is_childless(&self) -> bool {
        self.children.is_empty()
    }

    pub fn branch_color(&self) -> &'static str {
        branch_color(&self.id)
    }
}

/// Groups children by their full parent set.
///
/// Unions are ordered by their parents in layout order (first parent, then second, single
/// parents before couples); recorded couples without children come last.
pub fn resolve_unions(graph: &FamilyGraph) -> Vec<Union> {
    let mut by_parents: IndexMap<(usize, Option<usize>), Vec<usize>> = IndexMap::new();

    for child in 0..graph.len() {
        let parents = graph.parent_ixs(child);
        let key = match parents.as_slice() {
            [] => continue,
            [p] => (*p, None),
            [p1, p2] => (*p1, Some(*p2)),
            [p1, p2, rest @ ..] => {
                tracing::warn!(
                    child = %graph.id_at(child),
                    extra_parents = rest.len(),
                    "more than two parents recorded; using the first two in layout order"
                );
                (*p1, Some(*p2))
            }
        };
        by_parents.entry(key).or_default().push(child);
    }

    for (a, b) in graph.spouse_pairs() {
        by_parents.entry((a, Some(b))).or_default();
    }

    let mut unions: Vec<Union> = by_parents
        .into_iter()
        .map(|((p1, p2), child_ixs)| {
            let parent_ixs: Vec<usize> = std::iter::once(p1).chain(p2).collect();
            let parents: Vec<String> = parent_ixs
                .iter()
                .map(|&ix| graph.id_at(ix).to_string())
                .collect();
            let explicit = match p2 {
                Some(p2) => graph.is_explicit_spouse_pair(graph.id_at(p1), graph.id_at(p2)),
                None => false,
            };
            Union {
                id: parents.join("&"),
                children: child_ixs
                    .iter()
                    .map(|&ix| graph.id_at(ix).to_string())
                    .collect(),
                parents,
                explicit,
                parent_ixs,
                child_ixs,
            }
        })
        .collect();
    unions.sort_by(|a, b| {
        a.is_childless()
            .cmp(&b.is_childless())
            .then_with(|| a.parent_ixs.cmp(&b.parent_ixs))
    });

    tracing::debug!(
        unions = unions.len(),
        explicit = unions.iter().filter(|u| u.explicit).count(),
        "unions resolved"
    );
    unions
}

const BRANCH_COLORS: [&str; 10] = [
    "#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f", "#edc948", "#b07aa1", "#ff9da7",
    "#9c755f", "#bab0ac",
];

/// Rendering hint derived from the union id alone (FNV-1a), so it is stable across runs and
/// platforms.
pub fn branch_color(union_id: &str) -> &'static str {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in union_id.bytes() {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    BRANCH_COLORS[(hash % BRANCH_COLORS.len() as u64) as usize]
}
