//! Generation assignment.
//!
//! Depth 0 is the top row. Two constraints have to hold at once: a child sits strictly below
//! every parent, and partners (recorded spouses and co-parents) share a row. The first is a
//! longest-path pass over the lineage graph, the second is applied by raising every partner
//! group to its deepest member; the two are alternated until neither moves anything.

use crate::error::LayoutError;
use crate::graph::FamilyGraph;
use crate::graphlib::alg;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Depths {
    by_ix: Vec<usize>,
    by_id: FxHashMap<String, usize>,
}

impl Depths {
    pub fn get(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub(crate) fn at(&self, ix: usize) -> usize {
        self.by_ix[ix]
    }

    /// Deepest row in use; `0` for an empty family.
    pub fn max_depth(&self) -> usize {
        self.by_ix.iter().copied().max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.by_ix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_ix.is_empty()
    }
}

pub fn assign_depths(graph: &FamilyGraph) -> Result<Depths, LayoutError> {
    let n = graph.len();
    let lineage = graph.lineage();

    let order = alg::topological_order(lineage);
    if order.len() < n {
        let mut ordered = vec![false; n];
        for &v in &order {
            ordered[v] = true;
        }
        let people: Vec<String> = (0..n)
            .filter(|&v| !ordered[v])
            .map(|v| graph.id_at(v).to_string())
            .collect();
        tracing::warn!(stuck = people.len(), "ancestry cycle left people without a generation");
        return Err(LayoutError::UnresolvedCycle {
            iterations: 0,
            people,
        });
    }

    let mut depth = vec![0usize; n];
    push_below_parents(graph, &order, &mut depth);

    let groups: Vec<Vec<usize>> = alg::components(graph.partners())
        .into_iter()
        .filter(|c| c.len() > 1)
        .collect();

    let limit = n + 1;
    let mut sweep = 0;
    loop {
        sweep += 1;
        let before = depth.clone();
        push_below_parents(graph, &order, &mut depth);
        for group in &groups {
            let deepest = group.iter().map(|&v| depth[v]).max().unwrap_or(0);
            for &v in group {
                depth[v] = deepest;
            }
        }

        let changed: Vec<usize> = (0..n).filter(|&v| depth[v] != before[v]).collect();
        if changed.is_empty() {
            tracing::debug!(sweeps = sweep, partner_groups = groups.len(), "depths settled");
            let by_id = (0..n)
                .map(|v| (graph.id_at(v).to_string(), depth[v]))
                .collect();
            return Ok(Depths {
                by_ix: depth,
                by_id,
            });
        }
        tracing::trace!(sweep, changed = changed.len(), "depth sweep");
        if sweep == limit {
            return Err(LayoutError::UnresolvedCycle {
                iterations: limit,
                people: changed
                    .into_iter()
                    .map(|v| graph.id_at(v).to_string())
                    .collect(),
            });
        }
    }
}

fn push_below_parents(graph: &FamilyGraph, order: &[usize], depth: &mut [usize]) {
    for &v in order {
        for p in graph.lineage().predecessor_ixs(v) {
            depth[v] = depth[v].max(depth[p] + 1);
        }
    }
}
