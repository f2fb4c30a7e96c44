//! Household grouping.
//!
//! A household is one connected group of partners. It is drawn as a single contiguous block
//! in one row, so it is also the unit the sizer and the coordinate pass work on. Households
//! form a forest: a household hangs under the first union (walking the forest depth-first,
//! unions left to right) that has one of its members as a child. That member becomes the
//! household's anchor and its partners are arranged around it. Parents whose children were
//! all claimed elsewhere (in-laws of a married child) start a tree of their own.

use crate::graph::FamilyGraph;
use crate::graphlib::alg;
use crate::unions::Union;
use std::collections::VecDeque;
use std::ops::Range;

#[derive(Debug, Clone)]
pub(crate) struct Household {
    /// Person indices, left to right.
    pub(crate) members: Vec<usize>,
    /// Position of the anchor inside `members`.
    pub(crate) anchor_pos: usize,
    /// Indices into the union list whose parents belong here, left to right.
    pub(crate) unions: Vec<usize>,
    /// Child households attached under each entry of `unions`.
    pub(crate) groups: Vec<Vec<usize>>,
}

impl Household {
    pub(crate) fn position_of(&self, person: usize) -> Option<usize> {
        self.members.iter().position(|&m| m == person)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct HouseholdForest {
    pub(crate) households: Vec<Household>,
    /// Household index of every person.
    pub(crate) of_person: Vec<usize>,
    pub(crate) roots: Vec<usize>,
    /// Every household exactly once, each after the household it hangs under.
    pub(crate) preorder: Vec<usize>,
    /// `preorder` range covered by each root's subtree, parallel to `roots`.
    pub(crate) spans: Vec<Range<usize>>,
}

impl HouseholdForest {
    pub(crate) fn build(graph: &FamilyGraph, unions: &[Union]) -> Self {
        let components = alg::components(graph.partners());

        let mut of_person = vec![0usize; graph.len()];
        for (h, members) in components.iter().enumerate() {
            for &m in members {
                of_person[m] = h;
            }
        }

        let mut unions_of: Vec<Vec<usize>> = vec![Vec::new(); components.len()];
        for (u, union) in unions.iter().enumerate() {
            unions_of[of_person[union.parent_ixs[0]]].push(u);
        }

        let mut households: Vec<Option<Household>> = vec![None; components.len()];
        let mut roots: Vec<usize> = Vec::new();
        let mut preorder: Vec<usize> = Vec::with_capacity(components.len());
        let mut spans: Vec<Range<usize>> = Vec::new();

        let parentless = |h: usize| {
            components[h]
                .iter()
                .all(|&m| graph.lineage().in_degree(m) == 0)
        };
        let candidates = (0..components.len())
            .filter(|&h| parentless(h))
            .chain(0..components.len());

        for root in candidates {
            if households[root].is_some() {
                continue;
            }
            roots.push(root);
            let start = preorder.len();
            households[root] = Some(arrange(
                graph,
                unions,
                &components[root],
                components[root][0],
                &unions_of[root],
            ));

            let mut stack: Vec<usize> = vec![root];
            while let Some(h) = stack.pop() {
                preorder.push(h);

                let own_unions: Vec<usize> = households[h]
                    .as_ref()
                    .map(|household| household.unions.clone())
                    .unwrap_or_default();
                let mut claimed: Vec<(usize, usize)> = Vec::new();
                let mut pending: Vec<usize> = Vec::new();
                for (slot, &u) in own_unions.iter().enumerate() {
                    for &child in &unions[u].child_ixs {
                        let ch = of_person[child];
                        if households[ch].is_some() || pending.contains(&ch) {
                            continue;
                        }
                        pending.push(ch);
                        claimed.push((slot, ch));
                        households[ch] = Some(arrange(
                            graph,
                            unions,
                            &components[ch],
                            child,
                            &unions_of[ch],
                        ));
                    }
                }

                if let Some(household) = households[h].as_mut() {
                    for &(slot, ch) in &claimed {
                        household.groups[slot].push(ch);
                    }
                }
                stack.extend(pending.into_iter().rev());
            }
            spans.push(start..preorder.len());
        }

        let households: Vec<Household> = households.into_iter().flatten().collect();
        tracing::debug!(
            households = households.len(),
            roots = roots.len(),
            "household forest built"
        );

        Self {
            households,
            of_person,
            roots,
            preorder,
            spans,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.households.len()
    }
}

/// Lays out one household around `anchor`: partners are visited breadth-first, the anchor's
/// own partners alternate right, left, right...; everyone else goes on the side of whoever
/// they were reached from, further out.
fn arrange(
    graph: &FamilyGraph,
    unions: &[Union],
    component: &[usize],
    anchor: usize,
    union_ixs: &[usize],
) -> Household {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Side {
        Left,
        Right,
    }

    let mut side: Vec<Option<Side>> = vec![None; component.len()];
    let slot = |ix: usize| component.binary_search(&ix).ok();

    let mut left: Vec<usize> = Vec::new();
    let mut right: Vec<usize> = Vec::new();
    let mut seen = vec![false; component.len()];
    if let Some(s) = slot(anchor) {
        seen[s] = true;
    }

    let mut anchor_partners = 0usize;
    let mut queue: VecDeque<usize> = VecDeque::from([anchor]);
    while let Some(v) = queue.pop_front() {
        for w in graph.partner_ixs(v) {
            let Some(ws) = slot(w) else { continue };
            if seen[ws] {
                continue;
            }
            seen[ws] = true;

            let s = if v == anchor {
                anchor_partners += 1;
                if anchor_partners % 2 == 1 {
                    Side::Right
                } else {
                    Side::Left
                }
            } else {
                slot(v).and_then(|vs| side[vs]).unwrap_or(Side::Right)
            };
            side[ws] = Some(s);
            match s {
                Side::Left => left.push(w),
                Side::Right => right.push(w),
            }
            queue.push_back(w);
        }
    }

    let anchor_pos = left.len();
    let members: Vec<usize> = left
        .into_iter()
        .rev()
        .chain(std::iter::once(anchor))
        .chain(right)
        .collect();

    // A lineal co-parent lives in another household and does not count.
    let mean_pos = |u: usize| {
        let positions: Vec<usize> = unions[u]
            .parent_ixs
            .iter()
            .filter_map(|p| members.iter().position(|m| m == p))
            .collect();
        positions.iter().sum::<usize>() as f64 / positions.len().max(1) as f64
    };
    let mut ordered: Vec<usize> = union_ixs.to_vec();
    ordered.sort_by(|&a, &b| mean_pos(a).total_cmp(&mean_pos(b)).then(a.cmp(&b)));

    Household {
        groups: vec![Vec::new(); ordered.len()],
        members,
        anchor_pos,
        unions: ordered,
    }
}
