//! Top-down coordinate assignment.

use crate::config::LayoutConfig;
use crate::depth::Depths;
use crate::graph::FamilyGraph;
use crate::households::HouseholdForest;
use crate::model::{LayoutNode, Person, SpousePair};
use crate::unions::Union;
use crate::width::{HouseholdBox, SubtreeWidths};

/// Places every person and union.
///
/// Root subtrees go left to right from `padding`, `childGap` apart; every other household is
/// placed inside the slot its parent household reserved for it. A root whose unions have
/// children drawn under some other tree (in-laws of a married child) is placed afterwards,
/// as close to those children as the rows already in use allow. Nodes come back sorted by
/// row, then `x`; unions keep their resolved order.
pub fn assign_coordinates(
    graph: &FamilyGraph,
    unions: &[Union],
    depths: &Depths,
    widths: &SubtreeWidths,
    config: &LayoutConfig,
) -> (Vec<LayoutNode>, Vec<SpousePair>) {
    let forest = &widths.forest;
    let pw = config.person_width;
    let pitch = pw + config.spouse_spacing();
    let row_y = |depth: usize| config.padding + depth as f64 * config.row_pitch();

    let mut tree_of = vec![0usize; forest.len()];
    for (tree, span) in forest.spans.iter().enumerate() {
        for &h in &forest.preorder[span.clone()] {
            tree_of[h] = tree;
        }
    }
    let outside = |union: &Union, tree: usize| {
        union
            .child_ixs
            .iter()
            .any(|&c| tree_of[forest.of_person[c]] != tree)
    };
    let foreign: Vec<Vec<usize>> = forest
        .spans
        .iter()
        .enumerate()
        .map(|(tree, span)| {
            forest.preorder[span.clone()]
                .iter()
                .flat_map(|&h| forest.households[h].unions.iter().copied())
                .filter(|&u| outside(&unions[u], tree))
                .collect()
        })
        .collect();

    let mut xs = vec![0.0f64; graph.len()];
    let mut subtree_left = vec![0.0f64; forest.len()];
    let mut rows = Rows::new(depths.max_depth() + 1);

    let mut cursor = config.padding;
    for (tree, span) in forest.spans.iter().enumerate() {
        if !foreign[tree].is_empty() {
            continue;
        }
        let span = &forest.preorder[span.clone()];
        place_subtree(forest, &widths.boxes, span, cursor, pitch, &mut subtree_left, &mut xs);
        rows.occupy(forest, span, depths, &xs, pw);
        cursor += widths.boxes[span[0]].width + config.child_spacing();
    }

    for (tree, span) in forest.spans.iter().enumerate() {
        if foreign[tree].is_empty() {
            continue;
        }
        let span = &forest.preorder[span.clone()];
        place_subtree(forest, &widths.boxes, span, 0.0, pitch, &mut subtree_left, &mut xs);

        let in_tree = |p: usize| tree_of[forest.of_person[p]] == tree;
        let wanted: Vec<f64> = foreign[tree]
            .iter()
            .map(|&u| {
                let union = &unions[u];
                let owner = forest.of_person[union.parent_ixs[0]];
                let parents: Vec<f64> = union
                    .parent_ixs
                    .iter()
                    .filter(|&&p| forest.of_person[p] == owner)
                    .map(|&p| xs[p] + pw / 2.0)
                    .collect();
                let center = parents.iter().sum::<f64>() / parents.len().max(1) as f64;
                let children: f64 = union.child_ixs.iter().map(|&c| xs[c] + pw / 2.0).sum();
                let moving = union.child_ixs.iter().filter(|&&c| in_tree(c)).count();
                let fixed = union.child_ixs.len() - moving;
                // Shift that puts `center` on the children's centroid once the tree moves.
                (children - union.child_ixs.len() as f64 * center) / fixed.max(1) as f64
            })
            .collect();
        let desired = wanted.iter().sum::<f64>() / wanted.len() as f64;

        let shift = rows.nearest_free_shift(
            forest,
            span,
            depths,
            &xs,
            pw,
            config.child_spacing(),
            desired,
        );
        for &h in span {
            for &m in &forest.households[h].members {
                xs[m] += shift;
            }
        }
        tracing::debug!(
            root = span[0],
            desired,
            shift,
            "in-law tree placed next to its children"
        );
        rows.occupy(forest, span, depths, &xs, pw);
    }

    let left_edge = xs.iter().copied().fold(f64::INFINITY, f64::min);
    if left_edge.is_finite() && left_edge < config.padding {
        let delta = config.padding - left_edge;
        for x in &mut xs {
            *x += delta;
        }
    }

    let persons: Vec<&Person> = graph.people().collect();
    let people = |ixs: &[usize]| -> Vec<Person> {
        ixs.iter().map(|&ix| persons[ix].clone()).collect()
    };

    let mut order: Vec<usize> = (0..graph.len()).collect();
    order.sort_by(|&a, &b| {
        depths
            .at(a)
            .cmp(&depths.at(b))
            .then(xs[a].total_cmp(&xs[b]))
            .then(a.cmp(&b))
    });
    let nodes: Vec<LayoutNode> = order
        .into_iter()
        .map(|ix| LayoutNode {
            person: persons[ix].clone(),
            x: xs[ix],
            y: row_y(depths.at(ix)),
            depth: depths.at(ix),
            children: people(&graph.child_ixs(ix)),
            spouses: people(&graph.spouse_ixs(ix)),
        })
        .collect();

    let marriages: Vec<SpousePair> = unions
        .iter()
        .map(|union| {
            let row = depths.at(union.parent_ixs[0]);
            let mut parents = union.parent_ixs.clone();
            parents.sort_by(|&a, &b| xs[a].total_cmp(&xs[b]).then(a.cmp(&b)));
            let same_row: Vec<f64> = parents
                .iter()
                .filter(|&&p| depths.at(p) == row)
                .map(|&p| xs[p])
                .collect();
            let lo = same_row.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = same_row.iter().copied().fold(f64::NEG_INFINITY, f64::max);

            let x = if union.child_ixs.is_empty() {
                (lo + hi + pw) / 2.0
            } else {
                union.child_ixs.iter().map(|&c| xs[c] + pw / 2.0).sum::<f64>()
                    / union.child_ixs.len() as f64
            };

            SpousePair {
                spouse1: persons[parents[0]].clone(),
                spouse2: parents.get(1).map(|&p| persons[p].clone()),
                x,
                y: row_y(row),
                width: hi - lo + pw,
                children: people(&union.child_ixs),
                explicit: union.explicit,
                branch_color: union.branch_color().to_string(),
            }
        })
        .collect();

    tracing::debug!(
        nodes = nodes.len(),
        marriages = marriages.len(),
        "coordinates assigned"
    );
    (nodes, marriages)
}

/// Lays out one root subtree with its box starting at `left`. `span` is the root's preorder
/// segment, root first.
fn place_subtree(
    forest: &HouseholdForest,
    boxes: &[HouseholdBox],
    span: &[usize],
    left: f64,
    pitch: f64,
    subtree_left: &mut [f64],
    xs: &mut [f64],
) {
    subtree_left[span[0]] = left;
    for &h in span {
        let geometry = &boxes[h];
        let left = subtree_left[h];

        let row_left = left + geometry.members_offset;
        for (pos, &m) in forest.households[h].members.iter().enumerate() {
            xs[m] = row_left + pos as f64 * pitch;
        }
        let block_left = left + geometry.block_offset;
        for &(ch, offset) in &geometry.children {
            subtree_left[ch] = block_left + offset;
        }
    }
}

/// Occupied box extents per row.
struct Rows {
    boxes: Vec<Vec<(f64, f64)>>,
}

impl Rows {
    fn new(rows: usize) -> Self {
        Self {
            boxes: vec![Vec::new(); rows],
        }
    }

    fn occupy(
        &mut self,
        forest: &HouseholdForest,
        span: &[usize],
        depths: &Depths,
        xs: &[f64],
        pw: f64,
    ) {
        for &h in span {
            for &m in &forest.households[h].members {
                self.boxes[depths.at(m)].push((xs[m], xs[m] + pw));
            }
        }
    }

    /// The shift closest to `desired` that keeps every row of the subtree at least `clearance`
    /// away from the boxes already placed. Each row of the subtree counts as one solid extent.
    #[allow(clippy::too_many_arguments)]
    fn nearest_free_shift(
        &self,
        forest: &HouseholdForest,
        span: &[usize],
        depths: &Depths,
        xs: &[f64],
        pw: f64,
        clearance: f64,
        desired: f64,
    ) -> f64 {
        let mut extent: Vec<Option<(f64, f64)>> = vec![None; self.boxes.len()];
        for &h in span {
            for &m in &forest.households[h].members {
                let slot = &mut extent[depths.at(m)];
                *slot = Some(match *slot {
                    Some((lo, hi)) => (lo.min(xs[m]), hi.max(xs[m] + pw)),
                    None => (xs[m], xs[m] + pw),
                });
            }
        }

        let mut blocked: Vec<(f64, f64)> = Vec::new();
        for (row, ext) in extent.iter().enumerate() {
            let Some((lo, hi)) = *ext else { continue };
            for &(a, b) in &self.boxes[row] {
                blocked.push((a - clearance - hi, b + clearance - lo));
            }
        }
        blocked.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.total_cmp(&y.1)));

        let mut merged: Vec<(f64, f64)> = Vec::new();
        for (lo, hi) in blocked {
            match merged.last_mut() {
                Some(last) if lo < last.1 => last.1 = last.1.max(hi),
                _ => merged.push((lo, hi)),
            }
        }

        for &(lo, hi) in &merged {
            if lo < desired && desired < hi {
                return if desired - lo < hi - desired { lo } else { hi };
            }
        }
        desired
    }
}
