//! Subtree sizing.
//!
//! Runs bottom-up over the household forest. Every household gets a box wide enough for its
//! own row block and the block of child subtrees hanging under it. The row block is shifted so
//! that its union centers sit on their children's centroids; when that pushes it past the
//! children block, the box grows by the overhang instead of squeezing anything.

use crate::config::LayoutConfig;
use crate::depth::Depths;
use crate::graph::FamilyGraph;
use crate::households::HouseholdForest;
use crate::unions::Union;
use rustc_hash::FxHashMap;

/// What a width lookup is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubtreeKey<'a> {
    /// `personWidth` for a childless person, otherwise the subtree of the household they are
    /// drawn in.
    Person(&'a str),
    /// A union id such as `"alice&bob"`.
    Union(&'a str),
}

/// Geometry of one household subtree, relative to the left edge of its box.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct HouseholdBox {
    pub(crate) width: f64,
    /// Left edge of the first member's box.
    pub(crate) members_offset: f64,
    /// Left edge of the children block.
    pub(crate) block_offset: f64,
    /// Center of the anchor's box.
    pub(crate) anchor_center: f64,
    /// `(child household, left edge inside the children block)`.
    pub(crate) children: Vec<(usize, f64)>,
}

#[derive(Debug, Clone)]
pub struct SubtreeWidths {
    pub(crate) forest: HouseholdForest,
    pub(crate) boxes: Vec<HouseholdBox>,
    person_ix: FxHashMap<String, usize>,
    childless: Vec<bool>,
    person_width: f64,
    union_widths: FxHashMap<String, f64>,
    total: f64,
}

impl SubtreeWidths {
    pub fn get(&self, key: SubtreeKey<'_>) -> Option<f64> {
        match key {
            SubtreeKey::Person(id) => {
                let ix = *self.person_ix.get(id)?;
                if self.childless[ix] {
                    return Some(self.person_width);
                }
                Some(self.boxes[self.forest.of_person[ix]].width)
            }
            SubtreeKey::Union(id) => self.union_widths.get(id).copied(),
        }
    }

    /// Root subtree widths plus the `childGap`s between them, without padding.
    pub fn total(&self) -> f64 {
        self.total
    }
}

pub fn compute_widths(
    graph: &FamilyGraph,
    unions: &[Union],
    depths: &Depths,
    config: &LayoutConfig,
) -> SubtreeWidths {
    let forest = HouseholdForest::build(graph, unions);
    let pw = config.person_width;
    let pitch = pw + config.spouse_spacing();

    let mut boxes: Vec<HouseholdBox> = vec![HouseholdBox::default(); forest.len()];
    let mut union_widths: FxHashMap<String, f64> = FxHashMap::default();

    for &h in forest.preorder.iter().rev() {
        let household = &forest.households[h];
        let depth = depths.at(household.members[household.anchor_pos]);
        let self_w = config.household_width(household.members.len());

        let box_center =
            |person: usize| household.position_of(person).map(|pos| pos as f64 * pitch + pw / 2.0);

        let mut cursor = 0.0;
        let mut placed: Vec<(usize, f64)> = Vec::new();
        let mut targets: Vec<f64> = Vec::new();
        let mut union_centers: Vec<f64> = Vec::new();

        for (slot, group) in household.groups.iter().enumerate() {
            let union = &unions[household.unions[slot]];
            let parent_centers: Vec<f64> =
                union.parent_ixs.iter().filter_map(|&p| box_center(p)).collect();
            let pair_w = span(&parent_centers) + pw;

            if group.is_empty() {
                union_widths.insert(union.id.clone(), pair_w);
                continue;
            }
            if !placed.is_empty() {
                cursor += config.child_spacing();
            }
            let group_start = cursor;
            let mut anchors = 0.0;
            for (i, &ch) in group.iter().enumerate() {
                if i > 0 {
                    cursor += config.sibling_spacing();
                }
                placed.push((ch, cursor));
                anchors += cursor + boxes[ch].anchor_center;
                cursor += boxes[ch].width;
            }
            union_widths.insert(union.id.clone(), pair_w.max(cursor - group_start));

            targets.push(anchors / group.len() as f64);
            union_centers.push(mean(&parent_centers));
        }

        let block_w = cursor;
        let shift = if targets.is_empty() {
            0.0
        } else {
            mean(&targets) - mean(&union_centers)
        };
        let left = shift.min(0.0);
        let right = block_w.max(shift + self_w);

        boxes[h] = HouseholdBox {
            width: right - left,
            members_offset: shift - left,
            block_offset: -left,
            anchor_center: shift - left + household.anchor_pos as f64 * pitch + pw / 2.0,
            children: placed,
        };
        tracing::trace!(
            household = h,
            depth,
            width = boxes[h].width,
            overhang = (right - left) - block_w.max(self_w),
            "household sized"
        );
    }

    let roots = &forest.roots;
    let total = roots.iter().map(|&r| boxes[r].width).sum::<f64>()
        + roots.len().saturating_sub(1) as f64 * config.child_spacing();

    let person_ix = (0..graph.len())
        .map(|ix| (graph.id_at(ix).to_string(), ix))
        .collect();
    let childless = (0..graph.len()).map(|ix| graph.child_ixs(ix).is_empty()).collect();

    tracing::debug!(households = forest.len(), total, "subtree widths computed");
    SubtreeWidths {
        forest,
        boxes,
        person_ix,
        childless,
        person_width: pw,
        union_widths,
        total,
    }
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

fn span(xs: &[f64]) -> f64 {
    let lo = xs.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo.is_finite() && hi.is_finite() { hi - lo } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depth::assign_depths;
    use crate::model::{Person, Relationship};
    use crate::unions::resolve_unions;

    fn widths(people: &[Person], rels: &[Relationship], config: &LayoutConfig) -> SubtreeWidths {
        let graph = FamilyGraph::build(people, rels);
        let unions = resolve_unions(&graph);
        let depths = assign_depths(&graph).unwrap();
        compute_widths(&graph, &unions, &depths, config)
    }

    #[test]
    fn childless_person_is_one_box_wide() {
        let cfg = LayoutConfig::default();
        let w = widths(&[Person::new("solo", "Solo")], &[], &cfg);
        assert_eq!(w.get(SubtreeKey::Person("solo")), Some(cfg.person_width));
        assert_eq!(w.get(SubtreeKey::Person("nobody")), None);
        assert_eq!(w.total(), cfg.person_width);
    }

    #[test]
    fn couple_with_two_children_spans_the_wider_row() {
        let cfg = LayoutConfig::default();
        let people = vec![
            Person::new("a", "A").with_birth_year(1900),
            Person::new("b", "B").with_birth_year(1901),
            Person::new("c1", "C1").with_birth_year(1930),
            Person::new("c2", "C2").with_birth_year(1932),
        ];
        let rels = vec![
            Relationship::spouse("a", "b"),
            Relationship::parent("a", "c1"),
            Relationship::parent("b", "c1"),
            Relationship::parent("a", "c2"),
            Relationship::parent("b", "c2"),
        ];
        let w = widths(&people, &rels, &cfg);

        // Two children block = 160 + 40 + 160; couple row = 160 + 20 + 160.
        assert_eq!(w.get(SubtreeKey::Union("a&b")), Some(360.0));
        assert_eq!(w.get(SubtreeKey::Person("a")), Some(360.0));
        assert_eq!(w.get(SubtreeKey::Person("c2")), Some(cfg.person_width));
    }

    #[test]
    fn off_center_children_widen_the_box() {
        let cfg = LayoutConfig::default();
        let mut people = vec![
            Person::new("p", "P").with_birth_year(1900),
            Person::new("q", "Q").with_birth_year(1901),
            Person::new("r", "R").with_birth_year(1902),
        ];
        let mut rels = vec![Relationship::spouse("p", "q"), Relationship::spouse("p", "r")];
        for (i, kid) in ["k1", "k2", "k3"].into_iter().enumerate() {
            people.push(Person::new(kid, kid).with_birth_year(1930 + i as i32));
            rels.push(Relationship::parent("p", kid));
            rels.push(Relationship::parent("q", kid));
        }
        let w = widths(&people, &rels, &cfg);

        // Row is r, p, q. The p&q center sits 350 from the row's left edge, the children's
        // centroid 280 from the block's, so the row starts 70 left of the 560-wide block.
        assert_eq!(w.get(SubtreeKey::Person("p")), Some(630.0));
        assert_eq!(w.get(SubtreeKey::Union("p&q")), Some(560.0));
        assert_eq!(w.get(SubtreeKey::Union("p&r")), Some(cfg.household_width(2)));
        assert_eq!(w.get(SubtreeKey::Person("r")), Some(cfg.person_width));
    }
}
