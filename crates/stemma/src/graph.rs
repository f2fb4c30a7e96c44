//! Family graph construction.
//!
//! People live in two arenas that share node indices: a directed lineage graph
//! (parent -> child) and an undirected partner graph (recorded spouses plus co-parents).
//! People are inserted in [`Person::layout_order`], so a node index doubles as the person's
//! rank in that order and every neighbor list sorted by index is canonical.

use crate::error::Warning;
use crate::graphlib::{EdgeInsert, Graph, GraphOptions, alg};
use crate::model::{Person, Relationship, RelationshipType};
use rustc_hash::FxHashSet;

/// Kind of link between two people drawn on the same row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartnerLink {
    /// A recorded spouse relationship.
    Spouse,
    /// No spouse record, but the two share at least one child.
    CoParent,
}

#[derive(Debug, Clone)]
pub struct FamilyGraph {
    lineage: Graph<Person, ()>,
    partners: Graph<(), PartnerLink>,
    anomalies: Vec<Warning>,
}

impl FamilyGraph {
    pub fn build(people: &[Person], relationships: &[Relationship]) -> Self {
        let mut anomalies: Vec<Warning> = Vec::new();

        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut ordered: Vec<&Person> = Vec::with_capacity(people.len());
        for p in people {
            if seen.insert(p.id.as_str()) {
                ordered.push(p);
            } else {
                tracing::warn!(person_id = %p.id, "duplicate person record ignored");
                anomalies.push(Warning::DuplicatePerson {
                    person_id: p.id.clone(),
                });
            }
        }
        ordered.sort_by(|a, b| a.layout_order(b));

        let mut lineage: Graph<Person, ()> = Graph::new(GraphOptions { directed: true });
        let mut partners: Graph<(), PartnerLink> = Graph::new(GraphOptions { directed: false });
        for p in ordered {
            lineage.set_node(p.id.clone(), p.clone());
            partners.set_node(p.id.clone(), ());
        }

        for r in relationships {
            let missing = [&r.from_person_id, &r.to_person_id]
                .into_iter()
                .find(|id| !lineage.has_node(id));
            if let Some(missing) = missing {
                tracing::warn!(
                    relationship = %r,
                    missing_person_id = %missing,
                    "relationship references an unknown person; dropped"
                );
                anomalies.push(Warning::DroppedRelationship {
                    relationship: r.clone(),
                    missing_person_id: missing.clone(),
                });
                continue;
            }
            if r.from_person_id == r.to_person_id {
                tracing::warn!(relationship = %r, "self relationship dropped");
                continue;
            }

            let inserted = match r.relationship_type {
                RelationshipType::Parent => {
                    lineage.set_edge(&r.from_person_id, &r.to_person_id, ())
                }
                RelationshipType::Spouse => {
                    partners.set_edge(&r.from_person_id, &r.to_person_id, PartnerLink::Spouse)
                }
            };
            if inserted == EdgeInsert::Duplicate {
                tracing::debug!(relationship = %r, "repeated relationship folded");
            }
        }

        // Co-parents share a row, unless one descends from the other: that pair stays on
        // separate rows and only the union ties them together.
        let mut lineal: FxHashSet<(usize, usize)> = FxHashSet::default();
        for child in 0..lineage.node_count() {
            let mut parents: Vec<usize> = lineage.predecessor_ixs(child).collect();
            parents.sort_unstable();
            for (i, &a) in parents.iter().enumerate() {
                for &b in &parents[i + 1..] {
                    if partners.edge_ix(a, b).is_some() || lineal.contains(&(a, b)) {
                        continue;
                    }
                    if alg::has_path(&lineage, a, b) || alg::has_path(&lineage, b, a) {
                        tracing::debug!(
                            first = %lineage.node_id(a).unwrap_or_default(),
                            second = %lineage.node_id(b).unwrap_or_default(),
                            "co-parents are lineal kin; kept on separate rows"
                        );
                        lineal.insert((a, b));
                        continue;
                    }
                    let _ = partners.set_edge_ix(a, b, PartnerLink::CoParent);
                }
            }
        }

        tracing::debug!(
            people = lineage.node_count(),
            parent_edges = lineage.edge_count(),
            partner_edges = partners.edge_count(),
            anomalies = anomalies.len(),
            "family graph built"
        );

        Self {
            lineage,
            partners,
            anomalies,
        }
    }

    pub fn len(&self) -> usize {
        self.lineage.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// People in layout order.
    pub fn people(&self) -> impl Iterator<Item = &Person> {
        self.lineage.labels().map(|(_, p)| p)
    }

    pub fn person(&self, id: &str) -> Option<&Person> {
        self.lineage.node(id)
    }

    pub fn ix(&self, id: &str) -> Option<usize> {
        self.lineage.node_ix(id)
    }

    pub(crate) fn id_at(&self, ix: usize) -> &str {
        self.lineage.node_id(ix).unwrap_or_default()
    }

    pub(crate) fn lineage(&self) -> &Graph<Person, ()> {
        &self.lineage
    }

    pub(crate) fn partners(&self) -> &Graph<(), PartnerLink> {
        &self.partners
    }

    pub fn anomalies(&self) -> &[Warning] {
        &self.anomalies
    }

    pub(crate) fn child_ixs(&self, ix: usize) -> Vec<usize> {
        sorted(self.lineage.successor_ixs(ix))
    }

    pub(crate) fn parent_ixs(&self, ix: usize) -> Vec<usize> {
        sorted(self.lineage.predecessor_ixs(ix))
    }

    pub(crate) fn spouse_ixs(&self, ix: usize) -> Vec<usize> {
        sorted(
            self.partners
                .successor_ixs(ix)
                .filter(|&w| self.partners.edge_ix(ix, w) == Some(&PartnerLink::Spouse)),
        )
    }

    pub(crate) fn partner_ixs(&self, ix: usize) -> Vec<usize> {
        sorted(self.partners.successor_ixs(ix))
    }

    fn ids(&self, ixs: Vec<usize>) -> Vec<&str> {
        ixs.into_iter().map(|ix| self.id_at(ix)).collect()
    }

    pub fn children_of(&self, id: &str) -> Vec<&str> {
        self.ix(id)
            .map(|ix| self.ids(self.child_ixs(ix)))
            .unwrap_or_default()
    }

    pub fn parents_of(&self, id: &str) -> Vec<&str> {
        self.ix(id)
            .map(|ix| self.ids(self.parent_ixs(ix)))
            .unwrap_or_default()
    }

    /// Recorded spouses only, each listed once regardless of record direction.
    pub fn spouses_of(&self, id: &str) -> Vec<&str> {
        self.ix(id)
            .map(|ix| self.ids(self.spouse_ixs(ix)))
            .unwrap_or_default()
    }

    /// Recorded spouses plus co-parents.
    pub fn partners_of(&self, id: &str) -> Vec<&str> {
        self.ix(id)
            .map(|ix| self.ids(self.partner_ixs(ix)))
            .unwrap_or_default()
    }

    /// Whether `ancestor` can be reached from `person` by walking up parent links.
    pub fn is_ancestor(&self, ancestor: &str, person: &str) -> bool {
        match (self.ix(ancestor), self.ix(person)) {
            (Some(a), Some(p)) => a != p && alg::has_path(&self.lineage, a, p),
            _ => false,
        }
    }

    pub fn is_explicit_spouse_pair(&self, a: &str, b: &str) -> bool {
        self.partners.edge(a, b) == Some(&PartnerLink::Spouse)
    }

    /// Recorded spouse pairs as `(lower, higher)` index pairs, sorted.
    pub(crate) fn spouse_pairs(&self) -> Vec<(usize, usize)> {
        let mut out: Vec<(usize, usize)> = Vec::new();
        self.partners.for_each_edge(|v, w, link| {
            if *link == PartnerLink::Spouse {
                out.push((v.min(w), v.max(w)));
            }
        });
        out.sort_unstable();
        out
    }
}

fn sorted(ixs: impl Iterator<Item = usize>) -> Vec<usize> {
    let mut out: Vec<usize> = ixs.collect();
    out.sort_unstable();
    out.dedup();
    out
}
