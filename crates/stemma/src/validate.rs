//! Pre-layout checks over relationship records.
//!
//! Everything here is a pure predicate: nothing is mutated, and age plausibility only ever
//! produces [`Warning`]s.

use crate::error::{ValidationError, Warning};
use crate::graphlib::{Graph, GraphOptions, alg};
use crate::model::{Person, Relationship, RelationshipType};
use rustc_hash::{FxHashMap, FxHashSet};

/// Parent/child birth-year gaps outside `MIN_PARENT_AGE..=MAX_PARENT_AGE` are flagged.
pub const MIN_PARENT_AGE: i32 = 10;
pub const MAX_PARENT_AGE: i32 = 80;

/// Checks whether `new_edge` may be added to `relationships`.
pub fn validate(relationships: &[Relationship], new_edge: &Relationship) -> Result<(), ValidationError> {
    if new_edge.from_person_id == new_edge.to_person_id {
        return Err(ValidationError::SelfReference {
            person_id: new_edge.from_person_id.clone(),
            relationship_type: new_edge.relationship_type,
        });
    }

    if relationships.iter().any(|r| r == new_edge) {
        return Err(ValidationError::DuplicateRelationship {
            from: new_edge.from_person_id.clone(),
            to: new_edge.to_person_id.clone(),
            relationship_type: new_edge.relationship_type,
        });
    }

    if new_edge.relationship_type != RelationshipType::Parent {
        return Ok(());
    }

    let mut parents_of: FxHashMap<&str, Vec<&str>> = FxHashMap::default();
    for r in relationships.iter().filter(|r| r.is_parent()) {
        let parents = parents_of.entry(r.to_person_id.as_str()).or_default();
        if !parents.contains(&r.from_person_id.as_str()) {
            parents.push(r.from_person_id.as_str());
        }
    }

    let parent = new_edge.from_person_id.as_str();
    let child = new_edge.to_person_id.as_str();
    if is_ancestor(&parents_of, child, parent) {
        return Err(ValidationError::CycleDetected {
            parent: parent.to_string(),
            child: child.to_string(),
        });
    }

    if let Some(existing) = parents_of.get(child) {
        if existing.len() >= 2 && !existing.contains(&parent) {
            let mut parents: Vec<String> = existing.iter().map(|p| p.to_string()).collect();
            parents.push(parent.to_string());
            return Err(ValidationError::TooManyParents {
                child: child.to_string(),
                parents,
            });
        }
    }

    Ok(())
}

/// Depth-first walk up from `person` through recorded parents, looking for `candidate`.
fn is_ancestor(parents_of: &FxHashMap<&str, Vec<&str>>, candidate: &str, person: &str) -> bool {
    let mut visited: FxHashSet<&str> = FxHashSet::default();
    let mut stack: Vec<&str> = vec![person];
    while let Some(v) = stack.pop() {
        if !visited.insert(v) {
            continue;
        }
        for &p in parents_of.get(v).map(Vec::as_slice).unwrap_or_default() {
            if p == candidate {
                return true;
            }
            stack.push(p);
        }
    }
    false
}

/// Whole-graph precheck. Every violation is reported: record-level problems in input order,
/// then children with too many parents, then one entry per ancestry cycle.
///
/// Parent records naming people outside `people` are ignored here; the graph builder drops
/// them with a warning.
pub fn validate_graph(people: &[Person], relationships: &[Relationship]) -> Result<(), Vec<ValidationError>> {
    let mut errors: Vec<ValidationError> = Vec::new();

    let mut lineage: Graph<(), ()> = Graph::new(GraphOptions::default());
    for p in people {
        lineage.set_node(p.id.as_str(), ());
    }

    let mut seen: FxHashSet<(&str, &str, RelationshipType)> = FxHashSet::default();
    for r in relationships {
        if r.from_person_id == r.to_person_id {
            errors.push(ValidationError::SelfReference {
                person_id: r.from_person_id.clone(),
                relationship_type: r.relationship_type,
            });
            continue;
        }
        let key = (
            r.from_person_id.as_str(),
            r.to_person_id.as_str(),
            r.relationship_type,
        );
        if !seen.insert(key) {
            errors.push(ValidationError::DuplicateRelationship {
                from: r.from_person_id.clone(),
                to: r.to_person_id.clone(),
                relationship_type: r.relationship_type,
            });
            continue;
        }
        if r.is_parent() {
            // Unknown endpoints are reported by the graph builder.
            let _ = lineage.set_edge(&r.from_person_id, &r.to_person_id, ());
        }
    }

    for (ix, child) in lineage.nodes().enumerate() {
        if lineage.in_degree(ix) > 2 {
            errors.push(ValidationError::TooManyParents {
                child: child.to_string(),
                parents: lineage.predecessors(child).into_iter().map(str::to_string).collect(),
            });
        }
    }

    for cycle in alg::find_cycles(&lineage) {
        let members: FxHashSet<&str> = cycle.iter().filter_map(|&ix| lineage.node_id(ix)).collect();
        let closing = relationships.iter().find(|r| {
            r.is_parent()
                && members.contains(r.from_person_id.as_str())
                && members.contains(r.to_person_id.as_str())
        });
        if let Some(r) = closing {
            errors.push(ValidationError::CycleDetected {
                parent: r.from_person_id.clone(),
                child: r.to_person_id.clone(),
            });
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Flags a parent/child pair whose resolvable birth years are implausibly close or far apart.
pub fn check_age_gap(parent: &Person, child: &Person) -> Option<Warning> {
    let gap = child.resolved_birth_year()? - parent.resolved_birth_year()?;
    if (MIN_PARENT_AGE..=MAX_PARENT_AGE).contains(&gap) {
        return None;
    }
    Some(Warning::ImplausibleAgeGap {
        parent: parent.id.clone(),
        child: child.id.clone(),
        gap_years: gap,
    })
}

/// Age-gap warnings for every parent record whose endpoints are both known, in input order.
pub fn plausibility_warnings(people: &[Person], relationships: &[Relationship]) -> Vec<Warning> {
    let mut by_id: FxHashMap<&str, &Person> = FxHashMap::default();
    for p in people {
        by_id.entry(p.id.as_str()).or_insert(p);
    }

    let mut seen: FxHashSet<(&str, &str)> = FxHashSet::default();
    relationships
        .iter()
        .filter(|r| r.is_parent())
        .filter(|r| seen.insert((r.from_person_id.as_str(), r.to_person_id.as_str())))
        .filter_map(|r| {
            let parent = by_id.get(r.from_person_id.as_str())?;
            let child = by_id.get(r.to_person_id.as_str())?;
            check_age_gap(parent, child)
        })
        .collect()
}
