//! Input records and layout output types.
//!
//! Field names serialize as camelCase because both the data layer and the renderer are JS
//! clients.

use crate::error::Warning;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death_year: Option<i32>,
    /// ISO `YYYY-MM-DD`; a bare `YYYY` is accepted as well.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death_date: Option<String>,
}

impl Person {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            birth_year: None,
            death_year: None,
            birth_date: None,
            death_date: None,
        }
    }

    pub fn with_birth_year(mut self, year: i32) -> Self {
        self.birth_year = Some(year);
        self
    }

    pub fn with_death_year(mut self, year: i32) -> Self {
        self.death_year = Some(year);
        self
    }

    pub fn with_birth_date(mut self, date: impl Into<String>) -> Self {
        self.birth_date = Some(date.into());
        self
    }

    pub fn with_death_date(mut self, date: impl Into<String>) -> Self {
        self.death_date = Some(date.into());
        self
    }

    /// `birth_year` if recorded, otherwise the year of `birth_date`.
    pub fn resolved_birth_year(&self) -> Option<i32> {
        self.birth_year
            .or_else(|| self.birth_date.as_deref().and_then(year_of))
    }

    pub fn resolved_death_year(&self) -> Option<i32> {
        self.death_year
            .or_else(|| self.death_date.as_deref().and_then(year_of))
    }

    /// The canonical ordering used everywhere the layout has a choice (sibling order, root
    /// order, parent order inside a union): resolved birth year ascending with unknown years
    /// last, then id. Input order never matters.
    pub fn layout_order(&self, other: &Self) -> Ordering {
        let key = |p: &Self| {
            let year = p.resolved_birth_year();
            (year.is_none(), year.unwrap_or_default())
        };
        key(self)
            .cmp(&key(other))
            .then_with(|| self.id.cmp(&other.id))
    }
}

fn year_of(date: &str) -> Option<i32> {
    let date = date.trim();
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.year())
        .ok()
        .or_else(|| date.parse::<i32>().ok())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipType {
    Parent,
    Spouse,
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parent => f.write_str("parent"),
            Self::Spouse => f.write_str("spouse"),
        }
    }
}

/// A directed relationship record. For `Parent`, `from` is the parent and `to` the child;
/// `Spouse` records are undirected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub from_person_id: String,
    pub to_person_id: String,
    pub relationship_type: RelationshipType,
}

impl Relationship {
    pub fn parent(parent: impl Into<String>, child: impl Into<String>) -> Self {
        Self {
            from_person_id: parent.into(),
            to_person_id: child.into(),
            relationship_type: RelationshipType::Parent,
        }
    }

    pub fn spouse(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            from_person_id: a.into(),
            to_person_id: b.into(),
            relationship_type: RelationshipType::Spouse,
        }
    }

    pub fn is_parent(&self) -> bool {
        self.relationship_type == RelationshipType::Parent
    }

    pub fn is_spouse(&self) -> bool {
        self.relationship_type == RelationshipType::Spouse
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({} -> {})",
            self.relationship_type, self.from_person_id, self.to_person_id
        )
    }
}

/// One positioned person. `x`/`y` is the top-left corner of the person's box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutNode {
    pub person: Person,
    pub x: f64,
    pub y: f64,
    pub depth: usize,
    pub children: Vec<Person>,
    pub spouses: Vec<Person>,
}

impl LayoutNode {
    pub fn center_x(&self, person_width: f64) -> f64 {
        self.x + person_width / 2.0
    }
}

/// One positioned union (couple or single parent).
///
/// `x` is the horizontal center of the union, i.e. where the renderer anchors the connector to
/// the children; `y` is the top of the spouses' row and `width` spans both spouse boxes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpousePair {
    pub spouse1: Person,
    pub spouse2: Option<Person>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub children: Vec<Person>,
    pub explicit: bool,
    pub branch_color: String,
}

impl SpousePair {
    pub fn involves(&self, id: &str) -> bool {
        self.spouse1.id == id || self.spouse2.as_ref().is_some_and(|p| p.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub nodes: Vec<LayoutNode>,
    pub marriages: Vec<SpousePair>,
    #[serde(default)]
    pub warnings: Vec<Warning>,
    /// Overall drawing size, padding included.
    pub width: f64,
    pub height: f64,
}

impl Layout {
    pub fn node(&self, id: &str) -> Option<&LayoutNode> {
        self.nodes.iter().find(|n| n.person.id == id)
    }

    /// The union formed by exactly `a` and `b`, in either order.
    pub fn marriage(&self, a: &str, b: &str) -> Option<&SpousePair> {
        self.marriages.iter().find(|m| {
            m.spouse2.is_some() && m.involves(a) && m.involves(b) && a != b
        })
    }

    /// The single-parent union of `parent`, if any.
    pub fn single_parent_union(&self, parent: &str) -> Option<&SpousePair> {
        self.marriages
            .iter()
            .find(|m| m.spouse2.is_none() && m.spouse1.id == parent)
    }
}
