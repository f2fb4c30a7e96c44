#![forbid(unsafe_code)]

//! Deterministic family-tree layout.
//!
//! [`generate_layout`] turns flat person and relationship records into positioned boxes:
//! one row per generation, partners side by side, unions centered over their children, and no
//! two boxes in a row closer than `minGap`. The same input always yields the same output,
//! regardless of record order.
//!
//! The stages are public too, leaves first: [`validate()`], [`FamilyGraph::build`],
//! [`resolve_unions`], [`assign_depths`], [`compute_widths`] and [`assign_coordinates`].

pub use stemma_graphlib as graphlib;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod depth;
pub mod error;
pub mod graph;
mod households;
pub mod model;
mod pipeline;
pub mod position;
pub mod unions;
pub mod validate;
pub mod width;

pub use config::LayoutConfig;
pub use depth::{Depths, assign_depths};
pub use error::{Error, LayoutError, Result, ValidationError, Warning};
pub use graph::{FamilyGraph, PartnerLink};
pub use model::{Layout, LayoutNode, Person, Relationship, RelationshipType, SpousePair};
pub use pipeline::generate_layout;
pub use position::assign_coordinates;
pub use unions::{Union, branch_color, resolve_unions};
pub use validate::{check_age_gap, plausibility_warnings, validate, validate_graph};
pub use width::{SubtreeKey, SubtreeWidths, compute_widths};
