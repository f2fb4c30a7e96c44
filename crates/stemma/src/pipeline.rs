use crate::config::LayoutConfig;
use crate::depth::assign_depths;
use crate::error::{Error, Result};
use crate::graph::FamilyGraph;
use crate::model::{Layout, Person, Relationship};
use crate::position::assign_coordinates;
use crate::unions::resolve_unions;
use crate::validate::{plausibility_warnings, validate_graph};
use crate::width::compute_widths;

/// Computes a full layout.
///
/// Any validation or layout failure aborts the whole call; there is no partial result.
/// Non-blocking findings (age gaps, dropped edges, duplicate people) come back in
/// [`Layout::warnings`].
pub fn generate_layout(
    people: &[Person],
    relationships: &[Relationship],
    config: &LayoutConfig,
) -> Result<Layout> {
    config.validate()?;
    validate_graph(people, relationships).map_err(Error::Validation)?;

    let mut warnings = plausibility_warnings(people, relationships);

    let graph = FamilyGraph::build(people, relationships);
    warnings.extend(graph.anomalies().iter().cloned());

    let unions = resolve_unions(&graph);
    let depths = assign_depths(&graph)?;
    let widths = compute_widths(&graph, &unions, &depths, config);
    let (nodes, marriages) = assign_coordinates(&graph, &unions, &depths, &widths, config);

    let (width, height) = if nodes.is_empty() {
        (2.0 * config.padding, 2.0 * config.padding)
    } else {
        let right = nodes
            .iter()
            .map(|n| n.x + config.person_width)
            .fold(f64::NEG_INFINITY, f64::max);
        (
            right + config.padding,
            2.0 * config.padding
                + depths.max_depth() as f64 * config.row_pitch()
                + config.person_height,
        )
    };

    tracing::debug!(
        people = nodes.len(),
        unions = marriages.len(),
        rows = depths.max_depth() + 1,
        warnings = warnings.len(),
        width,
        height,
        "layout generated"
    );

    Ok(Layout {
        nodes,
        marriages,
        warnings,
        width,
        height,
    })
}
