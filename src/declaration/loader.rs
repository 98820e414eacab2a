//! Depth-first walk over the declaration tree.

use std::collections::HashSet;

use tracing::debug;

use super::{LoadError, UnitPath, UnitSource};
use crate::graph::BuildGraph;

/// Walks the tree with an explicit work-list.
///
/// Units are visited in pre-order: a unit declares its own edges, then each
/// child subtree is visited in the order the unit listed them, before the
/// unit's next sibling. Every visited unit is recorded on the graph for the
/// regeneration edge.
pub struct Loader<'s> {
    source: &'s dyn UnitSource,
}

impl<'s> Loader<'s> {
    /// Loader reading units from `source`.
    #[must_use]
    pub const fn new(source: &'s dyn UnitSource) -> Self {
        Self { source }
    }

    /// Load the tree starting at the root unit.
    ///
    /// # Errors
    ///
    /// Returns the first [`LoadError`]; the graph is then incomplete and must
    /// be discarded.
    pub fn load(&self, graph: &mut BuildGraph) -> Result<(), LoadError> {
        self.load_from(UnitPath::root(), graph)
    }

    /// Load the tree starting at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::RepeatedUnit`] when a unit is reached twice and
    /// [`LoadError::OutsideTree`] for an include escaping the root, besides
    /// the source's own errors.
    pub fn load_from(&self, root: UnitPath, graph: &mut BuildGraph) -> Result<(), LoadError> {
        let mut seen = HashSet::new();
        let mut pending: Vec<(UnitPath, Option<UnitPath>)> = vec![(root, None)];
        while let Some((unit, includer)) = pending.pop() {
            let includer_name = includer.as_ref().map_or_else(String::new, UnitPath::identity);
            if unit.escapes_root() {
                return Err(LoadError::OutsideTree {
                    unit: unit.to_string(),
                    includer: includer_name,
                });
            }
            if !seen.insert(unit.clone()) {
                return Err(LoadError::RepeatedUnit {
                    unit: unit.identity(),
                    includer: includer_name,
                });
            }
            debug!(unit = %unit.identity(), "loading declaration unit");
            graph.record_unit(unit.identity());
            let edges_before = graph.edges.len();
            let children = self.source.declare(&unit, &mut graph.builder())?;
            debug!(
                unit = %unit.identity(),
                edges = graph.edges.len() - edges_before,
                children = children.len(),
                "declared"
            );
            pending.extend(
                children
                    .into_iter()
                    .rev()
                    .map(|child| (child, Some(unit.clone()))),
            );
        }
        Ok(())
    }
}
