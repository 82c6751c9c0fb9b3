mod collision;
mod handle_order;
mod layered;
mod ranking;
pub(crate) mod types;

pub use collision::{CollisionReport, count_overlaps, resolve_overlaps};
pub use layered::{LayeredEngine, LayeredPlacement, SugiyamaEngine};
pub use types::*;

use collision::separate_boxes;
use handle_order::reconcile_handle_order;

use crate::config::LayoutOptions;
use crate::handles::{HandleSlotIndex, NoHandleSlots};
use crate::ir::{Edge, Node, Position};

/// Result of one arrange request. `nodes`, `ranks` follow input node order.
#[derive(Debug, Clone, PartialEq)]
pub struct Arrangement {
    pub nodes: Vec<Node>,
    pub ranks: Vec<usize>,
    /// Crossings left after in-rank ordering, counted on the layered graph.
    pub crossings: usize,
    /// Targets whose feeding sources were reordered by handle slot.
    pub reconciled_targets: usize,
    pub collision: CollisionReport,
}

impl Arrangement {
    fn empty() -> Self {
        Self {
            nodes: Vec::new(),
            ranks: Vec::new(),
            crossings: 0,
            reconciled_targets: 0,
            collision: CollisionReport {
                iterations: 0,
                converged: true,
                remaining_overlaps: 0,
            },
        }
    }
}

/// Arranges `nodes` with the built-in layered engine.
///
/// Runs layered placement, reorders sources that feed a shared target by the
/// slot their edge lands on, then pushes apart whatever still overlaps. The
/// inputs are never modified; every returned node is a copy with only
/// `position` (top-left) replaced.
pub fn arrange(
    nodes: &[Node],
    edges: &[Edge],
    options: &LayoutOptions,
    handles: &dyn HandleSlotIndex,
) -> Arrangement {
    arrange_with_engine(&SugiyamaEngine, nodes, edges, options, handles)
}

pub fn arrange_with_engine(
    engine: &dyn LayeredEngine,
    nodes: &[Node],
    edges: &[Edge],
    options: &LayoutOptions,
    handles: &dyn HandleSlotIndex,
) -> Arrangement {
    if nodes.is_empty() {
        return Arrangement::empty();
    }

    let _span = tracing::debug_span!(
        "layout",
        nodes = nodes.len(),
        edges = edges.len(),
        direction = options.direction.token()
    )
    .entered();

    let graph = LayoutGraph::build(nodes, edges, &options.node_size);
    let placement = engine.place(&graph, options);

    let mut boxes: Vec<Rect> = graph
        .nodes
        .iter()
        .enumerate()
        .map(|(idx, node)| {
            let center = placement.centers.get(idx).copied().unwrap_or_default();
            Rect::from_center(center, node.width, node.height)
        })
        .collect();

    let reconciled_targets =
        reconcile_handle_order(&graph, &mut boxes, options.direction, handles);

    let ids: Vec<&str> = graph.nodes.iter().map(|node| node.id).collect();
    let collision = separate_boxes(&mut boxes, &ids, &options.collision);

    let arranged = nodes
        .iter()
        .zip(&boxes)
        .map(|(node, rect)| {
            let mut node = node.clone();
            node.position = Position {
                x: rect.x,
                y: rect.y,
            };
            node
        })
        .collect();

    let mut ranks = placement.ranks;
    ranks.resize(nodes.len(), 0);

    Arrangement {
        nodes: arranged,
        ranks,
        crossings: placement.crossings,
        reconciled_targets,
        collision,
    }
}

/// [`arrange`] keeping only the repositioned nodes.
pub fn layout(
    nodes: &[Node],
    edges: &[Edge],
    options: &LayoutOptions,
    handles: &dyn HandleSlotIndex,
) -> Vec<Node> {
    arrange(nodes, edges, options, handles).nodes
}

/// [`layout`] for hosts without handle metadata: sources feeding a shared
/// target are ordered by edge order.
pub fn layout_without_handles(
    nodes: &[Node],
    edges: &[Edge],
    options: &LayoutOptions,
) -> Vec<Node> {
    layout(nodes, edges, options, &NoHandleSlots)
}
