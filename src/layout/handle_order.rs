//! Input-slot aware reordering of sources that feed a shared target.
//!
//! Generic layering knows nothing about which input slot an edge lands on.
//! For every target with two or more incoming edges, this pass keeps the set
//! of cross-axis coordinates its sources already occupy and hands them out
//! again in slot order, so the source wired to the first declared input ends
//! up first along the cross axis.
//!
//! Targets are visited in node order. A source that feeds several multi-input
//! targets keeps the coordinate handed out by the last of them; earlier
//! assignments for that source are overwritten.

use super::types::{LayoutGraph, Rect};
use crate::handles::{HandleSlotIndex, resolve_slot};
use crate::ir::Direction;

struct FeedEntry {
    source: usize,
    slot: usize,
    cross: f64,
}

/// Returns how many targets had their sources reassigned.
pub(super) fn reconcile_handle_order(
    graph: &LayoutGraph<'_>,
    boxes: &mut [Rect],
    direction: Direction,
    handles: &dyn HandleSlotIndex,
) -> usize {
    let mut incoming: Vec<Vec<usize>> = vec![Vec::new(); graph.len()];
    for (edge_idx, edge) in graph.edges.iter().enumerate() {
        if edge.source != edge.target {
            incoming[edge.target].push(edge_idx);
        }
    }

    let mut reconciled = 0;
    for (target, edge_ids) in incoming.iter().enumerate() {
        if edge_ids.len() < 2 {
            continue;
        }
        let target_type = graph.nodes[target].node_type;

        let mut entries: Vec<FeedEntry> = edge_ids
            .iter()
            .map(|&edge_idx| {
                let edge = &graph.edges[edge_idx];
                FeedEntry {
                    source: edge.source,
                    slot: resolve_slot(handles, target_type, edge.target_handle),
                    cross: boxes[edge.source].cross(direction),
                }
            })
            .collect();

        // Stable: equal slots keep edge order.
        entries.sort_by_key(|entry| entry.slot);

        let mut values: Vec<f64> = entries.iter().map(|entry| entry.cross).collect();
        values.sort_by(f64::total_cmp);

        for (entry, value) in entries.iter().zip(values) {
            boxes[entry.source].set_cross(direction, value);
        }
        reconciled += 1;
    }

    tracing::debug!(targets = reconciled, "handle order reconciled");
    reconciled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NodeSizeDefaults;
    use crate::handles::{HandleRegistry, NoHandleSlots};
    use crate::ir::{Edge, Node};

    fn boxes_at(cross: &[f64], direction: Direction) -> Vec<Rect> {
        cross
            .iter()
            .map(|&value| {
                let mut rect = Rect {
                    x: 0.0,
                    y: 0.0,
                    width: 100.0,
                    height: 100.0,
                };
                rect.set_cross(direction, value);
                rect
            })
            .collect()
    }

    fn mix_registry() -> HandleRegistry {
        let mut registry = HandleRegistry::new();
        registry.register("mix", ["in0", "in1", "in2"]);
        registry
    }

    #[test]
    fn earlier_slot_gets_smaller_cross_value() {
        let nodes = vec![
            Node::new("late"),
            Node::new("early"),
            Node::new("t").typed("mix"),
        ];
        let edges = vec![
            Edge::new("late", "t").to_handle("in1"),
            Edge::new("early", "t").to_handle("in0"),
        ];
        let graph = LayoutGraph::build(&nodes, &edges, &NodeSizeDefaults::default());
        // slot-1 source sits first before reconciliation
        let mut boxes = boxes_at(&[0.0, 200.0, 100.0], Direction::TopBottom);

        let reconciled =
            reconcile_handle_order(&graph, &mut boxes, Direction::TopBottom, &mix_registry());

        assert_eq!(reconciled, 1);
        assert_eq!(boxes[1].x, 0.0);
        assert_eq!(boxes[0].x, 200.0);
        assert_eq!(boxes[2].x, 100.0);
    }

    #[test]
    fn horizontal_layouts_reorder_along_y() {
        let nodes = vec![Node::new("b"), Node::new("a"), Node::new("t").typed("mix")];
        let edges = vec![
            Edge::new("b", "t").to_handle("in2"),
            Edge::new("a", "t").to_handle("in0"),
        ];
        let graph = LayoutGraph::build(&nodes, &edges, &NodeSizeDefaults::default());
        let mut boxes = boxes_at(&[10.0, 250.0, 0.0], Direction::LeftRight);

        reconcile_handle_order(&graph, &mut boxes, Direction::LeftRight, &mix_registry());

        assert_eq!(boxes[1].y, 10.0);
        assert_eq!(boxes[0].y, 250.0);
        assert_eq!(boxes[0].x, 0.0);
    }

    #[test]
    fn unknown_slots_fall_back_to_edge_order() {
        let nodes = vec![Node::new("first"), Node::new("second"), Node::new("t")];
        let edges = vec![Edge::new("second", "t"), Edge::new("first", "t")];
        let graph = LayoutGraph::build(&nodes, &edges, &NodeSizeDefaults::default());
        let mut boxes = boxes_at(&[0.0, 300.0, 150.0], Direction::TopBottom);

        reconcile_handle_order(&graph, &mut boxes, Direction::TopBottom, &NoHandleSlots);

        assert_eq!(boxes[1].x, 0.0);
        assert_eq!(boxes[0].x, 300.0);
    }

    #[test]
    fn single_input_targets_and_self_loops_are_skipped() {
        let nodes = vec![Node::new("a"), Node::new("t").typed("mix")];
        let edges = vec![
            Edge::new("a", "t").to_handle("in1"),
            Edge::new("t", "t").to_handle("in0"),
            Edge::new("ghost", "t").to_handle("in0"),
        ];
        let graph = LayoutGraph::build(&nodes, &edges, &NodeSizeDefaults::default());
        let mut boxes = boxes_at(&[40.0, 0.0], Direction::TopBottom);

        let reconciled =
            reconcile_handle_order(&graph, &mut boxes, Direction::TopBottom, &mix_registry());

        assert_eq!(reconciled, 0);
        assert_eq!(boxes[0].x, 40.0);
        assert_eq!(boxes[1].x, 0.0);
    }

    #[test]
    fn shared_source_keeps_last_assignment() {
        // "s" feeds slot 1 of t1 and slot 0 of t2; t2 is visited last.
        let nodes = vec![
            Node::new("s"),
            Node::new("p"),
            Node::new("q"),
            Node::new("t1").typed("mix"),
            Node::new("t2").typed("mix"),
        ];
        let edges = vec![
            Edge::new("s", "t1").to_handle("in1"),
            Edge::new("p", "t1").to_handle("in0"),
            Edge::new("q", "t2").to_handle("in1"),
            Edge::new("s", "t2").to_handle("in0"),
        ];
        let graph = LayoutGraph::build(&nodes, &edges, &NodeSizeDefaults::default());
        let mut boxes = boxes_at(&[0.0, 400.0, 200.0, 0.0, 0.0], Direction::TopBottom);

        let reconciled =
            reconcile_handle_order(&graph, &mut boxes, Direction::TopBottom, &mix_registry());

        assert_eq!(reconciled, 2);
        // t1: p <- 0, s <- 400; then t2 sees s at 400 and q at 200: s <- 200, q <- 400
        assert_eq!(boxes[1].x, 0.0);
        assert_eq!(boxes[0].x, 200.0);
        assert_eq!(boxes[2].x, 400.0);
    }
}
