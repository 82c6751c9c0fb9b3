use std::collections::HashMap;

use crate::config::NodeSizeDefaults;
use crate::ir::{Direction, Edge, Node};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Axis-aligned box, anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn from_center(center: Point, width: f64, height: f64) -> Self {
        Self {
            x: center.x - width / 2.0,
            y: center.y - height / 2.0,
            width,
            height,
        }
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    /// Per-axis penetration of `self` and `other` once both are inflated so
    /// that `gap` must separate them. Positive on both axes means the boxes
    /// are closer than `gap`.
    pub fn overlap_with(&self, other: &Rect, gap: f64) -> (f64, f64) {
        let dx = (other.center_x() - self.center_x()).abs();
        let dy = (other.center_y() - self.center_y()).abs();
        let overlap_x = (self.width + other.width) / 2.0 + gap - dx;
        let overlap_y = (self.height + other.height) / 2.0 + gap - dy;
        (overlap_x, overlap_y)
    }

    /// Top-left coordinate on the axis perpendicular to rank flow.
    pub fn cross(&self, direction: Direction) -> f64 {
        if direction.is_horizontal() {
            self.y
        } else {
            self.x
        }
    }

    pub fn set_cross(&mut self, direction: Direction, value: f64) {
        if direction.is_horizontal() {
            self.y = value;
        } else {
            self.x = value;
        }
    }
}

#[derive(Debug, Clone)]
pub struct LayoutNode<'a> {
    pub id: &'a str,
    pub node_type: Option<&'a str>,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct LayoutEdge<'a> {
    pub source: usize,
    pub target: usize,
    pub target_handle: Option<&'a str>,
}

/// Arena view of one arrange request. Node `i` of the arena is node `i` of
/// the caller's slice; edges are resolved to arena indices once, and edges
/// naming unknown nodes are dropped here.
#[derive(Debug, Clone)]
pub struct LayoutGraph<'a> {
    pub nodes: Vec<LayoutNode<'a>>,
    pub edges: Vec<LayoutEdge<'a>>,
}

impl<'a> LayoutGraph<'a> {
    pub fn build(nodes: &'a [Node], edges: &'a [Edge], sizes: &NodeSizeDefaults) -> Self {
        let mut index: HashMap<&'a str, usize> = HashMap::with_capacity(nodes.len());
        let mut layout_nodes = Vec::with_capacity(nodes.len());
        for (idx, node) in nodes.iter().enumerate() {
            if index.contains_key(node.id.as_str()) {
                tracing::warn!(
                    id = %node.id,
                    "duplicate node id; later copy is laid out unconnected"
                );
            } else {
                index.insert(node.id.as_str(), idx);
            }
            let (width, height) = sizes.resolve(node.dimensions);
            layout_nodes.push(LayoutNode {
                id: node.id.as_str(),
                node_type: node.node_type.as_deref(),
                width,
                height,
            });
        }

        let mut layout_edges = Vec::with_capacity(edges.len());
        for edge in edges {
            let (Some(&source), Some(&target)) = (
                index.get(edge.source.as_str()),
                index.get(edge.target.as_str()),
            ) else {
                tracing::trace!(
                    source = %edge.source,
                    target = %edge.target,
                    "ignoring edge with unknown endpoint"
                );
                continue;
            };
            layout_edges.push(LayoutEdge {
                source,
                target,
                target_handle: edge.target_handle.as_deref(),
            });
        }

        Self {
            nodes: layout_nodes,
            edges: layout_edges,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Distinct `(source, target)` arcs in first-seen order, self-loops removed.
    pub fn arcs(&self) -> Vec<(usize, usize)> {
        let mut seen = std::collections::HashSet::new();
        self.edges
            .iter()
            .filter(|edge| edge.source != edge.target)
            .map(|edge| (edge.source, edge.target))
            .filter(|arc| seen.insert(*arc))
            .collect()
    }
}
