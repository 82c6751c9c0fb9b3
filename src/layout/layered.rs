//! Layered (Sugiyama-style) placement: rank, order, then coordinates.

use std::collections::HashSet;

use super::ranking::{RankAssignment, compute_ranks, order_rank_nodes};
use super::types::{LayoutGraph, Point};
use crate::config::LayoutOptions;

/// Fraction of the distance to the neighbours' median a node moves per sweep.
const MEDIAN_PULL: f64 = 0.85;

/// Output of a layered engine, indexed like `LayoutGraph::nodes`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayeredPlacement {
    /// Centre point of every node.
    pub centers: Vec<Point>,
    pub ranks: Vec<usize>,
    /// Edge crossings left after in-rank ordering.
    pub crossings: usize,
}

/// Ranks a directed graph and returns centre positions for its nodes.
///
/// The handle reconciler and collision resolver only consume the returned
/// centres, so any layered drawing implementation can stand in here.
pub trait LayeredEngine {
    fn place(&self, graph: &LayoutGraph<'_>, options: &LayoutOptions) -> LayeredPlacement;
}

/// Longest-path ranking, median ordering and median-pull coordinate
/// assignment.
#[derive(Debug, Clone, Copy, Default)]
pub struct SugiyamaEngine;

impl LayeredEngine for SugiyamaEngine {
    fn place(&self, graph: &LayoutGraph<'_>, options: &LayoutOptions) -> LayeredPlacement {
        let node_count = graph.len();
        if node_count == 0 {
            return LayeredPlacement::default();
        }

        let arcs = graph.arcs();
        let RankAssignment { ranks, back_edges } = compute_ranks(node_count, &arcs);
        let max_rank = ranks.iter().copied().max().unwrap_or(0);

        let mut rank_nodes: Vec<Vec<usize>> = vec![Vec::new(); max_rank + 1];
        for (vertex, &rank) in ranks.iter().enumerate() {
            rank_nodes[rank].push(vertex);
        }

        // Orient every arc downward and split long arcs into dummy chains.
        // Vertices at or past `node_count` are dummies.
        let mut vertex_count = node_count;
        let mut expanded: Vec<(usize, usize)> = Vec::new();
        let mut oriented: HashSet<(usize, usize)> = HashSet::new();
        for &(from, to) in &arcs {
            let (upper, lower) = match ranks[from].cmp(&ranks[to]) {
                std::cmp::Ordering::Less => (from, to),
                std::cmp::Ordering::Greater => (to, from),
                std::cmp::Ordering::Equal => continue,
            };
            if !oriented.insert((upper, lower)) {
                continue;
            }
            let start = ranks[upper];
            let span = ranks[lower] - start;
            let mut prev = upper;
            for step in 1..span {
                let dummy = vertex_count;
                vertex_count += 1;
                rank_nodes[start + step].push(dummy);
                expanded.push((prev, dummy));
                prev = dummy;
            }
            expanded.push((prev, lower));
        }

        let crossings = order_rank_nodes(
            &mut rank_nodes,
            &expanded,
            vertex_count,
            options.order_passes,
        );
        let centers = assign_coordinates(graph, &rank_nodes, &expanded, vertex_count, options);

        tracing::debug!(
            nodes = node_count,
            ranks = max_rank + 1,
            dummies = vertex_count - node_count,
            back_edges = back_edges.len(),
            crossings,
            "layered placement"
        );

        LayeredPlacement {
            centers,
            ranks,
            crossings,
        }
    }
}

fn assign_coordinates(
    graph: &LayoutGraph<'_>,
    rank_nodes: &[Vec<usize>],
    arcs: &[(usize, usize)],
    vertex_count: usize,
    options: &LayoutOptions,
) -> Vec<Point> {
    let node_count = graph.len();
    let horizontal = options.direction.is_horizontal();

    // (extent along rank flow, extent across it); dummies have no size.
    let mut main_extent = vec![0.0f64; vertex_count];
    let mut cross_half = vec![0.0f64; vertex_count];
    for (idx, node) in graph.nodes.iter().enumerate() {
        let (main, cross) = if horizontal {
            (node.width, node.height)
        } else {
            (node.height, node.width)
        };
        main_extent[idx] = main;
        cross_half[idx] = cross / 2.0;
    }

    let mut main_pos = vec![0.0f64; vertex_count];
    let mut main_cursor = 0.0;
    for bucket in rank_nodes {
        let band = bucket
            .iter()
            .map(|&v| main_extent[v])
            .fold(0.0f64, f64::max);
        for &vertex in bucket {
            main_pos[vertex] = main_cursor + band / 2.0;
        }
        if band > 0.0 {
            main_cursor += band + options.rank_spacing;
        }
    }
    let total_main = (main_cursor - options.rank_spacing).max(0.0);

    let mut incoming: Vec<Vec<usize>> = vec![Vec::new(); vertex_count];
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); vertex_count];
    for &(from, to) in arcs {
        outgoing[from].push(to);
        incoming[to].push(from);
    }

    let spacing = CrossSpacing {
        node_count,
        node_spacing: options.node_spacing,
        half: &cross_half,
    };

    let mut cross_pos = vec![0.0f64; vertex_count];
    for bucket in rank_nodes {
        let mut prev: Option<usize> = None;
        for &vertex in bucket {
            cross_pos[vertex] = match prev {
                Some(p) => cross_pos[p] + spacing.min_distance(p, vertex),
                None => cross_half[vertex],
            };
            prev = Some(vertex);
        }
    }

    for _ in 0..options.order_passes.max(1) {
        for bucket in rank_nodes {
            place_rank(bucket, &incoming, &mut cross_pos, &spacing);
        }
        for bucket in rank_nodes.iter().rev() {
            place_rank(bucket, &outgoing, &mut cross_pos, &spacing);
        }
    }

    let min_cross = (0..node_count)
        .map(|v| cross_pos[v] - cross_half[v])
        .fold(f64::INFINITY, f64::min);
    let shift = if min_cross.is_finite() { min_cross } else { 0.0 };

    (0..node_count)
        .map(|v| {
            let cross = cross_pos[v] - shift;
            let main = if options.direction.is_reversed() {
                total_main - main_pos[v]
            } else {
                main_pos[v]
            };
            if horizontal {
                Point { x: main, y: cross }
            } else {
                Point { x: cross, y: main }
            }
        })
        .collect()
}

struct CrossSpacing<'a> {
    node_count: usize,
    node_spacing: f64,
    half: &'a [f64],
}

impl CrossSpacing<'_> {
    /// Minimum centre distance between neighbours `a` then `b` of one rank.
    /// A dummy only claims half the node gap on its sides.
    fn min_distance(&self, a: usize, b: usize) -> f64 {
        let gap = if a >= self.node_count || b >= self.node_count {
            self.node_spacing / 2.0
        } else {
            self.node_spacing
        };
        self.half[a] + self.half[b] + gap
    }
}

/// Pulls each vertex of `bucket` toward the median of its neighbours, keeping
/// bucket order and minimum spacing, then recentres the rank on the mean of
/// the requested positions.
fn place_rank(
    bucket: &[usize],
    neighbors: &[Vec<usize>],
    cross_pos: &mut [f64],
    spacing: &CrossSpacing<'_>,
) {
    if bucket.is_empty() {
        return;
    }

    let desired: Vec<f64> = bucket
        .iter()
        .map(|&vertex| {
            let current = cross_pos[vertex];
            let mut centers: Vec<f64> = neighbors[vertex].iter().map(|&n| cross_pos[n]).collect();
            if centers.is_empty() {
                return current;
            }
            centers.sort_by(f64::total_cmp);
            let mid = centers.len() / 2;
            let median = if centers.len() % 2 == 1 {
                centers[mid]
            } else {
                (centers[mid - 1] + centers[mid]) * 0.5
            };
            current + (median - current) * MEDIAN_PULL
        })
        .collect();

    let mut assigned: Vec<f64> = Vec::with_capacity(bucket.len());
    for (idx, &vertex) in bucket.iter().enumerate() {
        let center = if idx == 0 {
            desired[0]
        } else {
            let prev = bucket[idx - 1];
            desired[idx].max(assigned[idx - 1] + spacing.min_distance(prev, vertex))
        };
        assigned.push(center);
    }

    let count = bucket.len() as f64;
    let desired_mean = desired.iter().sum::<f64>() / count;
    let actual_mean = assigned.iter().sum::<f64>() / count;
    let delta = desired_mean - actual_mean;
    for (&vertex, center) in bucket.iter().zip(assigned) {
        cross_pos[vertex] = center + delta;
    }
}
