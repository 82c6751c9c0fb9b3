//! Iterative separation of overlapping node boxes.
//!
//! Boxes sharing an exact centre are first fanned out on a golden-angle
//! spiral, so a pile of identical positions does not collapse onto one axis.
//! Every sweep then visits all unordered pairs. A pair whose gap-inflated boxes
//! overlap on both axes is pushed apart along the axis with the smaller overlap
//! relative to the pair's combined half-extent, each box moving half the
//! overlap plus a small slack away from the other. Separating one pair can push
//! a box into a third one, so sweeps repeat until a clean sweep or the
//! iteration budget runs out. The result is a heuristic: a non-converged run
//! returns its best effort.

use std::collections::HashMap;
use std::f64::consts::PI;

use serde::Serialize;

use super::types::Rect;
use crate::config::{CollisionConfig, LayoutOptions};
use crate::ir::{Node, Position};

/// Overlap below this is treated as touching.
const OVERLAP_EPSILON: f64 = 1e-6;

/// Distance of the first repeat from a shared centre; the m-th repeat sits at
/// `STACK_FAN_RADIUS * sqrt(m)`.
const STACK_FAN_RADIUS: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollisionReport {
    /// Sweeps performed, including the final clean one.
    pub iterations: usize,
    pub converged: bool,
    /// Pairs still closer than the minimum gap when resolution stopped.
    pub remaining_overlaps: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

/// Per-axis overlap of two gap-inflated boxes, or `None` when they clear the
/// gap on either axis.
fn penetration(a: &Rect, b: &Rect, gap: f64) -> Option<(f64, f64)> {
    let (overlap_x, overlap_y) = a.overlap_with(b, gap);
    if overlap_x <= OVERLAP_EPSILON || overlap_y <= OVERLAP_EPSILON {
        return None;
    }
    Some((overlap_x, overlap_y))
}

/// Picks the axis whose overlap is smaller as a share of the distance the
/// centres must reach. Ties and coincident centres alternate with the pair's
/// index parity.
fn resolution_axis(a: &Rect, b: &Rect, gap: f64, overlap: (f64, f64), parity: usize) -> Axis {
    let fallback = if parity % 2 == 0 { Axis::X } else { Axis::Y };
    if a.center_x() == b.center_x() && a.center_y() == b.center_y() {
        return fallback;
    }
    let reach_x = (a.width + b.width) / 2.0 + gap;
    let reach_y = (a.height + b.height) / 2.0 + gap;
    let share_x = overlap.0 / reach_x;
    let share_y = overlap.1 / reach_y;
    if share_x < share_y {
        Axis::X
    } else if share_y < share_x {
        Axis::Y
    } else {
        fallback
    }
}

/// Moves every overlapping repeat of an exact centre onto a golden-angle
/// spiral around the first box with that centre, in arena order.
fn fan_out_stacked(boxes: &mut [Rect], gap: f64) {
    let golden_angle = PI * (3.0 - 5.0_f64.sqrt());
    let mut stacks: HashMap<(u64, u64), (usize, usize)> = HashMap::new();
    for index in 0..boxes.len() {
        let key = (
            (boxes[index].center_x() + 0.0).to_bits(),
            (boxes[index].center_y() + 0.0).to_bits(),
        );
        let (first, repeats) = stacks.entry(key).or_insert((index, 0));
        if *first == index || penetration(&boxes[*first], &boxes[index], gap).is_none() {
            continue;
        }
        *repeats += 1;
        let radius = STACK_FAN_RADIUS * (*repeats as f64).sqrt();
        let angle = *repeats as f64 * golden_angle;
        boxes[index].x += radius * angle.cos();
        boxes[index].y += radius * angle.sin();
    }
}

/// Separates `boxes` in place. `ids` breaks ties when two centres coincide on
/// the resolution axis: the lexicographically smaller id moves negative.
///
/// Each push is `overlap / 2 + separation_slack` per box; a slack of 0 gives
/// the plain half-overlap step.
pub(crate) fn separate_boxes(
    boxes: &mut [Rect],
    ids: &[&str],
    config: &CollisionConfig,
) -> CollisionReport {
    debug_assert_eq!(boxes.len(), ids.len());
    let count = boxes.len();
    let gap = config.min_gap;
    let mut report = CollisionReport::default();
    fan_out_stacked(boxes, gap);

    for _ in 0..config.max_iterations {
        report.iterations += 1;
        let mut moved = false;
        for i in 0..count {
            for j in (i + 1)..count {
                let Some(overlaps) = penetration(&boxes[i], &boxes[j], gap) else {
                    continue;
                };
                moved = true;
                let axis = resolution_axis(&boxes[i], &boxes[j], gap, overlaps, i + j);
                let overlap = match axis {
                    Axis::X => overlaps.0,
                    Axis::Y => overlaps.1,
                };
                let push = overlap / 2.0 + config.separation_slack;
                let delta = match axis {
                    Axis::X => boxes[j].center_x() - boxes[i].center_x(),
                    Axis::Y => boxes[j].center_y() - boxes[i].center_y(),
                };
                let i_moves_negative = if delta == 0.0 {
                    (ids[i], i) < (ids[j], j)
                } else {
                    delta > 0.0
                };
                let step = if i_moves_negative { push } else { -push };
                match axis {
                    Axis::X => {
                        boxes[i].x -= step;
                        boxes[j].x += step;
                    }
                    Axis::Y => {
                        boxes[i].y -= step;
                        boxes[j].y += step;
                    }
                }
            }
        }
        if !moved {
            report.converged = true;
            break;
        }
    }

    if !report.converged {
        report.remaining_overlaps = count_box_overlaps(boxes, gap);
        tracing::warn!(
            iterations = report.iterations,
            remaining = report.remaining_overlaps,
            "collision resolution hit its iteration budget"
        );
    } else {
        tracing::debug!(
            iterations = report.iterations,
            "collision resolution converged"
        );
    }
    report
}

pub(crate) fn count_box_overlaps(boxes: &[Rect], gap: f64) -> usize {
    let mut total = 0;
    for i in 0..boxes.len() {
        for j in (i + 1)..boxes.len() {
            if penetration(&boxes[i], &boxes[j], gap).is_some() {
                total += 1;
            }
        }
    }
    total
}

fn boxes_for(nodes: &[Node], options: &LayoutOptions) -> Vec<Rect> {
    nodes
        .iter()
        .map(|node| {
            let (width, height) = options.node_size.resolve(node.dimensions);
            Rect {
                x: node.position.x,
                y: node.position.y,
                width,
                height,
            }
        })
        .collect()
}

/// Moves `nodes` apart until no two are closer than `options.collision.min_gap`
/// on both axes, or the iteration budget is spent. Returns new nodes; only
/// `position` differs from the input.
pub fn resolve_overlaps(
    nodes: &[Node],
    options: &LayoutOptions,
) -> (Vec<Node>, CollisionReport) {
    let mut boxes = boxes_for(nodes, options);
    let ids: Vec<&str> = nodes.iter().map(|node| node.id.as_str()).collect();
    let report = separate_boxes(&mut boxes, &ids, &options.collision);
    let resolved = nodes
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
    (resolved, report)
}

/// Number of node pairs closer than `options.collision.min_gap` on both axes.
pub fn count_overlaps(nodes: &[Node], options: &LayoutOptions) -> usize {
    count_box_overlaps(&boxes_for(nodes, options), options.collision.min_gap)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(id: &str, x: f64, y: f64, size: f64) -> Node {
        Node::new(id).at(x, y).sized(size, size)
    }

    fn options_with_gap(min_gap: f64) -> LayoutOptions {
        let mut options = LayoutOptions::default();
        options.collision.min_gap = min_gap;
        options
    }

    #[test]
    fn coincident_squares_separate_by_full_gap() {
        let nodes = vec![square("a", 0.0, 0.0, 100.0), square("b", 0.0, 0.0, 100.0)];
        let options = options_with_gap(40.0);

        let (resolved, report) = resolve_overlaps(&nodes, &options);

        assert!(report.converged);
        assert_eq!(report.remaining_overlaps, 0);
        let dx = (resolved[1].position.x - resolved[0].position.x).abs();
        let dy = (resolved[1].position.y - resolved[0].position.y).abs();
        assert!(dx >= 140.0 || dy >= 140.0, "dx={dx} dy={dy}");
        assert_eq!(count_overlaps(&resolved, &options), 0);
    }

    #[test]
    fn resolves_along_axis_of_least_overlap() {
        // Wide boxes side by side vertically: y needs far less movement than x.
        let nodes = vec![
            Node::new("top").at(0.0, 0.0).sized(400.0, 100.0),
            Node::new("bottom").at(50.0, 90.0).sized(400.0, 100.0),
        ];
        let options = options_with_gap(10.0);

        let (resolved, report) = resolve_overlaps(&nodes, &options);

        assert!(report.converged);
        assert_eq!(resolved[0].position.x, 0.0);
        assert_eq!(resolved[1].position.x, 50.0);
        assert!(resolved[0].position.y < 0.0);
        let gap = resolved[1].position.y - (resolved[0].position.y + 100.0);
        assert!(gap >= 10.0 - 1e-9, "gap {gap}");
    }

    #[test]
    fn separated_nodes_are_untouched() {
        let nodes = vec![square("a", 0.0, 0.0, 100.0), square("b", 500.0, 0.0, 100.0)];
        let options = LayoutOptions::default();

        let (resolved, report) = resolve_overlaps(&nodes, &options);

        assert_eq!(resolved, nodes);
        assert_eq!(report.iterations, 1);
        assert!(report.converged);
    }

    #[test]
    fn chain_reaction_needs_several_sweeps() {
        let nodes: Vec<Node> = (0..6)
            .map(|i| square(&format!("n{i}"), i as f64 * 10.0, 0.0, 100.0))
            .collect();
        let options = LayoutOptions::default();

        let (resolved, report) = resolve_overlaps(&nodes, &options);

        assert!(report.converged);
        assert!(report.iterations > 1);
        assert_eq!(count_overlaps(&resolved, &options), 0);
    }

    #[test]
    fn exhausted_budget_reports_remaining_overlaps() {
        let nodes: Vec<Node> = (0..8)
            .map(|i| square(&format!("n{i}"), 0.0, 0.0, 100.0))
            .collect();
        let mut options = LayoutOptions::default();
        options.collision.max_iterations = 1;

        let (resolved, report) = resolve_overlaps(&nodes, &options);

        assert!(!report.converged);
        assert_eq!(report.iterations, 1);
        let remaining = count_overlaps(&resolved, &options);
        assert_eq!(report.remaining_overlaps, remaining);
        assert!(report.remaining_overlaps > 0);
    }

    #[test]
    fn sizes_and_membership_never_change() {
        let nodes = vec![
            square("a", 0.0, 0.0, 120.0),
            Node::new("b").at(10.0, 10.0),
            square("c", 20.0, 5.0, 60.0),
        ];
        let (resolved, _) = resolve_overlaps(&nodes, &LayoutOptions::default());
        assert_eq!(resolved.len(), nodes.len());
        for (before, after) in nodes.iter().zip(&resolved) {
            assert_eq!(before.id, after.id);
            assert_eq!(before.dimensions, after.dimensions);
        }
    }

    #[test]
    fn coincident_stack_spreads_in_two_dimensions() {
        let nodes: Vec<Node> = (0..20).map(|i| Node::new(format!("n{i}"))).collect();
        let options = LayoutOptions::default();

        let (resolved, report) = resolve_overlaps(&nodes, &options);

        assert!(report.converged, "{} sweeps", report.iterations);
        assert_eq!(count_overlaps(&resolved, &options), 0);
        let span = |value: fn(&Node) -> f64| {
            let values: Vec<f64> = resolved.iter().map(value).collect();
            let max = values.iter().copied().fold(f64::MIN, f64::max);
            let min = values.iter().copied().fold(f64::MAX, f64::min);
            max - min
        };
        let width = span(|node| node.position.x);
        let height = span(|node| node.position.y);
        assert!(width > 280.0 && height > 200.0, "spread {width} x {height}");
    }

    #[test]
    fn unstacked_boxes_are_not_fanned_out() {
        let rect = |x: f64, size: f64| Rect {
            x,
            y: 0.0,
            width: size,
            height: size,
        };
        // Zero-size points share a centre without overlapping.
        let mut boxes = vec![rect(0.0, 0.0), rect(0.0, 0.0), rect(500.0, 100.0)];
        let before = boxes.clone();
        fan_out_stacked(&mut boxes, 0.0);
        assert_eq!(boxes, before);
    }

    #[test]
    fn zero_slack_pushes_exactly_half_the_overlap() {
        let nodes = vec![square("a", 0.0, 0.0, 100.0), square("b", 60.0, 10.0, 100.0)];
        let mut options = options_with_gap(0.0);
        options.collision.separation_slack = 0.0;

        let (resolved, report) = resolve_overlaps(&nodes, &options);

        // Overlap is 40 on x and 90 on y; each square moves 20 along x.
        assert!(report.converged);
        assert_eq!(resolved[0].position.x, -20.0);
        assert_eq!(resolved[1].position.x, 80.0);
        assert_eq!(resolved[0].position.y, 0.0);
        assert_eq!(resolved[1].position.y, 10.0);
    }

    #[test]
    fn default_slack_adds_to_each_half_step() {
        let nodes = vec![square("a", 0.0, 0.0, 100.0), square("b", 60.0, 10.0, 100.0)];
        let options = options_with_gap(0.0);

        let (resolved, _) = resolve_overlaps(&nodes, &options);

        let step = 20.0 + options.collision.separation_slack;
        assert_eq!(resolved[0].position.x, -step);
        assert_eq!(resolved[1].position.x, 60.0 + step);
    }
}
