use crate::config::LayoutOptions;
use crate::ir::Edge;
use crate::layout::{Arrangement, CollisionReport};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub direction: String,
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
    pub crossings: usize,
    pub reconciled_targets: usize,
    pub collision: CollisionReport,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub rank: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Straight centre-to-centre segment; edges with unknown endpoints are left out.
#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub from: String,
    pub to: String,
    pub points: Vec<[f64; 2]>,
}

impl LayoutDump {
    pub fn from_arrangement(
        arrangement: &Arrangement,
        edges: &[Edge],
        options: &LayoutOptions,
    ) -> Self {
        let nodes: Vec<NodeDump> = arrangement
            .nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| {
                let (width, height) = options.node_size.resolve(node.dimensions);
                NodeDump {
                    id: node.id.clone(),
                    rank: arrangement.ranks.get(idx).copied().unwrap_or(0),
                    x: node.position.x,
                    y: node.position.y,
                    width,
                    height,
                }
            })
            .collect();

        let mut centers: HashMap<&str, [f64; 2]> = HashMap::new();
        for node in &nodes {
            centers
                .entry(node.id.as_str())
                .or_insert([node.x + node.width / 2.0, node.y + node.height / 2.0]);
        }
        let edges = edges
            .iter()
            .filter_map(|edge| {
                let from = centers.get(edge.source.as_str())?;
                let to = centers.get(edge.target.as_str())?;
                Some(EdgeDump {
                    from: edge.source.clone(),
                    to: edge.target.clone(),
                    points: vec![*from, *to],
                })
            })
            .collect();

        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for node in &nodes {
            min_x = min_x.min(node.x);
            min_y = min_y.min(node.y);
            max_x = max_x.max(node.x + node.width);
            max_y = max_y.max(node.y + node.height);
        }
        if nodes.is_empty() {
            (min_x, min_y, max_x, max_y) = (0.0, 0.0, 0.0, 0.0);
        }

        LayoutDump {
            direction: options.direction.token().to_string(),
            min_x,
            min_y,
            width: max_x - min_x,
            height: max_y - min_y,
            crossings: arrangement.crossings,
            reconciled_targets: arrangement.reconciled_targets,
            collision: arrangement.collision,
            nodes,
            edges,
        }
    }
}

pub fn write_layout_dump(
    path: &Path,
    arrangement: &Arrangement,
    edges: &[Edge],
    options: &LayoutOptions,
) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_arrangement(arrangement, edges, options);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
