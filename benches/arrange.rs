use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use graph_arrange::config::LayoutOptions;
use graph_arrange::document::GraphDocument;
use graph_arrange::handles::{HandleRegistry, NoHandleSlots};
use graph_arrange::ir::{Direction, Edge, Node};
use graph_arrange::layout::{arrange, resolve_overlaps};
use std::hint::black_box;

/// A chain with `extra_edges` forward skip edges, every merge landing on a
/// `mix` node's numbered inputs.
fn dense_graph(nodes: usize, extra_edges: usize) -> (Vec<Node>, Vec<Edge>) {
    let graph_nodes: Vec<Node> = (0..nodes)
        .map(|i| Node::new(format!("N{i}")).typed("mix"))
        .collect();
    let mut edges = Vec::new();
    for i in 0..nodes.saturating_sub(1) {
        let edge = Edge::new(format!("N{i}"), format!("N{}", i + 1));
        edges.push(edge.to_handle("in0"));
    }
    let mut count = 0usize;
    'outer: for i in 0..nodes {
        for j in (i + 2)..nodes {
            if count >= extra_edges {
                break 'outer;
            }
            let slot = (j - i) % 4;
            let edge = Edge::new(format!("N{i}"), format!("N{j}"));
            edges.push(edge.to_handle(format!("in{slot}")));
            count += 1;
        }
    }
    (graph_nodes, edges)
}

/// `count` nodes scattered over a square so that most of them overlap.
fn pile(count: usize) -> Vec<Node> {
    let span = 500.0 * (count as f64).sqrt();
    (0..count)
        .map(|i| {
            // Cheap deterministic scatter.
            let fx = ((i * 7919) % 1000) as f64 / 1000.0;
            let fy = ((i * 104_729) % 1000) as f64 / 1000.0;
            Node::new(format!("P{i}"))
                .at(fx * span, fy * span)
                .sized(200.0 + (i % 5) as f64 * 40.0, 140.0 + (i % 3) as f64 * 60.0)
        })
        .collect()
}

fn mix_registry() -> HandleRegistry {
    let mut registry = HandleRegistry::new();
    registry.register("mix", ["in0", "in1", "in2", "in3"]);
    registry
}

fn bench_arrange(c: &mut Criterion) {
    let mut group = c.benchmark_group("arrange");
    let registry = mix_registry();
    for (nodes, extra_edges) in [(40usize, 80usize), (60, 180), (80, 320)] {
        let name = format!("dense_{}_{}", nodes, extra_edges);
        let graph = dense_graph(nodes, extra_edges);
        for direction in [Direction::TopBottom, Direction::LeftRight] {
            let options = LayoutOptions::default().with_direction(direction);
            group.bench_with_input(
                BenchmarkId::new(direction.token(), &name),
                &graph,
                |b, (nodes, edges)| {
                    b.iter(|| {
                        let arrangement = arrange(black_box(nodes), edges, &options, &registry);
                        black_box(arrangement.crossings);
                    });
                },
            );
        }
    }
    group.finish();
}

fn bench_handle_free(c: &mut Criterion) {
    let mut group = c.benchmark_group("arrange_without_handles");
    let options = LayoutOptions::default();
    for (nodes, extra_edges) in [(40usize, 80usize), (80, 320)] {
        let name = format!("dense_{}_{}", nodes, extra_edges);
        let graph = dense_graph(nodes, extra_edges);
        group.bench_with_input(BenchmarkId::from_parameter(name), &graph, |b, (nodes, edges)| {
            b.iter(|| {
                let arrangement = arrange(black_box(nodes), edges, &options, &NoHandleSlots);
                black_box(arrangement.nodes.len());
            });
        });
    }
    group.finish();
}

fn bench_collisions(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_overlaps");
    let options = LayoutOptions::default();
    for count in [10usize, 25, 50] {
        let nodes = pile(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &nodes, |b, nodes| {
            b.iter(|| {
                let (resolved, report) = resolve_overlaps(black_box(nodes), &options);
                black_box((resolved.len(), report.iterations));
            });
        });
    }
    group.finish();
}

fn bench_document(c: &mut Criterion) {
    let mut group = c.benchmark_group("document");
    let (nodes, edges) = dense_graph(80, 320);
    let input = GraphDocument::new(nodes, edges)
        .to_json_string()
        .expect("serialize failed");
    group.bench_function("parse_dense_80_320", |b| {
        b.iter(|| {
            let document = GraphDocument::from_json_str(black_box(&input)).expect("parse failed");
            black_box(document.nodes.len());
        });
    });
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_arrange, bench_handle_free, bench_collisions, bench_document
);
criterion_main!(benches);
