use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Rank of every vertex plus the arcs that had to be treated as back-edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct RankAssignment {
    pub ranks: Vec<usize>,
    pub back_edges: Vec<(usize, usize)>,
}

/// Longest-path ranking over a topological order that tolerates cycles.
///
/// Vertices become ready in declaration (index) order. When the sweep stalls
/// on a cycle, the earliest-declared unprocessed vertex is promoted as the next
/// source and its still-pending incoming arcs end up as back-edges.
pub(super) fn compute_ranks(vertex_count: usize, arcs: &[(usize, usize)]) -> RankAssignment {
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); vertex_count];
    let mut indeg: Vec<usize> = vec![0; vertex_count];
    for &(from, to) in arcs {
        if from == to || from >= vertex_count || to >= vertex_count {
            continue;
        }
        adj[from].push(to);
        indeg[to] += 1;
    }

    let mut ready: BinaryHeap<Reverse<usize>> = BinaryHeap::new();
    for (id, deg) in indeg.iter().enumerate() {
        if *deg == 0 {
            ready.push(Reverse(id));
        }
    }

    let mut order = Vec::with_capacity(vertex_count);
    let mut processed = vec![false; vertex_count];
    loop {
        while let Some(Reverse(id)) = ready.pop() {
            if processed[id] {
                continue;
            }
            order.push(id);
            processed[id] = true;
            for &next in &adj[id] {
                if processed[next] {
                    continue;
                }
                indeg[next] = indeg[next].saturating_sub(1);
                if indeg[next] == 0 {
                    ready.push(Reverse(next));
                }
            }
        }

        if order.len() >= vertex_count {
            break;
        }

        // Cycle: restart from the earliest-declared vertex still waiting.
        match processed.iter().position(|done| !done) {
            Some(id) => ready.push(Reverse(id)),
            None => break,
        }
    }

    let mut order_index = vec![0usize; vertex_count];
    for (pos, &id) in order.iter().enumerate() {
        order_index[id] = pos;
    }

    let mut ranks = vec![0usize; vertex_count];
    let mut back_edges = Vec::new();
    for &node in &order {
        let rank = ranks[node];
        for &next in &adj[node] {
            if order_index[next] <= order_index[node] {
                back_edges.push((node, next));
                continue;
            }
            ranks[next] = ranks[next].max(rank + 1);
        }
    }

    RankAssignment { ranks, back_edges }
}

/// Reorders every rank bucket with the median heuristic.
///
/// Each pass sweeps down (ordering by incoming neighbours) and then up
/// (ordering by outgoing neighbours). The bucket layout with the fewest
/// crossings seen so far is kept; the returned value is its crossing count.
pub(super) fn order_rank_nodes(
    rank_nodes: &mut [Vec<usize>],
    arcs: &[(usize, usize)],
    vertex_count: usize,
    passes: usize,
) -> usize {
    let mut incoming: Vec<Vec<usize>> = vec![Vec::new(); vertex_count];
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); vertex_count];
    for &(from, to) in arcs {
        outgoing[from].push(to);
        incoming[to].push(from);
    }

    let mut positions = vec![0usize; vertex_count];
    let update_positions = |rank_nodes: &[Vec<usize>], positions: &mut [usize]| {
        for bucket in rank_nodes {
            for (idx, &vertex) in bucket.iter().enumerate() {
                positions[vertex] = idx;
            }
        }
    };
    update_positions(rank_nodes, &mut positions);

    let mut best = rank_nodes.to_vec();
    let mut best_crossings = count_crossings(rank_nodes, &outgoing, &positions);
    if rank_nodes.len() <= 1 || best_crossings == 0 {
        return best_crossings;
    }

    let sort_bucket = |bucket: &mut Vec<usize>, neighbors: &[Vec<usize>], positions: &[usize]| {
        let scores: Vec<(usize, f64)> = bucket
            .iter()
            .enumerate()
            .map(|(idx, &vertex)| (vertex, median_position(vertex, idx, neighbors, positions)))
            .collect();
        let mut keyed: Vec<(f64, usize, usize)> = scores
            .into_iter()
            .enumerate()
            .map(|(idx, (vertex, score))| (score, idx, vertex))
            .collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        for (slot, (_, _, vertex)) in bucket.iter_mut().zip(keyed) {
            *slot = vertex;
        }
    };

    for _ in 0..passes.max(1) {
        for rank in 1..rank_nodes.len() {
            if rank_nodes[rank].len() > 1 {
                sort_bucket(&mut rank_nodes[rank], &incoming, &positions);
                update_positions(rank_nodes, &mut positions);
            }
        }
        for rank in (0..rank_nodes.len().saturating_sub(1)).rev() {
            if rank_nodes[rank].len() > 1 {
                sort_bucket(&mut rank_nodes[rank], &outgoing, &positions);
                update_positions(rank_nodes, &mut positions);
            }
        }

        let crossings = count_crossings(rank_nodes, &outgoing, &positions);
        if crossings < best_crossings {
            best_crossings = crossings;
            best = rank_nodes.to_vec();
        }
        if best_crossings == 0 {
            break;
        }
    }

    rank_nodes.clone_from_slice(&best);
    best_crossings
}

/// Median position of `vertex`'s neighbours in their own rank. Vertices with
/// no placed neighbour keep their current slot.
pub(super) fn median_position(
    vertex: usize,
    current: usize,
    neighbors: &[Vec<usize>],
    positions: &[usize],
) -> f64 {
    let list = &neighbors[vertex];
    if list.is_empty() {
        return current as f64;
    }
    let mut values: Vec<f64> = list.iter().map(|&n| positions[n] as f64).collect();
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) * 0.5
    }
}

/// Crossings between each pair of adjacent ranks. Every arc is expected to
/// join rank `r` to rank `r + 1`.
pub(super) fn count_crossings(
    rank_nodes: &[Vec<usize>],
    outgoing: &[Vec<usize>],
    positions: &[usize],
) -> usize {
    let mut total = 0;
    for bucket in rank_nodes {
        let mut segments: Vec<(usize, usize)> = Vec::new();
        for &from in bucket {
            for &to in &outgoing[from] {
                segments.push((positions[from], positions[to]));
            }
        }
        for (i, a) in segments.iter().enumerate() {
            for b in &segments[i + 1..] {
                if (a.0 < b.0 && a.1 > b.1) || (a.0 > b.0 && a.1 < b.1) {
                    total += 1;
                }
            }
        }
    }
    total
}
