use crate::grid::Grid;
use crate::settlement::SettlementMap;
use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::HashSet;

/// Граф соседства поселений: узел — номер поселения, ребро — общая 4-связная граница
#[must_use]
pub fn build_settlement_graph(map: &SettlementMap) -> UnGraph<u32, ()> {
    let mut graph = UnGraph::new_undirected();
    let nodes: Vec<NodeIndex> = (1..=map.num_settlements() as u32)
        .map(|label| graph.add_node(label))
        .collect();

    let grid = Grid::new(map.width, map.height);
    let mut edges = HashSet::new();

    for (idx, &label) in map.data.iter().enumerate() {
        if label == 0 {
            continue;
        }
        let (x, y) = grid.coords(idx);
        // вправо и вниз достаточно: каждая пара клеток проверяется один раз
        for nidx in [grid.index(x + 1, y), grid.index(x, y + 1)] {
            let n_label = map.data[nidx];
            if n_label != 0 && n_label != label {
                let (a, b) = if label < n_label {
                    (label, n_label)
                } else {
                    (n_label, label)
                };
                if edges.insert((a, b)) {
                    graph.add_edge(nodes[a as usize - 1], nodes[b as usize - 1], ());
                }
            }
        }
    }
    graph
}

/// Пары соседних поселений `(a, b)` с `a < b`, отсортированные
#[must_use]
pub fn settlement_adjacency(graph: &UnGraph<u32, ()>) -> Vec<(u32, u32)> {
    let mut pairs: Vec<(u32, u32)> = graph
        .edge_indices()
        .filter_map(|e| graph.edge_endpoints(e))
        .map(|(a, b)| {
            let (a, b) = (graph[a], graph[b]);
            (a.min(b), a.max(b))
        })
        .collect();
    pairs.sort_unstable();
    pairs
}
