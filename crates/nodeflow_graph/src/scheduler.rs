// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dependency ordering over dense vertex indices.
//!
//! Vertices are `0..vertex_count`; an edge `(u, v)` means `u` must run before
//! `v`. The sort is a depth-first search driven by an explicit work stack, so
//! long dependency chains never grow the call stack.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

/// Linearize a directed graph so every edge points forward.
///
/// Roots are tried in ascending index order. Children are explored in reverse
/// edge order, so among independent successors of a vertex the one whose edge
/// was added first comes first in the result. The output is fully determined
/// by `vertex_count` and the order of `edges`.
///
/// # Panics
///
/// Panics if an edge refers to a vertex outside `0..vertex_count`.
pub fn topological_sort(
    vertex_count: usize,
    edges: &[(usize, usize)],
) -> Result<Vec<usize>, CycleDetected> {
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); vertex_count];
    for &(from, to) in edges {
        adjacency[from].push(to);
    }

    let mut marks = vec![Mark::Unvisited; vertex_count];
    let mut postorder = Vec::with_capacity(vertex_count);
    // (vertex, children left to explore)
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..vertex_count {
        if marks[root] != Mark::Unvisited {
            continue;
        }
        marks[root] = Mark::OnPath;
        stack.push((root, adjacency[root].len()));

        while let Some(frame) = stack.last_mut() {
            let (vertex, remaining) = *frame;
            if remaining == 0 {
                stack.pop();
                marks[vertex] = Mark::Done;
                postorder.push(vertex);
                continue;
            }
            frame.1 -= 1;

            let next = adjacency[vertex][remaining - 1];
            match marks[next] {
                Mark::Unvisited => {
                    marks[next] = Mark::OnPath;
                    stack.push((next, adjacency[next].len()));
                }
                Mark::OnPath => {
                    let start = stack
                        .iter()
                        .position(|&(v, _)| v == next)
                        .unwrap_or_default();
                    return Err(CycleDetected {
                        vertices: stack[start..].iter().map(|&(v, _)| v).collect(),
                    });
                }
                Mark::Done => {}
            }
        }
    }

    postorder.reverse();
    Ok(postorder)
}

/// The edges contain a cycle
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Dependency cycle through vertices {vertices:?}")]
pub struct CycleDetected {
    /// Vertices on the cycle, in path order
    pub vertices: Vec<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_respects_edges(order: &[usize], edges: &[(usize, usize)]) {
        let position = |v: usize| order.iter().position(|&x| x == v).unwrap();
        for &(u, v) in edges {
            assert!(position(u) < position(v), "edge {u}->{v} violated in {order:?}");
        }
    }

    #[test]
    fn test_single_edge() {
        assert_eq!(topological_sort(2, &[(0, 1)]).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_reversed_indices() {
        assert_eq!(topological_sort(2, &[(1, 0)]).unwrap(), vec![1, 0]);
    }

    #[test]
    fn test_fan_out_keeps_wiring_order() {
        // A -> B, A -> C
        assert_eq!(topological_sort(3, &[(0, 1), (0, 2)]).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_every_vertex_once() {
        let edges = [(0, 3), (3, 5), (1, 5), (2, 4)];
        let order = topological_sort(7, &edges).unwrap();

        let mut sorted = order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..7).collect::<Vec<_>>());
        assert_respects_edges(&order, &edges);
    }

    #[test]
    fn test_empty_graph() {
        assert!(topological_sort(0, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_diamond_with_duplicate_edges() {
        let edges = [(0, 1), (0, 2), (1, 3), (2, 3), (1, 3)];
        let order = topological_sort(4, &edges).unwrap();
        assert_eq!(order.len(), 4);
        assert_respects_edges(&order, &edges);
    }

    #[test]
    fn test_deterministic() {
        let edges = [(4, 0), (2, 1), (0, 1), (3, 2), (5, 3)];
        let first = topological_sort(6, &edges).unwrap();
        let second = topological_sort(6, &edges).unwrap();
        assert_eq!(first, second);
        assert_respects_edges(&first, &edges);
    }

    #[test]
    fn test_three_cycle_detected() {
        let err = topological_sort(3, &[(0, 1), (1, 2), (2, 0)]).unwrap_err();
        assert_eq!(err.vertices, vec![0, 1, 2]);
    }

    #[test]
    fn test_cycle_behind_acyclic_prefix() {
        // 0 -> 1 -> 2 -> 3 -> 1
        let err = topological_sort(4, &[(0, 1), (1, 2), (2, 3), (3, 1)]).unwrap_err();
        assert_eq!(err.vertices, vec![1, 2, 3]);
    }

    #[test]
    fn test_self_edge_is_cycle() {
        let err = topological_sort(2, &[(1, 1)]).unwrap_err();
        assert_eq!(err.vertices, vec![1]);
    }

    #[test]
    fn test_long_chain_does_not_overflow() {
        let n = 200_000;
        let edges: Vec<(usize, usize)> = (0..n - 1).map(|i| (i, i + 1)).collect();
        let order = topological_sort(n, &edges).unwrap();
        assert_eq!(order.first(), Some(&0));
        assert_eq!(order.last(), Some(&(n - 1)));
    }
}
