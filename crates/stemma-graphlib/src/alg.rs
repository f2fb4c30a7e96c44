//! Helper algorithms over [`Graph`].
//!
//! All results are expressed as node indices. Traversals are iterative so deep lineages cannot
//! exhaust the stack.

use super::Graph;
use std::collections::VecDeque;

/// Returns `true` if `to` is reachable from `from` by following successor edges.
///
/// A node always reaches itself.
pub fn has_path<N, E>(g: &Graph<N, E>, from: usize, to: usize) -> bool {
    if from >= g.node_count() || to >= g.node_count() {
        return false;
    }
    let mut visited = vec![false; g.node_count()];
    let mut stack = vec![from];
    while let Some(v) = stack.pop() {
        if v == to {
            return true;
        }
        if std::mem::replace(&mut visited[v], true) {
            continue;
        }
        stack.extend(g.successor_ixs(v).filter(|&w| !visited[w]));
    }
    false
}

/// Weakly connected components. Members are sorted by index and components are ordered by their
/// smallest member.
pub fn components<N, E>(g: &Graph<N, E>) -> Vec<Vec<usize>> {
    let mut seen = vec![false; g.node_count()];
    let mut out: Vec<Vec<usize>> = Vec::new();

    for start in 0..g.node_count() {
        if seen[start] {
            continue;
        }
        seen[start] = true;
        let mut comp: Vec<usize> = Vec::new();
        let mut q: VecDeque<usize> = VecDeque::new();
        q.push_back(start);
        while let Some(v) = q.pop_front() {
            comp.push(v);
            for n in g.successor_ixs(v).chain(g.predecessor_ixs(v)) {
                if !seen[n] {
                    seen[n] = true;
                    q.push_back(n);
                }
            }
        }
        comp.sort_unstable();
        out.push(comp);
    }

    out
}

/// Kahn topological order. Sources are seeded in index order and successors are released in
/// edge insertion order.
///
/// Nodes that sit on a cycle, or below one, never reach in-degree zero and are left out, so a
/// result shorter than `g.node_count()` means the graph is cyclic.
pub fn topological_order<N, E>(g: &Graph<N, E>) -> Vec<usize> {
    let mut indegree: Vec<usize> = (0..g.node_count()).map(|ix| g.in_degree(ix)).collect();
    let mut queue: VecDeque<usize> = (0..g.node_count())
        .filter(|&ix| indegree[ix] == 0)
        .collect();

    let mut order: Vec<usize> = Vec::with_capacity(g.node_count());
    while let Some(v) = queue.pop_front() {
        order.push(v);
        for w in g.successor_ixs(v) {
            indegree[w] -= 1;
            if indegree[w] == 0 {
                queue.push_back(w);
            }
        }
    }
    order
}

/// Strongly connected components (Tarjan) that form cycles: components with more than one
/// member, plus single nodes carrying a self-loop.
///
/// Members are sorted by index and cycles are ordered by their smallest member.
pub fn find_cycles<N, E>(g: &Graph<N, E>) -> Vec<Vec<usize>> {
    struct Frame {
        v: usize,
        succ: Vec<usize>,
        next: usize,
    }

    let n = g.node_count();
    let mut index: Vec<Option<usize>> = vec![None; n];
    let mut lowlink: Vec<usize> = vec![0; n];
    let mut on_stack: Vec<bool> = vec![false; n];
    let mut stack: Vec<usize> = Vec::new();
    let mut counter = 0usize;
    let mut sccs: Vec<Vec<usize>> = Vec::new();

    for start in 0..n {
        if index[start].is_some() {
            continue;
        }

        let mut call: Vec<Frame> = Vec::new();
        let mut pending = Some(start);
        loop {
            if let Some(v) = pending.take() {
                index[v] = Some(counter);
                lowlink[v] = counter;
                counter += 1;
                stack.push(v);
                on_stack[v] = true;
                call.push(Frame {
                    v,
                    succ: g.successor_ixs(v).collect(),
                    next: 0,
                });
            }

            let Some(frame) = call.last_mut() else {
                break;
            };
            let v = frame.v;

            if frame.next < frame.succ.len() {
                let w = frame.succ[frame.next];
                frame.next += 1;
                match index[w] {
                    None => pending = Some(w),
                    Some(w_idx) if on_stack[w] => lowlink[v] = lowlink[v].min(w_idx),
                    Some(_) => {}
                }
                continue;
            }

            call.pop();
            if Some(lowlink[v]) == index[v] {
                let mut scc: Vec<usize> = Vec::new();
                while let Some(w) = stack.pop() {
                    on_stack[w] = false;
                    scc.push(w);
                    if w == v {
                        break;
                    }
                }
                sccs.push(scc);
            }
            if let Some(parent) = call.last() {
                lowlink[parent.v] = lowlink[parent.v].min(lowlink[v]);
            }
        }
    }

    let mut cycles: Vec<Vec<usize>> = sccs
        .into_iter()
        .filter(|scc| scc.len() > 1 || g.edge_ix(scc[0], scc[0]).is_some())
        .map(|mut scc| {
            scc.sort_unstable();
            scc
        })
        .collect();
    cycles.sort_by_key(|c| c[0]);
    cycles
}
