use rustc_hash::FxBuildHasher;

type HashMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;

#[derive(Debug, Clone, Copy)]
pub struct GraphOptions {
    pub directed: bool,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self { directed: true }
    }
}

/// Outcome of [`Graph::set_edge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeInsert {
    Inserted,
    /// The edge already existed (for undirected graphs: in either direction). The stored label
    /// is left untouched.
    Duplicate,
    /// One of the endpoints is not a node of this graph. Nothing was inserted.
    MissingEndpoint,
}

#[derive(Debug, Clone)]
struct NodeEntry<N> {
    id: String,
    label: N,
}

#[derive(Debug, Clone)]
struct EdgeEntry<E> {
    v_ix: usize,
    w_ix: usize,
    label: E,
}

/// A simple graph (no multi-edges) with dense node indices.
///
/// Unlike a general-purpose graphlib, edges never create nodes implicitly: an edge naming an
/// unknown endpoint is rejected with [`EdgeInsert::MissingEndpoint`] so callers can decide how
/// to report malformed input.
#[derive(Debug, Clone)]
pub struct Graph<N, E> {
    options: GraphOptions,

    nodes: Vec<NodeEntry<N>>,
    node_index: HashMap<String, usize>,

    edges: Vec<EdgeEntry<E>>,
    edge_index: HashMap<(usize, usize), usize>,

    // Incident edge indices per node, kept in edge insertion order. For undirected graphs both
    // lists hold every incident edge.
    out: Vec<Vec<usize>>,
    in_: Vec<Vec<usize>>,
}

impl<N, E> Graph<N, E> {
    pub fn new(options: GraphOptions) -> Self {
        Self {
            options,
            nodes: Vec::new(),
            node_index: HashMap::default(),
            edges: Vec::new(),
            edge_index: HashMap::default(),
            out: Vec::new(),
            in_: Vec::new(),
        }
    }

    fn canonical_pair(&self, v_ix: usize, w_ix: usize) -> (usize, usize) {
        if self.options.directed || v_ix <= w_ix {
            (v_ix, w_ix)
        } else {
            (w_ix, v_ix)
        }
    }

    /// Inserts a node, or replaces the label of an existing one. Returns the node index.
    pub fn set_node(&mut self, id: impl Into<String>, label: N) -> usize {
        let id = id.into();
        if let Some(&ix) = self.node_index.get(&id) {
            self.nodes[ix].label = label;
            return ix;
        }
        let ix = self.nodes.len();
        self.nodes.push(NodeEntry {
            id: id.clone(),
            label,
        });
        self.node_index.insert(id, ix);
        self.out.push(Vec::new());
        self.in_.push(Vec::new());
        ix
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&N> {
        self.node_index.get(id).map(|&ix| &self.nodes[ix].label)
    }

    pub fn node_ix(&self, id: &str) -> Option<usize> {
        self.node_index.get(id).copied()
    }

    pub fn node_id(&self, ix: usize) -> Option<&str> {
        self.nodes.get(ix).map(|n| n.id.as_str())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Node ids in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.id.as_str())
    }

    pub fn labels(&self) -> impl Iterator<Item = (&str, &N)> {
        self.nodes.iter().map(|n| (n.id.as_str(), &n.label))
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn set_edge(&mut self, v: &str, w: &str, label: E) -> EdgeInsert {
        let (Some(v_ix), Some(w_ix)) = (self.node_ix(v), self.node_ix(w)) else {
            return EdgeInsert::MissingEndpoint;
        };
        self.set_edge_ix(v_ix, w_ix, label)
    }

    pub fn set_edge_ix(&mut self, v_ix: usize, w_ix: usize, label: E) -> EdgeInsert {
        if v_ix >= self.nodes.len() || w_ix >= self.nodes.len() {
            return EdgeInsert::MissingEndpoint;
        }
        let key = self.canonical_pair(v_ix, w_ix);
        if self.edge_index.contains_key(&key) {
            return EdgeInsert::Duplicate;
        }

        let edge_ix = self.edges.len();
        self.edges.push(EdgeEntry {
            v_ix: key.0,
            w_ix: key.1,
            label,
        });
        self.edge_index.insert(key, edge_ix);

        self.out[key.0].push(edge_ix);
        self.in_[key.1].push(edge_ix);
        if !self.options.directed && key.0 != key.1 {
            self.out[key.1].push(edge_ix);
            self.in_[key.0].push(edge_ix);
        }
        EdgeInsert::Inserted
    }

    pub fn has_edge(&self, v: &str, w: &str) -> bool {
        self.edge(v, w).is_some()
    }

    pub fn edge(&self, v: &str, w: &str) -> Option<&E> {
        let (v_ix, w_ix) = (self.node_ix(v)?, self.node_ix(w)?);
        self.edge_ix(v_ix, w_ix)
    }

    pub fn edge_ix(&self, v_ix: usize, w_ix: usize) -> Option<&E> {
        let key = self.canonical_pair(v_ix, w_ix);
        let &edge_ix = self.edge_index.get(&key)?;
        Some(&self.edges[edge_ix].label)
    }

    /// Visits every edge as `(v_ix, w_ix, label)` in insertion order. Undirected edges are
    /// reported once with `v_ix <= w_ix`.
    pub fn for_each_edge<F>(&self, mut f: F)
    where
        F: FnMut(usize, usize, &E),
    {
        for e in &self.edges {
            f(e.v_ix, e.w_ix, &e.label);
        }
    }

    fn other_end(&self, edge_ix: usize, from_ix: usize) -> usize {
        let e = &self.edges[edge_ix];
        if e.v_ix == from_ix { e.w_ix } else { e.v_ix }
    }

    /// Successor indices in edge insertion order. For undirected graphs this is the set of
    /// adjacent nodes.
    pub fn successor_ixs(&self, ix: usize) -> impl Iterator<Item = usize> + '_ {
        let directed = self.options.directed;
        self.out
            .get(ix)
            .into_iter()
            .flatten()
            .map(move |&e| if directed { self.edges[e].w_ix } else { self.other_end(e, ix) })
    }

    /// Predecessor indices in edge insertion order. For undirected graphs this is the set of
    /// adjacent nodes.
    pub fn predecessor_ixs(&self, ix: usize) -> impl Iterator<Item = usize> + '_ {
        let directed = self.options.directed;
        self.in_
            .get(ix)
            .into_iter()
            .flatten()
            .map(move |&e| if directed { self.edges[e].v_ix } else { self.other_end(e, ix) })
    }

    pub fn successors(&self, v: &str) -> Vec<&str> {
        let Some(ix) = self.node_ix(v) else {
            return Vec::new();
        };
        self.successor_ixs(ix)
            .map(|w| self.nodes[w].id.as_str())
            .collect()
    }

    pub fn predecessors(&self, v: &str) -> Vec<&str> {
        let Some(ix) = self.node_ix(v) else {
            return Vec::new();
        };
        self.predecessor_ixs(ix)
            .map(|u| self.nodes[u].id.as_str())
            .collect()
    }

    pub fn neighbors(&self, v: &str) -> Vec<&str> {
        let Some(ix) = self.node_ix(v) else {
            return Vec::new();
        };
        let mut out: Vec<usize> = self.successor_ixs(ix).collect();
        if self.options.directed {
            for u in self.predecessor_ixs(ix) {
                if !out.contains(&u) {
                    out.push(u);
                }
            }
        }
        out.into_iter()
            .map(|w| self.nodes[w].id.as_str())
            .collect()
    }

    pub fn in_degree(&self, ix: usize) -> usize {
        self.in_.get(ix).map_or(0, Vec::len)
    }

    /// Nodes without incoming edges, in insertion order. Every node of an undirected graph
    /// without edges is a source; nodes with incident undirected edges are not.
    pub fn sources(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(ix, _)| self.in_[*ix].is_empty())
            .map(|(_, n)| n.id.as_str())
            .collect()
    }
}
