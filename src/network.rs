use crate::habitat::GroupId;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

/// Undirected record of how often pairs of groups shared a food source.
///
/// Node `i` of the graph is group `i`. Edge weights count co-location
/// events and only ever grow.
#[derive(Debug, Clone)]
pub struct InteractionNetwork {
    graph: UnGraph<GroupId, u32>,
    log: Vec<(GroupId, GroupId)>,
}

/// Serializable view of one weighted edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeReport {
    pub a: usize,
    pub b: usize,
    pub weight: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkReport {
    pub n_nodes: usize,
    pub edges: Vec<EdgeReport>,
}

impl InteractionNetwork {
    pub fn new(n_groups: usize) -> Self {
        let mut graph = UnGraph::with_capacity(n_groups, 0);
        for idx in 0..n_groups {
            graph.add_node(GroupId(idx));
        }
        Self {
            graph,
            log: Vec::new(),
        }
    }

    /// Count one interaction between `a` and `b`.
    pub fn record(&mut self, a: GroupId, b: GroupId) {
        let (na, nb) = (NodeIndex::new(a.0), NodeIndex::new(b.0));
        match self.graph.find_edge(na, nb) {
            Some(edge) => self.graph[edge] += 1,
            None => {
                self.graph.add_edge(na, nb, 1);
            }
        }
        self.log.push((a, b));
    }

    /// Number of interactions between `a` and `b` (0 if they never met).
    #[cfg(test)]
    pub fn weight(&self, a: GroupId, b: GroupId) -> u32 {
        self.graph
            .find_edge(NodeIndex::new(a.0), NodeIndex::new(b.0))
            .map_or(0, |edge| self.graph[edge])
    }

    pub fn n_nodes(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edges(&self) -> impl Iterator<Item = (GroupId, GroupId, u32)> + '_ {
        self.graph.edge_references().map(|edge| {
            (
                self.graph[edge.source()],
                self.graph[edge.target()],
                *edge.weight(),
            )
        })
    }

    /// Every interaction in the order it happened.
    pub fn log(&self) -> &[(GroupId, GroupId)] {
        &self.log
    }

    pub fn report(&self) -> NetworkReport {
        NetworkReport {
            n_nodes: self.n_nodes(),
            edges: self
                .edges()
                .map(|(a, b, weight)| EdgeReport {
                    a: a.0,
                    b: b.0,
                    weight,
                })
                .collect(),
        }
    }
}
