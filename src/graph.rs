// Supply Chain Graph - entities, locations and batches linked by
// transactions and logistics moves
//
// Backed by a petgraph DiGraph plus a name index. Parallel edges are kept:
// two sales of the same batch between the same parties are two edges.

use crate::dates;
use crate::error::EngineError;
use crate::records::{Batch, LogisticsMove, Transaction};
use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

// ============================================================================
// NODES & EDGES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Party that buys, sells or processes product
    Entity,

    /// Physical place a batch moves through
    Location,

    /// Traceable unit of product
    Batch,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Entity => "Entity",
            NodeKind::Location => "Location",
            NodeKind::Batch => "Batch",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplyNode {
    pub name: String,
    pub kind: NodeKind,

    // Batch attributes (only set for batch rows)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub production_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl SupplyNode {
    fn new(name: &str, kind: NodeKind) -> Self {
        SupplyNode {
            name: name.to_string(),
            kind,
            origin: None,
            production_date: None,
            status: None,
        }
    }
}

impl fmt::Display for SupplyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    Transaction,
    Logistics,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Transaction => "Transaction",
            EdgeKind::Logistics => "Logistics",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplyEdge {
    pub kind: EdgeKind,
    pub batch_id: String,

    /// Transaction date or logistics start date
    pub date: Option<String>,

    /// Logistics end date
    pub end_date: Option<String>,
    pub payment_term: Option<String>,
    pub cost: Option<f64>,
}

impl fmt::Display for SupplyEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.batch_id)?;
        if let Some(date) = &self.date {
            write!(f, " @ {}", date)?;
        }
        if let Some(cost) = self.cost {
            write!(f, " ${:.2}", cost)?;
        }
        Ok(())
    }
}

/// Edge with its endpoints resolved to names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeView {
    pub from: String,
    pub to: String,
    #[serde(flatten)]
    pub edge: SupplyEdge,
}

// ============================================================================
// STATS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDegree {
    pub name: String,
    pub kind: NodeKind,
    pub in_degree: usize,
    pub out_degree: usize,
}

impl NodeDegree {
    pub fn degree(&self) -> usize {
        self.in_degree + self.out_degree
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub entity_count: usize,
    pub location_count: usize,
    pub batch_count: usize,
    pub transaction_edges: usize,
    pub logistics_edges: usize,
    pub top_nodes: Vec<NodeDegree>,
}

const TOP_NODES: usize = 5;

// ============================================================================
// GRAPH
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct SupplyChainGraph {
    graph: DiGraph<SupplyNode, SupplyEdge>,
    index: HashMap<String, NodeIndex>,
}

/// Build the supply chain graph from the three record sets
///
/// 1. Batch rows become Batch nodes (duplicate ids: last row's attributes win)
/// 2. Each transaction adds Entity nodes and an edge from → to
/// 3. Each logistics move adds Location nodes and an edge from → to
///
/// Batch ids referenced by transactions or moves get a Batch node too. A name
/// keeps the kind it was first added with.
pub fn build_supply_chain_graph(
    transactions: &[Transaction],
    batches: &[Batch],
    logistics: &[LogisticsMove],
) -> SupplyChainGraph {
    let mut g = SupplyChainGraph::default();

    for batch in batches {
        let idx = g.ensure_node(&batch.batch_id, NodeKind::Batch);
        let node = &mut g.graph[idx];
        node.origin = batch.origin.clone();
        node.production_date = batch.production_date.clone();
        node.status = batch.status.clone();
    }

    for tx in transactions {
        let from = g.ensure_node(&tx.from_entity, NodeKind::Entity);
        let to = g.ensure_node(&tx.to_entity, NodeKind::Entity);
        g.ensure_node(&tx.batch_id, NodeKind::Batch);

        g.graph.add_edge(
            from,
            to,
            SupplyEdge {
                kind: EdgeKind::Transaction,
                batch_id: tx.batch_id.clone(),
                date: tx.transaction_date.clone(),
                end_date: None,
                payment_term: tx.payment_term.clone(),
                cost: None,
            },
        );
    }

    for mv in logistics {
        let from = g.ensure_node(&mv.from_location, NodeKind::Location);
        let to = g.ensure_node(&mv.to_location, NodeKind::Location);
        g.ensure_node(&mv.batch_id, NodeKind::Batch);

        g.graph.add_edge(
            from,
            to,
            SupplyEdge {
                kind: EdgeKind::Logistics,
                batch_id: mv.batch_id.clone(),
                date: mv.start_date.clone(),
                end_date: mv.end_date.clone(),
                payment_term: None,
                cost: mv.cost,
            },
        );
    }

    tracing::info!(
        nodes = g.node_count(),
        edges = g.edge_count(),
        "Built supply chain graph"
    );
    g
}

impl SupplyChainGraph {
    fn ensure_node(&mut self, name: &str, kind: NodeKind) -> NodeIndex {
        if let Some(idx) = self.index.get(name) {
            return *idx;
        }
        let idx = self.graph.add_node(SupplyNode::new(name, kind));
        self.index.insert(name.to_string(), idx);
        idx
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn node(&self, name: &str) -> Option<&SupplyNode> {
        self.index.get(name).map(|idx| &self.graph[*idx])
    }

    /// Nodes of one kind, in insertion order
    pub fn nodes_of_kind(&self, kind: NodeKind) -> Vec<&SupplyNode> {
        self.graph
            .node_weights()
            .filter(|n| n.kind == kind)
            .collect()
    }

    /// Distinct downstream neighbours, sorted by name
    pub fn successors(&self, name: &str) -> Vec<String> {
        self.neighbours(name, Direction::Outgoing)
    }

    /// Distinct upstream neighbours, sorted by name
    pub fn predecessors(&self, name: &str) -> Vec<String> {
        self.neighbours(name, Direction::Incoming)
    }

    fn neighbours(&self, name: &str, direction: Direction) -> Vec<String> {
        let Some(idx) = self.index.get(name) else {
            return Vec::new();
        };

        self.graph
            .neighbors_directed(*idx, direction)
            .map(|n| self.graph[n].name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// All edges in insertion order (transactions first, then logistics)
    pub fn edges(&self) -> Vec<EdgeView> {
        self.graph
            .edge_references()
            .map(|e| self.view(e.source(), e.target(), e.weight()))
            .collect()
    }

    fn view(&self, from: NodeIndex, to: NodeIndex, edge: &SupplyEdge) -> EdgeView {
        EdgeView {
            from: self.graph[from].name.clone(),
            to: self.graph[to].name.clone(),
            edge: edge.clone(),
        }
    }

    /// Every hop of a batch through the chain, ordered by date
    ///
    /// Undated hops go last; ties keep insertion order.
    pub fn batch_trace(&self, batch_id: &str) -> Result<Vec<EdgeView>, EngineError> {
        if !self.index.contains_key(batch_id) {
            return Err(EngineError::BatchNotFound(batch_id.to_string()));
        }

        let mut steps: Vec<EdgeView> = self
            .edges()
            .into_iter()
            .filter(|e| e.edge.batch_id == batch_id)
            .collect();

        steps.sort_by_key(|e| {
            let date = dates::parse_opt(e.edge.date.as_ref());
            (date.is_none(), date)
        });

        Ok(steps)
    }

    pub fn stats(&self) -> GraphStats {
        let count_nodes = |kind: NodeKind| self.graph.node_weights().filter(|n| n.kind == kind).count();
        let count_edges = |kind: EdgeKind| self.graph.edge_weights().filter(|e| e.kind == kind).count();

        let mut degrees: Vec<NodeDegree> = self
            .graph
            .node_indices()
            .map(|idx| {
                let node = &self.graph[idx];
                NodeDegree {
                    name: node.name.clone(),
                    kind: node.kind,
                    in_degree: self.graph.edges_directed(idx, Direction::Incoming).count(),
                    out_degree: self.graph.edges_directed(idx, Direction::Outgoing).count(),
                }
            })
            .filter(|d| d.degree() > 0)
            .collect();

        degrees.sort_by(|a, b| b.degree().cmp(&a.degree()).then_with(|| a.name.cmp(&b.name)));
        degrees.truncate(TOP_NODES);

        GraphStats {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            entity_count: count_nodes(NodeKind::Entity),
            location_count: count_nodes(NodeKind::Location),
            batch_count: count_nodes(NodeKind::Batch),
            transaction_edges: count_edges(EdgeKind::Transaction),
            logistics_edges: count_edges(EdgeKind::Logistics),
            top_nodes: degrees,
        }
    }

    /// Graphviz DOT rendering
    pub fn to_dot(&self) -> String {
        format!("{}", Dot::new(&self.graph))
    }
}
