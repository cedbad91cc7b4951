//! The data-flow graph of a file: for every table and function, the steps
//! needed to compute its value.

mod build;


use std::{
    collections::{BTreeMap, HashMap},
    fmt,
};

pub use self::build::build;
use crate::{
    ast::NodeId,
    errors::{SemanticError, Span},
    types::{Constraint, TypeHandle},
};

/// Identity of a computed value. Unique across the whole graph, not just
/// within one subgraph.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct DependencyId(u32);

impl fmt::Display for DependencyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Vertex {
    /// The node this value was computed for.
    pub node: NodeId,
    pub label: Option<String>,
    /// Names of the inputs, for vertices that apply something to arguments.
    pub params: Option<Vec<String>>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Edge {
    pub from: DependencyId,
    pub to: DependencyId,
    /// Which input of `to` this edge feeds, if `to` has numbered inputs.
    pub param_index: Option<usize>,
}

/// The vertices and edges belonging to one definition.
#[derive(Clone, Debug)]
pub struct Subgraph {
    label: String,
    vertices: BTreeMap<DependencyId, Vertex>,
    forward_edges: BTreeMap<DependencyId, Vec<Edge>>,
    backward_edges: BTreeMap<DependencyId, Vec<Edge>>,
    /// Every edge in insertion order.
    edges: Vec<Edge>,
}

impl Subgraph {
    fn new(label: String) -> Self {
        Self {
            label,
            vertices: BTreeMap::new(),
            forward_edges: BTreeMap::new(),
            backward_edges: BTreeMap::new(),
            edges: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Vertices in the order they were created.
    pub fn vertices(&self) -> impl Iterator<Item = (DependencyId, &Vertex)> {
        self.vertices.iter().map(|(&id, vertex)| (id, vertex))
    }

    pub fn vertex(&self, id: DependencyId) -> Option<&Vertex> {
        self.vertices.get(&id)
    }

    pub fn contains(&self, id: DependencyId) -> bool {
        self.vertices.contains_key(&id)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Edges leaving `id`.
    pub fn outgoing(&self, id: DependencyId) -> &[Edge] {
        self.forward_edges.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Edges arriving at `id`.
    pub fn incoming(&self, id: DependencyId) -> &[Edge] {
        self.backward_edges.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Whether the edges between this subgraph's own vertices form a DAG.
    /// Edges coming in from other subgraphs (column reads in a `where`
    /// clause) are ignored.
    pub fn is_acyclic(&self) -> bool {
        let mut in_degree: HashMap<DependencyId, usize> =
            self.vertices.keys().map(|&id| (id, 0)).collect();
        let internal = |edge: &&Edge| self.contains(edge.from) && self.contains(edge.to);

        for edge in self.edges.iter().filter(internal) {
            *in_degree.entry(edge.to).or_insert(0) += 1;
        }

        let mut ready: Vec<DependencyId> = in_degree
            .iter()
            .filter(|(_, &degree)| degree == 0)
            .map(|(&id, _)| id)
            .collect();
        let mut visited = 0;

        while let Some(id) = ready.pop() {
            visited += 1;

            for edge in self.outgoing(id).iter().filter(internal) {
                let degree = in_degree.entry(edge.to).or_insert(0);
                *degree -= 1;

                if *degree == 0 {
                    ready.push(edge.to);
                }
            }
        }

        visited == self.vertices.len()
    }
}

/// Vertices, edges and type constraints for a whole file.
#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    next_id: u32,
    subgraphs: Vec<Subgraph>,
    constraints: Vec<Constraint>,
    dependency_ids: HashMap<NodeId, DependencyId>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subgraphs(&self) -> &[Subgraph] {
        &self.subgraphs
    }

    /// Type equalities collected while building, in the order they were found.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// The value a node was assigned, if it has been visited.
    pub fn dependency_id(&self, node: NodeId) -> Option<DependencyId> {
        self.dependency_ids.get(&node).copied()
    }

    /// Looks up a vertex in whichever subgraph holds it.
    pub fn vertex(&self, id: DependencyId) -> Option<&Vertex> {
        self.subgraphs
            .iter()
            .find_map(|subgraph| subgraph.vertex(id))
    }

    pub fn vertex_count(&self) -> usize {
        self.subgraphs
            .iter()
            .map(|subgraph| subgraph.vertices.len())
            .sum()
    }

    pub fn edge_count(&self) -> usize {
        self.subgraphs
            .iter()
            .map(|subgraph| subgraph.edges.len())
            .sum()
    }

    fn next_dependency_id(&mut self) -> DependencyId {
        self.next_id += 1;
        DependencyId(self.next_id)
    }

    /// Starts the subgraph that following vertices and edges are added to.
    pub(crate) fn next_subgraph(&mut self, label: String) {
        self.subgraphs.push(Subgraph::new(label));
    }

    fn current_subgraph(&mut self) -> Result<&mut Subgraph, SemanticError> {
        self.subgraphs.last_mut().ok_or_else(|| {
            SemanticError::InternalGraphError("graph was extended outside of any subgraph".to_owned())
        })
    }

    /// Registers `node` as a vertex of the current subgraph, giving it a
    /// new id unless it already has one. The metadata of the first
    /// registration wins.
    pub(crate) fn add_vertex(
        &mut self,
        node: NodeId,
        label: Option<String>,
        params: Option<Vec<String>>,
    ) -> Result<DependencyId, SemanticError> {
        let id = match self.dependency_id(node) {
            Some(id) => id,
            None => self.next_dependency_id(),
        };

        self.insert_vertex(id, Vertex {
            node,
            label,
            params,
        })?;

        self.dependency_ids.insert(node, id);
        Ok(id)
    }

    /// Adds a vertex with a new id that isn't the id of `node` itself.
    /// Used for the intermediate results of a curried application.
    pub(crate) fn add_anonymous_vertex(
        &mut self,
        node: NodeId,
        label: Option<String>,
        params: Option<Vec<String>>,
    ) -> Result<DependencyId, SemanticError> {
        let id = self.next_dependency_id();

        self.insert_vertex(id, Vertex {
            node,
            label,
            params,
        })?;

        Ok(id)
    }

    fn insert_vertex(&mut self, id: DependencyId, vertex: Vertex) -> Result<(), SemanticError> {
        self.current_subgraph()?
            .vertices
            .entry(id)
            .or_insert(vertex);

        Ok(())
    }

    /// Gives `node` the same id as `target` instead of a vertex of its own.
    /// A node that already has an id keeps it.
    pub(crate) fn alias(&mut self, node: NodeId, target: NodeId) -> Result<DependencyId, SemanticError> {
        let id = self.require_id(target)?;
        Ok(*self.dependency_ids.entry(node).or_insert(id))
    }

    /// Sets the id of `node` to a vertex that was created for it by
    /// [`add_anonymous_vertex`](DependencyGraph::add_anonymous_vertex).
    pub(crate) fn set_dependency_id(&mut self, node: NodeId, id: DependencyId) -> DependencyId {
        *self.dependency_ids.entry(node).or_insert(id)
    }

    pub(crate) fn require_id(&self, node: NodeId) -> Result<DependencyId, SemanticError> {
        self.dependency_id(node).ok_or_else(|| {
            SemanticError::InternalGraphError(format!("node {} is not a vertex", node))
        })
    }

    /// Adds an edge between two visited nodes.
    pub(crate) fn add_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        param_index: Option<usize>,
    ) -> Result<(), SemanticError> {
        let from = self.require_id(from)?;
        let to = self.require_id(to)?;
        self.add_edge_between(from, to, param_index)
    }

    pub(crate) fn add_edge_between(
        &mut self,
        from: DependencyId,
        to: DependencyId,
        param_index: Option<usize>,
    ) -> Result<(), SemanticError> {
        let edge = Edge {
            from,
            to,
            param_index,
        };

        let subgraph = self.current_subgraph()?;
        subgraph.forward_edges.entry(from).or_default().push(edge);
        subgraph.backward_edges.entry(to).or_default().push(edge);
        subgraph.edges.push(edge);
        Ok(())
    }

    /// For purposes of type inference, assert that the two given types are
    /// equivalent. Both nodes involved must already have types.
    pub(crate) fn add_constraint(
        &mut self,
        first: Option<TypeHandle>,
        second: Option<TypeHandle>,
        span: Span,
    ) -> Result<(), SemanticError> {
        match (first, second) {
            (Some(first), Some(second)) => {
                self.constraints.push(Constraint {
                    first,
                    second,
                    span,
                });

                Ok(())
            },

            _ => Err(SemanticError::InternalGraphError(
                "type constraint on an untyped node".to_owned(),
            )),
        }
    }

    pub(crate) fn push_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }
}
