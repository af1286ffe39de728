//! Layout-internal graph model.
//!
//! A [`Network`] is the structure every layout algorithm in this crate
//! operates on: vertexes with mutable layer/column/index state, edges with
//! optional back-references to host links, and an item-to-vertex map. It is
//! built fresh for each layout invocation and discarded at the end.
//!
//! The graph storage is a petgraph [`StableDiGraph`] so vertex and edge
//! ids stay valid while dummy chains replace long edges.

use std::collections::HashMap;

use log::debug;
use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;

use crate::collection::{Collection, ItemId, LinkId};
use crate::geometry::{Point, Size};

/// Identifies a vertex within its [`Network`].
pub type VertexId = NodeIndex;

/// Identifies an edge within its [`Network`].
pub type EdgeId = EdgeIndex;

/// A layout-internal node.
///
/// A vertex references at most two host items: ordinary vertexes one, fused
/// pair vertexes two, dummy vertexes none. `layer` is assigned by the
/// layered driver, `column` and `index` by the column and crossing passes.
#[derive(Debug, Clone)]
pub struct Vertex {
    item: Option<ItemId>,
    pair: Option<(ItemId, ItemId)>,
    width: f32,
    height: f32,
    focus: Point,
    pub(crate) layer: i32,
    pub(crate) column: i32,
    pub(crate) index: usize,
    pub(crate) lane: Option<String>,
    pub(crate) center: Point,
}

impl Vertex {
    /// Create a dummy vertex with a minimal footprint.
    pub fn dummy() -> Self {
        Self {
            item: None,
            pair: None,
            width: 1.0,
            height: 1.0,
            focus: Point::new(0.5, 0.5),
            layer: 0,
            column: 0,
            index: 0,
            lane: None,
            center: Point::default(),
        }
    }

    /// Create a vertex for a single host item.
    pub fn for_item(id: ItemId, size: Size) -> Self {
        Self {
            item: Some(id),
            pair: None,
            width: size.width(),
            height: size.height(),
            focus: Point::new(size.width() / 2.0, size.height() / 2.0),
            layer: 0,
            column: 0,
            index: 0,
            lane: None,
            center: Point::default(),
        }
    }

    /// Create a vertex standing in for a fused pair of items.
    ///
    /// The vertex is sized to the union of both items so the layering
    /// algorithm treats the pair as one wide atomic box, with the focus at
    /// the center of that box.
    pub fn for_pair(left: ItemId, right: ItemId, size: Size) -> Self {
        Self {
            item: None,
            pair: Some((left, right)),
            width: size.width(),
            height: size.height(),
            focus: Point::new(size.width() / 2.0, size.height() / 2.0),
            layer: 0,
            column: 0,
            index: 0,
            lane: None,
            center: Point::default(),
        }
    }

    /// The single item this vertex represents, if any.
    pub fn item(&self) -> Option<ItemId> {
        self.item
    }

    /// The fused pair this vertex represents, if any.
    pub fn pair(&self) -> Option<(ItemId, ItemId)> {
        self.pair
    }

    /// Whether this vertex references no host item at all.
    pub fn is_dummy(&self) -> bool {
        self.item.is_none() && self.pair.is_none()
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// The connection anchor offset within the vertex bounds.
    pub fn focus(&self) -> Point {
        self.focus
    }

    pub fn layer(&self) -> i32 {
        self.layer
    }

    pub fn column(&self) -> i32 {
        self.column
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// The resolved lane name. `None` means the vertex is a dummy whose
    /// lane could not be derived; `Some("")` is the default lane.
    pub fn lane(&self) -> Option<&str> {
        self.lane.as_deref()
    }

    /// The committed center position, valid after the coordinate pass.
    pub fn center(&self) -> Point {
        self.center
    }
}

/// A layout-internal edge.
///
/// Dummy edges (the segments of a split long edge, or synthetic cohort
/// cross-links) carry no link back-reference but participate in every
/// algorithm.
#[derive(Debug, Clone)]
pub struct Edge {
    link: Option<LinkId>,
    pub(crate) reversed: bool,
}

impl Edge {
    pub fn new(link: Option<LinkId>) -> Self {
        Self {
            link,
            reversed: false,
        }
    }

    /// The host link this edge stands for, if any.
    pub fn link(&self) -> Option<LinkId> {
        self.link
    }

    /// Whether the cycle breaker flipped this edge's layering direction.
    pub fn is_reversed(&self) -> bool {
        self.reversed
    }
}

/// A graph of vertexes and edges owned by one layout invocation.
#[derive(Debug, Default)]
pub struct Network {
    graph: StableDiGraph<Vertex, Edge>,
    item_map: HashMap<ItemId, VertexId>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the default network for a set of host items: one vertex per
    /// positioned item, one edge per link whose endpoints both resolved.
    ///
    /// Links with an unresolved endpoint (hidden item, or item outside the
    /// given subset) are silently dropped; that is policy, not an error.
    pub fn from_collection(collection: &Collection, items: &[ItemId]) -> Self {
        let mut network = Self::new();

        for &id in items {
            let item = collection.item(id);
            if item.is_positioned() {
                let mut vertex = Vertex::for_item(id, item.size());
                vertex.lane = Some(item.lane().unwrap_or_default().to_string());
                network.add_vertex(vertex);
            }
        }

        let mut dropped = 0usize;
        for (link_id, link) in collection.links() {
            let from = network.find_vertex(link.source());
            let to = network.find_vertex(link.target());
            match (from, to) {
                (Some(from), Some(to)) => {
                    network.add_edge(from, to, Some(link_id));
                }
                _ if items.contains(&link.source()) || items.contains(&link.target()) => {
                    dropped += 1
                }
                _ => {}
            }
        }
        if dropped > 0 {
            debug!(dropped; "Links with unresolved endpoints were skipped");
        }

        network
    }

    /// Add a vertex and return its id.
    ///
    /// The first vertex referencing an item wins the item-to-vertex
    /// mapping; later references do not displace it.
    pub fn add_vertex(&mut self, vertex: Vertex) -> VertexId {
        let item = vertex.item;
        let pair = vertex.pair;
        let id = self.graph.add_node(vertex);
        if let Some(item) = item {
            self.item_map.entry(item).or_insert(id);
        }
        if let Some((left, right)) = pair {
            self.item_map.entry(left).or_insert(id);
            self.item_map.entry(right).or_insert(id);
        }
        id
    }

    /// Add an edge between two vertexes.
    pub fn add_edge(&mut self, from: VertexId, to: VertexId, link: Option<LinkId>) -> EdgeId {
        self.graph.add_edge(from, to, Edge::new(link))
    }

    /// Remove an edge, returning its weight.
    pub(crate) fn remove_edge(&mut self, edge: EdgeId) -> Option<Edge> {
        self.graph.remove_edge(edge)
    }

    /// Find the vertex representing the given host item.
    pub fn find_vertex(&self, item: ItemId) -> Option<VertexId> {
        self.item_map.get(&item).copied()
    }

    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.graph[id]
    }

    pub fn vertex_mut(&mut self, id: VertexId) -> &mut Vertex {
        &mut self.graph[id]
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.graph[id]
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> &mut Edge {
        &mut self.graph[id]
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Returns all vertex ids in stable index order.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.graph.node_indices()
    }

    /// Returns all edge ids in stable index order.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.graph.edge_indices()
    }

    /// Returns the endpoints of an edge as `(source, target)`.
    pub fn edge_endpoints(&self, id: EdgeId) -> (VertexId, VertexId) {
        self.graph
            .edge_endpoints(id)
            .expect("edge id must be valid")
    }

    /// Returns the vertexes reachable by outgoing edges from `id`.
    pub fn successors(&self, id: VertexId) -> impl Iterator<Item = VertexId> + '_ {
        self.graph.neighbors_directed(id, Direction::Outgoing)
    }

    /// Returns the vertexes reaching `id` by incoming edges.
    pub fn predecessors(&self, id: VertexId) -> impl Iterator<Item = VertexId> + '_ {
        self.graph.neighbors_directed(id, Direction::Incoming)
    }

    /// Returns the ids of edges leaving `id`.
    pub fn out_edges(&self, id: VertexId) -> impl Iterator<Item = EdgeId> + '_ {
        self.graph
            .edges_directed(id, Direction::Outgoing)
            .map(|e| e.id())
    }

    /// Returns the ids of edges entering `id`.
    pub fn in_edges(&self, id: VertexId) -> impl Iterator<Item = EdgeId> + '_ {
        self.graph
            .edges_directed(id, Direction::Incoming)
            .map(|e| e.id())
    }

    /// Returns the highest assigned layer, or 0 for an empty network.
    pub fn max_layer(&self) -> i32 {
        self.graph
            .node_indices()
            .map(|id| self.graph[id].layer)
            .max()
            .unwrap_or(0)
    }

    /// Returns the vertexes assigned to the given layer, in index order.
    pub fn vertexes_in_layer(&self, layer: i32) -> impl Iterator<Item = VertexId> + '_ {
        self.graph
            .node_indices()
            .filter(move |&id| self.graph[id].layer == layer)
    }

    /// Returns every host item referenced by a vertex in this network.
    pub fn referenced_items(&self) -> Vec<ItemId> {
        let mut items: Vec<ItemId> = self.item_map.keys().copied().collect();
        items.sort();
        items
    }

    /// Split into maximal connected subnetworks by undirected reachability.
    ///
    /// Each returned network owns clones of the component's vertexes and
    /// edges. Components come back ordered by their smallest vertex id so
    /// repeated runs partition identically.
    pub fn split_into_subnetworks(&self) -> Vec<Network> {
        let mut component_of: HashMap<VertexId, usize> = HashMap::new();
        let mut components: Vec<Vec<VertexId>> = Vec::new();

        for start in self.graph.node_indices() {
            if component_of.contains_key(&start) {
                continue;
            }
            let component = components.len();
            let mut members = Vec::new();
            let mut stack = vec![start];
            component_of.insert(start, component);
            while let Some(id) = stack.pop() {
                members.push(id);
                let neighbors = self
                    .successors(id)
                    .chain(self.predecessors(id))
                    .collect::<Vec<_>>();
                for next in neighbors {
                    if !component_of.contains_key(&next) {
                        component_of.insert(next, component);
                        stack.push(next);
                    }
                }
            }
            members.sort();
            components.push(members);
        }

        components
            .iter()
            .map(|members| {
                let mut network = Network::new();
                let mut remap: HashMap<VertexId, VertexId> = HashMap::new();
                for &id in members {
                    remap.insert(id, network.add_vertex(self.graph[id].clone()));
                }
                for edge in self.graph.edge_indices() {
                    let (from, to) = self.edge_endpoints(edge);
                    if let (Some(&from), Some(&to)) = (remap.get(&from), remap.get(&to)) {
                        network.add_edge(from, to, self.graph[edge].link);
                    }
                }
                network
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{Item, LinkKind};

    fn item(collection: &mut Collection) -> ItemId {
        collection.add_item(Item::new(Size::new(20.0, 10.0)))
    }

    #[test]
    fn test_every_positioned_item_gets_one_vertex() {
        let mut collection = Collection::new();
        let a = item(&mut collection);
        let b = item(&mut collection);
        let hidden = collection.add_item(Item::new(Size::new(5.0, 5.0)).hidden());

        let ids: Vec<ItemId> = collection.item_ids().collect();
        let network = Network::from_collection(&collection, &ids);

        assert_eq!(network.vertex_count(), 2);
        assert!(network.find_vertex(a).is_some());
        assert!(network.find_vertex(b).is_some());
        assert!(network.find_vertex(hidden).is_none());
    }

    #[test]
    fn test_links_with_unresolved_endpoints_are_dropped() {
        let mut collection = Collection::new();
        let a = item(&mut collection);
        let hidden = collection.add_item(Item::new(Size::new(5.0, 5.0)).hidden());
        collection.add_link(a, hidden, LinkKind::Directed).unwrap();

        let ids: Vec<ItemId> = collection.item_ids().collect();
        let network = Network::from_collection(&collection, &ids);

        assert_eq!(network.vertex_count(), 1);
        assert_eq!(network.edge_count(), 0);
    }

    #[test]
    fn test_split_finds_undirected_components() {
        let mut collection = Collection::new();
        let a = item(&mut collection);
        let b = item(&mut collection);
        let c = item(&mut collection);
        let d = item(&mut collection);
        // a -> b and c -> d form two components; direction must not matter.
        collection.add_link(b, a, LinkKind::Directed).unwrap();
        collection.add_link(c, d, LinkKind::Directed).unwrap();

        let ids: Vec<ItemId> = collection.item_ids().collect();
        let network = Network::from_collection(&collection, &ids);
        let parts = network.split_into_subnetworks();

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].vertex_count(), 2);
        assert_eq!(parts[0].edge_count(), 1);
        assert_eq!(parts[0].referenced_items(), vec![a, b]);
        assert_eq!(parts[1].referenced_items(), vec![c, d]);
    }

    #[test]
    fn test_vertexes_iterate_by_layer() {
        let mut network = Network::new();
        let top = network.add_vertex(Vertex::dummy());
        let bottom = network.add_vertex(Vertex::dummy());
        network.vertex_mut(bottom).layer = 3;

        assert_eq!(network.max_layer(), 3);
        assert_eq!(network.vertexes_in_layer(0).collect::<Vec<_>>(), vec![top]);
        assert_eq!(
            network.vertexes_in_layer(3).collect::<Vec<_>>(),
            vec![bottom]
        );
        assert!(network.vertexes_in_layer(1).next().is_none());
    }

    #[test]
    fn test_split_keeps_singletons() {
        let mut collection = Collection::new();
        item(&mut collection);
        item(&mut collection);

        let ids: Vec<ItemId> = collection.item_ids().collect();
        let parts = Network::from_collection(&collection, &ids).split_into_subnetworks();

        assert_eq!(parts.len(), 2);
        assert!(parts.iter().all(|p| p.vertex_count() == 1));
    }
}
