//! The base layered-digraph driver and its extension protocol.
//!
//! [`LayeredLayout`] runs the fixed stage sequence every layered layout in
//! this crate shares: build the network, break cycles, assign layers,
//! insert dummy chains, reduce crossings, assign columns, then commit
//! coordinates while querying the per-vertex layer-space hook. Each stage
//! can be taken over by a [`LayeredDelegate`]; the driver's own
//! implementations are deliberately plain and exist so the protocol is
//! operational without a delegate.

use std::collections::HashMap;

use log::{debug, trace};

use crate::collection::{Collection, ItemId};
use crate::config::LayeredConfig;
use crate::geometry::{Bounds, Point};
use crate::layout::LayoutEngine;
use crate::network::{EdgeId, Network, Vertex, VertexId};

/// Which adjacent layer gap a query refers to, relative to a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapSide {
    /// The gap between the vertex's layer and the previous one.
    Above,
    /// The gap between the vertex's layer and the next one.
    Below,
}

/// Per-layer vertex ordering, kept in sync with each vertex's `index`.
#[derive(Debug)]
pub struct LayerGrid {
    layers: Vec<Vec<VertexId>>,
}

impl LayerGrid {
    /// Bucket a layered network into per-layer arrays (initial order is
    /// vertex creation order) and write the resulting indices back.
    pub fn from_network(network: &mut Network) -> Self {
        let count = (network.max_layer() + 1) as usize;
        let mut layers = vec![Vec::new(); count];
        for id in network.vertex_ids().collect::<Vec<_>>() {
            layers[network.vertex(id).layer() as usize].push(id);
        }
        let grid = Self { layers };
        grid.reindex_all(network);
        grid
    }

    /// Returns the number of layers.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Returns the vertexes of one layer in index order.
    pub fn layer(&self, layer: usize) -> &[VertexId] {
        &self.layers[layer]
    }

    /// Returns one layer's ordering for in-place mutation. Callers must
    /// reindex the layer afterwards.
    pub fn layer_mut(&mut self, layer: usize) -> &mut Vec<VertexId> {
        &mut self.layers[layer]
    }

    /// Write one layer's ordering back into the vertexes' `index` fields.
    pub fn reindex_layer(&self, network: &mut Network, layer: usize) {
        for (index, &id) in self.layers[layer].iter().enumerate() {
            network.vertex_mut(id).index = index;
        }
    }

    /// Write every layer's ordering back into the `index` fields.
    pub fn reindex_all(&self, network: &mut Network) {
        for layer in 0..self.layers.len() {
            self.reindex_layer(network, layer);
        }
    }
}

/// Customization points for the layered driver.
///
/// The driver invokes these in a fixed order:
/// `make_network` → (layer assignment, with `constrain_layers` re-imposed
/// until stable) → `setup` → `reduce_crossings` → `assign_columns` →
/// coordinate commit querying `min_layer_space` → `commit`.
///
/// The boolean-returning stages report whether the delegate handled the
/// stage itself; when they return `false` the driver's default runs.
pub trait LayeredDelegate {
    /// Build the network the layout operates on.
    fn make_network(&mut self, collection: &Collection, items: &[ItemId]) -> Network {
        Network::from_collection(collection, items)
    }

    /// Re-impose delegate-specific layer constraints after a relaxation
    /// pass. Return `true` when any layer changed; the driver relaxes
    /// again and repeats until stable.
    fn constrain_layers(&mut self, network: &mut Network) -> bool {
        let _ = network;
        false
    }

    /// Runs once after dummy chains exist and the layer grid is built,
    /// before crossing reduction.
    fn setup(&mut self, config: &LayeredConfig, network: &mut Network, grid: &mut LayerGrid) {
        let _ = (config, network, grid);
    }

    /// Return `true` when the delegate performed crossing reduction (or
    /// deliberately wants none).
    fn reduce_crossings(
        &mut self,
        config: &LayeredConfig,
        network: &mut Network,
        grid: &mut LayerGrid,
    ) -> bool {
        let _ = (config, network, grid);
        false
    }

    /// Return `true` when the delegate assigned every vertex column. The
    /// driver then skips its own column pass and the straighten step.
    fn assign_columns(
        &mut self,
        config: &LayeredConfig,
        network: &mut Network,
        grid: &mut LayerGrid,
    ) -> bool {
        let _ = (config, network, grid);
        false
    }

    /// Extra perpendicular space to reserve on one side of a vertex,
    /// queried while layer coordinates are assigned.
    fn min_layer_space(
        &self,
        config: &LayeredConfig,
        network: &Network,
        vertex: VertexId,
        side: GapSide,
    ) -> f32 {
        let _ = (config, network, vertex, side);
        0.0
    }

    /// Runs after vertex coordinates have been committed to items.
    fn commit(
        &mut self,
        config: &LayeredConfig,
        collection: &mut Collection,
        network: &mut Network,
        grid: &LayerGrid,
    ) {
        let _ = (config, collection, network, grid);
    }
}

/// The all-defaults delegate.
impl LayeredDelegate for () {}

/// Driver for layered-digraph layouts.
pub struct LayeredLayout<D = ()> {
    config: LayeredConfig,
    delegate: D,
}

impl LayeredLayout<()> {
    /// Create a driver with no delegate: plain layered layout.
    pub fn new(config: LayeredConfig) -> Self {
        Self {
            config,
            delegate: (),
        }
    }
}

impl<D: LayeredDelegate> LayeredLayout<D> {
    /// Create a driver customized by the given delegate.
    pub fn with_delegate(config: LayeredConfig, delegate: D) -> Self {
        Self { config, delegate }
    }

    pub fn config(&self) -> &LayeredConfig {
        &self.config
    }

    pub fn delegate(&self) -> &D {
        &self.delegate
    }

    /// Run the full stage sequence over the given items.
    pub fn run(&mut self, collection: &mut Collection, items: &[ItemId]) -> Bounds {
        let config = &self.config;
        let delegate = &mut self.delegate;

        let mut network = delegate.make_network(collection, items);
        if network.is_empty() {
            return Bounds::default();
        }
        debug!(
            vertexes = network.vertex_count(),
            edges = network.edge_count();
            "Layered network built",
        );

        break_cycles(&mut network);
        assign_layers(&mut network);

        // Delegate constraints (e.g. cohort equalization) may invalidate
        // edge spans; alternate constraint and relaxation until stable.
        let mut rounds = 0;
        while delegate.constrain_layers(&mut network) {
            relax_layers(&mut network);
            rounds += 1;
            if rounds >= 16 {
                debug!("Layer constraints did not stabilize; proceeding");
                break;
            }
        }
        normalize_layers(&mut network);
        insert_dummy_chains(&mut network);
        trace!(layers = network.max_layer() + 1; "Layers assigned");

        let mut grid = LayerGrid::from_network(&mut network);
        delegate.setup(config, &mut network, &mut grid);

        if !delegate.reduce_crossings(config, &mut network, &mut grid) {
            median_sweeps(&mut network, &mut grid, config.reduce_passes());
        }
        if !delegate.assign_columns(config, &mut network, &mut grid) {
            default_columns(config, &mut network, &grid);
        }

        commit_coordinates(config, &*delegate, collection, &mut network, &grid);
        delegate.commit(config, collection, &mut network, &grid);

        let items = network.referenced_items();
        collection.bounds_of(&items)
    }
}

impl<D: LayeredDelegate> LayoutEngine for LayeredLayout<D> {
    fn arrange(&mut self, collection: &mut Collection, items: &[ItemId]) -> Bounds {
        self.run(collection, items)
    }
}

/// Column footprint reserved on either side of a vertex's focus column.
pub(crate) fn min_column_space(config: &LayeredConfig, vertex: &Vertex) -> i32 {
    if vertex.is_dummy() {
        return 0;
    }
    ((vertex.width() / 2.0) / config.column_spacing()).ceil() as i32
}

fn effective_endpoints(network: &Network, edge: EdgeId) -> (VertexId, VertexId) {
    let (from, to) = network.edge_endpoints(edge);
    if network.edge(edge).is_reversed() {
        (to, from)
    } else {
        (from, to)
    }
}

/// Mark the back edges of a depth-first traversal as reversed so layer
/// assignment sees an acyclic graph.
fn break_cycles(network: &mut Network) {
    const WHITE: u8 = 0;
    const GRAY: u8 = 1;
    const BLACK: u8 = 2;

    let mut state: HashMap<VertexId, u8> = HashMap::new();
    let roots: Vec<VertexId> = network.vertex_ids().collect();

    for root in roots {
        if state.get(&root).copied().unwrap_or(WHITE) != WHITE {
            continue;
        }
        state.insert(root, GRAY);
        let mut stack: Vec<(VertexId, Vec<EdgeId>, usize)> = vec![(
            root,
            network.out_edges(root).collect::<Vec<_>>(),
            0,
        )];

        while !stack.is_empty() {
            let top = stack.len() - 1;
            if stack[top].2 < stack[top].1.len() {
                let edge = stack[top].1[stack[top].2];
                stack[top].2 += 1;
                let (_, to) = network.edge_endpoints(edge);
                match state.get(&to).copied().unwrap_or(WHITE) {
                    WHITE => {
                        state.insert(to, GRAY);
                        let out = network.out_edges(to).collect::<Vec<_>>();
                        stack.push((to, out, 0));
                    }
                    GRAY => network.edge_mut(edge).reversed = true,
                    _ => {}
                }
            } else {
                let (done, _, _) = stack.pop().expect("stack is non-empty");
                state.insert(done, BLACK);
            }
        }
    }
}

/// Longest-path layer assignment over the effective (cycle-broken) edges.
fn assign_layers(network: &mut Network) {
    let ids: Vec<VertexId> = network.vertex_ids().collect();
    for id in ids {
        network.vertex_mut(id).layer = 0;
    }
    relax_layers(network);
}

/// One relaxation pass: raise every edge target to at least one layer
/// below its source, in topological order. Never lowers a layer, so layer
/// floors imposed by a delegate survive.
fn relax_layers(network: &mut Network) {
    let ids: Vec<VertexId> = network.vertex_ids().collect();
    let edges: Vec<EdgeId> = network.edge_ids().collect();

    let mut indegree: HashMap<VertexId, usize> = ids.iter().map(|&id| (id, 0)).collect();
    for &edge in &edges {
        let (from, to) = effective_endpoints(network, edge);
        if from != to {
            *indegree.get_mut(&to).expect("endpoint is a vertex") += 1;
        }
    }

    let mut queue: Vec<VertexId> = ids
        .iter()
        .copied()
        .filter(|id| indegree[id] == 0)
        .collect();
    let mut order: Vec<VertexId> = Vec::with_capacity(ids.len());
    let mut cursor = 0;
    while cursor < queue.len() {
        let id = queue[cursor];
        cursor += 1;
        order.push(id);
        let outgoing: Vec<EdgeId> = network
            .out_edges(id)
            .chain(network.in_edges(id))
            .filter(|&e| effective_endpoints(network, e).0 == id)
            .collect();
        for edge in outgoing {
            let (from, to) = effective_endpoints(network, edge);
            if from == to {
                continue;
            }
            let remaining = indegree.get_mut(&to).expect("endpoint is a vertex");
            *remaining -= 1;
            if *remaining == 0 {
                queue.push(to);
            }
        }
    }
    // Anything left sits on a cycle the breaker could not orient; append
    // it so relaxation still terminates.
    if order.len() < ids.len() {
        let seen: std::collections::HashSet<VertexId> = order.iter().copied().collect();
        order.extend(ids.iter().copied().filter(|id| !seen.contains(id)));
    }

    for id in order {
        let layer = network.vertex(id).layer();
        let outgoing: Vec<VertexId> = network
            .out_edges(id)
            .chain(network.in_edges(id))
            .filter_map(|e| {
                let (from, to) = effective_endpoints(network, e);
                (from == id && to != id).then_some(to)
            })
            .collect();
        for to in outgoing {
            let target = network.vertex_mut(to);
            target.layer = target.layer.max(layer + 1);
        }
    }
}

fn normalize_layers(network: &mut Network) {
    let min = network
        .vertex_ids()
        .map(|id| network.vertex(id).layer())
        .min()
        .unwrap_or(0);
    if min != 0 {
        let ids: Vec<VertexId> = network.vertex_ids().collect();
        for id in ids {
            network.vertex_mut(id).layer -= min;
        }
    }
}

/// Replace every edge spanning more than one layer with a chain of dummy
/// vertexes, one per intermediate layer. Chain segments run in effective
/// direction and carry no link back-reference.
fn insert_dummy_chains(network: &mut Network) {
    let edges: Vec<EdgeId> = network.edge_ids().collect();
    for edge in edges {
        let (from, to) = effective_endpoints(network, edge);
        let from_layer = network.vertex(from).layer();
        let to_layer = network.vertex(to).layer();
        if to_layer - from_layer <= 1 {
            continue;
        }
        network.remove_edge(edge);
        let mut prev = from;
        for layer in (from_layer + 1)..to_layer {
            let mut dummy = Vertex::dummy();
            dummy.layer = layer;
            let id = network.add_vertex(dummy);
            network.add_edge(prev, id, None);
            prev = id;
        }
        network.add_edge(prev, to, None);
    }
}

/// Median of the adjacent-layer neighbor indices, or the vertex's own
/// index when it has no neighbors there.
fn median_score(network: &Network, id: VertexId, adjacent_layer: i32) -> f32 {
    let mut indices: Vec<usize> = network
        .successors(id)
        .chain(network.predecessors(id))
        .filter(|&n| network.vertex(n).layer() == adjacent_layer)
        .map(|n| network.vertex(n).index())
        .collect();
    if indices.is_empty() {
        return network.vertex(id).index() as f32;
    }
    indices.sort_unstable();
    let mid = indices.len() / 2;
    if indices.len() % 2 == 1 {
        indices[mid] as f32
    } else {
        (indices[mid - 1] as f32 + indices[mid] as f32) / 2.0
    }
}

fn sort_layer_by_median(network: &mut Network, grid: &mut LayerGrid, layer: usize, adjacent: i32) {
    let scores: HashMap<VertexId, f32> = grid
        .layer(layer)
        .iter()
        .map(|&id| (id, median_score(network, id, adjacent)))
        .collect();
    grid.layer_mut(layer).sort_by(|a, b| {
        scores[a]
            .partial_cmp(&scores[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    grid.reindex_layer(network, layer);
}

/// The driver's default crossing reduction: alternating median sweeps,
/// downward then upward, as many rounds as configured.
fn median_sweeps(network: &mut Network, grid: &mut LayerGrid, passes: usize) {
    let count = grid.layer_count();
    if count <= 1 {
        return;
    }
    for _ in 0..passes {
        for layer in 1..count {
            sort_layer_by_median(network, grid, layer, layer as i32 - 1);
        }
        for layer in (0..count - 1).rev() {
            sort_layer_by_median(network, grid, layer, layer as i32 + 1);
        }
    }
}

/// The driver's default column assignment: pack each layer left to right
/// by footprint, then center every layer against the widest one.
fn default_columns(config: &LayeredConfig, network: &mut Network, grid: &LayerGrid) {
    let mut totals: Vec<i32> = Vec::with_capacity(grid.layer_count());
    for layer in 0..grid.layer_count() {
        let mut cursor = 0;
        for &id in grid.layer(layer) {
            let space = min_column_space(config, network.vertex(id));
            network.vertex_mut(id).column = cursor + space;
            cursor += 1 + 2 * space;
        }
        totals.push(cursor);
    }

    let widest = totals.iter().copied().max().unwrap_or(0);
    for (layer, total) in totals.iter().enumerate() {
        let offset = (widest - total) / 2;
        if offset == 0 {
            continue;
        }
        for &id in grid.layer(layer) {
            network.vertex_mut(id).column += offset;
        }
    }
}

/// Assign layer rows and column coordinates, then write the centers of
/// item-bearing vertexes back to their items.
fn commit_coordinates<D: LayeredDelegate>(
    config: &LayeredConfig,
    delegate: &D,
    collection: &mut Collection,
    network: &mut Network,
    grid: &LayerGrid,
) {
    let count = grid.layer_count();
    let mut row_heights = vec![0.0f32; count];
    for layer in 0..count {
        for &id in grid.layer(layer) {
            row_heights[layer] = row_heights[layer].max(network.vertex(id).height());
        }
    }

    let mut gaps = vec![config.layer_spacing(); count.saturating_sub(1)];
    for (layer, gap) in gaps.iter_mut().enumerate() {
        for &id in grid.layer(layer) {
            *gap = gap.max(delegate.min_layer_space(config, network, id, GapSide::Below));
        }
        for &id in grid.layer(layer + 1) {
            *gap = gap.max(delegate.min_layer_space(config, network, id, GapSide::Above));
        }
    }

    let mut y = 0.0f32;
    for layer in 0..count {
        let center_y = y + row_heights[layer] / 2.0;
        for &id in grid.layer(layer) {
            let vertex = network.vertex_mut(id);
            debug_assert!(
                vertex.is_dummy() || vertex.column() >= 0,
                "vertex left without a column"
            );
            let center = Point::new(vertex.column() as f32 * config.column_spacing(), center_y);
            vertex.center = center;
            if let Some(item) = vertex.item() {
                collection.item_mut(item).set_position(center);
            }
        }
        y += row_heights[layer];
        if layer < gaps.len() {
            y += gaps[layer];
        }
    }
}
