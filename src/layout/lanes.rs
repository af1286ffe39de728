//! Lane-constrained layered layout.
//!
//! [`SwimLaneLayout`] is a [`LayeredDelegate`] that keeps every vertex
//! inside a named lane: lanes occupy fixed, contiguous column corridors
//! spanning all layers, vertexes are grouped by lane within each layer,
//! crossing reduction is delegated to a pluggable [`CrossingReducer`] that
//! must respect lane boundaries, and the driver's generic column pass is
//! replaced by per-lane breadth and position accounting.

use std::cmp::Ordering;
use std::collections::HashSet;

use indexmap::IndexMap;
use log::{debug, trace};

use crate::collection::Collection;
use crate::config::{LaneConfig, LayeredConfig};
use crate::layout::layered::{GapSide, LayerGrid, LayeredDelegate, min_column_space};
use crate::layout::spacing::LinkSpaceEstimator;
use crate::network::{Network, VertexId};

/// Orders lane names left to right.
pub type LaneComparator = Box<dyn Fn(&str, &str) -> Ordering>;

/// Accessor surface handed to a [`CrossingReducer`] for one adjacent layer
/// pair. The fixed layer keeps its order; the reducer permutes the movable
/// one.
pub struct ReducerContext<'a> {
    network: &'a Network,
    fixed_layer: i32,
}

impl ReducerContext<'_> {
    /// The resolved lane of a vertex.
    pub fn lane(&self, vertex: VertexId) -> Option<&str> {
        self.network.vertex(vertex).lane()
    }

    /// The vertex's current position within its layer.
    pub fn index(&self, vertex: VertexId) -> usize {
        self.network.vertex(vertex).index()
    }

    /// The vertex's neighbors within the fixed layer.
    pub fn neighbors(&self, vertex: VertexId) -> Vec<VertexId> {
        self.network
            .successors(vertex)
            .chain(self.network.predecessors(vertex))
            .filter(|&n| self.network.vertex(n).layer() == self.fixed_layer)
            .collect()
    }

    /// Mean index of the vertex's fixed-layer neighbors, or its own index
    /// when it has none.
    pub fn barycenter(&self, vertex: VertexId) -> f32 {
        let neighbors = self.neighbors(vertex);
        if neighbors.is_empty() {
            return self.index(vertex) as f32;
        }
        let sum: usize = neighbors.iter().map(|&n| self.index(n)).sum();
        sum as f32 / neighbors.len() as f32
    }
}

/// Pluggable crossing-minimization strategy for one adjacent layer pair.
///
/// Implementations reorder `movable` in place. They must keep same-lane
/// vertexes contiguous; moving a vertex across a lane boundary is a
/// programmer error the layout asserts against in debug builds.
pub trait CrossingReducer {
    fn reduce_crossings(&mut self, movable: &mut Vec<VertexId>, context: &ReducerContext<'_>);
}

/// The default reducer: sorts each contiguous same-lane run by the median
/// index of its fixed-layer neighbors, leaving lane grouping untouched.
#[derive(Debug, Default)]
pub struct LaneMedianReducer;

impl LaneMedianReducer {
    fn median(&self, vertex: VertexId, context: &ReducerContext<'_>) -> f32 {
        let mut indices: Vec<usize> = context
            .neighbors(vertex)
            .into_iter()
            .map(|n| context.index(n))
            .collect();
        if indices.is_empty() {
            return context.index(vertex) as f32;
        }
        indices.sort_unstable();
        let mid = indices.len() / 2;
        if indices.len() % 2 == 1 {
            indices[mid] as f32
        } else {
            (indices[mid - 1] as f32 + indices[mid] as f32) / 2.0
        }
    }
}

impl CrossingReducer for LaneMedianReducer {
    fn reduce_crossings(&mut self, movable: &mut Vec<VertexId>, context: &ReducerContext<'_>) {
        let mut start = 0;
        while start < movable.len() {
            let lane = context.lane(movable[start]).map(str::to_owned);
            let mut end = start;
            while end < movable.len() && context.lane(movable[end]).map(str::to_owned) == lane {
                end += 1;
            }
            let run = &mut movable[start..end];
            let mut scored: Vec<(f32, VertexId)> =
                run.iter().map(|&v| (self.median(v, context), v)).collect();
            scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
            for (slot, (_, v)) in run.iter_mut().zip(scored) {
                *slot = v;
            }
            start = end;
        }
    }
}

/// Lane-constrained layered layout delegate.
///
/// Use through the layered driver:
/// [`LayeredLayout::with_delegate`](crate::layout::LayeredLayout::with_delegate).
/// After a run, [`lane_positions`](Self::lane_positions) and
/// [`lane_breadths`](Self::lane_breadths) describe the committed corridors.
pub struct SwimLaneLayout {
    config: LaneConfig,
    declared_lanes: Vec<String>,
    comparator: Option<LaneComparator>,
    reducer: Option<Box<dyn CrossingReducer>>,
    estimator: LinkSpaceEstimator,
    lane_names: Vec<String>,
    lane_positions: IndexMap<String, i32>,
    lane_breadths: IndexMap<String, i32>,
}

impl SwimLaneLayout {
    pub fn new(config: LaneConfig) -> Self {
        let estimator = LinkSpaceEstimator::new(config.link_spacing());
        Self {
            config,
            declared_lanes: Vec::new(),
            comparator: None,
            reducer: None,
            estimator,
            lane_names: Vec::new(),
            lane_positions: IndexMap::new(),
            lane_breadths: IndexMap::new(),
        }
    }

    /// Declare lane names up front (builder style). Undeclared lanes found
    /// on vertexes are appended in discovery order.
    pub fn with_lanes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declared_lanes = names.into_iter().map(Into::into).collect();
        self
    }

    /// Order the full lane list with a comparator (builder style).
    pub fn with_comparator(mut self, comparator: LaneComparator) -> Self {
        self.comparator = Some(comparator);
        self
    }

    /// Install a crossing reducer (builder style). Without one, vertex
    /// order within each layer stays as the lane-grouping sort left it.
    pub fn with_reducer(mut self, reducer: Box<dyn CrossingReducer>) -> Self {
        self.reducer = Some(reducer);
        self
    }

    /// Starting column of each lane, in lane order, from the last run.
    pub fn lane_positions(&self) -> &IndexMap<String, i32> {
        &self.lane_positions
    }

    /// Minimum column breadth of each lane from the last run.
    pub fn lane_breadths(&self) -> &IndexMap<String, i32> {
        &self.lane_breadths
    }

    fn lane_order(&self, lane: Option<&str>) -> usize {
        lane.and_then(|name| self.lane_names.iter().position(|n| n == name))
            .unwrap_or(self.lane_names.len())
    }

    /// Resolve dummy-vertex lanes from the nearest real vertex along the
    /// dummy chain; the source side wins when both resolve.
    fn resolve_dummy_lanes(&self, network: &mut Network) {
        let dummies: Vec<VertexId> = network
            .vertex_ids()
            .filter(|&id| network.vertex(id).is_dummy())
            .collect();
        for id in dummies {
            let lane =
                chain_lane(network, id, false).or_else(|| chain_lane(network, id, true));
            network.vertex_mut(id).lane = lane;
        }
    }

    /// Gather declared plus discovered lane names, then apply the
    /// comparator to the full list.
    fn collect_lane_names(&mut self, network: &Network) {
        self.lane_names = self.declared_lanes.clone();
        for id in network.vertex_ids() {
            if let Some(name) = network.vertex(id).lane() {
                if !self.lane_names.iter().any(|n| n == name) {
                    self.lane_names.push(name.to_string());
                }
            }
        }
        if let Some(comparator) = &self.comparator {
            self.lane_names.sort_by(|a, b| comparator(a, b));
        }
        trace!(lanes = self.lane_names.len(); "Lane list assembled");
    }
}

impl LayeredDelegate for SwimLaneLayout {
    fn setup(&mut self, _config: &LayeredConfig, network: &mut Network, grid: &mut LayerGrid) {
        self.resolve_dummy_lanes(network);
        self.collect_lane_names(network);

        // Group same-lane vertexes contiguously within each layer; the
        // column pass depends on this.
        for layer in 0..grid.layer_count() {
            let order: Vec<usize> = grid
                .layer(layer)
                .iter()
                .map(|&id| self.lane_order(network.vertex(id).lane()))
                .collect();
            let mut keyed: Vec<(usize, VertexId)> = order
                .into_iter()
                .zip(grid.layer(layer).iter().copied())
                .collect();
            keyed.sort_by_key(|&(key, _)| key);
            *grid.layer_mut(layer) = keyed.into_iter().map(|(_, id)| id).collect();
            grid.reindex_layer(network, layer);
        }
    }

    fn reduce_crossings(
        &mut self,
        _config: &LayeredConfig,
        network: &mut Network,
        grid: &mut LayerGrid,
    ) -> bool {
        let Some(reducer) = self.reducer.as_mut() else {
            // No reducer: the lane-grouping sort order stands. The driver's
            // generic sweeps would tear lanes apart, so report handled.
            return true;
        };

        let count = grid.layer_count();
        for layer in 0..count.saturating_sub(1) {
            let context = ReducerContext {
                network: &*network,
                fixed_layer: layer as i32,
            };
            let mut movable = std::mem::take(grid.layer_mut(layer + 1));
            reducer.reduce_crossings(&mut movable, &context);
            *grid.layer_mut(layer + 1) = movable;
            grid.reindex_layer(network, layer + 1);
        }
        for layer in (0..count.saturating_sub(1)).rev() {
            let context = ReducerContext {
                network: &*network,
                fixed_layer: layer as i32 + 1,
            };
            let mut movable = std::mem::take(grid.layer_mut(layer));
            reducer.reduce_crossings(&mut movable, &context);
            *grid.layer_mut(layer) = movable;
            grid.reindex_layer(network, layer);
        }

        debug_assert!(
            lanes_contiguous(self, network, grid),
            "crossing reducer moved a vertex across a lane boundary"
        );
        true
    }

    fn assign_columns(
        &mut self,
        config: &LayeredConfig,
        network: &mut Network,
        grid: &mut LayerGrid,
    ) -> bool {
        // Lane breadth: the worst-case column footprint of the lane over
        // all layers.
        self.lane_breadths = self
            .lane_names
            .iter()
            .map(|name| (name.clone(), 0))
            .collect();
        for layer in 0..grid.layer_count() {
            let mut sums: IndexMap<&str, i32> = IndexMap::new();
            for &id in grid.layer(layer) {
                let vertex = network.vertex(id);
                let Some(lane) = vertex.lane() else { continue };
                let space = min_column_space(config, vertex);
                *sums.entry(lane).or_insert(0) += 1 + 2 * space;
            }
            for (lane, sum) in sums {
                if let Some(breadth) = self.lane_breadths.get_mut(lane) {
                    *breadth = (*breadth).max(sum);
                }
            }
        }

        // Lane corridors: a running sum in lane order.
        self.lane_positions = IndexMap::new();
        let mut position = 0;
        for name in &self.lane_names {
            self.lane_positions.insert(name.clone(), position);
            position += self.lane_breadths[name.as_str()] + self.config.lane_spacing();
        }
        debug!(
            lanes = self.lane_names.len(),
            total_columns = position;
            "Lane corridors computed",
        );

        // Walk each layer left to right; on every lane change reset the
        // cursor to the lane's corridor and center the contiguous run.
        for layer in 0..grid.layer_count() {
            let ids: Vec<VertexId> = grid.layer(layer).to_vec();
            let mut cursor = 0;
            let mut start = 0;
            while start < ids.len() {
                let lane = network.vertex(ids[start]).lane().map(str::to_owned);
                let mut end = start;
                while end < ids.len()
                    && network.vertex(ids[end]).lane().map(str::to_owned) == lane
                {
                    end += 1;
                }

                let occupied: i32 = ids[start..end]
                    .iter()
                    .map(|&id| 1 + 2 * min_column_space(config, network.vertex(id)))
                    .sum();
                if let Some(name) = lane.as_deref() {
                    cursor = self.lane_positions[name];
                    let allocated = self.lane_breadths[name];
                    if occupied < allocated {
                        cursor += (allocated - occupied) / 2;
                    }
                }

                for &id in &ids[start..end] {
                    let space = min_column_space(config, network.vertex(id));
                    network.vertex_mut(id).column = cursor + space;
                    cursor += 1 + 2 * space;
                }
                start = end;
            }

            debug_assert!(
                ids.windows(2).all(|pair| {
                    let right = min_column_space(config, network.vertex(pair[0]));
                    network.vertex(pair[0]).column() + 1 + right
                        <= network.vertex(pair[1]).column()
                }),
                "vertex columns must not overlap within a layer"
            );
        }

        self.estimator = LinkSpaceEstimator::new(self.config.link_spacing());
        self.estimator.measure(network);
        true
    }

    fn min_layer_space(
        &self,
        _config: &LayeredConfig,
        network: &Network,
        vertex: VertexId,
        side: GapSide,
    ) -> f32 {
        self.estimator.required_space(network, vertex, side)
    }

    fn commit(
        &mut self,
        _config: &LayeredConfig,
        _collection: &mut Collection,
        _network: &mut Network,
        _grid: &LayerGrid,
    ) {
        // The working lane list belongs to the invocation; corridors stay
        // readable until the next run.
        self.lane_names.clear();
    }
}

/// Walk a dummy chain toward the source (or destination) side and return
/// the first real vertex's lane. Cyclic chains terminate via the visited
/// set and resolve to no lane.
fn chain_lane(network: &Network, start: VertexId, forward: bool) -> Option<String> {
    let mut visited: HashSet<VertexId> = HashSet::new();
    let mut current = start;
    loop {
        if !visited.insert(current) {
            return None;
        }
        let next = if forward {
            network.successors(current).next()
        } else {
            network.predecessors(current).next()
        }?;
        let vertex = network.vertex(next);
        if !vertex.is_dummy() {
            return vertex.lane().map(str::to_owned);
        }
        current = next;
    }
}

fn lanes_contiguous(layout: &SwimLaneLayout, network: &Network, grid: &LayerGrid) -> bool {
    for layer in 0..grid.layer_count() {
        let mut seen: Vec<usize> = Vec::new();
        for &id in grid.layer(layer) {
            let order = layout.lane_order(network.vertex(id).lane());
            if seen.last() != Some(&order) {
                if seen.contains(&order) {
                    return false;
                }
                seen.push(order);
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{Collection, Item, ItemId, LinkKind};
    use crate::geometry::Size;
    use crate::layout::layered::LayeredLayout;
    use crate::network::Vertex;

    fn lane_item(collection: &mut Collection, lane: &str) -> ItemId {
        collection.add_item(Item::new(Size::new(40.0, 20.0)).with_lane(lane))
    }

    fn three_lane_grid() -> (Collection, Vec<ItemId>) {
        let mut collection = Collection::new();
        let top: Vec<ItemId> = ["A", "B", "C"]
            .iter()
            .map(|lane| lane_item(&mut collection, lane))
            .collect();
        let bottom: Vec<ItemId> = ["A", "B", "C"]
            .iter()
            .map(|lane| lane_item(&mut collection, lane))
            .collect();
        for (a, b) in top.iter().zip(&bottom) {
            collection.add_link(*a, *b, LinkKind::Directed).unwrap();
        }
        let ids = top.into_iter().chain(bottom).collect();
        (collection, ids)
    }

    fn swim_lanes() -> SwimLaneLayout {
        SwimLaneLayout::new(LaneConfig::default()).with_lanes(["A", "B", "C"])
    }

    #[test]
    fn test_uniform_load_gives_equal_breadths_and_ordered_positions() {
        let (mut collection, ids) = three_lane_grid();
        let mut layout = LayeredLayout::with_delegate(LayeredConfig::default(), swim_lanes());
        layout.run(&mut collection, &ids);

        let breadths = layout.delegate().lane_breadths();
        assert_eq!(breadths["A"], breadths["B"]);
        assert_eq!(breadths["B"], breadths["C"]);

        let positions = layout.delegate().lane_positions();
        assert!(positions["A"] < positions["B"]);
        assert!(positions["B"] < positions["C"]);
    }

    #[test]
    fn test_lane_positions_are_deterministic() {
        let run = || {
            let (mut collection, ids) = three_lane_grid();
            let mut layout =
                LayeredLayout::with_delegate(LayeredConfig::default(), swim_lanes());
            layout.run(&mut collection, &ids);
            layout.delegate().lane_positions().clone()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_every_real_vertex_resolves_a_lane() {
        let mut collection = Collection::new();
        let with_lane = lane_item(&mut collection, "A");
        let without = collection.add_item(Item::new(Size::new(40.0, 20.0)));
        collection
            .add_link(with_lane, without, LinkKind::Directed)
            .unwrap();

        let network = Network::from_collection(&collection, &[with_lane, without]);
        for id in network.vertex_ids() {
            assert!(network.vertex(id).lane().is_some());
        }
        // The attribute-less item lands in the default lane.
        let vertex = network.find_vertex(without).unwrap();
        assert_eq!(network.vertex(vertex).lane(), Some(""));
    }

    #[test]
    fn test_dummy_lane_inherits_from_source_side() {
        // Hand-build the post-layering shape of a two-layer-spanning link:
        // a (lane A, layer 0) -> dummy (layer 1) -> c (lane C, layer 2).
        let mut collection = Collection::new();
        let a = lane_item(&mut collection, "A");
        let c = lane_item(&mut collection, "C");
        let mut network = Network::from_collection(&collection, &[a, c]);
        let a_vertex = network.find_vertex(a).unwrap();
        let c_vertex = network.find_vertex(c).unwrap();
        network.vertex_mut(c_vertex).layer = 2;
        let mut dummy = Vertex::dummy();
        dummy.layer = 1;
        let dummy = network.add_vertex(dummy);
        network.add_edge(a_vertex, dummy, None);
        network.add_edge(dummy, c_vertex, None);

        let mut grid = LayerGrid::from_network(&mut network);
        let mut delegate = swim_lanes();
        delegate.setup(&LayeredConfig::default(), &mut network, &mut grid);

        // Both sides resolve; the source side wins.
        assert_eq!(network.vertex(dummy).lane(), Some("A"));
    }

    #[test]
    fn test_comparator_orders_the_full_lane_list() {
        let (mut collection, ids) = three_lane_grid();
        let delegate = SwimLaneLayout::new(LaneConfig::default())
            .with_lanes(["C", "A", "B"])
            .with_comparator(Box::new(|a, b| a.cmp(b)));
        let mut layout = LayeredLayout::with_delegate(LayeredConfig::default(), delegate);
        layout.run(&mut collection, &ids);

        let positions = layout.delegate().lane_positions();
        assert!(positions["A"] < positions["B"]);
        assert!(positions["B"] < positions["C"]);
    }

    #[test]
    fn test_columns_increase_within_each_layer() {
        let mut collection = Collection::new();
        // Two vertexes per lane in one layer, one in the other.
        let a1 = lane_item(&mut collection, "A");
        let a2 = lane_item(&mut collection, "A");
        let b1 = lane_item(&mut collection, "B");
        let sink = lane_item(&mut collection, "B");
        for &source in &[a1, a2, b1] {
            collection.add_link(source, sink, LinkKind::Directed).unwrap();
        }
        let ids = vec![a1, a2, b1, sink];

        let delegate = SwimLaneLayout::new(LaneConfig::default())
            .with_lanes(["A", "B"])
            .with_reducer(Box::new(LaneMedianReducer));
        let mut layout = LayeredLayout::with_delegate(LayeredConfig::default(), delegate);
        layout.run(&mut collection, &ids);

        let positions: Vec<f32> = [a1, a2, b1]
            .iter()
            .map(|&id| collection.item(id).position().x())
            .collect();
        assert!(positions[0] < positions[1]);
        assert!(positions[1] < positions[2]);
    }

    #[test]
    fn test_lane_corridor_is_constant_across_layers() {
        let (mut collection, ids) = three_lane_grid();
        let mut layout = LayeredLayout::with_delegate(LayeredConfig::default(), swim_lanes());
        layout.run(&mut collection, &ids);

        // Same lane, different layers: same lateral position.
        let top_b = collection.item(ids[1]).position().x();
        let bottom_b = collection.item(ids[4]).position().x();
        float_cmp::assert_approx_eq!(f32, top_b, bottom_b);
    }
}
