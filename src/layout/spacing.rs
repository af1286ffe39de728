//! Perpendicular routing-space estimation for inter-layer gaps.
//!
//! Links routed between the same pair of layers share the gap between
//! those layers. When many of them overlap laterally they need parallel
//! tracks, so the gap has to grow. [`LinkSpaceEstimator`] measures, per
//! gap, the maximum number of pairwise-overlapping link spans via a sweep
//! over two orderings of the spans, and answers per-vertex space queries
//! that feed the layered driver's `min_layer_space` hook.

use std::collections::HashMap;

use crate::layout::layered::GapSide;
use crate::network::{Network, VertexId};

/// The lateral span of one link crossing a gap, in column units.
#[derive(Debug, Clone, Copy)]
struct Span {
    min: i32,
    max: i32,
}

/// Measures link congestion per inter-layer gap.
///
/// `measure` expects a network whose vertexes already carry `layer` and
/// `column` assignments. A network with no edges, or only straight
/// same-column edges, reserves no space; that is the common tree-layout
/// case, not an error.
#[derive(Debug)]
pub struct LinkSpaceEstimator {
    link_spacing: f32,
    overlaps: HashMap<i32, usize>,
}

impl LinkSpaceEstimator {
    /// Create an estimator with the given per-link routing distance.
    pub fn new(link_spacing: f32) -> Self {
        Self {
            link_spacing,
            overlaps: HashMap::new(),
        }
    }

    /// Forget the previous measurement.
    pub fn clear(&mut self) {
        self.overlaps.clear();
    }

    /// Count overlapping link spans for every inter-layer gap.
    ///
    /// Only edges whose endpoints are exactly one layer apart participate;
    /// same-column edges need no lateral offset and are excluded.
    pub fn measure(&mut self, network: &Network) {
        self.overlaps.clear();

        let mut spans: HashMap<i32, Vec<Span>> = HashMap::new();
        for edge in network.edge_ids() {
            let (from, to) = network.edge_endpoints(edge);
            let from_layer = network.vertex(from).layer();
            let to_layer = network.vertex(to).layer();
            if (from_layer - to_layer).abs() != 1 {
                continue;
            }
            let from_column = network.vertex(from).column();
            let to_column = network.vertex(to).column();
            if from_column == to_column {
                continue;
            }
            spans.entry(from_layer.min(to_layer)).or_default().push(Span {
                min: from_column.min(to_column),
                max: from_column.max(to_column),
            });
        }

        for (gap, spans) in spans {
            self.overlaps.insert(gap, max_overlap(spans));
        }
    }

    /// The measured maximum overlap count for the gap between `gap` and
    /// `gap + 1`.
    pub fn overlap_count(&self, gap: i32) -> usize {
        self.overlaps.get(&gap).copied().unwrap_or(0)
    }

    /// Perpendicular space reserved for a gap: the overlap count scaled by
    /// 1.5 to allow for parallel-link stroke width.
    pub fn reserved_space(&self, gap: i32) -> f32 {
        self.overlap_count(gap) as f32 * 1.5
    }

    /// Space one vertex needs on the given side for its own link routing,
    /// oriented along the vertex's focus axis.
    pub fn required_space(&self, network: &Network, vertex: VertexId, side: GapSide) -> f32 {
        let layer = network.vertex(vertex).layer();
        let (gap, adjacent) = match side {
            GapSide::Above => (layer - 1, layer - 1),
            GapSide::Below => (layer, layer + 1),
        };

        let column = network.vertex(vertex).column();
        let directional = network
            .successors(vertex)
            .chain(network.predecessors(vertex))
            .filter(|&n| {
                let neighbor = network.vertex(n);
                neighbor.layer() == adjacent && neighbor.column() != column
            })
            .count();

        let tracks = (self.reserved_space(gap) / 2.0).max(directional as f32);
        tracks * self.link_spacing * 1.5 + 10.0
    }
}

/// Classic interval-overlap counting: walk the spans ordered by lower
/// bound and by upper bound simultaneously, advancing whichever pointer
/// holds the smaller bound; the largest pointer difference is the maximum
/// number of concurrently open spans.
fn max_overlap(spans: Vec<Span>) -> usize {
    let mut starts: Vec<i32> = spans.iter().map(|s| s.min).collect();
    let mut ends: Vec<i32> = spans.iter().map(|s| s.max).collect();
    starts.sort_unstable();
    ends.sort_unstable();

    let mut best = 0usize;
    let mut open = 0usize;
    let mut closed = 0usize;
    while open < starts.len() {
        if starts[open] <= ends[closed] {
            open += 1;
            best = best.max(open - closed);
        } else {
            closed += 1;
        }
    }
    best
}
