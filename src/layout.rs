//! Layout engines and the shared arrangement contract.
//!
//! Every engine in this crate, and every host-supplied sub-layout, speaks
//! the same [`LayoutEngine`] contract: reposition a subset of a collection's
//! items and report the bounds they ended up occupying. The composite
//! orchestrator composes engines through this trait without knowing what
//! they do internally.

pub mod composite;
pub mod genogram;
pub mod grid;
pub mod lanes;
pub mod layered;
pub mod spacing;

pub use composite::CompositeLayout;
pub use genogram::GenogramLayout;
pub use grid::GridLayout;
pub use lanes::{CrossingReducer, LaneMedianReducer, ReducerContext, SwimLaneLayout};
pub use layered::{GapSide, LayerGrid, LayeredDelegate, LayeredLayout};
pub use spacing::LinkSpaceEstimator;

use crate::collection::{Collection, ItemId};
use crate::geometry::Bounds;

/// A layout pass over a subset of a collection's items.
///
/// Implementations reposition the given items (the only externally
/// observable side effect) and return the normalized bounds of the result.
/// Items outside the subset, and hidden items within it, are left alone.
pub trait LayoutEngine {
    fn arrange(&mut self, collection: &mut Collection, items: &[ItemId]) -> Bounds;
}
