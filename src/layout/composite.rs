//! Composite orchestration over connected components.
//!
//! [`CompositeLayout`] splits a collection into a "main" graph and a set
//! of "side" items, lays out each connected component of the main graph
//! with a primary engine, arranges the resulting component blocks with a
//! second engine, and places the side items as a rigid block next to the
//! main result with a third. All three slots speak the shared
//! [`LayoutEngine`] contract, so any engine can fill any slot.

use log::{debug, trace};

use crate::collection::{Collection, Item, ItemId};
use crate::config::{CompositeConfig, GridConfig, Side, SideAlignment};
use crate::geometry::{Bounds, Point};
use crate::layout::LayoutEngine;
use crate::layout::grid::GridLayout;
use crate::network::Network;

/// Decides whether an item belongs to the main graph (`true`) or the side
/// set (`false`).
pub type SplitPredicate = Box<dyn Fn(&Collection, ItemId) -> bool>;

/// Orchestrates a primary, an arranging, and a side layout over one
/// collection.
///
/// By default all three slots hold a [`GridLayout`] and the split
/// predicate sends items with at least one link to the main graph.
pub struct CompositeLayout {
    config: CompositeConfig,
    filter: Option<SplitPredicate>,
    primary: Box<dyn LayoutEngine>,
    arranging: Option<Box<dyn LayoutEngine>>,
    side: Box<dyn LayoutEngine>,
}

impl CompositeLayout {
    pub fn new(config: CompositeConfig) -> Self {
        Self {
            config,
            filter: None,
            primary: Box::new(GridLayout::new(GridConfig::default())),
            arranging: Some(Box::new(GridLayout::new(GridConfig::default()))),
            side: Box::new(GridLayout::new(GridConfig::default())),
        }
    }

    pub fn config(&self) -> &CompositeConfig {
        &self.config
    }

    /// Replace the main-versus-side split predicate (builder style).
    pub fn with_filter(mut self, filter: SplitPredicate) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Replace the per-component primary layout (builder style).
    pub fn with_primary(mut self, engine: Box<dyn LayoutEngine>) -> Self {
        self.primary = engine;
        self
    }

    /// Replace the component-arranging layout (builder style).
    pub fn with_arranging(mut self, engine: Box<dyn LayoutEngine>) -> Self {
        self.arranging = Some(engine);
        self
    }

    /// Disable the arranging pass; the primary layout then runs over the
    /// whole main set at once (builder style).
    pub fn without_arranging(mut self) -> Self {
        self.arranging = None;
        self
    }

    /// Replace the side layout (builder style).
    pub fn with_side(mut self, engine: Box<dyn LayoutEngine>) -> Self {
        self.side = engine;
        self
    }

    fn is_main(&self, collection: &Collection, id: ItemId) -> bool {
        match &self.filter {
            Some(filter) => filter(collection, id),
            None => collection.link_count_of(id) > 0,
        }
    }

    /// Lay out each connected component with the primary engine, then
    /// arrange the component blocks and translate members rigidly.
    fn arrange_components(&mut self, collection: &mut Collection, main_items: &[ItemId]) {
        let network = Network::from_collection(collection, main_items);
        let components = network.split_into_subnetworks();

        let Some(arranging) = self.arranging.as_mut() else {
            self.primary.arrange(collection, main_items);
            return;
        };
        if components.len() <= 1 {
            self.primary.arrange(collection, main_items);
            return;
        }
        trace!(components = components.len(); "Arranging connected components");

        // One block per component: lay it out, remember where it landed.
        let mut blocks: Vec<(Vec<ItemId>, Bounds)> = Vec::with_capacity(components.len());
        for component in &components {
            let members = component.referenced_items();
            self.primary.arrange(collection, &members);
            let bounds = collection.bounds_of(&members);
            blocks.push((members, bounds));
        }

        // Arrange synthetic stand-ins sized like the blocks, then apply
        // each block's displacement as a pure translation. The primary
        // layout's internal geometry is preserved exactly.
        let mut scratch = Collection::new();
        let stand_ins: Vec<ItemId> = blocks
            .iter()
            .map(|(_, bounds)| {
                scratch.add_item(Item::new(bounds.to_size()).with_position(bounds.center()))
            })
            .collect();
        arranging.arrange(&mut scratch, &stand_ins);

        for ((members, before), stand_in) in blocks.iter().zip(stand_ins) {
            let after = scratch.item(stand_in).bounds();
            let delta = after.min_point().sub_point(before.min_point());
            collection.translate_items(members, delta);
        }
    }

    /// Translate the already-arranged side block to its configured edge of
    /// the main bounds.
    fn place_side_block(&self, collection: &mut Collection, side_items: &[ItemId], main: Bounds) {
        let side = collection.bounds_of(side_items);
        let config = &self.config;

        let x = match (config.side(), config.alignment()) {
            (Side::Left, _) => main.min_x() - config.gap_width() - side.width(),
            (Side::Right, _) => main.max_x() + config.gap_width(),
            (Side::Top | Side::Bottom, SideAlignment::Start) => main.min_x(),
            (Side::Top | Side::Bottom, SideAlignment::Center) => {
                main.center().x() - side.width() / 2.0
            }
        };
        let y = match (config.side(), config.alignment()) {
            (Side::Top, _) => main.min_y() - config.gap_height() - side.height(),
            (Side::Bottom, _) => main.max_y() + config.gap_height(),
            (Side::Left | Side::Right, SideAlignment::Start) => main.min_y(),
            (Side::Left | Side::Right, SideAlignment::Center) => {
                main.center().y() - side.height() / 2.0
            }
        };

        let delta = Point::new(x, y).sub_point(side.min_point());
        collection.translate_items(side_items, delta);
    }
}

impl LayoutEngine for CompositeLayout {
    fn arrange(&mut self, collection: &mut Collection, items: &[ItemId]) -> Bounds {
        let mut main_items = Vec::new();
        let mut side_items = Vec::new();
        for &id in items {
            if !collection.item(id).is_positioned() {
                continue;
            }
            if self.is_main(collection, id) {
                main_items.push(id);
            } else {
                side_items.push(id);
            }
        }

        // Links straddling the split have disagreeing endpoints and belong
        // to neither partition; they simply do not constrain the layout.
        let straddling = collection
            .links()
            .filter(|(_, link)| {
                main_items.contains(&link.source()) != main_items.contains(&link.target())
            })
            .count();
        if straddling > 0 {
            debug!(straddling; "Links across the main/side split are ignored");
        }

        if !main_items.is_empty() {
            self.arrange_components(collection, &main_items);
        }
        let main_bounds = collection.bounds_of(&main_items);

        if !side_items.is_empty() {
            self.side.arrange(collection, &side_items);
            self.place_side_block(collection, &side_items, main_bounds);
        }
        let side_bounds = collection.bounds_of(&side_items);

        if main_items.is_empty() {
            side_bounds
        } else if side_items.is_empty() {
            main_bounds
        } else {
            main_bounds.merge(&side_bounds).normalize()
        }
    }
}
