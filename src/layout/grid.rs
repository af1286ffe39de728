//! Row-wrapping grid layout.
//!
//! The default sub-layout for the composite orchestrator's primary,
//! arranging, and side slots. Items are placed row-major in id order,
//! wrapping after a configured count; rows are as tall as their tallest
//! member. Deterministic by construction.

use crate::collection::{Collection, ItemId};
use crate::config::GridConfig;
use crate::geometry::{Bounds, Point};
use crate::layout::LayoutEngine;

#[derive(Debug, Default)]
pub struct GridLayout {
    config: GridConfig,
}

impl GridLayout {
    pub fn new(config: GridConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }
}

impl LayoutEngine for GridLayout {
    fn arrange(&mut self, collection: &mut Collection, items: &[ItemId]) -> Bounds {
        let mut placeable: Vec<ItemId> = items
            .iter()
            .copied()
            .filter(|&id| collection.item(id).is_positioned())
            .collect();
        placeable.sort();

        let mut x = 0.0f32;
        let mut y = 0.0f32;
        let mut row_height = 0.0f32;
        for (slot, &id) in placeable.iter().enumerate() {
            if slot > 0 && slot % self.config.wrap_count() == 0 {
                x = 0.0;
                y += row_height + self.config.spacing_height();
                row_height = 0.0;
            }
            let size = collection.item(id).size();
            collection
                .item_mut(id)
                .set_position(Point::new(x + size.width() / 2.0, y + size.height() / 2.0));
            x += size.width() + self.config.spacing_width();
            row_height = row_height.max(size.height());
        }

        collection.bounds_of(&placeable)
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;
    use crate::collection::Item;
    use crate::geometry::Size;

    fn items(collection: &mut Collection, count: usize) -> Vec<ItemId> {
        (0..count)
            .map(|_| collection.add_item(Item::new(Size::new(30.0, 20.0))))
            .collect()
    }

    #[test]
    fn test_items_wrap_after_configured_count() {
        let mut collection = Collection::new();
        let ids = items(&mut collection, 5);
        let mut config = GridConfig::default();
        config.set_wrap_count(2).unwrap();
        let mut grid = GridLayout::new(config);

        grid.arrange(&mut collection, &ids);

        // Third row starts for the fifth item.
        let first = collection.item(ids[0]).position();
        let fifth = collection.item(ids[4]).position();
        assert_approx_eq!(f32, first.x(), fifth.x());
        assert!(fifth.y() > first.y());
    }

    #[test]
    fn test_rows_respect_spacing() {
        let mut collection = Collection::new();
        let ids = items(&mut collection, 2);
        let mut config = GridConfig::default();
        config.set_wrap_count(1).unwrap();
        config.set_spacing(0.0, 15.0).unwrap();
        let mut grid = GridLayout::new(config);

        grid.arrange(&mut collection, &ids);

        let top = collection.item(ids[0]).bounds();
        let below = collection.item(ids[1]).bounds();
        assert_approx_eq!(f32, below.min_y() - top.max_y(), 15.0);
    }

    #[test]
    fn test_result_is_deterministic_for_shuffled_input() {
        let mut collection = Collection::new();
        let ids = items(&mut collection, 4);
        let shuffled = vec![ids[2], ids[0], ids[3], ids[1]];
        let mut grid = GridLayout::new(GridConfig::default());

        grid.arrange(&mut collection, &ids);
        let reference: Vec<Point> = ids.iter().map(|&id| collection.item(id).position()).collect();

        grid.arrange(&mut collection, &shuffled);
        let repeated: Vec<Point> = ids.iter().map(|&id| collection.item(id).position()).collect();

        assert_eq!(reference, repeated);
    }
}
