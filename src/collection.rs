//! Host-facing diagram model.
//!
//! A [`Collection`] owns the items and links a host hands to a layout
//! engine. Items carry the only state the engines ever read back from the
//! host: a bounding rectangle, a visibility flag, and the optional lane and
//! sex attributes used by the constrained layouts. The single externally
//! observable side effect of a layout run is the repositioning of items.

use crate::error::LayoutError;
use crate::geometry::{Bounds, Point, Size};

/// Identifies an [`Item`] within its [`Collection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub(crate) usize);

/// Identifies a [`Link`] within its [`Collection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkId(pub(crate) usize);

/// Sex discriminator used by the genogram layout to order fused pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
}

/// The role a link plays during network construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LinkKind {
    /// An ordinary directed relation (including parent-to-child links).
    #[default]
    Directed,
    /// A pairing relation fused into a single vertex by the genogram
    /// builder. Other layouts treat it as an ordinary edge.
    Pairing,
}

/// A diagram node owned by the host.
#[derive(Debug, Clone)]
pub struct Item {
    size: Size,
    position: Point,
    visible: bool,
    lane: Option<String>,
    sex: Option<Sex>,
}

impl Item {
    /// Create a visible item of the given size, positioned at the origin.
    pub fn new(size: Size) -> Self {
        Self {
            size,
            position: Point::default(),
            visible: true,
            lane: None,
            sex: None,
        }
    }

    /// Set the initial position (builder style).
    pub fn with_position(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    /// Assign the item to a named lane (builder style).
    pub fn with_lane(mut self, lane: impl Into<String>) -> Self {
        self.lane = Some(lane.into());
        self
    }

    /// Set the sex discriminator (builder style).
    pub fn with_sex(mut self, sex: Sex) -> Self {
        self.sex = Some(sex);
        self
    }

    /// Mark the item as hidden (builder style). Hidden items never receive
    /// a vertex and are left untouched by every engine.
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Returns the item's size.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Returns the item's center position.
    pub fn position(&self) -> Point {
        self.position
    }

    /// Returns the item's bounding rectangle, centered on its position.
    pub fn bounds(&self) -> Bounds {
        self.position.to_bounds(self.size)
    }

    /// Whether the host considers this item placeable.
    pub fn is_positioned(&self) -> bool {
        self.visible && !self.position.is_nan()
    }

    /// Returns the item's lane attribute, if any.
    pub fn lane(&self) -> Option<&str> {
        self.lane.as_deref()
    }

    /// Returns the item's sex discriminator, if any.
    pub fn sex(&self) -> Option<Sex> {
        self.sex
    }

    /// Move the item's center to a new position.
    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }
}

/// A directed relation between two items.
#[derive(Debug, Clone)]
pub struct Link {
    source: ItemId,
    target: ItemId,
    kind: LinkKind,
}

impl Link {
    pub fn source(&self) -> ItemId {
        self.source
    }

    pub fn target(&self) -> ItemId {
        self.target
    }

    pub fn kind(&self) -> LinkKind {
        self.kind
    }

    /// Whether the link touches the given item on either end.
    pub fn touches(&self, item: ItemId) -> bool {
        self.source == item || self.target == item
    }
}

/// The set of items and links a layout invocation operates on.
#[derive(Debug, Default)]
pub struct Collection {
    items: Vec<Item>,
    links: Vec<Link>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item and return its id.
    pub fn add_item(&mut self, item: Item) -> ItemId {
        let id = ItemId(self.items.len());
        self.items.push(item);
        id
    }

    /// Add a link between two existing items.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Graph`] when either endpoint id does not name
    /// an item in this collection.
    pub fn add_link(
        &mut self,
        source: ItemId,
        target: ItemId,
        kind: LinkKind,
    ) -> Result<LinkId, LayoutError> {
        let count = self.items.len();
        if source.0 >= count || target.0 >= count {
            return Err(LayoutError::Graph(format!(
                "link endpoints {:?} -> {:?} out of range for {count} items",
                source, target
            )));
        }
        let id = LinkId(self.links.len());
        self.links.push(Link {
            source,
            target,
            kind,
        });
        Ok(id)
    }

    /// Returns the number of items in the collection.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns a reference to the item with the given id.
    pub fn item(&self, id: ItemId) -> &Item {
        &self.items[id.0]
    }

    /// Returns a mutable reference to the item with the given id.
    pub fn item_mut(&mut self, id: ItemId) -> &mut Item {
        &mut self.items[id.0]
    }

    /// Returns an iterator over all item ids in insertion order.
    pub fn item_ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        (0..self.items.len()).map(ItemId)
    }

    /// Returns a reference to the link with the given id.
    pub fn link(&self, id: LinkId) -> &Link {
        &self.links[id.0]
    }

    /// Returns an iterator over all link ids in insertion order.
    pub fn link_ids(&self) -> impl Iterator<Item = LinkId> + '_ {
        (0..self.links.len()).map(LinkId)
    }

    /// Returns an iterator over all links in insertion order.
    pub fn links(&self) -> impl Iterator<Item = (LinkId, &Link)> + '_ {
        self.links.iter().enumerate().map(|(i, l)| (LinkId(i), l))
    }

    /// Counts the links touching the given item.
    pub fn link_count_of(&self, item: ItemId) -> usize {
        self.links.iter().filter(|l| l.touches(item)).count()
    }

    /// Returns the merged bounds of the positioned items among `ids`,
    /// normalized so empty or degenerate input produces a zero rectangle
    /// at the origin.
    pub fn bounds_of(&self, ids: &[ItemId]) -> Bounds {
        let mut merged: Option<Bounds> = None;
        for &id in ids {
            let item = self.item(id);
            if !item.is_positioned() {
                continue;
            }
            let bounds = item.bounds();
            merged = Some(match merged {
                Some(acc) => acc.merge(&bounds),
                None => bounds,
            });
        }
        merged.unwrap_or_default().normalize()
    }

    /// Translate every item in `ids` by the given delta.
    pub fn translate_items(&mut self, ids: &[ItemId], delta: Point) {
        for &id in ids {
            let position = self.items[id.0].position.add_point(delta);
            self.items[id.0].set_position(position);
        }
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_add_link_rejects_unknown_endpoints() {
        let mut collection = Collection::new();
        let a = collection.add_item(Item::new(Size::new(10.0, 10.0)));

        let result = collection.add_link(a, ItemId(7), LinkKind::Directed);
        assert!(result.is_err());
    }

    #[test]
    fn test_bounds_of_skips_hidden_items() {
        let mut collection = Collection::new();
        let a = collection.add_item(Item::new(Size::new(10.0, 10.0)));
        let b = collection.add_item(
            Item::new(Size::new(100.0, 100.0))
                .with_position(Point::new(500.0, 500.0))
                .hidden(),
        );

        let bounds = collection.bounds_of(&[a, b]);
        assert_approx_eq!(f32, bounds.width(), 10.0);
        assert_approx_eq!(f32, bounds.max_x(), 5.0);
    }

    #[test]
    fn test_bounds_of_empty_set_is_zero_rectangle() {
        let collection = Collection::new();
        let bounds = collection.bounds_of(&[]);

        assert_approx_eq!(f32, bounds.width(), 0.0);
        assert_approx_eq!(f32, bounds.min_x(), 0.0);
    }

    #[test]
    fn test_translate_items_moves_centers() {
        let mut collection = Collection::new();
        let a = collection.add_item(Item::new(Size::new(4.0, 4.0)));

        collection.translate_items(&[a], Point::new(3.0, -2.0));

        assert_approx_eq!(f32, collection.item(a).position().x(), 3.0);
        assert_approx_eq!(f32, collection.item(a).position().y(), -2.0);
    }
}
