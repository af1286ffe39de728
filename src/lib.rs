//! Trellis - a constrained graph layout engine for diagram hosts.
//!
//! Trellis computes positions for abstract diagram items; it renders
//! nothing and owns no presentation state. Hosts build a [`Collection`] of
//! items and links, run one of the engines, and read the repositioned
//! items back.
//!
//! Three constrained engines sit on a shared layered driver:
//!
//! - [`layout::SwimLaneLayout`] keeps vertexes inside named lane corridors
//!   while minimizing edge crossings within them.
//! - [`layout::CompositeLayout`] partitions a collection into connected
//!   components, lays each out independently, arranges the component
//!   blocks, and parks filtered-out items beside the result.
//! - [`layout::GenogramLayout`] fuses paired items into atomic vertexes so
//!   generation constraints fall out of ordinary layering.
//!
//! # Examples
//!
//! ```rust
//! use trellis::{Collection, Item, LinkKind};
//! use trellis::config::CompositeConfig;
//! use trellis::geometry::Size;
//! use trellis::layout::{CompositeLayout, LayoutEngine};
//!
//! let mut collection = Collection::new();
//! let a = collection.add_item(Item::new(Size::new(40.0, 20.0)));
//! let b = collection.add_item(Item::new(Size::new(40.0, 20.0)));
//! collection.add_link(a, b, LinkKind::Directed).expect("endpoints exist");
//!
//! let mut layout = CompositeLayout::new(CompositeConfig::default());
//! let bounds = layout.arrange(&mut collection, &[a, b]);
//! assert!(bounds.width() > 0.0);
//! ```

pub mod collection;
pub mod config;
pub mod geometry;
pub mod layout;
pub mod network;

mod error;

pub use collection::{Collection, Item, ItemId, Link, LinkId, LinkKind, Sex};
pub use error::LayoutError;
