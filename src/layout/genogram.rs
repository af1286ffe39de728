//! Paired-vertex network building for relationship diagrams.
//!
//! [`GenogramLayout`] customizes the layered driver's network construction
//! so pairing constraints cost the layering algorithm nothing: a pairing
//! link and its two items fuse into one wide relation vertex, cohorts of
//! items chained through multiple pairings are pinned to one layer by a
//! cross-linked dummy, and parent links are retargeted to the parent's
//! relation vertex. The commit step splits each relation vertex back into
//! its two items, ordered to keep each one near its own parents.

use std::collections::{HashMap, HashSet};

use log::{debug, trace};

use crate::collection::{Collection, ItemId, LinkId, LinkKind, Sex};
use crate::config::{GenogramConfig, LayeredConfig};
use crate::geometry::{Point, Size};
use crate::layout::layered::{LayerGrid, LayeredDelegate};
use crate::network::{Network, Vertex, VertexId};

/// Layered-layout delegate for genograms (family-relationship diagrams).
///
/// Use through the layered driver:
/// [`LayeredLayout::with_delegate`](crate::layout::LayeredLayout::with_delegate).
pub struct GenogramLayout {
    config: GenogramConfig,
    cohorts: Vec<Vec<VertexId>>,
}

impl GenogramLayout {
    pub fn new(config: GenogramConfig) -> Self {
        Self {
            config,
            cohorts: Vec::new(),
        }
    }

    pub fn config(&self) -> &GenogramConfig {
        &self.config
    }

    /// The committed x-center of the relation (or own) vertex of the
    /// parent that links to `spouse` through `vertex`. Only direct
    /// single-layer parent edges carry the link reference needed to tell
    /// the two spouses apart; chains resolve to no hint.
    fn parent_center_x(
        &self,
        collection: &Collection,
        network: &Network,
        vertex: VertexId,
        spouse: ItemId,
    ) -> Option<f32> {
        for edge in network.in_edges(vertex) {
            let Some(link) = network.edge(edge).link() else {
                continue;
            };
            if collection.link(link).target() == spouse {
                let (parent, _) = network.edge_endpoints(edge);
                return Some(network.vertex(parent).center().x());
            }
        }
        None
    }

    /// Decide which spouse sits left of the relation vertex's center:
    /// nearer its own parents when both sides have placed parents,
    /// otherwise male first, otherwise input order.
    fn ordered_pair(
        &self,
        collection: &Collection,
        network: &Network,
        vertex: VertexId,
        first: ItemId,
        second: ItemId,
    ) -> (ItemId, ItemId) {
        let first_hint = self.parent_center_x(collection, network, vertex, first);
        let second_hint = self.parent_center_x(collection, network, vertex, second);
        if let (Some(a), Some(b)) = (first_hint, second_hint) {
            if a != b {
                return if a < b { (first, second) } else { (second, first) };
            }
        }
        let first_sex = collection.item(first).sex();
        let second_sex = collection.item(second).sex();
        if first_sex == Some(Sex::Female) && second_sex == Some(Sex::Male) {
            return (second, first);
        }
        (first, second)
    }

    /// Nudge each only child laterally under its parents' relation vertex
    /// when no other vertex in its layer is in the way.
    fn align_only_children(
        &self,
        collection: &mut Collection,
        network: &mut Network,
        grid: &LayerGrid,
    ) {
        let parents: Vec<VertexId> = network
            .vertex_ids()
            .filter(|&id| network.vertex(id).pair().is_some())
            .collect();

        for parent in parents {
            let mut children: Vec<VertexId> = Vec::new();
            let mut split_chains = false;
            for edge in network.out_edges(parent).collect::<Vec<_>>() {
                let (_, child) = network.edge_endpoints(edge);
                if network.edge(edge).link().is_some() {
                    children.push(child);
                } else if network.vertex(child).is_dummy() {
                    // A child link routed through dummy layers; the child
                    // count is unknowable here, so leave this family be.
                    split_chains = true;
                }
            }
            if split_chains || children.len() != 1 {
                continue;
            }
            let child = children[0];

            let target_x = network.vertex(parent).center().x();
            let child_vertex = network.vertex(child);
            let delta = target_x - child_vertex.center().x();
            if delta == 0.0 {
                continue;
            }

            let moved = Point::new(target_x, child_vertex.center().y())
                .to_bounds(Size::new(child_vertex.width(), child_vertex.height()));
            let layer = child_vertex.layer() as usize;
            let collides = grid.layer(layer).iter().any(|&other| {
                if other == child {
                    return false;
                }
                let sibling = network.vertex(other);
                moved.intersects(
                    &sibling
                        .center()
                        .to_bounds(Size::new(sibling.width(), sibling.height())),
                )
            });
            if collides {
                continue;
            }

            let shift = Point::new(delta, 0.0);
            let vertex = network.vertex_mut(child);
            vertex.center = vertex.center.add_point(shift);
            let vertex = network.vertex(child);
            match (vertex.item(), vertex.pair()) {
                (Some(item), _) => collection.translate_items(&[item], shift),
                (_, Some((a, b))) => collection.translate_items(&[a, b], shift),
                _ => {}
            }
            trace!(delta; "Aligned an only child under its parents");
        }
    }
}

impl LayeredDelegate for GenogramLayout {
    /// Build the paired-vertex network: one relation vertex per pairing
    /// link, own vertexes for unpaired items, a cross-linked dummy per
    /// multi-pairing cohort, and parent links retargeted through the
    /// item-to-vertex map.
    fn make_network(&mut self, collection: &Collection, items: &[ItemId]) -> Network {
        let mut network = Network::new();
        self.cohorts.clear();

        let included: HashSet<ItemId> = items
            .iter()
            .copied()
            .filter(|&id| collection.item(id).is_positioned())
            .collect();

        // Pairing links with both ends present, and each item's pairings.
        let mut pairings: Vec<(LinkId, ItemId, ItemId)> = Vec::new();
        let mut partners: HashMap<ItemId, Vec<(LinkId, ItemId)>> = HashMap::new();
        for (link_id, link) in collection.links() {
            if link.kind() != LinkKind::Pairing {
                continue;
            }
            let (a, b) = (link.source(), link.target());
            if !included.contains(&a) || !included.contains(&b) || a == b {
                continue;
            }
            pairings.push((link_id, a, b));
            partners.entry(a).or_default().push((link_id, b));
            partners.entry(b).or_default().push((link_id, a));
        }

        // One relation vertex per pairing, sized to hold both items plus
        // the spouse gap so layering treats the couple as one box.
        let mut relation_vertex: HashMap<LinkId, VertexId> = HashMap::new();
        for &(link_id, a, b) in &pairings {
            let size_a = collection.item(a).size();
            let size_b = collection.item(b).size();
            let fused = Size::new(
                size_a.width() + self.config.spouse_spacing() + size_b.width(),
                size_a.height().max(size_b.height()),
            );
            relation_vertex.insert(link_id, network.add_vertex(Vertex::for_pair(a, b, fused)));
        }

        // Unpaired items keep their own vertex.
        for &id in items {
            if included.contains(&id) && !partners.contains_key(&id) {
                network.add_vertex(Vertex::for_item(id, collection.item(id).size()));
            }
        }

        // Cohorts: transitive closure over pairings. A cohort containing a
        // multi-paired item gets a dummy cross-linked to every relation
        // vertex, pinning them to a common generation.
        let mut visited: HashSet<ItemId> = HashSet::new();
        for &(_, seed, _) in &pairings {
            if visited.contains(&seed) {
                continue;
            }
            let mut members = vec![seed];
            let mut cohort_links: Vec<LinkId> = Vec::new();
            let mut stack = vec![seed];
            visited.insert(seed);
            let mut multi = false;
            while let Some(item) = stack.pop() {
                let own = &partners[&item];
                multi = multi || own.len() > 1;
                for &(link_id, partner) in own {
                    if !cohort_links.contains(&link_id) {
                        cohort_links.push(link_id);
                    }
                    if visited.insert(partner) {
                        members.push(partner);
                        stack.push(partner);
                    }
                }
            }
            if !multi {
                continue;
            }
            let relations: Vec<VertexId> = cohort_links
                .iter()
                .map(|link_id| relation_vertex[link_id])
                .collect();
            let dummy = network.add_vertex(Vertex::dummy());
            for &relation in &relations {
                network.add_edge(dummy, relation, None);
            }
            debug!(members = members.len(); "Merged a multi-pairing cohort");
            self.cohorts.push(relations);
        }

        // Parent links land on the parent's relation vertex (the item map
        // resolves a married item to its first marriage) or own vertex.
        for (link_id, link) in collection.links() {
            if link.kind() != LinkKind::Directed {
                continue;
            }
            let from = network.find_vertex(link.source());
            let to = network.find_vertex(link.target());
            if let (Some(from), Some(to)) = (from, to) {
                if from != to {
                    network.add_edge(from, to, Some(link_id));
                }
            }
        }

        network
    }

    /// Pin every cohort's relation vertexes to the deepest layer among
    /// them. Reports a change so the driver re-relaxes child layers.
    fn constrain_layers(&mut self, network: &mut Network) -> bool {
        let mut changed = false;
        for cohort in &self.cohorts {
            let target = cohort
                .iter()
                .map(|&id| network.vertex(id).layer())
                .max()
                .unwrap_or(0);
            for &id in cohort {
                if network.vertex(id).layer() != target {
                    network.vertex_mut(id).layer = target;
                    changed = true;
                }
            }
        }
        changed
    }

    /// Split each relation vertex into its two items, placed symmetrically
    /// around the vertex center, then align only children.
    fn commit(
        &mut self,
        _config: &LayeredConfig,
        collection: &mut Collection,
        network: &mut Network,
        grid: &LayerGrid,
    ) {
        let mut placed: HashSet<ItemId> = HashSet::new();
        for layer in 0..grid.layer_count() {
            for &id in grid.layer(layer) {
                let Some((first, second)) = network.vertex(id).pair() else {
                    continue;
                };
                let center = network.vertex(id).center();
                let (left, right) = self.ordered_pair(collection, network, id, first, second);

                let left_size = collection.item(left).size();
                let right_size = collection.item(right).size();
                let total =
                    left_size.width() + self.config.spouse_spacing() + right_size.width();
                if placed.insert(left) {
                    collection.item_mut(left).set_position(Point::new(
                        center.x() - total / 2.0 + left_size.width() / 2.0,
                        center.y(),
                    ));
                }
                if placed.insert(right) {
                    collection.item_mut(right).set_position(Point::new(
                        center.x() + total / 2.0 - right_size.width() / 2.0,
                        center.y(),
                    ));
                }
            }
        }

        self.align_only_children(collection, network, grid);
        self.cohorts.clear();
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;
    use crate::collection::Item;
    use crate::config::LayeredConfig;
    use crate::layout::layered::LayeredLayout;

    fn person(collection: &mut Collection, sex: Sex) -> ItemId {
        collection.add_item(Item::new(Size::new(30.0, 30.0)).with_sex(sex))
    }

    fn genogram() -> LayeredLayout<GenogramLayout> {
        LayeredLayout::with_delegate(
            LayeredConfig::default(),
            GenogramLayout::new(GenogramConfig::default()),
        )
    }

    #[test]
    fn test_couple_fuses_into_one_vertex() {
        let mut collection = Collection::new();
        let husband = person(&mut collection, Sex::Male);
        let wife = person(&mut collection, Sex::Female);
        collection.add_link(husband, wife, LinkKind::Pairing).unwrap();

        let mut delegate = GenogramLayout::new(GenogramConfig::default());
        let network = delegate.make_network(&collection, &[husband, wife]);

        assert_eq!(network.vertex_count(), 1);
        let vertex = network.vertex(network.vertex_ids().next().unwrap());
        assert_eq!(vertex.pair(), Some((husband, wife)));
        assert_approx_eq!(f32, vertex.width(), 30.0 + 30.0 + 30.0);
    }

    #[test]
    fn test_spouses_sit_symmetrically_with_male_left() {
        let mut collection = Collection::new();
        let wife = person(&mut collection, Sex::Female);
        let husband = person(&mut collection, Sex::Male);
        collection.add_link(wife, husband, LinkKind::Pairing).unwrap();

        let mut layout = genogram();
        layout.run(&mut collection, &[wife, husband]);

        let wife_position = collection.item(wife).position();
        let husband_position = collection.item(husband).position();
        assert!(husband_position.x() < wife_position.x());
        assert_approx_eq!(f32, husband_position.y(), wife_position.y());
        // The spouse gap separates their bounds.
        let gap = collection.item(wife).bounds().min_x() - collection.item(husband).bounds().max_x();
        assert_approx_eq!(f32, gap, 30.0);
    }

    #[test]
    fn test_bigamy_cohort_shares_one_generation() {
        let mut collection = Collection::new();
        let person_a = person(&mut collection, Sex::Male);
        let person_b = person(&mut collection, Sex::Female);
        let person_c = person(&mut collection, Sex::Female);
        collection.add_link(person_a, person_b, LinkKind::Pairing).unwrap();
        collection.add_link(person_a, person_c, LinkKind::Pairing).unwrap();
        let ids = vec![person_a, person_b, person_c];

        let mut delegate = GenogramLayout::new(GenogramConfig::default());
        let network = delegate.make_network(&collection, &ids);

        // Two relation vertexes plus the cohort's cross-link dummy.
        assert_eq!(network.vertex_count(), 3);
        let dummy = network
            .vertex_ids()
            .find(|&id| network.vertex(id).is_dummy())
            .expect("cohort dummy exists");
        assert_eq!(network.successors(dummy).count(), 2);

        // End to end, every cohort member commits to the same row.
        let mut layout = genogram();
        layout.run(&mut collection, &ids);
        let y_a = collection.item(person_a).position().y();
        assert_approx_eq!(f32, y_a, collection.item(person_b).position().y());
        assert_approx_eq!(f32, y_a, collection.item(person_c).position().y());
    }

    #[test]
    fn test_parent_link_is_retargeted_to_relation_vertex() {
        let mut collection = Collection::new();
        let father = person(&mut collection, Sex::Male);
        let mother = person(&mut collection, Sex::Female);
        let child = person(&mut collection, Sex::Female);
        collection.add_link(father, mother, LinkKind::Pairing).unwrap();
        collection.add_link(father, child, LinkKind::Directed).unwrap();
        let ids = vec![father, mother, child];

        let mut delegate = GenogramLayout::new(GenogramConfig::default());
        let network = delegate.make_network(&collection, &ids);

        assert_eq!(network.vertex_count(), 2);
        assert_eq!(network.edge_count(), 1);
        let edge = network.edge_ids().next().unwrap();
        let (from, to) = network.edge_endpoints(edge);
        assert!(network.vertex(from).pair().is_some());
        assert_eq!(network.vertex(to).item(), Some(child));
    }

    #[test]
    fn test_only_child_aligns_under_parents() {
        let mut collection = Collection::new();
        let father = person(&mut collection, Sex::Male);
        let mother = person(&mut collection, Sex::Female);
        let child = person(&mut collection, Sex::Female);
        collection.add_link(father, mother, LinkKind::Pairing).unwrap();
        collection.add_link(father, child, LinkKind::Directed).unwrap();

        let mut layout = genogram();
        layout.run(&mut collection, &[father, mother, child]);

        let parents_center =
            (collection.item(father).position().x() + collection.item(mother).position().x()) / 2.0;
        assert_approx_eq!(f32, collection.item(child).position().x(), parents_center);
        assert!(
            collection.item(child).position().y() > collection.item(father).position().y()
        );
    }

    #[test]
    fn test_unpaired_person_keeps_own_vertex() {
        let mut collection = Collection::new();
        let single = person(&mut collection, Sex::Female);

        let mut delegate = GenogramLayout::new(GenogramConfig::default());
        let network = delegate.make_network(&collection, &[single]);

        assert_eq!(network.vertex_count(), 1);
        let vertex = network.vertex(network.vertex_ids().next().unwrap());
        assert_eq!(vertex.item(), Some(single));
    }
}
