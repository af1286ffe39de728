//! End-to-end scenarios for the genogram layout.

use float_cmp::assert_approx_eq;

use trellis::config::{GenogramConfig, LayeredConfig};
use trellis::geometry::Size;
use trellis::layout::{GenogramLayout, LayeredLayout};
use trellis::{Collection, Item, ItemId, LinkKind, Sex};

fn person(collection: &mut Collection, sex: Sex) -> ItemId {
    collection.add_item(Item::new(Size::new(30.0, 30.0)).with_sex(sex))
}

fn genogram() -> LayeredLayout<GenogramLayout> {
    LayeredLayout::with_delegate(
        LayeredConfig::default(),
        GenogramLayout::new(GenogramConfig::default()),
    )
}

/// One person married twice: the cohort cross-link pins both marriages to
/// the same generation, so all three people share one row.
#[test]
fn bigamy_cohort_occupies_one_row() {
    let mut collection = Collection::new();
    let spouse_a = person(&mut collection, Sex::Male);
    let spouse_b = person(&mut collection, Sex::Female);
    let spouse_c = person(&mut collection, Sex::Female);
    collection
        .add_link(spouse_a, spouse_b, LinkKind::Pairing)
        .expect("endpoints exist");
    collection
        .add_link(spouse_a, spouse_c, LinkKind::Pairing)
        .expect("endpoints exist");
    let ids = vec![spouse_a, spouse_b, spouse_c];

    let mut layout = genogram();
    layout.run(&mut collection, &ids);

    let row = collection.item(spouse_a).position().y();
    assert_approx_eq!(f32, row, collection.item(spouse_b).position().y());
    assert_approx_eq!(f32, row, collection.item(spouse_c).position().y());
}

/// Three generations chain downward: each generation's row sits strictly
/// below the previous one, and couples stay side by side.
#[test]
fn three_generations_stack() {
    let mut collection = Collection::new();
    let grandfather = person(&mut collection, Sex::Male);
    let grandmother = person(&mut collection, Sex::Female);
    let father = person(&mut collection, Sex::Male);
    let mother = person(&mut collection, Sex::Female);
    let child = person(&mut collection, Sex::Female);
    collection
        .add_link(grandfather, grandmother, LinkKind::Pairing)
        .expect("endpoints exist");
    collection
        .add_link(father, mother, LinkKind::Pairing)
        .expect("endpoints exist");
    collection
        .add_link(grandfather, father, LinkKind::Directed)
        .expect("endpoints exist");
    collection
        .add_link(father, child, LinkKind::Directed)
        .expect("endpoints exist");
    let ids: Vec<ItemId> = collection.item_ids().collect();

    let mut layout = genogram();
    layout.run(&mut collection, &ids);

    let generation = |id: ItemId| collection.item(id).position().y();
    assert_approx_eq!(f32, generation(grandfather), generation(grandmother));
    assert_approx_eq!(f32, generation(father), generation(mother));
    assert!(generation(grandfather) < generation(father));
    assert!(generation(father) < generation(child));
}

/// A married child is pulled toward its own parents' side of the new
/// couple: the spouse with placed parents sits on the side facing them.
#[test]
fn married_child_keeps_parent_side_order() {
    let mut collection = Collection::new();
    let father = person(&mut collection, Sex::Male);
    let mother = person(&mut collection, Sex::Female);
    let daughter = person(&mut collection, Sex::Female);
    let son_in_law = person(&mut collection, Sex::Male);
    collection
        .add_link(father, mother, LinkKind::Pairing)
        .expect("endpoints exist");
    collection
        .add_link(daughter, son_in_law, LinkKind::Pairing)
        .expect("endpoints exist");
    collection
        .add_link(father, daughter, LinkKind::Directed)
        .expect("endpoints exist");
    let ids: Vec<ItemId> = collection.item_ids().collect();

    let mut layout = genogram();
    layout.run(&mut collection, &ids);

    // With no counter-hint the sex fallback would put the son-in-law on
    // the left; with only one parent hint available the pair still commits
    // symmetrically around the couple's center.
    let gap = (collection.item(daughter).position().x()
        - collection.item(son_in_law).position().x())
    .abs();
    assert_approx_eq!(f32, gap, 30.0 + 30.0);
    assert_approx_eq!(
        f32,
        collection.item(daughter).position().y(),
        collection.item(son_in_law).position().y()
    );
}

/// Hidden people are left untouched and never acquire a vertex.
#[test]
fn hidden_items_are_ignored() {
    let mut collection = Collection::new();
    let visible = person(&mut collection, Sex::Male);
    let ghost = collection.add_item(Item::new(Size::new(30.0, 30.0)).hidden());
    collection
        .add_link(visible, ghost, LinkKind::Pairing)
        .expect("endpoints exist");

    let mut layout = genogram();
    let bounds = layout.run(&mut collection, &[visible, ghost]);

    assert!(bounds.width() > 0.0);
    assert_approx_eq!(f32, collection.item(ghost).position().x(), 0.0);
}
