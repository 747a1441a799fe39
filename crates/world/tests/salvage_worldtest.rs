//! End-to-end salvage pass over a synthetic snapshot.
//!
//! Builds a world with a clue cluster around the death site, one far-flung
//! outlier, and a loot-carrying zombie, then checks the estimated position,
//! the recovery results and the final report.

use deathsalvage_core::{ItemCatalog, ItemKey, ItemStack, ItemTag, PlayerXpState};
use deathsalvage_world::{
    salvage, DroppedItem, Entity, Inventory, InventoryLayout, Mob, PlayerState, Position,
    SalvageOptions, Species, WorldSnapshot, XpOrb,
};

fn item_entity(x: f64, z: f64, stack: ItemStack) -> Entity {
    Entity::Item(DroppedItem {
        pos: Position::new(x, z, 64.0),
        age: 80,
        stack,
    })
}

fn player_with(inventory: Inventory) -> PlayerState {
    PlayerState {
        name: "Steve".to_string(),
        pos: Position::new(0.0, 0.0, 64.0),
        health: 20.0,
        death_time: 0,
        inventory,
        xp: PlayerXpState::default(),
    }
}

fn death_scene(catalog: &ItemCatalog) -> WorldSnapshot {
    let named_sword = catalog
        .stack(ItemKey::new("iron_sword"), 1)
        .unwrap()
        .with_tag(ItemTag::named("Vengeance"));
    let zombie = Mob {
        pos: Position::new(102.0, 201.0, 64.0),
        species: Species::Zombie,
        can_pick_up_loot: true,
        equipment: vec![
            None,
            Some(catalog.stack(ItemKey::new("diamond_chestplate"), 1).unwrap()),
            Some(catalog.stack(ItemKey::new("golden_helmet"), 1).unwrap()),
        ],
    };

    // One existing partial stack of dirt in slot 5, everything else free.
    let mut existing_dirt = catalog.stack(ItemKey::new("dirt"), 40).unwrap();
    existing_dirt.slot = Some(5);
    let inventory = Inventory::from_stacks(InventoryLayout::player(), vec![existing_dirt]).unwrap();

    WorldSnapshot {
        name: "hardcore world".to_string(),
        player: player_with(inventory),
        entities: vec![
            item_entity(101.0, 200.0, named_sword),
            item_entity(99.0, 200.0, catalog.stack(ItemKey::new("diamond_sword"), 1).unwrap()),
            item_entity(100.0, 201.0, catalog.stack(ItemKey::new("iron_ingot"), 10).unwrap()),
            item_entity(100.0, 199.0, catalog.stack(ItemKey::new("dirt"), 30).unwrap()),
            Entity::XpOrb(XpOrb {
                pos: Position::new(100.0, 200.0, 64.0),
                age: 80,
                value: 11,
            }),
            Entity::Mob(zombie),
            // A lucky diamond knocked far away; it must not drag the
            // estimate off the cluster and must stay in the world.
            item_entity(400.0, 400.0, catalog.stack(ItemKey::new("diamond"), 1).unwrap()),
        ],
    }
}

#[test]
fn salvage_recovers_the_death_site() {
    let catalog = ItemCatalog::vanilla();
    let mut snapshot = death_scene(&catalog);
    let report = salvage(&mut snapshot, &catalog, &SalvageOptions::default()).unwrap();

    // The estimate lands inside the clue cluster, not near the outlier.
    assert!((report.death_pos.x - 100.0).abs() < 3.0);
    assert!((report.death_pos.z - 200.0).abs() < 3.0);

    // Entity list order drives placement order: the named sword opens slot
    // 0, the diamond sword slot 1, the ingots slot 2; the dirt tops up the
    // existing stack in slot 5 before opening slot 3.
    let inv = &snapshot.player.inventory;
    assert_eq!(inv.get(0).unwrap().display_name(), "Vengeance");
    assert_eq!(inv.get(1).unwrap().key, ItemKey::new("diamond_sword"));
    assert_eq!(inv.get(2).unwrap().count, 10);
    assert_eq!(inv.get(5).unwrap().count, 64);
    assert_eq!(inv.get(3).unwrap().count, 6);

    // The zombie's diamond chestplate goes to its armor slot; its plain
    // golden helmet is not loot and stays equipped.
    assert_eq!(inv.get(102).unwrap().key, ItemKey::new("diamond_chestplate"));
    let Entity::Mob(zombie) = &snapshot.entities[0] else {
        panic!("zombie should remain in the world");
    };
    assert!(zombie.equipment[1].is_none());
    assert!(zombie.equipment[2].is_some());

    // The orb was absorbed: 11 XP crosses the 7-point threshold of level 0.
    assert_eq!(report.orbs_absorbed, 1);
    assert_eq!(report.xp_gained, 11);
    assert_eq!(report.level_before, 0);
    assert_eq!(report.level_after, 1);
    assert_eq!(snapshot.player.xp.total_xp, 11);
    assert_eq!(snapshot.player.xp.score, 11);

    // Four items and one orb left the world; the zombie and the outlier
    // remain.
    assert_eq!(report.entities_removed, 5);
    assert_eq!(snapshot.entities.len(), 2);
    assert!(report.failed.is_empty());

    let Entity::Item(outlier) = &snapshot.entities[1] else {
        panic!("outlier should remain in the world");
    };
    assert_eq!(outlier.stack.key, ItemKey::new("diamond"));
}

#[test]
fn overflow_is_reported_not_fatal() {
    let catalog = ItemCatalog::vanilla();

    // Two general slots: one holds dirt with a little space, the other is
    // blocked by a full stack.
    let mut dirt = catalog.stack(ItemKey::new("dirt"), 60).unwrap();
    dirt.slot = Some(0);
    let mut stone = catalog.stack(ItemKey::new("stone"), 64).unwrap();
    stone.slot = Some(1);
    let inventory =
        Inventory::from_stacks(InventoryLayout::general_only(2), vec![dirt, stone]).unwrap();

    let mut snapshot = WorldSnapshot {
        name: "cramped world".to_string(),
        player: player_with(inventory),
        entities: vec![
            item_entity(0.0, 0.0, catalog.stack(ItemKey::new("dirt"), 30).unwrap()),
            item_entity(1.0, 0.0, catalog.stack(ItemKey::new("diamond_sword"), 1).unwrap()),
        ],
    };

    let options = SalvageOptions {
        death_pos: Some(Position::from_xz(0.0, 0.0)),
        ..SalvageOptions::default()
    };
    let report = salvage(&mut snapshot, &catalog, &options).unwrap();

    // 4 of 30 dirt fit; the rest stays in the world with its count written
    // back. The sword found no slot at all.
    assert_eq!(report.placements.len(), 1);
    assert_eq!(report.failed.get("minecraft:dirt"), Some(&26));
    assert_eq!(report.failed.get("minecraft:diamond_sword"), Some(&1));
    assert_eq!(report.entities_removed, 0);
    assert_eq!(snapshot.entities.len(), 2);

    let Entity::Item(leftover) = &snapshot.entities[0] else {
        panic!("partially recovered item should remain");
    };
    assert_eq!(leftover.stack.count, 26);
    assert_eq!(snapshot.player.inventory.get(0).unwrap().count, 64);
}

#[test]
fn report_serializes_for_tooling() {
    let catalog = ItemCatalog::vanilla();
    let mut snapshot = death_scene(&catalog);
    let report = salvage(&mut snapshot, &catalog, &SalvageOptions::default()).unwrap();
    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("death_pos"));

    // The mutated snapshot still round-trips, so --apply can persist it.
    let json = serde_json::to_string(&snapshot).unwrap();
    let back: WorldSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back, snapshot);
}
