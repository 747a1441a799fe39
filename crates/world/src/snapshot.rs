//! In-memory world snapshot.
//!
//! The salvage pass never touches the game's own save format; it operates
//! on this snapshot view, which the orchestrator loads and, when asked to
//! apply changes, writes back out as JSON.

use crate::estimator::Position;
use crate::inventory::Inventory;
use crate::loot::{LootFilter, Species};
use deathsalvage_core::{ItemCatalog, ItemStack, PlayerXpState};
use serde::{Deserialize, Serialize};

/// A dropped item lying in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppedItem {
    /// Where the item lies.
    pub pos: Position,
    /// Ticks since the entity spawned.
    #[serde(default)]
    pub age: u32,
    /// The item itself (no slot assignment while in the world).
    pub stack: ItemStack,
}

/// An experience orb waiting to be absorbed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XpOrb {
    /// Where the orb floats.
    pub pos: Position,
    /// Ticks since the entity spawned.
    #[serde(default)]
    pub age: u32,
    /// Experience points the orb is worth.
    pub value: u32,
}

/// A mob, possibly wearing picked-up equipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mob {
    /// Where the mob stands.
    pub pos: Position,
    /// Species, which selects the loot rules.
    pub species: Species,
    /// Whether this mob picks up dropped items at all.
    #[serde(default)]
    pub can_pick_up_loot: bool,
    /// Equipment slots: held item first, then armor. Blank slots are `None`.
    #[serde(default)]
    pub equipment: Vec<Option<ItemStack>>,
}

impl Mob {
    /// Equipment pieces worth salvaging, as `(equipment index, stack)`.
    ///
    /// Mobs that cannot pick up loot never offer anything; blank slots are
    /// skipped; the rest is up to the filter.
    pub fn interesting_equipment<'a>(
        &'a self,
        filter: &LootFilter,
        catalog: &ItemCatalog,
    ) -> Vec<(usize, &'a ItemStack)> {
        if !self.can_pick_up_loot {
            return Vec::new();
        }
        self.equipment
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|stack| (index, stack)))
            .filter(|(_, stack)| filter.is_interesting(self.species, stack, catalog))
            .collect()
    }
}

/// Anything the salvage pass can encounter in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
    /// A dropped item.
    Item(DroppedItem),
    /// An experience orb.
    XpOrb(XpOrb),
    /// A mob with equipment slots.
    Mob(Mob),
}

impl Entity {
    /// World position of the entity.
    pub fn pos(&self) -> Position {
        match self {
            Entity::Item(item) => item.pos,
            Entity::XpOrb(orb) => orb.pos,
            Entity::Mob(mob) => mob.pos,
        }
    }
}

/// The player record the salvage pass mutates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Player name, for report lines.
    pub name: String,
    /// Last known position.
    pub pos: Position,
    /// Current health; 0 while dead.
    pub health: f32,
    /// Ticks spent dead; positive while the death screen is up.
    #[serde(default)]
    pub death_time: u32,
    /// Inventory to reconcile recovered items into.
    pub inventory: Inventory,
    /// Experience state fed by absorbed orbs.
    #[serde(default)]
    pub xp: PlayerXpState,
}

impl PlayerState {
    /// Whether the player is dead right now (inventory clears on respawn,
    /// so salvaging would be lost).
    pub fn is_dead(&self) -> bool {
        self.health <= 0.0 && self.death_time > 0
    }
}

/// A loaded world: one player plus the entities of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// World name, for report lines.
    pub name: String,
    /// The player being salvaged for.
    pub player: PlayerState,
    /// Entities found in the scanned area.
    pub entities: Vec<Entity>,
}
