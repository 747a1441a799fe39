//! The salvage pass: find the death site, then recover what lies there.
//!
//! One synchronous sweep over a [`WorldSnapshot`]: collect weighted clues,
//! estimate the death position (unless given one), then stack dropped items
//! back into the inventory, absorb experience orbs, and reclaim interesting
//! mob equipment. Partial success is the normal case and lands in the
//! report, never in an error.

use crate::estimator::{estimate, EstimateError, EstimatorParams, Position, WeightedPoint};
use crate::inventory::PlaceError;
use crate::loot::LootFilter;
use crate::snapshot::{Entity, WorldSnapshot};
use deathsalvage_core::{ItemCatalog, ItemStack, Material, SlotId, XpRuleset};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Clue weight of a named or enchanted item (a large XP orb's worth).
pub const TAGGED_WEIGHT: f64 = 37.0;
/// Clue weight of a diamond-class item.
pub const DIAMOND_WEIGHT: f64 = 17.0;
/// Clue weight of an iron-class item.
pub const IRON_WEIGHT: f64 = 11.0;

/// Default radius around the death position to recover entities from.
pub const RECOVER_RADIUS: f64 = 10.0;

/// Where to look for clues.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SearchArea {
    /// Scan every entity in the snapshot.
    Everywhere,
    /// Scan a planar radius around a point.
    Around {
        /// Center x.
        x: f64,
        /// Center z.
        z: f64,
        /// Planar radius in blocks.
        radius: f64,
    },
}

impl SearchArea {
    fn contains(&self, pos: &Position) -> bool {
        match self {
            SearchArea::Everywhere => true,
            SearchArea::Around { x, z, radius } => {
                pos.planar_distance(&Position::from_xz(*x, *z)) <= *radius
            }
        }
    }
}

/// Knobs for one salvage pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalvageOptions {
    /// Clue search bounds.
    pub search: SearchArea,
    /// Exact death position override; skips estimation entirely.
    pub death_pos: Option<Position>,
    /// Multiplier applied to absorbed orb values.
    pub xp_factor: u32,
    /// Offer plain mob equipment too (species-innate gear stays excluded).
    pub include_ordinary: bool,
    /// Radius around the death position to recover entities from.
    pub recover_radius: f64,
    /// XP formula version.
    pub ruleset: XpRuleset,
    /// Estimator tuning.
    pub estimator: EstimatorParams,
}

impl Default for SalvageOptions {
    fn default() -> Self {
        Self {
            search: SearchArea::Everywhere,
            death_pos: None,
            xp_factor: 1,
            include_ordinary: false,
            recover_radius: RECOVER_RADIUS,
            ruleset: XpRuleset::Modern,
            estimator: EstimatorParams::default(),
        }
    }
}

/// Why a salvage pass could not run at all.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SalvageError {
    /// The player is still on the death screen; the inventory clears on
    /// respawn, so anything salvaged now would be lost.
    #[error("player is currently dead at {pos}; respawn and save, then re-run with the death coordinates")]
    PlayerDead {
        /// Where the player died.
        pos: Position,
    },
    /// No interesting entity was found to estimate a death position from.
    #[error("could not determine death coordinates: no interesting entities found")]
    NoClues,
    /// Estimation failed.
    #[error(transparent)]
    Estimate(#[from] EstimateError),
    /// A snapshot item violated the stacking preconditions.
    #[error(transparent)]
    Place(#[from] PlaceError),
}

/// One successful placement, for the final report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedItem {
    /// Inventory slot the items landed in.
    pub slot: SlotId,
    /// How many landed there.
    pub count: u32,
    /// Display name of the item.
    pub item: String,
}

/// Outcome of a whole salvage pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalvageReport {
    /// Death position used for recovery.
    pub death_pos: Position,
    /// Everything placed, in placement order.
    pub placements: Vec<PlacedItem>,
    /// Unplaced counts per item id.
    pub failed: BTreeMap<String, u32>,
    /// Number of orbs absorbed.
    pub orbs_absorbed: u32,
    /// Experience points gained (after the xp factor).
    pub xp_gained: u64,
    /// Level before the pass.
    pub level_before: u32,
    /// Level after the pass.
    pub level_after: u32,
    /// Entities removed from the world.
    pub entities_removed: usize,
}

/// Clue weight of an item, if it is interesting enough to be a clue.
///
/// Named and enchanted items weigh like a large XP orb, diamond-class items
/// like a medium one, iron-class like a small one. Common debris carries no
/// information about where the player died.
pub fn clue_weight(stack: &ItemStack, catalog: &ItemCatalog) -> Option<f64> {
    if !stack.is_plain() {
        return Some(TAGGED_WEIGHT);
    }
    match catalog.material(&stack.key) {
        Some(Material::Diamond) => Some(DIAMOND_WEIGHT),
        Some(Material::Iron) => Some(IRON_WEIGHT),
        _ => None,
    }
}

fn collect_clues(
    snapshot: &WorldSnapshot,
    catalog: &ItemCatalog,
    filter: &LootFilter,
    search: &SearchArea,
) -> Vec<WeightedPoint<String>> {
    let mut points = Vec::new();
    for entity in &snapshot.entities {
        let pos = entity.pos();
        if !search.contains(&pos) {
            continue;
        }
        match entity {
            Entity::Item(item) => {
                if let Some(weight) = clue_weight(&item.stack, catalog) {
                    points.push(WeightedPoint::new(pos, weight, item.stack.to_string()));
                }
            }
            Entity::XpOrb(orb) if orb.value > 0 => {
                points.push(WeightedPoint::new(
                    pos,
                    f64::from(orb.value),
                    format!("XP Orb worth {} XP", orb.value),
                ));
            }
            Entity::XpOrb(_) => {}
            Entity::Mob(mob) => {
                for (_, stack) in mob.interesting_equipment(filter, catalog) {
                    if let Some(weight) = clue_weight(stack, catalog) {
                        points.push(WeightedPoint::new(
                            pos,
                            weight,
                            format!("{} equipped with {}", mob.species.display_name(), stack),
                        ));
                    }
                }
            }
        }
    }
    points
}

/// Run one salvage pass over the snapshot, mutating the player's inventory
/// and XP state and the entity list in place. The caller decides whether to
/// persist the mutated snapshot.
pub fn salvage(
    snapshot: &mut WorldSnapshot,
    catalog: &ItemCatalog,
    options: &SalvageOptions,
) -> Result<SalvageReport, SalvageError> {
    if snapshot.player.is_dead() {
        return Err(SalvageError::PlayerDead {
            pos: snapshot.player.pos,
        });
    }

    let filter = LootFilter::new(options.include_ordinary);

    let death_pos = match options.death_pos {
        Some(pos) => {
            tracing::info!(pos = %pos, "death coordinates given explicitly");
            pos
        }
        None => {
            let points = collect_clues(snapshot, catalog, &filter, &options.search);
            if points.is_empty() {
                return Err(SalvageError::NoClues);
            }
            tracing::info!("interesting entities and weights to find death location:");
            for point in &points {
                tracing::info!(pos = %point.pos, weight = point.weight, "  {}", point.payload);
            }
            let pos = estimate(&points, &options.estimator)?;
            tracing::info!(pos = %pos, "estimated death location");
            pos
        }
    };

    let mut report = SalvageReport {
        death_pos,
        placements: Vec::new(),
        failed: BTreeMap::new(),
        orbs_absorbed: 0,
        xp_gained: 0,
        level_before: snapshot.player.xp.level,
        level_after: snapshot.player.xp.level,
        entities_removed: 0,
    };

    let WorldSnapshot {
        player, entities, ..
    } = snapshot;
    let mut removals: BTreeSet<usize> = BTreeSet::new();

    for (index, entity) in entities.iter_mut().enumerate() {
        if entity.pos().planar_distance(&death_pos) > options.recover_radius {
            continue;
        }
        match entity {
            Entity::Item(item) => {
                let placement = player.inventory.stack_item(&item.stack, catalog, true)?;
                for &(slot, count) in &placement.placements {
                    tracing::info!(pos = %item.pos, age = item.age, slot, count,
                                   "added to inventory: {}", item.stack.display_name());
                    report.placements.push(PlacedItem {
                        slot,
                        count,
                        item: item.stack.display_name().to_string(),
                    });
                }
                if placement.is_complete() {
                    removals.insert(index);
                } else {
                    tracing::warn!(pos = %item.pos, remaining = placement.remainder,
                                   "no suitable free inventory slot for {}",
                                   item.stack.display_name());
                    *report.failed.entry(item.stack.key.id().to_string()).or_default() +=
                        placement.remainder;
                    // Leave the shortfall in the world.
                    item.stack.count = placement.remainder;
                }
            }
            Entity::XpOrb(orb) => {
                let gained = orb.value.saturating_mul(options.xp_factor);
                player.xp = player.xp.absorb(gained, options.ruleset);
                tracing::info!(pos = %orb.pos, age = orb.age, xp = gained,
                               level = player.xp.level as f64 + player.xp.progress,
                               "absorbed XP orb");
                report.orbs_absorbed += 1;
                report.xp_gained += u64::from(gained);
                removals.insert(index);
            }
            Entity::Mob(mob) => {
                let picks: Vec<usize> = mob
                    .interesting_equipment(&filter, catalog)
                    .into_iter()
                    .map(|(slot, _)| slot)
                    .collect();
                for equip_index in picks {
                    let Some(stack) = mob.equipment[equip_index].clone() else {
                        continue;
                    };
                    let placement = player.inventory.stack_item(&stack, catalog, true)?;
                    if placement.is_complete() {
                        for &(slot, count) in &placement.placements {
                            tracing::info!(pos = %mob.pos, slot, count,
                                           from = mob.species.display_name(),
                                           "added to inventory: {}", stack.display_name());
                            report.placements.push(PlacedItem {
                                slot,
                                count,
                                item: stack.display_name().to_string(),
                            });
                        }
                        mob.equipment[equip_index] = None;
                    } else {
                        tracing::warn!(pos = %mob.pos, from = mob.species.display_name(),
                                       "no suitable free inventory slot for {}",
                                       stack.display_name());
                        *report.failed.entry(stack.key.id().to_string()).or_default() +=
                            placement.remainder;
                    }
                }
            }
        }
    }

    if !removals.is_empty() {
        let mut index = 0;
        entities.retain(|_| {
            let keep = !removals.contains(&index);
            index += 1;
            keep
        });
        report.entities_removed = removals.len();
    }

    report.level_after = player.xp.level;
    Ok(report)
}
