//! Inventory slot bookkeeping and the stacking engine.
//!
//! An [`Inventory`] tracks a fixed range of general slots plus a reserved
//! armor sub-range, one slot per equip category. Free slots are kept in
//! ordered sets so allocation is first-fit, lowest index first; callers
//! and tests rely on that order. The stacking
//! engine merges an incoming item into compatible stacks and/or a single
//! newly allocated slot, reporting exactly what was placed where and how
//! much did not fit.

use deathsalvage_core::{ArmorKind, ItemCatalog, ItemStack, SlotId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Number of general slots in a player inventory.
pub const PLAYER_GENERAL_SLOTS: u16 = 36;

/// First armor slot id in a player inventory (boots).
pub const PLAYER_ARMOR_SLOT_BASE: SlotId = 100;

/// Slot ranges of a container: a general range `0..general_slots` and a set
/// of armor slots, each accepting a single equip category.
///
/// Armor slot ids must lie outside the general range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLayout {
    /// Number of general-purpose slots, ids `0..general_slots`.
    pub general_slots: u16,
    /// Armor slot id per equip category.
    pub armor_slots: BTreeMap<ArmorKind, SlotId>,
}

impl InventoryLayout {
    /// The standard player layout: 36 general slots and the four armor
    /// slots at ids 100 (boots) through 103 (helmet).
    pub fn player() -> Self {
        let armor_slots = [
            (ArmorKind::Boots, PLAYER_ARMOR_SLOT_BASE),
            (ArmorKind::Leggings, PLAYER_ARMOR_SLOT_BASE + 1),
            (ArmorKind::Chestplate, PLAYER_ARMOR_SLOT_BASE + 2),
            (ArmorKind::Helmet, PLAYER_ARMOR_SLOT_BASE + 3),
        ]
        .into_iter()
        .collect();
        Self {
            general_slots: PLAYER_GENERAL_SLOTS,
            armor_slots,
        }
    }

    /// A layout with general slots only (chests, test fixtures).
    pub fn general_only(general_slots: u16) -> Self {
        Self {
            general_slots,
            armor_slots: BTreeMap::new(),
        }
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        usize::from(self.general_slots) + self.armor_slots.len()
    }

    fn is_general(&self, slot: SlotId) -> bool {
        slot < self.general_slots
    }

    fn armor_kind_of(&self, slot: SlotId) -> Option<ArmorKind> {
        self.armor_slots
            .iter()
            .find(|(_, &id)| id == slot)
            .map(|(&kind, _)| kind)
    }
}

/// Errors raised when constructing an inventory from persisted stacks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    /// A stack has no slot assignment.
    #[error("stack of {item} has no slot assignment")]
    MissingSlot {
        /// Item id of the offending stack.
        item: String,
    },
    /// A slot id is outside the layout.
    #[error("slot {slot} is outside the inventory layout")]
    SlotOutOfRange {
        /// Offending slot id.
        slot: SlotId,
    },
    /// Two stacks claim the same slot.
    #[error("slot {slot} is claimed by more than one stack")]
    DuplicateSlot {
        /// Offending slot id.
        slot: SlotId,
    },
    /// A persisted stack exceeds its own stack limit.
    #[error("stack in slot {slot} holds {count} items, over its limit {max_stack_size}")]
    OverfullStack {
        /// Offending slot id.
        slot: SlotId,
        /// Persisted count.
        count: u32,
        /// Stack limit for the item kind.
        max_stack_size: u32,
    },
}

/// Errors raised by the stacking engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaceError {
    /// The incoming item's count is outside `[1, max_stack_size]`.
    #[error("cannot place {count} items with stack limit {max_stack_size}")]
    InvalidCount {
        /// Requested count.
        count: u32,
        /// Stack limit of the incoming item.
        max_stack_size: u32,
    },
}

/// Outcome of one stacking-engine call: how much went where, and how much
/// did not fit. `remainder + placed() == original count` always holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Items that could not be placed.
    pub remainder: u32,
    /// `(slot, count)` pairs in placement order.
    pub placements: Vec<(SlotId, u32)>,
}

impl Placement {
    /// Total number of items placed.
    pub fn placed(&self) -> u32 {
        self.placements.iter().map(|(_, count)| count).sum()
    }

    /// Whether everything was placed.
    pub fn is_complete(&self) -> bool {
        self.remainder == 0
    }
}

/// A finite-capacity container: occupied slots plus ordered free sets.
///
/// Every slot id appears in exactly one of the occupied map, the free
/// general set, or the free armor set; together they cover the layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Inventory {
    layout: InventoryLayout,
    stacks: BTreeMap<SlotId, ItemStack>,
    free_general: BTreeSet<SlotId>,
    free_armor: BTreeMap<ArmorKind, SlotId>,
}

impl Inventory {
    /// An inventory with every slot free.
    pub fn empty(layout: InventoryLayout) -> Self {
        let free_general = (0..layout.general_slots).collect();
        let free_armor = layout.armor_slots.clone().into_iter().collect();
        Self {
            layout,
            stacks: BTreeMap::new(),
            free_general,
            free_armor,
        }
    }

    /// Build an inventory from persisted stacks, each carrying its slot.
    ///
    /// When the occupied count already equals the layout capacity both free
    /// sets are empty and the free-slot scan is skipped entirely.
    pub fn from_stacks(
        layout: InventoryLayout,
        stacks: Vec<ItemStack>,
    ) -> Result<Self, InventoryError> {
        let mut occupied: BTreeMap<SlotId, ItemStack> = BTreeMap::new();
        for stack in stacks {
            let slot = stack.slot.ok_or_else(|| InventoryError::MissingSlot {
                item: stack.key.id().to_string(),
            })?;
            if !layout.is_general(slot) && layout.armor_kind_of(slot).is_none() {
                return Err(InventoryError::SlotOutOfRange { slot });
            }
            if stack.count > stack.max_stack_size {
                return Err(InventoryError::OverfullStack {
                    slot,
                    count: stack.count,
                    max_stack_size: stack.max_stack_size,
                });
            }
            if occupied.insert(slot, stack).is_some() {
                return Err(InventoryError::DuplicateSlot { slot });
            }
        }

        let (free_general, free_armor) = if occupied.len() == layout.capacity() {
            (BTreeSet::new(), BTreeMap::new())
        } else {
            let free_general = (0..layout.general_slots)
                .filter(|slot| !occupied.contains_key(slot))
                .collect();
            let free_armor = layout
                .armor_slots
                .iter()
                .filter(|(_, slot)| !occupied.contains_key(slot))
                .map(|(&kind, &slot)| (kind, slot))
                .collect();
            (free_general, free_armor)
        };

        Ok(Self {
            layout,
            stacks: occupied,
            free_general,
            free_armor,
        })
    }

    /// The layout this inventory was built over.
    pub fn layout(&self) -> &InventoryLayout {
        &self.layout
    }

    /// Whether no free slot of any kind remains.
    pub fn is_full(&self) -> bool {
        self.free_general.is_empty() && self.free_armor.is_empty()
    }

    /// Number of occupied slots.
    pub fn occupied_count(&self) -> usize {
        self.stacks.len()
    }

    /// The stack in a slot, if any.
    pub fn get(&self, slot: SlotId) -> Option<&ItemStack> {
        self.stacks.get(&slot)
    }

    /// Occupied stacks in slot order.
    pub fn stacks(&self) -> impl Iterator<Item = &ItemStack> {
        self.stacks.values()
    }

    /// Atomically take the free armor slot for a category, if any.
    pub fn reserve(&mut self, kind: ArmorKind) -> Option<SlotId> {
        self.free_armor.remove(&kind)
    }

    /// Take the lowest-numbered free general slot, if any.
    pub fn reserve_general(&mut self) -> Option<SlotId> {
        self.free_general.pop_first()
    }

    /// Place an item into this inventory.
    ///
    /// Non-stackables (stack limit 1) get exactly one slot allocation,
    /// trying the matching armor slot first when `prefer_armor_slot` is set
    /// and the item is armor, then a general slot; they place whole or not
    /// at all. Stackables first top up compatible stacks in slot order, then
    /// attempt a single new-slot allocation for any leftover. A failed
    /// allocation leaves the inventory untouched; shortfall is reported
    /// through [`Placement::remainder`], never as an error.
    pub fn stack_item(
        &mut self,
        item: &ItemStack,
        catalog: &ItemCatalog,
        prefer_armor_slot: bool,
    ) -> Result<Placement, PlaceError> {
        if item.count == 0 || item.count > item.max_stack_size {
            return Err(PlaceError::InvalidCount {
                count: item.count,
                max_stack_size: item.max_stack_size,
            });
        }

        let armor = catalog.armor_kind(&item.key);

        if !item.is_stackable() {
            let placement = match self.allocate(armor, prefer_armor_slot) {
                Some(slot) => {
                    self.put(slot, item, item.count);
                    Placement {
                        remainder: 0,
                        placements: vec![(slot, item.count)],
                    }
                }
                None => Placement {
                    remainder: item.count,
                    placements: Vec::new(),
                },
            };
            debug_assert_eq!(placement.remainder + placement.placed(), item.count);
            return Ok(placement);
        }

        let mut remaining = item.count;
        let mut placements = Vec::new();

        // Top up compatible stacks in slot order, stopping early once
        // everything has been transferred.
        for (&slot, stack) in self.stacks.iter_mut() {
            if remaining == 0 {
                break;
            }
            if !stack.can_merge(item) || stack.is_full() {
                continue;
            }
            let leftover = stack.fill(remaining);
            let moved = remaining - leftover;
            if moved > 0 {
                tracing::debug!(slot, moved, item = %item.key, "merged into existing stack");
                placements.push((slot, moved));
            }
            remaining = leftover;
        }

        // Exactly one new-slot allocation for the leftover; it is bounded
        // by max_stack_size via the precondition, so one slot suffices.
        if remaining > 0 {
            if let Some(slot) = self.allocate(armor, prefer_armor_slot) {
                tracing::debug!(slot, count = remaining, item = %item.key, "opened new stack");
                self.put(slot, item, remaining);
                placements.push((slot, remaining));
                remaining = 0;
            }
        }

        let placement = Placement {
            remainder: remaining,
            placements,
        };
        debug_assert_eq!(placement.remainder + placement.placed(), item.count);
        Ok(placement)
    }

    fn allocate(&mut self, armor: Option<ArmorKind>, prefer_armor_slot: bool) -> Option<SlotId> {
        if prefer_armor_slot {
            if let Some(kind) = armor {
                if let Some(slot) = self.reserve(kind) {
                    return Some(slot);
                }
            }
        }
        self.reserve_general()
    }

    fn put(&mut self, slot: SlotId, item: &ItemStack, count: u32) {
        let mut stack = item.clone();
        stack.count = count;
        stack.slot = Some(slot);
        self.stacks.insert(slot, stack);
    }
}

// Serialized as layout + stack list; the free sets are derived state and
// are rebuilt on deserialization so the occupancy invariant always holds.
#[derive(Serialize, Deserialize)]
struct InventoryRepr {
    layout: InventoryLayout,
    stacks: Vec<ItemStack>,
}

impl Serialize for Inventory {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        InventoryRepr {
            layout: self.layout.clone(),
            stacks: self.stacks.values().cloned().collect(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Inventory {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let repr = InventoryRepr::deserialize(deserializer)?;
        Inventory::from_stacks(repr.layout, repr.stacks).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deathsalvage_core::{ItemCatalog, ItemKey, ItemTag};

    fn catalog() -> ItemCatalog {
        ItemCatalog::vanilla()
    }

    fn dirt(count: u32, slot: SlotId) -> ItemStack {
        let mut stack = ItemStack::new(ItemKey::new("dirt"), count, 64).unwrap();
        stack.slot = Some(slot);
        stack
    }

    #[test]
    fn empty_inventory_frees_everything() {
        let inv = Inventory::empty(InventoryLayout::player());
        assert!(!inv.is_full());
        assert_eq!(inv.occupied_count(), 0);
        assert_eq!(inv.layout().capacity(), 40);
    }

    #[test]
    fn from_stacks_computes_free_sets() {
        let mut inv =
            Inventory::from_stacks(InventoryLayout::player(), vec![dirt(10, 0), dirt(10, 2)])
                .unwrap();
        assert_eq!(inv.occupied_count(), 2);
        // Lowest free general slot is 1, then 3.
        assert_eq!(inv.reserve_general(), Some(1));
        assert_eq!(inv.reserve_general(), Some(3));
    }

    #[test]
    fn from_stacks_rejects_bad_slots() {
        let layout = InventoryLayout::player;
        let mut unslotted = dirt(1, 0);
        unslotted.slot = None;
        assert!(matches!(
            Inventory::from_stacks(layout(), vec![unslotted]),
            Err(InventoryError::MissingSlot { .. })
        ));
        assert!(matches!(
            Inventory::from_stacks(layout(), vec![dirt(1, 90)]),
            Err(InventoryError::SlotOutOfRange { slot: 90 })
        ));
        assert!(matches!(
            Inventory::from_stacks(layout(), vec![dirt(1, 4), dirt(2, 4)]),
            Err(InventoryError::DuplicateSlot { slot: 4 })
        ));
        let mut overfull = dirt(64, 0);
        overfull.count = 65;
        assert!(matches!(
            Inventory::from_stacks(layout(), vec![overfull]),
            Err(InventoryError::OverfullStack { slot: 0, .. })
        ));
    }

    #[test]
    fn full_occupancy_shortcut_leaves_no_free_slots() {
        let layout = InventoryLayout::general_only(3);
        let stacks = vec![dirt(1, 0), dirt(1, 1), dirt(64, 2)];
        let mut inv = Inventory::from_stacks(layout, stacks).unwrap();
        assert!(inv.is_full());
        assert_eq!(inv.reserve_general(), None);
    }

    #[test]
    fn reserve_takes_armor_slot_once() {
        let mut inv = Inventory::empty(InventoryLayout::player());
        assert_eq!(inv.reserve(ArmorKind::Helmet), Some(103));
        assert_eq!(inv.reserve(ArmorKind::Helmet), None);
        assert_eq!(inv.reserve(ArmorKind::Boots), Some(100));
    }

    #[test]
    fn invalid_count_is_rejected() {
        let mut inv = Inventory::empty(InventoryLayout::player());
        let mut item = ItemStack::new(ItemKey::new("diamond_sword"), 1, 1).unwrap();
        item.count = 5;
        assert_eq!(
            inv.stack_item(&item, &catalog(), true),
            Err(PlaceError::InvalidCount {
                count: 5,
                max_stack_size: 1
            })
        );
        let mut zero = dirt(1, 0);
        zero.slot = None;
        zero.count = 0;
        assert!(inv.stack_item(&zero, &catalog(), true).is_err());
    }

    #[test]
    fn merges_then_opens_new_stack() {
        // One existing stack of 40 with limit 64; placing 30 fills it with
        // 24 and opens a new stack of 6 in the lowest free slot.
        let mut inv =
            Inventory::from_stacks(InventoryLayout::player(), vec![dirt(40, 5)]).unwrap();
        let item = ItemStack::new(ItemKey::new("dirt"), 30, 64).unwrap();
        let placement = inv.stack_item(&item, &catalog(), true).unwrap();
        assert_eq!(placement.remainder, 0);
        assert_eq!(placement.placements, vec![(5, 24), (0, 6)]);
        assert_eq!(inv.get(5).unwrap().count, 64);
        assert_eq!(inv.get(0).unwrap().count, 6);
    }

    #[test]
    fn merge_scan_stops_once_everything_placed() {
        let mut inv = Inventory::from_stacks(
            InventoryLayout::player(),
            vec![dirt(60, 0), dirt(60, 1), dirt(60, 2)],
        )
        .unwrap();
        let item = ItemStack::new(ItemKey::new("dirt"), 7, 64).unwrap();
        let placement = inv.stack_item(&item, &catalog(), true).unwrap();
        assert_eq!(placement.placements, vec![(0, 4), (1, 3)]);
        assert_eq!(inv.get(2).unwrap().count, 60);
    }

    #[test]
    fn no_stack_ever_exceeds_its_limit() {
        let mut inv =
            Inventory::from_stacks(InventoryLayout::player(), vec![dirt(63, 0)]).unwrap();
        let item = ItemStack::new(ItemKey::new("dirt"), 64, 64).unwrap();
        let placement = inv.stack_item(&item, &catalog(), true).unwrap();
        assert_eq!(placement.remainder, 0);
        for stack in inv.stacks() {
            assert!(stack.count <= stack.max_stack_size);
        }
    }

    #[test]
    fn named_items_keep_their_own_stack() {
        let named = ItemStack::new(ItemKey::new("dirt"), 10, 64)
            .unwrap()
            .with_tag(ItemTag::named("Lucky Dirt"));
        let mut inv =
            Inventory::from_stacks(InventoryLayout::player(), vec![dirt(10, 0)]).unwrap();
        let placement = inv.stack_item(&named, &catalog(), true).unwrap();
        // Slot 0 holds the plain stack; the named one must open slot 1.
        assert_eq!(placement.placements, vec![(1, 10)]);
        assert_eq!(inv.get(0).unwrap().count, 10);
        assert!(inv.get(1).unwrap().tag.is_some());
    }

    #[test]
    fn armor_prefers_its_own_slot() {
        let mut inv = Inventory::empty(InventoryLayout::player());
        let helmet = ItemStack::new(ItemKey::new("iron_helmet"), 1, 1).unwrap();
        let placement = inv.stack_item(&helmet, &catalog(), true).unwrap();
        assert_eq!(placement.placements, vec![(103, 1)]);

        // Second helmet: armor slot taken, falls back to general slot 0.
        let placement = inv.stack_item(&helmet, &catalog(), true).unwrap();
        assert_eq!(placement.placements, vec![(0, 1)]);
    }

    #[test]
    fn armor_preference_can_be_disabled() {
        let mut inv = Inventory::empty(InventoryLayout::player());
        let boots = ItemStack::new(ItemKey::new("diamond_boots"), 1, 1).unwrap();
        let placement = inv.stack_item(&boots, &catalog(), false).unwrap();
        assert_eq!(placement.placements, vec![(0, 1)]);
    }

    #[test]
    fn non_stackable_places_whole_or_not_at_all() {
        let layout = InventoryLayout::general_only(1);
        let mut inv = Inventory::from_stacks(layout, vec![dirt(1, 0)]).unwrap();
        assert!(inv.is_full());

        let sword = ItemStack::new(ItemKey::new("diamond_sword"), 1, 1).unwrap();
        let before = inv.clone();
        let placement = inv.stack_item(&sword, &catalog(), true).unwrap();
        assert_eq!(placement.remainder, 1);
        assert!(placement.placements.is_empty());
        // A failed allocation leaves the inventory unchanged.
        assert_eq!(inv, before);
    }

    #[test]
    fn remainder_reported_when_capacity_runs_out() {
        let layout = InventoryLayout::general_only(1);
        let mut inv = Inventory::from_stacks(layout, vec![dirt(60, 0)]).unwrap();
        let item = ItemStack::new(ItemKey::new("dirt"), 30, 64).unwrap();
        let placement = inv.stack_item(&item, &catalog(), true).unwrap();
        assert_eq!(placement.placements, vec![(0, 4)]);
        assert_eq!(placement.remainder, 26);
        assert_eq!(placement.remainder + placement.placed(), 30);
    }

    #[test]
    fn serde_roundtrip_rebuilds_free_sets() {
        let mut inv =
            Inventory::from_stacks(InventoryLayout::player(), vec![dirt(10, 0)]).unwrap();
        let json = serde_json::to_string(&inv).unwrap();
        let mut back: Inventory = serde_json::from_str(&json).unwrap();
        assert_eq!(back.occupied_count(), 1);
        assert_eq!(back.reserve_general(), Some(1));
        assert_eq!(inv.reserve_general(), Some(1));
    }
}
