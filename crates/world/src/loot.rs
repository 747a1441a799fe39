//! Which mob equipment counts as the player's loot.
//!
//! Mobs that pick up loot end up wearing whatever the player dropped. Not
//! everything they carry is worth taking back though: spawn gear is innate,
//! and plain equipment is usually noise. The rules are a per-species table
//! layered over a default predicate so they stay auditable.

use deathsalvage_core::{ItemCatalog, ItemKey, ItemStack, Material};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mob species that can appear holding equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Species {
    /// Zombie, picks up dropped gear.
    Zombie,
    /// Zombie villager, behaves like a zombie for loot purposes.
    ZombieVillager,
    /// Zombie pigman, spawns with a golden sword.
    ZombiePigman,
    /// Skeleton, spawns with a bow.
    Skeleton,
    /// Wither skeleton, spawns with a stone sword.
    WitherSkeleton,
    /// Spider, no natural equipment.
    Spider,
    /// Creeper, no natural equipment.
    Creeper,
}

impl Species {
    /// Canonical lowercase string key for configs/logging.
    pub const fn as_str(self) -> &'static str {
        match self {
            Species::Zombie => "zombie",
            Species::ZombieVillager => "zombie_villager",
            Species::ZombiePigman => "zombie_pigman",
            Species::Skeleton => "skeleton",
            Species::WitherSkeleton => "wither_skeleton",
            Species::Spider => "spider",
            Species::Creeper => "creeper",
        }
    }

    /// Human-readable name for report lines.
    pub const fn display_name(self) -> &'static str {
        match self {
            Species::Zombie => "Zombie",
            Species::ZombieVillager => "Zombie Villager",
            Species::ZombiePigman => "Zombie Pigman",
            Species::Skeleton => "Skeleton",
            Species::WitherSkeleton => "Wither Skeleton",
            Species::Spider => "Spider",
            Species::Creeper => "Creeper",
        }
    }
}

/// Per-species exception to the default interest predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesRule {
    /// Gear the species spawns with; never offered, even on request.
    pub innate: Vec<ItemKey>,
    /// Material classes whose plain gear is assumed picked-up player loot.
    pub prized: Vec<Material>,
}

/// Decides which equipment pieces are worth salvaging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootFilter {
    rules: BTreeMap<Species, SpeciesRule>,
    include_ordinary: bool,
}

impl LootFilter {
    /// Filter with the stock species rules.
    ///
    /// `include_ordinary` also offers plain (unnamed, unenchanted) gear;
    /// species-innate gear stays excluded regardless.
    pub fn new(include_ordinary: bool) -> Self {
        Self {
            rules: Self::default_rules(),
            include_ordinary,
        }
    }

    /// Filter with a custom rule table.
    pub fn with_rules(rules: BTreeMap<Species, SpeciesRule>, include_ordinary: bool) -> Self {
        Self {
            rules,
            include_ordinary,
        }
    }

    fn default_rules() -> BTreeMap<Species, SpeciesRule> {
        let mut rules = BTreeMap::new();
        // Zombies only pick up what players drop; their plain diamond gear
        // is assumed to be exactly that.
        let zombie = SpeciesRule {
            innate: Vec::new(),
            prized: vec![Material::Diamond],
        };
        rules.insert(Species::Zombie, zombie.clone());
        rules.insert(Species::ZombieVillager, zombie);
        rules.insert(
            Species::ZombiePigman,
            SpeciesRule {
                innate: vec![ItemKey::new("golden_sword")],
                prized: Vec::new(),
            },
        );
        rules.insert(
            Species::Skeleton,
            SpeciesRule {
                innate: vec![ItemKey::new("bow")],
                prized: Vec::new(),
            },
        );
        rules.insert(
            Species::WitherSkeleton,
            SpeciesRule {
                innate: vec![ItemKey::new("bow"), ItemKey::new("stone_sword")],
                prized: Vec::new(),
            },
        );
        rules
    }

    /// Whether one equipment piece is worth salvaging from this species.
    pub fn is_interesting(
        &self,
        species: Species,
        stack: &ItemStack,
        catalog: &ItemCatalog,
    ) -> bool {
        static NO_RULE: SpeciesRule = SpeciesRule {
            innate: Vec::new(),
            prized: Vec::new(),
        };
        let rule = self.rules.get(&species).unwrap_or(&NO_RULE);

        // Named or enchanted gear is the player's no matter who wears it.
        if !stack.is_plain() {
            return true;
        }
        // Plain spawn gear stays excluded even when ordinary gear is wanted.
        if rule.innate.contains(&stack.key) {
            return false;
        }
        if self.include_ordinary {
            return true;
        }
        catalog
            .material(&stack.key)
            .is_some_and(|material| rule.prized.contains(&material))
    }
}
