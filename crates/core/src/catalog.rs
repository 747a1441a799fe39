//! Item catalog: per-kind stacking and equipment attributes.
//!
//! The catalog is an explicitly constructed configuration object passed to
//! whoever needs item attributes. There is no process-wide table; tests
//! build synthetic catalogs and the CLI builds the vanilla one.

use crate::item::{ItemError, ItemKey, ItemStack};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum stack size for most items.
pub const DEFAULT_STACK_SIZE: u32 = 64;

/// The four equipment categories with a reserved inventory slot each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ArmorKind {
    /// Head slot.
    Helmet,
    /// Chest slot.
    Chestplate,
    /// Legs slot.
    Leggings,
    /// Feet slot.
    Boots,
}

impl ArmorKind {
    /// All categories in head-to-feet order.
    pub const ALL: [ArmorKind; 4] = [
        ArmorKind::Helmet,
        ArmorKind::Chestplate,
        ArmorKind::Leggings,
        ArmorKind::Boots,
    ];

    /// Canonical lowercase string key for configs/logging.
    pub const fn as_str(self) -> &'static str {
        match self {
            ArmorKind::Helmet => "helmet",
            ArmorKind::Chestplate => "chestplate",
            ArmorKind::Leggings => "leggings",
            ArmorKind::Boots => "boots",
        }
    }
}

/// Material classes the clue-weight policy distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Material {
    /// Wooden tools.
    Wood,
    /// Stone tools.
    Stone,
    /// Leather armor.
    Leather,
    /// Iron tools and armor.
    Iron,
    /// Gold tools and armor.
    Gold,
    /// Diamond tools and armor.
    Diamond,
}

/// Attributes of one item kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDef {
    /// Stack limit (1 for tools/weapons/armor).
    pub max_stack_size: u32,
    /// Equip category, when the item is armor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub armor: Option<ArmorKind>,
    /// Material class, when the item has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<Material>,
}

impl Default for ItemDef {
    fn default() -> Self {
        Self {
            max_stack_size: DEFAULT_STACK_SIZE,
            armor: None,
            material: None,
        }
    }
}

impl ItemDef {
    /// A plain item stacking up to `max_stack_size`.
    pub fn stackable(max_stack_size: u32) -> Self {
        Self {
            max_stack_size,
            armor: None,
            material: None,
        }
    }

    /// A non-stackable item with no material class (e.g. a bow).
    pub fn unstackable() -> Self {
        Self::stackable(1)
    }

    /// A non-stackable tool or weapon of the given material.
    pub fn gear(material: Material) -> Self {
        Self {
            max_stack_size: 1,
            armor: None,
            material: Some(material),
        }
    }

    /// An armor piece of the given category and material.
    pub fn armor(kind: ArmorKind, material: Material) -> Self {
        Self {
            max_stack_size: 1,
            armor: Some(kind),
            material: Some(material),
        }
    }

    /// Attach a material class.
    pub fn with_material(mut self, material: Material) -> Self {
        self.material = Some(material);
        self
    }
}

/// Lookup table from item id to [`ItemDef`].
///
/// Variants share the attributes of their base id. Unknown ids resolve to
/// the default definition (stackable to 64, no armor slot, no material).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemCatalog {
    defs: BTreeMap<String, ItemDef>,
    #[serde(default)]
    default_def: ItemDef,
}

impl ItemCatalog {
    /// An empty catalog where every id resolves to the default definition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the definition for an item id (namespaced or bare).
    pub fn insert(&mut self, id: &str, def: ItemDef) {
        self.defs.insert(ItemKey::new(id).id().to_string(), def);
    }

    /// Attributes of the given item kind.
    pub fn lookup(&self, key: &ItemKey) -> &ItemDef {
        self.defs.get(key.id()).unwrap_or(&self.default_def)
    }

    /// Stack limit for the given item kind.
    pub fn max_stack_size(&self, key: &ItemKey) -> u32 {
        self.lookup(key).max_stack_size
    }

    /// Equip category of the given item kind, if it is armor.
    pub fn armor_kind(&self, key: &ItemKey) -> Option<ArmorKind> {
        self.lookup(key).armor
    }

    /// Material class of the given item kind, if it has one.
    pub fn material(&self, key: &ItemKey) -> Option<Material> {
        self.lookup(key).material
    }

    /// Build a stack of `count` items using this catalog's stack limit.
    pub fn stack(&self, key: ItemKey, count: u32) -> Result<ItemStack, ItemError> {
        let max = self.max_stack_size(&key);
        ItemStack::new(key, count, max)
    }

    /// Catalog covering the common vanilla items.
    pub fn vanilla() -> Self {
        let mut catalog = Self::new();

        let tool_tiers = [
            ("wooden", Material::Wood),
            ("stone", Material::Stone),
            ("iron", Material::Iron),
            ("golden", Material::Gold),
            ("diamond", Material::Diamond),
        ];
        for (prefix, material) in tool_tiers {
            for tool in ["sword", "pickaxe", "axe", "shovel", "hoe"] {
                catalog.insert(&format!("{prefix}_{tool}"), ItemDef::gear(material));
            }
        }

        let armor_tiers = [
            ("leather", Material::Leather),
            ("iron", Material::Iron),
            ("golden", Material::Gold),
            ("diamond", Material::Diamond),
        ];
        let pieces = [
            ("helmet", ArmorKind::Helmet),
            ("chestplate", ArmorKind::Chestplate),
            ("leggings", ArmorKind::Leggings),
            ("boots", ArmorKind::Boots),
        ];
        for (prefix, material) in armor_tiers {
            for (piece, kind) in pieces {
                catalog.insert(&format!("{prefix}_{piece}"), ItemDef::armor(kind, material));
            }
        }

        catalog.insert("bow", ItemDef::unstackable());
        catalog.insert("fishing_rod", ItemDef::unstackable());
        catalog.insert("shears", ItemDef::unstackable());
        catalog.insert(
            "diamond",
            ItemDef::stackable(64).with_material(Material::Diamond),
        );
        catalog.insert(
            "iron_ingot",
            ItemDef::stackable(64).with_material(Material::Iron),
        );
        catalog.insert(
            "gold_ingot",
            ItemDef::stackable(64).with_material(Material::Gold),
        );
        catalog.insert("ender_pearl", ItemDef::stackable(16));
        catalog.insert("snowball", ItemDef::stackable(16));
        catalog.insert("egg", ItemDef::stackable(16));

        catalog
    }
}
