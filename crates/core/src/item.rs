//! Item identity and stacks.
//!
//! An item instance is identified by its [`ItemKey`] (kind + variant) and an
//! optional [`ItemTag`] carrying a display name and enchantments. Two
//! instances are fungible only when both agree: a named or enchanted item
//! never merges into a plain stack of the same kind.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Inventory slot identifier.
pub type SlotId = u16;

/// Default namespace used when an item id omits an explicit namespace.
pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// Error raised when constructing an invalid item stack.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    /// The requested count is outside `[1, max_stack_size]`.
    #[error("item count {count} outside valid range [1, {max_stack_size}]")]
    InvalidCount {
        /// Requested stack count.
        count: u32,
        /// Stack limit for the item kind.
        max_stack_size: u32,
    },
}

/// What makes two item instances the same fungible kind: a namespaced id
/// plus a numeric variant (damage value / sub-type).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemKey {
    id: String,
    #[serde(default)]
    variant: u16,
}

impl ItemKey {
    /// Create a key, prefixing [`DEFAULT_NAMESPACE`] when the id has none.
    pub fn new(id: &str) -> Self {
        Self::with_variant(id, 0)
    }

    /// Create a key with an explicit variant.
    pub fn with_variant(id: &str, variant: u16) -> Self {
        let id = id.trim();
        let id = if id.contains(':') {
            id.to_string()
        } else {
            format!("{DEFAULT_NAMESPACE}:{id}")
        };
        Self { id, variant }
    }

    /// Full namespaced id, e.g. `minecraft:diamond_sword`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Numeric variant (0 for most items).
    pub fn variant(&self) -> u16 {
        self.variant
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.variant == 0 {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{}/{}", self.id, self.variant)
        }
    }
}

/// A single enchantment applied to an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enchantment {
    /// Enchantment id, e.g. `sharpness`.
    pub id: String,
    /// Enchantment level (1-based).
    pub level: u8,
}

impl Enchantment {
    /// Create a new enchantment.
    pub fn new(id: &str, level: u8) -> Self {
        Self {
            id: id.to_string(),
            level,
        }
    }
}

/// Custom data attached to an item instance.
///
/// Any tag at all makes the instance non-fungible with plain items of the
/// same kind, and with instances carrying a different tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemTag {
    /// Custom display name from an anvil rename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Applied enchantments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enchantments: Vec<Enchantment>,
}

impl ItemTag {
    /// Tag carrying only a display name.
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            enchantments: Vec::new(),
        }
    }

    /// Tag carrying only enchantments.
    pub fn enchanted(enchantments: Vec<Enchantment>) -> Self {
        Self {
            name: None,
            enchantments,
        }
    }
}

/// A counted group of fungible items occupying one inventory slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    /// Item kind.
    pub key: ItemKey,
    /// Number of items in this stack.
    pub count: u32,
    /// Stack limit for this kind (1 marks tools/weapons/armor).
    pub max_stack_size: u32,
    /// Custom name/enchantments, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<ItemTag>,
    /// Slot this stack occupies, once placed in an inventory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<SlotId>,
}

impl ItemStack {
    /// Create a stack, rejecting counts outside `[1, max_stack_size]`.
    pub fn new(key: ItemKey, count: u32, max_stack_size: u32) -> Result<Self, ItemError> {
        if count == 0 || count > max_stack_size {
            return Err(ItemError::InvalidCount {
                count,
                max_stack_size,
            });
        }
        Ok(Self {
            key,
            count,
            max_stack_size,
            tag: None,
            slot: None,
        })
    }

    /// Attach a custom tag.
    pub fn with_tag(mut self, tag: ItemTag) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Whether more than one item of this kind fits in a slot.
    pub fn is_stackable(&self) -> bool {
        self.max_stack_size > 1
    }

    /// Whether this instance carries no custom tag.
    pub fn is_plain(&self) -> bool {
        self.tag.is_none()
    }

    /// Check if another instance is fungible with this one: same kind and
    /// the same tag identity.
    pub fn can_merge(&self, other: &ItemStack) -> bool {
        self.is_stackable() && self.key == other.key && self.tag == other.tag
    }

    /// Check if this stack is at max capacity.
    pub fn is_full(&self) -> bool {
        self.count >= self.max_stack_size
    }

    /// Remaining space in this stack.
    pub fn remaining_space(&self) -> u32 {
        self.max_stack_size.saturating_sub(self.count)
    }

    /// Add items to this stack, returning the amount that didn't fit.
    pub fn fill(&mut self, amount: u32) -> u32 {
        let added = amount.min(self.remaining_space());
        self.count += added;
        amount - added
    }

    /// Human-readable name: the custom name when present, the id otherwise.
    pub fn display_name(&self) -> &str {
        self.tag
            .as_ref()
            .and_then(|t| t.name.as_deref())
            .unwrap_or_else(|| self.key.id())
    }
}

impl fmt::Display for ItemStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:2} {}", self.count, self.display_name())
    }
}
