//! Registered content objects: the crate-side model of items, blocks and
//! item stacks once a definition has been turned into live registry entries.

use crate::definition::{BlockProperties, ItemDefinition};
use crate::identifier::Identifier;
use std::sync::Arc;

/// A registered item. Intrinsic stack/durability limits are pulled out of
/// the definition's component bag at construction time; everything else in
/// the bag travels on stacks as SNBT components.
#[derive(Debug, Clone)]
pub struct Item {
    pub id: Identifier,
    pub max_stack_size: u32,
    pub max_damage: Option<u32>,
    /// Set for the companion item of a registered block.
    pub block: Option<Identifier>,
}

impl Item {
    pub fn new(id: Identifier) -> Self {
        Item {
            id,
            max_stack_size: 64,
            max_damage: None,
            block: None,
        }
    }

    /// Build an item from a definition, extracting `max_stack_size` and
    /// `max_damage` from the component bag when present.
    pub fn from_definition(id: Identifier, definition: &ItemDefinition) -> Self {
        let max_stack_size = definition
            .components
            .get("max_stack_size")
            .and_then(|v| v.as_u64())
            .map(|n| n as u32)
            .unwrap_or(64);
        let max_damage = definition
            .components
            .get("max_damage")
            .and_then(|v| v.as_u64())
            .map(|n| n as u32);
        Item {
            id,
            max_stack_size,
            max_damage,
            block: None,
        }
    }

    pub fn for_block(id: Identifier, block: Identifier) -> Self {
        Item {
            id,
            max_stack_size: 64,
            max_damage: None,
            block: Some(block),
        }
    }
}

/// A registered block.
#[derive(Debug, Clone)]
pub struct Block {
    pub id: Identifier,
    pub properties: BlockProperties,
}

impl Block {
    pub fn new(id: Identifier, properties: BlockProperties) -> Self {
        Block { id, properties }
    }

    pub fn requires_correct_tool(&self) -> bool {
        self.properties.requires_correct_tool.unwrap_or(false)
    }
}

/// A stack of a registered item, carrying applied SNBT components as
/// name/value pairs in definition order.
#[derive(Debug, Clone)]
pub struct ItemStack {
    pub item: Arc<Item>,
    pub count: u32,
    pub components: Vec<(String, String)>,
}

impl ItemStack {
    pub fn new(item: Arc<Item>, count: u32) -> Self {
        ItemStack {
            item,
            count,
            components: Vec::new(),
        }
    }

    pub fn with_components(item: Arc<Item>, count: u32, components: Vec<(String, String)>) -> Self {
        ItemStack {
            item,
            count,
            components,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn max_stack_size(&self) -> u32 {
        self.item.max_stack_size
    }

    pub fn component(&self, name: &str) -> Option<&str> {
        self.components
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}
