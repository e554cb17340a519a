//! Definition persistence: `items.json` and `blocks.json` under the store
//! root, rewritten whole on every save and loaded entry-by-entry so one bad
//! definition never takes out the rest of the file.

use crate::definition::{BlockDefinition, BlockProperties, DropRule, ItemDefinition};
use crate::error::Result;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

const ITEMS_FILE: &str = "items.json";
const BLOCKS_FILE: &str = "blocks.json";

/// Counts for the stats surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreStats {
    pub items: usize,
    pub blocks: usize,
}

/// File-backed definition store.
pub struct DefinitionStore {
    root: PathBuf,
}

impl DefinitionStore {
    /// Open the store, creating the directory and seeding example files on
    /// first use so users have a template to edit.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let store = DefinitionStore { root };

        if !store.items_path().exists() {
            store.save_items(&[example_item()])?;
            info!("created example items.json");
        }
        if !store.blocks_path().exists() {
            store.save_blocks(&[example_block()])?;
            info!("created example blocks.json");
        }
        info!(root = %store.root.display(), "definition store ready");
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn items_path(&self) -> PathBuf {
        self.root.join(ITEMS_FILE)
    }

    fn blocks_path(&self) -> PathBuf {
        self.root.join(BLOCKS_FILE)
    }

    /// Load all item definitions. Missing file means empty; a malformed
    /// file means empty with an error logged; a malformed entry is skipped.
    pub fn load_items(&self) -> Vec<ItemDefinition> {
        load_entries(&self.items_path(), "item")
    }

    pub fn load_blocks(&self) -> Vec<BlockDefinition> {
        load_entries(&self.blocks_path(), "block")
    }

    /// Upsert one item definition: replace the entry with the same id or
    /// append, then rewrite the file.
    pub fn save_item(&self, definition: &ItemDefinition) -> Result<()> {
        let mut items = self.load_items();
        match items.iter_mut().find(|i| i.id == definition.id) {
            Some(slot) => *slot = definition.clone(),
            None => items.push(definition.clone()),
        }
        self.save_items(&items)?;
        info!(id = %definition.id, "saved item definition");
        Ok(())
    }

    pub fn save_block(&self, definition: &BlockDefinition) -> Result<()> {
        let mut blocks = self.load_blocks();
        match blocks.iter_mut().find(|b| b.id == definition.id) {
            Some(slot) => *slot = definition.clone(),
            None => blocks.push(definition.clone()),
        }
        self.save_blocks(&blocks)?;
        info!(id = %definition.id, "saved block definition");
        Ok(())
    }

    fn save_items(&self, items: &[ItemDefinition]) -> Result<()> {
        let json = serde_json::to_string_pretty(items)?;
        fs::write(self.items_path(), json)?;
        Ok(())
    }

    fn save_blocks(&self, blocks: &[BlockDefinition]) -> Result<()> {
        let json = serde_json::to_string_pretty(blocks)?;
        fs::write(self.blocks_path(), json)?;
        Ok(())
    }

    /// Remove an item definition. Returns whether anything was removed.
    /// Removal only affects future replays; a live registry entry stays
    /// until restart.
    pub fn remove_item(&self, id: &str) -> Result<bool> {
        let mut items = self.load_items();
        let before = items.len();
        items.retain(|i| i.id != id);
        if items.len() == before {
            return Ok(false);
        }
        self.save_items(&items)?;
        info!(id, "removed item definition");
        Ok(true)
    }

    pub fn remove_block(&self, id: &str) -> Result<bool> {
        let mut blocks = self.load_blocks();
        let before = blocks.len();
        blocks.retain(|b| b.id != id);
        if blocks.len() == before {
            return Ok(false);
        }
        self.save_blocks(&blocks)?;
        info!(id, "removed block definition");
        Ok(true)
    }

    /// Rewrite both files as empty arrays.
    pub fn clear_all(&self) -> Result<()> {
        self.save_items(&[])?;
        self.save_blocks(&[])?;
        info!("cleared all persisted definitions");
        Ok(())
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            items: self.load_items().len(),
            blocks: self.load_blocks().len(),
        }
    }
}

fn load_entries<T: serde::de::DeserializeOwned>(path: &Path, kind: &str) -> Vec<T> {
    if !path.exists() {
        return Vec::new();
    }
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) => {
            error!(path = %path.display(), error = %e, "failed to read definitions");
            return Vec::new();
        }
    };
    let entries: Vec<Value> = match serde_json::from_str(&json) {
        Ok(Value::Array(entries)) => entries,
        Ok(_) => {
            error!(path = %path.display(), "definitions file is not a JSON array");
            return Vec::new();
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "failed to parse definitions");
            return Vec::new();
        }
    };

    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        match serde_json::from_value(entry) {
            Ok(def) => out.push(def),
            Err(e) => warn!(kind, error = %e, "skipping malformed definition entry"),
        }
    }
    out
}

fn example_item() -> ItemDefinition {
    let mut def = ItemDefinition::with_texture("golden_apple", "golden_apple");
    def.components = match serde_json::json!({
        "custom_name": {"text": "Golden Apple of Power", "color": "gold"},
        "lore": [
            {"text": "A mystical golden apple", "italic": false},
            {"text": "Grants great power to the eater", "italic": false}
        ],
        "enchantment_glint_override": true,
        "max_stack_size": 16,
        "rarity": "rare",
        "consumable": {
            "consume_seconds": 1.6,
            "animation": "eat",
            "has_consume_particles": true
        },
        "food": {
            "nutrition": 8,
            "saturation": 1.2,
            "can_always_eat": true
        }
    }) {
        Value::Object(map) => map,
        _ => unreachable!("literal is an object"),
    };
    def
}

fn example_block() -> BlockDefinition {
    let mut def = BlockDefinition::with_texture("rich_gold_ore", "gold_ore");
    def.properties = BlockProperties {
        hardness: Some(3.0),
        resistance: Some(3.0),
        requires_correct_tool: Some(true),
        light_level: Some(5),
        sound_type: Some("stone".to_string()),
        ..BlockProperties::default()
    };
    def.components = match serde_json::json!({
        "custom_name": {"text": "Rich Gold Ore", "color": "gold"},
        "lore": [
            {"text": "A particularly rich vein of gold", "italic": false},
            {"text": "+50% gold yield when smelted", "color": "gold"}
        ],
        "rarity": "uncommon"
    }) {
        Value::Object(map) => map,
        _ => unreachable!("literal is an object"),
    };
    def.drops = vec![
        DropRule {
            item: "minecraft:gold_nugget".to_string(),
            count: 1,
            min: 2,
            max: 5,
            chance: 1.0,
        },
        DropRule {
            item: "minecraft:diamond".to_string(),
            count: 1,
            min: 0,
            max: 0,
            chance: 0.05,
        },
    ];
    def
}
