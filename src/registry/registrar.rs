//! The registrar: turns validated definitions into live registry entries,
//! always inside a scoped unfreeze, and owns the component and drop side
//! tables consumed at stack-creation and harvest time.

use super::freeze::FreezeGuard;
use super::mapped::MappedRegistry;
use crate::component::{components_to_snbt, ComponentParser};
use crate::content::{Block, Item, ItemStack};
use crate::definition::{BlockDefinition, DropRule, ItemDefinition};
use crate::drops::{self, HarvestContext};
use crate::error::{AccretionError, Result};
use crate::identifier::Identifier;
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use smol_str::SmolStr;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Registration counts, for the stats surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistrarStats {
    pub items: usize,
    pub blocks: usize,
    pub item_component_sets: usize,
    pub block_component_sets: usize,
    pub drop_lists: usize,
}

impl std::fmt::Display for RegistrarStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "items: {}, blocks: {}, component sets: {}+{}, drop lists: {}",
            self.items,
            self.blocks,
            self.item_component_sets,
            self.block_component_sets,
            self.drop_lists
        )
    }
}

/// Drives item and block registration against a pair of shared registries.
///
/// The registries are shared rather than owned so a host adapter (or a test)
/// can pre-populate them with engine content before handing them over.
pub struct Registrar {
    namespace: SmolStr,
    items: Arc<Mutex<MappedRegistry<Item>>>,
    blocks: Arc<Mutex<MappedRegistry<Block>>>,
    item_components: Mutex<FxHashMap<String, Map<String, Value>>>,
    block_components: Mutex<FxHashMap<String, Map<String, Value>>>,
    block_drops: Mutex<FxHashMap<String, Vec<DropRule>>>,
    parser: Box<dyn ComponentParser + Send + Sync>,
}

impl Registrar {
    pub fn new(
        namespace: &str,
        items: Arc<Mutex<MappedRegistry<Item>>>,
        blocks: Arc<Mutex<MappedRegistry<Block>>>,
        parser: Box<dyn ComponentParser + Send + Sync>,
    ) -> Self {
        Registrar {
            namespace: namespace.into(),
            items,
            blocks,
            item_components: Mutex::new(FxHashMap::default()),
            block_components: Mutex::new(FxHashMap::default()),
            block_drops: Mutex::new(FxHashMap::default()),
            parser,
        }
    }

    /// Fresh, empty, frozen registries — the state a running host is in.
    pub fn with_default_registries(
        namespace: &str,
        parser: Box<dyn ComponentParser + Send + Sync>,
    ) -> Result<Self> {
        let mut items = MappedRegistry::new(Identifier::of("minecraft", "item")?);
        let mut blocks = MappedRegistry::new(Identifier::of("minecraft", "block")?);
        items.freeze()?;
        blocks.freeze()?;
        Ok(Registrar::new(
            namespace,
            Arc::new(Mutex::new(items)),
            Arc::new(Mutex::new(blocks)),
            parser,
        ))
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn items(&self) -> Arc<Mutex<MappedRegistry<Item>>> {
        self.items.clone()
    }

    pub fn blocks(&self) -> Arc<Mutex<MappedRegistry<Block>>> {
        self.blocks.clone()
    }

    /// Register an item from its definition. The registry's freeze state is
    /// restored whether or not registration succeeds.
    pub fn register_item(&self, definition: &ItemDefinition) -> Result<Arc<Item>> {
        let id = Identifier::of(&self.namespace, &definition.id)?;
        let item = Arc::new(Item::from_definition(id.clone(), definition));

        {
            let mut registry = lock(&self.items);
            let mut guard = FreezeGuard::acquire(&mut registry);
            guard.register(id.clone(), item.clone())?;
            guard.bind_tags(&id, self.parse_tags(&definition.tags))?;
        }

        if !definition.components.is_empty() {
            lock(&self.item_components)
                .insert(definition.id.clone(), definition.components.clone());
        }
        info!(item = %id, "registered item");
        Ok(item)
    }

    /// Register a block and its companion item, block first. The companion
    /// item goes through intrusive staging, matching how the host engine
    /// creates block items before they reach the item registry.
    pub fn register_block(&self, definition: &BlockDefinition) -> Result<(Arc<Block>, Arc<Item>)> {
        let id = Identifier::of(&self.namespace, &definition.id)?;
        let block = Arc::new(Block::new(id.clone(), definition.properties.clone()));

        {
            let mut registry = lock(&self.blocks);
            let mut guard = FreezeGuard::acquire(&mut registry);
            guard.register(id.clone(), block.clone())?;
            guard.bind_tags(&id, self.parse_tags(&definition.tags))?;
        }

        let mut item = Item::for_block(id.clone(), id.clone());
        if let Some(n) = definition
            .components
            .get("max_stack_size")
            .and_then(Value::as_u64)
        {
            item.max_stack_size = n as u32;
        }
        if let Some(n) = definition.components.get("max_damage").and_then(Value::as_u64) {
            item.max_damage = Some(n as u32);
        }
        let item = Arc::new(item);

        {
            let mut registry = lock(&self.items);
            let mut guard = FreezeGuard::acquire(&mut registry);
            guard.create_intrusive(item.clone())?;
            guard.register(id.clone(), item.clone())?;
            guard.bind_tags(&id, Vec::new())?;
        }

        if !definition.components.is_empty() {
            lock(&self.block_components)
                .insert(definition.id.clone(), definition.components.clone());
        }
        if !definition.drops.is_empty() {
            lock(&self.block_drops).insert(definition.id.clone(), definition.drops.clone());
        }
        info!(block = %id, "registered block with companion item");
        Ok((block, item))
    }

    /// Replace the stored components for an already-registered item. An
    /// empty bag removes the entry. Live registry state is untouched.
    pub fn update_item(&self, definition: &ItemDefinition) -> Result<()> {
        let id = Identifier::of(&self.namespace, &definition.id)?;
        if !lock(&self.items).contains(&id) {
            return Err(AccretionError::UnknownEntry {
                registry: Identifier::of("minecraft", "item")?,
                id,
            });
        }
        let mut components = lock(&self.item_components);
        if definition.components.is_empty() {
            components.remove(&definition.id);
        } else {
            components.insert(definition.id.clone(), definition.components.clone());
        }
        debug!(item = %id, "updated item components");
        Ok(())
    }

    /// Replace the stored components and drops for a registered block.
    pub fn update_block(&self, definition: &BlockDefinition) -> Result<()> {
        let id = Identifier::of(&self.namespace, &definition.id)?;
        if !lock(&self.blocks).contains(&id) {
            return Err(AccretionError::UnknownEntry {
                registry: Identifier::of("minecraft", "block")?,
                id,
            });
        }
        {
            let mut components = lock(&self.block_components);
            if definition.components.is_empty() {
                components.remove(&definition.id);
            } else {
                components.insert(definition.id.clone(), definition.components.clone());
            }
        }
        {
            let mut drops = lock(&self.block_drops);
            if definition.drops.is_empty() {
                drops.remove(&definition.id);
            } else {
                drops.insert(definition.id.clone(), definition.drops.clone());
            }
        }
        debug!(block = %id, "updated block components and drops");
        Ok(())
    }

    /// Create a stack of `count`, applying stored components when the item
    /// lives in this registrar's namespace. Item components win over block
    /// components for the same path.
    pub fn create_stack(&self, id: &Identifier, count: u32) -> Result<ItemStack> {
        let registry = lock(&self.items);
        let item = registry
            .get_value(id)
            .ok_or_else(|| AccretionError::UnknownEntry {
                registry: registry.key().clone(),
                id: id.clone(),
            })?;
        drop(registry);

        if id.namespace() != self.namespace.as_str() {
            return Ok(ItemStack::new(item, count));
        }
        Ok(ItemStack::with_components(
            item,
            count,
            self.components_for(id.path()),
        ))
    }

    /// Stored component pairs for a path in this namespace, already parsed.
    fn components_for(&self, path: &str) -> Vec<(String, String)> {
        let bag = lock(&self.item_components)
            .get(path)
            .filter(|b| !b.is_empty())
            .cloned()
            .or_else(|| lock(&self.block_components).get(path).cloned());
        let Some(bag) = bag else {
            return Vec::new();
        };
        let snbt = components_to_snbt(&bag);
        if snbt.is_empty() {
            return Vec::new();
        }
        match self.parser.parse(&snbt) {
            Ok(pairs) => pairs,
            Err(e) => {
                warn!(path, error = %e, "failed to parse stored components");
                Vec::new()
            }
        }
    }

    /// Resolve the drops for harvesting a registered block.
    pub fn resolve_block_drops<R: rand::Rng + ?Sized>(
        &self,
        block_id: &Identifier,
        harvest: HarvestContext,
        rng: &mut R,
    ) -> Result<Vec<ItemStack>> {
        let registry = lock(&self.blocks);
        let block = registry
            .get_value(block_id)
            .ok_or_else(|| AccretionError::UnknownEntry {
                registry: registry.key().clone(),
                id: block_id.clone(),
            })?;
        drop(registry);
        let requires_correct_tool = block.requires_correct_tool();
        if requires_correct_tool && !harvest.correct_tool {
            return Ok(Vec::new());
        }

        let rules = lock(&self.block_drops).get(block_id.path()).cloned();
        let Some(rules) = rules.filter(|r| !r.is_empty()) else {
            // No custom drops: the block drops its own companion item.
            return Ok(vec![self.create_stack(block_id, 1)?]);
        };

        let items = lock(&self.items);
        let resolved = drops::resolve_drops(
            block_id,
            &rules,
            requires_correct_tool,
            harvest,
            rng,
            |id| items.get_value(id),
        );
        Ok(drops::drops_to_stacks(
            &resolved,
            &self.namespace,
            |id| items.get_value(id),
            |path| self.components_for(path),
        ))
    }

    pub fn stats(&self) -> RegistrarStats {
        let namespace = self.namespace.as_str();
        let items = lock(&self.items)
            .ids()
            .filter(|id| id.namespace() == namespace)
            .count();
        let blocks = lock(&self.blocks)
            .ids()
            .filter(|id| id.namespace() == namespace)
            .count();
        RegistrarStats {
            items,
            blocks,
            item_component_sets: lock(&self.item_components).len(),
            block_component_sets: lock(&self.block_components).len(),
            drop_lists: lock(&self.block_drops).len(),
        }
    }

    /// Paths of entries registered in this namespace, in registration order.
    pub fn registered_items(&self) -> Vec<String> {
        lock(&self.items)
            .ids()
            .filter(|id| id.namespace() == self.namespace.as_str())
            .map(|id| id.path().to_string())
            .collect()
    }

    pub fn registered_blocks(&self) -> Vec<String> {
        lock(&self.blocks)
            .ids()
            .filter(|id| id.namespace() == self.namespace.as_str())
            .map(|id| id.path().to_string())
            .collect()
    }

    pub fn has_item(&self, path: &str) -> bool {
        Identifier::of(&self.namespace, path)
            .map(|id| lock(&self.items).contains(&id))
            .unwrap_or(false)
    }

    pub fn has_block(&self, path: &str) -> bool {
        Identifier::of(&self.namespace, path)
            .map(|id| lock(&self.blocks).contains(&id))
            .unwrap_or(false)
    }

    /// Parse tag strings, warning on and skipping malformed ones rather
    /// than failing the registration they ride on.
    fn parse_tags(&self, tags: &[String]) -> Vec<Identifier> {
        tags.iter()
            .filter_map(|t| match Identifier::parse(t, "minecraft") {
                Ok(id) => Some(id),
                Err(_) => {
                    warn!(tag = %t, "skipping malformed tag id");
                    None
                }
            })
            .collect()
    }
}

impl std::fmt::Debug for Registrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("Registrar")
            .field("namespace", &self.namespace)
            .field("items", &stats.items)
            .field("blocks", &stats.blocks)
            .finish()
    }
}
