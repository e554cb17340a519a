//! The process-level façade: one `Session` owns the definition store, the
//! registrar, the asset pipeline and (optionally) the script host, and
//! exposes the operations the command surface drives.

use crate::assets::{ResourceSynthesizer, VirtualAssetPack};
use crate::component::BracketParser;
use crate::content::ItemStack;
use crate::definition::{BlockDefinition, ItemDefinition};
use crate::drops::HarvestContext;
use crate::error::{AccretionError, Result};
use crate::identifier::Identifier;
use crate::persistence::{DefinitionStore, StoreStats};
use crate::registry::{Registrar, RegistrarStats};
#[cfg(feature = "scripting")]
use crate::scripting::{EventOutcome, EventPayload, ScriptHost};
use crate::world::World;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{error, info};

/// Hook for asking the host to reload client resources after the pack
/// changed. The real implementation schedules onto the host's client
/// thread; the reload itself is asynchronous relative to this call.
pub trait ResourceReloader {
    fn schedule_reload(&self);
}

/// No-op reloader for headless use and tests.
pub struct NullReloader;

impl ResourceReloader for NullReloader {
    fn schedule_reload(&self) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionStats {
    pub registrar: RegistrarStats,
    pub store: StoreStats,
    pub pack_resources: usize,
}

/// Counts from one replay batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub new_items: usize,
    pub new_blocks: usize,
    pub updated: usize,
    pub failed: usize,
}

impl ReplayReport {
    pub fn new_registrations(&self) -> usize {
        self.new_items + self.new_blocks
    }
}

pub struct Session {
    store: DefinitionStore,
    registrar: Arc<Registrar>,
    synth: ResourceSynthesizer,
    pack: VirtualAssetPack,
    reloader: Box<dyn ResourceReloader>,
    world: Arc<Mutex<World>>,
    #[cfg(feature = "scripting")]
    scripts: Option<ScriptHost>,
}

impl Session {
    /// Open a session rooted at `root`: definitions under `root/registry`,
    /// assets under `root/dynamic`, scripts under `root/scripts`.
    pub fn open(namespace: &str, root: &Path, reloader: Box<dyn ResourceReloader>) -> Result<Self> {
        let registrar = Arc::new(Registrar::with_default_registries(
            namespace,
            Box::new(BracketParser),
        )?);
        Session::with_registrar(registrar, root, reloader)
    }

    /// Open a session over an existing registrar, letting the caller seed
    /// the shared registries with host content first.
    pub fn with_registrar(
        registrar: Arc<Registrar>,
        root: &Path,
        reloader: Box<dyn ResourceReloader>,
    ) -> Result<Self> {
        let namespace = registrar.namespace().to_string();
        let store = DefinitionStore::open(root.join("registry"))?;
        let synth = ResourceSynthesizer::new(&namespace, root.join("dynamic"))?;
        let pack = VirtualAssetPack::new(&namespace, "Runtime-registered content");
        Ok(Session {
            store,
            registrar,
            synth,
            pack,
            reloader,
            world: Arc::new(Mutex::new(World::new())),
            #[cfg(feature = "scripting")]
            scripts: None,
        })
    }

    pub fn registrar(&self) -> &Arc<Registrar> {
        &self.registrar
    }

    pub fn store(&self) -> &DefinitionStore {
        &self.store
    }

    pub fn pack(&self) -> &VirtualAssetPack {
        &self.pack
    }

    pub fn world(&self) -> Arc<Mutex<World>> {
        self.world.clone()
    }

    /// Register an item interactively: synthesize its assets, register it,
    /// persist the definition, then rebuild the pack and ask for a reload.
    pub fn register_item(&mut self, definition: &ItemDefinition) -> Result<()> {
        if let Some(texture) = &definition.texture {
            self.synth.synthesize_item(&definition.id, texture);
        }
        self.registrar.register_item(definition)?;
        self.store.save_item(definition)?;
        self.pack.rebuild(&self.synth);
        self.reloader.schedule_reload();
        Ok(())
    }

    pub fn register_block(&mut self, definition: &BlockDefinition) -> Result<()> {
        if let Some(texture) = &definition.texture {
            self.synth.synthesize_block(&definition.id, texture);
        }
        self.registrar.register_block(definition)?;
        self.store.save_block(definition)?;
        self.pack.rebuild(&self.synth);
        self.reloader.schedule_reload();
        Ok(())
    }

    /// Replay the store into the registries. Definitions already live in
    /// the registry get their components and drops updated in place; absent
    /// ones go through full registration. One bad entry never stops the
    /// batch. The pack is rebuilt and a reload requested only when the
    /// batch registered something new; update-only batches skip both.
    pub fn load_and_register_all(&mut self) -> Result<ReplayReport> {
        let mut report = ReplayReport::default();

        for definition in self.store.load_items() {
            let result = if self.registrar.has_item(&definition.id) {
                self.registrar.update_item(&definition).map(|()| {
                    report.updated += 1;
                })
            } else {
                if let Some(texture) = &definition.texture {
                    self.synth.synthesize_item(&definition.id, texture);
                }
                self.registrar.register_item(&definition).map(|_| {
                    report.new_items += 1;
                })
            };
            if let Err(e) = result {
                report.failed += 1;
                error!(item = %definition.id, error = %e, "failed to restore item");
            }
        }

        for definition in self.store.load_blocks() {
            let result = if self.registrar.has_block(&definition.id) {
                self.registrar.update_block(&definition).map(|()| {
                    report.updated += 1;
                })
            } else {
                if let Some(texture) = &definition.texture {
                    self.synth.synthesize_block(&definition.id, texture);
                }
                self.registrar.register_block(&definition).map(|_| {
                    report.new_blocks += 1;
                })
            };
            if let Err(e) = result {
                report.failed += 1;
                error!(block = %definition.id, error = %e, "failed to restore block");
            }
        }

        info!(
            new_items = report.new_items,
            new_blocks = report.new_blocks,
            updated = report.updated,
            failed = report.failed,
            "definition replay complete"
        );

        if report.new_registrations() > 0 {
            self.pack.rebuild(&self.synth);
            self.reloader.schedule_reload();
        }
        Ok(report)
    }

    /// Hot-reload path: same replay, exposed under the command surface's
    /// name.
    pub fn reload_definitions(&mut self) -> Result<ReplayReport> {
        self.load_and_register_all()
    }

    /// Give a player a stack of a registered item. Bare ids resolve in the
    /// session's own namespace.
    pub fn give_item(&self, player: &str, item_id: &str, count: u32) -> Result<()> {
        let id = Identifier::parse(item_id, self.registrar.namespace())?;
        let stack = self.registrar.create_stack(&id, count)?;
        let world = self.world.lock().unwrap_or_else(PoisonError::into_inner);
        let player = world
            .player(player)
            .ok_or_else(|| AccretionError::Definition(format!("unknown player '{}'", player)))?;
        player
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .give(stack);
        Ok(())
    }

    /// Resolve drops for harvesting a registered block.
    pub fn harvest_block<R: rand::Rng + ?Sized>(
        &self,
        block_id: &str,
        harvest: HarvestContext,
        rng: &mut R,
    ) -> Result<Vec<ItemStack>> {
        let id = Identifier::parse(block_id, self.registrar.namespace())?;
        self.registrar.resolve_block_drops(&id, harvest, rng)
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            registrar: self.registrar.stats(),
            store: self.store.stats(),
            pack_resources: self.pack.len(),
        }
    }

    pub fn list_persisted(&self) -> (Vec<String>, Vec<String>) {
        (
            self.store.load_items().into_iter().map(|d| d.id).collect(),
            self.store.load_blocks().into_iter().map(|d| d.id).collect(),
        )
    }

    /// Remove a persisted definition. The live registry entry, if any,
    /// stays until restart; only future replays see the removal.
    pub fn remove_item(&self, id: &str) -> Result<bool> {
        self.store.remove_item(id)
    }

    pub fn remove_block(&self, id: &str) -> Result<bool> {
        self.store.remove_block(id)
    }

    pub fn clear_persisted(&self) -> Result<()> {
        self.store.clear_all()
    }
}

#[cfg(feature = "scripting")]
impl Session {
    /// Bring up the script host over `root/scripts`.
    pub fn init_scripts(&mut self, root: &Path) -> Result<()> {
        let mut host = ScriptHost::new(
            root.join("scripts"),
            self.registrar.clone(),
            self.world.clone(),
        )?;
        host.init()?;
        self.scripts = Some(host);
        Ok(())
    }

    pub fn scripts(&self) -> Option<&ScriptHost> {
        self.scripts.as_ref()
    }

    pub fn reload_scripts(&mut self) -> Result<()> {
        match self.scripts.as_mut() {
            Some(host) => host.reload(),
            None => Err(AccretionError::Script("script host not initialized".into())),
        }
    }

    /// Fire a host event into the script layer. Inert when scripts are not
    /// initialized.
    pub fn fire_event(&self, event: &str, payload: EventPayload) -> EventOutcome {
        match self.scripts.as_ref() {
            Some(host) => host.fire_event(event, payload),
            None => EventOutcome::default(),
        }
    }

    pub fn shutdown_scripts(&mut self) {
        if let Some(host) = self.scripts.as_mut() {
            host.shutdown();
        }
    }
}
