//! The script host: config loading, the host state machine, script
//! directory loading, and global binding setup.

use super::api::ScriptApi;
use super::engine::JsEngine;
use super::events::{EventBus, EventOutcome, EventPayload};
use crate::error::{AccretionError, Result};
use crate::registry::Registrar;
use crate::world::World;
use rquickjs::{Class, Ctx, Function, Object, Persistent};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

/// Sandbox flags. The engine binds no filesystem or network API, so the
/// access flags hold trivially today; they stay in the config for host
/// adapters that bind more capabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    #[serde(default)]
    pub allow_file_access: bool,
    #[serde(default)]
    pub allow_network_access: bool,
    #[serde(default = "default_max_execution_time_ms")]
    pub max_execution_time_ms: u64,
}

fn default_max_execution_time_ms() -> u64 {
    5000
}

impl Default for SandboxConfig {
    fn default() -> Self {
        SandboxConfig {
            allow_file_access: false,
            allow_network_access: false,
            max_execution_time_ms: default_max_execution_time_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub sandbox: SandboxConfig,
}

fn default_enabled() -> bool {
    true
}

impl Default for ScriptConfig {
    fn default() -> Self {
        ScriptConfig {
            enabled: true,
            sandbox: SandboxConfig::default(),
        }
    }
}

impl ScriptConfig {
    /// Load from `config.json` in the script directory, writing the default
    /// file when absent. A malformed file logs and falls back to defaults.
    pub fn load_or_create(dir: &Path) -> Result<Self> {
        let path = dir.join("config.json");
        if path.exists() {
            let json = fs::read_to_string(&path)?;
            match serde_json::from_str(&json) {
                Ok(config) => {
                    info!(path = %path.display(), "loaded script configuration");
                    return Ok(config);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "bad config.json, using defaults");
                    return Ok(ScriptConfig::default());
                }
            }
        }
        let config = ScriptConfig::default();
        fs::create_dir_all(dir)?;
        fs::write(&path, serde_json::to_string_pretty(&config)?)?;
        info!(path = %path.display(), "created default config.json");
        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    Uninitialized,
    Ready,
    Reloading,
    Closed,
}

/// Owns the engine generation, the event bus, and the script directory.
/// One instance per session; no global state.
pub struct ScriptHost {
    dir: PathBuf,
    config: ScriptConfig,
    state: HostState,
    // Declared before `engine` so the persistent handlers it holds drop
    // before the runtime; QuickJS aborts if any outlive the runtime.
    bus: Rc<EventBus>,
    engine: Option<JsEngine>,
    registrar: Arc<Registrar>,
    world: Arc<Mutex<World>>,
    loaded_scripts: Vec<String>,
}

// The `Events.on` closure inside the runtime holds an `Rc` to the bus, so
// the handlers must be cleared before the engine drops or the persistent
// functions outlive the runtime and QuickJS aborts.
impl Drop for ScriptHost {
    fn drop(&mut self) {
        self.bus.clear();
    }
}

impl ScriptHost {
    pub fn new(
        dir: impl Into<PathBuf>,
        registrar: Arc<Registrar>,
        world: Arc<Mutex<World>>,
    ) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let config = ScriptConfig::load_or_create(&dir)?;
        Ok(ScriptHost {
            dir,
            config,
            state: HostState::Uninitialized,
            engine: None,
            bus: Rc::new(EventBus::new()),
            registrar,
            world,
            loaded_scripts: Vec::new(),
        })
    }

    pub fn state(&self) -> HostState {
        self.state
    }

    pub fn config(&self) -> &ScriptConfig {
        &self.config
    }

    pub fn loaded_scripts(&self) -> &[String] {
        &self.loaded_scripts
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Bring the host up: fresh engine from the current sandbox config,
    /// globals bound, every script in the directory loaded. A disabled
    /// config leaves the host inert but Ready, so `reload` can pick up an
    /// enabling edit later.
    pub fn init(&mut self) -> Result<()> {
        if self.state == HostState::Closed {
            return Err(AccretionError::Script("script host is closed".into()));
        }
        self.start_generation()?;
        self.state = HostState::Ready;
        Ok(())
    }

    /// Tear down the current generation and start a new one: handlers
    /// cleared, context discarded, config re-read, scripts re-loaded.
    pub fn reload(&mut self) -> Result<()> {
        if self.state == HostState::Closed {
            return Err(AccretionError::Script("script host is closed".into()));
        }
        self.state = HostState::Reloading;
        self.config = ScriptConfig::load_or_create(&self.dir)?;
        let outcome = self.start_generation();
        self.state = HostState::Ready;
        outcome
    }

    pub fn shutdown(&mut self) {
        self.bus.clear();
        self.engine = None;
        self.loaded_scripts.clear();
        self.state = HostState::Closed;
        info!("script host shut down");
    }

    /// Fire an event through the bus. Inert unless the host is Ready with a
    /// live engine.
    pub fn fire_event(&self, event: &str, payload: EventPayload) -> EventOutcome {
        match (&self.engine, self.state) {
            (Some(engine), HostState::Ready) => self.bus.fire(engine, event, payload),
            _ => EventOutcome::default(),
        }
    }

    fn start_generation(&mut self) -> Result<()> {
        self.bus.clear();
        self.engine = None;
        self.loaded_scripts.clear();

        if !self.config.enabled {
            info!("script system disabled in config");
            return Ok(());
        }

        let engine = JsEngine::new(self.config.sandbox.max_execution_time_ms)
            .map_err(AccretionError::Script)?;
        engine
            .with(|ctx| self.bind_globals(ctx))
            .map_err(|e| AccretionError::Script(format!("binding setup: {}", e)))?;
        self.engine = Some(engine);
        self.load_scripts();
        Ok(())
    }

    /// Install the two script-facing globals: the helper API object and the
    /// `Events` registrar with its single `on(name, callback)` method.
    fn bind_globals(&self, ctx: &Ctx<'_>) -> rquickjs::Result<()> {
        let api = ScriptApi::new(self.registrar.clone(), self.world.clone());
        let api = Class::instance(ctx.clone(), api)?;
        ctx.globals().set("Accretion", api)?;

        let bus = self.bus.clone();
        let events = Object::new(ctx.clone())?;
        events.set(
            "on",
            Function::new(
                ctx.clone(),
                // The callback arrives already persisted, detached from the
                // call's own lifetime.
                move |event: String, callback: Persistent<Function<'static>>| {
                    bus.on(&event, callback);
                },
            )?,
        )?;
        ctx.globals().set("Events", events)?;
        Ok(())
    }

    /// Load every `*.js` directly in the script directory, sorted by name.
    /// A script that fails to evaluate is logged and skipped; the rest
    /// still load.
    fn load_scripts(&mut self) {
        let Some(engine) = self.engine.as_ref() else {
            return;
        };
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                error!(dir = %self.dir.display(), error = %e, "cannot read script directory");
                return;
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().and_then(|e| e.to_str()) == Some("js"))
            .collect();
        paths.sort();

        for path in paths {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("<unnamed>")
                .to_string();
            let code = match fs::read_to_string(&path) {
                Ok(code) => code,
                Err(e) => {
                    error!(script = %name, error = %e, "failed to read script");
                    continue;
                }
            };
            match engine.eval_script(&name, &code) {
                Ok(()) => {
                    info!(script = %name, "loaded script");
                    self.loaded_scripts.push(name);
                }
                Err(e) => error!(error = %e, "failed to load script"),
            }
        }
        info!(count = self.loaded_scripts.len(), "script load complete");
    }
}
