//! The helper API exposed to scripts as a single global object, plus the
//! player wrapper handed to event handlers. Scripts only ever see wrappers,
//! never raw host state.

use super::engine::make_js_err;
use crate::identifier::Identifier;
use crate::registry::Registrar;
use crate::world::{EffectInstance, Hand, ParticleEmission, Player, SoundEmission, Vec3, World};
use rquickjs::{class::Trace, Class, JsLifetime};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A player as scripts see it.
#[rquickjs::class]
#[derive(Clone)]
pub struct PlayerRef {
    inner: Arc<Mutex<Player>>,
}

impl<'js> Trace<'js> for PlayerRef {
    fn trace<'a>(&self, _tracer: rquickjs::class::Tracer<'a, 'js>) {}
}

unsafe impl<'js> JsLifetime<'js> for PlayerRef {
    type Changed<'to> = PlayerRef;
}

impl PlayerRef {
    pub fn new(inner: Arc<Mutex<Player>>) -> Self {
        PlayerRef { inner }
    }

    pub fn handle(&self) -> Arc<Mutex<Player>> {
        self.inner.clone()
    }
}

#[rquickjs::methods]
impl PlayerRef {
    #[qjs(get, rename = "name")]
    pub fn get_name(&self) -> String {
        lock(&self.inner).name.clone()
    }

    #[qjs(get, rename = "x")]
    pub fn get_x(&self) -> f64 {
        lock(&self.inner).position.x
    }

    #[qjs(get, rename = "y")]
    pub fn get_y(&self) -> f64 {
        lock(&self.inner).position.y
    }

    #[qjs(get, rename = "z")]
    pub fn get_z(&self) -> f64 {
        lock(&self.inner).position.z
    }

    pub fn is_holding(&self, item_id: String) -> bool {
        lock(&self.inner).is_holding(&item_id)
    }

    pub fn has_in_inventory(&self, item_id: String) -> bool {
        lock(&self.inner).has_in_inventory(&item_id)
    }

    /// Identifier of the main-hand item, if any.
    pub fn held_item_id(&self) -> Option<String> {
        lock(&self.inner)
            .held(Hand::Main)
            .map(|stack| stack.item.id.to_string())
    }
}

/// The stateless helper-function namespace installed as a global. All
/// operations take explicit wrappers and resolve through the registrar and
/// world the host handed over.
#[rquickjs::class]
pub struct ScriptApi {
    registrar: Arc<Registrar>,
    world: Arc<Mutex<World>>,
}

impl<'js> Trace<'js> for ScriptApi {
    fn trace<'a>(&self, _tracer: rquickjs::class::Tracer<'a, 'js>) {}
}

unsafe impl<'js> JsLifetime<'js> for ScriptApi {
    type Changed<'to> = ScriptApi;
}

impl ScriptApi {
    pub fn new(registrar: Arc<Registrar>, world: Arc<Mutex<World>>) -> Self {
        ScriptApi { registrar, world }
    }

    fn parse_item_id(&self, item_id: &str) -> rquickjs::Result<Identifier> {
        Identifier::parse(item_id, self.registrar.namespace())
            .map_err(|e| make_js_err(&e.to_string()))
    }
}

#[rquickjs::methods]
impl ScriptApi {
    /// Give `count` of an item to a player. Bare ids resolve in the mod's
    /// own namespace, so registered content gets its stored components.
    pub fn give_item<'js>(
        &self,
        player: Class<'js, PlayerRef>,
        item_id: String,
        count: u32,
    ) -> rquickjs::Result<bool> {
        let id = self.parse_item_id(&item_id)?;
        let stack = match self.registrar.create_stack(&id, count) {
            Ok(stack) => stack,
            Err(e) => {
                debug!(item = %id, error = %e, "give_item failed");
                return Ok(false);
            }
        };
        lock(&player.borrow().inner).give(stack);
        info!(item = %id, count, "script gave item");
        Ok(true)
    }

    pub fn send_message<'js>(&self, player: Class<'js, PlayerRef>, message: String) {
        lock(&player.borrow().inner).messages.push(message);
    }

    pub fn apply_effect<'js>(
        &self,
        player: Class<'js, PlayerRef>,
        effect: String,
        duration_ticks: u32,
        amplifier: u32,
    ) {
        lock(&player.borrow().inner).effects.push(EffectInstance {
            effect,
            duration_ticks,
            amplifier,
        });
    }

    pub fn spawn_particle(&self, particle: String, x: f64, y: f64, z: f64) {
        lock(&self.world).particles.push(ParticleEmission {
            particle,
            position: Vec3::new(x, y, z),
        });
    }

    pub fn play_sound(&self, sound: String, x: f64, y: f64, z: f64, volume: f32, pitch: f32) {
        lock(&self.world).sounds.push(SoundEmission {
            sound,
            position: Vec3::new(x, y, z),
            volume,
            pitch,
        });
    }

    pub fn is_holding<'js>(&self, player: Class<'js, PlayerRef>, item_id: String) -> bool {
        player.borrow().is_holding(item_id)
    }

    pub fn has_in_inventory<'js>(&self, player: Class<'js, PlayerRef>, item_id: String) -> bool {
        player.borrow().has_in_inventory(item_id)
    }

    pub fn is_registered(&self, item_id: String) -> bool {
        self.registrar.has_item(&item_id) || self.registrar.has_block(&item_id)
    }

    pub fn log(&self, message: String) {
        info!(target: "accretion::script", "{}", message);
    }

    pub fn debug(&self, message: String) {
        debug!(target: "accretion::script", "{}", message);
    }
}
