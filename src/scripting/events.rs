//! The event bus: scripts register handlers with `Events.on(name, fn)`, the
//! host fires events into the bus, and a context object carries the
//! cancellable outcome back out.

use super::api::PlayerRef;
use super::engine::{json_to_js, JsEngine};
use crate::world::Player;
use rquickjs::{class::Trace, CatchResultExt, Class, Ctx, Function, JsLifetime, Persistent};
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::sync::{Arc, Mutex};
use tracing::{debug, error};

/// What an event carries into its handlers.
#[derive(Default)]
pub struct EventPayload {
    pub fields: Map<String, Value>,
    pub player: Option<Arc<Mutex<Player>>>,
}

impl EventPayload {
    pub fn new() -> Self {
        EventPayload::default()
    }

    pub fn field(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    pub fn with_player(mut self, player: Arc<Mutex<Player>>) -> Self {
        self.player = Some(player);
        self
    }
}

/// What the handlers decided. The host-event adapter reads this to deny the
/// action or force a specific result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventOutcome {
    pub cancelled: bool,
    pub result: Option<String>,
}

/// The mutable context object each handler receives.
#[rquickjs::class]
pub struct EventContext {
    event: String,
    cancelled: bool,
    result: Option<String>,
    fields: Map<String, Value>,
    player: Option<Arc<Mutex<Player>>>,
}

// No JS values inside, so tracing is a no-op.
impl<'js> Trace<'js> for EventContext {
    fn trace<'a>(&self, _tracer: rquickjs::class::Tracer<'a, 'js>) {}
}

unsafe impl<'js> JsLifetime<'js> for EventContext {
    type Changed<'to> = EventContext;
}

#[rquickjs::methods]
impl EventContext {
    #[qjs(get, rename = "event")]
    pub fn get_event(&self) -> String {
        self.event.clone()
    }

    #[qjs(get, rename = "cancelled")]
    pub fn get_cancelled(&self) -> bool {
        self.cancelled
    }

    #[qjs(set, rename = "cancelled")]
    pub fn set_cancelled(&mut self, cancelled: bool) {
        self.cancelled = cancelled;
    }

    #[qjs(get, rename = "result")]
    pub fn get_result(&self) -> Option<String> {
        self.result.clone()
    }

    #[qjs(set, rename = "result")]
    pub fn set_result(&mut self, result: Option<String>) {
        self.result = result;
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Payload field access by key; missing keys are `undefined`.
    pub fn get<'js>(&self, ctx: Ctx<'js>, key: String) -> rquickjs::Result<rquickjs::Value<'js>> {
        match self.fields.get(&key) {
            Some(value) => json_to_js(&ctx, value),
            None => Ok(rquickjs::Value::new_undefined(ctx)),
        }
    }

    #[qjs(get, rename = "player")]
    pub fn get_player(&self) -> Option<PlayerRef> {
        self.player.clone().map(PlayerRef::new)
    }
}

/// Handler registrations, keyed by event name. Registration order is
/// dispatch order, and nothing deduplicates: registering the same function
/// twice means it runs twice.
#[derive(Default)]
pub struct EventBus {
    handlers: RefCell<FxHashMap<String, Vec<Persistent<Function<'static>>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        EventBus::default()
    }

    pub fn on(&self, event: &str, handler: Persistent<Function<'static>>) {
        self.handlers
            .borrow_mut()
            .entry(event.to_string())
            .or_default()
            .push(handler);
        debug!(event, "registered event handler");
    }

    pub fn handler_count(&self, event: &str) -> usize {
        self.handlers.borrow().get(event).map_or(0, Vec::len)
    }

    pub fn clear(&self) {
        self.handlers.borrow_mut().clear();
    }

    /// Fire an event. The handler list is copied before iteration so a
    /// handler that registers or clears handlers mid-fire cannot corrupt
    /// the dispatch; each handler is caught individually so one throwing
    /// never starves the rest.
    pub fn fire(&self, engine: &JsEngine, event: &str, payload: EventPayload) -> EventOutcome {
        let handlers: Vec<Persistent<Function<'static>>> = self
            .handlers
            .borrow()
            .get(event)
            .cloned()
            .unwrap_or_default();
        if handlers.is_empty() {
            return EventOutcome::default();
        }

        engine.with(|ctx| {
            let context = match Class::instance(
                ctx.clone(),
                EventContext {
                    event: event.to_string(),
                    cancelled: false,
                    result: None,
                    fields: payload.fields,
                    player: payload.player,
                },
            ) {
                Ok(context) => context,
                Err(e) => {
                    error!(event, error = %e, "failed to build event context");
                    return EventOutcome::default();
                }
            };

            for handler in handlers {
                let function = match handler.clone().restore(ctx) {
                    Ok(function) => function,
                    Err(e) => {
                        error!(event, error = %e, "failed to restore event handler");
                        continue;
                    }
                };
                if let Err(e) = function.call::<_, ()>((context.clone(),)).catch(ctx) {
                    error!(event, error = %e, "event handler failed");
                }
            }

            let borrow = context.borrow();
            EventOutcome {
                cancelled: borrow.cancelled,
                result: borrow.result.clone(),
            }
        })
    }
}
