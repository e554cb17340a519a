//! Embedded JavaScript script host: a sandboxed QuickJS context, an event
//! bus with cancellable contexts, and the helper API scripts program
//! against.

mod api;
mod engine;
mod events;
mod host;

pub use api::{PlayerRef, ScriptApi};
pub use engine::JsEngine;
pub use events::{EventBus, EventContext, EventOutcome, EventPayload};
pub use host::{HostState, SandboxConfig, ScriptConfig, ScriptHost};
