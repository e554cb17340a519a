//! The QuickJS engine wrapper: one runtime + context pair per host
//! generation, with an optional wall-clock execution limit enforced through
//! the runtime's interrupt handler.

use rquickjs::{CatchResultExt, Context, Ctx, Result as JsResult, Runtime};
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

pub(crate) fn make_js_err(msg: &str) -> rquickjs::Error {
    rquickjs::Error::IntoJs {
        from: "Rust",
        to: "JS",
        message: Some(msg.to_string()),
    }
}

/// A sandboxed JS engine. Scripts get no filesystem or network bindings;
/// the only capabilities they have are the globals the host installs.
pub struct JsEngine {
    #[allow(dead_code)]
    runtime: Runtime,
    context: Context,
    deadline: Arc<Mutex<Option<Instant>>>,
    limit: Option<Duration>,
}

impl JsEngine {
    /// Create an engine. A non-zero `max_execution_time_ms` arms a
    /// wall-clock interrupt: any single evaluation or event dispatch that
    /// runs past the limit is aborted inside the interpreter.
    pub fn new(max_execution_time_ms: u64) -> Result<Self, String> {
        let runtime = Runtime::new().map_err(|e| format!("JS runtime error: {}", e))?;
        let deadline: Arc<Mutex<Option<Instant>>> = Arc::new(Mutex::new(None));

        let limit = if max_execution_time_ms > 0 {
            let armed = deadline.clone();
            runtime.set_interrupt_handler(Some(Box::new(move || {
                let guard = armed.lock().unwrap_or_else(PoisonError::into_inner);
                matches!(*guard, Some(t) if Instant::now() > t)
            })));
            Some(Duration::from_millis(max_execution_time_ms))
        } else {
            None
        };

        let context = Context::full(&runtime).map_err(|e| format!("JS context error: {}", e))?;
        Ok(JsEngine {
            runtime,
            context,
            deadline,
            limit,
        })
    }

    fn set_deadline(&self, value: Option<Instant>) {
        let mut guard = self
            .deadline
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = value;
    }

    /// Run `f` against the context with the execution deadline armed.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Ctx<'_>) -> R,
    {
        self.set_deadline(self.limit.map(|limit| Instant::now() + limit));
        let out = self.context.with(|ctx| f(&ctx));
        self.set_deadline(None);
        out
    }

    /// Evaluate a script. Errors are caught and rendered with the script
    /// name so a bad file is attributable from the log alone.
    pub fn eval_script(&self, name: &str, code: &str) -> Result<(), String> {
        self.with(|ctx| {
            ctx.eval::<(), _>(code)
                .catch(ctx)
                .map_err(|e| format!("script '{}': {}", name, e))
        })
    }
}

/// Convert a JSON value into a JS value inside the given context.
pub(crate) fn json_to_js<'js>(ctx: &Ctx<'js>, value: &Value) -> JsResult<rquickjs::Value<'js>> {
    Ok(match value {
        Value::Null => rquickjs::Value::new_null(ctx.clone()),
        Value::Bool(b) => rquickjs::Value::new_bool(ctx.clone(), *b),
        Value::Number(n) => match n.as_i64() {
            Some(i) if i32::try_from(i).is_ok() => {
                rquickjs::Value::new_int(ctx.clone(), i as i32)
            }
            _ => rquickjs::Value::new_float(ctx.clone(), n.as_f64().unwrap_or(0.0)),
        },
        Value::String(s) => rquickjs::String::from_str(ctx.clone(), s)?.into_value(),
        Value::Array(arr) => {
            let out = rquickjs::Array::new(ctx.clone())?;
            for (i, item) in arr.iter().enumerate() {
                out.set(i, json_to_js(ctx, item)?)?;
            }
            out.into_value()
        }
        Value::Object(obj) => {
            let out = rquickjs::Object::new(ctx.clone())?;
            for (key, item) in obj {
                out.set(key.as_str(), json_to_js(ctx, item)?)?;
            }
            out.into_value()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_and_error_reporting() {
        let engine = JsEngine::new(0).unwrap();
        engine.eval_script("ok.js", "let x = 1 + 1;").unwrap();
        let err = engine.eval_script("bad.js", "throw new Error('boom')");
        let msg = err.unwrap_err();
        assert!(msg.contains("bad.js"));
        assert!(msg.contains("boom"));
    }

    #[test]
    fn test_execution_limit_aborts_runaway_script() {
        let engine = JsEngine::new(50).unwrap();
        let err = engine.eval_script("spin.js", "while (true) {}");
        assert!(err.is_err());
    }

    #[test]
    fn test_limit_resets_between_evaluations() {
        let engine = JsEngine::new(200).unwrap();
        for _ in 0..3 {
            engine.eval_script("quick.js", "var y = 2 * 21;").unwrap();
        }
    }
}
