//! Middleware chain for intercepting writes before they are committed

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::error::CallbackResult;
use crate::store::ChangeOptions;

/// Interceptor run on every `set_state`/`update_state` before the value is committed.
///
/// Return `Ok(Some(value))` to replace the candidate value, `Ok(None)` to pass
/// it through untouched, or `Err` to report a failure. A failing middleware is
/// logged and skipped; the chain continues with the value it was given.
///
/// Closures with the matching signature implement this trait:
///
/// ```
/// use fitview_state_core::{MiddlewareChain, ChangeOptions};
/// use serde_json::json;
///
/// let mut chain = MiddlewareChain::new();
/// chain.add_fn(|_path, value, _old, _opts| Ok(value.as_i64().map(|n| json!(n + 1))));
/// assert_eq!(chain.apply("y", json!(10), None, &ChangeOptions::default()).value, json!(11));
/// ```
pub trait Middleware {
    fn apply(
        &self,
        path: &str,
        value: &Value,
        old_value: Option<&Value>,
        options: &ChangeOptions,
    ) -> CallbackResult<Option<Value>>;

    /// Name used in log output.
    fn name(&self) -> &str {
        "middleware"
    }
}

impl<F> Middleware for F
where
    F: Fn(&str, &Value, Option<&Value>, &ChangeOptions) -> CallbackResult<Option<Value>>,
{
    fn apply(
        &self,
        path: &str,
        value: &Value,
        old_value: Option<&Value>,
        options: &ChangeOptions,
    ) -> CallbackResult<Option<Value>> {
        self(path, value, old_value, options)
    }
}

/// Result of running the chain over one write.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainOutcome {
    /// The value to commit.
    pub value: Value,
    /// True if any middleware replaced the candidate value.
    pub replaced: bool,
}

/// Ordered list of middleware.
///
/// Cloning is cheap; entries are shared.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    entries: Vec<Rc<dyn Middleware>>,
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("middlewares_count", &self.entries.len())
            .finish()
    }
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a middleware to the end of the chain.
    pub fn add<M: Middleware + 'static>(&mut self, middleware: M) {
        self.entries.push(Rc::new(middleware));
    }

    /// Append a closure middleware.
    pub fn add_fn<F>(&mut self, middleware: F)
    where
        F: Fn(&str, &Value, Option<&Value>, &ChangeOptions) -> CallbackResult<Option<Value>>
            + 'static,
    {
        self.add(middleware);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Thread `value` through every middleware in order.
    pub fn apply(
        &self,
        path: &str,
        value: Value,
        old_value: Option<&Value>,
        options: &ChangeOptions,
    ) -> ChainOutcome {
        let mut outcome = ChainOutcome {
            value,
            replaced: false,
        };
        for middleware in &self.entries {
            match middleware.apply(path, &outcome.value, old_value, options) {
                Ok(Some(next)) => {
                    outcome.value = next;
                    outcome.replaced = true;
                }
                Ok(None) => {}
                Err(error) => {
                    tracing::warn!(
                        path = %path,
                        middleware = %middleware.name(),
                        error = %error,
                        "Middleware failed, skipping its contribution"
                    );
                }
            }
        }
        outcome
    }
}

/// Middleware that traces every write (for debugging)
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingMiddleware;

impl Middleware for LoggingMiddleware {
    fn apply(
        &self,
        path: &str,
        value: &Value,
        old_value: Option<&Value>,
        options: &ChangeOptions,
    ) -> CallbackResult<Option<Value>> {
        tracing::debug!(
            path = %path,
            source = ?options.source,
            had_value = old_value.is_some(),
            kind = value_kind(value),
            "Committing state"
        );
        Ok(None)
    }

    fn name(&self) -> &str {
        "logging"
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn opts() -> ChangeOptions {
        ChangeOptions::default()
    }

    #[test]
    fn test_chain_threads_values_in_order() {
        let mut chain = MiddlewareChain::new();
        chain.add_fn(|_, v, _, _| Ok(v.as_i64().map(|n| json!(n + 1))));
        chain.add_fn(|_, v, _, _| Ok(v.as_i64().map(|n| json!(n * 2))));

        let outcome = chain.apply("y", json!(10), None, &opts());
        assert_eq!(outcome.value, json!(22));
        assert!(outcome.replaced);
    }

    #[test]
    fn test_failing_middleware_is_skipped() {
        let mut chain = MiddlewareChain::new();
        chain.add_fn(|_, _, _, _| Err("boom".into()));
        chain.add_fn(|_, _, _, _| Ok(Some(json!("ok"))));

        let old = json!("old");
        let outcome = chain.apply("z", json!("in"), Some(&old), &opts());
        assert_eq!(outcome.value, json!("ok"));
    }

    #[test]
    fn test_failure_keeps_previous_candidate() {
        let mut chain = MiddlewareChain::new();
        chain.add_fn(|_, _, _, _| Ok(Some(json!("first"))));
        chain.add_fn(|_, _, _, _| Err("boom".into()));

        let outcome = chain.apply("z", json!("in"), None, &opts());
        assert_eq!(outcome.value, json!("first"));
    }

    #[test]
    fn test_none_passes_value_through() {
        let mut chain = MiddlewareChain::new();
        chain.add(LoggingMiddleware);
        let outcome = chain.apply("a", json!({"k": 1}), None, &opts());
        assert_eq!(outcome.value, json!({"k": 1}));
        assert!(!outcome.replaced);
        assert_eq!(chain.len(), 1);
    }
}
