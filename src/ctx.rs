use crate::llm::{Chat, Model};
use std::collections::HashMap;

/// Execution context shared by every step in a run: a string K/V store, a
/// run log, and the (optional) model handle.
pub struct Ctx {
    store: HashMap<String, String>,
    log: Vec<String>,
    model: Option<Box<dyn Model>>,
}

impl Ctx {
    pub fn new() -> Self {
        Self {
            store: HashMap::new(),
            log: vec![],
            model: None,
        }
    }

    /// Create a context with a model installed.
    pub fn with_model(model: impl Model + 'static) -> Self {
        let mut ctx = Self::new();
        ctx.set_model(model);
        ctx
    }

    /// Install (or replace) the model steps will talk to.
    pub fn set_model(&mut self, model: impl Model + 'static) {
        self.model = Some(Box::new(model));
    }

    /// Start a model call. If no model is installed, `send()` fails with
    /// [`crate::StepError::Invalid`] rather than panicking here.
    pub fn llm(&self) -> Chat<'_> {
        Chat::new(self.model.as_deref())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.store.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.store.get(key).map(|s| s.as_str())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.store.remove(key)
    }

    pub fn log(&mut self, msg: impl Into<String>) {
        self.log.push(msg.into());
    }

    pub fn logs(&self) -> &[String] {
        &self.log
    }

    pub fn clear_logs(&mut self) {
        self.log.clear();
    }

    pub fn clear(&mut self) {
        self.store.clear();
        self.log.clear();
    }
}

impl Default for Ctx {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedModel;

    #[test]
    fn store_roundtrip() {
        let mut ctx = Ctx::new();
        ctx.set("plan", "do the thing");
        assert_eq!(ctx.get("plan"), Some("do the thing"));
        assert_eq!(ctx.remove("plan"), Some("do the thing".to_string()));
        assert_eq!(ctx.get("plan"), None);
    }

    #[test]
    fn llm_uses_installed_model() {
        let ctx = Ctx::with_model(ScriptedModel::new(["pong"]));
        let reply = ctx.llm().user("ping").send().unwrap();
        assert_eq!(reply, "pong");
    }

    #[test]
    fn llm_without_model_errors_on_send() {
        let ctx = Ctx::new();
        assert!(ctx.llm().user("ping").send().is_err());
    }
}
