//! Tool registry: insertion with id resolution, snapshots, and dispatch.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::error::ChatError;
use crate::tools::Tool;

/// Options controlling how a tool is inserted into the registry.
#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    override_id: Option<String>,
    auto_increment: bool,
    start_increment: Option<u32>,
}

impl AddOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register under this id instead of the tool's own.
    pub fn override_id(mut self, id: impl Into<String>) -> Self {
        self.override_id = Some(id.into());
        self
    }

    /// On an id collision, probe `id_k`, `id_{k+1}`, … instead of failing.
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// First suffix tried by auto-increment (default 1).
    pub fn start_increment(mut self, start: u32) -> Self {
        self.start_increment = Some(start);
        self
    }
}

/// Concurrency-safe mapping from id to [`Tool`].
///
/// Reads (snapshot, execute) take the read lock; insertion and removal take
/// the write lock. Snapshots are deep copies: mutating a returned tool never
/// changes the registry.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tool under its own id, failing on collision.
    pub fn add(&self, tool: Tool) -> Result<(), ChatError> {
        self.add_with(tool, AddOptions::default())
    }

    /// Insert a tool with explicit id-resolution options.
    pub fn add_with(&self, mut tool: Tool, options: AddOptions) -> Result<(), ChatError> {
        let resolved = options.override_id.unwrap_or_else(|| tool.id.clone());
        if resolved.is_empty() {
            return Err(ChatError::EmptyToolId);
        }

        let mut tools = self.write();
        let key = if tools.contains_key(&resolved) {
            if !options.auto_increment {
                return Err(ChatError::ToolAlreadyExists(resolved));
            }
            next_id(&tools, &resolved, options.start_increment.unwrap_or(1))
        } else {
            resolved
        };

        tool.id = key.clone();
        tools.insert(key, tool);
        Ok(())
    }

    /// Remove a tool by id. Returns true iff something was removed.
    pub fn remove(&self, id: &str) -> bool {
        self.write().remove(id).is_some()
    }

    /// Independent copies of all registered tools, ordered by id. Each
    /// copy's `id` field reflects the registry key.
    pub fn snapshot(&self) -> Vec<Tool> {
        let tools = self.read();
        let mut out: Vec<Tool> = tools.values().cloned().collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.read().contains_key(id)
    }

    /// Dispatch a JSON argument string to the tool registered under `id`.
    ///
    /// Never fails outright: an unknown id, a parse failure, or a handler
    /// error all come back as `(message, false)` so the model can observe
    /// and correct.
    pub fn execute(&self, id: &str, arguments: &str) -> (String, bool) {
        let tools = self.read();
        let Some(tool) = tools.get(id) else {
            return (format!("error: tool \"{id}\" not found"), false);
        };
        match tool.invoke(arguments) {
            Ok(result) => (result, true),
            Err(message) => (message, false),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Tool>> {
        self.tools.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Tool>> {
        self.tools.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// First unused key among `id`, `id_start`, `id_{start+1}`, …
fn next_id(tools: &HashMap<String, Tool>, id: &str, start: u32) -> String {
    if !tools.contains_key(id) {
        return id.to_string();
    }
    let mut k = start;
    loop {
        let candidate = format!("{id}_{k}");
        if !tools.contains_key(&candidate) {
            return candidate;
        }
        k += 1;
    }
}
