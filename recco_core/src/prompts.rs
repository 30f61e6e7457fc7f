//! Prompt sources.
//!
//! `StaticPrompts` serves templates from memory and starts with the built-in
//! set; `PromptDir` reads `<name>.md` or `<name>.txt` from a directory.

use crate::error::BackendError;
use crate::PromptLoader;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::PathBuf;

/// Name of the system prompt used for intent extraction.
pub const INTENT_PROMPT_NAME: &str = "intent_extraction";

/// Built-in prompts shipped with recco.
static BUILTIN_PROMPTS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut prompts = HashMap::new();
    prompts.insert(
        INTENT_PROMPT_NAME,
        "You help readers find things to do, read and explore next.\n\
         Given a question and the article the reader is looking at, describe in one or two \
         sentences what the reader is really looking for. Mention concrete themes, audience \
         and constraints from the article when they matter. Reply with the summary only.",
    );
    prompts
});

/// Look up a built-in prompt by name.
pub fn builtin_prompt(name: &str) -> Option<&'static str> {
    BUILTIN_PROMPTS.get(name).copied()
}

/// In-memory prompt table.
#[derive(Debug, Clone)]
pub struct StaticPrompts {
    prompts: HashMap<String, String>,
}

impl StaticPrompts {
    /// Table seeded with the built-in prompts.
    pub fn builtin() -> Self {
        Self {
            prompts: BUILTIN_PROMPTS
                .iter()
                .map(|(name, text)| (name.to_string(), text.to_string()))
                .collect(),
        }
    }

    pub fn empty() -> Self {
        Self {
            prompts: HashMap::new(),
        }
    }

    pub fn with_prompt(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.prompts.insert(name.into(), text.into());
        self
    }
}

impl Default for StaticPrompts {
    fn default() -> Self {
        Self::builtin()
    }
}

#[async_trait]
impl PromptLoader for StaticPrompts {
    async fn load_prompt(&self, name: &str) -> Result<String, BackendError> {
        self.prompts
            .get(name)
            .cloned()
            .ok_or_else(|| BackendError::Transport(format!("prompt '{}' not found", name)))
    }
}

/// Prompts stored as files in a directory.
#[derive(Debug, Clone)]
pub struct PromptDir {
    root: PathBuf,
}

impl PromptDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default location: `<config_dir>/recco/prompts`.
    pub fn new_default() -> Self {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|p| p.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(base.join("recco").join("prompts"))
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

#[async_trait]
impl PromptLoader for PromptDir {
    async fn load_prompt(&self, name: &str) -> Result<String, BackendError> {
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(BackendError::Transport(format!(
                "invalid prompt name '{}'",
                name
            )));
        }

        for ext in ["md", "txt"] {
            let path = self.root.join(format!("{}.{}", name, ext));
            match tokio::fs::read_to_string(&path).await {
                Ok(text) => return Ok(text),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                Err(err) => {
                    return Err(BackendError::Transport(format!(
                        "failed to read {}: {}",
                        path.display(),
                        err
                    )))
                }
            }
        }

        Err(BackendError::Transport(format!(
            "prompt '{}' not found in {}",
            name,
            self.root.display()
        )))
    }
}
