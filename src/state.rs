use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use provision::{Outputs, StateMap};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// State Structures
// ============================================================================

/// Recorded state of one stack, persisted between runs
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StackState {
    /// Stack this state belongs to
    pub stack: String,

    /// State for each resource, by logical name
    #[serde(default)]
    pub resources: StateMap,

    /// Outputs exported by the last run
    #[serde(default)]
    pub outputs: Outputs,

    /// Last time the state was updated
    pub last_updated: DateTime<Utc>,
}

impl StackState {
    pub fn new(stack: &str) -> Self {
        Self {
            stack: stack.to_string(),
            resources: StateMap::new(),
            outputs: Outputs::default(),
            last_updated: Utc::now(),
        }
    }

    /// State file for a stack inside `dir`
    pub fn path(dir: &Path, stack: &str) -> PathBuf {
        dir.join(format!("{stack}.json"))
    }

    /// Load the state of a stack, or a fresh one if none was saved
    pub fn load(dir: &Path, stack: &str) -> Result<Self> {
        let path = Self::path(dir, stack);

        if !path.exists() {
            log::debug!("State file {} does not exist, starting fresh", path.display());
            return Ok(Self::new(stack));
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        let state: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        if state.stack != stack {
            anyhow::bail!(
                "State file {} belongs to stack '{}', not '{}'",
                path.display(),
                state.stack,
                stack
            );
        }

        log::debug!("Loaded state from {}", path.display());
        Ok(state)
    }

    /// Write the state, replacing the previous file atomically
    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;

        let path = Self::path(dir, &self.stack);
        let tmp = path.with_extension("json.tmp");
        let content =
            serde_json::to_string_pretty(&self).context("Failed to serialize state to JSON")?;

        fs::write(&tmp, &content)
            .with_context(|| format!("Failed to write state file: {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace state file: {}", path.display()))?;

        log::debug!("Saved state to {}", path.display());
        Ok(())
    }

    /// Replace resource states and outputs, then save
    pub fn update(&mut self, dir: &Path, resources: StateMap, outputs: Outputs) -> Result<()> {
        self.resources = resources;
        self.outputs = outputs;
        self.last_updated = Utc::now();
        self.save(dir)
    }

    /// Drop state of resources no longer declared in the stack
    pub fn prune(&mut self, keep: impl Fn(&str) -> bool) -> Vec<String> {
        let stale: Vec<String> = self
            .resources
            .iter()
            .filter(|(id, state)| !keep(id.as_str()) && !state.exists())
            .map(|(id, _)| id.clone())
            .collect();
        for id in &stale {
            self.resources.remove(id);
        }
        stale
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use provision::{ResourceState, ResourceStatus};
    use serde_json::json;
    use tempfile::TempDir;

    fn created(attrs: serde_json::Value) -> ResourceState {
        ResourceState {
            status: ResourceStatus::Created,
            attributes: serde_json::from_value(attrs).unwrap(),
            applied_args: Some(json!({})),
            error: None,
        }
    }

    #[test]
    fn test_load_missing_is_fresh() {
        let dir = TempDir::new().unwrap();
        let state = StackState::load(dir.path(), "demo").unwrap();
        assert_eq!(state.stack, "demo");
        assert!(state.resources.is_empty());
        assert!(state.outputs.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let mut state = StackState::new("demo");
        state
            .resources
            .insert("role".into(), created(json!({"arn": "arn:aws:iam::1:role/r"})));
        state.save(dir.path()).unwrap();

        assert!(dir.path().join("demo.json").exists());
        assert!(!dir.path().join("demo.json.tmp").exists());

        let loaded = StackState::load(dir.path(), "demo").unwrap();
        assert_eq!(loaded.resources["role"].status, ResourceStatus::Created);
        assert_eq!(
            loaded.resources["role"].attribute("arn"),
            Some(&json!("arn:aws:iam::1:role/r"))
        );
    }

    #[test]
    fn test_load_rejects_other_stack() {
        let dir = TempDir::new().unwrap();
        StackState::new("demo").save(dir.path()).unwrap();
        std::fs::rename(dir.path().join("demo.json"), dir.path().join("other.json")).unwrap();

        assert!(StackState::load(dir.path(), "other").is_err());
    }

    #[test]
    fn test_load_corrupt_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("demo.json"), "{not json").unwrap();
        assert!(StackState::load(dir.path(), "demo").is_err());
    }

    #[test]
    fn test_prune_keeps_existing_resources() {
        let mut state = StackState::new("demo");
        state.resources.insert("gone".into(), ResourceState::default());
        state
            .resources
            .insert("orphan".into(), created(json!({"id": "x"})));
        state.resources.insert("kept".into(), ResourceState::default());

        let pruned = state.prune(|id| id == "kept");
        assert_eq!(pruned, vec!["gone"]);
        assert!(state.resources.contains_key("orphan"));
        assert!(state.resources.contains_key("kept"));
    }
}
