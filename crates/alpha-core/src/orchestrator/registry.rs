//! Agent roster with one lock per agent.
//!
//! The map lock is held only to find or insert a slot; all work on an agent
//! happens under that agent's own mutex, so two calls for the same agent
//! are serialized while calls for different agents proceed independently.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tempfile::NamedTempFile;
use tracing::info;

use crate::domain::error::Result;
use crate::domain::{Agent, AgentId, AgentStatus};
use crate::vetting::InterviewSession;

/// An agent plus its in-flight interview, if any.
#[derive(Debug)]
pub struct AgentSlot {
    pub agent: Agent,
    pub interview: Option<InterviewSession>,
}

pub type SlotHandle = Arc<Mutex<AgentSlot>>;

#[derive(Debug, Default)]
pub struct AgentRegistry {
    slots: RwLock<HashMap<AgentId, SlotHandle>>,
    /// Held from snapshot to rename, so the file on disk always comes from
    /// the most recent snapshot.
    save_lock: Mutex<()>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `agent`, regenerating its id on the (unlikely) collision.
    pub fn insert(&self, mut agent: Agent) -> AgentId {
        let mut slots = self.slots.write();
        while slots.contains_key(agent.id()) {
            agent = agent.with_id(AgentId::generate());
        }
        let id = agent.id().clone();
        slots.insert(
            id.clone(),
            Arc::new(Mutex::new(AgentSlot {
                agent,
                interview: None,
            })),
        );
        id
    }

    /// Shared handle to an agent's slot; lock it to read or mutate.
    pub fn get(&self, id: &AgentId) -> Option<SlotHandle> {
        self.slots.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }

    /// Every slot, oldest agent first.
    pub fn handles(&self) -> Vec<SlotHandle> {
        let mut handles: Vec<SlotHandle> = self.slots.read().values().cloned().collect();
        handles.sort_by_cached_key(|h| {
            let slot = h.lock();
            (slot.agent.created_at(), slot.agent.id().clone())
        });
        handles
    }

    /// Snapshot of agents, optionally filtered by status.
    pub fn list(&self, status: Option<AgentStatus>) -> Vec<Agent> {
        self.handles()
            .into_iter()
            .map(|h| h.lock().agent.clone())
            .filter(|a| status.map_or(true, |s| a.status() == s))
            .collect()
    }

    /// Write the roster as one JSON document, atomically.
    ///
    /// In-flight interviews are not persisted.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let _save = self.save_lock.lock();
        let agents = self.list(None);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, &agents)?;
        tmp.as_file().sync_data()?;
        tmp.persist(path).map_err(|e| e.error)?;
        info!(event = "registry.saved", agents = agents.len(), path = %path.display());
        Ok(())
    }

    /// Load a roster written by [`save_to`](Self::save_to). A missing file
    /// yields an empty registry.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let registry = Self::new();
        if !path.exists() {
            return Ok(registry);
        }
        let text = std::fs::read_to_string(path)?;
        let agents: Vec<Agent> = serde_json::from_str(&text)?;
        {
            let mut slots = registry.slots.write();
            for agent in agents {
                slots.insert(
                    agent.id().clone(),
                    Arc::new(Mutex::new(AgentSlot {
                        agent,
                        interview: None,
                    })),
                );
            }
        }
        info!(event = "registry.loaded", agents = registry.len(), path = %path.display());
        Ok(registry)
    }
}
