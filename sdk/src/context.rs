//! Execution context registries
//!
//! A context lives from the moment the engine hands the bridge a workflow or
//! activity invocation until the reply handler that observes its terminal
//! reply removes it. Workflow and activity contexts use separate registries
//! with independent id spaces.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use bridge_core::{ActivityInfo, ExecutionParams, WorkflowInfo};
use parking_lot::RwLock;

use crate::error::{BridgeError, Entity, Result};

/// Value stored in a [`Registry`]
pub trait RegistryEntry: Send + Sync {
    /// Entity reported when a lookup misses
    const ENTITY: Entity;
}

/// Live state of one workflow execution
#[derive(Debug, Clone)]
pub struct WorkflowContext {
    pub context_id: i64,
    pub info: WorkflowInfo,
    /// Parameters this run started with; continue-as-new falls back to them
    pub params: ExecutionParams,
}

impl WorkflowContext {
    pub fn workflow_type(&self) -> &str {
        &self.info.workflow_type
    }
}

impl RegistryEntry for WorkflowContext {
    const ENTITY: Entity = Entity::WorkflowContext;
}

/// Live state of one activity execution
#[derive(Debug)]
pub struct ActivityContext {
    pub context_id: i64,
    pub activity_type: String,
    pub info: Option<ActivityInfo>,
    /// Engine token identifying the activity task
    pub task_token: Option<Vec<u8>>,
    pub local: bool,
    cancelled: AtomicBool,
}

impl ActivityContext {
    pub fn new(context_id: i64, activity_type: impl Into<String>) -> Self {
        Self {
            context_id,
            activity_type: activity_type.into(),
            info: None,
            task_token: None,
            local: false,
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn with_task_token(mut self, task_token: Vec<u8>) -> Self {
        self.task_token = Some(task_token);
        self
    }

    pub fn local(mut self) -> Self {
        self.local = true;
        self
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl RegistryEntry for ActivityContext {
    const ENTITY: Entity = Entity::ActivityContext;
}

/// Concurrent map from id to shared entry
pub struct Registry<C> {
    entries: RwLock<HashMap<i64, Arc<C>>>,
    next_id: AtomicI64,
}

impl<C: RegistryEntry> Default for Registry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: RegistryEntry> Registry<C> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(0),
        }
    }

    /// Allocate an id, build the context for it and insert it
    pub fn add(&self, build: impl FnOnce(i64) -> C) -> Arc<C> {
        let mut entries = self.entries.write();
        let mut context_id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        while entries.contains_key(&context_id) {
            context_id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        }
        let context = Arc::new(build(context_id));
        entries.insert(context_id, Arc::clone(&context));
        context
    }

    /// Insert under an explicit id. A live id is never replaced; later
    /// [`add`](Self::add) calls allocate past `context_id`.
    pub fn put(&self, context_id: i64, context: C) -> Result<Arc<C>> {
        let mut entries = self.entries.write();
        if entries.contains_key(&context_id) {
            return Err(BridgeError::DuplicateContext {
                entity: C::ENTITY,
                id: context_id,
            });
        }
        self.next_id.fetch_max(context_id, Ordering::SeqCst);
        let context = Arc::new(context);
        entries.insert(context_id, Arc::clone(&context));
        Ok(context)
    }

    pub fn get(&self, context_id: i64) -> Option<Arc<C>> {
        self.entries.read().get(&context_id).cloned()
    }

    /// Like [`get`](Self::get) but a miss is an `EntityNotExist` error
    pub fn require(&self, context_id: i64) -> Result<Arc<C>> {
        self.get(context_id)
            .ok_or_else(|| BridgeError::not_exist(C::ENTITY, context_id))
    }

    /// Remove a context; `None` if it was already gone
    pub fn remove(&self, context_id: i64) -> Option<Arc<C>> {
        self.entries.write().remove(&context_id)
    }

    pub fn contains(&self, context_id: i64) -> bool {
        self.entries.read().contains_key(&context_id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Ids of all live contexts, unordered
    pub fn ids(&self) -> Vec<i64> {
        self.entries.read().keys().copied().collect()
    }
}

impl<C> std::fmt::Debug for Registry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("live", &self.entries.read().len())
            .field("next_id", &self.next_id.load(Ordering::SeqCst))
            .finish()
    }
}

pub type WorkflowContexts = Registry<WorkflowContext>;
pub type ActivityContexts = Registry<ActivityContext>;
