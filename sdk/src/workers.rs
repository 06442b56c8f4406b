//! Engine workers started on behalf of the client
//!
//! `NewWorker` requests start an engine worker and hand the client a
//! bridge-assigned id; `StopWorker` looks the id up here.

use std::sync::Arc;

use crate::context::{Registry, RegistryEntry};
use crate::engine::EngineWorker;
use crate::error::Entity;

/// A running engine worker and the task list it polls
pub struct RegisteredWorker {
    pub worker_id: i64,
    pub domain: String,
    pub task_list: String,
    pub handle: Arc<dyn EngineWorker>,
}

impl RegistryEntry for RegisteredWorker {
    const ENTITY: Entity = Entity::Worker;
}

impl std::fmt::Debug for RegisteredWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredWorker")
            .field("worker_id", &self.worker_id)
            .field("domain", &self.domain)
            .field("task_list", &self.task_list)
            .field("handle", &"<worker>")
            .finish()
    }
}

pub type WorkerRegistry = Registry<RegisteredWorker>;
