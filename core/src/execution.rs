//! Execution metadata shared by both sides of the bridge
//!
//! Identifiers, per-execution parameters and the option structures that travel
//! as JSON substructures inside envelopes. Continue-as-new override resolution
//! lives here too because it only depends on these types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Identity of a single workflow run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WorkflowExecution {
    pub workflow_id: String,
    pub run_id: String,
}

impl WorkflowExecution {
    pub fn new(workflow_id: impl Into<String>, run_id: impl Into<String>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            run_id: run_id.into(),
        }
    }
}

/// Engine-side information about a running workflow
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkflowInfo {
    pub domain: String,
    pub workflow_type: String,
    pub execution: WorkflowExecution,
    pub task_list: String,
}

/// Engine-side information about a running activity
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActivityInfo {
    pub activity_id: String,
    pub activity_type: String,
    pub workflow_type: String,
    pub workflow_execution: WorkflowExecution,
    pub task_list: String,
    pub attempt: i32,
}

/// Parameters a workflow run was started with.
///
/// A continue-as-new directive starts the next run from these values unless
/// the workflow overrides them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionParams {
    pub domain: String,
    pub task_list: String,
    pub schedule_to_start_timeout: Option<Duration>,
    pub schedule_to_close_timeout: Option<Duration>,
    pub start_to_close_timeout: Option<Duration>,
    pub execution_start_to_close_timeout: Option<Duration>,
}

impl ExecutionParams {
    pub fn new(domain: impl Into<String>, task_list: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            task_list: task_list.into(),
            ..Default::default()
        }
    }

    pub fn with_start_to_close_timeout(mut self, timeout: Duration) -> Self {
        self.start_to_close_timeout = Some(timeout);
        self
    }

    pub fn with_schedule_to_start_timeout(mut self, timeout: Duration) -> Self {
        self.schedule_to_start_timeout = Some(timeout);
        self
    }

    pub fn with_schedule_to_close_timeout(mut self, timeout: Duration) -> Self {
        self.schedule_to_close_timeout = Some(timeout);
        self
    }

    pub fn with_execution_start_to_close_timeout(mut self, timeout: Duration) -> Self {
        self.execution_start_to_close_timeout = Some(timeout);
        self
    }

    /// Apply continue-as-new overrides; every unset override keeps the
    /// current value.
    pub fn with_overrides(&self, overrides: &ContinueAsNewOverrides) -> Self {
        Self {
            domain: overrides
                .domain
                .clone()
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| self.domain.clone()),
            task_list: overrides
                .task_list
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| self.task_list.clone()),
            schedule_to_start_timeout: pick(
                overrides.schedule_to_start_timeout,
                self.schedule_to_start_timeout,
            ),
            schedule_to_close_timeout: pick(
                overrides.schedule_to_close_timeout,
                self.schedule_to_close_timeout,
            ),
            start_to_close_timeout: pick(
                overrides.start_to_close_timeout,
                self.start_to_close_timeout,
            ),
            execution_start_to_close_timeout: pick(
                overrides.execution_start_to_close_timeout,
                self.execution_start_to_close_timeout,
            ),
        }
    }
}

fn pick(over: Option<Duration>, current: Option<Duration>) -> Option<Duration> {
    over.filter(|d| !d.is_zero()).or(current)
}

/// Optional parameter overrides a workflow may attach to continue-as-new
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContinueAsNewOverrides {
    pub domain: Option<String>,
    pub task_list: Option<String>,
    pub schedule_to_start_timeout: Option<Duration>,
    pub schedule_to_close_timeout: Option<Duration>,
    pub start_to_close_timeout: Option<Duration>,
    pub execution_start_to_close_timeout: Option<Duration>,
}

/// Instruction to end the current workflow run and start a fresh one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinueAsNew {
    /// Workflow type of the new run; always the type of the ending run
    pub workflow_type: String,
    pub args: Option<Vec<u8>>,
    pub params: ExecutionParams,
}

impl ContinueAsNew {
    /// Build the directive from the ending run's parameters and the overrides
    /// the workflow supplied.
    pub fn resolve(
        workflow_type: impl Into<String>,
        original: &ExecutionParams,
        overrides: &ContinueAsNewOverrides,
        args: Option<Vec<u8>>,
    ) -> Self {
        Self {
            workflow_type: workflow_type.into(),
            args,
            params: original.with_overrides(overrides),
        }
    }
}

/// Options for starting a top-level workflow (`Options` on execute requests)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StartWorkflowOptions {
    #[serde(default)]
    pub workflow_id: Option<String>,
    #[serde(default)]
    pub task_list: Option<String>,
    #[serde(default, with = "option_duration_ms")]
    pub execution_start_to_close_timeout: Option<Duration>,
    #[serde(default, with = "option_duration_ms")]
    pub decision_task_start_to_close_timeout: Option<Duration>,
}

/// Options for starting a child workflow from inside a workflow
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChildWorkflowOptions {
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub workflow_id: Option<String>,
    #[serde(default)]
    pub task_list: Option<String>,
    #[serde(default, with = "option_duration_ms")]
    pub execution_start_to_close_timeout: Option<Duration>,
    #[serde(default, with = "option_duration_ms")]
    pub task_start_to_close_timeout: Option<Duration>,
    #[serde(default)]
    pub wait_for_cancellation: bool,
}

/// Options for scheduling an activity from inside a workflow
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActivityOptions {
    #[serde(default)]
    pub task_list: Option<String>,
    #[serde(default, with = "option_duration_ms")]
    pub schedule_to_start_timeout: Option<Duration>,
    #[serde(default, with = "option_duration_ms")]
    pub schedule_to_close_timeout: Option<Duration>,
    #[serde(default, with = "option_duration_ms")]
    pub start_to_close_timeout: Option<Duration>,
    #[serde(default, with = "option_duration_ms")]
    pub heartbeat_timeout: Option<Duration>,
}

/// Options for a worker polling one task list
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkerOptions {
    #[serde(default)]
    pub identity: Option<String>,
    #[serde(default)]
    pub max_concurrent_activity_executions: Option<u32>,
    #[serde(default)]
    pub max_concurrent_decision_executions: Option<u32>,
    #[serde(default)]
    pub disable_workflow_worker: bool,
    #[serde(default)]
    pub disable_activity_worker: bool,
}

/// Durations inside JSON substructures are integer milliseconds
mod option_duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_u64(d.as_millis() as u64),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Option::<u64>::deserialize(deserializer)?;
        Ok(millis.filter(|m| *m > 0).map(Duration::from_millis))
    }
}
