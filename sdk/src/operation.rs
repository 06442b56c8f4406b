//! Pending operation table
//!
//! Every outward call registers an [`Operation`] under a fresh request id and
//! awaits its [`PendingOperation`] handle. The reply handler for that id
//! resolves it exactly once. Resolution removes the entry before waking the
//! waiter, so a duplicate or late reply for the same id fails with
//! `EntityNotExist` instead of reaching anybody.
//!
//! Each operation records the reply type its request expects; a reply of any
//! other type is not allowed to settle it. Once [`OperationTable::cancel_all`]
//! has run the table is closed and refuses new registrations.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bridge_core::{ContinueAsNew, MessageType};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::{BridgeError, Entity, Result};

/// Successful outcome of an outward call
#[derive(Debug, Clone, PartialEq)]
pub enum OperationResult {
    /// Result payload (workflow/activity/query result)
    Payload(Option<Vec<u8>>),
    /// Boolean acknowledgement (signal, stop, disconnect)
    Ack(bool),
    /// The workflow asked to end this run and start a new one
    ContinueAsNew(ContinueAsNew),
}

/// Value delivered into an operation's completion slot
pub type Completion = Result<OperationResult>;

/// One in-flight outward call
#[derive(Debug)]
pub struct Operation {
    request_id: i64,
    context_id: i64,
    reply_type: MessageType,
    registered_at: Instant,
    slot: Mutex<Option<oneshot::Sender<Completion>>>,
}

impl Operation {
    pub fn request_id(&self) -> i64 {
        self.request_id
    }

    /// Context this call belongs to; 0 for context-free calls
    pub fn context_id(&self) -> i64 {
        self.context_id
    }

    /// Reply type allowed to settle this operation
    pub fn reply_type(&self) -> MessageType {
        self.reply_type
    }

    pub fn elapsed(&self) -> Duration {
        self.registered_at.elapsed()
    }

    /// Fill the completion slot. Returns `false` if it was already filled.
    pub(crate) fn complete(&self, completion: Completion) -> bool {
        let sender = self.slot.lock().take();
        match sender {
            Some(sender) => {
                if sender.send(completion).is_err() {
                    debug!(
                        request_id = self.request_id,
                        "waiter dropped before completion"
                    );
                }
                true
            }
            None => {
                debug_assert!(false, "operation {} resolved twice", self.request_id);
                warn!(
                    request_id = self.request_id,
                    "ignoring second completion of operation"
                );
                false
            }
        }
    }
}

/// Concurrent map from request id to pending operation
#[derive(Debug)]
pub struct OperationTable {
    operations: Mutex<HashMap<i64, Arc<Operation>>>,
    next_id: AtomicI64,
    // only written with `operations` locked
    closed: AtomicBool,
}

impl Default for OperationTable {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationTable {
    pub fn new() -> Self {
        Self {
            operations: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Issue the next request id. Ids start at 1 and are never reused.
    pub fn next_request_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Register a pending operation settled by a reply of `reply_type`.
    ///
    /// Fails if `request_id` is already live, or with `ShuttingDown` once the
    /// table has been closed by [`cancel_all`](Self::cancel_all).
    pub fn register(
        self: &Arc<Self>,
        request_id: i64,
        context_id: i64,
        reply_type: MessageType,
    ) -> Result<PendingOperation> {
        let (tx, rx) = oneshot::channel();
        let operation = Arc::new(Operation {
            request_id,
            context_id,
            reply_type,
            registered_at: Instant::now(),
            slot: Mutex::new(Some(tx)),
        });

        {
            let mut operations = self.operations.lock();
            if self.closed.load(Ordering::SeqCst) {
                return Err(BridgeError::ShuttingDown);
            }
            if operations.contains_key(&request_id) {
                return Err(BridgeError::DuplicateRequest(request_id));
            }
            operations.insert(request_id, operation);
        }

        debug!(request_id, context_id, %reply_type, "registered operation");
        Ok(PendingOperation {
            request_id,
            table: Arc::clone(self),
            receiver: Some(rx),
        })
    }

    pub fn get(&self, request_id: i64) -> Option<Arc<Operation>> {
        self.operations.lock().get(&request_id).cloned()
    }

    pub fn contains(&self, request_id: i64) -> bool {
        self.operations.lock().contains_key(&request_id)
    }

    /// Resolve and remove the operation for `request_id`.
    ///
    /// The entry leaves the table before the waiter is woken; the lock is not
    /// held while sending.
    pub fn resolve(&self, request_id: i64, completion: Completion) -> Result<()> {
        let operation = self.operations.lock().remove(&request_id);
        match operation {
            Some(operation) => {
                operation.complete(completion);
                debug!(
                    request_id,
                    elapsed_ms = operation.elapsed().as_millis() as u64,
                    "resolved operation"
                );
                Ok(())
            }
            None => Err(BridgeError::not_exist(Entity::Operation, request_id)),
        }
    }

    /// Remove without resolving. Idempotent.
    pub fn remove(&self, request_id: i64) -> Option<Arc<Operation>> {
        self.operations.lock().remove(&request_id)
    }

    /// Close the table and fail every pending operation with `error`;
    /// returns how many were woken
    pub fn cancel_all(&self, error: BridgeError) -> usize {
        let drained: Vec<Arc<Operation>> = {
            let mut operations = self.operations.lock();
            self.closed.store(true, Ordering::SeqCst);
            operations.drain().map(|(_, op)| op).collect()
        };
        for operation in &drained {
            operation.complete(Err(error.clone()));
        }
        drained.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.operations.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.lock().is_empty()
    }
}

/// Awaitable handle for a registered operation.
///
/// Dropping the handle before the reply arrives evicts the table entry, so a
/// cancelled caller never leaves a stale operation behind.
#[derive(Debug)]
pub struct PendingOperation {
    request_id: i64,
    table: Arc<OperationTable>,
    receiver: Option<oneshot::Receiver<Completion>>,
}

impl PendingOperation {
    pub fn request_id(&self) -> i64 {
        self.request_id
    }

    /// Wait for the reply, optionally bounded by `timeout`
    pub async fn wait(mut self, timeout: Option<Duration>) -> Result<OperationResult> {
        let request_id = self.request_id;
        let Some(receiver) = self.receiver.take() else {
            return Err(BridgeError::Cancelled { request_id });
        };

        let received = match timeout {
            Some(after) => match tokio::time::timeout(after, receiver).await {
                Ok(received) => received,
                Err(_) => {
                    self.table.remove(request_id);
                    warn!(request_id, ?after, "operation timed out");
                    return Err(BridgeError::Timeout { request_id, after });
                }
            },
            None => receiver.await,
        };

        match received {
            Ok(completion) => completion,
            Err(_) => Err(BridgeError::Cancelled { request_id }),
        }
    }
}

impl Drop for PendingOperation {
    fn drop(&mut self) {
        self.table.remove(self.request_id);
    }
}
