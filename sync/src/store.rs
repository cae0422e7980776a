use std::sync::Arc;

use futures_channel::mpsc::UnboundedReceiver;
use mamono_protocol::StorePath;
use serde_json::{Map, Value};

use crate::StoreResult;

/// What a transaction body wants done with the value it was shown.
#[derive(Clone, Debug, PartialEq)]
pub enum TxDecision {
    /// Replace the node, `None` deleting it.
    Commit(Option<Value>),
    /// Leave the node alone.
    Abort,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TxResult {
    pub committed: bool,
    /// Value of the node after the transaction, or as last seen when aborted.
    pub snapshot: Option<Value>,
}

/// Receiver of push updates: the current value first, then every change.
pub type Subscription = UnboundedReceiver<Option<Value>>;

/// Hosted realtime document store contract.
///
/// `transact` is optimistic: the body sees the current value of the node and returns what to write. If anything under
/// the node changed in the meantime, the store runs the body again with the fresh value, until one attempt commits or
/// the body aborts. Bodies must therefore be pure functions of the value they are shown.
pub trait DocumentStore: Send + Sync {
    fn get(&self, path: &StorePath) -> StoreResult<Option<Value>>;

    /// Plain write without conflict detection. `None` deletes the node.
    fn set(&self, path: &StorePath, value: Option<Value>) -> StoreResult<()>;

    /// Writes each field under `path`, leaving other fields untouched.
    fn update(&self, path: &StorePath, fields: Map<String, Value>) -> StoreResult<()>;

    fn transact(
        &self,
        path: &StorePath,
        body: &mut dyn FnMut(Option<&Value>) -> TxDecision,
    ) -> StoreResult<TxResult>;

    fn subscribe(&self, path: &StorePath) -> StoreResult<Subscription>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    fn get(&self, path: &StorePath) -> StoreResult<Option<Value>> {
        (**self).get(path)
    }

    fn set(&self, path: &StorePath, value: Option<Value>) -> StoreResult<()> {
        (**self).set(path, value)
    }

    fn update(&self, path: &StorePath, fields: Map<String, Value>) -> StoreResult<()> {
        (**self).update(path, fields)
    }

    fn transact(
        &self,
        path: &StorePath,
        body: &mut dyn FnMut(Option<&Value>) -> TxDecision,
    ) -> StoreResult<TxResult> {
        (**self).transact(path, body)
    }

    fn subscribe(&self, path: &StorePath) -> StoreResult<Subscription> {
        (**self).subscribe(path)
    }
}
