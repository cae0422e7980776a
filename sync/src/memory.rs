use std::sync::{Mutex, MutexGuard};

use futures_channel::mpsc::{UnboundedSender, unbounded};
use mamono_protocol::StorePath;
use serde_json::{Map, Value};

use crate::*;

/// In-process document store with the same optimistic transaction semantics as the hosted one.
///
/// Transaction bodies run without the lock held, so concurrent writers can interleave between the read and the commit;
/// the commit only happens if the node still equals what the body was shown.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    root: Value,
    subscribers: Vec<Subscriber>,
}

#[derive(Debug)]
struct Subscriber {
    path: StorePath,
    last: Option<Value>,
    sender: UnboundedSender<Option<Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, State>> {
        self.state.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl State {
    fn read(&self, path: &StorePath) -> Option<&Value> {
        read_node(&self.root, path.segments())
    }

    fn write(&mut self, path: &StorePath, value: Option<Value>) {
        write_node(&mut self.root, path.segments(), value);
        self.notify(path);
    }

    /// Pushes the new value to every subscriber whose node may have changed.
    fn notify(&mut self, written: &StorePath) {
        let root = &self.root;
        self.subscribers.retain_mut(|subscriber| {
            if !subscriber.path.overlaps(written) {
                return !subscriber.sender.is_closed();
            }
            let current = read_node(root, subscriber.path.segments()).cloned();
            if current == subscriber.last {
                return true;
            }
            subscriber.last = current.clone();
            subscriber.sender.unbounded_send(current).is_ok()
        });
    }
}

fn read_node<'a>(root: &'a Value, segments: &[String]) -> Option<&'a Value> {
    let mut node = root;
    for segment in segments {
        node = match node {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    (!node.is_null()).then_some(node)
}

fn write_node(node: &mut Value, segments: &[String], value: Option<Value>) {
    let Some((head, rest)) = segments.split_first() else {
        *node = value.unwrap_or(Value::Null);
        return;
    };

    if let Value::Array(items) = node {
        match head.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
            Some(child) => write_node(child, rest, value),
            None => log::warn!("Ignoring write past the end of an array at {:?}", head),
        }
        return;
    }

    if !node.is_object() {
        if value.is_none() {
            return;
        }
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        let child = map.entry(head.clone()).or_insert(Value::Null);
        write_node(child, rest, value);
        if child.is_null() || child.as_object().is_some_and(Map::is_empty) {
            map.remove(head);
        }
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, path: &StorePath) -> StoreResult<Option<Value>> {
        Ok(self.lock()?.read(path).cloned())
    }

    fn set(&self, path: &StorePath, value: Option<Value>) -> StoreResult<()> {
        log::trace!("set {}", path);
        self.lock()?.write(path, value);
        Ok(())
    }

    fn update(&self, path: &StorePath, fields: Map<String, Value>) -> StoreResult<()> {
        let mut state = self.lock()?;
        for (key, value) in fields {
            let field = path.clone().child(&key);
            let value = (!value.is_null()).then_some(value);
            write_node(&mut state.root, field.segments(), value);
        }
        state.notify(path);
        Ok(())
    }

    fn transact(
        &self,
        path: &StorePath,
        body: &mut dyn FnMut(Option<&Value>) -> TxDecision,
    ) -> StoreResult<TxResult> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let base = self.lock()?.read(path).cloned();

            let next = match body(base.as_ref()) {
                TxDecision::Abort => {
                    return Ok(TxResult {
                        committed: false,
                        snapshot: base,
                    });
                }
                TxDecision::Commit(next) => next,
            };

            let mut state = self.lock()?;
            if state.read(path) != base.as_ref() {
                log::debug!("Conflict on {} (attempt {}), retrying", path, attempt);
                continue;
            }
            state.write(path, next);
            return Ok(TxResult {
                committed: true,
                snapshot: state.read(path).cloned(),
            });
        }
    }

    fn subscribe(&self, path: &StorePath) -> StoreResult<Subscription> {
        let (sender, receiver) = unbounded();
        let mut state = self.lock()?;
        let current = state.read(path).cloned();
        // a fresh receiver is never closed
        let _ = sender.unbounded_send(current.clone());
        state.subscribers.push(Subscriber {
            path: path.clone(),
            last: current,
            sender,
        });
        Ok(receiver)
    }
}
