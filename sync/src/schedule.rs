use mamono_core::Coord2;
use mamono_protocol::StorePath;

/// A follow-up write the client owes the store at some later time.
#[derive(Clone, Debug, PartialEq)]
pub enum Deferred {
    /// Best-effort cleanup of an ephemeral record.
    Delete(StorePath),
    /// Second, staggered ripple of a pin.
    Ripple { coords: Coord2, color: String },
}

#[derive(Clone, Debug, PartialEq)]
struct Entry {
    due_ms: u64,
    write: Deferred,
}

/// Client-side queue of delayed writes, flushed against a clock.
#[derive(Clone, Debug, Default)]
pub struct ScheduledWrites {
    entries: Vec<Entry>,
}

impl ScheduledWrites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due_ms: u64, write: Deferred) {
        self.entries.push(Entry { due_ms, write });
    }

    /// Removes and returns every write due at `now_ms`, earliest first.
    pub fn take_due(&mut self, now_ms: u64) -> Vec<Deferred> {
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.entries.drain(..).partition(|entry| entry.due_ms <= now_ms);
        self.entries = pending;
        due.sort_by_key(|entry| entry.due_ms);
        due.into_iter().map(|entry| entry.write).collect()
    }

    pub fn next_due(&self) -> Option<u64> {
        self.entries.iter().map(|entry| entry.due_ms).min()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mamono_protocol::RoomCode;

    #[test]
    fn only_due_writes_are_taken() {
        let code = RoomCode::parse("ABC123").unwrap();
        let first = StorePath::ripple(&code, "1").unwrap();
        let mut queue = ScheduledWrites::new();
        queue.schedule(4_000, Deferred::Delete(first.clone()));
        queue.schedule(
            1_000,
            Deferred::Ripple {
                coords: (2, 3),
                color: "#FF6B6B".into(),
            },
        );

        assert!(queue.take_due(999).is_empty());
        assert_eq!(queue.next_due(), Some(1_000));

        let due = queue.take_due(1_000);
        assert!(matches!(due.as_slice(), [Deferred::Ripple { coords: (2, 3), .. }]));
        assert_eq!(queue.len(), 1);

        assert_eq!(queue.take_due(10_000), [Deferred::Delete(first)]);
        assert!(queue.is_empty());
        assert_eq!(queue.next_due(), None);
    }
}
